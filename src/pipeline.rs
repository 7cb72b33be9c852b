// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use derive_builder::Builder;

use crate::errors::{Error, Result};
use crate::oracle::LikelihoodOracle;
use crate::scoring::{Classification, DeltaScorer, ScoreResult};
use crate::selection::{SelectionTracker, Ticket};
use crate::sequence::{fetch_window, SequenceSource, SequenceWindow, WindowBounds};
use crate::variant::{check_unambiguous, Base, MutatedWindow, VariantSpec};

/// A single-nucleotide variant to score. Without an explicit window, a window of
/// `window_size` bases centred on the variant is used.
#[derive(Debug, Clone, PartialEq, Eq, new, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub genome: String,
    pub chromosome: String,
    pub variant_position: u64,
    pub alternative_base: Base,
    #[serde(default)]
    #[new(default)]
    pub reference_base: Option<Base>,
    #[serde(default)]
    #[new(default)]
    pub window: Option<WindowBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub reference_log_likelihood: f64,
    pub variant_log_likelihood: f64,
    pub delta: f64,
    pub classification: Classification,
    pub confidence: f64,
    pub reference_base: Base,
    pub alternative_base: Base,
    pub reference_sequence: String,
    pub variant_sequence: String,
    pub window_start: u64,
    pub window_end: u64,
}

impl AnalysisResponse {
    fn new(window: &SequenceWindow, mutated: MutatedWindow, score: ScoreResult) -> Self {
        let (reference_base, alternative_base) =
            (mutated.reference_base(), mutated.alternative_base());
        let (reference_sequence, variant_sequence) = mutated.into_sequences();
        AnalysisResponse {
            reference_log_likelihood: score.reference_log_likelihood(),
            variant_log_likelihood: score.variant_log_likelihood(),
            delta: score.delta(),
            classification: score.classification(),
            confidence: score.confidence(),
            reference_base,
            alternative_base,
            reference_sequence,
            variant_sequence,
            window_start: window.start(),
            window_end: window.end(),
        }
    }
}

/// Fetches the reference window, builds the variant sequence, scores both with the
/// oracle and classifies the delta.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct AnalysisPipeline {
    sequence_source: Box<dyn SequenceSource>,
    oracle: Box<dyn LikelihoodOracle>,
    scorer: DeltaScorer,
    #[builder(default = "8192")]
    window_size: u64,
}

impl AnalysisPipeline {
    pub fn oracle(&self) -> &dyn LikelihoodOracle {
        self.oracle.as_ref()
    }

    pub fn scorer(&self) -> &DeltaScorer {
        &self.scorer
    }

    /// Run the whole analysis.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let (window, mutated) = self.prepare(request)?;
        let score = self.score(&mutated)?;
        Ok(AnalysisResponse::new(&window, mutated, score))
    }

    /// Run the analysis on behalf of a selection. Returns `Ok(None)` as soon as the
    /// ticket has been superseded, and publishes the result otherwise.
    pub fn analyze_tracked(
        &self,
        request: &AnalysisRequest,
        tracker: &SelectionTracker<AnalysisResponse>,
        ticket: &Ticket,
    ) -> Result<Option<AnalysisResponse>> {
        if !tracker.is_current(ticket) {
            return Ok(None);
        }
        let selection = ticket.selection();
        if !selection.covers(&request.genome, &request.chromosome) {
            return Err(Error::SelectionMismatch {
                requested: format!("{}:{}", request.genome, request.chromosome),
                selected: format!("{}:{}", selection.genome(), selection.chrom()),
            });
        }
        let (window, mutated) = self.prepare(request)?;
        if !tracker.is_current(ticket) {
            info!("selection changed while fetching, skipping scoring");
            return Ok(None);
        }
        let score = self.score(&mutated)?;
        let response = AnalysisResponse::new(&window, mutated, score);
        if tracker.publish(ticket, response.clone()) {
            Ok(Some(response))
        } else {
            Ok(None)
        }
    }

    /// Requested window or the default one centred on the variant.
    pub fn window_bounds(&self, request: &AnalysisRequest) -> Result<WindowBounds> {
        let bounds = match request.window {
            Some(window) => WindowBounds::new(window.start(), window.end())?,
            None => WindowBounds::centered(request.variant_position, self.window_size)?,
        };
        if !bounds.contains(request.variant_position) {
            return Err(Error::PositionOutsideWindow {
                position: request.variant_position,
                start: bounds.start(),
                end: bounds.end(),
            });
        }
        Ok(bounds)
    }

    fn prepare(&self, request: &AnalysisRequest) -> Result<(SequenceWindow, MutatedWindow)> {
        let bounds = self.window_bounds(request)?;
        let window = fetch_window(
            self.sequence_source.as_ref(),
            &request.genome,
            &request.chromosome,
            bounds,
        )?;
        let mutated = VariantSpec::new(request.variant_position, request.alternative_base)
            .apply(&window, request.reference_base)?;
        check_unambiguous(mutated.reference())?;
        check_unambiguous(mutated.variant())?;

        if let Some(max) = self.oracle.max_sequence_length() {
            if mutated.reference().len() > max {
                return Err(Error::ContextExceeded {
                    len: mutated.reference().len(),
                    max,
                });
            }
        }
        info!(
            "{}:{} {}>{} at offset {} of {}-{}",
            window.chrom(),
            request.variant_position,
            mutated.reference_base(),
            mutated.alternative_base(),
            mutated.offset(),
            window.start(),
            window.end()
        );
        Ok((window, mutated))
    }

    fn score(&self, mutated: &MutatedWindow) -> Result<ScoreResult> {
        let oracle = self.oracle.as_ref();
        let (reference, variant) = rayon::join(
            || oracle.score_sequence(mutated.reference()),
            || oracle.score_sequence(mutated.variant()),
        );
        let (reference, variant) = (reference?, variant?);
        info!(
            "{}: reference log-likelihood {}, variant log-likelihood {}",
            oracle.name(),
            *reference,
            *variant
        );
        Ok(self.scorer.score(reference, variant))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::oracle::{LogLikelihood, MarkovOracle, Reduction};
    use crate::scoring::ClassificationConfig;
    use crate::selection::Selection;
    use crate::sequence::tests::RecordingSource;

    /// Oracle counting its invocations, scoring by the number of G bases.
    struct CountingOracle {
        calls: Arc<AtomicUsize>,
        max_sequence_length: Option<usize>,
    }

    impl LikelihoodOracle for CountingOracle {
        fn score_sequence(&self, sequence: &str) -> Result<LogLikelihood> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LogLikelihood(
                -(sequence.bytes().filter(|b| *b == b'G').count() as f64),
            ))
        }

        fn max_sequence_length(&self) -> Option<usize> {
            self.max_sequence_length
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn pipeline(
        source: RecordingSource,
        max_sequence_length: Option<usize>,
    ) -> (AnalysisPipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = AnalysisPipelineBuilder::default()
            .sequence_source(Box::new(source))
            .oracle(Box::new(CountingOracle {
                calls: Arc::clone(&calls),
                max_sequence_length,
            }))
            .scorer(DeltaScorer::new(ClassificationConfig::default()))
            .window_size(8)
            .build()
            .unwrap();
        (pipeline, calls)
    }

    fn request(position: u64, alt: Base) -> AnalysisRequest {
        AnalysisRequest::new("hg38".to_owned(), "chr1".to_owned(), position, alt)
    }

    #[test]
    fn test_analyze() {
        // chr1:1-20
        let (pipeline, calls) = pipeline(RecordingSource::new(0, "ACATACATACATACATACAT"), None);
        let response = pipeline.analyze(&request(10, Base::G)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(response.window_start, 6);
        assert_eq!(response.window_end, 14);
        assert_eq!(response.reference_sequence, "CATACATAC");
        assert_eq!(response.variant_sequence, "CATAGATAC");
        assert_eq!(response.reference_base, Base::C);
        assert_eq!(response.alternative_base, Base::G);
        assert_eq!(response.delta, -1.0);
        assert_eq!(response.classification, Classification::LikelyPathogenic);
    }

    #[test]
    fn test_outside_window_never_calls_oracle() {
        let (pipeline, calls) = pipeline(RecordingSource::new(0, &"A".repeat(100)), None);
        let mut request = request(50, Base::G);
        request.window = Some(WindowBounds::new(1, 20).unwrap());
        let err = pipeline.analyze(&request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validation_errors_never_call_oracle() {
        let (pipeline, calls) = pipeline(RecordingSource::new(0, "ACATACANACATACATACAT"), None);
        // no-op substitution
        assert_eq!(
            pipeline.analyze(&request(10, Base::C)).unwrap_err().kind(),
            ErrorKind::Validation
        );
        // wrong reference base
        let mut mismatch = request(10, Base::G);
        mismatch.reference_base = Some(Base::T);
        assert_eq!(
            pipeline.analyze(&mismatch).unwrap_err().kind(),
            ErrorKind::Validation
        );
        // ambiguous base elsewhere in the window
        assert!(matches!(
            pipeline.analyze(&request(10, Base::G)).unwrap_err(),
            Error::AmbiguousBase { base: 'N', .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_context_exceeded() {
        let (pipeline, calls) = pipeline(RecordingSource::new(0, &"AC".repeat(50)), Some(5));
        let err = pipeline.analyze(&request(10, Base::G)).unwrap_err();
        assert_eq!(err, Error::ContextExceeded { len: 9, max: 5 });
        assert_eq!(err.kind(), ErrorKind::OracleResource);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_sequence() {
        // the service returns fewer bases than requested
        let (pipeline, calls) = pipeline(RecordingSource::new(0, "ACATAC"), None);
        let err = pipeline.analyze(&request(4, Base::G)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingData);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_superseded_selection() {
        let (pipeline, calls) = pipeline(RecordingSource::new(0, "ACATACATACATACATACAT"), None);
        let tracker = SelectionTracker::new();
        let selection = Selection::new("hg38".to_owned(), "chr1".to_owned(), None);
        let stale = tracker.select(selection.clone());
        let current = tracker.select(selection);

        assert_eq!(
            pipeline
                .analyze_tracked(&request(10, Base::G), &tracker, &stale)
                .unwrap(),
            None
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let response = pipeline
            .analyze_tracked(&request(10, Base::G), &tracker, &current)
            .unwrap()
            .unwrap();
        assert_eq!(tracker.current().unwrap().1, response);
    }

    #[test]
    fn test_request_outside_selection() {
        let (pipeline, calls) = pipeline(RecordingSource::new(0, "ACATACATACATACATACAT"), None);
        let tracker = SelectionTracker::new();
        let ticket = tracker.select(Selection::new("hg38".to_owned(), "chr2".to_owned(), None));

        let err = pipeline
            .analyze_tracked(&request(10, Base::G), &tracker, &ticket)
            .unwrap_err();
        assert_eq!(
            err,
            Error::SelectionMismatch {
                requested: "hg38:chr1".to_owned(),
                selected: "hg38:chr2".to_owned()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(tracker.current().is_none());

        let ticket = tracker.select(Selection::new("hg38".to_owned(), "1".to_owned(), None));
        assert!(pipeline
            .analyze_tracked(&request(10, Base::G), &tracker, &ticket)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_markov_pipeline_is_deterministic() {
        let pipeline = AnalysisPipelineBuilder::default()
            .sequence_source(Box::new(RecordingSource::new(0, "ACATACATACATACATACAT")))
            .oracle(Box::new(MarkovOracle::new(Reduction::Sum)))
            .scorer(DeltaScorer::new(ClassificationConfig::default()))
            .window_size(8)
            .build()
            .unwrap();
        let first = pipeline.analyze(&request(11, Base::G)).unwrap();
        let second = pipeline.analyze(&request(11, Base::G)).unwrap();
        assert_eq!(first, second);
        // CAT -> CGT creates a CpG
        assert!(first.delta < 0.0);
    }
}
