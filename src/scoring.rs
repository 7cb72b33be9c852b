//! Reduction of the reference and variant log-likelihoods to a delta score and a
//! pathogenicity class.
//!
//! Under an autoregressive model, a substitution that makes the window less
//! probable (negative delta) is taken as disrupting a learned functional pattern.
//! The more negative the delta, the more likely the variant is pathogenic.

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::{Error, Result};
use crate::oracle::LogLikelihood;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum Classification {
    #[strum(serialize = "Likely Pathogenic")]
    #[serde(rename = "Likely Pathogenic")]
    LikelyPathogenic,
    #[strum(serialize = "Uncertain")]
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[strum(serialize = "Likely Benign")]
    #[serde(rename = "Likely Benign")]
    LikelyBenign,
}

/// Decision boundary on the delta scale, plus the per-class spreads used to turn
/// the distance from the boundary into a confidence.
///
/// The defaults were obtained from 500 BRCA1 SNVs with known functional class
/// (see `calibration`), and are expected to be recalibrated for other loci.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassificationConfig {
    pub threshold: f64,
    /// Half-width of the band around the threshold that is reported as uncertain.
    pub uncertain_margin: f64,
    pub lof_std: f64,
    pub func_std: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        ClassificationConfig {
            threshold: -0.0009178519,
            uncertain_margin: 0.0,
            lof_std: 0.0015140239,
            func_std: 0.0009016589,
        }
    }
}

impl ClassificationConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig { msg });
        if !self.threshold.is_finite() {
            return invalid(format!(
                "classification threshold must be finite, got {}",
                self.threshold
            ));
        }
        if !(self.uncertain_margin >= 0.0 && self.uncertain_margin.is_finite()) {
            return invalid(format!(
                "uncertain margin must be a non-negative number, got {}",
                self.uncertain_margin
            ));
        }
        if !(self.lof_std > 0.0 && self.func_std > 0.0) {
            return invalid(format!(
                "class standard deviations must be positive, got lof_std={} func_std={}",
                self.lof_std, self.func_std
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct ScoreResult {
    #[getset(get_copy = "pub")]
    reference_log_likelihood: f64,
    #[getset(get_copy = "pub")]
    variant_log_likelihood: f64,
    #[getset(get_copy = "pub")]
    delta: f64,
    #[getset(get_copy = "pub")]
    classification: Classification,
    #[getset(get_copy = "pub")]
    confidence: f64,
}

#[derive(Debug, Clone, new)]
pub struct DeltaScorer {
    config: ClassificationConfig,
}

impl DeltaScorer {
    pub fn from_config(config: &ClassificationConfig) -> Result<Self> {
        config.validate()?;
        Ok(DeltaScorer::new(config.clone()))
    }

    pub fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    pub fn classify(&self, delta: f64) -> Classification {
        let threshold = self.config.threshold;
        let margin = self.config.uncertain_margin;
        if delta < threshold - margin {
            Classification::LikelyPathogenic
        } else if delta < threshold + margin {
            Classification::Uncertain
        } else {
            Classification::LikelyBenign
        }
    }

    /// Distance from the threshold in units of the predicted class' spread, capped at 1.
    pub fn confidence(&self, delta: f64, classification: Classification) -> f64 {
        let distance = (delta - self.config.threshold).abs();
        match classification {
            Classification::LikelyPathogenic => (distance / self.config.lof_std).min(1.0),
            Classification::LikelyBenign => (distance / self.config.func_std).min(1.0),
            Classification::Uncertain => 0.0,
        }
    }

    pub fn score(&self, reference: LogLikelihood, variant: LogLikelihood) -> ScoreResult {
        let delta = *variant - *reference;
        let classification = self.classify(delta);
        let confidence = self.confidence(delta, classification);
        debug!(
            "delta={} ({} - {}), classified as {} with confidence {:.3}",
            delta, *variant, *reference, classification, confidence
        );

        ScoreResult {
            reference_log_likelihood: *reference,
            variant_log_likelihood: *variant,
            delta,
            classification,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LogLikelihood;
    use approx::assert_relative_eq;

    fn scorer() -> DeltaScorer {
        DeltaScorer::from_config(&ClassificationConfig::default()).unwrap()
    }

    #[test]
    fn test_delta_sign() {
        let result = scorer().score(LogLikelihood(-50.0), LogLikelihood(-70.0));
        assert_relative_eq!(result.delta(), -20.0);
        assert_eq!(result.classification(), Classification::LikelyPathogenic);
        assert_relative_eq!(result.confidence(), 1.0);
        assert_relative_eq!(result.reference_log_likelihood(), -50.0);
        assert_relative_eq!(result.variant_log_likelihood(), -70.0);
    }

    #[test]
    fn test_gain_is_benign() {
        let result = scorer().score(LogLikelihood(-1.30), LogLikelihood(-1.29));
        assert_eq!(result.classification(), Classification::LikelyBenign);
    }

    #[test]
    fn test_threshold_is_benign() {
        let scorer = scorer();
        let threshold = scorer.config().threshold;
        assert_eq!(scorer.classify(threshold), Classification::LikelyBenign);
        assert_relative_eq!(
            scorer.confidence(threshold, Classification::LikelyBenign),
            0.0
        );
    }

    #[test]
    fn test_confidence_scales_with_class_std() {
        let scorer = scorer();
        let config = scorer.config().clone();
        let delta = config.threshold - config.lof_std / 2.0;
        assert_eq!(scorer.classify(delta), Classification::LikelyPathogenic);
        assert_relative_eq!(
            scorer.confidence(delta, Classification::LikelyPathogenic),
            0.5,
            epsilon = 1e-9
        );
        let delta = config.threshold + config.func_std / 4.0;
        assert_relative_eq!(
            scorer.confidence(delta, Classification::LikelyBenign),
            0.25,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_uncertain_band() {
        let scorer = DeltaScorer::from_config(&ClassificationConfig {
            threshold: -1.0,
            uncertain_margin: 0.5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(scorer.classify(-1.6), Classification::LikelyPathogenic);
        assert_eq!(scorer.classify(-1.5), Classification::Uncertain);
        assert_eq!(scorer.classify(-0.6), Classification::Uncertain);
        assert_eq!(scorer.classify(-0.5), Classification::LikelyBenign);
        assert_relative_eq!(scorer.confidence(-0.9, Classification::Uncertain), 0.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(DeltaScorer::from_config(&ClassificationConfig {
            threshold: f64::NAN,
            ..Default::default()
        })
        .is_err());
        assert!(DeltaScorer::from_config(&ClassificationConfig {
            uncertain_margin: -0.1,
            ..Default::default()
        })
        .is_err());
        assert!(DeltaScorer::from_config(&ClassificationConfig {
            func_std: 0.0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            Classification::LikelyPathogenic.to_string(),
            "Likely Pathogenic"
        );
        assert_eq!(
            "Likely Benign".parse::<Classification>().unwrap(),
            Classification::LikelyBenign
        );
        assert_eq!(
            serde_json::to_string(&Classification::Uncertain).unwrap(),
            "\"Uncertain\""
        );
    }
}
