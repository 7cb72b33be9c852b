// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Derivation of the classification threshold from variants with known
//! functional class.
//!
//! Loss-of-function variants are the positive class. Since more negative deltas
//! indicate pathogenicity, the ROC curve is computed on `-delta` and the optimal
//! threshold (maximal Youden's J) is transformed back to the delta scale.

use std::io;
use std::path::Path;

use itertools::{iproduct, Itertools};
use ordered_float::NotNan;
use statrs::statistics::Statistics;

use crate::errors::{Error, Result};
use crate::scoring::ClassificationConfig;

/// Functional class as reported by saturation genome editing assays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionalClass {
    #[serde(rename = "LOF")]
    LossOfFunction,
    #[serde(rename = "INT")]
    Intermediate,
    #[serde(rename = "FUNC")]
    Functional,
    #[serde(rename = "FUNC/INT")]
    FunctionalOrIntermediate,
}

impl FunctionalClass {
    pub fn is_loss_of_function(self) -> bool {
        self == FunctionalClass::LossOfFunction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, new, Serialize, Deserialize)]
pub struct LabeledDelta {
    pub delta: f64,
    pub class: FunctionalClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub classification: ClassificationConfig,
    pub auroc: f64,
    pub loss_of_function: usize,
    pub functional: usize,
}

pub fn read_labeled_deltas<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledDelta>> {
    let reader = csv::Reader::from_path(path.as_ref()).map_err(|e| Error::Calibration {
        msg: format!("cannot read {}: {}", path.as_ref().display(), e),
    })?;
    labeled_deltas(reader)
}

pub fn labeled_deltas_from_reader<R: io::Read>(reader: R) -> Result<Vec<LabeledDelta>> {
    labeled_deltas(csv::Reader::from_reader(reader))
}

fn labeled_deltas<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<LabeledDelta>> {
    reader
        .deserialize()
        .map(|record| {
            record.map_err(|e| Error::Calibration {
                msg: format!("invalid record: {}", e),
            })
        })
        .collect()
}

fn scores(records: &[LabeledDelta], positive: bool) -> Vec<f64> {
    records
        .iter()
        .filter(|r| r.class.is_loss_of_function() == positive)
        .map(|r| -r.delta)
        .collect()
}

/// Delta threshold maximizing Youden's J (`tpr - fpr`).
///
/// Candidates are `+inf` followed by the distinct scores in descending order; on
/// ties, the first (i.e. most stringent) candidate wins.
pub fn youden_threshold(records: &[LabeledDelta]) -> Result<f64> {
    let positives = scores(records, true);
    let negatives = scores(records, false);
    if positives.is_empty() || negatives.is_empty() {
        return Err(Error::Calibration {
            msg: "both loss-of-function and functional variants are required".to_owned(),
        });
    }
    let candidates = records
        .iter()
        .map(|r| NotNan::new(-r.delta))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::Calibration {
            msg: "delta must not be NaN".to_owned(),
        })?
        .into_iter()
        .sorted_by(|a, b| b.cmp(a))
        .dedup()
        .map(|t| *t);

    // J = tp / P - fp / N, compared as tp * N - fp * P to stay exact
    let count = |scores: &[f64], threshold: f64| {
        scores.iter().filter(|s| **s >= threshold).count() as i64
    };
    let (p, n) = (positives.len() as i64, negatives.len() as i64);
    let mut best = (f64::INFINITY, 0);
    for threshold in candidates {
        let j = count(&positives, threshold) * n - count(&negatives, threshold) * p;
        if j > best.1 {
            best = (threshold, j);
        }
    }
    if best.0.is_infinite() {
        return Err(Error::Calibration {
            msg: "deltas do not separate loss-of-function from functional variants".to_owned(),
        });
    }
    debug!(
        "Youden's J {} at score threshold {}",
        best.1 as f64 / (p * n) as f64,
        best.0
    );
    Ok(-best.0)
}

/// Area under the ROC curve of `-delta`, i.e. the probability that a random
/// loss-of-function variant has a lower delta than a random functional one.
pub fn auroc(records: &[LabeledDelta]) -> f64 {
    let positives = scores(records, true);
    let negatives = scores(records, false);
    let wins: f64 = iproduct!(positives.iter(), negatives.iter())
        .map(|(p, n)| {
            if p > n {
                1.0
            } else if p == n {
                0.5
            } else {
                0.0
            }
        })
        .sum();
    wins / (positives.len() * negatives.len()) as f64
}

pub fn calibrate(records: &[LabeledDelta], uncertain_margin: f64) -> Result<CalibrationReport> {
    let lof = records
        .iter()
        .filter(|r| r.class.is_loss_of_function())
        .map(|r| r.delta)
        .collect_vec();
    let func = records
        .iter()
        .filter(|r| !r.class.is_loss_of_function())
        .map(|r| r.delta)
        .collect_vec();
    if lof.len() < 2 || func.len() < 2 {
        return Err(Error::Calibration {
            msg: format!(
                "at least two variants per class are required, got {} loss-of-function and {} functional",
                lof.len(),
                func.len()
            ),
        });
    }

    let classification = ClassificationConfig {
        threshold: youden_threshold(records)?,
        uncertain_margin,
        lof_std: lof.iter().std_dev(),
        func_std: func.iter().std_dev(),
    };
    classification.validate()?;
    let report = CalibrationReport {
        classification,
        auroc: auroc(records),
        loss_of_function: lof.len(),
        functional: func.len(),
    };
    info!(
        "calibrated threshold {} on {} LOF and {} FUNC/INT variants (AUROC {:.3})",
        report.classification.threshold, report.loss_of_function, report.functional, report.auroc
    );
    Ok(report)
}
