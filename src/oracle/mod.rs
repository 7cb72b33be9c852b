//! Sequence likelihood oracles.
//!
//! An oracle assigns a log-likelihood to a nucleotide sequence under a pretrained
//! sequence model. The pipeline treats it as a black box, so that the remote model
//! can be swapped for a deterministic local model in tests.

pub mod markov;
pub mod remote;

use ordered_float::NotNan;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::{Error, Result};

pub use markov::MarkovOracle;
pub use remote::RemoteOracle;

/// A finite log-likelihood.
pub type LogLikelihood = NotNan<f64>;

/// Log-likelihood from a literal value. Panics on NaN, so only use this for values
/// known to be valid. Values from an oracle go through `checked_log_likelihood`.
#[allow(non_snake_case)]
pub fn LogLikelihood(value: f64) -> LogLikelihood {
    NotNan::new(value).unwrap()
}

pub fn checked_log_likelihood(value: f64) -> Result<LogLikelihood> {
    if !value.is_finite() {
        return Err(Error::InvalidLikelihood {
            msg: format!("{} is not a finite number", value),
        });
    }
    NotNan::new(value).map_err(|e| Error::InvalidLikelihood { msg: e.to_string() })
}

/// How per-position log-likelihoods are combined into a sequence score.
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
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Mean log-likelihood per position.
    Mean,
    /// Total log-likelihood of the sequence.
    Sum,
}

impl Default for Reduction {
    fn default() -> Self {
        Reduction::Mean
    }
}

impl Reduction {
    pub fn reduce(self, per_position: &[f64]) -> Result<LogLikelihood> {
        if per_position.is_empty() {
            return Err(Error::InvalidLikelihood {
                msg: "no per-position log-likelihoods".to_owned(),
            });
        }
        let sum: f64 = per_position.iter().sum();
        checked_log_likelihood(match self {
            Reduction::Mean => sum / per_position.len() as f64,
            Reduction::Sum => sum,
        })
    }
}

/// Capability to score a nucleotide sequence.
///
/// Implementations must be deterministic for a given sequence, as the reference
/// and variant scores are compared directly.
pub trait LikelihoodOracle: Send + Sync {
    /// Log-likelihood of a sequence over A, C, G, T.
    fn score_sequence(&self, sequence: &str) -> Result<LogLikelihood>;

    /// Longest sequence the oracle accepts, if limited.
    fn max_sequence_length(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reduce() {
        let values = [-1.0, -2.0, -3.0, -2.0];
        assert_relative_eq!(*Reduction::Mean.reduce(&values).unwrap(), -2.0);
        assert_relative_eq!(*Reduction::Sum.reduce(&values).unwrap(), -8.0);
        assert!(Reduction::Mean.reduce(&[]).is_err());
        assert!(Reduction::Sum.reduce(&[-1.0, f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_checked() {
        assert!(checked_log_likelihood(f64::NAN).is_err());
        assert!(checked_log_likelihood(f64::INFINITY).is_err());
        assert_relative_eq!(*checked_log_likelihood(-0.5).unwrap(), -0.5);
    }

    #[test]
    fn test_reduction_names() {
        assert_eq!("sum".parse::<Reduction>().unwrap(), Reduction::Sum);
        assert_eq!(Reduction::Mean.to_string(), "mean");
    }
}
