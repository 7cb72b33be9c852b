use std::convert::TryFrom;

use crate::errors::{Error, Result};
use crate::oracle::{LikelihoodOracle, LogLikelihood, Reduction};
use crate::variant::Base;

// Rows and columns ordered A, C, G, T. C->G is depleted, mimicking the CpG
// depletion of vertebrate genomes.
const TRANSITIONS: [[f64; 4]; 4] = [
    [0.30, 0.20, 0.25, 0.25],
    [0.30, 0.30, 0.08, 0.32],
    [0.28, 0.24, 0.26, 0.22],
    [0.22, 0.22, 0.26, 0.30],
];

const INITIAL: [f64; 4] = [0.25; 4];

/// First-order Markov chain over nucleotides.
///
/// Fully deterministic and local, this stands in for the foundation model when
/// running offline and in tests.
#[derive(Debug, Clone)]
pub struct MarkovOracle {
    initial: [f64; 4],
    transitions: [[f64; 4]; 4],
    reduction: Reduction,
}

impl MarkovOracle {
    pub fn new(reduction: Reduction) -> Self {
        MarkovOracle::with_probabilities(INITIAL, TRANSITIONS, reduction)
            .expect("bug: builtin transition table must be valid")
    }

    pub fn with_probabilities(
        initial: [f64; 4],
        transitions: [[f64; 4]; 4],
        reduction: Reduction,
    ) -> Result<Self> {
        let check = |row: &[f64; 4], what: &str| {
            let sum: f64 = row.iter().sum();
            if row.iter().any(|p| !(*p > 0.0)) || (sum - 1.0).abs() > 1e-6 {
                Err(Error::InvalidConfig {
                    msg: format!(
                        "{} must be positive probabilities summing to one, got {:?}",
                        what, row
                    ),
                })
            } else {
                Ok(())
            }
        };
        check(&initial, "initial probabilities")?;
        for row in &transitions {
            check(row, "transition probabilities")?;
        }

        Ok(MarkovOracle {
            initial: ln(initial),
            transitions: [
                ln(transitions[0]),
                ln(transitions[1]),
                ln(transitions[2]),
                ln(transitions[3]),
            ],
            reduction,
        })
    }

    /// Log-probability of each position given its predecessor.
    pub fn per_position(&self, sequence: &str) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(sequence.len());
        let mut previous: Option<Base> = None;
        for (offset, b) in sequence.bytes().enumerate() {
            let base = Base::try_from(b).map_err(|b| Error::AmbiguousBase {
                base: b as char,
                offset,
            })?;
            scores.push(match previous {
                None => self.initial[base.index()],
                Some(previous) => self.transitions[previous.index()][base.index()],
            });
            previous = Some(base);
        }
        Ok(scores)
    }
}

fn ln(row: [f64; 4]) -> [f64; 4] {
    [row[0].ln(), row[1].ln(), row[2].ln(), row[3].ln()]
}

impl LikelihoodOracle for MarkovOracle {
    fn score_sequence(&self, sequence: &str) -> Result<LogLikelihood> {
        self.reduction.reduce(&self.per_position(sequence)?)
    }

    fn name(&self) -> &str {
        "markov"
    }
}
