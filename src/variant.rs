// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::convert::TryFrom;
use std::str::FromStr;

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::{Error, Result};
use crate::sequence::SequenceWindow;

/// Unambiguous nucleotide.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    /// Rank in alphabetical order, used to index per-base tables.
    pub fn index(self) -> usize {
        match self {
            Base::A => 0,
            Base::C => 1,
            Base::G => 2,
            Base::T => 3,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Parse a base, rejecting the user's input as a whole if it is not one of A, C, G, T.
    pub fn parse(value: &str) -> Result<Self> {
        Base::from_str(value.trim()).map_err(|_| Error::InvalidBase {
            value: value.to_owned(),
        })
    }
}

impl TryFrom<u8> for Base {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value.to_ascii_uppercase() {
            b'A' => Ok(Base::A),
            b'C' => Ok(Base::C),
            b'G' => Ok(Base::G),
            b'T' => Ok(Base::T),
            _ => Err(value),
        }
    }
}

/// A single-nucleotide substitution at a 1-based genomic position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct VariantSpec {
    position: u64,
    alternative: Base,
}

/// Reference and mutated sequence of a window, differing at exactly one offset.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct MutatedWindow {
    #[getset(get = "pub")]
    reference: String,
    #[getset(get = "pub")]
    variant: String,
    #[getset(get_copy = "pub")]
    offset: usize,
    #[getset(get_copy = "pub")]
    reference_base: Base,
    #[getset(get_copy = "pub")]
    alternative_base: Base,
}

impl MutatedWindow {
    /// Reference and variant sequence.
    pub fn into_sequences(self) -> (String, String) {
        (self.reference, self.variant)
    }
}

/// Ensure that a sequence only contains A, C, G and T, as the likelihood oracle
/// is not guaranteed to handle ambiguity codes.
pub fn check_unambiguous(sequence: &str) -> Result<()> {
    match sequence
        .bytes()
        .enumerate()
        .find(|(_, b)| Base::try_from(*b).is_err())
    {
        Some((offset, b)) => Err(Error::AmbiguousBase {
            base: b as char,
            offset,
        }),
        None => Ok(()),
    }
}

impl VariantSpec {
    /// Offset of the variant within the given window, if it lies inside.
    pub fn offset_in(&self, window: &SequenceWindow) -> Result<usize> {
        let outside = || Error::PositionOutsideWindow {
            position: self.position,
            start: window.start(),
            end: window.end(),
        };
        if self.position < window.start() {
            return Err(outside());
        }
        let offset = (self.position - window.start()) as usize;
        if offset >= window.sequence().len() {
            return Err(outside());
        }
        Ok(offset)
    }

    /// Substitute the alternative base into the window's sequence.
    ///
    /// Fails if the position is outside the window, if the reference base at the
    /// position is ambiguous or differs from `expected_reference`, or if the
    /// substitution would not change the sequence.
    pub fn apply(
        &self,
        window: &SequenceWindow,
        expected_reference: Option<Base>,
    ) -> Result<MutatedWindow> {
        let offset = self.offset_in(window)?;
        let reference = window.sequence();
        let observed = reference.as_bytes()[offset];
        let reference_base = Base::try_from(observed).map_err(|b| Error::AmbiguousBase {
            base: b as char,
            offset,
        })?;

        if let Some(expected) = expected_reference {
            if expected != reference_base {
                return Err(Error::ReferenceMismatch {
                    position: self.position,
                    expected: expected.as_char(),
                    observed: reference_base.as_char(),
                });
            }
        }
        if reference_base == self.alternative {
            return Err(Error::NoOpSubstitution {
                position: self.position,
                base: reference_base.as_char(),
            });
        }

        let mut variant = String::with_capacity(reference.len());
        variant.push_str(&reference[..offset]);
        variant.push(self.alternative.as_char());
        variant.push_str(&reference[offset + 1..]);

        Ok(MutatedWindow {
            reference: reference.to_owned(),
            variant,
            offset,
            reference_base,
            alternative_base: self.alternative,
        })
    }
}
