//! Reference sequence windows.
//!
//! Windows are given in 1-based, inclusive coordinates (the convention of the gene
//! catalog). Sequence services are queried with 0-based, half-open intervals, so
//! `[start, end]` becomes `[start - 1, end)`.

use std::cmp;

use bio_types::genome::{self, AbstractInterval};

use crate::errors::{Error, Result};
use crate::utils;

/// A 1-based, inclusive genomic interval without sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct WindowBounds {
    start: u64,
    end: u64,
}

impl WindowBounds {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start == 0 || end < start {
            return Err(Error::InvalidWindow { start, end });
        }
        Ok(WindowBounds { start, end })
    }

    /// Window of `size` bases centred on the given 1-based position, i.e.
    /// `size / 2` bases upstream and downstream. The start is clamped at the
    /// beginning of the chromosome.
    pub fn centered(position: u64, size: u64) -> Result<Self> {
        if position == 0 {
            return Err(Error::InvalidWindow {
                start: position,
                end: position,
            });
        }
        let half = size / 2;
        let end = position.checked_add(half).ok_or(Error::InvalidWindow {
            start: position.saturating_sub(half),
            end: u64::MAX,
        })?;
        WindowBounds::new(cmp::max(1, position.saturating_sub(half)), end)
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }

    /// 0-based, half-open interval as expected by the sequence service.
    pub fn to_interval(&self, chrom: &str) -> genome::Interval {
        genome::Interval::new(utils::with_chr_prefix(chrom), self.start - 1..self.end)
    }
}

/// Reference sequence of a window. The sequence is uppercase and its length
/// always matches the window.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SequenceWindow {
    #[getset(get = "pub")]
    chrom: String,
    bounds: WindowBounds,
    #[getset(get = "pub")]
    sequence: String,
}

impl SequenceWindow {
    pub fn new(chrom: &str, start: u64, end: u64, sequence: String) -> Result<Self> {
        SequenceWindow::from_bounds(chrom, WindowBounds::new(start, end)?, sequence)
    }

    pub fn from_bounds(chrom: &str, bounds: WindowBounds, sequence: String) -> Result<Self> {
        let chrom = utils::with_chr_prefix(chrom);
        if sequence.len() as u64 != bounds.len() {
            return Err(Error::SequenceLengthMismatch {
                chrom,
                start: bounds.start(),
                end: bounds.end(),
                expected: bounds.len(),
                observed: sequence.len() as u64,
            });
        }
        Ok(SequenceWindow {
            chrom,
            bounds,
            sequence: sequence.to_ascii_uppercase(),
        })
    }

    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    pub fn start(&self) -> u64 {
        self.bounds.start()
    }

    pub fn end(&self) -> u64 {
        self.bounds.end()
    }
}

/// A service that returns reference sequence for half-open, 0-based intervals.
pub trait SequenceSource: Send + Sync {
    /// Return the raw sequence of the interval. A service-side error or a
    /// response without sequence yields `Error::MissingSequence`.
    fn fetch(&self, genome: &str, interval: &genome::Interval) -> Result<String>;
}

/// Fetch the reference sequence of a 1-based, inclusive window.
pub fn fetch_window(
    source: &dyn SequenceSource,
    genome: &str,
    chrom: &str,
    bounds: WindowBounds,
) -> Result<SequenceWindow> {
    let interval = bounds.to_interval(chrom);
    debug!(
        "fetching {}:{}-{} ({}), query interval {:?}",
        interval.contig(),
        bounds.start(),
        bounds.end(),
        genome,
        interval.range()
    );
    let sequence = source.fetch(genome, &interval)?;
    let window = SequenceWindow::from_bounds(interval.contig(), bounds, sequence)?;
    info!(
        "loaded reference window {}:{}-{} ({} bases)",
        window.chrom(),
        window.start(),
        window.end(),
        window.sequence().len()
    );
    Ok(window)
}
