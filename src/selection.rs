//! Tracking of the current gene/genome selection.
//!
//! Every selection change bumps a generation counter. Requests carry a `Ticket`
//! with the generation they were issued for; results for a superseded generation
//! are discarded instead of replacing the current analysis.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq, Hash, new, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Selection {
    genome: String,
    chrom: String,
    gene_id: Option<String>,
}

impl Selection {
    /// Whether a locus on the given genome and chromosome belongs to this selection.
    /// Chromosomes are compared with or without the `chr` prefix.
    pub fn covers(&self, genome: &str, chrom: &str) -> bool {
        self.genome == genome
            && utils::strip_chr_prefix(&self.chrom) == utils::strip_chr_prefix(chrom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Ticket {
    #[getset(get_copy = "pub")]
    generation: u64,
    #[getset(get = "pub")]
    selection: Selection,
}

/// Holds the current selection generation and the latest result published for it.
#[derive(Debug)]
pub struct SelectionTracker<T> {
    generation: AtomicU64,
    current: Mutex<Option<(Ticket, T)>>,
}

impl<T> Default for SelectionTracker<T> {
    fn default() -> Self {
        SelectionTracker {
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }
}

impl<T: Clone> SelectionTracker<T> {
    pub fn new() -> Self {
        SelectionTracker::default()
    }

    /// Switch to a new selection. All earlier tickets become stale and the
    /// current result is dropped.
    pub fn select(&self, selection: Selection) -> Ticket {
        let mut current = self.current.lock().unwrap();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *current = None;
        debug!("selection {:?} is generation {}", selection, generation);
        Ticket {
            generation,
            selection,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Store the result if the ticket is still current. Returns whether it was stored.
    pub fn publish(&self, ticket: &Ticket, value: T) -> bool {
        let mut current = self.current.lock().unwrap();
        if !self.is_current(ticket) {
            info!(
                "discarding result for superseded selection (generation {})",
                ticket.generation
            );
            return false;
        }
        *current = Some((ticket.clone(), value));
        true
    }

    pub fn current(&self) -> Option<(Ticket, T)> {
        self.current.lock().unwrap().clone()
    }
}
