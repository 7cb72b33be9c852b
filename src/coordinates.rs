use std::cmp;

use crate::catalog::{GeneCatalog, GenomicInfo};
use crate::errors::Result;
use crate::sequence::WindowBounds;

/// Genomic span of a gene (1-based, inclusive). Always `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct GeneBounds {
    min: u64,
    max: u64,
}

impl GeneBounds {
    /// Bounds from the start and stop reported by the catalog, which are
    /// swapped for genes on the minus strand.
    pub fn from_unordered(start: u64, stop: u64) -> Self {
        GeneBounds {
            min: cmp::min(start, stop),
            max: cmp::max(start, stop),
        }
    }

    pub fn span(&self) -> u64 {
        self.max - self.min
    }

    /// Default window to inspect: the whole gene, or its first `cap + 1` bases
    /// if the gene spans more than `cap` bases.
    pub fn initial_window(&self, cap: u64) -> Result<WindowBounds> {
        let end = if self.span() > cap {
            self.min + cap
        } else {
            self.max
        };
        WindowBounds::new(self.min, end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct ResolvedGene {
    #[getset(get = "pub")]
    chrom: Option<String>,
    #[getset(get_copy = "pub")]
    bounds: GeneBounds,
    #[getset(get_copy = "pub")]
    initial_window: WindowBounds,
}

impl ResolvedGene {
    pub fn from_genomic_info(info: &GenomicInfo, max_initial_window: u64) -> Result<Self> {
        let bounds = GeneBounds::from_unordered(info.start(), info.stop());
        Ok(ResolvedGene {
            chrom: info.chrom().clone(),
            bounds,
            initial_window: bounds.initial_window(max_initial_window)?,
        })
    }
}

/// Maps gene identifiers of a catalog to genomic bounds.
pub struct CoordinateResolver<'a> {
    catalog: &'a dyn GeneCatalog,
    max_initial_window: u64,
}

impl<'a> CoordinateResolver<'a> {
    pub fn new(catalog: &'a dyn GeneCatalog, max_initial_window: u64) -> Self {
        CoordinateResolver {
            catalog,
            max_initial_window,
        }
    }

    /// Resolve the gene, returning `Ok(None)` if the catalog has no genomic
    /// location for it.
    pub fn resolve(&self, gene_id: &str) -> Result<Option<ResolvedGene>> {
        match self.catalog.genomic_info(gene_id)? {
            Some(info) => {
                let resolved = ResolvedGene::from_genomic_info(&info, self.max_initial_window)?;
                info!(
                    "gene {} spans {}-{}, initial window {}-{}",
                    gene_id,
                    resolved.bounds.min(),
                    resolved.bounds.max(),
                    resolved.initial_window.start(),
                    resolved.initial_window.end()
                );
                Ok(Some(resolved))
            }
            None => {
                warn!("no genomic location on record for gene {}", gene_id);
                Ok(None)
            }
        }
    }
}
