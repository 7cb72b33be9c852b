pub mod cache;
pub mod ncbi;

use crate::errors::Result;

pub use cache::{CachedCatalog, Clock, ManualClock, SystemClock, TtlCache};
pub use ncbi::NcbiCatalog;

#[derive(Debug, Clone, PartialEq, Eq, new, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct GeneSummary {
    symbol: String,
    name: String,
    chrom: String,
    description: String,
    /// Identifier in the external gene catalog.
    gene_id: String,
}

/// First genomic-info record of a gene detail entry. `start` and `stop` are
/// given as reported, i.e. `start > stop` for genes on the minus strand.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters)]
pub struct GenomicInfo {
    #[getset(get = "pub")]
    chrom: Option<String>,
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get_copy = "pub")]
    stop: u64,
}

/// A searchable gene catalog.
pub trait GeneCatalog: Send + Sync {
    /// Genes matching the query text, best matches first.
    fn search(&self, query: &str, genome: &str) -> Result<Vec<GeneSummary>>;

    /// Genomic location of the gene, or `None` if the catalog has none on record.
    fn genomic_info(&self, gene_id: &str) -> Result<Option<GenomicInfo>>;
}
