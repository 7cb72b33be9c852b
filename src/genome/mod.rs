pub mod ucsc;

use std::cmp::Ordering;

use itertools::Itertools;
use regex::Regex;

use crate::errors::Result;
use crate::utils;

pub use ucsc::UcscClient;

lazy_static! {
    /// Alternate haplotypes, unplaced and unlocalized scaffolds.
    static ref NON_PRIMARY_CONTIG: Regex = Regex::new(r"_|random|Un").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters, Serialize, Deserialize)]
pub struct GenomeAssembly {
    #[getset(get = "pub")]
    id: String,
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    source_name: String,
    #[getset(get = "pub")]
    organism: String,
    #[getset(get_copy = "pub")]
    active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, new, Getters, CopyGetters, Serialize, Deserialize)]
pub struct Chromosome {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    size: u64,
}

impl Chromosome {
    /// Whether this is a primary assembly chromosome, i.e. not an alternate
    /// haplotype, unplaced or unlocalized scaffold.
    pub fn is_primary(&self) -> bool {
        !NON_PRIMARY_CONTIG.is_match(&self.name)
    }

    fn number(&self) -> Option<u64> {
        utils::strip_chr_prefix(&self.name).parse().ok()
    }
}

/// Display order: numbered chromosomes ascending, followed by the others
/// (e.g. M, X, Y) in lexical order of their name without `chr` prefix.
pub fn chromosome_order(a: &Chromosome, b: &Chromosome) -> Ordering {
    match (a.number(), b.number()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => utils::strip_chr_prefix(&a.name).cmp(utils::strip_chr_prefix(&b.name)),
    }
}

/// Keep primary chromosomes and sort them for display.
pub fn primary_chromosomes(chromosomes: impl IntoIterator<Item = Chromosome>) -> Vec<Chromosome> {
    chromosomes
        .into_iter()
        .filter(Chromosome::is_primary)
        .sorted_by(chromosome_order)
        .collect_vec()
}

/// A genome browser service listing assemblies and their chromosomes.
pub trait GenomeBrowser: Send + Sync {
    /// All assemblies of the given organism (case-insensitive match).
    fn assemblies(&self, organism: &str) -> Result<Vec<GenomeAssembly>>;

    /// Primary chromosomes of the assembly in display order.
    fn chromosomes(&self, genome: &str) -> Result<Vec<Chromosome>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrom(name: &str) -> Chromosome {
        Chromosome::new(name.to_owned(), 1000)
    }

    #[test]
    fn test_primary_filter() {
        assert!(chrom("chr1").is_primary());
        assert!(chrom("chrX").is_primary());
        assert!(!chrom("chr1_KI270706v1_random").is_primary());
        assert!(!chrom("chrUn_GL000195v1").is_primary());
        assert!(!chrom("chr17_KI270909v1_alt").is_primary());
        assert!(!chrom("chr4_random").is_primary());
    }

    #[test]
    fn test_order() {
        let chromosomes = vec![
            "chrY", "chr10", "chrM", "chr2", "chr1", "chrX", "chr22", "chrUn_KI270302v1",
            "chr1_KI270706v1_random",
        ]
        .into_iter()
        .map(chrom);
        let names = primary_chromosomes(chromosomes)
            .into_iter()
            .map(|c| c.name().to_owned())
            .collect_vec();
        assert_eq!(
            names,
            vec!["chr1", "chr2", "chr10", "chr22", "chrM", "chrX", "chrY"]
        );
    }
}
