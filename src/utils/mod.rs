pub(crate) mod http;

/// Add the UCSC `chr` prefix to a chromosome name, unless it is already there.
pub fn with_chr_prefix(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_owned()
    } else {
        format!("chr{}", chrom)
    }
}

/// Chromosome name without the UCSC `chr` prefix.
pub fn strip_chr_prefix(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chr_prefix() {
        assert_eq!(with_chr_prefix("17"), "chr17");
        assert_eq!(with_chr_prefix("chr17"), "chr17");
        assert_eq!(with_chr_prefix("X"), "chrX");
        assert_eq!(strip_chr_prefix("chrM"), "M");
        assert_eq!(strip_chr_prefix("12"), "12");
    }
}
