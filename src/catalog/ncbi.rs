use serde_json::Value;

use crate::catalog::{GeneCatalog, GeneSummary, GenomicInfo};
use crate::config::{CatalogConfig, HttpConfig};
use crate::errors::{malformed, Result};
use crate::utils;
use crate::utils::http::JsonClient;

const SERVICE: &str = "NCBI gene catalog";

// Display fields of a search hit, in this order.
const DISPLAY_FIELDS: &str = "chromosome,Symbol,description,map_location,type_of_gene";

/// NCBI gene catalog, searched through the Clinical Tables API and resolved
/// through Entrez esummary.
pub struct NcbiCatalog {
    client: JsonClient,
    search_url: String,
    detail_url: String,
    limit: usize,
}

impl NcbiCatalog {
    pub fn new(config: &CatalogConfig, http: &HttpConfig) -> Result<Self> {
        Ok(NcbiCatalog {
            client: JsonClient::new(SERVICE, http)?,
            search_url: config.search_url.clone(),
            detail_url: config.detail_url.clone(),
            limit: config.search_limit,
        })
    }
}

impl GeneCatalog for NcbiCatalog {
    fn search(&self, query: &str, genome: &str) -> Result<Vec<GeneSummary>> {
        debug!("searching genes matching '{}' ({})", query, genome);
        let response: Value = self.client.get(
            &self.search_url,
            &[
                ("terms", query.to_owned()),
                ("df", DISPLAY_FIELDS.to_owned()),
                ("ef", "GeneID".to_owned()),
                ("maxList", self.limit.to_string()),
            ],
        )?;
        summaries_of(&response, self.limit)
    }

    fn genomic_info(&self, gene_id: &str) -> Result<Option<GenomicInfo>> {
        let response: Value = self.client.get(
            &self.detail_url,
            &[
                ("db", "gene".to_owned()),
                ("id", gene_id.to_owned()),
                ("retmode", "json".to_owned()),
            ],
        )?;
        genomic_info_of(&response, gene_id)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a Clinical Tables search response:
/// `[total, [codes], {"GeneID": [...]}, [[display fields...], ...]]`.
fn summaries_of(response: &Value, limit: usize) -> Result<Vec<GeneSummary>> {
    let parts = response
        .as_array()
        .filter(|parts| parts.len() >= 4)
        .ok_or_else(|| malformed(SERVICE, "search response is not a four element array"))?;
    let total = parts[0]
        .as_u64()
        .ok_or_else(|| malformed(SERVICE, "search response lacks the number of hits"))?;
    if total == 0 {
        return Ok(Vec::new());
    }
    let gene_ids = parts[2]
        .get("GeneID")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let rows = parts[3]
        .as_array()
        .ok_or_else(|| malformed(SERVICE, "search response lacks display rows"))?;

    let n = limit.min(total as usize).min(rows.len());
    let mut genes = Vec::with_capacity(n);
    for (i, row) in rows.iter().take(n).enumerate() {
        let field = |j: usize| row.get(j).and_then(as_text).unwrap_or_default();
        let chrom = field(0);
        let chrom = if chrom.is_empty() {
            chrom
        } else {
            utils::with_chr_prefix(&chrom)
        };
        let map_location = field(3);
        let gene_type = field(4);
        let description = match (map_location.is_empty(), gene_type.is_empty()) {
            (false, false) => format!("{} ({})", map_location, gene_type),
            (false, true) => map_location,
            (true, _) => gene_type,
        };
        genes.push(GeneSummary::new(
            field(1),
            field(2),
            chrom,
            description,
            gene_ids.get(i).and_then(as_text).unwrap_or_default(),
        ));
    }
    Ok(genes)
}

/// Parse an esummary response and take the first genomic-info record of the gene.
fn genomic_info_of(response: &Value, gene_id: &str) -> Result<Option<GenomicInfo>> {
    let result = response
        .get("result")
        .ok_or_else(|| malformed(SERVICE, "esummary response lacks 'result'"))?;
    let entry = match result.get(gene_id) {
        Some(entry) => entry,
        None => return Ok(None),
    };
    let record = match entry
        .get("genomicinfo")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
    {
        Some(record) => record,
        None => return Ok(None),
    };

    let coordinate = |name: &str| {
        record
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(SERVICE, format!("genomic info lacks '{}'", name)))
    };
    let chrom = record
        .get("chrloc")
        .or_else(|| entry.get("chromosome"))
        .and_then(as_text)
        .filter(|c| !c.is_empty())
        .map(|c| utils::with_chr_prefix(&c));

    Ok(Some(GenomicInfo::new(
        chrom,
        coordinate("chrstart")?,
        coordinate("chrstop")?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_search_response() {
        let response = serde_json::json!([
            2,
            ["672", "394269"],
            {"GeneID": ["672", "394269"]},
            [
                ["17", "BRCA1", "BRCA1 DNA repair associated", "17q21.31", "protein-coding"],
                ["17", "BRCA1P1", "BRCA1 pseudogene 1", "17q21.31", "pseudo"]
            ]
        ]);
        let genes = summaries_of(&response, 10).unwrap();
        assert_eq!(genes.len(), 2);
        assert_eq!(genes[0].symbol(), "BRCA1");
        assert_eq!(genes[0].name(), "BRCA1 DNA repair associated");
        assert_eq!(genes[0].chrom(), "chr17");
        assert_eq!(genes[0].description(), "17q21.31 (protein-coding)");
        assert_eq!(genes[0].gene_id(), "672");
        assert_eq!(genes[1].gene_id(), "394269");
    }

    #[test]
    fn test_search_limit() {
        let rows: Vec<_> = (0..15)
            .map(|i| serde_json::json!(["1", format!("G{}", i), "", "", ""]))
            .collect();
        let ids: Vec<_> = (0..15).map(|i| i.to_string()).collect();
        let response = serde_json::json!([15, ids.clone(), {"GeneID": ids}, rows]);
        let genes = summaries_of(&response, 10).unwrap();
        assert_eq!(genes.len(), 10);
        assert_eq!(genes[9].symbol(), "G9");
        assert_eq!(genes[9].description(), "");
    }

    #[test]
    fn test_search_no_hits() {
        let response = serde_json::json!([0, [], null, []]);
        assert!(summaries_of(&response, 10).unwrap().is_empty());
        let err = summaries_of(&serde_json::json!({"error": "x"}), 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_genomic_info() {
        let response = serde_json::json!({
            "result": {
                "uids": ["672"],
                "672": {
                    "uid": "672",
                    "name": "BRCA1",
                    "chromosome": "17",
                    "genomicinfo": [
                        {"chrloc": "17", "chraccver": "NC_000017.11",
                         "chrstart": 43125482, "chrstop": 43044294, "exoncount": 24},
                        {"chrloc": "17", "chraccver": "NC_060941.1",
                         "chrstart": 1, "chrstop": 2, "exoncount": 24}
                    ]
                }
            }
        });
        let info = genomic_info_of(&response, "672").unwrap().unwrap();
        assert_eq!(info.chrom().as_deref(), Some("chr17"));
        assert_eq!(info.start(), 43125482);
        assert_eq!(info.stop(), 43044294);
    }

    #[test]
    fn test_genomic_info_missing() {
        let response = serde_json::json!({
            "result": {"uids": ["1"], "1": {"uid": "1", "genomicinfo": []}}
        });
        assert_eq!(genomic_info_of(&response, "1").unwrap(), None);
        let response = serde_json::json!({"result": {"uids": []}});
        assert_eq!(genomic_info_of(&response, "1").unwrap(), None);
        assert!(genomic_info_of(&serde_json::json!({}), "1").is_err());
    }
}
