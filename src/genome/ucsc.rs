use std::collections::HashMap;

use bio_types::genome::{self, AbstractInterval};
use itertools::Itertools;

use crate::config::{GenomeServiceConfig, HttpConfig};
use crate::errors::{malformed, Error, Result};
use crate::genome::{primary_chromosomes, Chromosome, GenomeAssembly, GenomeBrowser};
use crate::sequence::SequenceSource;
use crate::utils::http::JsonClient;

const SERVICE: &str = "UCSC genome browser";

/// Client for the UCSC genome browser REST API, serving assembly and chromosome
/// lists as well as reference sequence.
pub struct UcscClient {
    client: JsonClient,
    api_url: String,
}

impl UcscClient {
    pub fn new(config: &GenomeServiceConfig, http: &HttpConfig) -> Result<Self> {
        Ok(UcscClient {
            client: JsonClient::new(SERVICE, http)?,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }
}

impl GenomeBrowser for UcscClient {
    fn assemblies(&self, organism: &str) -> Result<Vec<GenomeAssembly>> {
        let response: GenomesResponse = self.client.get(&self.url("list/ucscGenomes"), &[])?;
        Ok(assemblies_of(response, organism))
    }

    fn chromosomes(&self, genome: &str) -> Result<Vec<Chromosome>> {
        let response: ChromosomesResponse = self.client.get(
            &self.url("list/chromosomes"),
            &[("genome", genome.to_owned())],
        )?;
        Ok(primary_chromosomes(
            response
                .chromosomes
                .into_iter()
                .map(|(name, size)| Chromosome::new(name, size)),
        ))
    }
}

impl SequenceSource for UcscClient {
    fn fetch(&self, genome: &str, interval: &genome::Interval) -> Result<String> {
        let range = interval.range();
        let response = self.client.get_reporting(
            &self.url("getData/sequence"),
            &[
                ("genome", genome.to_owned()),
                ("chrom", interval.contig().to_owned()),
                ("start", range.start.to_string()),
                ("end", range.end.to_string()),
            ],
        )?;
        dna_of(&response, genome, interval)
    }
}

#[derive(Debug, Deserialize)]
struct GenomesResponse {
    #[serde(rename = "ucscGenomes")]
    genomes: HashMap<String, GenomeInfo>,
}

#[derive(Debug, Deserialize)]
struct GenomeInfo {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    organism: String,
    #[serde(rename = "sourceName", default)]
    source_name: String,
    #[serde(default)]
    active: u8,
}

#[derive(Debug, Deserialize)]
struct ChromosomesResponse {
    chromosomes: HashMap<String, u64>,
}

fn assemblies_of(response: GenomesResponse, organism: &str) -> Vec<GenomeAssembly> {
    response
        .genomes
        .into_iter()
        .filter(|(_, info)| info.organism.eq_ignore_ascii_case(organism))
        .map(|(id, info)| {
            let name = info
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| id.clone());
            GenomeAssembly::new(id, name, info.source_name, info.organism, info.active != 0)
        })
        .sorted_by(|a, b| a.id().cmp(b.id()))
        .collect_vec()
}

fn dna_of(response: &serde_json::Value, genome: &str, interval: &genome::Interval) -> Result<String> {
    let range = interval.range();
    let missing = |msg: String| Error::MissingSequence {
        genome: genome.to_owned(),
        chrom: interval.contig().to_owned(),
        start: range.start + 1,
        end: range.end,
        msg,
    };
    match response.get("dna") {
        Some(serde_json::Value::String(dna)) => Ok(dna.to_ascii_uppercase()),
        Some(_) => Err(malformed(SERVICE, "field 'dna' is not a string")),
        None => Err(missing(
            response
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("response contains no sequence")
                .to_owned(),
        )),
    }
}
