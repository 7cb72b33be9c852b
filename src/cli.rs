// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use structopt::StructOpt;

use crate::calibration;
use crate::catalog::{CachedCatalog, GeneCatalog, NcbiCatalog};
use crate::config::Config;
use crate::coordinates::CoordinateResolver;
use crate::genome::{GenomeBrowser, UcscClient};
use crate::oracle::{LikelihoodOracle, MarkovOracle, RemoteOracle};
use crate::pipeline::{AnalysisPipelineBuilder, AnalysisRequest};
use crate::scoring::{ClassificationConfig, DeltaScorer};
use crate::sequence::{fetch_window, WindowBounds};
use crate::variant::Base;

#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "vareffect",
    about = "Estimate the pathogenicity of single-nucleotide variants from the change in \
             sequence log-likelihood under a DNA foundation model.",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub struct Vareffect {
    #[structopt(
        long,
        parse(from_os_str),
        help = "YAML configuration file (if omitted, defaults are used)."
    )]
    pub config: Option<PathBuf>,
    #[structopt(short, long, help = "Print debug messages.")]
    pub verbose: bool,
    #[structopt(
        long,
        default_value = "0",
        help = "Number of threads to use for scoring (0 = number of CPUs)."
    )]
    pub threads: usize,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, StructOpt)]
pub enum Command {
    #[structopt(
        name = "assemblies",
        about = "List the genome assemblies available for an organism."
    )]
    Assemblies {
        #[structopt(long, help = "Organism (default: genome.organism of the config).")]
        organism: Option<String>,
    },
    #[structopt(
        name = "chromosomes",
        about = "List the primary chromosomes of an assembly."
    )]
    Chromosomes {
        #[structopt(help = "Assembly identifier, e.g. hg38.")]
        genome: String,
    },
    #[structopt(name = "search-genes", about = "Search the gene catalog.")]
    SearchGenes {
        #[structopt(help = "Search text, e.g. a gene symbol.")]
        query: String,
        #[structopt(long, default_value = "hg38", help = "Assembly identifier.")]
        genome: String,
    },
    #[structopt(
        name = "resolve-gene",
        about = "Resolve a catalog gene identifier to its genomic bounds and initial window."
    )]
    ResolveGene {
        #[structopt(help = "Gene identifier of the catalog, e.g. 672 for BRCA1.")]
        gene_id: String,
    },
    #[structopt(
        name = "fetch-sequence",
        about = "Print the reference sequence of a 1-based, inclusive window as FASTA."
    )]
    FetchSequence {
        #[structopt(help = "Chromosome, with or without chr prefix.")]
        chrom: String,
        #[structopt(help = "Window start (1-based).")]
        start: u64,
        #[structopt(help = "Window end (1-based, inclusive).")]
        end: u64,
        #[structopt(long, default_value = "hg38", help = "Assembly identifier.")]
        genome: String,
    },
    #[structopt(
        name = "analyze",
        about = "Score a single-nucleotide variant and print the result as JSON."
    )]
    Analyze {
        #[structopt(help = "Chromosome, with or without chr prefix.")]
        chrom: String,
        #[structopt(help = "Variant position (1-based).")]
        position: u64,
        #[structopt(help = "Alternative base (A, C, G or T).")]
        alternative: Base,
        #[structopt(long, default_value = "hg38", help = "Assembly identifier.")]
        genome: String,
        #[structopt(
            long = "reference-base",
            help = "Expected reference base. Analysis fails if the reference differs."
        )]
        reference_base: Option<Base>,
        #[structopt(
            long = "window-start",
            requires = "window-end",
            help = "Start of the scored window (default: centred on the variant)."
        )]
        window_start: Option<u64>,
        #[structopt(long = "window-end", requires = "window-start", help = "End of the scored window.")]
        window_end: Option<u64>,
        #[structopt(
            long = "window-size",
            help = "Size of the window centred on the variant (default: analysis.window_size)."
        )]
        window_size: Option<u64>,
        #[structopt(long = "oracle-url", help = "Scoring endpoint (overrides oracle.url).")]
        oracle_url: Option<String>,
        #[structopt(
            long,
            conflicts_with = "oracle-url",
            help = "Score with the builtin Markov model instead of a remote oracle."
        )]
        offline: bool,
        #[structopt(
            long,
            allow_hyphen_values = true,
            help = "Classification threshold on the delta scale (overrides classification.threshold)."
        )]
        threshold: Option<f64>,
    },
    #[structopt(
        name = "calibrate",
        about = "Derive the classification threshold from a CSV with columns delta and class \
                 (LOF, FUNC, INT, FUNC/INT) and print it as configuration section."
    )]
    Calibrate {
        #[structopt(parse(from_os_str), help = "CSV file with labeled deltas.")]
        input: PathBuf,
        #[structopt(
            long = "uncertain-margin",
            default_value = "0.0",
            help = "Half-width of the band around the threshold reported as uncertain."
        )]
        uncertain_margin: f64,
    },
}

#[derive(Serialize)]
struct ClassificationSection<'a> {
    classification: &'a ClassificationConfig,
}

fn oracle(
    config: &Config,
    oracle_url: Option<&str>,
    offline: bool,
) -> Result<Box<dyn LikelihoodOracle>> {
    if offline {
        info!("scoring with the builtin Markov model");
        return Ok(Box::new(MarkovOracle::new(config.oracle.reduction)));
    }
    let oracle = match oracle_url {
        Some(url) => RemoteOracle::new(url, &config.oracle, &config.http)?,
        None => RemoteOracle::from_config(&config.oracle, &config.http)?,
    };
    Ok(Box::new(oracle))
}

fn catalog(config: &Config) -> Result<CachedCatalog<NcbiCatalog>> {
    Ok(CachedCatalog::new(
        NcbiCatalog::new(&config.catalog, &config.http)?,
        config.cache.ttl(),
    ))
}

pub fn run(opt: Vareffect) -> Result<()> {
    let mut config = Config::load(opt.config.as_deref())?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()?;

    match opt.command {
        Command::Assemblies { organism } => {
            let browser = UcscClient::new(&config.genome, &config.http)?;
            let organism = organism.unwrap_or_else(|| config.genome.organism.clone());
            for assembly in browser.assemblies(&organism)? {
                println!(
                    "{}\t{}\t{}",
                    assembly.id(),
                    assembly.name(),
                    assembly.source_name()
                );
            }
        }
        Command::Chromosomes { genome } => {
            let browser = UcscClient::new(&config.genome, &config.http)?;
            for chromosome in browser.chromosomes(&genome)? {
                println!("{}\t{}", chromosome.name(), chromosome.size());
            }
        }
        Command::SearchGenes { query, genome } => {
            for gene in catalog(&config)?.search(&query, &genome)? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    gene.gene_id(),
                    gene.symbol(),
                    gene.chrom(),
                    gene.name(),
                    gene.description()
                );
            }
        }
        Command::ResolveGene { gene_id } => {
            let catalog = catalog(&config)?;
            let resolver =
                CoordinateResolver::new(&catalog, config.coordinates.max_initial_window);
            match resolver.resolve(&gene_id)? {
                Some(resolved) => println!("{}", serde_json::to_string_pretty(&resolved)?),
                None => bail!("no genomic location on record for gene {}", gene_id),
            }
        }
        Command::FetchSequence {
            chrom,
            start,
            end,
            genome,
        } => {
            let source = UcscClient::new(&config.genome, &config.http)?;
            let window = fetch_window(&source, &genome, &chrom, WindowBounds::new(start, end)?)?;
            println!(
                ">{}:{}-{} {}\n{}",
                window.chrom(),
                window.start(),
                window.end(),
                genome,
                window.sequence()
            );
        }
        Command::Analyze {
            chrom,
            position,
            alternative,
            genome,
            reference_base,
            window_start,
            window_end,
            window_size,
            oracle_url,
            offline,
            threshold,
        } => {
            if let Some(threshold) = threshold {
                config.classification.threshold = threshold;
            }
            if let Some(window_size) = window_size {
                config.analysis.window_size = window_size;
            }
            config.validate()?;

            let window = match (window_start, window_end) {
                (Some(start), Some(end)) => Some(WindowBounds::new(start, end)?),
                (None, None) => None,
                _ => bail!("--window-start and --window-end have to be given together"),
            };
            let pipeline = AnalysisPipelineBuilder::default()
                .sequence_source(Box::new(UcscClient::new(&config.genome, &config.http)?))
                .oracle(oracle(&config, oracle_url.as_deref(), offline)?)
                .scorer(DeltaScorer::from_config(&config.classification)?)
                .window_size(config.analysis.window_size)
                .build()?;

            let request = AnalysisRequest {
                genome,
                chromosome: chrom,
                variant_position: position,
                alternative_base: alternative,
                reference_base,
                window,
            };
            let response = pipeline
                .analyze(&request)
                .with_context(|| format!("analysis of {}:{} failed", request.chromosome, position))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Calibrate {
            input,
            uncertain_margin,
        } => {
            let records = calibration::read_labeled_deltas(&input)?;
            let report = calibration::calibrate(&records, uncertain_margin)?;
            print!(
                "{}",
                serde_yaml::to_string(&ClassificationSection {
                    classification: &report.classification,
                })?
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let opt = Vareffect::from_iter_safe(&[
            "vareffect",
            "--verbose",
            "analyze",
            "chr17",
            "43119628",
            "g",
            "--offline",
            "--threshold",
            "-0.002",
        ])
        .unwrap();
        assert!(opt.verbose);
        match opt.command {
            Command::Analyze {
                chrom,
                position,
                alternative,
                genome,
                offline,
                threshold,
                ..
            } => {
                assert_eq!(chrom, "chr17");
                assert_eq!(position, 43119628);
                assert_eq!(alternative, Base::G);
                assert_eq!(genome, "hg38");
                assert!(offline);
                assert_eq!(threshold, Some(-0.002));
            }
            _ => panic!("expected analyze subcommand"),
        }
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(
            Vareffect::from_iter_safe(&["vareffect", "analyze", "chr17", "100", "N"]).is_err()
        );
    }

    #[test]
    fn test_window_requires_both_bounds() {
        assert!(Vareffect::from_iter_safe(&[
            "vareffect",
            "analyze",
            "chr17",
            "100",
            "A",
            "--window-start",
            "50"
        ])
        .is_err());
    }
}
