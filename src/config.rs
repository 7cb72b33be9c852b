use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::oracle::Reduction;
use crate::scoring::ClassificationConfig;

/// Runtime configuration. Every field has a default, so an empty (or absent)
/// YAML file yields a working setup against the public services.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub genome: GenomeServiceConfig,
    pub catalog: CatalogConfig,
    pub oracle: OracleConfig,
    pub http: HttpConfig,
    pub analysis: AnalysisConfig,
    pub coordinates: CoordinatesConfig,
    pub classification: ClassificationConfig,
    pub cache: CacheConfig,
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = File::open(path.as_ref()).map_err(|e| Error::InvalidConfig {
            msg: format!("unable to open {}: {}", path.as_ref().display(), e),
        })?;
        let config: Config = serde_yaml::from_reader(reader).map_err(|e| Error::InvalidConfig {
            msg: format!("unable to parse {}: {}", path.as_ref().display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the given file, or fall back to the defaults if none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Config::from_path(path),
            None => Ok(Config::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| {
            Err(Error::InvalidConfig {
                msg: msg.to_owned(),
            })
        };
        if self.http.timeout_secs == 0 || self.oracle.timeout_secs == 0 {
            return invalid("timeouts must be at least one second");
        }
        if self.analysis.window_size == 0 {
            return invalid("analysis.window_size must be positive");
        }
        if self.catalog.search_limit == 0 {
            return invalid("catalog.search_limit must be positive");
        }
        if self.oracle.max_sequence_length == Some(0) {
            return invalid("oracle.max_sequence_length must be positive if given");
        }
        self.classification.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenomeServiceConfig {
    pub api_url: String,
    pub organism: String,
}

impl Default for GenomeServiceConfig {
    fn default() -> Self {
        GenomeServiceConfig {
            api_url: "https://api.genome.ucsc.edu".to_owned(),
            organism: "Human".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub search_url: String,
    pub detail_url: String,
    pub search_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            search_url: "https://clinicaltables.nlm.nih.gov/api/ncbi_genes/v3/search".to_owned(),
            detail_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi".to_owned(),
            search_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    /// Scoring endpoint. Without it, only offline scoring is possible.
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub max_sequence_length: Option<usize>,
    pub reduction: Reduction,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            url: None,
            timeout_secs: 300,
            max_sequence_length: None,
            reduction: Reduction::Mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            user_agent: concat!("vareffect/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Number of bases around the variant that are scored.
    pub window_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig { window_size: 8192 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatesConfig {
    pub max_initial_window: u64,
}

impl Default for CoordinatesConfig {
    fn default() -> Self {
        CoordinatesConfig {
            max_initial_window: 10000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 600 }
    }
}
