use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::config::{HttpConfig, OracleConfig};
use crate::errors::{malformed, Error, Result};
use crate::oracle::{checked_log_likelihood, LikelihoodOracle, LogLikelihood, Reduction};
use crate::utils::http::{build_client, transport_error};

const SERVICE: &str = "likelihood oracle";

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    sequence: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    log_likelihood: Option<f64>,
    #[serde(default)]
    per_position: Option<Vec<f64>>,
    #[serde(default)]
    error: Option<String>,
}

/// Oracle served over HTTP by a model-serving endpoint. The endpoint accepts
/// `{"sequence": ...}` and answers with either a scalar `log_likelihood` or a
/// `per_position` vector that is reduced locally.
pub struct RemoteOracle {
    client: Client,
    url: String,
    reduction: Reduction,
    max_sequence_length: Option<usize>,
}

impl RemoteOracle {
    pub fn new(url: &str, config: &OracleConfig, http: &HttpConfig) -> Result<Self> {
        Ok(RemoteOracle {
            client: build_client(config.timeout(), &http.user_agent)?,
            url: url.to_owned(),
            reduction: config.reduction,
            max_sequence_length: config.max_sequence_length,
        })
    }

    pub fn from_config(config: &OracleConfig, http: &HttpConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| Error::InvalidConfig {
            msg: "no oracle URL configured (set oracle.url or use --oracle-url)".to_owned(),
        })?;
        RemoteOracle::new(url, config, http)
    }
}

impl LikelihoodOracle for RemoteOracle {
    fn score_sequence(&self, sequence: &str) -> Result<LogLikelihood> {
        debug!("POST {} ({} bases)", self.url, sequence.len());
        let response = self
            .client
            .post(&self.url)
            .json(&ScoreRequest { sequence })
            .send()
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        let body = response.text().map_err(|e| request_error(&e))?;
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        let response: ScoreResponse =
            serde_json::from_str(&body).map_err(|e| malformed(SERVICE, e.to_string()))?;
        interpret(response, self.reduction)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.max_sequence_length
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// A timeout, while sending or while reading the body, means the oracle is busy.
fn request_error(e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::OracleResource {
            msg: format!("request timed out: {}", e),
        }
    } else {
        transport_error(SERVICE, e)
    }
}

/// Capacity problems (overload, rate limit, out of memory, input too long for the
/// context) are reported as oracle resource errors, anything else as unavailable.
fn status_error(status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::INSUFFICIENT_STORAGE
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::GATEWAY_TIMEOUT => Error::OracleResource {
            msg: format!("HTTP {}: {}", status.as_u16(), body),
        },
        _ => Error::UpstreamStatus {
            service: SERVICE.to_owned(),
            status: status.as_u16(),
            msg: body,
        },
    }
}

fn interpret(response: ScoreResponse, reduction: Reduction) -> Result<LogLikelihood> {
    if let Some(msg) = response.error {
        return Err(Error::OracleResource { msg });
    }
    match (response.log_likelihood, response.per_position) {
        (Some(value), _) => checked_log_likelihood(value),
        (None, Some(per_position)) => reduction.reduce(&per_position),
        (None, None) => Err(malformed(
            SERVICE,
            "response has neither 'log_likelihood' nor 'per_position'",
        )),
    }
}
