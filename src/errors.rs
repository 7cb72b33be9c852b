use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures, used by callers to decide how to
/// present an error and whether a retry may make sense.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UpstreamUnavailable,
    MissingData,
    Validation,
    OracleResource,
    Configuration,
}

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("{service} is unavailable: {msg}")]
    UpstreamUnavailable { service: String, msg: String },
    #[error("{service} returned HTTP status {status}: {msg}")]
    UpstreamStatus {
        service: String,
        status: u16,
        msg: String,
    },
    #[error("unexpected response from {service}: {msg}")]
    MalformedResponse { service: String, msg: String },
    #[error("no sequence returned for {chrom}:{start}-{end} ({genome}): {msg}")]
    MissingSequence {
        genome: String,
        chrom: String,
        start: u64,
        end: u64,
        msg: String,
    },
    #[error(
        "sequence for {chrom}:{start}-{end} has {observed} bases, expected {expected}; \
         the window may extend beyond the end of the chromosome"
    )]
    SequenceLengthMismatch {
        chrom: String,
        start: u64,
        end: u64,
        expected: u64,
        observed: u64,
    },
    #[error("invalid window {start}-{end}: coordinates are 1-based and end must not be before start")]
    InvalidWindow { start: u64, end: u64 },
    #[error("variant position {position} is outside the window {start}-{end}")]
    PositionOutsideWindow { position: u64, start: u64, end: u64 },
    #[error("invalid alternative base '{value}', must be one of A, C, G, T")]
    InvalidBase { value: String },
    #[error("ambiguous base '{base}' at window offset {offset}; only A, C, G, T can be scored")]
    AmbiguousBase { base: char, offset: usize },
    #[error("alternative base {base} equals the reference base at position {position}")]
    NoOpSubstitution { position: u64, base: char },
    #[error("reference base at position {position} is {observed}, expected {expected}")]
    ReferenceMismatch {
        position: u64,
        expected: char,
        observed: char,
    },
    #[error("request for {requested} does not match the current selection {selected}")]
    SelectionMismatch { requested: String, selected: String },
    #[error("likelihood oracle is out of resources: {msg}")]
    OracleResource { msg: String },
    #[error("sequence of length {len} exceeds the oracle context of {max} bases")]
    ContextExceeded { len: usize, max: usize },
    #[error("likelihood oracle returned an invalid log-likelihood: {msg}")]
    InvalidLikelihood { msg: String },
    #[error("invalid configuration: {msg}")]
    InvalidConfig { msg: String },
    #[error("unable to calibrate classification threshold: {msg}")]
    Calibration { msg: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UpstreamUnavailable { .. }
            | Error::UpstreamStatus { .. }
            | Error::MalformedResponse { .. } => ErrorKind::UpstreamUnavailable,
            Error::MissingSequence { .. } | Error::SequenceLengthMismatch { .. } => {
                ErrorKind::MissingData
            }
            Error::InvalidWindow { .. }
            | Error::PositionOutsideWindow { .. }
            | Error::InvalidBase { .. }
            | Error::AmbiguousBase { .. }
            | Error::NoOpSubstitution { .. }
            | Error::ReferenceMismatch { .. }
            | Error::SelectionMismatch { .. } => ErrorKind::Validation,
            Error::OracleResource { .. }
            | Error::ContextExceeded { .. }
            | Error::InvalidLikelihood { .. } => ErrorKind::OracleResource,
            Error::InvalidConfig { .. } | Error::Calibration { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether a caller may reasonably retry (with backoff) the failed request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::OracleResource { .. } | Error::UpstreamUnavailable { .. } => true,
            Error::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub(crate) fn malformed(service: &str, msg: impl Into<String>) -> Error {
    Error::MalformedResponse {
        service: service.to_owned(),
        msg: msg.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::PositionOutsideWindow {
                position: 5,
                start: 10,
                end: 20
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::MissingSequence {
                genome: "hg38".to_owned(),
                chrom: "chr1".to_owned(),
                start: 1,
                end: 2,
                msg: "no dna".to_owned(),
            }
            .kind(),
            ErrorKind::MissingData
        );
        assert_eq!(
            Error::ContextExceeded { len: 10, max: 5 }.kind(),
            ErrorKind::OracleResource
        );
        let kind: &'static str = ErrorKind::UpstreamUnavailable.into();
        assert_eq!(kind, "upstream-unavailable");
    }

    #[test]
    fn test_retryable() {
        assert!(Error::OracleResource {
            msg: "busy".to_owned()
        }
        .is_retryable());
        assert!(!Error::UpstreamStatus {
            service: "gene catalog".to_owned(),
            status: 404,
            msg: String::new(),
        }
        .is_retryable());
        assert!(!Error::InvalidBase {
            value: "N".to_owned()
        }
        .is_retryable());
    }
}
