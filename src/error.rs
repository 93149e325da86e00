use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("hook input is empty")]
    EmptyInput,

    #[error("hook input is not valid JSON: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("target file does not exist: {0}")]
    MissingTarget(PathBuf),

    #[error("failed to read target file {path}: {source}")]
    ReadTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("coverage report {path} could not be used: {reason}")]
    CoverageReport { path: PathBuf, reason: String },

    #[error("rule {rule_id} has an invalid pattern: {source}")]
    InvalidPattern {
        rule_id: &'static str,
        #[source]
        source: regex::Error,
    },
}
