use std::path::PathBuf;

use thiserror::Error;

use crate::roles::Role;

/// Run-level failures. Every variant aborts the pipeline before an artifact
/// is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{var} environment variable not set")]
    ConfigurationMissing { var: &'static str },

    #[error("failed to connect to match store {target}: {source}")]
    ConnectionFailure {
        target: String,
        source: rusqlite::Error,
    },

    #[error("participant query failed: {source}")]
    Query {
        #[from]
        source: rusqlite::Error,
    },

    #[error("no data found; run the match scanner first")]
    EmptyResultSet,

    /// Only raised when `require_trained_role` is set.
    #[error("no role qualified for training ({rows} rows loaded)")]
    NoQualifyingRoles { rows: usize },

    #[error("serialize weight artifact: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("write weight artifact {path}: {source}")]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why a single role was left out of the artifact. Never fatal for the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoleSkip {
    #[error("not enough data ({rows} rows, need {required})")]
    InsufficientSample { rows: usize, required: usize },

    #[error("every row has win={win}, cannot fit a binary classifier")]
    SingleClassOutcome { win: bool },

    #[error("all fitted coefficients are zero, weights cannot be normalized")]
    DegenerateFit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRole {
    pub role: Role,
    pub reason: RoleSkip,
}
