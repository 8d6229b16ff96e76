use std::path::PathBuf;

use crate::error::PipelineError;
use crate::logistic::DEFAULT_INVERSE_REGULARIZATION;
use crate::roles::DEFAULT_MIN_ROLE_SAMPLES;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const OUT_PATH_VAR: &str = "SCORING_WEIGHTS_OUT";
pub const DEFAULT_OUT_PATH: &str = "scoring_weights.json";
pub const DEFAULT_MIN_GAME_DURATION_SECS: u32 = 600;
pub const DEFAULT_ROW_LIMIT: u32 = 50_000;

/// Everything one pipeline run needs, resolved before any resource is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub database_url: String,
    pub out_path: PathBuf,
    pub min_role_samples: usize,
    pub min_game_duration_secs: u32,
    pub row_limit: u32,
    pub inverse_regularization: f64,
    /// Fail the run instead of writing an empty artifact when no role trains.
    pub require_trained_role: bool,
}

impl TrainConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            out_path: PathBuf::from(DEFAULT_OUT_PATH),
            min_role_samples: DEFAULT_MIN_ROLE_SAMPLES,
            min_game_duration_secs: DEFAULT_MIN_GAME_DURATION_SECS,
            row_limit: DEFAULT_ROW_LIMIT,
            inverse_regularization: DEFAULT_INVERSE_REGULARIZATION,
            require_trained_role: false,
        }
    }

    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Blank values count
    /// as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_blank(DATABASE_URL_VAR).ok_or(PipelineError::ConfigurationMissing {
            var: DATABASE_URL_VAR,
        })?;
        let mut cfg = Self::new(database_url.trim());
        if let Some(out) = non_blank(OUT_PATH_VAR) {
            cfg.out_path = PathBuf::from(out.trim());
        }
        Ok(cfg)
    }
}
