use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::TrainConfig;
use crate::error::{PipelineError, SkippedRole};
use crate::features;
use crate::match_store::{FetchQuery, ParticipantSource, SqliteMatchStore};
use crate::roles::{self, Role};
use crate::trainer::{self, RoleFitReport, TrainerConfig};
use crate::weights_export::{self, WeightArtifact};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub unknown_rows: usize,
    pub trained: Vec<RoleFitReport>,
    pub skipped: Vec<SkippedRole>,
    pub artifact: WeightArtifact,
    pub out_path: PathBuf,
}

impl RunSummary {
    pub fn trained_roles(&self) -> Vec<Role> {
        self.trained.iter().map(|r| r.role).collect()
    }
}

/// connect -> fetch -> engineer -> partition -> train -> export.
pub fn run(cfg: &TrainConfig) -> Result<RunSummary, PipelineError> {
    // The store is dropped as soon as the fetch returns, success or not.
    let records = {
        let store = SqliteMatchStore::connect(&cfg.database_url)?;
        info!("connected to match store");
        store.fetch_participants(&fetch_query(cfg))?
    };
    run_on_records(cfg, records)
}

/// Same as [`run`] against an already-open source.
pub fn run_with_source<S: ParticipantSource + ?Sized>(
    cfg: &TrainConfig,
    source: &S,
) -> Result<RunSummary, PipelineError> {
    let records = source.fetch_participants(&fetch_query(cfg))?;
    run_on_records(cfg, records)
}

fn fetch_query(cfg: &TrainConfig) -> FetchQuery {
    FetchQuery {
        min_game_duration_secs: cfg.min_game_duration_secs,
        row_limit: cfg.row_limit,
    }
}

fn run_on_records(
    cfg: &TrainConfig,
    records: Vec<features::MatchParticipantRecord>,
) -> Result<RunSummary, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyResultSet);
    }
    let rows_loaded = records.len();
    info!(rows = rows_loaded, "loaded participant rows");

    let rows = features::engineer_all(&records);
    drop(records);
    let partition = roles::partition_by_role(rows, cfg.min_role_samples);
    if partition.unknown_rows > 0 {
        info!(rows = partition.unknown_rows, "ignoring UNKNOWN role rows");
    }

    let trainer_cfg = TrainerConfig {
        inverse_regularization: cfg.inverse_regularization,
    };
    let results = partition
        .qualified
        .par_iter()
        .map(|(role, rows)| {
            info!(role = %role, rows = rows.len(), "training role");
            (*role, trainer::train_role(*role, rows, &trainer_cfg))
        })
        .collect::<Vec<_>>();

    let mut skipped = partition.skipped;
    let mut trained = Vec::new();
    for (role, result) in results {
        match result {
            Ok(report) => trained.push(report),
            Err(reason) => {
                warn!(role = %role, "skipping role: {reason}");
                skipped.push(SkippedRole { role, reason });
            }
        }
    }

    if trained.is_empty() {
        if cfg.require_trained_role {
            return Err(PipelineError::NoQualifyingRoles { rows: rows_loaded });
        }
        warn!(rows = rows_loaded, "no role qualified; writing an empty artifact");
    }

    let artifact = trained
        .iter()
        .map(|r| (r.role, r.weights.clone()))
        .collect::<WeightArtifact>();
    weights_export::write_artifact(&artifact, &cfg.out_path)?;
    info!(
        path = %cfg.out_path.display(),
        roles = artifact.len(),
        "weights exported"
    );

    Ok(RunSummary {
        rows_loaded,
        unknown_rows: partition.unknown_rows,
        trained,
        skipped,
        artifact,
        out_path: cfg.out_path.clone(),
    })
}
