use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use crate::error::RoleSkip;
use crate::features::{EngineeredFeatureRow, FEATURE_COUNT, FEATURES, feature_vector};
use crate::logistic::{self, LogisticFit, Standardizer};
use crate::roles::Role;

pub const OBJECTIVE_WEIGHT: f64 = 0.10;
pub const UTILITY_WEIGHT: f64 = 0.05;

/// Signals the training query cannot see. Published next to the derived
/// weights and never renormalized with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeights {
    pub objective: f64,
    pub utility: f64,
}

impl Default for FixedWeights {
    fn default() -> Self {
        Self {
            objective: OBJECTIVE_WEIGHT,
            utility: UTILITY_WEIGHT,
        }
    }
}

/// Model-derived weights, one per entry of [`FEATURES`], summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedWeights {
    entries: [(&'static str, f64); FEATURE_COUNT],
}

impl DerivedWeights {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }
}

/// Published weights for one role. The derived part sums to 1.0 and the fixed
/// part is added on top, so the full vector sums to 1.15.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct RoleWeightVector {
    pub derived: DerivedWeights,
    pub fixed: FixedWeights,
}

impl RoleWeightVector {
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "objective" => Some(self.fixed.objective),
            "utility" => Some(self.fixed.utility),
            _ => self.derived.get(key),
        }
    }
}

impl Serialize for RoleWeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 2))?;
        for (key, weight) in self.derived.iter() {
            map.serialize_entry(key, &weight)?;
        }
        map.serialize_entry("objective", &self.fixed.objective)?;
        map.serialize_entry("utility", &self.fixed.utility)?;
        map.end()
    }
}

impl TryFrom<BTreeMap<String, f64>> for RoleWeightVector {
    type Error = String;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let field = |key: &str| {
            raw.get(key)
                .copied()
                .ok_or_else(|| format!("missing weight `{key}`"))
        };
        let mut entries = [("", 0.0); FEATURE_COUNT];
        for (slot, spec) in entries.iter_mut().zip(FEATURES.iter()) {
            *slot = (spec.key, field(spec.key)?);
        }
        Ok(Self {
            derived: DerivedWeights { entries },
            fixed: FixedWeights {
                objective: field("objective")?,
                utility: field("utility")?,
            },
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    pub inverse_regularization: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            inverse_regularization: logistic::DEFAULT_INVERSE_REGULARIZATION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleFitReport {
    pub role: Role,
    pub samples: usize,
    pub win_rate: f64,
    pub scaler: Standardizer,
    pub fit: LogisticFit,
    pub baseline_log_loss: f64,
    pub fit_log_loss: f64,
    pub weights: RoleWeightVector,
}

/// Magnitudes of `coeffs` as a convex combination; `None` when they are all zero.
pub fn normalize_coefficients(coeffs: &[f64; FEATURE_COUNT]) -> Option<DerivedWeights> {
    let abs = coeffs.map(f64::abs);
    let total: f64 = abs.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }
    let mut entries = [("", 0.0); FEATURE_COUNT];
    for ((slot, spec), magnitude) in entries.iter_mut().zip(FEATURES.iter()).zip(abs) {
        *slot = (spec.key, magnitude / total);
    }
    Some(DerivedWeights { entries })
}

/// Standardizes one role's rows, fits the classifier and converts its
/// coefficients into published weights. Sign is discarded: every feature is
/// assumed to be "more is better".
pub fn train_role(
    role: Role,
    rows: &[EngineeredFeatureRow],
    cfg: &TrainerConfig,
) -> Result<RoleFitReport, RoleSkip> {
    let xs = rows.iter().map(feature_vector).collect::<Vec<_>>();
    let ys = rows.iter().map(|r| r.win).collect::<Vec<_>>();

    let wins = ys.iter().filter(|w| **w).count();
    if wins == 0 || wins == ys.len() {
        return Err(RoleSkip::SingleClassOutcome { win: wins > 0 });
    }

    let (scaler, scaled) = Standardizer::fit_transform(&xs);
    let fit = logistic::fit_logistic(&scaled, &ys, cfg.inverse_regularization);
    let derived = normalize_coefficients(&fit.coeffs).ok_or(RoleSkip::DegenerateFit)?;

    let report = RoleFitReport {
        role,
        samples: rows.len(),
        win_rate: wins as f64 / rows.len() as f64,
        scaler,
        fit,
        baseline_log_loss: logistic::baseline_log_loss(&ys),
        fit_log_loss: logistic::log_loss(&fit, &scaled, &ys),
        weights: RoleWeightVector {
            derived,
            fixed: FixedWeights::default(),
        },
    };
    log_report(&report);
    Ok(report)
}

fn log_report(report: &RoleFitReport) {
    info!(
        role = %report.role,
        samples = report.samples,
        win_rate = report.win_rate,
        iterations = report.fit.iterations,
        converged = report.fit.converged,
        "trained role: log_loss baseline={:.6} fit={:.6} delta={:+.6}",
        report.baseline_log_loss,
        report.fit_log_loss,
        report.baseline_log_loss - report.fit_log_loss
    );
    for (idx, spec) in FEATURES.iter().enumerate() {
        info!(
            role = %report.role,
            "  {:8} coeff={:+.4} mean={:+.4} std={:.4} weight={:.4}",
            spec.key,
            report.fit.coeffs[idx],
            report.scaler.means[idx],
            report.scaler.stds[idx],
            report.weights.derived.get(spec.key).unwrap_or_default()
        );
    }
}
