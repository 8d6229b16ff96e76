use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RoleSkip, SkippedRole};
use crate::features::EngineeredFeatureRow;

pub const DEFAULT_MIN_ROLE_SAMPLES: usize = 100;

/// Assigned position of a participant. `Unknown` is the sentinel for missing or
/// unrecognised labels and never trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
    Unknown,
}

impl Role {
    pub const TRAINABLE: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Adc, Role::Support];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Mid => "MID",
            Role::Adc => "ADC",
            Role::Support => "SUPPORT",
            Role::Unknown => "UNKNOWN",
        }
    }

    /// Accepts the canonical labels and the raw match-API positions
    /// (`MIDDLE`, `BOTTOM`, `UTILITY`). Case-sensitive; anything else,
    /// including "UNKNOWN", is `None`.
    pub fn from_label(raw: &str) -> Option<Role> {
        match raw.trim() {
            "TOP" => Some(Role::Top),
            "JUNGLE" => Some(Role::Jungle),
            "MID" | "MIDDLE" => Some(Role::Mid),
            "ADC" | "BOTTOM" => Some(Role::Adc),
            "SUPPORT" | "UTILITY" => Some(Role::Support),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RolePartition {
    pub qualified: BTreeMap<Role, Vec<EngineeredFeatureRow>>,
    pub skipped: Vec<SkippedRole>,
    pub unknown_rows: usize,
}

/// Groups rows by role, dropping `Unknown` and any role under `min_samples`.
pub fn partition_by_role(rows: Vec<EngineeredFeatureRow>, min_samples: usize) -> RolePartition {
    let mut grouped: BTreeMap<Role, Vec<EngineeredFeatureRow>> = BTreeMap::new();
    let mut unknown_rows = 0usize;
    for row in rows {
        if row.role == Role::Unknown {
            unknown_rows += 1;
            continue;
        }
        grouped.entry(row.role).or_default().push(row);
    }

    let mut out = RolePartition {
        unknown_rows,
        ..Default::default()
    };
    for (role, role_rows) in grouped {
        if role_rows.len() < min_samples {
            warn!(
                role = %role,
                rows = role_rows.len(),
                required = min_samples,
                "not enough data for role, skipping"
            );
            out.skipped.push(SkippedRole {
                role,
                reason: RoleSkip::InsufficientSample {
                    rows: role_rows.len(),
                    required: min_samples,
                },
            });
            continue;
        }
        out.qualified.insert(role, role_rows);
    }
    out
}
