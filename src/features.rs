use crate::roles::Role;

pub const FEATURE_COUNT: usize = 5;

/// One participant in one match, as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParticipantRecord {
    pub win: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage_to_champions: u32,
    pub gold_earned: u32,
    pub vision_score: u32,
    /// Lane minions plus neutral monsters.
    pub cs: u32,
    pub role: Role,
    pub game_duration_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredFeatureRow {
    pub role: Role,
    pub win: bool,
    pub kda: f64,
    pub dpm: f64,
    pub gpm: f64,
    pub vpm: f64,
    pub cspm: f64,
}

/// A model input column and the artifact key its weight is published under.
#[derive(Clone, Copy)]
pub struct FeatureSpec {
    pub key: &'static str,
    pub extract: fn(&EngineeredFeatureRow) -> f64,
}

impl std::fmt::Debug for FeatureSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureSpec").field("key", &self.key).finish()
    }
}

/// Column order for extraction, scaling and coefficient naming.
pub const FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        key: "kda",
        extract: extract_kda,
    },
    FeatureSpec {
        key: "damage",
        extract: extract_dpm,
    },
    FeatureSpec {
        key: "gold",
        extract: extract_gpm,
    },
    FeatureSpec {
        key: "vision",
        extract: extract_vpm,
    },
    FeatureSpec {
        key: "cs",
        extract: extract_cspm,
    },
];

fn extract_kda(row: &EngineeredFeatureRow) -> f64 {
    row.kda
}

fn extract_dpm(row: &EngineeredFeatureRow) -> f64 {
    row.dpm
}

fn extract_gpm(row: &EngineeredFeatureRow) -> f64 {
    row.gpm
}

fn extract_vpm(row: &EngineeredFeatureRow) -> f64 {
    row.vpm
}

fn extract_cspm(row: &EngineeredFeatureRow) -> f64 {
    row.cspm
}

pub fn engineer(record: &MatchParticipantRecord) -> EngineeredFeatureRow {
    // Zero deaths count as one.
    let deaths = record.deaths.max(1) as f64;
    let minutes = record.game_duration_secs as f64 / 60.0;
    EngineeredFeatureRow {
        role: record.role,
        win: record.win,
        kda: (record.kills as f64 + record.assists as f64) / deaths,
        dpm: record.damage_to_champions as f64 / minutes,
        gpm: record.gold_earned as f64 / minutes,
        vpm: record.vision_score as f64 / minutes,
        cspm: record.cs as f64 / minutes,
    }
}

pub fn engineer_all(records: &[MatchParticipantRecord]) -> Vec<EngineeredFeatureRow> {
    records.iter().map(engineer).collect()
}

pub fn feature_vector(row: &EngineeredFeatureRow) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for (slot, spec) in out.iter_mut().zip(FEATURES.iter()) {
        *slot = (spec.extract)(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MatchParticipantRecord {
        MatchParticipantRecord {
            win: true,
            kills: 5,
            deaths: 0,
            assists: 3,
            damage_to_champions: 12_000,
            gold_earned: 9_000,
            vision_score: 30,
            cs: 180,
            role: Role::Mid,
            game_duration_secs: 1_800,
        }
    }

    #[test]
    fn zero_deaths_floor_to_one() {
        let row = engineer(&record());
        assert_eq!(row.kda, 8.0);
    }

    #[test]
    fn kda_divides_by_deaths() {
        let row = engineer(&MatchParticipantRecord {
            deaths: 4,
            ..record()
        });
        assert_eq!(row.kda, 2.0);
    }

    #[test]
    fn per_minute_stats() {
        let row = engineer(&record());
        assert_eq!(row.dpm, 400.0);
        assert_eq!(row.gpm, 300.0);
        assert_eq!(row.vpm, 1.0);
        assert_eq!(row.cspm, 6.0);
        assert_eq!(row.role, Role::Mid);
        assert!(row.win);
    }

    #[test]
    fn feature_vector_follows_table_order() {
        let row = engineer(&record());
        assert_eq!(feature_vector(&row), [8.0, 400.0, 300.0, 1.0, 6.0]);
        let keys = FEATURES.iter().map(|f| f.key).collect::<Vec<_>>();
        assert_eq!(keys, ["kda", "damage", "gold", "vision", "cs"]);
    }

    #[test]
    fn engineer_all_keeps_every_row() {
        let records = vec![
            record(),
            MatchParticipantRecord {
                role: Role::Unknown,
                ..record()
            },
        ];
        assert_eq!(engineer_all(&records).len(), 2);
    }
}
