use std::collections::BTreeMap;

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::features::MatchParticipantRecord;
use crate::roles::Role;

const PARTICIPANT_QUERY: &str = r#"
    SELECT
        sm.win,
        sm.kills, sm.deaths, sm.assists,
        sm."totalDamageDealtToChampions" AS damage,
        sm."goldEarned" AS gold,
        sm."visionScore" AS vision,
        sm."totalMinionsKilled" AS minions,
        sm."neutralMinionsKilled" AS neutral,
        m."gameDuration" AS duration,
        sm.role
    FROM "SummonerMatch" sm
    JOIN "Match" m ON sm."matchId" = m.id
    WHERE m."gameDuration" > ?1
    LIMIT ?2
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchQuery {
    /// Matches at or under this length are excluded.
    pub min_game_duration_secs: u32,
    pub row_limit: u32,
}

/// Read-only access to participant-in-match rows.
pub trait ParticipantSource {
    fn fetch_participants(
        &self,
        query: &FetchQuery,
    ) -> Result<Vec<MatchParticipantRecord>, PipelineError>;
}

pub struct SqliteMatchStore {
    conn: Connection,
}

impl SqliteMatchStore {
    /// Opens the store read-only. A missing file is a connection failure; the
    /// database is never created.
    pub fn connect(database_url: &str) -> Result<Self, PipelineError> {
        let (target, flags) = resolve_target(database_url);
        let fail = |source| PipelineError::ConnectionFailure {
            target: target.clone(),
            source,
        };
        let conn = Connection::open_with_flags(&target, flags).map_err(fail)?;
        // Opening is lazy; touch the schema so a non-database file fails here.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(fail)?;
        debug!(store = %target, "opened match store");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ParticipantSource for SqliteMatchStore {
    fn fetch_participants(
        &self,
        query: &FetchQuery,
    ) -> Result<Vec<MatchParticipantRecord>, PipelineError> {
        let mut stmt = self.conn.prepare(PARTICIPANT_QUERY)?;
        let rows = stmt.query_map(
            params![query.min_game_duration_secs, query.row_limit],
            |row| {
                // Stat columns may be NULL in imported dumps; count those as 0.
                let stat = |idx: usize| -> rusqlite::Result<u32> {
                    Ok(row.get::<_, Option<u32>>(idx)?.unwrap_or(0))
                };
                Ok((
                    MatchParticipantRecord {
                        win: row.get(0)?,
                        kills: stat(1)?,
                        deaths: stat(2)?,
                        assists: stat(3)?,
                        damage_to_champions: stat(4)?,
                        gold_earned: stat(5)?,
                        vision_score: stat(6)?,
                        cs: stat(7)?.saturating_add(stat(8)?),
                        game_duration_secs: row.get(9)?,
                        role: Role::Unknown,
                    },
                    row.get::<_, Option<String>>(10)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        let mut unrecognised: BTreeMap<String, usize> = BTreeMap::new();
        for row in rows {
            let (mut record, label) = row?;
            if let Some(label) = label {
                match Role::from_label(&label) {
                    Some(role) => record.role = role,
                    None if label.trim() == Role::Unknown.as_str() => {}
                    None => *unrecognised.entry(label).or_default() += 1,
                }
            }
            out.push(record);
        }

        if !unrecognised.is_empty() {
            warn!(labels = ?unrecognised, "unrecognised role labels treated as UNKNOWN");
        }
        Ok(out)
    }
}

/// Accepts a plain path, `sqlite://path`, `sqlite:path` or a `file:` URI.
fn resolve_target(database_url: &str) -> (String, OpenFlags) {
    let raw = database_url.trim();
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if raw.starts_with("file:") {
        return (raw.to_string(), flags | OpenFlags::SQLITE_OPEN_URI);
    }
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    (path.to_string(), flags)
}
