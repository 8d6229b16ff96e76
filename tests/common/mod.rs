#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, params};

const SCHEMA: &str = r#"
    CREATE TABLE "Match" (
        id TEXT PRIMARY KEY,
        "gameDuration" INTEGER NOT NULL
    );
    CREATE TABLE "SummonerMatch" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        "matchId" TEXT NOT NULL REFERENCES "Match"(id),
        win INTEGER NOT NULL,
        kills INTEGER NULL,
        deaths INTEGER NULL,
        assists INTEGER NULL,
        "totalDamageDealtToChampions" INTEGER NULL,
        "goldEarned" INTEGER NULL,
        "visionScore" INTEGER NULL,
        "totalMinionsKilled" INTEGER NULL,
        "neutralMinionsKilled" INTEGER NULL,
        role TEXT NULL
    );
"#;

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub win: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage: u32,
    pub gold: u32,
    pub vision: u32,
    pub minions: u32,
    pub neutral: u32,
}

/// Match store populated with seeded synthetic participants.
pub struct MatchDb {
    pub conn: Connection,
    rng: StdRng,
    next_match: u32,
}

impl MatchDb {
    pub fn in_memory(seed: u64) -> Self {
        Self::with_connection(Connection::open_in_memory().expect("open in-memory db"), seed)
    }

    pub fn create(path: &Path, seed: u64) -> Self {
        let _ = std::fs::remove_file(path);
        Self::with_connection(Connection::open(path).expect("create sqlite file"), seed)
    }

    fn with_connection(conn: Connection, seed: u64) -> Self {
        conn.execute_batch(SCHEMA).expect("create schema");
        Self {
            conn,
            rng: StdRng::seed_from_u64(seed),
            next_match: 0,
        }
    }

    pub fn random_stats(&mut self) -> Stats {
        let rng = &mut self.rng;
        let kills = rng.gen_range(0..15u32);
        let deaths = rng.gen_range(0..12u32);
        let assists = rng.gen_range(0..20u32);
        let damage = rng.gen_range(5_000..40_000u32);
        let kda = (kills + assists) as f64 / deaths.max(1) as f64;
        let latent = 0.5 * kda + damage as f64 / 10_000.0 + rng.gen_range(-2.0..2.0);
        Stats {
            win: latent > 4.0,
            kills,
            deaths,
            assists,
            damage,
            gold: rng.gen_range(6_000..18_000u32),
            vision: rng.gen_range(5..80u32),
            minions: rng.gen_range(50..300u32),
            neutral: rng.gen_range(0..60u32),
        }
    }

    /// Adds `n` random participants, each in its own match.
    pub fn add_players(&mut self, role: Option<&str>, n: usize, duration_secs: u32) {
        for _ in 0..n {
            let stats = self.random_stats();
            self.add_row(role, stats, duration_secs);
        }
    }

    pub fn add_row(&mut self, role: Option<&str>, stats: Stats, duration_secs: u32) {
        self.next_match += 1;
        let match_id = format!("EUW1_{}", self.next_match);
        self.conn
            .execute(
                r#"INSERT INTO "Match"(id, "gameDuration") VALUES (?1, ?2)"#,
                params![match_id, duration_secs],
            )
            .expect("insert match");
        self.conn
            .execute(
                r#"INSERT INTO "SummonerMatch"(
                    "matchId", win, kills, deaths, assists,
                    "totalDamageDealtToChampions", "goldEarned", "visionScore",
                    "totalMinionsKilled", "neutralMinionsKilled", role
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                params![
                    match_id,
                    stats.win,
                    stats.kills,
                    stats.deaths,
                    stats.assists,
                    stats.damage,
                    stats.gold,
                    stats.vision,
                    stats.minions,
                    stats.neutral,
                    role
                ],
            )
            .expect("insert participant");
    }
}

pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "legend_weights_it_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
