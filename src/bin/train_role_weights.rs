use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use legend_weights::config::{DATABASE_URL_VAR, TrainConfig};
use legend_weights::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing()?;

    let db_arg = parse_string_arg("--db");
    let mut cfg = TrainConfig::from_lookup(|key| match key {
        DATABASE_URL_VAR if db_arg.is_some() => db_arg.clone(),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(out) = parse_string_arg("--out") {
        cfg.out_path = PathBuf::from(out);
    }
    if let Some(min) = parse_usize_arg("--min-samples") {
        cfg.min_role_samples = min;
    }
    if has_flag("--require-trained-role") {
        cfg.require_trained_role = true;
    }

    tracing::info!("starting role weight training");
    let summary = pipeline::run(&cfg)?;

    println!("Role weights written: {}", summary.out_path.display());
    println!("Rows: {} (unknown role: {})", summary.rows_loaded, summary.unknown_rows);
    for report in &summary.trained {
        println!(
            "  {:8} samples={:5} win_rate={:.3} log_loss={:.4} (baseline {:.4})",
            report.role.as_str(),
            report.samples,
            report.win_rate,
            report.fit_log_loss,
            report.baseline_log_loss
        );
    }
    for skipped in &summary.skipped {
        println!("  {:8} skipped: {}", skipped.role.as_str(), skipped.reason);
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("legend_weights=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&format!("{name}="))
            && !v.trim().is_empty()
        {
            return Some(v.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name).and_then(|raw| raw.parse::<usize>().ok())
}
