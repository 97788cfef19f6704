use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use overspeed_rs::{PipelineConfig, SqliteEvidenceStore};

#[derive(Parser)]
#[command(name = "overspeed", version, about = "Overspeed evidence pipeline tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a pipeline config file and print the effective settings
    CheckConfig {
        /// Path to the YAML config
        #[arg(env = "OVERSPEED_CONFIG")]
        config: PathBuf,
    },
    /// List the most recent evidence records
    Records {
        /// Path to the YAML config
        #[arg(short, long, env = "OVERSPEED_CONFIG")]
        config: PathBuf,
        /// Maximum number of rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::debug!("overspeed v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::CheckConfig { config } => {
            let config = PipelineConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            println!("speed limit      : {} km/h", config.speed_limit_kmh);
            println!("meters per pixel : {}", config.meters_per_pixel);
            println!("vehicle classes  : {:?}", config.vehicle_classes);
            println!("evidence dir     : {}", config.evidence_dir.display());
            println!("database         : {}", config.database_path.display());
            println!("languages        : {}", config.recognizer_languages.join(", "));
            println!("inactivity       : {} frames", config.inactivity_frames);
            println!("fallback fps     : {}", config.fallback_fps);
            println!("crop padding     : {} px", config.crop_padding_px);
        }
        Command::Records { config, limit } => {
            let config = PipelineConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let store = SqliteEvidenceStore::open(&config.database_path)
                .with_context(|| format!("opening {}", config.database_path.display()))?;
            let records = store.recent(limit)?;
            if records.is_empty() {
                println!("no evidence recorded");
            }
            for r in records {
                let document = r
                    .document_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{:<5} {}  {:<14} {:>6.1} km/h  {}  {}",
                    r.id,
                    r.timestamp,
                    r.plate_text,
                    r.speed_kmh,
                    r.image_path.display(),
                    document
                );
            }
        }
    }
    Ok(())
}
