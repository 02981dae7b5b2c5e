//! recovery-engine - Muscle recovery and training-readiness engine

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use recovery_engine::db::Database;
use recovery_engine::session::SessionLog;
use recovery_engine::{EngineConfig, RecoveryEngine, api};

const DB_PATH: &str = "recovery.db";

#[derive(Parser)]
#[command(name = "recovery-engine")]
#[command(author, version, about = "Muscle recovery and training-readiness engine")]
struct Cli {
    /// SQLite database path
    #[arg(long, env = "RECOVERY_DB_PATH", default_value = DB_PATH)]
    db: String,

    #[command(flatten)]
    engine: EngineConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "RECOVERY_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Record a completed session from a JSON file
    Log {
        /// Session payload (sessionId, userId, completedAt, exercises)
        file: PathBuf,
    },

    /// Show live fatigue per muscle group
    Fatigue {
        user: String,
    },

    /// Suggest the next workout
    Recommend {
        user: String,
    },

    /// List recorded sessions
    History {
        user: String,

        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db).with_context(|| format!("opening database {}", cli.db))?;
    let mut engine = RecoveryEngine::new(db, cli.engine);

    match cli.command {
        Some(Commands::Serve { bind }) => {
            api::serve(engine, bind).await?;
        }

        Some(Commands::Log { file }) => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let session: SessionLog = serde_json::from_str(&raw)?;
            let outcome = engine.record_session(&session)?;

            if !outcome.applied {
                println!("Session {} already recorded, nothing changed", outcome.session_id);
            } else {
                println!("Logged session {}:", outcome.session_id);
                for m in &outcome.updated {
                    println!(
                        "  {:12} | fatigue {:3} | {:>8.0} vol | {} sets",
                        m.muscle_group.id(),
                        m.fatigue_level,
                        m.volume_last_session,
                        m.sets_last_session
                    );
                }
            }
        }

        Some(Commands::Fatigue { user }) => {
            let report = engine.fatigue_report(&user, Utc::now())?;
            println!("Muscle fatigue for {}", user);
            println!("{:-<72}", "");
            for m in &report {
                let eta = m
                    .estimated_full_recovery_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:12} | {:3} | {:10} | recovered by {}",
                    m.muscle_group.id(),
                    m.fatigue_level,
                    m.recovery_status.id(),
                    eta
                );
            }
        }

        Some(Commands::Recommend { user }) => {
            let rec = engine.recommend(&user, Utc::now())?;
            println!("Suggested workout: {}", rec.suggested_workout);
            println!("{:-<40}", "");
            for split in &rec.split_readiness {
                let flag = if split.blocked { " (blocked)" } else { "" };
                println!("{:10} readiness {:5.1}%{}", split.split.id(), split.score, flag);
            }
            let ready: Vec<_> = rec.ready_to_train.iter().map(|m| m.id()).collect();
            println!("Ready: {}", if ready.is_empty() { "-".to_string() } else { ready.join(", ") });
            for n in &rec.needs_rest {
                println!("Needs rest: {} ({}% recovered)", n.muscle_group, n.recovery_progress);
            }
        }

        Some(Commands::History { user, limit }) => {
            let entries = engine.history(&user, limit)?;
            println!("Recorded sessions:");
            println!("{:-<60}", "");
            for e in &entries {
                let muscles: Vec<_> = e.muscle_groups.iter().map(|m| m.id()).collect();
                println!(
                    "{} | {:16} | suggested {:9} | {}",
                    e.trained_at.format("%Y-%m-%d %H:%M"),
                    e.session_id,
                    e.suggested_workout.map(|s| s.id()).unwrap_or("-"),
                    muscles.join(", ")
                );
            }
        }

        None => {
            // Default: serve on the default address
            let bind: SocketAddr = "127.0.0.1:8080".parse()?;
            api::serve(engine, bind).await?;
        }
    }

    Ok(())
}
