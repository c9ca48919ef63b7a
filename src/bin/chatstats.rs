//! chatstats CLI - ingestion and analytical queries over chat mention statistics.

use chatstats::analytics::{ActiveColumn, AnalyticsEngine};
use chatstats::config::ChatStatsConfig;
use chatstats::extraction::{default_stages, CapitalizedPhraseRecognizer};
use chatstats::model::Interval;
use chatstats::pipeline::{Pipeline, PipelineConfig};
use chatstats::realtime::RealtimeAggregator;
use chatstats::source::{spawn_source, ChatMessageEnvelope, NatsPublisher};
use chatstats::store::{Database, MentionStore};
use chatstats::FatMessage;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Parser)]
#[command(name = "chatstats")]
#[command(version, about = "Chat mention statistics: ingestion and queries", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/chatstats.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    InitDb,

    /// Run the ingestion pipeline against the configured source
    Ingest,

    /// Publish a JSONL file of messages to the NATS stream
    Publish {
        /// JSONL file with one FatMessage object per line
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Top mentioned values for one kind
    Top {
        #[arg(short, long, value_enum, default_value_t = Kind::Emoji)]
        kind: Kind,

        /// Look back this many days from now
        #[arg(short, long, default_value_t = 1)]
        days: i64,

        /// Restrict to these rooms (repeatable)
        #[arg(short, long)]
        room: Vec<String>,

        /// Restrict to these users (repeatable)
        #[arg(short, long)]
        user: Vec<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Activity share per room or user
    Active {
        #[arg(value_enum)]
        column: Column,

        /// Rank by combined message volume instead of emoji occurrences
        #[arg(long)]
        by_volume: bool,

        #[arg(short, long, default_value_t = 1)]
        days: i64,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Cross-room similarity matrix over mentioned values
    Similarity {
        #[arg(short, long, default_value_t = 1)]
        days: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Entity,
    Emoji,
    MessageType,
}

#[derive(Clone, Copy, ValueEnum)]
enum Column {
    Rooms,
    Users,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config = match ChatStatsConfig::load_from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config file not loaded; using defaults + env");
            ChatStatsConfig::from_env()
        }
    };

    if let Err(e) = run(cli.command, config).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

type CliError = Box<dyn std::error::Error + Send + Sync>;

async fn run(command: Commands, config: ChatStatsConfig) -> Result<(), CliError> {
    match command {
        Commands::InitDb => {
            Database::open(&config.database_url)?;
            println!("Schema applied to {}", config.database_url);
            Ok(())
        }
        Commands::Ingest => ingest(config).await,
        Commands::Publish { file } => publish(config, file).await,
        Commands::Top {
            kind,
            days,
            room,
            user,
            limit,
        } => {
            let engine = open_engine(&config)?;
            let interval = Interval::last_days(days);
            match kind {
                Kind::Entity => {
                    for (value, total) in engine.top_entities(&interval, &room, &user, limit)? {
                        println!("{:>8}  {}", total, value);
                    }
                }
                Kind::Emoji => {
                    for (value, total) in engine.top_emoji(&interval, &room, &user, limit)? {
                        println!("{:>8}  :{}:", total, value);
                    }
                }
                Kind::MessageType => {
                    for (value, total) in engine.top_message_types(&interval, &room, &user, limit)? {
                        println!("{:>8}  {}", total, value);
                    }
                }
            }
            Ok(())
        }
        Commands::Active {
            column,
            by_volume,
            days,
            limit,
        } => {
            let engine = open_engine(&config)?;
            let interval = Interval::last_days(days);
            let column = match column {
                Column::Rooms => ActiveColumn::Room,
                Column::Users => ActiveColumn::User,
            };
            let shares = if by_volume {
                engine.active_columns_by_message_volume(column, &interval, limit)?
            } else {
                engine.active_columns_by_total_variation(column, &interval, limit)?
            };
            for (value, share) in &shares {
                println!("{:>7.3}  {}", share, value);
            }
            Ok(())
        }
        Commands::Similarity { days } => {
            let engine = open_engine(&config)?;
            let interval = Interval::last_days(days);
            let matrix = engine.room_similarities_by_value(&interval)?;

            print!("{:<16}", "");
            for label in matrix.labels() {
                print!("{:>10.10}", label);
            }
            println!();
            for (i, label) in matrix.labels().iter().enumerate() {
                print!("{:<16.16}", label);
                for j in 0..matrix.len() {
                    print!("{:>10.3}", matrix.get(i, j));
                }
                println!();
            }
            Ok(())
        }
    }
}

fn open_engine(config: &ChatStatsConfig) -> Result<AnalyticsEngine, CliError> {
    let database = Database::open(&config.database_url)?;
    let store = Arc::new(MentionStore::new(&database));
    Ok(AnalyticsEngine::new(store))
}

async fn ingest(config: ChatStatsConfig) -> Result<(), CliError> {
    let database = Database::open(&config.database_url)?;
    let store = Arc::new(MentionStore::new(&database));
    let realtime = Arc::new(RealtimeAggregator::new());

    let stages = default_stages(Arc::new(CapitalizedPhraseRecognizer::new()));
    let pipeline_config = PipelineConfig {
        stage_parallelism: config.pipeline.stage_parallelism,
        queue_depth: config.pipeline.queue_depth,
    };

    let (tx, rx) = mpsc::channel::<FatMessage>(config.pipeline.queue_depth.max(1));
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut source = spawn_source(config.source.clone(), tx, stop_rx);
    let pipeline = Pipeline::spawn(
        rx,
        stages,
        Arc::clone(&store),
        Arc::clone(&realtime),
        pipeline_config,
    );

    tracing::info!("pipeline running; Ctrl-C for graceful shutdown");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested; draining in-flight work");
            let _ = stop_tx.send(true);
            if let Err(e) = (&mut source).await {
                tracing::error!(error = %e, "source task failed during shutdown");
            }
        }
        result = &mut source => {
            if let Err(e) = result {
                tracing::error!(error = %e, "source task failed");
            }
        }
    }
    pipeline.wait().await;

    let snapshot = realtime.snapshot();
    tracing::info!(counters = snapshot.len(), "ingestion finished");
    Ok(())
}

async fn publish(config: ChatStatsConfig, file: PathBuf) -> Result<(), CliError> {
    let url = config
        .source
        .nats_url
        .clone()
        .unwrap_or_else(|| "nats://localhost:4222".to_string());
    let publisher = NatsPublisher::connect(&url, &config.source.stream_name).await?;

    let contents = tokio::fs::read_to_string(&file).await?;
    let mut published = 0usize;
    let mut failed = 0usize;
    for (line_number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FatMessage>(line) {
            Ok(message) => {
                publisher.publish(&ChatMessageEnvelope::new(message)).await?;
                published += 1;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(line = line_number + 1, error = %e, "skipping malformed line");
            }
        }
    }
    println!("Published {} messages ({} skipped)", published, failed);
    Ok(())
}
