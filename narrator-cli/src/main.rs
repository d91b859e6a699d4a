use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

use crate::commands::Session;

#[derive(Parser, Debug)]
#[command(name = "narrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse ElevenLabs voices and generate narrated scene audio")]
struct Args {
    /// Project settings file (defaults to ./narrator.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// KEY=value file holding ELEVENLABS_API_KEY (overrides the settings)
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Print machine-readable JSON instead of text reports
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every voice in the remote catalog
    Voices {
        /// Group voices by gender and age labels
        #[arg(long)]
        group: bool,
    },

    /// Split the voice catalog into matched and unmatched voices
    Classify {
        /// Indicator term to look for in names and descriptions (repeatable)
        #[arg(long = "term", value_name = "TERM")]
        terms: Vec<String>,

        /// Label predicate such as gender=male (repeatable)
        #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_label)]
        labels: Vec<(String, String)>,

        /// Voice id to select exactly, bypassing the heuristic (repeatable)
        #[arg(long = "allowlist", value_name = "VOICE_ID")]
        allowlist: Vec<String>,
    },

    /// Check the credential and show subscription usage
    Account,

    /// List the configured scenes
    Scenes,

    /// Synthesize configured scenes to audio files
    Generate {
        /// Scene id to generate (repeatable, defaults to every scene)
        #[arg(long = "scene", value_name = "ID")]
        scenes: Vec<String>,

        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Read sample texts with one or more voices
    Sample {
        /// Voice name, from the settings or the remote catalog (repeatable)
        #[arg(long = "voice", value_name = "NAME", required = true)]
        voices: Vec<String>,

        /// Text to read (repeatable, defaults to a stock passage)
        #[arg(long = "text", value_name = "TEXT")]
        texts: Vec<String>,

        #[arg(long, default_value = "cinematic")]
        emotion: String,

        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Write the built-in settings to a file for editing
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    setup_tracing()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    info!(
        "CLI startup: command={:?}, config={:?}, json={}",
        args.command, args.config, args.json
    );

    let load = || Session::load(args.config.clone(), args.env_file.clone(), args.json);

    match args.command {
        Command::Voices { group } => load()?.voices(group).await,
        Command::Classify {
            terms,
            labels,
            allowlist,
        } => load()?.classify(terms, labels, allowlist).await,
        Command::Account => load()?.account().await,
        Command::Scenes => load()?.scenes(),
        Command::Generate { scenes, output_dir } => load()?.generate(scenes, output_dir).await,
        Command::Sample {
            voices,
            texts,
            emotion,
            output_dir,
        } => load()?.sample(voices, texts, emotion, output_dir).await,
        Command::Init { force } => commands::init(args.config.clone(), force),
    }
}

fn parse_label(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Reports go to stdout, so logs only go to a file in the user's home
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    let trace_dir = home.join(".narrator").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("narrator.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}
