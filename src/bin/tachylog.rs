//! Tachylog CLI - Command-line interface for Tachylog
//!
//! Commands:
//! - pseudonym: Compute the pseudonym for a participant code
//! - names: Inspect and maintain the display-name registry
//! - simulate: Drive a synthetic session from a word list and export it

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tachylog::{
    pseudonymize, DisplayNameRegistry, LogError, SessionContext, WordEventParams,
    DEFAULT_NAMESPACE, DEFAULT_PSEUDONYM_BITS, TACHYLOG_VERSION,
};

/// Tachylog - Session recording and pseudonymized export engine
#[derive(Parser)]
#[command(name = "tachylog")]
#[command(version = TACHYLOG_VERSION)]
#[command(about = "Record and export tachistoscope reading sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the pseudonym for a participant code
    Pseudonym {
        /// Participant code
        code: String,

        /// Secret key material
        #[arg(short, long)]
        key: String,

        /// Pseudonym width in bits
        #[arg(long, default_value_t = DEFAULT_PSEUDONYM_BITS)]
        bits: u32,

        /// Namespace mixed into the HMAC message
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Inspect and maintain the display-name registry
    Names {
        /// Registry file (defaults to the per-user config location)
        #[arg(long)]
        registry: Option<PathBuf>,

        #[command(subcommand)]
        action: NamesAction,
    },

    /// Drive a synthetic session from a word list and export it
    Simulate {
        /// Word list file (whitespace-separated stimuli)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the exported CSV/JSON files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Participant code (also used as the display label)
        #[arg(long)]
        participant: String,

        /// Secret key material for pseudonymization
        #[arg(long)]
        key: String,

        /// Display duration per word in milliseconds
        #[arg(long, default_value = "350")]
        duration_ms: u64,

        /// Gap between words in milliseconds
        #[arg(long, default_value = "150")]
        gap_ms: u64,

        /// Registry file (defaults to the per-user config location)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Omit the display-name column from the CSV exports
        #[arg(long)]
        no_display_name: bool,
    },
}

#[derive(Subcommand)]
enum NamesAction {
    /// List all stored pseudonym/display-name pairs
    List,
    /// Set (or overwrite) the display name for a pseudonym
    Set { pseudonym: u64, name: String },
    /// Delete the entry for a pseudonym
    Delete { pseudonym: u64 },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LogError> {
    match cli.command {
        Commands::Pseudonym {
            code,
            key,
            bits,
            namespace,
        } => {
            println!("{}", pseudonymize(&code, key.as_bytes(), bits, &namespace));
            Ok(())
        }

        Commands::Names { registry, action } => {
            let registry = registry
                .map(DisplayNameRegistry::new)
                .unwrap_or_default();
            run_names(&registry, action)
        }

        Commands::Simulate {
            input,
            output_dir,
            participant,
            key,
            duration_ms,
            gap_ms,
            registry,
            no_display_name,
        } => run_simulate(
            &input,
            &output_dir,
            &participant,
            key.as_bytes(),
            duration_ms,
            gap_ms,
            registry,
            !no_display_name,
        ),
    }
}

fn run_names(registry: &DisplayNameRegistry, action: NamesAction) -> Result<(), LogError> {
    match action {
        NamesAction::List => {
            for (pseudonym, name) in registry.load() {
                println!("{pseudonym}\t{name}");
            }
            Ok(())
        }
        NamesAction::Set { pseudonym, name } => registry.set_name(pseudonym, &name),
        NamesAction::Delete { pseudonym } => registry.delete_name(pseudonym),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    input: &Path,
    output_dir: &Path,
    participant: &str,
    key: &[u8],
    duration_ms: u64,
    gap_ms: u64,
    registry: Option<PathBuf>,
    include_display_name: bool,
) -> Result<(), LogError> {
    let text = std::fs::read_to_string(input).map_err(|e| LogError::InputFile {
        path: input.to_path_buf(),
        source: e,
    })?;
    let words: Vec<&str> = text.split_whitespace().collect();

    let mut context = SessionContext::new(key.to_vec(), output_dir.to_path_buf());
    if let Some(path) = registry {
        context = context.with_registry(DisplayNameRegistry::new(path));
    }
    context.include_display_name = include_display_name;

    context.select_file(input)?;
    context.attach_new_participant(participant)?;
    let session_id = context.start(0, None)?;

    // Replay the word list on a fixed cadence
    let mut now_ms = 0u64;
    for word in &words {
        let shown_at_ms = now_ms;
        let hidden_at_ms = shown_at_ms + duration_ms;
        context.logger.log_word_event(
            word,
            shown_at_ms,
            hidden_at_ms,
            WordEventParams {
                duration_ms,
                stimulus_source: input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                ..Default::default()
            },
        );
        now_ms = hidden_at_ms + gap_ms;
    }
    context.end(now_ms);

    let paths = context.export_all()?;
    println!("session {session_id}: {} words", words.len());
    println!("word events: {}", paths.word_events_csv.display());
    println!("pause events: {}", paths.pause_events_csv.display());
    println!("summary: {}", paths.summary_csv.display());
    println!("json: {}", paths.session_json.display());
    Ok(())
}
