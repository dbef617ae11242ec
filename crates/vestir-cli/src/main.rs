//! vestir: run the try-on workflow from the command line.
//!
//! Drives the same session as the browser app: both photos go through
//! the upload stages, each generative stage is run (and retried up to
//! `--attempts` times) then approved, and the final image is written to
//! disk. Saved results live in a file-backed album under `--album-dir`.
//!
//! # Usage
//!
//! ```text
//! vestir run --model person.jpg --outfit jacket.png --out look.png --save
//! vestir album list
//! vestir album export 1 first-look.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod store;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vestir_gemini::{ConfigError, DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiClient, GeminiConfig};
use vestir_pipeline::{
    Action, AlbumStore, CodecError, Download, EditOutcome, Effect, ImageEditor, Intent,
    PersistenceError, PipelineError, PipelineStage, Session, SourceFile, execute,
};

use crate::store::FileStore;

/// Guided virtual try-on from the command line.
#[derive(Parser)]
#[command(name = "vestir", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the generative service.
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Image model to request.
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    gemini_model: String,

    /// Directory holding the saved album.
    #[arg(long, global = true, default_value = ".vestir")]
    album_dir: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Dress the person in one photo in the garment from another.
    Run(RunArgs),
    /// Inspect or manage saved results.
    #[command(subcommand)]
    Album(AlbumCommand),
}

#[derive(Args)]
struct RunArgs {
    /// Photo of the person (PNG, JPEG, BMP, WebP, GIF).
    #[arg(long)]
    model: PathBuf,

    /// Photo of the garment.
    #[arg(long)]
    outfit: PathBuf,

    /// Where to write the final image.
    #[arg(long, short)]
    out: PathBuf,

    /// Requests per generative stage before giving up.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    attempts: usize,

    /// Also write each intermediate result into this directory.
    #[arg(long)]
    stages_dir: Option<PathBuf>,

    /// Save the final image to the album.
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand)]
enum AlbumCommand {
    /// List saved results.
    List,
    /// Write a saved result to a file.
    Export {
        /// Entry number as shown by `album list`.
        number: usize,
        /// Destination file.
        path: PathBuf,
    },
    /// Delete a saved result.
    Remove {
        /// Entry number as shown by `album list`.
        number: usize,
    },
}

/// Everything that can stop a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid service settings: {0}")]
    Config(#[from] ConfigError),

    #[error("no API key: pass --api-key or set GEMINI_API_KEY")]
    MissingApiKey,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{stage} failed after {attempts} attempt(s): {reason}")]
    GaveUp {
        stage: PipelineStage,
        attempts: usize,
        reason: String,
    },

    #[error("album has no entry {0}")]
    NoSuchEntry(usize),

    #[error(transparent)]
    Decode(#[from] CodecError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Run(args) => run(&cli, args).await,
        Command::Album(command) => album(&cli.album_dir, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn service_config(cli: &Cli) -> Result<GeminiConfig, CliError> {
    let config = GeminiConfig {
        endpoint: cli.endpoint.clone(),
        model: cli.gemini_model.clone(),
        api_key: cli.api_key.clone(),
    };
    config.validate()?;
    if config.api_key().is_none() {
        return Err(CliError::MissingApiKey);
    }
    Ok(config)
}

async fn run(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let client = GeminiClient::new(service_config(cli)?);
    let mut session = Session::new(FileStore::new(&cli.album_dir));

    let model = read_source(&args.model)?;
    let outfit = read_source(&args.outfit)?;

    for stage in PipelineStage::ALL {
        if stage.is_upload() {
            let file = if stage == PipelineStage::ModelUpload {
                model.clone()
            } else {
                outfit.clone()
            };
            session.handle(Intent::SelectFile { stage, file })?;
            let name = session.pipeline().slot(stage).source_name().unwrap_or_default();
            eprintln!("{stage}: loaded {name}");
            continue;
        }

        attempt_stage(&mut session, &client, stage, args.attempts).await?;
        if let Some(dir) = &args.stages_dir
            && let Effect::Download(file) = session.handle(Intent::ClickAction {
                stage,
                action: Action::Download,
            })?
        {
            write_download(dir, &file)?;
        }
        session.handle(Intent::ClickAction {
            stage,
            action: Action::Approve,
        })?;
        eprintln!("{stage}: approved");
    }

    let result = session
        .pipeline()
        .output(PipelineStage::Combine)
        .ok_or(PipelineError::NoOutput(PipelineStage::Combine))?
        .decode_bytes()?;
    write_file(&args.out, &result)?;
    println!("{}", args.out.display());

    if args.save {
        match session.handle(Intent::ClickAction {
            stage: PipelineStage::Combine,
            action: Action::SaveToAlbum,
        }) {
            Ok(Effect::Saved { index }) => eprintln!("saved to album as entry {}", index + 1),
            Ok(_) => {}
            Err(PipelineError::Persistence(e)) => eprintln!("warning: album not saved: {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Run `stage` until an attempt succeeds or `attempts` are used up.
async fn attempt_stage<E: ImageEditor>(
    session: &mut Session<FileStore>,
    editor: &E,
    stage: PipelineStage,
    attempts: usize,
) -> Result<(), CliError> {
    for attempt in 1..=attempts {
        let action = if attempt == 1 {
            Action::Run
        } else {
            Action::Retry
        };
        let Effect::Edit(ticket) = session.handle(Intent::ClickAction { stage, action })? else {
            return Err(PipelineError::NotEditStage(stage).into());
        };

        eprintln!("{stage}: working (attempt {attempt}/{attempts})");
        let outcome = execute(editor, &ticket).await;
        if session.finish_edit(ticket, outcome) == EditOutcome::Succeeded {
            return Ok(());
        }
        let reason = session.pipeline().slot(stage).error().unwrap_or("unknown error");
        eprintln!("{stage}: {reason}");
    }

    Err(CliError::GaveUp {
        stage,
        attempts,
        reason: session
            .pipeline()
            .slot(stage)
            .error()
            .unwrap_or("unknown error")
            .to_owned(),
    })
}

fn album(dir: &Path, command: &AlbumCommand) -> Result<(), CliError> {
    let mut album = AlbumStore::load(FileStore::new(dir));
    match command {
        AlbumCommand::List => {
            if album.is_empty() {
                eprintln!("album is empty");
            }
            for (index, entry) in album.entries().iter().enumerate() {
                println!(
                    "{:>3}  {:<10}  {} bytes encoded",
                    index + 1,
                    entry.media_type,
                    entry.encoded_len()
                );
            }
        }
        AlbumCommand::Export { number, path } => {
            let entry = entry_index(*number)
                .and_then(|index| album.get(index))
                .ok_or(CliError::NoSuchEntry(*number))?;
            write_file(path, &entry.decode_bytes()?)?;
            println!("{}", path.display());
        }
        AlbumCommand::Remove { number } => {
            let index = entry_index(*number).ok_or(CliError::NoSuchEntry(*number))?;
            album.remove(index)?.ok_or(CliError::NoSuchEntry(*number))?;
            eprintln!("removed entry {number}, {} left", album.len());
        }
    }
    Ok(())
}

/// Album entries are numbered from 1 on the command line.
fn entry_index(number: usize) -> Option<usize> {
    number.checked_sub(1)
}

fn read_source(path: &Path) -> Result<SourceFile, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(SourceFile::undeclared(name, bytes))
}

fn write_download(dir: &Path, file: &Download) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|source| CliError::Write {
        path: dir.to_owned(),
        source,
    })?;
    write_file(&dir.join(&file.filename), &file.payload.decode_bytes()?)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn attempts_must_be_positive() {
        let parsed = Cli::try_parse_from([
            "vestir", "run", "--model", "a.jpg", "--outfit", "b.jpg", "--out", "c.png",
            "--attempts", "0",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from([
            "vestir", "run", "--model", "a.jpg", "--outfit", "b.jpg", "-o", "c.png",
        ])
        .unwrap();
        assert_eq!(cli.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cli.gemini_model, DEFAULT_MODEL);
        let Command::Run(args) = cli.command else {
            unreachable!("parsed a run command");
        };
        assert_eq!(args.attempts, 1);
        assert!(!args.save);
    }

    #[test]
    fn entry_numbers_start_at_one() {
        assert_eq!(entry_index(0), None);
        assert_eq!(entry_index(1), Some(0));
    }

    #[test]
    fn missing_api_key_is_reported_before_any_work() {
        let cli = Cli::try_parse_from([
            "vestir", "run", "--model", "a.jpg", "--outfit", "b.jpg", "-o", "c.png",
            "--api-key", "  ",
        ])
        .unwrap();
        assert!(matches!(service_config(&cli), Err(CliError::MissingApiKey)));
    }

    #[test]
    fn album_export_of_unknown_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = album(
            dir.path(),
            &AlbumCommand::Export {
                number: 1,
                path: dir.path().join("out.png"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CliError::NoSuchEntry(1)));
    }

    #[test]
    fn album_export_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut saved = AlbumStore::load(FileStore::new(dir.path()));
        saved
            .save(vestir_pipeline::ImagePayload::from_bytes(b"png!", "image/png"))
            .unwrap();

        let target = dir.path().join("look.png");
        album(
            dir.path(),
            &AlbumCommand::Export {
                number: 1,
                path: target.clone(),
            },
        )
        .unwrap();
        assert_eq!(std::fs::read(target).unwrap(), b"png!");
    }

    #[test]
    fn album_remove_shrinks_album() {
        let dir = tempfile::tempdir().unwrap();
        let mut saved = AlbumStore::load(FileStore::new(dir.path()));
        saved
            .save(vestir_pipeline::ImagePayload::new("AAAA", "image/png"))
            .unwrap();

        album(dir.path(), &AlbumCommand::Remove { number: 1 }).unwrap();
        assert!(AlbumStore::load(FileStore::new(dir.path())).is_empty());
    }
}
