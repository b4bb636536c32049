// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Doc2Any — local document and image format conversion.
//
// Entry point. Initialises logging, loads configuration and dispatches the
// convert, ocr, formats and stats subcommands. Conversions run on a blocking
// thread while progress events are rendered on the async side.

mod progress;
mod services;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use doc2any_core::error::Doc2AnyError;
use doc2any_core::human_errors::humanize_error;
use doc2any_core::{ConversionResult, ConverterConfig, Format, SourceDescriptor, registry};
use doc2any_document::{CancelToken, Converter, OcrAdapter, ProgressSink};
use doc2any_stats::format_size;
use tokio::task::spawn_blocking;

#[derive(Debug, Parser)]
#[command(
    name = "doc2any",
    version,
    about = "Convert documents and images between formats, locally"
)]
struct Cli {
    /// Configuration file (defaults to config.json in the data directory).
    #[arg(long, global = true, env = "DOC2ANY_CONFIG")]
    config: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a file into another format.
    Convert {
        file: PathBuf,
        /// Target format extension (e.g. pdf, docx, png).
        #[arg(long = "to")]
        to: String,
        /// Directory for the output (defaults to the input's directory).
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Recognise text in an image.
    Ocr {
        image: PathBuf,
        /// Tesseract language code, e.g. eng or eng+deu.
        #[arg(long)]
        lang: Option<String>,
        /// Convert the recognised text into this format instead of printing it.
        #[arg(long = "to")]
        to: Option<String>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List the target formats offered for an extension.
    Formats { extension: String },
    /// Show (or reset) the conversion counters.
    Stats {
        #[arg(long)]
        reset: bool,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = services::load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Convert {
            file,
            to,
            output_dir,
        } => {
            let target = parse_target(&to)?;
            let (source, data) = read_source(&file, config.max_source_bytes).await?;
            let result = run_conversion(config, source, data, target, cli.quiet).await?;
            let path = write_output(&file, output_dir.as_deref(), &result).await?;
            println!("{}", path.display());
        }
        Command::Ocr {
            image,
            lang,
            to,
            output_dir,
        } => {
            let (source, data) = read_source(&image, config.max_ocr_bytes).await?;
            let language = lang.unwrap_or_else(|| config.ocr_language.clone());
            let adapter = OcrAdapter::with_default_engine(&config);
            tracing::info!(engine = adapter.engine_name(), %language, "running OCR");

            let (sink, events) = ProgressSink::channel();
            let cancel = cancel_on_ctrl_c();
            let task = spawn_blocking(move || {
                adapter.recognize(&source, &data, &language, &sink, &cancel)
            });
            progress::render(events, cli.quiet).await;
            let ocr = task.await?.map_err(report)?;
            if let Some(confidence) = ocr.confidence {
                tracing::info!(confidence, "OCR confidence");
            }

            match to {
                None => println!("{}", ocr.text),
                Some(to) => {
                    let target = parse_target(&to)?;
                    let (text_source, text) = ocr.into_source();
                    let result =
                        run_conversion(config, text_source, text, target, cli.quiet).await?;
                    let path = write_output(&image, output_dir.as_deref(), &result).await?;
                    println!("{}", path.display());
                }
            }
        }
        Command::Formats { extension } => {
            let ext = extension.trim_start_matches('.').to_ascii_lowercase();
            if !registry::is_valid_input(&ext) {
                return Err(report(Doc2AnyError::UnsupportedExtension(ext)));
            }
            let targets: Vec<String> = registry::targets_for_extension(&ext)
                .iter()
                .map(|format| format!("{} {}", format.icon(), format.extension()))
                .collect();
            println!("{ext} -> {}", targets.join(", "));
            if registry::is_valid_ocr_input(&ext) {
                println!("{ext} can also be read with `doc2any ocr`");
            }
        }
        Command::Stats { reset, json } => {
            let stats =
                services::open_stats().ok_or_else(|| anyhow!("stats database unavailable"))?;
            if reset {
                stats.reset().map_err(report)?;
            }
            let totals = stats.totals().map_err(report)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                println!("Files converted: {}", totals.files);
                println!("Data processed:  {}", format_size(totals.bytes));
                if let Some(updated) = &totals.updated_at {
                    println!("Last updated:    {updated}");
                }
            }
        }
    }
    Ok(())
}

fn parse_target(to: &str) -> Result<Format> {
    Format::from_extension(to)
        .ok_or_else(|| report(Doc2AnyError::UnsupportedExtension(to.to_string())))
}

/// Describe `path` from its metadata and read it, refusing anything over
/// `max_bytes` before a byte is loaded.
async fn read_source(path: &Path, max_bytes: u64) -> Result<(SourceDescriptor, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();
    let mut source = SourceDescriptor::new(name, size).map_err(report)?;
    registry::check_size(&source, max_bytes).map_err(report)?;

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    // Later checks see what was actually read.
    source.size = data.len() as u64;
    Ok((source, data))
}

async fn run_conversion(
    config: ConverterConfig,
    source: SourceDescriptor,
    data: Vec<u8>,
    target: Format,
    quiet: bool,
) -> Result<ConversionResult> {
    let mut converter = Converter::new(config);
    if let Some(stats) = services::open_stats() {
        converter = converter.with_recorder(Box::new(stats));
    }

    let (sink, events) = ProgressSink::channel();
    let cancel = cancel_on_ctrl_c();
    let task = spawn_blocking(move || converter.convert(&source, &data, target, &sink, &cancel));
    // Ends once the blocking task drops its sink.
    progress::render(events, quiet).await;
    task.await?.map_err(report)
}

async fn write_output(
    input: &Path,
    output_dir: Option<&Path>,
    result: &ConversionResult,
) -> Result<PathBuf> {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(&result.file_name);
    tokio::fs::write(&path, &result.data)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;
    for notice in &result.notices {
        eprintln!("note: {notice}");
    }
    tracing::info!(path = %path.display(), bytes = result.size(), "output written");
    Ok(path)
}

fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.cancel();
        }
    });
    cancel
}

/// Print the single user-facing message for `err` and hand it on.
fn report(err: Doc2AnyError) -> anyhow::Error {
    let human = humanize_error(&err);
    eprintln!("{}\n{}", human.message, human.suggestion);
    anyhow::Error::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_arguments_parse() {
        let cli = Cli::parse_from(["doc2any", "convert", "report.csv", "--to", "docx"]);
        match cli.command {
            Command::Convert { file, to, output_dir } => {
                assert_eq!(file, PathBuf::from("report.csv"));
                assert_eq!(to, "docx");
                assert!(output_dir.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(parse_target("exe").is_err());
        assert_eq!(parse_target("PDF").unwrap(), Format::Pdf);
    }

    #[tokio::test]
    async fn oversized_file_is_refused_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![b'x'; 64]).unwrap();

        let err = read_source(&path, 16).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Doc2AnyError>(),
            Some(Doc2AnyError::FileTooLarge { size: 64, limit: 16 })
        ));

        let (source, data) = read_source(&path, 64).await.unwrap();
        assert_eq!(source.size, 64);
        assert_eq!(source.format, Format::Txt);
        assert_eq!(data.len(), 64);
    }

    #[tokio::test]
    async fn unknown_extension_is_refused_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.exe");
        std::fs::write(&path, b"MZ").unwrap();
        let err = read_source(&path, u64::MAX).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Doc2AnyError>(),
            Some(Doc2AnyError::UnsupportedExtension(ext)) if ext == "exe"
        ));
        assert!(read_source(&dir.path().join("missing.txt"), u64::MAX).await.is_err());
    }

    #[tokio::test]
    async fn output_lands_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConversionResult {
            data: b"hello".to_vec(),
            file_name: "notes_converted.txt".into(),
            target: Format::Txt,
            route: doc2any_core::ConversionRoute::Standard,
            notices: Vec::new(),
        };
        let path = write_output(Path::new("notes.txt"), Some(dir.path()), &result)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("notes_converted.txt"));
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }
}
