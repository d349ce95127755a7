//! Vector log analyzer CLI application.
//!
//! Decodes beam tracer logs, prints statistics, and converts between the
//! text and binary formats.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use vectorlog_core::{decode_file, output, InputFormat, Statistics};

/// Input format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Pick by file extension (.bin is binary, everything else text)
    Auto,
    /// Delimited text (frame,x,y,z,comment)
    Text,
    /// VEC1 binary
    Binary,
}

impl FormatArg {
    fn resolve(self, path: &Path) -> InputFormat {
        match self {
            Self::Auto => InputFormat::from_path(path),
            Self::Text => InputFormat::Text,
            Self::Binary => InputFormat::Binary,
        }
    }
}

/// Analyzer for vector-display beam tracer logs.
///
/// Decodes .csv or .bin logs, prints statistics, and optionally exports the
/// decoded stream.
#[derive(Parser, Debug)]
#[command(name = "vectorlog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input log file path (.csv, .bin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Export the decoded stream to this path
    ///
    /// The output format is determined by the file extension:
    /// - .csv, .txt: delimited text
    /// - .bin: VEC1 binary (samples without x/y/z are skipped)
    #[arg(short, long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Do not print the statistics report
    #[arg(long)]
    no_stats: bool,

    /// Suppress progress output and warnings
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();
    let format = args.format.resolve(&args.input);

    progress.set_message(format!(
        "Loading {:?} as {:?}...",
        args.input.file_name().unwrap_or_default(),
        format
    ));

    let result = decode_file(&args.input, format)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    for warning in &result.warnings {
        log::debug!("{}", warning);
    }

    progress.set_message(format!(
        "Loaded {} records ({} warnings)",
        result.records.len(),
        result.warnings.len()
    ));

    if let Some(export_path) = &args.export {
        let export_ext = export_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_lowercase();

        progress.set_message(format!(
            "Writing to {:?}...",
            export_path.file_name().unwrap_or_default()
        ));

        match export_ext.as_str() {
            "csv" | "txt" => {
                output::write_text(export_path, &result.records)
                    .context("Failed to write text output")?;
            }
            "bin" => {
                let version = result
                    .header
                    .map(|h| h.version)
                    .unwrap_or(output::DEFAULT_BINARY_VERSION);
                let written = output::write_binary(export_path, &result.records, version)
                    .context("Failed to write binary output")?;
                let skipped = result.records.len() - written;
                if skipped > 0 {
                    log::warn!("Skipped {} samples without a full x/y/z triple", skipped);
                }
            }
            _ => {
                anyhow::bail!(
                    "Unsupported export format: .{}. Use .csv or .bin",
                    export_ext
                );
            }
        }
    }

    let total_duration = start_time.elapsed();
    progress.finish_with_message(format!(
        "Done! Decoded {} records in {:.2}s",
        result.records.len(),
        total_duration.as_secs_f64()
    ));

    if !args.no_stats {
        let stats = Statistics::compute(&result.records);
        println!();
        println!("{}", stats);
    }

    if !args.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        eprintln!("  Format:       {:?}", format);
        if let Some(header) = &result.header {
            eprintln!("  Version:      {}", header.version);
        }
        eprintln!("  Records:      {}", result.records.len());
        eprintln!("  Warnings:     {}", result.warnings.len());
        if let Some(export_path) = &args.export {
            eprintln!("  Exported:     {:?}", export_path);
        }
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "vectorlog",
            "trace.bin",
            "--export",
            "out.csv",
            "--no-stats",
        ]);
        assert_eq!(args.input, PathBuf::from("trace.bin"));
        assert_eq!(args.format, FormatArg::Auto);
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
        assert!(args.no_stats);
        assert!(!args.quiet);
    }

    #[test]
    fn test_format_resolution() {
        let path = Path::new("trace.log");
        assert_eq!(FormatArg::Auto.resolve(Path::new("a.bin")), InputFormat::Binary);
        assert_eq!(FormatArg::Binary.resolve(path), InputFormat::Binary);
        assert_eq!(FormatArg::Text.resolve(Path::new("a.bin")), InputFormat::Text);
    }
}
