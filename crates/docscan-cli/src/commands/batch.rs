//! Batch processing command for multiple document images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use docscan_core::{
    DocumentScanner, DocumentType, ExtractionResult, RawImage, ResultAssembler, ScanError,
};

use super::process::RecognizerArgs;
use super::{csv_row, format_result, load_config, DocTypeArg, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Document type of every input
    #[arg(short, long, value_enum)]
    doc_type: DocTypeArg,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    #[command(flatten)]
    recognizers: RecognizerArgs,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: ExtractionResult,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.recognizers.apply(&mut config);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "webp" | "tiff" | "tif" | "bmp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let doc_type = DocumentType::from(args.doc_type);
    let scanner = DocumentScanner::from_config(&config)?;
    let assembler = ResultAssembler::from_config(&config.extraction);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Sequential: each scan already races its recognizers
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = match fs::read(&path) {
            Ok(bytes) => match RawImage::from_bytes(bytes) {
                Ok(image) => scanner.extract(image, doc_type).await,
                Err(e) => assembler.failure(&ScanError::from(e)),
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                assembler.failure(&ScanError::from(e))
            }
        };

        overall_pb.inc(1);
        results.push(ProcessResult { path, result });
    }

    overall_pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for processed in &results {
            let output_name = processed
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_result(&processed.result, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.result.success).count();
    let manual: Vec<_> = results.iter().filter(|r| !r.result.success).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} need manual entry",
        style(successful).green(),
        style(manual.len()).yellow()
    );

    if !manual.is_empty() {
        println!();
        println!("{}", style("Manual entry required:").yellow());
        for processed in &manual {
            println!(
                "  - {}: {}",
                processed.path.display(),
                processed
                    .result
                    .error
                    .as_deref()
                    .unwrap_or("extraction incomplete")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "processing_time_ms", "recognizer"];
    header.extend(super::CSV_HEADER);
    wtr.write_record(&header)?;

    for processed in results {
        let filename = processed
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let mut record = vec![
            filename,
            processed.result.processing_time_ms.to_string(),
            processed.result.recognizer.clone().unwrap_or_default(),
        ];
        record.extend(csv_row(&processed.result));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
