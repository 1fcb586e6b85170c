//! Process command - scan a single document image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docscan_core::{DocumentScanner, DocumentType, RawImage, ResultAssembler, ScanConfig, ScanError};

use super::{format_result, load_config, report_manual_entry, DocTypeArg, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image (JPEG, PNG, ...)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type
    #[arg(short, long, value_enum)]
    doc_type: DocTypeArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    recognizers: RecognizerArgs,
}

/// Recognizer overrides shared by the scanning commands.
#[derive(Args, Clone)]
pub struct RecognizerArgs {
    /// API key for the remote recognizer
    #[arg(long, env = "DOCSCAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Local model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Disable the remote recognizer
    #[arg(long)]
    no_remote: bool,

    /// Disable the local recognizer
    #[arg(long)]
    no_local: bool,
}

impl RecognizerArgs {
    /// Apply command-line overrides to the loaded configuration.
    pub fn apply(&self, config: &mut ScanConfig) {
        if let Some(key) = &self.api_key {
            config.recognition.remote.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.model_dir {
            config.recognition.local.model_dir = dir.clone();
        }
        if self.no_remote {
            config.recognition.remote.enabled = false;
        }
        if self.no_local {
            config.recognition.local.enabled = false;
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.recognizers.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let doc_type = DocumentType::from(args.doc_type);
    info!("Processing {} as {}", args.input.display(), doc_type);

    let scanner = DocumentScanner::from_config(&config)?;
    debug!("Recognizers: {:?}", scanner.backend_names());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Scanning {}...", doc_type));

    let bytes = fs::read(&args.input)?;
    let result = match RawImage::from_bytes(bytes) {
        Ok(image) => scanner.extract(image, doc_type).await,
        Err(e) => ResultAssembler::from_config(&config.extraction).failure(&ScanError::from(e)),
    };

    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    report_manual_entry(&result);

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
