//! Parse command - extract fields from recognized text without an image.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use docscan_core::{DocumentScanner, DocumentType};

use super::{format_result, load_config, report_manual_entry, DocTypeArg, OutputFormat};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file with recognized text, or `-` for stdin
    #[arg(required = true)]
    input: String,

    /// Document type
    #[arg(short, long, value_enum)]
    doc_type: DocTypeArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.input, e))?
    };

    let doc_type = DocumentType::from(args.doc_type);
    info!("Parsing {} characters as {}", text.len(), doc_type);

    let scanner = DocumentScanner::builder().with_config(config).build();
    let result = scanner.extract_from_text(&text, doc_type);

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

    Ok(())
}
