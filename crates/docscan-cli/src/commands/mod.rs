//! CLI commands.

pub mod batch;
pub mod config;
pub mod decode;
pub mod parse;
pub mod process;

use std::path::{Path, PathBuf};

use console::style;

use docscan_core::{DocumentType, ExtractedFields, ExtractionResult, ScanConfig};

/// Document type accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DocTypeArg {
    /// National identity card
    IdCard,
    /// Engraved motor fingerprint
    MotorFingerprint,
    /// Chassis / VIN plate
    ChassisNumber,
}

impl From<DocTypeArg> for DocumentType {
    fn from(arg: DocTypeArg) -> Self {
        match arg {
            DocTypeArg::IdCard => DocumentType::IdentityCard,
            DocTypeArg::MotorFingerprint => DocumentType::MotorFingerprint,
            DocTypeArg::ChassisNumber => DocumentType::ChassisNumber,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docscan")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else
/// defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ScanConfig> {
    if let Some(path) = config_path {
        return Ok(ScanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(ScanConfig::from_file(&default_path)?)
    } else {
        Ok(ScanConfig::default())
    }
}

/// Print the manual-entry notice for an unsuccessful result.
pub fn report_manual_entry(result: &ExtractionResult) {
    if !result.requires_manual_entry() {
        return;
    }

    let reason = result.error.as_deref().unwrap_or("extraction incomplete");
    if result.error_kind.is_some_and(|kind| kind.is_soft()) {
        eprintln!(
            "{} Manual entry required, review the prefilled fields: {}",
            style("!").yellow(),
            reason
        );
    } else {
        eprintln!("{} Manual entry required: {}", style("!").yellow(), reason);
    }
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

const CSV_HEADER: [&str; 12] = [
    "document_type",
    "success",
    "confidence",
    "name",
    "national_id",
    "address",
    "phone",
    "birth_date",
    "gender",
    "code",
    "error_kind",
    "error",
];

/// One CSV row per result, columns as in [`CSV_HEADER`].
pub fn csv_row(result: &ExtractionResult) -> Vec<String> {
    let mut row = vec![String::new(); CSV_HEADER.len()];
    row[1] = result.success.to_string();
    row[2] = result.confidence.to_string();

    if let Some(fields) = &result.fields {
        row[0] = fields.document_type().to_string();
        match fields {
            ExtractedFields::IdentityCard(card) => {
                row[3] = card.name.clone();
                row[4] = card.national_id.clone();
                row[5] = card.address.clone();
                row[6] = card.phone.clone().unwrap_or_default();
                row[7] = card.birth_date.clone().unwrap_or_default();
                row[8] = card.gender.map(|g| g.to_string()).unwrap_or_default();
            }
            ExtractedFields::MotorFingerprint(vehicle) | ExtractedFields::ChassisNumber(vehicle) => {
                row[9] = vehicle.code.clone();
            }
        }
    }

    if let Some(kind) = result.error_kind {
        row[10] = serde_json::to_value(kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
    }
    row[11] = result.error.clone().unwrap_or_default();
    row
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_row(result))?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    let status = if result.success {
        "success"
    } else {
        "manual entry required"
    };
    output.push_str(&format!("Status: {}\n", status));
    output.push_str(&format!("Confidence: {}\n", result.confidence));
    if let Some(recognizer) = &result.recognizer {
        output.push_str(&format!("Recognizer: {}\n", recognizer));
    }
    output.push('\n');

    match &result.fields {
        Some(ExtractedFields::IdentityCard(card)) => {
            output.push_str("Identity card:\n");
            output.push_str(&format!("  Name:        {}\n", card.name));
            output.push_str(&format!("  National ID: {}\n", card.national_id));
            output.push_str(&format!("  Address:     {}\n", card.address));
            if let Some(phone) = &card.phone {
                output.push_str(&format!("  Phone:       {}\n", phone));
            }
            if let Some(birth_date) = &card.birth_date {
                output.push_str(&format!("  Birth date:  {}\n", birth_date));
            }
            if let Some(gender) = card.gender {
                output.push_str(&format!("  Gender:      {} ({})\n", gender, gender.label()));
            }
        }
        Some(fields) => {
            output.push_str(&format!("{}:\n", fields.document_type()));
            output.push_str(&format!("  Code: {}\n", fields.vehicle_code().unwrap_or_default()));
        }
        None => {}
    }

    if let Some(error) = &result.error {
        output.push_str(&format!("\nError: {}\n", error));
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
