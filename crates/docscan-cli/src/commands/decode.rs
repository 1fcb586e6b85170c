//! Decode command - birth date and sex from a national ID.

use clap::Args;
use console::style;
use serde::Serialize;

use docscan_core::extract::rules::extract_national_id;
use docscan_core::NationalIdDecoder;

use super::load_config;

/// Arguments for the decode command.
#[derive(Args)]
pub struct DecodeArgs {
    /// 14-digit national ID
    #[arg(required = true)]
    national_id: String,

    /// Two-digit year pivot (default from config)
    #[arg(long)]
    century_pivot: Option<u8>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeOutput {
    national_id: String,
    birth_date: String,
    gender: String,
    valid_date: bool,
}

pub fn run(args: DecodeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pivot = args
        .century_pivot
        .unwrap_or(config.extraction.century_pivot);

    let national_id = extract_national_id(&args.national_id)
        .ok_or_else(|| anyhow::anyhow!("Not a 14-digit national ID: {}", args.national_id))?;

    let decoded = NationalIdDecoder::new()
        .with_century_pivot(pivot)
        .decode(&national_id)
        .ok_or_else(|| anyhow::anyhow!("Not a 14-digit national ID: {}", args.national_id))?;

    let valid_date = decoded.calendar_date().is_some();

    if args.json {
        let output = DecodeOutput {
            national_id,
            birth_date: decoded.birth_date(),
            gender: decoded.gender.to_string(),
            valid_date,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("National ID: {}", national_id);
        println!("Birth date:  {}", decoded.birth_date());
        println!(
            "Gender:      {} ({})",
            decoded.gender,
            decoded.gender.label()
        );
        if !valid_date {
            eprintln!(
                "{} Encoded birth date is not a calendar date",
                style("!").yellow()
            );
        }
    }

    Ok(())
}
