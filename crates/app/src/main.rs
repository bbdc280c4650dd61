use std::process::ExitCode;

use error::{AppError, Result};
use report::Report;
use settings::{OutputFormat, Settings};
use snapshot::GroupFile;

mod error;
mod report;
mod settings;
mod snapshot;

fn main() -> ExitCode {
    let settings = match settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "dividi={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(&settings) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(settings: &Settings) -> Result<String> {
    let path = settings
        .ledger
        .input
        .as_deref()
        .ok_or(AppError::MissingInput)?;
    tracing::info!("reading group snapshot from {path}");

    let text = std::fs::read_to_string(path)?;
    let mut ledger = GroupFile::from_json(&text)?.into_ledger(&settings.ledger.currency)?;

    let plan = ledger
        .settlement_plan()
        .map_err(|err| AppError::engine("settlement plan", err))?;
    let snapshot = ledger
        .balances()
        .map_err(|err| AppError::engine("balances", err))?;
    let report = Report::new(snapshot, &plan);

    Ok(match settings.output.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report.to_json()?,
    })
}
