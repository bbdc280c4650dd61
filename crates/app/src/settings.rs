use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "settings.toml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Currency used when the group file does not name one.
    pub currency: String,
    /// Group snapshot (JSON).
    pub input: Option<String>,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            input: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSection,
    pub ledger: LedgerSection,
    pub output: OutputSection,
}

#[derive(Debug, Parser)]
#[command(name = "dividi", about = "Balances and settle-up plan for a shared-expense group")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Group snapshot to read (JSON).
    #[arg(long, short)]
    input: Option<String>,
    /// Default currency code (e.g. EUR).
    #[arg(long)]
    currency: Option<String>,
    /// Output format.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "DIVIDI_LOG")]
    level: Option<String>,
}

/// Loads settings from the config file, then `DIVIDI__*` environment
/// variables, then command-line flags; later sources win.
pub fn load() -> Result<Settings> {
    load_from(Args::parse(), None)
}

/// Same as [`load`] with explicit flags. `env` replaces the process
/// environment when given.
fn load_from(args: Args, env: Option<config::Map<String, String>>) -> Result<Settings> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(
        config::Environment::with_prefix("DIVIDI")
            .separator("__")
            .source(env),
    );
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(input) = args.input {
        settings.ledger.input = Some(input);
    }
    if let Some(currency) = args.currency {
        settings.ledger.currency = currency;
    }
    if let Some(format) = args.format {
        settings.output.format = format;
    }
    if let Some(level) = args.level {
        settings.app.level = level;
    }

    Ok(settings)
}
