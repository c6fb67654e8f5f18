//! Command-line interface definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use koshflow_infra::{ReportKind, Resource};

/// koshflow - KoshFlow accounting API client
#[derive(Parser, Debug)]
#[command(name = "koshflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        env = "KOSHFLOW_LOG_FORMAT",
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // === Session ===
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "KOSHFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and company, then store the session
    Register(RegisterArgs),

    /// End the session on the server and forget local tokens
    Logout,

    /// Show the logged-in user and company
    Whoami,

    // === Resources ===
    /// GET an arbitrary API path (e.g. `/invoices/42`)
    Get {
        /// Path relative to the API base URL
        path: String,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// List a resource collection
    #[command(alias = "ls")]
    List {
        /// contacts, products, invoices, accounts or taxes
        resource: Resource,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Fetch a report
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "KOSHFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Company name
    #[arg(long = "company")]
    pub company_name: String,

    /// Company GSTIN
    #[arg(long)]
    pub gstin: Option<String>,

    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// profit-loss, balance-sheet, aging or dashboard
    pub kind: ReportKind,

    /// Period start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Period end (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Point-in-time reports (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<String>,
}

impl ReportArgs {
    /// Filters as query pairs, in a stable order
    pub fn query(&self) -> Vec<(String, String)> {
        [("from", &self.from), ("to", &self.to), ("asOf", &self.as_of)]
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .collect()
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}
