use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Expand campaign send-schedule patterns into concrete dates.
///
/// Patterns are read as JSON documents, from a file or from stdin.
#[derive(Parser, Debug)]
#[command(name = "schedule", version, about = "Expand send-schedule patterns into concrete dates")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand a pattern into every send instant
    Expand(ExpandArgs),
    /// Expand a pattern for display, capping open-ended runs at 24 occurrences
    Preview(ExpandArgs),
    /// Check a pattern document without expanding it
    Validate(InputArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Pattern JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only print instants strictly after this RFC 3339 timestamp
    #[arg(long)]
    pub after: Option<String>,

    /// No-end-date horizon in years
    #[arg(long, default_value_t = schedule_engine::NO_END_DATE_HORIZON_YEARS)]
    pub horizon_years: u32,

    /// Candidate periods a generator may inspect before giving up
    #[arg(
        long,
        default_value_t = schedule_engine::DEFAULT_MAX_SEARCH_PERIODS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_search_periods: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One RFC 3339 timestamp per line
    Text,
    /// A JSON array of RFC 3339 timestamps
    Json,
}
