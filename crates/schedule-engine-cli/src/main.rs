mod cli;

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Parser;
use schedule_engine::{
    generate_schedule_with_options, preview_schedule_with_options, SchedulePattern,
    ScheduleOptions,
};
use tracing::debug;

use crate::cli::{CliArgs, Command, ExpandArgs, OutputFormat};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Expand(args) => run_expand(&args, false),
        Command::Preview(args) => run_expand(&args, true),
        Command::Validate(args) => {
            let pattern = load_pattern(&args.input)?;
            println!("ok: {} pattern starting {}", pattern.kind.name(), pattern.start_date);
            Ok(())
        }
    }
}

fn run_expand(args: &ExpandArgs, preview: bool) -> Result<()> {
    let pattern = load_pattern(&args.input.input)?;
    let after = args
        .after
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid --after timestamp '{s}'"))
        })
        .transpose()?;

    let options = ScheduleOptions {
        horizon_years: args.horizon_years,
        max_search_periods: args.max_search_periods,
    };
    let dates = if preview {
        preview_schedule_with_options(&pattern, &options)
    } else {
        generate_schedule_with_options(&pattern, &options)
    }
    .context("failed to expand schedule")?;

    let dates: Vec<DateTime<Tz>> = dates
        .into_iter()
        .filter(|date| after.is_none_or(|after| date.with_timezone(&Utc) > after))
        .collect();
    debug!(count = dates.len(), "printing schedule");

    print_dates(&dates, args.format)
}

fn load_pattern(path: &Path) -> Result<SchedulePattern> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read pattern from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    SchedulePattern::from_json(&json).context("invalid schedule pattern")
}

fn print_dates(dates: &[DateTime<Tz>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for date in dates {
                println!("{}", date.to_rfc3339());
            }
        }
        OutputFormat::Json => {
            let rendered: Vec<String> = dates.iter().map(DateTime::<Tz>::to_rfc3339).collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
    }
    Ok(())
}
