mod output;
mod run;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "autotrends")]
#[command(about = "Listing and chart-data scraper for vehicle trends pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the results page, reveal every listing, and write the CSV and network dump
    Run {
        /// Navigation target (defaults to AUTOTRENDS_TARGET_URL)
        #[arg(long)]
        url: Option<String>,

        /// Upper bound on "load more" clicks
        #[arg(long)]
        max_clicks: Option<usize>,

        /// Pause after each click, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Listings CSV path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Network payload dump path
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Use the plain HTTP backend even when built with browser support
        #[arg(long = "static")]
        static_only: bool,
    },
    /// Extract listings from a saved HTML snapshot
    Extract {
        /// HTML file to read
        #[arg(long)]
        html: PathBuf,

        /// CSV output path; rows go to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,

        /// Reference date for relative labels (YYYY-MM-DD)
        #[arg(long)]
        reference: Option<NaiveDate>,
    },
    /// Normalize a single date label and show which strategy matched
    NormalizeDate {
        label: String,

        /// Reference date for relative labels (YYYY-MM-DD)
        #[arg(long)]
        reference: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = autotrends_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let today = autotrends_core::reference_date(config.utc_offset);

    match cli.command {
        Some(Commands::Run {
            url,
            max_clicks,
            settle_ms,
            out,
            dump,
            static_only,
        }) => {
            let overrides = run::RunOverrides {
                url,
                max_clicks,
                settle_ms,
                out,
                dump,
                static_only,
            };
            run::run_scrape(&config, overrides, today).await?;
        }
        Some(Commands::Extract {
            html,
            out,
            reference,
        }) => {
            run::run_extract(&html, out.as_deref(), reference.unwrap_or(today)).await?;
        }
        Some(Commands::NormalizeDate { label, reference }) => {
            println!("{}", run::describe_label(&label, reference.unwrap_or(today)));
        }
        None => Cli::command().print_help()?,
    }

    Ok(())
}
