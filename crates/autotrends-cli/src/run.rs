//! Command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use autotrends_core::AppConfig;
use autotrends_scraper::dates::CANONICAL_FORMAT;
use autotrends_scraper::{
    run_session, CaptureFilter, DateNormalizer, ListingExtractor, Resolution, SessionOutcome,
    SessionSettings, StaticPage,
};
use chrono::NaiveDate;

use crate::output;

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default)]
pub(crate) struct RunOverrides {
    pub url: Option<String>,
    pub max_clicks: Option<usize>,
    pub settle_ms: Option<u64>,
    pub out: Option<PathBuf>,
    pub dump: Option<PathBuf>,
    pub static_only: bool,
}

pub(crate) fn session_settings(
    config: &AppConfig,
    overrides: &RunOverrides,
    reference: NaiveDate,
) -> SessionSettings {
    SessionSettings {
        target_url: overrides
            .url
            .clone()
            .unwrap_or_else(|| config.target_url.clone()),
        max_clicks: overrides.max_clicks.unwrap_or(config.max_clicks),
        settle: Duration::from_millis(overrides.settle_ms.unwrap_or(config.settle_ms)),
        reference,
        capture: CaptureFilter::new(&config.capture_keywords),
    }
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    overrides: RunOverrides,
    reference: NaiveDate,
) -> anyhow::Result<()> {
    let settings = session_settings(config, &overrides, reference);
    let outcome = run_with_backend(config, &settings, overrides.static_only).await?;

    let csv_path = overrides
        .out
        .unwrap_or_else(|| config.listings_csv_path.clone());
    output::write_listings_csv_file(&csv_path, &outcome.extraction.records)?;
    println!(
        "Saved {} rows to {}",
        outcome.extraction.records.len(),
        csv_path.display()
    );

    // The dump is informational; a failure here never fails the run.
    let dump_path = overrides
        .dump
        .unwrap_or_else(|| config.network_dump_path.clone());
    match output::write_network_dump(&dump_path, &outcome.payloads) {
        Ok(()) => println!(
            "Captured {} chart-related network payload(s).",
            outcome.payloads.len()
        ),
        Err(e) => {
            tracing::warn!(path = %dump_path.display(), error = %e, "network dump not written");
            println!("No chart data captured or error writing: {e:#}");
        }
    }

    Ok(())
}

#[cfg(feature = "browser")]
async fn run_with_backend(
    config: &AppConfig,
    settings: &SessionSettings,
    static_only: bool,
) -> anyhow::Result<SessionOutcome> {
    use autotrends_scraper::ChromiumPage;

    if static_only {
        return run_static(config, settings).await;
    }

    let page = Arc::new(
        ChromiumPage::launch(config.headless, Duration::from_secs(config.nav_timeout_secs))
            .await?,
    );
    let result = run_session(Arc::clone(&page), settings).await;
    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    Ok(result?)
}

#[cfg(not(feature = "browser"))]
async fn run_with_backend(
    config: &AppConfig,
    settings: &SessionSettings,
    static_only: bool,
) -> anyhow::Result<SessionOutcome> {
    if !static_only {
        tracing::info!("built without browser support; using the static HTML backend");
    }
    run_static(config, settings).await
}

async fn run_static(
    config: &AppConfig,
    settings: &SessionSettings,
) -> anyhow::Result<SessionOutcome> {
    let page = Arc::new(StaticPage::new(config.nav_timeout_secs, &config.user_agent)?);
    Ok(run_session(page, settings).await?)
}

pub(crate) async fn run_extract(
    html_path: &Path,
    out: Option<&Path>,
    reference: NaiveDate,
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(html_path)
        .with_context(|| format!("failed to read {}", html_path.display()))?;
    let page = StaticPage::from_html(html);
    let report = ListingExtractor::new(reference).extract_all(&page).await?;

    match out {
        Some(path) => {
            output::write_listings_csv_file(path, &report.records)?;
            println!("Saved {} rows to {}", report.records.len(), path.display());
        }
        None => output::write_listings_csv(std::io::stdout().lock(), &report.records)?,
    }
    Ok(())
}

/// One-line summary of how `label` normalizes against `reference`.
pub(crate) fn describe_label(label: &str, reference: NaiveDate) -> String {
    match DateNormalizer::default().resolve(label, reference) {
        Resolution::Parsed { date, strategy } => {
            format!("{} ({strategy})", date.format(CANONICAL_FORMAT))
        }
        Resolution::Passthrough => format!("{label} (unparsed)"),
    }
}
