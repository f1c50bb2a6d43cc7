//! One scrape session: capture, navigate, paginate, extract.

use std::sync::Arc;
use std::time::Duration;

use autotrends_core::NetworkPayload;
use chrono::NaiveDate;

use crate::capture::{CaptureFilter, NetworkCapture};
use crate::error::ScraperError;
use crate::extract::{ExtractionReport, ListingExtractor};
use crate::page::{ListingQuery, PageAccessor, ResponseFeed};
use crate::pagination::PaginationController;

/// Inputs for [`run_session`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Opaque navigation target.
    pub target_url: String,
    pub max_clicks: usize,
    pub settle: Duration,
    /// Fixed once per run; every relative label resolves against it.
    pub reference: NaiveDate,
    pub capture: CaptureFilter,
}

#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub clicks: usize,
    pub extraction: ExtractionReport,
    pub payloads: Vec<NetworkPayload>,
}

/// Runs a full session against `page`.
///
/// Capture starts before navigation so responses fired during the initial
/// load are seen. Extraction runs exactly once, after pagination stops.
///
/// # Errors
///
/// Returns [`ScraperError::Page`] when navigation fails or the final DOM
/// cannot be queried. Capture is stopped before the error is returned.
pub async fn run_session<P>(
    page: Arc<P>,
    settings: &SessionSettings,
) -> Result<SessionOutcome, ScraperError>
where
    P: PageAccessor + ListingQuery + ResponseFeed + 'static,
{
    let capture = NetworkCapture::new(settings.capture.clone())
        .start(Arc::clone(&page))
        .await;

    tracing::info!(reference = %settings.reference, "opening results page");
    if let Err(e) = page.goto(&settings.target_url).await {
        capture.stop().await;
        return Err(e.into());
    }

    let clicks = PaginationController::new(settings.settle)
        .exhaust(page.as_ref(), settings.max_clicks)
        .await;

    let extractor = ListingExtractor::new(settings.reference);
    let extraction = match extractor.extract_all(page.as_ref()).await {
        Ok(report) => report,
        Err(e) => {
            capture.stop().await;
            return Err(e.into());
        }
    };

    let payloads = capture.stop().await;
    tracing::info!(
        clicks,
        records = extraction.records.len(),
        payloads = payloads.len(),
        "session finished"
    );

    Ok(SessionOutcome {
        clicks,
        extraction,
        payloads,
    })
}
