//! Repeated "load more" clicking until the results list stops growing.
//!
//! The loop ends when the control is missing or disabled, when `max_clicks`
//! is reached, or when any interaction fails. A failed click and a natural
//! end of results look the same to the caller: both just stop the loop.

use std::time::Duration;

use crate::page::{ControlState, PageAccessor};

/// Default upper bound on "load more" clicks per session.
pub const DEFAULT_MAX_CLICKS: usize = 200;

/// Default fixed pause after each click.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy)]
pub struct PaginationController {
    settle: Duration,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl PaginationController {
    #[must_use]
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Clicks "load more" until exhaustion and returns the number of
    /// successful clicks, never more than `max_clicks`.
    pub async fn exhaust<P>(&self, page: &P, max_clicks: usize) -> usize
    where
        P: PageAccessor + ?Sized,
    {
        let mut clicks = 0usize;

        while clicks < max_clicks {
            match page.load_more_control().await {
                Ok(Some(ControlState { enabled: true })) => {}
                Ok(Some(ControlState { enabled: false })) => {
                    tracing::debug!(clicks, "load-more control disabled");
                    break;
                }
                Ok(None) => {
                    tracing::debug!(clicks, "load-more control not present");
                    break;
                }
                Err(e) => {
                    tracing::debug!(clicks, error = %e, "could not locate load-more control");
                    break;
                }
            }

            if let Err(e) = page.click_load_more().await {
                tracing::debug!(clicks, error = %e, "load-more click failed; stopping");
                break;
            }
            page.settle(self.settle).await;
            clicks += 1;
        }

        if clicks == max_clicks && max_clicks > 0 {
            tracing::info!(clicks, "pagination stopped at click limit");
        } else {
            tracing::info!(clicks, "pagination exhausted");
        }
        clicks
    }
}
