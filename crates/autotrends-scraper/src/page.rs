//! Backend-neutral view of a rendered results page.
//!
//! The extraction core only talks to these traits. Each rendering backend
//! (static HTML, headless Chromium, test fixtures) implements them.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::PageError;

/// What the "load more" control looked like when it was last located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
}

/// Text snapshot of one candidate listing container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingCard {
    /// Text of the first heading element inside the container, if any.
    pub heading: Option<String>,
    /// Non-empty text fragments in document order, one per text node.
    pub fragments: Vec<String>,
    /// Rendered text of the whole container, lines separated by `\n`.
    pub text: String,
}

impl ListingCard {
    /// Builds a card whose rendered text is its fragments joined by newlines.
    #[must_use]
    pub fn from_fragments(heading: Option<&str>, fragments: &[&str]) -> Self {
        Self {
            heading: heading.map(str::to_owned),
            fragments: fragments.iter().map(|f| (*f).to_owned()).collect(),
            text: fragments.join("\n"),
        }
    }
}

/// Metadata of a background response observed by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    /// Backend-specific handle used to fetch the body later.
    pub id: String,
    pub url: String,
    pub content_type: Option<String>,
}

/// Navigation and "load more" interaction primitives.
#[async_trait]
pub trait PageAccessor: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), PageError>;

    /// Locates the "load more" control. `Ok(None)` means it is not on the page.
    async fn load_more_control(&self) -> Result<Option<ControlState>, PageError>;

    async fn click_load_more(&self) -> Result<(), PageError>;

    /// Flat pause after a click so revealed content can render.
    async fn settle(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Selector abstraction that finds listing-shaped containers.
#[async_trait]
pub trait ListingQuery: Send + Sync {
    /// Returns candidate containers in DOM encounter order.
    async fn listing_cards(&self) -> Result<Vec<ListingCard>, PageError>;
}

/// Subscription to background responses fetched by the page.
#[async_trait]
pub trait ResponseFeed: Send + Sync {
    /// Starts delivering responses. Dropping the receiver unsubscribes.
    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ObservedResponse>, PageError>;

    async fn response_body(&self, response: &ObservedResponse) -> Result<Vec<u8>, PageError>;
}
