//! Non-scripted backend over fetched or saved HTML.
//!
//! Sees exactly what the server sends. Content revealed by scripts never
//! appears, the "load more" control cannot be activated, and no background
//! responses are observed.

use std::sync::LazyLock;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::{mpsc, RwLock};

use crate::error::{PageError, ScraperError};
use crate::fetch::{build_client, fetch_html};
use crate::page::{
    ControlState, ListingCard, ListingQuery, ObservedResponse, PageAccessor, ResponseFeed,
};

/// Visible label of the pagination control.
pub const LOAD_MORE_LABEL: &str = "More Results";

/// Elements whose text is never rendered as listing content.
const NON_RENDERED_TAGS: [&str; 3] = ["script", "style", "noscript"];

static CONTROL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button, a, [role='button']").expect("valid selector"));

/// Structural heuristic for listing containers: the outermost `container`
/// element whose subtree holds exactly one `heading`. Wrappers around a lone
/// heading are folded into the card that owns them.
#[derive(Debug, Clone)]
pub struct CardShape {
    container: Selector,
    heading: Selector,
}

impl CardShape {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if either selector does not parse.
    pub fn new(container: &str, heading: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            container: parse_selector(container)?,
            heading: parse_selector(heading)?,
        })
    }
}

impl Default for CardShape {
    fn default() -> Self {
        Self {
            container: Selector::parse("div").expect("valid selector"),
            heading: Selector::parse("h3").expect("valid selector"),
        }
    }
}

fn parse_selector(raw: &str) -> Result<Selector, ScraperError> {
    Selector::parse(raw).map_err(|e| ScraperError::InvalidSelector {
        selector: raw.to_owned(),
        reason: e.to_string(),
    })
}

#[derive(Debug)]
pub struct StaticPage {
    client: Option<Client>,
    shape: CardShape,
    html: RwLock<Option<String>>,
}

impl StaticPage {
    /// Creates a page that loads its HTML over HTTP on [`PageAccessor::goto`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            client: Some(build_client(timeout_secs, user_agent)?),
            shape: CardShape::default(),
            html: RwLock::new(None),
        })
    }

    /// Creates a page over an already captured HTML snapshot. Navigation is
    /// unsupported.
    #[must_use]
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            client: None,
            shape: CardShape::default(),
            html: RwLock::new(Some(html.into())),
        }
    }

    #[must_use]
    pub fn with_shape(mut self, shape: CardShape) -> Self {
        self.shape = shape;
        self
    }
}

#[async_trait]
impl PageAccessor for StaticPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        let Some(client) = self.client.as_ref() else {
            return Err(PageError::Unsupported("navigation without an HTTP client"));
        };
        let body = fetch_html(client, url)
            .await
            .map_err(|e| PageError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        *self.html.write().await = Some(body);
        Ok(())
    }

    async fn load_more_control(&self) -> Result<Option<ControlState>, PageError> {
        let guard = self.html.read().await;
        let html = guard
            .as_deref()
            .ok_or_else(|| PageError::Query("no page loaded".to_owned()))?;
        Ok(find_control(html))
    }

    async fn click_load_more(&self) -> Result<(), PageError> {
        Err(PageError::Unsupported("static pages cannot run scripts"))
    }
}

#[async_trait]
impl ListingQuery for StaticPage {
    async fn listing_cards(&self) -> Result<Vec<ListingCard>, PageError> {
        let guard = self.html.read().await;
        let html = guard
            .as_deref()
            .ok_or_else(|| PageError::Query("no page loaded".to_owned()))?;
        Ok(snapshot_cards(html, &self.shape))
    }
}

#[async_trait]
impl ResponseFeed for StaticPage {
    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ObservedResponse>, PageError> {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(tx);
        Ok(rx)
    }

    async fn response_body(&self, _response: &ObservedResponse) -> Result<Vec<u8>, PageError> {
        Err(PageError::Unsupported("static pages observe no responses"))
    }
}

// `Html` is not `Send`; parsing stays inside these sync helpers.

fn find_control(html: &str) -> Option<ControlState> {
    let doc = Html::parse_document(html);
    doc.select(&CONTROL_SELECTOR)
        .find(|el| collapsed_text(*el).eq_ignore_ascii_case(LOAD_MORE_LABEL))
        .map(|el| {
            let value = el.value();
            let disabled = value.attr("disabled").is_some()
                || value
                    .attr("aria-disabled")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"));
            ControlState { enabled: !disabled }
        })
}

fn snapshot_cards(html: &str, shape: &CardShape) -> Vec<ListingCard> {
    let doc = Html::parse_document(html);
    doc.select(&shape.container)
        .filter(|el| is_card(*el, shape))
        .map(|el| card_from_element(el, shape))
        .collect()
}

fn heading_count(el: ElementRef<'_>, shape: &CardShape) -> usize {
    el.select(&shape.heading).count()
}

/// One heading inside, and the nearest enclosing container (if any) holds
/// more than one.
fn is_card(el: ElementRef<'_>, shape: &CardShape) -> bool {
    if heading_count(el, shape) != 1 {
        return false;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| shape.container.matches(ancestor))
        .is_none_or(|parent| heading_count(parent, shape) > 1)
}

fn card_from_element(el: ElementRef<'_>, shape: &CardShape) -> ListingCard {
    let heading = el
        .select(&shape.heading)
        .next()
        .map(collapsed_text)
        .filter(|h| !h.is_empty());
    let fragments = rendered_fragments(el);
    let text = fragments.join("\n");
    ListingCard {
        heading,
        fragments,
        text,
    }
}

/// Trimmed, non-empty text nodes in document order, skipping script and
/// style content.
fn rendered_fragments(el: ElementRef<'_>) -> Vec<String> {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| NON_RENDERED_TAGS.contains(&name));
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .collect()
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
        <html><body>
          <section><h2>All</h2></section>
          <div class="results">
            <div class="card">
              <h3>2021 Ferrari SF90 Stradale</h3>
              <div class="meta"><span>$489,900</span><span>12,400 mi</span></div>
              <div>3 days ago</div>
            </div>
            <div class="card">
              <h3>  2022 Ferrari
                 SF90 Spider </h3>
              <span>$575,000</span>
              <p>Jan 5th</p>
            </div>
          </div>
          <button type="button">More Results</button>
        </body></html>
    "#;

    #[tokio::test]
    async fn single_heading_containers_become_cards() {
        let page = StaticPage::from_html(RESULTS_HTML);
        let cards = page.listing_cards().await.unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].heading.as_deref(), Some("2021 Ferrari SF90 Stradale"));
        assert_eq!(
            cards[0].fragments,
            vec!["2021 Ferrari SF90 Stradale", "$489,900", "12,400 mi", "3 days ago"]
        );
        assert_eq!(cards[1].heading.as_deref(), Some("2022 Ferrari SF90 Spider"));
        assert!(cards[1].text.ends_with("Jan 5th"));
    }

    #[tokio::test]
    async fn control_found_by_label() {
        let page = StaticPage::from_html(RESULTS_HTML);
        let control = page.load_more_control().await.unwrap();
        assert_eq!(control, Some(ControlState { enabled: true }));
    }

    #[tokio::test]
    async fn disabled_control_reported() {
        let page = StaticPage::from_html(r#"<button disabled>More Results</button>"#);
        let control = page.load_more_control().await.unwrap();
        assert_eq!(control, Some(ControlState { enabled: false }));

        let page = StaticPage::from_html(r#"<a aria-disabled="true">more results</a>"#);
        let control = page.load_more_control().await.unwrap();
        assert_eq!(control, Some(ControlState { enabled: false }));
    }

    #[tokio::test]
    async fn missing_control_is_none() {
        let page = StaticPage::from_html("<button>Show filters</button>");
        assert_eq!(page.load_more_control().await.unwrap(), None);
    }

    #[tokio::test]
    async fn click_is_unsupported() {
        let page = StaticPage::from_html(RESULTS_HTML);
        assert!(matches!(
            page.click_load_more().await,
            Err(PageError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_page_cannot_navigate() {
        let page = StaticPage::from_html(RESULTS_HTML);
        assert!(matches!(
            page.goto("https://example.test").await,
            Err(PageError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn feed_closes_immediately() {
        let page = StaticPage::from_html(RESULTS_HTML);
        let mut rx = page.subscribe().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn custom_shape_changes_containers() {
        let html = r#"<ul><li><h4>Listing</h4><b>$10</b> today</li></ul>"#;
        let shape = CardShape::new("li", "h4").unwrap();
        let page = StaticPage::from_html(html).with_shape(shape);
        let cards = page.listing_cards().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].fragments, vec!["Listing", "$10", "today"]);
    }

    #[tokio::test]
    async fn wrapped_heading_belongs_to_its_card() {
        let html = r#"
            <div class="results">
              <div class="card">
                <div class="title"><h3>2021 Ferrari SF90 Stradale</h3></div>
                <div>$489,900</div>
                <div>3 days ago</div>
              </div>
              <div class="card">
                <div class="title"><div class="inner"><h3>2022 Ferrari SF90 Spider</h3></div></div>
                <div>$575,000</div>
                <div>Jan 5th</div>
              </div>
            </div>
        "#;
        let page = StaticPage::from_html(html);
        let cards = page.listing_cards().await.unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(
            cards[0].fragments,
            vec!["2021 Ferrari SF90 Stradale", "$489,900", "3 days ago"]
        );
        assert_eq!(cards[1].heading.as_deref(), Some("2022 Ferrari SF90 Spider"));

        let reference = chrono::NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let report = crate::extract::ListingExtractor::new(reference)
            .extract_all(&page)
            .await
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped.total(), 0);
    }

    #[tokio::test]
    async fn lone_card_is_its_outermost_container() {
        let html = r#"<div id="page"><div class="card"><h3>Only</h3><span>$10</span></div></div>"#;
        let cards = StaticPage::from_html(html).listing_cards().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].fragments, vec!["Only", "$10"]);
    }

    #[tokio::test]
    async fn script_and_style_text_is_not_a_fragment() {
        let html = r#"
            <div class="results">
              <div class="card">
                <h3>2021 Ferrari SF90 Stradale</h3>
                <script>window.fee = "$999";</script>
                <style>.price::before { content: "$"; }</style>
                <div>$489,900</div>
                <div>Today</div>
              </div>
              <div class="card"><h3>Second</h3></div>
            </div>
        "#;
        let cards = StaticPage::from_html(html).listing_cards().await.unwrap();
        assert_eq!(
            cards[0].fragments,
            vec!["2021 Ferrari SF90 Stradale", "$489,900", "Today"]
        );
        assert_eq!(
            crate::parse::find_price_fragment(cards[0].fragments.as_slice()),
            Some("$489,900")
        );
    }

    #[test]
    fn invalid_selector_rejected() {
        let err = CardShape::new("div[", "h3").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidSelector { .. }));
    }
}
