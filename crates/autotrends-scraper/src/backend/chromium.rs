//! Headless Chromium backend driven over CDP.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::error::PageError;
use crate::page::{
    ControlState, ListingCard, ListingQuery, ObservedResponse, PageAccessor, ResponseFeed,
};

const CONTROL_PROBE_JS: &str = r#"(() => {
  const el = Array.from(document.querySelectorAll("button, a, [role='button']"))
    .find(e => (e.innerText || e.textContent || "").trim().toLowerCase() === "more results");
  if (!el) return { found: false, enabled: false };
  const disabled = el.disabled === true || el.getAttribute("aria-disabled") === "true";
  return { found: true, enabled: !disabled };
})()"#;

const CONTROL_CLICK_JS: &str = r#"(() => {
  const el = Array.from(document.querySelectorAll("button, a, [role='button']"))
    .find(e => (e.innerText || e.textContent || "").trim().toLowerCase() === "more results");
  if (!el) return { clicked: false };
  el.click();
  return { clicked: true };
})()"#;

// Outermost div holding exactly one h3, matching the static backend's rule.
// Fragments are trimmed text nodes outside script and style elements.
const CARDS_JS: &str = r#"(() => {
  const headings = d => d.querySelectorAll("h3").length;
  const hidden = ["SCRIPT", "STYLE", "NOSCRIPT"];
  return Array.from(document.querySelectorAll("div"))
    .filter(d => {
      if (headings(d) !== 1) return false;
      const parent = d.parentElement ? d.parentElement.closest("div") : null;
      return parent === null || headings(parent) > 1;
    })
    .map(d => {
      const walker = document.createTreeWalker(d, NodeFilter.SHOW_TEXT, {
        acceptNode: n => n.parentElement && hidden.includes(n.parentElement.tagName)
          ? NodeFilter.FILTER_REJECT
          : NodeFilter.FILTER_ACCEPT,
      });
      const fragments = [];
      while (walker.nextNode()) {
        const t = walker.currentNode.textContent.trim();
        if (t) fragments.push(t);
      }
      const h = d.querySelector("h3");
      const heading = h ? h.innerText.trim() : null;
      return { heading: heading || null, fragments, text: d.innerText || "" };
    });
})()"#;

/// Responses whose headers arrived but whose body is still loading.
#[derive(Debug, Default)]
struct PendingResponses {
    by_id: HashMap<String, ObservedResponse>,
}

impl PendingResponses {
    fn received(&mut self, id: &str, url: &str, mime_type: &str) {
        self.by_id.insert(
            id.to_owned(),
            ObservedResponse {
                id: id.to_owned(),
                url: url.to_owned(),
                content_type: Some(mime_type.to_owned()),
            },
        );
    }

    /// Removes and returns the response once its body is available.
    fn finished(&mut self, id: &str) -> Option<ObservedResponse> {
        self.by_id.remove(id)
    }

    fn failed(&mut self, id: &str) {
        self.by_id.remove(id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[derive(Debug, Deserialize)]
struct ControlProbe {
    found: bool,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ClickProbe {
    clicked: bool,
}

#[derive(Debug, Deserialize)]
struct CardProbe {
    heading: Option<String>,
    fragments: Vec<String>,
    text: String,
}

pub struct ChromiumPage {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    nav_timeout: Duration,
}

impl ChromiumPage {
    /// Launches a local Chromium and opens one blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Browser`] if the browser cannot be started or the
    /// tab cannot be opened.
    pub async fn launch(headless: bool, nav_timeout: Duration) -> Result<Self, PageError> {
        let mut builder = BrowserConfig::builder().request_timeout(nav_timeout);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(PageError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "browser handler event error");
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(browser_err)?;
        page.execute(EnableParams::default())
            .await
            .map_err(browser_err)?;
        tracing::debug!(headless, "browser launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            nav_timeout,
        })
    }

    /// Closes the browser and stops the event handler.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Browser`] if the close command fails.
    pub async fn close(&self) -> Result<(), PageError> {
        let mut browser = self.browser.lock().await;
        let result = browser.close().await.map(|_| ()).map_err(browser_err);
        let _ = browser.wait().await;
        self.handler.abort();
        result
    }

    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T, PageError> {
        let value = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Query(e.to_string()))?;
        value
            .into_value::<T>()
            .map_err(|e| PageError::Query(e.to_string()))
    }
}

fn browser_err(e: impl std::fmt::Display) -> PageError {
    PageError::Browser(e.to_string())
}

#[async_trait]
impl PageAccessor for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        match tokio::time::timeout(self.nav_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(PageError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(PageError::Navigation {
                url: url.to_owned(),
                reason: format!("timed out after {}s", self.nav_timeout.as_secs()),
            }),
        }
    }

    async fn load_more_control(&self) -> Result<Option<ControlState>, PageError> {
        let probe: ControlProbe = self.evaluate(CONTROL_PROBE_JS).await?;
        Ok(probe.found.then_some(ControlState {
            enabled: probe.enabled,
        }))
    }

    async fn click_load_more(&self) -> Result<(), PageError> {
        let probe: ClickProbe = self.evaluate(CONTROL_CLICK_JS).await?;
        if probe.clicked {
            Ok(())
        } else {
            Err(PageError::Interaction("load-more control vanished".to_owned()))
        }
    }
}

#[async_trait]
impl ListingQuery for ChromiumPage {
    async fn listing_cards(&self) -> Result<Vec<ListingCard>, PageError> {
        let cards: Vec<CardProbe> = self.evaluate(CARDS_JS).await?;
        Ok(cards
            .into_iter()
            .map(|c| ListingCard {
                heading: c.heading,
                fragments: c.fragments,
                text: c.text,
            })
            .collect())
    }
}

#[async_trait]
impl ResponseFeed for ChromiumPage {
    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<ObservedResponse>, PageError> {
        let mut received = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_err)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(browser_err)?;
        let mut failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(browser_err)?;
        let (tx, rx) = mpsc::unbounded_channel();

        // A response is forwarded only once its body has finished loading;
        // failed loads are forgotten.
        tokio::spawn(async move {
            let mut pending = PendingResponses::default();
            loop {
                tokio::select! {
                    Some(event) = received.next() => {
                        pending.received(
                            event.request_id.inner(),
                            &event.response.url,
                            &event.response.mime_type,
                        );
                    }
                    Some(event) = finished.next() => {
                        if let Some(response) = pending.finished(event.request_id.inner()) {
                            if tx.send(response).is_err() {
                                break;
                            }
                        }
                    }
                    Some(event) = failed.next() => {
                        pending.failed(event.request_id.inner());
                    }
                    () = tx.closed() => break,
                    else => break,
                }
            }
        });

        Ok(rx)
    }

    async fn response_body(&self, response: &ObservedResponse) -> Result<Vec<u8>, PageError> {
        let body_err = |reason: String| PageError::ResponseBody {
            url: response.url.clone(),
            reason,
        };
        let returns = self
            .page
            .execute(GetResponseBodyParams::new(RequestId::new(response.id.clone())))
            .await
            .map_err(|e| body_err(e.to_string()))?;
        if returns.result.base64_encoded {
            return Err(body_err("binary body".to_owned()));
        }
        Ok(returns.result.body.into_bytes())
    }
}
