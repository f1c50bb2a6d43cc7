//! Best-effort capture of the JSON payloads a page fetches for its charts.
//!
//! [`NetworkCapture::start`] subscribes to the page's response feed and hands
//! the subscription to a background task that exclusively owns the payload
//! list. [`CaptureSession::stop`] ends the subscription, drains anything
//! already delivered, and returns the payloads in observation order.
//! Individual failures (body unavailable, body not JSON) drop that one
//! response and capture carries on.

use std::sync::Arc;

use autotrends_core::NetworkPayload;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::page::{ObservedResponse, ResponseFeed};

/// URL keywords that mark a response as chart data.
pub const DEFAULT_CAPTURE_KEYWORDS: [&str; 3] = ["trends", "chart", "series"];

/// Decides which observed responses are worth reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFilter {
    keywords: Vec<String>,
}

impl Default for CaptureFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_KEYWORDS)
    }
}

impl CaptureFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_owned())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// `true` when the URL contains a keyword (case-sensitive) and the content
    /// type is JSON.
    #[must_use]
    pub fn matches(&self, url: &str, content_type: Option<&str>) -> bool {
        self.keywords.iter().any(|k| url.contains(k.as_str()))
            && content_type.is_some_and(is_json_content_type)
    }
}

/// Accepts `application/json`, `text/json` and `+json` structured suffixes,
/// with or without parameters such as `; charset=utf-8`.
fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

#[derive(Debug, Clone, Default)]
pub struct NetworkCapture {
    filter: CaptureFilter,
}

impl NetworkCapture {
    #[must_use]
    pub fn new(filter: CaptureFilter) -> Self {
        Self { filter }
    }

    /// Subscribes to `feed` and starts accumulating payloads.
    ///
    /// A failed subscription is logged and yields an idle session whose
    /// [`CaptureSession::stop`] returns nothing.
    pub async fn start<F>(&self, feed: Arc<F>) -> CaptureSession
    where
        F: ResponseFeed + ?Sized + 'static,
    {
        let events = match feed.subscribe().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "network capture unavailable");
                return CaptureSession::idle();
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let filter = self.filter.clone();
        let task = tokio::spawn(capture_loop(feed, filter, events, stop_rx));

        tracing::debug!("network capture started");
        CaptureSession {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running capture. Idle sessions hold no task.
#[derive(Debug)]
pub struct CaptureSession {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Vec<NetworkPayload>>>,
}

impl CaptureSession {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            stop_tx: None,
            task: None,
        }
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    /// Unsubscribes and returns everything captured so far.
    pub async fn stop(mut self) -> Vec<NetworkPayload> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have finished if the feed closed.
            let _ = stop_tx.send(());
        }

        let Some(task) = self.task.take() else {
            return Vec::new();
        };

        match task.await {
            Ok(payloads) => {
                tracing::debug!(payloads = payloads.len(), "network capture stopped");
                payloads
            }
            Err(e) => {
                tracing::warn!(error = %e, "network capture task ended abnormally");
                Vec::new()
            }
        }
    }
}

async fn capture_loop<F>(
    feed: Arc<F>,
    filter: CaptureFilter,
    mut events: mpsc::UnboundedReceiver<ObservedResponse>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Vec<NetworkPayload>
where
    F: ResponseFeed + ?Sized,
{
    let mut payloads = Vec::new();

    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(response) => capture_one(feed.as_ref(), &filter, response, &mut payloads).await,
                None => break,
            },
            _ = &mut stop_rx => {
                events.close();
                while let Some(response) = events.recv().await {
                    capture_one(feed.as_ref(), &filter, response, &mut payloads).await;
                }
                break;
            }
        }
    }

    payloads
}

async fn capture_one<F>(
    feed: &F,
    filter: &CaptureFilter,
    response: ObservedResponse,
    payloads: &mut Vec<NetworkPayload>,
) where
    F: ResponseFeed + ?Sized,
{
    if !filter.matches(&response.url, response.content_type.as_deref()) {
        return;
    }

    let body = match feed.response_body(&response).await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(url = %response.url, error = %e, "dropping response: body unavailable");
            return;
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(json) => {
            tracing::debug!(url = %response.url, "captured chart payload");
            payloads.push(NetworkPayload {
                url: response.url,
                body: json,
            });
        }
        Err(e) => {
            tracing::debug!(url = %response.url, error = %e, "dropping response: body is not JSON");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::error::PageError;

    /// Feed whose sender is handed to the test so events can be pushed.
    struct ChannelFeed {
        sender: Mutex<Option<mpsc::UnboundedSender<ObservedResponse>>>,
        receiver: Mutex<Option<mpsc::UnboundedReceiver<ObservedResponse>>>,
        bodies: HashMap<String, Result<Vec<u8>, String>>,
    }

    impl ChannelFeed {
        fn new(bodies: &[(&str, Result<&str, &str>)]) -> Arc<Self> {
            let (tx, rx) = mpsc::unbounded_channel();
            Arc::new(Self {
                sender: Mutex::new(Some(tx)),
                receiver: Mutex::new(Some(rx)),
                bodies: bodies
                    .iter()
                    .map(|(id, body)| {
                        (
                            (*id).to_owned(),
                            body.map(|b| b.as_bytes().to_vec()).map_err(str::to_owned),
                        )
                    })
                    .collect(),
            })
        }

        async fn push(&self, id: &str, url: &str, content_type: Option<&str>) {
            let guard = self.sender.lock().await;
            guard
                .as_ref()
                .unwrap()
                .send(ObservedResponse {
                    id: id.to_owned(),
                    url: url.to_owned(),
                    content_type: content_type.map(str::to_owned),
                })
                .unwrap();
        }

        async fn close(&self) {
            self.sender.lock().await.take();
        }
    }

    #[async_trait]
    impl ResponseFeed for ChannelFeed {
        async fn subscribe(
            &self,
        ) -> Result<mpsc::UnboundedReceiver<ObservedResponse>, PageError> {
            self.receiver
                .lock()
                .await
                .take()
                .ok_or(PageError::Unsupported("already subscribed"))
        }

        async fn response_body(&self, response: &ObservedResponse) -> Result<Vec<u8>, PageError> {
            match self.bodies.get(&response.id) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(reason)) => Err(PageError::ResponseBody {
                    url: response.url.clone(),
                    reason: reason.clone(),
                }),
                None => panic!("body requested for filtered-out response {}", response.id),
            }
        }
    }

    struct NoFeed;

    #[async_trait]
    impl ResponseFeed for NoFeed {
        async fn subscribe(
            &self,
        ) -> Result<mpsc::UnboundedReceiver<ObservedResponse>, PageError> {
            Err(PageError::Unsupported("no network events"))
        }

        async fn response_body(&self, _response: &ObservedResponse) -> Result<Vec<u8>, PageError> {
            unreachable!()
        }
    }

    // -----------------------------------------------------------------------
    // CaptureFilter
    // -----------------------------------------------------------------------

    #[test]
    fn filter_requires_keyword_and_json_content_type() {
        let filter = CaptureFilter::default();
        assert!(filter.matches("https://x.test/api/chart/data", Some("application/json")));
        assert!(!filter.matches("https://x.test/api/chart/data", Some("text/html")));
        assert!(!filter.matches("https://x.test/api/chart/data", None));
        assert!(!filter.matches("https://x.test/api/listings", Some("application/json")));
    }

    #[test]
    fn filter_accepts_json_variants() {
        let filter = CaptureFilter::default();
        assert!(filter.matches(
            "https://x.test/trends?id=1",
            Some("application/json; charset=utf-8")
        ));
        assert!(filter.matches("https://x.test/series", Some("application/vnd.api+json")));
        assert!(filter.matches("https://x.test/series", Some("Text/JSON")));
        assert!(!filter.matches("https://x.test/series", Some("application/jsonp")));
    }

    #[test]
    fn filter_keywords_are_configurable() {
        let filter = CaptureFilter::new([" prices ", ""]);
        assert!(filter.matches("https://x.test/prices", Some("application/json")));
        assert!(!filter.matches("https://x.test/chart", Some("application/json")));
    }

    #[test]
    fn filter_keyword_match_is_case_sensitive() {
        let filter = CaptureFilter::default();
        assert!(!filter.matches("https://x.test/api/CHART/data", Some("application/json")));
        assert!(!filter.matches("https://x.test/Trends", Some("application/json")));
        assert!(filter.matches("https://x.test/Trends/chart", Some("application/json")));
    }

    // -----------------------------------------------------------------------
    // NetworkCapture / CaptureSession
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn captures_matching_json_responses_in_order() {
        let feed = ChannelFeed::new(&[
            ("1", Ok(r#"{"series":[1,2]}"#)),
            ("3", Ok(r#"[{"x":1}]"#)),
        ]);
        let session = NetworkCapture::default().start(Arc::clone(&feed)).await;
        assert!(session.is_capturing());

        feed.push("1", "https://x.test/api/chart/1", Some("application/json"))
            .await;
        feed.push("2", "https://x.test/api/chart/2", Some("text/html"))
            .await;
        feed.push("3", "https://x.test/trends/3", Some("application/json"))
            .await;

        let payloads = session.stop().await;
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].url, "https://x.test/api/chart/1");
        assert_eq!(payloads[0].body["series"][1], 2);
        assert_eq!(payloads[1].url, "https://x.test/trends/3");
    }

    #[tokio::test]
    async fn bad_body_does_not_stop_later_captures() {
        let feed = ChannelFeed::new(&[
            ("1", Ok("<html>not json</html>")),
            ("2", Err("No data found for resource")),
            ("3", Ok(r#"{"ok":true}"#)),
        ]);
        let session = NetworkCapture::default().start(Arc::clone(&feed)).await;

        feed.push("1", "https://x.test/chart/a", Some("application/json"))
            .await;
        feed.push("2", "https://x.test/chart/b", Some("application/json"))
            .await;
        feed.push("3", "https://x.test/chart/c", Some("application/json"))
            .await;

        let payloads = session.stop().await;
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].url, "https://x.test/chart/c");
        assert_eq!(payloads[0].body["ok"], true);
    }

    #[tokio::test]
    async fn closed_feed_still_returns_captured_payloads() {
        let feed = ChannelFeed::new(&[("1", Ok("{}"))]);
        let session = NetworkCapture::default().start(Arc::clone(&feed)).await;

        feed.push("1", "https://x.test/series", Some("application/json"))
            .await;
        feed.close().await;

        let payloads = session.stop().await;
        assert_eq!(payloads.len(), 1);
    }

    #[tokio::test]
    async fn stop_without_events_is_empty() {
        let feed = ChannelFeed::new(&[]);
        let session = NetworkCapture::default().start(feed).await;
        assert!(session.stop().await.is_empty());
    }

    #[tokio::test]
    async fn failed_subscription_yields_idle_session() {
        let session = NetworkCapture::default().start(Arc::new(NoFeed)).await;
        assert!(!session.is_capturing());
        assert!(session.stop().await.is_empty());
    }
}
