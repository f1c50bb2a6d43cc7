use thiserror::Error;

/// Failures reported by a rendering backend.
///
/// The extraction core treats most of these as non-fatal: a failed click ends
/// pagination, a failed body read drops one captured payload.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page interaction failed: {0}")]
    Interaction(String),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("DOM query failed: {0}")]
    Query(String),

    #[error("response body unavailable for {url}: {reason}")]
    ResponseBody { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}
