pub mod backend;
pub mod capture;
pub mod dates;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod page;
pub mod pagination;
pub mod parse;
pub mod session;

#[cfg(feature = "browser")]
pub use backend::ChromiumPage;
pub use backend::{CardShape, StaticPage};
pub use capture::{CaptureFilter, CaptureSession, NetworkCapture};
pub use dates::{DateNormalizer, DateStrategy, Resolution};
pub use error::{PageError, ScraperError};
pub use extract::{ExtractionReport, ListingExtractor, SkipCounts, SkipReason};
pub use page::{
    ControlState, ListingCard, ListingQuery, ObservedResponse, PageAccessor, ResponseFeed,
};
pub use pagination::PaginationController;
pub use session::{run_session, SessionOutcome, SessionSettings};
