//! Rendering backends that implement the page traits.

#[cfg(feature = "browser")]
pub mod chromium;
pub mod static_html;

#[cfg(feature = "browser")]
pub use chromium::ChromiumPage;
pub use static_html::{CardShape, StaticPage, LOAD_MORE_LABEL};
