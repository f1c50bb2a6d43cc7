use serde::{Deserialize, Serialize};

/// One vehicle listing observed on the results page.
///
/// Records are only built when a container yielded a title, a price fragment
/// and a date-shaped line; there are no partially populated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    /// The date fragment exactly as the page displayed it, e.g. `"3 days ago"`.
    pub raw_date_label: String,
    /// `YYYY-MM-DD` when a date strategy matched, otherwise `raw_date_label`
    /// unchanged.
    pub normalized_date: String,
    pub price_usd: u64,
}

/// A background JSON response captured while the page was open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPayload {
    pub url: String,
    #[serde(rename = "json")]
    pub body: serde_json::Value,
}
