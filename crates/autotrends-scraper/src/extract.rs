//! Per-container listing extraction.
//!
//! Each candidate container must yield a title, a price fragment and a
//! date-shaped line; anything less is skipped silently (but counted in the
//! [`ExtractionReport`]). Records keep container encounter order.

use autotrends_core::ListingRecord;
use chrono::NaiveDate;

use crate::dates::DateNormalizer;
use crate::error::PageError;
use crate::page::{ListingCard, ListingQuery};
use crate::parse::{find_date_line, find_price_fragment, parse_price_usd};

/// Why a container produced no record. Only the first failing gate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    MissingPrice,
    MissingDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub missing_title: usize,
    pub missing_price: usize,
    pub missing_date: usize,
}

impl SkipCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.missing_title + self.missing_price + self.missing_date
    }

    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingTitle => self.missing_title += 1,
            SkipReason::MissingPrice => self.missing_price += 1,
            SkipReason::MissingDate => self.missing_date += 1,
        }
    }
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub records: Vec<ListingRecord>,
    pub containers_seen: usize,
    pub skipped: SkipCounts,
}

/// Turns listing containers into [`ListingRecord`]s against one reference
/// date.
#[derive(Debug)]
pub struct ListingExtractor {
    normalizer: DateNormalizer,
    reference: NaiveDate,
}

impl ListingExtractor {
    #[must_use]
    pub fn new(reference: NaiveDate) -> Self {
        Self::with_normalizer(DateNormalizer::default(), reference)
    }

    #[must_use]
    pub fn with_normalizer(normalizer: DateNormalizer, reference: NaiveDate) -> Self {
        Self {
            normalizer,
            reference,
        }
    }

    #[must_use]
    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    /// Queries the page once and extracts every container it returns.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`PageError`] if the containers cannot be read
    /// at all. Per-container gaps are never errors.
    pub async fn extract_all<Q>(&self, query: &Q) -> Result<ExtractionReport, PageError>
    where
        Q: ListingQuery + ?Sized,
    {
        let cards = query.listing_cards().await?;
        let report = self.extract_cards(&cards);
        tracing::info!(
            containers = report.containers_seen,
            records = report.records.len(),
            missing_title = report.skipped.missing_title,
            missing_price = report.skipped.missing_price,
            missing_date = report.skipped.missing_date,
            "listing extraction finished"
        );
        Ok(report)
    }

    /// Extracts records from already-collected container snapshots.
    #[must_use]
    pub fn extract_cards(&self, cards: &[ListingCard]) -> ExtractionReport {
        let mut report = ExtractionReport {
            containers_seen: cards.len(),
            ..ExtractionReport::default()
        };

        for (index, card) in cards.iter().enumerate() {
            match self.extract_card(card) {
                Ok(record) => report.records.push(record),
                Err(reason) => {
                    tracing::debug!(index, ?reason, "skipping listing container");
                    report.skipped.record(reason);
                }
            }
        }

        report
    }

    /// Extracts one record or reports the first gate the container failed.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] when the container lacks a title, a
    /// parseable price, or a date-shaped line.
    pub fn extract_card(&self, card: &ListingCard) -> Result<ListingRecord, SkipReason> {
        let title = card
            .heading
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SkipReason::MissingTitle)?;

        let price_usd = find_price_fragment(card.fragments.as_slice())
            .and_then(parse_price_usd)
            .ok_or(SkipReason::MissingPrice)?;

        let raw_date_label = find_date_line(&card.text).ok_or(SkipReason::MissingDate)?;

        Ok(ListingRecord {
            title: title.to_owned(),
            raw_date_label: raw_date_label.to_owned(),
            normalized_date: self.normalizer.normalize(raw_date_label, self.reference),
            price_usd,
        })
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
