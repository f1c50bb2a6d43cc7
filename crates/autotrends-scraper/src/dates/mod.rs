//! Normalization of human-readable listing date labels.
//!
//! Labels such as `"today"`, `"3 days ago"`, `"Jan 5th"` or `"2024-05-07"`
//! are resolved against a single reference date by an ordered chain of
//! [`DateStrategy`] objects. The first strategy that produces a date wins;
//! when none does, the label is passed through unchanged. Normalization
//! never fails.

mod strategies;

use chrono::NaiveDate;

pub use strategies::{GenericStrategy, MonthDayStrategy, RelativeDaysStrategy, TodayStrategy};

/// Canonical output format for resolved dates.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// One independent way of turning a label into a calendar date.
pub trait DateStrategy: Send + Sync {
    /// Short, stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns `None` when the label does not have this strategy's shape or
    /// does not describe a valid calendar date.
    fn try_parse(&self, label: &str, reference: NaiveDate) -> Option<NaiveDate>;
}

/// Outcome of running the strategy chain over one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Parsed {
        date: NaiveDate,
        strategy: &'static str,
    },
    Passthrough,
}

/// Ordered list of date strategies.
pub struct DateNormalizer {
    strategies: Vec<Box<dyn DateStrategy>>,
}

impl Default for DateNormalizer {
    /// today, relative days, month-day, generic fallback.
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(TodayStrategy),
            Box::new(RelativeDaysStrategy),
            Box::new(MonthDayStrategy),
            Box::new(GenericStrategy),
        ])
    }
}

impl DateNormalizer {
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of the configured strategies in evaluation order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain and reports which strategy matched, if any.
    #[must_use]
    pub fn resolve(&self, label: &str, reference: NaiveDate) -> Resolution {
        for strategy in &self.strategies {
            if let Some(date) = strategy.try_parse(label, reference) {
                return Resolution::Parsed {
                    date,
                    strategy: strategy.name(),
                };
            }
        }
        Resolution::Passthrough
    }

    /// Returns the label as `YYYY-MM-DD`, or the original label unchanged
    /// when no strategy recognizes it.
    #[must_use]
    pub fn normalize(&self, label: &str, reference: NaiveDate) -> String {
        match self.resolve(label, reference) {
            Resolution::Parsed { date, strategy } => {
                tracing::trace!(label, strategy, "date label resolved");
                date.format(CANONICAL_FORMAT).to_string()
            }
            Resolution::Passthrough => {
                tracing::debug!(label, "date label left as-is");
                label.to_owned()
            }
        }
    }
}

impl std::fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateNormalizer")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[cfg(test)]
#[path = "../dates_test.rs"]
mod tests;
