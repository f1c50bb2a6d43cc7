//! CSV and JSON writers for session results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use autotrends_core::{ListingRecord, NetworkPayload};
use serde::Serialize;

pub(crate) const CSV_HEADER: [&str; 4] = ["date", "price_usd", "raw_date_label", "title"];

/// Column order of the listings CSV.
#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    date: &'a str,
    price_usd: u64,
    raw_date_label: &'a str,
    title: &'a str,
}

impl<'a> From<&'a ListingRecord> for ListingRow<'a> {
    fn from(record: &'a ListingRecord) -> Self {
        Self {
            date: &record.normalized_date,
            price_usd: record.price_usd,
            raw_date_label: &record.raw_date_label,
            title: &record.title,
        }
    }
}

/// Writes one header row then one row per record, in record order.
pub(crate) fn write_listings_csv<W: Write>(
    writer: W,
    records: &[ListingRecord],
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if records.is_empty() {
        // `serialize` only emits headers alongside the first row.
        csv.write_record(CSV_HEADER)?;
    }
    for record in records {
        csv.serialize(ListingRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

pub(crate) fn write_listings_csv_file(
    path: &Path,
    records: &[ListingRecord],
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create listings CSV at {}", path.display()))?;
    write_listings_csv(BufWriter::new(file), records)
        .with_context(|| format!("failed to write listings CSV at {}", path.display()))
}

/// Writes the captured payloads as a pretty-printed JSON array.
pub(crate) fn write_network_dump(path: &Path, payloads: &[NetworkPayload]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create network dump at {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payloads)?;
    writer.flush()?;
    Ok(())
}
