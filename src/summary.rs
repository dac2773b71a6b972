use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{error::Error, ledger::Entry, ledger::ProductLedger};

/// Expected value and variance of a product's prices and amounts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductSummary {
    #[serde(rename = "product")]
    pub name: String,
    pub count: usize,
    pub mean_price: f64,
    pub price_variance: f64,
    pub mean_amount: f64,
    pub amount_variance: f64,
    /// Entries whose price or amount fails the plausibility check
    pub outliers: usize,
}

/// Chebyshev sensitivity used when none is given.
pub const DEFAULT_SENSITIVITY: f64 = 0.99;

/// Chebyshev's inequality bound: `value` is unlikely when it lies further
/// than `sqrt(variance / sensitivity)` from the mean.
fn beyond_bound(value: f64, mean: f64, variance: f64, sensitivity: f64) -> bool {
    (value - mean).abs() > (variance / sensitivity).sqrt()
}

/// Population mean and variance (divides by N, not N - 1).
fn moments(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

impl ProductSummary {
    /// Statistics of `entries`, counting the entries that are unlikely at
    /// the given `sensitivity` (in `(0, 1]`).
    pub fn from_entries(name: &str, entries: &[Entry], sensitivity: f64) -> Self {
        let (mean_price, price_variance) = moments(entries.iter().map(|e| e.price));
        let (mean_amount, amount_variance) = moments(entries.iter().map(|e| e.amount as f64));
        let mut summary = ProductSummary {
            name: name.to_string(),
            count: entries.len(),
            mean_price,
            price_variance,
            mean_amount,
            amount_variance,
            outliers: 0,
        };
        for (idx, entry) in entries.iter().enumerate() {
            if summary.is_unlikely(entry, sensitivity) {
                debug!(
                    product = name,
                    occurrence = idx + 1,
                    amount = entry.amount,
                    price = entry.price,
                    "unlikely entry"
                );
                summary.outliers += 1;
            }
        }
        summary
    }

    /// Whether the price or the amount of `entry` is too far from this
    /// product's mean to be plausible.
    pub fn is_unlikely(&self, entry: &Entry, sensitivity: f64) -> bool {
        beyond_bound(entry.price, self.mean_price, self.price_variance, sensitivity)
            || beyond_bound(
                entry.amount as f64,
                self.mean_amount,
                self.amount_variance,
                sensitivity,
            )
    }
}

/// One summary per product, in ledger order.
pub fn summarize(ledger: &ProductLedger, sensitivity: f64) -> Vec<ProductSummary> {
    ledger
        .iter()
        .map(|(name, entries)| {
            let summary = ProductSummary::from_entries(name, entries, sensitivity);
            if summary.outliers > 0 {
                warn!(product = name, outliers = summary.outliers, "unlikely prices or amounts");
            }
            summary
        })
        .collect()
}

/// Serialize summaries to CSV.
/// Note: rows are sorted by product name so the output doesn't depend on
/// input order.
pub fn write_summaries(
    summaries: &[ProductSummary],
    output: impl std::io::Write,
) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(output);
    for summary in summaries.iter().sorted_by(|a, b| a.name.cmp(&b.name)) {
        writer
            .serialize(summary)
            .map_err(|e| Error::SummaryOutput(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| Error::SummaryOutput(e.to_string()))?;
    Ok(())
}
