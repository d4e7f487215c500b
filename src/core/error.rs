use std::ops::Range;

use chrono::{DateTime, Utc};

/// Reconciliation failures that stop the run.
///
/// The core never catches these. They travel inside [`anyhow::Error`] chains,
/// and the presentation layer downcasts them to print matching
/// troubleshooting guidance.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ReconcileError {
    /// The sample source produced zero usable points in the window.
    ///
    /// A hard stop: cost totals over an empty series would read as zero cost.
    #[display("no usable samples for `{entity_id}` between {} and {}", period.start, period.end)]
    NoData {
        entity_id: String,
        period: Range<DateTime<Utc>>,
    },

    /// The intersection of the import, export, and price hours is empty.
    #[display(
        "no overlapping hours across the series (import: {n_import}, export: {n_export}, prices: {n_rates})"
    )]
    NoAlignedData {
        n_import: usize,
        n_export: usize,
        n_rates: usize,
    },

    /// The price source returned an empty or malformed series.
    #[display("the price source returned an empty or malformed series for `{zone}`")]
    InvalidPriceData { zone: String },
}
