use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{core::series::Series, prelude::*, quantity::rate::KilowattHourRate};

/// A day-ahead market price source.
#[async_trait]
pub trait PriceProvider {
    /// Fetch the hourly day-ahead rates of the bidding zone over the period.
    ///
    /// Implementations return exactly one sample per hour, ascending, already
    /// converted to a per-kilowatt-hour rate — gaps and sub-hourly quotes are
    /// theirs to resample away.
    async fn get_hourly_rates(
        &self,
        zone: &str,
        period: &Range<DateTime<Utc>>,
    ) -> Result<Series<DateTime<Utc>, KilowattHourRate>>;
}
