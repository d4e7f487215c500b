use std::ops::Range;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use itertools::Itertools;

use crate::{
    core::{
        error::ReconcileError,
        series::{Deltas, Series},
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Raw meter reading as recorded by the sample source.
///
/// `total` is the cumulative counter, `state` the per-sample reading that
/// some sources report instead of a running total.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CounterSample {
    pub start: DateTime<Utc>,
    pub total: Option<KilowattHours>,
    pub state: Option<KilowattHours>,
}

/// How to interpret the very first cumulative reading in the window.
///
/// The counter's value *is* everything it ever measured, so taking it as a
/// delta is only correct when the counter started at zero within recorded
/// history. For a counter with unknown pre-history, discard it instead.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum FirstSample {
    #[default]
    IsDelta,
    Discard,
}

/// Reconcile raw counter samples into per-hour consumption deltas.
///
/// Successive differences over the samples carrying a cumulative total, with
/// a decreasing counter (reset or rollover) clamped to zero consumption.
/// Samples without a total are dropped. When *no* sample in the window
/// carries a total, the per-sample `state` readings are taken as the hourly
/// deltas directly.
///
/// The result is ascending, hour-truncated, non-negative, and holds at most
/// one entry per distinct hour — deltas landing in the same hour are summed.
#[instrument(skip_all, fields(entity_id = entity_id, n_samples = samples.len()))]
pub fn normalize(
    entity_id: &str,
    period: &Range<DateTime<Utc>>,
    samples: &[CounterSample],
    first_sample: FirstSample,
) -> Result<Series<DateTime<Utc>, KilowattHours>> {
    let samples =
        samples.iter().filter(|sample| period.contains(&sample.start)).copied().collect_vec();

    let totals: Series<DateTime<Utc>, KilowattHours> = samples
        .iter()
        .filter_map(|sample| sample.total.map(|total| (sample.start, total)))
        .collect();

    let deltas: Series<DateTime<Utc>, KilowattHours> = if totals.is_empty() {
        samples
            .iter()
            .filter_map(|sample| sample.state.map(|state| (sample.start, state)))
            .collect()
    } else {
        let first = match first_sample {
            FirstSample::IsDelta => Some(totals[0]),
            FirstSample::Discard => None,
        };
        first
            .into_iter()
            .chain(totals.iter().copied().deltas().map(|(range, delta)| (range.end, delta)))
            .collect()
    };

    if deltas.is_empty() {
        return Err(ReconcileError::NoData {
            entity_id: entity_id.to_owned(),
            period: period.clone(),
        }
        .into());
    }

    let buckets = deltas
        .into_iter()
        .map(|(timestamp, delta)| {
            (
                timestamp.duration_trunc(TimeDelta::hours(1)).unwrap(),
                delta.max(KilowattHours::ZERO),
            )
        })
        .chunk_by(|(hour, _)| *hour);
    let series: Series<DateTime<Utc>, KilowattHours> = (&buckets)
        .into_iter()
        .map(|(hour, deltas)| (hour, deltas.map(|(_, delta)| delta).sum()))
        .collect();
    debug!(n_hours = series.len(), "normalized");
    Ok(series)
}
