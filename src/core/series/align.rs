use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    core::{error::ReconcileError, series::Series},
    prelude::*,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

/// One hour present in *all three* input series.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize)]
pub struct AlignedHour {
    pub hour: DateTime<Utc>,
    pub import: KilowattHours,
    pub export: KilowattHours,
    pub rate: KilowattHourRate,
}

/// Inner-join the import, export, and price series on the UTC hour key.
///
/// No partial rows: an hour missing from any one input is excluded entirely,
/// so no cost is ever computed for an hour with unknown price or unknown
/// consumption. The result is ascending by hour.
#[instrument(skip_all)]
pub fn align(
    import: &Series<DateTime<Utc>, KilowattHours>,
    export: &Series<DateTime<Utc>, KilowattHours>,
    rates: &Series<DateTime<Utc>, KilowattHourRate>,
) -> Result<Vec<AlignedHour>> {
    let import_by_hour: BTreeMap<_, _> = import.iter().copied().collect();
    let export_by_hour: BTreeMap<_, _> = export.iter().copied().collect();
    let rates_by_hour: BTreeMap<_, _> = rates.iter().copied().collect();

    let aligned: Vec<AlignedHour> = rates_by_hour
        .into_iter()
        .filter_map(|(hour, rate)| {
            Some(AlignedHour {
                hour,
                import: *import_by_hour.get(&hour)?,
                export: *export_by_hour.get(&hour)?,
                rate,
            })
        })
        .collect();
    info!(
        n_import = import.len(),
        n_export = export.len(),
        n_rates = rates.len(),
        n_aligned = aligned.len(),
        "aligned the hourly series",
    );

    if aligned.is_empty() {
        return Err(ReconcileError::NoAlignedData {
            n_import: import.len(),
            n_export: export.len(),
            n_rates: rates.len(),
        }
        .into());
    }
    Ok(aligned)
}
