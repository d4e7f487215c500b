use std::{io::Write, path::Path};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    core::{series::align::AlignedHour, tariff::Tariff},
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// One exported row per aligned hour, with both tariffs itemized.
#[derive(Serialize)]
struct HourlyRow {
    hour: DateTime<Utc>,
    import_kwh: KilowattHours,
    export_kwh: KilowattHours,
    market_rate_eur_kwh: KilowattHourRate,
    fixed_import_cost_eur: Cost,
    dynamic_rate_eur_kwh: KilowattHourRate,
    dynamic_import_cost_eur: Cost,
    export_credit_eur: Cost,
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_hourly_csv(
    path: &Path,
    aligned: &[AlignedHour],
    fixed: &Tariff,
    dynamic: &Tariff,
) -> Result {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create `{}`", path.display()))?;
    write_hourly_rows(file, aligned, fixed, dynamic)
}

fn write_hourly_rows<W: Write>(
    writer: W,
    aligned: &[AlignedHour],
    fixed: &Tariff,
    dynamic: &Tariff,
) -> Result {
    let mut writer = csv::Writer::from_writer(writer);
    for ((aligned, fixed_charge), dynamic_charge) in
        aligned.iter().zip(fixed.itemize(aligned)).zip(dynamic.itemize(aligned))
    {
        writer.serialize(HourlyRow {
            hour: aligned.hour,
            import_kwh: aligned.import,
            export_kwh: aligned.export,
            market_rate_eur_kwh: aligned.rate,
            fixed_import_cost_eur: fixed_charge.import_cost,
            dynamic_rate_eur_kwh: dynamic_charge.rate,
            dynamic_import_cost_eur: dynamic_charge.import_cost,
            export_credit_eur: dynamic_charge.export_credit,
        })?;
    }
    writer.flush()?;
    Ok(())
}
