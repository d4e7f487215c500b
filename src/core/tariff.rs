use chrono::{DateTime, Utc};

use crate::{
    core::series::align::AlignedHour,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// How the per-kilowatt-hour import price is determined.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ImportPricing {
    /// Constant rate regardless of the hour.
    Fixed(KilowattHourRate),

    /// Hourly day-ahead market rate plus a fixed markup.
    Indexed { markup: KilowattHourRate },
}

impl ImportPricing {
    pub fn rate_at(self, market_rate: KilowattHourRate) -> KilowattHourRate {
        match self {
            Self::Fixed(rate) => rate,
            Self::Indexed { markup } => market_rate + markup,
        }
    }
}

/// Billing scheme parameters, passed into every evaluation as a value.
#[derive(Clone, Debug, bon::Builder)]
pub struct Tariff {
    pub name: &'static str,
    pub import_pricing: ImportPricing,

    /// Export credit rate, constant regardless of the import pricing mode.
    pub export_rate: KilowattHourRate,

    pub monthly_fee: Cost,
    pub months: u32,
}

/// Itemized cost of a single aligned hour under a tariff.
#[must_use]
#[derive(Copy, Clone, Debug, serde::Serialize)]
pub struct HourlyCharge {
    pub hour: DateTime<Utc>,
    pub import: KilowattHours,

    /// The effective import rate of this hour.
    pub rate: KilowattHourRate,

    pub import_cost: Cost,
    pub export_credit: Cost,
}

impl Tariff {
    /// Price every aligned hour individually.
    ///
    /// The per-hour rate is applied *before* summation: under indexed
    /// pricing, averaging the rates first would lose the correlation between
    /// consumption and price.
    pub fn itemize(&self, aligned: &[AlignedHour]) -> Vec<HourlyCharge> {
        aligned
            .iter()
            .map(|aligned| {
                let rate = self.import_pricing.rate_at(aligned.rate);
                HourlyCharge {
                    hour: aligned.hour,
                    import: aligned.import,
                    rate,
                    import_cost: aligned.import * rate,
                    export_credit: aligned.export * self.export_rate,
                }
            })
            .collect()
    }

    pub fn evaluate(&self, aligned: &[AlignedHour]) -> CostBreakdown {
        let charges = self.itemize(aligned);
        CostBreakdown {
            total_import: aligned.iter().map(|aligned| aligned.import).sum(),
            total_export: aligned.iter().map(|aligned| aligned.export).sum(),
            import_cost: charges.iter().map(|charge| charge.import_cost).sum(),
            export_credit: charges.iter().map(|charge| charge.export_credit).sum(),
            base_fees: self.monthly_fee * f64::from(self.months),
        }
    }
}

/// Evaluated totals of one tariff over the aligned hours.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct CostBreakdown {
    pub total_import: KilowattHours,
    pub total_export: KilowattHours,
    pub import_cost: Cost,
    pub export_credit: Cost,
    pub base_fees: Cost,
}

impl CostBreakdown {
    pub fn net_total(&self) -> Cost {
        self.import_cost - self.export_credit + self.base_fees
    }

    /// Total import cost over total imported energy,
    /// zero when nothing was imported.
    pub fn weighted_import_rate(&self) -> KilowattHourRate {
        if self.total_import > KilowattHours::ZERO {
            self.import_cost / self.total_import
        } else {
            KilowattHourRate::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    use super::*;

    fn aligned(hour: u32, import: f64, export: f64, rate: f64) -> AlignedHour {
        AlignedHour {
            hour: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap()
                .and_utc(),
            import: KilowattHours::from(import),
            export: KilowattHours::from(export),
            rate: KilowattHourRate::from(rate),
        }
    }

    fn indexed_tariff(markup: f64, months: u32, monthly_fee: f64) -> Tariff {
        Tariff::builder()
            .name("dynamic")
            .import_pricing(ImportPricing::Indexed { markup: KilowattHourRate::from(markup) })
            .export_rate(KilowattHourRate::from(0.10))
            .monthly_fee(Cost::from(monthly_fee))
            .months(months)
            .build()
    }

    #[test]
    fn test_indexed_tariff_end_to_end() {
        let hours =
            [aligned(1, 2.0, 0.0, 0.10), aligned(2, 1.0, 0.5, 0.30), aligned(3, 0.0, 1.0, 0.05)];
        let breakdown = indexed_tariff(0.05, 12, 0.0).evaluate(&hours);
        assert_abs_diff_eq!(breakdown.import_cost.0, 0.65);
        assert_abs_diff_eq!(breakdown.export_credit.0, 0.15);
        assert_abs_diff_eq!(breakdown.net_total().0, 0.50);
    }

    #[test]
    fn test_fixed_pricing_matches_the_closed_form() {
        let hours = [
            aligned(1, 1.234, 0.0, 0.08),
            aligned(2, 0.567, 0.1, 0.31),
            aligned(3, 2.901, 0.2, 0.17),
            aligned(4, 0.004, 0.0, 0.29),
        ];
        let rate = KilowattHourRate::from(0.25);
        let tariff = Tariff::builder()
            .name("fixed")
            .import_pricing(ImportPricing::Fixed(rate))
            .export_rate(KilowattHourRate::from(0.10))
            .monthly_fee(Cost::ZERO)
            .months(12)
            .build();
        let breakdown = tariff.evaluate(&hours);
        assert_relative_eq!(
            breakdown.import_cost.0,
            (breakdown.total_import * rate).0,
            max_relative = 1e-9,
        );
    }

    #[test]
    fn test_indexed_pricing_is_order_sensitive() {
        // Equal total import, but the consumption is paired differently with
        // the prices: pre-averaging the rates must not give the same total.
        let hours = [aligned(1, 3.0, 0.0, 0.10), aligned(2, 1.0, 0.0, 0.50)];
        let breakdown = indexed_tariff(0.0, 0, 0.0).evaluate(&hours);
        let pre_averaged = breakdown.total_import * KilowattHourRate::from((0.10 + 0.50) / 2.0);
        assert_abs_diff_eq!(breakdown.import_cost.0, 0.80);
        assert!((breakdown.import_cost - pre_averaged).0.abs() > 1e-9);
    }

    #[test]
    fn test_weighted_rate_of_zero_import_is_zero() {
        let hours = [aligned(1, 0.0, 1.0, 0.30)];
        let breakdown = indexed_tariff(0.05, 12, 17.01).evaluate(&hours);
        assert_eq!(breakdown.weighted_import_rate(), KilowattHourRate::ZERO);
    }

    #[test]
    fn test_base_fees() {
        let breakdown = indexed_tariff(0.05, 12, 17.01).evaluate(&[]);
        assert_abs_diff_eq!(breakdown.base_fees.0, 204.12);
        assert_abs_diff_eq!(breakdown.net_total().0, 204.12);
    }
}
