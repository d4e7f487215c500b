use std::{ops::Range, path::PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};

use crate::{
    core::{
        series::normalize::FirstSample,
        tariff::{ImportPricing, Tariff},
    },
    quantity::{cost::Cost, rate::KilowattHourRate},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: reconcile the counters with the day-ahead prices
    /// and compare the fixed and dynamic tariffs.
    #[clap(name = "compare")]
    Compare(Box<CompareArgs>),

    /// List the energy-related statistics entities in the database.
    #[clap(name = "dig")]
    Dig(DigArgs),
}

#[derive(Parser)]
pub struct CompareArgs {
    #[clap(flatten)]
    pub database: DatabaseArgs,

    /// Statistics entity holding the cumulative grid import counter.
    #[clap(long = "import-entity", env = "GRID_IMPORT_ENTITY")]
    pub import_entity: String,

    /// Statistics entity holding the cumulative grid export counter.
    #[clap(long = "export-entity", env = "GRID_EXPORT_ENTITY")]
    pub export_entity: String,

    #[clap(flatten)]
    pub period: PeriodArgs,

    #[clap(flatten)]
    pub fixed: FixedTariffArgs,

    #[clap(flatten)]
    pub dynamic: DynamicTariffArgs,

    /// Export credit per kilowatt-hour, shared by both tariffs.
    #[clap(long = "export-price-per-kwh", default_value = "0.10", env = "EXPORT_PRICE")]
    pub export_rate: KilowattHourRate,

    /// Day-ahead bidding zone, for example `DE-LU` or `NL`.
    #[clap(long = "bidding-zone", default_value = "DE-LU", env = "BIDDING_ZONE")]
    pub bidding_zone: String,

    /// How to interpret the very first cumulative reading in the window.
    #[clap(long = "first-sample", default_value = "is-delta", env = "FIRST_SAMPLE")]
    pub first_sample: FirstSample,

    /// Number of top consumption hours in the report.
    #[clap(long = "top-hours", default_value = "5", env = "TOP_HOURS")]
    pub top_hours: usize,

    /// Write the reconciled hourly breakdown to a CSV file.
    #[clap(long = "export-csv", env = "EXPORT_CSV")]
    pub export_csv: Option<PathBuf>,
}

impl CompareArgs {
    pub fn fixed_tariff(&self) -> Tariff {
        Tariff::builder()
            .name("Fixed")
            .import_pricing(ImportPricing::Fixed(self.fixed.import_rate))
            .export_rate(self.export_rate)
            .monthly_fee(self.fixed.monthly_fee)
            .months(self.period.months)
            .build()
    }

    pub fn dynamic_tariff(&self) -> Tariff {
        Tariff::builder()
            .name("Dynamic")
            .import_pricing(ImportPricing::Indexed { markup: self.dynamic.markup })
            .export_rate(self.export_rate)
            .monthly_fee(self.dynamic.monthly_fee)
            .months(self.period.months)
            .build()
    }
}

#[derive(Parser)]
pub struct DatabaseArgs {
    /// Path to the Home Assistant recorder database (`home-assistant_v2.db`).
    #[clap(long = "database", env = "HOME_ASSISTANT_DB")]
    pub path: PathBuf,
}

#[derive(Copy, Clone, Parser)]
pub struct PeriodArgs {
    /// Length of the comparison window in days, counted back from now.
    #[clap(long = "period-days", default_value = "365", env = "PERIOD_DAYS")]
    pub days: u16,

    /// Number of months the base fees are charged for.
    #[clap(long = "months", default_value = "12", env = "NUM_MONTHS")]
    pub months: u32,
}

impl PeriodArgs {
    pub fn range(self) -> Range<DateTime<Utc>> {
        let end = Utc::now();
        end - TimeDelta::days(i64::from(self.days))..end
    }
}

#[derive(Copy, Clone, Parser)]
pub struct FixedTariffArgs {
    /// Fixed import price per kilowatt-hour.
    #[clap(
        long = "fixed-import-price-per-kwh",
        default_value = "0.25",
        env = "FIXED_IMPORT_PRICE"
    )]
    pub import_rate: KilowattHourRate,

    /// Monthly base fee of the fixed tariff.
    #[clap(long = "fixed-monthly-fee", default_value = "15.00", env = "FIXED_MONTHLY_FEE")]
    pub monthly_fee: Cost,
}

#[derive(Copy, Clone, Parser)]
pub struct DynamicTariffArgs {
    /// Markup added to the hourly day-ahead price, per kilowatt-hour.
    #[clap(long = "dynamic-markup-per-kwh", default_value = "0.1492", env = "DYNAMIC_MARKUP")]
    pub markup: KilowattHourRate,

    /// Monthly base fee of the dynamic tariff.
    #[clap(long = "dynamic-monthly-fee", default_value = "17.01", env = "DYNAMIC_MONTHLY_FEE")]
    pub monthly_fee: Cost,
}

#[derive(Parser)]
pub struct DigArgs {
    #[clap(flatten)]
    pub database: DatabaseArgs,
}
