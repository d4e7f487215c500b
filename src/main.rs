#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod export;
mod prelude;
mod quantity;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    api::{energy_charts, home_assistant::StatisticsDb, price_provider::PriceProvider},
    cli::{Args, Command, CompareArgs, DigArgs},
    core::{
        error::ReconcileError,
        report::Report,
        series::{SumValues, align::align, normalize::normalize},
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Compare(args) => compare(&args).await.inspect_err(print_troubleshooting),
        Command::Dig(args) => dig(&args),
    }
}

async fn compare(args: &CompareArgs) -> Result {
    let period = args.period.range();
    info!(start = %period.start, end = %period.end, "comparison window");

    let (import_samples, export_samples) = {
        // The handle is dropped before the network round-trips start.
        let db = StatisticsDb::open(&args.database.path)?;
        (
            db.get_counter_samples(&args.import_entity, &period)?,
            db.get_counter_samples(&args.export_entity, &period)?,
        )
    };
    let import = normalize(&args.import_entity, &period, &import_samples, args.first_sample)?;
    let export = normalize(&args.export_entity, &period, &export_samples, args.first_sample)?;
    {
        let total_import: KilowattHours = import.iter().copied().sum_values();
        let total_export: KilowattHours = export.iter().copied().sum_values();
        info!(%total_import, %total_export, "reconciled the counters");
    }

    let rates =
        energy_charts::Api::try_new()?.get_hourly_rates(&args.bidding_zone, &period).await?;
    let aligned = align(&import, &export, &rates)?;

    let fixed = args.fixed_tariff();
    let dynamic = args.dynamic_tariff();
    let report = Report::new(
        &aligned,
        fixed.evaluate(&aligned),
        dynamic.evaluate(&aligned),
        args.top_hours,
    );

    println!("{}", tables::build_breakdown_table(&fixed, &report.fixed));
    println!("{}", tables::build_breakdown_table(&dynamic, &report.dynamic));
    println!("{}", tables::build_comparison_table(&report));
    if let Some(statistics) = report.rates {
        println!("{}", tables::build_rate_statistics_table(statistics, aligned.len()));
    }
    println!("{}", tables::build_top_hours_table(&report.top_hours, &dynamic));

    if let Some(path) = &args.export_csv {
        export::write_hourly_csv(path, &aligned, &fixed, &dynamic)?;
        info!(path = %path.display(), "exported the hourly breakdown");
    }
    Ok(())
}

fn dig(args: &DigArgs) -> Result {
    let entities = StatisticsDb::open(&args.database.path)?.list_energy_entities()?;
    println!("{}", tables::build_entities_table(&entities));
    Ok(())
}

/// The core surfaces reconciliation failures untouched;
/// this is the one place that turns them into guidance.
fn print_troubleshooting(error: &Error) {
    match error.downcast_ref::<ReconcileError>() {
        Some(ReconcileError::NoData { entity_id, .. }) => {
            warn!(
                entity_id = entity_id.as_str(),
                "check the entity id with `meerkat dig`, \
                 and make sure long-term statistics are enabled for it",
            );
        }
        Some(ReconcileError::NoAlignedData { .. }) => {
            warn!(
                "the counters and the price series do not overlap — \
                 check the period and the bidding zone",
            );
        }
        Some(ReconcileError::InvalidPriceData { zone }) => {
            warn!(
                zone = zone.as_str(),
                "check the bidding zone code against api.energy-charts.info",
            );
        }
        None => {}
    }
}
