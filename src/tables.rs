use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::home_assistant::StatisticsEntity,
    core::{
        report::Report,
        series::{align::AlignedHour, stats::RateStatistics},
        tariff::{CostBreakdown, ImportPricing, Tariff},
    },
    quantity::cost::Cost,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

#[must_use]
pub fn build_breakdown_table(tariff: &Tariff, breakdown: &CostBreakdown) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new(format!("{} tariff", tariff.name)).add_attribute(Attribute::Bold),
        Cell::new("Energy"),
        Cell::new("Rate"),
        Cell::new("Amount"),
    ]);
    let import_rate = match tariff.import_pricing {
        ImportPricing::Fixed(rate) => Cell::new(rate),
        ImportPricing::Indexed { .. } => {
            Cell::new(format!("{} (weighted)", breakdown.weighted_import_rate()))
        }
    };
    table.add_row(vec![
        Cell::new("Import"),
        Cell::new(breakdown.total_import).set_alignment(CellAlignment::Right),
        import_rate,
        Cell::new(breakdown.import_cost).set_alignment(CellAlignment::Right).fg(Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Export credit"),
        Cell::new(breakdown.total_export).set_alignment(CellAlignment::Right),
        Cell::new(tariff.export_rate),
        Cell::new(-breakdown.export_credit).set_alignment(CellAlignment::Right).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Base fee"),
        Cell::new(format!("{} months", tariff.months)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{} / month", tariff.monthly_fee)),
        Cell::new(breakdown.base_fees).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(breakdown.net_total())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

#[must_use]
pub fn build_comparison_table(report: &Report) -> Table {
    let savings = report.savings();
    let verdict_color = if savings > Cost::ZERO { Color::Green } else { Color::Red };
    let verdict = if savings > Cost::ZERO { "Dynamic saves" } else { "Fixed saves" };

    let mut table = new_table();
    table.set_header(vec!["Fixed total", "Dynamic total", "Verdict"]);
    table.add_row(vec![
        Cell::new(report.fixed.net_total()).set_alignment(CellAlignment::Right),
        Cell::new(report.dynamic.net_total()).set_alignment(CellAlignment::Right),
        Cell::new(format!(
            "{verdict} {} ({:+.1}%)",
            Cost::from(savings.0.abs()),
            report.savings_pct(),
        ))
        .fg(verdict_color)
        .add_attribute(Attribute::Bold),
    ]);
    table
}

#[must_use]
pub fn build_rate_statistics_table(statistics: RateStatistics, n_hours: usize) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Hours", "Cheapest", "Most expensive", "Mean", "Volatility (std dev)"]);
    table.add_row(vec![
        Cell::new(n_hours).set_alignment(CellAlignment::Right),
        Cell::new(statistics.min).fg(Color::Green),
        Cell::new(statistics.max).fg(Color::Red),
        Cell::new(statistics.mean),
        Cell::new(statistics.std_dev),
    ]);
    table
}

#[must_use]
pub fn build_top_hours_table(top_hours: &[AlignedHour], dynamic: &Tariff) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Hour (UTC)", "Import", "Market rate", "Effective rate"]);
    for aligned in top_hours {
        table.add_row(vec![
            Cell::new(aligned.hour.format("%Y-%m-%d %H:%M")),
            Cell::new(aligned.import).set_alignment(CellAlignment::Right),
            Cell::new(aligned.rate),
            Cell::new(dynamic.import_pricing.rate_at(aligned.rate)),
        ]);
    }
    table
}

#[must_use]
pub fn build_entities_table(entities: &[StatisticsEntity]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entity", "Unit", "Records", "First", "Last"]);
    for entity in entities {
        table.add_row(vec![
            Cell::new(&entity.statistic_id),
            Cell::new(entity.unit.as_deref().unwrap_or("")).add_attribute(Attribute::Dim),
            Cell::new(entity.n_records).set_alignment(CellAlignment::Right),
            Cell::new(entity.first_at.map_or_else(String::new, |at| at.format("%Y-%m-%d").to_string())),
            Cell::new(entity.last_at.map_or_else(String::new, |at| at.format("%Y-%m-%d").to_string())),
        ]);
    }
    table
}
