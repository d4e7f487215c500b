use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::{
    core::{
        series::{
            align::AlignedHour,
            stats::{RateStatistics, RateStats},
        },
        tariff::CostBreakdown,
    },
    quantity::cost::Cost,
};

/// Cross-tariff comparison with the diagnostics the summary tables need.
#[must_use]
pub struct Report {
    pub fixed: CostBreakdown,
    pub dynamic: CostBreakdown,

    /// Statistics of the market rate, restricted to the aligned hours.
    pub rates: Option<RateStatistics>,

    /// Aligned hours ranked descending by import.
    pub top_hours: Vec<AlignedHour>,
}

impl Report {
    pub fn new(
        aligned: &[AlignedHour],
        fixed: CostBreakdown,
        dynamic: CostBreakdown,
        top_n: usize,
    ) -> Self {
        let mut top_hours = aligned.to_vec();
        top_hours.sort_unstable_by_key(|aligned| Reverse(OrderedFloat(aligned.import.0)));
        top_hours.truncate(top_n);
        Self {
            fixed,
            dynamic,
            rates: aligned.iter().map(|aligned| aligned.rate).rate_statistics(),
            top_hours,
        }
    }

    /// Positive when the dynamic tariff comes out cheaper.
    pub fn savings(&self) -> Cost {
        self.fixed.net_total() - self.dynamic.net_total()
    }

    /// Savings as a percentage of the fixed net total,
    /// zero when the fixed net total is zero.
    pub fn savings_pct(&self) -> f64 {
        let fixed_total = self.fixed.net_total();
        if fixed_total == Cost::ZERO { 0.0 } else { self.savings().0 / fixed_total.0 * 100.0 }
    }
}
