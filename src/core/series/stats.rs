use itertools::Itertools;

use crate::quantity::rate::KilowattHourRate;

/// Descriptive statistics over an hourly rate series.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RateStatistics {
    pub min: KilowattHourRate,
    pub max: KilowattHourRate,
    pub mean: KilowattHourRate,

    /// *Sample* standard deviation (`n - 1` in the denominator),
    /// zero for fewer than two samples.
    pub std_dev: KilowattHourRate,
}

impl<T> RateStats for T where T: ?Sized {}

pub trait RateStats {
    fn rate_statistics(self) -> Option<RateStatistics>
    where
        Self: Iterator<Item = KilowattHourRate> + Sized,
    {
        let rates = self.collect_vec();
        let n = rates.len();
        let (min, max, sum) = rates.iter().copied().fold(None, |folded, rate| {
            let (min, max, sum) = folded.unwrap_or((rate, rate, KilowattHourRate::ZERO));
            Some((min.min(rate), max.max(rate), sum + rate))
        })?;

        #[allow(clippy::cast_precision_loss)]
        let mean = sum / n as f64;
        let std_dev = if n < 2 {
            KilowattHourRate::ZERO
        } else {
            #[allow(clippy::cast_precision_loss)]
            let variance =
                rates.iter().map(|rate| (*rate - mean).0.powi(2)).sum::<f64>() / (n - 1) as f64;
            KilowattHourRate::from(variance.sqrt())
        };
        Some(RateStatistics { min, max, mean, std_dev })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_empty_series_has_no_statistics() {
        assert_eq!(std::iter::empty::<KilowattHourRate>().rate_statistics(), None);
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let statistics = [KilowattHourRate::from(0.25)].into_iter().rate_statistics().unwrap();
        assert_eq!(statistics.mean, KilowattHourRate::from(0.25));
        assert_eq!(statistics.std_dev, KilowattHourRate::ZERO);
    }

    #[test]
    fn test_sample_standard_deviation() {
        let statistics = [0.10, 0.20, 0.30, 0.40]
            .into_iter()
            .map(KilowattHourRate::from)
            .rate_statistics()
            .unwrap();
        assert_eq!(statistics.min, KilowattHourRate::from(0.10));
        assert_eq!(statistics.max, KilowattHourRate::from(0.40));
        assert_abs_diff_eq!(statistics.mean.0, 0.25);
        assert_abs_diff_eq!(statistics.std_dev.0, 0.129_099_4, epsilon = 1e-6);
    }
}
