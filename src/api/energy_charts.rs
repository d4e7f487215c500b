//! [Energy-Charts](https://api.energy-charts.info) day-ahead price client.

use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use serde_with::serde_as;

use crate::{
    api::{client, price_provider::PriceProvider},
    core::{error::ReconcileError, series::Series},
    prelude::*,
    quantity::rate::KilowattHourRate,
};

pub struct Api(Client);

impl Api {
    pub fn try_new() -> Result<Self> {
        Ok(Self(client::try_new()?))
    }
}

#[async_trait]
impl PriceProvider for Api {
    #[instrument(skip_all, fields(zone = zone))]
    async fn get_hourly_rates(
        &self,
        zone: &str,
        period: &Range<DateTime<Utc>>,
    ) -> Result<Series<DateTime<Utc>, KilowattHourRate>> {
        info!("fetching…");
        let start = period.start.to_rfc3339();
        let end = period.end.to_rfc3339();
        let response: PriceResponse = self
            .0
            .get("https://api.energy-charts.info/price")
            .query(&[("bzn", zone), ("start", start.as_str()), ("end", end.as_str())])
            .send()
            .await
            .context("failed to call the price API")?
            .error_for_status()
            .context("the price request failed")?
            .json()
            .await
            .with_context(|| ReconcileError::InvalidPriceData { zone: zone.to_owned() })?;
        info!(n_quotes = response.unix_seconds.len(), unit = response.unit.as_str(), "fetched");
        if response.unit != "EUR/MWh" {
            return Err(anyhow!("unexpected price unit `{}`", response.unit))
                .context(ReconcileError::InvalidPriceData { zone: zone.to_owned() });
        }

        let mut series = response.into_hourly_series();
        series.retain(|(hour, _)| period.contains(hour));
        if series.is_empty() {
            return Err(ReconcileError::InvalidPriceData { zone: zone.to_owned() }.into());
        }
        Ok(series)
    }
}

#[must_use]
#[serde_as]
#[derive(Deserialize)]
struct PriceResponse {
    #[serde_as(as = "Vec<serde_with::TimestampSeconds<i64>>")]
    unix_seconds: Vec<DateTime<Utc>>,

    /// Euro per megawatt-hour; `null` marks an hour the market did not quote.
    price: Vec<Option<f64>>,

    unit: String,
}

impl PriceResponse {
    /// Average the quotes within each hour and forward-fill the gaps, so that
    /// every hour between the first and the last quote carries a rate.
    fn into_hourly_series(self) -> Series<DateTime<Utc>, KilowattHourRate> {
        let quotes = self
            .unix_seconds
            .into_iter()
            .zip(self.price)
            .filter_map(|(timestamp, price)| {
                let price = price?;
                Some((
                    timestamp.duration_trunc(TimeDelta::hours(1)).unwrap(),
                    KilowattHourRate::from_megawatt_hour_price(price),
                ))
            })
            .chunk_by(|(hour, _)| *hour);

        let mut series: Series<DateTime<Utc>, KilowattHourRate> = Vec::new();
        for (hour, rates) in &quotes {
            let rates = rates.map(|(_, rate)| rate).collect_vec();
            #[allow(clippy::cast_precision_loss)]
            let rate = rates.iter().copied().sum::<KilowattHourRate>() / rates.len() as f64;
            if let Some(&(last_hour, last_rate)) = series.last() {
                let mut gap = last_hour + TimeDelta::hours(1);
                while gap < hour {
                    series.push((gap, last_rate));
                    gap = gap + TimeDelta::hours(1);
                }
            }
            series.push((hour, rate));
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, minute, 0).unwrap().and_utc()
    }

    #[test]
    fn test_deserialize_and_resample_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "license_info": "CC BY 4.0 (creativecommons.org/licenses/by/4.0) from Bundesnetzagentur | SMARD.de",
                "unix_seconds": [1740787200, 1740790800, 1740798000],
                "price": [85.17, null, 92.4],
                "unit": "EUR/MWh",
                "deprecated": false
            }
        "#;
        let response = serde_json::from_str::<PriceResponse>(RESPONSE)?;
        assert_eq!(response.unit, "EUR/MWh");

        // The `null` quote is dropped and the gap up to 03:00 forward-filled.
        let series = response.into_hourly_series();
        assert_eq!(
            series.iter().map(|(hour, _)| *hour).collect_vec(),
            [at(0, 0), at(1, 0), at(2, 0), at(3, 0)]
        );
        assert_abs_diff_eq!(series[0].1.0, 0.08517);
        assert_abs_diff_eq!(series[1].1.0, 0.08517);
        assert_abs_diff_eq!(series[2].1.0, 0.08517);
        assert_abs_diff_eq!(series[3].1.0, 0.0924);
        Ok(())
    }

    #[test]
    fn test_sub_hourly_quotes_averaged() {
        let response = PriceResponse {
            unix_seconds: vec![at(0, 0), at(0, 15), at(1, 0)],
            price: vec![Some(100.0), Some(200.0), Some(80.0)],
            unit: "EUR/MWh".to_owned(),
        };
        let series = response.into_hourly_series();
        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series[0].1.0, 0.15);
        assert_abs_diff_eq!(series[1].1.0, 0.08);
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_get_hourly_rates_ok() -> Result {
        let now = Utc::now();
        let series = Api::try_new()?.get_hourly_rates("DE-LU", &(now - TimeDelta::days(2)..now)).await?;
        assert!(!series.is_empty());
        assert!(series.iter().is_sorted_by_key(|(hour, _)| *hour));
        Ok(())
    }
}
