//! Home Assistant recorder database reader.

use std::{ops::Range, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, params};

use crate::{core::series::normalize::CounterSample, prelude::*, quantity::energy::KilowattHours};

/// Windowed long-term statistics query, ascending.
const SAMPLES_QUERY: &str = "
    SELECT s.start_ts, s.sum, s.state
    FROM statistics s
    JOIN statistics_meta sm ON s.metadata_id = sm.id
    WHERE sm.statistic_id = ?1 AND s.start_ts >= ?2 AND s.start_ts <= ?3
    ORDER BY s.start_ts
";

/// Recorder schemas from before 2023.4 keyed the rows on `created_ts`.
const LEGACY_SAMPLES_QUERY: &str = "
    SELECT s.created_ts, s.sum, s.state
    FROM statistics s
    JOIN statistics_meta sm ON s.metadata_id = sm.id
    WHERE sm.statistic_id = ?1 AND s.created_ts >= ?2 AND s.created_ts <= ?3
    ORDER BY s.created_ts
";

const ENTITIES_QUERY: &str = "
    SELECT sm.statistic_id, sm.unit_of_measurement,
           COUNT(s.id), MIN(s.start_ts), MAX(s.start_ts)
    FROM statistics_meta sm
    LEFT JOIN statistics s ON s.metadata_id = sm.id
    WHERE sm.statistic_id LIKE '%grid%' OR sm.statistic_id LIKE '%energy%'
    GROUP BY sm.id
    ORDER BY sm.statistic_id
";

/// Read-only handle on the recorder database,
/// released on drop right after the samples are fetched.
#[must_use]
pub struct StatisticsDb(Connection);

impl StatisticsDb {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open the database at `{}`", path.display()))?;
        Ok(Self(connection))
    }

    /// Fetch the counter samples of the entity within the window, ascending.
    #[instrument(skip_all, fields(entity_id = entity_id))]
    pub fn get_counter_samples(
        &self,
        entity_id: &str,
        period: &Range<DateTime<Utc>>,
    ) -> Result<Vec<CounterSample>> {
        let samples = self.query_samples(SAMPLES_QUERY, entity_id, period)?;
        if !samples.is_empty() {
            info!(n_samples = samples.len(), "fetched");
            return Ok(samples);
        }
        let samples = self.query_samples(LEGACY_SAMPLES_QUERY, entity_id, period)?;
        info!(n_samples = samples.len(), "fetched via the legacy schema");
        Ok(samples)
    }

    /// List the energy-related statistics entities the database holds.
    #[instrument(skip_all)]
    pub fn list_energy_entities(&self) -> Result<Vec<StatisticsEntity>> {
        let mut statement = self.0.prepare(ENTITIES_QUERY)?;
        let entities = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            })?
            .map(|row| {
                let (statistic_id, unit, n_records, first_ts, last_ts) = row?;
                Ok(StatisticsEntity {
                    statistic_id,
                    unit,
                    n_records,
                    first_at: first_ts.and_then(to_timestamp),
                    last_at: last_ts.and_then(to_timestamp),
                })
            })
            .collect::<Result<Vec<StatisticsEntity>>>()?;
        info!(n_entities = entities.len(), "listed");
        Ok(entities)
    }

    fn query_samples(
        &self,
        query: &str,
        entity_id: &str,
        period: &Range<DateTime<Utc>>,
    ) -> Result<Vec<CounterSample>> {
        let mut statement = self.0.prepare(query)?;
        statement
            .query_map(
                params![entity_id, period.start.timestamp(), period.end.timestamp()],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )?
            .map(|row| {
                let (start_ts, total, state) = row?;
                let start = to_timestamp(start_ts)
                    .with_context(|| format!("row timestamp {start_ts} is out of range"))?;
                Ok(CounterSample {
                    start,
                    total: total.map(KilowattHours::from),
                    state: state.map(KilowattHours::from),
                })
            })
            .collect()
    }
}

#[must_use]
#[derive(Debug)]
pub struct StatisticsEntity {
    pub statistic_id: String,
    pub unit: Option<String>,
    pub n_records: i64,
    pub first_at: Option<DateTime<Utc>>,
    pub last_at: Option<DateTime<Utc>>,
}

#[allow(clippy::cast_possible_truncation)]
fn to_timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds as i64, 0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use itertools::Itertools;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    fn fixture() -> Result<StatisticsDb> {
        let db = StatisticsDb(Connection::open_in_memory()?);
        db.0.execute_batch(
            "
            CREATE TABLE statistics_meta (
                id INTEGER PRIMARY KEY,
                statistic_id TEXT,
                source TEXT,
                unit_of_measurement TEXT
            );
            CREATE TABLE statistics (
                id INTEGER PRIMARY KEY,
                metadata_id INTEGER,
                start_ts REAL,
                created_ts REAL,
                sum REAL,
                state REAL
            );
            INSERT INTO statistics_meta VALUES (1, 'sensor.grid_import', 'recorder', 'kWh');
            INSERT INTO statistics VALUES (1, 1, 1740790800.0, NULL, 100.0, 1.5);
            INSERT INTO statistics VALUES (2, 1, 1740787200.0, NULL, 90.0, NULL);
            INSERT INTO statistics VALUES (3, 1, 1740794400.0, NULL, NULL, 2.0);
            INSERT INTO statistics_meta VALUES (2, 'sensor.old_grid_export', 'recorder', 'kWh');
            INSERT INTO statistics VALUES (4, 2, NULL, 1740787200.0, 50.0, NULL);
            ",
        )?;
        Ok(db)
    }

    #[test]
    fn test_get_counter_samples_ok() -> Result {
        let samples =
            fixture()?.get_counter_samples("sensor.grid_import", &(at(0)..at(23)))?;
        assert_eq!(
            samples,
            [
                CounterSample {
                    start: at(0),
                    total: Some(KilowattHours::from(90.0)),
                    state: None,
                },
                CounterSample {
                    start: at(1),
                    total: Some(KilowattHours::from(100.0)),
                    state: Some(KilowattHours::from(1.5)),
                },
                CounterSample {
                    start: at(2),
                    total: None,
                    state: Some(KilowattHours::from(2.0)),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_window_filters_samples() -> Result {
        let samples =
            fixture()?.get_counter_samples("sensor.grid_import", &(at(1)..at(23)))?;
        assert_eq!(samples.iter().map(|sample| sample.start).collect_vec(), [at(1), at(2)]);
        Ok(())
    }

    #[test]
    fn test_legacy_schema_fallback() -> Result {
        let samples =
            fixture()?.get_counter_samples("sensor.old_grid_export", &(at(0)..at(23)))?;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].start, at(0));
        assert_eq!(samples[0].total, Some(KilowattHours::from(50.0)));
        Ok(())
    }

    #[test]
    fn test_list_energy_entities_ok() -> Result {
        let entities = fixture()?.list_energy_entities()?;
        assert_eq!(
            entities.iter().map(|entity| entity.statistic_id.as_str()).collect_vec(),
            ["sensor.grid_import", "sensor.old_grid_export"]
        );
        assert_eq!(entities[0].n_records, 3);
        assert_eq!(entities[0].unit.as_deref(), Some("kWh"));
        assert_eq!(entities[0].first_at, Some(at(0)));
        assert_eq!(entities[0].last_at, Some(at(2)));
        Ok(())
    }
}
