//! SQLite-backed observation store.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use weather_types::{Observation, ObservationDraft};

use crate::error::{Error, Result};
use crate::queries::ObservationQuery;
use crate::schema;
use crate::traits::ObservationStore;

const SELECT_COLUMNS: &str = "SELECT id, time_ns, temperature, humidity, air_pressure, \
     description, location_name, latitude, longitude FROM observations";

/// SQLite-based store for weather observations.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    fn find(&self, id: i64) -> Result<Option<Observation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?", SELECT_COLUMNS))?;
        let observation = stmt.query_row([id], observation_from_row).optional()?;
        Ok(observation)
    }
}

impl ObservationStore for Store {
    fn insert(&mut self, draft: &ObservationDraft) -> Result<Observation> {
        let time_ns = to_nanos(draft.time)?;

        self.conn.execute(
            "INSERT INTO observations (time_ns, temperature, humidity, air_pressure,
             description, location_name, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                time_ns,
                draft.temperature,
                draft.humidity,
                draft.air_pressure,
                draft.description,
                draft.location_name,
                draft.latitude,
                draft.longitude,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted observation {}", id);
        Ok(Observation::from_draft(id, draft))
    }

    fn get(&self, id: i64) -> Result<Observation> {
        self.find(id)?.ok_or(Error::ObservationNotFound(id))
    }

    fn scan(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let observations = stmt
            .query_map(rusqlite::params_from_iter(params), observation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(observations)
    }

    fn delete(&mut self, id: i64) -> Result<Observation> {
        let tx = self.conn.transaction()?;

        let existing = tx
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                [id],
                observation_from_row,
            )
            .optional()?
            .ok_or(Error::ObservationNotFound(id))?;

        tx.execute("DELETE FROM observations WHERE id = ?", [id])?;
        tx.commit()?;

        info!("Deleted observation {}", id);
        Ok(existing)
    }

    fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn to_nanos(time: OffsetDateTime) -> Result<i64> {
    i64::try_from(time.unix_timestamp_nanos())
        .map_err(|_| Error::InvalidTimestamp(format!("{} is outside the storable range", time)))
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<Observation> {
    let time_ns: i64 = row.get(1)?;
    let time = OffsetDateTime::from_unix_timestamp_nanos(i128::from(time_ns))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(e)))?;

    Ok(Observation {
        id: row.get(0)?,
        time,
        temperature: row.get(2)?,
        humidity: row.get(3)?,
        air_pressure: row.get(4)?,
        description: row.get(5)?,
        location_name: row.get(6)?,
        latitude: row.get(7)?,
        longitude: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn draft_at(time: OffsetDateTime, location: &str) -> ObservationDraft {
        ObservationDraft::builder()
            .time(time)
            .temperature(20.5)
            .humidity(2.0)
            .air_pressure(1.4)
            .location_name(location)
            .coordinates(20.0, 20.0)
            .build()
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("observations.db");

        let mut store = Store::open(&path).unwrap();
        store.insert(&draft_at(datetime!(2020-10-10 10:10:10 UTC), "Aarhus")).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.db");

        let id = {
            let mut store = Store::open(&path).unwrap();
            store
                .insert(&draft_at(datetime!(2020-10-10 10:10:10 UTC), "Aarhus"))
                .unwrap()
                .id
        };

        let store = Store::open(&path).unwrap();
        assert_eq!(store.get(id).unwrap().location_name, "Aarhus");
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = Store::open_in_memory().unwrap();
        let t = datetime!(2020-10-10 10:10:10 UTC);

        let a = store.insert(&draft_at(t, "a")).unwrap();
        let b = store.insert(&draft_at(t, "b")).unwrap();

        assert_eq!(b.id, a.id + 1);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = Store::open_in_memory().unwrap();
        let t = datetime!(2020-10-10 10:10:10 UTC);

        let a = store.insert(&draft_at(t, "a")).unwrap();
        store.delete(a.id).unwrap();
        let b = store.insert(&draft_at(t, "b")).unwrap();

        assert!(b.id > a.id);
    }

    #[test]
    fn test_get_round_trips_all_fields() {
        let mut store = Store::open_in_memory().unwrap();
        let draft = ObservationDraft::builder()
            .time(datetime!(2020-10-10 10:10:10.123456789 UTC))
            .temperature(-3.25)
            .humidity(87.5)
            .air_pressure(1013.7)
            .description("Light drizzle")
            .location_name("Aarhus")
            .coordinates(56.1629, 10.2039)
            .build();

        let stored = store.insert(&draft).unwrap();
        let fetched = store.get(stored.id).unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.to_draft(), draft);
    }

    #[test]
    fn test_get_missing() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get(42).unwrap_err();
        assert!(matches!(err, Error::ObservationNotFound(42)));
    }

    #[test]
    fn test_scan_range_descending() {
        let mut store = Store::open_in_memory().unwrap();
        let t = datetime!(2020-10-10 10:10:10 UTC);

        store.insert(&draft_at(t, "t")).unwrap();
        store.insert(&draft_at(t + Duration::hours(2), "t+2h")).unwrap();
        store.insert(&draft_at(t + Duration::hours(5), "t+5h")).unwrap();
        store
            .insert(&draft_at(t + Duration::days(1) + Duration::hours(3), "t+1d3h"))
            .unwrap();

        let query = ObservationQuery::new().since(t).until(t + Duration::hours(3));
        let found = store.scan(&query).unwrap();

        let names: Vec<&str> = found.iter().map(|o| o.location_name.as_str()).collect();
        assert_eq!(names, vec!["t+2h", "t"]);
    }

    #[test]
    fn test_scan_ties_broken_by_id() {
        let mut store = Store::open_in_memory().unwrap();
        let t = datetime!(2020-10-10 10:10:10 UTC);

        let first = store.insert(&draft_at(t, "first")).unwrap();
        let second = store.insert(&draft_at(t, "second")).unwrap();

        let found = store.scan(&ObservationQuery::new()).unwrap();
        assert_eq!(found[0].id, second.id);
        assert_eq!(found[1].id, first.id);
    }

    #[test]
    fn test_scan_limit_and_offset() {
        let mut store = Store::open_in_memory().unwrap();
        let t = datetime!(2020-10-10 10:10:10 UTC);
        for i in 0..5 {
            store
                .insert(&draft_at(t + Duration::minutes(i), &i.to_string()))
                .unwrap();
        }

        let found = store.scan(&ObservationQuery::new().limit(2).offset(1)).unwrap();
        let names: Vec<&str> = found.iter().map(|o| o.location_name.as_str()).collect();
        assert_eq!(names, vec!["3", "2"]);

        let found = store.scan(&ObservationQuery::new().offset(3)).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_delete() {
        let mut store = Store::open_in_memory().unwrap();
        let stored = store
            .insert(&draft_at(datetime!(2020-10-10 10:10:10 UTC), "gone"))
            .unwrap();

        let removed = store.delete(stored.id).unwrap();
        assert_eq!(removed, stored);
        assert_eq!(store.count().unwrap(), 0);

        assert!(matches!(
            store.delete(stored.id),
            Err(Error::ObservationNotFound(_))
        ));
    }

    #[test]
    fn test_insert_rejects_unstorable_time() {
        let mut store = Store::open_in_memory().unwrap();
        let far_future = datetime!(9999-01-01 0:00 UTC);

        let err = store.insert(&draft_at(far_future, "x")).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(_)));
        assert_eq!(store.count().unwrap(), 0);
    }
}
