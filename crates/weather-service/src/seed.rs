//! Sample data for development databases.

use time::OffsetDateTime;
use tracing::info;

use weather_store::ObservationStore;
use weather_types::{Observation, ObservationDraft};

/// Number of sample observations inserted when no count is given.
pub const DEFAULT_SEED_COUNT: u32 = 10;

/// A fixed sample observation taken at `time`.
pub fn sample_draft(time: OffsetDateTime) -> ObservationDraft {
    ObservationDraft::builder()
        .time(time)
        .temperature(11.11)
        .humidity(22.22)
        .air_pressure(33.33)
        .description("Interesting observation")
        .location_name("Aarhus")
        .coordinates(44.44, 55.55)
        .build()
}

/// Insert `count` sample observations stamped with the current time.
pub fn seed_store(store: &mut dyn ObservationStore, count: u32) -> weather_store::Result<Vec<Observation>> {
    let now = OffsetDateTime::now_utc();
    let inserted = (0..count)
        .map(|_| store.insert(&sample_draft(now)))
        .collect::<weather_store::Result<Vec<_>>>()?;

    info!("Seeded {} observations", inserted.len());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use weather_store::{MemoryStore, Store};

    use super::*;

    #[test]
    fn test_sample_draft_is_valid() {
        let draft = sample_draft(OffsetDateTime::now_utc());
        assert!(draft.validate().is_ok());
        assert_eq!(draft.location_name, "Aarhus");
    }

    #[test]
    fn test_seed_store() {
        let mut store = Store::open_in_memory().unwrap();
        let inserted = seed_store(&mut store, 3).unwrap();

        assert_eq!(inserted.len(), 3);
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(inserted[2].id, inserted[0].id + 2);
    }

    #[test]
    fn test_seed_default_count() {
        let mut store = MemoryStore::new();
        let inserted = seed_store(&mut store, DEFAULT_SEED_COUNT).unwrap();

        assert_eq!(DEFAULT_SEED_COUNT, 10);
        assert_eq!(inserted.len(), 10);
        assert_eq!(store.count().unwrap(), 10);
    }

    #[test]
    fn test_seed_zero() {
        let mut store = MemoryStore::new();
        assert!(seed_store(&mut store, 0).unwrap().is_empty());
    }

    #[test]
    fn test_seed_stops_on_failure() {
        let mut store = MemoryStore::new();
        store.set_failure("read-only");
        assert!(seed_store(&mut store, 2).is_err());
    }
}
