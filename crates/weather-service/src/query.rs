//! Read operations over the observation store.
//!
//! Every operation returns observations newest first, ties broken by the
//! higher id. When a [`RoundingPolicy`] is active it is applied to the
//! returned copies only; stored values are never changed.

use time::{Date, Duration, OffsetDateTime, Time};
use tracing::debug;

use weather_store::ObservationQuery;
use weather_types::Observation;

use crate::error::Result;
use crate::state::SharedStore;

/// How measurements are presented in read responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    /// Return values exactly as stored.
    None,
    /// Round `temperature` and `airPressure` to one decimal place,
    /// ties to even.
    #[default]
    OneDecimal,
}

impl RoundingPolicy {
    /// Policy for the `query.round_measurements` setting.
    pub fn from_flag(round: bool) -> Self {
        if round { Self::OneDecimal } else { Self::None }
    }

    /// Return `observation` as it should be presented.
    pub fn apply(self, mut observation: Observation) -> Observation {
        if self == Self::OneDecimal {
            observation.temperature = round_one_decimal(observation.temperature);
            observation.air_pressure = round_one_decimal(observation.air_pressure);
        }
        observation
    }
}

fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    // Near f64::MAX the scaled value overflows; such values have no
    // fractional part to round anyway.
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 10.0
}

/// Most-recent, range, calendar-day and by-id lookups.
#[derive(Clone)]
pub struct QueryService {
    store: SharedStore,
    rounding: RoundingPolicy,
}

impl QueryService {
    pub fn new(store: SharedStore, rounding: RoundingPolicy) -> Self {
        Self { store, rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// The `count` observations with the latest time.
    pub async fn recent(&self, count: u32) -> Result<Vec<Observation>> {
        self.scan(ObservationQuery::new().limit(count)).await
    }

    /// Observations with `start <= time <= end`.
    ///
    /// An inverted range matches nothing.
    pub async fn range(&self, start: OffsetDateTime, end: OffsetDateTime) -> Result<Vec<Observation>> {
        if start > end {
            debug!("Empty range: {} is after {}", start, end);
            return Ok(Vec::new());
        }
        self.scan(ObservationQuery::new().since(start).until(end)).await
    }

    /// Observations whose time falls on `date` (UTC).
    pub async fn on_date(&self, date: Date) -> Result<Vec<Observation>> {
        let start = date.midnight().assume_utc();
        let end = match start.checked_add(Duration::DAY) {
            Some(next) => next - Duration::NANOSECOND,
            None => date.with_time(Time::MAX).assume_utc(),
        };
        self.scan(ObservationQuery::new().since(start).until(end)).await
    }

    /// The observation with this id.
    pub async fn by_id(&self, id: i64) -> Result<Observation> {
        let observation = self.store.lock().await.get(id)?;
        Ok(self.rounding.apply(observation))
    }

    async fn scan(&self, query: ObservationQuery) -> Result<Vec<Observation>> {
        let found = self.store.lock().await.scan(&query)?;
        debug!("Query returned {} observations", found.len());
        Ok(found.into_iter().map(|o| self.rounding.apply(o)).collect())
    }
}
