//! Query builder for scanning observations.
//!
//! [`ObservationQuery`] is the predicate handed to
//! [`ObservationStore::scan`](crate::ObservationStore::scan). Every store
//! implementation honors the same contract:
//!
//! - `since` and `until` are both inclusive
//! - results are ordered by `(time, id)`, newest first unless
//!   [`oldest_first`](ObservationQuery::oldest_first) is set
//! - `offset` and `limit` apply after ordering
//!
//! # Example
//!
//! ```
//! use weather_store::{MemoryStore, ObservationQuery, ObservationStore};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = MemoryStore::new();
//! let now = OffsetDateTime::now_utc();
//!
//! let query = ObservationQuery::new()
//!     .since(now - Duration::hours(3))
//!     .until(now)
//!     .limit(10);
//!
//! let observations = store.scan(&query)?;
//! assert!(observations.is_empty());
//! # Ok::<(), weather_store::Error>(())
//! ```

use std::cmp::Ordering;

use time::OffsetDateTime;
use weather_types::Observation;

/// Fluent query builder for observations.
///
/// By default, queries return every observation ordered by `time`
/// descending (newest first), with ties broken by descending id.
#[derive(Debug, Default, Clone)]
pub struct ObservationQuery {
    /// Include only observations at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Include only observations at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Order by time descending (newest first).
    pub newest_first: bool,
}

impl ObservationQuery {
    /// Create a new query with default settings.
    ///
    /// Default behavior:
    /// - No time range filter
    /// - No limit (all matching records)
    /// - Ordered by newest first
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Filter to observations made at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to observations made at or before this time.
    ///
    /// Use with `since()` to query a closed time range.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first (ascending by `time`).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Whether an observation passes the time filters.
    pub fn matches(&self, observation: &Observation) -> bool {
        self.since.is_none_or(|since| observation.time >= since)
            && self.until.is_none_or(|until| observation.time <= until)
    }

    /// Compare two observations in this query's result order.
    pub fn compare(&self, a: &Observation, b: &Observation) -> Ordering {
        let ascending = a.time.cmp(&b.time).then(a.id.cmp(&b.id));
        if self.newest_first {
            ascending.reverse()
        } else {
            ascending
        }
    }

    /// Apply the filters, ordering, offset and limit to an unordered set.
    ///
    /// Stores without a query engine of their own use this to satisfy
    /// the scan contract.
    pub fn apply<'a, I>(&self, observations: I) -> Vec<Observation>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut matched: Vec<Observation> = observations
            .into_iter()
            .filter(|o| self.matches(o))
            .cloned()
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));

        let offset = self.offset.unwrap_or(0) as usize;
        let limit = self.limit.map_or(usize::MAX, |l| l as usize);
        matched.into_iter().skip(offset).take(limit).collect()
    }

    /// Build the SQL WHERE clause and parameters.
    ///
    /// Bounds are bound as Unix nanoseconds. A bound outside the storable
    /// range is clamped, since no stored row can lie beyond it.
    pub(crate) fn build_where(&self) -> (String, Vec<i64>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(since) = self.since {
            conditions.push("time_ns >= ?");
            params.push(clamp_nanos(since));
        }

        if let Some(until) = self.until {
            conditions.push("time_ns <= ?");
            params.push(clamp_nanos(until));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, time_ns, temperature, humidity, air_pressure, description, \
             location_name, latitude, longitude \
             FROM observations {} ORDER BY time_ns {}, id {}",
            where_clause, order, order
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }
}

fn clamp_nanos(time: OffsetDateTime) -> i64 {
    let nanos = time.unix_timestamp_nanos();
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}
