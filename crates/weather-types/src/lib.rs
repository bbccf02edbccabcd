//! Shared types for weather observations.
//!
//! This crate provides the data model used by both the record store
//! (weather-store) and the HTTP service (weather-service).
//!
//! # Features
//!
//! - [`Observation`]: a stored record with its store-assigned id
//! - [`ObservationDraft`]: a client submission, validated before storage
//! - Lenient timestamp parsing (RFC 3339 or zone-less ISO 8601)
//!
//! # Example
//!
//! ```
//! use weather_types::{Observation, ObservationDraft};
//! use weather_types::timestamp::parse_timestamp;
//!
//! let draft = ObservationDraft::builder()
//!     .time(parse_timestamp("2020-10-10T10:10:10").unwrap())
//!     .temperature(11.1)
//!     .location_name("Aarhus")
//!     .build();
//! draft.validate().unwrap();
//!
//! let stored = Observation::from_draft(1, &draft);
//! assert_eq!(stored.location_name, "Aarhus");
//! ```

pub mod error;
pub mod timestamp;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{MAX_LOCATION_NAME_LEN, Observation, ObservationDraft, ObservationDraftBuilder};
