//! Core types for weather observations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{ParseError, ParseResult};

/// Maximum length of a location label, in characters.
pub const MAX_LOCATION_NAME_LEN: usize = 200;

/// A stored weather observation.
///
/// The `id` is assigned by the record store on insert and never changes
/// afterwards. Everything else is copied from the [`ObservationDraft`] the
/// observation was created from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Observation {
    /// Store-assigned identifier.
    pub id: i64,
    /// When the observation was made.
    #[cfg_attr(feature = "serde", serde(with = "crate::timestamp::lenient"))]
    pub time: OffsetDateTime,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Air pressure in hPa.
    pub air_pressure: f64,
    /// Free-text note.
    pub description: Option<String>,
    /// Human-readable place label.
    pub location_name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Observation {
    /// Build a stored observation from a draft and its assigned id.
    pub fn from_draft(id: i64, draft: &ObservationDraft) -> Self {
        Self {
            id,
            time: draft.time,
            temperature: draft.temperature,
            humidity: draft.humidity,
            air_pressure: draft.air_pressure,
            description: draft.description.clone(),
            location_name: draft.location_name.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
        }
    }

    /// The recognized client-supplied fields of this observation.
    pub fn to_draft(&self) -> ObservationDraft {
        ObservationDraft {
            time: self.time,
            temperature: self.temperature,
            humidity: self.humidity,
            air_pressure: self.air_pressure,
            description: self.description.clone(),
            location_name: self.location_name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// An observation as submitted by a client, before it has an id.
///
/// Unknown JSON fields are ignored on deserialization, so a client-supplied
/// `id` never reaches the store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ObservationDraft {
    /// When the observation was made.
    #[cfg_attr(feature = "serde", serde(with = "crate::timestamp::lenient"))]
    pub time: OffsetDateTime,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Air pressure in hPa.
    pub air_pressure: f64,
    /// Free-text note.
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    /// Human-readable place label.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location_name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Default for ObservationDraft {
    fn default() -> Self {
        Self {
            time: OffsetDateTime::UNIX_EPOCH,
            temperature: 0.0,
            humidity: 0.0,
            air_pressure: 0.0,
            description: None,
            location_name: String::new(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl ObservationDraft {
    /// Create a builder for constructing an `ObservationDraft`.
    pub fn builder() -> ObservationDraftBuilder {
        ObservationDraftBuilder::default()
    }

    /// Check that the draft can be stored.
    ///
    /// Measurements and coordinates must be finite numbers. Coordinate
    /// ranges are not checked.
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_types::ObservationDraft;
    ///
    /// let ok = ObservationDraft::builder().temperature(11.1).build();
    /// assert!(ok.validate().is_ok());
    ///
    /// let bad = ObservationDraft::builder().temperature(f64::NAN).build();
    /// assert!(bad.validate().is_err());
    /// ```
    pub fn validate(&self) -> ParseResult<()> {
        let numbers = [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("airPressure", self.air_pressure),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
        ];
        for (field, value) in numbers {
            if !value.is_finite() {
                return Err(ParseError::InvalidField {
                    field,
                    reason: format!("{} is not a finite number", value),
                });
            }
        }

        let len = self.location_name.chars().count();
        if len > MAX_LOCATION_NAME_LEN {
            return Err(ParseError::InvalidField {
                field: "locationName",
                reason: format!(
                    "{} characters exceeds the maximum of {}",
                    len, MAX_LOCATION_NAME_LEN
                ),
            });
        }

        Ok(())
    }
}

/// Builder for constructing an [`ObservationDraft`].
#[derive(Debug, Default)]
#[must_use]
pub struct ObservationDraftBuilder {
    draft: ObservationDraft,
}

impl ObservationDraftBuilder {
    /// Set the observation time.
    pub fn time(mut self, time: OffsetDateTime) -> Self {
        self.draft.time = time;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.draft.temperature = temperature;
        self
    }

    /// Set humidity.
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.draft.humidity = humidity;
        self
    }

    /// Set air pressure.
    pub fn air_pressure(mut self, air_pressure: f64) -> Self {
        self.draft.air_pressure = air_pressure;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.draft.description = Some(description.into());
        self
    }

    /// Set the location label.
    pub fn location_name(mut self, name: impl Into<String>) -> Self {
        self.draft.location_name = name.into();
        self
    }

    /// Set latitude and longitude.
    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.draft.latitude = latitude;
        self.draft.longitude = longitude;
        self
    }

    /// Build the `ObservationDraft`.
    #[must_use]
    pub fn build(self) -> ObservationDraft {
        self.draft
    }
}
