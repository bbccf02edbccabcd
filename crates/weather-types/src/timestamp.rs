//! Timestamp parsing and formatting.
//!
//! Observations carry a [`time::OffsetDateTime`]. Clients are not always
//! careful about zones, so input is accepted in two shapes:
//!
//! - RFC 3339 (`2020-10-10T10:10:10Z`, `2020-10-10T12:10:10+02:00`)
//! - zone-less ISO 8601 (`2020-10-10T10:10:10`, `2020-10-10 10:10:10.250`),
//!   interpreted as UTC
//!
//! Output is always RFC 3339.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use crate::error::{ParseError, ParseResult};

/// Parse a timestamp in RFC 3339 or zone-less ISO 8601 form.
///
/// A bare date (`YYYY-MM-DD`) is accepted as midnight UTC of that day.
///
/// # Examples
///
/// ```
/// use weather_types::timestamp::parse_timestamp;
///
/// let a = parse_timestamp("2020-10-10T10:10:10Z").unwrap();
/// let b = parse_timestamp("2020-10-10T10:10:10").unwrap();
/// assert_eq!(a, b);
///
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
pub fn parse_timestamp(input: &str) -> ParseResult<OffsetDateTime> {
    let trimmed = input.trim();

    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        // Stored and returned times are always UTC.
        return OffsetDateTime::from_unix_timestamp_nanos(dt.unix_timestamp_nanos())
            .map_err(|_| ParseError::InvalidTimestamp(input.to_string()));
    }

    // Allow a space between date and time.
    let normalized = if trimmed.len() > 10 && trimmed.as_bytes()[10] == b' ' {
        let mut s = trimmed.to_string();
        s.replace_range(10..11, "T");
        s
    } else {
        trimmed.to_string()
    };

    let naive = PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| parse_date(&normalized).map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT)));

    naive
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| ParseError::InvalidTimestamp(input.to_string()))
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(input: &str) -> ParseResult<Date> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ParseError::InvalidDate(input.to_string()))
}

/// Format a timestamp as RFC 3339.
///
/// Returns `None` for timestamps RFC 3339 cannot express (years outside
/// 0000-9999).
pub fn format_timestamp(dt: OffsetDateTime) -> Option<String> {
    dt.format(&Rfc3339).ok()
}

/// Serde adapter: RFC 3339 out, RFC 3339 or zone-less ISO 8601 in.
///
/// Use with `#[serde(with = "weather_types::timestamp::lenient")]`.
#[cfg(feature = "serde")]
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let text = super::format_timestamp(*dt)
            .ok_or_else(|| ser::Error::custom("timestamp cannot be formatted as RFC 3339"))?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text).map_err(de::Error::custom)
    }
}
