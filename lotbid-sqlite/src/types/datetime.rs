//! UTC timestamps stored as SQLite datetimes and exchanged as RFC3339.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{borrow::Borrow, fmt::Display};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339};

/// A UTC timestamp with subsecond precision.
///
/// Every time the engine records (round creation and closure, offer
/// submission, awards, buyer history) is one of these. It orders
/// chronologically, which is what the allocation tie-break relies on.
///
/// ```
/// # use lotbid_sqlite::types::DateTime;
/// let now = DateTime::from(time::OffsetDateTime::now_utc());
/// println!("{now}");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct DateTime(PrimitiveDateTime);

impl<T: Borrow<OffsetDateTime>> From<T> for DateTime {
    fn from(value: T) -> Self {
        let utc = value.borrow().to_offset(UtcOffset::UTC);
        Self(PrimitiveDateTime::new(utc.date(), utc.time()))
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(value: DateTime) -> Self {
        value.0.assume_utc()
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = OffsetDateTime::from(*self)
            .format(&Rfc3339)
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(&OffsetDateTime::from(*self), serializer)
    }
}

// Offsets other than UTC are accepted and normalized
impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        time::serde::rfc3339::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for DateTime {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> std::borrow::Cow<'static, str> {
        "DateTime".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "format": "date-time",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn offsets_are_normalized_to_utc() {
        let stamp: DateTime = serde_json::from_str(r#""2024-05-01T02:30:00+02:00""#).unwrap();
        assert_eq!(stamp, DateTime::from(datetime!(2024-05-01 00:30 UTC)));
        assert_eq!(stamp.to_string(), "2024-05-01T00:30:00Z");
        assert_eq!(serde_json::to_string(&stamp).unwrap(), r#""2024-05-01T00:30:00Z""#);
    }
}
