//! mCASH date/time format.
//!
//! Timestamps travel as `yyyy-MM-dd HH:mm:ss` in UTC, without offset or
//! fractional seconds.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const MCASH_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parse an mCASH timestamp as a UTC instant.
pub fn parse(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(value, MCASH_DATETIME).map(PrimitiveDateTime::assume_utc)
}

/// Format an instant in the mCASH format, converting to UTC first.
pub fn format(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(MCASH_DATETIME)
}

/// `#[serde(with = "...")]` helpers for optional timestamp fields.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => {
                let text = super::format(*value).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => super::parse(text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
