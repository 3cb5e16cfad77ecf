//! Calendar-date helpers shared by bars, earnings and reports.
//!
//! Dates always travel as `YYYY-MM-DD` strings on the wire and in output.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::ValidationError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Render a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    // Date-only components always format; `Display` has the same shape.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Calendar date of a unix timestamp, taken in UTC.
pub fn date_from_unix(seconds: i64) -> Option<Date> {
    date_from_unix_at(seconds, UtcOffset::UTC)
}

/// Calendar date of a unix timestamp as seen at `offset`.
pub fn date_from_unix_at(seconds: i64, offset: UtcOffset) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .map(|ts| ts.to_offset(offset).date())
}

/// The caller's UTC offset.
///
/// Falls back to UTC when the local offset cannot be determined, which
/// `time` refuses to do once other threads are running on some platforms.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Today's date on the caller's local calendar, see [`local_offset`].
pub fn local_today() -> Date {
    OffsetDateTime::now_utc().to_offset(local_offset()).date()
}

/// Serde adapter for `Date` as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).map_err(D::Error::custom)
    }

    /// Same as the parent module for `Option<Date>`; `None` is `null`.
    pub mod option {
        use serde::de::Error as DeError;
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(date) => serializer.serialize_some(&crate::domain::format_date(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = Option::<String>::deserialize(deserializer)?;
            value
                .map(|raw| crate::domain::parse_date(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }

    /// Same as the parent module for `Vec<Date>`.
    pub mod list {
        use serde::de::Error as DeError;
        use serde::ser::SerializeSeq;
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S>(value: &[Date], serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(value.len()))?;
            for date in value {
                seq.serialize_element(&crate::domain::format_date(*date))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|raw| crate::domain::parse_date(raw).map_err(D::Error::custom))
                .collect()
        }
    }
}
