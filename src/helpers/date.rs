//! Date helper functions

use chrono::{DateTime, FixedOffset, Locale, NaiveDateTime, Utc};
use serde::Serialize;

/// Display format for publication dates
pub const DISPLAY_DATE: &str = "%-d %b %Y";

/// Display format for the "edited" marker
pub const DISPLAY_DATETIME: &str = "%-d %b %Y, às %H:%M";

/// Locale used to spell month names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateLocale {
    #[default]
    PtBr,
    En,
}

impl DateLocale {
    /// Pick a locale from a language tag such as `pt-BR` or `en`
    pub fn from_language(language: &str) -> Self {
        if language.to_ascii_lowercase().starts_with("pt") {
            DateLocale::PtBr
        } else {
            DateLocale::En
        }
    }

    fn chrono_locale(self) -> Locale {
        match self {
            DateLocale::PtBr => Locale::pt_BR,
            DateLocale::En => Locale::en_US,
        }
    }
}

/// Parse a CMS timestamp (`2021-03-25T19:25:28+0000` or RFC 3339)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::<FixedOffset>::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Format a date with a strftime pattern, month names spelled in `locale`
///
/// # Examples
/// ```ignore
/// format_date(&date, "%-d %b %Y", DateLocale::PtBr) // -> "25 mar 2021"
/// ```
pub fn format_date(date: &DateTime<Utc>, format: &str, locale: DateLocale) -> String {
    date.format_localized(format, locale.chrono_locale()).to_string()
}
