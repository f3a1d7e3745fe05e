//! Environment settings that shape how queries are parsed and evaluated.
//!
//! An [`Environment`] supplies the default country used when interpreting
//! phone numbers, the timezone and date format used for date literals, and
//! the redaction policy which decides whether URNs may be queried at all.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading an environment from configuration.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The TOML document could not be deserialized.
    #[error("invalid environment: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Order of the day, month and year components in date literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// e.g. `2020-01-31`
    #[default]
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDay,

    /// e.g. `31-01-2020`
    #[serde(rename = "DD-MM-YYYY")]
    DayMonthYear,

    /// e.g. `01-31-2020`
    #[serde(rename = "MM-DD-YYYY")]
    MonthDayYear,
}

/// Whether URN-level addressing data is hidden from queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionPolicy {
    /// URNs can be queried.
    #[default]
    None,

    /// URNs are redacted: scheme and URN conditions are rejected.
    Urns,
}

/// Settings a query is parsed and evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// ISO-3166 alpha-2 country used to interpret local phone numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,

    /// Timezone in which date literals name a day.
    pub timezone: Tz,

    /// Component order of date literals.
    pub date_format: DateFormat,

    /// URN redaction policy.
    pub redaction_policy: RedactionPolicy,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            default_country: None,
            timezone: Tz::UTC,
            date_format: DateFormat::default(),
            redaction_policy: RedactionPolicy::default(),
        }
    }
}

impl Environment {
    /// Creates an environment with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an environment from a TOML document. Missing keys take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use contactql::env::{Environment, RedactionPolicy};
    ///
    /// let env = Environment::from_toml_str(r#"
    /// default_country = "RW"
    /// timezone = "Africa/Kigali"
    /// redaction_policy = "urns"
    /// "#).unwrap();
    ///
    /// assert_eq!(env.default_country.as_deref(), Some("RW"));
    /// assert_eq!(env.redaction_policy, RedactionPolicy::Urns);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, EnvironmentError> {
        Ok(toml::from_str(text)?)
    }

    /// Sets the default country.
    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = Some(country.into());
        self
    }

    /// Sets the timezone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the date format.
    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    /// Sets the redaction policy.
    pub fn with_redaction_policy(mut self, policy: RedactionPolicy) -> Self {
        self.redaction_policy = policy;
        self
    }

    /// Returns true if URNs are hidden from queries.
    pub fn redacts_urns(&self) -> bool {
        self.redaction_policy == RedactionPolicy::Urns
    }

    /// Parses a date literal, returning the start of that day in this environment's timezone.
    ///
    /// Accepts RFC 3339 timestamps (the day they fall on locally) or calendar dates
    /// in the configured [`DateFormat`] using `-`, `/` or `.` as separators.
    pub fn parse_date(&self, value: &str) -> Option<DateTime<Tz>> {
        let value = value.trim();

        let date = match DateTime::parse_from_rfc3339(value) {
            Ok(timestamp) => timestamp.with_timezone(&self.timezone).date_naive(),
            Err(_) => self.parse_calendar_date(value)?,
        };

        Some(start_of_day(date, self.timezone))
    }

    fn parse_calendar_date(&self, value: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = value.split(['-', '/', '.']).collect();
        let [first, second, third] = parts.as_slice() else {
            return None;
        };

        let (year, month, day) = match self.date_format {
            DateFormat::YearMonthDay => (first, second, third),
            DateFormat::DayMonthYear => (third, second, first),
            DateFormat::MonthDayYear => (third, first, second),
        };

        if year.len() != 4 || !is_number(year) || !is_short_number(month) || !is_short_number(day)
        {
            return None;
        }

        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_short_number(s: &str) -> bool {
    s.len() <= 2 && is_number(s)
}

/// Returns the first instant of the given day in the given timezone.
pub(crate) fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Returns the UTC range `[start, end)` covering the local day containing `day`.
pub(crate) fn day_to_utc_range(day: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = day.timezone();
    let date = day.date_naive();
    let next = date.succ_opt().unwrap_or(NaiveDate::MAX);

    (
        start_of_day(date, tz).with_timezone(&Utc),
        start_of_day(next, tz).with_timezone(&Utc),
    )
}
