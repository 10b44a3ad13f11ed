use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::{
    error::ConfigError,
    format::{DatePattern, FormatDescriptor},
};

/// Options recognized by a [`SingleCalendar`](crate::SingleCalendar).
///
/// Can be loaded from RON; formatter fields then hold pattern strings:
///
/// ```
/// use bevy_datepick::SingleCalendarConfig;
///
/// let config = SingleCalendarConfig::from_ron(
///     r#"(start_chosen_today: true, formatter_from_date: Some("DD.MM.YYYY"))"#,
/// )
/// .unwrap();
/// assert!(config.start_chosen_today);
/// assert!(config.start_viewport_at_chosen);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SingleCalendarConfig {
    /// Ignore every pick.
    pub no_choose: bool,
    /// Write today's date into the bound value on initialization.
    pub start_chosen_today: bool,
    /// Open on the chosen date's month instead of the current month.
    pub start_viewport_at_chosen: bool,
    #[serde(deserialize_with = "deserialize_pattern")]
    pub formatter_to_date: FormatDescriptor,
    #[serde(deserialize_with = "deserialize_pattern")]
    pub formatter_from_date: FormatDescriptor,
    pub disable_before: Option<NaiveDate>,
    pub disable_after: Option<NaiveDate>,
}

impl Default for SingleCalendarConfig {
    fn default() -> Self {
        Self {
            no_choose: false,
            start_chosen_today: false,
            start_viewport_at_chosen: true,
            formatter_to_date: FormatDescriptor::Absent,
            formatter_from_date: FormatDescriptor::Absent,
            disable_before: None,
            disable_after: None,
        }
    }
}

impl SingleCalendarConfig {
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Use `pattern` for both directions.
    pub fn with_pattern(self, pattern: &str) -> Result<Self, ConfigError> {
        let pattern = DatePattern::parse(pattern)?;
        Ok(self
            .with_formatter_to_date(pattern.clone())
            .with_formatter_from_date(pattern))
    }

    #[must_use]
    pub fn with_no_choose(mut self, no_choose: bool) -> Self {
        self.no_choose = no_choose;
        self
    }

    #[must_use]
    pub fn with_start_chosen_today(mut self, start_chosen_today: bool) -> Self {
        self.start_chosen_today = start_chosen_today;
        self
    }

    #[must_use]
    pub fn with_start_viewport_at_chosen(mut self, start_viewport_at_chosen: bool) -> Self {
        self.start_viewport_at_chosen = start_viewport_at_chosen;
        self
    }

    #[must_use]
    pub fn with_formatter_to_date(mut self, formatter: impl Into<FormatDescriptor>) -> Self {
        self.formatter_to_date = formatter.into();
        self
    }

    #[must_use]
    pub fn with_formatter_from_date(mut self, formatter: impl Into<FormatDescriptor>) -> Self {
        self.formatter_from_date = formatter.into();
        self
    }

    #[must_use]
    pub fn with_disable_before(mut self, date: Option<NaiveDate>) -> Self {
        self.disable_before = date;
        self
    }

    #[must_use]
    pub fn with_disable_after(mut self, date: Option<NaiveDate>) -> Self {
        self.disable_after = date;
        self
    }
}

fn deserialize_pattern<'de, D>(deserializer: D) -> Result<FormatDescriptor, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(FormatDescriptor::Absent),
        Some(source) => FormatDescriptor::pattern(&source).map_err(D::Error::custom),
    }
}
