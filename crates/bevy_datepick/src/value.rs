use std::{any::Any, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A value owned by the host form system.
///
/// The calendar never interprets it directly; meaning comes only from the
/// configured [`FormatDescriptor`](crate::FormatDescriptor).
#[derive(Debug, Clone, Default)]
pub enum ExternalValue {
    #[default]
    Empty,
    Text(String),
    /// Unix timestamp in milliseconds.
    Timestamp(i64),
    /// Native local date-time instant.
    Date(NaiveDateTime),
    /// Host-specific domain object, compared by identity.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl ExternalValue {
    #[must_use]
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// `true` for [`ExternalValue::Empty`] and whitespace-only text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(instant) => Some(*instant),
            _ => None,
        }
    }

    #[must_use]
    pub fn downcast_custom<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short variant name used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Date(_) => "date",
            Self::Custom(_) => "custom",
        }
    }
}

impl PartialEq for ExternalValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ExternalValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ExternalValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDateTime> for ExternalValue {
    fn from(instant: NaiveDateTime) -> Self {
        Self::Date(instant)
    }
}

impl From<NaiveDate> for ExternalValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date.and_time(NaiveTime::MIN))
    }
}

impl From<i64> for ExternalValue {
    fn from(millis: i64) -> Self {
        Self::Timestamp(millis)
    }
}

impl<T: Into<ExternalValue>> From<Option<T>> for ExternalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}
