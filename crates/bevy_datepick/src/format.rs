//! Conversion between host [`ExternalValue`]s and calendar dates.
//!
//! A [`FormatDescriptor`] decides how a value is read and written:
//! - [`FormatDescriptor::Absent`] passes native [`ExternalValue::Date`] instants through,
//! - [`FormatDescriptor::Pattern`] reads and writes text through a [`DatePattern`],
//! - [`FormatDescriptor::Custom`] delegates to host functions, falling back to its
//!   pattern (or to the absent rules) for a missing direction.
//!
//! Conversions are pure. A value that cannot become a date yields a
//! [`ConversionError`]; callers treat it as "ignore this update".

use std::{fmt, str::FromStr, sync::Arc};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::{date::NormalizedDate, value::ExternalValue};

/// Host conversion from an external value to a date.
///
/// Receives the value and the configured pattern source, if any. Anything other
/// than [`ExternalValue::Date`] in the result counts as a failed conversion.
pub type ToDateFn = Arc<dyn Fn(&ExternalValue, Option<&str>) -> ExternalValue + Send + Sync>;

/// Host conversion from a midnight instant to an external value.
pub type FromDateFn = Arc<dyn Fn(NaiveDateTime, Option<&str>) -> ExternalValue + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("{kind} value is not date-like")]
    NotDateLike { kind: &'static str },

    #[error("{input:?} does not match pattern {pattern:?}")]
    Unparseable { input: String, pattern: String },

    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),

    #[error("custom formatter produced a {kind} value instead of a date")]
    CustomNotDate { kind: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("date pattern is empty")]
    Empty,

    #[error("unsupported token {0:?} in date pattern")]
    UnsupportedToken(String),

    #[error("unclosed `[` literal in date pattern")]
    UnclosedLiteral,

    #[error("date pattern has no {0} field")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternLayout {
    /// chrono strftime string translated from the token pattern.
    Calendar(String),
    UnixMillis,
    UnixSeconds,
}

/// Named date pattern such as `YYYY-MM-DD` or `DD.MM.YYYY`.
///
/// Tokens: `YYYY`, `YY`, `M`, `MM`, `MMM`, `MMMM`, `D`, `DD`. Text inside `[...]`
/// and any non-letter character is copied literally. The single-token patterns
/// `x` and `X` denote Unix milliseconds and Unix seconds.
///
/// `YY` writes the year modulo 100 and reads it back within 1970..=2069, so a
/// date outside that window does not survive a `YY` round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    layout: PatternLayout,
}

impl DatePattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let layout = match source.trim() {
            "" => return Err(PatternError::Empty),
            "x" => PatternLayout::UnixMillis,
            "X" => PatternLayout::UnixSeconds,
            _ => PatternLayout::Calendar(translate_tokens(source)?),
        };

        Ok(Self {
            source: source.to_string(),
            layout,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Read `value` as a date under this pattern.
    ///
    /// Native dates pass through unchanged so a date written by the host is
    /// readable whatever pattern the calendar uses.
    pub fn parse_value(&self, value: &ExternalValue) -> Result<NaiveDateTime, ConversionError> {
        match (&self.layout, value) {
            (_, ExternalValue::Date(instant)) => Ok(*instant),
            (PatternLayout::Calendar(format), ExternalValue::Text(text)) => {
                NaiveDate::parse_from_str(text.trim(), format)
                    .map(|date| date.and_time(NaiveTime::MIN))
                    .map_err(|_| ConversionError::Unparseable {
                        input: text.clone(),
                        pattern: self.source.clone(),
                    })
            }
            (PatternLayout::UnixMillis | PatternLayout::UnixSeconds, ExternalValue::Timestamp(millis)) => {
                local_from_millis(*millis)
            }
            (PatternLayout::UnixMillis, ExternalValue::Text(text)) => {
                let millis = self.parse_integer(text)?;
                local_from_millis(millis)
            }
            (PatternLayout::UnixSeconds, ExternalValue::Text(text)) => {
                let seconds = self.parse_integer(text)?;
                let millis = seconds
                    .checked_mul(1000)
                    .ok_or(ConversionError::OutOfRange(seconds))?;
                local_from_millis(millis)
            }
            (_, other) => Err(ConversionError::NotDateLike { kind: other.kind() }),
        }
    }

    /// Write `date` under this pattern.
    #[must_use]
    pub fn format_date(&self, date: NormalizedDate) -> ExternalValue {
        match &self.layout {
            PatternLayout::Calendar(format) => {
                ExternalValue::Text(date.date().format(format).to_string())
            }
            PatternLayout::UnixMillis => ExternalValue::Timestamp(local_millis(date.at_midnight())),
            PatternLayout::UnixSeconds => {
                let seconds = local_millis(date.at_midnight()).div_euclid(1000);
                ExternalValue::Text(seconds.to_string())
            }
        }
    }

    fn parse_integer(&self, text: &str) -> Result<i64, ConversionError> {
        text.trim()
            .parse::<i64>()
            .map_err(|_| ConversionError::Unparseable {
                input: text.to_string(),
                pattern: self.source.clone(),
            })
    }
}

impl FromStr for DatePattern {
    type Err = PatternError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn push_literal(format: &mut String, literal: char) {
    if literal == '%' {
        format.push_str("%%");
    } else {
        format.push(literal);
    }
}

fn translate_tokens(source: &str) -> Result<String, PatternError> {
    let mut format = String::with_capacity(source.len() * 2);
    let (mut has_year, mut has_month, mut has_day) = (false, false, false);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            let mut closed = false;
            for literal in chars.by_ref() {
                if literal == ']' {
                    closed = true;
                    break;
                }
                push_literal(&mut format, literal);
            }
            if !closed {
                return Err(PatternError::UnclosedLiteral);
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut format, c);
            continue;
        }

        let mut run = 1;
        while chars.next_if_eq(&c).is_some() {
            run += 1;
        }

        let spec = match (c, run) {
            ('Y', 4) => {
                has_year = true;
                "%Y"
            }
            ('Y', 2) => {
                has_year = true;
                "%y"
            }
            ('M', 1) => {
                has_month = true;
                "%-m"
            }
            ('M', 2) => {
                has_month = true;
                "%m"
            }
            ('M', 3) => {
                has_month = true;
                "%b"
            }
            ('M', 4) => {
                has_month = true;
                "%B"
            }
            ('D', 1) => {
                has_day = true;
                "%-d"
            }
            ('D', 2) => {
                has_day = true;
                "%d"
            }
            _ => return Err(PatternError::UnsupportedToken(c.to_string().repeat(run))),
        };
        format.push_str(spec);
    }

    if !has_year {
        return Err(PatternError::MissingField("year"));
    }
    if !has_month {
        return Err(PatternError::MissingField("month"));
    }
    if !has_day {
        return Err(PatternError::MissingField("day"));
    }

    Ok(format)
}

fn local_from_millis(millis: i64) -> Result<NaiveDateTime, ConversionError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .ok_or(ConversionError::OutOfRange(millis))
}

fn local_millis(instant: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&instant)
        .earliest()
        .map_or_else(
            || instant.and_utc().timestamp_millis(),
            |local| local.timestamp_millis(),
        )
}

/// Host-supplied conversion functions.
///
/// A missing direction falls back to `pattern`, or to the absent rules when no
/// pattern is set either.
#[derive(Clone, Default)]
pub struct CustomFormatter {
    pub to_date: Option<ToDateFn>,
    pub from_date: Option<FromDateFn>,
    pub pattern: Option<DatePattern>,
}

impl CustomFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_to_date(
        mut self,
        convert: impl Fn(&ExternalValue, Option<&str>) -> ExternalValue + Send + Sync + 'static,
    ) -> Self {
        self.to_date = Some(Arc::new(convert));
        self
    }

    #[must_use]
    pub fn with_from_date(
        mut self,
        convert: impl Fn(NaiveDateTime, Option<&str>) -> ExternalValue + Send + Sync + 'static,
    ) -> Self {
        self.from_date = Some(Arc::new(convert));
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: DatePattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    fn pattern_source(&self) -> Option<&str> {
        self.pattern.as_ref().map(DatePattern::source)
    }
}

impl fmt::Debug for CustomFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFormatter")
            .field("to_date", &self.to_date.as_ref().map(|_| "<fn>"))
            .field("from_date", &self.from_date.as_ref().map(|_| "<fn>"))
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// How a calendar reads or writes its bound value.
#[derive(Debug, Clone, Default)]
pub enum FormatDescriptor {
    #[default]
    Absent,
    Pattern(DatePattern),
    Custom(CustomFormatter),
}

impl FormatDescriptor {
    pub fn pattern(source: &str) -> Result<Self, PatternError> {
        DatePattern::parse(source).map(Self::Pattern)
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<DatePattern> for FormatDescriptor {
    fn from(pattern: DatePattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<CustomFormatter> for FormatDescriptor {
    fn from(custom: CustomFormatter) -> Self {
        Self::Custom(custom)
    }
}

fn absent_to_date(value: &ExternalValue) -> Result<NaiveDateTime, ConversionError> {
    value
        .as_date()
        .ok_or(ConversionError::NotDateLike { kind: value.kind() })
}

/// Convert an external value into a date instant (time of day preserved).
pub fn to_date(
    value: &ExternalValue,
    descriptor: &FormatDescriptor,
) -> Result<NaiveDateTime, ConversionError> {
    match descriptor {
        FormatDescriptor::Absent => absent_to_date(value),
        FormatDescriptor::Pattern(pattern) => pattern.parse_value(value),
        FormatDescriptor::Custom(custom) => match (&custom.to_date, &custom.pattern) {
            (Some(convert), _) => {
                let produced = convert(value, custom.pattern_source());
                produced.as_date().ok_or(ConversionError::CustomNotDate {
                    kind: produced.kind(),
                })
            }
            (None, Some(pattern)) => pattern.parse_value(value),
            (None, None) => absent_to_date(value),
        },
    }
}

/// Convert a chosen day into the external representation.
#[must_use]
pub fn from_date(date: NormalizedDate, descriptor: &FormatDescriptor) -> ExternalValue {
    match descriptor {
        FormatDescriptor::Absent => ExternalValue::Date(date.at_midnight()),
        FormatDescriptor::Pattern(pattern) => pattern.format_date(date),
        FormatDescriptor::Custom(custom) => match (&custom.from_date, &custom.pattern) {
            (Some(convert), _) => convert(date.at_midnight(), custom.pattern_source()),
            (None, Some(pattern)) => pattern.format_date(date),
            (None, None) => ExternalValue::Date(date.at_midnight()),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use proptest::prelude::*;

    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NormalizedDate {
        NormalizedDate::from_ymd(year, month, day).expect("valid test date")
    }

    fn pattern(source: &str) -> FormatDescriptor {
        FormatDescriptor::pattern(source).expect("valid test pattern")
    }

    #[test]
    fn absent_descriptor_only_accepts_native_dates() {
        let instant = day(2024, 3, 15)
            .date()
            .and_hms_opt(13, 45, 0)
            .expect("valid instant");

        assert_eq!(
            to_date(&ExternalValue::Date(instant), &FormatDescriptor::Absent),
            Ok(instant)
        );
        assert_eq!(
            to_date(&ExternalValue::from("2024-03-15"), &FormatDescriptor::Absent),
            Err(ConversionError::NotDateLike { kind: "text" })
        );
        assert!(to_date(&ExternalValue::Timestamp(0), &FormatDescriptor::Absent).is_err());
    }

    #[test]
    fn absent_descriptor_writes_midnight_dates() {
        assert_eq!(
            from_date(day(2024, 3, 10), &FormatDescriptor::Absent),
            ExternalValue::Date(day(2024, 3, 10).at_midnight())
        );
    }

    #[test]
    fn day_first_pattern_reads_and_writes_text() {
        let descriptor = pattern("DD.MM.YYYY");

        assert_eq!(
            from_date(day(2024, 3, 5), &descriptor),
            ExternalValue::from("05.03.2024")
        );
        assert_eq!(
            to_date(&ExternalValue::from(" 05.03.2024 "), &descriptor),
            Ok(day(2024, 3, 5).at_midnight())
        );
    }

    #[test]
    fn unpadded_tokens_and_literals() {
        let descriptor = pattern("[Day] D/M YYYY");

        assert_eq!(
            from_date(day(2024, 3, 5), &descriptor),
            ExternalValue::from("Day 5/3 2024")
        );
        assert_eq!(
            to_date(&ExternalValue::from("Day 5/3 2024"), &descriptor),
            Ok(day(2024, 3, 5).at_midnight())
        );
    }

    #[test]
    fn month_names() {
        let descriptor = pattern("MMMM D, YYYY");
        assert_eq!(
            from_date(day(2024, 3, 5), &descriptor),
            ExternalValue::from("March 5, 2024")
        );

        let short = pattern("DD MMM YYYY");
        assert_eq!(
            to_date(&ExternalValue::from("05 Mar 2024"), &short),
            Ok(day(2024, 3, 5).at_midnight())
        );
    }

    #[test]
    fn pattern_rejects_text_that_does_not_match() {
        let descriptor = pattern("YYYY-MM-DD");

        assert_eq!(
            to_date(&ExternalValue::from("15/03/2024"), &descriptor),
            Err(ConversionError::Unparseable {
                input: "15/03/2024".to_string(),
                pattern: "YYYY-MM-DD".to_string(),
            })
        );
        assert!(to_date(&ExternalValue::from("2024-02-30"), &descriptor).is_err());
        assert_eq!(
            to_date(&ExternalValue::Empty, &descriptor),
            Err(ConversionError::NotDateLike { kind: "empty" })
        );
    }

    #[test]
    fn pattern_passes_native_dates_through() {
        let instant = day(2024, 3, 15)
            .date()
            .and_hms_opt(9, 30, 0)
            .expect("valid instant");

        assert_eq!(
            to_date(&ExternalValue::Date(instant), &pattern("DD.MM.YYYY")),
            Ok(instant)
        );
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert_eq!(DatePattern::parse(""), Err(PatternError::Empty));
        assert_eq!(
            DatePattern::parse("YYYY-MM-DD HH:mm"),
            Err(PatternError::UnsupportedToken("HH".to_string()))
        );
        assert_eq!(
            DatePattern::parse("YYYY-MM"),
            Err(PatternError::MissingField("day"))
        );
        assert_eq!(
            DatePattern::parse("[at YYYY-MM-DD"),
            Err(PatternError::UnclosedLiteral)
        );
        assert_eq!(
            DatePattern::parse("YYY-MM-DD"),
            Err(PatternError::UnsupportedToken("YYY".to_string()))
        );
    }

    #[test]
    fn two_digit_years_read_back_within_1970_to_2069() {
        let descriptor = pattern("DD.MM.YY");

        assert_eq!(
            from_date(day(1950, 1, 1), &descriptor),
            ExternalValue::from("01.01.50")
        );
        assert_eq!(
            to_date(&ExternalValue::from("01.01.50"), &descriptor),
            Ok(day(2050, 1, 1).at_midnight())
        );
        assert_eq!(
            to_date(&ExternalValue::from("01.01.70"), &descriptor),
            Ok(day(1970, 1, 1).at_midnight())
        );
        assert_eq!(
            to_date(&ExternalValue::from("31.12.69"), &descriptor),
            Ok(day(2069, 12, 31).at_midnight())
        );
    }

    #[test]
    fn percent_signs_are_literal() {
        let descriptor = pattern("YYYY%MM%DD");
        assert_eq!(
            from_date(day(2024, 3, 5), &descriptor),
            ExternalValue::from("2024%03%05")
        );
    }

    #[test]
    fn unix_millis_pattern_round_trips_local_midnight() {
        let descriptor = pattern("x");
        let written = from_date(day(2024, 3, 10), &descriptor);

        assert!(matches!(written, ExternalValue::Timestamp(_)));
        assert_eq!(to_date(&written, &descriptor), Ok(day(2024, 3, 10).at_midnight()));

        let ExternalValue::Timestamp(millis) = written else {
            unreachable!("x pattern writes timestamps");
        };
        assert_eq!(
            to_date(&ExternalValue::from(millis.to_string()), &descriptor),
            Ok(day(2024, 3, 10).at_midnight())
        );
    }

    #[test]
    fn unix_seconds_pattern_writes_text() {
        let descriptor = pattern("X");
        let written = from_date(day(2024, 3, 10), &descriptor);

        assert!(written.as_text().is_some());
        assert_eq!(to_date(&written, &descriptor), Ok(day(2024, 3, 10).at_midnight()));
    }

    #[derive(Debug)]
    struct Booking {
        starts: NaiveDate,
    }

    #[test]
    fn custom_functions_receive_the_pattern_source() {
        let custom = CustomFormatter::new()
            .with_pattern(DatePattern::parse("YYYY-MM-DD").expect("valid pattern"))
            .with_to_date(|value, pattern| {
                assert_eq!(pattern, Some("YYYY-MM-DD"));
                value
                    .downcast_custom::<Booking>()
                    .map(|booking| ExternalValue::from(booking.starts))
                    .unwrap_or_default()
            })
            .with_from_date(|instant, _| ExternalValue::custom(Booking {
                starts: instant.date(),
            }));
        let descriptor = FormatDescriptor::from(custom);

        let booking = ExternalValue::custom(Booking {
            starts: day(2024, 6, 1).date(),
        });
        assert_eq!(to_date(&booking, &descriptor), Ok(day(2024, 6, 1).at_midnight()));
        assert_eq!(
            to_date(&ExternalValue::from("2024-06-01"), &descriptor),
            Err(ConversionError::CustomNotDate { kind: "empty" })
        );

        let written = from_date(day(2024, 6, 2), &descriptor);
        assert_eq!(
            written.downcast_custom::<Booking>().map(|b| b.starts),
            Some(day(2024, 6, 2).date())
        );
    }

    #[test]
    fn custom_formatter_falls_back_for_missing_direction() {
        let custom = CustomFormatter::new()
            .with_pattern(DatePattern::parse("DD/MM/YYYY").expect("valid pattern"))
            .with_from_date(|instant, _| ExternalValue::from(instant.format("%d/%m/%Y").to_string()));
        let descriptor = FormatDescriptor::from(custom);

        assert_eq!(
            to_date(&ExternalValue::from("10/03/2024"), &descriptor),
            Ok(day(2024, 3, 10).at_midnight())
        );

        let bare = FormatDescriptor::from(CustomFormatter::new());
        assert_eq!(
            from_date(day(2024, 3, 10), &bare),
            ExternalValue::Date(day(2024, 3, 10).at_midnight())
        );
    }

    fn date_from_offset(offset: u64) -> NormalizedDate {
        NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|start| start.checked_add_days(Days::new(offset)))
            .map(NormalizedDate::from)
            .expect("offset stays in range")
    }

    proptest! {
        #[test]
        fn default_formatter_round_trip_is_stable(offset in 0u64..100_000) {
            let date = date_from_offset(offset);
            let descriptor = FormatDescriptor::Absent;

            let written = from_date(date, &descriptor);
            let read = to_date(&written, &descriptor).map(NormalizedDate::from);
            prop_assert_eq!(read, Ok(date));
            prop_assert_eq!(from_date(date, &descriptor), written);
        }

        #[test]
        fn pattern_round_trip_is_stable(offset in 0u64..100_000) {
            let date = date_from_offset(offset);
            let descriptor = pattern("DD.MM.YYYY");

            let written = from_date(date, &descriptor);
            let read = to_date(&written, &descriptor).map(NormalizedDate::from);
            prop_assert_eq!(read.map(|d| from_date(d, &descriptor)), Ok(written));
        }
    }
}
