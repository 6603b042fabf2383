use crate::constant::MAX_DATETIME_PRECISION;
use crate::error::{Error, Result};

/// A runtime column value handed to `store_field`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// NULL value
    Null,
    /// Signed integer (TINYINT, SMALLINT, MEDIUMINT, INT, BIGINT)
    SignedInt(i64),
    /// Unsigned integer (the UNSIGNED variants)
    UnsignedInt(u64),
    /// FLOAT
    Float(f32),
    /// DOUBLE
    Double(f64),
    /// DECIMAL, already rendered by the type system
    Decimal(DecimalStr<'a>),
    /// CHAR, VARCHAR, TEXT, BLOB, ENUM, SET, JSON, BIT, GEOMETRY.
    /// Bytes are in the column's charset.
    Bytes(&'a [u8]),
    /// DATE
    Date(Temporal),
    /// DATETIME, TIMESTAMP
    Datetime(Temporal),
    /// TIME
    Time(Temporal),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// The canonical text of a DECIMAL value: `[-]digits[.digits]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalStr<'a>(&'a str);

impl<'a> DecimalStr<'a> {
    pub fn new(s: &'a str) -> Result<Self> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits, None),
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if all_digits(int_part) && frac_part.is_none_or(all_digits) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidDecimal(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0.as_bytes()
    }
}

/// A structured temporal value (DATE, DATETIME, TIMESTAMP or TIME).
///
/// For TIME values `hour` may exceed 23 and `day` carries whole days; the total is
/// `day * 24 + hour` hours. Validity of the fields is the caller's business.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Temporal {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u32,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
    pub negative: bool,
}

impl Temporal {
    pub fn date(year: u16, month: u8, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            ..Default::default()
        }
    }

    pub fn datetime(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        microsecond: u32,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour: u32::from(hour),
            minute,
            second,
            microsecond,
            negative: false,
        }
    }

    /// A TIME value of `hours:minute:second.microsecond`; `hours` may exceed 24
    pub fn time(negative: bool, hours: u32, minute: u8, second: u8, microsecond: u32) -> Self {
        Self {
            hour: hours,
            minute,
            second,
            microsecond,
            negative,
            ..Default::default()
        }
    }

    /// Copy with the fractional second cut to `decimals` digits
    pub fn truncated(mut self, decimals: u8) -> Self {
        let decimals = decimals.min(MAX_DATETIME_PRECISION);
        let unit = 10u32.pow(u32::from(MAX_DATETIME_PRECISION - decimals));
        self.microsecond -= self.microsecond % unit;
        self
    }

    /// Copy with the time of day cleared
    pub fn date_part(self) -> Self {
        Self::date(self.year, self.month, self.day)
    }

    pub fn has_date(&self) -> bool {
        self.year != 0 || self.month != 0 || self.day != 0
    }

    pub fn has_time_of_day(&self) -> bool {
        self.hour != 0 || self.minute != 0 || self.second != 0
    }

    /// Total hours of a TIME value
    pub fn total_hours(&self) -> u32 {
        u32::from(self.day) * 24 + self.hour
    }
}

#[cfg(feature = "with-chrono")]
mod chrono_impl {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

    use super::Temporal;

    impl From<NaiveDate> for Temporal {
        fn from(value: NaiveDate) -> Self {
            Temporal::date(value.year() as u16, value.month() as u8, value.day() as u8)
        }
    }

    impl From<NaiveDateTime> for Temporal {
        fn from(value: NaiveDateTime) -> Self {
            Temporal::datetime(
                value.year() as u16,
                value.month() as u8,
                value.day() as u8,
                value.hour() as u8,
                value.minute() as u8,
                value.second() as u8,
                value.nanosecond() / 1000,
            )
        }
    }

    impl From<NaiveTime> for Temporal {
        fn from(value: NaiveTime) -> Self {
            Temporal::time(
                false,
                value.hour(),
                value.minute() as u8,
                value.second() as u8,
                value.nanosecond() / 1000,
            )
        }
    }

    impl From<TimeDelta> for Temporal {
        fn from(value: TimeDelta) -> Self {
            let negative = value < TimeDelta::zero();
            let value = value.abs();
            let secs = value.num_seconds();
            Temporal::time(
                negative,
                (secs / 3600) as u32,
                ((secs / 60) % 60) as u8,
                (secs % 60) as u8,
                value.subsec_nanos().unsigned_abs() / 1000,
            )
        }
    }
}

#[cfg(feature = "with-time")]
mod time_impl {
    use time::{Date, Duration, PrimitiveDateTime, Time};

    use super::Temporal;

    impl From<Date> for Temporal {
        fn from(value: Date) -> Self {
            Temporal::date(value.year() as u16, u8::from(value.month()), value.day())
        }
    }

    impl From<PrimitiveDateTime> for Temporal {
        fn from(value: PrimitiveDateTime) -> Self {
            Temporal::datetime(
                value.year() as u16,
                u8::from(value.month()),
                value.day(),
                value.hour(),
                value.minute(),
                value.second(),
                value.microsecond(),
            )
        }
    }

    impl From<Time> for Temporal {
        fn from(value: Time) -> Self {
            Temporal::time(
                false,
                u32::from(value.hour()),
                value.minute(),
                value.second(),
                value.microsecond(),
            )
        }
    }

    impl From<Duration> for Temporal {
        fn from(value: Duration) -> Self {
            let negative = value.is_negative();
            let value = value.abs();
            let secs = value.whole_seconds();
            Temporal::time(
                negative,
                (secs / 3600) as u32,
                ((secs / 60) % 60) as u8,
                (secs % 60) as u8,
                value.subsec_microseconds().unsigned_abs(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_str() {
        assert!(DecimalStr::new("0").is_ok());
        assert!(DecimalStr::new("-12.340").is_ok());
        assert!(DecimalStr::new("123456789012345678901234567890.5").is_ok());
        assert!(DecimalStr::new("").is_err());
        assert!(DecimalStr::new("-").is_err());
        assert!(DecimalStr::new("1.").is_err());
        assert!(DecimalStr::new(".5").is_err());
        assert!(DecimalStr::new("1e5").is_err());
        assert!(DecimalStr::new("+1").is_err());
    }

    #[test]
    fn test_temporal_truncated() {
        let t = Temporal::datetime(2024, 12, 25, 15, 30, 45, 123456);
        assert_eq!(t.truncated(6).microsecond, 123456);
        assert_eq!(t.truncated(3).microsecond, 123000);
        assert_eq!(t.truncated(0).microsecond, 0);
        // precision above 6 keeps every digit
        assert_eq!(t.truncated(39).microsecond, 123456);
    }

    #[test]
    fn test_temporal_total_hours() {
        let mut t = Temporal::time(false, 30, 0, 0, 0);
        assert_eq!(t.total_hours(), 30);
        t.day = 2;
        assert_eq!(t.total_hours(), 78);
    }
}
