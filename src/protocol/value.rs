//! Binary protocol value layouts
use crate::constant::{ColumnFlags, ColumnType, RESULT_SET_NULL_BITMAP_OFFSET};
use crate::error::{Error, Result, eyre};
use crate::protocol::primitive::*;
use crate::value::Temporal;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

// ============================================================================
// Temporal Types
// ============================================================================

/// DATE/DATETIME/TIMESTAMP - 4 bytes (ymd)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp4 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
}

/// DATE/DATETIME/TIMESTAMP - 7 bytes (ymd + hms)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp7 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// DATE/DATETIME/TIMESTAMP - 11 bytes (ymd + hms + microseconds)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Timestamp11 {
    pub year: U16LE,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

/// TIME - 8 bytes
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Time8 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// TIME - 12 bytes: negative (1), days (4 LE), hour, minute, second, microsecond (4 LE)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Time12 {
    pub is_negative: u8,
    pub days: U32LE,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: U32LE,
}

/// The compacted on-wire form of a DATE/DATETIME/TIMESTAMP
#[derive(Debug, Clone, Copy)]
pub enum TimestampLayout {
    Timestamp0,
    Timestamp4(Timestamp4),
    Timestamp7(Timestamp7),
    Timestamp11(Timestamp11),
}

impl TimestampLayout {
    /// Pick the shortest layout that keeps every non-zero component.
    ///
    /// `t` must already be truncated to the column precision.
    pub fn compact(t: &Temporal) -> Self {
        // hour is at most 23 for a valid datetime
        let hour = t.hour as u8;
        if t.microsecond != 0 {
            Self::Timestamp11(Timestamp11 {
                year: U16LE::new(t.year),
                month: t.month,
                day: t.day,
                hour,
                minute: t.minute,
                second: t.second,
                microsecond: U32LE::new(t.microsecond),
            })
        } else if t.has_time_of_day() {
            Self::Timestamp7(Timestamp7 {
                year: U16LE::new(t.year),
                month: t.month,
                day: t.day,
                hour,
                minute: t.minute,
                second: t.second,
            })
        } else if t.has_date() {
            Self::Timestamp4(Timestamp4 {
                year: U16LE::new(t.year),
                month: t.month,
                day: t.day,
            })
        } else {
            Self::Timestamp0
        }
    }

    /// Payload bytes after the length prefix
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Timestamp0 => &[],
            Self::Timestamp4(ts) => ts.as_bytes(),
            Self::Timestamp7(ts) => ts.as_bytes(),
            Self::Timestamp11(ts) => ts.as_bytes(),
        }
    }
}

/// The compacted on-wire form of a TIME
#[derive(Debug, Clone, Copy)]
pub enum TimeLayout {
    Time0,
    Time8(Time8),
    Time12(Time12),
}

impl TimeLayout {
    /// Pick the shortest layout for `t`, carrying whole days out of `hour`
    pub fn compact(t: &Temporal) -> Self {
        let days = u32::from(t.day) + t.hour / 24;
        let hour = (t.hour % 24) as u8;
        let is_negative = u8::from(t.negative);
        if t.microsecond != 0 {
            Self::Time12(Time12 {
                is_negative,
                days: U32LE::new(days),
                hour,
                minute: t.minute,
                second: t.second,
                microsecond: U32LE::new(t.microsecond),
            })
        } else if days != 0 || hour != 0 || t.minute != 0 || t.second != 0 {
            Self::Time8(Time8 {
                is_negative,
                days: U32LE::new(days),
                hour,
                minute: t.minute,
                second: t.second,
            })
        } else {
            Self::Time0
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Time0 => &[],
            Self::Time8(time) => time.as_bytes(),
            Self::Time12(time) => time.as_bytes(),
        }
    }
}

// ============================================================================
// NULL Bitmap
// ============================================================================

/// Number of bitmap bytes for a result set row of `column_count` columns
pub fn null_bitmap_len(column_count: usize) -> usize {
    (column_count + 7 + RESULT_SET_NULL_BITMAP_OFFSET) / 8
}

/// NULL bitmap of a binary result set row.
///
/// A set bit marks a NULL column. The first 2 bits are reserved.
#[derive(Debug, Clone, Copy)]
pub struct NullBitmap<'a> {
    bitmap: &'a [u8],
}

impl<'a> NullBitmap<'a> {
    pub fn for_result_set(bitmap: &'a [u8]) -> Self {
        Self { bitmap }
    }

    /// Check if the column at the given index is NULL
    pub fn is_null(&self, idx: usize) -> bool {
        let bit_pos = idx + RESULT_SET_NULL_BITMAP_OFFSET;
        match self.bitmap.get(bit_pos >> 3) {
            Some(byte) => byte & (1 << (bit_pos & 7)) != 0,
            None => false,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bitmap
    }
}

/// Mark column `idx` NULL in a result set bitmap
#[inline]
pub fn set_null(bitmap: &mut [u8], idx: usize) {
    let bit_pos = idx + RESULT_SET_NULL_BITMAP_OFFSET;
    if let Some(byte) = bitmap.get_mut(bit_pos >> 3) {
        *byte |= 1 << (bit_pos & 7);
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// A value read back from a binary row
#[derive(Debug, Clone, Copy)]
pub enum BinaryValue<'a> {
    Null,
    SignedInt(i64),
    UnsignedInt(u64),
    Float(f32),
    Double(f64),
    Timestamp0,
    Timestamp4(&'a Timestamp4),
    Timestamp7(&'a Timestamp7),
    Timestamp11(&'a Timestamp11),
    Time0,
    Time8(&'a Time8),
    Time12(&'a Time12),
    Byte(&'a [u8]),
}

fn truncated(what: &str) -> Error {
    Error::ProtocolContractViolation(eyre!("truncated binary {what} value"))
}

impl<'a> BinaryValue<'a> {
    /// Parse one non-NULL value of a binary row.
    ///
    /// Returns the parsed value and the remaining bytes.
    pub fn parse(
        column_type: ColumnType,
        flags: ColumnFlags,
        data: &'a [u8],
    ) -> Result<(Self, &'a [u8])> {
        let is_unsigned = flags.contains(ColumnFlags::UNSIGNED_FLAG);
        let int = |value: u64, signed: i64| {
            if is_unsigned {
                BinaryValue::UnsignedInt(value)
            } else {
                BinaryValue::SignedInt(signed)
            }
        };

        match column_type {
            ColumnType::MYSQL_TYPE_NULL => Ok((BinaryValue::Null, data)),
            ColumnType::MYSQL_TYPE_TINY => {
                let (val, rest) = read_int_1(data).ok_or_else(|| truncated("tiny"))?;
                Ok((int(u64::from(val), i64::from(val as i8)), rest))
            }
            ColumnType::MYSQL_TYPE_SHORT | ColumnType::MYSQL_TYPE_YEAR => {
                let (val, rest) = read_int_2(data).ok_or_else(|| truncated("short"))?;
                Ok((int(u64::from(val), i64::from(val as i16)), rest))
            }
            ColumnType::MYSQL_TYPE_INT24 | ColumnType::MYSQL_TYPE_LONG => {
                let (val, rest) = read_int_4(data).ok_or_else(|| truncated("long"))?;
                Ok((int(u64::from(val), i64::from(val as i32)), rest))
            }
            ColumnType::MYSQL_TYPE_LONGLONG => {
                let (val, rest) = read_int_8(data).ok_or_else(|| truncated("longlong"))?;
                Ok((int(val, val as i64), rest))
            }
            ColumnType::MYSQL_TYPE_FLOAT => {
                let (val, rest) = read_int_4(data).ok_or_else(|| truncated("float"))?;
                Ok((BinaryValue::Float(f32::from_bits(val)), rest))
            }
            ColumnType::MYSQL_TYPE_DOUBLE => {
                let (val, rest) = read_int_8(data).ok_or_else(|| truncated("double"))?;
                Ok((BinaryValue::Double(f64::from_bits(val)), rest))
            }
            ColumnType::MYSQL_TYPE_DATE
            | ColumnType::MYSQL_TYPE_DATETIME
            | ColumnType::MYSQL_TYPE_TIMESTAMP
            | ColumnType::MYSQL_TYPE_TIMESTAMP2
            | ColumnType::MYSQL_TYPE_DATETIME2
            | ColumnType::MYSQL_TYPE_NEWDATE => {
                let (len, rest) = read_int_1(data).ok_or_else(|| truncated("timestamp"))?;
                match len {
                    0 => Ok((BinaryValue::Timestamp0, rest)),
                    4 => {
                        let (ts, rest) = Timestamp4::ref_from_prefix(rest)
                            .map_err(|_| truncated("timestamp"))?;
                        Ok((BinaryValue::Timestamp4(ts), rest))
                    }
                    7 => {
                        let (ts, rest) = Timestamp7::ref_from_prefix(rest)
                            .map_err(|_| truncated("timestamp"))?;
                        Ok((BinaryValue::Timestamp7(ts), rest))
                    }
                    11 => {
                        let (ts, rest) = Timestamp11::ref_from_prefix(rest)
                            .map_err(|_| truncated("timestamp"))?;
                        Ok((BinaryValue::Timestamp11(ts), rest))
                    }
                    _ => Err(Error::ProtocolContractViolation(eyre!(
                        "invalid timestamp length: {}",
                        len
                    ))),
                }
            }
            ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => {
                let (len, rest) = read_int_1(data).ok_or_else(|| truncated("time"))?;
                match len {
                    0 => Ok((BinaryValue::Time0, rest)),
                    8 => {
                        let (time, rest) =
                            Time8::ref_from_prefix(rest).map_err(|_| truncated("time"))?;
                        Ok((BinaryValue::Time8(time), rest))
                    }
                    12 => {
                        let (time, rest) =
                            Time12::ref_from_prefix(rest).map_err(|_| truncated("time"))?;
                        Ok((BinaryValue::Time12(time), rest))
                    }
                    _ => Err(Error::ProtocolContractViolation(eyre!(
                        "invalid time length: {}",
                        len
                    ))),
                }
            }
            ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_BLOB
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_GEOMETRY
            | ColumnType::MYSQL_TYPE_JSON
            | ColumnType::MYSQL_TYPE_DECIMAL
            | ColumnType::MYSQL_TYPE_NEWDECIMAL
            | ColumnType::MYSQL_TYPE_ENUM
            | ColumnType::MYSQL_TYPE_SET
            | ColumnType::MYSQL_TYPE_BIT => {
                let (bytes, rest) = read_string_lenenc(data).ok_or_else(|| truncated("string"))?;
                Ok((BinaryValue::Byte(bytes), rest))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_compaction() {
        let layout = TimestampLayout::compact(&Temporal::date(2024, 12, 25));
        assert_eq!(layout.as_bytes(), &[0xE8, 0x07, 12, 25]);

        let layout = TimestampLayout::compact(&Temporal::datetime(2024, 12, 25, 15, 30, 45, 0));
        assert_eq!(layout.as_bytes(), &[0xE8, 0x07, 12, 25, 15, 30, 45]);

        let layout =
            TimestampLayout::compact(&Temporal::datetime(2024, 12, 25, 15, 30, 45, 123456));
        assert_eq!(layout.as_bytes().len(), 11);
        assert_eq!(&layout.as_bytes()[7..], &123456u32.to_le_bytes());

        let layout = TimestampLayout::compact(&Temporal::default());
        assert!(layout.as_bytes().is_empty());
    }

    #[test]
    fn test_time_compaction_carries_days() {
        let layout = TimeLayout::compact(&Temporal::time(true, 36, 30, 45, 0));
        // negative, 1 day, 12:30:45
        assert_eq!(layout.as_bytes(), &[1, 1, 0, 0, 0, 12, 30, 45]);

        let layout = TimeLayout::compact(&Temporal::time(false, 0, 0, 0, 5));
        assert_eq!(layout.as_bytes().len(), 12);

        let layout = TimeLayout::compact(&Temporal::time(false, 0, 0, 0, 0));
        assert!(layout.as_bytes().is_empty());
    }

    #[test]
    fn test_value_parse_signed_integers() {
        let data = [214u8]; // -42 as i8
        let (value, rest) =
            BinaryValue::parse(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::empty(), &data).unwrap();
        assert!(matches!(value, BinaryValue::SignedInt(-42)));
        assert!(rest.is_empty());

        let data = [0x60, 0x79, 0xFE, 0xFF]; // -100000 as i32 LE
        let (value, rest) =
            BinaryValue::parse(ColumnType::MYSQL_TYPE_LONG, ColumnFlags::empty(), &data).unwrap();
        assert!(matches!(value, BinaryValue::SignedInt(-100000)));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_value_parse_unsigned_with_remaining_data() {
        let data = [42u8, 0xFF, 0xFF];
        let (value, rest) =
            BinaryValue::parse(ColumnType::MYSQL_TYPE_TINY, ColumnFlags::UNSIGNED_FLAG, &data)
                .unwrap();
        assert!(matches!(value, BinaryValue::UnsignedInt(42)));
        assert_eq!(rest, &[0xFF, 0xFF]);
    }

    #[test]
    fn test_value_parse_time() {
        let data = [8u8, 1, 1, 0, 0, 0, 12, 30, 45];
        let (value, rest) =
            BinaryValue::parse(ColumnType::MYSQL_TYPE_TIME, ColumnFlags::empty(), &data).unwrap();
        let BinaryValue::Time8(time) = value else {
            panic!("Expected Time8 value");
        };
        assert_eq!(time.is_negative, 1);
        assert_eq!(time.days.get(), 1);
        assert_eq!((time.hour, time.minute, time.second), (12, 30, 45));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_value_parse_invalid_timestamp_length() {
        let data = [5u8, 0, 0, 0, 0, 0];
        assert!(
            BinaryValue::parse(ColumnType::MYSQL_TYPE_DATETIME, ColumnFlags::empty(), &data)
                .is_err()
        );
    }

    #[test]
    fn test_null_bitmap_result_set() {
        // Bit 2 (column 0) and bit 12 (column 10) are set
        let bitmap = [0b00000100, 0b00010000];
        let null_bitmap = NullBitmap::for_result_set(&bitmap);

        assert!(null_bitmap.is_null(0));
        assert!(!null_bitmap.is_null(1));
        assert!(!null_bitmap.is_null(2));
        assert!(null_bitmap.is_null(10));
        assert!(!null_bitmap.is_null(100));
    }

    #[test]
    fn test_null_bitmap_len_and_set() {
        assert_eq!(null_bitmap_len(1), 1);
        assert_eq!(null_bitmap_len(6), 1);
        assert_eq!(null_bitmap_len(7), 2);
        assert_eq!(null_bitmap_len(14), 2);
        assert_eq!(null_bitmap_len(15), 3);

        let mut bitmap = vec![0u8; null_bitmap_len(7)];
        set_null(&mut bitmap, 1);
        set_null(&mut bitmap, 6);
        assert_eq!(bitmap, [0b0000_1000, 0b0000_0001]);
    }
}
