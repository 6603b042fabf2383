//! Character sets known to the encoder and the conversion of string values into the
//! session's result character set.

use std::borrow::Cow;

use bitflags::bitflags;
use encoding_rs::{EncoderResult, Encoding};

use crate::error::Result;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharsetState: u32 {
        /// Primary collation of its character set
        const PRIMARY = 0x0020;
        /// Binary sort order
        const BINSORT = 0x0010;
        /// Unicode character set
        const UNICODE = 0x0080;
        /// ASCII characters are not encoded as themselves (UCS-2, UTF-16)
        const NONASCII = 0x2000;
    }
}

/// Coarse classification of the characters a string may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repertoire {
    /// Plain 7-bit ASCII only
    Ascii,
    /// Extended, character-set specific range
    Extended,
    /// Any Unicode 3.0 character
    Unicode30,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Binary,
    Ascii,
    Utf8,
    /// Big-endian, BMP only
    Ucs2,
    /// Big-endian with surrogate pairs
    Utf16,
    Legacy(Legacy),
}

/// Single and multi-byte charsets transcoded through `encoding_rs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Legacy {
    Latin1,
    Cp1251,
    Koi8r,
    Greek,
    Hebrew,
    Sjis,
    Ujis,
    Euckr,
    Gbk,
    Big5,
}

impl Legacy {
    fn encoding(self) -> &'static Encoding {
        match self {
            // MySQL's latin1 is cp1252
            Legacy::Latin1 => encoding_rs::WINDOWS_1252,
            Legacy::Cp1251 => encoding_rs::WINDOWS_1251,
            Legacy::Koi8r => encoding_rs::KOI8_R,
            Legacy::Greek => encoding_rs::ISO_8859_7,
            Legacy::Hebrew => encoding_rs::ISO_8859_8,
            Legacy::Sjis => encoding_rs::SHIFT_JIS,
            Legacy::Ujis => encoding_rs::EUC_JP,
            Legacy::Euckr => encoding_rs::EUC_KR,
            Legacy::Gbk => encoding_rs::GBK,
            Legacy::Big5 => encoding_rs::BIG5,
        }
    }
}

/// A character set together with one of its collations.
///
/// `number` is the collation id sent in column definitions.
#[derive(Debug)]
pub struct Charset {
    pub number: u16,
    /// Character set name, shared by all collations of the set
    pub csname: &'static str,
    /// Collation name
    pub name: &'static str,
    /// Maximum bytes per character
    pub mbmaxlen: u32,
    pub state: CharsetState,
    codec: Codec,
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for Charset {}

impl Charset {
    pub fn is_binary(&self) -> bool {
        self.codec == Codec::Binary
    }

    pub fn is_nonascii(&self) -> bool {
        self.state.contains(CharsetState::NONASCII)
    }

    /// Two collations of the same character set encode text identically
    pub fn same_charset(&self, other: &Charset) -> bool {
        self.csname == other.csname
    }

    /// Length of the longest prefix of `bytes`, encoded in this charset, that fits in `max`
    /// bytes without splitting a character
    pub fn truncate_encoded(&self, bytes: &[u8], max: usize) -> usize {
        if bytes.len() <= max {
            return bytes.len();
        }
        match self.codec {
            Codec::Binary | Codec::Ascii => max,
            Codec::Utf8 => {
                let mut end = max;
                while end > 0 && bytes[end] & 0xC0 == 0x80 {
                    end -= 1;
                }
                end
            }
            Codec::Ucs2 => max & !1,
            Codec::Utf16 => {
                let end = max & !1;
                // never keep a high surrogate without its low half
                if end >= 2 && (0xD8..=0xDB).contains(&bytes[end - 2]) {
                    end - 2
                } else {
                    end
                }
            }
            Codec::Legacy(legacy) => {
                let shortest = max.saturating_sub(self.mbmaxlen as usize - 1);
                (shortest..=max)
                    .rev()
                    .find(|&end| {
                        legacy
                            .encoding()
                            .decode_without_bom_handling_and_without_replacement(&bytes[..end])
                            .is_some()
                    })
                    .unwrap_or(max)
            }
        }
    }

    /// The widest repertoire a value in this charset can carry
    pub fn repertoire(&self) -> Repertoire {
        match self.codec {
            Codec::Ascii => Repertoire::Ascii,
            Codec::Utf8 | Codec::Ucs2 | Codec::Utf16 => Repertoire::Unicode30,
            Codec::Binary | Codec::Legacy(_) => Repertoire::Extended,
        }
    }
}

macro_rules! charset {
    (
        $ident:ident,
        $number:expr,
        $csname:expr,
        $name:expr,
        $mbmaxlen:expr,
        $state:expr,
        $codec:expr $(,)?
    ) => {
        pub static $ident: Charset = Charset {
            number: $number,
            csname: $csname,
            name: $name,
            mbmaxlen: $mbmaxlen,
            state: $state,
            codec: $codec,
        };
    };
}

const PRIMARY: CharsetState = CharsetState::PRIMARY;
const PRIMARY_BIN: CharsetState = CharsetState::PRIMARY.union(CharsetState::BINSORT);
const UNICODE: CharsetState = CharsetState::PRIMARY.union(CharsetState::UNICODE);
const UNICODE_NONASCII: CharsetState = UNICODE.union(CharsetState::NONASCII);

charset!(BIG5_CHINESE_CI, 1, "big5", "big5_chinese_ci", 2, PRIMARY, Codec::Legacy(Legacy::Big5));
charset!(
    KOI8R_GENERAL_CI,
    7,
    "koi8r",
    "koi8r_general_ci",
    1,
    PRIMARY,
    Codec::Legacy(Legacy::Koi8r),
);
charset!(
    LATIN1_SWEDISH_CI,
    8,
    "latin1",
    "latin1_swedish_ci",
    1,
    PRIMARY,
    Codec::Legacy(Legacy::Latin1),
);
charset!(ASCII_GENERAL_CI, 11, "ascii", "ascii_general_ci", 1, PRIMARY, Codec::Ascii);
charset!(UJIS_JAPANESE_CI, 12, "ujis", "ujis_japanese_ci", 3, PRIMARY, Codec::Legacy(Legacy::Ujis));
charset!(SJIS_JAPANESE_CI, 13, "sjis", "sjis_japanese_ci", 2, PRIMARY, Codec::Legacy(Legacy::Sjis));
charset!(
    HEBREW_GENERAL_CI,
    16,
    "hebrew",
    "hebrew_general_ci",
    1,
    PRIMARY,
    Codec::Legacy(Legacy::Hebrew),
);
charset!(EUCKR_KOREAN_CI, 19, "euckr", "euckr_korean_ci", 2, PRIMARY, Codec::Legacy(Legacy::Euckr));
charset!(
    GREEK_GENERAL_CI,
    25,
    "greek",
    "greek_general_ci",
    1,
    PRIMARY,
    Codec::Legacy(Legacy::Greek),
);
charset!(GBK_CHINESE_CI, 28, "gbk", "gbk_chinese_ci", 2, PRIMARY, Codec::Legacy(Legacy::Gbk));
charset!(UTF8MB3_GENERAL_CI, 33, "utf8mb3", "utf8mb3_general_ci", 3, UNICODE, Codec::Utf8);
charset!(UCS2_GENERAL_CI, 35, "ucs2", "ucs2_general_ci", 2, UNICODE_NONASCII, Codec::Ucs2);
charset!(UTF8MB4_GENERAL_CI, 45, "utf8mb4", "utf8mb4_general_ci", 4, UNICODE, Codec::Utf8);
charset!(
    UTF8MB4_BIN,
    46,
    "utf8mb4",
    "utf8mb4_bin",
    4,
    CharsetState::UNICODE.union(CharsetState::BINSORT),
    Codec::Utf8,
);
charset!(
    LATIN1_BIN,
    47,
    "latin1",
    "latin1_bin",
    1,
    CharsetState::BINSORT,
    Codec::Legacy(Legacy::Latin1),
);
charset!(
    CP1251_GENERAL_CI,
    51,
    "cp1251",
    "cp1251_general_ci",
    1,
    PRIMARY,
    Codec::Legacy(Legacy::Cp1251),
);
charset!(UTF16_GENERAL_CI, 54, "utf16", "utf16_general_ci", 4, UNICODE_NONASCII, Codec::Utf16);
charset!(BINARY, 63, "binary", "binary", 1, PRIMARY_BIN, Codec::Binary);
charset!(
    UTF8MB3_BIN,
    83,
    "utf8mb3",
    "utf8mb3_bin",
    3,
    CharsetState::UNICODE.union(CharsetState::BINSORT),
    Codec::Utf8,
);
charset!(
    UTF8MB4_0900_AI_CI,
    255,
    "utf8mb4",
    "utf8mb4_0900_ai_ci",
    4,
    CharsetState::UNICODE,
    Codec::Utf8,
);

/// Charset of identifiers, error messages and other server-generated text
pub static SYSTEM_CHARSET: &Charset = &UTF8MB3_GENERAL_CI;

/// Every known collation
pub static CHARSETS: &[&Charset] = &[
    &BIG5_CHINESE_CI,
    &KOI8R_GENERAL_CI,
    &LATIN1_SWEDISH_CI,
    &ASCII_GENERAL_CI,
    &UJIS_JAPANESE_CI,
    &SJIS_JAPANESE_CI,
    &HEBREW_GENERAL_CI,
    &EUCKR_KOREAN_CI,
    &GREEK_GENERAL_CI,
    &GBK_CHINESE_CI,
    &UTF8MB3_GENERAL_CI,
    &UCS2_GENERAL_CI,
    &UTF8MB4_GENERAL_CI,
    &UTF8MB4_BIN,
    &LATIN1_BIN,
    &CP1251_GENERAL_CI,
    &UTF16_GENERAL_CI,
    &BINARY,
    &UTF8MB3_BIN,
    &UTF8MB4_0900_AI_CI,
];

/// Look up a collation by its id
pub fn by_number(number: u16) -> Option<&'static Charset> {
    CHARSETS.iter().copied().find(|cs| cs.number == number)
}

/// Look up a collation by name, or a character set name (resolving to its primary collation).
///
/// `utf8` is accepted as an alias of `utf8mb3`.
pub fn by_name(name: &str) -> Option<&'static Charset> {
    let name = name.to_ascii_lowercase();
    let name = match name.strip_prefix("utf8_") {
        Some(rest) => format!("utf8mb3_{rest}"),
        None if name == "utf8" => "utf8mb3".to_string(),
        None => name,
    };
    CHARSETS
        .iter()
        .copied()
        .find(|cs| cs.name == name)
        .or_else(|| {
            CHARSETS
                .iter()
                .copied()
                .find(|cs| cs.csname == name && cs.state.contains(CharsetState::PRIMARY))
        })
}

/// Whether a value in `from` must be transcoded before it is sent in `to`.
///
/// `to` is `None` when the client disabled result conversion
/// (`SET character_set_results = NULL`).
pub fn needs_conversion(from: &Charset, from_repertoire: Repertoire, to: Option<&Charset>) -> bool {
    let Some(to) = to else {
        return false;
    };
    !from.same_charset(to)
        && !from.is_binary()
        && !to.is_binary()
        && (from_repertoire != Repertoire::Ascii || from.is_nonascii() || to.is_nonascii())
}

/// Transcode `from_bytes` from `from` into `to`, appending to `out`.
///
/// Malformed input and characters `to` cannot represent are replaced with `?`. Returns the
/// number of replacements; conversion itself never fails, only growing `out` can.
pub fn convert(
    from_bytes: &[u8],
    from: &Charset,
    to: &Charset,
    out: &mut Vec<u8>,
) -> Result<usize> {
    if from.is_binary() || to.is_binary() {
        out.try_reserve(from_bytes.len())?;
        out.extend_from_slice(from_bytes);
        return Ok(0);
    }
    let (text, decode_errors) = decode(from_bytes, from.codec);
    let encode_errors = encode(&text, to.codec, out)?;
    Ok(decode_errors + encode_errors)
}

fn decode(bytes: &[u8], codec: Codec) -> (Cow<'_, str>, usize) {
    match codec {
        Codec::Utf8 => match simdutf8::basic::from_utf8(bytes) {
            Ok(s) => (Cow::Borrowed(s), 0),
            Err(_) => {
                let mut errors = 0;
                let mut s = String::with_capacity(bytes.len());
                for chunk in bytes.utf8_chunks() {
                    s.push_str(chunk.valid());
                    if !chunk.invalid().is_empty() {
                        s.push('?');
                        errors += 1;
                    }
                }
                (Cow::Owned(s), errors)
            }
        },
        Codec::Ascii | Codec::Binary => {
            if bytes.is_ascii() {
                (std::str::from_utf8(bytes).map(Cow::Borrowed).unwrap_or_default(), 0)
            } else {
                let mut errors = 0;
                let s = bytes
                    .iter()
                    .map(|&b| {
                        if b.is_ascii() {
                            b as char
                        } else {
                            errors += 1;
                            '?'
                        }
                    })
                    .collect();
                (Cow::Owned(s), errors)
            }
        }
        Codec::Ucs2 | Codec::Utf16 => {
            let (s, had_errors) = encoding_rs::UTF_16BE.decode_without_bom_handling(bytes);
            (s, usize::from(had_errors))
        }
        Codec::Legacy(legacy) => {
            let (s, had_errors) = legacy.encoding().decode_without_bom_handling(bytes);
            (s, usize::from(had_errors))
        }
    }
}

fn encode(text: &str, codec: Codec, out: &mut Vec<u8>) -> Result<usize> {
    let mut errors = 0;
    match codec {
        Codec::Utf8 | Codec::Binary => {
            out.try_reserve(text.len())?;
            out.extend_from_slice(text.as_bytes());
        }
        Codec::Ascii => {
            out.try_reserve(text.len())?;
            for c in text.chars() {
                if c.is_ascii() {
                    out.push(c as u8);
                } else {
                    out.push(b'?');
                    errors += 1;
                }
            }
        }
        Codec::Ucs2 => {
            out.try_reserve(text.len() * 2)?;
            for c in text.chars() {
                let unit = match u16::try_from(u32::from(c)) {
                    Ok(unit) => unit,
                    Err(_) => {
                        errors += 1;
                        u16::from(b'?')
                    }
                };
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        Codec::Utf16 => {
            out.try_reserve(text.len() * 2)?;
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
        Codec::Legacy(legacy) => {
            let mut encoder = legacy.encoding().new_encoder();
            let mut remaining = text;
            loop {
                let needed = encoder
                    .max_buffer_length_from_utf8_without_replacement(remaining.len())
                    .unwrap_or(remaining.len() * 4);
                out.try_reserve(needed)?;
                let (result, read) =
                    encoder.encode_from_utf8_to_vec_without_replacement(remaining, out, true);
                remaining = &remaining[read..];
                match result {
                    EncoderResult::InputEmpty => break,
                    EncoderResult::OutputFull => continue,
                    EncoderResult::Unmappable(_) => {
                        out.try_reserve(1)?;
                        out.push(b'?');
                        errors += 1;
                    }
                }
            }
        }
    }
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(by_number(63).map(|cs| cs.name), Some("binary"));
        assert_eq!(by_name("UTF8MB4").map(|cs| cs.number), Some(45));
        assert_eq!(by_name("utf8").map(|cs| cs.number), Some(33));
        assert_eq!(by_name("utf8_bin").map(|cs| cs.number), Some(83));
        assert_eq!(by_name("latin1_bin").map(|cs| cs.number), Some(47));
        assert!(by_name("klingon").is_none());
    }

    #[test]
    fn test_every_collation_has_a_primary() {
        for cs in CHARSETS {
            assert!(
                by_name(cs.csname).is_some(),
                "no primary collation for {}",
                cs.csname
            );
        }
    }
}
