//! Text encodings accepted by the segmenter.
//!
//! Only `utf8` and `gbk` are supported. The engine works on decoded `str`
//! data; the charset is used to decode submitted bytes and dictionary/rule
//! files, and to report token offsets in the units of the submitted text.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CwsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Utf8,
    Gbk,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf8",
            Charset::Gbk => "gbk",
        }
    }

    /// Decode `bytes` strictly; malformed input is an error, never replaced.
    ///
    /// The gbk decoder also accepts four-byte GB18030 sequences. Those decode
    /// to characters GBK cannot encode back, so they are rejected as well.
    pub fn decode<'a>(self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| CwsError::Decode(e.to_string())),
            Charset::Gbk => {
                let text = encoding_rs::GBK
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .ok_or_else(|| CwsError::Decode("malformed gbk sequence".to_string()))?;
                self.check(&text)?;
                Ok(text)
            }
        }
    }

    /// Fail with `Decode` if `text` has a character this charset cannot
    /// encode. Offsets are only meaningful for text that round-trips.
    pub fn check(self, text: &str) -> Result<()> {
        if self == Charset::Utf8 || text.is_ascii() {
            return Ok(());
        }
        let (_, _, unmappable) = encoding_rs::GBK.encode(text);
        if !unmappable {
            return Ok(());
        }
        let mut buf = [0u8; 4];
        let bad = text
            .chars()
            .find(|c| encoding_rs::GBK.encode(c.encode_utf8(&mut buf)).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Err(CwsError::Decode(format!(
            "U+{:04X} is not representable in gbk",
            bad as u32
        )))
    }

    /// Number of bytes `text` occupies once encoded in this charset.
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            Charset::Utf8 => text.len(),
            Charset::Gbk => {
                if text.is_ascii() {
                    return text.len();
                }
                let (bytes, _, _) = encoding_rs::GBK.encode(text);
                bytes.len()
            }
        }
    }
}

impl FromStr for Charset {
    type Err = CwsError;

    /// Accepts `utf8` and `gbk` (case-insensitive). `utf-8` is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" => Ok(Charset::Utf8),
            "gbk" => Ok(Charset::Gbk),
            _ => Err(CwsError::InvalidCharset(s.to_string())),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_names_only() {
        assert_eq!("utf8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("GBK".parse::<Charset>().unwrap(), Charset::Gbk);
        assert!(matches!(
            "utf-8".parse::<Charset>(),
            Err(CwsError::InvalidCharset(_))
        ));
        assert!("big5".parse::<Charset>().is_err());
    }

    #[test]
    fn gbk_roundtrip_and_lengths() {
        // "中国" in GBK
        let bytes = [0xD6, 0xD0, 0xB9, 0xFA];
        let text = Charset::Gbk.decode(&bytes).unwrap();
        assert_eq!(text, "中国");
        assert_eq!(Charset::Gbk.encoded_len("中国"), 4);
        assert_eq!(Charset::Gbk.encoded_len("a中"), 3);
        assert_eq!(Charset::Utf8.encoded_len("中国"), 6);
    }

    #[test]
    fn four_byte_sequences_are_not_gbk() {
        // GB18030 encoding of U+0080
        let bytes = [0x81, 0x30, 0x81, 0x30, b'a'];
        assert!(matches!(Charset::Gbk.decode(&bytes), Err(CwsError::Decode(_))));
        assert!(Charset::Gbk.check("\u{80}a").is_err());
        assert!(Charset::Gbk.check("中国a").is_ok());
        assert!(Charset::Utf8.check("\u{80}a").is_ok());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            Charset::Utf8.decode(&[0xFF, 0xFE]),
            Err(CwsError::Decode(_))
        ));
    }
}
