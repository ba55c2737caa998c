//! Segmented word units.

use serde::{Deserialize, Serialize};

use crate::attr::{ATTR_SYMBOL, ATTR_UNKNOWN};

/// How a token came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Longest dictionary match.
    Dictionary,
    /// Merged by a rule.
    Rule,
    /// Single character without dictionary entry.
    Unknown,
    /// ASCII letter/digit run.
    Alnum,
    /// Punctuation, symbols and whitespace.
    Symbol,
    /// Extra token emitted by a multi mode (short words, duality pairs, single chars).
    Expanded,
}

/// A segmented word.
///
/// `offset` and `len` are byte units of the submitted text. Inside the
/// scanner they are UTF-8 byte indices; the session converts them to the
/// submitted charset before handing tokens out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub offset: usize,
    pub len: usize,
    pub attr: String,
    pub weight: f32,
    pub origin: Origin,
}

impl Token {
    pub fn new<T: Into<String>, A: Into<String>>(
        text: T,
        offset: usize,
        attr: A,
        weight: f32,
        origin: Origin,
    ) -> Self {
        let text = text.into();
        Token {
            len: text.len(),
            text,
            offset,
            attr: attr.into(),
            weight,
            origin,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_symbol(&self) -> bool {
        self.attr == ATTR_SYMBOL
    }

    /// An unknown single character that rules may absorb.
    pub fn is_free_char(&self) -> bool {
        self.origin == Origin::Unknown && self.attr == ATTR_UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_helpers() {
        let t = Token::new("中国", 3, "ns", 2.5, Origin::Dictionary);
        assert_eq!(t.len, 6);
        assert_eq!(t.end(), 9);
        assert_eq!(t.char_len(), 2);
        assert!(!t.is_symbol());
        assert!(!t.is_free_char());

        let u = Token::new("啊", 0, ATTR_UNKNOWN, 0.0, Origin::Unknown);
        assert!(u.is_free_char());
    }
}
