//! Part-of-speech attribute tags and the attribute filter mini-language.
//!
//! Filters are written as a comma-separated list of tags (`"n,v,nr"`). A
//! leading `~` turns the allow-list into a deny-list (`"~w,un"`). An empty
//! filter accepts every tag.

use std::str::FromStr;

use ahash::AHashSet;

use crate::error::CwsError;

/// Single character with no dictionary entry.
pub const ATTR_UNKNOWN: &str = "un";
/// Punctuation, symbols and whitespace.
pub const ATTR_SYMBOL: &str = "w";
/// ASCII letter run.
pub const ATTR_ENGLISH: &str = "en";
/// Numerals (ASCII digit runs, and the usual target of numeral rules).
pub const ATTR_NUMERAL: &str = "m";
/// Attribute given to text dictionary lines that omit one.
pub const ATTR_DEFAULT: &str = "n";

/// Parsed attribute allow/deny list.
#[derive(Debug, Clone, Default)]
pub struct AttrFilter {
    attrs: AHashSet<String>,
    negated: bool,
}

impl AttrFilter {
    /// Filter accepting every attribute.
    pub fn any() -> Self {
        Self {
            attrs: AHashSet::new(),
            negated: true,
        }
    }

    /// Allow-list of the given tags.
    pub fn allow<I, S>(attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attrs: attrs.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// Deny-list of the given tags.
    pub fn deny<I, S>(attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attrs: attrs.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// Parse the textual form. Never fails; unknown tags simply never match.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        let (negated, body) = match spec.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };
        let attrs: AHashSet<String> = body
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if attrs.is_empty() {
            return Self::any();
        }
        Self { attrs, negated }
    }

    pub fn matches(&self, attr: &str) -> bool {
        self.attrs.contains(attr) != self.negated
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// True when the filter accepts everything.
    pub fn is_any(&self) -> bool {
        self.negated && self.attrs.is_empty()
    }
}

impl FromStr for AttrFilter {
    type Err = CwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AttrFilter::parse(s))
    }
}
