//! Attribute-filtered retrieval over a token stream.

use libcws_core::{AttrFilter, Token};

/// Every token whose attribute passes `filter`, in scan order.
pub fn words<I>(tokens: I, filter: &AttrFilter) -> Vec<Token>
where
    I: IntoIterator<Item = Token>,
{
    tokens.into_iter().filter(|t| filter.matches(&t.attr)).collect()
}

/// Whether any token passes `filter`. Stops consuming at the first match.
pub fn has_words<I>(tokens: I, filter: &AttrFilter) -> bool
where
    I: IntoIterator<Item = Token>,
{
    tokens.into_iter().any(|t| filter.matches(&t.attr))
}
