//! Top-keyword ranking.
//!
//! Weights of every occurrence of a word are summed; the result is sorted by
//! total weight, heaviest first, with ties kept in order of first
//! occurrence.

use std::cmp::Ordering;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use libcws_core::{AttrFilter, RuleTable, Token};

/// One ranked keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedWord {
    pub word: String,
    /// Attribute of the first occurrence.
    pub attr: String,
    /// Sum of the weights of all occurrences.
    pub weight: f32,
    pub times: usize,
}

/// Rank the words of `tokens`. Symbols and the rule table's `nostats` words
/// are never counted.
pub fn rank<I>(tokens: I, rules: &RuleTable, filter: &AttrFilter, limit: usize) -> Vec<RankedWord>
where
    I: IntoIterator<Item = Token>,
{
    if limit == 0 {
        return Vec::new();
    }
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut ranked: Vec<RankedWord> = Vec::new();
    for t in tokens {
        if t.is_symbol() || !filter.matches(&t.attr) || rules.is_nostats(&t.text) {
            continue;
        }
        match index.get(&t.text) {
            Some(&i) => {
                ranked[i].weight += t.weight;
                ranked[i].times += 1;
            }
            None => {
                index.insert(t.text.clone(), ranked.len());
                ranked.push(RankedWord {
                    word: t.text,
                    attr: t.attr,
                    weight: t.weight,
                    times: 1,
                });
            }
        }
    }
    // stable sort keeps first occurrence order among equal weights
    ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}
