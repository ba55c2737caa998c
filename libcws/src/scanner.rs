//! Forward maximum-match scanner with rule extension.
//!
//! The scanner works on one chunk of decoded text at a time (see
//! [`crate::symbols::chunk_end`]). At each position it emits, in order of
//! preference:
//!
//! 1. a whitespace run (attr `w`);
//! 2. the longest dictionary word of two or more characters, which may start
//!    with punctuation such as `《`;
//! 3. a single punctuation / symbol character (attr `w`);
//! 4. an ASCII letter/digit run (`m` when numeric, `en` otherwise);
//! 5. a single character with its dictionary sense, or `un`.
//!
//! Once the chunk is tokenized the rule table is consulted token by token
//! and may fold neighbouring tokens into one.

use libcws_core::attr::{ATTR_ENGLISH, ATTR_NUMERAL, ATTR_SYMBOL, ATTR_UNKNOWN};
use libcws_core::{best_sense, Config, Dictionary, Origin, RuleTable, Token};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::symbols;

static ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]+\.[0-9]+|[A-Za-z0-9]+)").expect("static regex"));

/// Scanner over a dictionary and rule table.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    dict: &'a Dictionary,
    rules: &'a RuleTable,
    max_word_chars: usize,
    unknown_weight: f32,
    alnum_weight: f32,
}

impl<'a> Scanner<'a> {
    pub fn new(dict: &'a Dictionary, rules: &'a RuleTable, config: &Config) -> Self {
        Self {
            dict,
            rules,
            max_word_chars: config.max_word_chars.max(1),
            unknown_weight: config.unknown_weight,
            alnum_weight: config.alnum_weight,
        }
    }

    /// Tokenize `text[start..end]` and apply the rules. Offsets are byte
    /// indices into `text`.
    pub fn scan(&self, text: &str, start: usize, end: usize) -> Vec<Token> {
        let raw = self.tokenize(text, start, end);
        self.apply_rules(raw)
    }

    /// Tokenize without consulting the rules.
    pub fn tokenize(&self, text: &str, start: usize, end: usize) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut i = start;
        while i < end {
            let token = self.next_token(text, i, end);
            i = token.end();
            tokens.push(token);
        }
        tokens
    }

    fn next_token(&self, text: &str, i: usize, end: usize) -> Token {
        let rest = &text[i..end];
        let ch = match rest.chars().next() {
            Some(c) => c,
            None => return Token::new("", i, ATTR_SYMBOL, 0.0, Origin::Symbol),
        };
        let ch_end = i + ch.len_utf8();

        if ch.is_whitespace() {
            let run = rest
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map_or(rest.len(), |(j, _)| j);
            return Token::new(&rest[..run], i, ATTR_SYMBOL, 0.0, Origin::Symbol);
        }

        let limit = rest
            .char_indices()
            .nth(self.max_word_chars)
            .map_or(end, |(j, _)| i + j);
        let matched = self.dict.longest_match(text, i, limit);
        if let Some(m) = matched.as_ref().filter(|m| m.end > ch_end) {
            if let Some(sense) = m.best_sense() {
                return Token::new(&text[i..m.end], i, sense.attr.clone(), sense.idf, Origin::Dictionary);
            }
        }
        if symbols::is_symbol(ch) {
            return Token::new(&text[i..ch_end], i, ATTR_SYMBOL, 0.0, Origin::Symbol);
        }

        if ch.is_ascii_alphanumeric() {
            if let Some(run) = ALNUM_RUN.find(rest) {
                let word = run.as_str();
                let attr = if word.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                    ATTR_NUMERAL
                } else {
                    ATTR_ENGLISH
                };
                return Token::new(word, i, attr, self.alnum_weight, Origin::Alnum);
            }
        }

        match matched.as_ref().and_then(|m| best_sense(&m.senses)) {
            Some(sense) => Token::new(&text[i..ch_end], i, sense.attr.clone(), sense.idf, Origin::Dictionary),
            None => Token::new(&text[i..ch_end], i, ATTR_UNKNOWN, self.unknown_weight, Origin::Unknown),
        }
    }

    /// Walk the chunk left to right; every token is offered to the rule
    /// table with the tokens already emitted behind it and the raw tokens
    /// ahead of it.
    pub fn apply_rules(&self, raw: Vec<Token>) -> Vec<Token> {
        if self.rules.is_empty() {
            return raw;
        }
        let mut out: Vec<Token> = Vec::with_capacity(raw.len());
        let mut idx = 0;
        while idx < raw.len() {
            let current = &raw[idx];
            let ahead = &raw[idx + 1..];
            match self.rules.check(&out, current, ahead) {
                Some(m) if m.span() > 0 || m.attr != current.attr => {
                    let mut parts: Vec<Token> = out.drain(out.len() - m.back..).collect();
                    parts.push(current.clone());
                    parts.extend(ahead[..m.forward].iter().cloned());
                    tracing::trace!(rule = m.rule, back = m.back, forward = m.forward, "rule merge");
                    out.push(merge(&parts, m.attr, m.weight));
                    idx += 1 + m.forward;
                }
                _ => {
                    out.push(current.clone());
                    idx += 1;
                }
            }
        }
        out
    }
}

fn merge(parts: &[Token], attr: String, weight: f32) -> Token {
    let offset = parts.first().map_or(0, |t| t.offset);
    let text: String = parts.iter().map(|t| t.text.as_str()).collect();
    Token::new(text, offset, attr, weight, Origin::Rule)
}
