//! Output policies applied to each scanned chunk.
//!
//! Multi-granularity expansions are emitted *alongside* the scanned tokens:
//! a consumer that keeps only non-overlapping tokens still sees the plain
//! segmentation. After expansion the chunk is ordered by offset (longer
//! span first on ties), identical spans are collapsed, and punctuation is
//! dropped when ignoring it.

use libcws_core::attr::ATTR_UNKNOWN;
use libcws_core::utils::is_cjk;
use libcws_core::{best_sense, Config, Dictionary, MultiMode, Origin, Token};

#[derive(Debug, Clone, Copy)]
pub struct ModeProcessor<'a> {
    dict: &'a Dictionary,
    multi: MultiMode,
    duality: bool,
    ignore_punctuation: bool,
    zmain_min_weight: f32,
    unknown_weight: f32,
}

impl<'a> ModeProcessor<'a> {
    pub fn new(dict: &'a Dictionary, config: &Config) -> Self {
        Self {
            dict,
            multi: config.multi,
            duality: config.duality_enabled(),
            ignore_punctuation: config.ignore_punctuation,
            zmain_min_weight: config.zmain_min_weight,
            unknown_weight: config.unknown_weight,
        }
    }

    /// True when `apply` returns its input untouched.
    pub fn is_passthrough(&self) -> bool {
        !self.ignore_punctuation && !self.duality && !self.multi.short && !self.multi.zmain && !self.multi.zall
    }

    pub fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        if self.is_passthrough() {
            return tokens;
        }
        let mut extra = Vec::new();
        if self.multi.short {
            for t in tokens.iter().filter(|t| t.origin == Origin::Dictionary && t.char_len() >= 3) {
                self.short_words(t, &mut extra);
            }
        }
        if self.duality {
            self.duality_pairs(&tokens, &mut extra);
        }
        if self.multi.zmain || self.multi.zall {
            for t in tokens
                .iter()
                .filter(|t| matches!(t.origin, Origin::Dictionary | Origin::Rule) && t.char_len() >= 2)
            {
                self.inner_chars(t, &mut extra);
            }
        }

        let mut out = tokens;
        out.extend(extra);
        if self.ignore_punctuation {
            out.retain(|t| !t.is_symbol());
        }
        // stable: scanned tokens stay ahead of expansions with the same span
        out.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.len.cmp(&a.len)));
        out.dedup_by(|later, earlier| later.offset == earlier.offset && later.len == earlier.len);
        out
    }

    /// Re-segment the interior of a long word with words at most one
    /// character shorter than it.
    fn short_words(&self, word: &Token, out: &mut Vec<Token>) {
        let text = word.text.as_str();
        let cap = word.char_len() - 1;
        let mut i = 0;
        while i < text.len() {
            let limit = text[i..].char_indices().nth(cap).map_or(text.len(), |(j, _)| i + j);
            let step = text[i..].chars().next().map_or(1, char::len_utf8);
            match self.dict.longest_match(text, i, limit) {
                Some(m) => {
                    if let Some(sense) = m.best_sense() {
                        out.push(Token::new(
                            &text[i..m.end],
                            word.offset + i,
                            sense.attr.clone(),
                            sense.idf,
                            Origin::Expanded,
                        ));
                    }
                    i = m.end;
                }
                None => i += step,
            }
        }
    }

    /// Overlapping pairs over every run of two or more unknown CJK characters.
    fn duality_pairs(&self, tokens: &[Token], out: &mut Vec<Token>) {
        let lone = |t: &Token| t.is_free_char() && t.text.chars().next().is_some_and(is_cjk);
        for pair in tokens.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if lone(a) && lone(b) && a.end() == b.offset {
                out.push(Token::new(
                    format!("{}{}", a.text, b.text),
                    a.offset,
                    ATTR_UNKNOWN,
                    a.weight + b.weight,
                    Origin::Expanded,
                ));
            }
        }
    }

    /// Single characters inside a multi-character word. `zall` keeps all of
    /// them; `zmain` only those whose own dictionary weight is high enough.
    fn inner_chars(&self, word: &Token, out: &mut Vec<Token>) {
        for (i, ch) in word.text.char_indices() {
            let piece = &word.text[i..i + ch.len_utf8()];
            let senses = self.dict.lookup(piece);
            let sense = senses.as_deref().and_then(best_sense);
            let keep = self.multi.zall || sense.is_some_and(|s| s.idf >= self.zmain_min_weight);
            if !keep {
                continue;
            }
            let (attr, weight) = match sense {
                Some(s) => (s.attr.clone(), s.idf),
                None => (ATTR_UNKNOWN.to_string(), self.unknown_weight),
            };
            out.push(Token::new(piece, word.offset + i, attr, weight, Origin::Expanded));
        }
    }
}
