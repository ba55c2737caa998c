//! In-memory word lexicon for libcws-core.
//!
//! Words are indexed by an `fst::Map` (word -> payload index) and their senses
//! live in a parallel `Vec<Vec<Sense>>`. Longest-match walks the fst byte by
//! byte from a position in the input, so a lookup costs one transition per
//! input byte and never allocates candidate substrings.
//!
//! Text dictionaries are parsed here as well. The format is one entry per
//! line:
//!
//! ```text
//! # word   tf      idf    attr
//! 中国     120.5   6.2    ns
//! 人民     80      5.1    n
//! 很好
//! ```
//!
//! Missing columns default to `tf = 1`, `idf = 1`, `attr = n`. Lines starting
//! with `#` or `;` are comments.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use fst::{Map, Streamer};
use serde::{Deserialize, Serialize};

use crate::attr::ATTR_DEFAULT;
use crate::charset::Charset;
use crate::error::{CwsError, Result};

/// One meaning of a dictionary word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    pub attr: String,
    /// Corpus frequency, used to pick the default sense.
    pub tf: f32,
    /// Weight contributed to keyword ranking.
    pub idf: f32,
}

impl Sense {
    pub fn new<A: Into<String>>(attr: A, tf: f32, idf: f32) -> Self {
        Self {
            attr: attr.into(),
            tf,
            idf,
        }
    }
}

/// A flat dictionary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub word: String,
    pub attr: String,
    pub tf: f32,
    pub idf: f32,
}

impl DictEntry {
    pub fn new<W: Into<String>, A: Into<String>>(word: W, attr: A, tf: f32, idf: f32) -> Self {
        Self {
            word: word.into(),
            attr: attr.into(),
            tf,
            idf,
        }
    }

    pub fn sense(&self) -> Sense {
        Sense::new(self.attr.clone(), self.tf, self.idf)
    }
}

/// Result of a longest-match lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct WordMatch {
    /// Exclusive byte end of the matched word in the input.
    pub end: usize,
    pub senses: Vec<Sense>,
}

impl WordMatch {
    /// Sense with the highest `tf`; the first listed wins ties.
    pub fn best_sense(&self) -> Option<&Sense> {
        best_sense(&self.senses)
    }
}

/// Pick the sense with the highest tf, earliest on ties.
pub fn best_sense(senses: &[Sense]) -> Option<&Sense> {
    senses.iter().fold(None, |best: Option<&Sense>, s| match best {
        Some(b) if b.tf >= s.tf => Some(b),
        _ => Some(s),
    })
}

/// Group entries by word. Later `(word, attr)` duplicates replace earlier ones.
pub fn group_entries<I: IntoIterator<Item = DictEntry>>(entries: I) -> BTreeMap<String, Vec<Sense>> {
    let mut grouped: BTreeMap<String, Vec<Sense>> = BTreeMap::new();
    for e in entries {
        if e.word.is_empty() {
            continue;
        }
        let bucket = grouped.entry(e.word.clone()).or_default();
        match bucket.iter_mut().find(|s| s.attr == e.attr) {
            Some(existing) => *existing = e.sense(),
            None => bucket.push(e.sense()),
        }
    }
    grouped
}

/// Immutable in-memory lexicon.
#[derive(Clone)]
pub struct MemoryLexicon {
    map: Map<Vec<u8>>,
    payloads: Vec<Vec<Sense>>,
    max_chars: usize,
}

impl MemoryLexicon {
    /// Build from grouped `word -> senses` (keys are already sorted).
    pub fn from_grouped(grouped: BTreeMap<String, Vec<Sense>>) -> Result<Self> {
        let mut max_chars = 0;
        let mut keys = Vec::with_capacity(grouped.len());
        let mut payloads = Vec::with_capacity(grouped.len());
        for (word, senses) in grouped {
            if senses.is_empty() {
                continue;
            }
            max_chars = max_chars.max(word.chars().count());
            keys.push(word);
            payloads.push(senses);
        }
        let map = Map::from_iter(keys.iter().enumerate().map(|(i, k)| (k, i as u64)))
            .map_err(|e| CwsError::load("<memory>", format!("fst build: {}", e)))?;
        Ok(Self {
            map,
            payloads,
            max_chars,
        })
    }

    pub fn from_entries<I: IntoIterator<Item = DictEntry>>(entries: I) -> Result<Self> {
        Self::from_grouped(group_entries(entries))
    }

    /// Load a text dictionary decoded with `charset`.
    pub fn load_text<P: AsRef<Path>>(path: P, charset: Charset) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| CwsError::load(path, e))?;
        let content = charset
            .decode(&bytes)
            .map_err(|e| CwsError::load(path, e))?;
        let entries = parse_text(&content, path)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "parsed text dictionary");
        Self::from_entries(entries)
    }

    /// Exact lookup.
    pub fn get(&self, word: &str) -> Option<&[Sense]> {
        let idx = self.map.get(word)? as usize;
        self.payloads.get(idx).map(Vec::as_slice)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.map.contains_key(word)
    }

    /// Walk the fst from byte `start` of `text` and return every word found,
    /// as `(end_byte, payload_index)` in order of increasing length. The walk
    /// never goes past `end_limit`.
    pub fn walk_prefixes(&self, text: &str, start: usize, end_limit: usize) -> Vec<(usize, usize)> {
        let mut res = Vec::new();
        let end_limit = end_limit.min(text.len());
        if start >= end_limit {
            return res;
        }
        let fst = self.map.as_fst();
        let mut node = fst.root();
        let mut out = fst::raw::Output::zero();
        for (i, &b) in text.as_bytes()[start..end_limit].iter().enumerate() {
            let Some(ti) = node.find_input(b) else {
                break;
            };
            let t = node.transition(ti);
            out = out.cat(t.out);
            node = fst.node(t.addr);
            if node.is_final() {
                let value = out.cat(node.final_output()).value();
                res.push((start + i + 1, value as usize));
            }
        }
        res
    }

    /// Longest word starting at `start` and ending at or before `end_limit`.
    pub fn longest_match(&self, text: &str, start: usize, end_limit: usize) -> Option<WordMatch> {
        let (end, idx) = self.walk_prefixes(text, start, end_limit).pop()?;
        let senses = self.payloads.get(idx)?.clone();
        Some(WordMatch { end, senses })
    }

    /// All `(word, senses)` pairs in byte order.
    pub fn entries(&self) -> Vec<(String, Vec<Sense>)> {
        let mut out = Vec::with_capacity(self.payloads.len());
        let mut stream = self.map.stream();
        while let Some((k, v)) = stream.next() {
            if let (Ok(word), Some(senses)) = (std::str::from_utf8(k), self.payloads.get(v as usize)) {
                out.push((word.to_string(), senses.clone()));
            }
        }
        out
    }

    /// Longest word length in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl fmt::Debug for MemoryLexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLexicon")
            .field("words", &self.payloads.len())
            .field("max_chars", &self.max_chars)
            .finish()
    }
}

/// Parse text dictionary content. `origin` is only used in error messages.
///
/// Words are kept exactly as written. Submitted text is not normalized
/// either, so a word matches the same code points in the input.
pub fn parse_text(content: &str, origin: &Path) -> Result<Vec<DictEntry>> {
    let mut entries = Vec::new();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let word = match parts.next() {
            Some(w) => w.to_string(),
            None => continue,
        };
        let tf = parse_weight(parts.next(), origin, lineno + 1, "tf")?;
        let idf = parse_weight(parts.next(), origin, lineno + 1, "idf")?;
        let attr = parts.next().unwrap_or(ATTR_DEFAULT).to_string();
        entries.push(DictEntry { word, attr, tf, idf });
    }
    Ok(entries)
}

fn parse_weight(field: Option<&str>, origin: &Path, line: usize, name: &str) -> Result<f32> {
    match field {
        None => Ok(1.0),
        Some(s) => s
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CwsError::load(origin, format!("line {}: invalid {} {:?}", line, name, s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> MemoryLexicon {
        MemoryLexicon::from_entries(vec![
            DictEntry::new("中国", "ns", 10.0, 5.0),
            DictEntry::new("中国人", "n", 8.0, 6.0),
            DictEntry::new("人民", "n", 9.0, 4.0),
            DictEntry::new("人", "n", 20.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn exact_lookup() {
        let lx = demo();
        assert_eq!(lx.len(), 4);
        assert_eq!(lx.get("人民").unwrap()[0].attr, "n");
        assert!(lx.get("民").is_none());
        assert!(lx.contains_word("中国人"));
    }

    #[test]
    fn walk_prefixes_reports_every_word() {
        let lx = demo();
        let text = "中国人民";
        let found = lx.walk_prefixes(text, 0, text.len());
        let ends: Vec<usize> = found.iter().map(|(e, _)| *e).collect();
        assert_eq!(ends, vec![6, 9]);
    }

    #[test]
    fn longest_match_respects_limit() {
        let lx = demo();
        let text = "中国人民";
        assert_eq!(lx.longest_match(text, 0, text.len()).unwrap().end, 9);
        assert_eq!(lx.longest_match(text, 0, 8).unwrap().end, 6);
        assert_eq!(lx.longest_match(text, 6, text.len()).unwrap().end, 12);
        assert!(lx.longest_match(text, 3, 6).is_none());
    }

    #[test]
    fn duplicate_attr_later_wins_and_polysemy_kept() {
        let lx = MemoryLexicon::from_entries(vec![
            DictEntry::new("打", "v", 1.0, 1.0),
            DictEntry::new("打", "q", 2.0, 1.0),
            DictEntry::new("打", "v", 5.0, 2.0),
        ])
        .unwrap();
        let senses = lx.get("打").unwrap();
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[0].tf, 5.0);
        assert_eq!(best_sense(senses).unwrap().attr, "v");
    }

    #[test]
    fn parse_text_defaults_and_comments() {
        let content = "# comment\n中国 10 5 ns\n\n; another\n很好\n人民\t3\n";
        let entries = parse_text(content, Path::new("t.txt")).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], DictEntry::new("中国", "ns", 10.0, 5.0));
        assert_eq!(entries[1], DictEntry::new("很好", "n", 1.0, 1.0));
        assert_eq!(entries[2].tf, 3.0);
        assert_eq!(entries[2].idf, 1.0);
    }

    #[test]
    fn compatibility_ideographs_match_as_written() {
        // U+F900 would become U+8C48 under NFC
        let entries = parse_text("\u{F900}子 2 3 n\n", Path::new("compat.txt")).unwrap();
        assert_eq!(entries[0].word, "\u{F900}子");
        let lx = MemoryLexicon::from_entries(entries).unwrap();
        let text = "\u{F900}子来了";
        assert_eq!(lx.longest_match(text, 0, text.len()).unwrap().end, 6);
        assert!(lx.get("\u{8C48}子").is_none());
    }

    #[test]
    fn parse_text_rejects_bad_numbers() {
        let err = parse_text("中国 abc", Path::new("bad.txt")).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
