//! Rule table for compound and named-entity recognition.
//!
//! Rules are loaded from a TOML file (decoded with the active charset):
//!
//! ```toml
//! nostats = ["的", "了"]
//!
//! [[rule]]
//! name = "surname"
//! kind = "prefix"        # current token + following free characters
//! attr = "nr"
//! words = ["王", "李", "张"]
//! min = 1
//! max = 2
//!
//! [[rule]]
//! name = "date"
//! kind = "suffix"        # preceding tokens + current token
//! attr = "t"
//! words = ["年", "月", "日"]
//! join_attrs = ["m"]
//! max = 1
//!
//! [[rule]]
//! name = "numeral"
//! kind = "chars"         # run of single characters from `chars`
//! attr = "m"
//! chars = "〇一二三四五六七八九十百千万亿两"
//! min = 2
//! max = 16
//! ```
//!
//! A *free* character is a single character the dictionary does not know.
//! Rules only ever merge tokens the scanner already produced, so a longer
//! dictionary word is never broken up by a rule. A suffix rule joins free
//! characters, plus tokens with a `join_attrs` attribute that are single
//! characters, alphanumeric runs or earlier rule merges. Multi-character
//! dictionary words are never absorbed.

use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::charset::Charset;
use crate::error::{CwsError, Result};
use crate::token::{Origin, Token};

/// Weight of rule-built tokens when the rule does not set one.
pub const DEFAULT_RULE_WEIGHT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Prefix,
    Suffix,
    Chars,
}

/// Rule as written in the rule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub kind: RuleKind,
    pub attr: String,
    #[serde(default)]
    pub weight: Option<f32>,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub chars: String,
    #[serde(default = "default_min")]
    pub min: usize,
    #[serde(default = "default_max")]
    pub max: usize,
    #[serde(default)]
    pub join_attrs: Vec<String>,
}

fn default_min() -> usize {
    1
}

fn default_max() -> usize {
    2
}

/// Top-level rule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleFile {
    /// Words never counted by keyword ranking.
    pub nostats: Vec<String>,
    #[serde(rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

/// Compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub attr: String,
    pub weight: f32,
    words: AHashSet<String>,
    chars: AHashSet<char>,
    min: usize,
    max: usize,
    join_attrs: AHashSet<String>,
}

impl Rule {
    fn compile(spec: RuleSpec) -> std::result::Result<Self, String> {
        if spec.attr.trim().is_empty() {
            return Err(format!("rule {:?}: empty attr", spec.name));
        }
        if spec.min > spec.max {
            return Err(format!("rule {:?}: min {} > max {}", spec.name, spec.min, spec.max));
        }
        match spec.kind {
            RuleKind::Prefix | RuleKind::Suffix if spec.words.is_empty() => {
                return Err(format!("rule {:?}: no words", spec.name));
            }
            RuleKind::Chars if spec.chars.is_empty() => {
                return Err(format!("rule {:?}: no chars", spec.name));
            }
            RuleKind::Chars if spec.max == 0 => {
                return Err(format!("rule {:?}: max must be at least 1", spec.name));
            }
            _ => {}
        }
        Ok(Self {
            weight: spec.weight.unwrap_or(DEFAULT_RULE_WEIGHT),
            words: spec.words.into_iter().map(|w| w.trim().to_string()).collect(),
            chars: spec.chars.chars().filter(|c| !c.is_whitespace()).collect(),
            join_attrs: spec.join_attrs.into_iter().collect(),
            name: spec.name,
            kind: spec.kind,
            attr: spec.attr,
            min: spec.min,
            max: spec.max,
        })
    }

    /// `(back, forward)` span this rule would merge around `current`.
    fn span(&self, history: &[Token], current: &Token, ahead: &[Token]) -> Option<(usize, usize)> {
        if current.is_symbol() {
            return None;
        }
        match self.kind {
            RuleKind::Prefix => {
                if !self.words.contains(&current.text) {
                    return None;
                }
                let forward = ahead
                    .iter()
                    .take(self.max)
                    .take_while(|t| t.is_free_char())
                    .count();
                (forward >= self.min).then_some((0, forward))
            }
            RuleKind::Suffix => {
                if !self.words.contains(&current.text) {
                    return None;
                }
                let back = history
                    .iter()
                    .rev()
                    .take(self.max)
                    .take_while(|t| self.joins(t))
                    .count();
                (back >= self.min).then_some((back, 0))
            }
            RuleKind::Chars => {
                if !self.is_run_char(current) {
                    return None;
                }
                let forward = ahead
                    .iter()
                    .take(self.max - 1)
                    .take_while(|t| self.is_run_char(t))
                    .count();
                (forward + 1 >= self.min).then_some((0, forward))
            }
        }
    }

    /// Whether a suffix rule may absorb the preceding token `t`.
    fn joins(&self, t: &Token) -> bool {
        if t.is_symbol() {
            return false;
        }
        if t.is_free_char() {
            return true;
        }
        self.join_attrs.contains(&t.attr)
            && (t.char_len() == 1 || matches!(t.origin, Origin::Alnum | Origin::Rule))
    }

    fn is_run_char(&self, t: &Token) -> bool {
        let mut chars = t.text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => !t.is_symbol() && self.chars.contains(&c),
            _ => false,
        }
    }
}

/// Merge instruction: replace `back` preceding tokens, the current token and
/// `forward` following tokens with one token.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub back: usize,
    pub forward: usize,
    pub attr: String,
    pub weight: f32,
    /// Index of the rule in file order.
    pub rule: usize,
}

impl Merge {
    pub fn span(&self) -> usize {
        self.back + self.forward
    }
}

/// The active rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    nostats: AHashSet<String>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and compile a rule file.
    pub fn load<P: AsRef<Path>>(path: P, charset: Charset) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| CwsError::load(path, e))?;
        let content = charset.decode(&bytes).map_err(|e| CwsError::load(path, e))?;
        let table = Self::from_toml_str(&content).map_err(|reason| CwsError::load(path, reason))?;
        tracing::info!(path = %path.display(), rules = table.len(), "loaded rule table");
        Ok(table)
    }

    /// Parse and compile rule file content.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        let file: RuleFile = toml::from_str(content).map_err(|e| e.to_string())?;
        Self::from_file(file)
    }

    pub fn from_file(file: RuleFile) -> std::result::Result<Self, String> {
        let rules = file
            .rules
            .into_iter()
            .map(Rule::compile)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            nostats: file.nostats.into_iter().collect(),
        })
    }

    /// Consult the rules for `current`, given the tokens already emitted
    /// (`history`, oldest first) and the tokens scanned after it (`ahead`).
    /// The widest merge wins; equal widths go to the earlier rule.
    pub fn check(&self, history: &[Token], current: &Token, ahead: &[Token]) -> Option<Merge> {
        let mut best: Option<Merge> = None;
        for (idx, rule) in self.rules.iter().enumerate() {
            let Some((back, forward)) = rule.span(history, current, ahead) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| back + forward > b.span()) {
                best = Some(Merge {
                    back,
                    forward,
                    attr: rule.attr.clone(),
                    weight: rule.weight,
                    rule: idx,
                });
            }
        }
        best
    }

    /// Words excluded from keyword statistics.
    pub fn is_nostats(&self, word: &str) -> bool {
        self.nostats.contains(word)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{ATTR_NUMERAL, ATTR_SYMBOL, ATTR_UNKNOWN};

    const RULES: &str = r#"
nostats = ["的"]

[[rule]]
name = "surname"
kind = "prefix"
attr = "nr"
words = ["王", "李"]
min = 1
max = 2

[[rule]]
name = "date"
kind = "suffix"
attr = "t"
words = ["年"]
join_attrs = ["m"]
max = 1

[[rule]]
name = "numeral"
kind = "chars"
attr = "m"
chars = "一二三十百"
min = 2
max = 8
"#;

    fn free(c: &str) -> Token {
        Token::new(c, 0, ATTR_UNKNOWN, 0.0, Origin::Unknown)
    }

    fn dict(w: &str, attr: &str) -> Token {
        Token::new(w, 0, attr, 1.0, Origin::Dictionary)
    }

    #[test]
    fn parse_rule_file() {
        let table = RuleTable::from_toml_str(RULES).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.is_nostats("的"));
        assert_eq!(table.rules()[0].weight, DEFAULT_RULE_WEIGHT);
    }

    #[test]
    fn prefix_absorbs_free_chars_up_to_max() {
        let table = RuleTable::from_toml_str(RULES).unwrap();
        let ahead = vec![free("小"), free("明"), free("们")];
        let m = table.check(&[], &dict("王", "n"), &ahead).unwrap();
        assert_eq!((m.back, m.forward), (0, 2));
        assert_eq!(m.attr, "nr");

        // a dictionary word right after the surname blocks the merge
        let ahead = vec![dict("先生", "n")];
        assert!(table.check(&[], &dict("王", "n"), &ahead).is_none());
    }

    #[test]
    fn suffix_joins_numerals() {
        let table = RuleTable::from_toml_str(RULES).unwrap();
        let history = vec![dict("今", "t"), Token::new("2024", 0, ATTR_NUMERAL, 0.0, Origin::Alnum)];
        let m = table.check(&history, &dict("年", "q"), &[]).unwrap();
        assert_eq!((m.back, m.forward), (1, 0));
        assert_eq!(m.attr, "t");

        let history = vec![Token::new("，", 0, ATTR_SYMBOL, 0.0, Origin::Symbol)];
        assert!(table.check(&history, &dict("年", "q"), &[]).is_none());
    }

    #[test]
    fn suffix_leaves_dictionary_words_alone() {
        let table = RuleTable::from_toml_str(RULES).unwrap();
        assert!(table.check(&[dict("二十", "m")], &dict("年", "q"), &[]).is_none());

        let m = table.check(&[dict("五", "m")], &dict("年", "q"), &[]).unwrap();
        assert_eq!(m.back, 1);

        let merged = Token::new("二十三", 0, ATTR_NUMERAL, 2.0, Origin::Rule);
        let m = table.check(&[merged], &dict("年", "q"), &[]).unwrap();
        assert_eq!(m.back, 1);
    }

    #[test]
    fn chars_run_needs_min_length() {
        let table = RuleTable::from_toml_str(RULES).unwrap();
        let ahead = vec![dict("十", "m"), dict("三", "m"), free("个")];
        let m = table.check(&[], &dict("二", "m"), &ahead).unwrap();
        assert_eq!(m.forward, 2);

        assert!(table.check(&[], &dict("二", "m"), &[free("个")]).is_none());
    }

    #[test]
    fn invalid_rules_are_rejected() {
        assert!(RuleTable::from_toml_str("[[rule]]\nname = \"x\"\nkind = \"prefix\"\nattr = \"nr\"\n").is_err());
        assert!(RuleTable::from_toml_str("[[rule]]\nname = \"x\"\nkind = \"chars\"\nattr = \"m\"\nchars = \"一\"\nmin = 3\nmax = 2\n").is_err());
        assert!(RuleTable::from_toml_str("not toml at all [").is_err());
    }
}
