//! libcws-core
//!
//! Dictionary store, rule table, attribute model and configuration shared by
//! the `libcws` segmenter and its tools.
//!
//! Dictionaries come in two formats: plain text (always held in memory behind
//! an `fst::Map`) and indexed `.xdb` files (a redb database, queried on disk
//! through an LRU cache or copied into memory at load time).
//!
//! Public API:
//! - `Dictionary` - Ordered stack of dictionary sources with longest-match lookup
//! - `RuleTable` - Compound / named-entity merge rules and the `nostats` list
//! - `AttrFilter` - Parsed attribute filter (`"n,v"`, `"~w"`)
//! - `Token` - Segmented word with offset, attribute and weight
//! - `Config` - Configuration and mode flags
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod attr;
pub use attr::AttrFilter;

pub mod charset;
pub use charset::Charset;

pub mod error;
pub use error::{CwsError, Result};

pub mod lexicon;
pub use lexicon::{best_sense, DictEntry, MemoryLexicon, Sense, WordMatch};

pub mod xdb;
pub use xdb::{write_indexed, IndexedLexicon};

pub mod dictionary;
pub use dictionary::{DictFormat, DictMode, DictSource, Dictionary};

pub mod rules;
pub use rules::{Merge, RuleTable};

pub mod token;
pub use token::{Origin, Token};

/// Multi-granularity output toggles.
///
/// All four are independent; enabled expansions are emitted alongside the
/// regular tokens, never instead of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MultiMode {
    /// Split dictionary words of three or more characters into shorter words.
    pub short: bool,
    /// Overlapping pairs over runs of unknown single characters.
    pub duality: bool,
    /// Important single characters inside multi-character words.
    pub zmain: bool,
    /// Every single character inside multi-character words.
    pub zall: bool,
}

impl MultiMode {
    pub const SHORT: u32 = 1;
    pub const DUALITY: u32 = 2;
    pub const ZMAIN: u32 = 4;
    pub const ZALL: u32 = 8;

    pub fn from_bits(bits: u32) -> Result<Self> {
        let known = Self::SHORT | Self::DUALITY | Self::ZMAIN | Self::ZALL;
        if bits & !known != 0 {
            return Err(CwsError::InvalidMode(format!("unknown multi mode bits {:#x}", bits)));
        }
        Ok(Self {
            short: bits & Self::SHORT != 0,
            duality: bits & Self::DUALITY != 0,
            zmain: bits & Self::ZMAIN != 0,
            zall: bits & Self::ZALL != 0,
        })
    }

    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.short {
            bits |= Self::SHORT;
        }
        if self.duality {
            bits |= Self::DUALITY;
        }
        if self.zmain {
            bits |= Self::ZMAIN;
        }
        if self.zall {
            bits |= Self::ZALL;
        }
        bits
    }

    pub fn is_empty(self) -> bool {
        self.bits() == 0
    }
}

/// A dictionary to load at construction time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DictSpec {
    pub path: PathBuf,
    /// Format; guessed from the extension when absent.
    #[serde(default)]
    pub format: Option<DictFormat>,
    /// Copy an indexed dictionary into memory.
    #[serde(default)]
    pub in_memory: bool,
}

impl DictSpec {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            format: None,
            in_memory: false,
        }
    }

    pub fn mode(&self) -> DictMode {
        match self.format {
            Some(DictFormat::Text) => DictMode::text(),
            Some(DictFormat::Indexed) => DictMode {
                format: DictFormat::Indexed,
                in_memory: self.in_memory,
            },
            None => {
                let guessed = DictMode::for_path(&self.path);
                match guessed.format {
                    DictFormat::Indexed => DictMode {
                        format: DictFormat::Indexed,
                        in_memory: self.in_memory,
                    },
                    DictFormat::Text => guessed,
                }
            }
        }
    }
}

/// Segmenter configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Charset of submitted bytes and of text dictionaries / rule files.
    pub charset: Charset,
    /// Dictionaries loaded in order; the last one has the highest priority.
    pub dictionaries: Vec<DictSpec>,
    /// Rule file (TOML).
    pub rule: Option<PathBuf>,

    /// Drop punctuation and whitespace tokens from the output.
    pub ignore_punctuation: bool,
    pub multi: MultiMode,
    /// Aggregate runs of unknown single characters into pairs.
    pub duality: bool,

    /// Default `limit` of keyword ranking.
    pub tops_limit: usize,
    /// Entries in the lookup cache of each on-disk dictionary.
    pub lookup_cache_size: usize,
    /// Longest candidate word tried by the scanner, in characters.
    pub max_word_chars: usize,
    /// Maximum tokens per batch handed out by the result iterator.
    pub max_batch_tokens: usize,

    /// Weight of unknown single characters.
    pub unknown_weight: f32,
    /// Weight of ASCII letter / digit runs.
    pub alnum_weight: f32,
    /// Minimum dictionary weight of a single character emitted by `multi.zmain`.
    pub zmain_min_weight: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            dictionaries: vec![],
            rule: None,
            ignore_punctuation: false,
            multi: MultiMode::default(),
            duality: false,
            tops_limit: 10,
            lookup_cache_size: 4096,
            max_word_chars: 16,
            max_batch_tokens: 256,
            unknown_weight: 0.0,
            alnum_weight: 1.0,
            zmain_min_weight: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CwsError::load(path, e))?;
        Self::from_toml_str(&content).map_err(|e| CwsError::load(path, e))
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Duality is on when either the multi bit or the standalone switch is set.
    pub fn duality_enabled(&self) -> bool {
        self.duality || self.multi.duality
    }

    pub fn add_dictionary<P: Into<PathBuf>>(&mut self, path: P) {
        self.dictionaries.push(DictSpec::new(path));
    }
}

pub mod utils {
    /// CJK unified ideographs (basic block, extension A and compatibility).
    pub fn is_cjk(ch: char) -> bool {
        matches!(ch,
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{3007}')
    }
}
