//! Dictionary store: an ordered stack of loaded dictionary sources.
//!
//! Sources are consulted newest first. `longest_match` returns the longest
//! word over all sources; when two sources match the same length the newest
//! source wins. Loaded sources sit behind `Arc` so several segmenters can
//! share them read-only.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::charset::Charset;
use crate::error::{CwsError, Result};
use crate::lexicon::{MemoryLexicon, Sense, WordMatch};
use crate::xdb::IndexedLexicon;

/// On-disk format of a dictionary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictFormat {
    /// redb-backed `.xdb` file.
    Indexed,
    /// Plain text, one word per line.
    Text,
}

/// How a dictionary file is loaded.
///
/// The bit form mirrors the usual flag constants: `INDEXED` (read the index
/// directly from disk), `MEMORY` (copy everything into memory, may be OR-ed
/// with either format) and `TEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictMode {
    pub format: DictFormat,
    pub in_memory: bool,
}

impl DictMode {
    pub const INDEXED: u32 = 1;
    pub const MEMORY: u32 = 2;
    pub const TEXT: u32 = 4;

    /// Indexed file queried on disk.
    pub const fn indexed() -> Self {
        Self {
            format: DictFormat::Indexed,
            in_memory: false,
        }
    }

    /// Indexed file copied into memory.
    pub const fn memory() -> Self {
        Self {
            format: DictFormat::Indexed,
            in_memory: true,
        }
    }

    /// Text file (always held in memory).
    pub const fn text() -> Self {
        Self {
            format: DictFormat::Text,
            in_memory: true,
        }
    }

    /// Decode the flag form. `0` selects the default (`INDEXED`).
    pub fn from_bits(bits: u32) -> Result<Self> {
        let known = Self::INDEXED | Self::MEMORY | Self::TEXT;
        if bits & !known != 0 {
            return Err(CwsError::InvalidMode(format!("unknown dictionary mode bits {:#x}", bits)));
        }
        let in_memory = bits & Self::MEMORY != 0;
        match (bits & Self::INDEXED != 0, bits & Self::TEXT != 0) {
            (true, true) => Err(CwsError::InvalidMode(
                "dictionary mode cannot be both indexed and text".to_string(),
            )),
            (_, true) => Ok(Self::text()),
            _ => Ok(Self {
                format: DictFormat::Indexed,
                in_memory,
            }),
        }
    }

    pub fn bits(self) -> u32 {
        let format = match self.format {
            DictFormat::Indexed => Self::INDEXED,
            DictFormat::Text => Self::TEXT,
        };
        if self.in_memory {
            format | Self::MEMORY
        } else {
            format
        }
    }

    /// Guess the mode from the file extension (`.txt` is text, anything else indexed).
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("txt") => Self::text(),
            _ => Self::indexed(),
        }
    }
}

impl Default for DictMode {
    fn default() -> Self {
        Self::indexed()
    }
}

enum Backend {
    Memory(MemoryLexicon),
    Disk(IndexedLexicon),
}

/// One loaded dictionary file.
pub struct DictSource {
    path: PathBuf,
    mode: DictMode,
    backend: Backend,
}

impl DictSource {
    /// Load `path` under `mode`. Text files are decoded with `charset`;
    /// `cache_size` bounds the lookup cache of on-disk sources.
    pub fn load<P: AsRef<Path>>(path: P, mode: DictMode, charset: Charset, cache_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let backend = match mode.format {
            DictFormat::Text => Backend::Memory(MemoryLexicon::load_text(path, charset)?),
            DictFormat::Indexed => {
                let disk = IndexedLexicon::open(path, cache_size)?;
                if mode.in_memory {
                    Backend::Memory(disk.to_memory()?)
                } else {
                    Backend::Disk(disk)
                }
            }
        };
        let source = Self {
            path: path.to_path_buf(),
            mode,
            backend,
        };
        tracing::info!(
            path = %path.display(),
            mode = mode.bits(),
            words = source.len(),
            "loaded dictionary"
        );
        Ok(source)
    }

    /// Wrap an already built lexicon (used by tests and embedders).
    pub fn from_memory<P: AsRef<Path>>(path: P, lexicon: MemoryLexicon) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mode: DictMode::text(),
            backend: Backend::Memory(lexicon),
        }
    }

    pub fn longest_match(&self, text: &str, start: usize, end_limit: usize) -> Option<WordMatch> {
        match &self.backend {
            Backend::Memory(m) => m.longest_match(text, start, end_limit),
            Backend::Disk(d) => d.longest_match(text, start, end_limit),
        }
    }

    pub fn get(&self, word: &str) -> Option<Vec<Sense>> {
        match &self.backend {
            Backend::Memory(m) => m.get(word).map(<[Sense]>::to_vec),
            Backend::Disk(d) => d.get(word),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> DictMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Memory(m) => m.len(),
            Backend::Disk(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictSource")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("words", &self.len())
            .finish()
    }
}

/// Ordered set of dictionary sources; the last one has the highest priority.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    sources: Vec<Arc<DictSource>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Push a source with the highest priority.
    pub fn push(&mut self, source: Arc<DictSource>) {
        self.sources.push(source);
    }

    /// Load `path` and give it the highest priority. On failure nothing changes.
    pub fn add_dict<P: AsRef<Path>>(&mut self, path: P, mode: DictMode, charset: Charset, cache_size: usize) -> Result<()> {
        let source = DictSource::load(path, mode, charset, cache_size)?;
        self.push(Arc::new(source));
        Ok(())
    }

    /// Replace all sources with `path`. The old sources are only dropped once
    /// the new one has loaded.
    pub fn set_dict<P: AsRef<Path>>(&mut self, path: P, mode: DictMode, charset: Charset, cache_size: usize) -> Result<()> {
        let source = DictSource::load(path, mode, charset, cache_size)?;
        self.sources.clear();
        self.push(Arc::new(source));
        Ok(())
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Longest word at `start` over every source, newest source first on ties.
    pub fn longest_match(&self, text: &str, start: usize, end_limit: usize) -> Option<WordMatch> {
        let mut best: Option<WordMatch> = None;
        for source in self.sources.iter().rev() {
            if let Some(m) = source.longest_match(text, start, end_limit) {
                if best.as_ref().map_or(true, |b| m.end > b.end) {
                    best = Some(m);
                }
            }
        }
        best
    }

    /// Exact lookup in priority order.
    pub fn lookup(&self, word: &str) -> Option<Vec<Sense>> {
        self.sources.iter().rev().find_map(|s| s.get(word))
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }

    /// Sources in load order (lowest priority first).
    pub fn sources(&self) -> impl Iterator<Item = &DictSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
