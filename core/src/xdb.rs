//! Indexed (`.xdb`) dictionary files backed by `redb`.
//!
//! Layout:
//! - table `words`: word -> bincode(`WordRecord`)
//! - table `meta`: `version`, `entries`, `max_chars`
//!
//! Every proper prefix of a word is stored with an empty sense list so an
//! on-disk longest-match can stop as soon as the current key is neither a
//! word nor a prefix of one. Lookups go through a small LRU cache since the
//! scanner looks up the same short keys over and over.
//!
//! redb locks a database file exclusively, so every `IndexedLexicon` over the
//! same file shares one `Database` handle through a process-wide registry.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use ahash::AHashMap;
use lru::LruCache;
use once_cell::sync::Lazy;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{CwsError, Result};
use crate::lexicon::{group_entries, DictEntry, MemoryLexicon, Sense, WordMatch};

const WORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("words");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Bumped whenever the record layout changes.
pub const FORMAT_VERSION: u64 = 1;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Live database handles keyed by canonical path.
static OPEN_DATABASES: Lazy<Mutex<AHashMap<PathBuf, Weak<Database>>>> = Lazy::new(Default::default);

/// Reuse the live handle for `path` or open a new one.
fn shared_database(path: &Path) -> std::result::Result<Arc<Database>, BoxError> {
    let key = std::fs::canonicalize(path)?;
    let mut open = OPEN_DATABASES.lock().map_err(|_| "database registry poisoned")?;
    if let Some(db) = open.get(&key).and_then(Weak::upgrade) {
        return Ok(db);
    }
    open.retain(|_, handle| handle.strong_count() > 0);
    let db = Arc::new(Database::open(&key)?);
    open.insert(key, Arc::downgrade(&db));
    Ok(db)
}

/// Forget the handle for `path` so the next open sees a rewritten file.
fn evict_database(path: &Path) {
    let Ok(key) = std::fs::canonicalize(path) else {
        return;
    };
    if let Ok(mut open) = OPEN_DATABASES.lock() {
        open.remove(&key);
    }
}

/// Stored payload for one key. Empty `senses` marks a pure prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordRecord {
    pub senses: Vec<Sense>,
}

/// Build an indexed dictionary at `path` from `entries`, replacing any
/// existing file. Returns the number of distinct words written.
pub fn write_indexed<P, I>(path: P, entries: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = DictEntry>,
{
    let path = path.as_ref();
    let grouped = group_entries(entries);
    write_grouped(path, &grouped).map_err(|e| CwsError::load(path, e))?;
    tracing::info!(path = %path.display(), words = grouped.len(), "wrote indexed dictionary");
    Ok(grouped.len())
}

fn write_grouped(
    path: &Path,
    grouped: &std::collections::BTreeMap<String, Vec<Sense>>,
) -> std::result::Result<(), BoxError> {
    if path.exists() {
        evict_database(path);
        std::fs::remove_file(path)?;
    }
    let mut prefixes: BTreeSet<&str> = BTreeSet::new();
    let mut max_chars = 0usize;
    for word in grouped.keys() {
        let bounds: Vec<usize> = word.char_indices().map(|(i, _)| i).skip(1).collect();
        max_chars = max_chars.max(bounds.len() + 1);
        for b in bounds {
            let prefix = &word[..b];
            if !grouped.contains_key(prefix) {
                prefixes.insert(prefix);
            }
        }
    }

    let db = Database::create(path)?;
    let txn = db.begin_write()?;
    {
        let mut words = txn.open_table(WORDS)?;
        for (word, senses) in grouped {
            let record = WordRecord {
                senses: senses.clone(),
            };
            let bytes = bincode::serialize(&record)?;
            words.insert(word.as_str(), bytes.as_slice())?;
        }
        let marker = bincode::serialize(&WordRecord::default())?;
        for prefix in prefixes {
            words.insert(prefix, marker.as_slice())?;
        }

        let mut meta = txn.open_table(META)?;
        meta.insert("version", FORMAT_VERSION)?;
        meta.insert("entries", grouped.len() as u64)?;
        meta.insert("max_chars", max_chars as u64)?;
    }
    txn.commit()?;
    Ok(())
}

/// Read-only handle to an indexed dictionary queried directly on disk.
pub struct IndexedLexicon {
    db: Arc<Database>,
    path: PathBuf,
    entries: u64,
    max_chars: usize,
    cache: Mutex<LruCache<String, Option<Vec<Sense>>>>,
}

impl IndexedLexicon {
    /// Open an existing `.xdb` file. Missing files and files that are not
    /// libcws dictionaries are rejected. Opening a file that is already open
    /// in this process shares the existing handle.
    pub fn open<P: AsRef<Path>>(path: P, cache_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CwsError::load(path, "no such file"));
        }
        let db = shared_database(path).map_err(|e| CwsError::load(path, e))?;
        let (version, entries, max_chars) =
            read_meta(&db).map_err(|e| CwsError::load(path, format!("not an xdb dictionary: {}", e)))?;
        if version != FORMAT_VERSION {
            return Err(CwsError::load(
                path,
                format!("unsupported xdb version {} (expected {})", version, FORMAT_VERSION),
            ));
        }
        let cap = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!(path = %path.display(), entries, max_chars, "opened indexed dictionary");
        Ok(Self {
            db,
            path: path.to_path_buf(),
            entries,
            max_chars: max_chars as usize,
            cache: Mutex::new(LruCache::new(cap)),
        })
    }

    fn fetch(&self, key: &str) -> std::result::Result<Option<Vec<Sense>>, BoxError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORDS)?;
        match table.get(key)? {
            Some(guard) => {
                let record: WordRecord = bincode::deserialize(guard.value())?;
                Ok(Some(record.senses))
            }
            None => Ok(None),
        }
    }

    /// `None` when the key is absent, `Some(vec![])` for a pure prefix.
    fn record(&self, key: &str) -> Option<Vec<Sense>> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(key) {
                return hit.clone();
            }
        }
        let fetched = match self.fetch(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), key, error = %e, "xdb lookup failed");
                None
            }
        };
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key.to_string(), fetched.clone());
        }
        fetched
    }

    /// Exact lookup; prefixes that are not words return `None`.
    pub fn get(&self, word: &str) -> Option<Vec<Sense>> {
        self.record(word).filter(|s| !s.is_empty())
    }

    /// Longest word starting at `start` and ending at or before `end_limit`.
    pub fn longest_match(&self, text: &str, start: usize, end_limit: usize) -> Option<WordMatch> {
        let end_limit = end_limit.min(text.len());
        if start >= end_limit {
            return None;
        }
        let mut best = None;
        let ends = text[start..end_limit]
            .char_indices()
            .map(|(i, c)| start + i + c.len_utf8())
            .take(self.max_chars);
        for end in ends {
            match self.record(&text[start..end]) {
                None => break,
                Some(senses) if senses.is_empty() => continue,
                Some(senses) => best = Some(WordMatch { end, senses }),
            }
        }
        best
    }

    /// Copy all words into an in-memory lexicon.
    pub fn to_memory(&self) -> Result<MemoryLexicon> {
        let grouped = self
            .scan()
            .map_err(|e| CwsError::load(&self.path, e))?
            .into_iter()
            .filter(|(_, senses)| !senses.is_empty())
            .collect();
        MemoryLexicon::from_grouped(grouped)
    }

    /// All `(word, senses)` pairs, prefix markers excluded.
    pub fn entries(&self) -> Result<Vec<(String, Vec<Sense>)>> {
        Ok(self
            .scan()
            .map_err(|e| CwsError::load(&self.path, e))?
            .into_iter()
            .filter(|(_, senses)| !senses.is_empty())
            .collect())
    }

    fn scan(&self) -> std::result::Result<Vec<(String, Vec<Sense>)>, BoxError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(WORDS)?;
        let mut out = Vec::new();
        for item in table.iter()? {
            let (k, v) = item?;
            let record: WordRecord = bincode::deserialize(v.value())?;
            out.push((k.value().to_string(), record.senses));
        }
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of words (prefix markers excluded).
    pub fn len(&self) -> usize {
        self.entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

fn read_meta(db: &Database) -> std::result::Result<(u64, u64, u64), BoxError> {
    let txn = db.begin_read()?;
    let table = txn.open_table(META)?;
    let get = |key: &str| -> std::result::Result<u64, BoxError> {
        Ok(table
            .get(key)?
            .map(|g| g.value())
            .ok_or_else(|| format!("missing meta key {}", key))?)
    };
    Ok((get("version")?, get("entries")?, get("max_chars")?))
}

impl fmt::Debug for IndexedLexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedLexicon")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .field("max_chars", &self.max_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("libcws_xdb_{}_{}.xdb", name, std::process::id()))
    }

    fn sample() -> Vec<DictEntry> {
        vec![
            DictEntry::new("中国", "ns", 10.0, 5.0),
            DictEntry::new("中国人民银行", "nt", 3.0, 9.0),
            DictEntry::new("人民", "n", 9.0, 4.0),
        ]
    }

    #[test]
    fn write_open_and_longest_match() {
        let path = temp_path("match");
        assert_eq!(write_indexed(&path, sample()).unwrap(), 3);
        let lx = IndexedLexicon::open(&path, 64).unwrap();
        assert_eq!(lx.len(), 3);
        assert_eq!(lx.max_chars(), 6);

        let text = "中国人民银行成立";
        let m = lx.longest_match(text, 0, text.len()).unwrap();
        assert_eq!(&text[..m.end], "中国人民银行");
        assert_eq!(m.senses[0].attr, "nt");

        // "中国人民" is only a prefix, so a shorter limit falls back to "中国"
        let m = lx.longest_match(text, 0, 12).unwrap();
        assert_eq!(&text[..m.end], "中国");

        assert!(lx.get("中国人").is_none());
        assert_eq!(lx.get("人民").unwrap()[0].idf, 4.0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn to_memory_matches_disk() {
        let path = temp_path("mem");
        write_indexed(&path, sample()).unwrap();
        let disk = IndexedLexicon::open(&path, 8).unwrap();
        let mem = disk.to_memory().unwrap();
        assert_eq!(mem.len(), 3);
        assert!(mem.get("中国人民").is_none());
        assert_eq!(disk.entries().unwrap().len(), 3);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn same_file_opens_share_one_handle() {
        let path = temp_path("shared");
        write_indexed(&path, sample()).unwrap();
        let first = IndexedLexicon::open(&path, 8).unwrap();
        let second = IndexedLexicon::open(&path, 8).unwrap();
        assert!(Arc::ptr_eq(&first.db, &second.db));
        assert_eq!(second.get("中国").unwrap()[0].attr, "ns");
        drop(first);
        drop(second);
        let again = IndexedLexicon::open(&path, 8).unwrap();
        assert_eq!(again.len(), 3);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rewritten_file_is_reopened_fresh() {
        let path = temp_path("rewrite");
        write_indexed(&path, sample()).unwrap();
        let old = IndexedLexicon::open(&path, 8).unwrap();
        write_indexed(&path, vec![DictEntry::new("北京", "ns", 1.0, 1.0)]).unwrap();
        let new = IndexedLexicon::open(&path, 8).unwrap();
        assert_eq!(new.len(), 1);
        assert!(new.get("北京").is_some());
        assert!(new.get("中国").is_none());
        drop(old);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn open_rejects_missing_and_garbage() {
        let missing = temp_path("missing");
        assert!(matches!(
            IndexedLexicon::open(&missing, 8),
            Err(CwsError::Load { .. })
        ));

        let garbage = temp_path("garbage");
        std::fs::write(&garbage, b"definitely not a database").unwrap();
        assert!(IndexedLexicon::open(&garbage, 8).is_err());
        let _ = std::fs::remove_file(garbage);
    }
}
