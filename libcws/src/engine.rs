//! Segmenter engine handle.
//!
//! A `Segmenter` owns its configuration, dictionary stack, rule table and at
//! most one submitted text. Settings persist across texts; every
//! `submit_text` replaces the session. Loaded dictionaries sit behind `Arc`,
//! so cloning a `Segmenter` shares them read-only.

use std::path::Path;
use std::sync::Arc;

use libcws_core::{AttrFilter, Charset, Config, CwsError, DictMode, Dictionary, MultiMode, Result, RuleTable, Token};

use crate::query;
use crate::ranker::{self, RankedWord};
use crate::session::{Pipeline, Session};

/// Crate version reported by [`Segmenter::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: Config,
    dict: Dictionary,
    rules: Arc<RuleTable>,
    session: Option<Session>,
    closed: bool,
}

impl Segmenter {
    /// Empty segmenter: no dictionary, no rules, default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a segmenter and load every dictionary and the rule file named in
    /// `config`. Any load failure makes the segmenter unavailable.
    pub fn from_config(config: Config) -> Result<Self> {
        let mut dict = Dictionary::new();
        for spec in &config.dictionaries {
            dict.add_dict(&spec.path, spec.mode(), config.charset, config.lookup_cache_size)
                .map_err(|e| CwsError::Unavailable(e.to_string()))?;
        }
        let rules = match &config.rule {
            Some(path) => RuleTable::load(path, config.charset).map_err(|e| CwsError::Unavailable(e.to_string()))?,
            None => RuleTable::new(),
        };
        tracing::info!(
            dictionaries = dict.len(),
            rules = rules.len(),
            charset = config.charset.name(),
            "segmenter ready"
        );
        Ok(Self {
            config,
            dict,
            rules: Arc::new(rules),
            session: None,
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CwsError::Closed)
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Select the charset by name (`utf8` or `gbk`, case-insensitive).
    pub fn set_charset(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let charset: Charset = name.parse()?;
        self.config.charset = charset;
        Ok(())
    }

    pub fn charset(&self) -> Charset {
        self.config.charset
    }

    /// Load a dictionary with the highest lookup priority.
    pub fn add_dict<P: AsRef<Path>>(&mut self, path: P, mode: DictMode) -> Result<()> {
        self.ensure_open()?;
        self.dict
            .add_dict(path, mode, self.config.charset, self.config.lookup_cache_size)
    }

    /// Replace every loaded dictionary with `path`.
    pub fn set_dict<P: AsRef<Path>>(&mut self, path: P, mode: DictMode) -> Result<()> {
        self.ensure_open()?;
        self.dict
            .set_dict(path, mode, self.config.charset, self.config.lookup_cache_size)
    }

    /// Load a rule file, replacing the active rules.
    pub fn set_rule<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ensure_open()?;
        let path = path.as_ref();
        let rules = RuleTable::load(path, self.config.charset)?;
        self.rules = Arc::new(rules);
        self.config.rule = Some(path.to_path_buf());
        Ok(())
    }

    /// Drop punctuation and whitespace from the output.
    pub fn set_ignore(&mut self, yes: bool) -> Result<()> {
        self.ensure_open()?;
        self.config.ignore_punctuation = yes;
        Ok(())
    }

    pub fn set_multi(&mut self, multi: MultiMode) -> Result<()> {
        self.ensure_open()?;
        self.config.multi = multi;
        Ok(())
    }

    /// Aggregate runs of unknown single characters into pairs.
    pub fn set_duality(&mut self, yes: bool) -> Result<()> {
        self.ensure_open()?;
        self.config.duality = yes;
        Ok(())
    }

    /// Submit a new text; iteration restarts from its beginning. Under gbk,
    /// text with characters GBK cannot encode is rejected and the previous
    /// text stays current.
    pub fn submit_text(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.config.charset.check(text)?;
        self.session = Some(Session::new(text.to_string(), self.config.charset));
        Ok(())
    }

    /// Submit raw bytes encoded in the active charset.
    pub fn submit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let text = self.config.charset.decode(bytes)?;
        self.session = Some(Session::new(text.into_owned(), self.config.charset));
        Ok(())
    }

    /// Next batch of tokens of the current text; `Ok(None)` once exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Token>>> {
        self.ensure_open()?;
        let session = self.session.as_mut().ok_or(CwsError::NotConfigured)?;
        let pipeline = Pipeline::new(&self.dict, &self.rules, &self.config);
        Ok(session.next_batch(&pipeline, self.config.max_batch_tokens))
    }

    /// Keep iterating the current text; same as [`Segmenter::next_batch`].
    pub fn continue_with_current_text(&mut self) -> Result<Option<Vec<Token>>> {
        self.next_batch()
    }

    /// Submit `text` when given, then return the next batch.
    pub fn get_result(&mut self, text: Option<&str>) -> Result<Option<Vec<Token>>> {
        if let Some(text) = text {
            self.submit_text(text)?;
        }
        self.next_batch()
    }

    /// Restart iteration of the current text.
    pub fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.session.as_mut().ok_or(CwsError::NotConfigured)?.rewind();
        Ok(())
    }

    fn session(&self) -> Result<&Session> {
        self.ensure_open()?;
        self.session.as_ref().ok_or(CwsError::NotConfigured)
    }

    /// Heaviest words of the current text. `limit` defaults to
    /// `config.tops_limit`. Scans the whole text; the iteration cursor is
    /// not touched.
    pub fn tops(&self, limit: Option<usize>, filter: &AttrFilter) -> Result<Vec<RankedWord>> {
        let session = self.session()?;
        let pipeline = Pipeline::new(&self.dict, &self.rules, &self.config);
        let limit = limit.unwrap_or(self.config.tops_limit);
        Ok(ranker::rank(session.stream(pipeline), &self.rules, filter, limit))
    }

    /// Every token of the current text whose attribute passes `filter`.
    pub fn words(&self, filter: &AttrFilter) -> Result<Vec<Token>> {
        let session = self.session()?;
        let pipeline = Pipeline::new(&self.dict, &self.rules, &self.config);
        Ok(query::words(session.stream(pipeline), filter))
    }

    /// Whether the current text has a token whose attribute passes `filter`.
    pub fn has_words(&self, filter: &AttrFilter) -> Result<bool> {
        let session = self.session()?;
        let pipeline = Pipeline::new(&self.dict, &self.rules, &self.config);
        Ok(query::has_words(session.stream(pipeline), filter))
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// Release dictionaries, rules and the current text. Every later call
    /// fails with `Closed`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!(dictionaries = self.dict.len(), "closing segmenter");
        self.dict.clear();
        self.rules = Arc::new(RuleTable::new());
        self.session = None;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcws_core::{DictEntry, DictSource, MemoryLexicon};

    fn segmenter() -> Segmenter {
        let lx = MemoryLexicon::from_entries(vec![
            DictEntry::new("中国", "ns", 10.0, 5.0),
            DictEntry::new("人民", "n", 9.0, 4.0),
        ])
        .unwrap();
        let mut seg = Segmenter::new();
        let mut dict = Dictionary::new();
        dict.push(Arc::new(DictSource::from_memory("test", lx)));
        seg.dict = dict;
        seg
    }

    #[test]
    fn queries_before_submit_are_not_configured() {
        let mut seg = segmenter();
        assert!(matches!(seg.next_batch(), Err(CwsError::NotConfigured)));
        assert!(matches!(seg.tops(None, &AttrFilter::any()), Err(CwsError::NotConfigured)));
        assert!(matches!(seg.rewind(), Err(CwsError::NotConfigured)));
    }

    #[test]
    fn closed_segmenter_rejects_everything() {
        let mut seg = segmenter();
        seg.submit_text("中国").unwrap();
        seg.close();
        assert!(seg.is_closed());
        assert!(matches!(seg.next_batch(), Err(CwsError::Closed)));
        assert!(matches!(seg.submit_text("x"), Err(CwsError::Closed)));
        assert!(matches!(seg.set_ignore(true), Err(CwsError::Closed)));
    }

    #[test]
    fn invalid_charset_keeps_previous() {
        let mut seg = segmenter();
        seg.set_charset("GBK").unwrap();
        assert!(matches!(seg.set_charset("big5"), Err(CwsError::InvalidCharset(_))));
        assert_eq!(seg.charset(), Charset::Gbk);
    }

    #[test]
    fn tops_does_not_move_cursor() {
        let mut seg = segmenter();
        seg.submit_text("中国人民。中国").unwrap();
        let top = seg.tops(None, &AttrFilter::any()).unwrap();
        assert_eq!(top[0].word, "中国");
        assert_eq!(top[0].times, 2);
        let first = seg.next_batch().unwrap().unwrap();
        assert_eq!(first[0].text, "中国");
    }

    #[test]
    fn get_result_compat() {
        let mut seg = segmenter();
        let batch = seg.get_result(Some("人民")).unwrap().unwrap();
        assert_eq!(batch[0].text, "人民");
        assert!(seg.get_result(None).unwrap().is_none());
    }
}
