//! Submitted text and the resumable result iterator.
//!
//! A [`Session`] owns the decoded text and a cursor. Each call to
//! [`Session::next_batch`] scans the next chunk (one sentence, see
//! [`crate::symbols::chunk_end`]), runs it through the mode processor and
//! hands the tokens out in batches. Nothing past the current chunk is
//! scanned until it is asked for.
//!
//! Token offsets handed out are byte units of the submitted charset.

use std::collections::VecDeque;

use libcws_core::{Charset, Config, Dictionary, RuleTable, Token};

use crate::modes::ModeProcessor;
use crate::scanner::Scanner;
use crate::symbols;

/// Scanner and mode processor bound to one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    scanner: Scanner<'a>,
    modes: ModeProcessor<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(dict: &'a Dictionary, rules: &'a RuleTable, config: &Config) -> Self {
        Self {
            scanner: Scanner::new(dict, rules, config),
            modes: ModeProcessor::new(dict, config),
        }
    }

    /// Fully processed tokens of `text[start..end]`, UTF-8 offsets.
    pub fn segment(&self, text: &str, start: usize, end: usize) -> Vec<Token> {
        self.modes.apply(self.scanner.scan(text, start, end))
    }
}

/// Maps UTF-8 byte offsets to byte offsets in the submitted charset.
/// Lookups must come in non-decreasing order between resets.
#[derive(Debug, Clone)]
pub struct OffsetMap {
    charset: Charset,
    utf8_pos: usize,
    source_pos: usize,
}

impl OffsetMap {
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            utf8_pos: 0,
            source_pos: 0,
        }
    }

    /// Rewrite `offset`/`len` of `token` in place.
    pub fn convert(&mut self, text: &str, token: &mut Token) {
        if self.charset == Charset::Utf8 {
            return;
        }
        if token.offset < self.utf8_pos {
            // expansions may start before the last mapped position
            self.utf8_pos = 0;
            self.source_pos = 0;
        }
        self.source_pos += self.charset.encoded_len(&text[self.utf8_pos..token.offset]);
        self.utf8_pos = token.offset;
        token.offset = self.source_pos;
        token.len = self.charset.encoded_len(&token.text);
    }
}

/// Lazily produce processed chunks of `text` starting at `pos`.
fn next_chunk(pipeline: &Pipeline<'_>, text: &str, pos: &mut usize, map: &mut OffsetMap) -> Option<Vec<Token>> {
    if *pos >= text.len() {
        return None;
    }
    let end = symbols::chunk_end(text, *pos);
    let mut tokens = pipeline.segment(text, *pos, end);
    *pos = end;
    for t in tokens.iter_mut() {
        map.convert(text, t);
    }
    Some(tokens)
}

/// Current text plus its iteration state.
#[derive(Debug, Clone)]
pub struct Session {
    text: String,
    charset: Charset,
    cursor: usize,
    map: OffsetMap,
    pending: VecDeque<Token>,
}

impl Session {
    pub fn new(text: String, charset: Charset) -> Self {
        tracing::debug!(bytes = text.len(), charset = charset.name(), "new session");
        Self {
            text,
            charset,
            cursor: 0,
            map: OffsetMap::new(charset),
            pending: VecDeque::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Next non-empty batch of at most `max_tokens` tokens, `None` once the
    /// text is exhausted.
    pub fn next_batch(&mut self, pipeline: &Pipeline<'_>, max_tokens: usize) -> Option<Vec<Token>> {
        let max_tokens = max_tokens.max(1);
        while self.pending.is_empty() {
            let chunk = next_chunk(pipeline, &self.text, &mut self.cursor, &mut self.map)?;
            self.pending.extend(chunk);
        }
        let take = self.pending.len().min(max_tokens);
        Some(self.pending.drain(..take).collect())
    }

    /// Restart iteration from the beginning of the text.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.map = OffsetMap::new(self.charset);
        self.pending.clear();
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.cursor >= self.text.len()
    }

    /// Independent pass over the whole text; does not move the cursor.
    pub fn stream<'s>(&'s self, pipeline: Pipeline<'s>) -> TokenStream<'s> {
        TokenStream {
            text: &self.text,
            pos: 0,
            map: OffsetMap::new(self.charset),
            pipeline,
            buffer: VecDeque::new(),
        }
    }
}

/// Token-by-token iterator over a whole text, scanning chunk by chunk.
pub struct TokenStream<'a> {
    text: &'a str,
    pos: usize,
    map: OffsetMap,
    pipeline: Pipeline<'a>,
    buffer: VecDeque<Token>,
}

impl Iterator for TokenStream<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.buffer.is_empty() {
            let chunk = next_chunk(&self.pipeline, self.text, &mut self.pos, &mut self.map)?;
            self.buffer.extend(chunk);
        }
        self.buffer.pop_front()
    }
}
