//! Character classes used by the scanner.

use phf::phf_set;

/// Characters that end a sentence. The scanner never lets a rule reach
/// across one of these, and a scan chunk always ends right after them.
static TERMINATORS: phf::Set<char> = phf_set! {
    '。', '！', '？', '!', '?', '；', ';', '\n', '…',
};

pub fn is_terminator(ch: char) -> bool {
    TERMINATORS.contains(&ch)
}

/// Punctuation and symbols: anything that is neither a letter, a digit nor
/// whitespace.
pub fn is_symbol(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_alphanumeric()
}

/// Byte index just past the chunk starting at `start`: the first terminator
/// plus any terminators and whitespace directly after it, or the end of text.
pub fn chunk_end(text: &str, start: usize) -> usize {
    let rest = &text[start..];
    let mut iter = rest.char_indices();
    let mut end = None;
    for (i, ch) in iter.by_ref() {
        if is_terminator(ch) {
            end = Some(i + ch.len_utf8());
            break;
        }
    }
    let Some(mut end) = end else {
        return text.len();
    };
    for (i, ch) in iter {
        if is_terminator(ch) || ch.is_whitespace() {
            end = i + ch.len_utf8();
        } else {
            break;
        }
    }
    start + end
}
