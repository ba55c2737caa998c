//! libcws crate root
//!
//! Chinese word segmentation on top of `libcws-core`: a forward maximum-match
//! scanner extended by merge rules, multi-granularity output modes, a lazy
//! result iterator, keyword ranking and attribute queries, all reachable
//! through the `Segmenter` handle.
//!
//! Public API exported here:
//! - `Segmenter` from `engine`
//! - `RankedWord` from `ranker`
//! - `Scanner`, `ModeProcessor`, `Session` for embedding the stages directly

pub mod engine;
pub mod modes;
pub mod query;
pub mod ranker;
pub mod scanner;
pub mod session;
pub mod symbols;

pub use engine::{Segmenter, VERSION};
pub use modes::ModeProcessor;
pub use ranker::RankedWord;
pub use scanner::Scanner;
pub use session::{Pipeline, Session, TokenStream};

// Convenience re-exports for common types used by callers.
pub use libcws_core::{
    AttrFilter, Charset, Config, CwsError, DictFormat, DictMode, DictSpec, MultiMode, Origin, Result, Token,
};
