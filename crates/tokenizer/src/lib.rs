//! # grep++ Tokenizer
//!
//! Python tokenizer built on the tree-sitter Python grammar.
//!
//! Produces the [`CodeLine`](grepplus_protocol::CodeLine) payload shipped
//! to the indexing service: each logical line (bracket continuations and
//! multi-line strings included) becomes one entry carrying its tokens,
//! the stripped source text, and a 0-based sequence number.
//!
//! Token types are symbolic names rather than raw grammar kinds, so the
//! embedding side sees `DEF`, `ASSIGN`, `NUMBER` instead of node kinds.
//! Names not covered by the keyword/literal/punctuation maps fall back
//! to `NAME`; unmapped operators fall back to `OP`.

mod error;
mod tokenize;

pub use error::{Result, TokenizerError};
pub use tokenize::Tokenizer;

use std::path::Path;

/// File extensions the tokenizer understands.
pub const TRACKED_EXTENSIONS: &[&str] = &["py"];

/// Whether a path points at a file the tokenizer can process.
#[must_use]
pub fn is_tokenizable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TRACKED_EXTENSIONS.contains(&ext))
}
