//! # grep++ Protocol
//!
//! Wire types for the remote indexing service.
//!
//! The version controller talks to the indexing service through two
//! endpoints:
//!
//! - `POST /update` — [`UpdateRequest`]: a file's tokenized lines
//! - `POST /delete` — [`DeleteRequest`]: a file that left the index
//!
//! Both answer `200 OK` with a [`StatusResponse`] on success.

use serde::{Deserialize, Serialize};

/// One lexical token with its symbolic type and source position.
///
/// Positions are `"row,col"` strings with a 1-based row and 0-based
/// column, matching the tokenizer's coordinate convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: String,
    pub token_str: String,
    pub start_pos: String,
    pub end_pos: String,
}

impl Token {
    pub fn new(
        token_type: impl Into<String>,
        token_str: impl Into<String>,
        start: (usize, usize),
        end: (usize, usize),
    ) -> Self {
        Self {
            token_type: token_type.into(),
            token_str: token_str.into(),
            start_pos: format!("{},{}", start.0, start.1),
            end_pos: format!("{},{}", end.0, end.1),
        }
    }
}

/// One tokenized line of code as sent to the indexing service.
///
/// `line` is the 0-based position within the update payload, not the
/// physical row in the source file (blank lines are not shipped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLine {
    pub tokens: Vec<Token>,
    pub code: String,
    pub line: usize,
}

/// Body of `POST /update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub dir: String,
    pub path: String,
    pub lines: Vec<CodeLine>,
}

/// Body of `POST /delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub dir: String,
    pub path: String,
}

/// Response body returned by the indexing service on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
