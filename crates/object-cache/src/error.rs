use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tokenizer error: {0}")]
    Tokenize(#[from] grepplus_tokenizer::TokenizerError),

    #[error("Invalid project path: {0}")]
    InvalidPath(String),

    #[error("Watcher error: {0}")]
    Watch(String),
}
