use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenizerError>;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Failed to load Python grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Parser produced no syntax tree")]
    Parse,
}
