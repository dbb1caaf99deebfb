//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("File is empty: no data rows after the header")]
    ParseEmpty,

    #[error("Length mismatch: requested {expected} predictions, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Entry not found for view index {0}")]
    NotFound(usize),

    #[error("Failed to save correction: {0}")]
    Save(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
