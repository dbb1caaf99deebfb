use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("不正な引数: {0}")]
    InvalidArgument(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),

    #[error(transparent)]
    Common(#[from] review_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, ReviewAiError>;
