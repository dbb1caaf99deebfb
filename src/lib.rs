//! review-ai-rust
//!
//! CSVで受け取ったレビューを外部APIで一括分類し、
//! 低信頼度の結果を人手で補正・保存するためのツール群

pub mod analyzer;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod review;
