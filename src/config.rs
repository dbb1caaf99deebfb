use crate::error::{ReviewAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// API URLを上書きする環境変数
pub const API_URL_ENV: &str = "REVIEW_AI_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub default_category: String,
    pub default_batch_size: usize,
    pub timeout_seconds: u64,
    pub confidence_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（ファイルがなければ既定値）
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default_config()
        };

        // 環境変数を優先
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(url = %url, "api url overridden by environment");
                config.api_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReviewAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("review-ai").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_url: "http://localhost:5000".into(),
            default_category: "smartphones".into(),
            default_batch_size: 50,
            timeout_seconds: 60,
            confidence_threshold: 0.7,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_batch_size == 0 {
            return Err(ReviewAiError::Config("default_batch_size は1以上にしてください".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ReviewAiError::Config(format!(
                "confidence_threshold は0〜1の範囲で指定してください: {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = url.trim_end_matches('/').to_string();
        self.save()
    }
}
