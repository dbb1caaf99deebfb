//! 分類API連携
//!
//! - POST /predict-batch: レビュー一括分類
//! - POST /predict: 1件分類
//! - POST /corrections: 補正保存
//!
//! 接続失敗・タイムアウト・2xx以外・レスポンス不正はすべて `Error::Transport`。

mod types;

use crate::config::Config;
use crate::error::{ReviewAiError, Result};
use review_ai_common::{Classifier, CorrectionRequest, CorrectionSink, Error, Prediction};
use serde::Serialize;
use std::time::Duration;
use types::{BatchRequest, BatchResponse, SingleRequest};

pub const PREDICT_SINGLE: &str = "/predict";
pub const PREDICT_BATCH: &str = "/predict-batch";
pub const SAVE_CORRECTION: &str = "/corrections";

/// 分類APIクライアント
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("review-ai/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewAiError::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_seconds))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> review_ai_common::Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "POST");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "API returned an error status");
            return Err(Error::Transport(format!("API error: {}", status.as_u16())));
        }

        Ok(response)
    }

    /// レビューを一括分類
    pub async fn predict_batch(
        &self,
        reviews: &[String],
        category: &str,
    ) -> review_ai_common::Result<Vec<Prediction>> {
        let response = self
            .post_json(PREDICT_BATCH, &BatchRequest { reviews, category })
            .await?;

        let body: BatchResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("レスポンスのパースに失敗: {}", e)))?;

        tracing::debug!(requested = reviews.len(), received = body.predictions.len(), "batch prediction");
        Ok(body.predictions)
    }

    /// レビュー1件を分類
    pub async fn predict_single(
        &self,
        review: &str,
        category: &str,
    ) -> review_ai_common::Result<Prediction> {
        let response = self
            .post_json(PREDICT_SINGLE, &SingleRequest { review, category })
            .await?;

        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("レスポンスのパースに失敗: {}", e)))
    }

    /// 補正を保存
    pub async fn save_correction(&self, request: &CorrectionRequest) -> review_ai_common::Result<()> {
        self.post_json(SAVE_CORRECTION, request).await?;
        Ok(())
    }
}

impl Classifier for ApiClient {
    async fn classify(&self, texts: &[String], category: &str) -> review_ai_common::Result<Vec<Prediction>> {
        self.predict_batch(texts, category).await
    }
}

impl CorrectionSink for ApiClient {
    async fn save(&self, request: &CorrectionRequest) -> review_ai_common::Result<()> {
        self.save_correction(request).await
    }
}
