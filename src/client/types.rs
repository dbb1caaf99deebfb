//! 分類APIのリクエスト/レスポンス型

use review_ai_common::Prediction;
use serde::{Deserialize, Serialize};

/// POST /predict-batch
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub reviews: &'a [String],
    pub category: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<Prediction>,
}

/// POST /predict
#[derive(Debug, Serialize)]
pub struct SingleRequest<'a> {
    pub review: &'a str,
    pub category: &'a str,
}
