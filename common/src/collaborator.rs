//! 外部コラボレータの契約
//!
//! バッチ分類と補正保存は外部サービスに委譲する。
//! ここでは入出力の形だけを定め、通信手段には依存しない。

use crate::error::Result;
use crate::types::{CorrectionRequest, Prediction};

/// バッチ分類
///
/// 入力と同じ件数・同じ順序で予測を返すこと。
#[allow(async_fn_in_trait)]
pub trait Classifier {
    async fn classify(&self, texts: &[String], category: &str) -> Result<Vec<Prediction>>;
}

/// 補正1件の保存（成功/失敗のみ）
#[allow(async_fn_in_trait)]
pub trait CorrectionSink {
    async fn save(&self, request: &CorrectionRequest) -> Result<()>;
}

impl<T: Classifier> Classifier for &T {
    async fn classify(&self, texts: &[String], category: &str) -> Result<Vec<Prediction>> {
        (**self).classify(texts, category).await
    }
}

impl<T: CorrectionSink> CorrectionSink for &T {
    async fn save(&self, request: &CorrectionRequest) -> Result<()> {
        (**self).save(request).await
    }
}
