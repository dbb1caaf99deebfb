//! レビュー解析の型定義
//!
//! CLIと各フロントエンドで共有される型:
//! - Record: CSVパーサーの出力（ヘッダー → 値）
//! - ReviewRow: Recordを型変換したアップロード行
//! - Prediction: 分類APIの出力
//! - ProcessedEntry: リコンサイラが保持する正本エントリ

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 感情ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Positive, Label::Negative, Label::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" => Ok(Label::Positive),
            "negative" | "neg" => Ok(Label::Negative),
            "neutral" | "neu" => Ok(Label::Neutral),
            _ => Err(format!("Unknown label: {}. Use positive, negative, or neutral", s)),
        }
    }
}

/// CSVの1行（正規化済みヘッダー → 生の値）
///
/// ヘッダーの出現順を保持する。同名ヘッダーは後の値で上書き（位置は最初のまま）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を設定（既存キーは上書き）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// アップロード行（Recordを型変換したもの）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    #[serde(rename = "reviews")]
    pub text: String,
    pub sentiment: Label,
    pub confidence_score: f64,
}

impl ReviewRow {
    /// Recordから変換
    ///
    /// 欠損・不正値は寛容に扱う:
    /// - reviews がない → 空文字
    /// - sentiment が読めない → neutral
    /// - confidence_score が読めない → 0
    pub fn from_record(record: &Record) -> Self {
        let text = record.get("reviews").unwrap_or_default().to_string();
        let sentiment = record
            .get("sentiment")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let confidence_score = record
            .get("confidence_score")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|c| c.is_finite())
            .unwrap_or(0.0);

        Self {
            text,
            sentiment,
            confidence_score,
        }
    }
}

/// 分類APIの1件分の出力
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "sentiment", alias = "label")]
    pub label: Label,
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: Label, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// 信頼度を小数2桁に丸める（範囲外は0〜1に収める）
pub fn round_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return 0.0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// リコンサイラの正本エントリ
///
/// `corrected_label` 以外は取り込み後に変化しない。
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedEntry {
    pub text: String,
    pub predicted_label: Label,
    pub confidence: f64,
    pub corrected_label: Label,
    pub is_dirty: bool,
    pub is_persisted: bool,
}

impl ProcessedEntry {
    pub fn new(text: impl Into<String>, prediction: Prediction) -> Self {
        Self {
            text: text.into(),
            predicted_label: prediction.label,
            confidence: round_confidence(prediction.confidence),
            corrected_label: prediction.label,
            is_dirty: false,
            is_persisted: false,
        }
    }

    /// 補正ラベルを設定（予測と同じならdirtyにしない）
    pub(crate) fn set_correction(&mut self, label: Label) {
        self.corrected_label = label;
        self.is_dirty = label != self.predicted_label;
        self.is_persisted = false;
    }

    /// 保存完了を反映
    ///
    /// `saved` は保存リクエスト発行時点の補正ラベル。その後に別の補正が入っていれば
    /// そちらは未保存のまま残す。
    pub(crate) fn settle_saved(&mut self, saved: Label) {
        if self.corrected_label == saved {
            self.is_persisted = true;
            self.is_dirty = false;
        } else {
            self.is_persisted = false;
            self.is_dirty = self.corrected_label != self.predicted_label;
        }
    }

    pub fn correction_request(&self) -> CorrectionRequest {
        CorrectionRequest {
            review: self.text.clone(),
            original_sentiment: self.predicted_label,
            corrected_sentiment: self.corrected_label,
        }
    }

    pub fn export_row(&self) -> ExportRow {
        ExportRow {
            text: self.text.clone(),
            label: self.predicted_label,
            confidence: self.confidence,
            corrected_label: self.corrected_label,
        }
    }
}

/// 補正保存APIのリクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub review: String,
    pub original_sentiment: Label,
    pub corrected_sentiment: Label,
}

/// エクスポート用の読み取り専用ビュー
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub text: String,
    pub label: Label,
    pub confidence: f64,
    pub corrected_label: Label,
}
