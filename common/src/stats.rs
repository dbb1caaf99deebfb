//! 集計
//!
//! ダッシュボード表示用の件数集計と信頼度ヒストグラム。

use crate::types::{Label, ProcessedEntry};
use std::ops::Deref;

/// 低信頼度とみなす固定の境界値
pub const LOW_CONFIDENCE_CUTOFF: f64 = 0.7;

/// ヒストグラムの区間（%表記のラベル, 下限, 上限）
const BUCKETS: [(&str, f64, f64); 5] = [
    ("50-60%", 0.5, 0.6),
    ("60-70%", 0.6, 0.7),
    ("70-80%", 0.7, 0.8),
    ("80-90%", 0.8, 0.9),
    ("90-100%", 0.9, 1.0),
];

/// 件数サマリー（予測ラベル基準）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub low_confidence: usize,
    /// 予測と異なる補正が入っている件数
    pub corrected: usize,
    /// 補正が保存済みの件数
    pub saved: usize,
}

impl Summary {
    pub fn from_entries<E>(entries: impl IntoIterator<Item = E>) -> Self
    where
        E: Deref<Target = ProcessedEntry>,
    {
        let mut summary = Summary::default();
        for entry in entries {
            summary.total += 1;
            match entry.predicted_label {
                Label::Positive => summary.positive += 1,
                Label::Negative => summary.negative += 1,
                Label::Neutral => summary.neutral += 1,
            }
            if entry.confidence < LOW_CONFIDENCE_CUTOFF {
                summary.low_confidence += 1;
            }
            if entry.corrected_label != entry.predicted_label {
                summary.corrected += 1;
            }
            if entry.is_persisted {
                summary.saved += 1;
            }
        }
        summary
    }
}

/// 信頼度ヒストグラムの1区間
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceBucket {
    pub range: &'static str,
    pub count: usize,
}

/// 信頼度ヒストグラム
///
/// 各区間は下限を含み上限を含まない。最後の区間のみ1.0を含む。0.5未満はどこにも入らない。
pub fn confidence_histogram(confidences: impl IntoIterator<Item = f64>) -> Vec<ConfidenceBucket> {
    let mut counts = [0usize; BUCKETS.len()];
    for c in confidences {
        let last = BUCKETS.len() - 1;
        let hit = BUCKETS.iter().position(|&(_, min, max)| c >= min && c < max);
        match hit {
            Some(idx) => counts[idx] += 1,
            None if c == BUCKETS[last].2 => counts[last] += 1,
            None => {}
        }
    }

    BUCKETS
        .iter()
        .zip(counts)
        .map(|(&(range, _, _), count)| ConfidenceBucket { range, count })
        .collect()
}
