//! 対話式補正モジュール
//!
//! 絞り込み後のビューを1件ずつ表示し、補正ラベルを入力させる。
//! 予測と異なるラベルが付いたエントリはその場で保存する。

use crate::error::{ReviewAiError, Result};
use dialoguer::Input;
use review_ai_common::{CorrectionSink, Label, ProcessedEntry, Reconciler};

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// 補正ラベルを設定
    Set(Label),
    /// 現状のまま次へ
    Keep,
    /// 終了
    Quit,
}

/// 対話結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// 表示したエントリ数
    pub reviewed: usize,
    /// 保存に成功した補正
    pub saved: usize,
    /// 保存に失敗した補正（未保存のまま残る）
    pub failed: usize,
    /// 途中で終了したか
    pub quit: bool,
}

/// 入力文字列をアクションに変換（不正な入力は None）
pub fn parse_review_action(input: &str) -> Option<ReviewAction> {
    match input.trim() {
        "" | "k" => Some(ReviewAction::Keep),
        "q" | "Q" => Some(ReviewAction::Quit),
        "+" => Some(ReviewAction::Set(Label::Positive)),
        "-" => Some(ReviewAction::Set(Label::Negative)),
        "=" => Some(ReviewAction::Set(Label::Neutral)),
        other => other.parse::<Label>().ok().map(ReviewAction::Set),
    }
}

/// ビューを順に処理する
///
/// `prompt` はエントリごとに1回呼ばれ、次のアクションを返す。
pub async fn run_review<S, F>(reconciler: &Reconciler, sink: &S, mut prompt: F) -> Result<ReviewOutcome>
where
    S: CorrectionSink,
    F: FnMut(&ProcessedEntry) -> Result<ReviewAction>,
{
    let view = reconciler.view();
    let total = view.len();
    let mut outcome = ReviewOutcome::default();

    for (idx, entry) in view.iter().enumerate() {
        let snapshot = entry.snapshot();
        println!(
            "[{}/{}] {} ({}, {:.0}%)",
            idx + 1,
            total,
            snapshot.text,
            snapshot.predicted_label,
            snapshot.confidence * 100.0
        );

        match prompt(&snapshot)? {
            ReviewAction::Set(label) => {
                reconciler.apply_correction(idx, label)?;
                println!("  → {}", label);
            }
            ReviewAction::Keep => {}
            ReviewAction::Quit => {
                println!("終了します...");
                outcome.quit = true;
                break;
            }
        }
        outcome.reviewed += 1;

        if !entry.borrow().is_dirty {
            continue;
        }

        match reconciler.save_correction(idx, sink).await {
            Ok(()) => {
                outcome.saved += 1;
                println!("  ✔ 保存しました\n");
            }
            Err(e) => {
                outcome.failed += 1;
                println!("  ✗ 保存に失敗しました: {}\n", e);
            }
        }
    }

    Ok(outcome)
}

/// 端末から入力を受けて補正する
pub async fn run_interactive_review<S: CorrectionSink>(
    reconciler: &Reconciler,
    sink: &S,
) -> Result<ReviewOutcome> {
    if reconciler.view().is_empty() {
        println!("✓ 確認が必要なレビューはありません");
        return Ok(ReviewOutcome::default());
    }

    println!("---");
    println!("操作: [+]positive [-]negative [=]neutral [Enter]そのまま [q]終了");
    println!("---\n");

    run_review(reconciler, sink, |_| prompt_review_action()).await
}

/// 補正入力プロンプト（正しい入力まで繰り返す）
fn prompt_review_action() -> Result<ReviewAction> {
    loop {
        let input: String = Input::new()
            .with_prompt("補正 (+/-/= q:終了)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ReviewAiError::CliExecution(e.to_string()))?;

        match parse_review_action(&input) {
            Some(action) => return Ok(action),
            None => println!("  不明な入力です: {}", input.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_ai_common::{CorrectionRequest, Error, Prediction, ReviewRow};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct RecordingSink {
        requests: RefCell<Vec<CorrectionRequest>>,
        fail: bool,
    }

    impl CorrectionSink for RecordingSink {
        async fn save(&self, request: &CorrectionRequest) -> review_ai_common::Result<()> {
            if self.fail {
                return Err(Error::Transport("connection refused".into()));
            }
            self.requests.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    fn reconciler() -> Reconciler {
        let rows: Vec<ReviewRow> = ["Great phone", "Meh", "Broken"]
            .iter()
            .map(|t| ReviewRow {
                text: t.to_string(),
                ..Default::default()
            })
            .collect();
        let predictions = vec![
            Prediction::new(Label::Positive, 0.95),
            Prediction::new(Label::Positive, 0.55),
            Prediction::new(Label::Neutral, 0.40),
        ];
        let reconciler = Reconciler::new();
        reconciler.ingest(&rows, &predictions).unwrap();
        reconciler
    }

    fn scripted(actions: Vec<ReviewAction>) -> impl FnMut(&ProcessedEntry) -> Result<ReviewAction> {
        let mut queue: VecDeque<ReviewAction> = actions.into();
        move |_| Ok(queue.pop_front().unwrap_or(ReviewAction::Quit))
    }

    #[test]
    fn test_parse_review_action() {
        assert_eq!(parse_review_action(""), Some(ReviewAction::Keep));
        assert_eq!(parse_review_action("  "), Some(ReviewAction::Keep));
        assert_eq!(parse_review_action("q"), Some(ReviewAction::Quit));
        assert_eq!(parse_review_action("+"), Some(ReviewAction::Set(Label::Positive)));
        assert_eq!(parse_review_action("-"), Some(ReviewAction::Set(Label::Negative)));
        assert_eq!(parse_review_action("="), Some(ReviewAction::Set(Label::Neutral)));
        assert_eq!(parse_review_action("neg"), Some(ReviewAction::Set(Label::Negative)));
        assert_eq!(parse_review_action("Neutral"), Some(ReviewAction::Set(Label::Neutral)));
        assert_eq!(parse_review_action("maybe"), None);
    }

    #[tokio::test]
    async fn test_review_filtered_view_saves_changes() {
        let reconciler = reconciler();
        reconciler.set_filter(true, 0.7);
        let sink = RecordingSink::default();

        let outcome = run_review(
            &reconciler,
            &sink,
            scripted(vec![
                ReviewAction::Set(Label::Negative),
                ReviewAction::Keep,
            ]),
        )
        .await
        .unwrap();

        assert_eq!(outcome.reviewed, 2);
        assert_eq!(outcome.saved, 1);
        assert!(!outcome.quit);

        let requests = sink.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].review, "Meh");
        assert_eq!(requests[0].corrected_sentiment, Label::Negative);

        let entries = reconciler.entries();
        assert!(entries[1].borrow().is_persisted);
        assert_eq!(reconciler.dirty_count(), 0);
    }

    #[tokio::test]
    async fn test_setting_predicted_label_is_not_saved() {
        let reconciler = reconciler();
        let sink = RecordingSink::default();

        let outcome = run_review(
            &reconciler,
            &sink,
            scripted(vec![ReviewAction::Set(Label::Positive), ReviewAction::Quit]),
        )
        .await
        .unwrap();

        assert_eq!(outcome.reviewed, 1);
        assert_eq!(outcome.saved, 0);
        assert!(outcome.quit);
        assert!(sink.requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_entry_dirty() {
        let reconciler = reconciler();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let outcome = run_review(
            &reconciler,
            &sink,
            scripted(vec![ReviewAction::Set(Label::Negative), ReviewAction::Quit]),
        )
        .await
        .unwrap();

        assert_eq!(outcome.failed, 1);
        assert_eq!(reconciler.dirty_count(), 1);
        assert!(!reconciler.entries()[0].borrow().is_persisted);
    }
}
