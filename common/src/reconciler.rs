//! 補正リコンサイラ
//!
//! 処理済みエントリの正本リストを保持し、信頼度フィルタで絞り込んだビューを提供する。
//! ビュー上の位置で指定された補正・保存は、位置の再計算ではなく
//! エントリの同一性（ハンドル）で正本に反映する。
//!
//! ## 不変条件
//! - 正本の順序は取り込み順のまま。フィルタ・補正・保存で並び替えない
//! - ビューの各要素は正本のいずれか1要素と同一オブジェクト（複製しない）
//! - `is_dirty` と `is_persisted` が同時に真になることはない

use crate::collaborator::{Classifier, CorrectionSink};
use crate::error::{Error, Result};
use crate::stats::Summary;
use crate::types::{ExportRow, Label, Prediction, ProcessedEntry, ReviewRow};
use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

/// 既定の信頼度しきい値
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// 正本エントリへのハンドル
///
/// クローンしても同じエントリを指す。外部からは読み取りのみ。
#[derive(Debug, Clone)]
pub struct EntryRef(Rc<RefCell<ProcessedEntry>>);

impl EntryRef {
    fn new(entry: ProcessedEntry) -> Self {
        Self(Rc::new(RefCell::new(entry)))
    }

    pub fn borrow(&self) -> Ref<'_, ProcessedEntry> {
        self.0.borrow()
    }

    pub fn snapshot(&self) -> ProcessedEntry {
        self.0.borrow().clone()
    }

    /// 同一エントリかどうか（値ではなく参照で比較）
    pub fn same_entry(&self, other: &EntryRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn update<R>(&self, f: impl FnOnce(&mut ProcessedEntry) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// ビューの絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFilter {
    /// 低信頼度のみ表示するか
    pub active: bool,
    /// この値未満を低信頼度とみなす
    pub threshold: f64,
}

impl ViewFilter {
    pub fn all() -> Self {
        Self {
            active: false,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn below(threshold: f64) -> Self {
        Self {
            active: true,
            threshold,
        }
    }

    pub fn matches(&self, entry: &ProcessedEntry) -> bool {
        !self.active || entry.confidence < self.threshold
    }
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// 正本リストとフィルタ済みビューをまとめて管理する
///
/// シングルスレッド前提。保存の完了待ち中も他の操作を受け付けられるよう、
/// すべての操作は `&self` で内部可変性を使う。
#[derive(Debug, Default)]
pub struct Reconciler {
    entries: RefCell<Vec<EntryRef>>,
    filter: Cell<ViewFilter>,
    /// フィルタ済みビューのメモ（取り込み・フィルタ変更で破棄）
    view: RefCell<Option<Vec<EntryRef>>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 予測結果を取り込み、正本リストを作り直す
    ///
    /// 件数が一致しなければ `LengthMismatch` を返し、既存の正本はそのまま残す。
    pub fn ingest(&self, rows: &[ReviewRow], predictions: &[Prediction]) -> Result<Vec<EntryRef>> {
        if rows.len() != predictions.len() {
            tracing::warn!(
                expected = rows.len(),
                actual = predictions.len(),
                "prediction count does not match row count"
            );
            return Err(Error::LengthMismatch {
                expected: rows.len(),
                actual: predictions.len(),
            });
        }

        let fresh: Vec<EntryRef> = rows
            .iter()
            .zip(predictions)
            .map(|(row, prediction)| EntryRef::new(ProcessedEntry::new(row.text.clone(), *prediction)))
            .collect();

        *self.entries.borrow_mut() = fresh.clone();
        self.view.borrow_mut().take();

        tracing::info!(entries = fresh.len(), "ingested predictions");
        Ok(fresh)
    }

    /// バッチ分類を実行して取り込む
    ///
    /// 分類の失敗・件数不一致のいずれでも既存の正本は変更しない。
    pub async fn classify_and_ingest<C: Classifier>(
        &self,
        rows: &[ReviewRow],
        category: &str,
        classifier: &C,
    ) -> Result<Vec<EntryRef>> {
        let texts: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        let predictions = classifier.classify(&texts, category).await?;
        self.ingest(rows, &predictions)
    }

    /// フィルタを差し替える（ビューは次回参照時に再計算）
    pub fn set_filter(&self, active: bool, threshold: f64) {
        let filter = ViewFilter { active, threshold };
        if self.filter.replace(filter) != filter {
            self.view.borrow_mut().take();
        }
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter.get()
    }

    /// フィルタ済みビュー（正本の相対順序を保つ）
    pub fn view(&self) -> Vec<EntryRef> {
        if let Some(view) = self.view.borrow().as_ref() {
            return view.clone();
        }

        let filter = self.filter.get();
        let view: Vec<EntryRef> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| filter.matches(&entry.borrow()))
            .cloned()
            .collect();

        *self.view.borrow_mut() = Some(view.clone());
        view
    }

    /// 正本リスト
    pub fn entries(&self) -> Vec<EntryRef> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// エントリが現在の正本に含まれるか
    pub fn contains(&self, entry: &EntryRef) -> bool {
        self.entries.borrow().iter().any(|e| e.same_entry(entry))
    }

    /// ビュー上の位置から正本エントリを特定
    pub fn resolve(&self, view_index: usize) -> Result<EntryRef> {
        let entry = self
            .view()
            .get(view_index)
            .cloned()
            .ok_or(Error::NotFound(view_index))?;

        if !self.contains(&entry) {
            return Err(Error::NotFound(view_index));
        }
        Ok(entry)
    }

    /// ビュー上のエントリに補正ラベルを設定
    pub fn apply_correction(&self, view_index: usize, label: Label) -> Result<()> {
        let entry = self.resolve(view_index)?;
        entry.update(|e| e.set_correction(label));
        tracing::debug!(view_index, label = %label, "applied correction");
        Ok(())
    }

    /// ビュー上のエントリの補正を保存
    ///
    /// エントリの特定と送信内容の確定は呼び出し時点で行う。返された Future は
    /// 保存完了後、確定済みのエントリにだけ結果を反映する（位置の再解決はしない）。
    /// 失敗時はエントリの状態を変えず、エラーを `Error::Save` として返す。
    pub fn save_correction<'a, S: CorrectionSink>(
        &'a self,
        view_index: usize,
        sink: &'a S,
    ) -> impl Future<Output = Result<()>> + 'a {
        let resolved = self.resolve(view_index).map(|entry| {
            let request = entry.borrow().correction_request();
            (entry, request)
        });

        async move {
            let (entry, request) = resolved?;
            tracing::debug!(
                view_index,
                corrected = %request.corrected_sentiment,
                "saving correction"
            );

            match sink.save(&request).await {
                Ok(()) => {
                    entry.update(|e| e.settle_saved(request.corrected_sentiment));
                    if !self.contains(&entry) {
                        tracing::debug!(view_index, "saved entry was replaced by a newer ingest");
                    }
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(view_index, error = %err, "failed to save correction");
                    Err(match err {
                        Error::Save(msg) => Error::Save(msg),
                        other => Error::Save(other.to_string()),
                    })
                }
            }
        }
    }

    /// 未保存の補正件数
    pub fn dirty_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.borrow().is_dirty)
            .count()
    }

    /// 正本の読み取り専用エクスポート（順序保持）
    pub fn export(&self) -> Vec<ExportRow> {
        self.entries
            .borrow()
            .iter()
            .map(|e| e.borrow().export_row())
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let entries = self.entries.borrow();
        Summary::from_entries(entries.iter().map(|e| e.borrow()))
    }
}
