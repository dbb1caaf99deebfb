//! バッチ分類
//!
//! 任意の `Classifier` をラップし、一定件数ごとに分割して呼び出す。
//! キャッシュ有効時はキャッシュ済みのレビューを送らない。

pub mod cache;

pub use cache::CacheFile;

use crate::error::Result;
use cache::cache_key;
use indicatif::{ProgressBar, ProgressStyle};
use review_ai_common::{Classifier, Error, Prediction};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub struct BatchClassifier<C> {
    inner: C,
    batch_size: usize,
    cache: Option<(PathBuf, RefCell<CacheFile>)>,
    show_progress: bool,
}

impl<C: Classifier> BatchClassifier<C> {
    pub fn new(inner: C, batch_size: usize) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            cache: None,
            show_progress: false,
        }
    }

    /// `folder` のキャッシュを使う
    pub fn with_cache(mut self, folder: &Path) -> Self {
        let cache = CacheFile::load(folder);
        tracing::debug!(entries = cache.len(), "loaded prediction cache");
        self.cache = Some((folder.to_path_buf(), RefCell::new(cache)));
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// キャッシュを保存（キャッシュ無効時は何もしない）
    pub fn save_cache(&self) -> Result<()> {
        if let Some((folder, cache)) = &self.cache {
            cache.borrow().save(folder)?;
        }
        Ok(())
    }

    /// 失敗時に完了済みバッチの予測を残す
    fn keep_partial_cache(&self) {
        if let Err(e) = self.save_cache() {
            tracing::warn!(error = %e, "failed to save partial prediction cache");
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }

    fn lookup(&self, texts: &[String], category: &str) -> Vec<Option<Prediction>> {
        match &self.cache {
            Some((_, cache)) => {
                let cache = cache.borrow();
                texts
                    .iter()
                    .map(|t| cache.get(&cache_key(category, t)).copied())
                    .collect()
            }
            None => vec![None; texts.len()],
        }
    }
}

impl<C: Classifier> Classifier for BatchClassifier<C> {
    async fn classify(&self, texts: &[String], category: &str) -> review_ai_common::Result<Vec<Prediction>> {
        let mut results = self.lookup(texts, category);
        let pending: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
            .collect();

        tracing::info!(
            total = texts.len(),
            cached = texts.len() - pending.len(),
            batch_size = self.batch_size,
            "classifying reviews"
        );

        let progress = self.progress_bar(pending.len());

        for (batch_idx, batch) in pending.chunks(self.batch_size).enumerate() {
            tracing::debug!(batch = batch_idx + 1, size = batch.len(), "classifying batch");
            let batch_texts: Vec<String> = batch.iter().map(|&i| texts[i].clone()).collect();

            let predictions = match self.inner.classify(&batch_texts, category).await {
                Ok(p) => p,
                Err(e) => {
                    progress.abandon_with_message("failed");
                    self.keep_partial_cache();
                    return Err(e);
                }
            };

            if predictions.len() != batch.len() {
                progress.abandon_with_message("failed");
                self.keep_partial_cache();
                return Err(Error::LengthMismatch {
                    expected: batch.len(),
                    actual: predictions.len(),
                });
            }

            for (&idx, prediction) in batch.iter().zip(predictions) {
                results[idx] = Some(prediction);
                if let Some((_, cache)) = &self.cache {
                    cache
                        .borrow_mut()
                        .insert(cache_key(category, &texts[idx]), category, prediction);
                }
            }
            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_ai_common::Label;
    use std::cell::Cell;
    use tempfile::tempdir;

    /// 呼び出し回数と受け取った件数を記録する分類器
    #[derive(Default)]
    struct CountingClassifier {
        calls: Cell<usize>,
        sizes: RefCell<Vec<usize>>,
        drop_last: bool,
        /// この回数目の呼び出しで失敗する
        fail_on_call: Option<usize>,
    }

    impl Classifier for CountingClassifier {
        async fn classify(&self, texts: &[String], _category: &str) -> review_ai_common::Result<Vec<Prediction>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_on_call == Some(self.calls.get()) {
                return Err(Error::Transport("connection reset".into()));
            }
            self.sizes.borrow_mut().push(texts.len());
            let mut out: Vec<Prediction> = texts
                .iter()
                .map(|t| Prediction::new(Label::Positive, t.len() as f64 / 100.0))
                .collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| "x".repeat(i + 1)).collect()
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let inner = CountingClassifier::default();
        let classifier = BatchClassifier::new(&inner, 2);

        let predictions = classifier.classify(&texts(5), "general").await.unwrap();

        assert_eq!(predictions.len(), 5);
        assert_eq!(*inner.sizes.borrow(), vec![2, 2, 1]);
        let confidences: Vec<f64> = predictions.iter().map(|p| p.confidence).collect();
        assert_eq!(confidences, vec![0.01, 0.02, 0.03, 0.04, 0.05]);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let inner = CountingClassifier::default();
        let classifier = BatchClassifier::new(&inner, 0);
        classifier.classify(&texts(2), "general").await.unwrap();
        assert_eq!(inner.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_short_batch_response_is_length_mismatch() {
        let inner = CountingClassifier {
            drop_last: true,
            ..Default::default()
        };
        let classifier = BatchClassifier::new(&inner, 10);

        let result = classifier.classify(&texts(3), "general").await;
        assert!(matches!(
            result,
            Err(Error::LengthMismatch { expected: 3, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_cache_skips_known_reviews() {
        let dir = tempdir().expect("Failed to create temp dir");

        let first = CountingClassifier::default();
        let classifier = BatchClassifier::new(&first, 10).with_cache(dir.path());
        classifier.classify(&texts(3), "food").await.unwrap();
        classifier.save_cache().expect("キャッシュ保存失敗");
        assert_eq!(CacheFile::load(dir.path()).len(), 3);

        let second = CountingClassifier::default();
        let classifier = BatchClassifier::new(&second, 10).with_cache(dir.path());
        let predictions = classifier.classify(&texts(4), "food").await.unwrap();

        assert_eq!(predictions.len(), 4);
        assert_eq!(*second.sizes.borrow(), vec![1]);
        assert_eq!(predictions[3].confidence, 0.04);
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_completed_batches_in_cache() {
        let dir = tempdir().expect("Failed to create temp dir");

        let inner = CountingClassifier {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let classifier = BatchClassifier::new(&inner, 2).with_cache(dir.path());
        let result = classifier.classify(&texts(4), "food").await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(CacheFile::load(dir.path()).len(), 2);

        // 再実行では失敗したバッチだけを送る
        let retry = CountingClassifier::default();
        let classifier = BatchClassifier::new(&retry, 2).with_cache(dir.path());
        let predictions = classifier.classify(&texts(4), "food").await.unwrap();
        assert_eq!(predictions.len(), 4);
        assert_eq!(*retry.sizes.borrow(), vec![2]);
    }

    #[tokio::test]
    async fn test_length_mismatch_does_not_cache_mismatched_batch() {
        let dir = tempdir().expect("Failed to create temp dir");

        let inner = CountingClassifier {
            drop_last: true,
            ..Default::default()
        };
        let classifier = BatchClassifier::new(&inner, 3).with_cache(dir.path());
        let result = classifier.classify(&texts(3), "food").await;

        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
        assert!(CacheFile::load(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_cache_is_per_category() {
        let dir = tempdir().expect("Failed to create temp dir");

        let inner = CountingClassifier::default();
        let classifier = BatchClassifier::new(&inner, 10).with_cache(dir.path());
        classifier.classify(&texts(2), "food").await.unwrap();
        classifier.classify(&texts(2), "service").await.unwrap();

        assert_eq!(inner.calls.get(), 2);
    }
}
