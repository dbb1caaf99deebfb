//! CSVファイル入出力

use crate::error::{ReviewAiError, Result};
use review_ai_common::{parse_reviews, to_csv, Reconciler, ReviewRow, TEMPLATE_CSV};
use std::path::{Path, PathBuf};

/// アップロードCSVを読み込む
///
/// UTF-8として不正なバイトは U+FFFD に置き換える。
pub fn read_reviews(input: &Path) -> Result<Vec<ReviewRow>> {
    if !input.exists() {
        return Err(ReviewAiError::FileNotFound(input.display().to_string()));
    }
    let bytes = std::fs::read(input)?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(parse_reviews(&content)?)
}

/// 既定の出力パス（`reviews.csv` → `reviews.processed.csv`）
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reviews");
    input.with_file_name(format!("{}.processed.csv", stem))
}

/// 処理結果をCSVで書き出し、書き出した件数を返す
pub fn write_results(reconciler: &Reconciler, output: &Path) -> Result<usize> {
    let rows = reconciler.export();
    std::fs::write(output, to_csv(&rows))?;
    tracing::info!(rows = rows.len(), path = %output.display(), "wrote results");
    Ok(rows.len())
}

/// アップロード用テンプレートを書き出し
pub fn write_template(output: &Path) -> Result<()> {
    std::fs::write(output, TEMPLATE_CSV)?;
    Ok(())
}
