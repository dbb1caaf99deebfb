//! CSVエクスポート
//!
//! パーサーと同じクォート規則で書き出すので、出力はそのまま再アップロードできる。

use crate::types::ExportRow;

/// アップロード用テンプレート
pub const TEMPLATE_CSV: &str = "reviews,sentiment,confidence_score\n";

/// エクスポートのヘッダー行
pub const EXPORT_HEADERS: [&str; 4] = ["reviews", "sentiment", "confidence_score", "corrected_sentiment"];

/// 常にクォートで囲む（内部の `"` は二重化）
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// 区切り文字・クォート・改行を含む場合のみクォート
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote(value)
    } else {
        value.to_string()
    }
}

/// 処理済み結果をCSVに変換
///
/// レビュー本文は常にクォートする。行区切りは `\n`、末尾改行なし。
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(EXPORT_HEADERS.join(","));

    for row in rows {
        lines.push(
            [
                quote(&row.text),
                escape_field(row.label.as_str()),
                escape_field(&row.confidence.to_string()),
                escape_field(row.corrected_label.as_str()),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}
