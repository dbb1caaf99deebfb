//! CSVパーサー
//!
//! アップロードされた任意のテキストをRecord列に変換する。
//! カンマ区切り + ダブルクォートエスケープのみ対応。
//!
//! 不正なクォートや列数の揃わない行はエラーにせず吸収する（寛容モード）:
//! - 閉じられていないクォートは入力末尾までをフィールドとして扱う
//! - 列が足りない行は空文字で補完、多い列は捨てる

use crate::error::{Error, Result};
use crate::types::{Record, ReviewRow};

/// ヘッダー名を正規化
///
/// 前後の空白を除去し、小文字化し、連続する空白を `_` 1文字にまとめる。
///
/// # Examples
/// ```
/// use review_ai_common::normalize_header;
///
/// assert_eq!(normalize_header("  Confidence   Score "), "confidence_score");
/// ```
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// テキストを行×フィールドに分割（1パス、バックトラックなし）
///
/// 先頭のBOMは捨てる。
fn split_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(ch),
            }
        }
    }

    // 末尾に改行がないファイル
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// CSVテキストをRecord列にパース
///
/// 1行目をヘッダーとして扱う。ヘッダーのみ・空入力の場合は空のVecを返す（エラーではない）。
///
/// # Examples
/// ```
/// use review_ai_common::parse;
///
/// let records = parse("Reviews,Sentiment\n\"Great, really\",positive\n");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].get("reviews"), Some("Great, really"));
/// ```
pub fn parse(text: &str) -> Vec<Record> {
    let mut rows = split_rows(text).into_iter();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|h| normalize_header(h)).collect(),
        None => return Vec::new(),
    };

    rows.map(|row| {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = row.get(idx).cloned().unwrap_or_default();
                (header.clone(), value)
            })
            .collect()
    })
    .collect()
}

/// アップロードテキストをReviewRow列に変換
///
/// データ行が1件もなければ `Error::ParseEmpty`。
pub fn parse_reviews(text: &str) -> Result<Vec<ReviewRow>> {
    let records = parse(text);
    if records.is_empty() {
        return Err(Error::ParseEmpty);
    }

    tracing::debug!(rows = records.len(), "parsed upload");
    Ok(records.iter().map(ReviewRow::from_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    #[test]
    fn test_parse_quoted_review_scenario() {
        let text = "reviews,sentiment,confidence_score\n\"Great, \"\"awesome\"\" phone\",positive,0.9\nBad battery,negative,0.4\n";
        let records = parse(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("reviews"), Some("Great, \"awesome\" phone"));
        assert_eq!(records[0].get("sentiment"), Some("positive"));
        assert_eq!(records[0].get("confidence_score"), Some("0.9"));
        assert_eq!(records[1].get("reviews"), Some("Bad battery"));
        assert_eq!(records[1].get("sentiment"), Some("negative"));
        assert_eq!(records[1].get("confidence_score"), Some("0.4"));
    }

    #[test]
    fn test_parse_header_only() {
        assert!(parse("reviews,sentiment,confidence_score\n").is_empty());
        assert!(parse("reviews,sentiment").is_empty());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_crlf() {
        let records = parse("reviews,sentiment\r\nok,positive\r\nbad,negative\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("sentiment"), Some("positive"));
        assert_eq!(records[1].get("reviews"), Some("bad"));
    }

    #[test]
    fn test_parse_no_trailing_newline() {
        let records = parse("a,b\n1,2");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("b"), Some("2"));
    }

    #[test]
    fn test_parse_embedded_newline_in_quotes() {
        let records = parse("reviews\n\"line one\nline two\"\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("reviews"), Some("line one\nline two"));
    }

    #[test]
    fn test_parse_crlf_inside_quotes_is_kept() {
        let records = parse("reviews\n\"a\r\nb\"\n");
        assert_eq!(records[0].get("reviews"), Some("a\r\nb"));
    }

    #[test]
    fn test_parse_unterminated_quote_is_lenient() {
        let records = parse("reviews,sentiment\n\"never closed,positive\nnext");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("reviews"),
            Some("never closed,positive\nnext")
        );
        assert_eq!(records[0].get("sentiment"), Some(""));
    }

    #[test]
    fn test_parse_short_and_long_rows() {
        let records = parse("a,b,c\n1\n1,2,3,4,5\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some("1"));
        assert_eq!(records[0].get("b"), Some(""));
        assert_eq!(records[0].get("c"), Some(""));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some("3"));
    }

    #[test]
    fn test_parse_header_normalization() {
        let records = parse(" Review Text ,CONFIDENCE\t SCORE\nx,0.5\n");
        let keys: Vec<&str> = records[0].keys().collect();
        assert_eq!(keys, vec!["review_text", "confidence_score"]);
    }

    #[test]
    fn test_parse_strips_leading_bom() {
        let records = parse("\u{feff}reviews,sentiment,confidence_score\nGreat phone,positive,0.9\n");
        let keys: Vec<&str> = records[0].keys().collect();
        assert_eq!(keys, vec!["reviews", "sentiment", "confidence_score"]);
        assert_eq!(records[0].get("reviews"), Some("Great phone"));

        let rows = parse_reviews("\u{feff}reviews\nGreat phone\n").unwrap();
        assert_eq!(rows[0].text, "Great phone");
    }

    #[test]
    fn test_parse_quote_opens_mid_field() {
        let records = parse("a,b\nab\"c,d\"e,x\n");
        assert_eq!(records[0].get("a"), Some("abc,de"));
        assert_eq!(records[0].get("b"), Some("x"));
    }

    #[test]
    fn test_parse_text_after_closing_quote_is_appended() {
        let records = parse("a,b\n\"abc\"def,x\n");
        assert_eq!(records[0].get("a"), Some("abcdef"));
        assert_eq!(records[0].get("b"), Some("x"));
    }

    #[test]
    fn test_parse_duplicate_headers_later_wins() {
        let records = parse("score,Score\n1,2\n");
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0].get("score"), Some("2"));
    }

    #[test]
    fn test_parse_reviews_coerces_rows() {
        let rows = parse_reviews("reviews,sentiment,confidence_score\nFine,,abc\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "Fine");
        assert_eq!(rows[0].sentiment, Label::Neutral);
        assert_eq!(rows[0].confidence_score, 0.0);
    }

    #[test]
    fn test_parse_reviews_header_only_is_empty_error() {
        let result = parse_reviews("reviews,sentiment,confidence_score\n");
        assert!(matches!(result, Err(Error::ParseEmpty)));
    }
}
