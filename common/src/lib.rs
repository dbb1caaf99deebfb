//! Review AI Common Library
//!
//! CLIと各フロントエンドで共有される型とロジック:
//! CSVパーサー、補正リコンサイラ、エクスポート、集計

pub mod types;
pub mod error;
pub mod parser;
pub mod collaborator;
pub mod reconciler;
pub mod export;
pub mod stats;

pub use types::{CorrectionRequest, ExportRow, Label, Prediction, ProcessedEntry, Record, ReviewRow};
pub use error::{Error, Result};
pub use parser::{normalize_header, parse, parse_reviews};
pub use collaborator::{Classifier, CorrectionSink};
pub use reconciler::{EntryRef, Reconciler, ViewFilter};
pub use export::{to_csv, TEMPLATE_CSV};
pub use stats::{confidence_histogram, ConfidenceBucket, Summary, LOW_CONFIDENCE_CUTOFF};
