use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 分類APIが想定するカテゴリ（これ以外もそのまま送信する）
pub const KNOWN_CATEGORIES: [&str; 5] = ["smartphones", "laptops", "service", "food", "general"];

#[derive(Parser)]
#[command(name = "review-ai")]
#[command(about = "レビュー感情分析・補正ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 分類APIのURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// アップロード用CSVテンプレートを出力
    Template {
        /// 出力ファイル
        #[arg(short, long, default_value = "reviews_template.csv")]
        output: PathBuf,
    },

    /// CSVを読み込んで内容を確認（APIは呼ばない）
    Inspect {
        /// 入力CSVファイル
        #[arg(required = true)]
        input: PathBuf,
    },

    /// CSVを一括分類して結果を出力
    Analyze {
        /// 入力CSVファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力CSV（デフォルト: 入力名.processed.csv）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// カテゴリ (smartphones/laptops/service/food/general)
        #[arg(short, long)]
        category: Option<String>,

        /// バッチサイズ（一度に送るレビュー数）
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// キャッシュを使用（分類済みレビューをスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 分類後、低信頼度のレビューを対話式で補正
    Review {
        /// 入力CSVファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力CSV（デフォルト: 入力名.processed.csv）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// カテゴリ
        #[arg(short, long)]
        category: Option<String>,

        /// バッチサイズ
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// 信頼度の閾値（これ未満を表示、0.0-1.0）
        #[arg(short, long)]
        threshold: Option<f64>,

        /// 閾値で絞り込まず全件表示
        #[arg(long)]
        all: bool,

        /// キャッシュを使用
        #[arg(long)]
        use_cache: bool,
    },

    /// 1件のレビューを分類
    Predict {
        /// レビュー本文
        #[arg(required = true)]
        text: String,

        /// カテゴリ
        #[arg(short, long)]
        category: Option<String>,
    },

    /// 設定管理
    Config {
        /// API URLを保存
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（デフォルト: カレントディレクトリ）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
