//! ログ初期化
//!
//! RUST_LOG 環境変数でフィルタを指定できる:
//! - `RUST_LOG=debug` - すべてのdebugログ
//! - `RUST_LOG=review_ai_common::reconciler=debug` - モジュール単位
//!
//! 指定がなければ warn、`--verbose` 指定時は debug。
//! ログはstderrに出し、stdoutの進捗表示とは混ぜない。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// tracing subscriberを初期化（2回目以降は何もしない）
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(verbose)
        .with_filter(filter);

    if let Err(e) = tracing_subscriber::registry().with(console_layer).try_init() {
        eprintln!("Warning: Could not initialize logging: {}", e);
    }
}
