use clap::Parser;
use review_ai_common::{confidence_histogram, Reconciler, ReviewRow};
use review_ai_rust::{analyzer, cli, client, config, error, export, logging, review};
use analyzer::{BatchClassifier, CacheFile};
use cli::{Cli, Commands, KNOWN_CATEGORIES};
use client::ApiClient;
use config::Config;
use error::{ReviewAiError, Result};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let api_url = cli.api_url.as_deref();

    match cli.command {
        Commands::Template { output } => {
            export::write_template(&output)?;
            println!("✔ テンプレートを出力: {}", output.display());
        }

        Commands::Inspect { input } => {
            println!("🔍 review-ai - CSV確認\n");

            let rows = export::read_reviews(&input)?;
            println!("✔ {}件のレビューを検出\n", rows.len());

            for (idx, row) in rows.iter().take(5).enumerate() {
                println!("  {}. {} ({}, {:.2})", idx + 1, row.text, row.sentiment, row.confidence_score);
            }
            if rows.len() > 5 {
                println!("  ... 他{}件", rows.len() - 5);
            }

            println!("\n信頼度分布（入力値）:");
            print_histogram(rows.iter().map(|r| r.confidence_score));
        }

        Commands::Analyze { input, output, category, batch_size, use_cache } => {
            println!("📝 review-ai - 一括分類\n");
            let config = api_config(api_url)?;

            println!("[1/3] CSVを読み込み中...");
            let rows = export::read_reviews(&input)?;
            println!("✔ {}件のレビューを検出\n", rows.len());

            println!("[2/3] AI分類中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let category = resolve_category(category, &config);
            let batch_size = batch_size.unwrap_or(config.default_batch_size);
            let client = ApiClient::from_config(&config)?;
            let reconciler = Reconciler::new();
            let cache_dir = use_cache.then(|| input_folder(&input));
            classify_rows(&reconciler, &rows, &client, &category, batch_size, cache_dir.as_deref(), cli.verbose).await?;
            println!("✔ 分類完了\n");

            print_summary(&reconciler);

            println!("[3/3] 結果を保存中...");
            let output = output.unwrap_or_else(|| export::default_output_path(&input));
            let written = export::write_results(&reconciler, &output)?;
            println!("✔ {}件を保存: {}", written, output.display());

            println!("\n✅ 分類完了");
        }

        Commands::Review { input, output, category, batch_size, threshold, all, use_cache } => {
            println!("✏️ review-ai - 補正\n");
            let config = api_config(api_url)?;

            let threshold = threshold.unwrap_or(config.confidence_threshold);
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ReviewAiError::InvalidArgument(format!(
                    "閾値は0〜1の範囲で指定してください: {}",
                    threshold
                )));
            }

            println!("[1/4] CSVを読み込み中...");
            let rows = export::read_reviews(&input)?;
            println!("✔ {}件のレビューを検出\n", rows.len());

            println!("[2/4] AI分類中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let category = resolve_category(category, &config);
            let batch_size = batch_size.unwrap_or(config.default_batch_size);
            let client = ApiClient::from_config(&config)?;
            let reconciler = Reconciler::new();
            let cache_dir = use_cache.then(|| input_folder(&input));
            classify_rows(&reconciler, &rows, &client, &category, batch_size, cache_dir.as_deref(), cli.verbose).await?;
            println!("✔ 分類完了\n");

            reconciler.set_filter(!all, threshold);
            if all {
                println!("[3/4] 全{}件を確認", reconciler.view().len());
            } else {
                println!(
                    "[3/4] 信頼度{:.0}%未満: {}件",
                    threshold * 100.0,
                    reconciler.view().len()
                );
            }
            let outcome = review::run_interactive_review(&reconciler, &client).await?;
            println!(
                "✔ 確認{}件 / 保存{}件 / 保存失敗{}件\n",
                outcome.reviewed, outcome.saved, outcome.failed
            );

            print_summary(&reconciler);

            println!("[4/4] 結果を保存中...");
            let output = output.unwrap_or_else(|| export::default_output_path(&input));
            let written = export::write_results(&reconciler, &output)?;
            println!("✔ {}件を保存: {}", written, output.display());

            let dirty = reconciler.dirty_count();
            if dirty > 0 {
                println!("⚠ 未保存の補正が{}件あります（CSVには反映済み）", dirty);
            }
            println!("\n✅ 補正完了");
        }

        Commands::Predict { text, category } => {
            let config = api_config(api_url)?;
            let category = resolve_category(category, &config);
            let client = ApiClient::from_config(&config)?;
            let prediction = client.predict_single(&text, &category).await?;
            println!(
                "{} ({:.0}%)",
                prediction.label,
                review_ai_common::types::round_confidence(prediction.confidence) * 100.0
            );
        }

        Commands::Config { set_api_url, show } => {
            // 壊れた設定ファイルでもURLの再設定はできるようにする
            let mut config = match Config::load() {
                Ok(config) => config,
                Err(e) if set_api_url.is_some() => {
                    println!("⚠ 設定ファイルを読み込めないため既定値から作り直します: {}", e);
                    Config::default()
                }
                Err(e) => return Err(e),
            };

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ API URLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  API URL: {}", config.api_url);
                println!("  カテゴリ: {}", config.default_category);
                println!("  バッチサイズ: {}", config.default_batch_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  信頼度の閾値: {}", config.confidence_threshold);
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = CacheFile::cache_path(&target);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if cache_path.exists() {
                    let cache = CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// APIを使うコマンドの設定（--api-url が最優先）
fn api_config(api_url: Option<&str>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    Ok(config)
}

fn resolve_category(category: Option<String>, config: &Config) -> String {
    let category = category.unwrap_or_else(|| config.default_category.clone());
    if !KNOWN_CATEGORIES.contains(&category.as_str()) {
        tracing::warn!(category = %category, "unknown category, sending as-is");
    }
    category
}

/// キャッシュは入力CSVと同じフォルダに置く
fn input_folder(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn classify_rows(
    reconciler: &Reconciler,
    rows: &[ReviewRow],
    client: &ApiClient,
    category: &str,
    batch_size: usize,
    cache_dir: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let mut classifier = BatchClassifier::new(client, batch_size).with_progress(!verbose);
    if let Some(dir) = cache_dir {
        classifier = classifier.with_cache(dir);
    }

    reconciler.classify_and_ingest(rows, category, &classifier).await?;
    classifier.save_cache()?;
    Ok(())
}

fn print_summary(reconciler: &Reconciler) {
    let summary = reconciler.summary();
    println!("集計:");
    println!("  合計: {}", summary.total);
    println!("  positive: {} / negative: {} / neutral: {}", summary.positive, summary.negative, summary.neutral);
    println!("  低信頼度: {}", summary.low_confidence);
    println!("  補正: {}（保存済み {}）\n", summary.corrected, summary.saved);

    println!("信頼度分布:");
    print_histogram(reconciler.entries().iter().map(|e| e.borrow().confidence));
    println!();
}

fn print_histogram(confidences: impl IntoIterator<Item = f64>) {
    for bucket in confidence_histogram(confidences) {
        println!("  {:>8}: {}", bucket.range, bucket.count);
    }
}
