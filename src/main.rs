use anyhow::Context;
use clap::Parser;
use ink_merge::applier::ImageContext;
use ink_merge::export::{ExportFormat, ExportSettings, FileSink, InkscapeExporter};
use ink_merge::orchestrator::{MergeOptions, Merger, Template};
use ink_merge::source::{filter_rows_by_range, read_table, EncodingDetector};
use ink_merge::{cli, config, error, export, scanner};
use ink_merge_common::{classify_headers, partition_records};
use cli::{Cli, Commands};
use config::Config;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Merge {
            template,
            data,
            output,
            format,
            dpi,
            encoding,
            rows,
            name_column,
            no_overwrite,
            relative_paths,
            prune_hidden_layers,
            image_dir,
        } => {
            println!("🖨 ink-merge - 差し込み生成\n");
            let started = Instant::now();

            // 1. テンプレート
            println!("[1/4] テンプレートを読み込み中...");
            let template = Template::load(&template)
                .with_context(|| format!("テンプレートを読み込めません: {}", template.display()))?;
            println!("✔ {}件の名前を検出\n", template.index().len());

            // 2. データ
            println!("[2/4] データを読み込み中...");
            let detector = detector_for(&config);
            let table = read_table(&data, Some(&encoding), &detector)
                .with_context(|| format!("データを読み込めません: {}", data.display()))?;
            if table.is_empty() {
                return Err(error::InkMergeError::NoData(data.display().to_string()).into());
            }
            let records = filter_rows_by_range(&table.records, &rows);
            println!("✔ {}列 {}件（処理対象 {}件）\n", table.headers.len(), table.len(), records.len());

            // 3. 列の分類
            println!("[3/4] 列を分類中...");
            let classification = classify_headers(&table.headers, Some(template.index()));
            for header in &classification.malformed_headers {
                println!("⚠ 列名の形式が正しくありません: {}", header);
            }
            for header in &classification.missing_elements {
                println!("⚠ テンプレートに要素がないため無視します: {}", header);
            }
            let (active, removed) = partition_records(&records, &classification.missing_elements);
            println!(
                "✔ 要素列 {}件 / プロパティ列 {}件 / 無視 {}件\n",
                classification.element_headers.len(),
                classification.property_headers.len(),
                classification.missing_elements.len()
            );

            // 4. 差し込み・出力
            let format = match format {
                Some(f) => f,
                None => config
                    .default_format
                    .parse::<ExportFormat>()
                    .map_err(error::InkMergeError::InvalidOption)?,
            };
            let dpi = dpi.unwrap_or(config.default_dpi);
            if relative_paths && format != ExportFormat::Svg {
                println!("⚠ --relative-paths は svg 出力でのみ有効です");
            }

            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let image_base = image_dir.or_else(|| data.parent().map(Path::to_path_buf));
            let options = MergeOptions {
                prune_hidden_layers,
                image: ImageContext {
                    search_dirs: scanner::default_search_dirs(image_base.as_deref()),
                    output_dir: Some(output_dir.clone()),
                    use_relative_paths: relative_paths && format == ExportFormat::Svg,
                },
                max_records: config.max_records,
            };

            let exporter = InkscapeExporter::new(
                config.inkscape_command(),
                ExportSettings {
                    format,
                    dpi,
                    overwrite: !no_overwrite,
                },
            );

            println!("[4/4] {}件を {} で出力中...", active.len(), format);
            let merger = Merger::new(&template, &classification, &options);
            let mut sink = FileSink::new(&exporter, &output_dir, format, &active, &removed, name_column);
            let report = merger.process_batch(&active, &mut sink)?;
            sink.finish();

            println!("\n結果:");
            println!("  出力: {}/{}件", report.generated, report.requested);
            if report.skipped > 0 {
                println!("  既存のためスキップ: {}件", report.skipped);
            }
            if report.failed > 0 {
                println!("  失敗: {}件", report.failed);
                for (index, message) in &report.failures {
                    println!("    - {}件目: {}", index + 1, message);
                }
            }
            println!(
                "  変更 {}箇所（テキスト {} / 画像 {} / レイヤー {} / プロパティ {}）",
                report.totals.changes(),
                report.totals.text_replaced,
                report.totals.images_replaced,
                report.totals.layers_modified + report.totals.layers_removed,
                report.totals.properties_modified
            );
            if !report.warnings.is_empty() {
                println!("  警告: {}件", report.warnings.len());
                if cli.verbose {
                    for (index, warning) in &report.warnings {
                        println!("    - {}件目: {}", index + 1, warning);
                    }
                }
            }
            println!("  所要時間: {:.1}秒", started.elapsed().as_secs_f64());

            if report.generated + report.skipped == 0 && report.requested > 0 {
                anyhow::bail!("1件も出力できませんでした");
            }
            println!("\n✅ 完了: {}", output_dir.display());
        }

        Commands::Columns { template, output } => {
            let doc = Template::load(&template)?.instantiate()?;
            let output = output.unwrap_or_else(|| template.with_extension("csv"));
            let count = export::columns::write_skeleton(&doc, &output)
                .with_context(|| format!("ひな形を書き出せません: {}", output.display()))?;
            println!("✔ {}列のひな形を出力: {}", count, output.display());
        }

        Commands::Inspect {
            template,
            data,
            encoding,
        } => {
            let template = Template::load(&template)?;
            let mut inspection = serde_json::json!({ "elements": template.index() });

            if let Some(data) = data {
                let detector = detector_for(&config);
                let table = read_table(&data, Some(&encoding), &detector)?;
                let classification = classify_headers(&table.headers, Some(template.index()));
                inspection["records"] = serde_json::json!(table.len());
                inspection["classification"] = serde_json::to_value(&classification)?;
            }

            println!("{}", serde_json::to_string_pretty(&inspection)?);
        }

        Commands::Config { set_inkscape, show } => {
            let mut config = config;

            if let Some(path) = set_inkscape {
                config.set_inkscape_path(path)?;
                println!("✔ inkscape のパスを設定しました");
            }

            if show {
                println!("設定:");
                println!("  inkscape: {}", config.inkscape_command());
                println!("  出力形式: {}", config.default_format);
                println!("  DPI: {}", config.default_dpi);
                println!("  最大レコード数: {}", config.max_records);
                println!(
                    "  キャッシュ: {}件 / {}秒",
                    config.cache_max_entries, config.cache_ttl_seconds
                );
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn detector_for(config: &Config) -> EncodingDetector {
    EncodingDetector::new(
        config.cache_max_entries,
        Some(Duration::from_secs(config.cache_ttl_seconds)),
    )
}
