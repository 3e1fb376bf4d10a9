use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ink-merge")]
#[command(about = "SVGテンプレート差し込み生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// データの各行をテンプレートに差し込んで出力
    Merge {
        /// テンプレートSVG
        #[arg(required = true)]
        template: PathBuf,

        /// データファイル（CSV/xlsx/xls/ods）
        #[arg(required = true)]
        data: PathBuf,

        /// 出力フォルダ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (png/jpg/jpeg/tiff/webp/svg/pdf/ps/eps、デフォルト: 設定値)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// ラスター出力の解像度（72-1200、デフォルト: 設定値）
        #[arg(long, value_parser = clap::value_parser!(u32).range(72..=1200))]
        dpi: Option<u32>,

        /// CSVの文字コード（auto または shift_jis などのラベル）
        #[arg(short, long, default_value = "auto")]
        encoding: String,

        /// 処理する行（例: 1-5,7 / even / odd / all）
        #[arg(short, long, default_value = "all")]
        rows: String,

        /// 出力ファイル名に使う列
        #[arg(short = 'n', long)]
        name_column: Option<String>,

        /// 既存ファイルを上書きしない
        #[arg(long)]
        no_overwrite: bool,

        /// 画像を出力フォルダからの相対パスで埋め込む（svg出力のみ）
        #[arg(long)]
        relative_paths: bool,

        /// 非表示になったレイヤーを削除する
        #[arg(long)]
        prune_hidden_layers: bool,

        /// 画像を探すフォルダ（デフォルト: データファイルのフォルダ）
        #[arg(long)]
        image_dir: Option<PathBuf>,
    },

    /// テンプレートから差し込み用CSVのひな形を作成
    Columns {
        /// テンプレートSVG
        #[arg(required = true)]
        template: PathBuf,

        /// 出力CSV（デフォルト: テンプレート名.csv）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// テンプレートの索引と列の分類をJSONで表示
    Inspect {
        /// テンプレートSVG
        #[arg(required = true)]
        template: PathBuf,

        /// データファイル（指定時は列の分類も表示）
        data: Option<PathBuf>,

        /// CSVの文字コード
        #[arg(short, long, default_value = "auto")]
        encoding: String,
    },

    /// 設定を表示/編集
    Config {
        /// inkscape 実行ファイルのパスを設定
        #[arg(long)]
        set_inkscape: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
