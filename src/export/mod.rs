//! 差し込み結果の書き出し
//!
//! SVG はそのまま書き込み、それ以外の形式は一時ファイル経由で
//! inkscape のコマンドラインに変換させる。

pub mod columns;
pub mod naming;

use crate::error::{InkMergeError, Result};
use crate::orchestrator::{BatchSink, RenderedRecord};
use indicatif::{ProgressBar, ProgressStyle};
use ink_merge_common::Record;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

pub use naming::{output_stem, sanitize_filename};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
    Jpeg,
    Tiff,
    Webp,
    Svg,
    Pdf,
    Ps,
    Eps,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Tiff => "tiff",
            ExportFormat::Webp => "webp",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Ps => "ps",
            ExportFormat::Eps => "eps",
        }
    }

    /// DPI 指定が効く形式
    pub fn is_raster(&self) -> bool {
        matches!(
            self,
            ExportFormat::Png | ExportFormat::Jpg | ExportFormat::Jpeg | ExportFormat::Tiff | ExportFormat::Webp
        )
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" => Ok(ExportFormat::Jpg),
            "jpeg" => Ok(ExportFormat::Jpeg),
            "tif" | "tiff" => Ok(ExportFormat::Tiff),
            "webp" => Ok(ExportFormat::Webp),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            "ps" => Ok(ExportFormat::Ps),
            "eps" => Ok(ExportFormat::Eps),
            _ => Err(format!(
                "Unknown format: {}. Use png, jpg, jpeg, tiff, webp, svg, pdf, ps or eps",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// 書き出したドキュメントを出力ファイルにする
pub trait Exporter {
    /// 出力した場合 `true`、上書きしない設定で既存ファイルを残した場合 `false`
    fn export(&self, document: &str, output: &Path) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub dpi: u32,
    pub overwrite: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            dpi: 300,
            overwrite: true,
        }
    }
}

/// SVG は直接、それ以外は inkscape で変換する
pub struct InkscapeExporter {
    command: String,
    settings: ExportSettings,
}

impl InkscapeExporter {
    pub fn new(command: impl Into<String>, settings: ExportSettings) -> Self {
        Self {
            command: command.into(),
            settings,
        }
    }

    fn run_inkscape(&self, input: &Path, output: &Path) -> Result<()> {
        let format = self.settings.format.extension().to_string();
        let mut args = vec![
            input.display().to_string(),
            format!("--export-type={}", format),
            format!("--export-filename={}", output.display()),
        ];
        if self.settings.format.is_raster() {
            args.push(format!("--export-dpi={}", self.settings.dpi));
        }
        log::debug!("{} {}", self.command, args.join(" "));

        // Windowsではcmd /c経由
        #[cfg(windows)]
        let output_result = Command::new("cmd")
            .arg("/c")
            .arg(&self.command)
            .args(&args)
            .output()
            .map_err(|e| InkMergeError::Export(format!("inkscape実行エラー: {}", e)))?;

        #[cfg(not(windows))]
        let output_result = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|e| InkMergeError::Export(format!("inkscape実行エラー: {}", e)))?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr);
            return Err(InkMergeError::Export(format!(
                "inkscape failed (code {:?}): {}",
                output_result.status.code(),
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(InkMergeError::Export(format!(
                "出力ファイルが作成されませんでした: {}",
                output.display()
            )));
        }
        Ok(())
    }
}

impl Exporter for InkscapeExporter {
    fn export(&self, document: &str, output: &Path) -> Result<bool> {
        if output.exists() && !self.settings.overwrite {
            log::info!("既存ファイルを残します: {}", output.display());
            return Ok(false);
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        if self.settings.format == ExportFormat::Svg {
            std::fs::write(output, document)?;
            return Ok(true);
        }

        // 宣言がないと日本語が化けるため UTF-8 を明示する
        let mut temp = tempfile::Builder::new().suffix(".svg").tempfile()?;
        if !document.trim_start().starts_with("<?xml") {
            temp.write_all(XML_DECLARATION.as_bytes())?;
        }
        temp.write_all(document.as_bytes())?;
        temp.flush()?;

        self.run_inkscape(temp.path(), output)?;
        Ok(true)
    }
}

/// 出力パス
pub fn output_path(output_dir: &Path, stem: &str, format: ExportFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", stem, format.extension()))
}

/// バッチの結果を1レコード1ファイルで書き出す受け取り先
pub struct FileSink<'a, E: Exporter> {
    exporter: &'a E,
    output_dir: PathBuf,
    format: ExportFormat,
    records: &'a [Record],
    removed: &'a [Record],
    name_column: Option<String>,
    progress: ProgressBar,
    written: Vec<PathBuf>,
    /// このバッチで使ったファイル名（大文字小文字は区別しない）
    used_stems: HashSet<String>,
}

impl<'a, E: Exporter> FileSink<'a, E> {
    pub fn new(
        exporter: &'a E,
        output_dir: impl Into<PathBuf>,
        format: ExportFormat,
        records: &'a [Record],
        removed: &'a [Record],
        name_column: Option<String>,
    ) -> Self {
        let progress = ProgressBar::new(records.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
            .map(|s| s.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);

        Self {
            exporter,
            output_dir: output_dir.into(),
            format,
            records,
            removed,
            name_column,
            progress,
            written: Vec::new(),
            used_stems: HashSet::new(),
        }
    }

    /// 進捗表示を出さない（テスト・パイプ出力向け）
    pub fn hidden(mut self) -> Self {
        self.progress = ProgressBar::hidden();
        self
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }

    fn path_for(&mut self, index: usize) -> Result<PathBuf> {
        let active = self
            .records
            .get(index)
            .ok_or_else(|| InkMergeError::Export(format!("レコード {} がありません", index + 1)))?;
        let stem = output_stem(
            index,
            self.records.len(),
            active,
            self.removed.get(index),
            self.name_column.as_deref(),
        );
        let stem = self.unique_stem(index, stem);
        Ok(output_path(&self.output_dir, &stem, self.format))
    }

    /// 同じバッチ内で名前が重なったら `_2`, `_3` … を付ける
    fn unique_stem(&mut self, index: usize, stem: String) -> String {
        if self.used_stems.insert(stem.to_lowercase()) {
            return stem;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", stem, n);
            if self.used_stems.insert(candidate.to_lowercase()) {
                log::warn!("{}件目: ファイル名 '{}' が重複したため '{}' にします", index + 1, stem, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

impl<E: Exporter> BatchSink for FileSink<'_, E> {
    fn deliver(&mut self, rendered: &RenderedRecord) -> Result<bool> {
        let path = self.path_for(rendered.index)?;
        self.progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let result = self.exporter.export(&rendered.document, &path);
        self.progress.inc(1);
        let exported = result?;
        if exported {
            log::debug!("出力: {}", path.display());
            self.written.push(path);
        }
        Ok(exported)
    }

    fn record_failed(&mut self, _index: usize, _error: &InkMergeError) {
        self.progress.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_and_display() {
        assert_eq!("PNG".parse::<ExportFormat>(), Ok(ExportFormat::Png));
        assert_eq!("tif".parse::<ExportFormat>(), Ok(ExportFormat::Tiff));
        assert!("bmp".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Eps.to_string(), "eps");
        assert!(ExportFormat::Webp.is_raster());
        assert!(!ExportFormat::Pdf.is_raster());
    }

    #[test]
    fn test_svg_written_directly_and_overwrite_flag() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("out").join("a.svg");
        let settings = ExportSettings {
            format: ExportFormat::Svg,
            dpi: 96,
            overwrite: false,
        };
        // inkscape は呼ばれない
        let exporter = InkscapeExporter::new("/nonexistent/inkscape", settings);

        assert!(exporter.export("<svg/>", &path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
        assert!(!exporter.export("<svg>2</svg>", &path).unwrap(), "上書きしない");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
    }

    #[test]
    fn test_missing_inkscape_is_export_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let exporter = InkscapeExporter::new("/nonexistent/inkscape", ExportSettings::default());
        let result = exporter.export("<svg/>", &dir.path().join("a.png"));
        assert!(matches!(result, Err(InkMergeError::Export(_))));
    }
}
