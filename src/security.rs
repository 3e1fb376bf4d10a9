//! 画像参照の安全性チェック
//!
//! 差し込み前に、パス・拡張子・サイズ・内容を検査する。
//! 不合格なら画像参照は書き換えずテンプレートの値を残す。

use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// 読み込みを許可するファイルサイズ（100MB）
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
/// 内容検査で読む先頭バイト数
const SNIFF_BYTES: usize = 8192;

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "tiff", "pdf", "eps", "ps",
];

const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "app", "deb", "rpm", "dmg",
    "pkg", "msi", "sh", "ps1", "py", "pl", "rb", "php", "asp", "jsp", "cgi",
];

lazy_static! {
    static ref DANGEROUS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script[^>]*>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)vbscript:").unwrap(),
        Regex::new(r"(?i)data:text/html").unwrap(),
        Regex::new(r"(?i)eval\s*\(").unwrap(),
        Regex::new(r"(?i)exec\s*\(").unwrap(),
        Regex::new(r"(?i)system\s*\(").unwrap(),
    ];
    static ref SCHEME_RE: Regex = Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*):").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("パスが空です")]
    EmptyPath,

    #[error("パストラバーサルの疑い: {0}")]
    PathTraversal(String),

    #[error("制御文字を含むパス: {0}")]
    UnsafeCharacters(String),

    #[error("許可されていない拡張子: {0}")]
    DisallowedExtension(String),

    #[error("危険な拡張子: {0}")]
    DangerousExtension(String),

    #[error("許可されていないスキーム: {0}")]
    DisallowedScheme(String),

    #[error("ファイルサイズ超過: {size}バイト（上限 {limit}バイト）")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("危険な内容を検出: {0}")]
    DangerousContent(String),
}

/// 参照の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `http://` / `https://`
    Remote,
    /// `data:image/...`
    DataUri,
    /// ローカルファイル（`file:` なし）
    Local,
}

/// 参照文字列のスキームを判定する（Windowsのドライブ名はスキーム扱いしない）
pub fn reference_kind(reference: &str) -> Result<ReferenceKind, SecurityError> {
    let Some(caps) = SCHEME_RE.captures(reference) else {
        return Ok(ReferenceKind::Local);
    };
    let scheme = caps[1].to_lowercase();
    if scheme.len() == 1 {
        return Ok(ReferenceKind::Local);
    }
    match scheme.as_str() {
        "http" | "https" => Ok(ReferenceKind::Remote),
        "data" if reference[5..].trim_start().to_lowercase().starts_with("image/") => Ok(ReferenceKind::DataUri),
        _ => Err(SecurityError::DisallowedScheme(scheme)),
    }
}

/// 画像参照を検査する
///
/// ローカルファイルが実在する場合はサイズと内容まで検査する。
pub fn validate_image_reference(reference: &str) -> Result<ReferenceKind, SecurityError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(SecurityError::EmptyPath);
    }

    let kind = reference_kind(reference)?;
    match kind {
        ReferenceKind::DataUri => {}
        ReferenceKind::Remote => {
            let path = reference.split(['?', '#']).next().unwrap_or(reference);
            check_extension(path)?;
        }
        ReferenceKind::Local => {
            check_path(reference)?;
            check_extension(reference)?;
            let path = Path::new(reference);
            if path.is_file() {
                check_size(path)?;
                check_content(path)?;
            } else {
                log::debug!("画像ファイルが存在しないため内容検査を省略: {}", reference);
            }
        }
    }
    Ok(kind)
}

fn check_path(reference: &str) -> Result<(), SecurityError> {
    let has_parent = Path::new(reference)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if has_parent || reference.starts_with('~') {
        return Err(SecurityError::PathTraversal(reference.to_string()));
    }
    if reference.chars().any(|c| c.is_control()) {
        return Err(SecurityError::UnsafeCharacters(reference.escape_debug().to_string()));
    }
    Ok(())
}

fn extension_of(reference: &str) -> String {
    Path::new(reference)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn check_extension(reference: &str) -> Result<(), SecurityError> {
    let ext = extension_of(reference);
    if DANGEROUS_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SecurityError::DangerousExtension(ext));
    }
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SecurityError::DisallowedExtension(ext));
    }
    Ok(())
}

fn check_size(path: &Path) -> Result<(), SecurityError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_SIZE => Err(SecurityError::FileTooLarge {
            size: meta.len(),
            limit: MAX_FILE_SIZE,
        }),
        _ => Ok(()),
    }
}

/// 既知の画像形式ならそのまま合格、そうでなければテキストとしてパターン検査
fn check_content(path: &Path) -> Result<(), SecurityError> {
    let mut head = Vec::with_capacity(SNIFF_BYTES);
    let read = File::open(path).and_then(|f| f.take(SNIFF_BYTES as u64).read_to_end(&mut head));
    if let Err(e) = read {
        log::debug!("内容検査のための読み込みに失敗: {} ({})", path.display(), e);
        return Ok(());
    }

    if image::guess_format(&head).is_ok() {
        return Ok(());
    }

    let text = String::from_utf8_lossy(&head);
    match DANGEROUS_PATTERNS.iter().find(|re| re.is_match(&text)) {
        Some(re) => Err(SecurityError::DangerousContent(re.as_str().to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reference_kinds() {
        assert_eq!(reference_kind("logo.png"), Ok(ReferenceKind::Local));
        assert_eq!(reference_kind("C:\\img\\logo.png"), Ok(ReferenceKind::Local));
        assert_eq!(reference_kind("https://example.com/a.png"), Ok(ReferenceKind::Remote));
        assert_eq!(reference_kind("data:image/png;base64,AAAA"), Ok(ReferenceKind::DataUri));
        assert!(matches!(reference_kind("javascript:alert(1)"), Err(SecurityError::DisallowedScheme(_))));
        assert!(matches!(reference_kind("data:text/html,<b>"), Err(SecurityError::DisallowedScheme(_))));
    }

    #[test]
    fn test_path_rules() {
        assert!(matches!(validate_image_reference("../etc/x.png"), Err(SecurityError::PathTraversal(_))));
        assert!(matches!(validate_image_reference("~/x.png"), Err(SecurityError::PathTraversal(_))));
        assert!(matches!(validate_image_reference("run.exe"), Err(SecurityError::DangerousExtension(_))));
        assert!(matches!(validate_image_reference("notes.txt"), Err(SecurityError::DisallowedExtension(_))));
        assert!(matches!(validate_image_reference("   "), Err(SecurityError::EmptyPath)));
        assert!(validate_image_reference("/nonexistent/写真 1.JPG").is_ok());
        assert!(validate_image_reference("https://example.com/a.png?v=1").is_ok());
    }

    #[test]
    fn test_content_sniffing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let png = dir.path().join("real.png");
        fs::write(&png, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        assert!(validate_image_reference(png.to_str().unwrap()).is_ok());

        let svg = dir.path().join("evil.svg");
        fs::write(&svg, b"<svg><script>alert(1)</script></svg>").unwrap();
        assert!(matches!(
            validate_image_reference(svg.to_str().unwrap()),
            Err(SecurityError::DangerousContent(_))
        ));

        let clean = dir.path().join("clean.svg");
        fs::write(&clean, b"<svg><rect width=\"1\"/></svg>").unwrap();
        assert!(validate_image_reference(clean.to_str().unwrap()).is_ok());
    }
}
