use super::{ApplyOutcome, RejectReason};
use crate::document::{Document, NodeId, XLINK_NS};
use crate::scanner::{find_file, FoundFile};
use crate::security::{reference_kind, validate_image_reference, ReferenceKind};
use std::path::{Path, PathBuf};

/// 画像差し込みの設定（バッチ中は共通）
#[derive(Debug, Clone, Default)]
pub struct ImageContext {
    /// ファイル名だけの値を探すフォルダ（先頭から順に）
    pub search_dirs: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// 見つけたファイルを出力フォルダからの相対パスで書き込む
    pub use_relative_paths: bool,
}

/// 画像参照（href / xlink:href）を置き換える
pub fn apply_image(doc: &mut Document, node: NodeId, value: &str, ctx: &ImageContext) -> ApplyOutcome {
    let value = value.trim();
    if value.is_empty() {
        return ApplyOutcome::Rejected(RejectReason::EmptyValue);
    }

    let kind = match reference_kind(value) {
        Ok(kind) => kind,
        Err(e) => return reject(value, e.into()),
    };

    let mut found: Option<FoundFile> = None;
    let mut href = value.to_string();
    if kind == ReferenceKind::Local && is_bare_filename(value) {
        match find_file(value, &ctx.search_dirs, ctx.output_dir.as_deref()) {
            Some(f) => {
                href = f.absolute.to_string_lossy().to_string();
                found = Some(f);
            }
            None => return reject(value, RejectReason::FileNotFound(value.to_string())),
        }
    }

    if let Err(e) = validate_image_reference(&href) {
        log::info!("テンプレートの画像参照を維持します");
        return reject(&href, e.into());
    }

    if ctx.use_relative_paths {
        if let Some(f) = &found {
            href = f.relative.to_string_lossy().replace('\\', "/");
        }
    }

    let attrs = href_attributes(doc, node);
    let mut changed = false;
    for attr in &attrs {
        changed |= doc.set_attr(node, attr, &href);
    }
    if changed {
        log::debug!("画像参照を更新: {}", href);
    }
    ApplyOutcome::from_changed(changed)
}

fn reject(value: &str, reason: RejectReason) -> ApplyOutcome {
    log::warn!("画像 '{}' を差し込めません: {}", value, reason);
    ApplyOutcome::Rejected(reason)
}

/// 区切り文字を含まない相対パス
fn is_bare_filename(value: &str) -> bool {
    !value.contains('/') && !value.contains('\\') && !Path::new(value).is_absolute()
}

/// 書き換える属性名（既存の属性を優先、なければ xlink:href か href を追加）
fn href_attributes(doc: &Document, node: NodeId) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(name) = doc.qualified_name(XLINK_NS, "href") {
        if doc.has_attr(node, &name) {
            names.push(name);
        }
    }
    if doc.has_attr(node, "xlink:href") && !names.iter().any(|n| n == "xlink:href") {
        names.push("xlink:href".to_string());
    }
    if doc.has_attr(node, "href") {
        names.push("href".to_string());
    }

    if names.is_empty() {
        let name = doc
            .qualified_name(XLINK_NS, "href")
            .filter(|n| n.contains(':'))
            .unwrap_or_else(|| "href".to_string());
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn doc() -> Document {
        Document::parse(r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><image id="Logo" xlink:href="orig.png"/></svg>"#)
            .unwrap()
    }

    #[test]
    fn test_bare_filename_is_resolved() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img").join("new.png"), PNG).unwrap();

        let ctx = ImageContext {
            search_dirs: vec![dir.path().to_path_buf()],
            output_dir: Some(dir.path().join("out")),
            use_relative_paths: false,
        };
        let mut doc = doc();
        let node = doc.select_by_id("Logo")[0];
        assert!(apply_image(&mut doc, node, "new.png", &ctx).is_changed());
        let href = doc.attr(node, "xlink:href").unwrap().to_string();
        assert!(href.ends_with("img/new.png"), "{href}");
        assert_eq!(apply_image(&mut doc, node, "new.png", &ctx), ApplyOutcome::Unchanged);

        let relative = ImageContext { use_relative_paths: true, ..ctx };
        assert!(apply_image(&mut doc, node, "new.png", &relative).is_changed());
        assert_eq!(doc.attr(node, "xlink:href"), Some("../img/new.png"));
    }

    #[test]
    fn test_missing_file_keeps_original() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let ctx = ImageContext {
            search_dirs: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let mut doc = doc();
        let node = doc.select_by_id("Logo")[0];
        let outcome = apply_image(&mut doc, node, "missing.png", &ctx);
        assert!(matches!(outcome, ApplyOutcome::Rejected(RejectReason::FileNotFound(_))));
        assert_eq!(doc.attr(node, "xlink:href"), Some("orig.png"));
    }

    #[test]
    fn test_security_rejection_keeps_original() {
        let mut doc = doc();
        let node = doc.select_by_id("Logo")[0];
        let ctx = ImageContext::default();
        for bad in ["../secret/a.png", "javascript:alert(1)", "/tmp/run.sh"] {
            let outcome = apply_image(&mut doc, node, bad, &ctx);
            assert!(matches!(outcome, ApplyOutcome::Rejected(RejectReason::Security(_))), "{bad}");
        }
        assert_eq!(doc.attr(node, "xlink:href"), Some("orig.png"));
    }

    #[test]
    fn test_plain_href_when_no_xlink() {
        let mut doc = Document::parse(r#"<svg><image id="i"/></svg>"#).unwrap();
        let node = doc.select_by_id("i")[0];
        let outcome = apply_image(&mut doc, node, "https://example.com/x.png", &ImageContext::default());
        assert!(outcome.is_changed());
        assert_eq!(doc.attr(node, "href"), Some("https://example.com/x.png"));
    }
}
