//! テンプレートから差し込み用CSVのひな形を作る
//!
//! ラベルまたはIDを持つ要素ごとに1列（図形はプロパティ列）を作り、
//! 2行目に現在の値を入れる。

use crate::applier::display_of;
use crate::document::{Document, NodeId, XLINK_NS};
use crate::error::Result;
use crate::resolver::ElementResolver;
use crate::scanner::scan_document;
use ink_merge_common::style::get_property;
use ink_merge_common::{ElementKind, IdentitySource};
use std::path::Path;

/// ひな形に出す図形のプロパティ
const SHAPE_PROPERTIES: &[&str] = &["fill", "stroke", "stroke-width", "opacity"];

/// (ヘッダー, 現在の値) を列順に返す
pub fn skeleton_columns(doc: &Document) -> Vec<(String, String)> {
    let index = scan_document(doc);
    let resolver = ElementResolver::default();
    let mut columns = Vec::new();

    for entry in index.iter() {
        // 表示テキストだけで識別される要素は列にしない
        if entry.source == IdentitySource::Text {
            continue;
        }
        let Some(&node) = resolver.resolve(doc, &entry.name).first() else {
            continue;
        };

        match entry.kind {
            ElementKind::Text => columns.push((entry.name.clone(), doc.text_content(node).trim().to_string())),
            ElementKind::Image => columns.push((entry.name.clone(), image_basename(doc, node))),
            ElementKind::Layer => columns.push((entry.name.clone(), display_of(doc, node).label().to_string())),
            ElementKind::Shape | ElementKind::Unknown => {
                for &property in SHAPE_PROPERTIES {
                    if let Some(value) = current_property(doc, node, property) {
                        columns.push((format!("{}##{}", entry.name, property), value));
                    }
                }
            }
        }
    }

    columns
}

fn image_basename(doc: &Document, node: NodeId) -> String {
    let href = doc
        .ns_attr(node, XLINK_NS, "href")
        .or_else(|| doc.attr(node, "href"))
        .unwrap_or_default();
    href.rsplit(['/', '\\']).next().unwrap_or_default().to_string()
}

/// style 内の値を優先し、なければ同名の属性
fn current_property(doc: &Document, node: NodeId, property: &str) -> Option<String> {
    doc.attr(node, "style")
        .and_then(|style| get_property(style, property))
        .or_else(|| doc.attr(node, property).map(str::to_string))
        .filter(|v| !v.trim().is_empty())
}

/// ヘッダー行と値の行からなるCSV
pub fn to_csv(columns: &[(String, String)]) -> String {
    let header: Vec<String> = columns.iter().map(|(h, _)| escape_csv(h)).collect();
    let values: Vec<String> = columns.iter().map(|(_, v)| escape_csv(v)).collect();
    format!("{}\n{}\n", header.join(","), values.join(","))
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// ひな形をファイルに書き出し、列数を返す
pub fn write_skeleton(doc: &Document, output: &Path) -> Result<usize> {
    let columns = skeleton_columns(doc);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    // Excelで文字化けしないようBOM付き
    std::fs::write(output, format!("\u{feff}{}", to_csv(&columns)))?;
    Ok(columns.len())
}
