//! テンプレート走査モジュール
//!
//! テンプレートを一度だけ走査し、列ヘッダーから参照できる名前と
//! その要素種類の索引を作る。
//!
//! - ラベル（`inkscape:label`）を優先し、なければIDで登録
//! - `inkscape:groupmode="layer"` の `<g>` はレイヤー
//! - テキスト要素は表示テキストでも登録（ラベルを付けていないテンプレート向け）

pub mod files;

use crate::document::{Document, NodeId};
use ink_merge_common::{ElementIndex, ElementKind, IdentitySource, IndexEntry};

pub use files::{default_search_dirs, find_file, FoundFile};

/// テンプレートの索引を作る
pub fn scan_document(doc: &Document) -> ElementIndex {
    let mut index = ElementIndex::new();
    let Some(root) = doc.root_element() else {
        return index;
    };
    let nodes = doc.descendants(root);

    for &node in &nodes {
        let (name, source) = match (doc.label(node), doc.element_id(node)) {
            (Some(label), _) if !label.is_empty() => (label, IdentitySource::Label),
            (_, Some(id)) if !id.is_empty() => (id, IdentitySource::Id),
            _ => continue,
        };
        index.insert(entry_for(doc, node, name, source));
    }

    // ラベル/IDで登録されなかった名前だけ、テキスト内容で補う
    for node in outer_text_containers(doc, &nodes) {
        let text = doc.text_content(node);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        index.insert(IndexEntry {
            name: text.to_string(),
            kind: ElementKind::Text,
            tag: doc.local_name(node).unwrap_or_default().to_string(),
            source: IdentitySource::Text,
        });
    }

    log::debug!("テンプレート走査: {}件の名前を登録", index.len());
    index
}

fn entry_for(doc: &Document, node: NodeId, name: &str, source: IdentitySource) -> IndexEntry {
    let tag = doc.local_name(node).unwrap_or_default().to_string();
    IndexEntry {
        name: name.to_string(),
        kind: kind_of(doc, node),
        tag,
        source,
    }
}

/// 要素の種類（走査・適用で共通）
pub fn kind_of(doc: &Document, node: NodeId) -> ElementKind {
    if doc.is_layer(node) {
        return ElementKind::Layer;
    }
    if doc.is_text_container(node) {
        return ElementKind::Text;
    }
    match doc.local_name(node) {
        Some("image") => ElementKind::Image,
        Some(_) => ElementKind::Shape,
        None => ElementKind::Unknown,
    }
}

/// 入れ子になっていない外側のテキスト要素
fn outer_text_containers(doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .filter(|&n| doc.is_text_container(n) && !doc.has_text_ancestor(n))
        .collect()
}
