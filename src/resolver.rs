//! 要素名 → ノード の解決
//!
//! 検索順:
//! 1. ラベルまたはIDが一致する要素をまとめて検索
//! 2. 1 が失敗した場合（inkscape 名前空間が未宣言など）はラベルのみ → IDのみ
//! 3. どれにも一致しなければ表示テキストが一致するテキスト要素
//!
//! 結果は (ドキュメントID, 名前) をキーにキャッシュする。
//! レコードごとにドキュメントを再パースするため、古い結果が別のツリーに使われることはない。

use crate::cache::Cache;
use crate::document::{Document, NodeId};
use std::time::Duration;

type ResolveKey = (u64, String);

pub struct ElementResolver {
    cache: Cache<ResolveKey, Vec<NodeId>>,
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self::new(1024, None)
    }
}

impl ElementResolver {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            cache: Cache::new(max_entries, ttl),
        }
    }

    /// 名前に一致する要素をすべて返す（0件はエラーではない）
    pub fn resolve(&self, doc: &Document, name: &str) -> Vec<NodeId> {
        let key = (doc.id(), name.to_string());
        if let Some(nodes) = self.cache.get(&key) {
            log::debug!("要素キャッシュ: '{}' {}件", name, nodes.len());
            return nodes;
        }

        let nodes = search(doc, name);
        log::debug!("要素検索: '{}' {}件", name, nodes.len());
        self.cache.put(key, nodes.clone());
        nodes
    }

    /// 指定ドキュメントの結果を破棄する（ノード削除などの構造変更後に呼ぶ）
    pub fn invalidate(&self, doc: &Document) -> usize {
        let id = doc.id();
        self.cache.remove_where(|(doc_id, _)| *doc_id == id)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

fn search(doc: &Document, name: &str) -> Vec<NodeId> {
    let nodes = match doc.select_label_or_id(name) {
        Ok(nodes) => nodes,
        Err(e) => {
            log::debug!("{}: ラベル → ID の順で個別に検索します", e);
            let by_label = doc.select_by_label(name);
            if by_label.is_empty() {
                doc.select_by_id(name)
            } else {
                by_label
            }
        }
    };

    if nodes.is_empty() {
        return doc.select_by_text(name);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"><rect id="a" inkscape:label="Box"/><rect id="Box"/><text id="t">Price</text></svg>"#;

    #[test]
    fn test_resolve_all_matches_and_cache() {
        let doc = Document::parse(SVG).unwrap();
        let resolver = ElementResolver::default();
        assert_eq!(resolver.resolve(&doc, "Box").len(), 2);
        assert_eq!(resolver.cached_entries(), 1);
        assert_eq!(resolver.resolve(&doc, "Box").len(), 2);
        assert_eq!(resolver.cached_entries(), 1);
    }

    #[test]
    fn test_zero_matches_is_empty() {
        let doc = Document::parse(SVG).unwrap();
        let resolver = ElementResolver::default();
        assert!(resolver.resolve(&doc, "Ghost").is_empty());
    }

    #[test]
    fn test_text_fallback() {
        let doc = Document::parse(SVG).unwrap();
        let resolver = ElementResolver::default();
        let found = resolver.resolve(&doc, "Price");
        assert_eq!(found.len(), 1);
        assert_eq!(doc.element_id(found[0]), Some("t"));
    }

    #[test]
    fn test_fallback_without_namespace() {
        let doc = Document::parse(r#"<svg><rect inkscape:label="Box"/><rect id="Box"/></svg>"#).unwrap();
        let resolver = ElementResolver::default();
        // ラベル一致があれば ID 検索はしない
        assert_eq!(resolver.resolve(&doc, "Box").len(), 1);
    }

    #[test]
    fn test_cache_is_per_document() {
        let resolver = ElementResolver::default();
        let mut first = Document::parse(SVG).unwrap();
        let nodes = resolver.resolve(&first, "Box");
        first.detach(nodes[0]);

        // 同じドキュメントはキャッシュのまま、無効化すると再検索
        assert_eq!(resolver.resolve(&first, "Box").len(), 2);
        assert_eq!(resolver.invalidate(&first), 1);
        assert_eq!(resolver.resolve(&first, "Box").len(), 1);

        let second = Document::parse(SVG).unwrap();
        assert_eq!(resolver.resolve(&second, "Box").len(), 2);
    }
}
