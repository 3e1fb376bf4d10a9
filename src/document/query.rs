//! 名前による要素検索
//!
//! いずれもルート要素の子孫（ルート自身は含まない）を文書順で返す。

use super::{Document, NodeId, INKSCAPE_NS};
use crate::error::{InkMergeError, Result};
use ink_merge_common::property::is_text_tag;

impl Document {
    fn searchable(&self) -> Vec<NodeId> {
        match self.root_element() {
            Some(root) => self.descendants(root),
            None => Vec::new(),
        }
    }

    /// ラベルまたはIDが一致する要素
    ///
    /// ラベルは `inkscape` 名前空間の属性として照合するため、
    /// 名前空間が宣言されていない文書ではエラーになる。
    pub fn select_label_or_id(&self, name: &str) -> Result<Vec<NodeId>> {
        let label_attr = self.qualified_name(INKSCAPE_NS, "label").ok_or_else(|| {
            InkMergeError::Query(format!("inkscape 名前空間が未宣言のため '{}' を検索できません", name))
        })?;

        Ok(self
            .searchable()
            .into_iter()
            .filter(|&n| self.attr(n, &label_attr) == Some(name) || self.element_id(n) == Some(name))
            .collect())
    }

    /// ラベル一致のみ（接頭辞未宣言でも `inkscape:label` を文字通りに見る）
    pub fn select_by_label(&self, name: &str) -> Vec<NodeId> {
        self.searchable()
            .into_iter()
            .filter(|&n| self.label(n) == Some(name))
            .collect()
    }

    pub fn select_by_id(&self, name: &str) -> Vec<NodeId> {
        self.searchable()
            .into_iter()
            .filter(|&n| self.element_id(n) == Some(name))
            .collect()
    }

    /// 表示テキスト（前後空白除去）が一致するテキスト要素
    ///
    /// 入れ子の tspan は対象外で、外側の要素だけを返す。
    pub fn select_by_text(&self, name: &str) -> Vec<NodeId> {
        self.searchable()
            .into_iter()
            .filter(|&n| self.is_text_container(n) && !self.has_text_ancestor(n))
            .filter(|&n| self.text_content(n).trim() == name)
            .collect()
    }

    /// `<text>` や `<flowRoot>` などテキストを持つ要素
    pub fn is_text_container(&self, id: NodeId) -> bool {
        match self.local_name(id) {
            Some(tag) => is_text_tag(tag) || tag == "flowRoot",
            None => false,
        }
    }

    pub(crate) fn has_text_ancestor(&self, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if self.is_text_container(p) {
                return true;
            }
            current = self.parent(p);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<svg id="root" xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"><rect id="Box"/><circle inkscape:label="Box"/><text id="t"><tspan>Price</tspan></text></svg>"#;

    #[test]
    fn test_label_or_id_returns_all_matches() {
        let doc = Document::parse(SVG).unwrap();
        let found = doc.select_label_or_id("Box").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(doc.local_name(found[0]), Some("rect"));
        assert_eq!(doc.local_name(found[1]), Some("circle"));
    }

    #[test]
    fn test_root_is_not_searched() {
        let doc = Document::parse(SVG).unwrap();
        assert!(doc.select_label_or_id("root").unwrap().is_empty());
    }

    #[test]
    fn test_unbound_prefix_fails_combined_query() {
        let doc = Document::parse(r#"<svg><rect inkscape:label="Box"/><rect id="Box"/></svg>"#).unwrap();
        assert!(doc.select_label_or_id("Box").is_err());
        assert_eq!(doc.select_by_label("Box").len(), 1);
        assert_eq!(doc.select_by_id("Box").len(), 1);
    }

    #[test]
    fn test_select_by_text_outermost_only() {
        let doc = Document::parse(SVG).unwrap();
        let found = doc.select_by_text("Price");
        assert_eq!(found.len(), 1);
        assert_eq!(doc.local_name(found[0]), Some("text"));
    }
}
