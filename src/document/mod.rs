//! SVGドキュメントツリー
//!
//! quick-xml で読み込んだ要素を配列（アリーナ）上のノードとして保持し、
//! 差し込み処理から書き換えられるようにする。
//!
//! 1回のパースごとに一意な [`Document::id`] を持つ。
//! レコードごとの複製は文字列からの再パースで行うため `Clone` は実装しない。

mod parse;
mod query;
mod write;

use std::sync::atomic::{AtomicU64, Ordering};

pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Attribute {
    /// 接頭辞付きの属性名（`inkscape:label` など）
    pub name: String,
    pub value: String,
    /// 読み込み時のエスケープ済み表記（未変更なら書き出しに使う）
    raw: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    self_closing: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Root,
    Element(Element),
    Text { value: String, raw: Option<String> },
    /// コメント・CDATA・処理命令・DOCTYPE などはそのまま保持
    Verbatim(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Document {
    id: u64,
    nodes: Vec<Node>,
    /// 宣言されている (接頭辞, 名前空間URI)。既定名前空間の接頭辞は空文字
    namespaces: Vec<(String, String)>,
}

impl Document {
    fn empty() -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            namespaces: Vec::new(),
        }
    }

    /// パースごとに異なる識別子
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// 最上位の要素（通常は `<svg>`）
    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// 接頭辞付きのタグ名
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// 接頭辞を除いたタグ名
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.tag(id).map(local_part)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// ツリーにつながっている要素を文書順（前順）で列挙する
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if !self.is_element(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// 全要素（ルート要素を含む）
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
    }

    // --- 属性 ---

    /// 属性名そのもので取得
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// 値が変わった場合のみ `true`
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        match element.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) if attr.value == value => false,
            Some(attr) => {
                attr.value = value.to_string();
                attr.raw = None;
                true
            }
            None => {
                element.attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                    raw: None,
                });
                true
            }
        }
    }

    /// 名前空間URIに束縛された接頭辞（既定名前空間なら空文字）
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(_, uri)| uri == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// 名前空間付き属性の完全名（接頭辞が未宣言なら `None`）
    pub fn qualified_name(&self, namespace: &str, local: &str) -> Option<String> {
        let prefix = self.prefix_for(namespace)?;
        if prefix.is_empty() {
            Some(local.to_string())
        } else {
            Some(format!("{}:{}", prefix, local))
        }
    }

    /// 名前空間付き属性を取得（宣言された接頭辞を使う）
    pub fn ns_attr(&self, id: NodeId, namespace: &str, local: &str) -> Option<&str> {
        let element = self.element(id)?;
        self.namespaces
            .iter()
            .filter(|(prefix, uri)| uri == namespace && !prefix.is_empty())
            .find_map(|(prefix, _)| {
                let name = format!("{}:{}", prefix, local);
                element
                    .attributes
                    .iter()
                    .find(|a| a.name == name)
                    .map(|a| a.value.as_str())
            })
    }

    /// `inkscape:label`（接頭辞未宣言のファイルでも文字通りの名前で拾う）
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.ns_attr(id, INKSCAPE_NS, "label")
            .or_else(|| self.attr(id, "inkscape:label"))
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id")
    }

    /// `inkscape:groupmode="layer"` の `<g>`
    pub fn is_layer(&self, id: NodeId) -> bool {
        if self.local_name(id) != Some("g") {
            return false;
        }
        let mode = self
            .ns_attr(id, INKSCAPE_NS, "groupmode")
            .or_else(|| self.attr(id, "inkscape:groupmode"));
        mode == Some("layer")
    }

    // --- テキスト ---

    /// 最初の子要素より前にある直下テキスト（lxml の `.text` 相当）
    pub fn leading_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            match &self.nodes[child.0].data {
                NodeData::Text { value, .. } => out.push_str(value),
                NodeData::Element(_) => break,
                _ => {}
            }
        }
        out
    }

    /// 直下テキストを置き換える（値が変わった場合のみ `true`）
    pub fn set_leading_text(&mut self, id: NodeId, value: &str) -> bool {
        if !self.is_element(id) || self.leading_text(id) == value {
            return false;
        }

        let children = self.nodes[id.0].children.clone();
        let mut kept = Vec::with_capacity(children.len() + 1);
        let mut in_leading = true;
        for child in children {
            let is_text = matches!(self.nodes[child.0].data, NodeData::Text { .. });
            if in_leading && is_text {
                self.nodes[child.0].parent = None;
                continue;
            }
            if self.is_element(child) {
                in_leading = false;
            }
            kept.push(child);
        }

        if !value.is_empty() {
            let text = NodeId(self.nodes.len());
            self.nodes.push(Node {
                data: NodeData::Text {
                    value: value.to_string(),
                    raw: None,
                },
                parent: Some(id),
                children: Vec::new(),
            });
            kept.insert(0, text);
        }

        self.nodes[id.0].children = kept;
        if let Some(element) = self.nodes[id.0].data.as_element_mut() {
            element.self_closing = false;
        }
        true
    }

    /// 子孫をすべて含めたテキスト
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match &self.nodes[child.0].data {
                NodeData::Text { value, .. } => out.push_str(value),
                NodeData::Element(_) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    // --- 構造変更 ---

    /// 親から切り離す（以降の列挙・検索には現れない）
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
        true
    }

    /// ルートからたどれるか
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }
}

impl NodeData {
    fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// `prefix:name` の `name` 部分
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}
