use super::{Document, NodeData, NodeId};

impl Document {
    /// UTF-8 文字列として書き出す（整形はしない）
    ///
    /// 変更していないテキストと属性は読み込み時の表記のまま出力するので、
    /// 書き換えのないドキュメントは入力と同じ文字列になる。
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Root => {}
            NodeData::Verbatim(raw) => out.push_str(raw),
            NodeData::Text { value, raw } => match raw {
                Some(raw) => out.push_str(raw),
                None => out.push_str(&escape_text(value)),
            },
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attr in &element.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    match &attr.raw {
                        // シングルクォートで書かれていた値
                        Some(raw) => out.push_str(&raw.replace('"', "&quot;")),
                        None => out.push_str(&escape_attr(&attr.value)),
                    }
                    out.push('"');
                }

                let children = self.children(id);
                if children.is_empty() && element.self_closing {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

/// テキストノード用のエスケープ
pub(crate) fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 属性値用のエスケープ（改行・タブも文字参照にする）
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmodified_round_trip_is_identical() {
        let src = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- c -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" a='x\"y'>\n  <text id=\"t\">R&amp;D 𝄞</text>\n  <rect id=\"r\"/>\n</svg>\n";
        let doc = Document::parse(src).unwrap();
        let out = doc.serialize();
        assert_eq!(out.replace("a=\"x&quot;y\"", "a='x\"y'"), src);
    }

    #[test]
    fn test_modified_values_are_escaped() {
        let mut doc = Document::parse(r#"<svg><text id="t">old</text></svg>"#).unwrap();
        let text = doc.elements()[1];
        doc.set_leading_text(text, "a < b & 😀");
        doc.set_attr(text, "data-v", "\"q\"");
        assert_eq!(
            doc.serialize(),
            r#"<svg><text id="t" data-v="&quot;q&quot;">a &lt; b &amp; 😀</text></svg>"#
        );
    }

    #[test]
    fn test_text_into_self_closing_element() {
        let mut doc = Document::parse(r#"<svg><tspan id="s"/></svg>"#).unwrap();
        let span = doc.elements()[1];
        doc.set_leading_text(span, "x");
        assert_eq!(doc.serialize(), r#"<svg><tspan id="s">x</tspan></svg>"#);
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_text("<&>\"'"), "&lt;&amp;&gt;\"'");
        assert_eq!(escape_attr("<&>\"\n"), "&lt;&amp;>&quot;&#10;");
    }
}
