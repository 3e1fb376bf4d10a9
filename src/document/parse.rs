use super::{Attribute, Document, Element, NodeData, NodeId};
use crate::error::{InkMergeError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

impl Document {
    /// 文字列からパースする。XML宣言・コメント・DOCTYPE は原文のまま保持する。
    pub fn parse(source: &str) -> Result<Self> {
        let mut doc = Document::empty();
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<NodeId> = vec![doc.root()];

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| {
                InkMergeError::Template(format!("{} (位置 {})", e, reader.error_position()))
            })?;
            let end = reader.buffer_position() as usize;
            let raw = source.get(start..end).unwrap_or_default();
            let parent = *stack.last().unwrap_or(&doc.root());

            match event {
                Event::Start(e) => {
                    let element = doc.read_element(&e, false)?;
                    let id = doc.push(parent, NodeData::Element(element));
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let element = doc.read_element(&e, true)?;
                    doc.push(parent, NodeData::Element(element));
                }
                Event::End(_) => {
                    if stack.len() <= 1 {
                        return Err(InkMergeError::Template(format!(
                            "対応する開始タグがありません (位置 {})",
                            end
                        )));
                    }
                    stack.pop();
                }
                Event::Text(t) => {
                    // 未定義の実体参照などで展開できない場合は原文を値として扱う
                    let value = t
                        .unescape()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    doc.push(
                        parent,
                        NodeData::Text {
                            value,
                            raw: Some(raw.to_string()),
                        },
                    );
                }
                Event::Eof => break,
                // CDATA・コメント・宣言・処理命令・DOCTYPE
                _ => {
                    if !raw.is_empty() {
                        doc.push(parent, NodeData::Verbatim(raw.to_string()));
                    }
                }
            }
        }

        if stack.len() > 1 {
            return Err(InkMergeError::Template("閉じられていない要素があります".into()));
        }
        if doc.root_element().is_none() {
            return Err(InkMergeError::Template("ルート要素がありません".into()));
        }

        Ok(doc)
    }

    fn read_element(&mut self, start: &BytesStart<'_>, self_closing: bool) -> Result<Element> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| InkMergeError::Template(format!("<{}> の属性: {}", name, e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.clone());

            if key == "xmlns" {
                self.declare(String::new(), value.clone());
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.declare(prefix.to_string(), value.clone());
            }

            attributes.push(Attribute {
                name: key,
                value,
                raw: Some(raw),
            });
        }

        Ok(Element {
            name,
            attributes,
            self_closing,
        })
    }

    fn declare(&mut self, prefix: String, uri: String) {
        if !self.namespaces.iter().any(|(p, u)| *p == prefix && *u == uri) {
            self.namespaces.push((prefix, uri));
        }
    }
}
