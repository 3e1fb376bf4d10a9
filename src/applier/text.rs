use super::ApplyOutcome;
use crate::document::{Document, NodeId};
use ink_merge_common::property::is_text_tag;

/// テキストを置き換える
///
/// 要素直下に空白以外のテキストがあればそれを、なければ子孫のうち
/// 最初のテキスト要素（通常は tspan）を、中身の有無にかかわらず書き換える。
/// 書き込み先は位置だけで決まるので、空の値を繰り返し適用しても
/// 二つ目以降の行を消さない。
pub fn apply_text(doc: &mut Document, node: NodeId, value: &str) -> ApplyOutcome {
    let target = text_target(doc, node);
    let current = doc.leading_text(target);
    log::debug!("テキスト: '{}' -> '{}'", current, value);

    if current == value {
        return ApplyOutcome::Unchanged;
    }
    ApplyOutcome::from_changed(doc.set_leading_text(target, value))
}

fn text_target(doc: &Document, node: NodeId) -> NodeId {
    if !doc.leading_text(node).trim().is_empty() {
        return node;
    }
    // 入れ子の tspan は最初の子をたどる
    match doc
        .descendants(node)
        .into_iter()
        .find(|&n| doc.local_name(n).map(is_text_tag).unwrap_or(false))
    {
        Some(child) => text_target(doc, child),
        None => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(doc: &Document, id: &str) -> NodeId {
        doc.select_by_id(id)[0]
    }

    #[test]
    fn test_direct_text() {
        let mut doc = Document::parse(r#"<svg><text id="t">Old</text></svg>"#).unwrap();
        let t = find(&doc, "t");
        assert_eq!(apply_text(&mut doc, t, "New"), ApplyOutcome::Changed);
        assert_eq!(apply_text(&mut doc, t, "New"), ApplyOutcome::Unchanged);
        assert_eq!(doc.text_content(t), "New");
    }

    #[test]
    fn test_first_child_with_text() {
        let mut doc = Document::parse(
            "<svg><text id=\"t\">\n  <tspan id=\"a\">Line1</tspan><tspan id=\"b\">Line2</tspan></text></svg>",
        )
        .unwrap();
        let t = find(&doc, "t");
        assert!(apply_text(&mut doc, t, "Hello").is_changed());
        assert_eq!(doc.leading_text(find(&doc, "a")), "Hello");
        assert_eq!(doc.leading_text(find(&doc, "b")), "Line2");
        assert_eq!(apply_text(&mut doc, t, "Hello"), ApplyOutcome::Unchanged);
    }

    #[test]
    fn test_empty_tspan_receives_text() {
        let mut doc = Document::parse(r#"<svg><text id="t"><tspan id="s"/></text></svg>"#).unwrap();
        let t = find(&doc, "t");
        assert!(apply_text(&mut doc, t, "X").is_changed());
        assert_eq!(doc.leading_text(find(&doc, "s")), "X");
    }

    #[test]
    fn test_whitespace_value_is_idempotent() {
        let mut doc = Document::parse(r#"<svg><text id="t">A</text></svg>"#).unwrap();
        let t = find(&doc, "t");
        assert!(apply_text(&mut doc, t, " ").is_changed());
        assert_eq!(apply_text(&mut doc, t, " "), ApplyOutcome::Unchanged);
    }

    #[test]
    fn test_empty_value_twice_keeps_second_line() {
        let mut doc =
            Document::parse(r#"<svg><text id="t"><tspan id="a">Line1</tspan><tspan id="b">Line2</tspan></text></svg>"#)
                .unwrap();
        let t = find(&doc, "t");
        assert_eq!(apply_text(&mut doc, t, ""), ApplyOutcome::Changed);
        assert_eq!(apply_text(&mut doc, t, ""), ApplyOutcome::Unchanged);
        assert_eq!(doc.leading_text(find(&doc, "a")), "");
        assert_eq!(doc.leading_text(find(&doc, "b")), "Line2", "2行目は残る");
    }

    #[test]
    fn test_empty_first_tspan_is_target() {
        let mut doc =
            Document::parse(r#"<svg><text id="t"><tspan id="a"/><tspan id="b">Line2</tspan></text></svg>"#).unwrap();
        let t = find(&doc, "t");
        assert_eq!(apply_text(&mut doc, t, ""), ApplyOutcome::Unchanged);
        assert!(apply_text(&mut doc, t, "New").is_changed());
        assert_eq!(doc.leading_text(find(&doc, "a")), "New");
        assert_eq!(doc.leading_text(find(&doc, "b")), "Line2");
    }

    #[test]
    fn test_nested_tspan() {
        let mut doc = Document::parse(
            r#"<svg><text id="t"><tspan id="line"><tspan id="inner">Hello</tspan></tspan></text></svg>"#,
        )
        .unwrap();
        let t = find(&doc, "t");
        assert!(apply_text(&mut doc, t, "").is_changed());
        assert_eq!(apply_text(&mut doc, t, ""), ApplyOutcome::Unchanged);
        assert!(apply_text(&mut doc, t, "Bye").is_changed());
        assert_eq!(doc.leading_text(find(&doc, "inner")), "Bye");
        assert_eq!(doc.leading_text(find(&doc, "line")), "");
    }
}
