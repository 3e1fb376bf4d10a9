use super::{ApplyOutcome, RejectReason};
use crate::document::{Document, NodeId};
use ink_merge_common::style::{get_property, set_property};
use ink_merge_common::{normalize_visibility, Visibility};

/// レイヤーの表示/非表示を切り替える
///
/// style の `display` だけを書き換え、他の宣言はそのまま残す。
/// `display` が未指定の場合は「一致しない」とみなして明示的に書き込む。
pub fn apply_layer_visibility(doc: &mut Document, node: NodeId, value: &str) -> ApplyOutcome {
    if !doc.is_layer(node) {
        let tag = doc.tag(node).unwrap_or_default().to_string();
        return ApplyOutcome::Rejected(RejectReason::NotALayer(tag));
    }

    let display = normalize_visibility(value).css_value();
    let style = doc.attr(node, "style").map(str::to_string);
    let current = style.as_deref().and_then(|s| get_property(s, "display"));
    log::debug!("レイヤー表示: {:?} -> {} (入力 '{}')", current, display, value);

    if current.as_deref() == Some(display) {
        return ApplyOutcome::Unchanged;
    }

    let updated = set_property(style.as_deref(), "display", display);
    ApplyOutcome::from_changed(doc.set_attr(node, "style", &updated))
}

/// 現在の表示状態（style → display属性 の順に見る。未指定なら表示）
pub fn display_of(doc: &Document, node: NodeId) -> Visibility {
    if let Some(display) = doc.attr(node, "style").and_then(|s| get_property(s, "display")) {
        return Visibility::from_display(&display);
    }
    doc.attr(node, "display")
        .map(Visibility::from_display)
        .unwrap_or(Visibility::Shown)
}
