use super::{ApplyOutcome, RejectReason};
use crate::document::{Document, NodeId};
use ink_merge_common::color::normalize_color;
use ink_merge_common::property::{
    attribute_for, expand_shorthand, is_color_attribute, is_style_attribute, is_supported_element,
};
use ink_merge_common::style::{get_property, set_property};

/// `要素名##プロパティ名` の値を適用する
///
/// style系の属性は style 宣言に、それ以外は要素の属性に直接書き込む。
pub fn apply_property(doc: &mut Document, node: NodeId, property: &str, value: &str) -> ApplyOutcome {
    let tag = doc.local_name(node).unwrap_or_default().to_string();
    if !is_supported_element(&tag) {
        log::warn!("<{}> はプロパティ変更に未対応です", tag);
        return ApplyOutcome::Rejected(RejectReason::UnsupportedElement(tag));
    }

    let Some(attribute) = attribute_for(property) else {
        log::warn!("未対応のプロパティ: {}", property);
        return ApplyOutcome::Rejected(RejectReason::UnknownProperty(property.to_string()));
    };

    if value.trim().is_empty() {
        return ApplyOutcome::Rejected(RejectReason::EmptyValue);
    }

    let mut value = expand_shorthand(property, value);
    if is_color_attribute(attribute) {
        match normalize_color(&value) {
            Some(hex) => value = hex,
            None => {
                log::warn!("不正な色指定: {}", value);
                return ApplyOutcome::Rejected(RejectReason::InvalidColor(value));
            }
        }
    }

    if is_style_attribute(attribute) {
        let style = doc.attr(node, "style").map(str::to_string);
        let current = style.as_deref().and_then(|s| get_property(s, attribute));
        if current.as_deref() == Some(value.as_str()) {
            return ApplyOutcome::Unchanged;
        }
        log::debug!("style {}: {:?} -> {}", attribute, current, value);
        let updated = set_property(style.as_deref(), attribute, &value);
        ApplyOutcome::from_changed(doc.set_attr(node, "style", &updated))
    } else {
        log::debug!("属性 {}: {:?} -> {}", attribute, doc.attr(node, attribute), value);
        ApplyOutcome::from_changed(doc.set_attr(node, attribute, &value))
    }
}
