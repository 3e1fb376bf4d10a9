//! 列ヘッダー分類モジュール
//!
//! CSV/Excelの列名を「要素名」と「プロパティ名」に分解し、
//! テンプレート内のどの種類の要素を指しているかを推定する。
//!
//! 書式: `<要素名>` または `<要素名>##<プロパティ名>`
//!
//! ここでの種類推定はあくまでヒューリスティックであり、
//! テンプレート走査結果（[`crate::classification`]）が常に優先される。

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    /// ヘッダー文法（永続的な契約なので変更しないこと）
    static ref HEADER_RE: Regex = Regex::new(r"^([^#]+?)(?:##(.+))?$").unwrap();
}

/// プロパティ区切り
pub const PROPERTY_SEPARATOR: &str = "##";

/// 対象要素の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Layer,
    Shape,
    Unknown,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Layer => "layer",
            ElementKind::Shape => "shape",
            ElementKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// ヘッダー1つ分の分類結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTarget {
    /// 元のヘッダー文字列
    pub header: String,
    /// 要素名（前後の空白は除去済み）
    pub element_name: String,
    /// `##` 以降のプロパティ名
    pub property_name: Option<String>,
    pub element_kind: ElementKind,
    pub is_property: bool,
    /// 文法に合致しなかった（空文字・`#`始まり等）
    pub malformed: bool,
}

/// 名前キーワード → 種類（先に一致したものが優先）
const NAME_KEYWORDS: &[(ElementKind, &[&str])] = &[
    (ElementKind::Layer, &["layer", "group"]),
    (ElementKind::Text, &["text", "title", "label", "header"]),
    (ElementKind::Image, &["image", "logo", "icon", "picture", "photo"]),
    (
        ElementKind::Shape,
        &[
            "rect", "rectangle", "box", "circle", "dot", "ball", "ellipse", "oval", "line",
            "path", "curve", "shape", "polygon", "poly", "polyline",
        ],
    ),
];

/// プロパティ名キーワード → 種類
const PROPERTY_KEYWORDS: &[(ElementKind, &[&str])] = &[
    (ElementKind::Text, &["font-size", "font-family", "text-anchor", "font"]),
    (ElementKind::Shape, &["fill", "stroke", "opacity"]),
    (ElementKind::Image, &["href", "xlink:href"]),
];

/// ヘッダーを分類する（全域関数：どんな入力でも結果を返す）
pub fn classify(header: &str) -> HeaderTarget {
    let trimmed = header.trim();

    let Some(caps) = HEADER_RE.captures(trimmed) else {
        return HeaderTarget {
            header: header.to_string(),
            element_name: trimmed.to_string(),
            property_name: None,
            element_kind: ElementKind::Unknown,
            is_property: false,
            malformed: true,
        };
    };

    let element_name = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let property_name = caps.get(2).map(|m| m.as_str().trim().to_string());
    let element_kind = infer_kind(&element_name, property_name.as_deref());

    HeaderTarget {
        header: header.to_string(),
        is_property: property_name.is_some(),
        element_name,
        property_name,
        element_kind,
        malformed: false,
    }
}

/// 名前とプロパティ名から種類を推定
pub fn infer_kind(element_name: &str, property_name: Option<&str>) -> ElementKind {
    let name = element_name.to_lowercase();
    if let Some(kind) = first_match(NAME_KEYWORDS, &name) {
        return kind;
    }

    if let Some(prop) = property_name {
        let prop = prop.to_lowercase();
        if let Some(kind) = first_match(PROPERTY_KEYWORDS, &prop) {
            return kind;
        }
    }

    ElementKind::Unknown
}

fn first_match(table: &[(ElementKind, &[&str])], haystack: &str) -> Option<ElementKind> {
    table
        .iter()
        .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(kind, _)| *kind)
}
