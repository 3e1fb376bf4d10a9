//! プロパティ名 → SVG属性 の対応表
//!
//! `要素名##プロパティ名` 形式の列で使える名前の一覧。
//! 一部の属性は style 宣言の中に書き込む（style系）。

/// プロパティ名（小文字） → 属性名
const PROPERTY_ATTRIBUTES: &[(&str, &str)] = &[
    // 塗り
    ("fill", "fill"),
    ("fill-opacity", "fill-opacity"),
    ("fill-rule", "fill-rule"),
    // 線
    ("stroke", "stroke"),
    ("stroke-width", "stroke-width"),
    ("stroke-opacity", "stroke-opacity"),
    ("stroke-dasharray", "stroke-dasharray"),
    ("stroke-dashoffset", "stroke-dashoffset"),
    ("stroke-linecap", "stroke-linecap"),
    ("stroke-linejoin", "stroke-linejoin"),
    ("stroke-miterlimit", "stroke-miterlimit"),
    // 文字
    ("font-size", "font-size"),
    ("font-family", "font-family"),
    ("font-weight", "font-weight"),
    ("font-style", "font-style"),
    ("font-variant", "font-variant"),
    ("letter-spacing", "letter-spacing"),
    ("word-spacing", "word-spacing"),
    ("text-anchor", "text-anchor"),
    ("text-align", "text-anchor"),
    ("text-decoration", "text-decoration"),
    ("writing-mode", "writing-mode"),
    ("text-transform", "text-transform"),
    ("direction", "direction"),
    // 配置・寸法
    ("opacity", "opacity"),
    ("width", "width"),
    ("height", "height"),
    ("x", "x"),
    ("y", "y"),
    // 変形
    ("transform", "transform"),
    ("translate", "transform"),
    ("rotate", "transform"),
    ("scale", "transform"),
    ("skewx", "transform"),
    ("skewy", "transform"),
    // 効果
    ("filter", "filter"),
    ("blur", "filter"),
    ("clip-path", "clip-path"),
    ("visibility", "visibility"),
    ("display", "display"),
];

/// style 宣言に書き込む属性
const STYLE_ATTRIBUTES: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "font-size",
    "font-family",
    "font-weight",
    "font-style",
    "font-variant",
    "letter-spacing",
    "word-spacing",
    "text-anchor",
    "text-decoration",
    "writing-mode",
    "text-align",
    "text-transform",
    "direction",
    "opacity",
    "visibility",
    "display",
];

/// プロパティ変更を受け付けるタグ
const SUPPORTED_ELEMENTS: &[&str] = &[
    "rect", "circle", "ellipse", "path", "line", "polyline", "polygon", "text", "image", "g",
];

/// テキストとして扱うタグ（Inkscapeの flowRoot 系を含む）
pub const TEXT_TAGS: &[&str] = &["text", "tspan", "flowPara", "flowSpan", "flowpara", "flowspan"];

/// 色として検証する属性
const COLOR_ATTRIBUTES: &[&str] = &["fill", "stroke"];

/// プロパティ名から属性名を引く（大文字小文字は無視）
pub fn attribute_for(property: &str) -> Option<&'static str> {
    let key = property.trim().to_lowercase();
    PROPERTY_ATTRIBUTES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, attr)| *attr)
}

pub fn is_style_attribute(attribute: &str) -> bool {
    STYLE_ATTRIBUTES.contains(&attribute)
}

pub fn is_color_attribute(attribute: &str) -> bool {
    COLOR_ATTRIBUTES.contains(&attribute)
}

pub fn is_supported_element(tag: &str) -> bool {
    SUPPORTED_ELEMENTS.contains(&tag)
}

pub fn is_text_tag(tag: &str) -> bool {
    TEXT_TAGS.contains(&tag)
}

/// `rotate` などの省略形を transform / filter の値に展開する
///
/// 値が既に関数形式（`rotate(45)` 等）の場合や、
/// それ以外のプロパティは値をそのまま返す。
pub fn expand_shorthand(property: &str, value: &str) -> String {
    let v = value.trim();
    if v.contains('(') {
        return v.to_string();
    }
    match property.trim().to_lowercase().as_str() {
        "translate" => format!("translate({v})"),
        "rotate" => format!("rotate({v})"),
        "scale" => format!("scale({v})"),
        "skewx" => format!("skewX({v})"),
        "skewy" => format!("skewY({v})"),
        "blur" => format!("blur({v})"),
        _ => v.to_string(),
    }
}
