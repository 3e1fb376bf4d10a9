//! 色値の正規化と検証

use lazy_static::lazy_static;
use regex::Regex;

/// 色名エイリアス → 16進
const COLOR_ALIASES: &[(&str, &str)] = &[
    ("red", "#ff0000"),
    ("blue", "#0000ff"),
    ("green", "#00ff00"),
    ("yellow", "#ffff00"),
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("pink", "#ffc0cb"),
    ("gray", "#808080"),
    ("grey", "#808080"),
];

lazy_static! {
    static ref HEX_RE: Regex =
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap();
    static ref FUNC_RE: Regex =
        Regex::new(r"(?i)^(?:rgb|rgba|hsl|hsla)\(\s*[0-9.%\s,/+-]+\)$").unwrap();
}

/// 色名なら16進に変換、それ以外はそのまま（前後空白は除去）
pub fn to_hex(value: &str) -> String {
    let trimmed = value.trim();
    let lower = trimmed.to_lowercase();
    COLOR_ALIASES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, hex)| hex.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// 16進・関数形式・色名のいずれかであれば有効
pub fn is_valid_color(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return false;
    }
    HEX_RE.is_match(v) || FUNC_RE.is_match(v) || is_alias(v)
}

pub fn is_alias(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    COLOR_ALIASES.iter().any(|(name, _)| *name == lower)
}

/// 正規化して検証まで行う。無効なら `None`
pub fn normalize_color(value: &str) -> Option<String> {
    let hex = to_hex(value);
    is_valid_color(&hex).then_some(hex)
}
