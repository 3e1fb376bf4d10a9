//! レイヤー表示値の正規化
//!
//! セルの値（yes/no, 1/0, show/hide など）を表示/非表示の2値に揃える。
//! 表にない値はすべて「表示」として扱う。

use serde::{Deserialize, Serialize};

/// 非表示として扱う綴り
const HIDDEN_SPELLINGS: &[&str] = &["invisible", "no", "hide", "0", "false", "none", "hidden"];
/// 表示として扱う綴り
const SHOWN_SPELLINGS: &[&str] = &["visible", "yes", "show", "1", "true", "inline", "display", "shown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Shown,
    Hidden,
}

impl Visibility {
    /// style の `display` に書き込む値
    pub fn css_value(self) -> &'static str {
        match self {
            Visibility::Shown => "inline",
            Visibility::Hidden => "none",
        }
    }

    /// `display` の値から逆引き（`none` 以外は表示扱い）
    pub fn from_display(display: &str) -> Self {
        if display.trim().eq_ignore_ascii_case("none") {
            Visibility::Hidden
        } else {
            Visibility::Shown
        }
    }

    /// 列出力用の綴り
    pub fn label(self) -> &'static str {
        match self {
            Visibility::Shown => "visible",
            Visibility::Hidden => "invisible",
        }
    }
}

/// セル値を正規化する（大文字小文字・前後空白は無視）
pub fn normalize_visibility(value: &str) -> Visibility {
    lookup_visibility(value).unwrap_or(Visibility::Shown)
}

/// 表に載っている綴りのみ判定する
pub fn lookup_visibility(value: &str) -> Option<Visibility> {
    let key = value.trim().to_lowercase();
    if HIDDEN_SPELLINGS.contains(&key.as_str()) {
        Some(Visibility::Hidden)
    } else if SHOWN_SPELLINGS.contains(&key.as_str()) {
        Some(Visibility::Shown)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_spellings() {
        for s in HIDDEN_SPELLINGS {
            assert_eq!(normalize_visibility(s), Visibility::Hidden, "{s}");
            assert_eq!(normalize_visibility(&s.to_uppercase()), Visibility::Hidden, "{s}");
        }
        for s in SHOWN_SPELLINGS {
            assert_eq!(normalize_visibility(s), Visibility::Shown, "{s}");
        }
    }

    #[test]
    fn test_unknown_defaults_to_shown() {
        for s in ["", "maybe", "非表示", "2", "  "] {
            assert_eq!(normalize_visibility(s), Visibility::Shown, "{s:?}");
        }
    }

    #[test]
    fn test_lookup_only_table() {
        assert_eq!(lookup_visibility("FALSE"), Some(Visibility::Hidden));
        assert_eq!(lookup_visibility("maybe"), None);
    }

    #[test]
    fn test_css_values() {
        assert_eq!(normalize_visibility(" Hide ").css_value(), "none");
        assert_eq!(normalize_visibility("Yes").css_value(), "inline");
        assert_eq!(Visibility::from_display("none"), Visibility::Hidden);
        assert_eq!(Visibility::from_display("block"), Visibility::Shown);
    }
}
