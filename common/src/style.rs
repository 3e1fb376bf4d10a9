//! style 宣言（`name:value;name:value`）の読み書き
//!
//! 書き換え対象以外の宣言は元の文字列のまま残す。

/// 宣言を (名前, 値) の列に分解する
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// 指定プロパティの値（重複時は後勝ち）
pub fn get_property(style: &str, name: &str) -> Option<String> {
    parse_style(style)
        .into_iter()
        .rev()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// 1つのプロパティだけを書き換えた style 文字列を返す
///
/// - 既にあればその位置で置換（以降の重複は削除）
/// - なければ末尾に追加
pub fn set_property(style: Option<&str>, name: &str, value: &str) -> String {
    let declaration = format!("{}:{}", name, value);
    let original = style.unwrap_or("");

    let mut replaced = false;
    let mut parts: Vec<String> = Vec::new();
    for segment in original.split(';') {
        let key = segment.split_once(':').map(|(k, _)| k.trim());
        if key == Some(name) {
            if !replaced {
                parts.push(declaration.clone());
                replaced = true;
            }
            continue;
        }
        parts.push(segment.to_string());
    }

    if replaced {
        return parts.join(";");
    }

    let base = original.trim_end().trim_end_matches(';');
    if base.trim().is_empty() {
        declaration
    } else {
        format!("{};{}", base, declaration)
    }
}
