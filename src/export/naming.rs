//! 出力ファイル名の生成

use ink_merge_common::Record;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"[ \t\r\n]+").unwrap();
    static ref FORBIDDEN_RE: Regex = Regex::new(r#"[<>:"/\\|?*%&$@#]"#).unwrap();
}

/// ファイル名に使えない文字を `_` に置き換える
///
/// 空白の連続は1つの `_` にまとめ、制御文字は取り除き、前後の `_` は落とす。
pub fn sanitize_filename(name: &str) -> String {
    let name = WHITESPACE_RE.replace_all(name, "_");
    let name = FORBIDDEN_RE.replace_all(&name, "_");
    let name: String = name.chars().filter(|c| !c.is_control()).collect();
    name.trim().trim_matches('_').to_string()
}

/// レコードの出力ファイル名（拡張子なし）
///
/// `name_column` があれば有効な列 → 取り除いた列の控え の順で値を探す。
/// 値が無いか空になった場合は `output_<n>`（バッチ件数の桁数でゼロ埋め、1始まり）。
pub fn output_stem(
    index: usize,
    total: usize,
    active: &Record,
    removed: Option<&Record>,
    name_column: Option<&str>,
) -> String {
    if let Some(column) = name_column {
        let value = active
            .get(column)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| removed.and_then(|r| r.get(column)));

        match value.map(sanitize_filename) {
            Some(stem) if !stem.is_empty() => return stem,
            _ => log::warn!("列 '{}' から名前を作れないため連番を使います（{}件目）", column, index + 1),
        }
    }

    let width = total.max(1).to_string().len();
    format!("output_{:0width$}", index + 1, width = width)
}
