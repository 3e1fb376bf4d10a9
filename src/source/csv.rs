//! CSVのパース
//!
//! 引用符で囲まれたフィールド、`""` によるエスケープ、フィールド内の改行、
//! CRLF/LF の行末に対応する。

use crate::error::{InkMergeError, Result};

/// 1行目をヘッダーとして (ヘッダー, データ行) に分ける
pub fn parse_csv(content: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rows = parse_rows(content)?.into_iter();

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| InkMergeError::NoData("ヘッダー行がありません".into()))?
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let rows: Vec<Vec<String>> = rows.filter(|row| !is_blank(row)).collect();
    Ok((headers, rows))
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

fn parse_rows(content: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // 空行かどうかの判定用（行内で何か読んだか）
    let mut touched = false;
    let mut line = 1usize;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                touched = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                touched = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                line += 1;
                if touched || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                touched = false;
            }
            _ => {
                field.push(c);
                touched = true;
            }
        }
    }

    if in_quotes {
        return Err(InkMergeError::Table(format!("引用符が閉じられていません（{}行目付近）", line)));
    }
    if touched || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
