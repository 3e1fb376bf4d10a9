//! 表計算ファイル（.xlsx / .xls / .ods）の読み込み
//!
//! 先頭シートの1行目をヘッダーとして扱う。

use crate::error::{InkMergeError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::Timelike;
use std::path::Path;

pub fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| InkMergeError::Spreadsheet(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InkMergeError::NoData(format!("シートがありません: {}", path.display())))?
        .map_err(|e| InkMergeError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| InkMergeError::NoData(format!("ヘッダー行がありません: {}", path.display())))?
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();

    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|v| !v.trim().is_empty()))
        .collect();

    log::debug!("{}: {}列 {}行", path.display(), headers.len(), rows.len());
    Ok((headers, rows))
}

/// セルの値を文字列にする（整数値の小数は `.0` を付けない）
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) if d.hour() == 0 && d.minute() == 0 && d.second() == 0 => d.format("%Y-%m-%d").to_string(),
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            log::warn!("セルのエラー値を空文字として扱います: {}", e);
            String::new()
        }
    }
}
