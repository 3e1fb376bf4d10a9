//! データファイル（CSV / 表計算）の読み込み

pub mod csv;
pub mod encoding;
pub mod excel;

pub use encoding::EncodingDetector;

use crate::error::{InkMergeError, Result};
use ink_merge_common::Record;
use std::collections::BTreeSet;
use std::path::Path;

/// 読み込んだ表（ヘッダーは列順）
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let records = rows.into_iter().map(|row| Record::from_row(&headers, &row)).collect();
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// CSV文字列から表を作る
pub fn parse_table(content: &str) -> Result<Table> {
    let (headers, rows) = csv::parse_csv(content)?;
    Ok(Table::from_rows(headers, rows))
}

/// 拡張子でCSV/表計算を振り分けて読み込む
///
/// `encoding` はCSVのみに使う（`None` / `auto` で自動判定）。
pub fn read_table(path: &Path, encoding: Option<&str>, detector: &EncodingDetector) -> Result<Table> {
    if !path.exists() {
        return Err(InkMergeError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => {
            let (headers, rows) = excel::read_spreadsheet(path)?;
            Table::from_rows(headers, rows)
        }
        "csv" | "txt" | "" => {
            let bytes = std::fs::read(path)?;
            let content = detector.decode(&bytes, encoding)?;
            parse_table(&content)?
        }
        other => {
            return Err(InkMergeError::Table(format!("対応していない形式です: .{}", other)));
        }
    };

    log::info!("{}: {}列 {}件", path.display(), table.headers.len(), table.len());
    Ok(table)
}

/// 行の範囲指定でレコードを絞り込む（1始まり）
///
/// `1-5,7,9`, `even`, `odd`, `all` を組み合わせられる。
/// 読めない指定は警告して無視する。結果は元の順序で重複なし。
pub fn filter_rows_by_range(records: &[Record], rows: &str) -> Vec<Record> {
    let rows = rows.trim();
    if rows.is_empty() || rows.eq_ignore_ascii_case("all") {
        return records.to_vec();
    }

    let total = records.len();
    let mut selected: BTreeSet<usize> = BTreeSet::new();

    for part in rows.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_lowercase().as_str() {
            "all" => selected.extend(0..total),
            "even" => selected.extend((0..total).filter(|i| (i + 1) % 2 == 0)),
            "odd" => selected.extend((0..total).filter(|i| (i + 1) % 2 == 1)),
            _ => match parse_range(part) {
                Some((start, end)) => {
                    let start = start.max(1) - 1;
                    let end = end.min(total);
                    if start < end {
                        selected.extend(start..end);
                    }
                }
                None => log::warn!("行の指定を読めません: {}", part),
            },
        }
    }

    log::debug!("行の指定 '{}': {}/{}件", rows, selected.len(), total);
    selected.into_iter().map(|i| records[i].clone()).collect()
}

/// `3` → (3, 3), `2-5` → (2, 5)
fn parse_range(part: &str) -> Option<(usize, usize)> {
    match part.split_once('-') {
        Some((start, end)) => {
            let start: usize = start.trim().parse().ok()?;
            let end: usize = end.trim().parse().ok()?;
            (start <= end).then_some((start, end))
        }
        None => {
            let n: usize = part.parse().ok()?;
            Some((n, n))
        }
    }
}
