//! 列ヘッダーとテンプレート走査結果の突き合わせ
//!
//! バッチ開始時に一度だけ計算し、以降は読み取り専用で使う。
//! 走査結果に存在しない要素名の列は `missing_elements` に入り、
//! 全レコードの処理対象から外れる。

use crate::header::{classify, ElementKind, HeaderTarget};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 索引に登録した名前の由来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    Label,
    Id,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub kind: ElementKind,
    /// 名前空間接頭辞を除いたタグ名
    pub tag: String,
    pub source: IdentitySource,
}

/// テンプレート内の 名前 → 要素種類 の索引
#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementIndex {
    entries: Vec<IndexEntry>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl ElementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録する。同名が既にある場合は先勝ちだが、
    /// テキスト内容由来の登録はラベル/ID由来の登録で上書きされる。
    pub fn insert(&mut self, entry: IndexEntry) -> bool {
        match self.positions.get(&entry.name) {
            Some(&pos) => {
                let existing = &mut self.entries[pos];
                if existing.source == IdentitySource::Text && entry.source != IdentitySource::Text {
                    *existing = entry;
                    true
                } else {
                    false
                }
            }
            None => {
                self.positions.insert(entry.name.clone(), self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.positions.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// 未登録なら `Unknown`
    pub fn kind_of(&self, name: &str) -> ElementKind {
        self.get(name).map(|e| e.kind).unwrap_or(ElementKind::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// ヘッダー群の分類結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 要素値の列（欠落分は含まない、列順）
    pub element_headers: Vec<String>,
    /// プロパティ列（欠落分は含まない、列順）
    pub property_headers: Vec<String>,
    pub element_mapping: HashMap<String, HeaderTarget>,
    pub property_mapping: HashMap<String, HeaderTarget>,
    /// テンプレートに要素が見つからなかった列
    pub missing_elements: Vec<String>,
    /// 文法に合わなかった列（欠落扱いとは別に報告用）
    pub malformed_headers: Vec<String>,
}

impl ClassificationResult {
    pub fn is_missing(&self, header: &str) -> bool {
        self.missing_elements.iter().any(|h| h == header)
    }

    pub fn target(&self, header: &str) -> Option<&HeaderTarget> {
        self.element_mapping
            .get(header)
            .or_else(|| self.property_mapping.get(header))
    }

    /// レイヤー種別の要素値列
    pub fn layer_headers(&self) -> impl Iterator<Item = &HeaderTarget> {
        self.element_headers
            .iter()
            .filter_map(|h| self.element_mapping.get(h))
            .filter(|t| t.element_kind == ElementKind::Layer)
    }

    /// レイヤー以外の要素値列
    pub fn value_headers(&self) -> impl Iterator<Item = &HeaderTarget> {
        self.element_headers
            .iter()
            .filter_map(|h| self.element_mapping.get(h))
            .filter(|t| t.element_kind != ElementKind::Layer)
    }

    pub fn property_targets(&self) -> impl Iterator<Item = &HeaderTarget> {
        self.property_headers
            .iter()
            .filter_map(|h| self.property_mapping.get(h))
    }
}

/// ヘッダー群を分類する
///
/// `index` がある場合は走査結果の種類を正とし、存在しない要素名は欠落扱い。
/// `None` の場合は名前からの推定種類をそのまま使い、欠落は出さない。
pub fn classify_headers<S: AsRef<str>>(headers: &[S], index: Option<&ElementIndex>) -> ClassificationResult {
    let mut result = ClassificationResult::default();

    for header in headers {
        let header = header.as_ref();
        if result.target(header).is_some() || result.is_missing(header) {
            continue;
        }

        let mut target = classify(header);
        if target.malformed {
            result.malformed_headers.push(header.to_string());
        }

        if let Some(index) = index {
            match index.get(&target.element_name) {
                Some(entry) => target.element_kind = entry.kind,
                None => {
                    result.missing_elements.push(header.to_string());
                    continue;
                }
            }
        }

        if target.is_property {
            result.property_headers.push(header.to_string());
            result.property_mapping.insert(header.to_string(), target);
        } else {
            result.element_headers.push(header.to_string());
            result.element_mapping.insert(header.to_string(), target);
        }
    }

    result
}

/// 欠落列を取り除いた行と、取り除いた列の控えを作る
///
/// 控えは出力ファイル名の生成でのみ参照される。
pub fn partition_records(records: &[Record], missing: &[String]) -> (Vec<Record>, Vec<Record>) {
    records.iter().map(|r| r.split_off(missing)).unzip()
}
