//! ink-merge 共通ライブラリ
//!
//! 列ヘッダーの文法・固定の対応表・分類結果など、
//! ファイルI/Oを伴わない差し込みデータモデル

pub mod header;
pub mod visibility;
pub mod color;
pub mod property;
pub mod style;
pub mod record;
pub mod classification;

pub use header::{classify, ElementKind, HeaderTarget};
pub use visibility::{normalize_visibility, Visibility};
pub use color::{is_valid_color, normalize_color, to_hex};
pub use record::Record;
pub use classification::{
    classify_headers, partition_records, ClassificationResult, ElementIndex, IdentitySource, IndexEntry,
};
