//! 値の適用モジュール
//!
//! 解決済みの要素1つに対して、種類ごとの書き換えを行う。
//! いずれも例外的な制御はせず [`ApplyOutcome`] を返す。
//! 同じ値を2回続けて適用した場合、2回目は必ず `Unchanged` になる。

mod image;
mod layer;
mod property;
mod text;

pub use image::{apply_image, ImageContext};
pub use layer::{apply_layer_visibility, display_of};
pub use property::apply_property;
pub use text::apply_text;

use crate::security::SecurityError;
use thiserror::Error;

/// 適用結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Changed,
    /// 既に同じ値だった
    Unchanged,
    /// 検証で弾いた（要素は変更していない）
    Rejected(RejectReason),
}

impl ApplyOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, ApplyOutcome::Changed)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ApplyOutcome::Rejected(_))
    }

    fn from_changed(changed: bool) -> Self {
        if changed {
            ApplyOutcome::Changed
        } else {
            ApplyOutcome::Unchanged
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("値が空です")]
    EmptyValue,

    #[error("画像ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("セキュリティチェック不合格: {0}")]
    Security(#[from] SecurityError),

    #[error("レイヤーではありません: <{0}>")]
    NotALayer(String),

    #[error("未対応のプロパティ: {0}")]
    UnknownProperty(String),

    #[error("プロパティ変更に未対応の要素: <{0}>")]
    UnsupportedElement(String),

    #[error("不正な色指定: {0}")]
    InvalidColor(String),

    #[error("値を書き込めない要素: <{0}>")]
    NotApplicable(String),
}
