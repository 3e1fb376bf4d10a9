//! ink-merge: SVGテンプレートへのデータ差し込み
//!
//! 表データの1行ごとにテンプレートを複製し、テキスト・画像参照・
//! レイヤーの表示・スタイルを書き換えて出力する。

pub mod applier;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod resolver;
pub mod scanner;
pub mod security;
pub mod source;
