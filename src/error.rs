use thiserror::Error;

#[derive(Error, Debug)]
pub enum InkMergeError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("テンプレート解析エラー: {0}")]
    Template(String),

    #[error("要素検索エラー: {0}")]
    Query(String),

    #[error("データ読み込みエラー: {0}")]
    Table(String),

    #[error("Excel読み込みエラー: {0}")]
    Spreadsheet(String),

    #[error("データ行がありません: {0}")]
    NoData(String),

    #[error("レコード数が上限を超えています: {count}件（上限 {limit}件）")]
    TooManyRecords { count: usize, limit: usize },

    #[error("不正なオプション: {0}")]
    InvalidOption(String),

    #[error("エクスポートエラー: {0}")]
    Export(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InkMergeError>;
