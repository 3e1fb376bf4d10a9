use crate::error::{InkMergeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// inkscape 実行ファイル（未設定なら PATH から探す）
    pub inkscape_path: Option<String>,
    pub default_dpi: u32,
    pub default_format: String,
    /// 1回のバッチで処理できる最大レコード数
    pub max_records: usize,
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inkscape_path: None,
            default_dpi: 300,
            default_format: "png".into(),
            max_records: 10_000,
            cache_ttl_seconds: 3600,
            cache_max_entries: 100,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// ファイルがなければ既定値。書かれていない項目も既定値で補う
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| InkMergeError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InkMergeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("ink-merge").join("config.json"))
    }

    /// 環境変数 `INKSCAPE_PATH` を優先
    pub fn inkscape_command(&self) -> String {
        if let Ok(path) = std::env::var("INKSCAPE_PATH") {
            if !path.trim().is_empty() {
                return path;
            }
        }
        self.inkscape_path.clone().unwrap_or_else(|| "inkscape".into())
    }

    pub fn set_inkscape_path(&mut self, path: String) -> Result<()> {
        self.inkscape_path = Some(path);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"default_dpi": 150}"#).unwrap();
        assert_eq!(config.default_dpi, 150);
        assert_eq!(config.max_records, 10_000);
        assert_eq!(config.default_format, "png");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");
        assert_eq!(Config::load_from(&path).unwrap().default_dpi, 300, "ファイルがなければ既定値");

        let config = Config {
            inkscape_path: Some("/opt/inkscape/bin/inkscape".into()),
            default_format: "pdf".into(),
            ..Default::default()
        };
        config.save_to(&path).expect("設定保存失敗");

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.inkscape_path.as_deref(), Some("/opt/inkscape/bin/inkscape"));
        assert_eq!(loaded.default_format, "pdf");
    }

    #[test]
    fn test_broken_file_is_config_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(InkMergeError::Config(_))));
    }
}
