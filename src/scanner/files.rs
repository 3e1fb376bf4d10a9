//! 画像ファイルの検索
//!
//! セルにファイル名だけが書かれている場合、データファイルのあるフォルダ
//! （なければカレントディレクトリ）以下を再帰的に探す。

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    pub absolute: PathBuf,
    /// 出力フォルダからの相対パス（求められなければ絶対パス）
    pub relative: PathBuf,
}

/// 検索先の既定値：`base_dir` → カレントディレクトリ
pub fn default_search_dirs(base_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    if let Some(dir) = base_dir.filter(|d| d.is_dir()) {
        roots.push(absolutize(dir));
    }
    if let Ok(cwd) = std::env::current_dir() {
        if !roots.iter().any(|r| *r == cwd) {
            roots.push(cwd);
        }
    }
    roots
}

/// `roots` を順に再帰検索し、最初に見つかった `filename` を返す
pub fn find_file(filename: &str, roots: &[PathBuf], output_dir: Option<&Path>) -> Option<FoundFile> {
    for root in roots {
        log::debug!("'{}' を検索: {}", filename, root.display());
        let found = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == filename);

        if let Some(entry) = found {
            let absolute = entry.path().to_path_buf();
            let relative = output_dir
                .and_then(|out| relative_to(&absolute, &absolutize(out)))
                .unwrap_or_else(|| absolute.clone());
            return Some(FoundFile { absolute, relative });
        }
    }

    log::warn!("ファイルが見つかりません: {}", filename);
    None
}

fn absolutize(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `base` から見た `path` の相対パス（ドライブ違いなど求められない場合は `None`）
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    // ルート（プレフィックス）が異なる場合は相対化できない
    if path.first() != base.first() {
        return None;
    }

    let common = path.iter().zip(base.iter()).take_while(|(a, b)| a == b).count();
    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component.as_os_str());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_file_in_nested_dir() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let nested = dir.path().join("assets").join("img");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("logo.png"), b"x").unwrap();
        let out = dir.path().join("out");

        let roots = vec![dir.path().to_path_buf()];
        let found = find_file("logo.png", &roots, Some(&out)).expect("見つかるはず");
        assert!(found.absolute.ends_with("assets/img/logo.png"));
        assert_eq!(found.relative, PathBuf::from("../assets/img/logo.png"));
        assert!(find_file("nothing.png", &roots, None).is_none());
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/a/b/img/logo.png"), Path::new("/a/b/out")),
            Some(PathBuf::from("../img/logo.png"))
        );
        assert_eq!(
            relative_to(Path::new("/a/b/logo.png"), Path::new("/a/b")),
            Some(PathBuf::from("logo.png"))
        );
        assert_eq!(relative_to(Path::new("a/x.png"), Path::new("/a")), None);
    }
}
