use serde::{Deserialize, Serialize};

/// 1行分のデータ（列名 → 値、列順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// 列名と値の並びから作る（値が足りない列は空文字）
    pub fn from_row(headers: &[String], values: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(h, _)| h.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 指定列を取り除いた行と、取り除いた列だけの行に分ける
    pub fn split_off(&self, columns: &[String]) -> (Record, Record) {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .fields
            .iter()
            .cloned()
            .partition(|(h, _)| columns.iter().any(|c| c == h));
        (Record::new(kept), Record::new(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_pads_missing_values() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let r = Record::from_row(&headers, &["1".to_string()]);
        assert_eq!(r.get("a"), Some("1"));
        assert_eq!(r.get("b"), Some(""));
        assert_eq!(r.get("c"), None);
    }

    #[test]
    fn test_split_off() {
        let r = Record::new(vec![
            ("Title".into(), "Hi".into()),
            ("Ghost".into(), "x".into()),
        ]);
        let (active, removed) = r.split_off(&["Ghost".to_string()]);
        assert_eq!(active.headers().collect::<Vec<_>>(), vec!["Title"]);
        assert_eq!(removed.get("Ghost"), Some("x"));
    }
}
