//! 文字コード判定
//!
//! BOM → UTF-8 として妥当か → Shift_JIS → Windows-1252 の順で判定する。
//! 同じ内容のファイルを何度も読む場合に備えて、判定結果はキャッシュする。

use crate::cache::Cache;
use crate::error::{InkMergeError, Result};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, WINDOWS_1252};
use sha2::{Digest, Sha256};
use std::time::Duration;

pub struct EncodingDetector {
    cache: Cache<String, &'static Encoding>,
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new(100, Some(Duration::from_secs(3600)))
    }
}

impl EncodingDetector {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            cache: Cache::new(max_entries, ttl),
        }
    }

    pub fn detect(&self, bytes: &[u8]) -> &'static Encoding {
        let key = content_key(bytes);
        if let Some(encoding) = self.cache.get(&key) {
            return encoding;
        }
        let encoding = sniff(bytes);
        log::debug!("文字コード判定: {}", encoding.name());
        self.cache.put(key, encoding);
        encoding
    }

    /// `label` が `None` または `auto` なら自動判定
    pub fn decode(&self, bytes: &[u8], label: Option<&str>) -> Result<String> {
        let encoding = match label.map(str::trim) {
            None | Some("") => self.detect(bytes),
            Some(l) if l.eq_ignore_ascii_case("auto") => self.detect(bytes),
            Some(l) => Encoding::for_label(l.as_bytes())
                .ok_or_else(|| InkMergeError::InvalidOption(format!("不明な文字コード: {}", l)))?,
        };

        let (text, used, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("{} として読めない文字を置換しました", used.name());
        }
        Ok(text.into_owned())
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// 内容全体の SHA-256
fn content_key(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn sniff(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    if SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
    {
        return SHIFT_JIS;
    }
    WINDOWS_1252
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_bom_and_utf8() {
        let detector = EncodingDetector::default();
        assert_eq!(detector.detect(b"\xef\xbb\xbfname\n"), UTF_8);
        assert_eq!(detector.detect(b"\xff\xfen\0"), encoding_rs::UTF_16LE);
        assert_eq!(detector.detect("氏名,年齢".as_bytes()), UTF_8);
    }

    #[test]
    fn test_detect_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("氏名,写真\n山田,a.png\n");
        let detector = EncodingDetector::default();
        assert_eq!(detector.detect(&bytes), SHIFT_JIS);
        assert_eq!(detector.decode(&bytes, None).unwrap(), "氏名,写真\n山田,a.png\n");
    }

    #[test]
    fn test_fallback_windows_1252() {
        // 0x81 0x20 は Shift_JIS として不正
        let detector = EncodingDetector::default();
        assert_eq!(detector.detect(b"caf\xe9 \x81 "), WINDOWS_1252);
    }

    #[test]
    fn test_explicit_label() {
        let detector = EncodingDetector::default();
        assert_eq!(detector.decode(b"caf\xe9", Some("latin1")).unwrap(), "café");
        assert!(matches!(
            detector.decode(b"x", Some("no-such-encoding")),
            Err(InkMergeError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_detection_is_cached() {
        let detector = EncodingDetector::default();
        detector.detect(b"abc");
        detector.detect(b"abc");
        assert_eq!(detector.cached_entries(), 1);
        detector.detect(b"abcd");
        assert_eq!(detector.cached_entries(), 2);
    }

    #[test]
    fn test_same_head_different_tail() {
        // 先頭が長く同じで長さも同じ2ファイル
        let head = "name,value\n".repeat(1000);
        let utf8 = format!("{}山田,1\n", head);
        let sjis_src = format!("{}山田太,1\n", head);
        let (sjis, _, _) = SHIFT_JIS.encode(&sjis_src);
        assert_eq!(utf8.len(), sjis.len());

        let detector = EncodingDetector::default();
        assert_eq!(detector.detect(utf8.as_bytes()), UTF_8);
        assert_eq!(detector.detect(&sjis), SHIFT_JIS, "別の内容に前の判定結果を使わない");
        assert_eq!(detector.cached_entries(), 2);
    }
}
