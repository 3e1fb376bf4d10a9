//! 汎用キャッシュモジュール
//!
//! 有効期限（TTL）と最大件数を持つ キー → 値 のキャッシュ。
//! 上限を超えた場合は最も長く参照されていないエントリから捨てる（LRU）。
//!
//! 内部は `Mutex` で保護しているので `&self` のまま複数スレッドから使える。
//! 要素検索と文字コード判定でそれぞれ別インスタンスを持ち、
//! バッチ終了時にまとめて破棄する。

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// 既定の最大件数
pub const DEFAULT_MAX_ENTRIES: usize = 100;
/// 既定の有効期限（1時間）
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// 先頭が最も古い参照
    order: VecDeque<K>,
    hits: u64,
    misses: u64,
}

/// ヒット率などの統計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct Cache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `ttl` が `None` なら期限切れなし
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // 保持しているのは純粋なデータなので、poison されても中身は使える
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() >= ttl,
            None => false,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            inner.misses += 1;
            return None;
        }

        touch(&mut inner.order, key);
        inner.hits += 1;
        inner.entries.get(key).map(|e| e.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        let mut inner = self.lock();

        if inner.entries.contains_key(&key) {
            touch(&mut inner.order, &key);
        } else {
            while inner.entries.len() >= self.max_entries {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
            }
            inner.order.push_back(key.clone());
        }

        inner.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        inner.order.retain(|k| k != key);
        inner.entries.remove(key).map(|e| e.value)
    }

    /// 条件に合うキーをまとめて削除し、削除件数を返す
    pub fn remove_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !predicate(k));
        let Inner { entries, order, .. } = &mut *inner;
        order.retain(|k| entries.contains_key(k));
        before - inner.entries.len()
    }

    /// 期限切れエントリを掃除し、削除件数を返す
    pub fn cleanup_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        let Inner { entries, order, .. } = &mut *inner;
        order.retain(|k| entries.contains_key(k));
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, Some(DEFAULT_TTL))
    }
}

fn touch<K: Eq + Clone>(order: &mut VecDeque<K>, key: &K) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}
