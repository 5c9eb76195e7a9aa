//! In-process cache backend.
//!
//! Suitable for single-node development and tests. Values and lists live in
//! memory only, so queued tasks are lost on restart.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::{Cache, CacheResult};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<Vec<u8>>>,
}

#[derive(Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys, excluding lists.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let guard = self.inner.lock().await;
        guard.values.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Resolve Redis-style inclusive `start..=stop` indexes against `len`.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;
        match guard.values.get(key) {
            Some(entry) if entry.is_expired(now) => {
                guard.values.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut guard = self.inner.lock().await;
        guard.values.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut guard = self.inner.lock().await;
        guard.values.remove(key);
        guard.lists.remove(key);
        Ok(())
    }

    async fn rpush(&self, list: &str, value: &[u8]) -> CacheResult<()> {
        let mut guard = self.inner.lock().await;
        guard
            .lists
            .entry(list.to_string())
            .or_default()
            .push_back(value.to_vec());
        Ok(())
    }

    async fn lpop(&self, list: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut guard = self.inner.lock().await;
        let Some(items) = guard.lists.get_mut(list) else {
            return Ok(None);
        };
        let value = items.pop_front();
        if items.is_empty() {
            guard.lists.remove(list);
        }
        Ok(value)
    }

    async fn llen(&self, list: &str) -> CacheResult<usize> {
        let guard = self.inner.lock().await;
        Ok(guard.lists.get(list).map(VecDeque::len).unwrap_or(0))
    }

    async fn lrange(&self, list: &str, start: isize, stop: isize) -> CacheResult<Vec<Vec<u8>>> {
        let guard = self.inner.lock().await;
        let Some(items) = guard.lists.get(list) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(items.len(), start, stop) {
            Some((from, to)) => items.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }
}
