use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use tracing::debug;

use crate::batch::{Batch, BatchOp};
use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// In-memory, HashMap-based key-value store.
///
/// Intended for tests and embedding. All state lives behind a single
/// `RwLock`; [`apply`](KvStore::apply) holds the write lock for the whole
/// batch, so the batch is atomic with respect to every reader.
pub struct InMemoryStore {
    inner: RwLock<State>,
}

#[derive(Default)]
struct State {
    strings: HashMap<String, Vec<u8>>,
    sets: HashMap<String, BTreeSet<String>>,
    zsets: HashMap<String, HashMap<String, f64>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State::default()),
        }
    }

    /// Number of live keys across all value kinds.
    pub fn key_count(&self) -> usize {
        let state = self.inner.read().expect("lock poisoned");
        state.strings.len() + state.sets.len() + state.zsets.len()
    }

    /// Sorted list of all live keys. Useful for asserting that a teardown
    /// removed exactly what a write created.
    pub fn keys(&self) -> Vec<String> {
        let state = self.inner.read().expect("lock poisoned");
        let mut keys: Vec<String> = state
            .strings
            .keys()
            .chain(state.sets.keys())
            .chain(state.zsets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Remove all keys.
    pub fn clear(&self) {
        let mut state = self.inner.write().expect("lock poisoned");
        *state = State::default();
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Members of a zset ordered by (score, member).
fn ranked(zset: &HashMap<String, f64>) -> Vec<(f64, String)> {
    let mut entries: Vec<(f64, String)> = zset
        .iter()
        .map(|(member, score)| (*score, member.clone()))
        .collect();
    entries.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    entries
}

impl KvStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.strings.get(key).cloned())
    }

    fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut state = self.inner.write().expect("lock poisoned");
        let current = match state.strings.get(key) {
            None => 0,
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| StoreError::NotAnInteger {
                    key: key.to_string(),
                })?,
        };
        let next = current + 1;
        state
            .strings
            .insert(key.to_string(), next.to_string().into_bytes());
        Ok(next)
    }

    fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn scard(&self, key: &str) -> StoreResult<usize> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.sets.get(key).map(BTreeSet::len).unwrap_or(0))
    }

    fn zcard(&self, key: &str) -> StoreResult<usize> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state.zsets.get(key).map(HashMap::len).unwrap_or(0))
    }

    fn zrange_asc(&self, key: &str) -> StoreResult<Vec<String>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .zsets
            .get(key)
            .map(|zset| ranked(zset).into_iter().map(|(_, m)| m).collect())
            .unwrap_or_default())
    }

    fn zrange_desc(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut members = self.zrange_asc(key)?;
        members.reverse();
        Ok(members)
    }

    fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let state = self.inner.read().expect("lock poisoned");
        Ok(state
            .zsets
            .get(key)
            .map(|zset| {
                ranked(zset)
                    .into_iter()
                    .filter(|(score, _)| *score >= min && *score <= max)
                    .skip(offset)
                    .take(limit)
                    .map(|(_, m)| m)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn apply(&self, batch: Batch) -> StoreResult<()> {
        let mut state = self.inner.write().expect("lock poisoned");
        debug!(ops = batch.len(), "applying batch");
        for op in batch.into_ops() {
            match op {
                BatchOp::Set { key, value } => {
                    state.strings.insert(key, value);
                }
                BatchOp::Del { key } => {
                    state.strings.remove(&key);
                }
                BatchOp::SAdd { key, member } => {
                    state.sets.entry(key).or_default().insert(member);
                }
                BatchOp::SRem { key, member } => {
                    if let Some(set) = state.sets.get_mut(&key) {
                        set.remove(&member);
                        if set.is_empty() {
                            state.sets.remove(&key);
                        }
                    }
                }
                BatchOp::ZAdd { key, score, member } => {
                    state.zsets.entry(key).or_default().insert(member, score);
                }
                BatchOp::ZRem { key, member } => {
                    if let Some(zset) = state.zsets.get_mut(&key) {
                        zset.remove(&member);
                        if zset.is_empty() {
                            state.zsets.remove(&key);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("key_count", &self.key_count())
            .finish()
    }
}
