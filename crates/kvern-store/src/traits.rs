use crate::batch::Batch;
use crate::error::StoreResult;

/// Key-value store collaborator contract.
///
/// All implementations must satisfy these invariants:
/// - [`apply`](Self::apply) commits the whole batch or none of it; a reader
///   never observes a partially-applied batch.
/// - [`incr`](Self::incr) is atomic and returns the post-increment value;
///   a missing key counts from zero.
/// - [`smembers`](Self::smembers) returns members in a stable (sorted)
///   order so callers get deterministic results.
/// - Sorted-set ranges order by score, ties broken by member.
/// - Missing keys read as empty collections or `None`, never as errors.
pub trait KvStore: Send + Sync {
    /// Read a string value. `None` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically increment the integer at `key`, creating it at zero.
    fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Members of the set at `key`, sorted.
    fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Cardinality of the set at `key`.
    fn scard(&self, key: &str) -> StoreResult<usize>;

    /// Cardinality of the sorted set at `key`.
    fn zcard(&self, key: &str) -> StoreResult<usize>;

    /// All members of the sorted set at `key`, ascending by score.
    fn zrange_asc(&self, key: &str) -> StoreResult<Vec<String>>;

    /// All members of the sorted set at `key`, descending by score.
    fn zrange_desc(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Members whose score lies in `[min, max]`, ascending, skipping
    /// `offset` members and returning at most `limit`.
    fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<String>>;

    /// Commit a queued sequence of mutations indivisibly.
    fn apply(&self, batch: Batch) -> StoreResult<()>;
}
