//! Key-value store interface for Kvern.
//!
//! The persistence engine treats its store as an external collaborator
//! specified purely at this interface: string values, member sets, scored
//! sorted sets, an atomic counter, and an atomic batch that commits a
//! queued sequence of mutations indivisibly.
//!
//! # Design Rules
//!
//! 1. All mutations flow through [`Batch`] + [`KvStore::apply`]; reads and
//!    counter increments are the only direct operations.
//! 2. `apply` is all-or-nothing: on internal error no queued mutation may
//!    remain visible.
//! 3. Set membership operations are idempotent (`sadd` of a present member
//!    and `srem` of an absent one are no-ops).
//! 4. `zadd` of a present member updates its score in place.
//! 5. Errors are propagated, never silently ignored.
//!
//! # Backends
//!
//! - [`InMemoryStore`] — `RwLock`-guarded maps for tests and embedding.

pub mod batch;
pub mod error;
pub mod memory;
pub mod traits;

pub use batch::{Batch, BatchOp};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::KvStore;
