use std::sync::Arc;

use kvern_types::Record;
use thiserror::Error;

/// Points in a record's lifecycle where hooks can run.
///
/// Only the pre-persist point exists today; the enum leaves room for more.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookPoint {
    /// Runs on every record immediately before it is persisted.
    BeforeWrite,
}

/// A hook rejected the record it was given.
///
/// The writer surfaces this to the caller unchanged after aborting the
/// whole batch.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A single hook action.
///
/// Hooks are plain function values; named-method dispatch from the
/// configuration layer becomes a closure capturing whatever it needs at
/// registration time.
pub type Hook = Arc<dyn Fn(&Record) -> Result<(), HookError> + Send + Sync>;
