use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a persisted record.
///
/// Uids are opaque strings. The writer assigns them from a per-model
/// monotonic counter (`"1"`, `"2"`, …), but callers may pre-set any
/// non-empty string before the first write and it will be kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(String);

impl Uid {
    /// Wrap a raw identifier string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Uid {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for Uid {
    fn from(counter: i64) -> Self {
        Self::new(counter.to_string())
    }
}
