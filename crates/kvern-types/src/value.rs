use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::uid::Uid;

/// Ordered attribute mapping for one record.
///
/// The codec serializes this mapping deterministically; two equal maps
/// always produce identical bytes.
pub type AttrMap = BTreeMap<String, Value>;

/// A single attribute value.
///
/// Reference attributes hold a nested [`Value::Record`] on the way in
/// (live attributes) and a [`Value::Uid`] foreign key once persisted.
/// The stored form never contains `Record` values; the writer rewrites
/// them before serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uid(Uid),
    Record(Box<Record>),
}

impl Value {
    /// Interpret this value as a record identifier.
    ///
    /// Accepts both the typed [`Value::Uid`] form and a plain string, so
    /// hand-built attribute maps with string foreign keys still resolve.
    pub fn as_uid(&self) -> Option<Uid> {
        match self {
            Self::Uid(uid) => Some(uid.clone()),
            Self::Str(raw) => Some(Uid::new(raw.clone())),
            _ => None,
        }
    }

    /// Coerce this value to a numeric score for sorted indices.
    pub fn as_score(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The nested record, if this value embeds one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Uid> for Value {
    fn from(uid: Uid) -> Self {
        Self::Uid(uid)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(Box::new(record))
    }
}
