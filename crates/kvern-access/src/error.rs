use kvern_schema::{ConfigError, HookError};
use kvern_store::StoreError;
use kvern_types::{CodecError, ModelName, Uid};
use thiserror::Error;

/// Errors from accessor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema is inconsistent with the requested operation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No stored attribute blob exists for this model and uid.
    #[error("no `{model}` record found with uid `{uid}`")]
    ModelNotFound { model: ModelName, uid: Uid },

    /// A before-write hook rejected a record; the batch was aborted.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The attribute codec failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The operation needs a record that has already been written.
    #[error("record has no uid; write it first")]
    UnsavedRecord,

    /// A sorted collection's sort attribute is missing or non-numeric.
    #[error("attribute `{attribute}` on `{model}` is not a numeric score")]
    InvalidScore { model: ModelName, attribute: String },

    /// The operation does not apply to this collection kind.
    #[error("`{op}` is not supported on a {kind} collection")]
    UnsupportedCollectionOp { op: &'static str, kind: &'static str },

    /// An index member has no backing reference value; the index is
    /// inconsistent with the stored records.
    #[error("reference value missing for `{model}` `{uid}` attribute `{attribute}`")]
    DanglingReference {
        model: ModelName,
        uid: Uid,
        attribute: String,
    },

    /// A stored value could not be interpreted.
    #[error("stored value at `{key}` is corrupt")]
    CorruptValue { key: String },
}

/// Result alias for accessor operations.
pub type Result<T> = std::result::Result<T, Error>;
