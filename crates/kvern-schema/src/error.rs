use kvern_types::ModelName;
use thiserror::Error;

/// Errors from schema declaration and resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A record type was used that no model declaration covers.
    #[error("model `{0}` has not been described")]
    UndescribedModel(ModelName),

    /// `via` and `sort_by` cannot both apply to one collection.
    #[error("collection `{0}` cannot use both `via` and `sort_by`")]
    ConflictingCollectionOptions(String),

    /// A collection name was queried that the owner model never declared.
    #[error("collection `{collection}` not found for model `{model}`")]
    UnknownCollection {
        model: ModelName,
        collection: String,
    },

    /// A declared reference points at a model that was never described.
    #[error("model `{model}` referenced by `{referrer}` has not been described")]
    UnresolvedReference {
        model: ModelName,
        referrer: ModelName,
    },

    /// A reference has no matching collection on its target model.
    #[error("no collection `{collection}` on model `{model}` to back a declared reference")]
    MissingImpliedCollection {
        model: ModelName,
        collection: String,
    },

    /// The registry must be finalized before accessors can use it.
    #[error("schema has not been finalized")]
    NotFinalized,
}
