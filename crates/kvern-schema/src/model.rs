use std::collections::BTreeMap;

use kvern_types::ModelName;

/// One declared record type.
///
/// Immutable once the registry is finalized; accessors share it read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescription {
    pub name: ModelName,
    /// Belongs-to relationships, in declaration order.
    pub references: Vec<ReferenceDescription>,
    /// Queryable views over related records, keyed by the name used at
    /// query time.
    pub collections: BTreeMap<String, CollectionDescription>,
}

impl ModelDescription {
    pub fn new(name: ModelName) -> Self {
        Self {
            name,
            references: Vec::new(),
            collections: BTreeMap::new(),
        }
    }
}

/// A scalar belongs-to relationship.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDescription {
    /// The model being referenced.
    pub target_model: ModelName,
    /// Derived attribute holding the target's uid (`"<target>_uid"`).
    pub foreign_key: String,
    /// The reverse collection this reference creates on the target model.
    /// Populated at finalize time, exactly once.
    pub implied_collection: Option<CollectionDescription>,
}

/// Identifies the reference backing a collection: the back-link installed
/// on collections at finalize time.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceKey {
    pub model: ModelName,
    pub attribute: String,
}

/// A one-to-many or many-to-many view over an owner's related records.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionDescription {
    /// The name used at query time (plural, e.g. `"musicians"`).
    pub name: String,
    pub kind: CollectionKind,
    /// The model holding the index. For [`CollectionKind::Indirect`] this
    /// is the intermediate (join) model.
    pub source_model: ModelName,
    /// Attribute on `source_model` holding the owner's uid
    /// (`"<owner>_uid"`), uniformly for every kind.
    pub foreign_key: String,
    /// The reference on `source_model` this collection inverts. Populated
    /// at finalize time for referenced and sorted collections.
    pub reference: Option<ReferenceKey>,
}

/// Discriminates the three query shapes a collection can take.
#[derive(Clone, Debug, PartialEq)]
pub enum CollectionKind {
    /// Direct reverse foreign key: members of one index set.
    Referenced,
    /// Join through an intermediate model: the index set yields
    /// intermediate ids, each mapped through its `target_attribute`
    /// reference value to the ultimate related record.
    Indirect {
        target_model: ModelName,
        target_attribute: String,
    },
    /// Reverse foreign key ordered by a declared numeric attribute.
    Sorted {
        /// Attribute on the source model used as the ordering score.
        sort_by: String,
        /// Sorted-set identity under the owner's key
        /// (pluralized foreign key, e.g. `"song_uids"`).
        set_attribute: String,
    },
}

impl CollectionKind {
    /// Short label for diagnostics and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Referenced => "referenced",
            Self::Indirect { .. } => "indirect",
            Self::Sorted { .. } => "sorted",
        }
    }
}
