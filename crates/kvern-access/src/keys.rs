use convert_case::{Case, Casing};
use kvern_types::{ModelName, Uid};

/// Builds the hierarchical storage keys for one namespace.
///
/// Model names map to UpperCamel key segments (`band` → `Band`,
/// `front_man` → `FrontMan`); every component uses this one convention, so
/// keys written by one path are always found by the others. Segments are
/// joined with `:`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn segment(model: &ModelName) -> String {
        model.as_str().to_case(Case::UpperCamel)
    }

    /// The set of all uids of this model.
    pub fn id_set(&self, model: &ModelName) -> String {
        format!("{}:{}:all", self.namespace, Self::segment(model))
    }

    /// The model's monotonic uid counter.
    pub fn counter(&self, model: &ModelName) -> String {
        format!("{}:{}:next_uid", self.namespace, Self::segment(model))
    }

    /// The serialized attribute blob of one record.
    pub fn attributes(&self, model: &ModelName, uid: &Uid) -> String {
        format!("{}:{}:{}", self.namespace, Self::segment(model), uid)
    }

    /// The raw foreign-key value stored for one reference attribute.
    pub fn reference_value(&self, model: &ModelName, uid: &Uid, attribute: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            self.namespace,
            Self::segment(model),
            uid,
            attribute
        )
    }

    /// The set of uids of `model` whose `attribute` equals `target`.
    pub fn index(&self, model: &ModelName, attribute: &str, target: &Uid) -> String {
        format!(
            "{}:{}:indices:{}:{}",
            self.namespace,
            Self::segment(model),
            attribute,
            target
        )
    }

    /// The sorted set of related uids under one owner, scored.
    pub fn sorted(&self, target_model: &ModelName, target_uid: &Uid, set_attribute: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            self.namespace,
            Self::segment(target_model),
            target_uid,
            set_attribute
        )
    }
}
