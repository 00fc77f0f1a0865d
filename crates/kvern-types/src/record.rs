use std::fmt;

use serde::{Deserialize, Serialize};

use crate::uid::Uid;
use crate::value::{AttrMap, Value};

/// Symbolic record-type identifier, e.g. `"band"` or `"musician"`.
///
/// Model names are declared in snake case; the key namespace maps them to
/// UpperCamel storage segments (`band` → `Band`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModelName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A typed record instance.
///
/// Records are tagged with their [`ModelName`] rather than resolved through
/// runtime reflection; one concrete struct represents every declared model.
/// A record is transient until the writer assigns it a [`Uid`] and commits
/// its attribute blob. After a successful write or read the
/// persisted-attributes snapshot is populated, always in raw foreign-key
/// form (reference attributes as uids, never nested records). The writer
/// diffs that snapshot against live attributes to maintain indices, and the
/// eraser reads it to tear them down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model: ModelName,
    uid: Option<Uid>,
    attributes: AttrMap,
    #[serde(skip)]
    persisted: Option<AttrMap>,
}

impl Record {
    /// Create a transient record of the given model with no attributes.
    pub fn new(model: impl Into<ModelName>) -> Self {
        Self {
            model: model.into(),
            uid: None,
            attributes: AttrMap::new(),
            persisted: None,
        }
    }

    /// Fluent attribute setter for construction sites.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Fluent uid setter, for records whose identifier is chosen by the
    /// caller rather than the writer.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<Uid>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    pub fn set_uid(&mut self, uid: Uid) {
        self.uid = Some(uid);
    }

    /// Drop the assigned identifier. Used by the writer to roll back
    /// speculative assignments when a batch fails.
    pub fn clear_uid(&mut self) {
        self.uid = None;
    }

    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttrMap {
        &mut self.attributes
    }

    /// Shorthand attribute lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Insert or replace one attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// The persisted-attributes snapshot, if this record has ever been
    /// successfully written or read.
    pub fn persisted(&self) -> Option<&AttrMap> {
        self.persisted.as_ref()
    }

    pub fn set_persisted(&mut self, attributes: AttrMap) {
        self.persisted = Some(attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_transient() {
        let band = Record::new("band").with("name", "Metallica");
        assert_eq!(band.model().as_str(), "band");
        assert!(band.uid().is_none());
        assert!(band.persisted().is_none());
        assert_eq!(band.get("name"), Some(&Value::from("Metallica")));
    }

    #[test]
    fn with_uid_presets_the_identifier() {
        let band = Record::new("band").with_uid("K42");
        assert_eq!(band.uid(), Some(&Uid::new("K42")));
    }

    #[test]
    fn clear_uid_rolls_back_assignment() {
        let mut band = Record::new("band").with_uid("K42");
        band.clear_uid();
        assert!(band.uid().is_none());
    }

    #[test]
    fn nested_records_are_attribute_values() {
        let band = Record::new("band").with("name", "Metallica");
        let musician = Record::new("musician")
            .with("name", "James")
            .with("band", band.clone());
        let nested = musician.get("band").and_then(Value::as_record);
        assert_eq!(nested, Some(&band));
    }

    #[test]
    fn snapshot_is_not_serialized() {
        let mut band = Record::new("band").with("name", "Metallica");
        band.set_persisted(band.attributes().clone());
        let bytes = bincode::serialize(&band).expect("serialize");
        let back: Record = bincode::deserialize(&bytes).expect("deserialize");
        assert!(back.persisted().is_none());
        assert_eq!(back.attributes(), band.attributes());
    }
}
