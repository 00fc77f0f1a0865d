use kvern_schema::Schema;
use kvern_store::KvStore;
use kvern_types::{codec, ModelName, Record, Uid, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::KeySpace;

/// One read operation: loads a stored attribute blob and recursively
/// hydrates its declared references into nested records.
///
/// Hydration walks the declared reference graph with no cycle guard, so
/// schemas whose references form a cycle must not be read through this
/// path. The returned record carries its persisted-attributes snapshot in
/// raw foreign-key form, exactly as the writer stored it.
pub(crate) struct ReadOp<'a, S: KvStore> {
    store: &'a S,
    schema: &'a Schema,
    keys: &'a KeySpace,
}

impl<'a, S: KvStore> ReadOp<'a, S> {
    pub(crate) fn new(store: &'a S, schema: &'a Schema, keys: &'a KeySpace) -> Self {
        Self {
            store,
            schema,
            keys,
        }
    }

    pub(crate) fn run(&self, model: &ModelName, uid: &Uid) -> Result<Record> {
        let description = self.schema.expect_model(model)?;
        let key = self.keys.attributes(model, uid);
        let blob = self
            .store
            .get(&key)?
            .ok_or_else(|| Error::ModelNotFound {
                model: model.clone(),
                uid: uid.clone(),
            })?;
        let stored = codec::decode(&blob)?;
        debug!(%model, %uid, attributes = stored.len(), "record loaded");

        let mut attributes = stored.clone();
        for reference in &description.references {
            let target = stored.get(&reference.foreign_key).and_then(Value::as_uid);
            if let Some(target_uid) = target {
                let nested = self.run(&reference.target_model, &target_uid)?;
                attributes.remove(&reference.foreign_key);
                attributes.insert(
                    reference.target_model.as_str().to_string(),
                    Value::from(nested),
                );
            }
        }

        let mut record = Record::new(model.clone()).with_uid(uid.clone());
        *record.attributes_mut() = attributes;
        record.set_persisted(stored);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use kvern_schema::Schema;
    use kvern_store::{InMemoryStore, KvStore};
    use kvern_types::{Record, Uid, Value};

    use crate::accessor::Accessor;
    use crate::error::Error;
    use kvern_schema::ConfigError;

    fn music_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .model("musician", |m| {
                m.references("band");
                Ok(())
            })
            .unwrap();
        schema
            .model("instrument", |m| {
                m.references("musician");
                Ok(())
            })
            .unwrap();
        schema
    }

    fn accessor() -> Accessor<InMemoryStore> {
        Accessor::new(music_schema(), InMemoryStore::new(), "music").unwrap()
    }

    #[test]
    fn round_trips_plain_attributes() {
        let accessor = accessor();
        let mut band = Record::new("band")
            .with("name", "Metallica")
            .with("formed", 1981_i64);
        accessor.write(&mut band).unwrap();

        let reloaded = accessor.read("band", "1").unwrap();
        assert_eq!(reloaded.uid(), Some(&Uid::new("1")));
        assert_eq!(reloaded.get("name"), Some(&Value::from("Metallica")));
        assert_eq!(reloaded.get("formed"), Some(&Value::Int(1981)));
    }

    #[test]
    fn hydrates_references_into_nested_records() {
        let accessor = accessor();
        let band = Record::new("band").with("name", "Metallica");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band);
        accessor.write(&mut james).unwrap();

        let reloaded = accessor.read("musician", "1").unwrap();
        assert!(reloaded.get("band_uid").is_none());
        let band = reloaded.get("band").and_then(Value::as_record).unwrap();
        assert_eq!(band.uid(), Some(&Uid::new("1")));
        assert_eq!(band.get("name"), Some(&Value::from("Metallica")));
    }

    #[test]
    fn hydrates_reference_chains() {
        let accessor = accessor();
        let band = Record::new("band").with("name", "Metallica");
        let james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band);
        let mut guitar = Record::new("instrument")
            .with("name", "Jame's guitar")
            .with("musician", james);
        accessor.write(&mut guitar).unwrap();

        let reloaded = accessor.read("instrument", "1").unwrap();
        let musician = reloaded.get("musician").and_then(Value::as_record).unwrap();
        let band = musician.get("band").and_then(Value::as_record).unwrap();
        assert_eq!(band.get("name"), Some(&Value::from("Metallica")));
    }

    #[test]
    fn snapshot_stays_in_raw_foreign_key_form() {
        let accessor = accessor();
        let band = Record::new("band").with("name", "Metallica");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band);
        accessor.write(&mut james).unwrap();

        let reloaded = accessor.read("musician", "1").unwrap();
        let snapshot = reloaded.persisted().unwrap();
        assert_eq!(snapshot.get("band_uid"), Some(&Value::Uid(Uid::new("1"))));
        assert!(snapshot.get("band").is_none());
    }

    #[test]
    fn a_read_record_rewrites_cleanly() {
        // The snapshot from a read must drive the same index diffing as a
        // snapshot from a write.
        let accessor = accessor();
        let band = Record::new("band")
            .with("name", "Metallica")
            .with_uid("M39");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band)
            .with_uid("J40");
        accessor.write(&mut james).unwrap();

        let mut reloaded = accessor.read("musician", "J40").unwrap();
        accessor.write(&mut reloaded).unwrap();
        assert_eq!(
            accessor
                .store()
                .scard("music:Musician:indices:band_uid:M39")
                .unwrap(),
            1
        );
    }

    #[test]
    fn missing_uid_is_model_not_found() {
        let accessor = accessor();
        let err = accessor.read("band", "404").unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
    }

    #[test]
    fn undescribed_model_is_a_config_error() {
        let accessor = accessor();
        let err = accessor.read("gadget", "1").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UndescribedModel(_))
        ));
    }

    #[test]
    fn dangling_reference_surfaces_as_model_not_found() {
        let accessor = accessor();
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band_uid", Uid::new("GONE"));
        accessor.write(&mut james).unwrap();

        let err = accessor.read("musician", "1").unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { ref model, .. } if model.as_str() == "band"));
    }
}
