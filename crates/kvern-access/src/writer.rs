use std::collections::VecDeque;

use kvern_schema::{CollectionKind, HookPoint, Schema};
use kvern_store::{Batch, KvStore};
use kvern_types::{codec, AttrMap, ModelName, Record, Uid, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::KeySpace;

/// One write operation: a batch of records plus the closure of their
/// unsaved embedded references, committed as a single atomic unit.
///
/// The operation runs in three phases: reserve uids for every unsaved
/// record (depth-first, declaration order), build one store batch while
/// running hooks and diffing indices against each record's persisted
/// snapshot, then apply the batch and install the new snapshots. Uid
/// reservation hits the per-model counters immediately; a failed write
/// rolls the in-memory assignments back but never rewinds a counter, so a
/// retry reserves fresh uids.
pub(crate) struct WriteOp<'a, S: KvStore> {
    store: &'a S,
    schema: &'a Schema,
    keys: &'a KeySpace,
    batch: Batch,
    reserved: VecDeque<Uid>,
    assigned: Vec<(ModelName, Uid)>,
    snapshots: VecDeque<AttrMap>,
}

impl<'a, S: KvStore> WriteOp<'a, S> {
    pub(crate) fn new(store: &'a S, schema: &'a Schema, keys: &'a KeySpace) -> Self {
        Self {
            store,
            schema,
            keys,
            batch: Batch::new(),
            reserved: VecDeque::new(),
            assigned: Vec::new(),
            snapshots: VecDeque::new(),
        }
    }

    pub(crate) fn run(mut self, records: &mut [&mut Record]) -> Result<()> {
        match self.execute(records) {
            Ok(()) => Ok(()),
            Err(err) => {
                for record in records.iter_mut() {
                    rollback_assigned(record, &self.assigned);
                }
                Err(err)
            }
        }
    }

    fn execute(&mut self, records: &mut [&mut Record]) -> Result<()> {
        for record in records.iter() {
            self.reserve(record)?;
        }
        for record in records.iter_mut() {
            self.persist(record)?;
        }
        debug!(
            records = records.len(),
            ops = self.batch.len(),
            "committing write batch"
        );
        self.store.apply(std::mem::take(&mut self.batch))?;
        for record in records.iter_mut() {
            self.install_snapshot(record);
        }
        Ok(())
    }

    /// Reserve uids for `record` and every unsaved record embedded under
    /// its declared references, before any mutation is queued.
    fn reserve(&mut self, record: &Record) -> Result<()> {
        let desc = self.schema.expect_model(record.model())?;
        if record.uid().is_none() {
            let next = self.store.incr(&self.keys.counter(record.model()))?;
            self.reserved.push_back(Uid::from(next));
        }
        for reference in &desc.references {
            if let Some(Value::Record(nested)) = record.get(reference.target_model.as_str()) {
                self.reserve(nested)?;
            }
        }
        Ok(())
    }

    /// Queue every mutation for one record, recursing into embedded
    /// reference records so their own indices are maintained too.
    fn persist(&mut self, record: &mut Record) -> Result<()> {
        let schema = self.schema;
        let keys = self.keys;
        let desc = schema.expect_model(record.model())?;

        for hook in schema.hooks(HookPoint::BeforeWrite) {
            hook(record)?;
        }

        let uid = match record.uid() {
            Some(uid) => uid.clone(),
            None => {
                let uid = self
                    .reserved
                    .pop_front()
                    .expect("uid reserved during pre-scan");
                record.set_uid(uid.clone());
                self.assigned.push((record.model().clone(), uid.clone()));
                uid
            }
        };

        let model = record.model().clone();
        self.batch.sadd(keys.id_set(&model), uid.as_str());

        // The stored form of the attributes: embedded records replaced by
        // their foreign-key uids. This is also the new snapshot.
        let mut stored = record.attributes().clone();
        for reference in &desc.references {
            let logical = reference.target_model.as_str();
            let new_target = match record.attributes_mut().get_mut(logical) {
                Some(Value::Record(nested)) => {
                    self.persist(nested)?;
                    stored.remove(logical);
                    nested.uid().cloned()
                }
                _ => stored.get(&reference.foreign_key).and_then(Value::as_uid),
            };
            let old_target = record
                .persisted()
                .and_then(|snapshot| snapshot.get(&reference.foreign_key))
                .and_then(Value::as_uid);

            if old_target != new_target {
                if let Some(old) = &old_target {
                    self.batch
                        .srem(keys.index(&model, &reference.foreign_key, old), uid.as_str());
                }
                if let Some(new) = &new_target {
                    self.batch
                        .sadd(keys.index(&model, &reference.foreign_key, new), uid.as_str());
                }
            }

            match &new_target {
                Some(new) => {
                    stored.insert(reference.foreign_key.clone(), Value::Uid(new.clone()));
                    self.batch.set(
                        keys.reference_value(&model, &uid, &reference.foreign_key),
                        new.as_str().as_bytes().to_vec(),
                    );
                }
                None => {
                    if old_target.is_some() {
                        self.batch
                            .del(keys.reference_value(&model, &uid, &reference.foreign_key));
                    }
                }
            }

            if let Some(collection) = &reference.implied_collection {
                if let CollectionKind::Sorted {
                    sort_by,
                    set_attribute,
                } = &collection.kind
                {
                    if let Some(old) = &old_target {
                        self.batch.zrem(
                            keys.sorted(&reference.target_model, old, set_attribute),
                            uid.as_str(),
                        );
                    }
                    if let Some(new) = &new_target {
                        let score = stored.get(sort_by).and_then(Value::as_score).ok_or_else(
                            || Error::InvalidScore {
                                model: model.clone(),
                                attribute: sort_by.clone(),
                            },
                        )?;
                        self.batch.zadd(
                            keys.sorted(&reference.target_model, new, set_attribute),
                            score,
                            uid.as_str(),
                        );
                    }
                }
            }
        }

        let blob = codec::encode(&stored)?;
        self.batch.set(keys.attributes(&model, &uid), blob);
        self.snapshots.push_back(stored);
        Ok(())
    }

    /// Install the snapshots collected by [`persist`](Self::persist), in
    /// the same post-order traversal, once the batch has committed.
    fn install_snapshot(&mut self, record: &mut Record) {
        if let Ok(desc) = self.schema.expect_model(record.model()) {
            for reference in &desc.references {
                if let Some(Value::Record(nested)) =
                    record.attributes_mut().get_mut(reference.target_model.as_str())
                {
                    self.install_snapshot(nested);
                }
            }
        }
        if let Some(snapshot) = self.snapshots.pop_front() {
            record.set_persisted(snapshot);
        }
    }
}

/// Clear every uid this operation assigned, leaving pre-existing uids
/// untouched. Embedded records are walked through all attribute values:
/// the failure may have been an undescribed model, so the declared
/// reference list cannot be trusted here.
fn rollback_assigned(record: &mut Record, assigned: &[(ModelName, Uid)]) {
    let matches = record.uid().is_some_and(|uid| {
        assigned
            .iter()
            .any(|(model, assigned_uid)| model == record.model() && assigned_uid == uid)
    });
    if matches {
        record.clear_uid();
    }
    for value in record.attributes_mut().values_mut() {
        if let Value::Record(nested) = value {
            rollback_assigned(nested, assigned);
        }
    }
}

#[cfg(test)]
mod tests {
    use kvern_schema::{CollectionOptions, HookError, Schema};
    use kvern_store::{InMemoryStore, KvStore};

    use crate::accessor::Accessor;
    use crate::error::Error;
    use kvern_schema::ConfigError;
    use kvern_types::{codec, Record, Uid, Value};

    fn music_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_model("band");
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
            .model("band", |m| {
                m.collection("songs", CollectionOptions::sort_by("popularity"))
            })
            .unwrap();
        schema
            .model("song", |m| {
                m.references("band");
                Ok(())
            })
            .unwrap();
        schema
    }

    fn accessor() -> Accessor<InMemoryStore> {
        Accessor::new(music_schema(), InMemoryStore::new(), "music").unwrap()
    }

    fn metallica() -> Record {
        Record::new("band").with("name", "Metallica")
    }

    // -----------------------------------------------------------------------
    // Simple writes
    // -----------------------------------------------------------------------

    #[test]
    fn assigns_the_next_uid_per_model() {
        let accessor = accessor();
        let mut band = metallica();
        accessor.write(&mut band).unwrap();
        assert_eq!(band.uid(), Some(&Uid::new("1")));

        // Each model counts independently.
        let mut musician = Record::new("musician").with("name", "James");
        accessor.write(&mut musician).unwrap();
        assert_eq!(musician.uid(), Some(&Uid::new("1")));
    }

    #[test]
    fn keeps_a_preset_uid() {
        let accessor = accessor();
        let mut band = metallica().with_uid("42");
        accessor.write(&mut band).unwrap();
        assert_eq!(band.uid(), Some(&Uid::new("42")));
    }

    #[test]
    fn adds_the_uid_to_the_model_id_set() {
        let accessor = accessor();
        let mut band = metallica();
        accessor.write(&mut band).unwrap();
        let store = accessor.store();
        assert_eq!(store.smembers("music:Band:all").unwrap(), vec!["1"]);
    }

    #[test]
    fn stores_the_serialized_attributes() {
        let accessor = accessor();
        let mut band = metallica();
        accessor.write(&mut band).unwrap();
        let blob = accessor.store().get("music:Band:1").unwrap().unwrap();
        let attributes = codec::decode(&blob).unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get("name"), Some(&Value::from("Metallica")));
    }

    #[test]
    fn installs_the_snapshot_after_commit() {
        let accessor = accessor();
        let mut band = metallica();
        accessor.write(&mut band).unwrap();
        let snapshot = band.persisted().unwrap();
        assert_eq!(snapshot.get("name"), Some(&Value::from("Metallica")));
    }

    #[test]
    fn undescribed_model_is_a_config_error() {
        let accessor = accessor();
        let mut guitar = Record::new("gadget").with("name", "Jame's guitar");
        let err = accessor.write(&mut guitar).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UndescribedModel(_))
        ));
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn writes_the_reference_uid_instead_of_the_record() {
        let accessor = accessor();
        let mut band = metallica();
        accessor.write(&mut band).unwrap();

        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band.clone());
        accessor.write(&mut james).unwrap();

        let blob = accessor.store().get("music:Musician:1").unwrap().unwrap();
        let attributes = codec::decode(&blob).unwrap();
        assert_eq!(attributes.get("name"), Some(&Value::from("James Hetfield")));
        assert_eq!(attributes.get("band_uid"), Some(&Value::Uid(Uid::new("1"))));
        assert!(attributes.get("band").is_none());
    }

    #[test]
    fn writes_embedded_unsaved_records_recursively() {
        let accessor = accessor();
        let band = metallica();
        let james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band);
        let mut guitar = Record::new("instrument")
            .with("name", "Jame's guitar")
            .with("musician", james);
        accessor.write(&mut guitar).unwrap();

        let store = accessor.store();
        assert_eq!(store.smembers("music:Instrument:all").unwrap(), vec!["1"]);
        assert_eq!(store.smembers("music:Musician:all").unwrap(), vec!["1"]);
        assert_eq!(store.smembers("music:Band:all").unwrap(), vec!["1"]);

        // The embedded copies got their uids assigned in place.
        let james = guitar.get("musician").and_then(Value::as_record).unwrap();
        assert_eq!(james.uid(), Some(&Uid::new("1")));
        let band = james.get("band").and_then(Value::as_record).unwrap();
        assert_eq!(band.uid(), Some(&Uid::new("1")));
    }

    #[test]
    fn writes_an_index_per_reference() {
        let accessor = accessor();
        let band = metallica().with_uid("M39");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band)
            .with_uid("J40");
        accessor.write(&mut james).unwrap();

        let members = accessor
            .store()
            .smembers("music:Musician:indices:band_uid:M39")
            .unwrap();
        assert_eq!(members, vec!["J40"]);
    }

    #[test]
    fn writes_the_raw_reference_value() {
        let accessor = accessor();
        let band = metallica().with_uid("M39");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band)
            .with_uid("J40");
        accessor.write(&mut james).unwrap();

        let value = accessor
            .store()
            .get("music:Musician:J40:band_uid")
            .unwrap()
            .unwrap();
        assert_eq!(value, b"M39".to_vec());
    }

    #[test]
    fn rewriting_an_unchanged_reference_leaves_one_index_entry() {
        let accessor = accessor();
        let band = metallica().with_uid("M39");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", band);
        accessor.write(&mut james).unwrap();
        accessor.write(&mut james).unwrap();

        let store = accessor.store();
        assert_eq!(
            store.scard("music:Musician:indices:band_uid:M39").unwrap(),
            1
        );
        assert_eq!(store.scard("music:Musician:all").unwrap(), 1);
    }

    #[test]
    fn moving_a_reference_swaps_index_membership() {
        let accessor = accessor();
        let suicidal = Record::new("band")
            .with("name", "Suicidal Tendencies")
            .with_uid("S43");
        let mut bob = Record::new("musician")
            .with("name", "Robert Trujillo")
            .with("band", suicidal)
            .with_uid("B44");
        accessor.write(&mut bob).unwrap();
        assert_eq!(
            accessor
                .store()
                .smembers("music:Musician:indices:band_uid:S43")
                .unwrap(),
            vec!["B44"]
        );

        bob.set("band", metallica().with_uid("M39"));
        accessor.write(&mut bob).unwrap();

        let store = accessor.store();
        assert!(store
            .smembers("music:Musician:indices:band_uid:S43")
            .unwrap()
            .is_empty());
        assert_eq!(
            store.smembers("music:Musician:indices:band_uid:M39").unwrap(),
            vec!["B44"]
        );
    }

    // -----------------------------------------------------------------------
    // Sorted indices
    // -----------------------------------------------------------------------

    #[test]
    fn writes_the_sorted_index_with_the_declared_score() {
        let accessor = accessor();
        let led_zeppelin = Record::new("band")
            .with("name", "Led Zeppelin")
            .with_uid("K42");
        let mut stairway = Record::new("song")
            .with("title", "Stairway To Heaven")
            .with("popularity", 9_i64)
            .with("band", led_zeppelin)
            .with_uid("STH");
        accessor.write(&mut stairway).unwrap();

        let store = accessor.store();
        assert_eq!(
            store.zrange_asc("music:Band:K42:song_uids").unwrap(),
            vec!["STH"]
        );
        // Score is the popularity attribute.
        assert_eq!(
            store
                .zrange_by_score("music:Band:K42:song_uids", 9.0, 9.0, 0, 10)
                .unwrap(),
            vec!["STH"]
        );
    }

    #[test]
    fn moving_a_sorted_reference_cleans_the_old_entry() {
        let accessor = accessor();
        let matisyahu = Record::new("band").with("name", "Matisyahu").with_uid("M04");
        let mut song = Record::new("song")
            .with("title", "Roxane")
            .with("popularity", 10_i64)
            .with("band", matisyahu)
            .with_uid("RX");
        accessor.write(&mut song).unwrap();

        song.set("band", Record::new("band").with("name", "Police").with_uid("P77"));
        accessor.write(&mut song).unwrap();

        let store = accessor.store();
        assert!(store
            .zrange_asc("music:Band:M04:song_uids")
            .unwrap()
            .is_empty());
        assert_eq!(
            store.zrange_asc("music:Band:P77:song_uids").unwrap(),
            vec!["RX"]
        );
    }

    #[test]
    fn missing_sort_attribute_fails_the_write() {
        let accessor = accessor();
        let band = metallica().with_uid("M39");
        let mut song = Record::new("song")
            .with("title", "Untitled")
            .with("band", band);
        let err = accessor.write(&mut song).unwrap_err();
        assert!(matches!(err, Error::InvalidScore { .. }));
        // The failed batch left nothing behind.
        assert!(accessor
            .store()
            .smembers("music:Song:all")
            .unwrap()
            .is_empty());
    }

    // -----------------------------------------------------------------------
    // Hooks and rollback
    // -----------------------------------------------------------------------

    fn schema_requiring_names() -> Schema {
        let mut schema = music_schema();
        schema.add_hook(kvern_schema::HookPoint::BeforeWrite, |record| {
            if record.get("name").is_some() {
                Ok(())
            } else {
                Err(HookError::new("record has no name"))
            }
        });
        schema
    }

    #[test]
    fn hook_failure_aborts_the_whole_batch() {
        let accessor =
            Accessor::new(schema_requiring_names(), InMemoryStore::new(), "music").unwrap();
        let mut band = metallica();
        let mut nameless = Record::new("musician");

        let err = accessor
            .write_many(&mut [&mut band, &mut nameless])
            .unwrap_err();
        assert!(matches!(err, Error::Hook(_)));

        // No partial writes, and assigned uids were rolled back.
        let store = accessor.store();
        assert!(store.smembers("music:Band:all").unwrap().is_empty());
        assert!(store.smembers("music:Musician:all").unwrap().is_empty());
        assert!(band.uid().is_none());
        assert!(nameless.uid().is_none());
    }

    #[test]
    fn hooks_run_for_embedded_records_too() {
        let accessor =
            Accessor::new(schema_requiring_names(), InMemoryStore::new(), "music").unwrap();
        let nameless_band = Record::new("band");
        let mut james = Record::new("musician")
            .with("name", "James Hetfield")
            .with("band", nameless_band);

        let err = accessor.write(&mut james).unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
        assert!(james.uid().is_none());
        let nested = james.get("band").and_then(Value::as_record).unwrap();
        assert!(nested.uid().is_none());
    }

    #[test]
    fn a_failed_write_never_reuses_its_reserved_uids() {
        let accessor =
            Accessor::new(schema_requiring_names(), InMemoryStore::new(), "music").unwrap();
        let mut nameless = Record::new("band");
        accessor.write(&mut nameless).unwrap_err();

        let mut band = metallica();
        accessor.write(&mut band).unwrap();
        assert_eq!(band.uid(), Some(&Uid::new("2")));
    }

    #[test]
    fn rollback_keeps_preexisting_uids() {
        let accessor =
            Accessor::new(schema_requiring_names(), InMemoryStore::new(), "music").unwrap();
        let mut band = metallica().with_uid("M39");
        let mut nameless = Record::new("musician");
        accessor
            .write_many(&mut [&mut band, &mut nameless])
            .unwrap_err();
        assert_eq!(band.uid(), Some(&Uid::new("M39")));
    }
}
