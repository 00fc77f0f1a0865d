use kvern_schema::{CollectionKind, Schema};
use kvern_store::{Batch, KvStore};
use kvern_types::{Record, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::KeySpace;

/// One erase operation: removes a record's blob, its id-set membership,
/// and every index entry the write path created for it, as one atomic
/// batch.
///
/// Index teardown is driven by the persisted-attributes snapshot, so it
/// mirrors exactly what the last successful write committed, regardless of
/// how the live attributes have been mutated since. A record with a uid
/// but no snapshot only loses its blob and id-set entry.
pub(crate) struct EraseOp<'a, S: KvStore> {
    store: &'a S,
    schema: &'a Schema,
    keys: &'a KeySpace,
}

impl<'a, S: KvStore> EraseOp<'a, S> {
    pub(crate) fn new(store: &'a S, schema: &'a Schema, keys: &'a KeySpace) -> Self {
        Self {
            store,
            schema,
            keys,
        }
    }

    pub(crate) fn run(&self, record: &Record) -> Result<()> {
        let uid = record.uid().ok_or(Error::UnsavedRecord)?;
        let model = record.model();
        let description = self.schema.expect_model(model)?;

        let mut batch = Batch::new();
        batch.srem(self.keys.id_set(model), uid.as_str());
        batch.del(self.keys.attributes(model, uid));

        if let Some(snapshot) = record.persisted() {
            for reference in &description.references {
                let target = snapshot.get(&reference.foreign_key).and_then(Value::as_uid);
                let Some(target) = target else { continue };

                batch.srem(
                    self.keys.index(model, &reference.foreign_key, &target),
                    uid.as_str(),
                );
                batch.del(self.keys.reference_value(model, uid, &reference.foreign_key));

                if let Some(collection) = &reference.implied_collection {
                    if let CollectionKind::Sorted { set_attribute, .. } = &collection.kind {
                        batch.zrem(
                            self.keys.sorted(&reference.target_model, &target, set_attribute),
                            uid.as_str(),
                        );
                    }
                }
            }
        }

        debug!(%model, %uid, ops = batch.len(), "erasing record");
        self.store.apply(batch)?;
        Ok(())
    }
}
