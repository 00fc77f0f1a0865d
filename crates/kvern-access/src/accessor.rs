use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use kvern_schema::{ConfigError, Schema};
use kvern_store::KvStore;
use kvern_types::{ModelName, Record, Uid};

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::eraser::EraseOp;
use crate::keys::KeySpace;
use crate::reader::ReadOp;
use crate::writer::WriteOp;

/// One store connection bound to a finalized schema and a key namespace.
///
/// The store sits behind a mutex and every operation holds it for its
/// whole duration, so concurrent callers serialize at the logical
/// operation boundary rather than interleaving store commands. Clone the
/// schema into several accessors (see [`with_shared`](Self::with_shared))
/// to spread load over multiple connections.
pub struct Accessor<S: KvStore> {
    schema: Arc<Schema>,
    store: Mutex<S>,
    keys: KeySpace,
}

impl<S: KvStore> Accessor<S> {
    /// Bind `schema` to `store` under `namespace`, finalizing the schema.
    pub fn new(mut schema: Schema, store: S, namespace: impl Into<String>) -> Result<Self> {
        schema.finalize()?;
        Ok(Self {
            schema: Arc::new(schema),
            store: Mutex::new(store),
            keys: KeySpace::new(namespace),
        })
    }

    /// Bind an already-finalized shared schema to another store
    /// connection. Fails if the schema was never finalized, since a
    /// shared schema cannot be mutated here.
    pub fn with_shared(
        schema: Arc<Schema>,
        store: S,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        if !schema.is_finalized() {
            return Err(ConfigError::NotFinalized.into());
        }
        Ok(Self {
            schema,
            store: Mutex::new(store),
            keys: KeySpace::new(namespace),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The shared schema handle, for building sibling accessors.
    pub fn schema_handle(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Exclusive access to the underlying store connection.
    ///
    /// Operations already lock internally; use this only for direct
    /// inspection of the stored keys.
    pub fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().expect("store lock poisoned")
    }

    /// Persist one record (and any unsaved records embedded under its
    /// declared references) as one atomic batch.
    pub fn write(&self, record: &mut Record) -> Result<()> {
        self.write_many(&mut [record])
    }

    /// Persist several records as one atomic batch: either every record
    /// commits or none does.
    pub fn write_many(&self, records: &mut [&mut Record]) -> Result<()> {
        let store = self.store();
        WriteOp::new(&*store, &self.schema, &self.keys).run(records)
    }

    /// Load one record by model and uid, recursively hydrating its
    /// declared references into nested records.
    pub fn read(&self, model: impl Into<ModelName>, uid: impl Into<Uid>) -> Result<Record> {
        let store = self.store();
        ReadOp::new(&*store, &self.schema, &self.keys).run(&model.into(), &uid.into())
    }

    /// Remove a record and every index entry its writes created.
    pub fn erase(&self, record: &Record) -> Result<()> {
        let store = self.store();
        EraseOp::new(&*store, &self.schema, &self.keys).run(record)
    }

    /// A query handle over one of `owner`'s declared collections.
    pub fn collection<'a>(&'a self, owner: &Record, name: &str) -> Result<Collection<'a, S>> {
        let description = self.schema.expect_model(owner.model())?;
        let collection = description.collections.get(name).ok_or_else(|| {
            ConfigError::UnknownCollection {
                model: owner.model().clone(),
                collection: name.to_string(),
            }
        })?;
        let owner_uid = owner.uid().cloned().ok_or(Error::UnsavedRecord)?;
        Ok(Collection::new(
            self,
            collection,
            owner.model().clone(),
            owner_uid,
        ))
    }
}

impl<S: KvStore> fmt::Debug for Accessor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("namespace", &self.keys.namespace())
            .field("schema", &self.schema)
            .finish()
    }
}
