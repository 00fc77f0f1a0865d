use std::collections::BTreeSet;
use std::fmt;

use kvern_schema::{CollectionDescription, CollectionKind};
use kvern_store::KvStore;
use kvern_types::{ModelName, Record, Uid};

use crate::accessor::Accessor;
use crate::error::{Error, Result};
use crate::reader::ReadOp;

/// A query handle over one owner record's declared collection.
///
/// Obtained from [`Accessor::collection`]; borrows the accessor and locks
/// its store once per query. The same handle serves all three collection
/// kinds; `first` and `last` only apply to sorted collections.
pub struct Collection<'a, S: KvStore> {
    accessor: &'a Accessor<S>,
    description: &'a CollectionDescription,
    owner_model: ModelName,
    owner_uid: Uid,
}

impl<'a, S: KvStore> Collection<'a, S> {
    pub(crate) fn new(
        accessor: &'a Accessor<S>,
        description: &'a CollectionDescription,
        owner_model: ModelName,
        owner_uid: Uid,
    ) -> Self {
        Self {
            accessor,
            description,
            owner_model,
            owner_uid,
        }
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn kind(&self) -> &CollectionKind {
        &self.description.kind
    }

    /// Number of member records. For indirect collections this counts
    /// distinct targets, not intermediate records.
    pub fn count(&self) -> Result<usize> {
        let store = self.accessor.store();
        match &self.description.kind {
            CollectionKind::Referenced => Ok(store.scard(&self.index_key())?),
            CollectionKind::Sorted { set_attribute, .. } => {
                Ok(store.zcard(&self.sorted_key(set_attribute))?)
            }
            CollectionKind::Indirect {
                target_attribute, ..
            } => Ok(self.indirect_uids(&*store, target_attribute)?.len()),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    /// Member uids. Sorted collections come back in ascending score order,
    /// the other kinds in uid order.
    pub fn uids(&self) -> Result<Vec<Uid>> {
        let store = self.accessor.store();
        self.uids_with(&*store)
    }

    /// Every member record, hydrated.
    pub fn all(&self) -> Result<Vec<Record>> {
        let store = self.accessor.store();
        let reader = ReadOp::new(&*store, self.accessor.schema(), self.accessor.keys());
        let model = self.member_model();
        self.uids_with(&*store)?
            .iter()
            .map(|uid| reader.run(model, uid))
            .collect()
    }

    /// The lowest-scored member of a sorted collection.
    pub fn first(&self) -> Result<Option<Record>> {
        let set_attribute = self.require_sorted("first")?;
        let store = self.accessor.store();
        let members = store.zrange_by_score(
            &self.sorted_key(set_attribute),
            f64::NEG_INFINITY,
            f64::INFINITY,
            0,
            1,
        )?;
        self.read_member(&*store, members.first())
    }

    /// The highest-scored member of a sorted collection.
    pub fn last(&self) -> Result<Option<Record>> {
        let set_attribute = self.require_sorted("last")?;
        let store = self.accessor.store();
        let members = store.zrange_desc(&self.sorted_key(set_attribute))?;
        self.read_member(&*store, members.first())
    }

    /// The model the member records belong to.
    pub fn member_model(&self) -> &ModelName {
        match &self.description.kind {
            CollectionKind::Indirect { target_model, .. } => target_model,
            _ => &self.description.source_model,
        }
    }

    fn index_key(&self) -> String {
        self.accessor.keys().index(
            &self.description.source_model,
            &self.description.foreign_key,
            &self.owner_uid,
        )
    }

    fn sorted_key(&self, set_attribute: &str) -> String {
        self.accessor
            .keys()
            .sorted(&self.owner_model, &self.owner_uid, set_attribute)
    }

    fn require_sorted(&self, op: &'static str) -> Result<&str> {
        match &self.description.kind {
            CollectionKind::Sorted { set_attribute, .. } => Ok(set_attribute),
            other => Err(Error::UnsupportedCollectionOp {
                op,
                kind: other.label(),
            }),
        }
    }

    fn uids_with(&self, store: &S) -> Result<Vec<Uid>> {
        match &self.description.kind {
            CollectionKind::Referenced => Ok(store
                .smembers(&self.index_key())?
                .into_iter()
                .map(Uid::from)
                .collect()),
            CollectionKind::Sorted { set_attribute, .. } => Ok(store
                .zrange_asc(&self.sorted_key(set_attribute))?
                .into_iter()
                .map(Uid::from)
                .collect()),
            CollectionKind::Indirect {
                target_attribute, ..
            } => self.indirect_uids(store, target_attribute),
        }
    }

    /// Resolve an indirect collection: each intermediate record in the
    /// index set maps through its stored reference value to one target
    /// uid. Distinct targets, uid order.
    fn indirect_uids(&self, store: &S, target_attribute: &str) -> Result<Vec<Uid>> {
        let keys = self.accessor.keys();
        let mut targets = BTreeSet::new();
        for member in store.smembers(&self.index_key())? {
            let source_uid = Uid::from(member);
            let key = keys.reference_value(
                &self.description.source_model,
                &source_uid,
                target_attribute,
            );
            let raw = store.get(&key)?.ok_or_else(|| Error::DanglingReference {
                model: self.description.source_model.clone(),
                uid: source_uid.clone(),
                attribute: target_attribute.to_string(),
            })?;
            let target =
                String::from_utf8(raw).map_err(|_| Error::CorruptValue { key })?;
            targets.insert(Uid::from(target));
        }
        Ok(targets.into_iter().collect())
    }

    fn read_member(&self, store: &S, member: Option<&String>) -> Result<Option<Record>> {
        match member {
            Some(member) => {
                let reader =
                    ReadOp::new(store, self.accessor.schema(), self.accessor.keys());
                let record =
                    reader.run(&self.description.source_model, &Uid::new(member.as_str()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl<'a, S: KvStore> fmt::Debug for Collection<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.description.name)
            .field("kind", &self.description.kind.label())
            .field("owner_model", &self.owner_model)
            .field("owner_uid", &self.owner_uid)
            .finish()
    }
}
