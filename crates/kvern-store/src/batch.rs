/// One primitive mutation queued in a [`Batch`].
#[derive(Clone, Debug, PartialEq)]
pub enum BatchOp {
    /// Set a string value.
    Set { key: String, value: Vec<u8> },
    /// Delete a string value.
    Del { key: String },
    /// Add a member to a set.
    SAdd { key: String, member: String },
    /// Remove a member from a set.
    SRem { key: String, member: String },
    /// Add a member to a sorted set with a score, updating the score if
    /// the member is already present.
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },
    /// Remove a member from a sorted set.
    ZRem { key: String, member: String },
}

/// An ordered queue of mutations committed indivisibly by
/// [`KvStore::apply`](crate::KvStore::apply).
///
/// Operations apply in push order, so a `SRem`/`SAdd` pair on the same key
/// nets out to membership in the later target.
#[derive(Debug, Default)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// The queued operations, in push order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume the batch, yielding its operations.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value,
        });
    }

    pub fn del(&mut self, key: impl Into<String>) {
        self.ops.push(BatchOp::Del { key: key.into() });
    }

    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) {
        self.ops.push(BatchOp::SAdd {
            key: key.into(),
            member: member.into(),
        });
    }

    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) {
        self.ops.push(BatchOp::SRem {
            key: key.into(),
            member: member.into(),
        });
    }

    pub fn zadd(&mut self, key: impl Into<String>, score: f64, member: impl Into<String>) {
        self.ops.push(BatchOp::ZAdd {
            key: key.into(),
            score,
            member: member.into(),
        });
    }

    pub fn zrem(&mut self, key: impl Into<String>, member: impl Into<String>) {
        self.ops.push(BatchOp::ZRem {
            key: key.into(),
            member: member.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_keep_push_order() {
        let mut batch = Batch::new();
        batch.srem("k", "old");
        batch.sadd("k", "new");
        batch.set("blob", vec![1, 2, 3]);
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.ops()[0], BatchOp::SRem { .. }));
        assert!(matches!(batch.ops()[1], BatchOp::SAdd { .. }));
        assert!(matches!(batch.ops()[2], BatchOp::Set { .. }));
    }

    #[test]
    fn new_batch_is_empty() {
        assert!(Batch::new().is_empty());
    }
}
