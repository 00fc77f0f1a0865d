//! Persistence engine for Kvern.
//!
//! An [`Accessor`] binds a finalized [`Schema`](kvern_schema::Schema) to a
//! live [`KvStore`](kvern_store::KvStore) connection and exposes the four
//! operation paths:
//!
//! - **write** — assigns identifiers, rewrites embedded reference records
//!   into foreign-key attributes (persisting unsaved related records
//!   first), maintains forward and sorted indices, and commits everything
//!   as one atomic batch
//! - **read** — deserializes a record and recursively re-hydrates its
//!   declared references into nested instances
//! - **erase** — symmetrically tears down every index entry the write
//!   path created, driven by the persisted-attributes snapshot
//! - **collection** — queries the maintained indices, polymorphic over
//!   referenced / indirect / sorted collection kinds
//!
//! Every public operation acquires the accessor's exclusive store lock for
//! its whole duration, so at most one logical operation touches the store
//! connection at a time. Reference hydration follows the declared graph
//! with no cycle guard; cyclic reference schemas are unsupported.
//!
//! ```
//! use kvern_access::Accessor;
//! use kvern_schema::Schema;
//! use kvern_store::InMemoryStore;
//! use kvern_types::Record;
//!
//! let mut schema = Schema::new();
//! schema.add_model("band");
//! schema
//!     .model("musician", |m| {
//!         m.references("band");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let accessor = Accessor::new(schema, InMemoryStore::new(), "music").unwrap();
//! let mut band = Record::new("band").with("name", "Metallica");
//! accessor.write(&mut band).unwrap();
//!
//! let reloaded = accessor.read("band", band.uid().unwrap().clone()).unwrap();
//! assert_eq!(reloaded.get("name"), band.get("name"));
//! ```

pub mod accessor;
pub mod collection;
pub mod eraser;
pub mod error;
pub mod keys;
pub mod reader;
pub mod writer;

pub use accessor::Accessor;
pub use collection::Collection;
pub use error::{Error, Result};
pub use keys::KeySpace;

// Re-export the types callers need to drive the engine.
pub use kvern_schema::{CollectionOptions, ConfigError, HookError, HookPoint, Schema};
pub use kvern_store::{InMemoryStore, KvStore, StoreError};
pub use kvern_types::{AttrMap, ModelName, Record, Uid, Value};
