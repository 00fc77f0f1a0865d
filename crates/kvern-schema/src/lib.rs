//! Schema registry for Kvern.
//!
//! A [`Schema`] accumulates model declarations — references, collections,
//! and before-write hooks — and resolves them into an immutable description
//! graph with [`Schema::finalize`]. Accessors hold the finalized registry
//! and share it freely; it is read-only after finalization.
//!
//! # Declaring a schema
//!
//! ```
//! use kvern_schema::{CollectionOptions, Schema};
//!
//! let mut schema = Schema::new();
//! schema.add_model("band");
//! schema
//!     .model("musician", |m| {
//!         m.references("band");
//!         Ok(())
//!     })
//!     .unwrap();
//! schema
//!     .model("movie", |m| {
//!         m.collection("actors", CollectionOptions::via("roles"))
//!     })
//!     .unwrap();
//! schema.finalize().unwrap();
//! ```
//!
//! Declaring a reference eagerly creates the target model and an implied
//! reverse collection on it; `finalize` then links every reference to the
//! collection it implies. Finalization is idempotent.

pub mod builder;
pub mod error;
pub mod hooks;
pub mod inflect;
pub mod model;
pub mod schema;

pub use builder::{CollectionOptions, ModelBuilder};
pub use error::ConfigError;
pub use hooks::{Hook, HookError, HookPoint};
pub use model::{
    CollectionDescription, CollectionKind, ModelDescription, ReferenceDescription, ReferenceKey,
};
pub use schema::Schema;
