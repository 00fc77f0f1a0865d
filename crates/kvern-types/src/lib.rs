//! Foundation types for Kvern.
//!
//! This crate provides the record model shared by every other Kvern crate:
//! identifiers, attribute values, record instances, and the binary codec
//! used to persist attribute mappings.
//!
//! # Key Types
//!
//! - [`Uid`] — unique record identifier, assigned on first write
//! - [`ModelName`] — symbolic record-type identifier (`"band"`)
//! - [`Value`] — tagged attribute value (string, int, float, bool, uid,
//!   nested record)
//! - [`AttrMap`] — ordered attribute mapping (`BTreeMap<String, Value>`)
//! - [`Record`] — a typed record instance: model tag, optional uid, live
//!   attributes, and the persisted-attributes snapshot
//!
//! # Codec
//!
//! [`codec`] maps an [`AttrMap`] to bytes and back, losslessly for every
//! `Value` variant. Integer and float values round-trip bit-for-bit;
//! sorted-index scores depend on that fidelity.

pub mod codec;
pub mod error;
pub mod record;
pub mod uid;
pub mod value;

pub use error::CodecError;
pub use record::{ModelName, Record};
pub use uid::Uid;
pub use value::{AttrMap, Value};
