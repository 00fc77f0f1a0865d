//! Binary attribute codec.
//!
//! Maps an [`AttrMap`] to a byte blob and back. The encoding is bincode
//! over the serde representation of [`Value`], which keeps the integer /
//! float distinction intact: a score stored as `Int(9)` decodes as `Int(9)`,
//! never `Float(9.0)`. Encoding is deterministic because `AttrMap` iterates
//! its keys in order.

use crate::error::CodecError;
use crate::value::AttrMap;

/// Serialize an attribute mapping to its stored byte form.
pub fn encode(attributes: &AttrMap) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(attributes).map_err(|e| CodecError::Unencodable(e.to_string()))
}

/// Deserialize a stored byte blob back into an attribute mapping.
pub fn decode(bytes: &[u8]) -> Result<AttrMap, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}
