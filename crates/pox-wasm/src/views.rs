//! JS-facing views of core types.

use pox_core::{DecodedAddress, PoxAddressTuple};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A decoded Bitcoin address.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedAddressView {
    /// Numeric PoX address version.
    pub version: u8,
    /// Version display name, e.g. "P2WPKH".
    pub version_name: &'static str,
    /// Hash bytes, hex encoded.
    pub data: String,
}

impl From<&DecodedAddress> for DecodedAddressView {
    fn from(decoded: &DecodedAddress) -> Self {
        DecodedAddressView {
            version: decoded.version.to_u8(),
            version_name: decoded.version.name(),
            data: hex::encode(&decoded.hash_bytes),
        }
    }
}

/// The `{ version, hashbytes }` tuple, both buffers hex encoded.
#[derive(Debug, Clone, Serialize)]
pub struct PoxAddressTupleView {
    pub version: String,
    pub hashbytes: String,
}

impl From<&PoxAddressTuple> for PoxAddressTupleView {
    fn from(tuple: &PoxAddressTuple) -> Self {
        PoxAddressTupleView {
            version: hex::encode(tuple.version_buffer()),
            hashbytes: hex::encode(&tuple.hashbytes),
        }
    }
}

/// Convert to JS value.
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
}
