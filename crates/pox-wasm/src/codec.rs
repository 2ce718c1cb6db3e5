//! Address codec bindings.

use pox_core::{
    decode_address, encode_address, pox_address_to_tuple, AddressVersion, EncodingError, Network,
};
use wasm_bindgen::prelude::*;

use crate::error_to_js;
use crate::views::{to_js, DecodedAddressView, PoxAddressTupleView};

fn parse_network(network: &str) -> Result<Network, JsValue> {
    network.parse::<Network>().map_err(|e| error_to_js(&e))
}

/// Decode a Bitcoin address into `{ version, version_name, data }`.
///
/// # Arguments
/// * `address` - The Bitcoin address
/// * `network` - Optional expected network ("mainnet" or "testnet")
#[wasm_bindgen(js_name = decodeBtcAddress)]
pub fn decode_btc_address(address: &str, network: Option<String>) -> Result<JsValue, JsValue> {
    let expected = network.as_deref().map(parse_network).transpose()?;
    let decoded = decode_address(address, expected).map_err(|e| error_to_js(&e))?;
    to_js(&DecodedAddressView::from(&decoded))
}

/// Decode a Bitcoin address into the `{ version, hashbytes }` contract tuple.
#[wasm_bindgen(js_name = poxAddressToTuple)]
pub fn pox_address_to_tuple_js(address: &str) -> Result<JsValue, JsValue> {
    let tuple = pox_address_to_tuple(address).map_err(|e| error_to_js(&e))?;
    to_js(&PoxAddressTupleView::from(&tuple))
}

/// Encode a PoX address version and hash as a Bitcoin address.
///
/// # Arguments
/// * `version` - Numeric PoX address version (0-6)
/// * `hashbytes` - The 20 or 32 byte hash
/// * `network` - The network ("mainnet" or "testnet")
#[wasm_bindgen(js_name = poxAddressToBtcAddress)]
pub fn pox_address_to_btc_address_js(
    version: u8,
    hashbytes: &[u8],
    network: &str,
) -> Result<String, JsValue> {
    let network = parse_network(network)?;
    let version = AddressVersion::from_u8(version)
        .ok_or_else(|| error_to_js(&EncodingError::UnknownVersion(version)))?;
    encode_address(version, hashbytes, network).map_err(|e| error_to_js(&e))
}
