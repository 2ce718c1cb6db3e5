//! Period resolution bindings.
//!
//! The configured-flag read is delegated to a JS callback, so the caller
//! keeps control of transport, retries and cancellation.

use js_sys::{Function, Promise};
use pox_core::{resolve_period, DataVar, Period, PoxSnapshot, StackingErrorCode};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error_to_js;
use crate::views::to_js;

/// Resolve the PoX operation period.
///
/// # Arguments
/// * `pox_info` - The node's `/v2/pox` response object
/// * `fetch_configured` - `(contractAddress, contractName, varName) => boolean | Promise<boolean>`
#[wasm_bindgen(js_name = getPoxOperationInfo)]
pub async fn get_pox_operation_info(
    pox_info: JsValue,
    fetch_configured: Function,
) -> Result<JsValue, JsValue> {
    let period = resolve(pox_info, &fetch_configured).await?;
    to_js(&period)
}

/// Resolve the contract lock and delegation calls should target.
#[wasm_bindgen(js_name = getStackingContract)]
pub async fn get_stacking_contract(
    pox_info: JsValue,
    fetch_configured: Function,
) -> Result<String, JsValue> {
    let period = resolve(pox_info, &fetch_configured).await?;
    Ok(period.stacking_contract().to_string())
}

/// Describe a stacking contract error code.
#[wasm_bindgen(js_name = getErrorString)]
pub fn get_error_string(code: u32) -> Option<String> {
    StackingErrorCode::from_code(code).map(|c| c.description().to_string())
}

async fn resolve(pox_info: JsValue, fetch_configured: &Function) -> Result<Period, JsValue> {
    let snapshot: PoxSnapshot = serde_wasm_bindgen::from_value(pox_info)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse pox info: {:?}", e)))?;

    resolve_period(&snapshot, |var| fetch_flag(fetch_configured, var))
        .await
        .map_err(|e| error_to_js(&e))
}

/// Call the JS flag callback, awaiting it when it returns a promise.
async fn fetch_flag(fetch_configured: &Function, var: DataVar) -> Result<bool, String> {
    let value = fetch_configured
        .call3(
            &JsValue::NULL,
            &JsValue::from_str(&var.contract.address),
            &JsValue::from_str(&var.contract.name),
            &JsValue::from_str(var.name),
        )
        .map_err(describe)?;

    let value = match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await.map_err(describe)?,
        Err(value) => value,
    };

    value
        .as_bool()
        .ok_or_else(|| "configured flag callback must return a boolean".to_string())
}

fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
