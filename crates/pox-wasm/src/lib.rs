//! WebAssembly bindings for the PoX stacking client core.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Decoding and encoding Bitcoin reward addresses
//! - Resolving the PoX operation period from a node's PoX info
//! - Looking up stacking contract error descriptions

use wasm_bindgen::prelude::*;

pub mod codec;
pub mod logger;
pub mod period;
pub mod views;

/// Initialize the WASM module with better panic messages and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logger::init(log::LevelFilter::Info);
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Render an error and its causes as a JS error message.
pub(crate) fn error_to_js(err: &dyn std::error::Error) -> JsValue {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    JsValue::from_str(&message)
}
