//! WASM bindings for the redaction editor
//!
//! All editing state lives in Rust inside a `RedactEditor`. JavaScript
//! renders pages with PDF.js, forwards pointer events in canvas pixels and
//! redraws overlays when the change callback fires.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { RedactEditor } from './pkg/redact_wasm.js';
//!
//! await init();
//!
//! const editor = new RedactEditor("statement.pdf", bytes);
//! // runs after each editing call has returned
//! editor.setChangeCallback((cause, pages) => {
//!     for (const page of pages) {
//!         redrawOverlay(page, JSON.parse(editor.getPageAnnotationsJson(page)));
//!     }
//! });
//! const id = editor.addWhiteout(1, x, y, w, h, scale);
//! editor.undo();
//! downloadBlob(editor.exportPdf(), "redacted.pdf");
//! ```

pub mod editor;

use wasm_bindgen::prelude::*;

pub use editor::RedactEditor;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    redact_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}
