use wasm_bindgen::prelude::*;

/// Render a comic project (JSON) to PDF bytes for the browser.
#[wasm_bindgen]
pub fn render_comic_pdf(json: &str) -> Result<js_sys::Uint8Array, JsValue> {
    crate::export_json(json)
        .map(|bytes| js_sys::Uint8Array::from(bytes.as_slice()))
        .map_err(|e| JsValue::from_str(&format!("{}: {}", e.notification_title(), e)))
}
