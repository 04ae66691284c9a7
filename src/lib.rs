//! Browser glue for the PDF-processing page.
//!
//! - Form guard: submit gating, busy spinner, upload type/size checks
//! - Signature previews: a typed name rendered as styled SVG per slot
//! - Drawing pad: free-hand signature capture exported as a PNG data URL
//!
//! Everything that decides something lives in plain Rust modules
//! ([`form_guard`], [`signature_svg`], [`signature_core`], [`raster`]); the
//! exported functions below only read the page, call those and write back.

mod config;
mod error;
mod form_guard;
mod preview;
mod raster;
mod signature_core;
mod signature_svg;
mod style;
mod ui_common;

use std::cell::RefCell;

use log::{info, warn};
use wasm_bindgen::prelude::*;

pub use config::{CanvasConfig, FormSelectors, PageConfig, PreviewConfig};
pub use error::SigError;
pub use form_guard::{
    busy_button_html, submit_enabled, FormGuard, UploadPolicy, UploadRejection,
    MAX_UPLOAD_BYTES, PDF_MIME
};
pub use preview::{plan_previews, preview_label};
pub use raster::{parse_hex_color, Bitmap};
pub use signature_core::{
    CanvasSurface, DrawState, PenStyle, Point, PointInput, PointSource, SignaturePad, Surface,
    PNG_DATA_URL_PREFIX
};
pub use signature_svg::{render, BoxSizing, HeightRule, SignatureBox, SignatureSvg, SVG_NS};
pub use style::{StyleCatalog, StyleDefinition};
pub use ui_common::{ActivePad, DomBindings, ListenerGuard, SignatureHandle};

thread_local! {
    static CONFIG: RefCell<PageConfig> = RefCell::new(PageConfig::default());
    static GUARD: RefCell<Option<FormGuard>> = const { RefCell::new(None) };
}

fn current_config() -> PageConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) keeps the first logger.
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Replace the page configuration from JSON. Missing fields keep defaults.
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    let config = PageConfig::from_json(json)?;
    CONFIG.with(|c| *c.borrow_mut() = config);
    info!("page config updated");
    Ok(())
}

/// Wire the upload and view forms present on the page. Reinstalling drops
/// the previous listeners first. Returns false when nothing was found.
#[wasm_bindgen(js_name = installFormGuards)]
pub fn install_form_guards() -> Result<bool, JsValue> {
    let config = current_config();
    let document = DomBindings::document()?;
    GUARD.with(|g| drop(g.borrow_mut().take()));
    let guard = FormGuard::install(&document, &config.forms, &config.upload)?;
    let active = !guard.is_inert();
    GUARD.with(|g| *g.borrow_mut() = Some(guard));
    Ok(active)
}

/// Validate a file's declared type and size. Returns the alert text when
/// the file must be refused.
#[wasm_bindgen(js_name = checkUpload)]
pub fn check_upload(declared_mime: &str, size: f64) -> Option<String> {
    let policy = current_config().upload;
    policy
        .check(declared_mime, size.max(0.0) as u64)
        .err()
        .map(|rejection| rejection.to_string())
}

#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: f64) -> String {
    form_guard::format_bytes(bytes.max(0.0) as u64)
}

/// SVG markup for `name` in `style` (unknown styles fall back).
#[wasm_bindgen(js_name = generateSignatureSVG)]
pub fn generate_signature_svg(name: &str, style: Option<String>) -> String {
    let preview = current_config().preview;
    render(name, style.as_deref(), &preview.styles, &preview.sizing).to_markup()
}

/// Re-render every preview slot. Returns the number of slots updated.
#[wasm_bindgen(js_name = updateSignaturePreviews)]
pub fn update_signature_previews(name: Option<String>) -> Result<u32, JsValue> {
    let preview = current_config().preview;
    let document = DomBindings::document()?;
    let count = preview::update_signature_previews(&document, name.as_deref(), &preview)?;
    Ok(count as u32)
}

/// Create the drawing canvas inside `container_id`. Any previous pad is torn
/// down first. Returns false when the container is absent.
#[wasm_bindgen(js_name = initializeDrawingCanvas)]
pub fn initialize_drawing_canvas(container_id: &str) -> Result<bool, JsValue> {
    let canvas = current_config().canvas;
    Ok(ActivePad::install(|| DomBindings::init_in_container(container_id, &canvas))?)
}

/// Attach the drawing pad to a canvas already in the page.
#[wasm_bindgen(js_name = attachDrawingCanvas)]
pub fn attach_drawing_canvas(canvas_id: &str) -> Result<(), JsValue> {
    let canvas = current_config().canvas;
    ActivePad::install(|| DomBindings::init_by_canvas_id(canvas_id, &canvas.pen).map(Some))?;
    Ok(())
}

/// Remove the drawing pad: listeners are detached and a canvas created by
/// [`initialize_drawing_canvas`] is taken out of the page.
#[wasm_bindgen(js_name = disposeDrawingCanvas)]
pub fn dispose_drawing_canvas() {
    ActivePad::reset();
}

#[wasm_bindgen(js_name = clearSignature)]
pub fn clear_signature() {
    ActivePad::with(SignatureHandle::clear);
}

/// PNG data URL of the current drawing, or `undefined` before
/// [`initialize_drawing_canvas`] succeeded.
#[wasm_bindgen(js_name = getSignatureImage)]
pub fn get_signature_image() -> Option<String> {
    ActivePad::with(SignatureHandle::to_png_data_url).and_then(|res| match res {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("signature export failed: {e}");
            None
        }
    })
}

/// True when nothing has been drawn (or no canvas exists).
#[wasm_bindgen(js_name = isSignatureEmpty)]
pub fn is_signature_empty() -> bool {
    ActivePad::with(SignatureHandle::is_empty).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }

    #[test]
    fn test_check_upload_uses_page_policy() {
        assert_eq!(check_upload("application/pdf", 1024.0), None);
        assert_eq!(
            check_upload("image/png", 1024.0).as_deref(),
            Some("Please select a PDF file")
        );
        configure(r#"{"upload": {"max_bytes": 2097152}}"#).unwrap();
        assert_eq!(check_upload("application/pdf", 2_097_152.0), None);
        assert_eq!(
            check_upload("application/pdf", 2_097_153.0).as_deref(),
            Some("File size should not exceed 2MB")
        );
        configure("{}").unwrap();
    }

    #[test]
    fn test_generate_signature_svg_markup() {
        let markup = generate_signature_svg("Ana", Some("gothic".into()));
        assert_eq!(markup, generate_signature_svg("Ana", None));
        assert!(markup.contains("Dancing Script, cursive"));
    }

    #[test]
    fn test_no_canvas_means_no_image() {
        assert_eq!(get_signature_image(), None);
        assert!(is_signature_empty());
        clear_signature();
        dispose_drawing_canvas();
        assert_eq!(get_signature_image(), None);
    }
}
