use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum SigError {
    #[error("DOM not available")]
    DomUnavailable,
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Canvas context unavailable")]
    NoContext2d,
    #[error("Operation failed: {0}")]
    OpFailed(String),
    #[error("Fallback style '{0}' is not in the catalog")]
    UnknownFallbackStyle(String),
    #[error("Invalid box sizing: {0}")]
    InvalidSizing(String),
    #[error("Invalid page config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(String)
}

impl From<SigError> for JsValue {
    fn from(err: SigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
