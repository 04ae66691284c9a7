//! Page configuration.
//!
//! Every field has a default matching the stock page templates, so a config
//! JSON only needs to name what differs.

use serde::{Deserialize, Serialize};

use crate::{
    error::SigError,
    form_guard::UploadPolicy,
    signature_core::PenStyle,
    signature_svg::BoxSizing,
    style::StyleCatalog
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub forms:   FormSelectors,
    pub upload:  UploadPolicy,
    pub preview: PreviewConfig,
    pub canvas:  CanvasConfig
}

impl PageConfig {
    pub fn from_json(json: &str) -> Result<Self, SigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Element ids and selectors the form guard looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSelectors {
    pub form_id:              String,
    pub submit_button_id:     String,
    pub file_input_id:        String,
    pub text_input_id:        String,
    pub spinner_selector:     String,
    pub alert_selector:       String,
    pub view_form_selector:   String,
    pub view_text_selector:   String,
    pub view_submit_selector: String,
    pub busy_label:           String
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            form_id:              "pdfForm".into(),
            submit_button_id:     "submitBtn".into(),
            file_input_id:        "file".into(),
            text_input_id:        "text".into(),
            spinner_selector:     ".spinner-border".into(),
            alert_selector:       ".alert".into(),
            view_form_selector:   r#"form[action*="process_pdf"]"#.into(),
            view_text_selector:   r#"input[name="text"]"#.into(),
            view_submit_selector: r#"button[type="submit"]"#.into(),
            busy_label:           "Processando...".into()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub slot_selector:   String,
    /// Attribute on each slot naming its style
    pub style_attribute: String,
    /// Label rendered when the name is empty
    pub placeholder:     String,
    pub sizing:          BoxSizing,
    pub styles:          StyleCatalog
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            slot_selector:   ".signature-preview".into(),
            style_attribute: "data-style".into(),
            placeholder:     "Nome".into(),
            sizing:          BoxSizing::default(),
            styles:          StyleCatalog::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas height in pixels; width follows the container
    pub height:     u32,
    pub border:     String,
    pub background: String,
    pub pen:        PenStyle
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            height:     200,
            border:     "1px solid var(--bs-gray-400)".into(),
            background: "white".into(),
            pen:        PenStyle::default()
        }
    }
}
