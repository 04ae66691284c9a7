//! Signature preview slots.

use log::debug;
use web_sys::Document;

use crate::{
    config::PreviewConfig,
    error::SigError,
    signature_svg::{render, SignatureSvg},
    ui_common::DomBindings
};

/// Name shown in the previews; empty or missing names use the placeholder.
pub fn preview_label<'a>(name: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => placeholder
    }
}

/// One render per slot, in slot order. `slot_styles` holds each slot's
/// declared style id, if any.
pub fn plan_previews(
    name: Option<&str>,
    slot_styles: &[Option<String>],
    config: &PreviewConfig
) -> Vec<SignatureSvg> {
    let label = preview_label(name, &config.placeholder);
    slot_styles
        .iter()
        .map(|style| render(label, style.as_deref(), &config.styles, &config.sizing))
        .collect()
}

/// Re-render every preview slot on the page, replacing its content.
/// Returns the number of slots updated.
pub fn update_signature_previews(
    document: &Document,
    name: Option<&str>,
    config: &PreviewConfig
) -> Result<usize, SigError> {
    let slots = DomBindings::query_all(document, &config.slot_selector);
    let styles: Vec<Option<String>> = slots
        .iter()
        .map(|slot| slot.get_attribute(&config.style_attribute))
        .collect();

    for (slot, svg) in slots.iter().zip(plan_previews(name, &styles, config)) {
        let node = svg.to_element(document)?;
        slot.set_inner_html("");
        slot.append_child(&node)
            .map_err(|_| SigError::OpFailed("appendChild(svg)".into()))?;
    }
    debug!("refreshed {} signature previews", slots.len());
    Ok(slots.len())
}
