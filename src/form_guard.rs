//! Upload form guard.
//!
//! Pure rules ([`submit_enabled`], [`UploadPolicy::check`]) plus the DOM
//! wiring that applies them to the page's forms. Every piece of wiring is
//! optional: a missing element leaves that piece inert.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlInputElement};

use crate::{
    config::FormSelectors,
    error::SigError,
    ui_common::{DomBindings, ListenerGuard}
};

pub const PDF_MIME: &str = "application/pdf";
const MIB: u64 = 1024 * 1024;
pub const MAX_UPLOAD_BYTES: u64 = 10 * MIB;

/// Submit is allowed once the text has any non-whitespace content.
pub fn submit_enabled(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Why a chosen file was refused. `Display` is the alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Please select a PDF file")]
    WrongType { declared: String },
    #[error("File size should not exceed {}MB", .limit / MIB)]
    TooLarge { size: u64, limit: u64 }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub accepted_mime: String,
    pub max_bytes:     u64
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_mime: PDF_MIME.to_string(),
            max_bytes:     MAX_UPLOAD_BYTES
        }
    }
}

impl UploadPolicy {
    /// Type must match exactly; size may equal the limit.
    pub fn check(&self, declared_mime: &str, size: u64) -> Result<(), UploadRejection> {
        if declared_mime != self.accepted_mime {
            return Err(UploadRejection::WrongType {
                declared: declared_mime.to_string()
            });
        }
        if size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size,
                limit: self.max_bytes
            });
        }
        Ok(())
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Button content shown while the view form submits.
pub fn busy_button_html(label: &str) -> String {
    format!(
        "<span class=\"spinner-border spinner-border-sm mr-2\" role=\"status\" \
         aria-hidden=\"true\"></span> {label}"
    )
}

/// Listeners installed on the page's forms. Dropping the guard detaches them.
pub struct FormGuard {
    listeners: Vec<ListenerGuard>
}

impl FormGuard {
    pub fn install(
        document: &Document,
        selectors: &FormSelectors,
        policy: &UploadPolicy
    ) -> Result<Self, SigError> {
        let mut listeners = Vec::new();
        wire_upload_form(document, selectors, policy, &mut listeners)?;
        wire_view_form(document, selectors, &mut listeners)?;
        info!("form guard installed with {} listeners", listeners.len());
        Ok(Self { listeners })
    }

    pub fn is_inert(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.listeners.iter().map(ListenerGuard::event)
    }
}

fn wire_upload_form(
    document: &Document,
    sel: &FormSelectors,
    policy: &UploadPolicy,
    listeners: &mut Vec<ListenerGuard>
) -> Result<(), SigError> {
    let Some(form) = DomBindings::by_id::<Element>(document, &sel.form_id) else {
        return Ok(());
    };
    let submit_btn = DomBindings::by_id::<HtmlButtonElement>(document, &sel.submit_button_id);

    if let Some(btn) = submit_btn.clone() {
        let spinner = DomBindings::query_in::<Element>(&btn, &sel.spinner_selector);
        let doc = document.clone();
        let alert_selector = sel.alert_selector.clone();
        listeners.push(ListenerGuard::attach(form.as_ref(), "submit", move |_e: Event| {
            btn.set_disabled(true);
            if let Some(spinner) = &spinner {
                let _ = spinner.class_list().remove_1("d-none");
            }
            DomBindings::remove_all(&doc, &alert_selector);
        })?);
    }

    if let Some(input) = DomBindings::by_id::<HtmlInputElement>(document, &sel.file_input_id) {
        let policy = policy.clone();
        let input_in_cb = input.clone();
        listeners.push(ListenerGuard::attach(input.as_ref(), "change", move |_e: Event| {
            if let Some(rejection) = screen_upload(&input_in_cb, &policy) {
                DomBindings::alert(&rejection.to_string());
            }
        })?);
    }

    if let (Some(input), Some(btn)) = (
        DomBindings::by_id::<HtmlInputElement>(document, &sel.text_input_id),
        submit_btn
    ) {
        listeners.push(bind_text_to_button(input, btn)?);
    }

    Ok(())
}

/// Check the first chosen file. A refused file is cleared from the input.
fn screen_upload(input: &HtmlInputElement, policy: &UploadPolicy) -> Option<UploadRejection> {
    let file = input.files().and_then(|list| list.get(0))?;
    let size = file.size() as u64;
    match policy.check(&file.type_(), size) {
        Ok(()) => {
            debug!("accepted {} ({})", file.name(), format_bytes(size));
            None
        }
        Err(rejection) => {
            warn!(
                "rejected {} ({}, {:?}): {rejection}",
                file.name(),
                format_bytes(size),
                file.type_()
            );
            input.set_value("");
            Some(rejection)
        }
    }
}

fn wire_view_form(
    document: &Document,
    sel: &FormSelectors,
    listeners: &mut Vec<ListenerGuard>
) -> Result<(), SigError> {
    let Some(form) = DomBindings::query::<Element>(document, &sel.view_form_selector) else {
        debug!("{} not present", sel.view_form_selector);
        return Ok(());
    };
    let search = DomBindings::query_in::<HtmlInputElement>(&form, &sel.view_text_selector);
    let button = DomBindings::query_in::<HtmlButtonElement>(&form, &sel.view_submit_selector);
    let (Some(search), Some(button)) = (search, button) else {
        return Ok(());
    };

    listeners.push(bind_text_to_button(search, button.clone())?);

    let busy = busy_button_html(&sel.busy_label);
    listeners.push(ListenerGuard::attach(form.as_ref(), "submit", move |_e: Event| {
        button.set_disabled(true);
        button.set_inner_html(&busy);
    })?);

    Ok(())
}

/// Keep `button` disabled while `input` holds only whitespace. The button is
/// synced once immediately so the page starts consistent.
fn bind_text_to_button(
    input: HtmlInputElement,
    button: HtmlButtonElement
) -> Result<ListenerGuard, SigError> {
    button.set_disabled(!submit_enabled(&input.value()));
    let input_in_cb = input.clone();
    ListenerGuard::attach(input.as_ref(), "input", move |_e: Event| {
        button.set_disabled(!submit_enabled(&input_in_cb.value()));
    })
}
