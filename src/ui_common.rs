// src/ui_common.rs

use std::{cell::RefCell, rc::Rc};

use log::{debug, info};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent,
    Window
};

use crate::{
    config::CanvasConfig,
    error::SigError,
    signature_core::{CanvasSurface, PenStyle, Point, PointSource, SignaturePad}
};

/// RAII event listener. On drop, the callback is removed from its target.
pub struct ListenerGuard {
    target:   EventTarget,
    event:    &'static str,
    callback: Option<Closure<dyn FnMut(Event)>>
}

impl ListenerGuard {
    pub fn attach<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, SigError>
    where
        F: FnMut(Event) + 'static
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|_| SigError::OpFailed(format!("addEventListener({event})")))?;
        Ok(Self {
            target: target.clone(),
            event,
            callback: Some(callback)
        })
    }

    pub fn event(&self) -> &'static str {
        self.event
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(cb) = self.callback.take() {
            let _ = self
                .target
                .remove_event_listener_with_callback(self.event, cb.as_ref().unchecked_ref());
        }
    }
}

/// Owns the SignaturePad bound to a canvas and its JS listeners.
/// On drop, listeners are removed and a canvas this handle created is
/// detached from the page.
pub struct SignatureHandle {
    canvas:      HtmlCanvasElement,
    pad:         Rc<RefCell<SignaturePad<CanvasSurface>>>,
    _listeners:  Vec<ListenerGuard>,
    owns_canvas: bool
}

impl SignatureHandle {
    /// Initialize on a given canvas element.
    pub fn new(canvas: HtmlCanvasElement, pen: &PenStyle) -> Result<Self, SigError> {
        let surface = CanvasSurface::new(canvas.clone(), pen)?;
        let pad = Rc::new(RefCell::new(SignaturePad::new(surface)));

        let mut listeners = Vec::new();
        for source in [PointSource::Mouse, PointSource::Touch] {
            for &event in source.event_types() {
                let canvas_in_cb = canvas.clone();
                let pad_in_cb = Rc::clone(&pad);
                let guard = ListenerGuard::attach(canvas.as_ref(), event, move |e: Event| {
                    let event_type = e.type_();
                    if source.prevents_default(&event_type) {
                        e.prevent_default();
                    }
                    let at = match source {
                        PointSource::Mouse => mouse_point(&canvas_in_cb, &e),
                        PointSource::Touch => touch_point(&canvas_in_cb, &e)
                    };
                    if let Some(input) = source.input_for(&event_type, at) {
                        pad_in_cb.borrow_mut().handle(input);
                    }
                })?;
                listeners.push(guard);
            }
        }

        Ok(Self {
            canvas,
            pad,
            _listeners: listeners,
            owns_canvas: false
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn to_png_data_url(&self) -> Result<String, SigError> {
        self.pad.borrow().to_png_data_url()
    }

    pub fn is_empty(&self) -> bool {
        self.pad.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.pad.borrow_mut().clear();
    }
}

impl Drop for SignatureHandle {
    fn drop(&mut self) {
        if self.owns_canvas {
            self.canvas.remove();
        }
    }
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::new(client_x as f64 - rect.left(), client_y as f64 - rect.top())
}

fn mouse_point(canvas: &HtmlCanvasElement, e: &Event) -> Option<Point> {
    let e = e.dyn_ref::<MouseEvent>()?;
    Some(canvas_point(canvas, e.client_x(), e.client_y()))
}

/// First touch point only.
fn touch_point(canvas: &HtmlCanvasElement, e: &Event) -> Option<Point> {
    let touch = e.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some(canvas_point(canvas, touch.client_x(), touch.client_y()))
}

thread_local! {
    static ACTIVE_PAD: RefCell<Option<SignatureHandle>> = const { RefCell::new(None) };
}

/// Page-wide drawing pad. Only one surface is live at a time; installing a
/// new one tears down the previous handle first.
pub struct ActivePad;

impl ActivePad {
    /// Tear down the current pad, then build and store its successor. The
    /// old listeners are gone before `build` attaches new ones. Returns
    /// whether a pad was installed.
    pub fn install<F>(build: F) -> Result<bool, SigError>
    where
        F: FnOnce() -> Result<Option<SignatureHandle>, SigError>
    {
        Self::reset();
        let Some(handle) = build()? else {
            return Ok(false);
        };
        ACTIVE_PAD.with(|slot| *slot.borrow_mut() = Some(handle));
        Ok(true)
    }

    pub fn with<R>(f: impl FnOnce(&SignatureHandle) -> R) -> Option<R> {
        ACTIVE_PAD.with(|slot| slot.borrow().as_ref().map(f))
    }

    pub fn reset() {
        let previous = ACTIVE_PAD.with(|slot| slot.borrow_mut().take());
        if previous.is_some() {
            debug!("tearing down previous signature canvas");
        }
    }
}

/// DOM helpers. Stateless. Lookups return `None` for absent or mistyped
/// elements so callers can stay inert.
pub struct DomBindings;

impl DomBindings {
    pub fn window() -> Result<Window, SigError> {
        web_sys::window().ok_or(SigError::DomUnavailable)
    }

    pub fn document() -> Result<Document, SigError> {
        Self::window()?.document().ok_or(SigError::DomUnavailable)
    }

    pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
        let found = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<T>().ok());
        if found.is_none() {
            debug!("#{id} not present");
        }
        found
    }

    pub fn query<T: JsCast>(document: &Document, selector: &str) -> Option<T> {
        document
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<T>().ok())
    }

    pub fn query_in<T: JsCast>(parent: &Element, selector: &str) -> Option<T> {
        parent
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<T>().ok())
    }

    pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
        let Ok(list) = document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    pub fn remove_all(document: &Document, selector: &str) {
        for el in Self::query_all(document, selector) {
            el.remove();
        }
    }

    pub fn alert(message: &str) {
        if let Ok(window) = Self::window() {
            let _ = window.alert_with_message(message);
        }
    }

    /// Attach a pad to an existing canvas by id.
    pub fn init_by_canvas_id(canvas_id: &str, pen: &PenStyle) -> Result<SignatureHandle, SigError> {
        let document = Self::document()?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| SigError::ElementNotFound(canvas_id.to_string()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SigError::ElementNotFound(canvas_id.to_string()))?;

        SignatureHandle::new(canvas, pen)
    }

    /// Create a drawing canvas filling the container's width and attach a
    /// pad to it. Returns `Ok(None)` when the container is absent.
    pub fn init_in_container(
        container_id: &str,
        config: &CanvasConfig
    ) -> Result<Option<SignatureHandle>, SigError> {
        let document = Self::document()?;
        let Some(container) = Self::by_id::<HtmlElement>(&document, container_id) else {
            return Ok(None);
        };

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| SigError::OpFailed("createElement(canvas)".into()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SigError::OpFailed("created element is not <canvas>".into()))?;
        canvas.set_width(container.offset_width().max(0) as u32);
        canvas.set_height(config.height);

        let style = canvas.style();
        for (k, v) in [
            ("border", config.border.as_str()),
            ("background-color", config.background.as_str()),
            ("touch-action", "none")
        ] {
            style
                .set_property(k, v)
                .map_err(|_| SigError::OpFailed(format!("style.{k}")))?;
        }

        // The canvas only enters the page once a pad owns it.
        let mut handle = SignatureHandle::new(canvas, &config.pen)?;
        handle.owns_canvas = true;
        container
            .append_child(&handle.canvas)
            .map_err(|_| SigError::OpFailed("appendChild(canvas)".into()))?;
        info!(
            "signature canvas {}x{} ready in #{container_id}",
            handle.canvas.width(),
            handle.canvas.height()
        );
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_keeps_slot_empty_without_pad() {
        assert!(!ActivePad::install(|| Ok(None)).unwrap());
        assert!(ActivePad::with(SignatureHandle::is_empty).is_none());

        let err = ActivePad::install(|| Err(SigError::NoContext2d)).unwrap_err();
        assert!(matches!(err, SigError::NoContext2d));
        assert!(ActivePad::with(SignatureHandle::is_empty).is_none());
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use std::cell::Cell;

    use super::*;
    use wasm_bindgen_test::*;
    use web_sys::{EventInit, MouseEventInit};

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount(html: &str) -> Document {
        let document = DomBindings::document().unwrap();
        document.body().unwrap().set_inner_html(html);
        document
    }

    fn new_canvas(document: &Document) -> HtmlCanvasElement {
        document
            .create_element("canvas")
            .unwrap()
            .dyn_into::<HtmlCanvasElement>()
            .unwrap()
    }

    fn mouse(canvas: &HtmlCanvasElement, kind: &str, x: i32, y: i32) {
        let init = MouseEventInit::new();
        init.set_client_x(x);
        init.set_client_y(y);
        let event = MouseEvent::new_with_mouse_event_init_dict(kind, &init).unwrap();
        canvas.dispatch_event(&event).unwrap();
    }

    fn cancelable(kind: &str) -> Event {
        let init = EventInit::new();
        init.set_cancelable(true);
        Event::new_with_event_init_dict(kind, &init).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_listener_removed_on_drop() {
        let document = mount("");
        let div = document.create_element("div").unwrap();
        let hits = Rc::new(Cell::new(0));
        let hits_in_cb = Rc::clone(&hits);
        let guard = ListenerGuard::attach(div.as_ref(), "ping", move |_e: Event| {
            hits_in_cb.set(hits_in_cb.get() + 1);
        })
        .unwrap();
        assert_eq!(guard.event(), "ping");

        div.dispatch_event(&Event::new("ping").unwrap()).unwrap();
        drop(guard);
        div.dispatch_event(&Event::new("ping").unwrap()).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[wasm_bindgen_test]
    fn test_mouse_drag_draws_and_clear_empties() {
        let document = mount("");
        let handle = SignatureHandle::new(new_canvas(&document), &PenStyle::default()).unwrap();
        assert!(handle.is_empty());

        mouse(handle.canvas(), "mousemove", 10, 10);
        assert!(handle.is_empty());

        mouse(handle.canvas(), "mousedown", 5, 5);
        mouse(handle.canvas(), "mousemove", 40, 30);
        mouse(handle.canvas(), "mouseup", 40, 30);
        assert!(!handle.is_empty());
        assert!(handle.to_png_data_url().unwrap().starts_with("data:image/png;base64,"));

        handle.clear();
        assert!(handle.is_empty());
    }

    #[wasm_bindgen_test]
    fn test_only_touch_start_and_move_are_default_prevented() {
        let document = mount("");
        let handle = SignatureHandle::new(new_canvas(&document), &PenStyle::default()).unwrap();
        for (kind, prevented) in [
            ("touchstart", true),
            ("touchmove", true),
            ("touchend", false),
            ("touchcancel", false)
        ] {
            let event = cancelable(kind);
            handle.canvas().dispatch_event(&event).unwrap();
            assert_eq!(event.default_prevented(), prevented, "{kind}");
        }
    }

    #[wasm_bindgen_test]
    fn test_reinit_tears_down_previous_canvas() {
        let document = mount(r#"<div id="pad-box" style="width: 320px"></div>"#);
        let container: HtmlElement = DomBindings::by_id(&document, "pad-box").unwrap();
        let config = CanvasConfig::default();
        let init = || DomBindings::init_in_container("pad-box", &config);

        assert!(ActivePad::install(init).unwrap());
        let first = ActivePad::with(|h| h.canvas().clone()).unwrap();
        assert_eq!(first.width(), 320);
        assert_eq!(first.height(), 200);
        assert_eq!(container.child_element_count(), 1);

        assert!(ActivePad::install(init).unwrap());
        assert_eq!(container.child_element_count(), 1);
        assert!(first.parent_node().is_none());

        // The detached canvas no longer feeds any pad.
        mouse(&first, "mousedown", 1, 1);
        mouse(&first, "mousemove", 30, 30);
        assert_eq!(ActivePad::with(SignatureHandle::is_empty), Some(true));

        assert!(!ActivePad::install(|| DomBindings::init_in_container("missing", &config)).unwrap());
        assert_eq!(container.child_element_count(), 0);
        assert_eq!(ActivePad::with(SignatureHandle::is_empty), None);
    }

    #[wasm_bindgen_test]
    fn test_attach_to_existing_canvas() {
        let document = mount(r#"<canvas id="sig" width="100" height="50"></canvas>"#);
        let handle = DomBindings::init_by_canvas_id("sig", &PenStyle::default()).unwrap();
        assert_eq!(handle.canvas().id(), "sig");
        drop(handle);
        assert!(document.get_element_by_id("sig").is_some());

        assert!(matches!(
            DomBindings::init_by_canvas_id("nope", &PenStyle::default()),
            Err(SigError::ElementNotFound(_))
        ));
    }
}
