use base64::Engine;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::SigError;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Canvas-relative coordinate in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input-device independent point event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointInput {
    Down(Point),
    Move(Point),
    Up,
    Leave
}

/// Producers of [`PointInput`]. Each maps its own DOM event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSource {
    Mouse,
    Touch
}

impl PointSource {
    pub fn event_types(self) -> &'static [&'static str] {
        match self {
            PointSource::Mouse => &["mousedown", "mousemove", "mouseup", "mouseleave"],
            PointSource::Touch => &["touchstart", "touchmove", "touchend", "touchcancel"]
        }
    }

    /// Touch start and move must not scroll the page. Ending a touch keeps
    /// its default so the browser still synthesizes the click.
    pub fn prevents_default(self, event_type: &str) -> bool {
        matches!(
            (self, event_type),
            (PointSource::Touch, "touchstart") | (PointSource::Touch, "touchmove")
        )
    }

    /// Translate a DOM event into a point input. `at` is the canvas-relative
    /// position, when the event carries one.
    pub fn input_for(self, event_type: &str, at: Option<Point>) -> Option<PointInput> {
        match (self, event_type) {
            (PointSource::Mouse, "mousedown") | (PointSource::Touch, "touchstart") => {
                at.map(PointInput::Down)
            }
            (PointSource::Mouse, "mousemove") | (PointSource::Touch, "touchmove") => {
                at.map(PointInput::Move)
            }
            (PointSource::Mouse, "mouseup")
            | (PointSource::Touch, "touchend")
            | (PointSource::Touch, "touchcancel") => Some(PointInput::Up),
            (PointSource::Mouse, "mouseleave") => Some(PointInput::Leave),
            _ => None
        }
    }
}

/// Pen used for strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenStyle {
    pub color:      String,
    pub line_width: f64
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color:      crate::style::DEFAULT_INK.to_string(),
            line_width: 2.0
        }
    }
}

/// Raster target of a [`SignaturePad`]. Strokes are immediate: nothing but
/// the pixels is retained.
pub trait Surface {
    fn stroke_segment(&mut self, from: Point, to: Point);
    fn clear(&mut self);
    fn to_png_data_url(&self) -> Result<String, SigError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    Drawing { last: Point }
}

/// Encapsulates drawing logic and export of signature.
pub struct SignaturePad<S> {
    surface:  S,
    state:    DrawState,
    is_empty: bool
}

impl<S: Surface> SignaturePad<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: DrawState::Idle,
            is_empty: true
        }
    }

    pub fn handle(&mut self, input: PointInput) {
        match input {
            PointInput::Down(p) => self.pointer_down(p),
            PointInput::Move(p) => self.pointer_move(p),
            PointInput::Up | PointInput::Leave => self.pointer_up()
        }
    }

    /// Handle pointer down: start a new path.
    pub fn pointer_down(&mut self, at: Point) {
        self.state = DrawState::Drawing { last: at };
    }

    /// Handle pointer move: stroke if active.
    pub fn pointer_move(&mut self, to: Point) {
        let DrawState::Drawing { last } = self.state else {
            return;
        };
        self.surface.stroke_segment(last, to);
        self.state = DrawState::Drawing { last: to };
        self.is_empty = false;
    }

    /// Handle pointer up/leave: stop drawing.
    pub fn pointer_up(&mut self) {
        self.state = DrawState::Idle;
    }

    pub fn clear(&mut self) {
        self.surface.clear();
        self.is_empty = true;
    }

    /// Is pad empty (nothing stroked since the last clear)?
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Export as PNG data URL (for <img src="...">).
    pub fn to_png_data_url(&self) -> Result<String, SigError> {
        self.surface.to_png_data_url()
    }

    /// Export raw PNG bytes (without data URL).
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SigError> {
        let data_url = self.to_png_data_url()?;
        let b64 = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| SigError::OpFailed("unexpected data URL".into()))?;
        base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| SigError::OpFailed(format!("base64 decode: {e}")))
    }
}

/// Browser canvas backed surface.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx:    CanvasRenderingContext2d
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, pen: &PenStyle) -> Result<Self, SigError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| SigError::NoContext2d)?
            .ok_or(SigError::NoContext2d)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SigError::NoContext2d)?;

        ctx.set_stroke_style_str(&pen.color);
        ctx.set_line_width(pen.line_width);
        ctx.set_line_join("round");
        ctx.set_line_cap("round");

        Ok(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    fn stroke_segment(&mut self, from: Point, to: Point) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
    }

    fn clear(&mut self) {
        let w = self.canvas.width();
        let h = self.canvas.height();
        self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
    }

    fn to_png_data_url(&self) -> Result<String, SigError> {
        self.canvas
            .to_data_url_with_type("image/png")
            .map_err(|_| SigError::OpFailed("to_data_url".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        segments: Vec<(Point, Point)>,
        clears:   usize
    }

    impl Surface for Recorder {
        fn stroke_segment(&mut self, from: Point, to: Point) {
            self.segments.push((from, to));
        }

        fn clear(&mut self) {
            self.segments.clear();
            self.clears += 1;
        }

        fn to_png_data_url(&self) -> Result<String, SigError> {
            Ok(format!("{PNG_DATA_URL_PREFIX}iVBORw=="))
        }
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut pad = SignaturePad::new(Recorder::default());
        pad.pointer_move(Point::new(5.0, 5.0));
        assert!(pad.surface().segments.is_empty());
        assert!(pad.is_empty());
        assert_eq!(pad.state(), DrawState::Idle);
    }

    #[test]
    fn test_stroke_follows_pointer() {
        let mut pad = SignaturePad::new(Recorder::default());
        pad.handle(PointInput::Down(Point::new(1.0, 1.0)));
        pad.handle(PointInput::Move(Point::new(2.0, 3.0)));
        pad.handle(PointInput::Move(Point::new(4.0, 4.0)));
        pad.handle(PointInput::Up);
        pad.handle(PointInput::Move(Point::new(9.0, 9.0)));

        assert_eq!(
            pad.surface().segments,
            vec![
                (Point::new(1.0, 1.0), Point::new(2.0, 3.0)),
                (Point::new(2.0, 3.0), Point::new(4.0, 4.0))
            ]
        );
        assert!(!pad.is_empty());
        assert_eq!(pad.state(), DrawState::Idle);
    }

    #[test]
    fn test_leave_stops_drawing() {
        let mut pad = SignaturePad::new(Recorder::default());
        pad.handle(PointInput::Down(Point::new(0.0, 0.0)));
        pad.handle(PointInput::Leave);
        pad.handle(PointInput::Move(Point::new(3.0, 3.0)));
        assert!(pad.surface().segments.is_empty());
    }

    #[test]
    fn test_down_without_move_leaves_pad_empty() {
        let mut pad = SignaturePad::new(Recorder::default());
        pad.handle(PointInput::Down(Point::new(0.0, 0.0)));
        pad.handle(PointInput::Up);
        assert!(pad.is_empty());
    }

    #[test]
    fn test_clear_resets_empty_flag() {
        let mut pad = SignaturePad::new(Recorder::default());
        pad.pointer_down(Point::new(0.0, 0.0));
        pad.pointer_move(Point::new(1.0, 0.0));
        pad.clear();
        assert!(pad.is_empty());
        assert_eq!(pad.surface().clears, 1);
    }

    #[test]
    fn test_png_bytes_strip_prefix() {
        let pad = SignaturePad::new(Recorder::default());
        let bytes = pad.to_png_bytes().unwrap();
        assert_eq!(bytes, [0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_mouse_and_touch_map_to_same_inputs() {
        let p = Some(Point::new(3.0, 4.0));
        assert_eq!(
            PointSource::Mouse.input_for("mousedown", p),
            PointSource::Touch.input_for("touchstart", p)
        );
        assert_eq!(
            PointSource::Mouse.input_for("mousemove", p),
            PointSource::Touch.input_for("touchmove", p)
        );
        assert_eq!(PointSource::Touch.input_for("touchend", None), Some(PointInput::Up));
        assert_eq!(PointSource::Mouse.input_for("mouseleave", None), Some(PointInput::Leave));
    }

    #[test]
    fn test_only_touch_start_and_move_prevent_default() {
        assert!(PointSource::Touch.prevents_default("touchstart"));
        assert!(PointSource::Touch.prevents_default("touchmove"));
        assert!(!PointSource::Touch.prevents_default("touchend"));
        assert!(!PointSource::Touch.prevents_default("touchcancel"));
        for &event in PointSource::Mouse.event_types() {
            assert!(!PointSource::Mouse.prevents_default(event), "{event}");
        }
    }

    #[test]
    fn test_point_events_need_a_position() {
        assert_eq!(PointSource::Touch.input_for("touchstart", None), None);
        assert_eq!(PointSource::Mouse.input_for("mousemove", None), None);
        assert_eq!(PointSource::Mouse.input_for("touchstart", Some(Point::new(0.0, 0.0))), None);
    }
}
