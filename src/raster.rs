//! In-memory RGBA raster implementing [`Surface`].
//!
//! Strokes are stamped as filled discs along each segment, which gives the
//! round caps and joins the browser canvas uses. Export is a real PNG, so a
//! cleared bitmap encodes to the same bytes as a fresh one.

use base64::Engine;

use crate::{
    error::SigError,
    signature_core::{PenStyle, Point, Surface, PNG_DATA_URL_PREFIX}
};

const BLANK: [u8; 4] = [0, 0, 0, 0];

pub struct Bitmap {
    width:  u32,
    height: u32,
    ink:    [u8; 4],
    radius: f64,
    pixels: Vec<u8>
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pen: &PenStyle) -> Self {
        Self {
            width,
            height,
            ink: parse_hex_color(&pen.color).unwrap_or([0, 0, 0, 255]),
            radius: (pen.line_width / 2.0).max(0.5),
            pixels: vec![0; width as usize * height as usize * 4]
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut px = BLANK;
        px.copy_from_slice(&self.pixels[i..i + 4]);
        Some(px)
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|b| *b == 0)
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SigError> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| SigError::Encode(e.to_string()))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| SigError::Encode(e.to_string()))?;
            writer
                .finish()
                .map_err(|e| SigError::Encode(e.to_string()))?;
        }
        Ok(buf)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn stamp(&mut self, center: Point) {
        let r = self.radius;
        let x0 = (center.x - r).floor().max(0.0) as u32;
        let y0 = (center.y - r).floor().max(0.0) as u32;
        let x1 = ((center.x + r).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.y + r).ceil() as i64).min(self.height as i64 - 1);
        if x1 < 0 || y1 < 0 {
            return;
        }
        for y in y0..=y1 as u32 {
            for x in x0..=x1 as u32 {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= r * r {
                    let i = self.offset(x, y);
                    self.pixels[i..i + 4].copy_from_slice(&self.ink);
                }
            }
        }
    }
}

impl Surface for Bitmap {
    fn stroke_segment(&mut self, from: Point, to: Point) {
        let r = self.radius;
        let lo = Point::new(-r, -r);
        let hi = Point::new(self.width as f64 + r, self.height as f64 + r);
        let Some((from, to)) = clip_segment(from, to, lo, hi) else {
            return;
        };
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = (dx.hypot(dy) * 2.0).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.stamp(Point::new(from.x + dx * t, from.y + dy * t));
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn to_png_data_url(&self) -> Result<String, SigError> {
        let bytes = self.to_png_bytes()?;
        Ok(format!(
            "{PNG_DATA_URL_PREFIX}{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }
}

/// Part of the segment inside the box `lo..=hi` (Liang-Barsky), if any.
fn clip_segment(from: Point, to: Point, lo: Point, hi: Point) -> Option<(Point, Point)> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, from.x - lo.x),
        (dx, hi.x - from.x),
        (-dy, from.y - lo.y),
        (dy, hi.y - from.y)
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    Some((
        Point::new(from.x + dx * t0, from.y + dy * t0),
        Point::new(from.x + dx * t1, from.y + dy * t1)
    ))
}

/// `#rgb` or `#rrggbb` to opaque RGBA.
pub fn parse_hex_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.strip_prefix('#').filter(|h| h.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255
        ]),
        3 => {
            let mut out = [0, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        _ => None
    }
}
