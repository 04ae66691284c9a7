//! Typed-name signature rendering.
//!
//! [`render`] is a pure function of the name, the style id, the catalog and
//! the box sizing policy. The result can be serialized to markup or built
//! into live DOM nodes.

use serde::{Deserialize, Serialize};
use web_sys::{Document, Element};

use crate::{
    error::SigError,
    style::{StyleCatalog, StyleDefinition}
};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// How the box height follows from the width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightRule {
    /// `min(max, width * ratio)`
    Proportional { ratio: f64, max: f64 },
    Fixed { height: f64 }
}

#[derive(Deserialize)]
struct RawSizing {
    min_width:      f64,
    max_width:      f64,
    char_width:     f64,
    height:         HeightRule,
    font_cap_ratio: Option<f64>
}

/// Policy that turns a name into a view box and a font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSizing")]
pub struct BoxSizing {
    pub min_width:      f64,
    pub max_width:      f64,
    /// Width budget per character of the name
    pub char_width:     f64,
    pub height:         HeightRule,
    /// When set, font size never exceeds `width * ratio`
    pub font_cap_ratio: Option<f64>
}

impl TryFrom<RawSizing> for BoxSizing {
    type Error = SigError;

    fn try_from(raw: RawSizing) -> Result<Self, Self::Error> {
        let sizing = Self {
            min_width:      raw.min_width,
            max_width:      raw.max_width,
            char_width:     raw.char_width,
            height:         raw.height,
            font_cap_ratio: raw.font_cap_ratio
        };
        sizing.validate()?;
        Ok(sizing)
    }
}

fn positive(what: &str, value: f64) -> Result<(), SigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SigError::InvalidSizing(format!("{what} must be positive, got {value}")))
    }
}

impl BoxSizing {
    /// Reject policies whose widths could leave `[min_width, max_width]` or
    /// whose boxes would be empty.
    pub fn validate(&self) -> Result<(), SigError> {
        positive("min_width", self.min_width)?;
        positive("max_width", self.max_width)?;
        if self.min_width > self.max_width {
            return Err(SigError::InvalidSizing(format!(
                "min_width {} exceeds max_width {}",
                self.min_width, self.max_width
            )));
        }
        if !(self.char_width >= 0.0 && self.char_width.is_finite()) {
            return Err(SigError::InvalidSizing(format!(
                "char_width must not be negative, got {}",
                self.char_width
            )));
        }
        match self.height {
            HeightRule::Proportional { ratio, max } => {
                positive("height ratio", ratio)?;
                positive("height max", max)?;
            }
            HeightRule::Fixed { height } => positive("height", height)?
        }
        if let Some(ratio) = self.font_cap_ratio {
            positive("font_cap_ratio", ratio)?;
        }
        Ok(())
    }

    /// 200..500 wide at 20 per char, height 40% of width up to 100, font
    /// capped at 20% of width.
    pub fn proportional() -> Self {
        Self {
            min_width:      200.0,
            max_width:      500.0,
            char_width:     20.0,
            height:         HeightRule::Proportional {
                ratio: 0.4,
                max:   100.0
            },
            font_cap_ratio: Some(0.2)
        }
    }

    /// 300..600 wide at 25 per char, fixed height 150, uncapped font.
    pub fn wide_text() -> Self {
        Self {
            min_width:      300.0,
            max_width:      600.0,
            char_width:     25.0,
            height:         HeightRule::Fixed { height: 150.0 },
            font_cap_ratio: None
        }
    }

    pub fn width_for(&self, name: &str) -> f64 {
        let wanted = name.chars().count() as f64 * self.char_width;
        self.max_width.min(self.min_width.max(wanted))
    }

    pub fn measure(&self, name: &str, style: &StyleDefinition) -> SignatureBox {
        let width = self.width_for(name);
        let height = match self.height {
            HeightRule::Proportional { ratio, max } => max.min(width * ratio),
            HeightRule::Fixed { height } => height
        };
        let font_size = match self.font_cap_ratio {
            Some(ratio) => style.font_size.min(width * ratio),
            None => style.font_size
        };
        SignatureBox {
            width,
            height,
            font_size
        }
    }
}

impl Default for BoxSizing {
    fn default() -> Self {
        Self::proportional()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureBox {
    pub width:     f64,
    pub height:    f64,
    pub font_size: f64
}

/// One rendered preview: an `<svg>` holding a single centered `<text>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSvg {
    pub bounds:      SignatureBox,
    pub font_family: String,
    pub fill:        String,
    pub skew_angle:  f64,
    pub label:       String
}

pub fn render(
    name: &str,
    style_id: Option<&str>,
    catalog: &StyleCatalog,
    sizing: &BoxSizing
) -> SignatureSvg {
    let style = catalog.resolve(style_id);
    SignatureSvg {
        bounds:      sizing.measure(name, style),
        font_family: style.font_family.clone(),
        fill:        style.color.clone(),
        skew_angle:  style.skew_angle,
        label:       name.to_string()
    }
}

impl SignatureSvg {
    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.bounds.width, self.bounds.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.bounds.width / 2.0, self.bounds.height / 2.0)
    }

    pub fn text_style(&self) -> String {
        format!(
            "font-family: {}; font-size: {}px; transform: skewX({}deg);",
            self.font_family, self.bounds.font_size, self.skew_angle
        )
    }

    fn svg_attributes(&self) -> [(&'static str, String); 4] {
        [
            ("viewBox", self.view_box()),
            ("width", "100%".to_string()),
            ("height", "100%".to_string()),
            ("preserveAspectRatio", "xMidYMid meet".to_string())
        ]
    }

    fn text_attributes(&self) -> [(&'static str, String); 6] {
        let (x, y) = self.center();
        [
            ("x", x.to_string()),
            ("y", y.to_string()),
            ("dominant-baseline", "central".to_string()),
            ("text-anchor", "middle".to_string()),
            ("fill", self.fill.clone()),
            ("style", self.text_style())
        ]
    }

    /// Serialize as standalone SVG markup.
    pub fn to_markup(&self) -> String {
        let mut out = format!("<svg xmlns=\"{SVG_NS}\"");
        for (k, v) in self.svg_attributes() {
            push_attr(&mut out, k, &v);
        }
        out.push_str("><text");
        for (k, v) in self.text_attributes() {
            push_attr(&mut out, k, &v);
        }
        out.push('>');
        out.push_str(&escape_xml(&self.label));
        out.push_str("</text></svg>");
        out
    }

    /// Build the same tree as live DOM nodes.
    pub fn to_element(&self, document: &Document) -> Result<Element, SigError> {
        let svg = create_svg_element(document, "svg")?;
        set_attributes(&svg, &self.svg_attributes())?;

        let text = create_svg_element(document, "text")?;
        set_attributes(&text, &self.text_attributes())?;
        text.set_text_content(Some(self.label.as_str()));

        svg.append_child(&text)
            .map_err(|_| SigError::OpFailed("appendChild(text)".into()))?;
        Ok(svg)
    }
}

fn create_svg_element(document: &Document, tag: &str) -> Result<Element, SigError> {
    document
        .create_element_ns(Some(SVG_NS), tag)
        .map_err(|_| SigError::OpFailed(format!("createElementNS({tag})")))
}

fn set_attributes(el: &Element, attrs: &[(&str, String)]) -> Result<(), SigError> {
    for (k, v) in attrs {
        el.set_attribute(k, v)
            .map_err(|_| SigError::OpFailed(format!("setAttribute({k})")))?;
    }
    Ok(())
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_xml(value));
    out.push('"');
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c)
        }
    }
    out
}
