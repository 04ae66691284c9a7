//! Named signature styles.
//!
//! A [`StyleCatalog`] always resolves: unknown ids map to the catalog's
//! fallback style, and a catalog cannot be built without one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SigError;

/// How a name is drawn as text-like SVG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// CSS font-family list, e.g. "Dancing Script, cursive"
    pub font_family: String,
    /// Font size in CSS pixels
    pub font_size:   f64,
    /// Fill color
    pub color:       String,
    /// Horizontal skew in degrees (negative leans right)
    pub skew_angle:  f64
}

impl StyleDefinition {
    pub fn new(font_family: &str, font_size: f64, color: &str, skew_angle: f64) -> Self {
        Self {
            font_family: font_family.to_string(),
            font_size,
            color: color.to_string(),
            skew_angle
        }
    }
}

#[derive(Deserialize)]
struct RawCatalog {
    styles:   BTreeMap<String, StyleDefinition>,
    fallback: String
}

/// Fixed table of styles plus the id used when a lookup misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct StyleCatalog {
    styles:   BTreeMap<String, StyleDefinition>,
    fallback: String
}

impl TryFrom<RawCatalog> for StyleCatalog {
    type Error = SigError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.styles, raw.fallback)
    }
}

pub const DEFAULT_INK: &str = "#0B5FE3";
pub const DEFAULT_FALLBACK: &str = "cursive";

impl StyleCatalog {
    pub fn new(
        styles: BTreeMap<String, StyleDefinition>,
        fallback: impl Into<String>
    ) -> Result<Self, SigError> {
        let fallback = fallback.into();
        if !styles.contains_key(&fallback) {
            return Err(SigError::UnknownFallbackStyle(fallback));
        }
        Ok(Self { styles, fallback })
    }

    /// Resolve `id`, falling back when it is absent or unknown.
    pub fn resolve(&self, id: Option<&str>) -> &StyleDefinition {
        id.and_then(|id| self.styles.get(id))
            .unwrap_or_else(|| &self.styles[&self.fallback])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    pub fn fallback_id(&self) -> &str {
        &self.fallback
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        let styles = BTreeMap::from([
            (
                "cursive".to_string(),
                StyleDefinition::new("Dancing Script, cursive", 48.0, DEFAULT_INK, -10.0)
            ),
            (
                "elegant".to_string(),
                StyleDefinition::new("Alex Brush, cursive", 52.0, DEFAULT_INK, -8.0)
            ),
            (
                "handwritten".to_string(),
                StyleDefinition::new("Homemade Apple, cursive", 42.0, DEFAULT_INK, -5.0)
            ),
            (
                "artistic".to_string(),
                StyleDefinition::new("Pacifico, cursive", 44.0, DEFAULT_INK, -8.0)
            ),
            (
                "formal".to_string(),
                StyleDefinition::new("Mr De Haviland, cursive", 50.0, DEFAULT_INK, -12.0)
            )
        ]);
        Self {
            styles,
            fallback: DEFAULT_FALLBACK.to_string()
        }
    }
}
