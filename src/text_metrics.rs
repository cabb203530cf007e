use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Average advance as a fraction of the font size when no face is available.
const FALLBACK_CHAR_RATIO: f32 = 0.56;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Width of a single line of text, or `None` if no usable font was found.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Measured width, falling back to a per-character estimate.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    measure_text_width(text, font_size, font_family)
        .unwrap_or_else(|| fallback_width(text, font_size))
}

pub fn fallback_width(text: &str, font_size: f32) -> f32 {
    text.chars().filter(|ch| *ch != '\n').count() as f32 * font_size * FALLBACK_CHAR_RATIO
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(&key);
            if face.is_none() {
                tracing::debug!(family = %key, "no font face found, using estimated widths");
            }
            self.faces.insert(key.clone(), face);
        }
        self.faces.get(&key)?.as_ref()?.measure(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<LoadedFace> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1);
        Some(Self {
            data,
            index,
            units_per_em,
        })
    }

    fn measure(&self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_CHAR_RATIO;
        let width = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| advance as f32 * scale)
                    .unwrap_or(fallback)
            })
            .sum::<f32>();
        Some(width.max(0.0))
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 10.0, "sans-serif"), Some(0.0));
        assert_eq!(text_width("", 10.0, "sans-serif"), 0.0);
    }

    #[test]
    fn width_grows_with_text() {
        let short = text_width("code", 10.0, "system-ui, sans-serif");
        let long = text_width("authorization code", 10.0, "system-ui, sans-serif");
        assert!(long > short);
        assert!(short > 0.0);
    }

    #[test]
    fn fallback_counts_characters() {
        assert!((fallback_width("abcd", 10.0) - 22.4).abs() < 1e-4);
    }
}
