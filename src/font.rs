use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};
use rusttype::Font;

use crate::error::{MeterError, Result};

/// Font files tried, in order, when looking for a platform default.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Resolves typeface ids to loaded fonts.
///
/// Id `0` always means the default font. Unknown ids fall back to the default
/// instead of failing.
#[derive(Default)]
pub struct FontRegistry {
    fonts: HashMap<i32, Font<'static>>,
    default: Option<Font<'static>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose default font is the first system font found.
    pub fn with_system_default() -> Self {
        let mut registry = Self::new();
        for path in SYSTEM_FONT_PATHS {
            match load_font_file(path) {
                Ok(font) => {
                    debug!("using system font {path}");
                    registry.default = Some(font);
                    return registry;
                }
                Err(err) => debug!("skipping system font {path}: {err}"),
            }
        }
        warn!("no system font found, text will not be rendered");
        registry
    }

    pub fn set_default(&mut self, font: Font<'static>) {
        self.default = Some(font);
    }

    pub fn set_default_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        self.default = Some(parse_font(data)?);
        Ok(())
    }

    pub fn register(&mut self, font_id: i32, font: Font<'static>) {
        self.fonts.insert(font_id, font);
    }

    pub fn register_bytes(&mut self, font_id: i32, data: Vec<u8>) -> Result<()> {
        self.register(font_id, parse_font(data)?);
        Ok(())
    }

    pub fn register_file<P: AsRef<Path>>(&mut self, font_id: i32, path: P) -> Result<()> {
        self.register(font_id, load_font_file(path)?);
        Ok(())
    }

    pub fn contains(&self, font_id: i32) -> bool {
        self.fonts.contains_key(&font_id)
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn resolve(&self, font_id: i32) -> Option<&Font<'static>> {
        if font_id != 0 {
            if let Some(font) = self.fonts.get(&font_id) {
                return Some(font);
            }
            debug!("font {font_id} not registered, using default");
        }
        self.default.as_ref()
    }
}

fn parse_font(data: Vec<u8>) -> Result<Font<'static>> {
    Font::try_from_vec(data).ok_or_else(|| MeterError::Font("unsupported font data".to_string()))
}

fn load_font_file<P: AsRef<Path>>(path: P) -> Result<Font<'static>> {
    let data = std::fs::read(path.as_ref())?;
    parse_font(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_default() {
        let registry = FontRegistry::new();
        assert!(registry.resolve(0).is_none());
        assert!(registry.resolve(42).is_none());
        assert!(!registry.contains(42));
        assert!(!registry.has_default());
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        let mut registry = FontRegistry::new();
        assert!(matches!(
            registry.register_bytes(3, vec![0u8; 16]),
            Err(MeterError::Font(_))
        ));
        assert!(matches!(
            registry.set_default_bytes(b"not a font".to_vec()),
            Err(MeterError::Font(_))
        ));
        assert!(!registry.contains(3));
        assert!(matches!(
            registry.register_file(4, "/definitely/not/here.ttf"),
            Err(MeterError::Io(_))
        ));
    }

    #[test]
    fn system_default_resolves_every_id() {
        let registry = FontRegistry::with_system_default();
        // Hosts without fonts still get a usable registry.
        assert_eq!(registry.resolve(0).is_some(), registry.has_default());
        assert_eq!(registry.resolve(99).is_some(), registry.has_default());
    }
}
