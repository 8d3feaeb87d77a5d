use std::path::Path;

use bon::Builder;
use log::debug;

use crate::error::{MeterError, Result};

// ============================================================================
// COLOR
// ============================================================================

/// Opaque ARGB colour. The wire form is the signed 32-bit reinterpretation of
/// the packed value, so `0xff000000` (opaque black) round-trips as `-16777216`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const GREEN: Color = Color::new(0x00, 0xff, 0x00);
    pub const BLUE: Color = Color::new(0x00, 0x00, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xff, r, g, b)
    }

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn from_bits(bits: i32) -> Self {
        Self(bits as u32)
    }

    pub const fn to_bits(self) -> i32 {
        self.0 as i32
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    /// Parses `#RRGGBB` or `#AARRGGBB`.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let bits = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Self(0xff00_0000 | bits)),
            8 => Some(Self(bits)),
            _ => None,
        }
    }
}

// ============================================================================
// GAUGE CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Builder)]
pub struct GaugeConfig {
    // Colors
    #[builder(default = Color::WHITE)]
    pub background_color: Color,
    #[builder(default = Color::BLACK)]
    pub border_color: Color,
    #[builder(default = Color::GREEN)]
    pub mark_color: Color,
    #[builder(default = Color::BLACK)]
    pub indicator_color: Color,
    #[builder(default = Color::BLACK)]
    pub text_color: Color,

    // Stroke widths
    #[builder(default = 4.0)]
    pub border_width: f32,
    #[builder(default = 1.0)]
    pub mark_width: f32,
    #[builder(default = 4.0)]
    pub indicator_width: f32,

    // Scale
    #[builder(default = 0.0)]
    pub min_value: f32,
    #[builder(default = 100.0)]
    pub max_value: f32,
    #[builder(default = 10)]
    pub mark_parts: u32,
    /// Starting needle value, `min_value` when unset.
    pub initial_value: Option<f32>,

    // Text
    #[builder(default, into)]
    pub label: String,
    #[builder(default = 80)]
    pub text_size: u32,
    #[builder(default = 25.0)]
    pub tick_text_size: f32,
    /// Typeface id resolved through a `FontRegistry`; 0 is the default font.
    #[builder(default = 0)]
    pub font_id: i32,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeConfig {
    /// Checks the invariants geometry relies on: a non-empty finite range, at
    /// least one scale subdivision and positive finite sizes.
    pub fn validate(&self) -> Result<()> {
        check_range(self.min_value, self.max_value)?;
        if self.mark_parts < 1 {
            return Err(MeterError::InvalidMarkParts(self.mark_parts as i64));
        }
        for (name, value) in [
            ("borderWidth", self.border_width as f64),
            ("markWidth", self.mark_width as f64),
            ("indicatorWidth", self.indicator_width as f64),
            ("textSize", self.text_size as f64),
            ("tickTextSize", self.tick_text_size as f64),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(MeterError::InvalidDimension { name, value });
            }
        }
        Ok(())
    }

    /// Builds a config from a flat option table keyed by attribute name.
    /// Options not present keep their defaults.
    pub fn from_table(table: &toml::Table) -> Result<Self> {
        let mut config = Self::default();
        for (name, value) in table {
            match name.as_str() {
                "backgroundColor" => config.background_color = color_option(name, value)?,
                "borderColor" => config.border_color = color_option(name, value)?,
                "markColor" => config.mark_color = color_option(name, value)?,
                "indicatorColor" => config.indicator_color = color_option(name, value)?,
                "textColor" => config.text_color = color_option(name, value)?,
                "borderWidth" => config.border_width = float_option(name, value)?,
                "markWidth" => config.mark_width = float_option(name, value)?,
                "indicatorWidth" => config.indicator_width = float_option(name, value)?,
                "minValue" => config.min_value = float_option(name, value)?,
                "maxValue" => config.max_value = float_option(name, value)?,
                "value" => config.initial_value = Some(float_option(name, value)?),
                "labelText" => config.label = string_option(name, value)?,
                "textSize" => config.text_size = unsigned_option(name, value)?,
                "tickTextSize" => config.tick_text_size = float_option(name, value)?,
                "font" => config.font_id = int_option(name, value)?,
                "markParts" => {
                    let parts = int_option(name, value)?;
                    if parts < 1 {
                        return Err(MeterError::InvalidMarkParts(parts as i64));
                    }
                    config.mark_parts = parts as u32;
                }
                _ => return Err(MeterError::UnknownOption(name.clone())),
            }
        }
        config.validate()?;
        debug!("Mark parts: {}", config.mark_parts);
        Ok(config)
    }

    /// Loads a TOML file holding the same keys as [`GaugeConfig::from_table`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let table: toml::Table = toml::from_str(&content)?;
        debug!("loaded meter options from {}", path.as_ref().display());
        Self::from_table(&table)
    }

    pub fn initial_value(&self) -> f32 {
        self.initial_value.unwrap_or(self.min_value)
    }
}

pub(crate) fn check_range(min: f32, max: f32) -> Result<()> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(MeterError::InvalidRange { min, max })
    }
}

// ============================================================================
// OPTION PARSING
// ============================================================================

fn invalid(name: &str, reason: impl Into<String>) -> MeterError {
    MeterError::InvalidOption {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn color_option(name: &str, value: &toml::Value) -> Result<Color> {
    match value {
        toml::Value::String(s) => {
            Color::parse(s).ok_or_else(|| invalid(name, format!("`{s}` is not #RRGGBB or #AARRGGBB")))
        }
        toml::Value::Integer(bits) => u32::try_from(*bits)
            .map(|bits| Color::from_bits(bits as i32))
            .or_else(|_| i32::try_from(*bits).map(Color::from_bits))
            .map_err(|_| invalid(name, "colour integer out of 32-bit range")),
        other => Err(invalid(name, format!("expected colour, got {}", other.type_str()))),
    }
}

fn float_option(name: &str, value: &toml::Value) -> Result<f32> {
    match value {
        toml::Value::Float(f) => Ok(*f as f32),
        toml::Value::Integer(i) => Ok(*i as f32),
        other => Err(invalid(name, format!("expected number, got {}", other.type_str()))),
    }
}

fn int_option(name: &str, value: &toml::Value) -> Result<i32> {
    match value {
        toml::Value::Integer(i) => {
            i32::try_from(*i).map_err(|_| invalid(name, "integer out of 32-bit range"))
        }
        other => Err(invalid(name, format!("expected integer, got {}", other.type_str()))),
    }
}

fn unsigned_option(name: &str, value: &toml::Value) -> Result<u32> {
    let value = int_option(name, value)?;
    u32::try_from(value).map_err(|_| invalid(name, "must not be negative"))
}

fn string_option(name: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        other => Err(invalid(name, format!("expected string, got {}", other.type_str()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn defaults_match_documented_attributes() {
        let config = GaugeConfig::default();
        assert_eq!(config.background_color, Color::WHITE);
        assert_eq!(config.border_color, Color::BLACK);
        assert_eq!(config.mark_color, Color::GREEN);
        assert_eq!(config.indicator_color, Color::BLACK);
        assert_eq!(config.text_color, Color::BLACK);
        assert_eq!(config.border_width, 4.0);
        assert_eq!(config.mark_width, 1.0);
        assert_eq!(config.indicator_width, 4.0);
        assert_eq!(config.min_value, 0.0);
        assert_eq!(config.max_value, 100.0);
        assert_eq!(config.text_size, 80);
        assert_eq!(config.mark_parts, 10);
        assert_eq!(config.label, "");
        assert_eq!(config.font_id, 0);
        assert_eq!(config.initial_value(), 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = GaugeConfig::builder()
            .label("RPM")
            .min_value(-20.0)
            .max_value(20.0)
            .mark_parts(4)
            .build();
        assert_eq!(config.label, "RPM");
        assert_eq!(config.mark_parts, 4);
        assert_eq!(config.initial_value(), -20.0);
        assert_eq!(config.text_size, 80);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(Color::parse("#ff0000"), Some(Color::new(0xff, 0, 0)));
        assert_eq!(Color::parse("#80ff0000"), Some(Color::from_argb(0x80, 0xff, 0, 0)));
        assert_eq!(Color::parse("ff0000"), None);
        assert_eq!(Color::parse("#fff"), None);
        assert_eq!(Color::BLACK.to_bits(), -16777216);
        assert_eq!(Color::from_bits(-1), Color::WHITE);
    }

    #[test]
    fn table_overrides_defaults() {
        let config = GaugeConfig::from_table(&table(
            r##"
            backgroundColor = "#000000"
            markColor = "#0000ff"
            borderWidth = 2
            minValue = -50.0
            maxValue = 50
            markParts = 5
            labelText = "Temp"
            value = 10.5
            font = 7
            "##,
        ))
        .unwrap();
        assert_eq!(config.background_color, Color::BLACK);
        assert_eq!(config.mark_color, Color::BLUE);
        assert_eq!(config.border_width, 2.0);
        assert_eq!(config.min_value, -50.0);
        assert_eq!(config.max_value, 50.0);
        assert_eq!(config.mark_parts, 5);
        assert_eq!(config.label, "Temp");
        assert_eq!(config.initial_value(), 10.5);
        assert_eq!(config.font_id, 7);
        // untouched fields keep defaults
        assert_eq!(config.text_size, 80);
    }

    #[test]
    fn rejects_empty_or_inverted_range() {
        for src in ["minValue = 10\nmaxValue = 10", "minValue = 20\nmaxValue = 10"] {
            assert!(matches!(
                GaugeConfig::from_table(&table(src)),
                Err(MeterError::InvalidRange { .. })
            ));
        }
        let config = GaugeConfig::builder().min_value(f32::NAN).build();
        assert!(matches!(config.validate(), Err(MeterError::InvalidRange { .. })));
    }

    #[test]
    fn rejects_non_positive_mark_parts() {
        assert!(matches!(
            GaugeConfig::from_table(&table("markParts = 0")),
            Err(MeterError::InvalidMarkParts(0))
        ));
        assert!(matches!(
            GaugeConfig::from_table(&table("markParts = -3")),
            Err(MeterError::InvalidMarkParts(-3))
        ));
        let config = GaugeConfig::builder().mark_parts(0).build();
        assert!(matches!(config.validate(), Err(MeterError::InvalidMarkParts(0))));
    }

    #[test]
    fn rejects_non_finite_sizes() {
        let config = GaugeConfig::builder().border_width(f32::INFINITY).build();
        assert!(matches!(
            config.validate(),
            Err(MeterError::InvalidDimension { name: "borderWidth", .. })
        ));
        let config = GaugeConfig::builder().tick_text_size(f32::INFINITY).build();
        assert!(matches!(
            config.validate(),
            Err(MeterError::InvalidDimension { name: "tickTextSize", .. })
        ));
        let config = GaugeConfig::builder().indicator_width(f32::NAN).build();
        assert!(config.validate().is_err());
        assert!(matches!(
            GaugeConfig::from_table(&table("markWidth = inf")),
            Err(MeterError::InvalidDimension { name: "markWidth", .. })
        ));
    }

    #[test]
    fn rejects_bad_options() {
        assert!(matches!(
            GaugeConfig::from_table(&table("needleColor = \"#000000\"")),
            Err(MeterError::UnknownOption(name)) if name == "needleColor"
        ));
        assert!(matches!(
            GaugeConfig::from_table(&table("borderColor = \"black\"")),
            Err(MeterError::InvalidOption { .. })
        ));
        assert!(matches!(
            GaugeConfig::from_table(&table("markWidth = 0")),
            Err(MeterError::InvalidDimension { name: "markWidth", .. })
        ));
        assert!(matches!(
            GaugeConfig::from_table(&table("textSize = -1")),
            Err(MeterError::InvalidOption { .. })
        ));
    }

    #[test]
    fn load_reads_toml_file() {
        let path = std::env::temp_dir().join(format!("thingmeter-{}.toml", std::process::id()));
        std::fs::write(&path, "labelText = \"Speed\"\nmaxValue = 240\n").unwrap();
        let config = GaugeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.label, "Speed");
        assert_eq!(config.max_value, 240.0);

        assert!(matches!(
            GaugeConfig::load(path.with_extension("missing")),
            Err(MeterError::Io(_))
        ));
    }
}
