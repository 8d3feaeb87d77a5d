use log::debug;
use rusttype::Font;

use crate::config::{check_range, Color, GaugeConfig};
use crate::error::{MeterError, Result};
use crate::font::FontRegistry;
use crate::geometry::ViewBounds;
use crate::render::GaugeRenderer;
use crate::state::SavedState;
use crate::surface::DrawSurface;

/// Command enum for updates sent from other threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeterCommand {
    SetValue(f32),
    SetMinValue(f32),
    SetMaxValue(f32),
    SetBackgroundColor(Color),
    SetFont(i32),
    /// One animator step, handled by whoever owns the animator.
    Tick,
}

/// The gauge widget: configuration, current value, measured size and the
/// fonts its text is drawn with.
///
/// Every mutator marks the meter dirty; hosts redraw when
/// [`ThingMeter::take_dirty`] returns `true`.
pub struct ThingMeter {
    config: GaugeConfig,
    value: f32,
    bounds: ViewBounds,
    fonts: FontRegistry,
    dirty: bool,
}

impl ThingMeter {
    /// Size used until the host measures the meter.
    pub const INITIAL_BOUNDS: ViewBounds = ViewBounds::new(320, 200);

    pub fn new(config: GaugeConfig, fonts: FontRegistry) -> Result<Self> {
        config.validate()?;
        if config.font_id != 0 && !fonts.contains(config.font_id) {
            debug!("font {} not registered, using default", config.font_id);
        }
        Ok(Self {
            value: config.initial_value(),
            config,
            bounds: Self::INITIAL_BOUNDS,
            fonts,
            dirty: true,
        })
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.config
    }

    pub fn bounds(&self) -> ViewBounds {
        self.bounds
    }

    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    /// Typeface for the configured font id, falling back to the default.
    pub fn font(&self) -> Option<&Font<'static>> {
        self.fonts.resolve(self.config.font_id)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Values outside the range are kept; the needle overshoots the arc.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.invalidate();
    }

    pub fn min_value(&self) -> f32 {
        self.config.min_value
    }

    pub fn set_min_value(&mut self, value: f32) -> Result<()> {
        check_range(value, self.config.max_value)?;
        self.config.min_value = value;
        self.invalidate();
        Ok(())
    }

    pub fn max_value(&self) -> f32 {
        self.config.max_value
    }

    pub fn set_max_value(&mut self, value: f32) -> Result<()> {
        check_range(self.config.min_value, value)?;
        self.config.max_value = value;
        self.invalidate();
        Ok(())
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.config.background_color = color;
        self.invalidate();
    }

    pub fn set_font(&mut self, font_id: i32) {
        if font_id != 0 && !self.fonts.contains(font_id) {
            debug!("font {font_id} not registered, using default");
        }
        self.config.font_id = font_id;
        self.invalidate();
    }

    /// Squares the meter to the smaller of the offered sides.
    pub fn measure(&mut self, measured_width: u32, measured_height: u32) -> ViewBounds {
        let bounds = ViewBounds::squared(measured_width, measured_height);
        if bounds != self.bounds {
            self.bounds = bounds;
            self.invalidate();
        }
        bounds
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether a redraw is pending and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn apply(&mut self, command: MeterCommand) -> Result<()> {
        match command {
            MeterCommand::SetValue(value) => self.set_value(value),
            MeterCommand::SetMinValue(value) => self.set_min_value(value)?,
            MeterCommand::SetMaxValue(value) => self.set_max_value(value)?,
            MeterCommand::SetBackgroundColor(color) => self.set_background_color(color),
            MeterCommand::SetFont(font_id) => self.set_font(font_id),
            MeterCommand::Tick => {}
        }
        Ok(())
    }

    pub fn draw<S: DrawSurface>(&self, surface: &mut S) {
        GaugeRenderer::new(&self.config, self.value, self.bounds, self.font()).render(surface);
    }

    pub fn save_state(&self) -> SavedState {
        let config = &self.config;
        SavedState {
            background_color: config.background_color.to_bits(),
            border_color: config.border_color.to_bits(),
            mark_color: config.mark_color.to_bits(),
            indicator_color: config.indicator_color.to_bits(),
            text_color: config.text_color.to_bits(),
            border_width: config.border_width,
            mark_width: config.mark_width,
            indicator_width: config.indicator_width,
            width: self.bounds.width as i32,
            height: self.bounds.height as i32,
            min_value: config.min_value,
            max_value: config.max_value,
            value: self.value,
            text_size: config.text_size as i32,
            font_id: config.font_id,
            mark_parts: config.mark_parts as i32,
        }
    }

    /// Restores a saved record. The record is validated as a whole and
    /// nothing changes when it is rejected. Restored bounds are squared.
    pub fn restore_state(&mut self, state: &SavedState) -> Result<()> {
        if state.mark_parts < 1 {
            return Err(MeterError::InvalidMarkParts(state.mark_parts as i64));
        }
        let dimension = |name: &'static str, value: i32| match u32::try_from(value) {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(MeterError::InvalidDimension {
                name,
                value: value as f64,
            }),
        };
        let width = dimension("width", state.width)?;
        let height = dimension("height", state.height)?;
        let text_size = dimension("textSize", state.text_size)?;

        let config = GaugeConfig {
            background_color: Color::from_bits(state.background_color),
            border_color: Color::from_bits(state.border_color),
            mark_color: Color::from_bits(state.mark_color),
            indicator_color: Color::from_bits(state.indicator_color),
            text_color: Color::from_bits(state.text_color),
            border_width: state.border_width,
            mark_width: state.mark_width,
            indicator_width: state.indicator_width,
            min_value: state.min_value,
            max_value: state.max_value,
            mark_parts: state.mark_parts as u32,
            text_size,
            font_id: state.font_id,
            ..self.config.clone()
        };
        config.validate()?;

        self.config = config;
        self.value = state.value;
        self.bounds = ViewBounds::squared(width, height);
        self.set_font(state.font_id);
        debug!("restored meter state at value {}", self.value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, Scene};

    fn meter() -> ThingMeter {
        ThingMeter::new(GaugeConfig::default(), FontRegistry::new()).unwrap()
    }

    #[test]
    fn starts_at_min_and_dirty() {
        let mut meter = meter();
        assert_eq!(meter.value(), 0.0);
        assert_eq!(meter.bounds(), ThingMeter::INITIAL_BOUNDS);
        assert!(meter.take_dirty());
        assert!(!meter.is_dirty());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = GaugeConfig::builder().min_value(5.0).max_value(5.0).build();
        assert!(matches!(
            ThingMeter::new(config, FontRegistry::new()),
            Err(MeterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn every_mutator_invalidates() {
        let mut meter = meter();
        let mutations: [fn(&mut ThingMeter); 6] = [
            |m| m.set_value(42.0),
            |m| m.set_min_value(-5.0).unwrap(),
            |m| m.set_max_value(50.0).unwrap(),
            |m| m.set_background_color(Color::BLUE),
            |m| m.set_font(3),
            |m| {
                m.measure(640, 480);
            },
        ];
        for mutate in mutations {
            meter.take_dirty();
            mutate(&mut meter);
            assert!(meter.take_dirty());
        }
        assert_eq!(meter.value(), 42.0);
        assert_eq!(meter.min_value(), -5.0);
        assert_eq!(meter.max_value(), 50.0);
        assert_eq!(meter.config().background_color, Color::BLUE);
        assert_eq!(meter.config().font_id, 3);
        assert_eq!(meter.bounds(), ViewBounds::new(480, 480));
    }

    #[test]
    fn bound_setters_keep_range_valid() {
        let mut meter = meter();
        meter.take_dirty();
        assert!(meter.set_min_value(100.0).is_err());
        assert!(meter.set_max_value(0.0).is_err());
        assert!(meter.set_max_value(f32::INFINITY).is_err());
        assert!(!meter.is_dirty());
        assert_eq!((meter.min_value(), meter.max_value()), (0.0, 100.0));
    }

    #[test]
    fn out_of_range_value_is_kept() {
        let mut meter = meter();
        meter.set_value(150.0);
        assert_eq!(meter.value(), 150.0);
        let mut scene = Scene::new();
        meter.draw(&mut scene);
        assert!(matches!(scene.commands().last(), Some(DrawCommand::Line { .. })));
    }

    #[test]
    fn measure_squares_and_only_invalidates_on_change() {
        let mut meter = meter();
        assert_eq!(meter.measure(300, 500), ViewBounds::new(300, 300));
        meter.take_dirty();
        meter.measure(500, 300);
        assert!(!meter.is_dirty());
    }

    #[test]
    fn commands_route_to_setters() {
        let mut meter = meter();
        meter.apply(MeterCommand::SetValue(12.5)).unwrap();
        meter.apply(MeterCommand::SetMaxValue(20.0)).unwrap();
        meter.apply(MeterCommand::SetBackgroundColor(Color::GREEN)).unwrap();
        assert!(meter.apply(MeterCommand::SetMinValue(30.0)).is_err());
        meter.take_dirty();
        meter.apply(MeterCommand::Tick).unwrap();
        assert!(!meter.is_dirty());
        assert_eq!(meter.value(), 12.5);
        assert_eq!(meter.max_value(), 20.0);
        assert_eq!(meter.config().background_color, Color::GREEN);
    }

    #[test]
    fn saved_state_round_trips_through_bytes() {
        let config = GaugeConfig::builder()
            .background_color(Color::from_argb(0x80, 1, 2, 3))
            .border_width(2.5)
            .min_value(-40.0)
            .max_value(60.0)
            .mark_parts(5)
            .text_size(32)
            .label("Label")
            .build();
        let mut saved = ThingMeter::new(config, FontRegistry::new()).unwrap();
        saved.measure(250, 400);
        saved.set_value(17.5);
        saved.set_font(9);

        let bytes = saved.save_state().to_bytes();
        let mut restored = meter();
        restored
            .restore_state(&SavedState::from_bytes(&bytes).unwrap())
            .unwrap();

        assert_eq!(restored.save_state(), saved.save_state());
        assert_eq!(restored.value(), 17.5);
        assert_eq!(restored.bounds(), ViewBounds::new(250, 250));
        assert_eq!(restored.config().mark_parts, 5);
        assert_eq!(restored.config().font_id, 9);
        // The label is not part of the record.
        assert_eq!(restored.config().label, "");
        assert!(restored.is_dirty());
    }

    #[test]
    fn invalid_saved_state_changes_nothing() {
        let mut meter = meter();
        let mut state = meter.save_state();
        state.min_value = 200.0;
        assert!(meter.restore_state(&state).is_err());

        let mut state = meter.save_state();
        state.mark_parts = 0;
        assert!(matches!(
            meter.restore_state(&state),
            Err(MeterError::InvalidMarkParts(0))
        ));

        let mut state = meter.save_state();
        state.width = -1;
        assert!(meter.restore_state(&state).is_err());

        let mut state = meter.save_state();
        state.height = 0;
        assert!(matches!(
            meter.restore_state(&state),
            Err(MeterError::InvalidDimension { name: "height", .. })
        ));
        assert_eq!(meter.save_state(), self::meter().save_state());
    }

    #[test]
    fn restored_bounds_are_squared() {
        let mut meter = meter();
        let mut state = meter.save_state();
        state.width = 400;
        state.height = 300;
        meter.restore_state(&state).unwrap();
        assert_eq!(meter.bounds(), ViewBounds::new(300, 300));
    }

    #[test]
    fn huge_restored_bounds_still_draw() {
        let mut meter = meter();
        let mut state = meter.save_state();
        state.width = 1_500_000_000;
        state.height = 1_500_000_000;
        meter.restore_state(&state).unwrap();
        let mut scene = Scene::new();
        meter.draw(&mut scene);
        assert!(matches!(
            scene.commands().iter().find(|c| matches!(c, DrawCommand::Arc { .. })),
            Some(DrawCommand::Arc { oval, .. }) if oval.bottom == 2_250_000_000.0
        ));
    }
}
