use log::trace;
use rusttype::Font;

use crate::config::GaugeConfig;
use crate::geometry::{
    radial_line_points, surface_arc_degrees, tick_label_arc, ticks, value_to_angle, ViewBounds,
};
use crate::surface::{DrawSurface, Paint, Point, TextAlign};

/// Tick marks run outwards from the arc by this share of the viewport height.
const TICK_LENGTH_FACTOR: f32 = 0.05;
/// Tick labels sit this share of the viewport height above their arc segment.
const TICK_LABEL_OFFSET_FACTOR: f32 = 0.075;
/// The label baseline sits this share of the viewport height above the pivot.
const LABEL_LIFT_FACTOR: f32 = 0.05;
/// The needle starts this share of the viewport width away from the pivot.
const INDICATOR_INNER_FACTOR: f32 = 0.15;

/// Draws one meter frame: background, scale and indicator.
pub struct GaugeRenderer<'a> {
    pub config: &'a GaugeConfig,
    pub value: f32,
    pub bounds: ViewBounds,
    pub font: Option<&'a Font<'static>>,
}

impl<'a> GaugeRenderer<'a> {
    pub fn new(
        config: &'a GaugeConfig,
        value: f32,
        bounds: ViewBounds,
        font: Option<&'a Font<'static>>,
    ) -> Self {
        Self {
            config,
            value,
            bounds,
            font,
        }
    }

    pub fn render<S: DrawSurface>(&self, surface: &mut S) {
        self.draw_background(surface);
        self.draw_marks(surface);
        self.draw_indicator(surface);
    }

    pub fn draw_background<S: DrawSurface>(&self, surface: &mut S) {
        let config = self.config;
        let rect = self.bounds.rect();
        surface.fill_rect(rect, &Paint::fill(config.background_color));
        surface.stroke_rect(
            rect.inset(config.border_width / 2.0),
            &Paint::stroke(config.border_color, config.border_width),
        );
        trace!("background pass {}x{}", self.bounds.width, self.bounds.height);
    }

    pub fn draw_marks<S: DrawSurface>(&self, surface: &mut S) {
        let config = self.config;
        let height = self.bounds.height as f32;
        let oval = self.bounds.dial_oval();
        let pivot = self.bounds.pivot();

        let (start, sweep) = surface_arc_degrees();
        surface.stroke_arc(
            oval,
            start,
            sweep,
            &Paint::stroke(config.mark_color, config.mark_width),
        );

        let tick_paint = Paint::stroke(config.indicator_color, config.indicator_width);
        let value_paint = Paint::text(config.text_color, config.tick_text_size, self.font);
        let inner = self.bounds.arc_radius();
        let outer = inner + height * TICK_LENGTH_FACTOR;
        for tick in ticks(config.mark_parts, config.min_value, config.max_value) {
            let (from, to) = radial_line_points(pivot.x, pivot.y, tick.angle, inner, outer);
            surface.stroke_line(from, to, &tick_paint);

            let (label_start, label_sweep) = tick_label_arc(tick.index, config.mark_parts);
            surface.draw_text_on_arc(
                &format_tick_value(tick.value),
                oval,
                label_start,
                label_sweep,
                -height * TICK_LABEL_OFFSET_FACTOR,
                &value_paint,
            );
        }

        if !config.label.is_empty() {
            surface.draw_text(
                &config.label,
                Point::new(pivot.x, pivot.y - height * LABEL_LIFT_FACTOR),
                TextAlign::Center,
                &Paint::text(config.text_color, config.text_size as f32, self.font),
            );
        }
        trace!("mark pass with {} parts", config.mark_parts);
    }

    pub fn draw_indicator<S: DrawSurface>(&self, surface: &mut S) {
        let config = self.config;
        let pivot = self.bounds.pivot();
        let angle = value_to_angle(self.value, config.min_value, config.max_value);
        let inner = self.bounds.width as f32 * INDICATOR_INNER_FACTOR;
        let outer = self.bounds.half_side() - config.mark_width;
        let (from, to) = radial_line_points(pivot.x, pivot.y, angle, inner, outer);
        surface.stroke_line(
            from,
            to,
            &Paint::stroke(config.indicator_color, config.indicator_width),
        );
        trace!("indicator pass at value {} ({angle:.4} rad)", self.value);
    }
}

/// Formats a tick value the way Java prints a `float`: plain decimals with at
/// least one fractional digit (`10.0`) for magnitudes in `[1e-3, 1e7)`, and
/// scientific notation (`1.0E8`) outside that range.
pub fn format_tick_value(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}
