//! Dial geometry: value to angle mapping, radial lines and tick layout.
//!
//! Angles are radians from the positive x-axis. The pivot sits at the bottom
//! centre of a square viewport and radii are measured upwards, so a point at
//! `angle` and radius `r` is `(cx - r·cos(angle), cy - r·sin(angle))`.

use std::f64::consts::PI;

use crate::surface::{Point, Rect};

/// Angle of the dial's minimum value.
pub const ANGLE_MIN: f64 = PI / 5.0;
/// Angle of the dial's maximum value.
pub const ANGLE_MAX: f64 = PI * 4.0 / 5.0;

/// The tick label path starts this many degrees before the arc start.
const LABEL_ARC_LEAD_DEGREES: f32 = 5.0;

/// Square viewport the meter renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewBounds {
    pub width: u32,
    pub height: u32,
}

impl ViewBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square bounds with `min(width, height)` on each side.
    pub fn squared(width: u32, height: u32) -> Self {
        let side = square_side(width, height);
        Self::new(side, side)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Bottom centre of the viewport.
    pub fn pivot(&self) -> Point {
        Point::new(self.width as f32 / 2.0, self.height as f32)
    }

    /// Bounding oval of the dial arc: the circle around the pivot with a
    /// radius of half the viewport.
    pub fn dial_oval(&self) -> Rect {
        let (w, h) = (self.width, self.height as u64);
        Rect::new(0.0, (h / 2) as f32, w as f32, (h * 3 / 2) as f32)
    }

    /// Radius of the dial arc, where the tick marks start.
    pub fn arc_radius(&self) -> f32 {
        (self.height / 2) as f32
    }

    /// Outer reach of the indicator needle before the stroke width is removed.
    pub fn half_side(&self) -> f32 {
        (self.width.min(self.height) / 2) as f32
    }
}

/// One scale subdivision boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u32,
    pub angle: f64,
    pub value: f32,
}

pub fn square_side(measured_width: u32, measured_height: u32) -> u32 {
    measured_width.min(measured_height)
}

/// Maps `value` linearly onto `[ANGLE_MIN, ANGLE_MAX]`. Values outside the
/// range extrapolate past the ends of the arc. `min_value` must be below
/// `max_value`.
pub fn value_to_angle(value: f32, min_value: f32, max_value: f32) -> f64 {
    let fraction = (value as f64 - min_value as f64) / (max_value as f64 - min_value as f64);
    ANGLE_MIN + fraction * (ANGLE_MAX - ANGLE_MIN)
}

pub fn radial_line_points(
    cx: f32,
    cy: f32,
    angle: f64,
    inner_radius: f32,
    outer_radius: f32,
) -> (Point, Point) {
    let (sin, cos) = angle.sin_cos();
    let at = |radius: f32| {
        Point::new(
            (cx as f64 - radius as f64 * cos) as f32,
            (cy as f64 - radius as f64 * sin) as f32,
        )
    };
    (at(inner_radius), at(outer_radius))
}

pub fn tick_angle(i: u32, total_ticks: u32) -> f64 {
    ANGLE_MIN + (i as f64 / total_ticks as f64) * (ANGLE_MAX - ANGLE_MIN)
}

/// Value shown at tick `i`. The last tick is pinned to `max_value` so the
/// scale always ends on the exact bound.
pub fn tick_value(i: u32, total_ticks: u32, min_value: f32, max_value: f32) -> f32 {
    if i >= total_ticks {
        return max_value;
    }
    let step = (max_value - min_value) / total_ticks as f32;
    min_value + i as f32 * step
}

/// All `total_ticks + 1` ticks from `min_value` to `max_value`.
pub fn ticks(total_ticks: u32, min_value: f32, max_value: f32) -> impl Iterator<Item = Tick> {
    (0..=total_ticks).map(move |index| Tick {
        index,
        angle: tick_angle(index, total_ticks),
        value: tick_value(index, total_ticks, min_value, max_value),
    })
}

// ============================================================================
// SURFACE ARC CONVENTION
// ============================================================================

// Surfaces take arcs in degrees, clockwise from +x in screen space (y down).
// A dial angle `a` sits at screen angle `a + π`.

/// Start and sweep of the dial arc in surface degrees.
pub fn surface_arc_degrees() -> (f32, f32) {
    let start = (ANGLE_MIN + PI).to_degrees() as f32;
    let sweep = (ANGLE_MAX - ANGLE_MIN).to_degrees() as f32;
    (start, sweep)
}

/// Path segment, in surface degrees, that carries the label of tick `i`.
pub fn tick_label_arc(i: u32, total_ticks: u32) -> (f32, f32) {
    let (start, sweep) = surface_arc_degrees();
    let step = sweep / total_ticks as f32;
    (start - LABEL_ARC_LEAD_DEGREES + i as f32 * step, step)
}
