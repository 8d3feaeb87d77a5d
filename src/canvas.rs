use std::f64::consts::{FRAC_PI_2, PI};

use log::trace;
use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::Color;
use crate::surface::{DrawSurface, Paint, Point, Rect, TextAlign};

// ============================================================================
// CORE DATA TYPES
// ============================================================================

struct Frame<'a> {
    pixels: &'a mut [u8],
    width: usize,
    height: usize,
}

impl Frame<'_> {
    /// Blends `color` over the pixel at `(x, y)` with the given coverage.
    fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let a = (coverage * color.alpha() as f32 / 255.0).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let (r, g, b) = color.as_tuple();
        let dst = &mut self.pixels[idx..idx + 4];
        for (channel, src) in dst.iter_mut().zip([r, g, b]) {
            *channel = (src as f32 * a + *channel as f32 * (1.0 - a)).round() as u8;
        }
        dst[3] = 0xff;
    }

    /// Spreads one sub-pixel sample over its four neighbours.
    fn blend_subpixel(&mut self, x: f64, y: f64, color: Color, coverage: f32) {
        let (x_floor, y_floor) = (x.floor(), y.floor());
        let (x_frac, y_frac) = (x - x_floor, y - y_floor);
        let (xi, yi) = (x_floor as i32, y_floor as i32);
        let samples = [
            (xi, yi, (1.0 - x_frac) * (1.0 - y_frac)),
            (xi + 1, yi, x_frac * (1.0 - y_frac)),
            (xi, yi + 1, (1.0 - x_frac) * y_frac),
            (xi + 1, yi + 1, x_frac * y_frac),
        ];
        for (px, py, weight) in samples {
            let alpha = coverage * weight as f32;
            if alpha > 0.001 {
                self.blend(px, py, color, alpha);
            }
        }
    }
}

/// Software `DrawSurface` over an RGBA8 frame, such as a `pixels` buffer.
pub struct PixelCanvas<'a> {
    frame: Frame<'a>,
    default_font: Option<&'a Font<'static>>,
}

impl<'a> PixelCanvas<'a> {
    /// Wraps `pixels`, which must hold `width * height` RGBA8 pixels.
    pub fn new(pixels: &'a mut [u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(pixels.len(), width * height * 4);
        Self {
            frame: Frame {
                pixels,
                width,
                height,
            },
            default_font: None,
        }
    }

    /// Font used for text whose paint carries none.
    pub fn with_default_font(mut self, font: Option<&'a Font<'static>>) -> Self {
        self.default_font = font;
        self
    }

    pub fn width(&self) -> usize {
        self.frame.width
    }

    pub fn height(&self) -> usize {
        self.frame.height
    }

    pub fn clear(&mut self, color: Color) {
        let (r, g, b) = color.as_tuple();
        for chunk in self.frame.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[r, g, b, 0xff]);
        }
    }

    /// RGBA bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * self.frame.width + x) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.frame.pixels[idx..idx + 4]);
        out
    }
}

impl DrawSurface for PixelCanvas<'_> {
    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        let (x0, x1) = (rect.left.round() as i32, rect.right.round() as i32);
        let (y0, y1) = (rect.top.round() as i32, rect.bottom.round() as i32);
        for y in y0.max(0)..y1.min(self.frame.height as i32) {
            for x in x0.max(0)..x1.min(self.frame.width as i32) {
                self.frame.blend(x, y, paint.color, 1.0);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, paint: &Paint) {
        let half = paint.stroke_width / 2.0;
        let edges = [
            ((rect.left - half, rect.top), (rect.right + half, rect.top)),
            ((rect.left - half, rect.bottom), (rect.right + half, rect.bottom)),
            ((rect.left, rect.top), (rect.left, rect.bottom)),
            ((rect.right, rect.top), (rect.right, rect.bottom)),
        ];
        for ((x0, y0), (x1, y1)) in edges {
            draw_thick_line_aa(
                &mut self.frame,
                Point::new(x0, y0),
                Point::new(x1, y1),
                paint.stroke_width,
                paint.color,
            );
        }
    }

    fn stroke_arc(&mut self, oval: Rect, start_degrees: f32, sweep_degrees: f32, paint: &Paint) {
        render_arc(
            &mut self.frame,
            oval,
            start_degrees as f64,
            sweep_degrees as f64,
            paint.stroke_width.max(1.0),
            paint.color,
        );
    }

    fn stroke_line(&mut self, from: Point, to: Point, paint: &Paint) {
        draw_thick_line_aa(&mut self.frame, from, to, paint.stroke_width.max(1.0), paint.color);
    }

    fn draw_text(&mut self, text: &str, pos: Point, align: TextAlign, paint: &Paint) {
        let Some(font) = paint.font.or(self.default_font) else {
            trace!("no font for text {text:?}, skipping");
            return;
        };
        let scale = Scale::uniform(paint.text_size);
        draw_text(&mut self.frame, pos, text, font, scale, align, paint.color);
    }

    fn draw_text_on_arc(
        &mut self,
        text: &str,
        oval: Rect,
        start_degrees: f32,
        sweep_degrees: f32,
        v_offset: f32,
        paint: &Paint,
    ) {
        let Some(font) = paint.font.or(self.default_font) else {
            trace!("no font for curved text {text:?}, skipping");
            return;
        };
        draw_curved_text(
            &mut self.frame,
            oval,
            start_degrees as f64,
            sweep_degrees as f64,
            v_offset as f64,
            text,
            font,
            Scale::uniform(paint.text_size),
            paint.color,
        );
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn draw_thick_line_aa(frame: &mut Frame, from: Point, to: Point, thickness: f32, color: Color) {
    let reach = (thickness / 2.0).ceil() + 1.0;
    let min_x = (from.x.min(to.x) - reach).floor() as i32;
    let max_x = (from.x.max(to.x) + reach).ceil() as i32;
    let min_y = (from.y.min(to.y) - reach).floor() as i32;
    let max_y = (from.y.max(to.y) + reach).ceil() as i32;
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len_sq = dx * dx + dy * dy;
    for y in min_y.max(0)..=max_y.min(frame.height as i32 - 1) {
        for x in min_x.max(0)..=max_x.min(frame.width as i32 - 1) {
            // Sample at the pixel centre.
            let (sx, sy) = (x as f32 + 0.5, y as f32 + 0.5);
            let t = if len_sq > 0.0 {
                (((sx - from.x) * dx + (sy - from.y) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = from.x + t * dx;
            let ly = from.y + t * dy;
            let dist = ((lx - sx).powi(2) + (ly - sy).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                frame.blend(x, y, color, aa);
            }
        }
    }
}

/// Whether screen angle `angle` (radians) lies on the arc from `start` over
/// `sweep`; both are normalised so the sweep is positive.
fn angle_in_sweep(angle: f64, start: f64, sweep: f64) -> bool {
    let (start, sweep) = if sweep < 0.0 {
        (start + sweep, -sweep)
    } else {
        (start, sweep)
    };
    if sweep >= 2.0 * PI {
        return true;
    }
    (angle - start).rem_euclid(2.0 * PI) <= sweep
}

/// Ovals are rasterised as circles of their mean radius.
fn render_arc(
    frame: &mut Frame,
    oval: Rect,
    start_degrees: f64,
    sweep_degrees: f64,
    thickness: f32,
    color: Color,
) {
    let center = oval.center();
    let (cx, cy) = (center.x as f64, center.y as f64);
    let r = (oval.width() + oval.height()) as f64 / 4.0;
    let half = thickness as f64 / 2.0;
    let (start, sweep) = (start_degrees.to_radians(), sweep_degrees.to_radians());

    let reach = r + half + 1.0;
    let min_x = ((cx - reach).floor() as i32).max(0);
    let max_x = ((cx + reach).ceil() as i32).min(frame.width as i32 - 1);
    let min_y = ((cy - reach).floor() as i32).max(0);
    let max_y = ((cy + reach).ceil() as i32).min(frame.height as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = 1.0 - ((dist - r).abs() - half).clamp(0.0, 1.0);
            if aa <= 0.0 {
                continue;
            }
            if angle_in_sweep(dy.atan2(dx), start, sweep) {
                frame.blend(x, y, color, aa as f32);
            }
        }
    }
}

fn layout(text: &str, font: &Font<'static>, scale: Scale) -> (Vec<PositionedGlyph<'static>>, f32) {
    let glyphs: Vec<PositionedGlyph<'static>> = font.layout(text, scale, point(0.0, 0.0)).collect();
    let width = glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0);
    (glyphs, width)
}

fn draw_text(
    frame: &mut Frame,
    pos: Point,
    text: &str,
    font: &Font<'static>,
    scale: Scale,
    align: TextAlign,
    color: Color,
) {
    let (glyphs, width) = layout(text, font, scale);
    let origin_x = match align {
        TextAlign::Left => pos.x,
        TextAlign::Center => pos.x - width / 2.0,
        TextAlign::Right => pos.x - width,
    };
    let (ox, oy) = (origin_x.round() as i32, pos.y.round() as i32);
    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                frame.blend(ox + bb.min.x + gx as i32, oy + bb.min.y + gy as i32, color, v);
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_curved_text(
    frame: &mut Frame,
    oval: Rect,
    start_degrees: f64,
    sweep_degrees: f64,
    v_offset: f64,
    text: &str,
    font: &Font<'static>,
    scale: Scale,
    color: Color,
) {
    let (glyphs, width) = layout(text, font, scale);
    if glyphs.is_empty() || width <= 0.0 {
        return;
    }

    let center = oval.center();
    let (cx, cy) = (center.x as f64, center.y as f64);
    let path_radius = (oval.width() + oval.height()) as f64 / 4.0;
    if path_radius <= 0.0 {
        return;
    }
    let text_radius = path_radius - v_offset;

    // Centre the text on the path length.
    let path_length = path_radius * sweep_degrees.to_radians().abs();
    let lead = (path_length - width as f64) / 2.0;
    let start_angle = start_degrees.to_radians();

    for glyph in &glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        let advance = glyph.unpositioned().h_metrics().advance_width as f64;
        let glyph_mid = glyph.position().x as f64 + advance / 2.0;
        let angle = start_angle + (lead + glyph_mid) / path_radius;

        let anchor_x = cx + angle.cos() * text_radius;
        let anchor_y = cy + angle.sin() * text_radius;
        // Upright along the tangent of a clockwise path.
        let rotation = angle + FRAC_PI_2;
        let (sin_r, cos_r) = rotation.sin_cos();

        glyph.draw(|gx, gy, v| {
            if v <= 0.001 {
                return;
            }
            // Relative to the glyph's horizontal middle on the baseline.
            let local_x = (bb.min.x + gx as i32) as f64 - glyph_mid;
            let local_y = (bb.min.y + gy as i32) as f64;
            let x = anchor_x + local_x * cos_r - local_y * sin_r;
            let y = anchor_y + local_x * sin_r + local_y * cos_r;
            frame.blend_subpixel(x, y, color, v);
        });
    }
}
