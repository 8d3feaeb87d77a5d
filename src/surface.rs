use rusttype::Font;

use crate::config::Color;

// ============================================================================
// PRIMITIVE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Shrinks every edge towards the centre by `by`.
    pub fn inset(&self, by: f32) -> Self {
        Self::new(self.left + by, self.top + by, self.right - by, self.bottom - by)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Drawing parameters for one surface call.
#[derive(Clone, Copy)]
pub struct Paint<'f> {
    pub color: Color,
    pub stroke_width: f32,
    pub text_size: f32,
    /// Resolved typeface; `None` lets the surface pick its default.
    pub font: Option<&'f Font<'static>>,
}

impl<'f> Paint<'f> {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            stroke_width: 0.0,
            text_size: 0.0,
            font: None,
        }
    }

    pub fn stroke(color: Color, width: f32) -> Self {
        Self {
            stroke_width: width,
            ..Self::fill(color)
        }
    }

    pub fn text(color: Color, size: f32, font: Option<&'f Font<'static>>) -> Self {
        Self {
            text_size: size,
            font,
            ..Self::fill(color)
        }
    }
}

// ============================================================================
// DRAWING SURFACE
// ============================================================================

/// The 2D capability the renderer draws onto.
///
/// Arc angles are degrees measured clockwise from the positive x-axis in
/// screen space, where y grows downwards.
pub trait DrawSurface {
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);

    /// Strokes the outline of `rect`, centred on its edges.
    fn stroke_rect(&mut self, rect: Rect, paint: &Paint);

    fn stroke_arc(&mut self, oval: Rect, start_degrees: f32, sweep_degrees: f32, paint: &Paint);

    fn stroke_line(&mut self, from: Point, to: Point, paint: &Paint);

    /// Draws `text` with its baseline at `pos.y`, aligned horizontally on `pos.x`.
    fn draw_text(&mut self, text: &str, pos: Point, align: TextAlign, paint: &Paint);

    /// Draws `text` centred along the arc of `oval` between `start_degrees` and
    /// `start_degrees + sweep_degrees`. Negative `v_offset` lifts the text
    /// above the path, away from the oval centre.
    fn draw_text_on_arc(
        &mut self,
        text: &str,
        oval: Rect,
        start_degrees: f32,
        sweep_degrees: f32,
        v_offset: f32,
        paint: &Paint,
    );
}

// ============================================================================
// RETAINED MODE RECORDING
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        width: f32,
        color: Color,
    },
    Arc {
        oval: Rect,
        start_degrees: f32,
        sweep_degrees: f32,
        width: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    Text {
        text: String,
        pos: Point,
        align: TextAlign,
        size: f32,
        color: Color,
        has_font: bool,
    },
    TextOnArc {
        text: String,
        oval: Rect,
        start_degrees: f32,
        sweep_degrees: f32,
        v_offset: f32,
        size: f32,
        color: Color,
        has_font: bool,
    },
}

/// A `DrawSurface` that records every call, for replay or inspection.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Replays the recorded commands onto another surface. Text is drawn with
    /// that surface's default font.
    pub fn replay<S: DrawSurface>(&self, surface: &mut S) {
        for command in &self.commands {
            match command {
                DrawCommand::FillRect { rect, color } => {
                    surface.fill_rect(*rect, &Paint::fill(*color));
                }
                DrawCommand::StrokeRect { rect, width, color } => {
                    surface.stroke_rect(*rect, &Paint::stroke(*color, *width));
                }
                DrawCommand::Arc {
                    oval,
                    start_degrees,
                    sweep_degrees,
                    width,
                    color,
                } => {
                    surface.stroke_arc(
                        *oval,
                        *start_degrees,
                        *sweep_degrees,
                        &Paint::stroke(*color, *width),
                    );
                }
                DrawCommand::Line {
                    from,
                    to,
                    width,
                    color,
                } => {
                    surface.stroke_line(*from, *to, &Paint::stroke(*color, *width));
                }
                DrawCommand::Text {
                    text,
                    pos,
                    align,
                    size,
                    color,
                    ..
                } => {
                    surface.draw_text(text, *pos, *align, &Paint::text(*color, *size, None));
                }
                DrawCommand::TextOnArc {
                    text,
                    oval,
                    start_degrees,
                    sweep_degrees,
                    v_offset,
                    size,
                    color,
                    ..
                } => {
                    surface.draw_text_on_arc(
                        text,
                        *oval,
                        *start_degrees,
                        *sweep_degrees,
                        *v_offset,
                        &Paint::text(*color, *size, None),
                    );
                }
            }
        }
    }
}

impl DrawSurface for Scene {
    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color: paint.color,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            width: paint.stroke_width,
            color: paint.color,
        });
    }

    fn stroke_arc(&mut self, oval: Rect, start_degrees: f32, sweep_degrees: f32, paint: &Paint) {
        self.commands.push(DrawCommand::Arc {
            oval,
            start_degrees,
            sweep_degrees,
            width: paint.stroke_width,
            color: paint.color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, paint: &Paint) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width: paint.stroke_width,
            color: paint.color,
        });
    }

    fn draw_text(&mut self, text: &str, pos: Point, align: TextAlign, paint: &Paint) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            align,
            size: paint.text_size,
            color: paint.color,
            has_font: paint.font.is_some(),
        });
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
        self.commands.push(DrawCommand::TextOnArc {
            text: text.to_string(),
            oval,
            start_degrees,
            sweep_degrees,
            v_offset,
            size: paint.text_size,
            color: paint.color,
            has_font: paint.font.is_some(),
        });
    }
}
