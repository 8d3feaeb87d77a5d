//! Thing meter: a semicircular analogue gauge widget.
//!
//! A [`ThingMeter`] holds the configuration, current value and measured size
//! of one dial. It draws onto any [`DrawSurface`], either the software
//! [`PixelCanvas`] used by the [`MeterWindow`] host or a recording [`Scene`].
//! A [`GaugeAnimator`] sweeps the needle between the bounds.
//!
//! ```no_run
//! use std::time::Instant;
//! use thingmeter::{FontRegistry, GaugeAnimator, GaugeConfig, MeterWindow, ThingMeter, WindowOptions};
//!
//! let config = GaugeConfig::builder().label("RPM").max_value(8000.0).build();
//! let meter = ThingMeter::new(config, FontRegistry::with_system_default())?;
//! let mut animator = GaugeAnimator::builder().step(50.0).build();
//! animator.start(Instant::now());
//! MeterWindow::new(meter, WindowOptions::default())
//!     .with_animator(animator)
//!     .show()?;
//! # Ok::<(), thingmeter::MeterError>(())
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod animator;
pub mod canvas;
pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod meter;
pub mod render;
pub mod state;
pub mod surface;
pub mod window;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use animator::{BoundPolicy, Direction, GaugeAnimator, StopToken};
pub use canvas::PixelCanvas;
pub use config::{Color, GaugeConfig};
pub use error::{MeterError, Result};
pub use font::FontRegistry;
pub use geometry::{ViewBounds, ANGLE_MAX, ANGLE_MIN};
pub use meter::{MeterCommand, ThingMeter};
pub use render::GaugeRenderer;
pub use state::SavedState;
pub use surface::{DrawCommand, DrawSurface, Paint, Point, Rect, Scene, TextAlign};
pub use window::{MeterHost, MeterWindow, WindowOptions};
