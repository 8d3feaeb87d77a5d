use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bon::Builder;
use log::{debug, error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::animator::GaugeAnimator;
use crate::canvas::PixelCanvas;
use crate::error::{MeterError, Result};
use crate::meter::{MeterCommand, ThingMeter};
use crate::state::SavedState;

/// How often the loop wakes to drain commands when nothing else is scheduled.
const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Builder)]
pub struct WindowOptions {
    #[builder(into, default = String::from("Thing Meter"))]
    pub title: String,
    #[builder(default = 400)]
    pub width: u32,
    #[builder(default = 400)]
    pub height: u32,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

// ============================================================================
// HOST STATE
// ============================================================================

/// Everything the event loop mutates: the meter, its animator and the state
/// saved while the application is suspended.
pub struct MeterHost {
    meter: ThingMeter,
    animator: Option<GaugeAnimator>,
    saved: Option<SavedState>,
}

impl MeterHost {
    pub fn new(meter: ThingMeter, animator: Option<GaugeAnimator>) -> Self {
        Self {
            meter,
            animator,
            saved: None,
        }
    }

    pub fn meter(&self) -> &ThingMeter {
        &self.meter
    }

    pub fn meter_mut(&mut self) -> &mut ThingMeter {
        &mut self.meter
    }

    pub fn animator(&self) -> Option<&GaugeAnimator> {
        self.animator.as_ref()
    }

    /// Applies one command. Rejected commands are logged and dropped.
    pub fn handle_command(&mut self, command: MeterCommand) {
        match command {
            MeterCommand::Tick => {
                if let Some(animator) = self.animator.as_mut() {
                    animator.tick(&mut self.meter);
                }
            }
            command => {
                if let Err(err) = self.meter.apply(command) {
                    warn!("ignoring {command:?}: {err}");
                }
            }
        }
    }

    pub fn drain(&mut self, receiver: &Receiver<MeterCommand>) {
        while let Ok(command) = receiver.try_recv() {
            self.handle_command(command);
        }
    }

    /// Runs due animator ticks and returns the next animator deadline.
    /// Animators that were never started are driven by `Tick` commands only.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        match self.animator.as_mut() {
            Some(animator) if animator.is_started() => animator.poll(now, &mut self.meter),
            _ => None,
        }
    }

    pub fn suspend(&mut self) {
        debug!("saving meter state");
        self.saved = Some(self.meter.save_state());
    }

    pub fn resume(&mut self) {
        if let Some(state) = self.saved.take() {
            if let Err(err) = self.meter.restore_state(&state) {
                warn!("discarding saved meter state: {err}");
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.stop();
        }
    }
}

// ============================================================================
// WINDOW
// ============================================================================

pub struct MeterWindow {
    host: MeterHost,
    options: WindowOptions,
}

impl MeterWindow {
    pub fn new(meter: ThingMeter, options: WindowOptions) -> Self {
        Self {
            host: MeterHost::new(meter, None),
            options,
        }
    }

    pub fn with_animator(mut self, animator: GaugeAnimator) -> Self {
        self.host.animator = Some(animator);
        self
    }

    pub fn show(self) -> Result<()> {
        self.run(None)
    }

    pub fn show_with_commands(self, receiver: Receiver<MeterCommand>) -> Result<()> {
        self.run(Some(receiver))
    }

    fn run(self, receiver: Option<Receiver<MeterCommand>>) -> Result<()> {
        let Self { mut host, options } = self;

        let event_loop = EventLoop::new().map_err(window_error)?;
        let window = WindowBuilder::new()
            .with_title(&options.title)
            .with_inner_size(LogicalSize::new(options.width as f64, options.height as f64))
            .build(&event_loop)
            .map_err(window_error)?;
        let window = Arc::new(window);
        let window_clone = window.clone();

        let size = window.inner_size();
        let bounds = host.meter_mut().measure(size.width.max(1), size.height.max(1));
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels =
            Pixels::new(bounds.width, bounds.height, surface_texture).map_err(window_error)?;
        let mut buffer = (bounds.width, bounds.height);
        info!("meter window open at {}x{}", bounds.width, bounds.height);

        event_loop
            .run(move |event, window_target| {
                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::CloseRequested => {
                            host.close();
                            window_target.exit();
                        }
                        WindowEvent::Resized(new_size) => {
                            if new_size.width == 0 || new_size.height == 0 {
                                return;
                            }
                            let bounds = host.meter_mut().measure(new_size.width, new_size.height);
                            debug!("resized to {}x{}", bounds.width, bounds.height);
                            if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                                error!("resizing surface failed: {err}");
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            let bounds = host.meter().bounds();
                            if buffer != (bounds.width, bounds.height) {
                                if let Err(err) = pixels.resize_buffer(bounds.width, bounds.height) {
                                    error!("resizing buffer failed: {err}");
                                    return;
                                }
                                buffer = (bounds.width, bounds.height);
                            }

                            let frame = pixels.frame_mut();
                            let mut canvas = PixelCanvas::new(
                                frame,
                                bounds.width as usize,
                                bounds.height as usize,
                            );
                            host.meter().draw(&mut canvas);
                            host.meter_mut().take_dirty();

                            if let Err(err) = pixels.render() {
                                error!("render failed: {err}");
                                host.close();
                                window_target.exit();
                            }
                        }
                        _ => {}
                    },
                    Event::Suspended => host.suspend(),
                    Event::Resumed => {
                        host.resume();
                        let size = window_clone.inner_size();
                        if size.width > 0 && size.height > 0 {
                            host.meter_mut().measure(size.width, size.height);
                        }
                        host.meter_mut().invalidate();
                    }
                    Event::AboutToWait => {
                        let now = Instant::now();
                        if let Some(receiver) = &receiver {
                            host.drain(receiver);
                        }
                        let animation = host.poll(now);
                        if host.meter().is_dirty() {
                            window_clone.request_redraw();
                        }

                        let commands = receiver.as_ref().map(|_| now + COMMAND_POLL_INTERVAL);
                        let wake = match (animation, commands) {
                            (Some(a), Some(c)) => Some(a.min(c)),
                            (a, c) => a.or(c),
                        };
                        window_target.set_control_flow(match wake {
                            Some(deadline) => ControlFlow::WaitUntil(deadline),
                            None => ControlFlow::Wait,
                        });
                    }
                    _ => {}
                }
            })
            .map_err(window_error)?;

        Ok(())
    }
}

fn window_error(err: impl std::fmt::Display) -> MeterError {
    MeterError::Window(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, GaugeConfig};
    use crate::font::FontRegistry;
    use std::sync::mpsc;

    fn host(animator: Option<GaugeAnimator>) -> MeterHost {
        let meter = ThingMeter::new(GaugeConfig::default(), FontRegistry::new()).unwrap();
        MeterHost::new(meter, animator)
    }

    #[test]
    fn drains_commands_in_order() {
        let mut host = host(Some(GaugeAnimator::default()));
        let (sender, receiver) = mpsc::channel();
        sender.send(MeterCommand::SetValue(40.0)).unwrap();
        sender.send(MeterCommand::Tick).unwrap();
        sender.send(MeterCommand::Tick).unwrap();
        sender.send(MeterCommand::SetBackgroundColor(Color::BLUE)).unwrap();
        host.drain(&receiver);
        assert_eq!(host.meter().value(), 42.0);
        assert_eq!(host.meter().config().background_color, Color::BLUE);
    }

    #[test]
    fn rejected_commands_are_dropped() {
        let mut host = host(None);
        host.handle_command(MeterCommand::SetMinValue(500.0));
        host.handle_command(MeterCommand::Tick);
        assert_eq!(host.meter().min_value(), 0.0);
        assert_eq!(host.meter().value(), 0.0);
    }

    #[test]
    fn only_started_animators_are_polled() {
        let mut host = host(Some(GaugeAnimator::new(Duration::from_millis(10))));
        let now = Instant::now();
        assert_eq!(host.poll(now + Duration::from_secs(1)), None);
        assert_eq!(host.meter().value(), 0.0);

        let mut animator = GaugeAnimator::new(Duration::from_millis(10));
        animator.start(now);
        let mut host = self::host(Some(animator));
        assert!(host.poll(now + Duration::from_millis(25)).is_some());
        assert_eq!(host.meter().value(), 2.0);
    }

    #[test]
    fn suspend_and_resume_restore_state() {
        let mut host = host(None);
        host.meter_mut().set_value(64.0);
        host.meter_mut().measure(300, 300);
        host.suspend();

        host.meter_mut().set_value(1.0);
        host.meter_mut().measure(100, 100);
        host.resume();

        assert_eq!(host.meter().value(), 64.0);
        assert_eq!(host.meter().bounds().width, 300);
        // A second resume without a suspend keeps the current state.
        host.meter_mut().set_value(5.0);
        host.resume();
        assert_eq!(host.meter().value(), 5.0);
    }

    #[test]
    fn close_stops_animator() {
        let mut animator = GaugeAnimator::default();
        animator.start(Instant::now());
        let token = animator.stop_token();
        let mut host = host(Some(animator));
        host.close();
        assert!(token.is_stopped());
        assert!(host.animator().is_some_and(GaugeAnimator::is_stopped));
    }
}
