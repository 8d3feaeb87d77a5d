use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bon::Builder;
use log::{debug, info};

use crate::meter::{MeterCommand, ThingMeter};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Overdue ticks run by one `poll` before the schedule restarts from `now`.
const MAX_CATCH_UP_TICKS: u32 = 16;

/// How the animator turns around at the ends of the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundPolicy {
    /// Clamp the step to the bound it crosses and reverse.
    #[default]
    Reflect,
    /// Move by exactly one unit and reverse only when that lands exactly on
    /// a bound. The configured step is ignored. Ranges that unit steps never
    /// hit exactly make the needle run off the scale.
    ExactMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Sweeps a meter's value back and forth between its bounds, one step per
/// period.
#[derive(Debug, Builder)]
pub struct GaugeAnimator {
    #[builder(default = DEFAULT_PERIOD)]
    period: Duration,
    #[builder(default = 1.0)]
    step: f32,
    #[builder(default)]
    policy: BoundPolicy,
    #[builder(skip = Direction::Up)]
    direction: Direction,
    #[builder(skip)]
    stop: StopToken,
    #[builder(skip)]
    next_due: Option<Instant>,
}

impl Default for GaugeAnimator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeAnimator {
    pub fn new(period: Duration) -> Self {
        Self::builder().period(period).build()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn policy(&self) -> BoundPolicy {
        self.policy
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Computes one step from `current` and updates the direction.
    pub fn next_value(&mut self, current: f32, min_value: f32, max_value: f32) -> f32 {
        match self.policy {
            BoundPolicy::Reflect => {
                let candidate = current + self.direction.sign() * self.step;
                if candidate >= max_value {
                    self.direction = Direction::Down;
                    max_value
                } else if candidate <= min_value {
                    self.direction = Direction::Up;
                    min_value
                } else {
                    candidate
                }
            }
            BoundPolicy::ExactMatch => {
                let candidate = current + self.direction.sign();
                if candidate == max_value || candidate == min_value {
                    self.direction = self.direction.reversed();
                }
                candidate
            }
        }
    }

    /// Advances the meter by one step. Returns `false` once stopped.
    pub fn tick(&mut self, meter: &mut ThingMeter) -> bool {
        if self.is_stopped() {
            return false;
        }
        let value = self.next_value(meter.value(), meter.min_value(), meter.max_value());
        meter.set_value(value);
        true
    }

    /// Schedules the first tick one period after `now`.
    pub fn start(&mut self, now: Instant) {
        info!("animating every {:?} ({:?})", self.period, self.policy);
        self.next_due = Some(now + self.period);
    }

    pub fn is_started(&self) -> bool {
        self.next_due.is_some()
    }

    /// Runs every tick that is due at `now` and returns the next deadline.
    /// Deadlines advance by whole periods so late polls do not drift the rate.
    pub fn poll(&mut self, now: Instant, meter: &mut ThingMeter) -> Option<Instant> {
        if self.is_stopped() {
            self.next_due = None;
            return None;
        }
        let mut due = *self.next_due.get_or_insert(now + self.period);
        let mut ran = 0;
        while due <= now {
            if ran == MAX_CATCH_UP_TICKS {
                debug!("animator fell {:?} behind, rescheduling", now - due);
                due = now + self.period;
                break;
            }
            self.tick(meter);
            due += self.period;
            ran += 1;
        }
        self.next_due = Some(due);
        Some(due)
    }

    pub fn stop(&mut self) {
        if !self.is_stopped() {
            info!("animator stopped");
        }
        self.stop.stop();
        self.next_due = None;
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Token that stops this animator and any ticker it spawned.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Sends [`MeterCommand::Tick`] once per period from a background thread.
    /// The receiving side applies each tick with [`GaugeAnimator::tick`]. The
    /// thread exits once stopped or when the receiver hangs up.
    pub fn spawn(&self, sender: Sender<MeterCommand>) -> JoinHandle<()> {
        let stop = self.stop_token();
        let period = self.period;
        thread::spawn(move || {
            debug!("ticker thread started");
            loop {
                thread::sleep(period);
                if stop.is_stopped() || sender.send(MeterCommand::Tick).is_err() {
                    break;
                }
            }
            debug!("ticker thread finished");
        })
    }
}
