//! Explosion of explodable nodes away from their centroids.
//!
//! Automatic mode is a small state machine driven by host timers:
//!
//! ```text
//! Idle --enable--> Exploding --factor > 6--> Holding(In)  --3s--> Imploding
//!                  ^                                                 |
//!                  +--3s-- Holding(Out) <--factor < 0-----------------+
//! ```
//!
//! Disabling from any state returns to `Idle`. The controller owns at most
//! one live timer (the tick interval or the hold timeout) and cancels it
//! before arming another.

use crate::constants::{
    EXPLODE_HOLD_MS, EXPLODE_INITIAL_FACTOR, EXPLODE_MAX, EXPLODE_MIN, EXPLODE_TICK_MS,
};
use crate::scene::SceneGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    Interval { period_ms: u32 },
    Timeout { delay_ms: u32 },
}

/// Timer capability of the host environment.
pub trait Timers {
    fn arm(&mut self, kind: TimerKind) -> TimerId;
    fn disarm(&mut self, id: TimerId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Exploding,
    Imploding,
    /// Paused at a bound; resumes in the given direction.
    Holding(Direction),
}

#[derive(Debug)]
pub struct ExplosionController {
    phase: Phase,
    factor: f64,
    speed: f64,
    timer: Option<TimerId>,
}

impl ExplosionController {
    pub fn new(speed: f64) -> Self {
        Self {
            phase: Phase::Idle,
            factor: EXPLODE_INITIAL_FACTOR,
            speed,
            timer: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Offset every explodable node by `centroid * factor`.
    pub fn apply(&self, scene: &mut SceneGraph) {
        explode(scene, self.factor);
    }

    /// Manual slider input: takes effect immediately, whatever the phase,
    /// and is not clamped.
    pub fn set_factor(&mut self, scene: &mut SceneGraph, factor: f64) {
        self.factor = factor;
        self.apply(scene);
    }

    pub fn set_automatic(&mut self, enabled: bool, timers: &mut impl Timers) {
        if enabled {
            log::info!("[explode] automatic on at factor {:.3}", self.factor);
            self.run(Direction::Out, timers);
        } else {
            self.cancel(timers);
            self.phase = Phase::Idle;
            log::info!("[explode] automatic off");
        }
    }

    /// Handle a fired timer. Returns the new factor after an animation tick
    /// so the caller can mirror it into the slider. Timers this controller
    /// no longer owns are ignored.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        scene: &mut SceneGraph,
        timers: &mut impl Timers,
    ) -> Option<f64> {
        if self.timer != Some(id) {
            log::debug!("[explode] ignoring stale timer {:?}", id);
            return None;
        }
        match self.phase {
            Phase::Exploding => {
                self.factor += self.speed;
                if self.factor > EXPLODE_MAX {
                    self.factor = EXPLODE_MAX;
                    self.hold(Direction::In, timers);
                }
                self.apply(scene);
                Some(self.factor)
            }
            Phase::Imploding => {
                self.factor -= self.speed;
                if self.factor < EXPLODE_MIN {
                    self.factor = EXPLODE_MIN;
                    self.hold(Direction::Out, timers);
                }
                self.apply(scene);
                Some(self.factor)
            }
            Phase::Holding(next) => {
                self.run(next, timers);
                None
            }
            Phase::Idle => None,
        }
    }

    fn run(&mut self, direction: Direction, timers: &mut impl Timers) {
        self.cancel(timers);
        self.phase = match direction {
            Direction::Out => Phase::Exploding,
            Direction::In => Phase::Imploding,
        };
        self.timer = Some(timers.arm(TimerKind::Interval {
            period_ms: EXPLODE_TICK_MS,
        }));
    }

    fn hold(&mut self, next: Direction, timers: &mut impl Timers) {
        self.cancel(timers);
        self.phase = Phase::Holding(next);
        self.timer = Some(timers.arm(TimerKind::Timeout {
            delay_ms: EXPLODE_HOLD_MS,
        }));
    }

    fn cancel(&mut self, timers: &mut impl Timers) {
        if let Some(id) = self.timer.take() {
            timers.disarm(id);
        }
    }
}

/// Set the offset of every node with a centroid to `centroid * factor`.
pub fn explode(scene: &mut SceneGraph, factor: f64) {
    for node in &mut scene.nodes {
        if let Some(c) = node.centroid {
            node.position = c * factor;
        }
    }
}
