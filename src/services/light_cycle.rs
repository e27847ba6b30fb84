//! Light-cycle simulator
//!
//! A purely cosmetic countdown that cycles green → yellow → red → green using
//! the durations returned by the backend. It has no bearing on real traffic
//! control and cannot fail.

use crate::metrics::Metrics;
use crate::models::{LightPhase, LightTimings, TimingDisplay};
use crate::state::StateManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Phase whose countdown was rendered on this tick
    pub rendered_phase: LightPhase,
    /// Seconds shown on this tick
    pub rendered_seconds: u32,
    /// Phase switched to after rendering, if the countdown hit zero
    pub switched_to: Option<LightPhase>,
}

/// Countdown state machine
///
/// Invariant: `remaining` is always within `[0, timings.duration(phase)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightCycle {
    timings: LightTimings,
    phase: LightPhase,
    remaining: u32,
}

impl LightCycle {
    /// Start on green with the full green duration
    pub fn new(timings: LightTimings) -> Self {
        Self {
            timings,
            phase: LightPhase::Green,
            remaining: timings.green,
        }
    }

    pub fn phase(&self) -> LightPhase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn timings(&self) -> LightTimings {
        self.timings
    }

    /// Countdown text for the current state
    pub fn display(&self) -> TimingDisplay {
        TimingDisplay::Countdown {
            phase: self.phase,
            seconds: self.remaining,
        }
    }

    /// Advance one second
    ///
    /// The decremented value is rendered first; on reaching zero the next
    /// phase starts with its full duration. A zero-length phase therefore
    /// lasts exactly one tick.
    pub fn tick(&mut self) -> Tick {
        self.remaining = self.remaining.saturating_sub(1);
        let rendered_phase = self.phase;
        let rendered_seconds = self.remaining;

        let switched_to = if self.remaining == 0 {
            self.phase = self.phase.next();
            self.remaining = self.timings.duration(self.phase);
            Some(self.phase)
        } else {
            None
        };

        Tick {
            rendered_phase,
            rendered_seconds,
            switched_to,
        }
    }
}

/// A running simulation
///
/// Owns the repeating timer task. Stopped explicitly with [`stop`](Self::stop)
/// or implicitly when dropped.
///
/// Aborting alone is not enough on a multi-threaded runtime: the task may
/// already be past its timer when the abort lands. Each tick therefore checks
/// `cancelled` under the state write lock, so no frame is drawn after `stop`.
#[derive(Debug)]
pub struct LightCycleSession {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
    timings: LightTimings,
}

impl LightCycleSession {
    /// Reset all indicators, light green, render the initial countdown and
    /// start ticking every `period`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        timings: LightTimings,
        period: Duration,
        state: Arc<StateManager>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut cycle = LightCycle::new(timings);

        state.update(|s| {
            s.active_light = Some(cycle.phase());
            s.timing = cycle.display();
        });

        tracing::info!(
            "Light cycle started: green={}s, yellow={}s, red={}s",
            timings.green,
            timings.yellow,
            timings.red
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_clone = Arc::clone(&cancelled);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let tick = cycle.tick();

                let mut drawn = false;
                state.update(|s| {
                    if cancelled_clone.load(Ordering::Acquire) {
                        return;
                    }
                    s.timing = TimingDisplay::Countdown {
                        phase: tick.rendered_phase,
                        seconds: tick.rendered_seconds,
                    };
                    if let Some(next) = tick.switched_to {
                        s.active_light = Some(next);
                    }
                    drawn = true;
                });

                if !drawn {
                    tracing::trace!("Light cycle cancelled mid-tick");
                    break;
                }
                metrics.record_light_tick();

                if let Some(next) = tick.switched_to {
                    tracing::trace!("Light switched {} -> {}", tick.rendered_phase, next);
                }
            }
        });

        Self {
            handle,
            cancelled,
            timings,
        }
    }

    pub fn timings(&self) -> LightTimings {
        self.timings
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the timer; the display keeps its last frame
    ///
    /// A tick already in flight is discarded rather than drawn.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.handle.abort();
    }
}

impl Drop for LightCycleSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Holder of the single live simulation
///
/// [`replace`](Self::replace) stops the previous session before starting the
/// next, so at most one timer ticks at any time.
#[derive(Debug, Default)]
pub struct LightCycleSlot {
    current: Mutex<Option<LightCycleSession>>,
}

impl LightCycleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop any running simulation and start a new one
    pub fn replace(
        &self,
        timings: LightTimings,
        period: Duration,
        state: Arc<StateManager>,
        metrics: Arc<Metrics>,
    ) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            tracing::debug!("Stopping previous light cycle");
            previous.stop();
        }
        *current = Some(LightCycleSession::start(timings, period, state, metrics));
    }

    /// [`replace`](Self::replace), but only while `generation` is still the
    /// latest selection
    ///
    /// The check runs under the slot lock, so a completion that stops the slot
    /// after a newer selection can never be undone by this start.
    ///
    /// # Returns
    /// `false` if the selection was stale and nothing was started
    pub fn replace_if_current(
        &self,
        generation: u64,
        timings: LightTimings,
        period: Duration,
        state: Arc<StateManager>,
        metrics: Arc<Metrics>,
    ) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.read(|s| s.is_current(generation)) {
            return false;
        }
        if let Some(previous) = current.take() {
            tracing::debug!("Stopping previous light cycle");
            previous.stop();
        }
        *current = Some(LightCycleSession::start(timings, period, state, metrics));
        true
    }

    /// Stop the running simulation, if any
    pub fn stop(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = current.take() {
            session.stop();
            tracing::debug!("Light cycle stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(LightCycleSession::is_running)
    }

    /// Timings of the live simulation
    pub fn active_timings(&self) -> Option<LightTimings> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(LightCycleSession::timings)
    }
}
