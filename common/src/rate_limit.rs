//! Cooldown gate.
//!
//! Answers one question: has at least `min_interval` passed since the last
//! recorded action? Nothing blocks and nothing is scheduled; the gate opens
//! purely as a function of elapsed time at the moment it is asked.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct RateGate {
    min_interval: Duration,
    last_action: Option<Instant>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_action: None,
        }
    }

    /// A gate that is always open.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// A gate allowing at most `fps` actions per second.
    /// Non-positive or non-finite rates yield an unlimited gate.
    pub fn from_fps(fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            Self::new(Duration::from_secs_f64(1.0 / fps))
        } else {
            Self::unlimited()
        }
    }

    pub fn allowed(&self) -> bool {
        self.allowed_at(Instant::now())
    }

    /// Always `true` before the first recorded action.
    pub fn allowed_at(&self, now: Instant) -> bool {
        match self.last_action {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    pub fn record_action(&mut self) {
        self.record_action_at(Instant::now());
    }

    pub fn record_action_at(&mut self, now: Instant) {
        self.last_action = Some(now);
    }

    /// Time left until the gate opens; zero when it is already open.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match self.last_action {
            None => Duration::ZERO,
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn set_min_interval(&mut self, min_interval: Duration) {
        self.min_interval = min_interval;
    }

    pub fn last_action(&self) -> Option<Instant> {
        self.last_action
    }

    /// Forget the last action, opening the gate.
    pub fn reset(&mut self) {
        self.last_action = None;
    }
}
