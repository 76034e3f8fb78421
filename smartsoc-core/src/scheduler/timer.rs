//! Per-category timer state machine.
//!
//! A timer cycles `Idle -> Scheduled(delay) -> Firing -> Scheduled(..)` until
//! it is disarmed. Each arm draws a fresh delay from the category's range.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use crate::config::DelayRange;
use crate::types::Category;

/// Where a category timer is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "delay_ms", rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    #[serde(serialize_with = "serialize_millis")]
    Scheduled(Duration),
    Firing,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// A self-rescheduling timer for one event category.
#[derive(Debug, Clone)]
pub struct CategoryTimer {
    category: Category,
    range: DelayRange,
    phase: TimerPhase,
    fired: u64,
}

impl CategoryTimer {
    pub fn new(category: Category, range: DelayRange) -> Self {
        Self {
            category,
            range,
            phase: TimerPhase::Idle,
            fired: 0,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Number of completed firings since construction.
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    /// Schedule the next firing. Arming an already scheduled timer keeps the
    /// pending delay.
    pub fn arm<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        if let TimerPhase::Scheduled(delay) = self.phase {
            return delay;
        }
        let delay = self.range.sample(rng);
        self.phase = TimerPhase::Scheduled(delay);
        delay
    }

    /// The pending delay elapsed. Returns `false` if the timer was not
    /// scheduled, in which case nothing should be emitted.
    pub fn fire(&mut self) -> bool {
        if !matches!(self.phase, TimerPhase::Scheduled(_)) {
            return false;
        }
        self.phase = TimerPhase::Firing;
        self.fired += 1;
        true
    }

    pub fn disarm(&mut self) {
        self.phase = TimerPhase::Idle;
    }
}
