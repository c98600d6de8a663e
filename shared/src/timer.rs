//! Focus timer as an explicit state machine.
//!
//! Remaining time is plain state; the one-second tick comes from outside
//! (see [`crate::capabilities::TickScheduler`]). Nothing here is persisted, so
//! a reload always lands on an idle timer at full duration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BREAK_SECS, FOCUS_SESSION_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerSegment {
    #[default]
    Focus,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer not running; the tick is stale.
    Ignored,
    Counting { remaining_secs: u32 },
    /// A focus interval reached zero and should be credited.
    SessionCompleted,
    BreakCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,
    #[error("timer is not running")]
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    status: TimerStatus,
    segment: TimerSegment,
    remaining_secs: u32,
    session_secs: u32,
    break_secs: u32,
    breaks_enabled: bool,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(FOCUS_SESSION_SECS, BREAK_SECS)
    }
}

impl FocusTimer {
    #[must_use]
    pub fn new(session_secs: u32, break_secs: u32) -> Self {
        let session_secs = session_secs.max(1);
        Self {
            status: TimerStatus::Idle,
            segment: TimerSegment::Focus,
            remaining_secs: session_secs,
            session_secs,
            break_secs: break_secs.max(1),
            breaks_enabled: false,
        }
    }

    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks_enabled = enabled;
        self
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn segment(&self) -> TimerSegment {
        self.segment
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Length of the segment currently loaded.
    pub fn total_secs(&self) -> u32 {
        match self.segment {
            TimerSegment::Focus => self.session_secs,
            TimerSegment::Break => self.break_secs,
        }
    }

    /// Starts from idle or resumes from pause.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.is_running() {
            return Err(TimerError::AlreadyRunning);
        }
        self.status = TimerStatus::Running;
        Ok(())
    }

    /// Stops ticking but keeps the remaining time.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        if !self.is_running() {
            return Err(TimerError::NotRunning);
        }
        self.status = TimerStatus::Paused;
        Ok(())
    }

    /// Start/pause button behaviour. Returns the status afterwards.
    pub fn toggle(&mut self) -> TimerStatus {
        if self.is_running() {
            self.status = TimerStatus::Paused;
        } else {
            self.status = TimerStatus::Running;
        }
        self.status
    }

    /// Discards progress: idle, focus segment, full duration.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.segment = TimerSegment::Focus;
        self.remaining_secs = self.session_secs;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TickOutcome::Counting {
                remaining_secs: self.remaining_secs,
            };
        }

        match self.segment {
            TimerSegment::Focus if self.breaks_enabled => {
                self.segment = TimerSegment::Break;
                self.remaining_secs = self.break_secs;
                TickOutcome::SessionCompleted
            }
            TimerSegment::Focus => {
                self.reset();
                TickOutcome::SessionCompleted
            }
            TimerSegment::Break => {
                self.reset();
                TickOutcome::BreakCompleted
            }
        }
    }

    /// `MM:SS` of the remaining time.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    /// Fraction of the segment still left, 1.0 at the start.
    pub fn progress(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.remaining_secs as f32 / self.total_secs() as f32;
        fraction.clamp(0.0, 1.0)
    }
}
