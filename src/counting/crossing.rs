use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::{TrackId, TrackUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Moved downward across the line (smaller y to larger y).
    Enter,
    /// Moved upward across the line.
    Exit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("ENTER"),
            Self::Exit => f.write_str("EXIT"),
        }
    }
}

/// One qualifying midline transition. Never revised after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub track_id: TrackId,
    pub frame_id: u64,
}

/// Cumulative counts for a session. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub entered: u64,
    pub exited: u64,
}

impl CounterState {
    /// Entered minus exited, saturating at zero.
    pub fn occupancy(&self) -> u64 {
        self.entered.saturating_sub(self.exited)
    }
}

#[derive(Debug, Clone)]
pub struct CrossingCounter {
    midline: f32,
    state: CounterState,
}

impl CrossingCounter {
    pub fn new(midline: f32) -> Self {
        Self {
            midline,
            state: CounterState::default(),
        }
    }

    /// Decide whether a move from `prev_y` to `curr_y` crosses the line.
    ///
    /// A previous value exactly on the line matches neither branch, so a
    /// track resting on the line never fires when it leaves it.
    pub fn classify(&self, prev_y: f32, curr_y: f32) -> Option<Direction> {
        if prev_y < self.midline && curr_y >= self.midline {
            Some(Direction::Enter)
        } else if prev_y > self.midline && curr_y <= self.midline {
            Some(Direction::Exit)
        } else {
            None
        }
    }

    /// Evaluate one track update, bumping the matching counter on a crossing.
    pub fn evaluate(
        &mut self,
        update: &TrackUpdate,
        timestamp: DateTime<Utc>,
        frame_id: u64,
    ) -> Option<CrossingEvent> {
        let prev = update.previous?;
        let direction = self.classify(prev.y, update.current.y)?;

        match direction {
            Direction::Enter => self.state.entered += 1,
            Direction::Exit => self.state.exited += 1,
        }
        tracing::info!(
            track = %update.track_id,
            %direction,
            entered = self.state.entered,
            exited = self.state.exited,
            "midline crossed"
        );

        Some(CrossingEvent {
            timestamp,
            direction,
            track_id: update.track_id,
            frame_id,
        })
    }

    /// Evaluate every update of a frame; each crossing track yields its own event.
    pub fn evaluate_frame(
        &mut self,
        updates: &[TrackUpdate],
        timestamp: DateTime<Utc>,
        frame_id: u64,
    ) -> Vec<CrossingEvent> {
        updates
            .iter()
            .filter_map(|u| self.evaluate(u, timestamp, frame_id))
            .collect()
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn midline(&self) -> f32 {
        self.midline
    }
}

impl Default for CrossingCounter {
    fn default() -> Self {
        Self::new(0.5)
    }
}
