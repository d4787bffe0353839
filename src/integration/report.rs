//! Tabular export of persisted crossing history.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::counting::{CounterState, CrossingEvent, Direction};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

/// Rows ordered by timestamp. Input order is kept for equal timestamps.
pub fn rows(events: &[CrossingEvent]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = events
        .iter()
        .map(|e| ReportRow {
            timestamp: e.timestamp,
            direction: e.direction,
        })
        .collect();
    rows.sort_by_key(|r| r.timestamp);
    rows
}

/// Totals over a history, as the live counters would report them.
pub fn totals(events: &[CrossingEvent]) -> CounterState {
    events.iter().fold(CounterState::default(), |mut acc, e| {
        match e.direction {
            Direction::Enter => acc.entered += 1,
            Direction::Exit => acc.exited += 1,
        }
        acc
    })
}

/// Render a two-column (timestamp, direction) plain-text table.
pub fn render_table(events: &[CrossingEvent]) -> String {
    let rows = rows(events);
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{:<19} | {}", "Timestamp", "Direction");
    let _ = writeln!(out, "{}-+-{}", "-".repeat(19), "-".repeat(9));
    for row in &rows {
        let _ = writeln!(
            out,
            "{:<19} | {}",
            row.timestamp.format(TIMESTAMP_FORMAT),
            row.direction
        );
    }
    out
}
