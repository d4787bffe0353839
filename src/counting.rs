//! Midline crossing decisions and cumulative counters.

mod crossing;

pub use crossing::{CounterState, CrossingCounter, CrossingEvent, Direction};
