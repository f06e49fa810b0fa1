//! Decoder
//!
//! The dual of the structural encoder. Two front ends share one decode loop:
//!
//! - `Cursor`: pull style, one `step()` per event, also an `Iterator`
//! - `replay`: push style, drives an `InfosetSink` to completion

pub mod collector;
pub mod cursor;
pub mod event;
pub mod sink;

pub use collector::{collect, EventCollector};
pub use cursor::{Cursor, ReplayMode};
pub use event::{CharData, Event};
pub use sink::{replay, replay_document, replay_fragment, InfosetSink};
