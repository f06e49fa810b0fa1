//! Parallel Replay
//!
//! Uses Rayon to decode many views at once. Buffers and marks are `Sync`
//! and each task owns its own cursor, so no coordination is needed.

use rayon::prelude::*;

use crate::decoder::{collect, replay, Event, InfosetSink, ReplayMode};
use crate::error::{DecodeError, ReplayError};
use crate::view::InfosetView;

/// Collect the events of every view in parallel
pub fn collect_parallel<V: InfosetView + Sync>(
    views: &[V],
    mode: ReplayMode,
) -> Vec<Result<Vec<Event>, DecodeError>> {
    views.par_iter().map(|view| collect(view, mode)).collect()
}

/// Replay every view into its own sink and return the sinks
pub fn replay_map<V, S, F>(
    views: &[V],
    mode: ReplayMode,
    make_sink: F,
) -> Vec<Result<S, ReplayError<S::Error>>>
where
    V: InfosetView + Sync,
    S: InfosetSink + Send,
    S::Error: Send,
    F: Fn() -> S + Sync + Send,
{
    views
        .par_iter()
        .map(|view| {
            let mut sink = make_sink();
            replay(view, &mut sink, mode).map(|()| sink)
        })
        .collect()
}
