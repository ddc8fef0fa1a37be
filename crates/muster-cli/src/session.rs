//! Session State and the Session Controller loop.
//!
//! The controller owns the capture source and the active ledger for the
//! lifetime of the run. Each iteration: rollover check, one frame read,
//! one processing pass, present, stop check. Only a capture failure or
//! the stop flag ends the loop.

use crate::display::FrameSink;
use crate::ledger::Ledger;
use crate::processor::process_frame;
use chrono::{NaiveDate, NaiveDateTime};
use muster_core::{FaceEngine, Roster};
use muster_hw::{AlertSink, FrameSource};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// The active calendar day and the identities already marked present today.
pub struct SessionState {
    current_date: NaiveDate,
    marked: HashSet<String>,
}

impl SessionState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current_date: today,
            marked: HashSet::new(),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn is_marked(&self, name: &str) -> bool {
        self.marked.contains(name)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Record a sighting; returns true only for the first sighting today.
    pub fn mark(&mut self, name: &str) -> bool {
        self.marked.insert(name.to_string())
    }

    /// If `today` differs from the tracked day, start a fresh day: update
    /// the date, clear the dedup set, and return true so the caller can
    /// create the new ledger.
    pub fn rollover(&mut self, today: NaiveDate) -> bool {
        if today == self.current_date {
            return false;
        }
        tracing::info!(
            from = %self.current_date,
            to = %today,
            marked = self.marked.len(),
            "day rollover"
        );
        self.current_date = today;
        self.marked.clear();
        true
    }
}

/// Why the session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The external stop signal was observed.
    StopRequested,
    /// The capture device failed mid-loop.
    CaptureFailed,
}

/// Knobs the controller passes through to the frame processor.
pub struct SessionConfig {
    pub ledger_dir: PathBuf,
    pub accept_threshold: f32,
    pub detect_downscale: u32,
}

/// Run the attendance session until a stop signal or a capture failure.
///
/// The rollover check runs once per iteration, before the frame read, so
/// the dedup set never spans two calendar days and no record lands in a
/// stale ledger.
#[allow(clippy::too_many_arguments)]
pub fn run_session(
    source: &mut dyn FrameSource,
    engine: &mut dyn FaceEngine,
    roster: &Roster,
    alert: &dyn AlertSink,
    sink: &mut dyn FrameSink,
    cfg: &SessionConfig,
    stop: &AtomicBool,
    clock: &mut dyn FnMut() -> NaiveDateTime,
) -> SessionEnd {
    let start = clock();
    let mut state = SessionState::new(start.date());
    let mut ledger = Ledger::create(&cfg.ledger_dir, start.date());

    tracing::info!(
        date = %state.current_date(),
        roster = roster.len(),
        threshold = cfg.accept_threshold,
        "attendance session running"
    );

    loop {
        let today = clock().date();
        if state.rollover(today) {
            ledger = Ledger::create(&cfg.ledger_dir, today);
        }

        let mut frame = match source.read() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(error = %err, "frame capture failed, terminating session");
                return SessionEnd::CaptureFailed;
            }
        };

        // Records carry the sighting time: the clock is sampled again
        // after the blocking read, not reused from the rollover check.
        let now = clock();

        process_frame(
            &mut frame,
            engine,
            roster,
            &mut state,
            &mut ledger,
            alert,
            cfg.accept_threshold,
            cfg.detect_downscale,
            now.time(),
        );

        sink.present(&frame);

        if stop.load(Ordering::SeqCst) {
            tracing::info!(marked = state.marked_count(), "stop requested, terminating session");
            return SessionEnd::StopRequested;
        }
    }
}
