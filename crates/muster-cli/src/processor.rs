//! Frame Processor — one detect/match/record cycle per captured frame.
//!
//! Detection runs on a downscaled copy to bound per-frame cost; boxes are
//! mapped back to the full frame for annotation. Matching, dedup, ledger
//! writes and alerts all happen here; the controller only drives the loop.

use crate::ledger::Ledger;
use crate::session::SessionState;
use chrono::NaiveTime;
use muster_core::{FaceEngine, Roster};
use muster_hw::overlay::{self, ALERT_COLOR, MATCH_COLOR};
use muster_hw::Frame;

/// Process one frame in place, annotating it with match/alert boxes.
///
/// An engine failure is logged and treated as a frame with zero faces;
/// it never reaches the session loop.
#[allow(clippy::too_many_arguments)]
pub fn process_frame(
    frame: &mut Frame,
    engine: &mut dyn FaceEngine,
    roster: &Roster,
    state: &mut SessionState,
    ledger: &mut Ledger,
    alert: &dyn muster_hw::AlertSink,
    accept_threshold: f32,
    detect_downscale: u32,
    time_of_day: NaiveTime,
) {
    let small = frame.downscaled(detect_downscale);

    let faces = match engine.detect_and_embed(&small.data, small.width, small.height) {
        Ok(faces) => faces,
        Err(err) => {
            tracing::warn!(sequence = frame.sequence, error = %err, "detection failed, frame skipped");
            return;
        }
    };

    // Downscaling may have been skipped for tiny frames; use the real ratio.
    let factor = frame.width as f32 / small.width as f32;

    for face in &faces {
        let bbox = face.bbox.scaled(factor);
        let (x, y) = (bbox.x as i32, bbox.y as i32);
        let (w, h) = (bbox.width as i32, bbox.height as i32);

        match roster.best_match(&face.embedding, accept_threshold) {
            Some(matched) => {
                if state.mark(&matched.name) {
                    ledger.append(&matched.name, time_of_day);
                    tracing::info!(
                        name = %matched.name,
                        distance = matched.distance,
                        similarity = matched.similarity,
                        "marked present"
                    );
                }
                overlay::draw_face_box(frame, x, y, w, h, MATCH_COLOR);
            }
            None => {
                overlay::draw_rect(frame, x, y, w, h, ALERT_COLOR);
                tracing::warn!(
                    sequence = frame.sequence,
                    confidence = face.bbox.confidence,
                    "unrecognized face"
                );
                alert.fire();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use muster_core::engine::EngineError;
    use muster_core::{BoundingBox, DetectedFace, Embedding, Identity};
    use std::cell::Cell;
    use tempfile::TempDir;

    pub(crate) fn face(values: Vec<f32>) -> DetectedFace {
        DetectedFace {
            bbox: BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 20.0,
                height: 20.0,
                confidence: 0.9,
                landmarks: None,
            },
            embedding: Embedding::new(values),
        }
    }

    /// Engine fake returning a scripted list of faces per call;
    /// `None` entries simulate a detection failure.
    pub(crate) struct ScriptedEngine {
        pub responses: Vec<Option<Vec<DetectedFace>>>,
        pub calls: usize,
    }

    impl ScriptedEngine {
        pub fn new(responses: Vec<Option<Vec<DetectedFace>>>) -> Self {
            Self { responses, calls: 0 }
        }

        pub fn repeating(faces: Vec<DetectedFace>) -> Self {
            Self { responses: vec![Some(faces)], calls: 0 }
        }
    }

    impl FaceEngine for ScriptedEngine {
        fn detect_and_embed(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<DetectedFace>, EngineError> {
            let idx = self.calls.min(self.responses.len() - 1);
            self.calls += 1;
            match &self.responses[idx] {
                Some(faces) => Ok(faces.clone()),
                None => Err(EngineError::Detector(
                    muster_core::detector::DetectorError::InferenceFailed("scripted".into()),
                )),
            }
        }

        fn embed_only(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Option<Embedding>, EngineError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingAlert {
        pub fired: Cell<usize>,
    }

    impl muster_hw::AlertSink for CountingAlert {
        fn fire(&self) {
            self.fired.set(self.fired.get() + 1);
        }
    }

    pub(crate) fn blank_frame() -> Frame {
        Frame {
            data: vec![0u8; 64 * 64 * 3],
            width: 64,
            height: 64,
            timestamp: std::time::Instant::now(),
            sequence: 1,
        }
    }

    fn alice_roster() -> Roster {
        Roster::new(vec![Identity {
            name: "ALICE".into(),
            embedding: Embedding::new(vec![1.0, 0.0, 0.0]),
        }])
    }

    fn setup(dir: &TempDir) -> (SessionState, Ledger) {
        let date = "2024-03-01".parse().unwrap();
        (SessionState::new(date), Ledger::create(dir.path(), date))
    }

    fn ledger_lines(ledger: &Ledger) -> Vec<String> {
        std::fs::read_to_string(ledger.path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_first_match_writes_one_record() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::repeating(vec![face(vec![0.99, 0.01, 0.0])]);

        let mut frame = blank_frame();
        process_frame(
            &mut frame, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:00".parse().unwrap(),
        );

        let lines = ledger_lines(&ledger);
        assert_eq!(lines, vec!["Name,Time", "ALICE,09:00:00"]);
        assert!(state.is_marked("ALICE"));
        assert_eq!(alert.fired.get(), 0);
    }

    #[test]
    fn test_repeat_sighting_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::repeating(vec![face(vec![1.0, 0.0, 0.0])]);

        for _ in 0..3 {
            let mut frame = blank_frame();
            process_frame(
                &mut frame, &mut engine, &roster, &mut state, &mut ledger,
                &alert, 0.4, 4, "09:00:00".parse().unwrap(),
            );
        }

        assert_eq!(ledger_lines(&ledger).len(), 2); // header + one record
        assert_eq!(state.marked_count(), 1);
    }

    #[test]
    fn test_repeat_sighting_still_draws_match_box() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::repeating(vec![face(vec![1.0, 0.0, 0.0])]);

        let mut first = blank_frame();
        process_frame(
            &mut first, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:00".parse().unwrap(),
        );

        let mut second = blank_frame();
        process_frame(
            &mut second, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:05".parse().unwrap(),
        );
        // Annotation happens whether or not this was the first sighting.
        assert!(second.data.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_unmatched_face_alerts_once_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        // Orthogonal to ALICE: nearest identity fails acceptance.
        let mut engine = ScriptedEngine::repeating(vec![face(vec![0.0, 1.0, 0.0])]);

        let mut frame = blank_frame();
        process_frame(
            &mut frame, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:00".parse().unwrap(),
        );

        assert_eq!(alert.fired.get(), 1);
        assert_eq!(ledger_lines(&ledger), vec!["Name,Time"]);
        assert_eq!(state.marked_count(), 0);
    }

    #[test]
    fn test_empty_roster_alerts_per_detected_face() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = Roster::default();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::repeating(vec![
            face(vec![1.0, 0.0, 0.0]),
            face(vec![0.0, 1.0, 0.0]),
        ]);

        let mut frame = blank_frame();
        process_frame(
            &mut frame, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:00".parse().unwrap(),
        );

        assert_eq!(alert.fired.get(), 2);
        assert_eq!(ledger_lines(&ledger), vec!["Name,Time"]);
    }

    #[test]
    fn test_engine_failure_skips_frame() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::new(vec![None]);

        let mut frame = blank_frame();
        process_frame(
            &mut frame, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "09:00:00".parse().unwrap(),
        );

        assert_eq!(alert.fired.get(), 0);
        assert_eq!(ledger_lines(&ledger), vec!["Name,Time"]);
        assert_eq!(state.marked_count(), 0);
    }

    #[test]
    fn test_mixed_frame_marks_and_alerts_independently() {
        let dir = TempDir::new().unwrap();
        let (mut state, mut ledger) = setup(&dir);
        let roster = alice_roster();
        let alert = CountingAlert::default();
        let mut engine = ScriptedEngine::repeating(vec![
            face(vec![1.0, 0.0, 0.0]),  // ALICE
            face(vec![0.0, 0.0, 1.0]),  // stranger
        ]);

        let mut frame = blank_frame();
        process_frame(
            &mut frame, &mut engine, &roster, &mut state, &mut ledger,
            &alert, 0.4, 4, "10:30:00".parse().unwrap(),
        );

        assert_eq!(ledger_lines(&ledger), vec!["Name,Time", "ALICE,10:30:00"]);
        assert_eq!(alert.fired.get(), 1);
    }
}
