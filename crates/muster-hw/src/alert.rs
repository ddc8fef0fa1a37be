//! Audio alert for unmatched faces.
//!
//! A fixed-frequency tone played fire-and-forget; audio failures are
//! logged and never reach the session loop.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;

const ALERT_FREQUENCY_HZ: f32 = 2500.0;
const ALERT_DURATION_MS: u64 = 2000;
const ALERT_AMPLITUDE: f32 = 0.20;

/// One-shot alert notification.
pub trait AlertSink {
    /// Raise the alert. Must never block the caller for the tone duration
    /// and must never fail the caller.
    fn fire(&self);
}

/// Sine-tone alert over the default audio output.
///
/// If no output device is available at construction, `fire` degrades to a
/// log line.
pub struct Beeper {
    // The stream must outlive every detached sink playing on it.
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl Beeper {
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => Self {
                output: Some((stream, handle)),
            },
            Err(err) => {
                tracing::warn!(error = %err, "no audio output device; alerts will be log-only");
                Self { output: None }
            }
        }
    }
}

impl Default for Beeper {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for Beeper {
    fn fire(&self) {
        let Some((_, handle)) = &self.output else {
            tracing::warn!("alert: unmatched face (audio unavailable)");
            return;
        };

        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(
                    SineWave::new(ALERT_FREQUENCY_HZ)
                        .take_duration(Duration::from_millis(ALERT_DURATION_MS))
                        .amplify(ALERT_AMPLITUDE),
                );
                // Let the tone play out in the audio thread.
                sink.detach();
                tracing::info!(
                    frequency_hz = ALERT_FREQUENCY_HZ,
                    duration_ms = ALERT_DURATION_MS,
                    "alert tone fired"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to play alert tone");
            }
        }
    }
}
