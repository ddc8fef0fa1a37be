//! muster-hw — Hardware abstraction for camera capture, frame pixel
//! operations, overlay drawing and the audio alert.

pub mod alert;
pub mod camera;
pub mod frame;
pub mod overlay;

pub use alert::{AlertSink, Beeper};
pub use camera::{Camera, CameraError, FrameSource};
pub use frame::Frame;
