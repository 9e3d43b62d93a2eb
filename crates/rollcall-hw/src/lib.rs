//! rollcall-hw — camera capture for the attendance gate.
//!
//! The capture device is an external collaborator: this crate owns opening
//! it, negotiating a pixel format, and yielding grayscale frames on demand.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, CaptureSource};
pub use frame::Frame;
