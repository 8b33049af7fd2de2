//! Camera capability.
//!
//! Frame acquisition and color-space conversion:
//! - `v4l2`: local V4L2 devices (feature: ingest-v4l2) with a synthetic
//!   `stub://` fallback that is always available
//! - `convert`: device pixel formats to the RGBA8 the classifier accepts
//!
//! Capture and conversion failures are per-frame and non-fatal; the frame
//! loop logs them and retries with a fresh capture.

pub mod convert;
pub mod v4l2;

pub use v4l2::{CameraConfig, CameraSource, CameraStats};
