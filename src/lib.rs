//! trailsteer
//!
//! A perception-to-control pipeline for a camera-equipped mobile platform:
//! capture a frame, classify it, steer, render diagnostics, repeat.
//!
//! # Architecture
//!
//! Data flow is strictly linear per iteration:
//!
//! camera -> color conversion -> classifier -> normalize -> steering law
//! -> temporal filter -> command mapper -> display
//!
//! The temporal filter's [`control::SteeringState`] is the only state that
//! crosses iterations; everything else is per-frame and transient. A failed
//! stage skips the rest of the iteration and leaves the previous command in
//! force, so a single bad frame never stops the loop or jerks the vehicle.
//!
//! # Module Structure
//!
//! - `camera`: frame acquisition (V4L2 or synthetic) and RGBA conversion
//! - `classify`: classifier backends behind the [`ClassifierBackend`] trait
//! - `control`: normalization, steering law, temporal filter, command mapper
//! - `display`: optional diagnostic rendering
//! - `pilot`: the frame loop state machine tying it all together
//! - `config`: JSON + environment configuration for the daemon

pub mod camera;
pub mod classify;
pub mod config;
pub mod control;
pub mod display;
pub mod frame;
pub mod pilot;

pub use camera::{convert, CameraConfig, CameraSource, CameraStats};
pub use classify::{
    create_backend, ClassProbabilities, ClassifierBackend, StubClassifier, CLASS_COUNT,
};
#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
pub use config::{CameraSettings, ClassifierSettings, DisplaySettings, PilotConfig};
pub use control::{
    normalize, target_angle_rad, ControlCommand, ControlConfig, CueDistributions,
    NormalizedDistribution, SteeringState, DEGENERATE_SUM, MAX_TURN_ANGLE_DEG,
};
pub use display::{ConsoleDisplay, DisplayMode, DisplaySink};
pub use frame::{PixelFormat, RawFrame, RgbaFrame, RGBA_CHANNELS};
pub use pilot::{LoopPhase, Pilot, StepOutcome};
