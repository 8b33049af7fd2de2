//! Steering control law.
//!
//! Turns one frame's class probabilities into a steering command:
//!
//! 1. `normalize`: validate the raw 6-class vector and split it into two
//!    independent left/right probability distributions (rotation, lateral).
//! 2. `steering`: map the distributions to an instantaneous target turn
//!    angle, clamped to a hard safety bound.
//! 3. `filter`: blend the target into the cross-frame `SteeringState` with
//!    a single-pole exponential filter.
//! 4. `command`: project the filtered angle onto the unit circle as a
//!    `(linear, angular)` joystick-style command.
//!
//! Steps 1, 2 and 4 are pure; the filter is the only mutation point in the
//! whole pipeline.

mod command;
mod filter;
mod normalize;
mod steering;

pub use command::ControlCommand;
pub use filter::SteeringState;
pub use normalize::{normalize, CueDistributions, NormalizedDistribution, DEGENERATE_SUM};
pub use steering::{target_angle_rad, MAX_TURN_ANGLE_DEG};

/// Control-law parameters, fixed at startup.
#[derive(Clone, Copy, Debug)]
pub struct ControlConfig {
    /// Per-class rotation weight in degrees.
    pub turn_angle_deg: f32,
    /// Per-class lateral-correction weight in degrees.
    pub lateral_corr_angle_deg: f32,
    /// Exponential filter blend factor in [0, 1]. 1 tracks new input
    /// instantly; 0 freezes the filter.
    pub innovation_coeff: f32,
    /// 6 when lateral cues are available this run, 3 when only the
    /// rotation head is active.
    pub active_class_count: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            turn_angle_deg: 10.0,
            lateral_corr_angle_deg: 10.0,
            innovation_coeff: 1.0,
            active_class_count: 6,
        }
    }
}
