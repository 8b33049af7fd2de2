use super::normalize::CueDistributions;
use super::ControlConfig;

/// Hard safety bound on the instantaneous turn angle, in degrees.
///
/// Guards against pathological classifier outputs; not a tuning parameter.
pub const MAX_TURN_ANGLE_DEG: f32 = 90.0;

/// Map normalized cue distributions to an instantaneous target turn angle
/// in radians.
///
/// Positive angle turns left, negative turns right, zero goes straight.
/// The weighted difference is clamped to `[-MAX_TURN_ANGLE_DEG,
/// MAX_TURN_ANGLE_DEG]` in degrees before the radian conversion.
pub fn target_angle_rad(cues: &CueDistributions, config: &ControlConfig) -> f32 {
    let raw_deg = config.turn_angle_deg * (cues.rotation.right_p - cues.rotation.left_p)
        + config.lateral_corr_angle_deg * (cues.lateral.right_p - cues.lateral.left_p);
    raw_deg
        .clamp(-MAX_TURN_ANGLE_DEG, MAX_TURN_ANGLE_DEG)
        .to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::NormalizedDistribution;

    fn cues(rot: (f32, f32), lat: (f32, f32)) -> CueDistributions {
        CueDistributions {
            rotation: NormalizedDistribution {
                left_p: rot.0,
                right_p: rot.1,
            },
            lateral: NormalizedDistribution {
                left_p: lat.0,
                right_p: lat.1,
            },
        }
    }

    #[test]
    fn opposing_cues_cancel_out() {
        let config = ControlConfig::default();
        let angle = target_angle_rad(&cues((1.0, 0.0), (0.0, 1.0)), &config);
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn right_view_cue_turns_by_configured_weight() {
        let config = ControlConfig::default();
        let angle = target_angle_rad(&cues((0.0, 1.0), (0.0, 0.0)), &config);
        assert!((angle - 10.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn swapping_left_and_right_negates_the_angle() {
        let config = ControlConfig {
            turn_angle_deg: 7.0,
            lateral_corr_angle_deg: 3.0,
            ..ControlConfig::default()
        };
        let forward = target_angle_rad(&cues((0.2, 0.7), (0.1, 0.4)), &config);
        let mirrored = target_angle_rad(&cues((0.7, 0.2), (0.4, 0.1)), &config);
        assert!((forward + mirrored).abs() < 1e-6);
    }

    #[test]
    fn monotone_in_rotation_difference() {
        let config = ControlConfig::default();
        let lat = (0.3, 0.3);
        let mut previous = f32::NEG_INFINITY;
        for step in 0..=10 {
            let right_p = step as f32 / 10.0;
            let angle = target_angle_rad(&cues((1.0 - right_p, right_p), lat), &config);
            assert!(angle >= previous);
            previous = angle;
        }
    }

    #[test]
    fn clamps_pathological_weights_to_ninety_degrees() {
        let config = ControlConfig {
            turn_angle_deg: 500.0,
            lateral_corr_angle_deg: 500.0,
            ..ControlConfig::default()
        };
        let angle = target_angle_rad(&cues((0.0, 1.0), (0.0, 1.0)), &config);
        assert!((angle - 90.0_f32.to_radians()).abs() < 1e-6);

        let angle = target_angle_rad(&cues((1.0, 0.0), (1.0, 0.0)), &config);
        assert!((angle + 90.0_f32.to_radians()).abs() < 1e-6);
    }
}
