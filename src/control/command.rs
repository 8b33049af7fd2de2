/// Joystick-style control output.
///
/// The pair always lies exactly on the unit circle: `linear = cos(angle)`,
/// `angular = sin(angle)`. This mimics maximum-deflection joystick values
/// and is load-bearing for downstream actuator calibration; do not flatten
/// it to a linear range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlCommand {
    /// Forward component, positive ahead, in [-1, 1].
    pub linear: f32,
    /// Turn component, positive left, in [-1, 1].
    pub angular: f32,
}

impl ControlCommand {
    /// Project a filtered turn angle onto the unit circle.
    pub fn from_angle_rad(angle_rad: f32) -> Self {
        Self {
            linear: angle_rad.cos(),
            angular: angle_rad.sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_ahead_is_full_linear() {
        let command = ControlCommand::from_angle_rad(0.0);
        assert!((command.linear - 1.0).abs() < 1e-6);
        assert!(command.angular.abs() < 1e-6);
    }

    #[test]
    fn command_lies_on_the_unit_circle() {
        for step in -18..=18 {
            let angle = (step as f32 * 5.0).to_radians();
            let command = ControlCommand::from_angle_rad(angle);
            let norm = command.linear * command.linear + command.angular * command.angular;
            assert!((norm - 1.0).abs() < 1e-5, "angle {} off circle", angle);
        }
    }

    #[test]
    fn ten_degrees_matches_reference_values() {
        let command = ControlCommand::from_angle_rad(10.0_f32.to_radians());
        assert!((command.linear - 0.9848).abs() < 1e-3);
        assert!((command.angular - 0.1736).abs() < 1e-3);
    }
}
