/// Cross-frame steering state: the output of the exponential filter.
///
/// This is the only state in the pipeline with a lifetime beyond one frame.
/// It is owned by the frame loop and mutated exclusively through
/// [`SteeringState::integrate`], once per accepted frame, in frame-arrival
/// order. A concurrent redesign must keep that single-writer discipline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringState {
    filtered_angle_rad: f32,
}

impl SteeringState {
    /// Fresh state, pointing straight ahead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current filtered turn angle in radians.
    pub fn filtered_angle_rad(&self) -> f32 {
        self.filtered_angle_rad
    }

    /// Blend a new target angle into the state and return the filtered
    /// angle.
    ///
    /// `filtered' = filtered * (1 - k) + target * k` with
    /// `k = innovation_coeff`. `k = 1` tracks the target instantly; `k = 0`
    /// ignores new input entirely. The blend is convex, so the result never
    /// exceeds the larger magnitude of the previous state and the target.
    pub fn integrate(&mut self, target_angle_rad: f32, innovation_coeff: f32) -> f32 {
        let k = innovation_coeff;
        self.filtered_angle_rad = self.filtered_angle_rad * (1.0 - k) + target_angle_rad * k;
        self.filtered_angle_rad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_innovation_tracks_instantly() {
        let mut state = SteeringState::new();
        let filtered = state.integrate(0.5, 1.0);
        assert!((filtered - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_innovation_freezes_the_state() {
        let mut state = SteeringState::new();
        state.integrate(0.3, 1.0);
        for _ in 0..10 {
            state.integrate(-1.2, 0.0);
        }
        assert!((state.filtered_angle_rad() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn converges_to_a_constant_target() {
        let mut state = SteeringState::new();
        let target = 0.8;
        for _ in 0..60 {
            state.integrate(target, 0.2);
        }
        assert!((state.filtered_angle_rad() - target).abs() < 1e-4);
    }

    #[test]
    fn convergence_is_monotone() {
        let mut state = SteeringState::new();
        let target = 1.0;
        let mut previous = state.filtered_angle_rad();
        for _ in 0..30 {
            let current = state.integrate(target, 0.3);
            assert!(current >= previous);
            assert!(current <= target);
            previous = current;
        }
    }

    #[test]
    fn blend_stays_within_input_bounds() {
        let mut state = SteeringState::new();
        state.integrate(0.6, 1.0);
        let filtered = state.integrate(-0.2, 0.5);
        assert!(filtered <= 0.6 && filtered >= -0.2);
    }
}
