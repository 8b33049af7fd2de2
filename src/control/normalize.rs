use crate::classify::ClassProbabilities;

/// Triple sums below this are treated as "no signal" rather than divided by.
pub const DEGENERATE_SUM: f32 = 1e-6;

/// Left/right probability mass of one 3-way head, center mass excluded.
///
/// Both components are in [0, 1] and `left_p + right_p <= 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedDistribution {
    pub left_p: f32,
    pub right_p: f32,
}

impl NormalizedDistribution {
    /// No contribution from this head.
    pub const NEUTRAL: Self = Self {
        left_p: 0.0,
        right_p: 0.0,
    };

    fn from_triple(triple: [f32; 3]) -> Option<Self> {
        let sum = triple[0] + triple[1] + triple[2];
        if sum < DEGENERATE_SUM {
            return None;
        }
        Some(Self {
            left_p: triple[0] / sum,
            right_p: triple[2] / sum,
        })
    }
}

/// Both heads of one frame, normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CueDistributions {
    pub rotation: NormalizedDistribution,
    pub lateral: NormalizedDistribution,
}

/// Validate and normalize one frame's class probabilities.
///
/// Each triple is normalized independently. Returns `None` when a required
/// triple is degenerate (sum below `DEGENERATE_SUM`); the caller must then
/// skip this frame's control update entirely.
///
/// With `active_class_count == 3` the lateral head is not trusted and its
/// distribution is forced to neutral regardless of the raw values.
pub fn normalize(probs: &ClassProbabilities, active_class_count: u8) -> Option<CueDistributions> {
    let rotation = NormalizedDistribution::from_triple(probs.rotation())?;
    let lateral = if active_class_count == 6 {
        NormalizedDistribution::from_triple(probs.lateral())?
    } else {
        NormalizedDistribution::NEUTRAL
    };
    Some(CueDistributions { rotation, lateral })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_each_triple_independently() {
        let probs = ClassProbabilities([2.0, 1.0, 1.0, 0.0, 3.0, 1.0]);
        let cues = normalize(&probs, 6).expect("valid vector");

        assert!((cues.rotation.left_p - 0.5).abs() < 1e-6);
        assert!((cues.rotation.right_p - 0.25).abs() < 1e-6);
        assert!((cues.lateral.left_p - 0.0).abs() < 1e-6);
        assert!((cues.lateral.right_p - 0.25).abs() < 1e-6);
    }

    #[test]
    fn components_stay_within_unit_interval() {
        let probs = ClassProbabilities([0.1, 0.0, 0.9, 5.0, 0.0, 0.0]);
        let cues = normalize(&probs, 6).expect("valid vector");

        for dist in [cues.rotation, cues.lateral] {
            assert!((0.0..=1.0).contains(&dist.left_p));
            assert!((0.0..=1.0).contains(&dist.right_p));
            assert!(dist.left_p + dist.right_p <= 1.0 + 1e-6);
        }
    }

    #[test]
    fn degenerate_rotation_triple_yields_skip() {
        let probs = ClassProbabilities([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert!(normalize(&probs, 6).is_none());
    }

    #[test]
    fn degenerate_lateral_triple_yields_skip_when_active() {
        let probs = ClassProbabilities([1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(normalize(&probs, 6).is_none());
    }

    #[test]
    fn three_class_mode_neutralizes_lateral() {
        // Lateral values are garbage on purpose; with 3 active classes they
        // must not contribute, degenerate or not.
        let probs = ClassProbabilities([1.0, 1.0, 1.0, 9.0, 0.0, 0.0]);
        let cues = normalize(&probs, 3).expect("rotation is valid");
        assert_eq!(cues.lateral, NormalizedDistribution::NEUTRAL);

        let degenerate_lateral = ClassProbabilities([1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        let cues = normalize(&degenerate_lateral, 3).expect("rotation is valid");
        assert_eq!(cues.lateral, NormalizedDistribution::NEUTRAL);
    }

    #[test]
    fn sum_just_above_threshold_normalizes() {
        let probs = ClassProbabilities([2e-6, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let cues = normalize(&probs, 6).expect("above threshold");
        assert!((cues.rotation.left_p - 1.0).abs() < 1e-6);
    }
}
