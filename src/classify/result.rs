/// Number of classes in the trail classifier head.
pub const CLASS_COUNT: usize = 6;

/// Per-frame classifier output: six non-negative scores over two disjoint
/// 3-way heads.
///
/// Indices 0..3 are the orientation head `[left, center, right]`, indices
/// 3..6 the lateral-position head `[left, center, right]`. Scores need not
/// sum to one; normalization is the control layer's job.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassProbabilities(pub [f32; CLASS_COUNT]);

impl ClassProbabilities {
    /// Orientation triple `[left, center, right]`.
    pub fn rotation(&self) -> [f32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Lateral-position triple `[left, center, right]`.
    pub fn lateral(&self) -> [f32; 3] {
        [self.0[3], self.0[4], self.0[5]]
    }
}
