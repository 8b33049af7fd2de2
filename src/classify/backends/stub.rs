use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::classify::backend::ClassifierBackend;
use crate::classify::result::{ClassProbabilities, CLASS_COUNT};
use crate::frame::RgbaFrame;

/// Stub classifier for testing. Derives deterministic scores from a hash
/// of the pixels and the frame ordinal, biased toward the center classes
/// so the synthetic vehicle mostly drives straight with small wobbles.
pub struct StubClassifier {
    frame_count: u64,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBackend for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(&mut self, frame: &RgbaFrame) -> Result<ClassProbabilities> {
        self.frame_count += 1;

        let mut hasher = Sha256::new();
        hasher.update(frame.pixels());
        hasher.update(self.frame_count.to_le_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let mut scores = [0.0f32; CLASS_COUNT];
        for (i, score) in scores.iter_mut().enumerate() {
            *score = digest[i] as f32 / 255.0;
        }
        // Center classes dominate so the command stays near straight.
        scores[1] += 2.0;
        scores[4] += 2.0;

        Ok(ClassProbabilities(scores))
    }
}
