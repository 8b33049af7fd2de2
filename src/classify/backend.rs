use anyhow::Result;

use crate::classify::result::ClassProbabilities;
use crate::frame::RgbaFrame;

/// Classifier backend trait.
///
/// The pipeline treats inference as an opaque, possibly-failing synchronous
/// call. Implementations must treat the frame as read-only and ephemeral:
/// an inference failure aborts only the current iteration's control update,
/// so backends must not leave partial state behind that would corrupt the
/// next call.
pub trait ClassifierBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run the classifier over one RGBA frame and return the 6-class
    /// probability vector.
    fn infer(&mut self, frame: &RgbaFrame) -> Result<ClassProbabilities>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
