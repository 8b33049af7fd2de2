//! Classifier capability.
//!
//! The pipeline is agnostic to the classifier's internals; it sees a
//! [`ClassifierBackend`] that turns an RGBA frame into a fixed 6-class
//! probability vector, or fails for this frame only.
//!
//! Backends:
//! - `stub`: deterministic hash-driven scores (always available, testing)
//! - `tract`: ONNX inference via tract (feature: backend-tract)

mod backend;
mod backends;
mod result;

use anyhow::Result;

pub use backend::ClassifierBackend;
pub use backends::StubClassifier;
#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
pub use result::{ClassProbabilities, CLASS_COUNT};

use crate::config::ClassifierSettings;

/// Construct the classifier backend named by the configuration.
pub fn create_backend(settings: &ClassifierSettings) -> Result<Box<dyn ClassifierBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubClassifier::new())),
        "tract" => {
            #[cfg(feature = "backend-tract")]
            {
                let model_path = settings
                    .model_path
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("tract backend requires a model path"))?;
                Ok(Box::new(TractClassifier::new(
                    model_path,
                    settings.input_width,
                    settings.input_height,
                )?))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                anyhow::bail!("the tract backend requires the backend-tract feature")
            }
        }
        other => anyhow::bail!("unknown classifier backend '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierSettings;

    #[test]
    fn factory_builds_the_stub_backend() {
        let settings = ClassifierSettings {
            backend: "stub".to_string(),
            ..ClassifierSettings::default()
        };
        let backend = create_backend(&settings).expect("stub backend");
        assert_eq!(backend.name(), "stub");
    }

    #[test]
    fn factory_rejects_unknown_backends() {
        let settings = ClassifierSettings {
            backend: "cuda".to_string(),
            ..ClassifierSettings::default()
        };
        assert!(create_backend(&settings).is_err());
    }
}
