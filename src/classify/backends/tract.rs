#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::backend::ClassifierBackend;
use crate::classify::result::{ClassProbabilities, CLASS_COUNT};
use crate::frame::RgbaFrame;

/// Tract-based classifier for ONNX trail models.
///
/// Loads a local model file and runs it over RGBA frames. The model is
/// expected to take a `1x3xHxW` float input and produce at least
/// `CLASS_COUNT` output scores.
pub struct TractClassifier {
    model: TypedSimplePlan<TypedModel>,
    width: u32,
    height: u32,
}

impl TractClassifier {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
        })
    }

    fn build_input(&self, frame: &RgbaFrame) -> Result<Tensor> {
        if frame.width != self.width || frame.height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                frame.width,
                frame.height,
                self.width,
                self.height
            ));
        }

        let width = frame.width as usize;
        let height = frame.height as usize;
        let channels = frame.channels() as usize;
        let pixels = frame.pixels();

        // RGBA interleaved to NCHW floats; alpha is dropped.
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, height, width), |(_, channel, y, x)| {
                let idx = (y * width + x) * channels + channel;
                pixels[idx] as f32 / 255.0
            });

        Ok(input.into_tensor())
    }

    fn extract_probabilities(&self, outputs: TVec<TValue>) -> Result<ClassProbabilities> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let mut probs = [0.0f32; CLASS_COUNT];
        let mut taken = 0;
        for (slot, score) in probs.iter_mut().zip(scores.iter()) {
            *slot = score.max(0.0);
            taken += 1;
        }
        if taken < CLASS_COUNT {
            return Err(anyhow!(
                "model produced {} scores, expected at least {}",
                taken,
                CLASS_COUNT
            ));
        }

        Ok(ClassProbabilities(probs))
    }
}

impl ClassifierBackend for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn infer(&mut self, frame: &RgbaFrame) -> Result<ClassProbabilities> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_probabilities(outputs)
    }
}
