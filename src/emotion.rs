// Emotion classification module for ONNX model inference

use crate::error::{EmotionDetectorError, Result};
use crate::models::{EmotionResult, EmotionState, Frame};
use crate::preprocess::{preprocess_frame, MODEL_INPUT_SIZE};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use tracing::{debug, error, info};

/// Anything that turns a preprocessed input buffer into class scores
pub trait EmotionModel: Send {
    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>>;
}

/// Memory layout of the single-channel input tensor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TensorLayout {
    /// `[1, 48, 48, 1]`, the Keras/TFLite convention
    #[default]
    Nhwc,
    /// `[1, 1, 48, 48]`, the PyTorch convention
    Nchw,
}

impl TensorLayout {
    fn shape(self) -> (usize, usize, usize, usize) {
        let side = MODEL_INPUT_SIZE as usize;
        match self {
            TensorLayout::Nhwc => (1, side, side, 1),
            TensorLayout::Nchw => (1, 1, side, side),
        }
    }
}

/// Emotion classifier using ONNX Runtime
pub struct EmotionClassifier {
    session: Session,
    layout: TensorLayout,
}

impl EmotionClassifier {
    /// Creates a new EmotionClassifier by loading the ONNX model
    pub fn new<P: AsRef<Path>>(model_path: P, layout: TensorLayout) -> Result<Self> {
        let model_path = model_path.as_ref();
        let session = Session::builder()
            .map_err(|e| {
                EmotionDetectorError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load ONNX model {:?}: {}", model_path, e);
                EmotionDetectorError::ModelLoad(format!("{}: {e}", model_path.display()))
            })?;

        info!("Loaded emotion model from {:?} ({:?})", model_path, layout);
        Ok(Self { session, layout })
    }
}

impl EmotionModel for EmotionClassifier {
    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        // Single channel, so NHWC and NCHW share the same element order
        let input_array = ndarray::Array4::from_shape_vec(self.layout.shape(), input.to_vec())
            .map_err(|e| {
                EmotionDetectorError::OnnxRuntime(format!("Failed to create input array: {e}"))
            })?;

        let input_tensor = Value::from_array(input_array).map_err(|e| {
            EmotionDetectorError::OnnxRuntime(format!("Failed to create input tensor: {e}"))
        })?;

        let outputs = self.session.run(ort::inputs![input_tensor]).map_err(|e| {
            error!("ONNX inference failed: {}", e);
            EmotionDetectorError::OnnxRuntime(format!("Inference failed: {e}"))
        })?;

        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| EmotionDetectorError::OnnxRuntime("No output from model".to_string()))?;

        let (_, scores) = output_value.try_extract_tensor::<f32>().map_err(|e| {
            EmotionDetectorError::OnnxRuntime(format!("Failed to extract output tensor: {e}"))
        })?;

        Ok(scores.to_vec())
    }
}

/// Converts logits into probabilities
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Returns the index and value of the highest score, first one on ties
pub fn top_score(scores: &[f32]) -> Result<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, score)| match best {
            Some((_, best_score)) if score <= best_score || score.is_nan() => best,
            _ => Some((idx, score)),
        })
        .ok_or(EmotionDetectorError::EmptyOutput)
}

/// Runs the full photo-to-label pipeline
pub struct EmotionAnalyzer {
    model: Option<Box<dyn EmotionModel>>,
    apply_softmax: bool,
}

impl EmotionAnalyzer {
    /// Creates an analyzer around an already loaded model
    pub fn new(model: Box<dyn EmotionModel>, apply_softmax: bool) -> Self {
        Self {
            model: Some(model),
            apply_softmax,
        }
    }

    /// Creates an analyzer whose model failed to load; every analysis errors
    pub fn without_model() -> Self {
        Self {
            model: None,
            apply_softmax: false,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Classifies the facial expression in a captured photo
    pub fn analyze(&mut self, frame: &Frame) -> Result<EmotionResult> {
        let model = self
            .model
            .as_mut()
            .ok_or(EmotionDetectorError::ModelNotLoaded)?;

        let input = preprocess_frame(frame)?;
        let mut scores = model.infer(&input)?;
        if self.apply_softmax {
            scores = softmax(&scores);
        }
        debug!("Model scores: {:?}", scores);

        let (index, confidence) = top_score(&scores)?;
        let result = EmotionResult::new(EmotionState::from_index(index), confidence);
        info!("Detected {}", result);
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::preprocess::MODEL_INPUT_LEN;

    /// Returns fixed scores and checks the input it receives
    pub(crate) struct FixedModel(pub Vec<f32>);

    impl EmotionModel for FixedModel {
        fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
            assert_eq!(input.len(), MODEL_INPUT_LEN);
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    impl EmotionModel for FailingModel {
        fn infer(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
            Err(EmotionDetectorError::OnnxRuntime("boom".to_string()))
        }
    }

    fn gray_frame() -> Frame {
        Frame::new(vec![128; 64 * 64 * 3], 64, 64)
    }

    #[test]
    fn top_score_prefers_first_of_equal_scores() {
        assert_eq!(top_score(&[0.1, 0.4, 0.4, 0.1]).unwrap(), (1, 0.4));
        assert_eq!(top_score(&[f32::NAN, 0.2]).unwrap(), (1, 0.2));
        assert!(matches!(top_score(&[]), Err(EmotionDetectorError::EmptyOutput)));
    }

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(top_score(&probs).unwrap().0, 1);
    }

    #[test]
    fn layouts_produce_four_dimensional_shapes() {
        assert_eq!(TensorLayout::Nhwc.shape(), (1, 48, 48, 1));
        assert_eq!(TensorLayout::Nchw.shape(), (1, 1, 48, 48));
    }

    #[test]
    fn analyzer_maps_highest_score_to_label() {
        let scores = vec![0.01, 0.02, 0.03, 0.81, 0.05, 0.04, 0.04];
        let mut analyzer = EmotionAnalyzer::new(Box::new(FixedModel(scores)), false);
        let result = analyzer.analyze(&gray_frame()).unwrap();
        assert_eq!(result.emotion, Some(EmotionState::Happy));
        assert_eq!(result.to_string(), "Happy (81%)");
    }

    #[test]
    fn extra_output_classes_are_unknown() {
        let mut scores = vec![0.0; 8];
        scores[7] = 0.9;
        let mut analyzer = EmotionAnalyzer::new(Box::new(FixedModel(scores)), false);
        let result = analyzer.analyze(&gray_frame()).unwrap();
        assert_eq!(result.emotion, None);
        assert_eq!(result.to_string(), "Unknown (90%)");
    }

    #[test]
    fn softmax_option_normalizes_logits() {
        let logits = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let mut analyzer = EmotionAnalyzer::new(Box::new(FixedModel(logits)), true);
        let result = analyzer.analyze(&gray_frame()).unwrap();
        assert_eq!(result.emotion, Some(EmotionState::Neutral));
        assert!(result.confidence > 0.99 && result.confidence <= 1.0);
    }

    #[test]
    fn missing_model_and_inference_errors_propagate() {
        let mut analyzer = EmotionAnalyzer::without_model();
        assert!(!analyzer.has_model());
        assert!(matches!(
            analyzer.analyze(&gray_frame()),
            Err(EmotionDetectorError::ModelNotLoaded)
        ));

        let mut analyzer = EmotionAnalyzer::new(Box::new(FailingModel), false);
        assert!(matches!(
            analyzer.analyze(&gray_frame()),
            Err(EmotionDetectorError::OnnxRuntime(_))
        ));
    }
}
