// Error types for the Emotion Detector application

use thiserror::Error;

/// Main error type for the Emotion Detector application
#[derive(Debug, Error)]
pub enum EmotionDetectorError {
    #[error("Camera initialization failed: {0}")]
    CameraInit(String),

    #[error("Camera permission is required")]
    CameraAccessDenied,

    #[error("Frame processing failed: {0}")]
    FrameProcessing(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model is not loaded")]
    ModelNotLoaded,

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),

    #[error("Model produced no scores")]
    EmptyOutput,

    #[error("Image loading failed: {0}")]
    ImageLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Result type alias for Emotion Detector operations
pub type Result<T> = std::result::Result<T, EmotionDetectorError>;

// Conversion from nokhwa errors
impl From<nokhwa::NokhwaError> for EmotionDetectorError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        match err {
            nokhwa::NokhwaError::OpenDeviceError(device, error) => {
                EmotionDetectorError::CameraInit(format!("Device {device}: {error}"))
            }
            nokhwa::NokhwaError::ReadFrameError(error) => {
                EmotionDetectorError::FrameProcessing(format!("Failed to read frame: {error}"))
            }
            nokhwa::NokhwaError::ProcessFrameError { src, destination, error } => {
                EmotionDetectorError::FrameProcessing(format!(
                    "Failed to convert {src:?} to {destination}: {error}"
                ))
            }
            _ => EmotionDetectorError::CameraInit(err.to_string()),
        }
    }
}

// Conversion from ONNX Runtime errors
impl From<ort::Error> for EmotionDetectorError {
    fn from(err: ort::Error) -> Self {
        EmotionDetectorError::OnnxRuntime(err.to_string())
    }
}
