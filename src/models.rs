// Core data models for the Emotion Detector application

use crate::error::{EmotionDetectorError, Result};
use image::DynamicImage;
use std::path::Path;

/// A single captured photo with packed RGB data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Raw RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Creates a new Frame with the given parameters
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Creates a Frame from any decoded image, dropping alpha
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height)
    }

    /// Loads a photo from disk
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|e| {
            EmotionDetectorError::ImageLoad(format!(
                "Failed to load image from {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Ok(Self::from_dynamic_image(img))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Emotion categories in the order the classifier emits them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmotionState {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionState {
    /// Label table indexed by model output position
    pub const ALL: [EmotionState; 7] = [
        EmotionState::Angry,
        EmotionState::Disgust,
        EmotionState::Fear,
        EmotionState::Happy,
        EmotionState::Sad,
        EmotionState::Surprise,
        EmotionState::Neutral,
    ];

    /// Maps a model output index to its label
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for EmotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmotionState::Angry => write!(f, "Angry"),
            EmotionState::Disgust => write!(f, "Disgust"),
            EmotionState::Fear => write!(f, "Fear"),
            EmotionState::Happy => write!(f, "Happy"),
            EmotionState::Sad => write!(f, "Sad"),
            EmotionState::Surprise => write!(f, "Surprise"),
            EmotionState::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Result of emotion detection containing the emotion and its score
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionResult {
    /// The detected emotion, `None` when the winning index has no label
    pub emotion: Option<EmotionState>,
    /// Score of the winning class (0.0 to 1.0 for probability outputs)
    pub confidence: f32,
}

impl EmotionResult {
    /// Creates a new EmotionResult
    pub fn new(emotion: Option<EmotionState>, confidence: f32) -> Self {
        Self {
            emotion,
            confidence,
        }
    }

    /// Returns the confidence as a percentage (0-100)
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

impl std::fmt::Display for EmotionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.emotion {
            Some(emotion) => write!(f, "{} ({}%)", emotion, self.confidence_percent()),
            None => write!(f, "Unknown ({}%)", self.confidence_percent()),
        }
    }
}
