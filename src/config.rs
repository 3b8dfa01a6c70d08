// Command line configuration

use crate::emotion::TensorLayout;
use clap::Parser;
use std::path::PathBuf;

/// Take a photo and find out how you feel.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct AppArgs {
    /// ONNX emotion model taking a 48x48 grayscale image.
    #[arg(long, default_value = "assets/models/emotion.onnx")]
    pub model: PathBuf,
    /// Input tensor layout of the model.
    #[arg(long, value_enum, default_value_t = TensorLayout::Nhwc)]
    pub layout: TensorLayout,
    /// Apply softmax to the model output (for models that emit logits).
    #[arg(long, default_value_t = false)]
    pub softmax: bool,
    /// Camera to open; tries 0 then 1 when unset.
    #[arg(long)]
    pub camera_index: Option<u32>,
    /// Where to write the log.
    #[arg(long, default_value = "emotion_detector.log")]
    pub log_file: PathBuf,
    /// Classify this photo and print the result instead of opening a window.
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_the_gui_with_bundled_model() {
        let args = AppArgs::try_parse_from(["emotion-detector"]).unwrap();
        assert_eq!(args.model, PathBuf::from("assets/models/emotion.onnx"));
        assert_eq!(args.layout, TensorLayout::Nhwc);
        assert!(!args.softmax);
        assert_eq!(args.camera_index, None);
        assert_eq!(args.log_file, PathBuf::from("emotion_detector.log"));
        assert!(args.image.is_none());
    }

    #[test]
    fn headless_run_with_pytorch_export() {
        let args = AppArgs::try_parse_from([
            "emotion-detector",
            "--model",
            "fer.onnx",
            "--layout",
            "nchw",
            "--softmax",
            "--image",
            "face.jpg",
        ])
        .unwrap();
        assert_eq!(args.layout, TensorLayout::Nchw);
        assert!(args.softmax);
        assert_eq!(args.image, Some(PathBuf::from("face.jpg")));
    }

    #[test]
    fn unknown_layout_is_rejected() {
        assert!(AppArgs::try_parse_from(["emotion-detector", "--layout", "hwc"]).is_err());
    }
}
