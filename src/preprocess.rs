// Photo preprocessing into the classifier's input buffer

use crate::error::{EmotionDetectorError, Result};
use crate::models::Frame;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Side length of the square grayscale image the classifier expects
pub const MODEL_INPUT_SIZE: u32 = 48;

/// Number of values in one preprocessed input buffer
pub const MODEL_INPUT_LEN: usize = (MODEL_INPUT_SIZE * MODEL_INPUT_SIZE) as usize;

// Luminance row of a saturation-zero colour matrix
const DESATURATE_WEIGHTS: [f32; 3] = [0.213, 0.715, 0.072];

// ITU-R BT.601 luma
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Wraps the frame bytes in an image buffer, validating the dimensions
fn frame_to_image(frame: &Frame) -> Result<RgbImage> {
    if frame.is_empty() {
        return Err(EmotionDetectorError::FrameProcessing(
            "Frame has no pixels".to_string(),
        ));
    }

    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        return Err(EmotionDetectorError::FrameProcessing(format!(
            "Frame is {}x{} but carries {} bytes (expected {expected})",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }

    RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(|| {
        EmotionDetectorError::FrameProcessing("Failed to wrap frame data".to_string())
    })
}

/// Scales the photo to the model's fixed input size, ignoring aspect ratio
pub fn resize(image: &RgbImage) -> RgbImage {
    imageops::resize(image, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle)
}

/// Removes all colour, writing the same gray level to every channel
pub fn desaturate(image: &RgbImage) -> RgbImage {
    let mut gray = image.clone();
    for pixel in gray.pixels_mut() {
        let level = weighted(pixel, DESATURATE_WEIGHTS).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgb([level, level, level]);
    }
    gray
}

/// Flattens the image row by row into luminance values in `[0, 1]`
pub fn to_luminance(image: &RgbImage) -> Vec<f32> {
    image
        .pixels()
        .map(|pixel| (weighted(pixel, LUMA_WEIGHTS) / 255.0).clamp(0.0, 1.0))
        .collect()
}

fn weighted(pixel: &Rgb<u8>, weights: [f32; 3]) -> f32 {
    let [r, g, b] = pixel.0;
    weights[0] * r as f32 + weights[1] * g as f32 + weights[2] * b as f32
}

/// Turns a captured photo into the flat buffer fed to the classifier
pub fn preprocess_frame(frame: &Frame) -> Result<Vec<f32>> {
    let image = frame_to_image(frame)?;
    let gray = desaturate(&resize(&image));
    Ok(to_luminance(&gray))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height)
    }

    #[test]
    fn output_is_one_value_per_input_pixel() {
        let buffer = preprocess_frame(&solid_frame(640, 480, [12, 200, 77])).unwrap();
        assert_eq!(buffer.len(), MODEL_INPUT_LEN);
        assert!(buffer.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn small_photos_are_upscaled() {
        let buffer = preprocess_frame(&solid_frame(3, 5, [0, 0, 0])).unwrap();
        assert_eq!(buffer.len(), MODEL_INPUT_LEN);
        assert!(buffer.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn black_and_white_hit_the_range_ends() {
        let white = preprocess_frame(&solid_frame(96, 96, [255, 255, 255])).unwrap();
        assert!(white.iter().all(|v| (v - 1.0).abs() < 1e-5));
        let black = preprocess_frame(&solid_frame(96, 96, [0, 0, 0])).unwrap();
        assert!(black.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn desaturation_weights_green_heaviest() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = desaturate(&img);
        assert_eq!(gray.get_pixel(0, 0), &Rgb([54, 54, 54]));
        assert_eq!(gray.get_pixel(1, 0), &Rgb([182, 182, 182]));
        assert_eq!(gray.get_pixel(2, 0), &Rgb([18, 18, 18]));
    }

    #[test]
    fn luminance_is_row_major() {
        let img = RgbImage::from_fn(2, 2, |x, y| {
            let v = (y * 2 + x) as u8 * 50;
            Rgb([v, v, v])
        });
        let values = to_luminance(&img);
        let expected = [0.0, 50.0 / 255.0, 100.0 / 255.0, 150.0 / 255.0];
        for (got, want) in values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} != {want}");
        }
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let frame = Frame::new(vec![0; 10], 4, 4);
        assert!(matches!(
            preprocess_frame(&frame),
            Err(EmotionDetectorError::FrameProcessing(_))
        ));
        let empty = Frame::new(Vec::new(), 0, 0);
        assert!(preprocess_frame(&empty).is_err());
    }
}
