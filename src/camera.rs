// Camera module for permission handling and still capture

use crate::error::{EmotionDetectorError, Result};
use crate::models::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::time::Duration;
use tracing::{error, info, warn};

// Auto exposure needs a moment after the stream opens
const SETTLE_TIME: Duration = Duration::from_millis(200);
const WARMUP_FRAMES: usize = 3;

/// Returns whether the process may already use the camera
pub fn permission_granted() -> bool {
    nokhwa::nokhwa_check()
}

/// Shows the platform permission prompt; `on_complete` receives the answer
///
/// Platforms without a prompt answer `true` immediately.
pub fn request_permission<F>(on_complete: F)
where
    F: Fn(bool) + Send + Sync + 'static,
{
    info!("Requesting camera permission");
    nokhwa::nokhwa_initialize(on_complete);
}

/// Something that hands back one photo per call
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame>;
}

/// Owns the camera device and takes single photos
pub struct CameraManager {
    camera: Camera,
}

impl CameraManager {
    /// Opens the given camera, or the first of index 0 and 1 that works
    pub fn new(index: Option<u32>) -> Result<Self> {
        // 640x480 is plenty for a 48x48 model input
        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(Resolution::new(640, 480), FrameFormat::YUYV, 30),
        ));

        let camera = match index {
            Some(index) => Self::try_open_camera(index, requested_format),
            // Some systems start at 0, others at 1
            None => Self::try_open_camera(0, requested_format)
                .or_else(|_| Self::try_open_camera(1, requested_format)),
        }
        .map_err(|e| {
            error!("Failed to initialize camera: {}", e);
            EmotionDetectorError::CameraInit(format!(
                "Could not open camera. Make sure a camera is connected, \
                no other app is using it and camera permission is granted. Error: {e}"
            ))
        })?;

        info!("Opened camera {}", camera.info().human_name());
        Ok(Self { camera })
    }

    /// Helper to try opening a camera at a specific index
    fn try_open_camera(index: u32, requested_format: RequestedFormat) -> Result<Camera> {
        Camera::new(CameraIndex::Index(index), requested_format)
            .map_err(|e| EmotionDetectorError::CameraInit(e.to_string()))
    }

    /// Reads and decodes one frame from an open stream
    fn read_frame(&mut self) -> Result<Frame> {
        let frame_data = self.camera.frame()?;

        let buffer = frame_data.decode_image::<RgbFormat>().map_err(|e| {
            EmotionDetectorError::FrameProcessing(format!("Failed to decode frame: {e}"))
        })?;

        let (width, height) = (buffer.width(), buffer.height());
        Ok(Frame::new(buffer.into_raw(), width, height))
    }

    /// Opens the stream, takes one photo and closes the stream again
    pub fn capture_still(&mut self) -> Result<Frame> {
        self.camera.open_stream().map_err(|e| {
            error!("Failed to open camera stream: {}", e);
            EmotionDetectorError::CameraInit(e.to_string())
        })?;

        std::thread::sleep(SETTLE_TIME);
        for _ in 0..WARMUP_FRAMES {
            if let Err(e) = self.camera.frame() {
                warn!("Dropping warm-up frame failed: {}", e);
            }
        }

        let frame = self.read_frame();

        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }

        frame
    }
}

impl FrameSource for CameraManager {
    fn capture(&mut self) -> Result<Frame> {
        self.capture_still()
    }
}
