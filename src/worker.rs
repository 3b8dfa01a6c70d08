// Background worker that owns the camera and the classifier

use crate::camera::FrameSource;
use crate::emotion::EmotionAnalyzer;
use crate::error::Result;
use crate::models::{EmotionResult, Frame};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Requests sent from the screen to the worker
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Capture,
    Analyze(Frame),
}

/// Everything the screen reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    PermissionResolved(bool),
    Captured(Frame),
    CaptureFailed(String),
    Analyzed(EmotionResult),
    AnalysisFailed(String),
}

/// Opens the frame source on first use
pub type SourceOpener = Box<dyn FnMut() -> Result<Box<dyn FrameSource>> + Send>;

/// Serves capture and analysis requests one at a time
pub struct Worker {
    open_source: SourceOpener,
    source: Option<Box<dyn FrameSource>>,
    analyzer: EmotionAnalyzer,
}

impl Worker {
    pub fn new(open_source: SourceOpener, analyzer: EmotionAnalyzer) -> Self {
        Self {
            open_source,
            source: None,
            analyzer,
        }
    }

    fn capture(&mut self) -> Result<Frame> {
        let mut source = match self.source.take() {
            Some(source) => source,
            None => (self.open_source)()?,
        };
        // A source that failed is dropped so the next capture reopens it
        let frame = source.capture()?;
        self.source = Some(source);
        Ok(frame)
    }

    /// Handles one command and returns the matching event
    pub fn handle(&mut self, command: Command) -> Event {
        match command {
            Command::Capture => match self.capture() {
                Ok(frame) => {
                    info!("Captured {}x{} photo", frame.width, frame.height);
                    Event::Captured(frame)
                }
                Err(e) => {
                    error!("Capture failed: {}", e);
                    Event::CaptureFailed(e.to_string())
                }
            },
            Command::Analyze(frame) => match self.analyzer.analyze(&frame) {
                Ok(result) => Event::Analyzed(result),
                Err(e) => {
                    error!("Emotion analysis failed: {}", e);
                    Event::AnalysisFailed(e.to_string())
                }
            },
        }
    }

    /// Processes commands until the sending side goes away
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<Event>,
    ) {
        while let Some(command) = commands.recv().await {
            let event = self.handle(command);
            if events.send(event).await.is_err() {
                warn!("Event receiver dropped, stopping worker");
                break;
            }
        }
        info!("Worker stopped");
    }
}
