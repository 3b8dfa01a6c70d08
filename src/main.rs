use clap::Parser;
use emotion_detector::camera::{CameraManager, FrameSource};
use emotion_detector::config::AppArgs;
use emotion_detector::emotion::{EmotionAnalyzer, EmotionClassifier};
use emotion_detector::error::{EmotionDetectorError, Result};
use emotion_detector::models::Frame;
use emotion_detector::ui::EmotionDetectorApp;
use emotion_detector::worker::{SourceOpener, Worker};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system (file only, no console output)
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path).map_err(EmotionDetectorError::Io)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Ok(())
}

fn load_analyzer(args: &AppArgs) -> Result<EmotionAnalyzer> {
    let classifier = EmotionClassifier::new(&args.model, args.layout)?;
    Ok(EmotionAnalyzer::new(Box::new(classifier), args.softmax))
}

/// Classifies a photo from disk and prints the label
fn run_headless(args: &AppArgs, image_path: &Path) -> Result<()> {
    let mut analyzer = load_analyzer(args)?;
    let frame = Frame::load_from_path(image_path)?;
    let result = analyzer.analyze(&frame)?;
    println!("{result}");
    Ok(())
}

fn run_gui(args: &AppArgs) -> Result<()> {
    let (analyzer, startup_error) = match load_analyzer(args) {
        Ok(analyzer) => (analyzer, None),
        Err(e) => {
            error!("Starting without a model: {}", e);
            (
                EmotionAnalyzer::without_model(),
                Some(format!("Failed to load model: {e}")),
            )
        }
    };

    let (command_sender, command_receiver) = mpsc::channel(8);
    let (event_sender, event_receiver) = mpsc::channel(32);
    let permission_sender = event_sender.clone();

    // The camera handle is not Send, so it is opened on the worker thread
    let camera_index = args.camera_index;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to start worker runtime: {}", e);
                return;
            }
        };

        let open_camera: SourceOpener = Box::new(move || {
            let camera = CameraManager::new(camera_index)?;
            Ok(Box::new(camera) as Box<dyn FrameSource>)
        });

        rt.block_on(Worker::new(open_camera, analyzer).run(command_receiver, event_sender));
    });

    let result = eframe::run_native(
        "Emotion Detector",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([420.0, 640.0])
                .with_title("Emotion Detector"),
            ..Default::default()
        },
        Box::new(move |_cc| {
            Ok(Box::new(EmotionDetectorApp::new(
                command_sender,
                event_receiver,
                permission_sender,
                startup_error,
            )))
        }),
    );

    if let Err(e) = result {
        error!("Application error: {}", e);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = AppArgs::parse();
    init_logging(&args.log_file)?;
    info!("Starting with {:?}", args);

    match &args.image {
        Some(image_path) => run_headless(&args, image_path),
        None => run_gui(&args),
    }
}
