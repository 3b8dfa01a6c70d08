// UI module for the emotion detector screen

use crate::camera;
use crate::error::EmotionDetectorError;
use crate::models::Frame;
use crate::worker::{Command, Event};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

const PHOTO_BOX_SIZE: f32 = 300.0;
const BUTTON_HEIGHT: f32 = 56.0;

/// How long a toast stays on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLength {
    Short,
    Long,
}

impl ToastLength {
    fn duration(self) -> Duration {
        match self {
            ToastLength::Short => Duration::from_millis(2000),
            ToastLength::Long => Duration::from_millis(3500),
        }
    }
}

/// Transient status message
#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub message: String,
    expires_at: Instant,
}

impl Toast {
    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// What the screen asks the outside world to do
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Send(Command),
    RequestPermission,
}

/// Everything the screen shows, independent of the toolkit
#[derive(Debug, Default)]
pub struct ScreenState {
    captured: Option<Frame>,
    detected: Option<String>,
    toast: Option<Toast>,
}

impl ScreenState {
    pub fn captured(&self) -> Option<&Frame> {
        self.captured.as_ref()
    }

    pub fn detected(&self) -> Option<&str> {
        self.detected.as_deref()
    }

    /// Returns the toast if it has not expired yet
    pub fn toast(&self, now: Instant) -> Option<&Toast> {
        self.toast.as_ref().filter(|toast| toast.is_visible(now))
    }

    pub fn show_toast(&mut self, message: impl Into<String>, length: ToastLength, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + length.duration(),
        });
    }

    /// "Take Photo" pressed
    pub fn take_photo(&self, permission_granted: bool) -> Action {
        if permission_granted {
            Action::Send(Command::Capture)
        } else {
            Action::RequestPermission
        }
    }

    /// "Analyze Emotion" pressed; does nothing without a photo
    pub fn analyze(&self) -> Option<Action> {
        self.captured
            .as_ref()
            .map(|frame| Action::Send(Command::Analyze(frame.clone())))
    }

    /// Folds a worker or permission event into the screen
    pub fn apply(&mut self, event: Event, now: Instant) -> Option<Action> {
        match event {
            Event::PermissionResolved(true) => return Some(Action::Send(Command::Capture)),
            Event::PermissionResolved(false) => {
                let message = EmotionDetectorError::CameraAccessDenied.to_string();
                self.show_toast(message, ToastLength::Short, now);
            }
            Event::Captured(frame) => {
                self.captured = Some(frame);
                self.detected = None;
                self.show_toast("Image captured successfully!", ToastLength::Short, now);
            }
            Event::CaptureFailed(message) => {
                self.show_toast(format!("Capture failed: {message}"), ToastLength::Short, now);
            }
            Event::Analyzed(result) => {
                self.detected = Some(result.to_string());
            }
            Event::AnalysisFailed(message) => {
                self.detected = Some(format!("Error: {message}"));
                self.show_toast(format!("Analysis failed: {message}"), ToastLength::Short, now);
            }
        }
        None
    }
}

/// Main application UI
pub struct EmotionDetectorApp {
    state: ScreenState,
    commands: mpsc::Sender<Command>,
    events: mpsc::Receiver<Event>,
    permission_events: mpsc::Sender<Event>,
    photo_texture: Option<egui::TextureHandle>,
}

impl EmotionDetectorApp {
    /// Creates a new EmotionDetectorApp
    ///
    /// `startup_error` is shown as a long toast, e.g. a model that failed to load.
    pub fn new(
        commands: mpsc::Sender<Command>,
        events: mpsc::Receiver<Event>,
        permission_events: mpsc::Sender<Event>,
        startup_error: Option<String>,
    ) -> Self {
        let mut state = ScreenState::default();
        if let Some(message) = startup_error {
            state.show_toast(message, ToastLength::Long, Instant::now());
        }

        Self {
            state,
            commands,
            events,
            permission_events,
            photo_texture: None,
        }
    }

    fn perform(&mut self, action: Action, ctx: &egui::Context) {
        match action {
            Action::Send(command) => {
                if let Err(e) = self.commands.try_send(command) {
                    warn!("Worker is busy or gone: {}", e);
                }
            }
            Action::RequestPermission => {
                let events = self.permission_events.clone();
                let ctx = ctx.clone();
                camera::request_permission(move |granted| {
                    if let Err(e) = events.try_send(Event::PermissionResolved(granted)) {
                        warn!("Dropped camera permission answer: {}", e);
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    /// Drains pending events and refreshes the photo texture when it changes
    fn process_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events.try_recv() {
            let new_photo = matches!(event, Event::Captured(_));
            if let Some(action) = self.state.apply(event, Instant::now()) {
                self.perform(action, ctx);
            }

            if new_photo {
                if let Some(frame) = self.state.captured() {
                    let color_image = egui::ColorImage::from_rgb(
                        [frame.width as usize, frame.height as usize],
                        &frame.data,
                    );
                    self.photo_texture =
                        Some(ctx.load_texture("photo", color_image, egui::TextureOptions::LINEAR));
                }
            }
        }
    }

    fn render_photo_box(&self, ui: &mut egui::Ui) {
        let size = egui::vec2(PHOTO_BOX_SIZE, PHOTO_BOX_SIZE);
        egui::Frame::default()
            .stroke(egui::Stroke::new(2.0, egui::Color32::GRAY))
            .corner_radius(8.0)
            .show(ui, |ui| {
                ui.set_min_size(size);
                ui.set_max_size(size);
                ui.centered_and_justified(|ui| match &self.photo_texture {
                    Some(texture) => {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                    }
                    None => {
                        ui.label("No image captured yet");
                    }
                });
            });
    }

    fn render_toast(&self, ctx: &egui::Context) {
        if let Some(toast) = self.state.toast(Instant::now()) {
            egui::TopBottomPanel::bottom("toast").show(ctx, |ui| {
                ui.vertical_centered(|ui| ui.label(toast.message.as_str()));
            });
        }
    }
}

impl eframe::App for EmotionDetectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Worker events arrive without input, keep polling
        ctx.request_repaint_after(Duration::from_millis(100));

        self.process_events(ctx);
        self.render_toast(ctx);

        let mut pressed = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.spacing_mut().item_spacing.y = 16.0;
            ui.vertical_centered(|ui| {
                ui.heading("Emotion Detector");

                self.render_photo_box(ui);

                if let Some(detected) = self.state.detected() {
                    ui.label(
                        egui::RichText::new(format!("Detected: {detected}"))
                            .size(22.0)
                            .color(ui.visuals().hyperlink_color),
                    );
                }

                let button_size = [ui.available_width(), BUTTON_HEIGHT];
                if ui.add_sized(button_size, egui::Button::new("Take Photo")).clicked() {
                    pressed.push(self.state.take_photo(camera::permission_granted()));
                }

                if self.state.captured().is_some()
                    && ui
                        .add_sized(button_size, egui::Button::new("Analyze Emotion"))
                        .clicked()
                {
                    pressed.extend(self.state.analyze());
                }
            });
        });

        for action in pressed {
            self.perform(action, ctx);
        }
    }
}
