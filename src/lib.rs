// Library exports for the Emotion Detector

pub mod camera;
pub mod config;
pub mod emotion;
pub mod error;
pub mod models;
pub mod preprocess;
pub mod ui;
pub mod worker;
