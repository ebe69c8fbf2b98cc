mod app;
mod config;
mod effects;
mod logging;
mod presets;
mod render;

pub use app::run_app;
