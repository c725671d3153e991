mod app;
mod config;
mod prompt;
mod render;

pub use app::run_app;
