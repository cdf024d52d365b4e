mod app;
mod config;
mod effects;
mod listing;
mod logging;
mod ui;

pub use app::run_app;
