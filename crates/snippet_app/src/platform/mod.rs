mod app;
mod config;
mod logging;
mod persistence;
mod report;

pub use app::run_app;
