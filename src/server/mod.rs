//! HTTP server: task-pane API and static files

pub mod api;
pub mod static_files;

pub use api::run_server;
