// Presentation layer - HTTP surface and tab views
pub mod app_state;
pub mod format;
pub mod handlers;
pub mod views;
