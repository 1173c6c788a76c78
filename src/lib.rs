pub mod app;
pub mod config;
pub mod display;
pub mod event;
pub mod firmware;
pub mod format;
pub mod health;
pub mod logging;
pub mod render;
pub mod scheduler;
pub mod system;
