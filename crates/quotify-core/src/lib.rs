pub mod config;
pub mod content;
pub mod interfaces;
pub mod lifecycle;
