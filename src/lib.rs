pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod frontend;
pub mod lifecycle;
pub mod pipeline;
pub mod report;
pub mod tui;
