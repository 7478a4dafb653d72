#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod hackernews;
pub mod host;
pub mod runtime;
pub mod terminal;
pub mod ticker;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
