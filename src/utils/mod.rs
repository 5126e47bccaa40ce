//! Utility modules for DOM access and display formatting.

pub mod dom;
pub mod format;

pub use format::{format_peers, format_size};
