//! Block Registry - capability registry for workflow blocks
//!
//! This crate records what every workflow block accepts, produces and can be
//! configured with, and answers whether an output of one block may be wired
//! into an input of another. It does not execute blocks.

pub mod config;
pub mod core;
pub mod editor;
mod tests;

// Re-export commonly used types
pub use crate::config::RegistryConfig;
pub use crate::core::{Block, BlockClass, BlockDescriptor, BlockRegistry, SemanticType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
