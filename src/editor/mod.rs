//! Editor-facing services
//!
//! Helpers the workflow editor layers on top of the registry: link checks
//! while an author draws connections, and lazy resolution of parameter
//! options through editor-owned providers.

pub mod options;
pub mod validation;

pub use options::{OptionsError, OptionsProvider, OptionsProviders};
pub use validation::{Link, LinkError, LinkValidationResult, LinkValidator};
