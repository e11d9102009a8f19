//! Core block abstractions and types
//!
//! This module defines how blocks declare their shape, the type registry
//! those declarations are canonicalized into, the compatibility engine over
//! that type space, and the block registry that ties them together.

pub mod types;
pub mod port;
pub mod parameter;
pub mod block;
pub mod extract;
pub mod compat;
pub mod registry;

pub use block::{Block, BlockClass, BlockDescriptor, BlockSignature, BUILTIN_PARAMS};
pub use compat::{CompatibilityEngine, CompatibilityMatrix};
pub use parameter::{OptionsProviderRef, ParamDecl, ParamMeta, ParamType, ParameterDescriptor};
pub use port::{Input, InputDescriptor, Output, OutputDescriptor, PortDirection};
pub use registry::{BlockRegistry, RegistryError, UNREGISTERED_PREFIX};
pub use types::{PlainType, SemanticType, TypeEntry, TypeRegistry, TypeShape, ANY_TYPE_ID};
