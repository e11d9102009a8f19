//! Block trait and related types
//!
//! Blocks declare their shape statically: input ports, output ports and the
//! constructor parameters an author can configure. The registry reads these
//! declarations once per registration through a [`BlockClass`] handle.

use serde::Serialize;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;

use super::parameter::{ParamDecl, ParameterDescriptor};
use super::port::{Input, InputDescriptor, Output, OutputDescriptor};

/// Constructor parameters supplied by the runtime rather than the author
pub const BUILTIN_PARAMS: &[&str] = &["name", "container"];

/// Static shape every block implementation declares
pub trait Block: Send + Sync + 'static {
    /// Input port declarations
    fn inputs() -> Vec<Input> {
        Vec::new()
    }

    /// Output port declarations
    fn outputs() -> Vec<Output> {
        Vec::new()
    }

    /// Constructor parameter declarations, builtin parameters included
    fn parameters() -> Vec<ParamDecl> {
        Vec::new()
    }
}

/// Everything a block declares, read in one pass
#[derive(Debug, Clone, Default)]
pub struct BlockSignature {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub parameters: Vec<ParamDecl>,
}

/// Handle to a block implementation
///
/// Two handles are equal iff they refer to the same implementing type.
#[derive(Clone, Copy)]
pub struct BlockClass {
    type_id: TypeId,
    type_name: &'static str,
    inputs: fn() -> Vec<Input>,
    outputs: fn() -> Vec<Output>,
    parameters: fn() -> Vec<ParamDecl>,
}

impl BlockClass {
    /// Handle for the implementation `B`
    pub fn of<B: Block>() -> Self {
        Self {
            type_id: TypeId::of::<B>(),
            type_name: std::any::type_name::<B>(),
            inputs: B::inputs,
            outputs: B::outputs,
            parameters: B::parameters,
        }
    }

    /// Fully-qualified name of the implementing type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Identity of the implementing type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Read the block's declarations
    pub fn signature(&self) -> BlockSignature {
        BlockSignature {
            inputs: (self.inputs)(),
            outputs: (self.outputs)(),
            parameters: (self.parameters)(),
        }
    }
}

impl PartialEq for BlockClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for BlockClass {}

impl fmt::Debug for BlockClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockClass").field(&self.type_name).finish()
    }
}

/// Registered block
#[derive(Debug, Clone, Serialize)]
pub struct BlockDescriptor {
    /// `group:id`, unique across the registry
    pub composite_id: String,
    /// Short id within the group
    pub block_id: String,
    pub group_id: String,
    pub localized_name: Option<String>,
    pub inputs: BTreeMap<String, InputDescriptor>,
    pub outputs: BTreeMap<String, OutputDescriptor>,
    pub parameters: BTreeMap<String, ParameterDescriptor>,
    /// Implementation the execution engine instantiates
    #[serde(skip)]
    pub class: BlockClass,
}

impl BlockDescriptor {
    /// Name for display, falling back to the composite id
    pub fn display_name(&self) -> &str {
        self.localized_name.as_deref().unwrap_or(&self.composite_id)
    }
}

/// Build the `group:id` key
pub fn composite_id(group_id: &str, block_id: &str) -> String {
    format!("{}:{}", group_id, block_id)
}
