//! Port system for block connections
//!
//! This module defines how blocks declare their input and output ports, and
//! the immutable descriptors the registry derives from those declarations.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::types::SemanticType;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Input port declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Port name, unique among the block's inputs
    pub name: String,
    /// Human-readable port name
    pub label: String,
    /// Declared data type
    pub data_type: SemanticType,
    /// Port description
    pub description: Option<String>,
    /// Whether the port may be left unconnected
    pub nullable: bool,
    /// Value used when nothing is connected
    pub default: Option<JsonValue>,
}

impl Input {
    /// Declare a required input port
    pub fn new(name: impl Into<String>, label: impl Into<String>, data_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            data_type,
            description: None,
            nullable: false,
            default: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the port as nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Output port declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub label: String,
    pub data_type: SemanticType,
    pub description: Option<String>,
}

impl Output {
    /// Declare an output port
    pub fn new(name: impl Into<String>, label: impl Into<String>, data_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            data_type,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registered input port
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputDescriptor {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    /// Canonical type identifier
    pub type_id: String,
    /// Whether a link (or default) must feed this port
    pub required: bool,
    pub nullable: bool,
    pub default: Option<JsonValue>,
}

/// Registered output port
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDescriptor {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    /// Canonical type identifier
    pub type_id: String,
}
