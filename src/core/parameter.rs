//! Parameter system for block configuration
//!
//! Blocks declare their constructor parameters here. A parameter is either a
//! bare type or a type wrapped in one layer of presentation metadata
//! ([`ParamMeta`]). Metadata never changes the parameter's type identifier.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::types::SemanticType;

/// Named reference to an options provider
///
/// The registry only stores the token. The editor resolves it against its own
/// provider table when it needs the list of choices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionsProviderRef(pub String);

impl OptionsProviderRef {
    pub fn new(name: impl Into<String>) -> Self {
        OptionsProviderRef(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionsProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation metadata attached to a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamMeta {
    /// Label shown in the property panel
    pub label: String,
    /// Help text
    pub description: Option<String>,
    /// Source of selectable values
    pub options_provider: Option<OptionsProviderRef>,
}

impl ParamMeta {
    /// Create metadata with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            options_provider: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an options provider
    pub fn with_options_provider(mut self, provider: impl Into<String>) -> Self {
        self.options_provider = Some(OptionsProviderRef::new(provider));
        self
    }
}

/// Declared type of a constructor parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamType {
    /// Type without metadata
    Bare { ty: SemanticType },
    /// Type wrapped in presentation metadata
    ///
    /// `inner` is `None` when the wrapper carries no type argument.
    Annotated {
        inner: Option<SemanticType>,
        meta: ParamMeta,
    },
}

/// Constructor parameter declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<JsonValue>,
}

impl ParamDecl {
    /// Declare a bare parameter
    pub fn new(name: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Bare { ty },
            default: None,
        }
    }

    /// Declare a parameter wrapped in metadata
    pub fn annotated(name: impl Into<String>, ty: SemanticType, meta: ParamMeta) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Annotated {
                inner: Some(ty),
                meta,
            },
            default: None,
        }
    }

    /// Declare a metadata wrapper with no type argument
    pub fn annotated_untyped(name: impl Into<String>, meta: ParamMeta) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Annotated { inner: None, meta },
            default: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Registered configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    /// Canonical type identifier
    pub type_id: String,
    /// Whether the author must supply a value
    pub required: bool,
    pub default: Option<JsonValue>,
    /// Whether the editor can offer a list of choices
    pub has_options: bool,
    pub options_provider: Option<OptionsProviderRef>,
}
