//! Descriptor extraction
//!
//! Turns a block's declared signature into immutable descriptors, passing
//! every type it meets through the [`TypeRegistry`].

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::block::BlockSignature;
use super::parameter::{ParamDecl, ParamType, ParameterDescriptor};
use super::port::{Input, InputDescriptor, Output, OutputDescriptor};
use super::types::{SemanticType, TypeRegistry};

/// Descriptors extracted from one block signature
#[derive(Debug, Clone, Default)]
pub struct ExtractedBlock {
    pub inputs: BTreeMap<String, InputDescriptor>,
    pub outputs: BTreeMap<String, OutputDescriptor>,
    pub parameters: BTreeMap<String, ParameterDescriptor>,
}

/// Resolved type information of a single value slot
struct TypeInfo {
    type_id: String,
    required: bool,
    default: Option<JsonValue>,
}

/// Extracts descriptors and registers the types they reference
pub struct DescriptorExtractor<'a> {
    types: &'a mut TypeRegistry,
    builtin_params: &'a [String],
}

impl<'a> DescriptorExtractor<'a> {
    /// Create an extractor writing into `types`
    ///
    /// Parameters named in `builtin_params` are skipped.
    pub fn new(types: &'a mut TypeRegistry, builtin_params: &'a [String]) -> Self {
        Self {
            types,
            builtin_params,
        }
    }

    /// Extract inputs, outputs and configurable parameters
    ///
    /// Never fails; malformed parameter metadata degrades to an
    /// unconstrained, required parameter.
    pub fn extract(&mut self, signature: &BlockSignature) -> ExtractedBlock {
        let mut extracted = ExtractedBlock::default();

        for input in &signature.inputs {
            let descriptor = self.extract_input(input);
            insert_unique(&mut extracted.inputs, "input", &input.name, descriptor);
        }

        for output in &signature.outputs {
            let descriptor = self.extract_output(output);
            insert_unique(&mut extracted.outputs, "output", &output.name, descriptor);
        }

        for param in &signature.parameters {
            if self.builtin_params.iter().any(|builtin| *builtin == param.name) {
                continue;
            }
            let descriptor = self.extract_param(param);
            insert_unique(&mut extracted.parameters, "parameter", &param.name, descriptor);
        }

        extracted
    }

    fn extract_input(&mut self, input: &Input) -> InputDescriptor {
        let nullable = input.nullable || input.data_type.is_optional();
        InputDescriptor {
            name: input.name.clone(),
            label: input.label.clone(),
            description: input.description.clone(),
            type_id: self.types.register(&input.data_type),
            required: !nullable,
            nullable,
            default: input.default.clone(),
        }
    }

    fn extract_output(&mut self, output: &Output) -> OutputDescriptor {
        OutputDescriptor {
            name: output.name.clone(),
            label: output.label.clone(),
            description: output.description.clone(),
            type_id: self.types.register(&output.data_type),
        }
    }

    fn extract_param(&mut self, param: &ParamDecl) -> ParameterDescriptor {
        match &param.ty {
            ParamType::Bare { ty } => {
                let info = self.type_info(ty, param.default.as_ref());
                ParameterDescriptor {
                    name: param.name.clone(),
                    label: param.name.clone(),
                    description: None,
                    type_id: info.type_id,
                    required: info.required,
                    default: info.default,
                    has_options: false,
                    options_provider: None,
                }
            }
            ParamType::Annotated { inner: Some(ty), meta } => {
                let info = self.type_info(ty, param.default.as_ref());
                ParameterDescriptor {
                    name: param.name.clone(),
                    label: meta.label.clone(),
                    description: meta.description.clone(),
                    type_id: info.type_id,
                    required: info.required,
                    default: info.default,
                    has_options: meta.options_provider.is_some(),
                    options_provider: meta.options_provider.clone(),
                }
            }
            // Metadata without a type argument is ignored entirely.
            ParamType::Annotated { inner: None, .. } => {
                tracing::warn!(
                    parameter = %param.name,
                    "parameter metadata has no type argument, treating it as Any"
                );
                ParameterDescriptor {
                    name: param.name.clone(),
                    label: param.name.clone(),
                    description: None,
                    type_id: self.types.register(&SemanticType::Any),
                    required: true,
                    default: None,
                    has_options: false,
                    options_provider: None,
                }
            }
        }
    }

    // Optional types are never required, with or without a default.
    fn type_info(&mut self, ty: &SemanticType, default: Option<&JsonValue>) -> TypeInfo {
        TypeInfo {
            type_id: self.types.register(ty),
            required: default.is_none() && !ty.is_optional(),
            default: default.cloned(),
        }
    }
}

/// Insert a descriptor, keeping the last of several same-named declarations
fn insert_unique<T>(table: &mut BTreeMap<String, T>, kind: &str, name: &str, descriptor: T) {
    if table.insert(name.to_string(), descriptor).is_some() {
        tracing::warn!(
            kind = kind,
            slot = name,
            "declared more than once, keeping the last declaration"
        );
    }
}
