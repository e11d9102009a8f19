//! Block Registry - Central registry for managing all available blocks
//!
//! This module provides a thread-safe registry for registering and looking up
//! blocks, together with the type registry their ports and parameters are
//! described in. It supports:
//! - Block registration keyed by `group:id`
//! - Descriptor lookup for the editor and the execution engine
//! - Reverse lookup from an implementation to its registered name
//! - Type compatibility queries and the full compatibility map
//! - Atomic reset for hot-reload

use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::config::RegistryConfig;
use crate::core::block::{composite_id, Block, BlockClass, BlockDescriptor};
use crate::core::compat::{CompatibilityEngine, CompatibilityMatrix};
use crate::core::extract::DescriptorExtractor;
use crate::core::types::{SemanticType, TypeEntry, TypeRegistry};

/// Prefix of names synthesized for unregistered block implementations
///
/// Real names are always `group:id`; this prefix marks names that do not
/// refer to any registration.
pub const UNREGISTERED_PREFIX: &str = "!!";

/// Everything a registration or a clear touches, swapped under one lock
#[derive(Default)]
struct RegistryState {
    blocks: HashMap<String, Arc<BlockDescriptor>>,
    /// First composite id each implementation was registered under
    class_names: HashMap<TypeId, String>,
    /// Short id most recently stamped on each implementation
    short_ids: HashMap<TypeId, String>,
    types: TypeRegistry,
    matrix: OnceLock<Arc<CompatibilityMatrix>>,
}

/// Block registry for managing all available blocks
///
/// The registry keeps every table behind a single `parking_lot::RwLock`, so
/// concurrent readers never see a half-applied registration or a half-cleared
/// registry. Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct BlockRegistry {
    config: Arc<RegistryConfig>,
    state: Arc<RwLock<RegistryState>>,
}

impl BlockRegistry {
    /// Create a new empty block registry
    ///
    /// # Example
    /// ```
    /// use block_registry::core::registry::BlockRegistry;
    ///
    /// let registry = BlockRegistry::new();
    /// assert_eq!(registry.count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new empty block registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a block implementation
    ///
    /// # Arguments
    /// * `block_id` - Identifier of the block within its group
    /// * `group_id` - Group identifier (`internal` for built-in blocks)
    /// * `class` - Handle to the implementation
    /// * `localized_name` - Optional display name; an empty name counts as none
    ///
    /// # Returns
    /// * `Ok(Arc<BlockDescriptor>)` with the stored descriptor
    /// * `Err(RegistryError::DuplicateRegistration)` if `group_id:block_id` is
    ///   already taken; nothing is modified in that case
    ///
    /// # Example
    /// ```ignore
    /// registry.register("chat_completion", "internal", BlockClass::of::<ChatCompletion>(), None)?;
    /// ```
    pub fn register(
        &self,
        block_id: &str,
        group_id: &str,
        class: BlockClass,
        localized_name: Option<&str>,
    ) -> Result<Arc<BlockDescriptor>, RegistryError> {
        let composite = composite_id(group_id, block_id);

        // Declarations are read before locking; extraction itself cannot fail.
        let signature = class.signature();

        let mut state = self.state.write();
        if state.blocks.contains_key(&composite) {
            return Err(RegistryError::DuplicateRegistration(composite));
        }

        let extracted =
            DescriptorExtractor::new(&mut state.types, &self.config.builtin_params).extract(&signature);

        let descriptor = Arc::new(BlockDescriptor {
            composite_id: composite.clone(),
            block_id: block_id.to_string(),
            group_id: group_id.to_string(),
            localized_name: localized_name.filter(|name| !name.is_empty()).map(str::to_string),
            inputs: extracted.inputs,
            outputs: extracted.outputs,
            parameters: extracted.parameters,
            class,
        });

        state.blocks.insert(composite.clone(), Arc::clone(&descriptor));
        state
            .class_names
            .entry(class.type_id())
            .or_insert_with(|| composite.clone());
        state.short_ids.insert(class.type_id(), block_id.to_string());
        state.matrix = OnceLock::new();

        tracing::debug!(
            block = %composite,
            inputs = descriptor.inputs.len(),
            outputs = descriptor.outputs.len(),
            parameters = descriptor.parameters.len(),
            "registered block"
        );

        Ok(descriptor)
    }

    /// Register the implementation `B`
    pub fn register_block<B: Block>(
        &self,
        block_id: &str,
        group_id: &str,
        localized_name: Option<&str>,
    ) -> Result<Arc<BlockDescriptor>, RegistryError> {
        self.register(block_id, group_id, BlockClass::of::<B>(), localized_name)
    }

    /// Get a block by its composite id
    pub fn get(&self, composite_id: &str) -> Option<Arc<BlockDescriptor>> {
        self.state.read().blocks.get(composite_id).cloned()
    }

    /// Check if a block with the given composite id exists
    pub fn contains(&self, composite_id: &str) -> bool {
        self.state.read().blocks.contains_key(composite_id)
    }

    /// Get the number of registered blocks
    pub fn count(&self) -> usize {
        self.state.read().blocks.len()
    }

    /// Get all registered descriptors, ordered by composite id
    pub fn descriptors(&self) -> Vec<Arc<BlockDescriptor>> {
        let state = self.state.read();
        let mut descriptors: Vec<_> = state.blocks.values().cloned().collect();
        descriptors.sort_by(|a, b| a.composite_id.cmp(&b.composite_id));
        descriptors
    }

    /// Get every registered implementation, ordered by composite id
    pub fn classes(&self) -> Vec<BlockClass> {
        self.descriptors().iter().map(|d| d.class).collect()
    }

    /// Display name of a block, falling back to the composite id
    pub fn get_localized_name(&self, composite_id: &str) -> String {
        self.state
            .read()
            .blocks
            .get(composite_id)
            .and_then(|d| d.localized_name.clone())
            .unwrap_or_else(|| composite_id.to_string())
    }

    /// Registered name of an implementation
    ///
    /// Returns the composite id the implementation was first registered
    /// under. For an implementation that was never registered, returns its
    /// type path behind [`UNREGISTERED_PREFIX`] and emits a warning, since
    /// that usually means a plugin failed to load its blocks.
    pub fn get_block_type_name(&self, class: &BlockClass) -> String {
        if let Some(name) = self.state.read().class_names.get(&class.type_id()) {
            return name.clone();
        }

        tracing::warn!(
            block_class = class.type_name(),
            "block class is not registered, using its type path instead"
        );
        format!("{}{}", UNREGISTERED_PREFIX, class.type_name())
    }

    /// Short id last stamped on an implementation by `register`
    pub fn short_id(&self, class: &BlockClass) -> Option<String> {
        self.state.read().short_ids.get(&class.type_id()).cloned()
    }

    /// Constructor parameter names reserved for the runtime
    pub fn builtin_params(&self) -> &[String] {
        &self.config.builtin_params
    }

    /// Register a standalone type and return its identifier
    pub fn register_type(&self, ty: &SemanticType) -> String {
        let mut state = self.state.write();
        let id = state.types.register(ty);
        // Re-declaring a known type may still add supertype edges.
        state.matrix = OnceLock::new();
        id
    }

    /// Declare that values of `sub` may be wired into `sup` ports
    pub fn register_subtype(&self, sub: &SemanticType, sup: &SemanticType) -> (String, String) {
        let mut state = self.state.write();
        let ids = state.types.register_subtype(sub, sup);
        state.matrix = OnceLock::new();
        ids
    }

    /// Identifier of an already registered type, without registering it
    pub fn resolve_type_id(&self, ty: &SemanticType) -> Option<String> {
        self.state.read().types.resolve(ty)
    }

    /// Look up a registered type
    pub fn type_entry(&self, type_id: &str) -> Option<TypeEntry> {
        self.state.read().types.get(type_id).cloned()
    }

    /// All registered type identifiers, sorted
    pub fn type_ids(&self) -> Vec<String> {
        self.state.read().types.ids()
    }

    /// Check if values of `source` may be wired into `target` ports
    pub fn is_compatible(&self, source: &str, target: &str) -> bool {
        let state = self.state.read();
        self.engine(&state.types).is_compatible(source, target)
    }

    /// Compatibility relation over every registered type
    ///
    /// Computed on first use after each change and shared until the next one.
    pub fn compatibility_map(&self) -> Arc<CompatibilityMatrix> {
        let state = self.state.read();
        let matrix = state
            .matrix
            .get_or_init(|| Arc::new(self.engine(&state.types).compatibility_map()));
        Arc::clone(matrix)
    }

    /// Clear all registered blocks and types
    ///
    /// Used on hot-reload. Readers see either the old registry or an empty
    /// one, never a mix.
    pub fn clear(&self) {
        let mut state = self.state.write();
        *state = RegistryState::default();
        tracing::debug!("cleared block registry");
    }

    fn engine<'a>(&self, types: &'a TypeRegistry) -> CompatibilityEngine<'a> {
        CompatibilityEngine::new(types).with_any_as_source(self.config.any_as_source)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry error types
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Attempted to register a block under a taken composite id
    #[error("Block {0} already registered")]
    DuplicateRegistration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameter::ParamDecl;
    use crate::core::port::{Input, Output};
    use crate::core::types::{PlainType, ANY_TYPE_ID};

    struct Echo;

    impl Block for Echo {
        fn inputs() -> Vec<Input> {
            vec![Input::new("text", "Text", SemanticType::plain("str"))]
        }

        fn outputs() -> Vec<Output> {
            vec![Output::new("text", "Text", SemanticType::plain("str"))]
        }

        fn parameters() -> Vec<ParamDecl> {
            vec![
                ParamDecl::new("name", SemanticType::plain("str")),
                ParamDecl::new("prefix", SemanticType::plain("str")).with_default(""),
            ]
        }
    }

    struct Sink;

    impl Block for Sink {
        fn inputs() -> Vec<Input> {
            vec![Input::new("value", "Value", SemanticType::Any)]
        }
    }

    struct Stray;

    impl Block for Stray {}

    #[test]
    fn test_registry_creation() {
        let registry = BlockRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.type_ids().is_empty());
    }

    #[test]
    fn test_block_registration() {
        let registry = BlockRegistry::new();
        let descriptor = registry
            .register_block::<Echo>("echo", "internal", Some("Echo"))
            .unwrap();

        assert_eq!(descriptor.composite_id, "internal:echo");
        assert_eq!(registry.count(), 1);
        assert!(registry.contains("internal:echo"));
        assert_eq!(descriptor.parameters.len(), 1);
        assert!(descriptor.parameters.contains_key("prefix"));
        assert_eq!(registry.type_ids(), vec!["str".to_string()]);

        let retrieved = registry.get("internal:echo").unwrap();
        assert_eq!(retrieved.class, BlockClass::of::<Echo>());
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = BlockRegistry::new();
        registry
            .register_block::<Echo>("echo", "internal", Some("Echo"))
            .unwrap();

        let result = registry.register_block::<Sink>("echo", "internal", Some("Other"));
        assert!(matches!(result, Err(RegistryError::DuplicateRegistration(ref id)) if id == "internal:echo"));

        let kept = registry.get("internal:echo").unwrap();
        assert_eq!(kept.class, BlockClass::of::<Echo>());
        assert_eq!(registry.get_localized_name("internal:echo"), "Echo");
        assert!(!registry.type_ids().contains(&ANY_TYPE_ID.to_string()));
    }

    #[test]
    fn test_same_id_in_other_group() {
        let registry = BlockRegistry::new();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        registry.register_block::<Echo>("echo", "plugin", None).unwrap();
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_localized_name_fallback() {
        let registry = BlockRegistry::new();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        assert_eq!(registry.get_localized_name("internal:echo"), "internal:echo");
        assert_eq!(registry.get_localized_name("internal:missing"), "internal:missing");
    }

    #[test]
    fn test_empty_localized_name_falls_back() {
        let registry = BlockRegistry::new();
        let descriptor = registry.register_block::<Echo>("echo", "internal", Some("")).unwrap();
        assert_eq!(descriptor.localized_name, None);
        assert_eq!(registry.get_localized_name("internal:echo"), "internal:echo");
        assert_eq!(descriptor.display_name(), "internal:echo");
    }

    #[test]
    fn test_block_type_name() {
        let registry = BlockRegistry::new();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        registry.register_block::<Echo>("echo2", "plugin", None).unwrap();

        assert_eq!(
            registry.get_block_type_name(&BlockClass::of::<Echo>()),
            "internal:echo"
        );
        assert_eq!(
            registry.short_id(&BlockClass::of::<Echo>()).as_deref(),
            Some("echo2")
        );

        let stray = registry.get_block_type_name(&BlockClass::of::<Stray>());
        assert!(stray.starts_with(UNREGISTERED_PREFIX));
        assert!(stray.ends_with("Stray"));
        assert_eq!(registry.short_id(&BlockClass::of::<Stray>()), None);
    }

    #[test]
    fn test_descriptors_are_sorted() {
        let registry = BlockRegistry::new();
        registry.register_block::<Sink>("sink", "internal", None).unwrap();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();

        let ids: Vec<_> = registry
            .descriptors()
            .iter()
            .map(|d| d.composite_id.clone())
            .collect();
        assert_eq!(ids, vec!["internal:echo", "internal:sink"]);
        assert_eq!(
            registry.classes(),
            vec![BlockClass::of::<Echo>(), BlockClass::of::<Sink>()]
        );
    }

    #[test]
    fn test_compatibility_map_invalidated_on_register() {
        let registry = BlockRegistry::new();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        let before = registry.compatibility_map();
        assert_eq!(before.len(), 1);

        registry.register_block::<Sink>("sink", "internal", None).unwrap();
        let after = registry.compatibility_map();
        assert_eq!(after.len(), 2);
        assert!(after["str"][ANY_TYPE_ID]);
        assert!(!after[ANY_TYPE_ID]["str"]);
    }

    #[test]
    fn test_compatibility_map_invalidated_on_new_supertype() {
        let registry = BlockRegistry::new();
        registry.register_type(&SemanticType::plain("Payload"));
        registry.register_type(&SemanticType::plain("Blob"));
        assert!(!registry.compatibility_map()["Payload"]["Blob"]);

        // Same type count, one new edge
        registry.register_type(&PlainType::new("Payload").with_supertype("Blob").into());
        assert_eq!(registry.type_ids().len(), 2);
        assert!(registry.is_compatible("Payload", "Blob"));

        let after = registry.compatibility_map();
        for (source, row) in after.iter() {
            for (target, compatible) in row {
                assert_eq!(*compatible, registry.is_compatible(source, target), "{} -> {}", source, target);
            }
        }
        assert!(after["Payload"]["Blob"]);
    }

    #[test]
    fn test_any_as_source_policy() {
        let registry = BlockRegistry::with_config(RegistryConfig::default().with_any_as_source(true));
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        registry.register_block::<Sink>("sink", "internal", None).unwrap();
        assert!(registry.is_compatible(ANY_TYPE_ID, "str"));
    }

    #[test]
    fn test_custom_builtin_params() {
        let config = RegistryConfig::default().with_builtin_params(["prefix"]);
        let registry = BlockRegistry::with_config(config);
        let descriptor = registry.register_block::<Echo>("echo", "internal", None).unwrap();

        assert_eq!(registry.builtin_params(), ["prefix".to_string()]);
        assert!(descriptor.parameters.contains_key("name"));
        assert!(!descriptor.parameters.contains_key("prefix"));
    }

    #[test]
    fn test_clear() {
        let registry = BlockRegistry::new();
        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        registry.register_block::<Sink>("sink", "internal", None).unwrap();
        assert!(registry.is_compatible("str", "str"));

        registry.clear();
        assert_eq!(registry.count(), 0);
        assert!(!registry.is_compatible("str", "str"));
        assert!(registry.compatibility_map().is_empty());
        assert!(registry.get_block_type_name(&BlockClass::of::<Echo>()).starts_with(UNREGISTERED_PREFIX));

        registry.register_block::<Echo>("echo", "internal", None).unwrap();
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_register_type_and_subtype() {
        let registry = BlockRegistry::new();
        let list = registry.register_type(&SemanticType::list(SemanticType::plain("Text")));
        assert_eq!(list, "List<Text>");
        assert_eq!(
            registry.resolve_type_id(&SemanticType::plain("Text")).as_deref(),
            Some("Text")
        );
        assert_eq!(registry.resolve_type_id(&SemanticType::plain("Image")), None);

        registry.register_subtype(&SemanticType::plain("Text"), &SemanticType::plain("Content"));
        assert!(registry.is_compatible("Text", "Content"));
        assert!(registry.compatibility_map()["Text"]["Content"]);
        assert!(registry.type_entry("Content").is_some());
    }

    #[test]
    fn test_thread_safety() {
        use std::thread;

        let registry = BlockRegistry::new();
        let mut handles = vec![];

        for i in 0..10 {
            let registry = registry.clone();
            let handle = thread::spawn(move || {
                registry
                    .register_block::<Echo>(&format!("echo{}", i), "internal", None)
                    .unwrap();
                registry.compatibility_map().len()
            });
            handles.push(handle);
        }

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }

        assert_eq!(registry.count(), 10);
    }
}
