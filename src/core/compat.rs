//! Compatibility engine
//!
//! Answers whether a value of one registered type may be wired into a port
//! declared with another. Rules are tried in order and the first match wins:
//!
//! 1. identical identifiers
//! 2. `Any` target (and `Any` source, when the policy allows it)
//! 3. container covariance, recursing on element types
//! 4. union members (every source member, or some target member)
//! 5. registered subtype edges
//!
//! Identifiers unknown to the type registry are never compatible with
//! anything, themselves included.

use std::collections::BTreeMap;

use super::types::{TypeRegistry, TypeShape, ANY_TYPE_ID};

/// Total compatibility relation: `source -> target -> compatible`
pub type CompatibilityMatrix = BTreeMap<String, BTreeMap<String, bool>>;

/// Compatibility queries over a type registry
pub struct CompatibilityEngine<'a> {
    types: &'a TypeRegistry,
    any_as_source: bool,
}

impl<'a> CompatibilityEngine<'a> {
    /// Create an engine where `Any` is only a sink
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self {
            types,
            any_as_source: false,
        }
    }

    /// Allow `Any` values to be wired into concrete targets
    pub fn with_any_as_source(mut self, enabled: bool) -> Self {
        self.any_as_source = enabled;
        self
    }

    /// Whether `source` may be wired into `target`
    pub fn is_compatible(&self, source: &str, target: &str) -> bool {
        if !self.types.contains(source) || !self.types.contains(target) {
            tracing::trace!(
                source_type = source,
                target_type = target,
                "compatibility query on unregistered type"
            );
            return false;
        }
        self.check(source, target)
    }

    /// Compute the relation over every registered type
    pub fn compatibility_map(&self) -> CompatibilityMatrix {
        let ids = self.types.ids();
        ids.iter()
            .map(|source| {
                let row = ids
                    .iter()
                    .map(|target| (target.clone(), self.check(source, target)))
                    .collect();
                (source.clone(), row)
            })
            .collect()
    }

    // Both ids are known to be registered.
    fn check(&self, source: &str, target: &str) -> bool {
        if source == target || target == ANY_TYPE_ID {
            return true;
        }
        if self.any_as_source && source == ANY_TYPE_ID {
            return true;
        }

        let (Some(src), Some(tgt)) = (self.types.get(source), self.types.get(target)) else {
            return false;
        };

        match (&src.shape, &tgt.shape) {
            (TypeShape::Container { element: a }, TypeShape::Container { element: b }) => {
                return self.check(a, b);
            }
            (TypeShape::Union { members }, _) => {
                return members.iter().all(|member| self.check(member, target));
            }
            (_, TypeShape::Union { members }) => {
                if members.iter().any(|member| self.check(source, member)) {
                    return true;
                }
            }
            _ => {}
        }

        self.types.is_subtype(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PlainType, SemanticType};

    fn plain(name: &str) -> SemanticType {
        SemanticType::plain(name)
    }

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register(&SemanticType::list(plain("Message")));
        types.register(&SemanticType::list(plain("Text")));
        types.register(&SemanticType::list(
            PlainType::new("IMMessage").with_supertype("Message").into(),
        ));
        types.register(&SemanticType::Any);
        types
    }

    #[test]
    fn test_reflexive() {
        let types = registry();
        let engine = CompatibilityEngine::new(&types);
        for id in types.ids() {
            assert!(engine.is_compatible(&id, &id), "{} should accept itself", id);
        }
    }

    #[test]
    fn test_any_is_sink_only_by_default() {
        let types = registry();
        let engine = CompatibilityEngine::new(&types);
        assert!(engine.is_compatible("Message", ANY_TYPE_ID));
        assert!(engine.is_compatible("List<Text>", ANY_TYPE_ID));
        assert!(!engine.is_compatible(ANY_TYPE_ID, "Message"));

        let permissive = CompatibilityEngine::new(&types).with_any_as_source(true);
        assert!(permissive.is_compatible(ANY_TYPE_ID, "Message"));
    }

    #[test]
    fn test_container_covariance() {
        let types = registry();
        let engine = CompatibilityEngine::new(&types);
        assert!(!engine.is_compatible("List<Message>", "List<Text>"));
        assert!(engine.is_compatible("IMMessage", "Message"));
        assert!(engine.is_compatible("List<IMMessage>", "List<Message>"));
        assert!(!engine.is_compatible("List<Message>", "List<IMMessage>"));
        assert!(!engine.is_compatible("List<Message>", "Message"));
    }

    #[test]
    fn test_unions() {
        let mut types = registry();
        let union = types.register(&SemanticType::union(vec![plain("Text"), plain("Message")]));
        let engine = CompatibilityEngine::new(&types);

        assert!(engine.is_compatible("Text", &union));
        assert!(engine.is_compatible("IMMessage", &union));
        assert!(!engine.is_compatible(&union, "Text"));
        assert!(engine.is_compatible(&union, ANY_TYPE_ID));
    }

    #[test]
    fn test_unknown_ids_are_incompatible() {
        let types = registry();
        let engine = CompatibilityEngine::new(&types);
        assert!(!engine.is_compatible("Ghost", "Ghost"));
        assert!(!engine.is_compatible("Ghost", ANY_TYPE_ID));
        assert!(!engine.is_compatible("Message", "Ghost"));
    }

    #[test]
    fn test_map_is_total() {
        let types = registry();
        let map = CompatibilityEngine::new(&types).compatibility_map();
        let ids = types.ids();

        assert_eq!(map.len(), ids.len());
        for id in &ids {
            let row = &map[id];
            assert_eq!(row.len(), ids.len());
            assert!(row[id]);
        }
        assert!(!map["Text"]["Message"]);
        assert!(map["IMMessage"]["Message"]);
    }
}
