//! Type registry
//!
//! Canonicalizes semantic port and parameter types into stable string
//! identifiers. Every identifier that appears in a block descriptor or in the
//! compatibility relation is backed by a [`TypeEntry`] here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Reserved identifier of the unconstrained type
pub const ANY_TYPE_ID: &str = "Any";

/// Characters that structure container and union identifiers
const ID_DELIMITERS: &[char] = &['<', '>', '|'];

/// A plain, named type with optional declared supertypes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlainType {
    /// Qualified type name
    pub name: String,
    /// Qualified names of the types this type may be wired into
    #[serde(default)]
    pub supertypes: Vec<String>,
}

impl PlainType {
    /// Create a plain type without supertypes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
        }
    }

    /// Declare a supertype
    pub fn with_supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }
}

/// Semantic type as declared by a block implementation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum SemanticType {
    /// Named type (e.g. `str`, `IMMessage`)
    Plain(PlainType),
    /// Homogeneous list of the element type
    List(Box<SemanticType>),
    /// Value that may be absent
    Optional(Box<SemanticType>),
    /// One of several types
    Union(Vec<SemanticType>),
    /// Unconstrained
    Any,
}

impl SemanticType {
    /// Plain type by qualified name
    pub fn plain(name: impl Into<String>) -> Self {
        SemanticType::Plain(PlainType::new(name))
    }

    /// List of `element`
    pub fn list(element: SemanticType) -> Self {
        SemanticType::List(Box::new(element))
    }

    /// Optional `inner`
    pub fn optional(inner: SemanticType) -> Self {
        SemanticType::Optional(Box::new(inner))
    }

    /// Union of `members`
    pub fn union(members: Vec<SemanticType>) -> Self {
        SemanticType::Union(members)
    }

    /// Whether a value of this type may be absent
    pub fn is_optional(&self) -> bool {
        matches!(self, SemanticType::Optional(_))
    }
}

impl From<PlainType> for SemanticType {
    fn from(plain: PlainType) -> Self {
        SemanticType::Plain(plain)
    }
}

/// Shape of a registered type, expressed over other type identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Plain { name: String },
    Container { element: String },
    Union { members: Vec<String> },
    Any,
}

/// A registered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub id: String,
    pub shape: TypeShape,
}

/// Registry of canonical type identifiers and explicit subtype edges
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, TypeEntry>,
    supertypes: HashMap<String, BTreeSet<String>>,
}

impl TypeRegistry {
    /// Create an empty type registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the canonical identifier of a type without registering it
    ///
    /// Optional types share the identifier of the type they wrap; absence is
    /// tracked on descriptors, not in the type space.
    pub fn canonical_id(ty: &SemanticType) -> String {
        match ty {
            SemanticType::Plain(plain) => Self::plain_id(&plain.name),
            SemanticType::List(element) => format!("List<{}>", Self::canonical_id(element)),
            SemanticType::Optional(inner) => Self::canonical_id(inner),
            SemanticType::Union(members) => match Self::union_members(members) {
                UnionMembers::Any => ANY_TYPE_ID.to_string(),
                UnionMembers::Single(id) => id,
                UnionMembers::Many(ids) => Self::union_id(&ids.into_iter().collect::<Vec<_>>()),
            },
            SemanticType::Any => ANY_TYPE_ID.to_string(),
        }
    }

    /// Register a type and return its identifier
    ///
    /// Idempotent: structurally identical types yield the identifier assigned
    /// the first time. Element and member types are registered first so every
    /// identifier reachable from the returned one is itself resolvable.
    pub fn register(&mut self, ty: &SemanticType) -> String {
        match ty {
            SemanticType::Plain(plain) => {
                if plain.name == ANY_TYPE_ID {
                    return self.insert(ANY_TYPE_ID.to_string(), TypeShape::Any);
                }
                let id = self.insert(
                    Self::plain_id(&plain.name),
                    TypeShape::Plain {
                        name: plain.name.clone(),
                    },
                );
                for sup in &plain.supertypes {
                    let sup_id = self.register(&SemanticType::plain(sup.clone()));
                    self.add_edge(&id, &sup_id);
                }
                id
            }
            SemanticType::List(element) => {
                let element = self.register(element);
                self.insert(format!("List<{}>", element), TypeShape::Container { element })
            }
            SemanticType::Optional(inner) => self.register(inner),
            SemanticType::Union(members) => {
                for member in members {
                    self.register(member);
                }
                match Self::union_members(members) {
                    UnionMembers::Any => self.insert(ANY_TYPE_ID.to_string(), TypeShape::Any),
                    UnionMembers::Single(id) => id,
                    UnionMembers::Many(ids) => {
                        let members: Vec<String> = ids.into_iter().collect();
                        self.insert(Self::union_id(&members), TypeShape::Union { members })
                    }
                }
            }
            SemanticType::Any => self.insert(ANY_TYPE_ID.to_string(), TypeShape::Any),
        }
    }

    /// Resolve the identifier of an already registered type
    ///
    /// Never mutates the registry. Returns `None` if the type (or any type
    /// it is built from) has not been registered.
    pub fn resolve(&self, ty: &SemanticType) -> Option<String> {
        let id = Self::canonical_id(ty);
        self.entries.contains_key(&id).then_some(id)
    }

    /// Record that `sub` may be wired wherever `sup` is expected
    ///
    /// Both types are registered if needed. Returns their identifiers.
    pub fn register_subtype(&mut self, sub: &SemanticType, sup: &SemanticType) -> (String, String) {
        let sub_id = self.register(sub);
        let sup_id = self.register(sup);
        if sub_id != sup_id {
            self.add_edge(&sub_id, &sup_id);
        }
        (sub_id, sup_id)
    }

    /// Whether `sub` reaches `sup` through registered subtype edges
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(current) {
                for parent in parents {
                    if parent == sup {
                        return true;
                    }
                    queue.push_back(parent.as_str());
                }
            }
        }
        false
    }

    /// Look up a registered type
    pub fn get(&self, id: &str) -> Option<&TypeEntry> {
        self.entries.get(id)
    }

    /// Whether the identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All registered identifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: String, shape: TypeShape) -> String {
        self.entries
            .entry(id.clone())
            .or_insert_with(|| TypeEntry { id: id.clone(), shape });
        id
    }

    fn add_edge(&mut self, sub: &str, sup: &str) {
        self.supertypes
            .entry(sub.to_string())
            .or_default()
            .insert(sup.to_string());
    }

    // Names containing id delimiters are quoted so they can never collide
    // with a container or union id.
    fn plain_id(name: &str) -> String {
        if name.contains(ID_DELIMITERS) {
            format!("`{}`", name)
        } else {
            name.to_string()
        }
    }

    fn union_id(members: &[String]) -> String {
        format!("Union<{}>", members.join("|"))
    }

    // Nested unions flatten; Optional members contribute their inner id.
    fn union_members(members: &[SemanticType]) -> UnionMembers {
        let mut ids = BTreeSet::new();
        let mut stack: Vec<&SemanticType> = members.iter().collect();

        while let Some(member) = stack.pop() {
            match member {
                SemanticType::Union(nested) => stack.extend(nested.iter()),
                SemanticType::Optional(inner) => stack.push(inner.as_ref()),
                other => {
                    let id = Self::canonical_id(other);
                    if id == ANY_TYPE_ID {
                        return UnionMembers::Any;
                    }
                    ids.insert(id);
                }
            }
        }

        let mut ids = ids.into_iter();
        match (ids.next(), ids.next()) {
            (None, _) => UnionMembers::Any,
            (Some(only), None) => UnionMembers::Single(only),
            (Some(first), Some(second)) => {
                let mut all = BTreeSet::from([first, second]);
                all.extend(ids);
                UnionMembers::Many(all)
            }
        }
    }
}

enum UnionMembers {
    Any,
    Single(String),
    Many(BTreeSet<String>),
}
