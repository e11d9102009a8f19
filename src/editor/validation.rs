//! Link validation
//!
//! Checks the links an author draws between block ports against the
//! registry: referenced blocks and ports must exist, links must run from an
//! output to an input, and the port types must be compatible. Produces a
//! `LinkValidationResult` the editor can render next to the offending nodes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::block::BlockDescriptor;
use crate::core::port::PortDirection;
use crate::core::registry::BlockRegistry;

/// A link from an output port of one node to an input port of another
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub source_node: String,
    pub source_port: String,
    pub target_node: String,
    pub target_port: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        source_node: impl Into<String>,
        source_port: impl Into<String>,
        target_node: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_port: source_port.into(),
            target_node: target_node.into(),
            target_port: target_port.into(),
        }
    }
}

/// Why a single link cannot be drawn
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// No block is registered under the composite id
    #[error("Block {0} is not registered")]
    UnknownBlock(String),

    /// The port does not exist on the block in the required direction
    #[error("Block {block} has no {direction:?} port '{port}'")]
    UnknownPort {
        block: String,
        port: String,
        direction: PortDirection,
    },

    /// The output type cannot flow into the input type
    #[error("Type {source_type} cannot be wired into {target_type}")]
    IncompatibleTypes {
        source_type: String,
        target_type: String,
    },
}

/// A problem found while validating links, attached to a node when possible
#[derive(Debug, Clone)]
pub struct LinkIssue {
    pub node_id: Option<String>,
    pub message: String,
    /// How the author could fix it
    pub suggestion: Option<String>,
}

impl LinkIssue {
    fn new(node_id: Option<&str>, message: impl Into<String>, suggestion: &str) -> Self {
        Self {
            node_id: node_id.map(str::to_string),
            message: message.into(),
            suggestion: Some(suggestion.to_string()),
        }
    }
}

/// Outcome of validating a set of links
///
/// Errors make the workflow unrunnable; warnings are shown but do not block
/// saving.
#[derive(Debug, Clone, Default)]
pub struct LinkValidationResult {
    pub errors: Vec<LinkIssue>,
    pub warnings: Vec<LinkIssue>,
}

impl LinkValidationResult {
    /// Whether no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates links against the block registry.
pub struct LinkValidator;

impl LinkValidator {
    /// Check a single link between two registered blocks.
    ///
    /// This is the query the editor runs while the author drags a
    /// connection, before any node ids exist.
    pub fn check(
        registry: &BlockRegistry,
        source_block: &str,
        source_port: &str,
        target_block: &str,
        target_port: &str,
    ) -> Result<(), LinkError> {
        let source = registry
            .get(source_block)
            .ok_or_else(|| LinkError::UnknownBlock(source_block.to_string()))?;
        let target = registry
            .get(target_block)
            .ok_or_else(|| LinkError::UnknownBlock(target_block.to_string()))?;
        Self::check_ports(registry, &source, source_port, &target, target_port)
    }

    /// Run every check against a set of nodes and the links between them.
    ///
    /// `nodes` maps each node id to the composite id of its block.
    pub fn validate(
        registry: &BlockRegistry,
        nodes: &HashMap<String, String>,
        links: &[Link],
    ) -> LinkValidationResult {
        let mut result = LinkValidationResult::default();

        let mut blocks = HashMap::new();
        for (node_id, composite_id) in nodes {
            match registry.get(composite_id) {
                Some(descriptor) => {
                    blocks.insert(node_id.as_str(), descriptor);
                }
                None => result.errors.push(LinkIssue::new(
                    Some(node_id.as_str()),
                    format!("Node '{}' uses unregistered block '{}'", node_id, composite_id),
                    "Load the plugin providing this block or remove the node",
                )),
            }
        }

        Self::check_referenced_nodes_exist(nodes, links, &mut result);
        Self::check_duplicate_links(links, &mut result);
        Self::check_link_ports(registry, &blocks, links, &mut result);
        Self::check_multiple_links(links, &mut result);
        Self::check_required_inputs_linked(&blocks, links, &mut result);

        result
    }

    fn check_referenced_nodes_exist(
        nodes: &HashMap<String, String>,
        links: &[Link],
        result: &mut LinkValidationResult,
    ) {
        for link in links {
            for node in [&link.source_node, &link.target_node] {
                if !nodes.contains_key(node) {
                    result.errors.push(LinkIssue::new(
                        Some(node.as_str()),
                        format!("Link references unknown node '{}'", node),
                        "Add the node to the workflow or remove the link",
                    ));
                }
            }
        }
    }

    fn check_duplicate_links(links: &[Link], result: &mut LinkValidationResult) {
        let mut seen = HashSet::new();
        for link in links.iter().filter(|link| !seen.insert(*link)) {
            result.errors.push(LinkIssue::new(
                None,
                format!(
                    "Duplicate link from {}:{} to {}:{}",
                    link.source_node, link.source_port, link.target_node, link.target_port,
                ),
                "Remove the duplicate link",
            ));
        }
    }

    /// Ports must exist, run output to input, and carry compatible types.
    fn check_link_ports(
        registry: &BlockRegistry,
        blocks: &HashMap<&str, Arc<BlockDescriptor>>,
        links: &[Link],
        result: &mut LinkValidationResult,
    ) {
        for link in links {
            let (Some(source), Some(target)) = (
                blocks.get(link.source_node.as_str()),
                blocks.get(link.target_node.as_str()),
            ) else {
                continue;
            };

            if let Err(err) = Self::check_ports(registry, source, &link.source_port, target, &link.target_port) {
                let (node, suggestion) = match &err {
                    LinkError::UnknownPort {
                        direction: PortDirection::Output,
                        ..
                    } => (&link.source_node, "Links must start at an output port"),
                    LinkError::UnknownPort { .. } => (&link.target_node, "Links must end at an input port"),
                    _ => (&link.target_node, "Insert a conversion block between the two ports"),
                };
                result.errors.push(LinkIssue::new(Some(node.as_str()), err.to_string(), suggestion));
            }
        }
    }

    /// An input port accepts at most one link.
    fn check_multiple_links(links: &[Link], result: &mut LinkValidationResult) {
        let mut per_input: HashMap<(&str, &str), usize> = HashMap::new();
        for link in links {
            *per_input
                .entry((link.target_node.as_str(), link.target_port.as_str()))
                .or_default() += 1;
        }

        for ((node_id, port), count) in per_input {
            if count > 1 {
                result.errors.push(LinkIssue::new(
                    Some(node_id),
                    format!("Input port '{}' on node '{}' has {} links", port, node_id, count),
                    "Remove extra links into this port",
                ));
            }
        }
    }

    // Inputs with a default run without a link, so only warn.
    fn check_required_inputs_linked(
        blocks: &HashMap<&str, Arc<BlockDescriptor>>,
        links: &[Link],
        result: &mut LinkValidationResult,
    ) {
        let linked: HashSet<(&str, &str)> = links
            .iter()
            .map(|l| (l.target_node.as_str(), l.target_port.as_str()))
            .collect();

        for (node_id, block) in blocks {
            for input in block.inputs.values() {
                if input.required && input.default.is_none() && !linked.contains(&(*node_id, input.name.as_str())) {
                    result.warnings.push(LinkIssue::new(
                        Some(*node_id),
                        format!("Required input '{}' on node '{}' is not linked", input.name, node_id),
                        "Link an output into this port",
                    ));
                }
            }
        }
    }

    fn check_ports(
        registry: &BlockRegistry,
        source: &BlockDescriptor,
        source_port: &str,
        target: &BlockDescriptor,
        target_port: &str,
    ) -> Result<(), LinkError> {
        let output = source.outputs.get(source_port).ok_or_else(|| LinkError::UnknownPort {
            block: source.composite_id.clone(),
            port: source_port.to_string(),
            direction: PortDirection::Output,
        })?;
        let input = target.inputs.get(target_port).ok_or_else(|| LinkError::UnknownPort {
            block: target.composite_id.clone(),
            port: target_port.to_string(),
            direction: PortDirection::Input,
        })?;

        if !registry.is_compatible(&output.type_id, &input.type_id) {
            return Err(LinkError::IncompatibleTypes {
                source_type: output.type_id.clone(),
                target_type: input.type_id.clone(),
            });
        }
        Ok(())
    }
}
