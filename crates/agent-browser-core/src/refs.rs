//! Reference tokens and the per-generation reference table.
//!
//! Tokens are `@e<N>`, assigned from 1 in accessibility traversal order.
//! Exactly one table is live per browser session; producers build a whole
//! new table and the session swaps it in, so resolvers never observe a
//! half-built generation.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// AX properties worth surfacing to an agent. Everything else is dropped at
/// extraction time.
pub const KEPT_PROPERTIES: [&str; 5] = ["disabled", "required", "checked", "selected", "readonly"];

/// Role/name/value snapshot of one interactive element at extraction time.
/// Never mutated after creation; a fresh extraction builds new descriptors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NodeDescriptor {
    pub role: String,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    /// Opaque stable identifier understood by the engine (CDP backend node id).
    pub backend_node_id: i64,
    /// Restricted to [`KEPT_PROPERTIES`], in extraction order.
    pub properties: Vec<(String, Value)>,
}

impl NodeDescriptor {
    /// One tree line: `@e1: [link] "Home" value="x" disabled=true`.
    pub fn format_line(&self, token: &str) -> String {
        let mut line = format!("{}: [{}] \"{}\"", token, self.role, self.name);
        if let Some(value) = &self.value {
            line.push_str(&format!(" value=\"{}\"", value));
        }
        for (name, value) in &self.properties {
            match value {
                Value::String(s) => line.push_str(&format!(" {}={}", name, s)),
                other => line.push_str(&format!(" {}={}", name, other)),
            }
        }
        line
    }
}

/// The full token → descriptor mapping for one generation.
#[derive(Debug, Default)]
pub struct RefTable {
    generation: u64,
    entries: HashMap<String, NodeDescriptor>,
    order: Vec<String>,
}

impl RefTable {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Assigns the next sequential token, starting at `@e1`.
    pub fn push(&mut self, descriptor: NodeDescriptor) -> String {
        let token = format!("@e{}", self.order.len() + 1);
        self.entries.insert(token.clone(), descriptor);
        self.order.push(token.clone());
        token
    }

    pub fn get(&self, token: &str) -> Option<&NodeDescriptor> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tokens with their descriptors, in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeDescriptor)> {
        self.order
            .iter()
            .filter_map(|token| self.entries.get(token).map(|d| (token.as_str(), d)))
    }

    /// The `## Interactive Elements` body: one line per node.
    pub fn format_tree(&self) -> String {
        self.iter()
            .map(|(token, descriptor)| descriptor.format_line(token))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
