//! Accessibility extraction: reduce a full AX tree to the interactive nodes
//! an agent can act on, assigning reference tokens in traversal order.

use serde_json::Value;

use crate::refs::{NodeDescriptor, RefTable, KEPT_PROPERTIES};

/// Roles an agent can usefully interact with. Everything else in the AX tree
/// is noise for action purposes; the page markdown carries the prose.
pub const INTERACTIVE_ROLES: [&str; 16] = [
    "button",
    "link",
    "textbox",
    "checkbox",
    "radio",
    "combobox",
    "menuitem",
    "tab",
    "slider",
    "spinbutton",
    "searchbox",
    "switch",
    "option",
    "listbox",
    "menu",
    "menubar",
];

/// Engine-independent view of one AX node, in document traversal order.
#[derive(Debug, Clone, Default)]
pub struct AxNodeData {
    pub role: Option<String>,
    pub name: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub ignored: bool,
    pub backend_node_id: Option<i64>,
    pub properties: Vec<(String, Value)>,
}

/// Builds a complete new table generation from a traversal-ordered node list.
/// Nodes with non-interactive roles, ignored nodes, and nodes without a
/// backend id (unaddressable later) are dropped.
pub fn extract(nodes: &[AxNodeData], generation: u64) -> RefTable {
    let mut table = RefTable::new(generation);

    for node in nodes {
        let role = match node.role.as_deref() {
            Some(role) if INTERACTIVE_ROLES.contains(&role) => role,
            _ => continue,
        };
        if node.ignored {
            continue;
        }
        let backend_node_id = match node.backend_node_id {
            Some(id) => id,
            None => continue,
        };

        let properties = node
            .properties
            .iter()
            .filter(|(name, _)| KEPT_PROPERTIES.contains(&name.as_str()))
            .cloned()
            .collect();

        table.push(NodeDescriptor {
            role: role.to_string(),
            name: node.name.clone().unwrap_or_default(),
            value: node.value.clone(),
            description: node.description.clone(),
            backend_node_id,
            properties,
        });
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(role: &str, name: &str, backend: i64) -> AxNodeData {
        AxNodeData {
            role: Some(role.to_string()),
            name: Some(name.to_string()),
            backend_node_id: Some(backend),
            ..Default::default()
        }
    }

    #[test]
    fn test_link_and_button_in_document_order() {
        let nodes = vec![
            node("RootWebArea", "Fixture", 1),
            node("link", "Home", 2),
            node("paragraph", "", 3),
            node("button", "Submit", 4),
        ];

        let table = extract(&nodes, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("@e1").unwrap().role, "link");
        assert_eq!(table.get("@e2").unwrap().role, "button");
        assert!(table.get("@e3").is_none());
    }

    #[test]
    fn test_ignored_nodes_are_dropped() {
        let mut hidden = node("button", "Invisible", 5);
        hidden.ignored = true;
        let nodes = vec![hidden, node("button", "Visible", 6)];

        let table = extract(&nodes, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("@e1").unwrap().name, "Visible");
    }

    #[test]
    fn test_nodes_without_backend_id_are_dropped() {
        let mut orphan = node("link", "Nowhere", 0);
        orphan.backend_node_id = None;
        let table = extract(&[orphan], 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_property_bag_is_restricted() {
        let mut checkbox = node("checkbox", "Terms", 9);
        checkbox.properties = vec![
            ("checked".to_string(), json!(true)),
            ("focusable".to_string(), json!(true)),
            ("disabled".to_string(), json!(false)),
            ("level".to_string(), json!(2)),
        ];

        let table = extract(&[checkbox], 1);
        let descriptor = table.get("@e1").unwrap();
        assert_eq!(
            descriptor.properties,
            vec![
                ("checked".to_string(), json!(true)),
                ("disabled".to_string(), json!(false)),
            ]
        );
    }

    #[test]
    fn test_missing_name_becomes_empty_string() {
        let mut unnamed = node("textbox", "", 3);
        unnamed.name = None;
        let table = extract(&[unnamed], 1);
        assert_eq!(table.get("@e1").unwrap().name, "");
    }

    #[test]
    fn test_all_interactive_roles_are_kept() {
        let nodes: Vec<AxNodeData> = INTERACTIVE_ROLES
            .iter()
            .enumerate()
            .map(|(i, role)| node(role, "x", i as i64 + 1))
            .collect();
        let table = extract(&nodes, 1);
        assert_eq!(table.len(), INTERACTIVE_ROLES.len());
    }
}
