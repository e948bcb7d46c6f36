//! The rendered snapshot: page identity, interactive elements, markdown.

use crate::refs::RefTable;

/// Everything one snapshot produced. The table inside becomes the session's
/// new live generation; the rendered text goes back to the client.
#[derive(Debug)]
pub struct Snapshot {
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub table: RefTable,
}

impl Snapshot {
    pub fn render(&self) -> String {
        format!(
            "# {}\nURL: {}\n\n## Interactive Elements\n{}\n\n## Page Content\n{}\n",
            self.title,
            self.url,
            self.table.format_tree(),
            self.markdown
        )
    }

    /// Rough cost estimate for LLM consumers.
    pub fn estimated_tokens(&self) -> usize {
        self.render().len() / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::NodeDescriptor;

    fn fixture_snapshot() -> Snapshot {
        let mut table = RefTable::new(1);
        table.push(NodeDescriptor {
            role: "link".to_string(),
            name: "Home".to_string(),
            value: None,
            description: None,
            backend_node_id: 2,
            properties: Vec::new(),
        });
        table.push(NodeDescriptor {
            role: "button".to_string(),
            name: "Submit".to_string(),
            value: None,
            description: None,
            backend_node_id: 4,
            properties: Vec::new(),
        });

        Snapshot {
            url: "https://example.com/form".to_string(),
            title: "Fixture".to_string(),
            markdown: "Some **content**".to_string(),
            table,
        }
    }

    #[test]
    fn test_render_sections() {
        let rendered = fixture_snapshot().render();
        assert!(rendered.starts_with("# Fixture\nURL: https://example.com/form\n"));
        assert!(rendered.contains("## Interactive Elements\n@e1: [link] \"Home\"\n@e2: [button] \"Submit\"\n"));
        assert!(rendered.contains("## Page Content\nSome **content**"));
    }

    #[test]
    fn test_fixture_has_exactly_two_tokens_in_document_order() {
        let snapshot = fixture_snapshot();
        assert_eq!(snapshot.table.len(), 2);
        assert_eq!(snapshot.table.get("@e1").unwrap().role, "link");
        assert_eq!(snapshot.table.get("@e2").unwrap().role, "button");
    }

    #[test]
    fn test_estimated_tokens_tracks_length() {
        let snapshot = fixture_snapshot();
        assert_eq!(snapshot.estimated_tokens(), snapshot.render().len() / 4);
    }
}
