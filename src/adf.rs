/// Atlassian Document Format helpers
///
/// Jira Cloud stores long text fields as a tree of typed nodes. The service only
/// needs two things from it: pull the first plain-text run out of a description,
/// and wrap plain text into a single-paragraph document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node of a rich document.
///
/// Every field is optional so that unknown node types and partial documents
/// still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdfNode {
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<AdfNode>,
}

impl AdfNode {
    pub fn text(text: &str) -> Self {
        Self {
            node_type: "text".to_string(),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn paragraph(children: Vec<AdfNode>) -> Self {
        Self {
            node_type: "paragraph".to_string(),
            content: children,
            ..Default::default()
        }
    }

    /// Document holding one paragraph with `text`
    pub fn document(text: &str) -> Self {
        Self {
            node_type: "doc".to_string(),
            version: Some(1),
            content: vec![AdfNode::paragraph(vec![AdfNode::text(text)])],
            ..Default::default()
        }
    }

    /// Text of the first run inside the first block of this document
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()?
            .content
            .iter()
            .find_map(|node| node.text.as_deref())
    }
}

/// Extract the first plain-text run of a description field.
///
/// Returns an empty string for `null`, plain strings of the wrong shape,
/// empty documents and anything else that does not look like a document.
pub fn first_text(field: &Value) -> String {
    if field.is_null() {
        return String::new();
    }

    serde_json::from_value::<AdfNode>(field.clone())
        .ok()
        .and_then(|doc| doc.first_text().map(|s| s.to_string()))
        .unwrap_or_default()
}

/// Wrap plain text into the JSON envelope Jira expects for description fields
pub fn to_document(text: &str) -> Value {
    serde_json::to_value(AdfNode::document(text)).unwrap_or(Value::Null)
}
