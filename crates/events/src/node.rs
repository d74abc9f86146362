//! Accessibility node tree model.

use serde::{Deserialize, Serialize};

/// One node of a captured accessibility tree.
///
/// Mirrors the subset of node attributes the extraction rules can match on.
/// Trees are immutable snapshots: the service glue builds one per callback
/// and hands ownership to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiNode {
    /// Fully-qualified view resource id (e.g. "com.didiglobal.driver:id/fare").
    #[serde(default)]
    pub resource_id: String,

    /// Widget class name (e.g. "android.widget.TextView").
    #[serde(default)]
    pub class_name: String,

    /// Visible text, if any.
    #[serde(default)]
    pub text: String,

    /// Content description, if any.
    #[serde(default)]
    pub content_description: String,

    #[serde(default)]
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf node carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Leaf node with a resource id and text.
    pub fn labeled(resource_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.content_description = description.into();
        self
    }

    pub fn with_children(mut self, children: Vec<UiNode>) -> Self {
        self.children = children;
        self
    }

    /// The text a rule matches against: node text, falling back to the
    /// content description when the text is empty.
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            &self.content_description
        } else {
            &self.text
        }
    }

    /// Depth-first traversal, parent before children.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a UiNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Number of nodes in the tree, this node included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    /// Lowercased, whitespace-collapsed concatenation of every node's
    /// visible text. Keyword and notification-style rules match this form.
    pub fn flat_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        self.visit(&mut |node| {
            let text = node.display_text().trim();
            if !text.is_empty() {
                parts.push(text.to_lowercase());
            }
        });
        collapse_whitespace(&parts.join(" "))
    }
}

/// Flatten newlines and runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
