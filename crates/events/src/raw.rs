//! Raw input events from the two observed OS streams.

use crate::node::{collapse_whitespace, UiNode};
use serde::{Deserialize, Serialize};

/// A raw event handed in by the service glue.
///
/// Immutable once created; the pipeline owns it until consumed. Both
/// variants carry the wall-clock timestamp of the originating callback and
/// the package that produced the screen/notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEvent {
    /// Snapshot of the observed app's accessibility tree.
    AccessibilitySnapshot {
        tree: UiNode,
        timestamp_ms: i64,
        source_app: String,
    },

    /// A posted status-bar notification.
    NotificationPosted {
        title: String,
        text: String,
        #[serde(default)]
        sub_text: String,
        /// Expanded-style extra text lines, when the notification has them.
        #[serde(default)]
        extra_lines: Vec<String>,
        timestamp_ms: i64,
        package_name: String,
    },
}

impl RawEvent {
    pub fn snapshot(tree: UiNode, timestamp_ms: i64, source_app: impl Into<String>) -> Self {
        Self::AccessibilitySnapshot {
            tree,
            timestamp_ms,
            source_app: source_app.into(),
        }
    }

    pub fn notification(
        title: impl Into<String>,
        text: impl Into<String>,
        timestamp_ms: i64,
        package_name: impl Into<String>,
    ) -> Self {
        Self::NotificationPosted {
            title: title.into(),
            text: text.into(),
            sub_text: String::new(),
            extra_lines: Vec::new(),
            timestamp_ms,
            package_name: package_name.into(),
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Self::AccessibilitySnapshot { timestamp_ms, .. }
            | Self::NotificationPosted { timestamp_ms, .. } => *timestamp_ms,
        }
    }

    /// Package that produced the event.
    pub fn package(&self) -> &str {
        match self {
            Self::AccessibilitySnapshot { source_app, .. } => source_app,
            Self::NotificationPosted { package_name, .. } => package_name,
        }
    }

    /// Flattened, lowercased notification body: title, text, sub-text and
    /// extra lines joined by spaces with newlines collapsed. `None` for
    /// accessibility snapshots.
    pub fn notification_body(&self) -> Option<String> {
        match self {
            Self::AccessibilitySnapshot { .. } => None,
            Self::NotificationPosted {
                title,
                text,
                sub_text,
                extra_lines,
                ..
            } => {
                let mut parts: Vec<&str> = vec![title, text, sub_text];
                parts.extend(extra_lines.iter().map(String::as_str));
                let joined = parts
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(collapse_whitespace(&joined.to_lowercase()))
            }
        }
    }
}
