//! Per-item processing state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one content item during a run.
///
/// ```text
/// Pending -> Planning -> Rendering -> Concatenating -> Completed
///    \           \            \              \
///     +-----------+------------+--------------+--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Eligible and waiting to be processed
    #[default]
    Pending,
    /// Waiting on the text-planning service
    Planning,
    /// Slides are being rendered
    Rendering,
    /// Segments are being joined
    Concatenating,
    /// Final video written and item marked complete
    Completed,
    /// Processing stopped; the item stays pending for a later run
    Failed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Planning => "planning",
            ItemState::Rendering => "rendering",
            ItemState::Concatenating => "concatenating",
            ItemState::Completed => "completed",
            ItemState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Completed | ItemState::Failed)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;

        match (self, next) {
            (Pending, Planning)
            | (Planning, Rendering)
            | (Rendering, Concatenating)
            | (Concatenating, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            ItemState::Pending,
            ItemState::Planning,
            ItemState::Rendering,
            ItemState::Concatenating,
            ItemState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        assert!(ItemState::Pending.can_transition_to(ItemState::Failed));
        assert!(ItemState::Rendering.can_transition_to(ItemState::Failed));
        assert!(!ItemState::Completed.can_transition_to(ItemState::Failed));
        assert!(!ItemState::Failed.can_transition_to(ItemState::Failed));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!ItemState::Pending.can_transition_to(ItemState::Rendering));
        assert!(!ItemState::Planning.can_transition_to(ItemState::Completed));
        assert!(!ItemState::Failed.can_transition_to(ItemState::Pending));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ItemState::Concatenating).unwrap();
        assert_eq!(json, "\"concatenating\"");
    }
}
