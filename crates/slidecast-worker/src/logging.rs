//! Structured item logging utilities.
//!
//! Provides consistent, structured logging for content item processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

use slidecast_models::ItemState;

/// Logger bound to one processing attempt of one content item.
#[derive(Debug, Clone)]
pub struct ItemLogger {
    item_index: usize,
    token: String,
}

impl ItemLogger {
    /// Create a logger for the item at `item_index`, processed under `token`.
    pub fn new(item_index: usize, token: &str) -> Self {
        Self {
            item_index,
            token: token.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            item_index = self.item_index,
            token = %self.token,
            "Item started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            item_index = self.item_index,
            token = %self.token,
            "Item progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            item_index = self.item_index,
            token = %self.token,
            "Item warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            item_index = self.item_index,
            token = %self.token,
            "Item error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            item_index = self.item_index,
            token = %self.token,
            "Item completed: {}", message
        );
    }

    /// Log a state machine transition.
    pub fn log_transition(&self, from: ItemState, to: ItemState) {
        info!(
            item_index = self.item_index,
            token = %self.token,
            from = %from,
            to = %to,
            "Item state changed"
        );
    }

    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Span covering all work for this item.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "item",
            item_index = self.item_index,
            token = %self.token
        )
    }
}
