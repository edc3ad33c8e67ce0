//! Persisted content queue.
//!
//! This crate provides:
//! - Loading the JSON content store with shape validation
//! - Eligibility rules for which items still need a video
//! - Completion markers that never overwrite an existing video name
//! - Atomic write-back preserving field order and unknown fields

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::ContentQueue;
