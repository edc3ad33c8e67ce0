//! Shared data models for the slidecast pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Content items read from the persisted queue
//! - Slide plans returned by the text-planning service
//! - Rendered slide segments
//! - Per-item processing state
//! - Segment encoding configuration

pub mod content;
pub mod encoding;
pub mod item_state;
pub mod slide;

// Re-export common types
pub use content::ContentItem;
pub use encoding::SegmentEncoding;
pub use item_state::ItemState;
pub use slide::{PlanShapeError, RenderedSlide, Slide, SlidePlan, MAX_SLIDES, MIN_SLIDES};
