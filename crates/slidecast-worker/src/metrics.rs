//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Items handled per run, by outcome (skipped / succeeded / failed).
    pub const ITEMS_TOTAL: &str = "slidecast_items_total";

    /// Slides rendered successfully.
    pub const SLIDES_RENDERED_TOTAL: &str = "slidecast_slides_rendered_total";

    /// Wall time of one slide render in seconds.
    pub const SLIDE_RENDER_SECONDS: &str = "slidecast_slide_render_seconds";
}

/// Record the outcome of one content item.
pub fn record_item_outcome(outcome: &'static str) {
    counter!(names::ITEMS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a finished slide render.
pub fn record_slide_rendered(elapsed_secs: f64) {
    counter!(names::SLIDES_RENDERED_TOTAL).increment(1);
    histogram!(names::SLIDE_RENDER_SECONDS).record(elapsed_secs);
}
