//! Item pipeline: plan, fan-out render, join, mark complete.
//!
//! Items are processed strictly one after another. Within an item, slides
//! render concurrently up to the configured limit. An item either ends with
//! its final video published and its store entry updated, or fails without
//! touching the store; a failed item never stops the run.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use slidecast_media::MediaEncoder;
use slidecast_models::{ContentItem, ItemState, RenderedSlide, SlidePlan};
use slidecast_queue::ContentQueue;

use crate::collaborators::{ImageGenerator, SpeechSynthesizer, TextPlanner};
use crate::concatenator::Concatenator;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::ItemLogger;
use crate::metrics::record_item_outcome;
use crate::planner::SlidePlanner;
use crate::renderer::SlideRenderer;
use crate::workspace::Workspace;

/// Why an item was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `video_name` already set.
    AlreadyRendered,
    /// No text, image URL or video URL to work from.
    NoSource,
}

/// Result of handling one content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Skipped {
        index: usize,
        reason: SkipReason,
    },
    Succeeded {
        index: usize,
        video_name: String,
    },
    Failed {
        index: usize,
        /// State the item was in when it failed.
        state: ItemState,
        error: String,
    },
}

impl ItemOutcome {
    pub fn index(&self) -> usize {
        match self {
            ItemOutcome::Skipped { index, .. }
            | ItemOutcome::Succeeded { index, .. }
            | ItemOutcome::Failed { index, .. } => *index,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Skipped { .. } => "skipped",
            ItemOutcome::Succeeded { .. } => "succeeded",
            ItemOutcome::Failed { .. } => "failed",
        }
    }
}

/// Per-item outcomes of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ItemOutcome>,
    /// The run stopped early on a shutdown signal.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.count("succeeded")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    fn count(&self, label: &str) -> usize {
        self.outcomes.iter().filter(|o| o.label() == label).count()
    }
}

/// Tracks an item's state and enforces legal transitions.
struct ItemRun<'a> {
    state: ItemState,
    logger: &'a ItemLogger,
}

impl<'a> ItemRun<'a> {
    fn new(logger: &'a ItemLogger) -> Self {
        Self {
            state: ItemState::Pending,
            logger,
        }
    }

    fn state(&self) -> ItemState {
        self.state
    }

    fn advance(&mut self, next: ItemState) -> WorkerResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(WorkerError::internal(format!(
                "illegal item transition {} -> {}",
                self.state, next
            )));
        }
        self.logger.log_transition(self.state, next);
        self.state = next;
        Ok(())
    }
}

/// Drives content items through the pipeline.
pub struct Orchestrator {
    config: PipelineConfig,
    planner: SlidePlanner,
    renderer: SlideRenderer,
    concatenator: Concatenator,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        text: Arc<dyn TextPlanner>,
        images: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        encoder: Arc<dyn MediaEncoder>,
    ) -> Self {
        let renderer = SlideRenderer::new(
            images,
            speech,
            encoder.clone(),
            config.encoding.width,
            config.encoding.height,
        );

        Self {
            planner: SlidePlanner::new(text),
            renderer,
            concatenator: Concatenator::new(encoder),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every item in store order.
    pub async fn run(&self, queue: &mut ContentQueue) -> WorkerResult<RunSummary> {
        let (_tx, rx) = watch::channel(false);
        self.run_until(queue, rx).await
    }

    /// Process every item in store order, stopping before the next item once
    /// `shutdown` reads `true`.
    ///
    /// Item failures are reported in the summary. Errors returned here are
    /// fatal: the store could not be read back or written.
    pub async fn run_until(
        &self,
        queue: &mut ContentQueue,
        shutdown: watch::Receiver<bool>,
    ) -> WorkerResult<RunSummary> {
        let mut summary = RunSummary::default();

        info!(
            items = queue.len(),
            eligible = queue.eligible_indices().len(),
            store = %queue.path().display(),
            "Starting run"
        );

        for index in 0..queue.len() {
            if *shutdown.borrow() {
                warn!(next_item = index, "Shutdown requested, stopping before next item");
                summary.interrupted = true;
                break;
            }

            let outcome = self.process_item(queue, index).await?;
            debug!(item_index = outcome.index(), outcome = outcome.label(), "Item handled");
            record_item_outcome(outcome.label());
            summary.outcomes.push(outcome);
        }

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            skipped = summary.skipped(),
            interrupted = summary.interrupted,
            "Run finished"
        );
        Ok(summary)
    }

    /// Handle the item at `index`.
    pub async fn process_item(
        &self,
        queue: &mut ContentQueue,
        index: usize,
    ) -> WorkerResult<ItemOutcome> {
        let item = queue
            .item(index)
            .cloned()
            .ok_or_else(|| WorkerError::internal(format!("no item at index {}", index)))?;

        if item.is_complete() {
            debug!(item_index = index, "Already rendered, skipping");
            return Ok(ItemOutcome::Skipped {
                index,
                reason: SkipReason::AlreadyRendered,
            });
        }
        if !item.has_source() {
            debug!(item_index = index, "No source material, skipping");
            return Ok(ItemOutcome::Skipped {
                index,
                reason: SkipReason::NoSource,
            });
        }

        let token = Uuid::new_v4().simple().to_string();
        let logger = ItemLogger::new(index, &token);
        let span = logger.create_span();

        self.process_eligible(queue, &item, &logger)
            .instrument(span)
            .await
    }

    async fn process_eligible(
        &self,
        queue: &mut ContentQueue,
        item: &ContentItem,
        logger: &ItemLogger,
    ) -> WorkerResult<ItemOutcome> {
        let index = logger.item_index();
        let mut run = ItemRun::new(logger);
        logger.log_start("acquiring workspace");

        let workspace =
            match Workspace::acquire(&self.config.output_dir, logger.token(), index).await {
                Ok(ws) => ws,
                Err(e) => {
                    let state = run.state();
                    run.advance(ItemState::Failed)?;
                    logger.log_error(&e.to_string());
                    return Ok(ItemOutcome::Failed {
                        index,
                        state,
                        error: e.to_string(),
                    });
                }
            };

        let video_name = format!("{}_{}.mp4", logger.token(), index);
        let output_path = self.config.output_dir.join(&video_name);

        match self.produce(item, &workspace, &output_path, &mut run).await {
            Ok(()) => {
                if let Err(e) = workspace.release().await {
                    logger.log_warning(&e.to_string());
                }

                queue.mark_complete(index, video_name.as_str())?;
                queue.persist().await?;

                logger.log_completion(&video_name);
                Ok(ItemOutcome::Succeeded { index, video_name })
            }
            Err(e) if e.is_item_scoped() => {
                let state = run.state();
                run.advance(ItemState::Failed)?;
                logger.log_error(&e.to_string());

                if self.config.keep_failed_workspaces {
                    let kept = workspace.retain();
                    logger.log_warning(&format!("kept workspace {}", kept.display()));
                } else if let Err(cleanup) = workspace.release().await {
                    logger.log_warning(&cleanup.to_string());
                }

                Ok(ItemOutcome::Failed {
                    index,
                    state,
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn produce(
        &self,
        item: &ContentItem,
        workspace: &Workspace,
        output_path: &Path,
        run: &mut ItemRun<'_>,
    ) -> WorkerResult<()> {
        run.advance(ItemState::Planning)?;
        let plan = self
            .planner
            .plan(item.text(), item.image_url(), item.video_url())
            .await?;
        run.logger.log_progress(&format!("planned {} slides", plan.len()));

        run.advance(ItemState::Rendering)?;
        let rendered = self.render_all(&plan, workspace).await?;

        run.advance(ItemState::Concatenating)?;
        self.concatenator
            .concatenate(rendered, workspace, output_path)
            .await?;

        run.advance(ItemState::Completed)
    }

    /// Render every slide, at most `slide_parallelism()` at a time.
    ///
    /// After the first failure no new render starts; renders already running
    /// finish and their results are discarded.
    async fn render_all(
        &self,
        plan: &SlidePlan,
        workspace: &Workspace,
    ) -> WorkerResult<Vec<RenderedSlide>> {
        let semaphore = Semaphore::new(self.config.slide_parallelism());
        let abort = AtomicBool::new(false);

        let renders = plan.slides.iter().enumerate().map(|(index, slide)| {
            let semaphore = &semaphore;
            let abort = &abort;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| WorkerError::internal("render semaphore closed"))?;

                if abort.load(Ordering::SeqCst) {
                    return Ok(None);
                }

                match self.renderer.render(slide, index, workspace).await {
                    Ok(rendered) => Ok(Some(rendered)),
                    Err(e) => {
                        abort.store(true, Ordering::SeqCst);
                        warn!(slide_index = index, error = %e, "Slide render failed");
                        Err(e)
                    }
                }
            }
        });

        let results = join_all(renders).await;

        let mut rendered = Vec::with_capacity(plan.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(Some(slide)) => rendered.push(slide),
                Ok(None) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        ensure_complete_set(rendered, plan.len())
    }
}

/// Sort by index and require exactly one segment for each of `0..expected`.
fn ensure_complete_set(
    mut rendered: Vec<RenderedSlide>,
    expected: usize,
) -> WorkerResult<Vec<RenderedSlide>> {
    rendered.sort_by_key(|r| r.index);

    let matches = rendered.len() == expected
        && rendered.iter().enumerate().all(|(i, r)| r.index == i);
    if !matches {
        let indices: Vec<usize> = rendered.iter().map(|r| r.index).collect();
        return Err(WorkerError::internal(format!(
            "rendered slides {:?} do not cover 0..{}",
            indices, expected
        )));
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slides(indices: &[usize]) -> Vec<RenderedSlide> {
        indices
            .iter()
            .map(|&i| RenderedSlide::new(i, format!("slide_{}.mp4", i)))
            .collect()
    }

    #[test]
    fn test_complete_set_sorts() {
        let sorted = ensure_complete_set(slides(&[2, 0, 3, 1]), 4).unwrap();
        let indices: Vec<usize> = sorted.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_complete_set_rejects_gaps_and_duplicates() {
        assert!(ensure_complete_set(slides(&[0, 1, 3]), 4).is_err());
        assert!(ensure_complete_set(slides(&[0, 1, 1, 2]), 4).is_err());
        assert!(ensure_complete_set(slides(&[0, 1, 2, 3, 4]), 4).is_err());
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            outcomes: vec![
                ItemOutcome::Skipped {
                    index: 0,
                    reason: SkipReason::AlreadyRendered,
                },
                ItemOutcome::Succeeded {
                    index: 1,
                    video_name: "a_1.mp4".to_string(),
                },
                ItemOutcome::Failed {
                    index: 2,
                    state: ItemState::Rendering,
                    error: "boom".to_string(),
                },
            ],
            interrupted: false,
        };
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.outcomes[2].index(), 2);
    }
}
