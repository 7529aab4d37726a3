//! Concurrent task orchestration
//!
//! Runs crawl tasks on a bounded worker pool. Every task gets its own
//! session client, so the only state crossing worker boundaries is the
//! progress tracker, which serializes its own writes. A failing task is
//! logged with its identity and never cancels its siblings.

use crate::crawler::{PaginationEngine, RunContext, WindowOutcome};
use crate::scheduler::CrawlTask;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Aggregate outcome of one orchestrated run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks whose window was paginated to exhaustion
    pub completed: usize,
    /// Tasks stopped early by a shutdown request
    pub interrupted: usize,
    /// Tasks aborted by a task-fatal error
    pub failed: usize,
}

/// Outcome of a single task, for tallying
enum TaskOutcome {
    Completed,
    Interrupted,
    Failed,
}

/// Dispatches crawl tasks to a fixed-size worker pool
pub struct TaskOrchestrator {
    ctx: Arc<RunContext>,
    worker_count: usize,
}

impl TaskOrchestrator {
    pub fn new(ctx: Arc<RunContext>, worker_count: usize) -> Self {
        Self {
            ctx,
            worker_count: worker_count.max(1),
        }
    }

    /// Runs all tasks to completion and reports the aggregate outcome
    ///
    /// Admission is bounded by a semaphore sized to the worker count; each
    /// task holds its permit for its entire lifetime. Once shutdown is
    /// requested no further tasks are dispatched, and in-flight tasks stop at
    /// their next row/page boundary.
    pub async fn run(&self, tasks: Vec<CrawlTask>) -> RunSummary {
        let total = tasks.len();
        tracing::info!(
            "Dispatching {} tasks across {} workers",
            total,
            self.worker_count
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut join_set = JoinSet::new();
        let mut dispatched = 0usize;

        for task in tasks {
            if self.ctx.shutdown_requested() {
                tracing::warn!(
                    "Shutdown requested; {} of {} tasks not dispatched",
                    total - dispatched,
                    total
                );
                break;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let ctx = self.ctx.clone();
            dispatched += 1;
            join_set.spawn(async move {
                let _permit = permit;
                run_task(ctx, task).await
            });
        }

        let mut summary = RunSummary::default();
        let mut finished = 0usize;
        while let Some(joined) = join_set.join_next().await {
            finished += 1;
            match joined {
                Ok(TaskOutcome::Completed) => summary.completed += 1,
                Ok(TaskOutcome::Interrupted) => summary.interrupted += 1,
                Ok(TaskOutcome::Failed) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Worker panicked: {}", e);
                }
            }
            tracing::info!("Finished task {}/{}", finished, dispatched);
        }

        tracing::info!(
            "Run finished: {} completed, {} interrupted, {} failed",
            summary.completed,
            summary.interrupted,
            summary.failed
        );
        summary
    }
}

/// Runs one task in full isolation; all failures are absorbed here
async fn run_task(ctx: Arc<RunContext>, task: CrawlTask) -> TaskOutcome {
    tracing::info!("Starting {}", task);

    let mut engine = match PaginationEngine::for_task(ctx, &task.court_code) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to set up {}: {}", task, e);
            return TaskOutcome::Failed;
        }
    };

    match engine.run(&task).await {
        Ok(WindowOutcome::Completed) => TaskOutcome::Completed,
        Ok(WindowOutcome::Interrupted) => TaskOutcome::Interrupted,
        Err(e) => {
            tracing::error!("Failed {}: {}", task, e);
            TaskOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::TextRecognizer;
    use crate::config::{Config, CrawlConfig, OcrConfig, OutputConfig, PortalConfig, UploadConfig};
    use crate::courts::CourtRegistry;
    use crate::scheduler::DateWindow;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::Path;

    fn test_ctx(dir: &Path) -> Arc<RunContext> {
        let config = Config {
            crawl: CrawlConfig::default(),
            portal: PortalConfig {
                // Nothing listens here; setup failures are the point.
                base_url: "http://127.0.0.1:9".to_string(),
            },
            output: OutputConfig {
                data_dir: dir.join("data"),
                progress_path: dir.join("track.json"),
                court_codes_path: dir.join("court-codes.json"),
                captcha_tmp_dir: dir.join("captcha"),
            },
            upload: UploadConfig::default(),
            ocr: OcrConfig::default(),
        };
        let mut courts = HashMap::new();
        courts.insert("9~13".to_string(), "Bombay High Court".to_string());
        let recognizer: Arc<dyn TextRecognizer> = Arc::new(|_: &Path| Vec::<String>::new());
        Arc::new(
            RunContext::new(config, CourtRegistry::from_map(courts), recognizer, None).unwrap(),
        )
    }

    fn task_for(code: &str) -> CrawlTask {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
        )
        .unwrap();
        CrawlTask {
            id: uuid::Uuid::new_v4(),
            court_code: code.to_string(),
            window,
        }
    }

    #[tokio::test]
    async fn test_failed_task_does_not_cancel_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        let orchestrator = TaskOrchestrator::new(ctx, 2);

        // An unknown court fails at setup; an unreachable portal fails the
        // other task. Both are tallied, neither takes the pool down.
        let summary = orchestrator
            .run(vec![task_for("0~0"), task_for("9~13")])
            .await;

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.completed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(dir.path());
        ctx.request_shutdown();
        let orchestrator = TaskOrchestrator::new(ctx, 2);

        let summary = orchestrator.run(vec![task_for("9~13")]).await;
        assert_eq!(summary, RunSummary::default());
    }
}
