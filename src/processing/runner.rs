//! Bounded-concurrency driver shared by the extraction, alignment and
//! trimming stages.
//!
//! Every item gets its own task. A counting semaphore admits at most
//! `max_concurrent` of them into their worker body at once. The permit is
//! taken by the submitting loop before the task is spawned, so items are
//! admitted in submission order whatever the runtime flavour.
//! A failed or panicked item is recorded and never touches its siblings.

use crate::utils::progress::stage_progress_bar;
use crate::SplaceError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// One item that did not produce a result
#[derive(Debug)]
pub struct StageFailure<I> {
    pub item: I,
    pub error: SplaceError,
}

/// Aggregate result of one stage fan-out. `successes` follow input order.
#[derive(Debug)]
pub struct StageOutcome<I, T> {
    pub successes: Vec<T>,
    pub failures: Vec<StageFailure<I>>,
    pub total: usize,
}

impl<I, T> StageOutcome<I, T> {
    pub fn succeeded(&self) -> usize {
        self.successes.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn into_successes(self) -> Vec<T> {
        self.successes
    }
}

pub struct StageRunner {
    stage: String,
    max_concurrent: usize,
    show_progress: bool,
}

impl StageRunner {
    pub fn new(stage: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            stage: stage.into(),
            max_concurrent: max_concurrent.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Map `worker` over `items` with at most `max_concurrent` workers
    /// running at once. Never fails as a whole; inspect the outcome.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, worker: F) -> StageOutcome<I, T>
    where
        I: Clone + fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, SplaceError>> + Send + 'static,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let pb = stage_progress_bar(total, &self.stage, self.show_progress);

        let mut tasks = Vec::with_capacity(total);
        for item in items {
            let semaphore = semaphore.clone();
            let pb = pb.clone();
            let work = worker(item.clone());
            let permit = semaphore.acquire_owned().await;

            let task = tokio::spawn(async move {
                let _permit = permit
                    .map_err(|e| SplaceError::Other(format!("admission gate closed: {}", e)))?;
                let result = work.await;
                pb.inc(1);
                result
            });
            tasks.push((item, task));
        }

        let mut successes = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (item, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(SplaceError::Other(format!("worker task aborted: {}", e))),
            };
            match result {
                Ok(value) => successes.push(value),
                Err(e) => {
                    error!("{} failed for {:?}: {}", self.stage, item, e);
                    failures.push(StageFailure { item, error: e });
                }
            }
        }
        pb.finish_and_clear();

        info!("{}: {}/{} successful", self.stage, successes.len(), total);
        StageOutcome {
            successes,
            failures,
            total,
        }
    }
}
