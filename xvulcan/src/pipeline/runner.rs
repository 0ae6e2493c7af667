//! Staged pipeline runner.
//!
//! A [`Pipeline`] is an ordered list of [`StageGroup`]s. Stages within a
//! group run concurrently as tokio tasks; groups run one after another.
//! Every stage transition is published to the job store as
//! `<stage>:<state>`.

use super::context::StageContext;
use super::error::{PipelineOutcome, StageError};
use crate::store::{JobStatus, StageState};
use futures::future::join_all;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Boxed future returned by [`Stage::execute`].
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<(), StageError>> + Send + 'a>>;

/// One unit of pipeline work.
///
/// Stages share nothing but the store and the job's files; everything a
/// stage needs is read through the [`StageContext`].
pub trait Stage: Send + Sync {
    /// Name used as the status prefix, e.g. `fetch_imagery`.
    fn name(&self) -> &str;

    fn execute<'a>(&'a self, ctx: &'a StageContext) -> StageFuture<'a>;
}

/// How often a failing stage is attempted before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Stages that run concurrently.
#[derive(Default, Clone)]
pub struct StageGroup {
    stages: Vec<Arc<dyn Stage>>,
}

impl StageGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group holding just `stage`.
    pub fn single(stage: impl Stage + 'static) -> Self {
        Self::new().with(stage)
    }

    pub fn with(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Ordered stage groups plus the retry policy applied to every stage.
#[derive(Default, Clone)]
pub struct Pipeline {
    groups: Vec<StageGroup>,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a group that starts after all earlier groups finished.
    pub fn then(mut self, group: StageGroup) -> Self {
        if !group.is_empty() {
            self.groups.push(group);
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.groups.iter().flat_map(|g| g.names()).collect()
    }

    /// Runs every group for the job in `ctx`.
    ///
    /// The first failing stage of a group (in declaration order) is
    /// published as `<stage>:error` once the whole group has finished, and
    /// no later group runs. When the last group succeeds the job is `done`.
    pub async fn run(&self, ctx: &StageContext) -> PipelineOutcome {
        let start = Instant::now();
        info!(job_id = %ctx.job_id, stages = ?self.stage_names(), "Pipeline started");

        for group in &self.groups {
            let handles: Vec<_> = group
                .stages
                .iter()
                .map(|stage| {
                    let stage = Arc::clone(stage);
                    let ctx = ctx.clone();
                    let retry = self.retry;
                    tokio::spawn(async move { run_stage(stage.as_ref(), &ctx, retry).await })
                })
                .collect();

            let results = join_all(handles).await;

            let failure = group
                .stages
                .iter()
                .zip(results)
                .find_map(|(stage, joined)| match joined {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some((stage.name().to_string(), e)),
                    Err(e) => Some((stage.name().to_string(), StageError::from(e))),
                });

            if let Some((stage, error)) = failure {
                return fail(ctx, stage, error);
            }
        }

        if let Err(e) = ctx.store.set_status(&ctx.job_id, JobStatus::Done) {
            let stage = self
                .stage_names()
                .last()
                .map(|s| s.to_string())
                .unwrap_or_default();
            return fail(ctx, stage, e.into());
        }

        info!(
            job_id = %ctx.job_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline completed"
        );
        PipelineOutcome::Completed
    }
}

fn fail(ctx: &StageContext, stage: String, error: StageError) -> PipelineOutcome {
    error!(job_id = %ctx.job_id, stage = %stage, error = %error, "Stage failed");

    if let Err(e) = ctx
        .store
        .set_status(&ctx.job_id, JobStatus::stage(&stage, StageState::Error))
    {
        warn!(job_id = %ctx.job_id, stage = %stage, error = %e, "Could not record stage error");
    }

    PipelineOutcome::Failed { stage, error }
}

async fn run_stage(
    stage: &dyn Stage,
    ctx: &StageContext,
    retry: RetryPolicy,
) -> Result<(), StageError> {
    let name = stage.name();
    ctx.store
        .set_status(&ctx.job_id, JobStatus::stage(name, StageState::Start))?;
    debug!(job_id = %ctx.job_id, stage = name, "Stage started");

    let start = Instant::now();
    let mut attempt = 1;
    loop {
        match stage.execute(ctx).await {
            Ok(()) => break,
            Err(e) if attempt < retry.max_attempts => {
                warn!(
                    job_id = %ctx.job_id,
                    stage = name,
                    attempt,
                    error = %e,
                    "Stage attempt failed, retrying"
                );
                tokio::time::sleep(retry.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }

    ctx.store
        .set_status(&ctx.job_id, JobStatus::stage(name, StageState::End))?;
    info!(
        job_id = %ctx.job_id,
        stage = name,
        attempts = attempt,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Stage finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::BoundingBox;
    use crate::layout::JobLayout;
    use crate::store::{JobId, JobRecord, JobStore, MemoryJobStore};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Records every execution into a shared log and fails the first
    /// `failures` attempts.
    struct ScriptedStage {
        name: &'static str,
        failures: u32,
        calls: AtomicU32,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedStage {
        fn new(name: &'static str, failures: u32, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                failures,
                calls: AtomicU32::new(0),
                log: Arc::clone(log),
            }
        }
    }

    impl Stage for ScriptedStage {
        fn name(&self) -> &str {
            self.name
        }

        fn execute<'a>(&'a self, _ctx: &'a StageContext) -> StageFuture<'a> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                self.log.lock().push(self.name.to_string());
                if call < self.failures {
                    return Err(StageError::MissingInput(format!("{} attempt {}", self.name, call)));
                }
                Ok(())
            })
        }
    }

    fn context() -> (StageContext, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new());
        let job = JobId::new("job-p");
        let bbox = BoundingBox::from_corners((0.0, 0.0), (0.01, 0.01)).unwrap();
        store.create(JobRecord::new(job.clone(), bbox)).unwrap();
        let ctx = StageContext::new(job, store.clone(), JobLayout::new("/unused"));
        (ctx, store)
    }

    #[tokio::test]
    async fn test_all_groups_run_and_job_is_done() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .then(
                StageGroup::new()
                    .with(ScriptedStage::new("a", 0, &log))
                    .with(ScriptedStage::new("b", 0, &log)),
            )
            .then(StageGroup::single(ScriptedStage::new("c", 0, &log)));
        let (ctx, store) = context();

        let outcome = pipeline.run(&ctx).await;

        assert!(outcome.is_completed());
        assert_eq!(store.get_status(&ctx.job_id).unwrap(), JobStatus::Done);
        let log = log.lock();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2], "c");
    }

    #[tokio::test]
    async fn test_failure_stops_later_groups() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .then(
                StageGroup::new()
                    .with(ScriptedStage::new("first", 1, &log))
                    .with(ScriptedStage::new("second", 0, &log)),
            )
            .then(StageGroup::single(ScriptedStage::new("never", 0, &log)));
        let (ctx, store) = context();

        let outcome = pipeline.run(&ctx).await;

        assert_eq!(outcome.failed_stage(), Some("first"));
        assert_eq!(
            store.get_status(&ctx.job_id).unwrap().to_string(),
            "first:error"
        );
        // The sibling still ran to completion; the next group never started
        let log = log.lock();
        assert!(log.contains(&"second".to_string()));
        assert!(!log.contains(&"never".to_string()));
    }

    #[tokio::test]
    async fn test_first_declared_failure_is_reported() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new().then(
            StageGroup::new()
                .with(ScriptedStage::new("left", 1, &log))
                .with(ScriptedStage::new("right", 1, &log)),
        );
        let (ctx, store) = context();

        let outcome = pipeline.run(&ctx).await;

        assert_eq!(outcome.failed_stage(), Some("left"));
        assert_eq!(
            store.get_status(&ctx.job_id).unwrap().failed_stage(),
            Some("left")
        );
    }

    #[tokio::test]
    async fn test_retry_policy_recovers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .then(StageGroup::single(ScriptedStage::new("flaky", 2, &log)))
            .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
        let (ctx, store) = context();

        assert!(pipeline.run(&ctx).await.is_completed());
        assert_eq!(log.lock().len(), 3);
        assert_eq!(store.get_status(&ctx.job_id).unwrap(), JobStatus::Done);
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new().then(StageGroup::single(ScriptedStage::new("once", 1, &log)));
        let (ctx, _store) = context();

        assert!(!pipeline.run(&ctx).await.is_completed());
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job_fails_without_panicking() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new().then(StageGroup::single(ScriptedStage::new("s", 0, &log)));
        let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        let ctx = StageContext::new(JobId::new("ghost"), store, JobLayout::new("/unused"));

        let outcome = pipeline.run(&ctx).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Failed {
                error: StageError::Store(_),
                ..
            }
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stage_names_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .then(
                StageGroup::new()
                    .with(ScriptedStage::new("x", 0, &log))
                    .with(ScriptedStage::new("y", 0, &log)),
            )
            .then(StageGroup::new())
            .then(StageGroup::single(ScriptedStage::new("z", 0, &log)));

        assert_eq!(pipeline.stage_names(), vec!["x", "y", "z"]);
        assert_eq!(pipeline.retry(), RetryPolicy::default());
    }
}
