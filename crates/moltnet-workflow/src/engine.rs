//! A leader-less durable workflow engine: a linear list of named, retryable
//! steps journaled into Postgres (`moltnet_db::WorkflowRepo`) one at a time,
//! so a process restart mid-workflow can resume from the last completed
//! step instead of re-running the whole thing. This is the language-native
//! stand-in Design Notes §9 asks for in place of the external durable-
//! workflow SDK the source system relies on.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant as TokioInstant;
use tracing::{error, info, warn};
use uuid::Uuid;

use moltnet_db::WorkflowRepo;

use crate::error::{WorkflowError, WorkflowResult};

/// Everything a step closure needs: the run it belongs to and the value
/// produced by the previous step (or the workflow's original input, for
/// the first step).
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub run_id: Uuid,
    pub input: Value,
}

pub type StepFuture = Pin<Box<dyn Future<Output = WorkflowResult<Value>> + Send>>;
pub type StepFn = Arc<dyn Fn(WorkflowContext) -> StepFuture + Send + Sync>;

/// Exponential backoff between step retries, per spec §4.3's "5 attempts,
/// 2s -> 32s" for relationship writes, generalized as the tunable default
/// for every step in the engine.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: StdDuration,
    pub max_delay: StdDuration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: StdDuration::from_secs(2),
            max_delay: StdDuration::from_secs(32),
        }
    }
}

impl RetryPolicy {
    /// Matches spec §4.3's relationship-write backoff: 5 attempts, 2s -> 32s.
    pub fn relationship_write() -> Self {
        Self {
            max_attempts: 5,
            base_delay: StdDuration::from_secs(2),
            max_delay: StdDuration::from_secs(32),
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> StdDuration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let scaled = self.base_delay.saturating_mul(factor);
        scaled.min(self.max_delay)
    }
}

/// One step in a workflow: a unit of work plus the retry policy that
/// applies to it and an optional compensating action run (in reverse step
/// order) if a later step in the same workflow ultimately fails.
#[derive(Clone)]
pub struct Step {
    pub name: String,
    pub run: StepFn,
    pub compensate: Option<StepFn>,
    pub retry: RetryPolicy,
}

impl Step {
    pub fn new(name: impl Into<String>, run: StepFn) -> Self {
        Self {
            name: name.into(),
            run,
            compensate: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_compensation(mut self, compensate: StepFn) -> Self {
        self.compensate = Some(compensate);
        self
    }
}

/// A named, ordered sequence of steps. `moltnet-registration`,
/// `moltnet-signing`, `moltnet-diary`, and `moltnet-sharing` each build one
/// of these and hand it to `WorkflowEngine::run`.
pub struct Workflow {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self { name: name.into(), steps }
    }
}

/// Persists and drives workflow runs. One instance is shared (behind an
/// `Arc`) across the whole server process.
#[derive(Clone)]
pub struct WorkflowEngine {
    repo: Arc<WorkflowRepo>,
    /// In-process wakeups for `recv`, keyed by run id, so a `send` that
    /// races ahead of a waiting `recv` is still observed on the waiter's
    /// next poll rather than lost between polls.
    signals: Arc<DashMap<Uuid, Arc<Notify>>>,
}

impl WorkflowEngine {
    pub fn new(repo: WorkflowRepo) -> Self {
        Self {
            repo: Arc::new(repo),
            signals: Arc::new(DashMap::new()),
        }
    }

    /// Run every step of `workflow` in order, journaling each result
    /// before moving to the next, and return the final step's output (or
    /// the original input if there are no steps). On a step's terminal
    /// failure, already-succeeded steps are compensated in reverse order
    /// and the original error is re-raised even if compensation itself
    /// fails (compensation failure is logged, not returned — spec §4.6).
    pub async fn run(&self, workflow: &Workflow, input: Value) -> WorkflowResult<Value> {
        let run = self.repo.create_run(&workflow.name, input.clone()).await?;
        info!(workflow = %workflow.name, run_id = %run.id, "workflow started");
        self.execute(run.id, workflow, input).await
    }

    /// Persist a run and drive it on a background task, returning the run
    /// id immediately instead of waiting for every step to finish. Used
    /// for workflows whose last step blocks on an external signal (the
    /// signing orchestrator's "wait for submit") so the caller that
    /// kicked the workflow off is not held open for the signal's TTL.
    pub async fn start(&self, workflow: Arc<Workflow>, input: Value) -> WorkflowResult<Uuid> {
        let run = self.repo.create_run(&workflow.name, input.clone()).await?;
        let engine = self.clone();
        let run_id = run.id;
        tokio::spawn(async move {
            if let Err(err) = engine.execute(run_id, &workflow, input).await {
                error!(run_id = %run_id, workflow = %workflow.name, error = %err, "background workflow run failed");
            }
        });
        Ok(run_id)
    }

    /// Resume a previously started run (found via `resumable_runs`) by
    /// replaying `workflow` against it: steps already journaled as
    /// `succeeded` are read back instead of re-executed.
    pub async fn resume(&self, run_id: Uuid, workflow: &Workflow, input: Value) -> WorkflowResult<Value> {
        info!(workflow = %workflow.name, run_id = %run_id, "workflow resumed");
        self.execute(run_id, workflow, input).await
    }

    async fn execute(&self, run_id: Uuid, workflow: &Workflow, input: Value) -> WorkflowResult<Value> {
        let mut value = input;
        let mut succeeded: Vec<&Step> = Vec::with_capacity(workflow.steps.len());

        for (index, step) in workflow.steps.iter().enumerate() {
            let journaled = self.repo.create_step(run_id, index as i32, &step.name).await?;
            if journaled.status == "succeeded" {
                if let Some(result) = journaled.result {
                    value = result;
                    succeeded.push(step);
                    continue;
                }
            }

            match self.execute_with_retry(run_id, index as i32, step, value.clone()).await {
                Ok(result) => {
                    self.repo
                        .mark_step_succeeded(run_id, index as i32, result.clone())
                        .await?;
                    value = result;
                    succeeded.push(step);
                }
                Err(err) => {
                    error!(workflow = %workflow.name, run_id = %run_id, step = %step.name, error = %err, "step failed, compensating");
                    self.compensate(run_id, &succeeded, &value).await;
                    self.repo.set_run_status(run_id, "failed").await.ok();
                    return Err(err);
                }
            }
        }

        self.repo.set_run_status(run_id, "completed").await?;
        info!(workflow = %workflow.name, run_id = %run_id, "workflow completed");
        Ok(value)
    }

    async fn execute_with_retry(
        &self,
        run_id: Uuid,
        step_index: i32,
        step: &Step,
        input: Value,
    ) -> WorkflowResult<Value> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let ctx = WorkflowContext { run_id, input: input.clone() };
            match (step.run)(ctx).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= step.retry.max_attempts {
                        self.repo
                            .mark_step_failed(run_id, step_index, &err.to_string(), None)
                            .await
                            .ok();
                        return Err(WorkflowError::StepFailed {
                            step: step.name.clone(),
                            message: err.to_string(),
                        });
                    }

                    let delay = step.retry.delay_for_attempt(attempt);
                    warn!(run_id = %run_id, step = %step.name, attempt, delay_secs = delay.as_secs(), error = %err, "step failed, retrying");
                    self.repo
                        .mark_step_failed(
                            run_id,
                            step_index,
                            &err.to_string(),
                            Some(Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default()),
                        )
                        .await
                        .ok();
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn compensate(&self, run_id: Uuid, succeeded: &[&Step], value: &Value) {
        for step in succeeded.iter().rev() {
            let Some(compensate) = &step.compensate else { continue };
            let ctx = WorkflowContext { run_id, input: value.clone() };
            if let Err(err) = (compensate)(ctx).await {
                error!(run_id = %run_id, step = %step.name, error = %err, "compensation failed; original error still propagates");
            }
        }
        self.repo.set_run_status(run_id, "compensated").await.ok();
    }

    /// External-signal primitive: record a signal for `run_id` and wake
    /// any in-process `recv` waiter. Used by the signing workflow, whose
    /// final step waits on the agent's `submit` call.
    pub async fn send(&self, run_id: Uuid, signal_name: &str, payload: Value) -> WorkflowResult<()> {
        self.repo.send_signal(run_id, signal_name, payload).await?;
        if let Some(notify) = self.signals.get(&run_id) {
            notify.notify_waiters();
        }
        Ok(())
    }

    /// Wait up to `timeout` for a signal named `signal_name` to arrive for
    /// `run_id`, polling the durable store so a signal sent before this
    /// call started (or from another process) is still observed.
    pub async fn recv(&self, run_id: Uuid, signal_name: &str, timeout: StdDuration) -> WorkflowResult<Option<Value>> {
        let notify = self
            .signals
            .entry(run_id)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone();
        let deadline = TokioInstant::now() + timeout;

        loop {
            if let Some(signal) = self.repo.recv_signal(run_id, signal_name).await? {
                return Ok(Some(signal.payload));
            }
            let now = TokioInstant::now();
            if now >= deadline {
                return Ok(None);
            }
            let poll_window = (deadline - now).min(StdDuration::from_millis(500));
            let _ = tokio::time::timeout(poll_window, notify.notified()).await;
        }
    }

    /// Every `workflow_runs` row still `running` at process start: the
    /// caller replays these by re-invoking the matching `Workflow`, whose
    /// already-journaled steps are skipped via `find_step`/`list_steps`
    /// rather than re-executed (crash-recovery replay per Design Notes §9).
    pub async fn resumable_runs(&self) -> WorkflowResult<Vec<Uuid>> {
        Ok(self.repo.list_in_flight().await?.into_iter().map(|r| r.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = RetryPolicy::relationship_write();
        assert_eq!(policy.delay_for_attempt(1), StdDuration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), StdDuration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), StdDuration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), StdDuration::from_secs(16));
        assert_eq!(policy.delay_for_attempt(5), StdDuration::from_secs(32));
        assert_eq!(policy.delay_for_attempt(6), StdDuration::from_secs(32));
    }
}
