//! Workflow runtime persistence (§4.11): durable runs, steps, and signals
//! backing the `moltnet-workflow` engine.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{DbWorkflowRun, DbWorkflowSignal, DbWorkflowStep};

#[derive(Clone)]
pub struct WorkflowRepo {
    pool: PgPool,
}

impl WorkflowRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_run(&self, kind: &str, context: serde_json::Value) -> DbResult<DbWorkflowRun> {
        sqlx::query_as::<_, DbWorkflowRun>(
            r#"
            INSERT INTO workflow_runs (kind, context)
            VALUES ($1, $2)
            RETURNING id, kind, status, context, created_at, updated_at
            "#,
        )
        .bind(kind)
        .bind(context)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_run(&self, id: Uuid) -> DbResult<Option<DbWorkflowRun>> {
        sqlx::query_as::<_, DbWorkflowRun>(
            "SELECT id, kind, status, context, created_at, updated_at FROM workflow_runs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn set_run_status(&self, id: Uuid, status: &str) -> DbResult<DbWorkflowRun> {
        sqlx::query_as::<_, DbWorkflowRun>(
            r#"
            UPDATE workflow_runs
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, kind, status, context, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("workflow run {id}")))
    }

    /// List runs still actively progressing, for crash-recovery resume on
    /// startup (§4.11: "a restarted process must be able to pick every
    /// in-flight workflow back up from its last completed step").
    pub async fn list_in_flight(&self) -> DbResult<Vec<DbWorkflowRun>> {
        sqlx::query_as::<_, DbWorkflowRun>(
            "SELECT id, kind, status, context, created_at, updated_at FROM workflow_runs WHERE status = 'running'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn create_step(&self, workflow_id: Uuid, step_index: i32, step_name: &str) -> DbResult<DbWorkflowStep> {
        sqlx::query_as::<_, DbWorkflowStep>(
            r#"
            INSERT INTO workflow_steps (workflow_id, step_index, step_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (workflow_id, step_index) DO UPDATE SET step_name = EXCLUDED.step_name
            RETURNING id, workflow_id, step_index, step_name, status, attempt, result, error,
                      next_attempt_at, created_at, updated_at
            "#,
        )
        .bind(workflow_id)
        .bind(step_index)
        .bind(step_name)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_step(&self, workflow_id: Uuid, step_index: i32) -> DbResult<Option<DbWorkflowStep>> {
        sqlx::query_as::<_, DbWorkflowStep>(
            r#"
            SELECT id, workflow_id, step_index, step_name, status, attempt, result, error,
                   next_attempt_at, created_at, updated_at
            FROM workflow_steps
            WHERE workflow_id = $1 AND step_index = $2
            "#,
        )
        .bind(workflow_id)
        .bind(step_index)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn list_steps(&self, workflow_id: Uuid) -> DbResult<Vec<DbWorkflowStep>> {
        sqlx::query_as::<_, DbWorkflowStep>(
            r#"
            SELECT id, workflow_id, step_index, step_name, status, attempt, result, error,
                   next_attempt_at, created_at, updated_at
            FROM workflow_steps
            WHERE workflow_id = $1
            ORDER BY step_index ASC
            "#,
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn mark_step_succeeded(
        &self,
        workflow_id: Uuid,
        step_index: i32,
        result: serde_json::Value,
    ) -> DbResult<DbWorkflowStep> {
        sqlx::query_as::<_, DbWorkflowStep>(
            r#"
            UPDATE workflow_steps
            SET status = 'succeeded', result = $3, error = NULL, updated_at = NOW()
            WHERE workflow_id = $1 AND step_index = $2
            RETURNING id, workflow_id, step_index, step_name, status, attempt, result, error,
                      next_attempt_at, created_at, updated_at
            "#,
        )
        .bind(workflow_id)
        .bind(step_index)
        .bind(result)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("workflow step {workflow_id}/{step_index}")))
    }

    /// Record a failed attempt and the next retry time (or leave
    /// `next_attempt_at` unset to mark the step permanently failed, once
    /// the engine's `RetryPolicy` is exhausted).
    pub async fn mark_step_failed(
        &self,
        workflow_id: Uuid,
        step_index: i32,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> DbResult<DbWorkflowStep> {
        let status = if next_attempt_at.is_some() { "pending" } else { "failed" };
        sqlx::query_as::<_, DbWorkflowStep>(
            r#"
            UPDATE workflow_steps
            SET status = $3, attempt = attempt + 1, error = $4, next_attempt_at = $5, updated_at = NOW()
            WHERE workflow_id = $1 AND step_index = $2
            RETURNING id, workflow_id, step_index, step_name, status, attempt, result, error,
                      next_attempt_at, created_at, updated_at
            "#,
        )
        .bind(workflow_id)
        .bind(step_index)
        .bind(status)
        .bind(error)
        .bind(next_attempt_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("workflow step {workflow_id}/{step_index}")))
    }

    pub async fn send_signal(
        &self,
        workflow_id: Uuid,
        signal_name: &str,
        payload: serde_json::Value,
    ) -> DbResult<DbWorkflowSignal> {
        sqlx::query_as::<_, DbWorkflowSignal>(
            r#"
            INSERT INTO workflow_signals (workflow_id, signal_name, payload)
            VALUES ($1, $2, $3)
            RETURNING id, workflow_id, signal_name, payload, consumed, created_at
            "#,
        )
        .bind(workflow_id)
        .bind(signal_name)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Atomically claim the oldest unconsumed signal of a given name, so
    /// two concurrent `recv` callers can never both observe it.
    pub async fn recv_signal(&self, workflow_id: Uuid, signal_name: &str) -> DbResult<Option<DbWorkflowSignal>> {
        sqlx::query_as::<_, DbWorkflowSignal>(
            r#"
            UPDATE workflow_signals
            SET consumed = TRUE
            WHERE id = (
                SELECT id FROM workflow_signals
                WHERE workflow_id = $1 AND signal_name = $2 AND consumed = FALSE
                ORDER BY created_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, workflow_id, signal_name, payload, consumed, created_at
            "#,
        )
        .bind(workflow_id)
        .bind(signal_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
