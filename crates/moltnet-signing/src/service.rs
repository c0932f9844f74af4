//! Signing orchestrator (C9, spec §4.7): a nonce-bound request/submit
//! state machine. `create` opens the request and kicks off a background
//! workflow that simply waits on the `submitted` signal so the run is
//! durably journaled even though the actual verification happens
//! synchronously inside `submit`, invoked directly by the owning agent.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use moltnet_crypto::verify_with_nonce;
use moltnet_db::{AgentRepo, DbError, SigningRequestRepo};
use moltnet_types::signing::{SigningRequest, SIGNING_REQUEST_TTL_MINUTES};
use moltnet_workflow::{Step, Workflow, WorkflowEngine};

use crate::error::{SigningError, SigningResult};

const SIGNAL_SUBMITTED: &str = "submitted";

/// The `workflow_runs.kind` this service's workflow is journaled under,
/// used by `moltnet-server`'s crash-recovery sweep to route an in-flight
/// run back to `SigningService::resume`.
pub const WORKFLOW_KIND: &str = "signing-request-await-submission";

#[derive(Clone)]
pub struct SigningService {
    repo: SigningRequestRepo,
    agents: AgentRepo,
    workflow: Arc<WorkflowEngine>,
}

impl SigningService {
    pub fn new(repo: SigningRequestRepo, agents: AgentRepo, workflow: Arc<WorkflowEngine>) -> Self {
        Self { repo, agents, workflow }
    }

    /// Create a pending signing request with a fresh nonce and kick off
    /// the durable wait-for-submission workflow in the background.
    pub async fn create(&self, agent_id: Uuid, message: String) -> SigningResult<SigningRequest> {
        let nonce = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(SIGNING_REQUEST_TTL_MINUTES);

        let row = self.repo.create(agent_id, &message, &nonce, expires_at, None).await?;

        let workflow = Arc::new(await_submission_workflow(self.workflow.clone()));
        let run_id = self
            .workflow
            .start(workflow, json!({ "signing_request_id": row.id }))
            .await
            .map_err(SigningError::from)?;

        let row = self.repo.set_workflow_id(row.id, &run_id.to_string()).await?;
        SigningRequest::try_from(row).map_err(|_| SigningError::NotFound)
    }

    pub async fn find(&self, id: Uuid) -> SigningResult<SigningRequest> {
        let row = self.repo.find_by_id(id).await?.ok_or(SigningError::NotFound)?;
        SigningRequest::try_from(row).map_err(|_| SigningError::NotFound)
    }

    pub async fn list(&self, agent_id: Uuid, status: Option<&str>, limit: i64, offset: i64) -> SigningResult<Vec<SigningRequest>> {
        let rows = self.repo.list(agent_id, status, limit, offset).await?;
        Ok(rows.into_iter().filter_map(|r| SigningRequest::try_from(r).ok()).collect())
    }

    /// Submit a signature for `id`, owned by `agent_id`. Verifies
    /// `message + "." + nonce` against the agent's stored public key and
    /// transitions the request to its terminal `completed` state
    /// regardless of whether the signature itself checks out — an
    /// invalid signature is a valid (if unsuccessful) completion, not an
    /// error (spec §4.7's `completed(valid=false)` branch).
    pub async fn submit(&self, id: Uuid, agent_id: Uuid, signature: &str) -> SigningResult<SigningRequest> {
        let row = self.repo.find_by_id(id).await?.ok_or(SigningError::NotFound)?;
        if row.agent_id != agent_id {
            return Err(SigningError::NotFound);
        }

        let request = SigningRequest::try_from(row.clone()).map_err(|_| SigningError::NotFound)?;
        if request.status.is_terminal() {
            return Err(match request.status {
                moltnet_types::signing::SigningStatus::Expired => SigningError::Expired,
                _ => SigningError::AlreadyCompleted,
            });
        }
        if request.is_expired_at(Utc::now()) {
            return Err(SigningError::Expired);
        }

        let agent = self.agents.find_by_id(agent_id).await?.ok_or(SigningError::AgentNotFound)?;
        let valid = verify_with_nonce(&request.message, &request.nonce, signature, &agent.public_key);

        let completed = match self.repo.complete(id, signature, valid).await {
            Ok(row) => row,
            Err(DbError::InvalidInput(_)) => return Err(SigningError::Expired),
            Err(other) => return Err(SigningError::Storage(other)),
        };

        if let Some(workflow_id) = row
            .workflow_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            self.workflow
                .send(workflow_id, SIGNAL_SUBMITTED, json!({ "valid": valid }))
                .await
                .map_err(SigningError::from)?;
        }

        SigningRequest::try_from(completed).map_err(|_| SigningError::NotFound)
    }

    /// Crash-recovery replay (Design Notes §9): rebuild the constant
    /// await-submission workflow and resume a run a restart found still
    /// `running`. The step itself re-enters `recv`, so a signal sent
    /// while the process was down is still observed on the next poll.
    pub async fn resume(&self, run_id: Uuid, original_input: serde_json::Value) -> SigningResult<()> {
        let workflow = await_submission_workflow(self.workflow.clone());
        self.workflow.resume(run_id, &workflow, original_input).await.map_err(SigningError::from)?;
        Ok(())
    }

    /// The public verify path (`GET /agents/:fingerprint/verify`
    /// equivalent): look a completed request up by its unique signature
    /// and re-verify it against the owning agent's current public key.
    pub async fn verify_by_signature(&self, signature: &str) -> SigningResult<bool> {
        let row = self.repo.find_by_signature(signature).await?.ok_or(SigningError::NotFound)?;
        let agent = self.agents.find_by_id(row.agent_id).await?.ok_or(SigningError::AgentNotFound)?;
        Ok(verify_with_nonce(&row.message, &row.nonce, signature, &agent.public_key))
    }

    /// Scheduled sweep: transition every past-due pending request to
    /// `expired`. Intended to be called on a `tokio::time::interval` by
    /// the server binary.
    pub async fn sweep_expired(&self) -> SigningResult<usize> {
        Ok(self.repo.expire_due().await?.len())
    }
}

/// A single-step workflow that just waits out the request's TTL window
/// for a `submitted` signal. `submit()` has already performed the actual
/// verification and state transition by the time this wakes up (or
/// times out); its only job is to give the run a durable, journaled
/// lifecycle that a crash-recovery replay can resume.
fn await_submission_workflow(engine: Arc<WorkflowEngine>) -> Workflow {
    let timeout = StdDuration::from_secs(60 * (SIGNING_REQUEST_TTL_MINUTES as u64 + 1));
    Workflow::new(
        WORKFLOW_KIND,
        vec![Step::new(
            "await-submission",
            Arc::new(move |ctx| {
                let engine = engine.clone();
                Box::pin(async move {
                    engine.recv(ctx.run_id, SIGNAL_SUBMITTED, timeout).await?;
                    Ok(ctx.input)
                })
            }),
        )],
    )
}
