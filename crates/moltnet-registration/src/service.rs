//! Registration orchestrator (C8, spec §4.6): a five-step durable
//! workflow gating network entry on voucher possession.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{from_value, json, to_value};

use moltnet_db::{AgentRepo, DbError, TransactionRunner, VoucherRepo};
use moltnet_policy::PermissionAdapter;
use moltnet_workflow::{Step, Workflow, WorkflowEngine};

use crate::collaborators::{IdentityProvider, IdentityTraits, OAuthClientMetadata, OAuthClientMinter};
use crate::error::{RegistrationError, RegistrationResult};

/// The `workflow_runs.kind` this service's workflow is journaled under,
/// used by `moltnet-server`'s crash-recovery sweep to route an in-flight
/// run back to `RegistrationService::resume`.
pub const WORKFLOW_KIND: &str = "registration";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutput {
    pub identity_id: String,
    pub fingerprint: String,
    pub public_key: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistrationInput {
    public_key: String,
    fingerprint: String,
    voucher_code: String,
}

#[derive(Clone)]
pub struct RegistrationService {
    vouchers: VoucherRepo,
    agents: AgentRepo,
    tx: TransactionRunner,
    permissions: Arc<PermissionAdapter>,
    identity_provider: Arc<dyn IdentityProvider>,
    client_minter: Arc<dyn OAuthClientMinter>,
    workflow: Arc<WorkflowEngine>,
}

impl RegistrationService {
    pub fn new(
        vouchers: VoucherRepo,
        agents: AgentRepo,
        tx: TransactionRunner,
        permissions: Arc<PermissionAdapter>,
        identity_provider: Arc<dyn IdentityProvider>,
        client_minter: Arc<dyn OAuthClientMinter>,
        workflow: Arc<WorkflowEngine>,
    ) -> Self {
        Self { vouchers, agents, tx, permissions, identity_provider, client_minter, workflow }
    }

    pub async fn register(
        &self,
        public_key: String,
        fingerprint: String,
        voucher_code: String,
    ) -> RegistrationResult<RegistrationOutput> {
        let input = RegistrationInput { public_key, fingerprint, voucher_code };
        let workflow = self.build_workflow();
        let result = self
            .workflow
            .run(&workflow, to_value(&input).expect("RegistrationInput is always serializable"))
            .await
            .map_err(map_workflow_error)?;
        from_value(result).map_err(|e| RegistrationError::IdentityStore(format!("malformed workflow output: {e}")))
    }

    /// Crash-recovery replay (Design Notes §9): rebuild the same step
    /// sequence `register` would have and resume a run left `running` by
    /// a restart, skipping every step already journaled `succeeded`.
    pub async fn resume(
        &self,
        run_id: uuid::Uuid,
        original_input: serde_json::Value,
    ) -> RegistrationResult<RegistrationOutput> {
        let workflow = self.build_workflow();
        let result = self
            .workflow
            .resume(run_id, &workflow, original_input)
            .await
            .map_err(map_workflow_error)?;
        from_value(result).map_err(|e| RegistrationError::IdentityStore(format!("malformed workflow output: {e}")))
    }

    fn build_workflow(&self) -> Workflow {
        let vouchers = self.vouchers_for_step();
        let identity_provider = self.identity_provider.clone();
        let identity_provider_for_compensation = self.identity_provider.clone();
        let agents_vouchers_tx = (self.agents_for_step(), self.vouchers_for_step(), self.tx.clone());
        let permissions = self.permissions.clone();
        let client_minter = self.client_minter.clone();

        Workflow::new(
            WORKFLOW_KIND,
            vec![
                Step::new("validate-voucher", Arc::new(move |ctx| {
                    let vouchers = vouchers.clone();
                    Box::pin(async move {
                        let input: RegistrationInput = from_value(ctx.input.clone())
                            .map_err(|e| step_error(format!("malformed input: {e}")))?;

                        let voucher = vouchers
                            .find_by_code(&input.voucher_code)
                            .await
                            .map_err(|e| step_error(e.to_string()))?
                            .ok_or_else(|| step_error("voucher not found".to_string()))?;

                        if voucher.redeemed_at.is_some() {
                            return Err(step_error("voucher already redeemed".to_string()));
                        }
                        if voucher.expires_at <= chrono::Utc::now() {
                            return Err(step_error("voucher expired".to_string()));
                        }

                        Ok(ctx.input)
                    })
                })),
                Step::new("create-identity", Arc::new(move |ctx| {
                    let identity_provider = identity_provider.clone();
                    Box::pin(async move {
                        let input: RegistrationInput = from_value(ctx.input.clone())
                            .map_err(|e| step_error(format!("malformed input: {e}")))?;

                        let created = identity_provider
                            .create_identity(IdentityTraits {
                                public_key: input.public_key.clone(),
                                voucher_code: input.voucher_code.clone(),
                            })
                            .await
                            .map_err(|e| step_error(e.to_string()))?;

                        Ok(json!({
                            "public_key": input.public_key,
                            "fingerprint": input.fingerprint,
                            "voucher_code": input.voucher_code,
                            "identity_id": created.identity_id,
                        }))
                    })
                }))
                .with_compensation(Arc::new(move |ctx| {
                    let identity_provider = identity_provider_for_compensation.clone();
                    Box::pin(async move {
                        if let Some(identity_id) = ctx.input.get("identity_id").and_then(|v| v.as_str()) {
                            if let Err(err) = identity_provider.delete_identity(identity_id).await {
                                tracing::error!(identity_id, error = %err, "best-effort identity rollback failed");
                            }
                        }
                        Ok(ctx.input)
                    })
                })),
                Step::new("redeem-and-upsert", Arc::new(move |ctx| {
                    let (agents, vouchers, tx) = agents_vouchers_tx.clone();
                    Box::pin(async move {
                        #[derive(Deserialize)]
                        struct Carry {
                            public_key: String,
                            fingerprint: String,
                            voucher_code: String,
                        }
                        let carry: Carry = from_value(ctx.input.clone())
                            .map_err(|e| step_error(format!("malformed input: {e}")))?;
                        let identity_id = ctx.input.get("identity_id").cloned().unwrap_or(serde_json::Value::Null);

                        let agent = tx
                            .run(move |conn| {
                                Box::pin(async move {
                                    let agent = agents.upsert_in_tx(conn, &carry.public_key, &carry.fingerprint).await?;
                                    vouchers.redeem_in_tx(conn, &carry.voucher_code, agent.identity_id).await?;
                                    Ok(agent)
                                })
                            })
                            .await
                            .map_err(|e: DbError| step_error(e.to_string()))?;

                        Ok(json!({
                            "public_key": agent.public_key,
                            "fingerprint": agent.fingerprint,
                            "identity_id": identity_id,
                            "agent_internal_id": agent.identity_id,
                        }))
                    })
                })),
                Step::new("grant-self-relationship", Arc::new(move |ctx| {
                    let permissions = permissions.clone();
                    Box::pin(async move {
                        let agent_internal_id = ctx
                            .input
                            .get("agent_internal_id")
                            .and_then(|v| v.as_str())
                            .ok_or_else(|| step_error("missing agent_internal_id".to_string()))?;

                        permissions
                            .register_agent(agent_internal_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;

                        Ok(ctx.input)
                    })
                }))
                .with_retry(moltnet_workflow::RetryPolicy::relationship_write()),
                Step::new("mint-oauth-client", Arc::new(move |ctx| {
                    let client_minter = client_minter.clone();
                    Box::pin(async move {
                        let identity_id = ctx
                            .input
                            .get("identity_id")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let public_key = ctx
                            .input
                            .get("public_key")
                            .and_then(|v| v.as_str())
                            .ok_or_else(|| step_error("missing public_key".to_string()))?
                            .to_string();
                        let fingerprint = ctx
                            .input
                            .get("fingerprint")
                            .and_then(|v| v.as_str())
                            .ok_or_else(|| step_error("missing fingerprint".to_string()))?
                            .to_string();

                        let minted = client_minter
                            .mint_client(OAuthClientMetadata {
                                identity_id: identity_id.clone(),
                                public_key: public_key.clone(),
                                fingerprint: fingerprint.clone(),
                            })
                            .await
                            .map_err(|e| step_error(e.to_string()))?;

                        let output = RegistrationOutput {
                            identity_id,
                            fingerprint,
                            public_key,
                            client_id: minted.client_id,
                            client_secret: minted.client_secret,
                        };
                        to_value(&output).map_err(|e| step_error(format!("unserializable output: {e}")))
                    })
                })),
            ],
        )
    }

    fn vouchers_for_step(&self) -> VoucherRepo {
        self.vouchers.clone()
    }

    fn agents_for_step(&self) -> AgentRepo {
        self.agents.clone()
    }
}

fn step_error(message: String) -> moltnet_workflow::WorkflowError {
    moltnet_workflow::WorkflowError::MalformedStepOutput(message)
}

/// The engine collapses every step failure into `WorkflowError::StepFailed`
/// once retries are exhausted, losing which step raised it. A failure out
/// of `validate-voucher` is the one terminal, non-retried step whose
/// failure means "this voucher is bad" rather than "something broke" (spec
/// §4.6 step 1), so it gets surfaced as `VoucherValidationError` (→ 403)
/// instead of falling through to the generic `Workflow` variant (→ 500).
fn map_workflow_error(err: moltnet_workflow::WorkflowError) -> RegistrationError {
    match err {
        moltnet_workflow::WorkflowError::StepFailed { step, message } if step == "validate-voucher" => {
            RegistrationError::VoucherValidationError(message)
        }
        other => RegistrationError::from(other),
    }
}
