//! `SharingService` (C12, spec §4.10): diary share invitations and the
//! accept/decline/revoke state machine, layered on `DiaryShareRepo` the
//! same way `moltnet-diary`'s service layers on `DiaryEntryRepo` — the
//! accompanying relationship grant/revoke is always fired as a background
//! durable workflow rather than awaited inline.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use moltnet_db::{AgentRepo, DbError, DiaryRepo, DiaryShareRepo};
use moltnet_policy::PermissionAdapter;
use moltnet_types::diary::{DiaryShare, ShareRole, ShareStatus};
use moltnet_workflow::{RetryPolicy, Step, Workflow, WorkflowEngine, WorkflowError};

use crate::error::{SharingError, SharingResult};

pub struct SharingService {
    diaries: DiaryRepo,
    shares: DiaryShareRepo,
    agents: AgentRepo,
    permissions: Arc<PermissionAdapter>,
    workflow: Arc<WorkflowEngine>,
}

impl SharingService {
    pub fn new(
        diaries: DiaryRepo,
        shares: DiaryShareRepo,
        agents: AgentRepo,
        permissions: Arc<PermissionAdapter>,
        workflow: Arc<WorkflowEngine>,
    ) -> Self {
        Self { diaries, shares, agents, permissions, workflow }
    }

    /// `shareDiary` (§4.10): invite `target_fingerprint` onto `diary_id`
    /// with `role`. A `pending`/`accepted` row blocks a re-invite
    /// (`already_shared`); a `declined`/`revoked` row is re-opened as a
    /// fresh `pending` invitation instead of a second row, since at most
    /// one share exists per `(diary_id, shared_with)`.
    pub async fn share_diary(
        &self,
        diary_id: Uuid,
        owner_id: Uuid,
        target_fingerprint: &str,
        role: ShareRole,
    ) -> SharingResult<DiaryShare> {
        self.diaries.find_by_id(diary_id).await?.ok_or(SharingError::DiaryNotFound(diary_id))?;

        if !self.permissions.can_manage_diary(&diary_id.to_string(), &owner_id.to_string()).await? {
            return Err(SharingError::ManageForbidden);
        }

        let target = self
            .agents
            .find_by_fingerprint(target_fingerprint)
            .await?
            .ok_or(SharingError::TargetNotFound)?;

        if target.identity_id == owner_id {
            return Err(SharingError::SelfShare);
        }

        let db_share = match self.shares.find_by_diary_and_agent(diary_id, target.identity_id).await? {
            Some(existing) => {
                let status: ShareStatus = existing.status.parse().map_err(|_| {
                    SharingError::Storage(DbError::InvalidInput("corrupt share status column".to_string()))
                })?;
                match status {
                    ShareStatus::Pending | ShareStatus::Accepted => return Err(SharingError::AlreadyShared),
                    ShareStatus::Declined | ShareStatus::Revoked => {
                        self.shares.reopen(existing.id, role.as_str()).await?
                    }
                }
            }
            None => self.shares.invite(diary_id, target.identity_id, role.as_str()).await.map_err(|e| {
                if matches!(e, DbError::Duplicate(_)) {
                    SharingError::AlreadyShared
                } else {
                    SharingError::Storage(e)
                }
            })?,
        };

        db_share.try_into().map_err(|e: moltnet_types::error::MoltNetError| {
            SharingError::Storage(DbError::InvalidInput(e.to_string()))
        })
    }

    pub async fn list_invitations(&self, agent_id: Uuid) -> SharingResult<Vec<DiaryShare>> {
        let rows = self.shares.list_for_agent(agent_id, Some(ShareStatus::Pending.as_str())).await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: moltnet_types::error::MoltNetError| {
                SharingError::Storage(DbError::InvalidInput(e.to_string()))
            }))
            .collect()
    }

    pub async fn list_for_diary(&self, diary_id: Uuid, agent_id: Uuid) -> SharingResult<Vec<DiaryShare>> {
        if !self.permissions.can_manage_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(SharingError::ManageForbidden);
        }
        let rows = self.shares.list_for_diary(diary_id).await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(|e: moltnet_types::error::MoltNetError| {
                SharingError::Storage(DbError::InvalidInput(e.to_string()))
            }))
            .collect()
    }

    /// `acceptInvitation` (§4.10): requires `status=pending` and
    /// `shared_with=agent`; transitions to `accepted`, then grants the
    /// matching diary relation in the background.
    pub async fn accept(&self, share_id: Uuid, agent_id: Uuid) -> SharingResult<DiaryShare> {
        self.transition(share_id, agent_id, &["pending"], ShareStatus::Accepted).await
    }

    /// `decline`: symmetric to `accept`, no relationship grant.
    pub async fn decline(&self, share_id: Uuid, agent_id: Uuid) -> SharingResult<DiaryShare> {
        self.transition(share_id, agent_id, &["pending"], ShareStatus::Declined).await
    }

    /// `revoke`: valid from `pending` or `accepted`; additionally emits
    /// `removeDiaryRelationForAgent` in the background.
    pub async fn revoke(&self, share_id: Uuid, agent_id: Uuid) -> SharingResult<DiaryShare> {
        self.transition(share_id, agent_id, &["pending", "accepted"], ShareStatus::Revoked).await
    }

    async fn transition(
        &self,
        share_id: Uuid,
        agent_id: Uuid,
        from_statuses: &[&str],
        to_status: ShareStatus,
    ) -> SharingResult<DiaryShare> {
        let existing = self.shares.find_by_id(share_id).await?.ok_or(SharingError::ShareNotFound(share_id))?;

        // Only the invitee responds to their own invitation; only the
        // diary's manager (or the invitee, revoking their own access) may
        // revoke it. The spec names `shared_with=agent` explicitly for
        // accept/decline; revoke is symmetric in practice for either side.
        let is_invitee = existing.shared_with == agent_id;
        let can_manage = self.permissions.can_manage_diary(&existing.diary_id.to_string(), &agent_id.to_string()).await?;
        if !is_invitee && !can_manage {
            return Err(SharingError::NotShareOwner);
        }

        let db_share = self
            .shares
            .transition(share_id, from_statuses, to_status.as_str())
            .await
            .map_err(|e| match e {
                DbError::InvalidInput(_) => SharingError::WrongStatus,
                other => SharingError::Storage(other),
            })?;

        let role: ShareRole = db_share.role.parse().map_err(|_| {
            SharingError::Storage(DbError::InvalidInput("corrupt share role column".to_string()))
        })?;

        match to_status {
            ShareStatus::Accepted => {
                self.emit_grant_workflow(
                    "diary-share-accept",
                    existing.diary_id,
                    existing.shared_with,
                    role,
                )
                .await;
            }
            ShareStatus::Revoked => {
                self.emit_revoke_workflow(existing.diary_id, existing.shared_with, role).await;
            }
            _ => {}
        }

        db_share.try_into().map_err(|e: moltnet_types::error::MoltNetError| {
            SharingError::Storage(DbError::InvalidInput(e.to_string()))
        })
    }

    async fn emit_grant_workflow(&self, name: &'static str, diary_id: Uuid, agent_id: Uuid, role: ShareRole) {
        let permissions = self.permissions.clone();
        let diary_id = diary_id.to_string();
        let agent_id = agent_id.to_string();
        let run: moltnet_workflow::StepFn = Arc::new(move |ctx| {
            let permissions = permissions.clone();
            let diary_id = diary_id.clone();
            let agent_id = agent_id.clone();
            Box::pin(async move {
                let result = match role {
                    ShareRole::Reader => permissions.grant_diary_reader(&diary_id, &agent_id).await,
                    ShareRole::Writer => permissions.grant_diary_writer(&diary_id, &agent_id).await,
                };
                result.map_err(|e| step_error(e.to_string()))?;
                Ok(ctx.input)
            })
        });
        self.start_workflow(name, run).await;
    }

    async fn emit_revoke_workflow(&self, diary_id: Uuid, agent_id: Uuid, role: ShareRole) {
        let permissions = self.permissions.clone();
        let diary_id = diary_id.to_string();
        let agent_id = agent_id.to_string();
        let relation = match role {
            ShareRole::Reader => "reader",
            ShareRole::Writer => "writer",
        };
        let run: moltnet_workflow::StepFn = Arc::new(move |ctx| {
            let permissions = permissions.clone();
            let diary_id = diary_id.clone();
            let agent_id = agent_id.clone();
            Box::pin(async move {
                permissions
                    .remove_diary_relation_for_agent(&diary_id, &agent_id, relation)
                    .await
                    .map_err(|e| step_error(e.to_string()))?;
                Ok(ctx.input)
            })
        });
        self.start_workflow("diary-share-revoke", run).await;
    }

    async fn start_workflow(&self, name: &'static str, run: moltnet_workflow::StepFn) {
        let workflow = Arc::new(Workflow::new(
            name,
            vec![Step::new(name, run).with_retry(RetryPolicy::relationship_write())],
        ));
        if let Err(err) = self.workflow.start(workflow, json!({})).await {
            tracing::error!(workflow = name, error = %err, "failed to enqueue relationship-write workflow");
        }
    }
}

fn step_error(message: String) -> WorkflowError {
    WorkflowError::MalformedStepOutput(message)
}
