//! `PermissionAdapter` (C4, spec §4.3): the write/read vocabulary callers
//! actually use, built on top of the engine-agnostic `RelationshipEngine`
//! trait. Two namespaces carry every tuple MoltNet writes: `"agent"` (the
//! `self` relation an agent holds on itself) and `"diary_entry"` /
//! `"diary"` (owner/writer/reader relations). Writes are synchronous here;
//! `moltnet-workflow` is what gives them the "retry 5 times, 2s -> 32s,
//! survive a restart" guarantee spec §4.3 asks for — this adapter is the
//! unit of work each retried step calls once.

use std::sync::Arc;

use crate::engine::{RelationTuple, RelationshipEngine};
use crate::error::PolicyResult;

const NS_AGENT: &str = "agent";
const NS_DIARY_ENTRY: &str = "diary_entry";
const NS_DIARY: &str = "diary";

const REL_SELF: &str = "self";
const REL_OWNER: &str = "owner";
const REL_VIEWER: &str = "viewer";
const REL_WRITER: &str = "writer";
const REL_READER: &str = "reader";

/// The permission vocabulary spec §4.3 names, wrapping whichever
/// `RelationshipEngine` the deployment is configured with (Keto-backed or
/// the local SQL fallback).
pub struct PermissionAdapter {
    engine: Arc<dyn RelationshipEngine>,
}

impl PermissionAdapter {
    pub fn new(engine: Arc<dyn RelationshipEngine>) -> Self {
        Self { engine }
    }

    // --- writes -------------------------------------------------------

    pub async fn register_agent(&self, agent_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_AGENT, agent_id, REL_SELF, agent_id))
            .await
    }

    pub async fn grant_ownership(&self, entry_id: &str, owner_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_DIARY_ENTRY, entry_id, REL_OWNER, owner_id))
            .await
    }

    pub async fn grant_viewer(&self, entry_id: &str, viewer_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_DIARY_ENTRY, entry_id, REL_VIEWER, viewer_id))
            .await
    }

    pub async fn revoke_viewer(&self, entry_id: &str, viewer_id: &str) -> PolicyResult<()> {
        self.engine
            .delete(RelationTuple::new(NS_DIARY_ENTRY, entry_id, REL_VIEWER, viewer_id))
            .await
    }

    pub async fn grant_diary_owner(&self, diary_id: &str, agent_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_DIARY, diary_id, REL_OWNER, agent_id))
            .await
    }

    pub async fn grant_diary_writer(&self, diary_id: &str, agent_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_DIARY, diary_id, REL_WRITER, agent_id))
            .await
    }

    pub async fn grant_diary_reader(&self, diary_id: &str, agent_id: &str) -> PolicyResult<()> {
        self.engine
            .write(RelationTuple::new(NS_DIARY, diary_id, REL_READER, agent_id))
            .await
    }

    /// Remove every relation a diary has, across every relation kind this
    /// adapter writes for it. Used when a diary is deleted.
    pub async fn remove_diary_relations(&self, diary_id: &str, agent_id: &str) -> PolicyResult<()> {
        for relation in [REL_OWNER, REL_WRITER, REL_READER] {
            self.engine
                .delete(RelationTuple::new(NS_DIARY, diary_id, relation, agent_id))
                .await?;
        }
        Ok(())
    }

    /// Remove a single agent's relation to a diary (e.g. a revoked share)
    /// without touching any other agent's relation to the same diary.
    pub async fn remove_diary_relation_for_agent(
        &self,
        diary_id: &str,
        agent_id: &str,
        relation: &str,
    ) -> PolicyResult<()> {
        self.engine
            .delete(RelationTuple::new(NS_DIARY, diary_id, relation, agent_id))
            .await
    }

    /// Remove every relation an entry has to `agent_id`. Used when an
    /// entry is deleted or a share is revoked.
    pub async fn remove_entry_relations(&self, entry_id: &str, agent_id: &str) -> PolicyResult<()> {
        for relation in [REL_OWNER, REL_VIEWER] {
            self.engine
                .delete(RelationTuple::new(NS_DIARY_ENTRY, entry_id, relation, agent_id))
                .await?;
        }
        Ok(())
    }

    // --- reads ----------------------------------------------------------

    pub async fn can_view_entry(&self, entry_id: &str, agent_id: &str) -> PolicyResult<bool> {
        for relation in [REL_OWNER, REL_VIEWER] {
            if self
                .engine
                .check(&RelationTuple::new(NS_DIARY_ENTRY, entry_id, relation, agent_id))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn can_edit_entry(&self, entry_id: &str, agent_id: &str) -> PolicyResult<bool> {
        self.engine
            .check(&RelationTuple::new(NS_DIARY_ENTRY, entry_id, REL_OWNER, agent_id))
            .await
    }

    pub async fn can_delete_entry(&self, entry_id: &str, agent_id: &str) -> PolicyResult<bool> {
        self.engine
            .check(&RelationTuple::new(NS_DIARY_ENTRY, entry_id, REL_OWNER, agent_id))
            .await
    }

    pub async fn can_read_diary(&self, diary_id: &str, agent_id: &str) -> PolicyResult<bool> {
        for relation in [REL_OWNER, REL_WRITER, REL_READER] {
            if self
                .engine
                .check(&RelationTuple::new(NS_DIARY, diary_id, relation, agent_id))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn can_write_diary(&self, diary_id: &str, agent_id: &str) -> PolicyResult<bool> {
        for relation in [REL_OWNER, REL_WRITER] {
            if self
                .engine
                .check(&RelationTuple::new(NS_DIARY, diary_id, relation, agent_id))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn can_manage_diary(&self, diary_id: &str, agent_id: &str) -> PolicyResult<bool> {
        self.engine
            .check(&RelationTuple::new(NS_DIARY, diary_id, REL_OWNER, agent_id))
            .await
    }
}
