//! Ory Keto-backed `RelationshipEngine`, speaking Keto's relationship-tuple
//! REST API (`/admin/relation-tuples` write/delete, `/relation-tuples/check`
//! read). Used in deployments that run a dedicated permission service
//! instead of the local Postgres fallback.

use async_trait::async_trait;
use serde_json::json;

use crate::engine::{RelationTuple, RelationshipEngine};
use crate::error::{PolicyError, PolicyResult};

pub struct KetoClient {
    http: reqwest::Client,
    write_base_url: String,
    read_base_url: String,
}

impl KetoClient {
    pub fn new(write_base_url: impl Into<String>, read_base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            write_base_url: write_base_url.into(),
            read_base_url: read_base_url.into(),
        }
    }

    fn tuple_body(tuple: &RelationTuple) -> serde_json::Value {
        json!({
            "namespace": tuple.namespace,
            "object": tuple.object,
            "relation": tuple.relation,
            "subject_id": tuple.subject,
        })
    }
}

#[async_trait]
impl RelationshipEngine for KetoClient {
    async fn write(&self, tuple: RelationTuple) -> PolicyResult<()> {
        let url = format!("{}/admin/relation-tuples", self.write_base_url);
        let resp = self
            .http
            .put(&url)
            .json(&Self::tuple_body(&tuple))
            .send()
            .await
            .map_err(|e| PolicyError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PolicyError::Upstream(format!("keto write returned {}", resp.status())));
        }
        Ok(())
    }

    async fn delete(&self, tuple: RelationTuple) -> PolicyResult<()> {
        let url = format!(
            "{}/admin/relation-tuples?namespace={}&object={}&relation={}&subject_id={}",
            self.write_base_url, tuple.namespace, tuple.object, tuple.relation, tuple.subject
        );
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| PolicyError::Upstream(e.to_string()))?;

        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            return Err(PolicyError::Upstream(format!("keto delete returned {}", resp.status())));
        }
        Ok(())
    }

    async fn check(&self, tuple: &RelationTuple) -> PolicyResult<bool> {
        let url = format!(
            "{}/relation-tuples/check?namespace={}&object={}&relation={}&subject_id={}",
            self.read_base_url, tuple.namespace, tuple.object, tuple.relation, tuple.subject
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PolicyError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PolicyError::Upstream(format!("keto check returned {}", resp.status())));
        }

        #[derive(serde::Deserialize)]
        struct CheckResponse {
            allowed: bool,
        }
        let body: CheckResponse = resp.json().await.map_err(|e| PolicyError::Upstream(e.to_string()))?;
        Ok(body.allowed)
    }

    async fn list_subjects(&self, namespace: &str, object: &str, relation: &str) -> PolicyResult<Vec<String>> {
        let url = format!(
            "{}/relation-tuples?namespace={}&object={}&relation={}",
            self.read_base_url, namespace, object, relation
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PolicyError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PolicyError::Upstream(format!("keto list returned {}", resp.status())));
        }

        #[derive(serde::Deserialize)]
        struct RelationTuplesResponse {
            relation_tuples: Vec<SubjectOnly>,
        }
        #[derive(serde::Deserialize)]
        struct SubjectOnly {
            subject_id: String,
        }

        let body: RelationTuplesResponse = resp.json().await.map_err(|e| PolicyError::Upstream(e.to_string()))?;
        Ok(body.relation_tuples.into_iter().map(|t| t.subject_id).collect())
    }
}
