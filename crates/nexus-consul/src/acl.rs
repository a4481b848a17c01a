//! Consul ACL / KV operations
//!
//! Thin client over the HTTP API: policy creation, token creation, and
//! configuration upload into the KV store. Every call is authenticated
//! with the global bootstrap token.

use crate::error::{AclError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A policy that exists on the access-control side.
#[derive(Debug, Clone)]
pub struct CreatedPolicy {
    pub id: String,
    pub name: String,
}

/// Access-control operations the provisioning pipeline needs.
///
/// Implemented against Consul's HTTP API in production; tests substitute
/// a scripted implementation.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Create (or update) the policy granting a service its KV namespace.
    /// The policy is named `<service>-policy`.
    async fn create_policy(
        &self,
        global_token: &str,
        service: &str,
        rules: &str,
    ) -> Result<CreatedPolicy>;

    /// Exchange the global token and a policy name for a scoped service token.
    async fn create_token(
        &self,
        global_token: &str,
        service: &str,
        policy_name: &str,
    ) -> Result<String>;

    /// Upload a configuration blob under the given KV key.
    async fn kv_put(&self, global_token: &str, key: &str, blob: &str) -> Result<()>;
}

/// Consul-backed implementation.
pub struct ConsulAcl {
    client: reqwest::Client,
    base_url: String,
}

impl ConsulAcl {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AclError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn check(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AclError::Api {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct PolicyResponse {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "SecretID")]
    secret_id: String,
}

#[async_trait]
impl AccessControl for ConsulAcl {
    async fn create_policy(
        &self,
        global_token: &str,
        service: &str,
        rules: &str,
    ) -> Result<CreatedPolicy> {
        let policy_name = format!("{service}-policy");
        debug!(service, policy = %policy_name, "Creating ACL policy");
        let body = serde_json::json!({
            "Name": policy_name,
            "Description": format!("Access policy for {service}"),
            "Rules": rules,
        });
        let response = self
            .client
            .put(format!("{}/v1/acl/policy", self.base_url))
            .header("X-Consul-Token", global_token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, "Policy creation").await?;
        let created: PolicyResponse = response.json().await?;
        info!(policy = %created.name, "ACL policy created");
        Ok(CreatedPolicy {
            id: created.id,
            name: created.name,
        })
    }

    async fn create_token(
        &self,
        global_token: &str,
        service: &str,
        policy_name: &str,
    ) -> Result<String> {
        if policy_name.trim().is_empty() {
            return Err(AclError::EmptyPolicyName {
                service: service.to_string(),
            });
        }
        debug!(service, policy = policy_name, "Creating ACL token");
        let body = serde_json::json!({
            "Description": format!("Token for {service}"),
            "Policies": [{ "Name": policy_name }],
        });
        let response = self
            .client
            .put(format!("{}/v1/acl/token", self.base_url))
            .header("X-Consul-Token", global_token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, "Token creation").await?;
        let created: TokenResponse = response.json().await?;
        if created.secret_id.trim().is_empty() {
            return Err(AclError::EmptyToken {
                service: service.to_string(),
            });
        }
        info!(service, "ACL token created");
        Ok(created.secret_id)
    }

    async fn kv_put(&self, global_token: &str, key: &str, blob: &str) -> Result<()> {
        debug!(key, bytes = blob.len(), "Uploading KV entry");
        let response = self
            .client
            .put(format!("{}/v1/kv/{key}", self.base_url))
            .header("X-Consul-Token", global_token)
            .body(blob.to_string())
            .send()
            .await?;
        Self::check(response, "KV upload").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        let acl = ConsulAcl::new("http://localhost:8500/").unwrap();
        assert_eq!(acl.base_url, "http://localhost:8500");
    }

    #[tokio::test]
    async fn empty_policy_name_is_rejected_before_any_request() {
        let acl = ConsulAcl::new("http://localhost:1").unwrap();
        // 不正なポートでもリクエスト前に弾かれる
        let result = acl.create_token("global", "orders", "  ").await;
        assert!(matches!(result, Err(AclError::EmptyPolicyName { .. })));
    }
}
