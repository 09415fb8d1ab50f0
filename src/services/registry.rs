// src/services/registry.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::cube::FlowCube;

/// Why a registry call failed. Transport and status failures are
/// recoverable: callers surface them and leave their state untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("registry returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected registry payload: {0}")]
    Payload(String),

    #[error("tool '{0}' is missing required identity fields")]
    MissingIdentity(String),
}

/// Body of a plan-generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub queries: Vec<FlowCube>,
    pub tools: Vec<FlowCube>,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
struct PlanReply {
    plan: String,
}

/// The tool registry as the widget sees it. A trait so tests (and any
/// future host-provided source) can stand in for the HTTP client.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Display names of every published tool.
    async fn list_tools(&self) -> Result<Vec<String>, RegistryError>;

    /// Full metadata for one tool, by display name.
    async fn fetch_tool(&self, name: &str) -> Result<FlowCube, RegistryError>;

    /// A textual execution plan for the given queries, tools and prompt.
    async fn generate_plan(&self, request: &PlanRequest) -> Result<String, RegistryError>;
}

/// HTTP client for the registry API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<T, RegistryError> {
        debug!("GET {url}");
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(RegistryError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RegistryError::Status { status, body });
        }

        res.json::<T>()
            .await
            .map_err(|err| RegistryError::Payload(err.to_string()))
    }
}

#[async_trait]
impl ToolRegistry for RegistryClient {
    async fn list_tools(&self) -> Result<Vec<String>, RegistryError> {
        self.get_json(format!("{}/tools", self.base_url)).await
    }

    async fn fetch_tool(&self, name: &str) -> Result<FlowCube, RegistryError> {
        let url = format!("{}/tools/{}", self.base_url, urlencoding::encode(name));
        let cube: FlowCube = self.get_json(url).await?;

        if cube.id.is_empty() || cube.display_name().is_empty() {
            return Err(RegistryError::MissingIdentity(name.to_string()));
        }
        Ok(cube)
    }

    async fn generate_plan(&self, request: &PlanRequest) -> Result<String, RegistryError> {
        let url = format!("{}/generate-plan", self.base_url);
        debug!("POST {url}");
        let res = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(RegistryError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RegistryError::Status { status, body });
        }

        let reply: PlanReply = res
            .json()
            .await
            .map_err(|err| RegistryError::Payload(err.to_string()))?;
        Ok(reply.plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = RegistryClient::new("http://localhost:3000/api/");
        assert_eq!(client.base_url, "http://localhost:3000/api");
    }

    #[test]
    fn identity_validation_rejects_anonymous_cubes() {
        // exercised through fetch_tool in the widget tests; here we only
        // pin the predicate the client applies
        let cube = FlowCube {
            id: "tool-x".to_string(),
            ..Default::default()
        };
        assert!(cube.display_name().is_empty());
    }
}
