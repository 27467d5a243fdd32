//! Meshy connector
//!
//! Text-to-3D generation. Generation is asynchronous on the Meshy side:
//! `generate_model` submits a preview task and returns its task id, and
//! `get_task_status` polls it until the model is ready.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::config;
use crate::error::{ConnectorError, Result};
use crate::tools::{MethodSpec, ToolCategory, ToolParameter, ToolResult};

use super::{VendorConnector, required_str, str_or};

const MESHY_API_URL: &str = "https://api.meshy.ai";

const ART_STYLES: &[&str] = &["realistic", "sculpture"];

/// Connector for the Meshy text-to-3D API
pub struct MeshyConnector {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MeshyConnector {
    /// Create a connector, reading `MESHY_API_KEY` from the environment
    pub fn new() -> Result<Self> {
        Ok(Self::with_api_key(config::require_env("MESHY_API_KEY")?))
    }

    /// Create a connector with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: MESHY_API_URL.to_string(),
        }
    }

    /// Submit a text-to-3D preview task
    pub async fn generate_model(&self, prompt: &str, art_style: &str) -> Result<ToolResult> {
        debug!(art_style, "submitting meshy text-to-3d task");

        let response = self
            .client
            .post(format!("{}/openapi/v2/text-to-3d", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "mode": "preview",
                "prompt": prompt,
                "art_style": art_style,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let task_id = body["result"]
            .as_str()
            .ok_or_else(|| ConnectorError::InvalidResponse("missing task id".to_string()))?
            .to_string();

        Ok(ToolResult::ok(json!({
            "task_id": task_id,
            "status": "submitted",
            "message": "Generation started; poll with get_task_status",
        }))
        .with_task_id(task_id))
    }

    /// Poll a previously submitted task
    pub async fn get_task_status(&self, task_id: &str) -> Result<ToolResult> {
        debug!(task_id, "polling meshy task status");

        let response = self
            .client
            .get(format!("{}/openapi/v2/text-to-3d/{}", self.base_url, task_id))
            .header("authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        Ok(ToolResult::ok(json!({
            "task_id": task_id,
            "status": body["status"],
            "progress": body["progress"],
            "model_urls": body["model_urls"],
            "thumbnail_url": body["thumbnail_url"],
        }))
        .with_task_id(task_id.to_string()))
    }
}

#[async_trait]
impl VendorConnector for MeshyConnector {
    fn name(&self) -> &str {
        "meshy"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Meshy
    }

    fn methods(&self) -> Vec<MethodSpec> {
        vec![
            MethodSpec::new("generate_model", "Generate a 3D model from a text prompt")
                .with_parameters(vec![
                    ToolParameter::string("prompt", "Text description of the model to generate"),
                    ToolParameter::string("art_style", "Art style for the generated model")
                        .with_enum_values(ART_STYLES)
                        .optional(json!("realistic")),
                ]),
            MethodSpec::new("get_task_status", "Check the status of a generation task")
                .with_parameters(vec![ToolParameter::string(
                    "task_id",
                    "Task id returned by generate_model",
                )]),
        ]
    }

    async fn call(&self, method: &str, args: &Value) -> Result<ToolResult> {
        match method {
            "generate_model" => {
                let prompt = required_str(args, "prompt")?;
                self.generate_model(prompt, str_or(args, "art_style", "realistic"))
                    .await
            }
            "get_task_status" => {
                let task_id = required_str(args, "task_id")?;
                self.get_task_status(task_id).await
            }
            other => Err(ConnectorError::UnknownMethod {
                connector: self.name().to_string(),
                method: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for MeshyConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshyConnector")
            .field("base_url", &self.base_url)
            .finish()
    }
}
