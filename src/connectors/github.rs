//! GitHub connector
//!
//! Repository listing for the authenticated user, reformatted into a JSON
//! summary the model can work with.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::config;
use crate::error::{ConnectorError, Result};
use crate::tools::{MethodSpec, ToolCategory, ToolParameter, ToolResult};

use super::{VendorConnector, bool_or, str_or};

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "vendor-connectors";

const REPO_TYPE_FILTERS: &[&str] = &["all", "public", "private", "forks", "sources", "member"];

/// Connector for the GitHub REST API
pub struct GithubConnector {
    client: Client,
    token: String,
    base_url: String,
}

impl GithubConnector {
    /// Create a connector, reading `GITHUB_TOKEN` from the environment
    pub fn new() -> Result<Self> {
        Ok(Self::with_token(config::require_env("GITHUB_TOKEN")?))
    }

    /// Create a connector with an explicit token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            base_url: GITHUB_API_URL.to_string(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("authorization", format!("Bearer {}", self.token))
            .header("accept", "application/vnd.github+json")
            .header("user-agent", USER_AGENT)
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
        Ok(response.json().await?)
    }

    /// List repositories for the authenticated user
    pub async fn list_repositories(
        &self,
        type_filter: &str,
        include_branches: bool,
    ) -> Result<ToolResult> {
        debug!(type_filter, include_branches, "listing github repositories");

        let repos = self
            .get_json(&format!("/user/repos?type={type_filter}&per_page=100"))
            .await?;
        let repos = repos.as_array().cloned().unwrap_or_default();

        let mut summaries = Vec::with_capacity(repos.len());
        for repo in &repos {
            let mut summary = json!({
                "name": repo["name"],
                "full_name": repo["full_name"],
                "private": repo["private"],
                "default_branch": repo["default_branch"],
                "url": repo["html_url"],
                "description": repo["description"],
            });

            if include_branches {
                if let Some(full_name) = repo["full_name"].as_str() {
                    let branches = self.get_json(&format!("/repos/{full_name}/branches")).await?;
                    let names: Vec<Value> = branches
                        .as_array()
                        .map(|b| b.iter().map(|br| br["name"].clone()).collect())
                        .unwrap_or_default();
                    summary["branches"] = json!(names);
                }
            }

            summaries.push(summary);
        }

        Ok(ToolResult::ok(json!({
            "count": summaries.len(),
            "repositories": summaries,
        })))
    }
}

#[async_trait]
impl VendorConnector for GithubConnector {
    fn name(&self) -> &str {
        "github"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Github
    }

    fn methods(&self) -> Vec<MethodSpec> {
        vec![
            MethodSpec::new(
                "list_repositories",
                "List repositories accessible to the authenticated user",
            )
            .with_parameters(vec![
                ToolParameter::string("type_filter", "Repository type filter")
                    .with_enum_values(REPO_TYPE_FILTERS)
                    .optional(json!("all")),
                ToolParameter::boolean("include_branches", "Include branch names per repository")
                    .optional(json!(false)),
            ]),
        ]
    }

    async fn call(&self, method: &str, args: &Value) -> Result<ToolResult> {
        match method {
            "list_repositories" => {
                self.list_repositories(
                    str_or(args, "type_filter", "all"),
                    bool_or(args, "include_branches", false),
                )
                .await
            }
            other => Err(ConnectorError::UnknownMethod {
                connector: self.name().to_string(),
                method: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for GithubConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConnector")
            .field("base_url", &self.base_url)
            .finish()
    }
}
