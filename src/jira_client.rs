/// Jira Cloud REST client
///
/// Thin wrapper over the v3 issue endpoints used by the handlers: read an
/// issue, create one, link two issues and replace a description.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::adf;
use crate::app_config::JiraConfig;
use crate::errors::JiraError;
use crate::models::IssueDetails;

/// Operations the handlers need from an issue tracker
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_issue(&self, issue_key: &str) -> Result<IssueDetails, JiraError>;

    /// Create an issue and return its key
    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: Option<&str>,
        issue_type: &str,
    ) -> Result<String, JiraError>;

    async fn link_issues(&self, from_key: &str, to_key: &str, link_type: &str) -> Result<(), JiraError>;

    async fn update_description(&self, issue_key: &str, description: &str) -> Result<(), JiraError>;
}

// Response of GET /rest/api/3/issue/{key}
#[derive(Debug, Deserialize)]
struct IssueResponse {
    id: String,
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    issuetype: Option<IssueTypeField>,
}

#[derive(Debug, Deserialize)]
struct IssueTypeField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Client for the Jira Cloud REST API
pub struct JiraClient {
    client: Client,
    base_url: Url,
    /// Precomputed `Basic` authorization header value
    authorization: String,
}

impl JiraClient {
    /// Create a client from configuration, failing when credentials are missing
    pub fn new(config: &JiraConfig) -> Result<Self, JiraError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| JiraError::NotConfigured("JIRA_BASE_URL is not set".to_string()))?;
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| JiraError::NotConfigured(format!("JIRA_BASE_URL is not a valid URL: {}", base_url)))?;
        let email = config
            .email
            .as_deref()
            .ok_or_else(|| JiraError::NotConfigured("JIRA_EMAIL is not set".to_string()))?;
        let token = config
            .api_token
            .as_deref()
            .ok_or_else(|| JiraError::NotConfigured("JIRA_API_TOKEN is not set".to_string()))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            authorization: basic_authorization(email, token),
        })
    }

    /// REST v3 URL for `segments`, each one percent-encoded as a single path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["rest", "api", "3"]).extend(segments);
        }
        url
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
    }

    /// Turn a non-2xx response into `JiraError::Status`
    async fn check(response: Response, operation: &str) -> Result<Response, JiraError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Jira {} failed with {}: {}", operation, status, body);
        Err(JiraError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, issue_key: &str) -> Result<IssueDetails, JiraError> {
        debug!("Fetching Jira issue {}", issue_key);

        let response = self
            .request(self.client.get(self.url(&["issue", issue_key])))
            .send()
            .await?;
        let response = Self::check(response, "fetch issue").await?;

        let issue = response
            .json::<IssueResponse>()
            .await
            .map_err(|e| JiraError::InvalidResponse(e.to_string()))?;

        Ok(IssueDetails {
            key: issue.key,
            id: issue.id,
            issue_type: issue.fields.issuetype.map(|t| t.name).unwrap_or_default(),
            title: issue.fields.summary.unwrap_or_default(),
            description: adf::first_text(&issue.fields.description),
        })
    }

    async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        description: Option<&str>,
        issue_type: &str,
    ) -> Result<String, JiraError> {
        let payload = create_issue_payload(project_key, summary, description, issue_type);

        let response = self
            .request(self.client.post(self.url(&["issue"])))
            .json(&payload)
            .send()
            .await?;
        let response = Self::check(response, "create issue").await?;

        let created = response
            .json::<CreatedIssue>()
            .await
            .map_err(|e| JiraError::InvalidResponse(e.to_string()))?;

        info!("Created Jira {} {} in project {}", issue_type, created.key, project_key);
        Ok(created.key)
    }

    async fn link_issues(&self, from_key: &str, to_key: &str, link_type: &str) -> Result<(), JiraError> {
        let payload = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": from_key },
            "outwardIssue": { "key": to_key }
        });

        let response = self
            .request(self.client.post(self.url(&["issueLink"])))
            .json(&payload)
            .send()
            .await?;
        Self::check(response, "link issues").await?;

        debug!("Linked {} -> {} ({})", from_key, to_key, link_type);
        Ok(())
    }

    async fn update_description(&self, issue_key: &str, description: &str) -> Result<(), JiraError> {
        let payload = json!({
            "fields": {
                "description": adf::to_document(description)
            }
        });

        let response = self
            .request(self.client.put(self.url(&["issue", issue_key])))
            .json(&payload)
            .send()
            .await?;
        Self::check(response, "update description").await?;

        info!("Updated description of {}", issue_key);
        Ok(())
    }
}

/// Tracker used when Jira credentials are missing.
///
/// Lets the server start; every call fails with the configuration error.
pub struct UnconfiguredTracker {
    reason: String,
}

impl UnconfiguredTracker {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn error(&self) -> JiraError {
        JiraError::NotConfigured(self.reason.clone())
    }
}

#[async_trait]
impl IssueTracker for UnconfiguredTracker {
    async fn fetch_issue(&self, _issue_key: &str) -> Result<IssueDetails, JiraError> {
        Err(self.error())
    }

    async fn create_issue(
        &self,
        _project_key: &str,
        _summary: &str,
        _description: Option<&str>,
        _issue_type: &str,
    ) -> Result<String, JiraError> {
        Err(self.error())
    }

    async fn link_issues(&self, _from_key: &str, _to_key: &str, _link_type: &str) -> Result<(), JiraError> {
        Err(self.error())
    }

    async fn update_description(&self, _issue_key: &str, _description: &str) -> Result<(), JiraError> {
        Err(self.error())
    }
}

fn basic_authorization(email: &str, token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", email, token)))
}

fn create_issue_payload(project_key: &str, summary: &str, description: Option<&str>, issue_type: &str) -> Value {
    let mut fields = json!({
        "project": {
            "key": project_key
        },
        "issuetype": {
            "name": issue_type
        },
        "summary": summary
    });

    if let Some(desc) = description {
        fields["description"] = adf::to_document(desc);
    }

    json!({ "fields": fields })
}
