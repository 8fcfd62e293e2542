use std::env;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_TASK_ISSUE_TYPE: &str = "Task";
pub const DEFAULT_TESTCASE_ISSUE_TYPE: &str = "Test";
pub const DEFAULT_LINK_TYPE: &str = "Relates";

// Chat-completion dialect spoken by the model endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LLMProvider {
    #[default]
    Azure,
    OpenAI,
}

impl LLMProvider {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "azure" => Some(LLMProvider::Azure),
            "openai" => Some(LLMProvider::OpenAI),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub provider: LLMProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Deployment name for Azure, model name for OpenAI-compatible endpoints
    pub deployment: Option<String>,
    pub api_version: String,
}

#[derive(Debug, Clone, Default)]
pub struct JiraConfig {
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub task_issue_type: String,
    pub testcase_issue_type: String,
    pub link_type: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Settings read once at startup and shared with every client
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub jira: JiraConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = get("LLM_PROVIDER")
            .and_then(|v| LLMProvider::parse(&v))
            .unwrap_or_default();

        let endpoint = get("LLM_ENDPOINT").or_else(|| match provider {
            LLMProvider::OpenAI => Some(DEFAULT_OPENAI_ENDPOINT.to_string()),
            LLMProvider::Azure => None,
        });

        let port = get("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            llm: LlmConfig {
                provider,
                endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
                api_key: get("LLM_API_KEY"),
                deployment: get("LLM_DEPLOYMENT"),
                api_version: get("LLM_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            },
            jira: JiraConfig {
                base_url: get("JIRA_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
                email: get("JIRA_EMAIL"),
                api_token: get("JIRA_API_TOKEN"),
                task_issue_type: get("JIRA_TASK_ISSUE_TYPE")
                    .unwrap_or_else(|| DEFAULT_TASK_ISSUE_TYPE.to_string()),
                testcase_issue_type: get("JIRA_TESTCASE_ISSUE_TYPE")
                    .unwrap_or_else(|| DEFAULT_TESTCASE_ISSUE_TYPE.to_string()),
                link_type: get("JIRA_LINK_TYPE").unwrap_or_else(|| DEFAULT_LINK_TYPE.to_string()),
            },
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            },
        }
    }

    /// Names of the variables that are required but missing
    pub fn validate(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.jira.base_url.is_none() {
            missing.push("JIRA_BASE_URL");
        }
        if self.jira.email.is_none() {
            missing.push("JIRA_EMAIL");
        }
        if self.jira.api_token.is_none() {
            missing.push("JIRA_API_TOKEN");
        }
        if self.llm.endpoint.is_none() {
            missing.push("LLM_ENDPOINT");
        }
        if self.llm.api_key.is_none() {
            missing.push("LLM_API_KEY");
        }
        if self.llm.deployment.is_none() {
            missing.push("LLM_DEPLOYMENT");
        }

        missing
    }
}
