use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Issue details returned by GET /issue/{issueKey}
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IssueDetails {
    pub key: String,
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub title: String,
    pub description: String,
}

/// Body of POST /analyze
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub output: String,
}

/// Body of POST /create-tasks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTasksRequest {
    pub issue_key: Option<String>,
    pub tasks: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateTasksResponse {
    pub success: bool,
    pub created: Vec<String>,
}

/// Body of POST /create-testcases
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestCasesRequest {
    pub issue_key: Option<String>,
    pub test_cases: Option<Value>,
}

/// Body of POST /update-description
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDescriptionRequest {
    pub issue_key: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A task proposed by the model and echoed back by the front-end
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTask {
    pub title: String,
    pub description: Option<String>,
}

impl GeneratedTask {
    /// Read a task entry without rejecting missing or mistyped fields
    pub fn from_value(value: &Value) -> Self {
        Self {
            title: value["title"].as_str().unwrap_or_default().to_string(),
            description: value["description"].as_str().map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestStep {
    pub action: String,
    pub expected: String,
}

/// A test case proposed by the model and echoed back by the front-end
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTestCase {
    pub title: String,
    pub steps: Vec<TestStep>,
}

impl GeneratedTestCase {
    pub fn from_value(value: &Value) -> Self {
        let steps = value["steps"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .map(|step| TestStep {
                        action: step["action"].as_str().unwrap_or_default().to_string(),
                        expected: step["expected"].as_str().unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: value["title"].as_str().unwrap_or_default().to_string(),
            steps,
        }
    }

    /// Render the steps as the issue description, `None` when there are no steps
    pub fn steps_description(&self) -> Option<String> {
        if self.steps.is_empty() {
            return None;
        }

        let lines: Vec<String> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}\n   Expected: {}", i + 1, step.action, step.expected))
            .collect();

        Some(lines.join("\n"))
    }
}

/// Split an issue key of the form `<PROJECT>-<number>`.
///
/// The project part starts with a letter and holds only ASCII letters, digits
/// or `_`; the number part is ASCII digits. Anything else is rejected.
pub fn parse_issue_key(issue_key: &str) -> Option<(&str, &str)> {
    let (project, number) = issue_key.split_once('-')?;

    let project_ok = project.starts_with(|c: char| c.is_ascii_alphabetic())
        && project.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let number_ok = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());

    (project_ok && number_ok).then_some((project, number))
}

/// Project key of an issue key such as `PROJ-123`
pub fn project_key_of(issue_key: &str) -> Option<&str> {
    parse_issue_key(issue_key).map(|(project, _)| project)
}
