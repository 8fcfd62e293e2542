/// HTTP handlers for the Agile assistant API
///
/// Each handler validates its input, calls the prompt builder, the model
/// endpoint and/or Jira, and returns an `ApiResult`. Error-to-status mapping
/// lives in `ApiError`.

use std::sync::Arc;

use actix_web::middleware::from_fn;
use actix_web::{HttpResponse, web};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::auth_gate;
use crate::errors::{ApiError, ApiResult, UpstreamContext};
use crate::jira_client::IssueTracker;
use crate::llm_handler::TextGenerator;
use crate::models::{
    CreateTasksRequest, CreateTasksResponse, CreateTestCasesRequest, GeneratedTask, GeneratedTestCase,
    GenerationRequest, GenerationResponse, SuccessResponse, UpdateDescriptionRequest, parse_issue_key,
    project_key_of,
};
use crate::prompts::build_prompt;

pub const DEFAULT_ISSUE_TYPE: &str = "Story";

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    pub issue_tracker: Arc<dyn IssueTracker>,
    pub generator: Arc<dyn TextGenerator>,
    pub task_issue_type: String,
    pub testcase_issue_type: String,
    pub link_type: String,
}

/// Register every route under `/api`.
///
/// `/api/update-description` is registered before the gated scope so the
/// auth gate does not apply to it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(format!("Invalid JSON body: {}", err)).into()),
    )
    .service(web::resource("/api/update-description").route(web::post().to(update_description_handler)))
    .service(
        web::scope("/api")
            .wrap(from_fn(auth_gate))
            .route("/issue", web::get().to(missing_issue_key_handler))
            .route("/issue/", web::get().to(missing_issue_key_handler))
            .route("/issue/{issue_key}", web::get().to(get_issue_handler))
            .route("/analyze", web::post().to(analyze_handler))
            .route("/create-tasks", web::post().to(create_tasks_handler))
            .route("/create-testcases", web::post().to(create_testcases_handler)),
    );
}

fn required_text(value: Option<&str>, field: &str) -> ApiResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}

/// A present `<PROJECT>-<number>` key; anything else is a 400
fn required_issue_key(value: Option<&str>) -> ApiResult<String> {
    let issue_key = required_text(value, "issueKey")?;
    if parse_issue_key(&issue_key).is_none() {
        return Err(ApiError::bad_request(format!("Invalid issue key: {}", issue_key)));
    }
    Ok(issue_key)
}

fn parent_project_key(issue_key: &str) -> ApiResult<&str> {
    project_key_of(issue_key)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid issue key: {}", issue_key)))
}

fn required_array<'a>(value: Option<&'a Value>, field: &str) -> ApiResult<&'a Vec<Value>> {
    value
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request(format!("{} must be an array", field)))
}

/// GET /api/issue/ - Issue key left out of the path
pub async fn missing_issue_key_handler() -> ApiResult<HttpResponse> {
    Err(ApiError::bad_request("issueKey is required"))
}

/// GET /api/issue/{issue_key} - Fetch an issue's details
pub async fn get_issue_handler(path: web::Path<String>, data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let issue_key = required_issue_key(Some(path.as_str()))?;
    info!("Fetching issue {}", issue_key);

    let issue = data
        .issue_tracker
        .fetch_issue(&issue_key)
        .await
        .upstream("Failed to fetch issue")?;

    Ok(HttpResponse::Ok().json(issue))
}

/// POST /api/analyze - Generate text for an action
pub async fn analyze_handler(
    req: web::Json<GenerationRequest>,
    data: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let title = required_text(req.title.as_deref(), "title")?;
    let action = required_text(req.action.as_deref(), "action")?;
    let description = req.description.unwrap_or_default();
    let issue_type = req
        .issue_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string());

    info!("Generating '{}' output for {}", action, title);
    let prompt = build_prompt(&title, &description, &issue_type, &action);

    let output = data
        .generator
        .generate(&prompt)
        .await
        .upstream("Failed to generate output")?;

    Ok(HttpResponse::Ok().json(GenerationResponse { output }))
}

/// POST /api/create-tasks - Create one linked issue per generated task
pub async fn create_tasks_handler(
    req: web::Json<CreateTasksRequest>,
    data: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let issue_key = required_issue_key(req.issue_key.as_deref())?;
    let project_key = parent_project_key(&issue_key)?;
    let tasks = required_array(req.tasks.as_ref(), "tasks")?;

    info!("Creating {} tasks under {}", tasks.len(), issue_key);

    let mut created = Vec::with_capacity(tasks.len());
    for entry in tasks {
        let task = GeneratedTask::from_value(entry);

        let new_key = data
            .issue_tracker
            .create_issue(project_key, &task.title, task.description.as_deref(), &data.task_issue_type)
            .await
            .upstream("Failed to create tasks")?;

        data.issue_tracker
            .link_issues(&new_key, &issue_key, &data.link_type)
            .await
            .upstream("Failed to create tasks")?;

        debug!("Task {} linked to {}", new_key, issue_key);
        created.push(new_key);
    }

    Ok(HttpResponse::Ok().json(CreateTasksResponse { success: true, created }))
}

/// POST /api/create-testcases - Create one linked issue per generated test case
pub async fn create_testcases_handler(
    req: web::Json<CreateTestCasesRequest>,
    data: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let issue_key = required_issue_key(req.issue_key.as_deref())?;
    let project_key = parent_project_key(&issue_key)?;
    let test_cases = required_array(req.test_cases.as_ref(), "testCases")?;

    info!("Creating {} test cases under {}", test_cases.len(), issue_key);

    for entry in test_cases {
        let test_case = GeneratedTestCase::from_value(entry);
        let description = test_case.steps_description();

        let new_key = data
            .issue_tracker
            .create_issue(
                project_key,
                &test_case.title,
                description.as_deref(),
                &data.testcase_issue_type,
            )
            .await
            .upstream("Failed to create test cases")?;

        data.issue_tracker
            .link_issues(&new_key, &issue_key, &data.link_type)
            .await
            .upstream("Failed to create test cases")?;
    }

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

/// POST /api/update-description - Replace an issue's description
pub async fn update_description_handler(
    req: web::Json<UpdateDescriptionRequest>,
    data: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let issue_key = required_issue_key(req.issue_key.as_deref())?;
    let description = req
        .description
        .ok_or_else(|| ApiError::bad_request("description is required"))?;

    info!("Updating description of {}", issue_key);

    data.issue_tracker
        .update_description(&issue_key, &description)
        .await
        .upstream("Failed to update description")?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{GenerationError, JiraError};
    use crate::models::IssueDetails;
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fetch(String),
        Create { project: String, summary: String, description: Option<String>, issue_type: String },
        Link { from: String, to: String, link_type: String },
        Update { key: String, description: String },
    }

    #[derive(Default)]
    struct StubTracker {
        calls: Mutex<Vec<Call>>,
        fail_link: bool,
        fail_all: bool,
        description: Option<String>,
    }

    impl StubTracker {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.lock().iter().filter(|c| pred(c)).count()
        }

        fn fail(&self) -> Result<(), JiraError> {
            if self.fail_all {
                return Err(JiraError::Status { status: 503, body: "unavailable".to_string() });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl IssueTracker for StubTracker {
        async fn fetch_issue(&self, issue_key: &str) -> Result<IssueDetails, JiraError> {
            self.calls.lock().push(Call::Fetch(issue_key.to_string()));
            self.fail()?;
            Ok(IssueDetails {
                key: issue_key.to_string(),
                id: "10001".to_string(),
                issue_type: "Story".to_string(),
                title: "Add filter".to_string(),
                description: self.description.clone().unwrap_or_default(),
            })
        }

        async fn create_issue(
            &self,
            project_key: &str,
            summary: &str,
            description: Option<&str>,
            issue_type: &str,
        ) -> Result<String, JiraError> {
            let mut calls = self.calls.lock();
            calls.push(Call::Create {
                project: project_key.to_string(),
                summary: summary.to_string(),
                description: description.map(|d| d.to_string()),
                issue_type: issue_type.to_string(),
            });
            let created = calls.iter().filter(|c| matches!(c, Call::Create { .. })).count();
            drop(calls);
            self.fail()?;
            Ok(format!("{}-{}", project_key, 100 + created))
        }

        async fn link_issues(&self, from_key: &str, to_key: &str, link_type: &str) -> Result<(), JiraError> {
            self.calls.lock().push(Call::Link {
                from: from_key.to_string(),
                to: to_key.to_string(),
                link_type: link_type.to_string(),
            });
            self.fail()?;
            if self.fail_link {
                return Err(JiraError::Status { status: 400, body: "link type not found".to_string() });
            }
            Ok(())
        }

        async fn update_description(&self, issue_key: &str, description: &str) -> Result<(), JiraError> {
            self.calls.lock().push(Call::Update {
                key: issue_key.to_string(),
                description: description.to_string(),
            });
            self.fail()
        }
    }

    #[derive(Default)]
    struct StubGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().push(prompt.to_string());
            if self.fail {
                return Err(GenerationError::NotConfigured("LLM_DEPLOYMENT is not set".to_string()));
            }
            Ok("generated text".to_string())
        }
    }

    fn state(tracker: Arc<StubTracker>, generator: Arc<StubGenerator>) -> web::Data<AppState> {
        web::Data::new(AppState {
            issue_tracker: tracker,
            generator,
            task_issue_type: "Task".to_string(),
            testcase_issue_type: "Test".to_string(),
            link_type: "Relates".to_string(),
        })
    }

    macro_rules! app {
        ($tracker:expr, $generator:expr) => {
            test::init_service(
                App::new()
                    .app_data(state($tracker.clone(), $generator.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    async fn body_json<B: actix_web::body::MessageBody>(resp: actix_web::dev::ServiceResponse<B>) -> Value {
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn test_get_issue() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::get().uri("/api/issue/PROJ-1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({
                "key": "PROJ-1",
                "id": "10001",
                "type": "Story",
                "title": "Add filter",
                "description": ""
            })
        );
        assert_eq!(tracker.calls(), vec![Call::Fetch("PROJ-1".to_string())]);
    }

    #[actix_web::test]
    async fn test_get_issue_failure_is_500() {
        let tracker = Arc::new(StubTracker { fail_all: true, ..Default::default() });
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::get().uri("/api/issue/PROJ-1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Failed to fetch issue" }));
    }

    #[actix_web::test]
    async fn test_analyze_requires_title_and_action() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post().uri("/api/analyze").set_json(json!({})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
        assert!(generator.prompts.lock().is_empty());

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({ "title": "Add filter" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(generator.prompts.lock().is_empty());
    }

    #[actix_web::test]
    async fn test_analyze_returns_output() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({
                "title": "Add filter",
                "description": "Let users filter by date",
                "type": "Story",
                "action": "tasks"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "output": "generated text" }));

        let prompts = generator.prompts.lock().clone();
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0],
            build_prompt("Add filter", "Let users filter by date", "Story", "tasks")
        );
    }

    #[actix_web::test]
    async fn test_analyze_generation_failure() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator { fail: true, ..Default::default() });
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .set_json(json!({ "title": "Login bug", "action": "bug" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Failed to generate output" }));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[actix_web::test]
    async fn test_create_tasks_creates_and_links() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/create-tasks")
            .set_json(json!({
                "issueKey": "PROJ-1",
                "tasks": [{ "title": "T1", "description": "D1" }]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "success": true, "created": ["PROJ-101"] }));

        assert_eq!(
            tracker.calls(),
            vec![
                Call::Create {
                    project: "PROJ".to_string(),
                    summary: "T1".to_string(),
                    description: Some("D1".to_string()),
                    issue_type: "Task".to_string(),
                },
                Call::Link {
                    from: "PROJ-101".to_string(),
                    to: "PROJ-1".to_string(),
                    link_type: "Relates".to_string(),
                },
            ]
        );
    }

    #[actix_web::test]
    async fn test_create_tasks_partial_failure_has_no_rollback() {
        let tracker = Arc::new(StubTracker { fail_link: true, ..Default::default() });
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/create-tasks")
            .set_json(json!({
                "issueKey": "PROJ-1",
                "tasks": [
                    { "title": "T1", "description": "D1" },
                    { "title": "T2", "description": "D2" }
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Failed to create tasks" }));

        assert_eq!(tracker.count(|c| matches!(c, Call::Create { .. })), 1);
        assert_eq!(tracker.count(|c| matches!(c, Call::Link { .. })), 1);
    }

    #[actix_web::test]
    async fn test_create_tasks_invalid_payload() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        for body in [
            json!({ "tasks": [] }),
            json!({ "issueKey": "PROJ-1" }),
            json!({ "issueKey": "PROJ-1", "tasks": { "title": "T1" } }),
            json!({ "issueKey": "PROJ", "tasks": [] }),
        ] {
            let req = test::TestRequest::post().uri("/api/create-tasks").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert!(tracker.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_create_testcases() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/create-testcases")
            .set_json(json!({
                "issueKey": "QA-7",
                "testCases": [
                    { "title": "Valid login", "steps": [{ "action": "Sign in", "expected": "Dashboard" }] },
                    { "title": "No steps" }
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "success": true }));

        let calls = tracker.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[0],
            Call::Create {
                project: "QA".to_string(),
                summary: "Valid login".to_string(),
                description: Some("1. Sign in\n   Expected: Dashboard".to_string()),
                issue_type: "Test".to_string(),
            }
        );
        assert!(matches!(&calls[2], Call::Create { description: None, .. }));
        assert!(matches!(&calls[3], Call::Link { to, .. } if to == "QA-7"));
    }

    #[actix_web::test]
    async fn test_update_description() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/update-description")
            .set_json(json!({ "issueKey": "PROJ-1", "description": "New text" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "success": true }));
        assert_eq!(
            tracker.calls(),
            vec![Call::Update { key: "PROJ-1".to_string(), description: "New text".to_string() }]
        );

        let req = test::TestRequest::post()
            .uri("/api/update-description")
            .set_json(json!({ "issueKey": "PROJ-1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_auth_gate_applies_to_gated_routes_only() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((AUTHORIZATION, "Token abc"))
            .set_json(json!({ "title": "Add filter", "action": "criteria" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(body_json(resp).await["error"].is_string());
        assert!(generator.prompts.lock().is_empty());

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((AUTHORIZATION, "Bearer abc"))
            .set_json(json!({ "title": "Add filter", "action": "criteria" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/update-description")
            .insert_header((AUTHORIZATION, "Token abc"))
            .set_json(json!({ "issueKey": "PROJ-1", "description": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_get_issue_without_key_is_400() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        for uri in ["/api/issue/", "/api/issue"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body_json(resp).await, json!({ "error": "issueKey is required" }));
        }
        assert!(tracker.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_malformed_issue_keys_never_reach_jira() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::get()
            .uri("/api/issue/..%2F..%2F2%2Fuser%3FaccountId=victim")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/update-description")
            .set_json(json!({ "issueKey": "../../2/user?accountId=victim#", "description": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].as_str().unwrap().starts_with("Invalid issue key"));

        let req = test::TestRequest::post()
            .uri("/api/create-tasks")
            .set_json(json!({ "issueKey": "PROJ-1/../x", "tasks": [{ "title": "T1" }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(tracker.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_update_description_failure_is_500() {
        let tracker = Arc::new(StubTracker { fail_all: true, ..Default::default() });
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/update-description")
            .set_json(json!({ "issueKey": "PROJ-1", "description": "New text" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Failed to update description" }));
        assert_eq!(tracker.count(|c| matches!(c, Call::Update { .. })), 1);
    }

    #[actix_web::test]
    async fn test_create_testcases_partial_failure_has_no_rollback() {
        let tracker = Arc::new(StubTracker { fail_link: true, ..Default::default() });
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        let req = test::TestRequest::post()
            .uri("/api/create-testcases")
            .set_json(json!({
                "issueKey": "QA-7",
                "testCases": [
                    { "title": "Valid login", "steps": [{ "action": "Sign in", "expected": "Dashboard" }] },
                    { "title": "Invalid login" }
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Failed to create test cases" }));

        assert_eq!(tracker.count(|c| matches!(c, Call::Create { .. })), 1);
        assert_eq!(tracker.count(|c| matches!(c, Call::Link { .. })), 1);
    }

    #[actix_web::test]
    async fn test_create_testcases_invalid_payload() {
        let tracker = Arc::new(StubTracker::default());
        let generator = Arc::new(StubGenerator::default());
        let app = app!(tracker, generator);

        for body in [
            json!({ "testCases": [] }),
            json!({ "issueKey": "QA-7" }),
            json!({ "issueKey": "QA-7", "testCases": "not a list" }),
        ] {
            let req = test::TestRequest::post().uri("/api/create-testcases").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert!(body_json(resp).await["error"].is_string());
        }
        assert!(tracker.calls().is_empty());
    }
}
