// Prompt templates for the Agile artifacts the front-end can request

pub const SYSTEM_PROMPT: &str = "You are an expert Agile engineer and documentation specialist. Return plain text only, without Markdown or HTML markup.";

// Actions understood by the generation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgileAction {
    Tasks,
    TestCases,
    Criteria,
    Description,
    Bug,
}

impl AgileAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tasks" => Some(AgileAction::Tasks),
            "testcases" => Some(AgileAction::TestCases),
            "criteria" => Some(AgileAction::Criteria),
            "description" => Some(AgileAction::Description),
            "bug" => Some(AgileAction::Bug),
            _ => None,
        }
    }
}

/// Build the user prompt for `action`.
///
/// Unknown actions yield `title` unchanged.
pub fn build_prompt(title: &str, description: &str, issue_type: &str, action: &str) -> String {
    match AgileAction::from_name(action) {
        Some(AgileAction::Tasks) => tasks_prompt(title, description, issue_type),
        Some(AgileAction::TestCases) => test_cases_prompt(title, description, issue_type),
        Some(AgileAction::Criteria) => criteria_prompt(title, description),
        Some(AgileAction::Description) => user_story_prompt(title, description, issue_type),
        Some(AgileAction::Bug) => bug_prompt(title, description),
        None => title.to_string(),
    }
}

fn tasks_prompt(title: &str, description: &str, issue_type: &str) -> String {
    format!(
        "Break down the following {issue_type} into an ordered list of small, actionable development tasks.

Title: {title}
Description: {description}

Each task needs a short title and a one or two sentence description of the work involved.
Respond with valid JSON only, using exactly this shape:
{{
  \"tasks\": [
    {{ \"title\": \"Task title\", \"description\": \"What needs to be done\" }}
  ]
}}
Do not add any text before or after the JSON."
    )
}

fn test_cases_prompt(title: &str, description: &str, issue_type: &str) -> String {
    format!(
        "Write test cases that verify the following {issue_type}.

Title: {title}
Description: {description}

Cover the main success path, edge cases and error handling. Every test case has a title and
an ordered list of steps, each step with the action to perform and the expected result.
Respond with valid JSON only, using exactly this shape:
{{
  \"testCases\": [
    {{
      \"title\": \"Test case title\",
      \"steps\": [
        {{ \"action\": \"What the tester does\", \"expected\": \"What should happen\" }}
      ]
    }}
  ]
}}
Do not add any text before or after the JSON."
    )
}

fn criteria_prompt(title: &str, description: &str) -> String {
    format!(
        "Write clear, testable acceptance criteria for the following item.

Title: {title}
Description: {description}

List each criterion on its own line. Keep them specific and verifiable."
    )
}

fn user_story_prompt(title: &str, description: &str, issue_type: &str) -> String {
    format!(
        "Rewrite the following {issue_type} as a fully structured user story.

Title: {title}
Current description: {description}

Use these sections in this order:
User Story: As a <persona>, I want <goal>, so that <benefit>.
Persona: who the user is.
Goal: what they want to achieve.
Benefit: why it matters to them.
Acceptance Criteria: either Gherkin scenarios (Given / When / Then) or a bullet list.
Pick exactly one style for the acceptance criteria and never mix Gherkin and bullets in the same answer.

Example:
User Story: As a project manager, I want to export the sprint report as PDF, so that I can share progress with stakeholders.
Persona: Project manager running fortnightly sprints.
Goal: Export the sprint report in a portable format.
Benefit: Stakeholders without tool access can follow progress.
Acceptance Criteria:
Scenario: Export a finished sprint
Given a sprint has been closed
When the project manager clicks \"Export as PDF\"
Then a PDF containing the sprint summary and burndown chart is downloaded"
    )
}

fn bug_prompt(title: &str, description: &str) -> String {
    format!(
        "Summarize the following bug report clearly and concisely.

Title: {title}
Bug description: {description}

Explain what goes wrong, where it happens and what the expected behaviour is."
    )
}
