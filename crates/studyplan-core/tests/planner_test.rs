//! Integration tests for the study-plan service against a stub model.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use studyplan_core::gateway::GatewayError;
use studyplan_core::planner::{PlanError, StudyPlanner};
use studyplan_core::prompt::SYSTEM_INSTRUCTION;
use studyplan_core::subject::{Priority, Subject, SubjectError};
use studyplan_test_utils::{StubModel, StubReply};

fn math_due_tomorrow() -> Subject {
    Subject::new(
        "Math",
        NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
        Priority::High,
    )
    .unwrap()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn generate_sends_prompt_and_returns_text() {
    let model = Arc::new(StubModel::text("# План\n- учить"));
    let planner = StudyPlanner::new(model.clone());

    let plan = planner
        .generate(vec![math_due_tomorrow()], now())
        .await
        .expect("generate should succeed");
    assert_eq!(plan, "# План\n- учить");

    let calls = model.calls();
    assert_eq!(calls.len(), 1, "model must be called exactly once");
    let (system, prompt) = &calls[0];
    assert_eq!(system, SYSTEM_INSTRUCTION);
    assert!(
        prompt.contains("Math: дедлайн 16.01.2025, осталось 1 дней, приоритет: high"),
        "prompt was:\n{prompt}"
    );
}

#[tokio::test]
async fn empty_subjects_never_reach_the_model() {
    let model = Arc::new(StubModel::text("unused"));
    let planner = StudyPlanner::new(model.clone());

    let err = planner.generate(vec![], now()).await.unwrap_err();
    assert!(matches!(err, PlanError::Subject(SubjectError::NoSubjects)));
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn empty_subjects_win_over_missing_credential() {
    let err = StudyPlanner::unconfigured()
        .generate(vec![], now())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Subject(SubjectError::NoSubjects)));
}

#[tokio::test]
async fn unconfigured_planner_reports_missing_credential() {
    let planner = StudyPlanner::unconfigured();
    assert!(!planner.is_configured());

    let err = planner
        .generate(vec![math_due_tomorrow()], now())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::MissingCredential));
    assert_eq!(err.to_string(), "STUDYPLAN_AI_API_KEY is not configured");
}

#[tokio::test]
async fn rate_limit_is_surfaced_without_retry() {
    let model = Arc::new(StubModel::status(429));
    let planner = StudyPlanner::new(model.clone());

    let err = planner
        .generate(vec![math_due_tomorrow()], now())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Gateway(GatewayError::RateLimited)));
    assert_eq!(model.calls().len(), 1, "no automatic retry");
}

#[tokio::test]
async fn timeout_is_terminal() {
    let model = Arc::new(StubModel::new(StubReply::Timeout));
    let planner = StudyPlanner::new(model.clone());

    let err = planner
        .generate(vec![math_due_tomorrow()], now())
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Gateway(GatewayError::Timeout)));
    assert_eq!(model.calls().len(), 1);
}
