use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use studyplan_core::gateway::GatewayError;
use studyplan_core::planner::{PlanError, StudyPlanner};
use studyplan_core::render::{RenderedBlock, render};
use studyplan_core::store::{AccessControl, Role, SubjectRepository};
use studyplan_core::subject::Subject;
use studyplan_core::token::{TokenConfig, bearer_token, validate_token};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub planner: StudyPlanner,
    pub subjects: Arc<dyn SubjectRepository>,
    pub access: Arc<dyn AccessControl>,
    pub tokens: TokenConfig,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Доступ запрещён")
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        let status = match &err {
            PlanError::Subject(_) => StatusCode::BAD_REQUEST,
            PlanError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            PlanError::Gateway(GatewayError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            PlanError::Gateway(GatewayError::QuotaExceeded) => StatusCode::PAYMENT_REQUIRED,
            PlanError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// A caller holding a valid token for a known user.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;

        let user_id = validate_token(&state.tokens, token).map_err(|e| {
            tracing::debug!(error = %e, "rejected token");
            AppError::unauthorized("invalid token")
        })?;

        let role = state
            .access
            .role_of(user_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::unauthorized("unknown user"))?;

        Ok(Self { user_id, role })
    }
}

/// A [`CurrentUser`] with the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            tracing::info!(user_id = %user.user_id, "admin route refused");
            return Err(AppError::forbidden());
        }
        Ok(Self(user))
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StudyPlanRequest {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanResponse {
    pub study_plan: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub user_id: Uuid,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/study-plan", post(generate_plan))
        .route("/api/study-plan/render", post(render_plan))
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route("/api/subjects/plan", post(plan_from_stored))
        .route("/api/subjects/{id}", delete(delete_subject))
        .route("/api/admin/users", get(admin_list_users))
        .route("/api/admin/users/{id}/toggle-admin", post(admin_toggle_role))
        .route("/api/admin/subjects", get(admin_list_subjects))
        .route("/api/admin/subjects/{id}", delete(admin_delete_subject))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("studyplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("studyplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers: plans
// ---------------------------------------------------------------------------

async fn generate_plan(
    State(state): State<AppState>,
    body: Result<Json<StudyPlanRequest>, JsonRejection>,
) -> Result<Json<StudyPlanResponse>, AppError> {
    let Json(request) = body?;
    let study_plan = state.planner.generate(request.subjects, Utc::now()).await?;
    Ok(Json(StudyPlanResponse { study_plan }))
}

async fn render_plan(
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderResponse>, AppError> {
    let Json(request) = body?;
    Ok(Json(RenderResponse {
        blocks: render(&request.text),
    }))
}

async fn plan_from_stored(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<StudyPlanResponse>, AppError> {
    let subjects = state
        .subjects
        .list_for_user(user.user_id)
        .await
        .map_err(AppError::internal)?
        .into_iter()
        .map(|stored| stored.subject)
        .collect();
    let study_plan = state.planner.generate(subjects, Utc::now()).await?;
    Ok(Json(StudyPlanResponse { study_plan }))
}

// ---------------------------------------------------------------------------
// Handlers: own subjects
// ---------------------------------------------------------------------------

async fn list_subjects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<axum::response::Response, AppError> {
    let subjects = state
        .subjects
        .list_for_user(user.user_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(subjects).into_response())
}

async fn create_subject(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<Subject>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(subject) = body?;
    let stored = state
        .subjects
        .insert(user.user_id, &subject)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(user_id = %user.user_id, subject_id = %stored.id, "subject added");
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

async fn delete_subject(
    State(state): State<AppState>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let removed = state
        .subjects
        .delete(user.user_id, id)
        .await
        .map_err(AppError::internal)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("subject {id} not found")))
    }
}

// ---------------------------------------------------------------------------
// Handlers: admin
// ---------------------------------------------------------------------------

async fn admin_list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<axum::response::Response, AppError> {
    let users = state.access.list_users().await.map_err(AppError::internal)?;
    Ok(Json(users).into_response())
}

async fn admin_toggle_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RoleResponse>, AppError> {
    let Path(id) = id?;
    if id == admin.user_id {
        return Err(AppError::bad_request("cannot change your own role"));
    }
    let current = state
        .access
        .role_of(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("user {id} not found")))?;

    let role = current.toggled();
    state
        .access
        .set_role(id, role)
        .await
        .map_err(AppError::internal)?;
    tracing::info!(admin = %admin.user_id, user_id = %id, %role, "role changed");
    Ok(Json(RoleResponse { user_id: id, role }))
}

async fn admin_list_subjects(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<axum::response::Response, AppError> {
    let subjects = state.subjects.list_all().await.map_err(AppError::internal)?;
    Ok(Json(subjects).into_response())
}

async fn admin_delete_subject(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    let removed = state
        .subjects
        .delete_any(id)
        .await
        .map_err(AppError::internal)?;
    if removed {
        tracing::info!(admin = %admin.user_id, subject_id = %id, "subject removed by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("subject {id} not found")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
