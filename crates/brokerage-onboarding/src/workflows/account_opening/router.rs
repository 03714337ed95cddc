use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

use super::change::FieldChange;
use super::domain::{AccountType, ApplicationId};
use super::repository::{ApplicationRepository, ContactDirectory, SubmissionLinkage};
use super::service::{
    OnboardingService, OnboardingServiceError, SecurityQuestionUpdate, SessionId,
};

/// Body of the open-session and account-type endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountTypeRequest {
    #[serde(rename = "type", default)]
    pub account_type: Option<AccountType>,
}

/// Router builder exposing the onboarding wizard endpoints.
pub fn application_router<R, C>(service: Arc<OnboardingService<R, C>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/onboarding/sessions",
            post(open_session_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id",
            get(session_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/account-type",
            put(account_type_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/changes",
            post(changes_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/security-questions",
            get(security_catalog_handler::<R, C>).put(security_question_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/submit",
            post(submit_handler::<R, C>),
        )
        .route(
            "/api/v1/onboarding/applications/:application_id",
            get(status_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn open_session_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    body: Option<axum::Json<AccountTypeRequest>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    let request = body.map(|axum::Json(request)| request).unwrap_or_default();
    match service.open_session(request.account_type) {
        Ok(snapshot) => (StatusCode::CREATED, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn account_type_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AccountTypeRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    let Some(account_type) = request.account_type else {
        let payload = json!({
            "error": "account type is required",
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.select_account_type(&SessionId(session_id), account_type) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn changes_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
    axum::Json(changes): axum::Json<Vec<FieldChange>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.apply_changes(&SessionId(session_id), changes) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn security_catalog_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(snapshot) => {
            let payload = json!({
                "catalog": service.security_questions(),
                "selection": snapshot.security_questions,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn security_question_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
    axum::Json(update): axum::Json<SecurityQuestionUpdate>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.update_security_question(&SessionId(session_id), update) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(session_id): Path<String>,
    Query(linkage): Query<SubmissionLinkage>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.submit(&SessionId(session_id), linkage) {
        Ok(record) => {
            let view = record.status_view();
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, C>(
    State(service): State<Arc<OnboardingService<R, C>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: OnboardingServiceError) -> Response {
    AppError::from(error).into_response()
}
