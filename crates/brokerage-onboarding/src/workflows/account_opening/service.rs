use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::OnboardingConfig;

use super::change::FieldChange;
use super::contacts::resolve_application_contact;
use super::derivation::{ChangeReport, FormEngine, FormError};
use super::domain::{present, AccountType, Application, ApplicationId};
use super::repository::{
    ApplicationRecord, ApplicationRepository, ContactDirectory, RepositoryError, SubmissionLinkage,
};
use super::security_questions::{SecurityQuestion, SecurityQuestionSelection, SelectionError};
use super::skeleton::ApplicationSkeleton;
use super::validation::{validate_application, ValidationIssue};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Current state of a wizard session as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub account_type: AccountType,
    pub revision: u64,
    pub application: Application,
    pub security_questions: SecurityQuestionSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_application: Option<ApplicationId>,
}

/// Result of a batch of field changes.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeOutcome {
    pub report: ChangeReport,
    pub session: SessionSnapshot,
}

/// Edit to one security-question slot; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecurityQuestionUpdate {
    pub slot: usize,
    /// `null` clears the slot's question; omitting the field keeps it.
    #[serde(default, deserialize_with = "present_field")]
    pub question_id: Option<Option<String>>,
    #[serde(default)]
    pub answer: Option<String>,
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

struct FormSession {
    id: SessionId,
    engine: FormEngine,
    security_questions: SecurityQuestionSelection,
    submitting: bool,
    submitted: Option<ApplicationId>,
}

impl FormSession {
    fn snapshot(&self) -> SessionSnapshot {
        let application = self.engine.application().clone();
        SessionSnapshot {
            session_id: self.id.clone(),
            account_type: application.account_type(),
            revision: self.engine.revision(),
            application,
            security_questions: self.security_questions.clone(),
            submitted_application: self.submitted.clone(),
        }
    }
}

/// Service owning the open wizard sessions and the submission pipeline.
pub struct OnboardingService<R, C> {
    repository: Arc<R>,
    contacts: Arc<C>,
    catalog: Arc<Vec<SecurityQuestion>>,
    config: OnboardingConfig,
    skeleton: ApplicationSkeleton,
    sessions: Mutex<HashMap<SessionId, FormSession>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, C> OnboardingService<R, C>
where
    R: ApplicationRepository + 'static,
    C: ContactDirectory + 'static,
{
    pub fn new(
        repository: Arc<R>,
        contacts: Arc<C>,
        catalog: Vec<SecurityQuestion>,
        config: OnboardingConfig,
    ) -> Self {
        let skeleton = ApplicationSkeleton::from_config(&config);
        Self {
            repository,
            contacts,
            catalog: Arc::new(catalog),
            config,
            skeleton,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    pub fn security_questions(&self) -> &[SecurityQuestion] {
        &self.catalog
    }

    /// Start a wizard on the skeleton of `account_type` (INDIVIDUAL by default).
    ///
    /// Finalized sessions are evicted once the store is full; their records stay
    /// available through [`OnboardingService::get`].
    pub fn open_session(
        &self,
        account_type: Option<AccountType>,
    ) -> Result<SessionSnapshot, OnboardingServiceError> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if sessions.len() >= self.config.session_limit {
            let before = sessions.len();
            sessions.retain(|_, session| session.submitted.is_none());
            debug!(
                evicted = before - sessions.len(),
                "finalized onboarding sessions evicted"
            );
        }
        if sessions.len() >= self.config.session_limit {
            return Err(OnboardingServiceError::SessionLimitReached {
                limit: self.config.session_limit,
            });
        }

        let account_type = account_type.unwrap_or(AccountType::Individual);
        let session = FormSession {
            id: next_session_id(),
            engine: FormEngine::new(account_type, self.skeleton.clone()),
            security_questions: SecurityQuestionSelection::default(),
            submitting: false,
            submitted: None,
        };
        let snapshot = session.snapshot();
        info!(
            session_id = %snapshot.session_id.0,
            account_type = account_type.label(),
            "onboarding session opened"
        );
        sessions.insert(session.id.clone(), session);
        Ok(snapshot)
    }

    pub fn session(&self, id: &SessionId) -> Result<SessionSnapshot, OnboardingServiceError> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(id)
            .map(FormSession::snapshot)
            .ok_or_else(|| OnboardingServiceError::SessionNotFound(id.0.clone()))
    }

    /// Reset the form to the skeleton of `account_type`.
    pub fn select_account_type(
        &self,
        id: &SessionId,
        account_type: AccountType,
    ) -> Result<SessionSnapshot, OnboardingServiceError> {
        let catalog = Arc::clone(&self.catalog);
        self.with_open_session(id, |session| {
            session.engine.select_account_type(account_type);
            // users were rebuilt by the reset
            let labeled = session.security_questions.labeled(&catalog);
            session.engine.set_security_questions(labeled);
            Ok(session.snapshot())
        })
    }

    /// Apply `changes` in order. On error, changes before the failing one stay applied.
    pub fn apply_changes(
        &self,
        id: &SessionId,
        changes: Vec<FieldChange>,
    ) -> Result<ChangeOutcome, OnboardingServiceError> {
        self.with_open_session(id, |session| {
            let report = session.engine.apply_batch(changes)?;
            Ok(ChangeOutcome {
                report,
                session: session.snapshot(),
            })
        })
    }

    pub fn update_security_question(
        &self,
        id: &SessionId,
        update: SecurityQuestionUpdate,
    ) -> Result<SessionSnapshot, OnboardingServiceError> {
        let catalog = Arc::clone(&self.catalog);
        self.with_open_session(id, |session| {
            if let Some(question_id) = update.question_id {
                session.security_questions.select(update.slot, question_id)?;
            }
            if let Some(answer) = update.answer {
                session.security_questions.answer(update.slot, answer)?;
            }
            let labeled = session.security_questions.labeled(&catalog);
            session.engine.set_security_questions(labeled);
            Ok(session.snapshot())
        })
    }

    /// Validate, resolve the CRM contact, and hand the application to the backend.
    ///
    /// The session is locked against edits and further submits while the calls
    /// run. It is finalized only once every call succeeded; on failure it is
    /// unlocked for another attempt.
    pub fn submit(
        &self,
        id: &SessionId,
        linkage: SubmissionLinkage,
    ) -> Result<ApplicationRecord, OnboardingServiceError> {
        let application = self.with_open_session(id, |session| {
            session.submitting = true;
            Ok(session.engine.application().clone())
        })?;

        let outcome = self.submit_application(application, linkage);
        {
            let mut sessions = self.sessions.lock().expect("session mutex poisoned");
            if let Some(session) = sessions.get_mut(id) {
                session.submitting = false;
                if let Ok(record) = &outcome {
                    session.submitted = Some(record.application_id.clone());
                }
            }
        }

        match outcome {
            Ok(record) => {
                info!(
                    session_id = %id.0,
                    application_id = %record.application_id.0,
                    account_type = record.application.account_type().label(),
                    "application submitted"
                );
                Ok(record)
            }
            Err(error) => {
                warn!(session_id = %id.0, error = %error, "application submission failed");
                Err(error)
            }
        }
    }

    fn submit_application(
        &self,
        application: Application,
        linkage: SubmissionLinkage,
    ) -> Result<ApplicationRecord, OnboardingServiceError> {
        let issues = validate_application(&application);
        if !issues.is_empty() {
            return Err(OnboardingServiceError::Validation(issues));
        }

        let contact_id = resolve_application_contact(&application, self.contacts.as_ref())?;
        let record = ApplicationRecord {
            application_id: next_application_id(),
            contact_id,
            linkage,
            submitted_at: Utc::now(),
            application,
        };
        let stored = self.repository.insert(record)?;

        if let Some(lead) = present(&stored.linkage.lead) {
            self.repository.update_lead(lead, &stored.application_id)?;
        }
        Ok(stored)
    }

    /// Fetch a submitted application for API responses.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, OnboardingServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn with_open_session<T>(
        &self,
        id: &SessionId,
        action: impl FnOnce(&mut FormSession) -> Result<T, OnboardingServiceError>,
    ) -> Result<T, OnboardingServiceError> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| OnboardingServiceError::SessionNotFound(id.0.clone()))?;
        if let Some(application_id) = &session.submitted {
            return Err(OnboardingServiceError::Finalized {
                session_id: id.0.clone(),
                application_id: application_id.clone(),
            });
        }
        if session.submitting {
            return Err(OnboardingServiceError::SubmissionInProgress(id.0.clone()));
        }
        action(session)
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("onboarding session {0} not found")]
    SessionNotFound(String),
    #[error("no more than {limit} onboarding sessions may be open")]
    SessionLimitReached { limit: usize },
    #[error("session {session_id} was already submitted as {}", .application_id.0)]
    Finalized {
        session_id: String,
        application_id: ApplicationId,
    },
    #[error("session {0} is being submitted")]
    SubmissionInProgress(String),
    #[error("application has {} validation issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl OnboardingServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OnboardingServiceError::Form(_) | OnboardingServiceError::Selection(_) => {
                StatusCode::BAD_REQUEST
            }
            OnboardingServiceError::SessionNotFound(_)
            | OnboardingServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            OnboardingServiceError::SessionLimitReached { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OnboardingServiceError::Finalized { .. }
            | OnboardingServiceError::SubmissionInProgress(_)
            | OnboardingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            OnboardingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OnboardingServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
