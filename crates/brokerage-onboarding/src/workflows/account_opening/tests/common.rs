use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::OnboardingConfig;
use crate::workflows::account_opening::change::{FieldChange, HolderChange};
use crate::workflows::account_opening::domain::{AccountType, ApplicationId, EmploymentType};
use crate::workflows::account_opening::lens::HolderRole;
use crate::workflows::account_opening::repository::{
    ApplicationRecord, ApplicationRepository, Contact, ContactDirectory, ContactId, NewContact,
    RepositoryError,
};
use crate::workflows::account_opening::security_questions::SecurityQuestion;
use crate::workflows::account_opening::skeleton::ApplicationSkeleton;
use crate::workflows::account_opening::{application_router, FormEngine, OnboardingService};

pub(super) fn onboarding_config() -> OnboardingConfig {
    OnboardingConfig {
        base_currency: "USD".to_string(),
        session_limit: 16,
    }
}

pub(super) fn engine(account_type: AccountType) -> FormEngine {
    FormEngine::new(account_type, ApplicationSkeleton::new("USD"))
}

pub(super) fn catalog() -> Vec<SecurityQuestion> {
    vec![
        SecurityQuestion::new("q-pet", "What was the name of your first pet?"),
        SecurityQuestion::new("q-street", "What street did you grow up on?"),
        SecurityQuestion::new("q-teacher", "Who was your favourite teacher?"),
        SecurityQuestion::new("q-city", "In which city were you born?"),
    ]
}

pub(super) fn holder(role: HolderRole, change: HolderChange) -> FieldChange {
    FieldChange::holder(role, change)
}

pub(super) fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub(super) fn name_changes(role: HolderRole, first: &str, last: &str) -> Vec<FieldChange> {
    vec![
        holder(role, HolderChange::FirstName(text(first))),
        holder(role, HolderChange::LastName(text(last))),
    ]
}

/// Everything a holder needs to pass validation, apart from the customer email.
pub(super) fn complete_holder_changes(
    role: HolderRole,
    first: &str,
    last: &str,
    email: &str,
) -> Vec<FieldChange> {
    let mut changes = name_changes(role, first, last);
    changes.extend([
        holder(role, HolderChange::Email(text(email))),
        holder(
            role,
            HolderChange::DateOfBirth(NaiveDate::from_ymd_opt(1988, 4, 12)),
        ),
        holder(role, HolderChange::ResidenceCountry(text("DEU"))),
        holder(
            role,
            HolderChange::EmploymentType(Some(EmploymentType::Employed)),
        ),
    ]);
    changes
}

pub(super) fn complete_individual_changes() -> Vec<FieldChange> {
    complete_holder_changes(HolderRole::Primary, "Jane", "Doe", "jane@x.com")
}

pub(super) fn complete_joint_changes() -> Vec<FieldChange> {
    let mut changes =
        complete_holder_changes(HolderRole::JointFirst, "Jane", "Doe", "jane@x.com");
    changes.extend(complete_holder_changes(
        HolderRole::JointSecond,
        "John",
        "Roe",
        "john@x.com",
    ));
    changes
}

pub(super) fn build_service() -> (
    OnboardingService<MemoryRepository, MemoryContacts>,
    Arc<MemoryRepository>,
    Arc<MemoryContacts>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let contacts = Arc::new(MemoryContacts::default());
    let service = OnboardingService::new(
        repository.clone(),
        contacts.clone(),
        catalog(),
        onboarding_config(),
    );
    (service, repository, contacts)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    pub(super) leads: Arc<Mutex<Vec<(String, ApplicationId)>>>,
}

impl MemoryRepository {
    pub(super) fn leads(&self) -> Vec<(String, ApplicationId)> {
        self.leads.lock().expect("lead mutex poisoned").clone()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_lead(
        &self,
        lead: &str,
        application_id: &ApplicationId,
    ) -> Result<(), RepositoryError> {
        self.leads
            .lock()
            .expect("lead mutex poisoned")
            .push((lead.to_string(), application_id.clone()));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryContacts {
    pub(super) contacts: Arc<Mutex<Vec<Contact>>>,
}

impl MemoryContacts {
    pub(super) fn with_existing(email: &str, id: &str) -> Self {
        let directory = Self::default();
        directory
            .contacts
            .lock()
            .expect("contact mutex poisoned")
            .push(Contact {
                id: ContactId(id.to_string()),
                email: email.to_string(),
                first_name: None,
                last_name: None,
            });
        directory
    }

    pub(super) fn all(&self) -> Vec<Contact> {
        self.contacts.lock().expect("contact mutex poisoned").clone()
    }
}

impl ContactDirectory for MemoryContacts {
    fn find_by_email(&self, email: &str) -> Result<Option<Contact>, RepositoryError> {
        let guard = self.contacts.lock().expect("contact mutex poisoned");
        Ok(guard
            .iter()
            .find(|contact| contact.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn create(&self, contact: NewContact) -> Result<Contact, RepositoryError> {
        let mut guard = self.contacts.lock().expect("contact mutex poisoned");
        let created = Contact {
            id: ContactId(format!("contact-{}", guard.len() + 1)),
            email: contact.email,
            first_name: contact.first_name,
            last_name: contact.last_name,
        };
        guard.push(created.clone());
        Ok(created)
    }
}

pub(super) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn update_lead(
        &self,
        _lead: &str,
        _application_id: &ApplicationId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

/// Accepts applications but cannot link leads.
#[derive(Default)]
pub(super) struct LeadlessRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for LeadlessRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_lead(
        &self,
        _lead: &str,
        _application_id: &ApplicationId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("crm offline".to_string()))
    }
}

/// Holds every `insert` until the test releases it.
pub(super) struct GatedRepository {
    pub(super) inner: MemoryRepository,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedRepository {
    /// Returns the repository, a receiver signalled when `insert` starts, and
    /// the sender that lets it finish.
    pub(super) fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let repository = Self {
            inner: MemoryRepository::default(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (repository, entered_rx, release_tx)
    }
}

impl ApplicationRepository for GatedRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.entered
            .lock()
            .expect("gate mutex poisoned")
            .send(())
            .expect("test waits for insert");
        self.release
            .lock()
            .expect("gate mutex poisoned")
            .recv()
            .expect("test releases insert");
        self.inner.insert(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_lead(
        &self,
        lead: &str,
        application_id: &ApplicationId,
    ) -> Result<(), RepositoryError> {
        self.inner.update_lead(lead, application_id)
    }
}

pub(super) struct UnavailableContacts;

impl ContactDirectory for UnavailableContacts {
    fn find_by_email(&self, _email: &str) -> Result<Option<Contact>, RepositoryError> {
        Err(RepositoryError::Unavailable("crm offline".to_string()))
    }

    fn create(&self, _contact: NewContact) -> Result<Contact, RepositoryError> {
        Err(RepositoryError::Unavailable("crm offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn application_router_with_service(
    service: OnboardingService<MemoryRepository, MemoryContacts>,
) -> axum::Router {
    application_router(Arc::new(service))
}
