use brokerage_onboarding::workflows::account_opening::{
    ApplicationId, ApplicationRecord, ApplicationRepository, Contact, ContactDirectory, ContactId,
    NewContact, RepositoryError, SecurityQuestion,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stands in for the backend's application-submission endpoint.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
    leads: Arc<Mutex<HashMap<String, ApplicationId>>>,
}

impl InMemoryApplicationRepository {
    pub(crate) fn lead_application(&self, lead: &str) -> Option<ApplicationId> {
        self.leads
            .lock()
            .expect("lead mutex poisoned")
            .get(lead)
            .cloned()
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        if !self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .contains_key(application_id)
        {
            return Err(RepositoryError::NotFound);
        }
        self.leads
            .lock()
            .expect("lead mutex poisoned")
            .insert(lead.to_string(), application_id.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryContactDirectory {
    contacts: Arc<Mutex<Vec<Contact>>>,
}

impl InMemoryContactDirectory {
    pub(crate) fn contacts(&self) -> Vec<Contact> {
        self.contacts.lock().expect("contact mutex poisoned").clone()
    }
}

impl ContactDirectory for InMemoryContactDirectory {
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
            id: ContactId(format!("contact-{:04}", guard.len() + 1)),
            email: contact.email,
            first_name: contact.first_name,
            last_name: contact.last_name,
        };
        guard.push(created.clone());
        Ok(created)
    }
}

pub(crate) fn default_security_questions() -> Vec<SecurityQuestion> {
    [
        ("pet", "What was the name of your first pet?"),
        ("street", "What street did you grow up on?"),
        ("school", "What was the name of your primary school?"),
        ("city", "In which city did your parents meet?"),
        ("car", "What was the make of your first car?"),
        ("book", "What is your favourite book?"),
    ]
    .into_iter()
    .map(|(id, text)| SecurityQuestion::new(id, text))
    .collect()
}
