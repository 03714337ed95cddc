use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AccountType, Application, ApplicationId, ExternalId};

/// Advisor, master account, and lead identifiers carried on the submit URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionLinkage {
    #[serde(rename = "ad", default, skip_serializing_if = "Option::is_none")]
    pub advisor: Option<String>,
    #[serde(rename = "ma", default, skip_serializing_if = "Option::is_none")]
    pub master_account: Option<String>,
    #[serde(rename = "ld", default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
}

/// Submitted application as accepted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: ApplicationId,
    pub contact_id: Option<ContactId>,
    pub linkage: SubmissionLinkage,
    pub submitted_at: DateTime<Utc>,
    pub application: Application,
}

impl ApplicationRecord {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id.clone(),
            status: "submitted",
            account_type: self.application.account_type(),
            customer_external_id: self.application.customer.external_id.clone(),
            contact_id: self.contact_id.clone(),
            lead: self.linkage.lead.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Sanitized representation of a submitted application; holder details stay private.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub account_type: AccountType,
    pub customer_external_id: ExternalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Application-submission endpoint of the brokerage backend.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Point a sales lead at the application it produced.
    fn update_lead(
        &self,
        lead: &str,
        application_id: &ApplicationId,
    ) -> Result<(), RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// CRM contact lookup used before submission.
pub trait ContactDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Contact>, RepositoryError>;
    fn create(&self, contact: NewContact) -> Result<Contact, RepositoryError>;
}

/// Error enumeration for backend failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
