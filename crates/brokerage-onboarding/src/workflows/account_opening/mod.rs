//! Brokerage account-application wizard: the form tree, its derivation rules,
//! W-8 generation, security questions, contact resolution, and submission.
//!
//! All edits to the tree go through [`FormEngine`], which applies the raw write
//! and every dependent field update in one synchronous step, so a caller never
//! observes a half-derived form.

pub mod change;
pub mod contacts;
mod derivation;
pub mod documents;
pub mod domain;
pub mod lens;
pub mod repository;
pub mod router;
pub mod security_questions;
pub mod service;
pub mod skeleton;
pub mod validation;

#[cfg(test)]
mod tests;

pub use change::{FieldChange, HolderChange};
pub use contacts::{application_contacts, resolve_application_contact, ContactCandidate};
pub use derivation::{ChangeReport, FormEngine, FormError};
pub use documents::regenerate_w8_documents;
pub use domain::{
    AccountHolderDetails, AccountType, Application, ApplicationId, Document, EmploymentType,
    ExternalId, IdentificationType, W8_BEN_FORM_NUMBER,
};
pub use lens::HolderRole;
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, Contact, ContactDirectory,
    ContactId, NewContact, RepositoryError, SubmissionLinkage,
};
pub use router::application_router;
pub use security_questions::{SecurityQuestion, SecurityQuestionSelection, SelectionError};
pub use service::{
    ChangeOutcome, OnboardingService, OnboardingServiceError, SecurityQuestionUpdate, SessionId,
    SessionSnapshot,
};
pub use skeleton::ApplicationSkeleton;
pub use validation::{validate_application, ValidationIssue};
