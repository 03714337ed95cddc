//! End-to-end scenarios for the account-opening wizard, driven through the public
//! service facade and HTTP router only.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use brokerage_onboarding::config::OnboardingConfig;
    use brokerage_onboarding::workflows::account_opening::{
        ApplicationId, ApplicationRecord, ApplicationRepository, Contact, ContactDirectory,
        ContactId, NewContact, OnboardingService, RepositoryError, SecurityQuestion,
    };

    #[derive(Default)]
    pub struct MemoryRepository {
        records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
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
            _lead: &str,
            _application_id: &ApplicationId,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryContacts {
        contacts: Mutex<Vec<Contact>>,
    }

    impl MemoryContacts {
        pub fn count(&self) -> usize {
            self.contacts.lock().expect("contact mutex poisoned").len()
        }
    }

    impl ContactDirectory for MemoryContacts {
        fn find_by_email(&self, email: &str) -> Result<Option<Contact>, RepositoryError> {
            let guard = self.contacts.lock().expect("contact mutex poisoned");
            Ok(guard.iter().find(|contact| contact.email == email).cloned())
        }

        fn create(&self, contact: NewContact) -> Result<Contact, RepositoryError> {
            let mut guard = self.contacts.lock().expect("contact mutex poisoned");
            let created = Contact {
                id: ContactId(format!("crm-{}", guard.len() + 1)),
                email: contact.email,
                first_name: contact.first_name,
                last_name: contact.last_name,
            };
            guard.push(created.clone());
            Ok(created)
        }
    }

    pub fn service() -> (
        Arc<OnboardingService<MemoryRepository, MemoryContacts>>,
        Arc<MemoryContacts>,
    ) {
        let contacts = Arc::new(MemoryContacts::default());
        let service = OnboardingService::new(
            Arc::new(MemoryRepository::default()),
            contacts.clone(),
            vec![SecurityQuestion::new(
                "q-pet",
                "What was the name of your first pet?",
            )],
            OnboardingConfig::default(),
        );
        (Arc::new(service), contacts)
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use brokerage_onboarding::workflows::account_opening::{
    application_router, AccountType, EmploymentType, FieldChange, HolderChange, HolderRole,
    OnboardingServiceError, SubmissionLinkage, W8_BEN_FORM_NUMBER,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

fn person(role: HolderRole, first: &str, last: &str, email: &str) -> Vec<FieldChange> {
    vec![
        FieldChange::holder(role, HolderChange::FirstName(Some(first.to_string()))),
        FieldChange::holder(role, HolderChange::LastName(Some(last.to_string()))),
        FieldChange::holder(role, HolderChange::Email(Some(email.to_string()))),
        FieldChange::holder(
            role,
            HolderChange::DateOfBirth(NaiveDate::from_ymd_opt(1990, 2, 1)),
        ),
        FieldChange::holder(role, HolderChange::ResidenceCountry(Some("NLD".to_string()))),
        FieldChange::holder(
            role,
            HolderChange::EmploymentType(Some(EmploymentType::Employed)),
        ),
    ]
}

#[test]
fn individual_application_is_submitted_with_one_signed_w8() {
    let (service, contacts) = common::service();
    let session = service.open_session(None).expect("open");

    service
        .apply_changes(
            &session.session_id,
            person(HolderRole::Primary, "Jane", "Doe", "jane@x.com"),
        )
        .expect("changes");
    let record = service
        .submit(&session.session_id, SubmissionLinkage::default())
        .expect("submit");

    let application = &record.application;
    assert_eq!(application.customer.email.as_deref(), Some("jane@x.com"));
    let w8: Vec<_> = application
        .documents
        .iter()
        .filter(|document| document.form_number == W8_BEN_FORM_NUMBER)
        .collect();
    assert_eq!(w8.len(), 1);
    assert_eq!(w8[0].signed_by, vec!["Jane Doe".to_string()]);
    assert_eq!(
        application.financial_information().sources_of_wealth[0]
            .source_type
            .as_deref(),
        Some("SOW-IND-Income")
    );
    assert_eq!(contacts.count(), 1);
}

#[test]
fn joint_with_only_the_second_holder_named_has_one_signer() {
    let (service, _) = common::service();
    let session = service
        .open_session(Some(AccountType::Joint))
        .expect("open");

    let outcome = service
        .apply_changes(
            &session.session_id,
            vec![
                FieldChange::holder(
                    HolderRole::JointSecond,
                    HolderChange::FirstName(Some("John".to_string())),
                ),
                FieldChange::holder(
                    HolderRole::JointSecond,
                    HolderChange::LastName(Some("Roe".to_string())),
                ),
            ],
        )
        .expect("names");

    let w8: Vec<_> = outcome
        .session
        .application
        .documents
        .iter()
        .filter(|document| document.form_number == W8_BEN_FORM_NUMBER)
        .collect();
    assert_eq!(w8.len(), 1);
    assert_eq!(w8[0].signed_by.len(), 1);

    match service.submit(&session.session_id, SubmissionLinkage::default()) {
        Err(OnboardingServiceError::Validation(issues)) => {
            assert!(issues
                .iter()
                .any(|issue| issue.path == "customer.jointHolders.firstHolderDetails.0.name.first"));
        }
        other => panic!("expected validation issues, got {other:?}"),
    }
}

#[test]
fn switching_account_type_discards_entered_holders() {
    let (service, _) = common::service();
    let session = service.open_session(None).expect("open");
    service
        .apply_changes(
            &session.session_id,
            person(HolderRole::Primary, "Jane", "Doe", "jane@x.com"),
        )
        .expect("changes");

    let snapshot = service
        .select_account_type(&session.session_id, AccountType::Org)
        .expect("org");

    let json = serde_json::to_value(&snapshot.application).expect("serialize");
    assert_eq!(json["customer"]["type"], "ORG");
    assert!(json["customer"].get("accountHolder").is_none());
    assert_eq!(json["customer"]["email"], Value::Null);
    assert_eq!(
        snapshot.application.customer.external_id,
        session.application.customer.external_id
    );
}

#[tokio::test]
async fn http_submission_exposes_a_status_view() {
    let (service, _) = common::service();
    let router = application_router(service.clone());
    let session = service.open_session(None).expect("open");
    let session_id = session.session_id.0;

    let changes = serde_json::to_vec(&person(HolderRole::Primary, "Ada", "Byron", "ada@x.com"))
        .expect("encode");
    let response = router
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/onboarding/sessions/{session_id}/changes"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(changes))
                .expect("request"),
        )
        .await
        .expect("changes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::post(format!(
                "/api/v1/onboarding/sessions/{session_id}/submit?ld=lead-1"
            ))
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let view: Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(view["status"], json!("submitted"));
    assert!(view.get("contact_id").is_some());
}
