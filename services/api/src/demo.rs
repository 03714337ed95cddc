use crate::infra::{
    default_security_questions, InMemoryApplicationRepository, InMemoryContactDirectory,
};
use brokerage_onboarding::config::OnboardingConfig;
use brokerage_onboarding::error::AppError;
use brokerage_onboarding::workflows::account_opening::{
    AccountType, Application, EmploymentType, FieldChange, HolderChange, HolderRole,
    OnboardingService, OnboardingServiceError, SecurityQuestionUpdate, SessionId,
    SubmissionLinkage, W8_BEN_FORM_NUMBER,
};
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;

type DemoService = OnboardingService<InMemoryApplicationRepository, InMemoryContactDirectory>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lead identifier to link the individual application to.
    #[arg(long)]
    pub(crate) lead: Option<String>,
    /// Leave the first joint holder blank to show the validation report.
    #[arg(long)]
    pub(crate) incomplete_joint: bool,
    /// Skip the joint account portion of the demo.
    #[arg(long)]
    pub(crate) skip_joint: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        lead,
        incomplete_joint,
        skip_joint,
    } = args;

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let contacts = Arc::new(InMemoryContactDirectory::default());
    let service = DemoService::new(
        repository.clone(),
        contacts.clone(),
        default_security_questions(),
        OnboardingConfig::default(),
    );

    println!("Brokerage onboarding demo");
    println!("\nIndividual account");
    let session = service.open_session(None)?;
    let mut changes = holder_changes(HolderRole::Primary, "Jane", "Doe", "jane@example.com");
    changes.push(FieldChange::NetWorth("250000".to_string()));
    let outcome = service.apply_changes(&session.session_id, changes)?;
    println!(
        "- {} derived patches applied | documents regenerated: {}",
        outcome.report.patches_applied, outcome.report.documents_regenerated
    );
    render_documents(&outcome.session.application);

    answer_security_questions(&service, &session.session_id)?;
    let linkage = SubmissionLinkage {
        lead: lead.clone(),
        ..SubmissionLinkage::default()
    };
    let record = service.submit(&session.session_id, linkage)?;
    let view = record.status_view();
    println!(
        "- Submitted application {} -> status {} (customer {})",
        view.application_id.0,
        view.status,
        view.customer_external_id.as_str()
    );
    if let Some(lead) = lead.as_deref() {
        match repository.lead_application(lead) {
            Some(application_id) => println!("  Lead {lead} now points at {}", application_id.0),
            None => println!("  Lead {lead} was not linked"),
        }
    }

    if skip_joint {
        return Ok(());
    }

    println!("\nJoint account");
    let session = service.open_session(Some(AccountType::Joint))?;
    let mut changes = holder_changes(HolderRole::JointSecond, "John", "Roe", "john@example.com");
    if !incomplete_joint {
        changes.extend(holder_changes(
            HolderRole::JointFirst,
            "Jane",
            "Roe",
            "jane.roe@example.com",
        ));
    }
    let outcome = service.apply_changes(&session.session_id, changes)?;
    render_documents(&outcome.session.application);

    answer_security_questions(&service, &session.session_id)?;
    match service.submit(&session.session_id, SubmissionLinkage::default()) {
        Ok(record) => {
            let view = record.status_view();
            println!(
                "- Submitted application {} -> status {}",
                view.application_id.0, view.status
            );
        }
        Err(OnboardingServiceError::Validation(issues)) => {
            println!("- Submission rejected with {} issue(s):", issues.len());
            for issue in issues {
                println!("    - {}: {}", issue.path, issue.message);
            }
        }
        Err(err) => return Err(err.into()),
    }

    println!("\nCRM contacts");
    for contact in contacts.contacts() {
        println!("- {} <{}>", contact.id.0, contact.email);
    }

    Ok(())
}

fn holder_changes(role: HolderRole, first: &str, last: &str, email: &str) -> Vec<FieldChange> {
    vec![
        FieldChange::holder(role, HolderChange::FirstName(Some(first.to_string()))),
        FieldChange::holder(role, HolderChange::LastName(Some(last.to_string()))),
        FieldChange::holder(role, HolderChange::Email(Some(email.to_string()))),
        FieldChange::holder(
            role,
            HolderChange::DateOfBirth(NaiveDate::from_ymd_opt(1985, 6, 15)),
        ),
        FieldChange::holder(role, HolderChange::ResidenceCountry(Some("GBR".to_string()))),
        FieldChange::holder(
            role,
            HolderChange::EmploymentType(Some(EmploymentType::Employed)),
        ),
    ]
}

fn answer_security_questions(
    service: &DemoService,
    session_id: &SessionId,
) -> Result<(), OnboardingServiceError> {
    let answers = ["Rex", "Baker Street", "St. Mary's"];
    let question_ids: Vec<String> = service
        .security_questions()
        .iter()
        .map(|question| question.id.clone())
        .collect();
    for (slot, (question_id, answer)) in question_ids.into_iter().zip(answers).enumerate() {
        service.update_security_question(
            session_id,
            SecurityQuestionUpdate {
                slot,
                question_id: Some(Some(question_id)),
                answer: Some(answer.to_string()),
            },
        )?;
    }
    Ok(())
}

fn render_documents(application: &Application) {
    let w8: Vec<_> = application
        .documents
        .iter()
        .filter(|document| document.form_number == W8_BEN_FORM_NUMBER)
        .collect();
    println!("- {} W-8BEN document(s)", w8.len());
    for document in w8 {
        let signers = if document.signed_by.is_empty() {
            "no signers yet".to_string()
        } else {
            document.signed_by.join(", ")
        };
        let key = document.key.as_deref().unwrap_or("unkeyed");
        println!("    - {key}: {signers}");
    }
}
