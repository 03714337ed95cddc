//! Schema checks run before submission.

use serde::Serialize;

use super::domain::{present, AccountType, Application, W8_BEN_FORM_NUMBER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Every problem with `application`, in tree order. Empty means submittable.
pub fn validate_application(application: &Application) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match present(&application.customer.email) {
        None => issues.push(ValidationIssue::new("customer.email", "email is required")),
        Some(email) if !looks_like_email(email) => issues.push(ValidationIssue::new(
            "customer.email",
            format!("'{email}' is not a valid email address"),
        )),
        Some(_) => {}
    }

    for (role, holder) in application.holders() {
        if present(&holder.name.first).is_none() {
            issues.push(ValidationIssue::new(
                format!("{role}.name.first"),
                "first name is required",
            ));
        }
        if present(&holder.name.last).is_none() {
            issues.push(ValidationIssue::new(
                format!("{role}.name.last"),
                "last name is required",
            ));
        }
        if holder.date_of_birth.is_none() {
            issues.push(ValidationIssue::new(
                format!("{role}.dateOfBirth"),
                "date of birth is required",
            ));
        }
        if present(&holder.residence_address.country).is_none() {
            issues.push(ValidationIssue::new(
                format!("{role}.residenceAddress.country"),
                "residence country is required",
            ));
        }
        if !holder
            .tax_residencies
            .iter()
            .any(|residency| present(&residency.country).is_some())
        {
            issues.push(ValidationIssue::new(
                format!("{role}.taxResidencies"),
                "at least one tax residency is required",
            ));
        }
    }

    let account_type = application.account_type();
    if application.users.len() != account_type.signer_count() {
        issues.push(ValidationIssue::new(
            "users",
            format!(
                "{} application needs {} user(s), found {}",
                account_type.label(),
                account_type.signer_count(),
                application.users.len()
            ),
        ));
    }

    if let Some(organization) = application.customer.branch.organization() {
        if present(&organization.identification.name).is_none() {
            issues.push(ValidationIssue::new(
                "customer.organization.identifications.0.name",
                "legal name is required",
            ));
        }
    }

    if account_type == AccountType::Individual
        && !application
            .documents
            .iter()
            .any(|document| document.form_number == W8_BEN_FORM_NUMBER)
    {
        issues.push(ValidationIssue::new(
            "documents",
            "W-8BEN is missing; complete the holder's name",
        ));
    }

    let total: u64 = application
        .financial_information()
        .sources_of_wealth
        .iter()
        .filter_map(|source| source.percentage)
        .map(u64::from)
        .sum();
    if total > 100 {
        issues.push(ValidationIssue::new(
            format!(
                "{}.financialInformation.0.sourcesOfWealth",
                application.customer.branch.path()
            ),
            format!("percentages add up to {total}, more than 100"),
        ));
    }

    issues
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
