//! CRM contacts derived from an application's holders.

use tracing::debug;

use super::domain::{present, AccountHolderDetails, Application};
use super::repository::{ContactDirectory, ContactId, NewContact, RepositoryError};

/// A holder that should exist as a CRM contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCandidate {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ContactCandidate {
    fn from_holder(holder: &AccountHolderDetails) -> Option<Self> {
        let email = present(&holder.email)?;
        Some(Self {
            email: email.to_string(),
            first_name: present(&holder.name.first).map(str::to_string),
            last_name: present(&holder.name.last).map(str::to_string),
        })
    }

    fn into_new_contact(self) -> NewContact {
        NewContact {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

/// Holders with an email, in signing order, one per address.
pub fn application_contacts(application: &Application) -> Vec<ContactCandidate> {
    let mut candidates: Vec<ContactCandidate> = Vec::new();
    for (_, holder) in application.holders() {
        let Some(candidate) = ContactCandidate::from_holder(holder) else {
            continue;
        };
        if candidates
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&candidate.email))
        {
            continue;
        }
        candidates.push(candidate);
    }
    candidates
}

/// Find or create a contact for every candidate; returns the first one's id.
///
/// Calls run one after another. Contacts created before a failing call are kept.
pub fn resolve_application_contact<C>(
    application: &Application,
    directory: &C,
) -> Result<Option<ContactId>, RepositoryError>
where
    C: ContactDirectory + ?Sized,
{
    let mut resolved = None;
    for candidate in application_contacts(application) {
        let contact = match directory.find_by_email(&candidate.email)? {
            Some(existing) => existing,
            None => {
                let created = directory.create(candidate.into_new_contact())?;
                debug!(contact_id = %created.id.0, "created contact for holder");
                created
            }
        };
        resolved.get_or_insert(contact.id);
    }
    Ok(resolved)
}
