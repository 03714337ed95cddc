//! Reducer over the application form: raw write, ordered derivation rules, then
//! document regeneration, all inside one synchronous step.

pub(crate) mod numeric;
mod patch;
mod rules;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use patch::Patch;

use super::change::{self, FieldChange};
use super::documents::regenerate_w8_documents;
use super::domain::{AccountType, Application, ExternalId};
use super::lens::HolderRole;
use super::skeleton::ApplicationSkeleton;

/// Errors raised while applying a field change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("holder role {role:?} does not exist on a {} application", .account_type.label())]
    RoleUnavailable {
        role: HolderRole,
        account_type: AccountType,
    },
    #[error("field {path} does not exist on a {} application", .account_type.label())]
    FieldUnavailable {
        path: String,
        account_type: AccountType,
    },
    #[error("{field} must be a whole number (found '{value}')")]
    InvalidNumber { field: &'static str, value: String },
    #[error("select an identification type before entering its number")]
    IdentificationTypeMissing,
    #[error("index {index} is beyond the end of {path}")]
    IndexOutOfRange { path: &'static str, index: usize },
    #[error("application has no trading account")]
    MissingAccount,
}

/// What a single change did to the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub patches_applied: usize,
    pub documents_regenerated: bool,
}

/// Owns the form tree and applies every mutation through the derivation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEngine {
    application: Application,
    skeleton: ApplicationSkeleton,
    revision: u64,
}

impl FormEngine {
    pub fn new(account_type: AccountType, skeleton: ApplicationSkeleton) -> Self {
        let mut application = skeleton.build(account_type, ExternalId::generate());
        application.documents = regenerate_w8_documents(&application);
        Self {
            application,
            skeleton,
            revision: 0,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn into_application(self) -> Application {
        self.application
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole tree with the skeleton for `account_type`.
    ///
    /// Only the customer's root external id survives the reset.
    pub fn select_account_type(&mut self, account_type: AccountType) {
        let root = self.application.customer.external_id.clone();
        let mut application = self.skeleton.build(account_type, root);
        application.documents = regenerate_w8_documents(&application);
        debug!(
            from = self.application.account_type().label(),
            to = account_type.label(),
            "account type reset"
        );
        self.application = application;
        self.revision += 1;
    }

    /// Store labeled security answers on the primary user.
    pub fn set_security_questions(&mut self, questions: BTreeMap<String, String>) {
        if let Some(user) = self.application.primary_user_mut() {
            user.security_questions = questions;
            self.revision += 1;
        }
    }

    /// Apply one change and regenerate documents if it touched a signer.
    pub fn apply(&mut self, change: FieldChange) -> Result<ChangeReport, FormError> {
        self.apply_batch(std::iter::once(change))
    }

    /// Apply changes in order; documents are regenerated once at the end.
    ///
    /// A failing change aborts the batch, leaving earlier changes applied.
    pub fn apply_batch<I>(&mut self, changes: I) -> Result<ChangeReport, FormError>
    where
        I: IntoIterator<Item = FieldChange>,
    {
        let mut report = ChangeReport::default();
        let mut stale = false;

        let outcome: Result<(), FormError> = changes.into_iter().try_for_each(|change| {
            let (applied, marked_stale) = self.apply_one(&change)?;
            report.patches_applied += applied;
            stale |= marked_stale;
            Ok(())
        });

        if stale {
            self.application.documents = regenerate_w8_documents(&self.application);
            report.documents_regenerated = true;
        }

        outcome.map(|()| report)
    }

    fn apply_one(&mut self, change: &FieldChange) -> Result<(usize, bool), FormError> {
        let prior = self.application.clone();
        change::write(&mut self.application, change)?;

        let patches: Vec<Patch> = rules::RULES
            .iter()
            .flat_map(|(name, rule)| {
                let patches = rule(&prior, change, &self.application);
                if !patches.is_empty() {
                    trace!(rule = *name, patches = patches.len(), "derivation rule fired");
                }
                patches
            })
            .collect();

        let applied = patches.len();
        let mut stale = false;
        for patch in patches {
            stale |= patch.apply(&mut self.application);
        }
        self.revision += 1;

        debug!(path = %change.path(), patches = applied, "field change applied");
        Ok((applied, stale))
    }
}
