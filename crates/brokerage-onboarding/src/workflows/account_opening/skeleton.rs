//! Empty, type-specific application trees used when the wizard starts or the
//! account type changes.

use std::collections::BTreeMap;

use crate::config::OnboardingConfig;

use super::domain::{
    Account, AccountHolderDetails, AccountSupport, AccountType, Application, AssociatedEntities,
    Customer, CustomerBranch, ExternalId, FinancialInformation, IndividualBranch, JointBranch,
    MarginMode, OrganizationBranch, OrganizationIdentification, User,
};

const JOINT_OWNERSHIP: &str = "joint_tenants";

/// Builds the default tree for each account type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSkeleton {
    base_currency: String,
}

impl ApplicationSkeleton {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
        }
    }

    pub fn from_config(config: &OnboardingConfig) -> Self {
        Self::new(config.base_currency.clone())
    }

    /// `root` becomes the customer's and the account's external id.
    pub fn build(&self, account_type: AccountType, root: ExternalId) -> Application {
        match account_type {
            AccountType::Individual => self.individual_application(root),
            AccountType::Joint => self.joint_application(root),
            AccountType::Org => self.organization_application(root),
        }
    }

    fn individual_application(&self, root: ExternalId) -> Application {
        let holder = AccountHolderDetails::new(root.clone());
        let users = vec![user_for(&holder)];
        let branch = CustomerBranch::Individual {
            account_holder: IndividualBranch {
                details: holder,
                financial_information: FinancialInformation::default(),
            },
        };
        self.assemble(root, branch, users)
    }

    /// The first holder shares the customer's id so the two stay aligned.
    fn joint_application(&self, root: ExternalId) -> Application {
        let first_holder = AccountHolderDetails::new(root.clone());
        let second_holder = AccountHolderDetails::new(ExternalId::generate());
        let users = vec![user_for(&first_holder), user_for(&second_holder)];
        let branch = CustomerBranch::Joint {
            joint_holders: JointBranch {
                first_holder,
                second_holder,
                financial_information: FinancialInformation::default(),
                ownership: JOINT_OWNERSHIP.to_string(),
            },
        };
        self.assemble(root, branch, users)
    }

    fn organization_application(&self, root: ExternalId) -> Application {
        let individual = AccountHolderDetails::new(ExternalId::generate());
        let users = vec![user_for(&individual)];
        let branch = CustomerBranch::Org {
            organization: OrganizationBranch {
                identification: OrganizationIdentification::default(),
                account_support: AccountSupport::default(),
                associated_entities: AssociatedEntities {
                    associated_individuals: vec![individual],
                },
                financial_information: FinancialInformation::default(),
            },
        };
        self.assemble(root, branch, users)
    }

    fn assemble(&self, root: ExternalId, branch: CustomerBranch, users: Vec<User>) -> Application {
        let account = Account {
            external_id: root.clone(),
            base_currency: self.base_currency.clone(),
            margin: MarginMode::Cash,
            multi_currency: false,
            investment_objectives: Vec::new(),
            trading_permissions: Vec::new(),
        };

        Application {
            customer: Customer {
                external_id: root,
                prefix: None,
                email: None,
                legal_residence_country: None,
                md_status_non_pro: true,
                meet_aml_standard: true,
                branch,
            },
            accounts: vec![account],
            users,
            documents: Vec::new(),
        }
    }
}

impl Default for ApplicationSkeleton {
    fn default() -> Self {
        Self::from_config(&OnboardingConfig::default())
    }
}

fn user_for(holder: &AccountHolderDetails) -> User {
    User {
        external_user_id: ExternalId::generate(),
        external_individual_id: holder.external_id.clone(),
        prefix: None,
        security_questions: BTreeMap::new(),
    }
}
