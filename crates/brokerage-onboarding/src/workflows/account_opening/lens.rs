//! Typed accessors over the holder roles of each account type.
//!
//! Every place that needs "the holders of this application" goes through these
//! matches, so a new branch or a renamed field fails to compile instead of
//! silently skipping a holder.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{
    AccountHolderDetails, Application, CustomerBranch, FinancialInformation, OrganizationBranch,
    User,
};

/// A natural person's position within the customer structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderRole {
    Primary,
    JointFirst,
    JointSecond,
    Associated(usize),
}

impl HolderRole {
    /// Roles whose email doubles as the customer's contact email.
    pub const fn is_email_source(self) -> bool {
        matches!(
            self,
            HolderRole::Primary | HolderRole::JointFirst | HolderRole::Associated(0)
        )
    }

    /// Key of the W-8 document this role signs.
    pub fn document_key(self) -> String {
        match self {
            HolderRole::Primary => "primary".to_string(),
            HolderRole::JointFirst | HolderRole::JointSecond => "joint".to_string(),
            HolderRole::Associated(index) => format!("individual-{index}"),
        }
    }
}

/// JSON path of the holder's details in the serialized application.
impl fmt::Display for HolderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderRole::Primary => write!(f, "customer.accountHolder.accountHolderDetails.0"),
            HolderRole::JointFirst => write!(f, "customer.jointHolders.firstHolderDetails.0"),
            HolderRole::JointSecond => write!(f, "customer.jointHolders.secondHolderDetails.0"),
            HolderRole::Associated(index) => write!(
                f,
                "customer.organization.associatedEntities.associatedIndividuals.{index}"
            ),
        }
    }
}

impl CustomerBranch {
    /// JSON path of the populated branch object.
    pub const fn path(&self) -> &'static str {
        match self {
            CustomerBranch::Individual { .. } => "customer.accountHolder",
            CustomerBranch::Joint { .. } => "customer.jointHolders",
            CustomerBranch::Org { .. } => "customer.organization",
        }
    }

    pub fn roles(&self) -> Vec<HolderRole> {
        match self {
            CustomerBranch::Individual { .. } => vec![HolderRole::Primary],
            CustomerBranch::Joint { .. } => vec![HolderRole::JointFirst, HolderRole::JointSecond],
            CustomerBranch::Org { organization } => (0..organization
                .associated_entities
                .associated_individuals
                .len())
                .map(HolderRole::Associated)
                .collect(),
        }
    }

    pub fn holder(&self, role: HolderRole) -> Option<&AccountHolderDetails> {
        match (self, role) {
            (CustomerBranch::Individual { account_holder }, HolderRole::Primary) => {
                Some(&account_holder.details)
            }
            (CustomerBranch::Joint { joint_holders }, HolderRole::JointFirst) => {
                Some(&joint_holders.first_holder)
            }
            (CustomerBranch::Joint { joint_holders }, HolderRole::JointSecond) => {
                Some(&joint_holders.second_holder)
            }
            (CustomerBranch::Org { organization }, HolderRole::Associated(index)) => organization
                .associated_entities
                .associated_individuals
                .get(index),
            _ => None,
        }
    }

    pub fn holder_mut(&mut self, role: HolderRole) -> Option<&mut AccountHolderDetails> {
        match (self, role) {
            (CustomerBranch::Individual { account_holder }, HolderRole::Primary) => {
                Some(&mut account_holder.details)
            }
            (CustomerBranch::Joint { joint_holders }, HolderRole::JointFirst) => {
                Some(&mut joint_holders.first_holder)
            }
            (CustomerBranch::Joint { joint_holders }, HolderRole::JointSecond) => {
                Some(&mut joint_holders.second_holder)
            }
            (CustomerBranch::Org { organization }, HolderRole::Associated(index)) => organization
                .associated_entities
                .associated_individuals
                .get_mut(index),
            _ => None,
        }
    }

    pub fn financial_information(&self) -> &FinancialInformation {
        match self {
            CustomerBranch::Individual { account_holder } => &account_holder.financial_information,
            CustomerBranch::Joint { joint_holders } => &joint_holders.financial_information,
            CustomerBranch::Org { organization } => &organization.financial_information,
        }
    }

    pub fn financial_information_mut(&mut self) -> &mut FinancialInformation {
        match self {
            CustomerBranch::Individual { account_holder } => {
                &mut account_holder.financial_information
            }
            CustomerBranch::Joint { joint_holders } => &mut joint_holders.financial_information,
            CustomerBranch::Org { organization } => &mut organization.financial_information,
        }
    }

    pub fn organization(&self) -> Option<&OrganizationBranch> {
        match self {
            CustomerBranch::Org { organization } => Some(organization),
            _ => None,
        }
    }

    pub fn organization_mut(&mut self) -> Option<&mut OrganizationBranch> {
        match self {
            CustomerBranch::Org { organization } => Some(organization),
            _ => None,
        }
    }
}

impl Application {
    pub fn holder_roles(&self) -> Vec<HolderRole> {
        self.customer.branch.roles()
    }

    pub fn holder(&self, role: HolderRole) -> Option<&AccountHolderDetails> {
        self.customer.branch.holder(role)
    }

    pub fn holder_mut(&mut self, role: HolderRole) -> Option<&mut AccountHolderDetails> {
        self.customer.branch.holder_mut(role)
    }

    /// Every active holder paired with its role, in signing order.
    pub fn holders(&self) -> Vec<(HolderRole, &AccountHolderDetails)> {
        self.holder_roles()
            .into_iter()
            .filter_map(|role| self.holder(role).map(|holder| (role, holder)))
            .collect()
    }

    pub fn financial_information(&self) -> &FinancialInformation {
        self.customer.branch.financial_information()
    }

    pub fn financial_information_mut(&mut self) -> &mut FinancialInformation {
        self.customer.branch.financial_information_mut()
    }

    pub fn primary_user_mut(&mut self) -> Option<&mut User> {
        self.users.first_mut()
    }
}
