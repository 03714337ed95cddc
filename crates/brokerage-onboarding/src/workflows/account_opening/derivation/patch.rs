use super::super::domain::{
    Address, Application, EmploymentDetails, Identification, InvestmentObjective,
};
use super::super::lens::HolderRole;

/// A derived write produced by a rule and applied after every rule has run.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    UserPrefix(Option<String>),
    CustomerEmail(Option<String>),
    SupportBusinessDescription(Option<String>),
    FinancialObjectives(Vec<InvestmentObjective>),
    W8Name {
        role: HolderRole,
        name: Option<String>,
    },
    W8ForeignTaxId {
        role: HolderRole,
        tin: Option<String>,
    },
    SourceOfWealthType(String),
    EnsureEmployerAddress {
        role: HolderRole,
    },
    ClearEmploymentDetails {
        role: HolderRole,
    },
    ReplaceIdentification {
        role: HolderRole,
        identification: Identification,
    },
    TaxResidencyTin {
        role: HolderRole,
        tin: Option<String>,
    },
    LegalResidenceCountry(Option<String>),
    TaxResidencyCountry {
        role: HolderRole,
        country: Option<String>,
    },
    DocumentsStale,
}

impl Patch {
    /// Apply the write. Returns `true` when the W-8 documents need regenerating.
    pub(crate) fn apply(self, application: &mut Application) -> bool {
        match self {
            Patch::UserPrefix(prefix) => {
                if let Some(user) = application.primary_user_mut() {
                    user.prefix = prefix;
                }
            }
            Patch::CustomerEmail(email) => application.customer.email = email,
            Patch::SupportBusinessDescription(description) => {
                if let Some(organization) = application.customer.branch.organization_mut() {
                    organization.account_support.business_description = description;
                }
            }
            Patch::FinancialObjectives(objectives) => {
                application.financial_information_mut().investment_objectives = objectives
            }
            Patch::W8Name { role, name } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.w8_ben.name = name;
                }
            }
            Patch::W8ForeignTaxId { role, tin } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.w8_ben.foreign_tax_id = tin;
                }
            }
            Patch::SourceOfWealthType(source_type) => {
                application
                    .financial_information_mut()
                    .primary_source_of_wealth_mut()
                    .source_type = Some(source_type)
            }
            Patch::EnsureEmployerAddress { role } => {
                if let Some(holder) = application.holder_mut(role) {
                    let details = holder
                        .employment_details
                        .get_or_insert_with(EmploymentDetails::default);
                    details.employer_address.get_or_insert_with(Address::default);
                }
            }
            Patch::ClearEmploymentDetails { role } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.employment_details = None;
                }
            }
            Patch::ReplaceIdentification {
                role,
                identification,
            } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.identification = identification;
                }
            }
            Patch::TaxResidencyTin { role, tin } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.primary_tax_residency_mut().tin = tin;
                }
            }
            Patch::LegalResidenceCountry(country) => {
                application.customer.legal_residence_country = country
            }
            Patch::TaxResidencyCountry { role, country } => {
                if let Some(holder) = application.holder_mut(role) {
                    holder.primary_tax_residency_mut().country = country;
                }
            }
            Patch::DocumentsStale => return true,
        }
        false
    }
}
