//! Field-level edits a wizard step can make to the application form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::derivation::numeric::parse_optional_integer;
use super::derivation::FormError;
use super::domain::{
    Account, AccountHolderDetails, Address, Application, EmploymentDetails, EmploymentType,
    ExternalId, IdentificationType, InvestmentExperience, InvestmentObjective, KnowledgeLevel,
    MarginMode, OrganizationBranch, Phone, SourceOfWealth, TradingPermission,
};
use super::lens::HolderRole;

/// One user edit. Numeric fields carry the raw input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum FieldChange {
    #[serde(rename = "customer.prefix")]
    CustomerPrefix(Option<String>),
    #[serde(rename = "customer.email")]
    CustomerEmail(Option<String>),
    #[serde(rename = "customer.legalResidenceCountry")]
    LegalResidenceCountry(Option<String>),
    #[serde(rename = "customer.mdStatusNonPro")]
    MarketDataNonProfessional(bool),
    #[serde(rename = "accounts.0.baseCurrency")]
    BaseCurrency(String),
    #[serde(rename = "accounts.0.margin")]
    Margin(MarginMode),
    #[serde(rename = "accounts.0.investmentObjectives")]
    InvestmentObjectives(Vec<InvestmentObjective>),
    #[serde(rename = "accounts.0.tradingPermissions")]
    TradingPermissions(Vec<TradingPermission>),
    #[serde(rename = "organization.identifications.0.name")]
    OrganizationName(Option<String>),
    #[serde(rename = "organization.identifications.0.businessDescription")]
    BusinessDescription(Option<String>),
    #[serde(rename = "organization.identifications.0.formationCountry")]
    FormationCountry(Option<String>),
    #[serde(rename = "organization.identifications.0.identification")]
    OrganizationTaxId(Option<String>),
    #[serde(rename = "organization.associatedIndividuals.add")]
    AddAssociatedIndividual,
    #[serde(rename = "financialInformation.0.netWorth")]
    NetWorth(String),
    #[serde(rename = "financialInformation.0.liquidNetWorth")]
    LiquidNetWorth(String),
    #[serde(rename = "financialInformation.0.annualNetIncome")]
    AnnualNetIncome(String),
    #[serde(
        rename = "financialInformation.0.sourcesOfWealth.sourceType",
        rename_all = "camelCase"
    )]
    SourceOfWealthType { index: usize, source_type: Option<String> },
    #[serde(
        rename = "financialInformation.0.sourcesOfWealth.percentage",
        rename_all = "camelCase"
    )]
    SourceOfWealthPercentage { index: usize, percentage: String },
    #[serde(
        rename = "financialInformation.0.investmentExperience",
        rename_all = "camelCase"
    )]
    InvestmentExperience {
        asset_class: String,
        years_trading: String,
        trades_per_year: String,
        knowledge_level: Option<KnowledgeLevel>,
    },
    #[serde(rename = "holder")]
    Holder { role: HolderRole, change: HolderChange },
}

/// Edit addressed to a single holder's details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum HolderChange {
    #[serde(rename = "name.first")]
    FirstName(Option<String>),
    #[serde(rename = "name.middle")]
    MiddleName(Option<String>),
    #[serde(rename = "name.last")]
    LastName(Option<String>),
    #[serde(rename = "email")]
    Email(Option<String>),
    #[serde(rename = "dateOfBirth")]
    DateOfBirth(Option<NaiveDate>),
    #[serde(rename = "countryOfBirth")]
    CountryOfBirth(Option<String>),
    #[serde(rename = "residenceAddress")]
    ResidenceAddress(Address),
    #[serde(rename = "residenceAddress.country")]
    ResidenceCountry(Option<String>),
    #[serde(rename = "mailingAddress")]
    MailingAddress(Option<Address>),
    #[serde(rename = "phones")]
    Phones(Vec<Phone>),
    #[serde(rename = "identificationType")]
    IdentificationType(Option<IdentificationType>),
    #[serde(rename = "identification.number")]
    IdentificationNumber(Option<String>),
    #[serde(rename = "identification.issuingCountry")]
    IssuingCountry(Option<String>),
    #[serde(rename = "identification.citizenship")]
    Citizenship(Option<String>),
    #[serde(rename = "identification.expirationDate")]
    ExpirationDate(Option<NaiveDate>),
    #[serde(rename = "employmentType")]
    EmploymentType(Option<EmploymentType>),
    #[serde(rename = "employmentDetails.employer")]
    Employer(Option<String>),
    #[serde(rename = "employmentDetails.occupation")]
    Occupation(Option<String>),
    #[serde(rename = "employmentDetails.employerAddress")]
    EmployerAddress(Option<Address>),
    #[serde(rename = "taxResidencies.0.country")]
    TaxResidencyCountry(Option<String>),
    #[serde(rename = "taxResidencies.0.tin")]
    Tin(Option<String>),
    #[serde(rename = "taxResidencies.0.tinType")]
    TinType(Option<String>),
}

impl FieldChange {
    pub fn holder(role: HolderRole, change: HolderChange) -> Self {
        FieldChange::Holder { role, change }
    }

    /// Dotted path used for logging and error reporting.
    pub fn path(&self) -> String {
        match self {
            FieldChange::Holder { role, change } => format!("{role}.{}", change.path()),
            other => other.simple_path().to_string(),
        }
    }

    fn simple_path(&self) -> &'static str {
        match self {
            FieldChange::CustomerPrefix(_) => "customer.prefix",
            FieldChange::CustomerEmail(_) => "customer.email",
            FieldChange::LegalResidenceCountry(_) => "customer.legalResidenceCountry",
            FieldChange::MarketDataNonProfessional(_) => "customer.mdStatusNonPro",
            FieldChange::BaseCurrency(_) => "accounts.0.baseCurrency",
            FieldChange::Margin(_) => "accounts.0.margin",
            FieldChange::InvestmentObjectives(_) => "accounts.0.investmentObjectives",
            FieldChange::TradingPermissions(_) => "accounts.0.tradingPermissions",
            FieldChange::OrganizationName(_) => "organization.identifications.0.name",
            FieldChange::BusinessDescription(_) => {
                "organization.identifications.0.businessDescription"
            }
            FieldChange::FormationCountry(_) => "organization.identifications.0.formationCountry",
            FieldChange::OrganizationTaxId(_) => "organization.identifications.0.identification",
            FieldChange::AddAssociatedIndividual => "organization.associatedIndividuals",
            FieldChange::NetWorth(_) => "financialInformation.0.netWorth",
            FieldChange::LiquidNetWorth(_) => "financialInformation.0.liquidNetWorth",
            FieldChange::AnnualNetIncome(_) => "financialInformation.0.annualNetIncome",
            FieldChange::SourceOfWealthType { .. } => {
                "financialInformation.0.sourcesOfWealth.sourceType"
            }
            FieldChange::SourceOfWealthPercentage { .. } => {
                "financialInformation.0.sourcesOfWealth.percentage"
            }
            FieldChange::InvestmentExperience { .. } => "financialInformation.0.investmentExperience",
            FieldChange::Holder { .. } => "holder",
        }
    }
}

impl HolderChange {
    pub fn path(&self) -> &'static str {
        match self {
            HolderChange::FirstName(_) => "name.first",
            HolderChange::MiddleName(_) => "name.middle",
            HolderChange::LastName(_) => "name.last",
            HolderChange::Email(_) => "email",
            HolderChange::DateOfBirth(_) => "dateOfBirth",
            HolderChange::CountryOfBirth(_) => "countryOfBirth",
            HolderChange::ResidenceAddress(_) => "residenceAddress",
            HolderChange::ResidenceCountry(_) => "residenceAddress.country",
            HolderChange::MailingAddress(_) => "mailingAddress",
            HolderChange::Phones(_) => "phones",
            HolderChange::IdentificationType(_) => "identificationType",
            HolderChange::IdentificationNumber(_) => "identification.number",
            HolderChange::IssuingCountry(_) => "identification.issuingCountry",
            HolderChange::Citizenship(_) => "identification.citizenship",
            HolderChange::ExpirationDate(_) => "identification.expirationDate",
            HolderChange::EmploymentType(_) => "employmentType",
            HolderChange::Employer(_) => "employmentDetails.employer",
            HolderChange::Occupation(_) => "employmentDetails.occupation",
            HolderChange::EmployerAddress(_) => "employmentDetails.employerAddress",
            HolderChange::TaxResidencyCountry(_) => "taxResidencies.0.country",
            HolderChange::Tin(_) => "taxResidencies.0.tin",
            HolderChange::TinType(_) => "taxResidencies.0.tinType",
        }
    }
}

/// Write the raw value of `change` into `application`, without any derived effects.
pub(crate) fn write(application: &mut Application, change: &FieldChange) -> Result<(), FormError> {
    match change {
        FieldChange::CustomerPrefix(value) => application.customer.prefix = value.clone(),
        FieldChange::CustomerEmail(value) => application.customer.email = value.clone(),
        FieldChange::LegalResidenceCountry(value) => {
            application.customer.legal_residence_country = value.clone()
        }
        FieldChange::MarketDataNonProfessional(flag) => {
            application.customer.md_status_non_pro = *flag
        }
        FieldChange::BaseCurrency(currency) => {
            primary_account(application)?.base_currency = currency.trim().to_ascii_uppercase()
        }
        FieldChange::Margin(mode) => primary_account(application)?.margin = *mode,
        FieldChange::InvestmentObjectives(objectives) => {
            primary_account(application)?.investment_objectives = objectives.clone()
        }
        FieldChange::TradingPermissions(permissions) => {
            primary_account(application)?.trading_permissions = permissions.clone()
        }
        FieldChange::OrganizationName(value) => {
            organization(application, change)?.identification.name = value.clone()
        }
        FieldChange::BusinessDescription(value) => {
            organization(application, change)?
                .identification
                .business_description = value.clone()
        }
        FieldChange::FormationCountry(value) => {
            organization(application, change)?
                .identification
                .formation_country = value.clone()
        }
        FieldChange::OrganizationTaxId(value) => {
            organization(application, change)?.identification.identification = value.clone()
        }
        FieldChange::AddAssociatedIndividual => {
            let organization = organization(application, change)?;
            organization
                .associated_entities
                .associated_individuals
                .push(AccountHolderDetails::new(ExternalId::generate()));
        }
        FieldChange::NetWorth(raw) => {
            application.financial_information_mut().net_worth =
                parse_optional_integer(raw, "netWorth")?
        }
        FieldChange::LiquidNetWorth(raw) => {
            application.financial_information_mut().liquid_net_worth =
                parse_optional_integer(raw, "liquidNetWorth")?
        }
        FieldChange::AnnualNetIncome(raw) => {
            application.financial_information_mut().annual_net_income =
                parse_optional_integer(raw, "annualNetIncome")?
        }
        FieldChange::SourceOfWealthType { index, source_type } => {
            source_of_wealth(application, *index)?.source_type = source_type.clone()
        }
        FieldChange::SourceOfWealthPercentage { index, percentage } => {
            let parsed = parse_optional_integer(percentage, "percentage")?;
            source_of_wealth(application, *index)?.percentage = parsed
        }
        FieldChange::InvestmentExperience {
            asset_class,
            years_trading,
            trades_per_year,
            knowledge_level,
        } => {
            let entry = InvestmentExperience {
                asset_class: asset_class.clone(),
                years_trading: parse_optional_integer(years_trading, "yearsTrading")?,
                trades_per_year: parse_optional_integer(trades_per_year, "tradesPerYear")?,
                knowledge_level: *knowledge_level,
            };
            let experience = &mut application.financial_information_mut().investment_experience;
            match experience
                .iter_mut()
                .find(|existing| existing.asset_class == entry.asset_class)
            {
                Some(existing) => *existing = entry,
                None => experience.push(entry),
            }
        }
        FieldChange::Holder { role, change } => {
            let account_type = application.account_type();
            let holder = application
                .holder_mut(*role)
                .ok_or(FormError::RoleUnavailable {
                    role: *role,
                    account_type,
                })?;
            write_holder(holder, change)?;
        }
    }
    Ok(())
}

fn write_holder(holder: &mut AccountHolderDetails, change: &HolderChange) -> Result<(), FormError> {
    match change {
        HolderChange::FirstName(value) => holder.name.first = value.clone(),
        HolderChange::MiddleName(value) => holder.name.middle = value.clone(),
        HolderChange::LastName(value) => holder.name.last = value.clone(),
        HolderChange::Email(value) => holder.email = value.clone(),
        HolderChange::DateOfBirth(value) => holder.date_of_birth = *value,
        HolderChange::CountryOfBirth(value) => holder.country_of_birth = value.clone(),
        HolderChange::ResidenceAddress(address) => holder.residence_address = address.clone(),
        HolderChange::ResidenceCountry(value) => holder.residence_address.country = value.clone(),
        HolderChange::MailingAddress(address) => holder.mailing_address = address.clone(),
        HolderChange::Phones(phones) => holder.phones = phones.clone(),
        HolderChange::IdentificationType(kind) => holder.identification_type = *kind,
        HolderChange::IdentificationNumber(value) => {
            let kind = holder
                .identification_type
                .ok_or(FormError::IdentificationTypeMissing)?;
            match value {
                Some(number) => {
                    holder.identification.numbers.insert(kind, number.clone());
                }
                None => {
                    holder.identification.numbers.remove(&kind);
                }
            }
        }
        HolderChange::IssuingCountry(value) => {
            holder.identification.issuing_country = value.clone()
        }
        HolderChange::Citizenship(value) => holder.identification.citizenship = value.clone(),
        HolderChange::ExpirationDate(value) => holder.identification.expiration_date = *value,
        HolderChange::EmploymentType(kind) => holder.employment_type = *kind,
        HolderChange::Employer(value) => employment_details(holder).employer = value.clone(),
        HolderChange::Occupation(value) => employment_details(holder).occupation = value.clone(),
        HolderChange::EmployerAddress(address) => {
            employment_details(holder).employer_address = address.clone()
        }
        HolderChange::TaxResidencyCountry(value) => {
            holder.primary_tax_residency_mut().country = value.clone()
        }
        HolderChange::Tin(value) => holder.primary_tax_residency_mut().tin = value.clone(),
        HolderChange::TinType(value) => holder.primary_tax_residency_mut().tin_type = value.clone(),
    }
    Ok(())
}

fn primary_account(application: &mut Application) -> Result<&mut Account, FormError> {
    application
        .accounts
        .first_mut()
        .ok_or(FormError::MissingAccount)
}

fn organization<'a>(
    application: &'a mut Application,
    change: &FieldChange,
) -> Result<&'a mut OrganizationBranch, FormError> {
    let account_type = application.account_type();
    application
        .customer
        .branch
        .organization_mut()
        .ok_or_else(|| FormError::FieldUnavailable {
            path: change.path(),
            account_type,
        })
}

/// Existing row at `index`, or a new row when `index` is one past the end.
fn source_of_wealth(
    application: &mut Application,
    index: usize,
) -> Result<&mut SourceOfWealth, FormError> {
    let sources = &mut application.financial_information_mut().sources_of_wealth;
    if index > sources.len() {
        return Err(FormError::IndexOutOfRange {
            path: "financialInformation.0.sourcesOfWealth",
            index,
        });
    }
    if index == sources.len() {
        sources.push(SourceOfWealth::default());
    }
    Ok(&mut sources[index])
}

fn employment_details(holder: &mut AccountHolderDetails) -> &mut EmploymentDetails {
    holder
        .employment_details
        .get_or_insert_with(EmploymentDetails::default)
}
