use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Form number the clearing firm assigns to the W-8BEN certificate.
pub const W8_BEN_FORM_NUMBER: u32 = 5001;

/// Source-of-wealth tag seeded for employed holders.
pub const SOURCE_OF_WEALTH_INCOME: &str = "SOW-IND-Income";

/// Client-generated identifier correlating a local entity with the brokerage API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier wrapper for persisted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Individual,
    Joint,
    Org,
}

impl AccountType {
    pub const fn label(self) -> &'static str {
        match self {
            AccountType::Individual => "INDIVIDUAL",
            AccountType::Joint => "JOINT",
            AccountType::Org => "ORG",
        }
    }

    /// Number of natural-person signers, and therefore `users[]` entries.
    pub const fn signer_count(self) -> usize {
        match self {
            AccountType::Joint => 2,
            AccountType::Individual | AccountType::Org => 1,
        }
    }
}

/// Root aggregate submitted once per customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub customer: Customer,
    pub accounts: Vec<Account>,
    pub users: Vec<User>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Application {
    pub fn account_type(&self) -> AccountType {
        self.customer.branch.account_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub external_id: ExternalId,
    pub prefix: Option<String>,
    pub email: Option<String>,
    pub legal_residence_country: Option<String>,
    #[serde(default)]
    pub md_status_non_pro: bool,
    #[serde(default)]
    pub meet_aml_standard: bool,
    #[serde(flatten)]
    pub branch: CustomerBranch,
}

/// Holder structure of the customer; the tag and the populated branch can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CustomerBranch {
    #[serde(rename = "INDIVIDUAL", rename_all = "camelCase")]
    Individual { account_holder: IndividualBranch },
    #[serde(rename = "JOINT", rename_all = "camelCase")]
    Joint { joint_holders: JointBranch },
    #[serde(rename = "ORG")]
    Org { organization: OrganizationBranch },
}

impl CustomerBranch {
    pub fn account_type(&self) -> AccountType {
        match self {
            CustomerBranch::Individual { .. } => AccountType::Individual,
            CustomerBranch::Joint { .. } => AccountType::Joint,
            CustomerBranch::Org { .. } => AccountType::Org,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualBranch {
    #[serde(rename = "accountHolderDetails", with = "single")]
    pub details: AccountHolderDetails,
    #[serde(with = "single")]
    pub financial_information: FinancialInformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointBranch {
    #[serde(rename = "firstHolderDetails", with = "single")]
    pub first_holder: AccountHolderDetails,
    #[serde(rename = "secondHolderDetails", with = "single")]
    pub second_holder: AccountHolderDetails,
    #[serde(with = "single")]
    pub financial_information: FinancialInformation,
    #[serde(rename = "type")]
    pub ownership: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationBranch {
    #[serde(rename = "identifications", with = "single")]
    pub identification: OrganizationIdentification,
    pub account_support: AccountSupport,
    pub associated_entities: AssociatedEntities,
    #[serde(with = "single")]
    pub financial_information: FinancialInformation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationIdentification {
    pub name: Option<String>,
    pub business_description: Option<String>,
    pub formation_country: Option<String>,
    pub identification_country: Option<String>,
    pub identification: Option<String>,
    pub place_of_business: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSupport {
    pub business_description: Option<String>,
    pub owners_reside_us: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedEntities {
    pub associated_individuals: Vec<AccountHolderDetails>,
}

/// One natural person party to the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolderDetails {
    pub external_id: ExternalId,
    pub name: PersonName,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub country_of_birth: Option<String>,
    pub residence_address: Address,
    pub mailing_address: Option<Address>,
    #[serde(default)]
    pub phones: Vec<Phone>,
    pub identification_type: Option<IdentificationType>,
    #[serde(default)]
    pub identification: Identification,
    pub employment_type: Option<EmploymentType>,
    pub employment_details: Option<EmploymentDetails>,
    #[serde(default)]
    pub tax_residencies: Vec<TaxResidency>,
    #[serde(default)]
    pub w8_ben: W8Ben,
}

impl AccountHolderDetails {
    pub fn new(external_id: ExternalId) -> Self {
        Self {
            external_id,
            name: PersonName::default(),
            email: None,
            date_of_birth: None,
            country_of_birth: None,
            residence_address: Address::default(),
            mailing_address: None,
            phones: Vec::new(),
            identification_type: None,
            identification: Identification::default(),
            employment_type: None,
            employment_details: None,
            tax_residencies: vec![TaxResidency::default()],
            w8_ben: W8Ben::default(),
        }
    }

    /// First tax residency, created on demand.
    pub fn primary_tax_residency_mut(&mut self) -> &mut TaxResidency {
        if self.tax_residencies.is_empty() {
            self.tax_residencies.push(TaxResidency::default());
        }
        &mut self.tax_residencies[0]
    }

    pub fn primary_tin(&self) -> Option<&str> {
        self.tax_residencies
            .first()
            .and_then(|residency| residency.tin.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub salutation: Option<String>,
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

impl PersonName {
    /// `"{first} {last}"` when both parts are present.
    pub fn full_name(&self) -> Option<String> {
        match (present(&self.first), present(&self.last)) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }

    /// Whatever of first and last is filled in, space separated.
    pub fn partial_name(&self) -> Option<String> {
        let parts: Vec<&str> = [present(&self.first), present(&self.last)]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    #[serde(rename = "type")]
    pub phone_type: Option<String>,
    pub country: Option<String>,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentificationType {
    Passport,
    DriversLicense,
    NationalCard,
    AlienCard,
    Ssn,
    Sin,
}

/// Government ID numbers keyed by type plus the fields shared by every type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub issuing_country: Option<String>,
    pub citizenship: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub numbers: BTreeMap<IdentificationType, String>,
}

impl Identification {
    pub fn number(&self, kind: IdentificationType) -> Option<&str> {
        self.numbers
            .get(&kind)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmploymentType {
    Employed,
    SelfEmployed,
    Unemployed,
    Student,
    Retired,
    Homemaker,
}

impl EmploymentType {
    pub const fn has_employer(self) -> bool {
        matches!(self, EmploymentType::Employed | EmploymentType::SelfEmployed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentDetails {
    pub employer: Option<String>,
    pub occupation: Option<String>,
    pub employer_business: Option<String>,
    pub employer_address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResidency {
    pub country: Option<String>,
    pub tin: Option<String>,
    pub tin_type: Option<String>,
}

/// Embedded W-8BEN certificate; `name` and `foreign_tax_id` follow the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W8Ben {
    pub name: Option<String>,
    pub foreign_tax_id: Option<String>,
    pub tin_or_explanation_required: bool,
    pub explanation: Option<String>,
    pub cert: bool,
    pub signature_type: String,
}

impl Default for W8Ben {
    fn default() -> Self {
        Self {
            name: None,
            foreign_tax_id: None,
            tin_or_explanation_required: true,
            explanation: None,
            cert: true,
            signature_type: "Electronic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInformation {
    pub net_worth: Option<i64>,
    pub liquid_net_worth: Option<i64>,
    pub annual_net_income: Option<i64>,
    #[serde(default)]
    pub investment_objectives: Vec<InvestmentObjective>,
    #[serde(default)]
    pub sources_of_wealth: Vec<SourceOfWealth>,
    #[serde(default)]
    pub investment_experience: Vec<InvestmentExperience>,
}

impl FinancialInformation {
    /// First source-of-wealth row, created on demand.
    pub fn primary_source_of_wealth_mut(&mut self) -> &mut SourceOfWealth {
        if self.sources_of_wealth.is_empty() {
            self.sources_of_wealth.push(SourceOfWealth::default());
        }
        &mut self.sources_of_wealth[0]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOfWealth {
    pub source_type: Option<String>,
    pub percentage: Option<u32>,
    #[serde(default)]
    pub used_for_funds: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentExperience {
    pub asset_class: String,
    pub years_trading: Option<u32>,
    pub trades_per_year: Option<u32>,
    pub knowledge_level: Option<KnowledgeLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnowledgeLevel {
    None,
    Limited,
    Good,
    Extensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentObjective {
    Trading,
    Growth,
    Hedging,
    Preservation,
    Speculation,
    Income,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub external_id: ExternalId,
    pub base_currency: String,
    pub margin: MarginMode,
    #[serde(default)]
    pub multi_currency: bool,
    #[serde(default)]
    pub investment_objectives: Vec<InvestmentObjective>,
    #[serde(default)]
    pub trading_permissions: Vec<TradingPermission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginMode {
    Cash,
    Margin,
    RegT,
    PortfolioMargin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPermission {
    pub country: String,
    pub product: String,
}

/// Login for one natural-person signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub external_user_id: ExternalId,
    pub external_individual_id: ExternalId,
    pub prefix: Option<String>,
    #[serde(default)]
    pub security_questions: BTreeMap<String, String>,
}

/// Consent or tax form bundled with the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub form_number: u32,
    pub key: Option<String>,
    #[serde(default)]
    pub signed_by: Vec<String>,
    #[serde(default)]
    pub external_individual_ids: Vec<ExternalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_file: Option<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Opaque upload forwarded to the backend untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    pub file_name: String,
    pub file_length: u64,
    pub sha1_checksum: String,
    /// Base64 encoded contents.
    pub data: String,
}

/// Serializes a single value as the one-element array the brokerage schema expects.
mod single {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        [value].serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let mut items = Vec::<T>::deserialize(deserializer)?;
        if items.len() != 1 {
            return Err(D::Error::invalid_length(items.len(), &"exactly one element"));
        }
        Ok(items.remove(0))
    }
}
