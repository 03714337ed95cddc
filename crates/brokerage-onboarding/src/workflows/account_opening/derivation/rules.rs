use super::super::change::{FieldChange, HolderChange};
use super::super::domain::{
    Application, EmploymentType, Identification, IdentificationType, SOURCE_OF_WEALTH_INCOME,
};
use super::super::lens::HolderRole;
use super::patch::Patch;

/// `(prior, change, current) -> patches`. `current` already holds the raw write.
pub(crate) type Rule = fn(&Application, &FieldChange, &Application) -> Vec<Patch>;

/// Declared evaluation order; patches are applied in the same order.
pub(crate) const RULES: &[(&str, Rule)] = &[
    ("user_prefix", sync_user_prefix),
    ("customer_email", sync_customer_email),
    ("business_description", sync_business_description),
    ("investment_objectives", sync_investment_objectives),
    ("w8_name", sync_w8_name),
    ("w8_foreign_tax_id", sync_w8_foreign_tax_id),
    ("source_of_wealth", seed_source_of_wealth),
    ("employment_details", shape_employment_details),
    ("identification_type", migrate_identification),
    ("tax_residency_country", sync_tax_residency_country),
    ("residence_country", sync_legal_residence_country),
];

fn holder_change(change: &FieldChange) -> Option<(HolderRole, &HolderChange)> {
    match change {
        FieldChange::Holder { role, change } => Some((*role, change)),
        _ => None,
    }
}

fn sync_user_prefix(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match change {
        FieldChange::CustomerPrefix(prefix) => vec![Patch::UserPrefix(prefix.clone())],
        _ => Vec::new(),
    }
}

fn sync_customer_email(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match holder_change(change) {
        Some((role, HolderChange::Email(email))) if role.is_email_source() => {
            vec![Patch::CustomerEmail(email.clone())]
        }
        _ => Vec::new(),
    }
}

fn sync_business_description(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match change {
        FieldChange::BusinessDescription(description) => {
            vec![Patch::SupportBusinessDescription(description.clone())]
        }
        _ => Vec::new(),
    }
}

fn sync_investment_objectives(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    let FieldChange::InvestmentObjectives(objectives) = change else {
        return Vec::new();
    };

    let mut filtered = Vec::with_capacity(objectives.len());
    for objective in objectives {
        if !filtered.contains(objective) {
            filtered.push(*objective);
        }
    }
    vec![Patch::FinancialObjectives(filtered)]
}

fn sync_w8_name(_prior: &Application, change: &FieldChange, current: &Application) -> Vec<Patch> {
    let Some((role, HolderChange::FirstName(_) | HolderChange::LastName(_))) = holder_change(change)
    else {
        return Vec::new();
    };
    let Some(holder) = current.holder(role) else {
        return Vec::new();
    };

    vec![
        Patch::W8Name {
            role,
            name: holder.name.partial_name(),
        },
        Patch::DocumentsStale,
    ]
}

fn sync_w8_foreign_tax_id(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match holder_change(change) {
        Some((role, HolderChange::Tin(tin))) => vec![Patch::W8ForeignTaxId {
            role,
            tin: tin.clone(),
        }],
        _ => Vec::new(),
    }
}

fn seed_source_of_wealth(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match holder_change(change) {
        Some((_, HolderChange::EmploymentType(Some(EmploymentType::Employed)))) => {
            vec![Patch::SourceOfWealthType(SOURCE_OF_WEALTH_INCOME.to_string())]
        }
        _ => Vec::new(),
    }
}

fn shape_employment_details(
    _prior: &Application,
    change: &FieldChange,
    _current: &Application,
) -> Vec<Patch> {
    match holder_change(change) {
        Some((role, HolderChange::EmploymentType(kind))) => {
            if kind.map(|kind| kind.has_employer()).unwrap_or(false) {
                vec![Patch::EnsureEmployerAddress { role }]
            } else {
                vec![Patch::ClearEmploymentDetails { role }]
            }
        }
        _ => Vec::new(),
    }
}

/// Moves the number entered under the previous ID type to the newly selected one.
///
/// Reads the number from `prior` so that no other write in the same change can
/// clobber it.
fn migrate_identification(
    prior: &Application,
    change: &FieldChange,
    current: &Application,
) -> Vec<Patch> {
    let Some((role, HolderChange::IdentificationType(Some(next)))) = holder_change(change) else {
        return Vec::new();
    };
    let (Some(before), Some(after)) = (prior.holder(role), current.holder(role)) else {
        return Vec::new();
    };

    let carried = carried_number(&before.identification, before.identification_type);
    let mut identification = Identification {
        issuing_country: after.identification.issuing_country.clone(),
        citizenship: after.identification.citizenship.clone(),
        expiration_date: after.identification.expiration_date,
        numbers: Default::default(),
    };
    if let Some(number) = &carried {
        identification.numbers.insert(*next, number.clone());
    }

    vec![
        Patch::ReplaceIdentification {
            role,
            identification,
        },
        Patch::TaxResidencyTin {
            role,
            tin: carried.clone(),
        },
        Patch::W8ForeignTaxId { role, tin: carried },
    ]
}

fn carried_number(
    identification: &Identification,
    previous: Option<IdentificationType>,
) -> Option<String> {
    previous
        .and_then(|kind| identification.number(kind))
        .or_else(|| {
            identification
                .numbers
                .values()
                .map(String::as_str)
                .find(|number| !number.trim().is_empty())
        })
        .map(str::to_string)
}

fn sync_tax_residency_country(
    _prior: &Application,
    change: &FieldChange,
    current: &Application,
) -> Vec<Patch> {
    match change {
        FieldChange::LegalResidenceCountry(country) => tax_residency_countries(current, country),
        _ => Vec::new(),
    }
}

fn sync_legal_residence_country(
    prior: &Application,
    change: &FieldChange,
    current: &Application,
) -> Vec<Patch> {
    let Some((
        role,
        HolderChange::ResidenceAddress(_) | HolderChange::ResidenceCountry(_),
    )) = holder_change(change)
    else {
        return Vec::new();
    };

    let before = prior
        .holder(role)
        .and_then(|holder| holder.residence_address.country.clone());
    let Some(after) = current
        .holder(role)
        .map(|holder| holder.residence_address.country.clone())
    else {
        return Vec::new();
    };
    if before == after {
        return Vec::new();
    }

    let mut patches = vec![Patch::LegalResidenceCountry(after.clone())];
    patches.extend(tax_residency_countries(current, &after));
    patches
}

fn tax_residency_countries(application: &Application, country: &Option<String>) -> Vec<Patch> {
    application
        .holder_roles()
        .into_iter()
        .map(|role| Patch::TaxResidencyCountry {
            role,
            country: country.clone(),
        })
        .collect()
}
