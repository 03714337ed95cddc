//! W-8BEN document generation.

use super::domain::{
    AccountHolderDetails, Application, CustomerBranch, Document, ExternalId, W8_BEN_FORM_NUMBER,
};
use super::lens::HolderRole;

/// Rebuild the W-8 documents from the current holders.
///
/// Every existing form 5001 entry is dropped first; other documents are kept in
/// their original order.
pub fn regenerate_w8_documents(application: &Application) -> Vec<Document> {
    let mut documents: Vec<Document> = application
        .documents
        .iter()
        .filter(|document| document.form_number != W8_BEN_FORM_NUMBER)
        .cloned()
        .collect();

    match &application.customer.branch {
        CustomerBranch::Individual { account_holder } => {
            let holder = &account_holder.details;
            if holder.name.full_name().is_some() {
                documents.push(w8_document(HolderRole::Primary, &[holder]));
            }
        }
        CustomerBranch::Joint { joint_holders } => {
            let signers: Vec<&AccountHolderDetails> =
                [&joint_holders.first_holder, &joint_holders.second_holder]
                    .into_iter()
                    .filter(|holder| holder.name.full_name().is_some())
                    .collect();
            documents.push(w8_document(HolderRole::JointFirst, &signers));
        }
        CustomerBranch::Org { organization } => {
            if let Some(individual) = organization
                .associated_entities
                .associated_individuals
                .first()
            {
                let mut document = w8_document(HolderRole::Associated(0), &[individual]);
                // ids are kept even before the name is complete
                document.external_individual_ids = vec![individual.external_id.clone()];
                documents.push(document);
            }
        }
    }

    documents
}

/// `signed_by` only lists signers whose first and last name are both present.
fn w8_document(role: HolderRole, signers: &[&AccountHolderDetails]) -> Document {
    let (signed_by, external_individual_ids): (Vec<String>, Vec<ExternalId>) = signers
        .iter()
        .filter_map(|holder| {
            holder
                .name
                .full_name()
                .map(|name| (name, holder.external_id.clone()))
        })
        .unzip();

    Document {
        form_number: W8_BEN_FORM_NUMBER,
        key: Some(role.document_key()),
        signed_by,
        external_individual_ids,
        attached_file: None,
        payload: None,
    }
}
