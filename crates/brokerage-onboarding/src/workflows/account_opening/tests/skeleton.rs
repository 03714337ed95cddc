use super::common::*;
use crate::workflows::account_opening::domain::{
    AccountType, CustomerBranch, ExternalId, MarginMode, W8_BEN_FORM_NUMBER,
};
use crate::workflows::account_opening::lens::HolderRole;
use crate::workflows::account_opening::skeleton::ApplicationSkeleton;

#[test]
fn individual_skeleton_links_holder_user_and_account_to_root_id() {
    let root = ExternalId("root-1".to_string());
    let application = ApplicationSkeleton::new("EUR").build(AccountType::Individual, root.clone());

    assert_eq!(application.account_type(), AccountType::Individual);
    assert_eq!(application.customer.external_id, root);
    assert_eq!(application.accounts.len(), 1);
    assert_eq!(application.accounts[0].external_id, root);
    assert_eq!(application.accounts[0].base_currency, "EUR");
    assert_eq!(application.accounts[0].margin, MarginMode::Cash);

    let holder = application.holder(HolderRole::Primary).expect("primary holder");
    assert_eq!(holder.external_id, root);
    assert_eq!(holder.tax_residencies.len(), 1);
    assert_eq!(application.users.len(), 1);
    assert_eq!(application.users[0].external_individual_id, root);
    assert!(application.documents.is_empty());
}

#[test]
fn joint_skeleton_has_two_holders_and_two_users() {
    let root = ExternalId("root-2".to_string());
    let application = ApplicationSkeleton::default().build(AccountType::Joint, root.clone());

    let first = application.holder(HolderRole::JointFirst).expect("first");
    let second = application.holder(HolderRole::JointSecond).expect("second");
    assert_eq!(first.external_id, root);
    assert_ne!(second.external_id, root);
    assert_eq!(application.users.len(), 2);
    assert_eq!(
        application.users[1].external_individual_id,
        second.external_id
    );
    assert!(application.holder(HolderRole::Primary).is_none());
}

#[test]
fn organization_skeleton_starts_with_one_associated_individual() {
    let application =
        ApplicationSkeleton::default().build(AccountType::Org, ExternalId::generate());

    let organization = application
        .customer
        .branch
        .organization()
        .expect("organization branch");
    assert_eq!(organization.associated_entities.associated_individuals.len(), 1);
    assert_eq!(application.holder_roles(), vec![HolderRole::Associated(0)]);
    assert_eq!(application.users.len(), 1);
}

#[test]
fn switching_type_replaces_the_branch_and_keeps_only_the_root_id() {
    let mut engine = engine(AccountType::Individual);
    engine
        .apply_batch(complete_individual_changes())
        .expect("individual edits");
    let root = engine.application().customer.external_id.clone();

    engine.select_account_type(AccountType::Joint);
    let application = engine.application();

    assert!(matches!(
        application.customer.branch,
        CustomerBranch::Joint { .. }
    ));
    assert_eq!(application.customer.external_id, root);
    assert_eq!(application.customer.email, None);
    assert_eq!(application.customer.legal_residence_country, None);
    assert_eq!(application.users.len(), 2);
    let first = application.holder(HolderRole::JointFirst).expect("first");
    assert_eq!(first.name.first, None);
    assert_eq!(first.w8_ben.name, None);

    let json = serde_json::to_value(application).expect("serialize");
    assert_eq!(json["customer"]["type"], "JOINT");
    assert!(json["customer"].get("accountHolder").is_none());
}

#[test]
fn switching_away_from_joint_drops_the_second_holder() {
    let mut engine = engine(AccountType::Joint);
    engine
        .apply_batch(complete_joint_changes())
        .expect("joint edits");

    engine.select_account_type(AccountType::Individual);
    let application = engine.application();

    assert_eq!(application.users.len(), 1);
    assert_eq!(application.holder_roles(), vec![HolderRole::Primary]);
    assert!(application
        .documents
        .iter()
        .all(|document| document.form_number != W8_BEN_FORM_NUMBER));
}

#[test]
fn joint_selection_eagerly_generates_the_joint_document() {
    let mut engine = engine(AccountType::Individual);
    engine.select_account_type(AccountType::Joint);

    let w8: Vec<_> = engine
        .application()
        .documents
        .iter()
        .filter(|document| document.form_number == W8_BEN_FORM_NUMBER)
        .collect();
    assert_eq!(w8.len(), 1);
    assert!(w8[0].signed_by.is_empty());
}
