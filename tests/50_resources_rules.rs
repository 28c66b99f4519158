mod common;

use anyhow::Result;
use serde_json::json;
use wellness_access::catalog::Role;
use wellness_access::models::{
    PermissionContext, ResourceAction, ResourceKind, RuleCondition, RuleEffect,
};
use wellness_access::store::ResourceOwner;

#[tokio::test]
async fn journal_owner_reads_and_edits_own_entries() -> Result<()> {
    let (store, service) = common::harness();
    let owner = common::user(Role::IndividualUser, None);
    store.insert_user(owner.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: owner.id,
                company_id: None,
            },
        )
        .await;

    for action in [
        ResourceAction::Read,
        ResourceAction::Update,
        ResourceAction::Delete,
    ] {
        assert!(
            service
                .can_access_resource(&owner, ResourceKind::Journal, journal, action)
                .await?
        );
    }
    Ok(())
}

#[tokio::test]
async fn company_manager_reads_member_journals_but_never_writes() -> Result<()> {
    let (store, service) = common::harness();
    let company = uuid::Uuid::new_v4();
    let manager = common::user(Role::CompanyManager, Some(company));
    let member = common::user(Role::CompanyUser, Some(company));
    store.insert_user(manager.clone()).await;
    store.insert_user(member.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: member.id,
                company_id: Some(company),
            },
        )
        .await;

    assert!(
        service
            .can_access_resource(&manager, ResourceKind::Journal, journal, ResourceAction::Read)
            .await?
    );
    // Writing someone else's journal denies even for managers
    assert!(
        !service
            .can_access_resource(
                &manager,
                ResourceKind::Journal,
                journal,
                ResourceAction::Update
            )
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn cross_company_journal_read_denies() -> Result<()> {
    let (store, service) = common::harness();
    let manager = common::user(Role::CompanyManager, Some(uuid::Uuid::new_v4()));
    let member = common::user(Role::CompanyUser, Some(uuid::Uuid::new_v4()));
    store.insert_user(manager.clone()).await;
    store.insert_user(member.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: member.id,
                company_id: member.company_id,
            },
        )
        .await;

    assert!(
        !service
            .can_access_resource(&manager, ResourceKind::Journal, journal, ResourceAction::Read)
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn unresolvable_resources_fail_closed() -> Result<()> {
    let (store, service) = common::harness();
    let root = common::super_admin();
    store.insert_user(root.clone()).await;

    // Unregistered journal: even a super admin gets a deny, not an error
    assert!(
        !service
            .can_access_resource(
                &root,
                ResourceKind::MoodEntry,
                uuid::Uuid::new_v4(),
                ResourceAction::Read
            )
            .await?
    );

    // Missing user target likewise denies
    assert!(
        !service
            .can_access_resource(
                &root,
                ResourceKind::User,
                uuid::Uuid::new_v4(),
                ResourceAction::Read
            )
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn company_resource_checks_follow_tenant_isolation() -> Result<()> {
    let (store, service) = common::harness();
    let company = uuid::Uuid::new_v4();
    let admin = common::user(Role::CompanyAdmin, Some(company));
    let member = common::user(Role::CompanyUser, Some(company));
    store.insert_user(admin.clone()).await;
    store.insert_user(member.clone()).await;

    assert!(
        service
            .can_access_resource(&admin, ResourceKind::Company, company, ResourceAction::Manage)
            .await?
    );
    // Members read their company but do not manage it
    assert!(
        service
            .can_access_resource(&member, ResourceKind::Company, company, ResourceAction::Read)
            .await?
    );
    assert!(
        !service
            .can_access_resource(&member, ResourceKind::Company, company, ResourceAction::Manage)
            .await?
    );
    // Foreign company denies outright
    assert!(
        !service
            .can_access_resource(
                &admin,
                ResourceKind::Company,
                uuid::Uuid::new_v4(),
                ResourceAction::Read
            )
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn rule_lifecycle_requires_manage_platform() -> Result<()> {
    let (store, service) = common::harness();
    let root = common::super_admin();
    let admin = common::user(Role::CompanyAdmin, Some(uuid::Uuid::new_v4()));
    store.insert_user(root.clone()).await;
    store.insert_user(admin.clone()).await;

    let err = service
        .create_rule(
            ResourceKind::Journal,
            ResourceAction::Read,
            RuleCondition::Always,
            RuleEffect::Deny,
            &admin,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_PERMISSIONS");

    let rule = service
        .create_rule(
            ResourceKind::Journal,
            ResourceAction::Read,
            RuleCondition::AttributeEquals {
                key: "locked".to_string(),
                value: json!(true),
            },
            RuleEffect::Deny,
            &root,
        )
        .await?;

    assert_eq!(service.list_rules(&root).await?.len(), 1);
    assert!(service.list_rules(&admin).await.is_err());

    service.delete_rule(rule.id, &root).await?;
    assert!(service.list_rules(&root).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn deny_rule_overrides_rbac_fallback() -> Result<()> {
    let (store, service) = common::harness();
    let root = common::super_admin();
    let owner = common::user(Role::IndividualUser, None);
    store.insert_user(root.clone()).await;
    store.insert_user(owner.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: owner.id,
                company_id: None,
            },
        )
        .await;

    // Without rules the owner is allowed via RBAC fallback
    let ctx = PermissionContext::new(owner.clone(), ResourceKind::Journal, ResourceAction::Read)
        .with_resource_id(journal)
        .with_attribute("locked", json!(true));
    assert!(service.authorize(&ctx).await?);

    service
        .create_rule(
            ResourceKind::Journal,
            ResourceAction::Read,
            RuleCondition::AttributeEquals {
                key: "locked".to_string(),
                value: json!(true),
            },
            RuleEffect::Deny,
            &root,
        )
        .await?;

    assert!(!service.authorize(&ctx).await?);
    Ok(())
}

#[tokio::test]
async fn inapplicable_rules_fall_back_to_rbac() -> Result<()> {
    let (store, service) = common::harness();
    let root = common::super_admin();
    let owner = common::user(Role::IndividualUser, None);
    store.insert_user(root.clone()).await;
    store.insert_user(owner.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: owner.id,
                company_id: None,
            },
        )
        .await;

    // Deny rule conditioned on an attribute this request does not carry
    service
        .create_rule(
            ResourceKind::Journal,
            ResourceAction::Read,
            RuleCondition::AttributeEquals {
                key: "locked".to_string(),
                value: json!(true),
            },
            RuleEffect::Deny,
            &root,
        )
        .await?;

    let ctx = PermissionContext::new(owner.clone(), ResourceKind::Journal, ResourceAction::Read)
        .with_resource_id(journal);
    // Not applicable is not a denial: ownership still allows
    assert!(service.authorize(&ctx).await?);
    Ok(())
}

#[tokio::test]
async fn allow_rule_grants_beyond_rbac() -> Result<()> {
    let (store, service) = common::harness();
    let root = common::super_admin();
    let company = uuid::Uuid::new_v4();
    let colleague = common::user(Role::CompanyUser, Some(company));
    let owner = common::user(Role::CompanyUser, Some(company));
    store.insert_user(root.clone()).await;
    store.insert_user(colleague.clone()).await;
    store.insert_user(owner.clone()).await;
    let journal = uuid::Uuid::new_v4();
    store
        .register_resource(
            ResourceKind::Journal,
            journal,
            ResourceOwner {
                owner_id: owner.id,
                company_id: Some(company),
            },
        )
        .await;

    // RBAC alone denies a plain colleague
    let ctx =
        PermissionContext::new(colleague.clone(), ResourceKind::Journal, ResourceAction::Read)
            .with_resource_id(journal)
            .with_attribute("shared_with_team", json!(true));
    assert!(!service.authorize(&ctx).await?);

    // An allow rule for explicitly shared entries opens it up
    service
        .create_rule(
            ResourceKind::Journal,
            ResourceAction::Read,
            RuleCondition::AttributeEquals {
                key: "shared_with_team".to_string(),
                value: json!(true),
            },
            RuleEffect::Allow,
            &root,
        )
        .await?;
    assert!(service.authorize(&ctx).await?);
    Ok(())
}
