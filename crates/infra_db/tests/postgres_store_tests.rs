//! PostgreSQL program store integration tests
//!
//! These tests start a PostgreSQL container and require docker:
//! `cargo test -p infra_db -- --ignored`

use std::sync::Arc;

use core_kernel::PortError;
use domain_loyalty::{LoyaltyError, ProgramService, ProgramStore};
use infra_db::PostgresProgramStore;
use rust_decimal_macros::dec;
use test_utils::{create_isolated_test_database, IdFixtures, ProgramFixtures, TestRewardBuilder};

async fn service_with_organization() -> (ProgramService, test_utils::TestDatabase) {
    let db = create_isolated_test_database().await.expect("Failed to create test database");
    db.seed_organization(IdFixtures::organization_id())
        .await
        .expect("Failed to seed organization");

    let store: Arc<dyn ProgramStore> = Arc::new(PostgresProgramStore::new(db.pool().clone()));
    (ProgramService::new(store), db)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_points_program_round_trips_through_postgres() {
    let (service, _db) = service_with_organization().await;
    let definition = ProgramFixtures::valid_points_program();

    let created = service
        .create_program(IdFixtures::organization_id(), IdFixtures::user_id(), &definition)
        .await
        .unwrap();

    let rules = created.points_rules.as_ref().unwrap();
    assert_eq!(rules.earn_rate, dec!(1.5));
    assert_eq!(rules.currency, "SAR");
    assert!(created.stamps_rules.is_none());
    assert_eq!(created.rewards.len(), 1);
    assert_eq!(
        created.rewards[0].discount.as_ref().unwrap().discount_percentage,
        dec!(20)
    );

    let loaded = service.load_program(created.id()).await.unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stamps_per_item_program_keeps_product_and_reward_order() {
    let (service, _db) = service_with_organization().await;
    let mut definition = ProgramFixtures::valid_stamps_per_item_program();
    definition.rewards = vec![
        TestRewardBuilder::free_product().with_name("First").with_cost_stamps(5).build(),
        TestRewardBuilder::discount().with_name("Second").with_cost_stamps(8).build(),
        TestRewardBuilder::free_product().with_name("Third").with_cost_stamps(10).build(),
    ];

    let created = service
        .create_program(IdFixtures::organization_id(), IdFixtures::user_id(), &definition)
        .await
        .unwrap();

    let names: Vec<_> = created.rewards.iter().map(|r| r.voucher_name.en.as_str()).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
    assert_eq!(created.accrual_products, definition.accrual_products);
    assert!(created.wallet_design.as_ref().unwrap().stamp_icons.is_some());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_unknown_organization_writes_nothing() {
    let (service, db) = service_with_organization().await;

    let err = service
        .create_program(
            IdFixtures::other_organization_id(),
            IdFixtures::user_id(),
            &ProgramFixtures::valid_points_program(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LoyaltyError::PersistenceFailed { .. }));
    assert_eq!(db.program_row_count().await.unwrap(), 0);
}

/// Rejects reward discounts of exactly 99 percent
async fn install_discount_trigger(db: &test_utils::TestDatabase) {
    sqlx::query(
        r#"
        CREATE FUNCTION reject_ninety_nine() RETURNS trigger AS $$
        BEGIN
            IF NEW.discount_percentage = 99 THEN
                RAISE EXCEPTION 'discount rejected' USING ERRCODE = 'check_violation';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Failed to create trigger function");

    sqlx::query(
        "CREATE TRIGGER reward_discounts_reject BEFORE INSERT ON reward_discounts \
         FOR EACH ROW EXECUTE FUNCTION reject_ninety_nine()",
    )
    .execute(db.pool())
    .await
    .expect("Failed to create trigger");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_failure_at_last_reward_discount_rolls_back_every_row() {
    let (service, db) = service_with_organization().await;
    install_discount_trigger(&db).await;

    let mut definition = ProgramFixtures::valid_points_program();
    definition.rewards = vec![
        TestRewardBuilder::discount().with_cost_points(100).build(),
        TestRewardBuilder::free_product().with_cost_points(200).build(),
        TestRewardBuilder::discount()
            .with_cost_points(300)
            .with_percentage(dec!(99))
            .build(),
    ];

    let err = service
        .create_program(IdFixtures::organization_id(), IdFixtures::user_id(), &definition)
        .await
        .unwrap_err();

    match err {
        LoyaltyError::PersistenceFailed { source, .. } => {
            assert!(matches!(source, PortError::Constraint { .. }));
        }
        other => panic!("Expected PersistenceFailed, got: {other}"),
    }
    assert_eq!(db.program_row_count().await.unwrap(), 0);

    // The pool stays usable after the rollback
    let program = service
        .create_program(
            IdFixtures::organization_id(),
            IdFixtures::user_id(),
            &ProgramFixtures::valid_points_program(),
        )
        .await
        .unwrap();
    assert_eq!(db.program_row_count().await.unwrap(), program.row_count() as i64);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_list_programs_is_scoped_and_newest_first() {
    let (service, _db) = service_with_organization().await;
    let org = IdFixtures::organization_id();

    let first = service
        .create_program(org, IdFixtures::user_id(), &ProgramFixtures::valid_points_program())
        .await
        .unwrap();
    let second = service
        .create_program(org, IdFixtures::user_id(), &ProgramFixtures::valid_stamps_per_visit_program())
        .await
        .unwrap();

    let headers = service.list_programs(org).await.unwrap();
    let ids: Vec<_> = headers.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);

    let other = service.list_programs(IdFixtures::other_organization_id()).await.unwrap();
    assert!(other.is_empty());
}
