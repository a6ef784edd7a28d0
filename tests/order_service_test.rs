//! Order service integration tests over the in-memory store.

mod common;

use chrono::NaiveDate;
use tokio_test::{assert_err, assert_ok};

use common::{at, now, order, order_with, Harness};
use production_tracker::domain::{Stage, StageAdvancePolicy, UserRole};
use production_tracker::errors::AppError;
use production_tracker::services::ServiceContainer;

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_lookup_accepts_id_or_display_name() {
    let harness = Harness::new();
    harness.seed_order(order("5512309876543", "#1023", now()));
    let orders = harness.services.orders();

    for key in ["5512309876543", "#1023", "1023", " #1023 "] {
        let found = assert_ok!(orders.lookup(key).await);
        assert_eq!(found.order_id, "5512309876543", "key {:?}", key);
    }

    assert!(matches!(orders.lookup("#9999").await, Err(AppError::NotFound(_))));
    assert!(matches!(orders.lookup("#").await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_mutation_by_display_name_writes_by_id() {
    let harness = Harness::new();
    harness.seed_order(order("5512309876543", "#1023", at("2024-06-01T04:30:00Z")));

    let updated = assert_ok!(harness.services.orders().advance("#1023", "design").await);

    assert!(updated.stages.design_done);
    assert_eq!(updated.updated_at, now());
    assert!(harness.order("5512309876543").stages.design_done);
}

// =============================================================================
// Worklists
// =============================================================================

#[tokio::test]
async fn test_worklist_follows_first_unfinished_stage() {
    let harness = Harness::new();
    harness.seed_order(order_with("1", now(), &[Stage::Design, Stage::Printing]));
    harness.seed_order(order_with("2", now(), &[Stage::Design]));
    let orders = harness.services.orders();

    let fusing: Vec<String> = assert_ok!(orders.worklist("fusing", None).await)
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    let printing: Vec<String> = assert_ok!(orders.worklist("printing", None).await)
        .into_iter()
        .map(|o| o.order_id)
        .collect();

    assert_eq!(fusing, vec!["1"]);
    assert_eq!(printing, vec!["2"]);
}

#[tokio::test]
async fn test_out_of_order_flag_stays_in_design_worklist() {
    let harness = Harness::new();
    harness.seed_order(order_with("1", now(), &[Stage::Printing]));
    let orders = harness.services.orders();

    assert_eq!(assert_ok!(orders.worklist("design", Some("meera")).await).len(), 1);
    assert!(assert_ok!(orders.worklist("printing", None).await).is_empty());
}

#[tokio::test]
async fn test_design_worklist_rules() {
    let harness = Harness::new();
    let yesterday = at("2024-06-09T06:00:00Z");

    let mut mine = order("1", "#1", yesterday);
    mine.design_assignee = Some("meera".into());
    let mut theirs = order("2", "#2", now());
    theirs.design_assignee = Some("ravi".into());
    harness.seed_order(mine);
    harness.seed_order(theirs);
    harness.seed_order(order("3", "#3", now()));
    harness.seed_order(order("4", "#4", yesterday));

    let mut visible: Vec<String> =
        assert_ok!(harness.services.orders().worklist("design", Some("meera")).await)
            .into_iter()
            .map(|o| o.order_id)
            .collect();
    visible.sort();

    // Own orders from any day, plus today's unclaimed ones
    assert_eq!(visible, vec!["1", "3"]);
}

#[tokio::test]
async fn test_design_worklist_requires_user() {
    let harness = Harness::new();
    let err = assert_err!(harness.services.orders().worklist("design", None).await);
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_overview_roles_see_everything_newest_first() {
    let harness = Harness::new();
    let mut older = order_with("1", at("2024-06-08T06:00:00Z"), &Stage::ALL);
    older.updated_at = at("2024-06-08T07:00:00Z");
    harness.seed_order(older);
    harness.seed_order(order("2", "#2", now()));

    for role in ["admin", "customer"] {
        let ids: Vec<String> = assert_ok!(harness.services.orders().worklist(role, None).await)
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    let err = assert_err!(harness.services.orders().worklist("wizard", None).await);
    assert!(matches!(err, AppError::Validation(_)));
}

// =============================================================================
// Stage progression
// =============================================================================

#[tokio::test]
async fn test_unconditional_policy_allows_skipping() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", now()));

    let updated = assert_ok!(harness.services.orders().advance("1", "fusing").await);

    assert!(updated.stages.fusing_done);
    assert!(!updated.stages.design_done);
    assert_eq!(updated.pending_stage(), Some(Stage::Design));
}

#[tokio::test]
async fn test_sequential_policy_rejects_skipping() {
    let harness = Harness::with_policy(StageAdvancePolicy::Sequential);
    harness.seed_order(order_with("1", now(), &[Stage::Design]));
    let orders = harness.services.orders();

    let err = assert_err!(orders.advance("1", "fusing").await);
    assert!(matches!(err, AppError::Validation(_)));
    assert!(!harness.order("1").stages.fusing_done);

    assert_ok!(orders.advance("1", "printing").await);
    let updated = assert_ok!(orders.advance("1", "fusing").await);
    assert_eq!(updated.pending_stage(), Some(Stage::Stitching));
}

#[tokio::test]
async fn test_advance_is_idempotent() {
    let harness = Harness::new();
    harness.seed_order(order_with("1", now(), &[Stage::Design]));

    let updated = assert_ok!(harness.services.orders().advance("1", "design").await);
    assert!(updated.stages.design_done);
    assert_eq!(updated.pending_stage(), Some(Stage::Printing));
}

#[tokio::test]
async fn test_advance_rejects_unknown_stage_and_order() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", now()));
    let orders = harness.services.orders();

    assert!(matches!(orders.advance("1", "packing").await, Err(AppError::Validation(_))));
    assert!(matches!(orders.advance("404", "design").await, Err(AppError::NotFound(_))));
}

// =============================================================================
// Assignment, dispatch date, design upload
// =============================================================================

#[tokio::test]
async fn test_assign_designer_requires_design_role() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", now()));
    harness.seed_user("pooja", "s3cret-pass", UserRole::Printing).await;
    let orders = harness.services.orders();

    let err = assert_err!(orders.assign_designer("1", "nobody").await);
    assert!(matches!(err, AppError::InvalidAssignee(ref name) if name == "nobody"));

    let err = assert_err!(orders.assign_designer("1", "pooja").await);
    assert!(matches!(err, AppError::InvalidAssignee(_)));

    assert_eq!(harness.order("1").design_assignee, None);
}

#[tokio::test]
async fn test_assign_designer_sets_assignee() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", at("2024-06-01T04:30:00Z")));
    harness.seed_user("meera", "s3cret-pass", UserRole::Design).await;

    let updated = assert_ok!(harness.services.orders().assign_designer("#1", "meera").await);

    assert_eq!(updated.design_assignee.as_deref(), Some("meera"));
    assert_eq!(updated.updated_at, now());
}

#[tokio::test]
async fn test_dispatch_date_must_be_strict_iso() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", now()));
    let orders = harness.services.orders();

    for bad in ["2024-7-1", "01-07-2024", "2024-02-30", "tomorrow", ""] {
        let err = assert_err!(orders.set_dispatch_date("1", bad).await);
        assert!(matches!(err, AppError::Validation(_)), "accepted {:?}", bad);
    }

    let updated = assert_ok!(orders.set_dispatch_date("1", "2024-07-01").await);
    assert_eq!(updated.dispatch_date, NaiveDate::from_ymd_opt(2024, 7, 1));
}

#[tokio::test]
async fn test_attach_design_stores_image_and_marks_design_done() {
    let harness = Harness::new();
    harness.seed_order(order("1", "#1", now()));

    let file = assert_ok!(
        harness
            .services
            .orders()
            .attach_design("#1", Some("front.png".into()), vec![0x89, 0x50, 0x4e, 0x47])
            .await
    );

    let stored = harness.order("1");
    assert_eq!(stored.design_image.as_deref(), Some(file.as_str()));
    assert!(stored.stages.design_done);
    assert_eq!(harness.storage.files().len(), 1);
}

#[tokio::test]
async fn test_attach_design_to_missing_order_stores_nothing() {
    let harness = Harness::new();

    let err = assert_err!(
        harness
            .services
            .orders()
            .attach_design("404", None, vec![1, 2, 3])
            .await
    );

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(harness.storage.files().is_empty());
}
