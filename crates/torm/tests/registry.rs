#![allow(dead_code)]

mod common;

use chrono::NaiveDateTime;
use common::MockClient;
use torm::{Behavior, FromRow, Orm, OrmError, Record, Registry, TableMeta};

#[derive(Debug, Default, FromRow, Record)]
#[orm(table = "users")]
struct User {
    #[orm(column = "id", auto_increment)]
    id: i64,
    #[orm(column = "user_name")]
    name: String,
    #[orm(column = "created_at", auto_create_time)]
    created_at: NaiveDateTime,
}

#[derive(Debug, Default, FromRow, Record)]
#[orm(table = "audit")]
struct Audit {
    #[orm(column)]
    action: String,
}

#[test]
fn inventory_collects_derived_records() {
    let registry = Registry::from_inventory();
    assert!(registry.contains("users"));
    assert!(registry.contains("audit"));

    let users = registry.meta_of::<User>().unwrap();
    assert_eq!(users.columns(), ["id", "user_name", "created_at"]);
    assert_eq!(users.timestamp_field("created_at"), Some("created_at"));

    let audit = registry.lookup("audit").unwrap();
    assert_eq!(audit.columns(), ["action"]);
}

#[test]
fn hand_written_metadata_matches_derived() {
    let derived = TableMeta::from_fields(User::table_name(), User::fields());
    let manual = TableMeta::builder("users")
        .auto_increment("id")
        .field("name", "user_name", Behavior::Plain)
        .auto_create_time("created_at", "created_at")
        .build();
    assert_eq!(derived, manual);
}

#[test]
fn lookup_of_unknown_table_fails() {
    let registry = Registry::builder().build();
    assert!(registry.is_empty());
    let err = registry.lookup("users").unwrap_err();
    assert!(matches!(err, OrmError::UnregisteredTable(_)));
    assert_eq!(err.to_string(), "Table `users` is not registered");
}

// The process-wide registry is shared by every test in this binary, so the
// install sequence lives in a single test.
#[tokio::test]
async fn global_registry_installs_once() {
    let installed = Registry::from_inventory().install().unwrap();
    assert!(installed.contains("users"));
    assert!(Registry::global().contains("audit"));

    let err = Registry::from_inventory().install().unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));

    let client = MockClient::new();
    let mut audit = Audit {
        action: "login".to_string(),
    };
    Orm::new(&client).insert(&[]).exec(&mut audit).await.unwrap();
    assert_eq!(client.last().sql, "INSERT INTO audit (action) VALUES ($1)");
}
