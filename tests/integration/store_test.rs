//! Store integration tests.
//!
//! Exercises the SQLite client against an on-disk sample database.

use pretty_assertions::assert_eq;
use querygate::config::StoreConfig;
use querygate::db::{self, DatabaseClient, ForeignKey, SqliteClient, Value};
use querygate::error::ErrorKind;
use tempfile::TempDir;

use super::seeded_store;

#[tokio::test]
async fn test_connect_and_introspect() {
    let dir = TempDir::new().unwrap();
    let store = db::connect(&seeded_store(&dir).await).await.unwrap();

    let schema = store.introspect_schema().await.unwrap();

    assert_eq!(schema.tables.len(), 2);
    let departments = schema.table("Departments").unwrap();
    assert_eq!(departments.primary_key, vec!["ID".to_string()]);
    assert_eq!(
        schema.foreign_keys,
        vec![ForeignKey::new(
            "Employees",
            vec!["Department_ID".to_string()],
            "Departments",
            vec!["ID".to_string()],
        )]
    );

    let rendered = schema.format_for_llm();
    assert!(rendered.contains("Table: Employees"));
    assert!(rendered.contains("  - Department_ID: INTEGER (NOT NULL, FK -> Departments.ID)"));
    assert!(rendered.contains("Employees.Department_ID -> Departments.ID"));

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_database_file() {
    let dir = TempDir::new().unwrap();

    let err = db::connect(&StoreConfig::new(dir.path().join("database.db")))
        .await
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
}

#[tokio::test]
async fn test_select_rows_in_order() {
    let dir = TempDir::new().unwrap();
    let client = SqliteClient::connect(&seeded_store(&dir).await).await.unwrap();

    let result = client
        .execute_query("SELECT Name, Salary FROM Employees ORDER BY Salary DESC;")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["Name", "Salary"]);
    let names: Vec<String> = result.rows.iter().map(|r| r[0].to_display_string()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Sara", "Sam"]);
    assert_eq!(result.rows[0][1], Value::Int(9000));
}

#[tokio::test]
async fn test_join_with_aggregation() {
    let dir = TempDir::new().unwrap();
    let client = SqliteClient::connect(&seeded_store(&dir).await).await.unwrap();

    let result = client
        .execute_query(
            "SELECT d.Name AS department, COUNT(*) AS headcount \
             FROM Employees e JOIN Departments d ON e.Department_ID = d.ID \
             GROUP BY d.Name ORDER BY d.Name;",
        )
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["department", "headcount"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Text("Engineering".to_string()), Value::Int(2)],
            vec![Value::Text("Sales".to_string()), Value::Int(2)],
        ]
    );
}

#[tokio::test]
async fn test_foreign_keys_are_enforced() {
    let dir = TempDir::new().unwrap();
    let client = SqliteClient::connect(&seeded_store(&dir).await).await.unwrap();

    let err = client
        .execute_query("INSERT INTO Employees (Name, Department_ID) VALUES ('Eve', 99);")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[tokio::test]
async fn test_pragma_returns_rows() {
    let dir = TempDir::new().unwrap();
    let client = SqliteClient::connect(&seeded_store(&dir).await).await.unwrap();

    let result = client.execute_query("PRAGMA table_info(Employees)").await.unwrap();

    assert_eq!(result.row_count, 5);
    assert!(result.column_names().contains(&"name".to_string()));
}
