//! Integration tests for QueryGate.
//!
//! Shared fixtures live here; each submodule covers one area.

pub mod ollama_test;
pub mod pipeline_test;
pub mod store_test;

use querygate::config::StoreConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

/// Statements that build the sample HR database.
const SEED: &[&str] = &[
    "CREATE TABLE Departments (
        ID INTEGER PRIMARY KEY,
        Name TEXT NOT NULL UNIQUE,
        Manager TEXT
    )",
    "CREATE TABLE Employees (
        ID INTEGER PRIMARY KEY,
        Name TEXT NOT NULL,
        Department_ID INTEGER NOT NULL REFERENCES Departments(ID),
        Salary INTEGER,
        Hire_Date TEXT
    )",
    "INSERT INTO Departments (ID, Name, Manager) VALUES
        (1, 'Engineering', 'Alice'),
        (2, 'Sales', 'Bob')",
    "INSERT INTO Employees (ID, Name, Department_ID, Salary, Hire_Date) VALUES
        (1, 'Sam', 1, 5000, '2021-03-01'),
        (2, 'Sara', 2, 6000, '2020-07-15'),
        (3, 'Bob', 2, 7000, '2019-01-10'),
        (4, 'Alice', 1, 9000, '2018-05-20')",
];

/// Creates the sample database inside `dir` and returns a store config for it.
pub async fn seeded_store(dir: &TempDir) -> StoreConfig {
    let path = dir.path().join("database.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("create sample database");

    for statement in SEED {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("seed sample database");
    }

    pool.close().await;
    StoreConfig::new(path)
}
