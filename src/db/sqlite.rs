//! SQLite store client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for a single pre-populated SQLite file using sqlx.

use crate::config::StoreConfig;
use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value,
};
use crate::error::{QueryGateError, Result};
use crate::safety::{leading_verb_token, LeadingVerb};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Sqlite;
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a statement waits on a locked database file before failing.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// How long a statement waits for the single pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Virtual machine steps between deadline checks while a statement runs.
const PROGRESS_STEPS: i32 = 1000;

/// Primary SQLite result code of a statement stopped by the progress handler.
const SQLITE_INTERRUPT: i32 = 9;

/// Primary SQLite result codes that mean the file itself is unusable.
const SQLITE_IOERR: i32 = 10;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_NOTADB: i32 = 26;

/// SQLite store client.
///
/// The pool holds a single connection, so each statement has exclusive use of
/// the store for its duration and releases it when it finishes.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    max_rows: usize,
    statement_timeout: Duration,
}

impl SqliteClient {
    /// Opens the database file named in the store configuration.
    ///
    /// The file must already exist; a missing file is reported as
    /// [`QueryGateError::StoreUnavailable`] rather than silently created.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let path = &config.path;
        if !path.exists() {
            return Err(QueryGateError::store_unavailable(format!(
                "database file not found: {}",
                path.display()
            )));
        }

        debug!("Opening SQLite database at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| map_connection_error(e, path))?;

        // Opening is lazy about the header; touch the schema so a non-database
        // file fails here rather than on the first question.
        sqlx::query("SELECT count(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await
            .map_err(|e| map_connection_error(e, path))?;

        debug!("Successfully opened database");
        Ok(Self::from_pool(
            pool,
            config.max_rows,
            config.statement_timeout(),
        ))
    }

    /// Creates a client from an existing connection pool.
    pub fn from_pool(pool: SqlitePool, max_rows: usize, statement_timeout: Duration) -> Self {
        Self {
            pool,
            max_rows,
            statement_timeout,
        }
    }

    async fn fetch_rows(&self, sql: &str, start: Instant) -> Result<QueryResult> {
        let mut conn = self.acquire_bounded().await?;
        let result = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *conn)
            .await;
        self.release(conn).await;
        let result = result.map_err(|e| self.map_statement_error(e))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.fetch_column_metadata(sql).await,
        };

        let total_rows = result.len();
        let was_truncated = total_rows > self.max_rows;

        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, self.max_rows
            );
        }

        let rows: Vec<Row> = result.iter().take(self.max_rows).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows: Some(total_rows),
            was_truncated,
            rows_affected: None,
        })
    }

    async fn execute_statement(&self, sql: &str, start: Instant) -> Result<QueryResult> {
        let mut conn = self.acquire_bounded().await?;
        let done = sqlx::query(sql).persistent(false).execute(&mut *conn).await;
        self.release(conn).await;
        let done = done.map_err(|e| self.map_statement_error(e))?;

        Ok(QueryResult::affected(done.rows_affected()).with_execution_time(start.elapsed()))
    }

    /// Takes the pooled connection and arms the statement deadline on it.
    ///
    /// SQLite calls the progress handler while the statement runs and aborts
    /// the statement once the handler reports the deadline has passed. An
    /// aborted statement is rolled back, so nothing it wrote is kept.
    async fn acquire_bounded(&self) -> Result<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await.map_err(map_query_error)?;
        let deadline = Instant::now() + self.statement_timeout;

        conn.lock_handle()
            .await
            .map_err(map_query_error)?
            .set_progress_handler(PROGRESS_STEPS, move || Instant::now() < deadline);

        Ok(conn)
    }

    /// Disarms the deadline and returns the connection to the pool.
    async fn release(&self, mut conn: PoolConnection<Sqlite>) {
        let disarmed = match conn.lock_handle().await {
            Ok(mut handle) => {
                handle.remove_progress_handler();
                Ok(())
            }
            Err(e) => Err(e),
        };

        if let Err(e) = disarmed {
            // A connection still carrying an expired deadline would abort
            // every later statement, so replace it instead.
            warn!("Discarding store connection after failed cleanup: {}", e);
            drop(conn.detach());
        }
    }

    /// Maps a statement error, naming the bound when the deadline stopped it.
    fn map_statement_error(&self, error: sqlx::Error) -> QueryGateError {
        if primary_code(&error) == Some(SQLITE_INTERRUPT) {
            return QueryGateError::execution(format!(
                "statement did not finish within {} seconds",
                self.statement_timeout.as_secs_f64()
            ));
        }
        map_query_error(error)
    }

    /// Reads the result column names of a statement that returned no rows.
    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not prepare statement for column metadata: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetches all user tables with their columns and primary keys.
    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_schema_error("tables", e))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let (columns, primary_key) = self.fetch_columns(&table_name).await?;
            tables.push(Table {
                name: table_name,
                columns,
                primary_key,
            });
        }

        Ok(tables)
    }

    /// Fetches columns and primary key columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_schema_error(&format!("columns for {table_name}"), e))?;

        let mut key_columns: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        key_columns.sort();
        let primary_key = key_columns.into_iter().map(|(_, name)| name).collect();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, pk)| Column {
                name,
                data_type,
                // INTEGER PRIMARY KEY aliases the rowid and is never NULL.
                is_nullable: not_null == 0 && pk == 0,
                default,
            })
            .collect();

        Ok((columns, primary_key))
    }

    /// Fetches foreign key relationships declared on a specific table.
    async fn fetch_foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(i64, i64, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, seq, "table", "from", "to"
            FROM pragma_foreign_key_list(?1)
            ORDER BY id, seq
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_schema_error(&format!("foreign keys for {table_name}"), e))?;

        // One constraint per id; multi-column keys arrive as consecutive seq rows.
        let mut constraints: BTreeMap<i64, ForeignKey> = BTreeMap::new();
        for (id, _seq, to_table, from_column, to_column) in rows {
            let fk = constraints
                .entry(id)
                .or_insert_with(|| ForeignKey::new(table_name, Vec::new(), to_table, Vec::new()));
            fk.from_columns.push(from_column);
            // A missing target column refers to the parent's primary key.
            fk.to_columns.push(to_column.unwrap_or_default());
        }

        Ok(constraints.into_values().collect())
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let mut foreign_keys = Vec::new();

        for table in &tables {
            foreign_keys.extend(self.fetch_foreign_keys(&table.name).await?);
        }

        // Resolve implicit targets against the parent's primary key.
        for fk in &mut foreign_keys {
            if fk.to_columns.iter().any(String::is_empty) {
                if let Some(parent) = tables.iter().find(|t| t.name == fk.to_table) {
                    if parent.primary_key.len() == fk.to_columns.len() {
                        fk.to_columns = parent.primary_key.clone();
                    }
                }
            }
        }

        debug!(
            "Introspected {} tables and {} foreign keys",
            tables.len(),
            foreign_keys.len()
        );

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        if LeadingVerb::from_token(leading_verb_token(sql)).returns_rows() {
            self.fetch_rows(sql, start).await
        } else {
            self.execute_statement(sql, start).await
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|index| convert_value(row, index))
        .collect()
}

/// Converts a single column value by its storage class.
///
/// SQLite is dynamically typed, so the class of the stored value decides the
/// decoding rather than the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Blob)
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}

/// Returns the primary SQLite result code of a database error, if any.
fn primary_code(error: &sqlx::Error) -> Option<i32> {
    match error {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff),
        _ => None,
    }
}

/// Maps an error raised while opening the store.
fn map_connection_error(error: sqlx::Error, path: &std::path::Path) -> QueryGateError {
    QueryGateError::store_unavailable(format!("cannot open {}: {}", path.display(), error))
}

/// Maps an error raised while reading the schema.
fn map_schema_error(what: &str, error: sqlx::Error) -> QueryGateError {
    QueryGateError::store_unavailable(format!("failed to read {what}: {error}"))
}

/// Maps an error raised by a candidate statement to its error kind.
fn map_query_error(error: sqlx::Error) -> QueryGateError {
    if matches!(
        primary_code(&error),
        Some(SQLITE_IOERR | SQLITE_CANTOPEN | SQLITE_NOTADB)
    ) {
        return QueryGateError::store_unavailable(error.to_string());
    }

    match error {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            if is_syntax_message(&message) {
                QueryGateError::syntax(message)
            } else {
                QueryGateError::execution(message)
            }
        }
        sqlx::Error::Io(e) => QueryGateError::store_unavailable(e.to_string()),
        sqlx::Error::PoolTimedOut => {
            QueryGateError::store_unavailable("timed out waiting for the store connection")
        }
        sqlx::Error::PoolClosed => QueryGateError::store_unavailable("the store has been closed"),
        sqlx::Error::Configuration(e) => QueryGateError::store_unavailable(e.to_string()),
        other => QueryGateError::execution(other.to_string()),
    }
}

/// Returns true if a SQLite error message describes malformed SQL.
fn is_syntax_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("syntax error")
        || lower.contains("incomplete input")
        || lower.contains("unrecognized token")
}
