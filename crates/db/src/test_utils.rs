//! Test utilities for database operations.
//!
//! Mock-connection helpers shared by repository and service tests.

use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;

/// A mock connection that answers every statement with "one row affected".
///
/// Useful for exercising write paths where the caller only inspects
/// `rows_affected`.
#[must_use]
pub fn mock_db_with_exec_results(count: usize) -> Arc<DatabaseConnection> {
    let results = std::iter::repeat_n(
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        },
        count,
    )
    .collect::<Vec<_>>();

    Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(results)
            .into_connection(),
    )
}

/// An empty mock connection for paths that never reach the database.
#[must_use]
pub fn mock_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}
