//! General database handling.

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::config::Config;

/// The SQLSTATE code for unique constraint violations.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// The SQLSTATE code for foreign key violations.
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Connects the SQLx database pool and runs pending database migrations, returning the pool once
/// complete.
///
/// # Errors
///
/// Returns an error if the initial database connection or its migrations fail.
pub async fn initialize(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Ends a transaction according to the result of the work done in it: commits if the work
/// succeeded, or rolls back before returning the work's error.
///
/// Either way, the connection goes back to the pool once the transaction is consumed.
///
/// # Errors
///
/// Returns the work's error, or an error committing the transaction.
pub(crate) async fn finish<T, E>(
    tx: Transaction<'static, Postgres>,
    result: Result<T, E>,
) -> Result<T, E>
where
    E: From<sqlx::Error>,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                // A connection whose rollback fails is closed rather than reused, so the work's
                // error is still the one to report.
                tracing::warn!(%rollback_error, "failed to roll back transaction");
            }

            Err(error)
        }
    }
}
