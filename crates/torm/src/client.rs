//! The execution adapter the builders delegate I/O to.
//!
//! The core never opens connections. It receives a [`GenericClient`] already
//! bound to a connection or to an open transaction, and only ever calls the
//! methods below.

use crate::error::{OrmError, OrmResult};
use std::future::Future;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Row, Statement};

/// A connection or transaction that can run statements.
///
/// Only [`query`](GenericClient::query) and
/// [`execute`](GenericClient::execute) are required; single-row fetches are
/// derived from `query`, and prepared statements are opt-in.
pub trait GenericClient: Send + Sync {
    /// Run a query and return every row.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Run a query and return its first row; no rows is [`OrmError::NotFound`].
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Row>> + Send {
        async move {
            self.query_opt(sql, params)
                .await?
                .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
        }
    }

    /// Run a query and return its first row, if any. Extra rows are ignored.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Option<Row>>> + Send {
        async move { Ok(self.query(sql, params).await?.into_iter().next()) }
    }

    /// Translate the normalized `?` form into this backend's placeholders.
    fn rebind(&self, query: &str) -> String {
        crate::bind::rebind(query)
    }

    fn supports_prepared_statements(&self) -> bool {
        false
    }

    /// Prepare `sql` on this connection. Statements must not cross connections.
    fn prepare_statement(&self, sql: &str) -> impl Future<Output = OrmResult<Statement>> + Send {
        let _ = sql;
        async { Err(unsupported()) }
    }

    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        let _ = (stmt, params);
        async { Err(unsupported()) }
    }

    fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        let _ = (stmt, params);
        async { Err(unsupported()) }
    }
}

fn unsupported() -> OrmError {
    OrmError::Other("prepared statements are not supported by this client".to_string())
}

/// `tokio_postgres::Client` and `Transaction` expose the same inherent API.
macro_rules! impl_postgres_client {
    ($($ty:ty),+ $(,)?) => {$(
        impl GenericClient for $ty {
            async fn query(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> OrmResult<Vec<Row>> {
                <$ty>::query(self, sql, params)
                    .await
                    .map_err(OrmError::from_db_error)
            }

            async fn execute(
                &self,
                sql: &str,
                params: &[&(dyn ToSql + Sync)],
            ) -> OrmResult<u64> {
                <$ty>::execute(self, sql, params)
                    .await
                    .map_err(OrmError::from_db_error)
            }

            fn supports_prepared_statements(&self) -> bool {
                true
            }

            async fn prepare_statement(&self, sql: &str) -> OrmResult<Statement> {
                <$ty>::prepare(self, sql)
                    .await
                    .map_err(OrmError::from_db_error)
            }

            async fn query_prepared(
                &self,
                stmt: &Statement,
                params: &[&(dyn ToSql + Sync)],
            ) -> OrmResult<Vec<Row>> {
                <$ty>::query(self, stmt, params)
                    .await
                    .map_err(OrmError::from_db_error)
            }

            async fn execute_prepared(
                &self,
                stmt: &Statement,
                params: &[&(dyn ToSql + Sync)],
            ) -> OrmResult<u64> {
                <$ty>::execute(self, stmt, params)
                    .await
                    .map_err(OrmError::from_db_error)
            }
        }
    )+};
}

impl_postgres_client!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Row>> + Send {
        (**self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Option<Row>>> + Send {
        (**self).query_opt(sql, params)
    }

    fn rebind(&self, query: &str) -> String {
        (**self).rebind(query)
    }

    fn supports_prepared_statements(&self) -> bool {
        (**self).supports_prepared_statements()
    }

    fn prepare_statement(&self, sql: &str) -> impl Future<Output = OrmResult<Statement>> + Send {
        (**self).prepare_statement(sql)
    }

    fn query_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query_prepared(stmt, params)
    }

    fn execute_prepared(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        (**self).execute_prepared(stmt, params)
    }
}
