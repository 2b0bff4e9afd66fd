//! Raw statement execution on top of [`GenericClient`].
//!
//! [`Handler`] is implemented for every client. It maps rows through
//! [`FromRow`] and runs named-parameter statements outside the builders.

use crate::bind::{self, NamedQuery};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::FromRow;
use crate::schema::{Binding, NamedSource};
use tokio_postgres::Statement;
use tokio_postgres::types::ToSql;

/// Row-mapping and named-statement helpers for any [`GenericClient`].
pub trait Handler: GenericClient {
    /// Run a query and map its first row. No rows is [`OrmError::NotFound`].
    fn fetch_one<R>(
        &self,
        sql: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<R>> + Send
    where
        R: FromRow + Send;

    /// Run a query and map every row.
    fn fetch_many<R>(
        &self,
        sql: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Vec<R>>> + Send
    where
        R: FromRow + Send;

    /// Execute a statement and return the number of affected rows.
    fn exec(
        &self,
        sql: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Bind `:name` placeholders from `source` and execute.
    fn exec_named<S>(
        &self,
        query: &str,
        source: &S,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send
    where
        S: NamedSource + Sync + ?Sized;

    /// Prepare a named query once for repeated execution on this connection.
    fn prepare_named(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = OrmResult<NamedStatement>> + Send;
}

impl<C: GenericClient> Handler for C {
    async fn fetch_one<R>(&self, sql: &str, args: &[&(dyn ToSql + Sync)]) -> OrmResult<R>
    where
        R: FromRow + Send,
    {
        let row = self.query_one(sql, args).await?;
        R::from_row(&row)
    }

    async fn fetch_many<R>(&self, sql: &str, args: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<R>>
    where
        R: FromRow + Send,
    {
        let rows = self.query(sql, args).await?;
        rows.iter().map(R::from_row).collect()
    }

    async fn exec(&self, sql: &str, args: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.execute(sql, args).await
    }

    async fn exec_named<S>(&self, query: &str, source: &S) -> OrmResult<u64>
    where
        S: NamedSource + Sync + ?Sized,
    {
        let sql = bind::bind(query, source, |q| self.rebind(q))?;
        self.execute(&sql.query, &sql.args).await
    }

    async fn prepare_named(&self, query: &str) -> OrmResult<NamedStatement> {
        let named = NamedQuery::parse(query);
        let names: Vec<String> = named.names().map(str::to_string).collect();
        let sql = self.rebind(&named.to_normalized());
        let statement = self.prepare_statement(&sql).await?;
        tracing::debug!(
            target: "torm.sql",
            sql = %sql,
            params = names.len(),
            "prepared named statement"
        );
        Ok(NamedStatement {
            statement,
            names,
            sql,
        })
    }
}

/// A prepared statement whose parameters are resolved by name on each call.
///
/// Prepared statements are per-connection: use it only with the client that prepared it.
/// Placeholders are fixed at prepare time, so list bindings are rejected.
#[derive(Debug, Clone)]
pub struct NamedStatement {
    statement: Statement,
    names: Vec<String>,
    sql: String,
}

impl NamedStatement {
    /// SQL text sent to the server.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in positional order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn args<'s, S>(&self, source: &'s S) -> OrmResult<Vec<&'s (dyn ToSql + Sync)>>
    where
        S: NamedSource + ?Sized,
    {
        self.names
            .iter()
            .map(|name| match source.binding(name) {
                Some(Binding::One(v)) => Ok(v),
                Some(Binding::List(_)) => Err(OrmError::bind(format!(
                    "list bound to `{name}` cannot be used with a prepared statement"
                ))),
                None => Err(OrmError::bind(format!(
                    "could not find name `{name}` in source"
                ))),
            })
            .collect()
    }

    pub async fn exec<C, S>(&self, client: &C, source: &S) -> OrmResult<u64>
    where
        C: GenericClient,
        S: NamedSource + Sync + ?Sized,
    {
        let args = self.args(source)?;
        client.execute_prepared(&self.statement, &args).await
    }

    pub async fn fetch_many<R, C, S>(&self, client: &C, source: &S) -> OrmResult<Vec<R>>
    where
        R: FromRow,
        C: GenericClient,
        S: NamedSource + Sync + ?Sized,
    {
        let args = self.args(source)?;
        let rows = client.query_prepared(&self.statement, &args).await?;
        rows.iter().map(R::from_row).collect()
    }
}
