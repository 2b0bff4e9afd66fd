//! Statement builders.
//!
//! [`Orm`] binds a client, a registry and settings together and hands out one
//! builder per statement:
//!
//! ```ignore
//! let orm = Orm::new(&client);
//!
//! orm.insert(&[]).exec(&mut record).await?;
//! orm.update(&["foo"]).filter("id = :id").exec(&mut record).await?;
//! orm.delete().filter("id = :id").exec(&record).await?;
//!
//! let rows: Vec<TestRecord> = orm
//!     .select(&["*"])
//!     .filter("foo IN (:foo)", Params::new().bind_list("foo", vec![1, 2]))
//!     .fetch_all()
//!     .await?;
//! ```
//!
//! Insert and update statements are assembled in named form first
//! (`VALUES (:foo, ...)`), then bound against the record and rebound to
//! positional placeholders right before execution.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::bind::Sql;
use crate::client::GenericClient;
use crate::config::OrmConfig;
use crate::error::{OrmError, OrmResult};
use crate::hook::{AuditHook, StatementKind, TracingHook};
use crate::registry::{Registry, TableMeta};
use crate::schema::Record;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Entry point for building statements against one client.
pub struct Orm<'c, C> {
    client: &'c C,
    registry: &'c Registry,
    config: OrmConfig,
    hook: Option<Arc<dyn AuditHook>>,
}

impl<C> Clone for Orm<'_, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            registry: self.registry,
            config: self.config.clone(),
            hook: self.hook.clone(),
        }
    }
}

impl<'c, C: GenericClient> Orm<'c, C> {
    /// Build statements with the process-wide registry.
    pub fn new(client: &'c C) -> Self {
        Self::with_registry(client, Registry::global())
    }

    pub fn with_registry(client: &'c C, registry: &'c Registry) -> Self {
        Self {
            client,
            registry,
            config: OrmConfig::default(),
            hook: None,
        }
    }

    pub fn with_config(mut self, config: OrmConfig) -> Self {
        self.config = config;
        self
    }

    /// Stamp auto-time columns with `at` instead of the current time.
    pub fn set_time(mut self, at: DateTime<Utc>) -> Self {
        self.config.fixed_time = Some(at);
        self
    }

    /// Replace the default tracing hook.
    pub fn with_hook(mut self, hook: Arc<dyn AuditHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn client(&self) -> &'c C {
        self.client
    }

    pub fn registry(&self) -> &'c Registry {
        self.registry
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    /// SELECT the given columns; `&[]` selects every column, `&["*"]` emits `SELECT *`.
    pub fn select(&self, fields: &[&str]) -> SelectBuilder<'c, C> {
        SelectBuilder::new(self.clone(), fields)
    }

    /// INSERT the given columns; `&[]` inserts every column except auto-increment ones.
    pub fn insert(&self, fields: &[&str]) -> InsertBuilder<'c, C> {
        InsertBuilder::new(self.clone(), fields)
    }

    /// UPDATE the given columns; `&[]` updates every column that is neither
    /// auto-increment nor auto-create-time.
    pub fn update(&self, fields: &[&str]) -> UpdateBuilder<'c, C> {
        UpdateBuilder::new(self.clone(), fields)
    }

    pub fn delete(&self) -> DeleteBuilder<'c, C> {
        DeleteBuilder::new(self.clone())
    }

    pub(crate) fn meta<R: Record>(&self) -> OrmResult<&'c TableMeta> {
        self.registry.meta_of::<R>()
    }

    fn audit(&self, kind: StatementKind, sql: &Sql<'_>) {
        match &self.hook {
            Some(hook) => hook.on_statement(kind, &sql.query, &sql.args),
            None => TracingHook::from_verbosity(self.config.verbosity).on_statement(
                kind,
                &sql.query,
                &sql.args,
            ),
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: std::future::Future<Output = OrmResult<T>>,
    {
        match self.config.statement_timeout() {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => Err(OrmError::Timeout(timeout)),
                }
            }
            None => future.await,
        }
    }

    pub(crate) async fn execute(&self, kind: StatementKind, sql: &Sql<'_>) -> OrmResult<u64> {
        self.audit(kind, sql);
        self.with_timeout(self.client.execute(&sql.query, &sql.args))
            .await
    }

    pub(crate) async fn fetch<R: Record>(&self, sql: &Sql<'_>, many: bool) -> OrmResult<Vec<R>> {
        self.audit(StatementKind::Select, sql);
        if many {
            let rows = self
                .with_timeout(self.client.query(&sql.query, &sql.args))
                .await?;
            rows.iter().map(R::from_row).collect()
        } else {
            let row = self
                .with_timeout(self.client.query_one(&sql.query, &sql.args))
                .await?;
            Ok(vec![R::from_row(&row)?])
        }
    }
}

/// Timestamps assembly decided to write into a record.
///
/// Every listed column receives the same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamps {
    pub at: DateTime<Utc>,
    pub columns: Vec<String>,
}

impl Stamps {
    /// Write the stamps into `record`, returning how many fields were set.
    ///
    /// Columns without a settable time-like field are skipped.
    pub fn apply<R: Record>(&self, record: &mut R) -> usize {
        self.columns
            .iter()
            .filter(|column| record.set_timestamp(column, self.at))
            .count()
    }
}

/// A named-form statement plus the timestamps it expects in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub query: String,
    pub stamps: Stamps,
}

fn placeholders<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns
        .into_iter()
        .map(|c| format!(":{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
