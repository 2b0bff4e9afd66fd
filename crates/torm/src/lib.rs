//! # torm
//!
//! A small tag-driven ORM helper for PostgreSQL.
//!
//! ## Features
//!
//! - **Declared schema**: `#[derive(Record)]` turns `#[orm(...)]` field tags into
//!   table metadata at compile time; no runtime reflection
//! - **Statement builders**: `select` / `insert` / `update` / `delete` with
//!   auto-increment and auto-timestamp handling
//! - **Named parameters**: `:name` placeholders, `IN (:list)` expansion and
//!   rebinding to `$n`, in one pass
//! - **Transactions**: commit on success, rollback on failure, and no error is
//!   lost when the rollback fails too
//! - **Auditing**: every statement is reported to a `tracing`-based hook
//!
//! ```ignore
//! use chrono::{DateTime, Utc};
//! use torm::{FromRow, Orm, Params, Record, Registry};
//!
//! #[derive(Debug, Default, FromRow, Record)]
//! #[orm(table = "test")]
//! struct TestRecord {
//!     #[orm(column = "id", auto_increment)]
//!     id: i64,
//!     #[orm(column = "foo")]
//!     foo: i32,
//!     #[orm(column = "created_at", auto_create_time)]
//!     created_at: DateTime<Utc>,
//!     #[orm(column = "updated_at", auto_update_time)]
//!     updated_at: DateTime<Utc>,
//! }
//!
//! Registry::from_inventory().install()?;
//! let orm = Orm::new(&client);
//!
//! let mut record = TestRecord { foo: 1, ..Default::default() };
//! orm.insert(&[]).exec(&mut record).await?;
//!
//! let rows: Vec<TestRecord> = orm
//!     .select(&[])
//!     .filter("foo IN (:foo)", Params::new().bind_list("foo", vec![1, 2, 3]))
//!     .fetch_all()
//!     .await?;
//! ```

extern crate self as torm;

pub mod bind;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod hook;
pub mod ident;
pub mod prelude;
pub mod registry;
pub mod row;
pub mod schema;
pub mod transaction;

pub use bind::{NamedQuery, Params, Sql};
pub use builder::{
    Assembled, DeleteBuilder, InsertBuilder, Orm, SelectBuilder, Stamps, UpdateBuilder,
};
pub use client::GenericClient;
pub use config::OrmConfig;
pub use error::{OrmError, OrmResult};
pub use handler::{Handler, NamedStatement};
pub use hook::{AuditHook, NoopHook, StatementKind, TracingHook, Verbosity};
pub use registry::{RecordRegistration, Registry, RegistryBuilder, TableMeta, TableMetaBuilder};
pub use row::{FromRow, RowExt};
pub use schema::{Behavior, Binding, Destination, FieldDef, NamedSource, Record};
pub use transaction::{
    Isolation, TransactionHandle, Transactional, TxOptions, transaction, transaction_with,
};

// Re-export inventory for use by derive macros
pub use inventory;

#[doc(hidden)]
pub mod __private {
    pub use chrono::{DateTime, Utc};
    pub use tokio_postgres::Row;
    pub use tokio_postgres::types::ToSql;
}

#[cfg(feature = "derive")]
pub use torm_derive::{FromRow, Record};
