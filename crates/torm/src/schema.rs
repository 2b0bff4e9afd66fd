//! Record capability: declared column metadata and value access.
//!
//! A record is a struct whose persisted fields carry a column name and an
//! optional behavior. The descriptor is produced at compile time by
//! `#[derive(Record)]`, so no runtime reflection is involved.
//!
//! ```ignore
//! use chrono::{DateTime, Utc};
//! use torm::{FromRow, Record};
//!
//! #[derive(Debug, Default, FromRow, Record)]
//! #[orm(table = "test")]
//! struct TestRecord {
//!     #[orm(column = "id", auto_increment)]
//!     id: i64,
//!     #[orm(column = "foo")]
//!     foo: i32,
//!     // not persisted
//!     bar: i32,
//!     #[orm(column = "created_at", auto_create_time)]
//!     created_at: DateTime<Utc>,
//!     #[orm(column = "updated_at", auto_update_time)]
//!     updated_at: DateTime<Utc>,
//! }
//! ```

use crate::row::FromRow;
use chrono::{DateTime, Utc};
use tokio_postgres::types::ToSql;

/// How a persisted column is treated during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Ordinary column.
    Plain,
    /// Generated by the database; left out of default INSERT field lists.
    AutoIncrement,
    /// Stamped at insert time only.
    AutoCreateTime,
    /// Stamped at insert and update time.
    AutoUpdateTime,
}

/// A persisted field: its Rust name, its column and its behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub field: &'static str,
    pub column: &'static str,
    pub behavior: Behavior,
}

impl FieldDef {
    pub const fn new(field: &'static str, column: &'static str, behavior: Behavior) -> Self {
        Self {
            field,
            column,
            behavior,
        }
    }

    pub const fn plain(field: &'static str, column: &'static str) -> Self {
        Self::new(field, column, Behavior::Plain)
    }
}

/// A value resolved for a named parameter.
pub enum Binding<'a> {
    /// A single value bound to one placeholder.
    One(&'a (dyn ToSql + Sync)),
    /// A collection expanded into one placeholder per element (`IN (...)`).
    List(Vec<&'a (dyn ToSql + Sync)>),
}

impl std::fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::One(v) => f.debug_tuple("One").field(v).finish(),
            Binding::List(vs) => f.debug_tuple("List").field(vs).finish(),
        }
    }
}

/// Anything that can answer `:name` lookups.
pub trait NamedSource {
    fn binding(&self, name: &str) -> Option<Binding<'_>>;
}

/// A persistable record type.
///
/// Usually derived with `#[derive(Record)]`; a hand-written implementation
/// only has to list its fields and expose their values by column name.
pub trait Record: FromRow + NamedSource + Send + Sync {
    /// Stable table identifier used as the registry key.
    fn table_name() -> &'static str;

    /// Persisted fields in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Write `at` into the field backing `column`.
    ///
    /// Returns `false` when the column has no settable time-like field, in
    /// which case the stamp is skipped.
    fn set_timestamp(&mut self, column: &str, at: DateTime<Utc>) -> bool {
        let _ = (column, at);
        false
    }
}

/// Target of a `SELECT`: a single record or a `Vec` of records.
///
/// Derived records implement this for themselves (single-row fetch);
/// `Vec<R>` is the multi-row form. Any other destination does not compile:
///
/// ```compile_fail
/// # async fn run(client: &tokio_postgres::Client) -> torm::OrmResult<()> {
/// let orm = torm::Orm::new(client);
/// orm.select(&[]).query(&mut 5_i32).await?;
/// # Ok(())
/// # }
/// ```
///
/// ```compile_fail
/// # async fn run(client: &tokio_postgres::Client) -> torm::OrmResult<()> {
/// let orm = torm::Orm::new(client);
/// orm.select(&[]).query(&mut vec![5_i32]).await?;
/// # Ok(())
/// # }
/// ```
pub trait Destination: Send {
    /// Record type whose table metadata drives the statement.
    type Record: Record;

    /// Whether the destination takes every row or exactly one.
    const MANY: bool;

    /// Move fetched records into the destination.
    fn store(&mut self, records: Vec<Self::Record>);
}

impl<R: Record> Destination for Vec<R> {
    type Record = R;
    const MANY: bool = true;

    fn store(&mut self, records: Vec<R>) {
        *self = records;
    }
}
