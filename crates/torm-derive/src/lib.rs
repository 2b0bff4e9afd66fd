//! Derive macros for torm
//!
//! Provides `#[derive(Record)]` and `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod from_row;
mod record;

/// Derive `FromRow` trait for a struct.
///
/// On a record (a struct carrying `#[orm(table = "...")]`) only fields tagged
/// with `#[orm(column ...)]` are read, and columns missing from the row give
/// `Default::default()`, so partial selects still map. Any other struct reads
/// every field, by field name or `#[orm(column = "...")]`.
///
/// # Example
///
/// ```ignore
/// use torm::FromRow;
///
/// #[derive(FromRow)]
/// struct Count {
///     #[orm(column = "n")]
///     total: i64,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` for a struct.
///
/// # Example
///
/// ```ignore
/// use chrono::{DateTime, Utc};
/// use torm::{FromRow, Record};
///
/// #[derive(Default, FromRow, Record)]
/// #[orm(table = "test")]
/// struct TestRecord {
///     #[orm(column = "id", auto_increment)]
///     id: i64,
///     #[orm(column = "foo")]
///     foo: i32,
///     bar: i32,
///     #[orm(column = "created_at", auto_create_time)]
///     created_at: DateTime<Utc>,
///     #[orm(column = "updated_at", auto_update_time)]
///     updated_at: DateTime<Utc>,
/// }
/// ```
///
/// # Generated
///
/// - `Record` (table name, field descriptors, timestamp setter)
/// - `NamedSource` resolving `:column` to the field value
/// - `Destination` for single-row selects
/// - an `inventory` registration picked up by `Registry::from_inventory`
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (required)
/// - `#[orm(column)]` / `#[orm(column = "name")]` - Persist the field; untagged fields are ignored
/// - `auto_increment` - Left out of default INSERT field lists
/// - `auto_create_time` - Stamped on insert
/// - `auto_update_time` - Stamped on insert and update
///
/// Auto-time fields are stamped when their type is `DateTime<Utc>`,
/// `NaiveDateTime`, or an `Option` of either; other types are left alone.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
