//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`.
/// A `SELECT` may return only a subset of a record's columns, so derived
/// implementations fall back to `Default` for columns the row lacks.
///
/// # Example
///
/// ```ignore
/// use torm::FromRow;
///
/// #[derive(Default, FromRow)]
/// struct User {
///     #[orm(column = "id")]
///     id: i64,
///     #[orm(column = "username")]
///     username: String,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning OrmError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Like [`RowExt::try_get_column`], but a column absent from the row yields `T::default()`.
    fn try_get_column_or_default<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a> + Default;

    /// Whether the result set carries `column`.
    fn has_column(&self, column: &str) -> bool;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }

    fn try_get_column_or_default<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a> + Default,
    {
        if self.has_column(column) {
            self.try_get_column(column)
        } else {
            Ok(T::default())
        }
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns().iter().any(|c| c.name() == column)
    }
}
