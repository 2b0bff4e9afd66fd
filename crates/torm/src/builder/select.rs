use super::{Orm, owned};
use crate::bind::{self, Params, Sql};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::schema::{Destination, Record};

/// SELECT builder.
///
/// The table comes from the destination type: a record fetches exactly one
/// row (none is [`crate::OrmError::NotFound`]), a `Vec` of records fetches all.
pub struct SelectBuilder<'c, C> {
    orm: Orm<'c, C>,
    fields: Vec<String>,
    clause: String,
    params: Params,
}

impl<'c, C: GenericClient> SelectBuilder<'c, C> {
    pub(crate) fn new(orm: Orm<'c, C>, fields: &[&str]) -> Self {
        Self {
            orm,
            fields: owned(fields),
            clause: String::new(),
            params: Params::new(),
        }
    }

    /// Raw WHERE clause with its named parameters.
    ///
    /// A parameter bound with [`Params::bind_list`] expands to one placeholder
    /// per element, so `id IN (:ids)` works with any list length above zero.
    pub fn filter(mut self, clause: impl Into<String>, params: Params) -> Self {
        self.clause = clause.into();
        self.params = params;
        self
    }

    /// Assemble the statement for destination `D`.
    pub fn to_sql<D: Destination>(&self) -> OrmResult<Sql<'_>> {
        self.sql_for::<D::Record>()
    }

    fn sql_for<R: Record>(&self) -> OrmResult<Sql<'_>> {
        let meta = self.orm.meta::<R>()?;

        let columns = match self.fields.as_slice() {
            [] => meta.columns().join(", "),
            [star] if star == "*" => "*".to_string(),
            fields => ident::check_columns(fields)?.join(", "),
        };

        let mut query = format!("SELECT {} FROM {}", columns, meta.table_name());
        if self.clause.trim().is_empty() {
            return Ok(Sql {
                query,
                args: Vec::new(),
            });
        }

        query.push_str(" WHERE ");
        query.push_str(&self.clause);
        bind::bind(&query, &self.params, |q| self.orm.client().rebind(q))
    }

    /// Fill `dest` with the result.
    pub async fn query<D: Destination>(&self, dest: &mut D) -> OrmResult<()> {
        let sql = self.to_sql::<D>()?;
        let records = self.orm.fetch::<D::Record>(&sql, D::MANY).await?;
        dest.store(records);
        Ok(())
    }

    pub async fn fetch_all<R: Record>(&self) -> OrmResult<Vec<R>> {
        let sql = self.sql_for::<R>()?;
        self.orm.fetch(&sql, true).await
    }

    pub async fn fetch_one<R: Record>(&self) -> OrmResult<R> {
        let sql = self.sql_for::<R>()?;
        self.orm
            .fetch::<R>(&sql, false)
            .await?
            .pop()
            .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
    }
}
