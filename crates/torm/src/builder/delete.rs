use super::Orm;
use crate::bind::{self, Sql};
use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::hook::StatementKind;
use crate::schema::Record;

/// DELETE builder.
///
/// Named parameters in the clause resolve from the record passed to
/// [`DeleteBuilder::exec`]. An empty clause deletes every row.
pub struct DeleteBuilder<'c, C> {
    orm: Orm<'c, C>,
    clause: String,
}

impl<'c, C: GenericClient> DeleteBuilder<'c, C> {
    pub(crate) fn new(orm: Orm<'c, C>) -> Self {
        Self {
            orm,
            clause: String::new(),
        }
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.clause = clause.into();
        self
    }

    pub fn to_sql<'r, R: Record>(&self, record: &'r R) -> OrmResult<Sql<'r>> {
        let meta = self.orm.meta::<R>()?;
        let mut query = format!("DELETE FROM {}", meta.table_name());
        if !self.clause.trim().is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.clause);
        }
        bind::bind(&query, record, |q| self.orm.client().rebind(q))
    }

    pub async fn exec<R: Record>(&self, record: &R) -> OrmResult<u64> {
        let sql = self.to_sql(record)?;
        self.orm.execute(StatementKind::Delete, &sql).await
    }
}
