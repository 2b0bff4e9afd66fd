use super::{Assembled, Orm, Stamps, owned};
use crate::bind::{self, Sql};
use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::hook::StatementKind;
use crate::ident;
use crate::registry::TableMeta;
use crate::schema::Record;

/// UPDATE builder.
///
/// Auto-create-time columns are never written. With no explicit fields every
/// other non-auto-increment column is updated, so partial updates need an
/// explicit field list. Without [`UpdateBuilder::filter`] the statement
/// updates the whole table.
pub struct UpdateBuilder<'c, C> {
    orm: Orm<'c, C>,
    fields: Vec<String>,
    clause: String,
}

impl<'c, C: GenericClient> UpdateBuilder<'c, C> {
    pub(crate) fn new(orm: Orm<'c, C>, fields: &[&str]) -> Self {
        Self {
            orm,
            fields: owned(fields),
            clause: String::new(),
        }
    }

    /// Raw WHERE clause; named parameters resolve from the record (`id = :id`).
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.clause = clause.into();
        self
    }

    pub fn assemble<R: Record>(&self) -> OrmResult<Assembled> {
        let meta = self.orm.meta::<R>()?;
        let explicit = ident::check_plain_columns(&self.fields)?;
        let (columns, stamped) = update_columns(meta, explicit);

        let set = columns
            .iter()
            .map(|c| format!("{c} = :{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut query = format!("UPDATE {} SET {}", meta.table_name(), set);
        if !self.clause.trim().is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.clause);
        }

        Ok(Assembled {
            query,
            stamps: Stamps {
                at: self.orm.config().now(),
                columns: stamped,
            },
        })
    }

    pub fn to_sql<'r, R: Record>(&self, record: &'r mut R) -> OrmResult<Sql<'r>> {
        let assembled = self.assemble::<R>()?;
        assembled.stamps.apply(record);
        let record: &'r R = record;
        bind::bind(&assembled.query, record, |q| self.orm.client().rebind(q))
    }

    pub async fn exec<R: Record>(&self, record: &mut R) -> OrmResult<u64> {
        let sql = self.to_sql(record)?;
        self.orm.execute(StatementKind::Update, &sql).await
    }
}

fn update_columns(meta: &TableMeta, explicit: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut columns: Vec<String> = if explicit.is_empty() {
        meta.columns()
            .iter()
            .filter(|c| !meta.is_auto_increment(c) && !meta.is_auto_create_time(c))
            .cloned()
            .collect()
    } else {
        explicit
            .iter()
            .filter(|c| {
                let keep = !meta.is_auto_create_time(c);
                if !keep {
                    tracing::debug!(
                        target: "torm.sql",
                        table = meta.table_name(),
                        column = c.as_str(),
                        "dropping auto-create-time column from UPDATE"
                    );
                }
                keep
            })
            .cloned()
            .collect()
    };

    let mut stamped = Vec::new();
    for column in meta.auto_update_time_columns() {
        if explicit.iter().any(|c| c == column) {
            continue;
        }
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
        stamped.push(column.to_string());
    }

    (columns, stamped)
}
