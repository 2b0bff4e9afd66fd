use super::{Assembled, Orm, Stamps, owned, placeholders};
use crate::bind::{self, Sql};
use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::hook::StatementKind;
use crate::ident;
use crate::registry::TableMeta;
use crate::schema::Record;

/// INSERT builder.
///
/// With no explicit fields the statement covers every column except
/// auto-increment ones. With explicit fields, auto-create-time and
/// auto-update-time columns the caller did not list are appended.
pub struct InsertBuilder<'c, C> {
    orm: Orm<'c, C>,
    fields: Vec<String>,
}

impl<'c, C: GenericClient> InsertBuilder<'c, C> {
    pub(crate) fn new(orm: Orm<'c, C>, fields: &[&str]) -> Self {
        Self {
            orm,
            fields: owned(fields),
        }
    }

    /// Build the named-form statement for `R` and the stamps it needs.
    pub fn assemble<R: Record>(&self) -> OrmResult<Assembled> {
        let meta = self.orm.meta::<R>()?;
        let explicit = ident::check_plain_columns(&self.fields)?;
        let (columns, stamped) = insert_columns(meta, explicit);

        let query = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            meta.table_name(),
            columns.join(", "),
            placeholders(columns.iter().map(String::as_str)),
        );

        Ok(Assembled {
            query,
            stamps: Stamps {
                at: self.orm.config().now(),
                columns: stamped,
            },
        })
    }

    /// Stamp `record`, then bind it and rebind to positional placeholders.
    pub fn to_sql<'r, R: Record>(&self, record: &'r mut R) -> OrmResult<Sql<'r>> {
        let assembled = self.assemble::<R>()?;
        assembled.stamps.apply(record);
        let record: &'r R = record;
        bind::bind(&assembled.query, record, |q| self.orm.client().rebind(q))
    }

    /// Insert `record`, returning the number of affected rows.
    pub async fn exec<R: Record>(&self, record: &mut R) -> OrmResult<u64> {
        let sql = self.to_sql(record)?;
        self.orm.execute(StatementKind::Insert, &sql).await
    }
}

/// Resolve the column list and the columns to stamp.
fn insert_columns(meta: &TableMeta, explicit: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut columns = if explicit.is_empty() {
        meta.columns()
            .iter()
            .filter(|c| !meta.is_auto_increment(c))
            .cloned()
            .collect()
    } else {
        explicit.clone()
    };

    let mut stamped = Vec::new();
    for column in meta
        .auto_create_time_columns()
        .chain(meta.auto_update_time_columns())
    {
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
