use crate::error::{OrmError, OrmResult};
use crate::schema::{Behavior, FieldDef, Record};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Column metadata derived once per record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    table_name: String,
    /// All persisted columns, declaration order.
    columns: Vec<String>,
    auto_increment: Vec<String>,
    /// column -> field
    auto_create_time: Vec<(String, String)>,
    /// column -> field
    auto_update_time: Vec<(String, String)>,
}

impl TableMeta {
    /// Derive metadata from a field descriptor list.
    pub fn from_fields(table_name: impl Into<String>, fields: &[FieldDef]) -> Self {
        let mut builder = Self::builder(table_name);
        for f in fields {
            builder = builder.field(f.field, f.column, f.behavior);
        }
        builder.build()
    }

    /// Start a hand-written descriptor.
    pub fn builder(table_name: impl Into<String>) -> TableMetaBuilder {
        TableMetaBuilder {
            meta: TableMeta {
                table_name: table_name.into(),
                columns: Vec::new(),
                auto_increment: Vec::new(),
                auto_create_time: Vec::new(),
                auto_update_time: Vec::new(),
            },
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn auto_increment_columns(&self) -> impl Iterator<Item = &str> {
        self.auto_increment.iter().map(String::as_str)
    }

    pub fn auto_create_time_columns(&self) -> impl Iterator<Item = &str> {
        self.auto_create_time.iter().map(|(c, _)| c.as_str())
    }

    pub fn auto_update_time_columns(&self) -> impl Iterator<Item = &str> {
        self.auto_update_time.iter().map(|(c, _)| c.as_str())
    }

    /// Field backing an auto-timestamp column, if any.
    pub fn timestamp_field(&self, column: &str) -> Option<&str> {
        self.auto_create_time
            .iter()
            .chain(self.auto_update_time.iter())
            .find(|(c, _)| c == column)
            .map(|(_, f)| f.as_str())
    }

    pub fn is_auto_increment(&self, column: &str) -> bool {
        self.auto_increment.iter().any(|c| c == column)
    }

    pub fn is_auto_create_time(&self, column: &str) -> bool {
        self.auto_create_time.iter().any(|(c, _)| c == column)
    }

    pub fn is_auto_update_time(&self, column: &str) -> bool {
        self.auto_update_time.iter().any(|(c, _)| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Builder for a [`TableMeta`] written by hand instead of derived.
#[must_use]
pub struct TableMetaBuilder {
    meta: TableMeta,
}

impl TableMetaBuilder {
    /// Append a persisted column.
    pub fn field(mut self, field: &str, column: &str, behavior: Behavior) -> Self {
        let m = &mut self.meta;
        m.columns.push(column.to_string());
        match behavior {
            Behavior::Plain => {}
            Behavior::AutoIncrement => m.auto_increment.push(column.to_string()),
            Behavior::AutoCreateTime => m
                .auto_create_time
                .push((column.to_string(), field.to_string())),
            Behavior::AutoUpdateTime => m
                .auto_update_time
                .push((column.to_string(), field.to_string())),
        }
        self
    }

    pub fn column(self, column: &str) -> Self {
        self.field(column, column, Behavior::Plain)
    }

    pub fn auto_increment(self, column: &str) -> Self {
        self.field(column, column, Behavior::AutoIncrement)
    }

    pub fn auto_create_time(self, field: &str, column: &str) -> Self {
        self.field(field, column, Behavior::AutoCreateTime)
    }

    pub fn auto_update_time(self, field: &str, column: &str) -> Self {
        self.field(field, column, Behavior::AutoUpdateTime)
    }

    pub fn build(self) -> TableMeta {
        self.meta
    }
}

/// Registration entry used by `#[derive(Record)]` to collect records via `inventory`.
pub struct RecordRegistration {
    /// Function that registers a record type with a [`RegistryBuilder`].
    pub register_fn: fn(&mut RegistryBuilder),
}

inventory::collect!(RecordRegistration);

/// Mutable registration phase of a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tables: HashMap<String, TableMeta>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type. Registering the same table again overwrites it.
    pub fn register<R: Record>(&mut self) -> &mut Self {
        self.register_meta(TableMeta::from_fields(R::table_name(), R::fields()))
    }

    /// Register hand-written metadata.
    pub fn register_meta(&mut self, meta: TableMeta) -> &mut Self {
        tracing::debug!(
            target: "torm.registry",
            table = %meta.table_name,
            columns = meta.columns.len(),
            "registered table"
        );
        self.tables.insert(meta.table_name.clone(), meta);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            tables: self.tables,
        }
    }
}

/// Read-only table metadata keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tables: HashMap<String, TableMeta>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();
static EMPTY: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry holding every record derived in the program.
    pub fn from_inventory() -> Self {
        let mut builder = RegistryBuilder::new();
        for reg in inventory::iter::<RecordRegistration> {
            (reg.register_fn)(&mut builder);
        }
        builder.build()
    }

    /// Look up the metadata for a table.
    pub fn lookup(&self, table_name: &str) -> OrmResult<&TableMeta> {
        self.tables
            .get(table_name)
            .ok_or_else(|| OrmError::UnregisteredTable(table_name.to_string()))
    }

    /// Look up the metadata for a record type.
    pub fn meta_of<R: Record>(&self) -> OrmResult<&TableMeta> {
        self.lookup(R::table_name())
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Make this registry the process-wide one. Can only happen once.
    pub fn install(self) -> OrmResult<&'static Registry> {
        GLOBAL
            .set(self)
            .map_err(|_| OrmError::validation("process-wide registry is already installed"))?;
        Ok(Self::global())
    }

    /// The process-wide registry; empty until [`Registry::install`] is called.
    pub fn global() -> &'static Registry {
        GLOBAL
            .get()
            .unwrap_or_else(|| EMPTY.get_or_init(Registry::default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta() -> TableMeta {
        TableMeta::builder("test")
            .auto_increment("id")
            .column("foo")
            .auto_create_time("created_at", "created_at")
            .auto_update_time("updated_at", "updated_at")
            .build()
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let meta = test_meta();
        assert_eq!(meta.columns(), ["id", "foo", "created_at", "updated_at"]);
        assert!(meta.is_auto_increment("id"));
        assert!(!meta.is_auto_increment("foo"));
        assert!(meta.is_auto_create_time("created_at"));
        assert!(meta.is_auto_update_time("updated_at"));
        assert_eq!(meta.timestamp_field("updated_at"), Some("updated_at"));
        assert_eq!(meta.timestamp_field("foo"), None);
    }

    #[test]
    fn lookup_unregistered_is_configuration_error() {
        let registry = Registry::builder().build();
        let err = registry.lookup("missing").unwrap_err();
        assert!(matches!(err, OrmError::UnregisteredTable(ref t) if t == "missing"));
        assert!(err.is_configuration());
    }

    #[test]
    fn reregistration_overwrites() {
        let mut builder = Registry::builder();
        builder.register_meta(test_meta());
        builder.register_meta(TableMeta::builder("test").column("only").build());
        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("test").unwrap().columns(), ["only"]);
    }

    #[test]
    fn from_fields_matches_builder() {
        const FIELDS: &[FieldDef] = &[
            FieldDef::new("id", "id", Behavior::AutoIncrement),
            FieldDef::plain("foo", "foo"),
            FieldDef::new("created_at", "created_at", Behavior::AutoCreateTime),
            FieldDef::new("updated_at", "updated_at", Behavior::AutoUpdateTime),
        ];
        assert_eq!(TableMeta::from_fields("test", FIELDS), test_meta());
    }
}
