use crate::{Binding, Codec, CodecRegistry, Column, ColumnDef, Error, NestedStep, Result, Value};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

#[derive(Debug)]
struct TableDef {
    name: Cow<'static, str>,
    catalog: Option<Cow<'static, str>>,
    schema: Option<Cow<'static, str>>,
    entity: Option<&'static str>,
    columns: Vec<ColumnDef>,
}

/// Immutable table descriptor.
///
/// Cloning is cheap, the definition is shared. [`Table::aliased`] returns a
/// new descriptor over the same definition, the original keeps its alias.
#[derive(Clone)]
pub struct Table {
    def: Arc<TableDef>,
    alias: Option<Cow<'static, str>>,
}

impl Table {
    pub fn builder(name: impl Into<Cow<'static, str>>) -> TableBuilder {
        TableBuilder::new(name)
    }
    pub fn name(&self) -> &str {
        &self.def.name
    }
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
    pub fn catalog(&self) -> Option<&str> {
        self.def.catalog.as_deref()
    }
    pub fn schema(&self) -> Option<&str> {
        self.def.schema.as_deref()
    }
    /// Entity type materialized from this table, the table name when none was declared.
    pub fn entity(&self) -> &str {
        match self.def.entity {
            Some(entity) => entity,
            None => &self.def.name,
        }
    }
    pub fn columns(&self) -> &[ColumnDef] {
        &self.def.columns
    }
    /// Name the table is referred to by inside a query.
    pub fn label_prefix(&self) -> &str {
        self.alias().unwrap_or(self.name())
    }
    pub fn aliased(&self, alias: impl Into<Cow<'static, str>>) -> Table {
        Table {
            def: self.def.clone(),
            alias: Some(alias.into()),
        }
    }
    /// Same definition, without alias.
    pub fn unaliased(&self) -> Table {
        Table {
            def: self.def.clone(),
            alias: None,
        }
    }
    /// Whether both descriptors describe the same table, ignoring aliases.
    pub fn same_definition(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
            || (self.def.name == other.def.name
                && self.def.schema == other.def.schema
                && self.def.catalog == other.def.catalog)
    }
    pub fn column(&self, name: &str) -> Result<Column> {
        self.def
            .columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| Column::new(self.clone(), i))
            .ok_or_else(|| {
                Error::msg(format!(
                    "Table `{}` has no column named `{}`",
                    self.name(),
                    name
                ))
            })
    }
    pub fn all_columns(&self) -> impl Iterator<Item = Column> + '_ {
        (0..self.def.columns.len()).map(|i| Column::new(self.clone(), i))
    }
    pub fn primary_keys(&self) -> Vec<Column> {
        self.all_columns().filter(|c| c.is_primary_key()).collect()
    }
    /// The only primary key column, references point at it.
    pub fn primary_key(&self) -> Result<Column> {
        let mut keys = self.primary_keys();
        if keys.len() != 1 {
            return Err(Error::msg(format!(
                "Table `{}` must declare exactly one primary key column, found {}",
                self.name(),
                keys.len()
            )));
        }
        Ok(keys.remove(0))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.alias == other.alias
    }
}

impl Debug for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Table");
        s.field("name", &self.def.name);
        if let Some(alias) = &self.alias {
            s.field("alias", alias);
        }
        s.field("columns", &self.def.columns).finish()
    }
}

/// Fluent construction of a [`Table`]. Column modifiers apply to the last
/// declared column.
///
/// ```rust
/// use tiller_core::{Table, Value};
/// let departments = Table::builder("t_department")
///     .entity("Department")
///     .column("id", Value::Int32(None))
///     .primary_key()
///     .bind_to("id")
///     .column("name", Value::Varchar(None))
///     .bind_to("name")
///     .build()
///     .unwrap();
/// assert_eq!(departments.primary_key().unwrap().name(), "id");
/// ```
pub struct TableBuilder {
    def: TableDef,
    alias: Option<Cow<'static, str>>,
    registry: CodecRegistry,
    error: Option<Error>,
}

impl TableBuilder {
    fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            def: TableDef {
                name: name.into(),
                catalog: None,
                schema: None,
                entity: None,
                columns: Vec::new(),
            },
            alias: None,
            registry: CodecRegistry::standard().clone(),
            error: None,
        }
    }
    pub fn catalog(mut self, catalog: impl Into<Cow<'static, str>>) -> Self {
        self.def.catalog = Some(catalog.into());
        self
    }
    pub fn schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.def.schema = Some(schema.into());
        self
    }
    pub fn alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = Some(alias.into());
        self
    }
    pub fn entity(mut self, entity: &'static str) -> Self {
        self.def.entity = Some(entity);
        self
    }
    /// Registry used to resolve the codecs of the columns declared afterwards.
    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }
    pub fn column(mut self, name: impl Into<Cow<'static, str>>, value_type: Value) -> Self {
        let name = name.into();
        match self.registry.resolve(&value_type) {
            Ok(codec) => self.def.columns.push(ColumnDef::new(name, codec)),
            Err(e) => {
                let e = e.context(format!("While declaring column `{}`", name));
                self.error.get_or_insert(e);
            }
        }
        self
    }
    fn last<F: FnOnce(&mut ColumnDef)>(mut self, modifier: &str, f: F) -> Self {
        match self.def.columns.last_mut() {
            Some(column) => f(column),
            None => {
                self.error.get_or_insert(Error::msg(format!(
                    "`{}` must follow a column declaration in table `{}`",
                    modifier, self.def.name
                )));
            }
        }
        self
    }
    pub fn codec(self, codec: Codec) -> Self {
        self.last("codec", |c| c.codec = codec)
    }
    pub fn primary_key(self) -> Self {
        self.last("primary_key", |c| c.primary_key = true)
    }
    pub fn bind_to(self, property: &'static str) -> Self {
        self.last("bind_to", |c| c.binding = Some(Binding::Property(property)))
    }
    pub fn bind_nested(self, path: &'static [NestedStep], property: &'static str) -> Self {
        self.last("bind_nested", |c| {
            c.binding = Some(Binding::Nested { path, property })
        })
    }
    pub fn references(self, property: &'static str, table: fn() -> Table) -> Self {
        self.last("references", |c| {
            c.binding = Some(Binding::Reference { property, table })
        })
    }
    pub fn build(self) -> Result<Table> {
        if let Some(error) = self.error {
            return Err(error);
        }
        for (i, column) in self.def.columns.iter().enumerate() {
            if self.def.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::msg(format!(
                    "Column `{}` is declared twice in table `{}`",
                    column.name, self.def.name
                )));
            }
        }
        Ok(Table {
            def: Arc::new(self.def),
            alias: self.alias,
        })
    }
}

/// A `LEFT JOIN` pulling the entity referenced by a foreign key.
#[derive(Debug, Clone)]
pub struct ReferenceJoin {
    /// Foreign key column, seen through the referencing table.
    pub column: Column,
    /// Referenced table, aliased `_ref{n}`.
    pub table: Table,
    pub children: Vec<ReferenceJoin>,
}

/// Depth first plan of the reference joins reachable from `table`.
///
/// Aliases are assigned in visiting order, a table already on the current
/// path is not joined again.
pub fn reference_joins(table: &Table) -> Result<Vec<ReferenceJoin>> {
    let mut counter = 0;
    let mut path = vec![table.clone()];
    reference_joins_of(table, &mut path, &mut counter)
}

fn reference_joins_of(
    table: &Table,
    path: &mut Vec<Table>,
    counter: &mut usize,
) -> Result<Vec<ReferenceJoin>> {
    let mut result = Vec::new();
    for column in table.all_columns() {
        let Some(Binding::Reference { table: target, .. }) = column.binding() else {
            continue;
        };
        let target = target();
        if path.iter().any(|t| t.same_definition(&target)) {
            continue;
        }
        target.primary_key()?;
        let target = target.aliased(format!("_ref{}", counter));
        *counter += 1;
        path.push(target.clone());
        let children = reference_joins_of(&target, path, counter)?;
        path.pop();
        result.push(ReferenceJoin {
            column,
            table: target,
            children,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departments() -> Table {
        Table::builder("t_department")
            .column("id", Value::Int32(None))
            .primary_key()
            .bind_to("id")
            .build()
            .unwrap()
    }

    #[test]
    fn modifier_without_column_fails() {
        assert!(Table::builder("t").primary_key().build().is_err());
        assert!(
            Table::builder("t")
                .column("a", Value::Int32(None))
                .column("a", Value::Int64(None))
                .build()
                .is_err()
        );
    }

    #[test]
    fn reference_plan_assigns_aliases_in_order() {
        let employees = Table::builder("t_employee")
            .column("id", Value::Int32(None))
            .primary_key()
            .column("department_id", Value::Int32(None))
            .references("department", departments)
            .column("backup_department_id", Value::Int32(None))
            .references("backup", departments)
            .build()
            .unwrap();
        let joins = reference_joins(&employees).unwrap();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].table.alias(), Some("_ref0"));
        assert_eq!(joins[1].table.alias(), Some("_ref1"));
        assert_eq!(joins[1].column.name(), "backup_department_id");
    }
}
