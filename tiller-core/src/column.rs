use crate::{Codec, Expr, Table, Value};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
};

/// One hop of a nested property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedStep {
    /// Property of the current entity holding the nested one.
    pub property: &'static str,
    /// Entity type of the nested object.
    pub entity: &'static str,
}

/// Which entity property a column feeds.
#[derive(Clone, Copy)]
pub enum Binding {
    /// Scalar property of the entity itself.
    Property(&'static str),
    /// Scalar property reached through nested entities, `manager.id` is
    /// `path: [manager]`, `property: "id"`.
    Nested {
        path: &'static [NestedStep],
        property: &'static str,
    },
    /// Foreign key to the primary key of another table, materialized as a
    /// nested entity stored in `property`.
    Reference {
        property: &'static str,
        table: fn() -> Table,
    },
}

impl Binding {
    /// Property of the entity the binding starts from.
    pub fn root(&self) -> &'static str {
        match self {
            Binding::Property(p) => p,
            Binding::Nested { path, property } => path.first().map_or(*property, |s| s.property),
            Binding::Reference { property, .. } => property,
        }
    }
    /// Dotted property path, used in diagnostics.
    pub fn path(&self) -> String {
        match self {
            Binding::Property(p) => (*p).into(),
            Binding::Nested { path, property } => path
                .iter()
                .map(|s| s.property)
                .chain([*property])
                .collect::<Vec<_>>()
                .join("."),
            Binding::Reference { property, .. } => (*property).into(),
        }
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Property(..) | Binding::Nested { .. } => write!(f, "{}", self.path()),
            Binding::Reference { property, table } => {
                write!(f, "{} -> {}", property, table().name())
            }
        }
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Binding::Property(l), Binding::Property(r)) => l == r,
            (
                Binding::Nested {
                    path: lp,
                    property: l,
                },
                Binding::Nested {
                    path: rp,
                    property: r,
                },
            ) => lp == rp && l == r,
            (Binding::Reference { property: l, .. }, Binding::Reference { property: r, .. }) => {
                l == r
            }
            _ => false,
        }
    }
}

/// Static description of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Cow<'static, str>,
    pub codec: Codec,
    pub primary_key: bool,
    pub binding: Option<Binding>,
}

impl ColumnDef {
    pub fn new(name: impl Into<Cow<'static, str>>, codec: Codec) -> Self {
        Self {
            name: name.into(),
            codec,
            primary_key: false,
            binding: None,
        }
    }
}

/// A column seen through one specific, possibly aliased, table.
#[derive(Clone, PartialEq)]
pub struct Column {
    table: Table,
    index: usize,
}

impl Column {
    pub(crate) fn new(table: Table, index: usize) -> Self {
        Self { table, index }
    }
    pub fn table(&self) -> &Table {
        &self.table
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn def(&self) -> &ColumnDef {
        &self.table.columns()[self.index]
    }
    pub fn name(&self) -> &str {
        &self.def().name
    }
    pub fn codec(&self) -> &Codec {
        &self.def().codec
    }
    pub fn value_type(&self) -> Value {
        self.codec().value_type()
    }
    pub fn is_primary_key(&self) -> bool {
        self.def().primary_key
    }
    pub fn binding(&self) -> Option<&Binding> {
        self.def().binding.as_ref()
    }
    /// Label of the column in a select list, `{alias or table name}_{column}`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.table.label_prefix(), self.name())
    }
    pub fn expr(&self) -> Expr {
        Expr::Column(self.clone())
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table.label_prefix(), self.name())
    }
}
