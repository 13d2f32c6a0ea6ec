use crate::{Column, Error, Expr, Operand, Result, Table, TillerError, Value, ValueKind, and_all};

/// `column = value`, the value is type checked against the column.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Column,
    pub value: Expr,
}

impl Assignment {
    pub fn new(column: &Column, value: impl Into<Operand>) -> Result<Self> {
        let target = column.expr();
        let value = value.into().lift(&target, "=")?;
        let (l, r) = (target.value_type(), value.value_type());
        if !l.is_compatible(&r) {
            return Err(TillerError::type_mismatch("=", &l, &r).into());
        }
        Ok(Self {
            column: column.clone(),
            value,
        })
    }
}

pub(crate) fn check_predicate(predicate: &Expr, clause: &str) -> Result<()> {
    let value_type = predicate.value_type();
    if !matches!(value_type.kind(), ValueKind::Boolean | ValueKind::Null) {
        return Err(TillerError::type_mismatch(clause, &Value::Boolean(None), &value_type).into());
    }
    Ok(())
}

/// `predicate` joined with `AND` to `current`, it must be boolean.
pub(crate) fn combine(current: Option<Expr>, predicate: Expr) -> Result<Option<Expr>> {
    check_predicate(&predicate, "WHERE")?;
    Ok(Some(match current {
        Some(current) => and_all([current, predicate])?,
        None => predicate,
    }))
}

pub(crate) fn check_target(table: &Table, assignments: &[Assignment]) -> Result<()> {
    if let Some(a) = assignments
        .iter()
        .find(|a| !a.column.table().same_definition(table))
    {
        return Err(Error::msg(format!(
            "Column `{}` does not belong to table `{}`",
            a.column.name(),
            table.name()
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: Table,
    pub assignments: Vec<Assignment>,
}

impl Insert {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Vec::new(),
        }
    }
    pub fn set(mut self, column: &Column, value: impl Into<Operand>) -> Result<Self> {
        self.assignments.push(Assignment::new(column, value)?);
        Ok(self)
    }
}

/// Conflict resolution of an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// Conflict target, the primary key when empty.
    pub columns: Vec<Column>,
    /// Assignments applied to the existing row, none means do nothing.
    pub updates: Vec<Assignment>,
    pub predicate: Option<Expr>,
}

impl OnConflict {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            updates: Vec::new(),
            predicate: None,
        }
    }
    pub fn update(mut self, column: &Column, value: impl Into<Operand>) -> Result<Self> {
        self.updates.push(Assignment::new(column, value)?);
        Ok(self)
    }
    /// Updates `column` to the value proposed by the conflicting row.
    pub fn update_excluded(self, column: &Column) -> Result<Self> {
        let excluded = column.excluded();
        self.update(column, excluded)
    }
    pub fn filter(mut self, predicate: Expr) -> Result<Self> {
        self.predicate = combine(self.predicate.take(), predicate)?;
        Ok(self)
    }
    pub(crate) fn target_columns(&self, table: &Table) -> Vec<Column> {
        if self.columns.is_empty() {
            table.primary_keys()
        } else {
            self.columns.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrUpdate {
    pub table: Table,
    pub assignments: Vec<Assignment>,
    pub on_conflict: OnConflict,
}

impl InsertOrUpdate {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Vec::new(),
            on_conflict: OnConflict::new([]),
        }
    }
    pub fn set(mut self, column: &Column, value: impl Into<Operand>) -> Result<Self> {
        self.assignments.push(Assignment::new(column, value)?);
        Ok(self)
    }
    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = on_conflict;
        self
    }
}

/// Many rows inserted by one statement, every row assigns the same columns in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkInsert {
    pub table: Table,
    pub rows: Vec<Vec<Assignment>>,
    pub on_conflict: Option<OnConflict>,
}

impl BulkInsert {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            rows: Vec::new(),
            on_conflict: None,
        }
    }
    pub fn row(mut self, assignments: Vec<Assignment>) -> Self {
        self.rows.push(assignments);
        self
    }
    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }
    pub(crate) fn validate(&self) -> Result<()> {
        let Some(first) = self.rows.first() else {
            return Err(Error::msg(format!(
                "Bulk insert into `{}` has no rows",
                self.table.name()
            )));
        };
        let names = |row: &[Assignment]| {
            row.iter()
                .map(|a| a.column.name().to_string())
                .collect::<Vec<_>>()
        };
        let expected = names(first);
        if expected.is_empty() {
            return Err(Error::msg("Bulk insert rows must assign at least one column"));
        }
        for (index, row) in self.rows.iter().enumerate().skip(1) {
            let found = names(row);
            if found != expected {
                return Err(TillerError::InconsistentBulkShape {
                    index,
                    expected: expected.join(", "),
                    found: found.join(", "),
                }
                .into());
            }
        }
        for row in &self.rows {
            check_target(&self.table, row)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: Table,
    pub assignments: Vec<Assignment>,
    pub predicate: Option<Expr>,
}

impl Update {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            assignments: Vec::new(),
            predicate: None,
        }
    }
    pub fn set(mut self, column: &Column, value: impl Into<Operand>) -> Result<Self> {
        self.assignments.push(Assignment::new(column, value)?);
        Ok(self)
    }
    pub fn filter(mut self, predicate: Expr) -> Result<Self> {
        self.predicate = combine(self.predicate.take(), predicate)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: Table,
    pub predicate: Option<Expr>,
}

impl Delete {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            predicate: None,
        }
    }
    pub fn filter(mut self, predicate: Expr) -> Result<Self> {
        self.predicate = combine(self.predicate.take(), predicate)?;
        Ok(self)
    }
}
