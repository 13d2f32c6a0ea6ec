use crate::{
    Assignment, Column, Delete, Error, Executor, Expr, ExprBuilder, Insert, Record, Result,
    Statement, Table, TillerError, Update, Value, and_all, column_value,
};
use std::collections::HashSet;

/// Columns of a record whose current value differs from the baseline.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub table: Table,
    /// Changed columns with their new value, in table column order.
    pub changes: Vec<(Column, Value)>,
}

impl ChangeRecord {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
    pub fn len(&self) -> usize {
        self.changes.len()
    }
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.changes
            .iter()
            .find(|(c, _)| c.name() == column)
            .map(|(_, v)| v)
    }
    fn assignments(&self) -> Result<Vec<Assignment>> {
        self.changes
            .iter()
            .map(|(column, value)| Assignment::new(column, value.clone()))
            .collect()
    }
}

impl Record {
    fn storage(&self) -> Result<Table> {
        self.table()
            .ok_or_else(|| TillerError::NotAttached(self.entity_name()).into())
    }

    /// Pending changes.
    ///
    /// An attached record reports the non key columns that differ from the
    /// baseline, a new record every column it established.
    pub fn diff(&self) -> Result<ChangeRecord> {
        let table = self.storage()?;
        let attached = self.is_attached();
        let changes = table
            .all_columns()
            .filter(|c| !(attached && c.is_primary_key()))
            .filter_map(|c| {
                let current = column_value(self, &c)?;
                if attached && self.baseline(c.name()).as_ref() == Some(&current) {
                    return None;
                }
                Some((c, current))
            })
            .collect();
        Ok(ChangeRecord { table, changes })
    }

    /// `primary key = baseline value` for every key column.
    fn key_predicate(&self, table: &Table) -> Result<Expr> {
        let keys = table.primary_keys();
        if keys.is_empty() {
            return Err(Error::msg(format!(
                "Table `{}` has no primary key, its rows cannot be addressed",
                table.name()
            )));
        }
        let mut predicates = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.baseline(key.name()).unwrap_or_default();
            predicates.push(key.equal(value)?);
        }
        and_all(predicates)
    }

    fn check_primary_key(&self, table: &Table) -> Result<()> {
        for key in table.primary_keys() {
            let Some(current) = column_value(self, &key) else {
                continue;
            };
            if self.baseline(key.name()).as_ref() != Some(&current) {
                let property = key
                    .binding()
                    .map(|b| b.path())
                    .unwrap_or_else(|| key.name().into());
                return Err(TillerError::PrimaryKeyImmutable(property).into());
            }
        }
        Ok(())
    }

    /// Fail when a record reachable from this one belongs to another graph and
    /// has changes that flushing this record would not write.
    pub fn check_unflushed(&self) -> Result<()> {
        let mut visited = HashSet::from([self.id()]);
        let mut stack = vec![(self.clone(), String::new())];
        while let Some((record, path)) = stack.pop() {
            for (property, child) in record.entities() {
                if !visited.insert(child.id()) {
                    continue;
                }
                let path = if path.is_empty() {
                    property
                } else {
                    format!("{}.{}", path, property)
                };
                if child.is_external_to(self) {
                    if child.is_dirty() {
                        return Err(TillerError::UnflushedNestedChanges(path).into());
                    }
                    continue;
                }
                stack.push((child, path));
            }
        }
        Ok(())
    }

    /// Write the changes of an attached record, returns the number of rows updated.
    pub async fn flush<E: Executor>(&self, executor: &mut E) -> Result<u64> {
        if !self.is_attached() {
            return Err(TillerError::NotAttached(self.entity_name()).into());
        }
        let table = self.storage()?;
        self.check_primary_key(&table)?;
        self.check_unflushed()?;
        let changes = self.diff()?;
        if changes.is_empty() {
            log::debug!("Nothing to flush for `{}`", self.entity_name());
            self.commit();
            return Ok(0);
        }
        let mut update = Update::new(&table);
        update.assignments = changes.assignments()?;
        let update = update.filter(self.key_predicate(&table)?)?;
        let affected = Statement::Update(update).execute(executor).await?;
        self.commit();
        Ok(affected.rows_affected)
    }

    /// Insert a new record into `table` and attach it.
    ///
    /// A single primary key left unset is generated by the database and read back.
    pub async fn insert<E: Executor>(&self, executor: &mut E, table: &Table) -> Result<()> {
        if self.is_attached() {
            return Err(Error::msg(format!(
                "`{}` is already stored, flush it instead",
                self.entity_name()
            )));
        }
        self.check_unflushed()?;
        let mut insert = Insert::new(table);
        for column in table.all_columns() {
            if let Some(value) = column_value(self, &column) {
                insert.assignments.push(Assignment::new(&column, value)?);
            }
        }
        let keys = table.primary_keys();
        let generated = match keys.as_slice() {
            [key] if column_value(self, key).is_none_or(|v| v.is_null()) => Some(key.clone()),
            _ => None,
        };
        let statement = Statement::Insert(insert);
        match generated {
            Some(key) => {
                let value = statement.execute_returning_key(executor).await?;
                let value = key.codec().decode(value)?;
                let Some(binding) = key.binding() else {
                    return Err(Error::msg(format!(
                        "Primary key `{}` is not bound to any property",
                        key.name()
                    )));
                };
                crate::assign(self, binding, value)?;
            }
            None => {
                statement.execute(executor).await?;
            }
        }
        self.attach(table);
        Ok(())
    }

    /// Delete the stored row and detach the record, returns the number of rows deleted.
    pub async fn delete<E: Executor>(&self, executor: &mut E) -> Result<u64> {
        if !self.is_attached() {
            return Err(TillerError::NotAttached(self.entity_name()).into());
        }
        let table = self.storage()?;
        let delete = Delete::new(&table).filter(self.key_predicate(&table)?)?;
        let affected = Statement::Delete(delete).execute(executor).await?;
        self.detach();
        Ok(affected.rows_affected)
    }
}
