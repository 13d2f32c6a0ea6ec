mod dml;
mod select;

pub use dml::*;
pub use select::*;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    BulkInsert(BulkInsert),
    Update(Update),
    Delete(Delete),
    InsertOrUpdate(InsertOrUpdate),
}

impl Statement {
    /// Checks that do not depend on the dialect, run before any text is rendered.
    pub fn validate(&self) -> Result<()> {
        let empty = |table: &crate::Table| -> Result<()> {
            Err(Error::msg(format!(
                "Statement on `{}` assigns no columns",
                table.name()
            )))
        };
        match self {
            Statement::Select(select) => select.validate(),
            Statement::Insert(insert) => {
                if insert.assignments.is_empty() {
                    return empty(&insert.table);
                }
                check_target(&insert.table, &insert.assignments)
            }
            Statement::BulkInsert(bulk) => {
                bulk.validate()?;
                if let Some(on_conflict) = &bulk.on_conflict {
                    check_conflict(&bulk.table, on_conflict)?;
                }
                Ok(())
            }
            Statement::Update(update) => {
                if update.assignments.is_empty() {
                    return empty(&update.table);
                }
                check_target(&update.table, &update.assignments)
            }
            Statement::Delete(..) => Ok(()),
            Statement::InsertOrUpdate(upsert) => {
                if upsert.assignments.is_empty() {
                    return empty(&upsert.table);
                }
                check_target(&upsert.table, &upsert.assignments)?;
                check_conflict(&upsert.table, &upsert.on_conflict)
            }
        }
    }
}

fn check_conflict(table: &crate::Table, on_conflict: &OnConflict) -> Result<()> {
    check_target(table, &on_conflict.updates)?;
    if on_conflict.target_columns(table).is_empty() {
        return Err(Error::msg(format!(
            "Insert into `{}` has no conflict columns and the table has no primary key",
            table.name()
        )));
    }
    Ok(())
}

macro_rules! impl_from_statement {
    ($($variant:ident),+) => {
        $(impl From<$variant> for Statement {
            fn from(value: $variant) -> Self {
                Statement::$variant(value)
            }
        })+
    };
}
impl_from_statement!(Select, Insert, BulkInsert, Update, Delete, InsertOrUpdate);
