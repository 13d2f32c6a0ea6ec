use crate::{
    Binding, Column, Error, ExprBuilder, Property, Record, ReferenceJoin, Result, RowLabeled,
    Select, Source, Table, Value, assign, reference_joins,
};

/// Build the record described by `row`.
///
/// With `with_references`, the row is expected to come from
/// [`Table::select_entities`] and referenced entities are read from the joined columns.
pub fn materialize(row: &RowLabeled, table: &Table, with_references: bool) -> Result<Record> {
    let joins = if with_references {
        reference_joins(table)?
    } else {
        Vec::new()
    };
    materialize_joined(row, table, &joins)
}

fn materialize_joined(row: &RowLabeled, table: &Table, joins: &[ReferenceJoin]) -> Result<Record> {
    let record = Record::for_table(table);
    for column in table.all_columns() {
        let Some(binding) = column.binding() else {
            continue;
        };
        let Some(value) = row.get_column(&column.label()) else {
            continue;
        };
        let value = column.codec().decode(value.clone())?;
        match binding {
            Binding::Reference {
                property,
                table: referenced,
            } => {
                if value.is_null() {
                    record.put(property, Property::Value(value));
                    continue;
                }
                let joined = match joins.iter().find(|j| j.column == column) {
                    Some(join) if is_joined(row, join)? => {
                        Some(materialize_joined(row, &join.table, &join.children)?)
                    }
                    _ => None,
                };
                let referenced = match joined {
                    Some(referenced) => referenced,
                    None => placeholder(&referenced(), value)?,
                };
                record.put(property, Property::Entity(referenced));
            }
            binding => assign(&record, binding, value)?,
        }
    }
    record.attach(table);
    Ok(record)
}

/// The joined row exists when its primary key is not null.
fn is_joined(row: &RowLabeled, join: &ReferenceJoin) -> Result<bool> {
    let key = join.table.primary_key()?;
    Ok(row.get_column(&key.label()).is_some_and(|v| !v.is_null()))
}

/// Record of `table` with only the primary key established.
fn placeholder(table: &Table, key: Value) -> Result<Record> {
    let column = table.primary_key()?;
    let Some(binding) = column.binding() else {
        return Err(Error::msg(format!(
            "Primary key `{}` of `{}` is not bound to any property",
            column.name(),
            table.name()
        )));
    };
    let record = Record::for_table(table);
    assign(&record, binding, key)?;
    record.attach(table);
    Ok(record)
}

impl Table {
    /// Select of every column, `LEFT JOIN`ing the referenced tables when `with_references`.
    pub fn select_entities(&self, with_references: bool) -> Result<Select> {
        let mut source = Source::Table(self.clone());
        let mut columns: Vec<Column> = self.all_columns().collect();
        if with_references {
            let mut stack: Vec<ReferenceJoin> = reference_joins(self)?;
            stack.reverse();
            while let Some(join) = stack.pop() {
                let on = (&join.column).equal(join.table.primary_key()?)?;
                source = source.left_join(join.table.clone(), on)?;
                columns.extend(join.table.all_columns());
                stack.extend(join.children.into_iter().rev());
            }
        }
        Ok(Select::new(source).columns(columns))
    }
}
