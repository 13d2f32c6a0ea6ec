use crate::{Column, Context, JoinType, OnConflict, Result, SqlWriter, Table, Value, separated_by};

/// MySQL and MariaDB writer.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlSqlWriter {}

impl SqlWriter for MySqlSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "MySQL"
    }

    fn identifier_limit(&self) -> Option<usize> {
        Some(64)
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) -> Result<()> {
        self.check_identifier(value)?;
        out.push('`');
        self.write_escaped(context, out, value, '`', "``");
        out.push('`');
        Ok(())
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..)
            | Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..) => "SIGNED",
            Value::Float32(..) => "FLOAT",
            Value::Float64(..) => "DOUBLE",
            Value::Decimal(..) => "DECIMAL(65,30)",
            Value::Varchar(..) | Value::Uuid(..) => "CHAR",
            Value::Blob(..) => "BINARY",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => "DATETIME(6)",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: &JoinType) -> Result<()> {
        out.push_str(match join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => return Err(self.unsupported("FULL OUTER JOIN")),
            JoinType::Cross => "CROSS JOIN",
            JoinType::Natural => "NATURAL JOIN",
        });
        Ok(())
    }

    /// `VALUES(column)` is the row proposed by the insert.
    fn write_expression_excluded(&self, context: &mut Context, out: &mut String, value: &Column) -> Result<()> {
        out.push_str("VALUES(");
        self.write_identifier_quoted(context, out, value.name())?;
        out.push(')');
        Ok(())
    }

    /// `LIMIT offset, count`, the largest unsigned count stands for no limit.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<()> {
        match (limit, offset) {
            (None, None) => {}
            (Some(limit), None) => {
                out.push_str("\nLIMIT ");
                self.write_count(context, out, limit)?;
            }
            (limit, Some(offset)) => {
                out.push_str("\nLIMIT ");
                self.write_count(context, out, offset)?;
                out.push_str(", ");
                match limit {
                    Some(limit) => self.write_count(context, out, limit)?,
                    None => out.push_str("18446744073709551615"),
                }
            }
        }
        Ok(())
    }

    /// The conflict target is implied by the table unique keys.
    fn write_on_conflict(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Table,
        on_conflict: &OnConflict,
    ) -> Result<()> {
        if on_conflict.predicate.is_some() {
            return Err(self.unsupported("conditional conflict update"));
        }
        out.push_str("\nON DUPLICATE KEY UPDATE\n");
        if on_conflict.updates.is_empty() {
            return separated_by(
                out,
                on_conflict.target_columns(table),
                |out, c| {
                    self.write_identifier_quoted(context, out, c.name())?;
                    out.push_str(" = ");
                    self.write_identifier_quoted(context, out, c.name())
                },
                ",\n",
            );
        }
        self.write_assignments(context, out, &on_conflict.updates, ",\n")
    }
}
