use crate::{Context, Result, SqlWriter, Value};

/// PostgreSQL writer.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "PostgreSQL"
    }

    fn identifier_limit(&self) -> Option<usize> {
        Some(63)
    }

    /// Bare names in `DO UPDATE SET` would be ambiguous with `EXCLUDED`.
    fn qualify_conflict_columns(&self) -> bool {
        true
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..) => "BOOLEAN",
            Value::Int8(..) | Value::Int16(..) => "SMALLINT",
            Value::Int32(..) => "INTEGER",
            Value::Int64(..) => "BIGINT",
            Value::Float32(..) => "REAL",
            Value::Float64(..) => "DOUBLE PRECISION",
            Value::Decimal(..) => "NUMERIC",
            Value::Varchar(..) => "TEXT",
            Value::Blob(..) => "BYTEA",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMP WITH TIME ZONE",
            Value::Uuid(..) => "UUID",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<()> {
        if let Some(limit) = limit {
            out.push_str("\nLIMIT ");
            self.write_count(context, out, limit)?;
        }
        if let Some(offset) = offset {
            out.push_str(if limit.is_some() { " OFFSET " } else { "\nOFFSET " });
            self.write_count(context, out, offset)?;
        }
        Ok(())
    }
}
