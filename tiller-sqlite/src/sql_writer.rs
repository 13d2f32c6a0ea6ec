use tiller_core::{Context, Result, SqlWriter, Value};

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "SQLite"
    }

    fn identifier_limit(&self) -> Option<usize> {
        None
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..)
            | Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..) => "INTEGER",
            Value::Float32(..) | Value::Float64(..) => "REAL",
            Value::Blob(..) => "BLOB",
            Value::Decimal(..)
            | Value::Varchar(..)
            | Value::Date(..)
            | Value::Time(..)
            | Value::Timestamp(..)
            | Value::TimestampWithTimezone(..)
            | Value::Uuid(..) => "TEXT",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    /// An offset needs a limit, `-1` stands for no limit.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<()> {
        match (limit, offset) {
            (None, None) => {}
            (Some(limit), _) => {
                out.push_str("\nLIMIT ");
                self.write_count(context, out, limit)?;
            }
            (None, Some(..)) => out.push_str("\nLIMIT -1"),
        }
        if let Some(offset) = offset {
            out.push_str(" OFFSET ");
            self.write_count(context, out, offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use tiller_core::{Select, SqlWriter, Table, Value};

    #[test]
    fn offset_without_limit() {
        let table = Table::builder("item")
            .column("id", Value::Int64(None))
            .primary_key()
            .build()
            .unwrap();
        let query = SqliteSqlWriter::default()
            .render(&Select::new(&table).offset(5).into())
            .unwrap();
        assert!(query.sql.ends_with("\nLIMIT -1 OFFSET ?"), "{}", query.sql);
        assert_eq!(query.params, vec![Value::Int64(Some(5))]);
    }
}
