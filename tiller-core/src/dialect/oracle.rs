use crate::{BulkInsert, Context, OnConflict, Result, Select, SqlWriter, Table, Value};

/// Oracle writer, unquoted identifiers fold to upper case so quoted ones are written upper case too.
#[derive(Default, Debug, Clone, Copy)]
pub struct OracleSqlWriter {}

impl SqlWriter for OracleSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "Oracle"
    }

    fn identifier_limit(&self) -> Option<usize> {
        Some(30)
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) -> Result<()> {
        self.check_identifier(value)?;
        out.push('"');
        self.write_escaped(context, out, &value.to_uppercase(), '"', "\"\"");
        out.push('"');
        Ok(())
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..) => "NUMBER(1)",
            Value::Int8(..) => "NUMBER(3)",
            Value::Int16(..) => "NUMBER(5)",
            Value::Int32(..) => "NUMBER(10)",
            Value::Int64(..) => "NUMBER(19)",
            Value::Float32(..) => "BINARY_FLOAT",
            Value::Float64(..) => "BINARY_DOUBLE",
            Value::Decimal(..) => "NUMBER",
            Value::Varchar(..) => "VARCHAR2(4000)",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Time(..) => "INTERVAL DAY TO SECOND",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMP WITH TIME ZONE",
            Value::Uuid(..) => "RAW(16)",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    /// Paginated selects are wrapped twice, `ROWNUM` caps the rows and the outer query skips the offset.
    fn write_select(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        if select.limit.is_none() && select.offset.is_none() {
            self.write_select_compound(context, out, select)?;
            return self.write_order_by(context, out, select);
        }
        out.push_str("SELECT * FROM (SELECT ");
        self.write_identifier_quoted(context, out, "_t")?;
        out.push_str(".*, ROWNUM ");
        self.write_identifier_quoted(context, out, "_rn")?;
        out.push_str(" FROM (\n");
        self.write_select_compound(context, out, select)?;
        self.write_order_by(context, out, select)?;
        out.push_str("\n) ");
        self.write_identifier_quoted(context, out, "_t")?;
        if let Some(limit) = select.limit {
            let last = limit.saturating_add(select.offset.unwrap_or_default());
            out.push_str(" WHERE ROWNUM <= ");
            self.write_count(context, out, last)?;
        }
        out.push(')');
        if let Some(offset) = select.offset {
            out.push_str(" WHERE ");
            self.write_identifier_quoted(context, out, "_rn")?;
            out.push_str(" > ");
            self.write_count(context, out, offset)?;
        }
        Ok(())
    }

    fn write_on_conflict(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _table: &Table,
        _on_conflict: &OnConflict,
    ) -> Result<()> {
        Err(self.unsupported("INSERT ... ON CONFLICT"))
    }

    /// `INSERT ALL` with one `INTO` clause per row.
    fn write_bulk_insert(&self, context: &mut Context, out: &mut String, value: &BulkInsert) -> Result<()> {
        if value.on_conflict.is_some() {
            return Err(self.unsupported("INSERT ... ON CONFLICT"));
        }
        context.target = Some(value.table.clone());
        out.push_str("INSERT ALL");
        for row in &value.rows {
            out.push_str("\nINTO ");
            self.write_insert_columns(context, out, &value.table, row)?;
            out.push_str(" VALUES ");
            self.write_values_row(context, out, row)?;
        }
        out.push_str("\nSELECT 1 FROM DUAL");
        Ok(())
    }
}
