use crate::{
    Context, ExprBuilder, JoinType, OnConflict, Result, Select, SqlWriter, Table, Value,
    row_number,
};

/// Microsoft SQL Server writer.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerSqlWriter {}

impl SqlWriter for SqlServerSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "SQL Server"
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) -> Result<()> {
        self.check_identifier(value)?;
        out.push('[');
        self.write_escaped(context, out, value, ']', "]]");
        out.push(']');
        Ok(())
    }

    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..) => "BIT",
            Value::Int8(..) | Value::Int16(..) => "SMALLINT",
            Value::Int32(..) => "INT",
            Value::Int64(..) => "BIGINT",
            Value::Float32(..) => "REAL",
            Value::Float64(..) => "FLOAT",
            Value::Decimal(..) => "DECIMAL(38,10)",
            Value::Varchar(..) => "NVARCHAR(MAX)",
            Value::Blob(..) => "VARBINARY(MAX)",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "DATETIME2",
            Value::TimestampWithTimezone(..) => "DATETIMEOFFSET",
            Value::Uuid(..) => "UNIQUEIDENTIFIER",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: &JoinType) -> Result<()> {
        out.push_str(match join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::Natural => return Err(self.unsupported("NATURAL JOIN")),
        });
        Ok(())
    }

    /// A limit without offset is a `TOP` clause, compound selects take it on the wrapping query.
    fn write_select_keyword(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        out.push_str("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        if let (Some(limit), None, None) = (select.limit, select.offset, &select.set_op) {
            out.push_str("TOP (");
            self.write_count(context, out, limit)?;
            out.push_str(") ");
        }
        Ok(())
    }

    fn write_pagination(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _limit: Option<u64>,
        _offset: Option<u64>,
    ) -> Result<()> {
        Ok(())
    }

    /// With an offset, rows are numbered by `ROW_NUMBER()` in an inner query and filtered outside.
    fn write_select(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        let Some(offset) = select.offset else {
            match (select.limit, &select.set_op) {
                (Some(limit), Some(..)) => {
                    out.push_str("SELECT TOP (");
                    self.write_count(context, out, limit)?;
                    out.push_str(") * FROM (\n");
                    self.write_select_compound(context, out, select)?;
                    out.push_str("\n) ");
                    self.write_identifier_quoted(context, out, "_compound")?;
                }
                _ => self.write_select_compound(context, out, select)?,
            }
            return self.write_order_by(context, out, select);
        };
        if select.set_op.is_some() {
            return Err(self.unsupported("OFFSET on a compound select"));
        }
        let columns = select.selected_columns();
        let Some(first) = columns.first() else {
            return Err(self.unsupported("OFFSET on a select without known columns"));
        };
        let order_by = if select.order_by.is_empty() {
            vec![first.expr.clone().asc()]
        } else {
            select.order_by.clone()
        };
        let mut inner = select.clone();
        inner.order_by.clear();
        inner.limit = None;
        inner.offset = None;
        inner.columns = columns;
        let inner = inner.labeled(row_number().over(Vec::new(), order_by), "_rownum");
        out.push_str("SELECT * FROM (\n");
        self.write_select_core(context, out, &inner)?;
        out.push_str("\n) ");
        self.write_identifier_quoted(context, out, "_paged")?;
        out.push_str("\nWHERE ");
        self.write_identifier_quoted(context, out, "_rownum")?;
        out.push_str(" > ");
        self.write_count(context, out, offset)?;
        if let Some(limit) = select.limit {
            out.push_str(" AND ");
            self.write_identifier_quoted(context, out, "_rownum")?;
            out.push_str(" <= ");
            self.write_count(context, out, offset.saturating_add(limit))?;
        }
        out.push_str("\nORDER BY ");
        self.write_identifier_quoted(context, out, "_rownum")
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
}
