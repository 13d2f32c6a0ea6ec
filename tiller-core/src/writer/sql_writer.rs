use crate::{
    Aggregate, Argument, Assignment, Between, BinaryOp, BinaryOpType, BulkInsert, CaseWhen, Cast,
    Column, Delete, Error, Exists, Expr, FunctionCall, InList, InValues, Insert, InsertOrUpdate,
    Join, JoinType, Junction, OnConflict, Order, OrderBy, Query, Result, Select, SetOpType, Source,
    Statement, Table, TillerError, UnaryOp, UnaryOpType, Update, Value, WindowOver,
    possibly_parenthesized, separated_by,
    writer::{Context, Fragment},
};
use std::fmt::Write;

/// Dialect printer converting statement trees into SQL text with positional parameters.
///
/// Every method has the ANSI behavior as default, dialects override the
/// fragments that differ.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Dialect name used in error messages.
    fn dialect(&self) -> &'static str {
        "ANSI"
    }

    /// Maximum length of an identifier, in characters.
    fn identifier_limit(&self) -> Option<usize> {
        Some(128)
    }

    /// Columns assigned by a conflict update are qualified with the table name.
    fn qualify_conflict_columns(&self) -> bool {
        false
    }

    fn unsupported(&self, feature: &str) -> Error {
        TillerError::Unsupported {
            dialect: self.dialect(),
            feature: feature.into(),
        }
        .into()
    }

    /// Validate and render a statement.
    fn render(&self, statement: &Statement) -> Result<Query> {
        statement.validate()?;
        let mut context = Context::new(Fragment::None);
        let mut out = String::with_capacity(256);
        self.write_statement(&mut context, &mut out, statement)?;
        Ok(Query {
            sql: out,
            params: context.params,
        })
    }

    fn write_statement(
        &self,
        context: &mut Context,
        out: &mut String,
        statement: &Statement,
    ) -> Result<()> {
        match statement {
            Statement::Select(v) => self.write_select(context, out, v),
            Statement::Insert(v) => self.write_insert(context, out, v),
            Statement::BulkInsert(v) => self.write_bulk_insert(context, out, v),
            Statement::Update(v) => self.write_update(context, out, v),
            Statement::Delete(v) => self.write_delete(context, out, v),
            Statement::InsertOrUpdate(v) => self.write_insert_or_update(context, out, v),
        }
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn check_identifier(&self, value: &str) -> Result<()> {
        if let Some(limit) = self.identifier_limit() {
            let length = value.chars().count();
            if length > limit {
                return Err(TillerError::IdentifierTooLong {
                    dialect: self.dialect(),
                    identifier: value.into(),
                    length,
                    limit,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &str,
    ) -> Result<()> {
        self.check_identifier(value)?;
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
        Ok(())
    }

    /// Fully qualified table name, without alias.
    fn write_table_name(&self, context: &mut Context, out: &mut String, table: &Table) -> Result<()> {
        if let Some(catalog) = table.catalog() {
            self.write_identifier_quoted(context, out, catalog)?;
            out.push('.');
        }
        if let Some(schema) = table.schema() {
            self.write_identifier_quoted(context, out, schema)?;
            out.push('.');
        }
        self.write_identifier_quoted(context, out, table.name())
    }

    /// Table in a FROM or JOIN clause, followed by its alias.
    fn write_table_declaration(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Table,
    ) -> Result<()> {
        self.write_table_name(context, out, table)?;
        if let Some(alias) = table.alias() {
            out.push(' ');
            self.write_identifier_quoted(context, out, alias)?;
        }
        Ok(())
    }

    fn is_target(&self, context: &Context, table: &Table) -> bool {
        context
            .target
            .as_ref()
            .is_some_and(|t| t.same_definition(table) && t.alias() == table.alias())
    }

    /// Column qualified by its table alias, bare when it belongs to the modified table.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, column: &Column) -> Result<()> {
        let table = column.table();
        if self.is_target(context, table) {
            if context.qualify_target {
                self.write_identifier_quoted(context, out, table.name())?;
                out.push('.');
            }
        } else if let Some(alias) = table.alias() {
            self.write_identifier_quoted(context, out, alias)?;
            out.push('.');
        } else {
            self.write_table_name(context, out, table)?;
            out.push('.');
        }
        self.write_identifier_quoted(context, out, column.name())
    }

    /// Render the SQL type of a `Value` prototype, used by casts.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) -> Result<()> {
        out.push_str(match value {
            Value::Boolean(..) => "BOOLEAN",
            Value::Int8(..) | Value::Int16(..) => "SMALLINT",
            Value::Int32(..) => "INTEGER",
            Value::Int64(..) => "BIGINT",
            Value::Float32(..) => "REAL",
            Value::Float64(..) => "DOUBLE PRECISION",
            Value::Decimal(..) => "DECIMAL",
            Value::Varchar(..) => "VARCHAR",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMP WITH TIME ZONE",
            Value::Uuid(..) => "UUID",
            Value::Null => return Err(self.unsupported("CAST to NULL")),
        });
        Ok(())
    }

    fn write_placeholder(&self, _context: &mut Context, out: &mut String) {
        out.push('?');
    }

    /// Bind `value` as the next positional parameter.
    fn write_parameter(&self, context: &mut Context, out: &mut String, value: Value) {
        context.params.push(value);
        self.write_placeholder(context, out);
    }

    /// Row count used by pagination, bound as a parameter.
    fn write_count(&self, context: &mut Context, out: &mut String, count: u64) -> Result<()> {
        let count = i64::try_from(count)?;
        self.write_parameter(context, out, Value::Int64(Some(count)));
        Ok(())
    }

    fn write_argument(&self, context: &mut Context, out: &mut String, value: &Argument) -> Result<()> {
        let encoded = value.codec.encode(value.value.clone())?;
        self.write_parameter(context, out, encoded);
        Ok(())
    }

    fn expression_unary_op_precedence(&self, value: &UnaryOpType) -> i32 {
        match value {
            UnaryOpType::Negative => 1250,
            UnaryOpType::IsNull | UnaryOpType::IsNotNull => 350,
            UnaryOpType::Not => 250,
        }
    }

    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal
            | BinaryOpType::NotEqual
            | BinaryOpType::Less
            | BinaryOpType::Greater
            | BinaryOpType::LessEqual
            | BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Like | BinaryOpType::NotLike => 400,
            BinaryOpType::Addition | BinaryOpType::Subtraction => 800,
            BinaryOpType::Multiplication | BinaryOpType::Division | BinaryOpType::Remainder => 900,
        }
    }

    /// Binding strength of the outermost operator of `value`.
    fn expression_precedence(&self, value: &Expr) -> i32 {
        match value {
            Expr::UnaryOp(v) => self.expression_unary_op_precedence(&v.op),
            Expr::BinaryOp(v) => self.expression_binary_op_precedence(&v.op),
            Expr::Junction(v) => self.expression_binary_op_precedence(&v.op),
            Expr::InList(..) | Expr::Between(..) => {
                self.expression_binary_op_precedence(&BinaryOpType::Equal)
            }
            Expr::Exists(v) if v.negated => self.expression_unary_op_precedence(&UnaryOpType::Not),
            _ => 1_000_000,
        }
    }

    fn write_expression(&self, context: &mut Context, out: &mut String, value: &Expr) -> Result<()> {
        match value {
            Expr::Argument(v) => self.write_argument(context, out, v),
            Expr::Column(v) => self.write_column_ref(context, out, v),
            Expr::Excluded(v) => self.write_expression_excluded(context, out, v),
            Expr::UnaryOp(v) => self.write_expression_unary_op(context, out, v),
            Expr::BinaryOp(v) => self.write_expression_binary_op(context, out, v),
            Expr::Junction(v) => self.write_expression_junction(context, out, v),
            Expr::Function(v) => self.write_expression_function(context, out, v),
            Expr::Case(v) => self.write_expression_case(context, out, v),
            Expr::Subquery(v) => self.write_expression_subquery(context, out, v),
            Expr::Exists(v) => self.write_expression_exists(context, out, v),
            Expr::InList(v) => self.write_expression_in_list(context, out, v),
            Expr::Between(v) => self.write_expression_between(context, out, v),
            Expr::Aggregate(v) => self.write_expression_aggregate(context, out, v),
            Expr::Window(v) => self.write_expression_window(context, out, v),
            Expr::Cast(v) => self.write_expression_cast(context, out, v),
        }
    }

    /// Value proposed by the row that hit the conflict.
    fn write_expression_excluded(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Column,
    ) -> Result<()> {
        out.push_str("EXCLUDED.");
        self.write_identifier_quoted(context, out, value.name())
    }

    fn write_expression_unary_op(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &UnaryOp,
    ) -> Result<()> {
        let precedence = self.expression_unary_op_precedence(&value.op);
        let parenthesized = self.expression_precedence(&value.operand) < precedence;
        match value.op {
            UnaryOpType::Negative => out.push('-'),
            UnaryOpType::Not => out.push_str("NOT "),
            UnaryOpType::IsNull | UnaryOpType::IsNotNull => {}
        }
        possibly_parenthesized!(
            out,
            parenthesized,
            self.write_expression(context, out, &value.operand)?
        );
        if matches!(value.op, UnaryOpType::IsNull | UnaryOpType::IsNotNull) {
            let _ = write!(out, " {}", value.op);
        }
        Ok(())
    }

    fn write_expression_binary_op(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &BinaryOp,
    ) -> Result<()> {
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            self.expression_precedence(&value.lhs) < precedence,
            self.write_expression(context, out, &value.lhs)?
        );
        let _ = write!(out, " {} ", value.op);
        possibly_parenthesized!(
            out,
            self.expression_precedence(&value.rhs) <= precedence,
            self.write_expression(context, out, &value.rhs)?
        );
        Ok(())
    }

    fn write_expression_junction(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Junction,
    ) -> Result<()> {
        if value.operands.is_empty() {
            return Err(Error::msg(format!("{} without operands", value.op)));
        }
        let precedence = self.expression_binary_op_precedence(&value.op);
        out.reserve(value.operands.len() * 16);
        for (i, operand) in value.operands.iter().enumerate() {
            if i > 0 {
                let _ = write!(out, " {} ", value.op);
            }
            possibly_parenthesized!(
                out,
                self.expression_precedence(operand) <= precedence,
                self.write_expression(context, out, operand)?
            );
        }
        Ok(())
    }

    fn write_expression_list(
        &self,
        context: &mut Context,
        out: &mut String,
        values: &[Expr],
    ) -> Result<()> {
        separated_by(
            out,
            values,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )
    }

    fn write_expression_function(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &FunctionCall,
    ) -> Result<()> {
        out.push_str(&value.name);
        out.push('(');
        self.write_expression_list(context, out, &value.arguments)?;
        out.push(')');
        Ok(())
    }

    fn write_expression_case(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &CaseWhen,
    ) -> Result<()> {
        out.push_str("CASE");
        for (condition, result) in &value.branches {
            out.push_str(" WHEN ");
            self.write_expression(context, out, condition)?;
            out.push_str(" THEN ");
            self.write_expression(context, out, result)?;
        }
        if let Some(otherwise) = &value.otherwise {
            out.push_str(" ELSE ");
            self.write_expression(context, out, otherwise)?;
        }
        out.push_str(" END");
        Ok(())
    }

    fn write_expression_subquery(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Select,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlSubquery);
        out.push('(');
        self.write_select(&mut context, out, value)?;
        out.push(')');
        Ok(())
    }

    fn write_expression_exists(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Exists,
    ) -> Result<()> {
        if value.negated {
            out.push_str("NOT ");
        }
        out.push_str("EXISTS ");
        self.write_expression_subquery(context, out, &value.subquery)
    }

    fn write_expression_in_list(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &InList,
    ) -> Result<()> {
        let precedence = self.expression_binary_op_precedence(&BinaryOpType::Equal);
        possibly_parenthesized!(
            out,
            self.expression_precedence(&value.expr) <= precedence,
            self.write_expression(context, out, &value.expr)?
        );
        out.push_str(if value.negated { " NOT IN " } else { " IN " });
        match &value.values {
            InValues::List(values) => {
                out.push('(');
                self.write_expression_list(context, out, values)?;
                out.push(')');
            }
            InValues::Subquery(select) => self.write_expression_subquery(context, out, select)?,
        }
        Ok(())
    }

    fn write_expression_between(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Between,
    ) -> Result<()> {
        let precedence = self.expression_binary_op_precedence(&BinaryOpType::Equal);
        for (i, operand) in [&value.expr, &value.low, &value.high].into_iter().enumerate() {
            match i {
                1 => out.push_str(if value.negated {
                    " NOT BETWEEN "
                } else {
                    " BETWEEN "
                }),
                2 => out.push_str(" AND "),
                _ => {}
            }
            possibly_parenthesized!(
                out,
                self.expression_precedence(operand) <= precedence,
                self.write_expression(context, out, operand)?
            );
        }
        Ok(())
    }

    fn write_expression_aggregate(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Aggregate,
    ) -> Result<()> {
        out.push_str(value.function.name());
        out.push('(');
        match &value.argument {
            Some(argument) => {
                if value.distinct {
                    out.push_str("DISTINCT ");
                }
                self.write_expression(context, out, argument)?;
            }
            None => out.push('*'),
        }
        out.push(')');
        Ok(())
    }

    fn write_expression_window(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &WindowOver,
    ) -> Result<()> {
        self.write_expression(context, out, &value.function)?;
        out.push_str(" OVER (");
        if !value.partition_by.is_empty() {
            out.push_str("PARTITION BY ");
            self.write_expression_list(context, out, &value.partition_by)?;
        }
        if !value.order_by.is_empty() {
            if !value.partition_by.is_empty() {
                out.push(' ');
            }
            out.push_str("ORDER BY ");
            self.write_order_by_items(context, out, &value.order_by, None)?;
        }
        out.push(')');
        Ok(())
    }

    fn write_expression_cast(&self, context: &mut Context, out: &mut String, value: &Cast) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::Casting);
        out.push_str("CAST(");
        self.write_expression(&mut context, out, &value.expr)?;
        out.push_str(" AS ");
        self.write_column_type(&mut context, out, &value.value_type)?;
        out.push(')');
        Ok(())
    }

    /// Ordering terms, a compound select refers to its own result columns by label.
    fn write_order_by_items(
        &self,
        context: &mut Context,
        out: &mut String,
        values: &[OrderBy],
        compound: Option<&Select>,
    ) -> Result<()> {
        separated_by(
            out,
            values,
            |out, v| {
                let label = match (compound, &v.expr) {
                    (Some(select), Expr::Column(column)) => select
                        .column_index(column)
                        .map(|_| column.label()),
                    _ => None,
                };
                match label {
                    Some(label) => self.write_identifier_quoted(context, out, &label)?,
                    None => self.write_expression(context, out, &v.expr)?,
                }
                out.push_str(match v.order {
                    Order::ASC => " ASC",
                    Order::DESC => " DESC",
                });
                Ok(())
            },
            ", ",
        )
    }

    fn write_order_by(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        if select.order_by.is_empty() {
            return Ok(());
        }
        let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
        out.push_str("\nORDER BY ");
        let compound = select.set_op.as_ref().map(|_| select);
        self.write_order_by_items(&mut context, out, &select.order_by, compound)
    }

    /// Render join keyword(s) for the given join type.
    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: &JoinType) -> Result<()> {
        out.push_str(match join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::Natural => "NATURAL JOIN",
        });
        Ok(())
    }

    /// Render a JOIN clause.
    fn write_join(&self, context: &mut Context, out: &mut String, join: &Join) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_source(&mut context, out, &join.left)?;
        out.push(' ');
        self.write_join_type(&mut context, out, &join.kind)?;
        out.push(' ');
        possibly_parenthesized!(
            out,
            matches!(join.right, Source::Join(..)),
            self.write_source(&mut context, out, &join.right)?
        );
        if let Some(on) = &join.on {
            out.push_str(" ON ");
            self.write_expression(&mut context, out, on)?;
        }
        Ok(())
    }

    fn write_source(&self, context: &mut Context, out: &mut String, source: &Source) -> Result<()> {
        match source {
            Source::Table(table) => self.write_table_declaration(context, out, table),
            Source::Join(join) => self.write_join(context, out, join),
            Source::Subquery { select, alias } => {
                self.write_expression_subquery(context, out, select)?;
                out.push(' ');
                self.write_identifier_quoted(context, out, alias)
            }
        }
    }

    fn check_aliases(&self, source: &Source) -> Result<()> {
        let aliases = source.aliases();
        for (i, alias) in aliases.iter().enumerate() {
            if aliases[..i].contains(alias) {
                return Err(TillerError::DuplicateAlias((*alias).into()).into());
            }
        }
        Ok(())
    }

    /// `SELECT` keyword and modifiers preceding the column list.
    fn write_select_keyword(&self, _context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        out.push_str("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        Ok(())
    }

    fn write_select_columns(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        let columns = select.selected_columns();
        if columns.is_empty() {
            out.push('*');
            return Ok(());
        }
        out.reserve(columns.len() * 32);
        separated_by(
            out,
            &columns,
            |out, column| {
                self.write_expression(context, out, &column.expr)?;
                if let Some(label) = column.label() {
                    out.push_str(" AS ");
                    self.write_identifier_quoted(context, out, &label)?;
                }
                Ok(())
            },
            ", ",
        )
    }

    /// One select without set operations, ordering and pagination.
    fn write_select_core(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        self.check_aliases(&select.source)?;
        let mut context = context.switch_fragment(Fragment::SqlSelect);
        self.write_select_keyword(&mut context, out, select)?;
        self.write_select_columns(&mut context, out, select)?;
        out.push_str("\nFROM ");
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectFrom);
            self.write_source(&mut context, out, &select.source)?;
        }
        if let Some(predicate) = &select.predicate {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            out.push_str("\nWHERE ");
            self.write_expression(&mut context, out, predicate)?;
        }
        if !select.group_by.is_empty() {
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            out.push_str("\nGROUP BY ");
            self.write_expression_list(&mut context, out, &select.group_by)?;
        }
        if let Some(having) = &select.having {
            let mut context = context.switch_fragment(Fragment::SqlSelectHaving);
            out.push_str("\nHAVING ");
            self.write_expression(&mut context, out, having)?;
        }
        Ok(())
    }

    fn write_set_op_type(&self, _context: &mut Context, out: &mut String, kind: &SetOpType) -> Result<()> {
        out.push_str(match kind {
            SetOpType::Union => "UNION",
            SetOpType::UnionAll => "UNION ALL",
            SetOpType::Intersect => "INTERSECT",
            SetOpType::Except => "EXCEPT",
        });
        Ok(())
    }

    /// The select and every select chained to it by set operations.
    fn write_select_compound(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        self.write_select_core(context, out, select)?;
        let mut op = &select.set_op;
        while let Some(set_op) = op {
            out.push('\n');
            self.write_set_op_type(context, out, &set_op.kind)?;
            out.push('\n');
            self.write_select_core(context, out, &set_op.select)?;
            op = &set_op.select.set_op;
        }
        Ok(())
    }

    /// `OFFSET ? ROWS FETCH FIRST ? ROWS ONLY`, each part only when requested.
    fn write_pagination(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<()> {
        if let Some(offset) = offset {
            out.push_str("\nOFFSET ");
            self.write_count(context, out, offset)?;
            out.push_str(" ROWS");
        }
        if let Some(limit) = limit {
            out.push_str("\nFETCH FIRST ");
            self.write_count(context, out, limit)?;
            out.push_str(" ROWS ONLY");
        }
        Ok(())
    }

    fn write_select(&self, context: &mut Context, out: &mut String, select: &Select) -> Result<()> {
        self.write_select_compound(context, out, select)?;
        self.write_order_by(context, out, select)?;
        self.write_pagination(context, out, select.limit, select.offset)
    }

    /// `table (columns)` of an insert.
    fn write_insert_columns(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Table,
        assignments: &[Assignment],
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        self.write_table_name(&mut context, out, table)?;
        out.push_str(" (");
        separated_by(
            out,
            assignments,
            |out, a| self.write_identifier_quoted(&mut context, out, a.column.name()),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    /// `INSERT INTO table (columns) VALUES` up to the first row.
    fn write_insert_into(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Table,
        assignments: &[Assignment],
    ) -> Result<()> {
        out.push_str("INSERT INTO ");
        self.write_insert_columns(context, out, table, assignments)?;
        out.push_str(" VALUES\n");
        Ok(())
    }

    fn write_values_row(
        &self,
        context: &mut Context,
        out: &mut String,
        assignments: &[Assignment],
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        out.push('(');
        separated_by(
            out,
            assignments,
            |out, a| self.write_expression(&mut context, out, &a.value),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    /// `column = value` pairs.
    fn write_assignments(
        &self,
        context: &mut Context,
        out: &mut String,
        assignments: &[Assignment],
        separator: &str,
    ) -> Result<()> {
        separated_by(
            out,
            assignments,
            |out, a| {
                self.write_identifier_quoted(context, out, a.column.name())?;
                out.push_str(" = ");
                self.write_expression(context, out, &a.value)
            },
            separator,
        )
    }

    fn write_insert(&self, context: &mut Context, out: &mut String, insert: &Insert) -> Result<()> {
        context.target = Some(insert.table.clone());
        self.write_insert_into(context, out, &insert.table, &insert.assignments)?;
        self.write_values_row(context, out, &insert.assignments)
    }

    fn write_on_conflict(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &Table,
        on_conflict: &OnConflict,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoOnConflict);
        out.push_str("\nON CONFLICT (");
        separated_by(
            out,
            on_conflict.target_columns(table),
            |out, c| self.write_identifier_quoted(&mut context, out, c.name()),
            ", ",
        )?;
        out.push(')');
        if on_conflict.updates.is_empty() {
            if on_conflict.predicate.is_some() {
                return Err(self.unsupported("conflict predicate without updates"));
            }
            out.push_str(" DO NOTHING");
            return Ok(());
        }
        out.push_str(" DO UPDATE SET\n");
        let qualify = context.qualify_target;
        context.qualify_target = self.qualify_conflict_columns();
        self.write_assignments(&mut context, out, &on_conflict.updates, ",\n")?;
        if let Some(predicate) = &on_conflict.predicate {
            out.push_str("\nWHERE ");
            self.write_expression(&mut context, out, predicate)?;
        }
        context.qualify_target = qualify;
        Ok(())
    }

    fn write_insert_or_update(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &InsertOrUpdate,
    ) -> Result<()> {
        context.target = Some(value.table.clone());
        self.write_insert_into(context, out, &value.table, &value.assignments)?;
        self.write_values_row(context, out, &value.assignments)?;
        self.write_on_conflict(context, out, &value.table, &value.on_conflict)
    }

    /// Multi row `INSERT`, rows separated by `,\n`.
    fn write_bulk_insert(&self, context: &mut Context, out: &mut String, value: &BulkInsert) -> Result<()> {
        let Some(first) = value.rows.first() else {
            return Err(Error::msg("Bulk insert has no rows"));
        };
        context.target = Some(value.table.clone());
        out.reserve(value.rows.len() * first.len() * 4);
        self.write_insert_into(context, out, &value.table, first)?;
        separated_by(
            out,
            &value.rows,
            |out, row| self.write_values_row(context, out, row),
            ",\n",
        )?;
        if let Some(on_conflict) = &value.on_conflict {
            self.write_on_conflict(context, out, &value.table, on_conflict)?;
        }
        Ok(())
    }

    fn write_update(&self, context: &mut Context, out: &mut String, value: &Update) -> Result<()> {
        context.target = Some(value.table.clone());
        let mut context = context.switch_fragment(Fragment::SqlUpdate);
        out.push_str("UPDATE ");
        self.write_table_name(&mut context, out, &value.table)?;
        out.push_str("\nSET ");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            self.write_assignments(&mut context, out, &value.assignments, ", ")?;
        }
        if let Some(predicate) = &value.predicate {
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            out.push_str("\nWHERE ");
            self.write_expression(&mut context, out, predicate)?;
        }
        Ok(())
    }

    fn write_delete(&self, context: &mut Context, out: &mut String, value: &Delete) -> Result<()> {
        context.target = Some(value.table.clone());
        let mut context = context.switch_fragment(Fragment::SqlDeleteFrom);
        out.push_str("DELETE FROM ");
        self.write_table_name(&mut context, out, &value.table)?;
        if let Some(predicate) = &value.predicate {
            let mut context = context.switch_fragment(Fragment::SqlDeleteFromWhere);
            out.push_str("\nWHERE ");
            self.write_expression(&mut context, out, predicate)?;
        }
        Ok(())
    }
}

/// ANSI SQL writer.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
