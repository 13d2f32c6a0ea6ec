use super::dml::{check_predicate, combine};
use crate::{Column, Error, Expr, IntoExpr, OrderBy, Result, Table};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Natural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinType,
    pub left: Source,
    pub right: Source,
    pub on: Option<Expr>,
}

/// Where a select reads rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(Table),
    Join(Box<Join>),
    Subquery {
        select: Box<Select>,
        alias: Cow<'static, str>,
    },
}

impl Source {
    pub fn subquery(select: Select, alias: impl Into<Cow<'static, str>>) -> Self {
        Source::Subquery {
            select: select.into(),
            alias: alias.into(),
        }
    }
    pub fn join(self, kind: JoinType, right: impl Into<Source>, on: Option<Expr>) -> Result<Self> {
        if let Some(on) = &on {
            check_predicate(on, "JOIN ON")?;
        }
        Ok(Source::Join(
            Join {
                kind,
                left: self,
                right: right.into(),
                on,
            }
            .into(),
        ))
    }
    pub fn inner_join(self, right: impl Into<Source>, on: Expr) -> Result<Self> {
        self.join(JoinType::Inner, right, Some(on))
    }
    pub fn left_join(self, right: impl Into<Source>, on: Expr) -> Result<Self> {
        self.join(JoinType::Left, right, Some(on))
    }
    pub fn right_join(self, right: impl Into<Source>, on: Expr) -> Result<Self> {
        self.join(JoinType::Right, right, Some(on))
    }
    pub fn full_join(self, right: impl Into<Source>, on: Expr) -> Result<Self> {
        self.join(JoinType::Full, right, Some(on))
    }
    pub fn cross_join(self, right: impl Into<Source>) -> Result<Self> {
        self.join(JoinType::Cross, right, None)
    }
    pub fn natural_join(self, right: impl Into<Source>) -> Result<Self> {
        self.join(JoinType::Natural, right, None)
    }
    /// Names the leaves of the source are referred to by, in declaration order.
    pub fn aliases(&self) -> Vec<&str> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(source) = stack.pop() {
            match source {
                Source::Table(table) => result.push(table.label_prefix()),
                Source::Join(join) => {
                    stack.push(&join.right);
                    stack.push(&join.left);
                }
                Source::Subquery { alias, .. } => result.push(alias.as_ref()),
            }
        }
        result
    }
    /// Leaf tables, in declaration order.
    pub fn tables(&self) -> Vec<&Table> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(source) = stack.pop() {
            match source {
                Source::Table(table) => result.push(table),
                Source::Join(join) => {
                    stack.push(&join.right);
                    stack.push(&join.left);
                }
                Source::Subquery { .. } => {}
            }
        }
        result
    }
    fn has_subquery(&self) -> bool {
        match self {
            Source::Table(..) => false,
            Source::Join(join) => join.left.has_subquery() || join.right.has_subquery(),
            Source::Subquery { .. } => true,
        }
    }
}

impl From<Table> for Source {
    fn from(value: Table) -> Self {
        Source::Table(value)
    }
}

impl From<&Table> for Source {
    fn from(value: &Table) -> Self {
        Source::Table(value.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub label: Option<Cow<'static, str>>,
}

impl SelectColumn {
    /// Explicit label, or `{alias}_{column}` for column references.
    pub fn label(&self) -> Option<Cow<'_, str>> {
        match (&self.label, &self.expr) {
            (Some(label), _) => Some(Cow::Borrowed(label)),
            (None, Expr::Column(column)) => Some(Cow::Owned(column.label())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpType {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub kind: SetOpType,
    pub select: Select,
}

/// Select statement.
///
/// With set operations, ordering and pagination of the leftmost select apply
/// to the whole compound result.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub source: Source,
    pub columns: Vec<SelectColumn>,
    pub distinct: bool,
    pub predicate: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub set_op: Option<Box<SetOp>>,
}

impl Select {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            columns: Vec::new(),
            distinct: false,
            predicate: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_op: None,
        }
    }
    pub fn column(mut self, expr: impl IntoExpr) -> Self {
        self.columns.push(SelectColumn {
            expr: expr.into_expr(),
            label: None,
        });
        self
    }
    pub fn labeled(mut self, expr: impl IntoExpr, label: impl Into<Cow<'static, str>>) -> Self {
        self.columns.push(SelectColumn {
            expr: expr.into_expr(),
            label: Some(label.into()),
        });
        self
    }
    pub fn columns<E: IntoExpr>(mut self, exprs: impl IntoIterator<Item = E>) -> Self {
        self.columns.extend(exprs.into_iter().map(|e| SelectColumn {
            expr: e.into_expr(),
            label: None,
        }));
        self
    }
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
    /// Adds a predicate, joined with `AND` to the existing one.
    pub fn filter(mut self, predicate: Expr) -> Result<Self> {
        self.predicate = combine(self.predicate.take(), predicate)?;
        Ok(self)
    }
    pub fn group_by(mut self, expr: impl IntoExpr) -> Self {
        self.group_by.push(expr.into_expr());
        self
    }
    pub fn having(mut self, predicate: Expr) -> Result<Self> {
        self.having = combine(self.having.take(), predicate)?;
        Ok(self)
    }
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
    fn set_operation(mut self, kind: SetOpType, select: Select) -> Self {
        self.set_op = Some(match self.set_op.take() {
            None => SetOp { kind, select }.into(),
            Some(op) => {
                let SetOp {
                    kind: current,
                    select: next,
                } = *op;
                SetOp {
                    kind: current,
                    select: next.set_operation(kind, select),
                }
                .into()
            }
        });
        self
    }
    pub fn union(self, select: Select) -> Self {
        self.set_operation(SetOpType::Union, select)
    }
    pub fn union_all(self, select: Select) -> Self {
        self.set_operation(SetOpType::UnionAll, select)
    }
    pub fn intersect(self, select: Select) -> Self {
        self.set_operation(SetOpType::Intersect, select)
    }
    pub fn except(self, select: Select) -> Self {
        self.set_operation(SetOpType::Except, select)
    }
    /// Columns the select produces: the declared ones, or every column of every
    /// leaf table. Empty when a subquery leaf makes the shape unknown.
    pub fn selected_columns(&self) -> Vec<SelectColumn> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        if self.source.has_subquery() {
            return Vec::new();
        }
        self.source
            .tables()
            .into_iter()
            .flat_map(|t| t.all_columns())
            .map(|c| SelectColumn {
                expr: Expr::Column(c),
                label: None,
            })
            .collect()
    }
    /// Index of the column labeled `label` in the result rows.
    pub fn column_index(&self, column: &Column) -> Option<usize> {
        let label = column.label();
        self.selected_columns()
            .iter()
            .position(|c| c.label().as_deref() == Some(label.as_str()))
    }
    pub(crate) fn validate(&self) -> Result<()> {
        let mut op = &self.set_op;
        while let Some(set_op) = op {
            let select = &set_op.select;
            if !select.order_by.is_empty() || select.limit.is_some() || select.offset.is_some() {
                return Err(Error::msg(
                    "Ordering and pagination of a compound select belong to its first select",
                ));
            }
            op = &select.set_op;
        }
        Ok(())
    }
}
