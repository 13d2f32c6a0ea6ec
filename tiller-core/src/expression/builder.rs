use crate::{
    Aggregate, AggregateType, Argument, AsValue, Between, BinaryOp, BinaryOpType, Cast, CaseWhen,
    Codec, Column, Exists, Expr, FunctionCall, InList, InValues, Junction, Order, OrderBy, Result,
    Select, TillerError, UnaryOp, UnaryOpType, Value, ValueKind, WindowOver,
};
use std::borrow::Cow;

/// Right hand side of an operator, literals take the codec of the left side.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    Value(Value),
}

impl From<Expr> for Operand {
    fn from(value: Expr) -> Self {
        Operand::Expr(value)
    }
}

impl From<Column> for Operand {
    fn from(value: Column) -> Self {
        Operand::Expr(Expr::Column(value))
    }
}

impl From<&Column> for Operand {
    fn from(value: &Column) -> Self {
        Operand::Expr(Expr::Column(value.clone()))
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl<T: AsValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.as_value())
    }
}

impl Operand {
    /// Expression of the operand, literals are checked against `peer` and encoded with its codec.
    pub fn lift(self, peer: &Expr, operation: &str) -> Result<Expr> {
        match self {
            Operand::Expr(e) => Ok(e),
            Operand::Value(value) => {
                let expected = peer.value_type();
                if !expected.is_compatible(&value) {
                    return Err(TillerError::type_mismatch(operation, &expected, &value).into());
                }
                let codec = peer.codec();
                // Lossy narrowing or an unconvertible shape is a mismatch, not a render failure
                if let Err(e) = codec.encode(value.clone()) {
                    return Err(e.context(TillerError::type_mismatch(operation, &expected, &value)));
                }
                Ok(Expr::Argument(Argument { value, codec }))
            }
        }
    }
    /// Expression of the operand, literals get the standard codec of their own type.
    pub fn into_expr(self) -> Expr {
        match self {
            Operand::Expr(e) => e,
            Operand::Value(value) => Expr::Argument(Argument {
                codec: Codec::standard(&value),
                value,
            }),
        }
    }
}

pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Column {
    fn into_expr(self) -> Expr {
        Expr::Column(self)
    }
}

impl IntoExpr for &Column {
    fn into_expr(self) -> Expr {
        Expr::Column(self.clone())
    }
}

fn is_kind(value: &Value, kind: ValueKind) -> bool {
    matches!(value.kind(), ValueKind::Null) || value.kind() == kind
}

fn check(condition: bool, operation: impl ToString, lhs: &Expr, rhs: &Expr) -> Result<()> {
    if !condition {
        return Err(TillerError::type_mismatch(
            operation.to_string(),
            &lhs.value_type(),
            &rhs.value_type(),
        )
        .into());
    }
    Ok(())
}

fn binary(op: BinaryOpType, lhs: Expr, rhs: impl Into<Operand>) -> Result<Expr> {
    let rhs = rhs.into().lift(&lhs, &op.to_string())?;
    let (l, r) = (lhs.value_type(), rhs.value_type());
    let value_type = match op {
        BinaryOpType::And | BinaryOpType::Or => {
            check(
                is_kind(&l, ValueKind::Boolean) && is_kind(&r, ValueKind::Boolean),
                op,
                &lhs,
                &rhs,
            )?;
            return Ok(junction(op, lhs, rhs));
        }
        BinaryOpType::Like | BinaryOpType::NotLike => {
            check(
                is_kind(&l, ValueKind::Text) && is_kind(&r, ValueKind::Text),
                op,
                &lhs,
                &rhs,
            )?;
            Value::Boolean(None)
        }
        op if op.is_arithmetic() => {
            check(
                is_kind(&l, ValueKind::Numeric) && is_kind(&r, ValueKind::Numeric),
                op,
                &lhs,
                &rhs,
            )?;
            if matches!(l, Value::Null) { r } else { l }
        }
        _ => {
            check(l.is_compatible(&r), op, &lhs, &rhs)?;
            Value::Boolean(None)
        }
    };
    Ok(Expr::BinaryOp(BinaryOp {
        op,
        lhs: lhs.into(),
        rhs: rhs.into(),
        value_type,
    }))
}

/// Appends to an existing chain of the same operator instead of nesting.
fn junction(op: BinaryOpType, lhs: Expr, rhs: Expr) -> Expr {
    let mut operands = match lhs {
        Expr::Junction(j) if j.op == op => j.operands,
        other => vec![other],
    };
    match rhs {
        Expr::Junction(j) if j.op == op => operands.extend(j.operands),
        other => operands.push(other),
    }
    Expr::Junction(Junction { op, operands })
}

/// Typed operators available on columns and expressions.
///
/// ```rust
/// use tiller_core::{ExprBuilder, Table, Value};
/// let table = Table::builder("t")
///     .column("salary", Value::Int64(None))
///     .build()
///     .unwrap();
/// let salary = table.column("salary").unwrap();
/// assert!((&salary).greater(100i64).is_ok());
/// assert!(salary.greater("a lot").is_err());
/// ```
pub trait ExprBuilder: IntoExpr + Sized {
    fn equal(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Equal, self.into_expr(), rhs)
    }
    fn not_equal(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::NotEqual, self.into_expr(), rhs)
    }
    fn less(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Less, self.into_expr(), rhs)
    }
    fn less_equal(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::LessEqual, self.into_expr(), rhs)
    }
    fn greater(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Greater, self.into_expr(), rhs)
    }
    fn greater_equal(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::GreaterEqual, self.into_expr(), rhs)
    }
    fn like(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Like, self.into_expr(), rhs)
    }
    fn not_like(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::NotLike, self.into_expr(), rhs)
    }
    fn plus(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Addition, self.into_expr(), rhs)
    }
    fn minus(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Subtraction, self.into_expr(), rhs)
    }
    fn times(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Multiplication, self.into_expr(), rhs)
    }
    fn div(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Division, self.into_expr(), rhs)
    }
    fn rem(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Remainder, self.into_expr(), rhs)
    }
    fn and(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::And, self.into_expr(), rhs)
    }
    fn or(self, rhs: impl Into<Operand>) -> Result<Expr> {
        binary(BinaryOpType::Or, self.into_expr(), rhs)
    }
    fn not(self) -> Result<Expr> {
        let operand = self.into_expr();
        let value_type = operand.value_type();
        if !is_kind(&value_type, ValueKind::Boolean) {
            return Err(
                TillerError::type_mismatch("NOT", &value_type, &Value::Boolean(None)).into(),
            );
        }
        Ok(Expr::UnaryOp(UnaryOp {
            op: UnaryOpType::Not,
            operand: operand.into(),
            value_type: Value::Boolean(None),
        }))
    }
    fn negate(self) -> Result<Expr> {
        let operand = self.into_expr();
        let value_type = operand.value_type();
        if !is_kind(&value_type, ValueKind::Numeric) {
            return Err(TillerError::type_mismatch("-", &value_type, &Value::Int64(None)).into());
        }
        Ok(Expr::UnaryOp(UnaryOp {
            op: UnaryOpType::Negative,
            operand: operand.into(),
            value_type,
        }))
    }
    fn is_null(self) -> Expr {
        Expr::UnaryOp(UnaryOp {
            op: UnaryOpType::IsNull,
            operand: self.into_expr().into(),
            value_type: Value::Boolean(None),
        })
    }
    fn is_not_null(self) -> Expr {
        Expr::UnaryOp(UnaryOp {
            op: UnaryOpType::IsNotNull,
            operand: self.into_expr().into(),
            value_type: Value::Boolean(None),
        })
    }
    fn in_list<V: Into<Operand>>(self, values: impl IntoIterator<Item = V>) -> Result<Expr> {
        in_list(self.into_expr(), values, false)
    }
    fn not_in_list<V: Into<Operand>>(self, values: impl IntoIterator<Item = V>) -> Result<Expr> {
        in_list(self.into_expr(), values, true)
    }
    fn in_subquery(self, subquery: Select) -> Result<Expr> {
        let expr = self.into_expr();
        let Some(column) = subquery.columns.first() else {
            return Err(crate::Error::msg(
                "A subquery used with IN must select exactly one column",
            ));
        };
        check(
            subquery.columns.len() == 1
                && expr.value_type().is_compatible(&column.expr.value_type()),
            "IN",
            &expr,
            &column.expr,
        )?;
        Ok(Expr::InList(InList {
            expr: expr.into(),
            values: InValues::Subquery(subquery.into()),
            negated: false,
        }))
    }
    fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Result<Expr> {
        let expr = self.into_expr();
        let low = low.into().lift(&expr, "BETWEEN")?;
        let high = high.into().lift(&expr, "BETWEEN")?;
        check(
            expr.value_type().is_compatible(&low.value_type()),
            "BETWEEN",
            &expr,
            &low,
        )?;
        check(
            expr.value_type().is_compatible(&high.value_type()),
            "BETWEEN",
            &expr,
            &high,
        )?;
        Ok(Expr::Between(Between {
            expr: expr.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }))
    }
    fn cast(self, value_type: Value) -> Expr {
        Expr::Cast(Cast {
            expr: self.into_expr().into(),
            value_type: value_type.as_null(),
        })
    }
    /// Window function call, `ROW_NUMBER() OVER (PARTITION BY .. ORDER BY ..)`.
    fn over(self, partition_by: Vec<Expr>, order_by: Vec<OrderBy>) -> Expr {
        Expr::Window(WindowOver {
            function: self.into_expr().into(),
            partition_by,
            order_by,
        })
    }
    fn asc(self) -> OrderBy {
        OrderBy {
            expr: self.into_expr(),
            order: Order::ASC,
        }
    }
    fn desc(self) -> OrderBy {
        OrderBy {
            expr: self.into_expr(),
            order: Order::DESC,
        }
    }
}

impl<T: IntoExpr> ExprBuilder for T {}

fn in_list<V: Into<Operand>>(
    expr: Expr,
    values: impl IntoIterator<Item = V>,
    negated: bool,
) -> Result<Expr> {
    let values = values
        .into_iter()
        .map(|v| {
            let v = v.into().lift(&expr, "IN")?;
            check(
                expr.value_type().is_compatible(&v.value_type()),
                "IN",
                &expr,
                &v,
            )?;
            Ok(v)
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(crate::Error::msg("IN requires at least one value"));
    }
    Ok(Expr::InList(InList {
        expr: expr.into(),
        values: InValues::List(values),
        negated,
    }))
}

impl Expr {
    /// Literal with the standard codec of its type.
    pub fn literal(value: impl AsValue) -> Expr {
        Operand::Value(value.as_value()).into_expr()
    }
}

impl Column {
    /// The value the conflicting row proposed for this column, usable in upsert assignments.
    pub fn excluded(&self) -> Expr {
        Expr::Excluded(self.clone())
    }
}

fn fold_all(
    op: BinaryOpType,
    predicates: impl IntoIterator<Item = Expr>,
    empty: bool,
) -> Result<Expr> {
    let mut operands = Vec::new();
    for predicate in predicates {
        let value_type = predicate.value_type();
        if !is_kind(&value_type, ValueKind::Boolean) {
            return Err(
                TillerError::type_mismatch(op.to_string(), &Value::Boolean(None), &value_type)
                    .into(),
            );
        }
        match predicate {
            Expr::Junction(j) if j.op == op => operands.extend(j.operands),
            p => operands.push(p),
        }
    }
    Ok(match operands.len() {
        0 => Expr::literal(empty),
        1 => operands.remove(0),
        _ => Expr::Junction(Junction { op, operands }),
    })
}

/// Conjunction of all the predicates, `true` when there are none.
///
/// The chain is accumulated iteratively into a single node, the size of the
/// input does not affect the stack depth of building, rendering or dropping it.
pub fn and_all(predicates: impl IntoIterator<Item = Expr>) -> Result<Expr> {
    fold_all(BinaryOpType::And, predicates, true)
}

/// Disjunction of all the predicates, `false` when there are none.
pub fn or_all(predicates: impl IntoIterator<Item = Expr>) -> Result<Expr> {
    fold_all(BinaryOpType::Or, predicates, false)
}

pub fn function(
    name: impl Into<Cow<'static, str>>,
    arguments: impl IntoIterator<Item = Expr>,
    value_type: Value,
) -> Expr {
    Expr::Function(FunctionCall {
        name: name.into(),
        arguments: arguments.into_iter().collect(),
        value_type: value_type.as_null(),
    })
}

pub fn row_number() -> Expr {
    function("ROW_NUMBER", [], Value::Int64(None))
}

fn aggregate(function: AggregateType, argument: Option<Expr>, distinct: bool) -> Result<Expr> {
    let value_type = match (function, &argument) {
        (AggregateType::Count, _) => Value::Int64(None),
        (AggregateType::Avg, _) => Value::Float64(None),
        (_, Some(argument)) => argument.value_type(),
        (_, None) => Value::Null,
    };
    if let (AggregateType::Sum | AggregateType::Avg, Some(argument)) = (function, &argument) {
        let argument_type = argument.value_type();
        if !is_kind(&argument_type, ValueKind::Numeric) {
            return Err(TillerError::type_mismatch(
                function.name(),
                &Value::Float64(None),
                &argument_type,
            )
            .into());
        }
    }
    Ok(Expr::Aggregate(Aggregate {
        function,
        argument: argument.map(Box::new),
        distinct,
        value_type,
    }))
}

pub fn count_all() -> Expr {
    Expr::Aggregate(Aggregate {
        function: AggregateType::Count,
        argument: None,
        distinct: false,
        value_type: Value::Int64(None),
    })
}

pub fn count(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Count, Some(expr.into_expr()), false)
}

pub fn count_distinct(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Count, Some(expr.into_expr()), true)
}

pub fn sum(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Sum, Some(expr.into_expr()), false)
}

pub fn avg(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Avg, Some(expr.into_expr()), false)
}

pub fn min(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Min, Some(expr.into_expr()), false)
}

pub fn max(expr: impl IntoExpr) -> Result<Expr> {
    aggregate(AggregateType::Max, Some(expr.into_expr()), false)
}

pub fn exists(subquery: Select) -> Expr {
    Expr::Exists(Exists {
        subquery: subquery.into(),
        negated: false,
    })
}

pub fn not_exists(subquery: Select) -> Expr {
    Expr::Exists(Exists {
        subquery: subquery.into(),
        negated: true,
    })
}

/// Scalar subquery, its type is the one of the first selected column.
pub fn subquery(select: Select) -> Expr {
    Expr::Subquery(select.into())
}

pub fn case_when() -> CaseBuilder {
    CaseBuilder {
        branches: Vec::new(),
    }
}

pub struct CaseBuilder {
    branches: Vec<(Expr, Expr)>,
}

impl CaseBuilder {
    pub fn when(mut self, condition: impl IntoExpr, result: impl Into<Operand>) -> Result<Self> {
        let condition = condition.into_expr();
        let condition_type = condition.value_type();
        if !is_kind(&condition_type, ValueKind::Boolean) {
            return Err(TillerError::type_mismatch(
                "CASE WHEN",
                &Value::Boolean(None),
                &condition_type,
            )
            .into());
        }
        let result = match self.branches.first() {
            Some((_, first)) => result.into().lift(first, "CASE WHEN")?,
            None => result.into().into_expr(),
        };
        if let Some((_, first)) = self.branches.first() {
            check(
                first.value_type().is_compatible(&result.value_type()),
                "CASE WHEN",
                first,
                &result,
            )?;
        }
        self.branches.push((condition, result));
        Ok(self)
    }
    pub fn otherwise(self, result: impl Into<Operand>) -> Result<Expr> {
        let Some((_, first)) = self.branches.first() else {
            return Err(crate::Error::msg("CASE requires at least one WHEN branch"));
        };
        let result = result.into().lift(first, "CASE ELSE")?;
        check(
            first.value_type().is_compatible(&result.value_type()),
            "CASE ELSE",
            first,
            &result,
        )?;
        self.finish(Some(result))
    }
    pub fn end(self) -> Result<Expr> {
        self.finish(None)
    }
    fn finish(self, otherwise: Option<Expr>) -> Result<Expr> {
        let Some((_, first)) = self.branches.first() else {
            return Err(crate::Error::msg("CASE requires at least one WHEN branch"));
        };
        let value_type = first.value_type();
        Ok(Expr::Case(CaseWhen {
            branches: self.branches,
            otherwise: otherwise.map(Box::new),
            value_type,
        }))
    }
}
