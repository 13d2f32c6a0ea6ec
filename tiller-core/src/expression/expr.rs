use crate::{AggregateType, BinaryOpType, Codec, Column, OrderBy, Select, UnaryOpType, Value};
use std::borrow::Cow;

/// Literal bound as a positional parameter, encoded by `codec` at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Value,
    pub codec: Codec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOpType,
    pub operand: Box<Expr>,
    pub value_type: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: BinaryOpType,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub value_type: Value,
}

/// Flat chain of operands joined by `AND` or `OR`.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub op: BinaryOpType,
    pub operands: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Cow<'static, str>,
    pub arguments: Vec<Expr>,
    pub value_type: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseWhen {
    pub branches: Vec<(Expr, Expr)>,
    pub otherwise: Option<Box<Expr>>,
    pub value_type: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateType,
    /// `None` is `COUNT(*)`.
    pub argument: Option<Box<Expr>>,
    pub distinct: bool,
    pub value_type: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowOver {
    pub function: Box<Expr>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderBy>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    List(Vec<Expr>),
    Subquery(Box<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InList {
    pub expr: Box<Expr>,
    pub values: InValues,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub expr: Box<Expr>,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exists {
    pub subquery: Box<Select>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub expr: Box<Expr>,
    pub value_type: Value,
}

/// Immutable expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Argument(Argument),
    Column(Column),
    /// Value proposed for a column by the row that hit an insert conflict.
    Excluded(Column),
    UnaryOp(UnaryOp),
    BinaryOp(BinaryOp),
    Junction(Junction),
    Function(FunctionCall),
    Case(CaseWhen),
    Subquery(Box<Select>),
    Exists(Exists),
    InList(InList),
    Between(Between),
    Aggregate(Aggregate),
    Window(WindowOver),
    Cast(Cast),
}

impl Expr {
    /// Declared type of the value the node evaluates to.
    pub fn value_type(&self) -> Value {
        match self {
            Expr::Argument(v) => v.codec.value_type(),
            Expr::Column(v) | Expr::Excluded(v) => v.value_type(),
            Expr::UnaryOp(v) => v.value_type.clone(),
            Expr::BinaryOp(v) => v.value_type.clone(),
            Expr::Junction(..) | Expr::Exists(..) | Expr::InList(..) | Expr::Between(..) => {
                Value::Boolean(None)
            }
            Expr::Function(v) => v.value_type.clone(),
            Expr::Case(v) => v.value_type.clone(),
            Expr::Subquery(v) => v
                .columns
                .first()
                .map(|c| c.expr.value_type())
                .unwrap_or_default(),
            Expr::Aggregate(v) => v.value_type.clone(),
            Expr::Window(v) => v.function.value_type(),
            Expr::Cast(v) => v.value_type.clone(),
        }
    }

    /// Codec decoding values of this expression, the column codec for columns.
    pub fn codec(&self) -> Codec {
        match self {
            Expr::Argument(v) => v.codec.clone(),
            Expr::Column(v) | Expr::Excluded(v) => v.codec().clone(),
            _ => Codec::standard(&self.value_type()),
        }
    }
}

impl From<Column> for Expr {
    fn from(value: Column) -> Self {
        Expr::Column(value)
    }
}

impl From<&Column> for Expr {
    fn from(value: &Column) -> Self {
        Expr::Column(value.clone())
    }
}
