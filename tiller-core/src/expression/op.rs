use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    Like,
    NotLike,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOpType {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOpType::Equal
                | BinaryOpType::NotEqual
                | BinaryOpType::Less
                | BinaryOpType::Greater
                | BinaryOpType::LessEqual
                | BinaryOpType::GreaterEqual
        )
    }
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOpType::Multiplication
                | BinaryOpType::Division
                | BinaryOpType::Remainder
                | BinaryOpType::Addition
                | BinaryOpType::Subtraction
        )
    }
}

impl Display for BinaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Remainder => "%",
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::Like => "LIKE",
            BinaryOpType::NotLike => "NOT LIKE",
            BinaryOpType::Equal => "=",
            BinaryOpType::NotEqual => "!=",
            BinaryOpType::Less => "<",
            BinaryOpType::Greater => ">",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::And => "AND",
            BinaryOpType::Or => "OR",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    Negative,
    Not,
    IsNull,
    IsNotNull,
}

impl Display for UnaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOpType::Negative => "-",
            UnaryOpType::Not => "NOT",
            UnaryOpType::IsNull => "IS NULL",
            UnaryOpType::IsNotNull => "IS NOT NULL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateType {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateType::Count => "COUNT",
            AggregateType::Sum => "SUM",
            AggregateType::Avg => "AVG",
            AggregateType::Min => "MIN",
            AggregateType::Max => "MAX",
        }
    }
}
