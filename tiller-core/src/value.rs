use rust_decimal::Decimal;
use std::mem::discriminant;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed scalar.
///
/// A variant with a `None` payload is both a SQL `NULL` and the prototype of
/// the type, codecs and expressions declare their type this way.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

/// Families of values that can be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Numeric,
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
    Uuid,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (l, r) if l.is_null() && r.is_null() => true,
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => false,
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::TimestampWithTimezone(None)
            | Value::Uuid(None) => true,
            _ => false,
        }
    }

    /// The null prototype of the same variant.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(..) => ValueKind::Boolean,
            Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..)
            | Value::Float32(..)
            | Value::Float64(..)
            | Value::Decimal(..) => ValueKind::Numeric,
            Value::Varchar(..) => ValueKind::Text,
            Value::Blob(..) => ValueKind::Binary,
            Value::Date(..) => ValueKind::Date,
            Value::Time(..) => ValueKind::Time,
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => ValueKind::Timestamp,
            Value::Uuid(..) => ValueKind::Uuid,
        }
    }

    /// Whether values of the two types can meet in a comparison.
    pub fn is_compatible(&self, other: &Value) -> bool {
        let (l, r) = (self.kind(), other.kind());
        l == ValueKind::Null || r == ValueKind::Null || l == r
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ValueKind::Numeric
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "BOOLEAN",
            Value::Int8(..) => "INT8",
            Value::Int16(..) => "INT16",
            Value::Int32(..) => "INT32",
            Value::Int64(..) => "INT64",
            Value::Float32(..) => "FLOAT32",
            Value::Float64(..) => "FLOAT64",
            Value::Decimal(..) => "DECIMAL",
            Value::Varchar(..) => "VARCHAR",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMPTZ",
            Value::Uuid(..) => "UUID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_compare_equal_across_variants() {
        assert_eq!(Value::Int32(None), Value::Null);
        assert_eq!(Value::Varchar(None), Value::Date(None));
        assert_ne!(Value::Int32(Some(1)), Value::Int64(Some(1)));
        assert_ne!(Value::Float64(Some(1.0)), Value::Null);
    }

    #[test]
    fn compatibility_follows_kind() {
        assert!(Value::Int32(None).is_compatible(&Value::Decimal(None)));
        assert!(Value::Timestamp(None).is_compatible(&Value::TimestampWithTimezone(None)));
        assert!(Value::Null.is_compatible(&Value::Blob(None)));
        assert!(!Value::Varchar(None).is_compatible(&Value::Int64(None)));
        assert!(!Value::Boolean(None).is_compatible(&Value::Int8(None)));
    }
}
