use crate::{Error, Result, Value};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// `try_from_value` accepts the canonical variant of the type and the other
/// integer widths when the value fits, every other variant is an error. Wire
/// representations (text dates, integer booleans) are the business of the
/// column codecs, not of this trait.
///
/// ```rust
/// use tiller_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Null value of the variant this type maps to.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} to {}",
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                let wide: i64 = match value {
                    $destination(Some(v)) => return Ok(v),
                    Value::Int8(Some(v)) => v as i64,
                    Value::Int16(Some(v)) => v as i64,
                    Value::Int32(Some(v)) => v as i64,
                    Value::Int64(Some(v)) => v,
                    ref v => return Err(conversion_error::<Self>(v)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {} is out of range for {}",
                        wide,
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);

/// Integer as `f32`, only when it survives the round trip.
fn exact_f32(v: i64) -> Result<f32> {
    let f = v as f32;
    if f as i128 != v as i128 {
        return Err(Error::msg(format!("Value {} cannot be represented as f32", v)));
    }
    Ok(f)
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    ref v => Err(conversion_error::<Self>(v)),
                }
            }
        }
    };
}
impl_as_value!(bool, Value::Boolean);
impl_as_value!(
    f32,
    Value::Float32,
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::Int32(Some(v)) => exact_f32(v as i64),
    Value::Int64(Some(v)) => exact_f32(v),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Float32(Some(v)) => Ok(v as _),
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::Int32(Some(v)) => Ok(v as _),
    Value::Int64(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v)) => v
        .to_f64()
        .ok_or_else(|| Error::msg(format!("Cannot represent decimal {} as f64", v))),
);
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int8(Some(v)) => Ok(v.into()),
    Value::Int16(Some(v)) => Ok(v.into()),
    Value::Int32(Some(v)) => Ok(v.into()),
    Value::Int64(Some(v)) => Ok(v.into()),
    Value::Float32(Some(v)) => Decimal::from_f32(v)
        .ok_or_else(|| Error::msg(format!("Cannot represent {} as a decimal", v))),
    Value::Float64(Some(v)) => Decimal::from_f64(v)
        .ok_or_else(|| Error::msg(format!("Cannot represent {} as a decimal", v))),
);
impl_as_value!(String, Value::Varchar);
impl_as_value!(Box<[u8]>, Value::Blob);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone);
impl_as_value!(Uuid, Value::Uuid);

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Err(conversion_error::<Self>(&value))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}
