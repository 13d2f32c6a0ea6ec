use crate::{AsValue, Error, Result, Value};
use rust_decimal::Decimal;
use std::{
    fmt::{self, Debug, Formatter},
    str::FromStr,
    sync::{Arc, LazyLock},
};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Moves values between their typed form and the form a driver stores.
pub trait ValueCodec: Send + Sync {
    fn name(&self) -> &str;
    /// Declared type, a null [`Value`] of the decoded variant.
    fn value_type(&self) -> Value;
    /// Typed value to the value bound as a query parameter.
    fn encode(&self, value: Value) -> Result<Value>;
    /// Value returned by the driver to the declared type.
    fn decode(&self, value: Value) -> Result<Value>;
}

/// Shared handle to a [`ValueCodec`].
#[derive(Clone)]
pub struct Codec(Arc<dyn ValueCodec>);

impl Codec {
    pub fn new(codec: impl ValueCodec + 'static) -> Self {
        Self(Arc::new(codec))
    }
    /// Built in codec of the variant of `value_type`.
    pub fn standard(value_type: &Value) -> Self {
        Self::new(StandardCodec(value_type.as_null()))
    }
    /// Codec mapping a property type onto the column type of `inner`.
    pub fn transform(
        name: &'static str,
        inner: Codec,
        value_type: Value,
        to_column: fn(Value) -> Result<Value>,
        from_column: fn(Value) -> Result<Value>,
    ) -> Self {
        Self::new(TransformCodec {
            name,
            inner,
            value_type: value_type.as_null(),
            to_column,
            from_column,
        })
    }
    pub fn name(&self) -> &str {
        self.0.name()
    }
    pub fn value_type(&self) -> Value {
        self.0.value_type()
    }
    pub fn encode(&self, value: Value) -> Result<Value> {
        self.0.encode(value)
    }
    pub fn decode(&self, value: Value) -> Result<Value> {
        self.0.decode(value)
    }
    /// `value` converted to the declared type, unchanged when the conversion fails.
    pub fn normalize(&self, value: Value) -> Value {
        let value_type = self.value_type();
        if value.same_type(&value_type) {
            return value;
        }
        coerce(&value_type, value.clone()).unwrap_or(value)
    }
}

impl PartialEq for Codec {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.name() == other.name() && self.value_type().same_type(&other.value_type()))
    }
}

impl Debug for Codec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Codec({}: {})", self.name(), self.value_type().type_name())
    }
}

/// Codec of the primitive variants, converting between compatible shapes.
#[derive(Debug)]
pub struct StandardCodec(Value);

impl ValueCodec for StandardCodec {
    fn name(&self) -> &str {
        self.0.type_name()
    }
    fn value_type(&self) -> Value {
        self.0.clone()
    }
    fn encode(&self, value: Value) -> Result<Value> {
        coerce(&self.0, value)
    }
    fn decode(&self, value: Value) -> Result<Value> {
        coerce(&self.0, value)
    }
}

struct TransformCodec {
    name: &'static str,
    inner: Codec,
    value_type: Value,
    to_column: fn(Value) -> Result<Value>,
    from_column: fn(Value) -> Result<Value>,
}

impl ValueCodec for TransformCodec {
    fn name(&self) -> &str {
        self.name
    }
    fn value_type(&self) -> Value {
        self.value_type.clone()
    }
    fn encode(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return self.inner.encode(self.inner.value_type());
        }
        self.inner
            .encode((self.to_column)(coerce(&self.value_type, value)?)?)
    }
    fn decode(&self, value: Value) -> Result<Value> {
        let value = self.inner.decode(value)?;
        if value.is_null() {
            return Ok(self.value_type.clone());
        }
        coerce(&self.value_type, (self.from_column)(value)?)
    }
}

fn parse_error(value: &str, target: &Value) -> Error {
    Error::msg(format!(
        "Cannot decode `{}` as {}",
        value,
        target.type_name()
    ))
}

fn parse_time(value: &str) -> Result<Time> {
    Time::parse(value, format_description!("[hour]:[minute]:[second].[subsecond]"))
        .or_else(|_| Time::parse(value, format_description!("[hour]:[minute]:[second]")))
        .map_err(|_| parse_error(value, &Value::Time(None)))
}

fn parse_timestamp(value: &str) -> Result<PrimitiveDateTime> {
    let (date, time) = value
        .split_once([' ', 'T'])
        .ok_or_else(|| parse_error(value, &Value::Timestamp(None)))?;
    let date = Date::parse(date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| parse_error(value, &Value::Timestamp(None)))?;
    Ok(PrimitiveDateTime::new(date, parse_time(time)?))
}

/// Converts `value` into the variant of `target`.
fn coerce(target: &Value, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(target.as_null());
    }
    if value.same_type(target) || matches!(target, Value::Null) {
        return Ok(value);
    }
    Ok(match (target, value) {
        (Value::Boolean(..), Value::Int8(Some(v))) => Value::Boolean(Some(v != 0)),
        (Value::Boolean(..), Value::Int16(Some(v))) => Value::Boolean(Some(v != 0)),
        (Value::Boolean(..), Value::Int32(Some(v))) => Value::Boolean(Some(v != 0)),
        (Value::Boolean(..), Value::Int64(Some(v))) => Value::Boolean(Some(v != 0)),
        (Value::Int8(..), v) => i8::try_from_value(v)?.as_value(),
        (Value::Int16(..), v) => i16::try_from_value(v)?.as_value(),
        (Value::Int32(..), v) => i32::try_from_value(v)?.as_value(),
        (Value::Int64(..), v) => i64::try_from_value(v)?.as_value(),
        (Value::Float32(..), Value::Float64(Some(v))) if v.is_nan() || v as f32 as f64 == v => {
            Value::Float32(Some(v as f32))
        }
        (Value::Float32(..), v) => f32::try_from_value(v)?.as_value(),
        (Value::Float64(..), v) => f64::try_from_value(v)?.as_value(),
        (Value::Decimal(..), Value::Varchar(Some(v))) => Value::Decimal(Some(
            Decimal::from_str(v.trim()).map_err(|_| parse_error(&v, target))?,
        )),
        (Value::Decimal(..), v) => Decimal::try_from_value(v)?.as_value(),
        (Value::Date(..), Value::Varchar(Some(v))) => Value::Date(Some(
            Date::parse(&v, format_description!("[year]-[month]-[day]"))
                .map_err(|_| parse_error(&v, target))?,
        )),
        (Value::Time(..), Value::Varchar(Some(v))) => Value::Time(Some(parse_time(&v)?)),
        (Value::Timestamp(..), Value::Varchar(Some(v))) => {
            Value::Timestamp(Some(parse_timestamp(&v)?))
        }
        (Value::TimestampWithTimezone(..), Value::Varchar(Some(v))) => {
            Value::TimestampWithTimezone(Some(
                OffsetDateTime::parse(&v, &Rfc3339).map_err(|_| parse_error(&v, target))?,
            ))
        }
        (Value::Uuid(..), Value::Varchar(Some(v))) => Value::Uuid(Some(
            Uuid::parse_str(&v).map_err(|_| parse_error(&v, target))?,
        )),
        (Value::Uuid(..), Value::Blob(Some(v))) => Value::Uuid(Some(Uuid::from_slice(&v)?)),
        (target, v) => {
            return Err(Error::msg(format!(
                "Cannot convert {:?} to {}",
                v,
                target.type_name()
            )));
        }
    })
}

/// Maps declared value types to codecs.
///
/// Resolution walks the codecs registered by the user, in registration order,
/// then the built in ones. The first codec declaring the same variant wins.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    custom: Vec<Codec>,
    builtin: Vec<Codec>,
}

static STANDARD_REGISTRY: LazyLock<CodecRegistry> = LazyLock::new(CodecRegistry::new);

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            builtin: [
                Value::Boolean(None),
                Value::Int8(None),
                Value::Int16(None),
                Value::Int32(None),
                Value::Int64(None),
                Value::Float32(None),
                Value::Float64(None),
                Value::Decimal(None),
                Value::Varchar(None),
                Value::Blob(None),
                Value::Date(None),
                Value::Time(None),
                Value::Timestamp(None),
                Value::TimestampWithTimezone(None),
                Value::Uuid(None),
            ]
            .iter()
            .map(Codec::standard)
            .collect(),
        }
    }
    /// Process wide registry holding only the built in codecs.
    pub fn standard() -> &'static CodecRegistry {
        &STANDARD_REGISTRY
    }
    pub fn register(&mut self, codec: Codec) -> &mut Self {
        self.custom.push(codec);
        self
    }
    pub fn resolve(&self, value_type: &Value) -> Result<Codec> {
        self.custom
            .iter()
            .chain(self.builtin.iter())
            .find(|c| c.value_type().same_type(value_type))
            .cloned()
            .ok_or_else(|| {
                Error::msg(format!(
                    "No codec registered for values of type {}",
                    value_type.type_name()
                ))
            })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn decodes_text_wire_values() {
        let date = Codec::standard(&Value::Date(None));
        assert_eq!(
            date.decode(Value::Varchar(Some("2024-02-29".into()))).unwrap(),
            Value::Date(Some(date!(2024 - 02 - 29)))
        );
        let timestamp = Codec::standard(&Value::Timestamp(None));
        assert_eq!(
            timestamp
                .decode(Value::Varchar(Some("2001-09-11 08:46:00.123456789".into())))
                .unwrap(),
            Value::Timestamp(Some(datetime!(2001-09-11 08:46:00.123456789)))
        );
        let time = Codec::standard(&Value::Time(None));
        assert_eq!(
            time.decode(Value::Varchar(Some("23:59:59".into()))).unwrap(),
            Value::Time(Some(time!(23:59:59)))
        );
    }

    #[test]
    fn narrows_integers_with_range_check() {
        let codec = Codec::standard(&Value::Int16(None));
        assert_eq!(
            codec.decode(Value::Int64(Some(-7))).unwrap(),
            Value::Int16(Some(-7))
        );
        assert!(codec.decode(Value::Int64(Some(1 << 20))).is_err());
        let flag = Codec::standard(&Value::Boolean(None));
        assert_eq!(
            flag.decode(Value::Int64(Some(1))).unwrap(),
            Value::Boolean(Some(true))
        );
    }

    #[test]
    fn normalizes_into_the_declared_type() {
        let id = Codec::standard(&Value::Int64(None));
        assert_eq!(id.normalize(Value::Int32(Some(5))), Value::Int64(Some(5)));
        assert_eq!(id.normalize(Value::Null), Value::Int64(None));
        assert_eq!(
            id.normalize(Value::Varchar(Some("five".into()))),
            Value::Varchar(Some("five".into()))
        );
        let single = Codec::standard(&Value::Float32(None));
        assert_eq!(single.decode(Value::Float64(Some(0.5))).unwrap(), Value::Float32(Some(0.5)));
        assert!(single.encode(Value::Float64(Some(0.1))).is_err());
    }

    #[test]
    fn user_codecs_take_priority() {
        fn to_column(value: Value) -> Result<Value> {
            Ok(Value::Varchar(Some(String::try_from_value(value)?.to_uppercase())))
        }
        fn from_column(value: Value) -> Result<Value> {
            Ok(Value::Varchar(Some(String::try_from_value(value)?.to_lowercase())))
        }
        let mut registry = CodecRegistry::new();
        let upper = Codec::transform(
            "upper",
            Codec::standard(&Value::Varchar(None)),
            Value::Varchar(None),
            to_column,
            from_column,
        );
        registry.register(upper.clone());
        let resolved = registry.resolve(&Value::Varchar(None)).unwrap();
        assert_eq!(resolved, upper);
        assert_eq!(
            resolved.encode(Value::Varchar(Some("abc".into()))).unwrap(),
            Value::Varchar(Some("ABC".into()))
        );
        assert_eq!(
            CodecRegistry::standard()
                .resolve(&Value::Varchar(None))
                .unwrap()
                .name(),
            "VARCHAR"
        );
    }
}
