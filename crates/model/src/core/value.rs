use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::{borrow::Cow, fmt};
use uuid::Uuid;

/// A value that can be bound to a query variable or rendered as an EdgeQL
/// literal.
///
/// The variant set covers the scalar domain accepted by the server's binary
/// protocol: booleans, signed integers, floats, arbitrary-precision numbers,
/// strings, bytes, temporal types, UUID, JSON, and the composite
/// array/tuple/set forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    BigInt(BigDecimal),
    Decimal(BigDecimal),
    Str(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Json(serde_json::Value),
    Datetime(DateTime<Utc>),
    LocalDatetime(NaiveDateTime),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    Duration(Duration),
    Enum {
        type_name: String,
        variant: String,
        numeric: Option<i64>,
    },
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    NamedTuple(Vec<(String, Value)>),
    Set(Vec<Value>),
    Nothing,
}

impl Value {
    /// The EdgeQL scalar type name used to cast a bound variable, e.g.
    /// `str` in `<str>$name`. `None` for values that cannot be bound as a
    /// single scalar parameter.
    pub fn edgeql_type(&self) -> Option<Cow<'static, str>> {
        match self {
            Value::Bool(_) => Some(Cow::Borrowed("bool")),
            Value::Int16(_) => Some(Cow::Borrowed("int16")),
            Value::Int32(_) => Some(Cow::Borrowed("int32")),
            Value::Int64(_) => Some(Cow::Borrowed("int64")),
            Value::Float32(_) => Some(Cow::Borrowed("float32")),
            Value::Float64(_) => Some(Cow::Borrowed("float64")),
            Value::BigInt(_) => Some(Cow::Borrowed("bigint")),
            Value::Decimal(_) => Some(Cow::Borrowed("decimal")),
            Value::Str(_) => Some(Cow::Borrowed("str")),
            Value::Bytes(_) => Some(Cow::Borrowed("bytes")),
            Value::Uuid(_) => Some(Cow::Borrowed("uuid")),
            Value::Json(_) => Some(Cow::Borrowed("json")),
            Value::Datetime(_) => Some(Cow::Borrowed("datetime")),
            Value::LocalDatetime(_) => Some(Cow::Borrowed("cal::local_datetime")),
            Value::LocalDate(_) => Some(Cow::Borrowed("cal::local_date")),
            Value::LocalTime(_) => Some(Cow::Borrowed("cal::local_time")),
            Value::Duration(_) => Some(Cow::Borrowed("duration")),
            Value::Array(items) => {
                let first = items.first()?.edgeql_type()?;
                if items
                    .iter()
                    .skip(1)
                    .any(|i| i.edgeql_type().as_deref() != Some(first.as_ref()))
                {
                    return None;
                }
                Some(Cow::Owned(format!("array<{first}>")))
            }
            Value::Enum { .. }
            | Value::Tuple(_)
            | Value::NamedTuple(_)
            | Value::Set(_)
            | Value::Nothing => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::BigInt(v) | Value::Decimal(v) => v.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int16(v) => Some(*v as f64),
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::BigInt(v) | Value::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            Value::Enum { variant, .. } => Some(variant),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }
}

/// Escapes a string for inclusion in a double-quoted EdgeQL string literal.
fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn join_literals(items: &[Value]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Value {
    /// Renders the value in its canonical EdgeQL literal form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v:?}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::BigInt(v) => write!(f, "{v}n"),
            // A decimal literal must keep its decimal point: `42n` is a
            // bigint in EdgeQL, `42.0n` a decimal.
            Value::Decimal(v) => {
                let scaled = v.with_scale(v.fractional_digit_count().max(1));
                write!(f, "{scaled}n")
            }
            Value::Str(v) => write!(f, "\"{}\"", escape_str(v)),
            Value::Bytes(v) => {
                write!(f, "b\"")?;
                for byte in v {
                    write!(f, "\\x{byte:02x}")?;
                }
                write!(f, "\"")
            }
            Value::Uuid(v) => write!(f, "<uuid>\"{v}\""),
            Value::Json(v) => write!(f, "to_json(\"{}\")", escape_str(&v.to_string())),
            Value::Datetime(v) => write!(f, "<datetime>\"{}\"", v.to_rfc3339()),
            Value::LocalDatetime(v) => write!(f, "<cal::local_datetime>\"{v}\""),
            Value::LocalDate(v) => write!(f, "<cal::local_date>\"{v}\""),
            Value::LocalTime(v) => write!(f, "<cal::local_time>\"{v}\""),
            Value::Duration(v) => {
                let micros = v.num_microseconds().unwrap_or(i64::MAX);
                write!(f, "<duration>\"{micros} microseconds\"")
            }
            Value::Enum {
                variant, numeric, ..
            } => match numeric {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "\"{}\"", escape_str(&variant.to_lowercase())),
            },
            Value::Array(items) => write!(f, "[{}]", join_literals(items)),
            Value::Tuple(items) => write!(f, "({})", join_literals(items)),
            Value::NamedTuple(items) => {
                let body = items
                    .iter()
                    .map(|(name, value)| format!("{name} := {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({body})")
            }
            Value::Set(items) => write!(f, "{{{}}}", join_literals(items)),
            Value::Nothing => write!(f, "{{}}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_lookup() {
        assert_eq!(Value::from("x").edgeql_type().unwrap(), "str");
        assert_eq!(Value::from(1i64).edgeql_type().unwrap(), "int64");
        assert_eq!(Value::from(1i16).edgeql_type().unwrap(), "int16");
        assert_eq!(
            Value::Json(serde_json::json!([])).edgeql_type().unwrap(),
            "json"
        );
        assert!(Value::Nothing.edgeql_type().is_none());
        assert!(Value::Tuple(vec![]).edgeql_type().is_none());
    }

    #[test]
    fn test_uniform_array_type() {
        let arr = Value::Array(vec![Value::from(1i64), Value::from(2i64)]);
        assert_eq!(arr.edgeql_type().unwrap(), "array<int64>");

        let mixed = Value::Array(vec![Value::from(1i64), Value::from("a")]);
        assert!(mixed.edgeql_type().is_none());
    }

    #[test]
    fn test_string_literal_is_escaped() {
        let v = Value::from(r#"say "hi" \ bye"#);
        assert_eq!(v.to_string(), r#""say \"hi\" \\ bye""#);
    }

    #[test]
    fn test_nothing_renders_empty_set() {
        assert_eq!(Value::Nothing.to_string(), "{}");
    }

    #[test]
    fn test_enum_literal_forms() {
        let by_name = Value::Enum {
            type_name: "Color".to_string(),
            variant: "DarkRed".to_string(),
            numeric: None,
        };
        assert_eq!(by_name.to_string(), "\"darkred\"");

        let by_value = Value::Enum {
            type_name: "Color".to_string(),
            variant: "DarkRed".to_string(),
            numeric: Some(3),
        };
        assert_eq!(by_value.to_string(), "3");
    }

    #[test]
    fn test_decimal_literal_keeps_type_tag() {
        use std::str::FromStr;

        let whole = Value::Decimal(BigDecimal::from(42));
        assert_eq!(whole.to_string(), "42.0n");

        let fractional = Value::Decimal(BigDecimal::from_str("1.25").unwrap());
        assert_eq!(fractional.to_string(), "1.25n");

        let big = Value::BigInt(BigDecimal::from(42));
        assert_eq!(big.to_string(), "42n");
    }

    #[test]
    fn test_composite_literals() {
        let tuple = Value::Tuple(vec![Value::from(1i64), Value::from("a")]);
        assert_eq!(tuple.to_string(), "(1, \"a\")");

        let named = Value::NamedTuple(vec![("a".to_string(), Value::from(1i64))]);
        assert_eq!(named.to_string(), "(a := 1)");

        let set = Value::Set(vec![Value::from(1i64), Value::from(2i64)]);
        assert_eq!(set.to_string(), "{1, 2}");
    }
}
