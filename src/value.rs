use crate::{Error, Record, Result};
use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Tagged runtime value stored in a [`Record`](crate::Record) field.
///
/// Every variant carries an `Option` payload so that a value with a `None`
/// payload doubles as a *declared kind* prototype usable inside a
/// [`Schema`](crate::Schema).
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Date(Option<Date>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
    Record(Option<Record>),
    List(Option<Vec<Value>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::Record(l), Self::Record(r)) => l == r,
            (Self::List(l), Self::List(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    /// Whether the two values are of the same declared kind, payloads ignored.
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Whether a value of kind `other` can be stored where `self` is declared.
    ///
    /// Same kind is always assignable, `Null` is assignable anywhere, and
    /// integers widen into floats and decimals.
    pub fn assignable_from(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (_, Value::Null)
                | (Value::Float64(..), Value::Int64(..))
                | (Value::Decimal(..), Value::Int64(..))
        ) || self.same_type(other)
    }

    /// Whether the value carries no payload (including the `Null` kind).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::Record(v) => v.is_none(),
            Value::List(v) => v.is_none(),
        }
    }

    /// The same kind with the payload removed, usable as a schema entry.
    pub fn prototype(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Date(..) => Value::Date(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::Record(..) => Value::Record(None),
            Value::List(..) => Value::List(None),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => "boolean",
            Value::Int64(..) => "int64",
            Value::Float64(..) => "float64",
            Value::Decimal(..) => "decimal",
            Value::Varchar(..) => "varchar",
            Value::Date(..) => "date",
            Value::Timestamp(..) => "timestamp",
            Value::Uuid(..) => "uuid",
            Value::Record(..) => "record",
            Value::List(..) => "list",
        }
    }
}

/// Conversion between plain Rust values and [`Value`] variants, the typed
/// accessor boundary of the untyped field bag.
pub trait AsValue: Sized {
    /// The kind prototype (no payload) corresponding to this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

macro_rules! impl_as_value {
    ($source:ty, $into:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $into(None)
            }
            fn as_value(self) -> Value {
                $into(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $into(Some(v)) => v.try_into().map_err(|_| {
                        Error::msg(concat!("value does not fit ", stringify!($source)))
                    }),
                    other => Err(Error::msg(format!(
                        "cannot read a {} value as {}",
                        other.kind_name(),
                        stringify!($source),
                    ))),
                }
            }
        }
    };
}

impl_as_value!(bool, Value::Boolean);
impl_as_value!(i8, Value::Int64);
impl_as_value!(i16, Value::Int64);
impl_as_value!(i32, Value::Int64);
impl_as_value!(i64, Value::Int64);
impl_as_value!(Decimal, Value::Decimal);
impl_as_value!(String, Value::Varchar);
impl_as_value!(Date, Value::Date);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(Uuid, Value::Uuid);
impl_as_value!(Record, Value::Record);

macro_rules! impl_as_value_float {
    ($source:ty) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                Value::Float64(None)
            }
            fn as_value(self) -> Value {
                Value::Float64(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float64(Some(v)) => Ok(v as $source),
                    // Integers widen into floats, matching `assignable_from`.
                    Value::Int64(Some(v)) => Ok(v as $source),
                    other => Err(Error::msg(format!(
                        "cannot read a {} value as {}",
                        other.kind_name(),
                        stringify!($source),
                    ))),
                }
            }
        }
    };
}

impl_as_value_float!(f32);
impl_as_value_float!(f64);

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
    fn try_from_value(_value: Value) -> Result<Self> {
        Err(Error::Unsupported(
            "extract an owned String instead of a borrowed str".into(),
        ))
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

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None)
    }
    fn as_value(self) -> Value {
        Value::List(Some(self.into_iter().map(AsValue::as_value).collect()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v)) => v.into_iter().map(T::try_from_value).collect(),
            other => Err(Error::msg(format!(
                "cannot read a {} value as a list",
                other.kind_name(),
            ))),
        }
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignability() {
        let int = Value::Int64(None);
        let float = Value::Float64(None);
        let text = Value::Varchar(None);
        assert!(int.assignable_from(&Value::Int64(Some(5))));
        assert!(float.assignable_from(&int));
        assert!(!int.assignable_from(&float));
        assert!(text.assignable_from(&Value::Null));
        assert!(!text.assignable_from(&int));
        assert!(Value::Decimal(None).assignable_from(&int));
    }

    #[test]
    fn conversion() {
        assert_eq!(7.as_value(), Value::Int64(Some(7)));
        assert_eq!("x".as_value(), Value::Varchar(Some("x".into())));
        assert_eq!(None::<i32>.as_value(), Value::Int64(None));
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Boolean(Some(false)).is_null());
        assert_eq!(
            vec![1, 2].as_value(),
            Value::List(Some(vec![Value::Int64(Some(1)), Value::Int64(Some(2))]))
        );
    }
}
