// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values held by view instances.

use crate::error::ConstructError;

/// A dynamic value for any view kind.
///
/// Struct members keep declaration order; a bit-record instance is its raw
/// unsigned container value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Range-checked integer.
    Int(i128),
    /// Bit-record container, unsigned.
    Record(u128),
    /// Ordered array elements.
    Array(Vec<Value>),
    /// Ordered `(member name, value)` pairs.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Build a struct value from name/value pairs.
    pub fn struct_of<I, S, V>(pairs: I) -> Value
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        Value::Struct(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array value from elements.
    pub fn array_of<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Record(_) => "bit record",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<u128> {
        match self {
            Self::Record(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }

    /// Struct member lookup by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(pairs) => pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Int(v as i128)
            }
        })*
    };
}

impl_from_int!(u8, u16, u32, u64, i8, i16, i32, i64, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Int(i128::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<(String, Value)>> for Value {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self::Struct(pairs)
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConstructError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConstructError> {
        Ok(value.clone())
    }
}

impl FromValue for i128 {
    fn from_value(value: &Value) -> Result<Self, ConstructError> {
        value.as_int().ok_or_else(|| ConstructError::TypeMismatch {
            expected: "integer".to_string(),
            got: value.kind_name().to_string(),
        })
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConstructError> {
        match value.as_int() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ConstructError::TypeMismatch {
                expected: "boolean (0 or 1)".to_string(),
                got: value.kind_name().to_string(),
            }),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty => $name:expr),*) => {
        $(impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, ConstructError> {
                let v = i128::from_value(value)?;
                <$ty>::try_from(v).map_err(|_| ConstructError::TypeMismatch {
                    expected: $name.to_string(),
                    got: format!("integer {}", v),
                })
            }
        })*
    };
}

impl_from_value_int!(
    u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64",
    i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64",
    usize => "usize"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(42u8), Value::Int(42));
        assert_eq!(Value::from(-1i16), Value::Int(-1));
        assert_eq!(Value::from(true), Value::Int(1));
        assert_eq!(
            Value::from(vec![1u8, 2]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_struct_of_keeps_order() {
        let v = Value::struct_of([("b", 2u8), ("a", 1u8)]);
        let pairs = v.as_struct().expect("struct");
        assert_eq!(pairs[0].0, "b");
        assert_eq!(pairs[1].0, "a");
        assert_eq!(v.member("a"), Some(&Value::Int(1)));
        assert!(v.member("c").is_none());
    }

    #[test]
    fn test_typed_extraction() {
        let v = Value::Int(258);
        assert_eq!(u16::from_value(&v).unwrap(), 258);
        assert!(u8::from_value(&v).is_err());
        assert!(bool::from_value(&v).is_err());
        assert!(bool::from_value(&Value::Int(1)).unwrap());
    }
}
