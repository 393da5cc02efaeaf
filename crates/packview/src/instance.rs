// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instances: a view descriptor paired with a validated value.
//!
//! Every mutation re-runs the member's coercion, so an instance can never
//! drift outside its view's ranges. There is deliberately no `value_mut`:
//! raw values leave through [`Instance::value`] / [`Instance::into_value`]
//! only.

use crate::codec;
use crate::error::{ConstructError, PackError, SizeError};
use crate::value::{FromValue, Value};
use crate::view::{View, ViewKind};
use std::sync::Arc;

/// A validated value bound to its view.
#[derive(Debug, Clone)]
pub struct Instance {
    view: Arc<View>,
    value: Value,
}

impl Instance {
    /// Construct an instance, coercing and validating `value` against the
    /// view. Range/shape/name errors surface here, never at encode time.
    pub fn new(view: &Arc<View>, value: impl Into<Value>) -> Result<Self, ConstructError> {
        let value = view.construct(value.into())?;
        Ok(Self {
            view: view.clone(),
            value,
        })
    }

    /// Build an instance from the view's default values.
    pub fn with_defaults(view: &Arc<View>) -> Result<Self, ConstructError> {
        Self::new(view, view.default_value())
    }

    /// Wrap a value that already went through `View::construct`.
    pub(crate) fn from_validated(view: &Arc<View>, value: Value) -> Self {
        Self {
            view: view.clone(),
            value,
        }
    }

    pub fn view(&self) -> &Arc<View> {
        &self.view
    }

    pub fn type_name(&self) -> &str {
        self.view.name()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Typed member/field access by name (structure members and bit-record
    /// fields).
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, ConstructError> {
        T::from_value(&self.get_field(name)?)
    }

    /// Member/field value by name.
    pub fn get_field(&self, name: &str) -> Result<Value, ConstructError> {
        match (self.view.kind(), &self.value) {
            (ViewKind::Struct(sv), Value::Struct(pairs)) => {
                if sv.member(name).is_none() {
                    return Err(ConstructError::UnexpectedMember {
                        type_name: self.view.name().to_string(),
                        name: name.to_string(),
                    });
                }
                pairs
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| ConstructError::MissingMember {
                        type_name: self.view.name().to_string(),
                        name: name.to_string(),
                    })
            }
            (ViewKind::BitRecord(bv), Value::Record(raw)) => {
                let field = bv.field(name).ok_or_else(|| ConstructError::UnexpectedField {
                    type_name: self.view.name().to_string(),
                    name: name.to_string(),
                })?;
                Ok(Value::Int(bv.extract(*raw, field)))
            }
            _ => Err(ConstructError::TypeMismatch {
                expected: "struct or bit record".to_string(),
                got: self.value.kind_name().to_string(),
            }),
        }
    }

    /// Assign a member/field by name, re-running its coercion. An
    /// undeclared name is a lookup failure.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ConstructError> {
        let value = value.into();
        match (self.view.kind(), &mut self.value) {
            (ViewKind::Struct(sv), Value::Struct(pairs)) => {
                let member = sv.member(name).ok_or_else(|| ConstructError::UnexpectedMember {
                    type_name: self.view.name().to_string(),
                    name: name.to_string(),
                })?;
                let coerced = member.view.construct(value)?;
                match pairs.iter_mut().find(|(k, _)| k == name) {
                    Some((_, slot)) => *slot = coerced,
                    None => pairs.push((name.to_string(), coerced)),
                }
                Ok(())
            }
            (ViewKind::BitRecord(bv), Value::Record(raw)) => {
                let field = bv.field(name).ok_or_else(|| ConstructError::UnexpectedField {
                    type_name: self.view.name().to_string(),
                    name: name.to_string(),
                })?;
                let v = match value {
                    Value::Int(v) => v,
                    other => {
                        return Err(ConstructError::TypeMismatch {
                            expected: format!("integer for field '{}'", name),
                            got: other.kind_name().to_string(),
                        })
                    }
                };
                *raw = bv.splice(*raw, field, v)?;
                Ok(())
            }
            _ => Err(ConstructError::TypeMismatch {
                expected: "struct or bit record".to_string(),
                got: self.value.kind_name().to_string(),
            }),
        }
    }

    /// Array element by index.
    pub fn element(&self, index: usize) -> Result<Value, ConstructError> {
        match &self.value {
            Value::Array(items) => items.get(index).cloned().ok_or(
                ConstructError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                },
            ),
            other => Err(ConstructError::TypeMismatch {
                expected: "array".to_string(),
                got: other.kind_name().to_string(),
            }),
        }
    }

    /// Replace an array element, re-running the item coercion.
    pub fn set_element(&mut self, index: usize, value: impl Into<Value>) -> Result<(), ConstructError> {
        let item_view = match self.view.kind() {
            ViewKind::Array(av) => av.item.clone(),
            _ => {
                return Err(ConstructError::TypeMismatch {
                    expected: "array".to_string(),
                    got: self.value.kind_name().to_string(),
                })
            }
        };
        match &mut self.value {
            Value::Array(items) => {
                if index >= items.len() {
                    return Err(ConstructError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    });
                }
                let coerced = item_view
                    .construct(value.into())
                    .map_err(|e| e.at(&format!("[{index}]")))?;
                items[index] = coerced;
                Ok(())
            }
            other => Err(ConstructError::TypeMismatch {
                expected: "array".to_string(),
                got: other.kind_name().to_string(),
            }),
        }
    }

    /// Element or member count, `None` for scalar kinds.
    pub fn len(&self) -> Option<usize> {
        match &self.value {
            Value::Array(items) => Some(items.len()),
            Value::Struct(pairs) => Some(pairs.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Iterate over struct members in declared order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        match &self.value {
            Value::Struct(pairs) => {
                Box::new(pairs.iter().map(|(k, v)| (k.as_str(), v)))
                    as Box<dyn Iterator<Item = _> + '_>
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Iterate over array elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &Value> {
        match &self.value {
            Value::Array(items) => Box::new(items.iter()) as Box<dyn Iterator<Item = _> + '_>,
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Static byte size of this instance's view. Fails with [`SizeError`]
    /// when any constituent is greedy; [`Instance::nbytes`] reports the
    /// actual encoded size regardless.
    pub fn calcsize(&self) -> Result<usize, SizeError> {
        codec::calcsize(&self.view)
    }

    /// Actual encoded byte size of this instance. Always determinate for a
    /// constructed value, greedy arrays included.
    pub fn nbytes(&self) -> usize {
        value_size(&self.view, &self.value)
    }

    /// Encode this instance.
    pub fn pack(&self) -> Result<Vec<u8>, PackError> {
        codec::pack(&self.view, self.value.clone())
    }

    /// Render the encode-side diagnostic table for this instance.
    pub fn getdump(&self) -> Result<String, PackError> {
        codec::getdump(self)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.view.name() == other.view.name() && self.value == other.value
    }
}

fn value_size(view: &View, value: &Value) -> usize {
    match (view.kind(), value) {
        (ViewKind::Integer(iv), _) => iv.width,
        (ViewKind::BitRecord(bv), _) => bv.width,
        (ViewKind::Array(av), Value::Array(items)) => items
            .iter()
            .map(|item| value_size(&av.item, item))
            .sum(),
        (ViewKind::Struct(sv), Value::Struct(pairs)) => sv
            .members
            .iter()
            .zip(pairs.iter())
            .map(|(m, (_, v))| value_size(&m.view, v))
            .sum(),
        // Validated instances cannot reach these arms; report the static
        // size if there is one.
        _ => view.size().unwrap_or(0),
    }
}
