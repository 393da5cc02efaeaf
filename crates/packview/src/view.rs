// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable view descriptors.
//!
//! A [`View`] is a definition-time mapping between a byte range and a typed
//! value: fixed-width integer, bit-packed record, homogeneous array, or
//! ordered heterogeneous structure. Descriptors are built once, never
//! mutate, and are shared through `Arc` for nesting, so they are freely
//! usable across unlimited concurrent passes.
//!
//! Declaration errors (zero widths, fields past the container end) are
//! programming errors and assert; data errors surface as
//! [`ConstructError`] when an instance is built.

use crate::error::ConstructError;
use crate::value::Value;
use std::sync::Arc;

/// Byte order of a multi-byte view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// A declared view over a byte range.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    kind: ViewKind,
}

/// View kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewKind {
    Integer(IntegerView),
    BitRecord(BitRecordView),
    Array(ArrayView),
    Struct(StructView),
}

/// Fixed-width integer view.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerView {
    pub width: usize,
    pub byte_order: ByteOrder,
    pub signed: bool,
    /// Optional value -> label table, decorative only: a value without a
    /// label renders as the plain number and never fails.
    pub symbols: Vec<(i128, String)>,
}

impl IntegerView {
    /// Inclusive value range for this width/signedness.
    pub fn range(&self) -> (i128, i128) {
        let bits = (self.width * 8) as u32;
        if self.signed {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }

    /// Label for a value, when the symbol table has one.
    pub fn label(&self, value: i128) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, l)| l.as_str())
    }

    pub(crate) fn display(&self, value: i128) -> String {
        match self.label(value) {
            Some(label) => label.to_string(),
            None => value.to_string(),
        }
    }
}

/// One named sub-bit-range of a bit record.
#[derive(Debug, Clone, PartialEq)]
pub struct BitField {
    pub name: String,
    /// Bit position of the least significant bit within the container.
    pub pos: u32,
    /// Field width in bits.
    pub size: u32,
    pub signed: bool,
    pub default: Option<i128>,
}

impl BitField {
    /// Inclusive value range for this field.
    pub fn range(&self) -> (i128, i128) {
        if self.signed {
            (-(1i128 << (self.size - 1)), (1i128 << (self.size - 1)) - 1)
        } else {
            (0, (1i128 << self.size) - 1)
        }
    }

    fn value_mask(&self) -> u128 {
        (1u128 << self.size) - 1
    }

    pub(crate) fn type_label(&self) -> String {
        if self.signed {
            format!("i{}", self.size)
        } else {
            format!("u{}", self.size)
        }
    }
}

/// Bit-packed record view: a fixed-width unsigned container with named
/// sub-bit-ranges.
///
/// Field ranges are deliberately not checked against each other for
/// overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct BitRecordView {
    pub width: usize,
    pub byte_order: ByteOrder,
    /// Default raw container value; by-field construction starts here.
    pub fill: u128,
    /// Ordered field table.
    pub fields: Vec<BitField>,
}

impl BitRecordView {
    /// Mask covering the container's `width * 8` bits.
    pub(crate) fn container_mask(&self) -> u128 {
        let bits = self.width * 8;
        if bits >= 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        }
    }

    /// Field lookup by name.
    pub fn field(&self, name: &str) -> Option<&BitField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Extract a field from the raw container, reinterpreting through two's
    /// complement when the field is signed and its sign bit is set.
    pub fn extract(&self, raw: u128, field: &BitField) -> i128 {
        let bits = (raw >> field.pos) & field.value_mask();
        if field.signed && (bits >> (field.size - 1)) & 1 == 1 {
            bits as i128 - (1i128 << field.size)
        } else {
            bits as i128
        }
    }

    /// Splice a field value into the raw container, leaving every bit
    /// outside the field's range untouched. Out-of-range values are
    /// rejected with the field's name.
    pub fn splice(&self, raw: u128, field: &BitField, value: i128) -> Result<u128, ConstructError> {
        let (min, max) = field.range();
        if value < min || value > max {
            return Err(ConstructError::FieldOutOfRange {
                field: field.name.clone(),
                value,
                min,
                max,
            });
        }
        let mask = field.value_mask() << field.pos;
        Ok((raw & !mask) | (((value as u128) & field.value_mask()) << field.pos))
    }

    /// By-field construction: start from the fill value, reject unknown
    /// names and names lacking both a value and a default, apply values in
    /// declared order.
    fn from_fields(
        &self,
        type_name: &str,
        pairs: &[(String, Value)],
    ) -> Result<u128, ConstructError> {
        for (name, _) in pairs {
            if self.field(name).is_none() {
                return Err(ConstructError::UnexpectedField {
                    type_name: type_name.to_string(),
                    name: name.clone(),
                });
            }
        }
        let mut raw = self.fill & self.container_mask();
        for field in &self.fields {
            // Last occurrence wins, mirroring keyword-override semantics.
            let input = pairs
                .iter()
                .rev()
                .find(|(k, _)| *k == field.name)
                .map(|(_, v)| v);
            let value = match input {
                Some(v) => match v {
                    Value::Int(i) => *i,
                    other => {
                        return Err(ConstructError::TypeMismatch {
                            expected: format!("integer for field '{}'", field.name),
                            got: other.kind_name().to_string(),
                        })
                    }
                },
                None => match field.default {
                    Some(d) => d,
                    None => {
                        return Err(ConstructError::MissingField {
                            type_name: type_name.to_string(),
                            name: field.name.clone(),
                        })
                    }
                },
            };
            raw = self.splice(raw, field, value)?;
        }
        Ok(raw)
    }
}

/// Homogeneous array view. `len == None` means greedy: decode consumes
/// items until memory is exhausted, and the size is indeterminate.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayView {
    pub item: Arc<View>,
    pub len: Option<usize>,
}

/// One declared structure member.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub view: Arc<View>,
    pub default: Option<Value>,
}

/// Ordered heterogeneous structure view.
#[derive(Debug, Clone, PartialEq)]
pub struct StructView {
    pub members: Vec<Member>,
}

impl StructView {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl View {
    pub(crate) fn from_parts(name: String, kind: ViewKind) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ViewKind {
        &self.kind
    }

    /// Fixed-width integer view. `width` is in bytes, 1 through 8.
    pub fn integer(
        name: impl Into<String>,
        width: usize,
        byte_order: ByteOrder,
        signed: bool,
    ) -> Self {
        assert!(
            (1..=8).contains(&width),
            "integer width must be 1..=8 bytes"
        );
        Self {
            name: name.into(),
            kind: ViewKind::Integer(IntegerView {
                width,
                byte_order,
                signed,
                symbols: Vec::new(),
            }),
        }
    }

    pub fn u8() -> Self {
        Self::integer("u8", 1, ByteOrder::Little, false)
    }

    pub fn i8() -> Self {
        Self::integer("i8", 1, ByteOrder::Little, true)
    }

    pub fn u16(byte_order: ByteOrder) -> Self {
        Self::integer("u16", 2, byte_order, false)
    }

    pub fn i16(byte_order: ByteOrder) -> Self {
        Self::integer("i16", 2, byte_order, true)
    }

    pub fn u32(byte_order: ByteOrder) -> Self {
        Self::integer("u32", 4, byte_order, false)
    }

    pub fn i32(byte_order: ByteOrder) -> Self {
        Self::integer("i32", 4, byte_order, true)
    }

    pub fn u64(byte_order: ByteOrder) -> Self {
        Self::integer("u64", 8, byte_order, false)
    }

    pub fn i64(byte_order: ByteOrder) -> Self {
        Self::integer("i64", 8, byte_order, true)
    }

    /// Attach a value -> label table to an integer view.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = (i128, S)>,
        S: Into<String>,
    {
        match &mut self.kind {
            ViewKind::Integer(iv) => {
                iv.symbols = symbols.into_iter().map(|(v, l)| (v, l.into())).collect();
                self
            }
            _ => panic!("symbol tables apply to integer views only"),
        }
    }

    /// Fixed-length array of `len` items.
    pub fn array(name: impl Into<String>, item: Arc<View>, len: usize) -> Self {
        assert!(len > 0, "array dimension must be positive");
        Self {
            name: name.into(),
            kind: ViewKind::Array(ArrayView {
                item,
                len: Some(len),
            }),
        }
    }

    /// Greedy array: consumes items until memory is exhausted. The item
    /// must occupy at least one byte, or the decode loop could never
    /// exhaust a non-empty buffer.
    pub fn greedy_array(name: impl Into<String>, item: Arc<View>) -> Self {
        assert!(
            item.size() != Some(0),
            "greedy array item must have nonzero size"
        );
        Self {
            name: name.into(),
            kind: ViewKind::Array(ArrayView { item, len: None }),
        }
    }

    /// Multi-dimensional array: realizes as nested array-of-array, one
    /// dimension per nesting level, outermost first.
    pub fn array_nd(name: impl Into<String>, item: Arc<View>, dims: &[usize]) -> Self {
        assert!(!dims.is_empty(), "at least one dimension required");
        let name = name.into();
        let mut inner = item;
        for &dim in dims[1..].iter().rev() {
            inner = Arc::new(Self::array(name.clone(), inner, dim));
        }
        Self::array(name, inner, dims[0])
    }

    /// Determinate byte size, or `None` when any constituent is greedy.
    /// Indeterminacy propagates upward.
    pub fn size(&self) -> Option<usize> {
        match &self.kind {
            ViewKind::Integer(iv) => Some(iv.width),
            ViewKind::BitRecord(bv) => Some(bv.width),
            ViewKind::Array(av) => match (av.len, av.item.size()) {
                (Some(len), Some(item)) => Some(len * item),
                _ => None,
            },
            ViewKind::Struct(sv) => {
                let mut total = 0;
                for m in &sv.members {
                    total += m.view.size()?;
                }
                Some(total)
            }
        }
    }

    /// Coerce and validate a value against this view, recursively.
    ///
    /// Range, shape, and name validation all happen here, so a value that
    /// survives construction can always be encoded.
    pub fn construct(&self, value: Value) -> Result<Value, ConstructError> {
        match &self.kind {
            ViewKind::Integer(iv) => match value {
                Value::Int(v) => {
                    let (min, max) = iv.range();
                    if v < min || v > max {
                        return Err(ConstructError::OutOfRange {
                            type_name: self.name.clone(),
                            value: v,
                            min,
                            max,
                        });
                    }
                    Ok(Value::Int(v))
                }
                other => Err(ConstructError::TypeMismatch {
                    expected: format!("integer for {}", self.name),
                    got: other.kind_name().to_string(),
                }),
            },
            ViewKind::BitRecord(bv) => match value {
                Value::Record(raw) => {
                    let max = bv.container_mask();
                    if raw > max {
                        return Err(ConstructError::OutOfRange {
                            type_name: self.name.clone(),
                            value: raw as i128,
                            min: 0,
                            max: max as i128,
                        });
                    }
                    Ok(Value::Record(raw))
                }
                Value::Int(v) => {
                    let max = bv.container_mask();
                    if v < 0 || v as u128 > max {
                        return Err(ConstructError::OutOfRange {
                            type_name: self.name.clone(),
                            value: v,
                            min: 0,
                            max: max as i128,
                        });
                    }
                    Ok(Value::Record(v as u128))
                }
                Value::Struct(pairs) => {
                    let raw = bv.from_fields(&self.name, &pairs)?;
                    Ok(Value::Record(raw))
                }
                other => Err(ConstructError::TypeMismatch {
                    expected: format!("raw value or field mapping for {}", self.name),
                    got: other.kind_name().to_string(),
                }),
            },
            ViewKind::Array(av) => match value {
                Value::Array(items) => {
                    if let Some(expected) = av.len {
                        if items.len() != expected {
                            return Err(ConstructError::LengthMismatch {
                                type_name: self.name.clone(),
                                expected,
                                got: items.len(),
                            });
                        }
                    }
                    let mut out = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        let coerced = av
                            .item
                            .construct(item)
                            .map_err(|e| e.at(&format!("[{i}]")))?;
                        out.push(coerced);
                    }
                    Ok(Value::Array(out))
                }
                other => Err(ConstructError::TypeMismatch {
                    expected: format!("array for {}", self.name),
                    got: other.kind_name().to_string(),
                }),
            },
            ViewKind::Struct(sv) => match value {
                Value::Struct(pairs) => {
                    for (name, _) in &pairs {
                        if sv.member(name).is_none() {
                            return Err(ConstructError::UnexpectedMember {
                                type_name: self.name.clone(),
                                name: name.clone(),
                            });
                        }
                    }
                    let mut out = Vec::with_capacity(sv.members.len());
                    for member in &sv.members {
                        // Last occurrence wins, mirroring keyword overrides.
                        let input = pairs
                            .iter()
                            .rev()
                            .find(|(k, _)| *k == member.name)
                            .map(|(_, v)| v.clone());
                        let resolved = match input {
                            Some(v) => v,
                            None => match &member.default {
                                Some(d) => d.clone(),
                                None => {
                                    return Err(ConstructError::MissingMember {
                                        type_name: self.name.clone(),
                                        name: member.name.clone(),
                                    })
                                }
                            },
                        };
                        let coerced = member
                            .view
                            .construct(resolved)
                            .map_err(|e| e.at(&format!(".{}", member.name)))?;
                        out.push((member.name.clone(), coerced));
                    }
                    Ok(Value::Struct(out))
                }
                other => Err(ConstructError::TypeMismatch {
                    expected: format!("member mapping for {}", self.name),
                    got: other.kind_name().to_string(),
                }),
            },
        }
    }

    /// Default value for this view: integers 0, bit records fill plus field
    /// defaults, fixed arrays of item defaults, greedy arrays empty,
    /// structs of member defaults.
    pub fn default_value(&self) -> Value {
        match &self.kind {
            ViewKind::Integer(_) => Value::Int(0),
            ViewKind::BitRecord(bv) => {
                let mut raw = bv.fill & bv.container_mask();
                for field in &bv.fields {
                    if let Some(d) = field.default {
                        if let Ok(next) = bv.splice(raw, field, d) {
                            raw = next;
                        }
                    }
                }
                Value::Record(raw)
            }
            ViewKind::Array(av) => match av.len {
                Some(len) => Value::Array(vec![av.item.default_value(); len]),
                None => Value::Array(Vec::new()),
            },
            ViewKind::Struct(sv) => Value::Struct(
                sv.members
                    .iter()
                    .map(|m| {
                        let v = m
                            .default
                            .clone()
                            .unwrap_or_else(|| m.view.default_value());
                        (m.name.clone(), v)
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BitRecordBuilder, StructBuilder};

    #[test]
    fn test_integer_range() {
        let view = View::u16(ByteOrder::Little);
        assert_eq!(view.construct(Value::Int(65535)).unwrap(), Value::Int(65535));
        assert!(matches!(
            view.construct(Value::Int(65536)),
            Err(ConstructError::OutOfRange { .. })
        ));

        let signed = View::i16(ByteOrder::Big);
        assert_eq!(signed.construct(Value::Int(-1)).unwrap(), Value::Int(-1));
        assert!(signed.construct(Value::Int(-32769)).is_err());
    }

    #[test]
    fn test_symbol_display() {
        let view = View::u8().with_symbols([(0, "OFF"), (1, "ON")]);
        match view.kind() {
            ViewKind::Integer(iv) => {
                assert_eq!(iv.display(1), "ON");
                assert_eq!(iv.display(7), "7");
            }
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn test_bit_field_extract_signed() {
        let view = BitRecordBuilder::new("rec", 2, ByteOrder::Little)
            .signed_field("a", 0, 4)
            .build();
        match view.kind() {
            ViewKind::BitRecord(bv) => {
                let field = bv.field("a").expect("field a");
                assert_eq!(bv.extract(0b1111, field), -1);
                assert_eq!(bv.extract(0b0111, field), 7);
            }
            _ => panic!("expected bit record"),
        }
    }

    #[test]
    fn test_bit_field_splice_isolated() {
        let view = BitRecordBuilder::new("rec", 2, ByteOrder::Little)
            .field("low", 0, 8)
            .field("high", 8, 8)
            .build();
        match view.kind() {
            ViewKind::BitRecord(bv) => {
                let high = bv.field("high").expect("field high");
                let raw = bv.splice(0x00ff, high, 0xab).unwrap();
                assert_eq!(raw, 0xabff);
                assert!(matches!(
                    bv.splice(0, high, 256),
                    Err(ConstructError::FieldOutOfRange { .. })
                ));
            }
            _ => panic!("expected bit record"),
        }
    }

    #[test]
    fn test_size_propagation() {
        let fixed = Arc::new(View::array("arr", Arc::new(View::u16(ByteOrder::Little)), 3));
        assert_eq!(fixed.size(), Some(6));

        let greedy = Arc::new(View::greedy_array("rest", Arc::new(View::u8())));
        assert_eq!(greedy.size(), None);

        let outer = StructBuilder::new("outer")
            .member("head", fixed)
            .member("tail", greedy)
            .build();
        assert_eq!(outer.size(), None);
    }

    #[test]
    #[should_panic(expected = "nonzero size")]
    fn test_greedy_array_rejects_zero_size_item() {
        let empty = Arc::new(StructBuilder::new("empty").build());
        let _ = View::greedy_array("rest", empty);
    }

    #[test]
    fn test_array_nd_nests_outermost_first() {
        let view = View::array_nd("grid", Arc::new(View::u8()), &[2, 3]);
        match view.kind() {
            ViewKind::Array(av) => {
                assert_eq!(av.len, Some(2));
                match av.item.kind() {
                    ViewKind::Array(inner) => assert_eq!(inner.len, Some(3)),
                    _ => panic!("expected nested array"),
                }
            }
            _ => panic!("expected array"),
        }
        assert_eq!(view.size(), Some(6));
    }

    #[test]
    fn test_struct_defaults_and_unknowns() {
        let view = StructBuilder::new("msg")
            .member("id", Arc::new(View::u8()))
            .member_default("flags", Arc::new(View::u8()), 7u8)
            .build();

        let v = view
            .construct(Value::struct_of([("id", 1u8)]))
            .expect("defaults fill in");
        assert_eq!(v.member("flags"), Some(&Value::Int(7)));

        assert!(matches!(
            view.construct(Value::struct_of([("id", 1u8), ("bogus", 2u8)])),
            Err(ConstructError::UnexpectedMember { .. })
        ));
        assert!(matches!(
            view.construct(Value::struct_of([("flags", 1u8)])),
            Err(ConstructError::MissingMember { .. })
        ));
    }

    #[test]
    fn test_nested_coercion_path() {
        let grid = View::array_nd("grid", Arc::new(View::u8()), &[2, 2]);
        let err = grid
            .construct(Value::array_of([
                Value::array_of([0u8, 1u8]),
                Value::Array(vec![Value::Int(2), Value::Int(300)]),
            ]))
            .unwrap_err();
        match err {
            ConstructError::Element { path, .. } => assert_eq!(path, "[1][1]"),
            other => panic!("expected element error, got {other:?}"),
        }
    }
}
