// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for composite views.
//!
//! The original engine scanned declared attributes reflectively at
//! definition time; here the ordered field/member tables are supplied
//! explicitly through these builders.

use crate::value::Value;
use crate::view::{BitField, BitRecordView, ByteOrder, Member, StructView, View, ViewKind};
use std::sync::Arc;

/// Builder for bit-packed record views.
///
/// Field declaration order is preserved; bit ranges may overlap (not
/// validated against each other, by contract).
#[derive(Debug)]
pub struct BitRecordBuilder {
    name: String,
    width: usize,
    byte_order: ByteOrder,
    fill: u128,
    fields: Vec<BitField>,
}

impl BitRecordBuilder {
    /// Create a builder for a record of `width` bytes (1 through 16).
    pub fn new(name: impl Into<String>, width: usize, byte_order: ByteOrder) -> Self {
        assert!(
            (1..=16).contains(&width),
            "bit record width must be 1..=16 bytes"
        );
        Self {
            name: name.into(),
            width,
            byte_order,
            fill: 0,
            fields: Vec::new(),
        }
    }

    /// Default raw container value; by-field construction starts from it.
    pub fn fill(mut self, fill: u128) -> Self {
        self.fill = fill;
        self
    }

    fn push(mut self, name: impl Into<String>, pos: u32, size: u32, signed: bool, default: Option<i128>) -> Self {
        assert!((1..=64).contains(&size), "field size must be 1..=64 bits");
        assert!(
            (pos + size) as usize <= self.width * 8,
            "field extends past the container"
        );
        self.fields.push(BitField {
            name: name.into(),
            pos,
            size,
            signed,
            default,
        });
        self
    }

    /// Add an unsigned field of `size` bits at bit `pos`.
    pub fn field(self, name: impl Into<String>, pos: u32, size: u32) -> Self {
        self.push(name, pos, size, false, None)
    }

    /// Add a signed (two's-complement) field.
    pub fn signed_field(self, name: impl Into<String>, pos: u32, size: u32) -> Self {
        self.push(name, pos, size, true, None)
    }

    /// Add an unsigned field with a default value.
    pub fn field_default(self, name: impl Into<String>, pos: u32, size: u32, default: i128) -> Self {
        self.push(name, pos, size, false, Some(default))
    }

    /// Add a signed field with a default value.
    pub fn signed_field_default(
        self,
        name: impl Into<String>,
        pos: u32,
        size: u32,
        default: i128,
    ) -> Self {
        self.push(name, pos, size, true, Some(default))
    }

    /// Build the view.
    pub fn build(self) -> View {
        View::from_parts(
            self.name,
            ViewKind::BitRecord(BitRecordView {
                width: self.width,
                byte_order: self.byte_order,
                fill: self.fill,
                fields: self.fields,
            }),
        )
    }
}

/// Builder for ordered heterogeneous structure views.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    members: Vec<Member>,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member with no default: construction requires an input value.
    pub fn member(mut self, name: impl Into<String>, view: Arc<View>) -> Self {
        self.members.push(Member {
            name: name.into(),
            view,
            default: None,
        });
        self
    }

    /// Add a member with a default used when construction omits it.
    pub fn member_default(
        mut self,
        name: impl Into<String>,
        view: Arc<View>,
        default: impl Into<Value>,
    ) -> Self {
        self.members.push(Member {
            name: name.into(),
            view,
            default: Some(default.into()),
        });
        self
    }

    /// Build the view.
    pub fn build(self) -> View {
        View::from_parts(self.name, ViewKind::Struct(StructView { members: self.members }))
    }
}
