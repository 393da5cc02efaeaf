// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic encode/decode walkers.
//!
//! Both directions are single depth-first traversals of the view tree.
//! Decoding runs a fast pass with no tracing; only when that pass fails is
//! the buffer re-decoded with a [`Dump`] attached, and the rendered table
//! is stitched onto the error exactly once at this outermost level. The
//! replay reads the same immutable buffer, so it reproduces the failure
//! deterministically.

use crate::dump::Dump;
use crate::error::{ConstructError, PackError, SizeError, UnpackError};
use crate::instance::Instance;
use crate::memory::Memory;
use crate::value::Value;
use crate::view::{ByteOrder, View, ViewKind};
use std::sync::Arc;

const SHORTFALL_MARKER: &str = "<insufficient memory>";
const EXCESS_MARKER: &str = "<excess memory>";

/// Static byte size of a view, or a [`SizeError`] naming the view when any
/// constituent is greedy.
pub fn calcsize(view: &View) -> Result<usize, SizeError> {
    view.size().ok_or_else(|| SizeError {
        type_name: view.name().to_string(),
    })
}

/// Encode a value against a view. The value is coerced and validated
/// first, so every failure surfaces as a construction error before any
/// byte is produced.
pub fn pack(view: &View, value: impl Into<Value>) -> Result<Vec<u8>, PackError> {
    let value = view.construct(value.into())?;
    let mut enc = Encoder {
        out: Vec::new(),
        dump: None,
    };
    enc.encode_value(view, &value, "")?;
    Ok(enc.out)
}

/// Encode a value and return the bytes together with the rendered trace
/// table of the pass.
pub fn pack_and_getdump(view: &View, value: impl Into<Value>) -> Result<(Vec<u8>, String), PackError> {
    let value = view.construct(value.into())?;
    let mut dump = Dump::new();
    let mut enc = Encoder {
        out: Vec::new(),
        dump: Some(&mut dump),
    };
    enc.encode_value(view, &value, "")?;
    Ok((enc.out, dump.render()))
}

/// Render the trace table for an already-validated instance without
/// keeping the encoded bytes.
pub fn getdump(instance: &Instance) -> Result<String, PackError> {
    let mut dump = Dump::new();
    let mut enc = Encoder {
        out: Vec::new(),
        dump: Some(&mut dump),
    };
    enc.encode_value(instance.view(), instance.value(), "")?;
    Ok(dump.render())
}

/// Decode a buffer against a view. The buffer must be consumed exactly.
///
/// The fast pass carries no tracing cost; on failure the buffer is decoded
/// again with diagnostics and the rendered table is attached to the error.
pub fn unpack(view: &Arc<View>, bytes: &[u8]) -> Result<Instance, UnpackError> {
    match decode_pass(view, bytes, None) {
        Ok(value) => Ok(Instance::from_validated(view, value)),
        Err(err) => {
            log::debug!(
                "[unpack] fast pass failed for {}, replaying with diagnostics: {}",
                view.name(),
                err
            );
            let mut dump = Dump::new();
            match decode_pass(view, bytes, Some(&mut dump)) {
                Err(replayed) => Err(replayed.with_dump(dump.render())),
                // The replay reads the same bytes and cannot diverge; keep
                // the original error if it somehow does.
                Ok(_) => Err(err),
            }
        }
    }
}

/// Decode a buffer and return the instance together with the rendered
/// trace table. Errors carry the partial table up to the failure point.
pub fn unpack_and_getdump(
    view: &Arc<View>,
    bytes: &[u8],
) -> Result<(Instance, String), UnpackError> {
    let mut dump = Dump::new();
    match decode_pass(view, bytes, Some(&mut dump)) {
        Ok(value) => Ok((Instance::from_validated(view, value), dump.render())),
        Err(err) => Err(err.with_dump(dump.render())),
    }
}

// Errors escaping this pass are the memory-accounting kinds; a decode
// failure of any other nature would be wrapped as `UnpackError::Invalid`
// here before propagating. The current view kinds accept every byte
// pattern, so no such wrap site exists yet.
fn decode_pass(view: &View, bytes: &[u8], dump: Option<&mut Dump>) -> Result<Value, UnpackError> {
    let mut dec = Decoder {
        mem: Memory::new(bytes),
        dump,
    };
    let value = dec.decode_view(view, "")?;
    match dec.mem.finish() {
        Ok(()) => Ok(value),
        Err(err) => {
            if let Some(dump) = dec.dump.as_deref_mut() {
                dump.add_row(
                    Some(dec.mem.cursor()),
                    "",
                    EXCESS_MARKER,
                    dec.mem.tail(),
                    "",
                );
            }
            Err(err)
        }
    }
}

struct Decoder<'a, 'd> {
    mem: Memory<'a>,
    dump: Option<&'d mut Dump>,
}

impl<'a> Decoder<'a, '_> {
    fn take(
        &mut self,
        n: usize,
        access: &str,
        type_name: &str,
    ) -> Result<(usize, &'a [u8]), UnpackError> {
        let offset = self.mem.cursor();
        match self.mem.take(n, type_name) {
            Ok(bytes) => Ok((offset, bytes)),
            Err(err) => {
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(
                        Some(offset),
                        access,
                        SHORTFALL_MARKER,
                        self.mem.tail(),
                        type_name,
                    );
                }
                Err(err)
            }
        }
    }

    fn decode_view(&mut self, view: &View, access: &str) -> Result<Value, UnpackError> {
        match view.kind() {
            ViewKind::Integer(iv) => {
                let (offset, bytes) = self.take(iv.width, access, view.name())?;
                let v = int_from_bytes(bytes, iv.byte_order, iv.signed);
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(Some(offset), access, iv.display(v), bytes, view.name());
                }
                Ok(Value::Int(v))
            }
            ViewKind::BitRecord(bv) => {
                let (offset, bytes) = self.take(bv.width, access, view.name())?;
                let raw = uint_from_bytes(bytes, bv.byte_order);
                if let Some(dump) = self.dump.as_deref_mut() {
                    // The container row owns the bytes; field rows carry
                    // bit ranges only.
                    dump.add_row(Some(offset), access, raw.to_string(), bytes, view.name());
                    for field in &bv.fields {
                        let idx = dump.add_row(
                            None,
                            join(access, &field.name),
                            bv.extract(raw, field).to_string(),
                            &[],
                            field.type_label(),
                        );
                        dump.set_bits(idx, field.pos, field.size);
                    }
                }
                Ok(Value::Record(raw))
            }
            ViewKind::Array(av) => {
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(Some(self.mem.cursor()), access, "", &[], view.name());
                }
                let mut items = Vec::new();
                match av.len {
                    Some(len) => {
                        for i in 0..len {
                            items.push(self.decode_view(&av.item, &format!("{access}[{i}]"))?);
                        }
                    }
                    None => {
                        let mut i = 0;
                        while !self.mem.is_exhausted() {
                            items.push(self.decode_view(&av.item, &format!("{access}[{i}]"))?);
                            i += 1;
                        }
                    }
                }
                Ok(Value::Array(items))
            }
            ViewKind::Struct(sv) => {
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(Some(self.mem.cursor()), access, "", &[], view.name());
                }
                let mut pairs = Vec::with_capacity(sv.members.len());
                for member in &sv.members {
                    let value = self.decode_view(&member.view, &join(access, &member.name))?;
                    pairs.push((member.name.clone(), value));
                }
                Ok(Value::Struct(pairs))
            }
        }
    }
}

struct Encoder<'d> {
    out: Vec<u8>,
    dump: Option<&'d mut Dump>,
}

impl Encoder<'_> {
    fn encode_value(&mut self, view: &View, value: &Value, access: &str) -> Result<(), PackError> {
        match (view.kind(), value) {
            (ViewKind::Integer(iv), Value::Int(v)) => {
                let offset = self.out.len();
                push_uint(&mut self.out, *v as u128, iv.width, iv.byte_order);
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(
                        Some(offset),
                        access,
                        iv.display(*v),
                        &self.out[offset..],
                        view.name(),
                    );
                }
                Ok(())
            }
            (ViewKind::BitRecord(bv), Value::Record(raw)) => {
                let offset = self.out.len();
                push_uint(&mut self.out, *raw, bv.width, bv.byte_order);
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(
                        Some(offset),
                        access,
                        raw.to_string(),
                        &self.out[offset..],
                        view.name(),
                    );
                    for field in &bv.fields {
                        let idx = dump.add_row(
                            None,
                            join(access, &field.name),
                            bv.extract(*raw, field).to_string(),
                            &[],
                            field.type_label(),
                        );
                        dump.set_bits(idx, field.pos, field.size);
                    }
                }
                Ok(())
            }
            (ViewKind::Array(av), Value::Array(items)) => {
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(Some(self.out.len()), access, "", &[], view.name());
                }
                for (i, item) in items.iter().enumerate() {
                    self.encode_value(&av.item, item, &format!("{access}[{i}]"))?;
                }
                Ok(())
            }
            (ViewKind::Struct(sv), Value::Struct(pairs)) => {
                if let Some(dump) = self.dump.as_deref_mut() {
                    dump.add_row(Some(self.out.len()), access, "", &[], view.name());
                }
                for (member, (_, v)) in sv.members.iter().zip(pairs.iter()) {
                    self.encode_value(&member.view, v, &join(access, &member.name))?;
                }
                Ok(())
            }
            // Values reaching the encoder went through `View::construct`,
            // which guarantees the kinds line up.
            (_, other) => Err(PackError::Construct(ConstructError::TypeMismatch {
                expected: view.name().to_string(),
                got: other.kind_name().to_string(),
            })),
        }
    }
}

fn join(access: &str, name: &str) -> String {
    if access.is_empty() {
        name.to_string()
    } else {
        format!("{access}.{name}")
    }
}

fn push_uint(out: &mut Vec<u8>, raw: u128, width: usize, order: ByteOrder) {
    match order {
        ByteOrder::Little => {
            for i in 0..width {
                out.push((raw >> (8 * i)) as u8);
            }
        }
        ByteOrder::Big => {
            for i in (0..width).rev() {
                out.push((raw >> (8 * i)) as u8);
            }
        }
    }
}

fn uint_from_bytes(bytes: &[u8], order: ByteOrder) -> u128 {
    match order {
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
        ByteOrder::Big => bytes
            .iter()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
    }
}

fn int_from_bytes(bytes: &[u8], order: ByteOrder, signed: bool) -> i128 {
    let raw = uint_from_bytes(bytes, order);
    let bits = bytes.len() * 8;
    if signed && (raw >> (bits - 1)) & 1 == 1 {
        raw as i128 - (1i128 << bits)
    } else {
        raw as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StructBuilder;

    fn header_view() -> Arc<View> {
        Arc::new(
            StructBuilder::new("header")
                .member("m1", Arc::new(View::u8()))
                .member("m2", Arc::new(View::u16(ByteOrder::Little)))
                .build(),
        )
    }

    #[test]
    fn test_uint_byte_orders() {
        assert_eq!(uint_from_bytes(&[0x02, 0x01], ByteOrder::Little), 0x0102);
        assert_eq!(uint_from_bytes(&[0x02, 0x01], ByteOrder::Big), 0x0201);

        let mut out = Vec::new();
        push_uint(&mut out, 0x0102, 2, ByteOrder::Little);
        push_uint(&mut out, 0x0102, 2, ByteOrder::Big);
        assert_eq!(out, vec![0x02, 0x01, 0x01, 0x02]);
    }

    #[test]
    fn test_signed_reinterpretation() {
        assert_eq!(int_from_bytes(&[0xff, 0xff], ByteOrder::Big, true), -1);
        assert_eq!(int_from_bytes(&[0xff, 0xff], ByteOrder::Big, false), 65535);
        assert_eq!(int_from_bytes(&[0x80], ByteOrder::Little, true), -128);
    }

    #[test]
    fn test_pack_validates_before_encoding() {
        let view = View::u8();
        assert_eq!(pack(&view, 7u8).unwrap(), vec![0x07]);
        assert!(matches!(
            pack(&view, 300i32),
            Err(PackError::Construct(ConstructError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_unpack_decodes_members() {
        let view = header_view();
        let inst = unpack(&view, b"\x01\x02\x00").expect("unpack");
        assert_eq!(inst.get::<u8>("m1").unwrap(), 1);
        assert_eq!(inst.get::<u16>("m2").unwrap(), 2);
    }

    #[test]
    fn test_unpack_failure_carries_rendered_dump() {
        let view = header_view();
        let err = unpack(&view, b"\x01\x02").unwrap_err();
        match &err {
            UnpackError::InsufficientMemory {
                type_name,
                needed,
                available,
                dump,
                ..
            } => {
                assert_eq!(type_name, "u16");
                assert_eq!(*needed, 2);
                assert_eq!(*available, 1);
                let table = dump.as_deref().expect("dump attached on replay");
                assert!(table.contains("m1"));
                assert!(table.contains(SHORTFALL_MARKER));
            }
            other => panic!("expected insufficient memory, got {other:?}"),
        }
    }

    #[test]
    fn test_excess_memory_marker_row() {
        let view = Arc::new(View::u8());
        let err = unpack(&view, b"\x01\x02").unwrap_err();
        match &err {
            UnpackError::ExcessMemory {
                offset,
                leftover,
                dump,
            } => {
                assert_eq!(*offset, 1);
                assert_eq!(leftover, &vec![0x02]);
                assert!(dump.as_deref().expect("dump").contains(EXCESS_MARKER));
            }
            other => panic!("expected excess memory, got {other:?}"),
        }
    }

    #[test]
    fn test_calcsize() {
        assert_eq!(calcsize(&header_view()).unwrap(), 3);
        let greedy = View::greedy_array("rest", Arc::new(View::u8()));
        match calcsize(&greedy) {
            Err(SizeError { type_name }) => assert_eq!(type_name, "rest"),
            other => panic!("expected size error, got {other:?}"),
        }
    }

    #[test]
    fn test_pack_and_getdump_rows() {
        let view = header_view();
        let value = Value::struct_of([("m1", Value::from(1u8)), ("m2", Value::from(258u16))]);
        let (bytes, table) = pack_and_getdump(&view, value).expect("pack");
        assert_eq!(bytes, b"\x01\x02\x01");
        assert!(table.contains("header"));
        assert!(table.contains("m2"));
        assert!(table.contains("02 01"));
    }
}
