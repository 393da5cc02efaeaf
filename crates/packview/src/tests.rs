// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-module workflow tests: definition through codec and diagnostics.

use crate::builder::{BitRecordBuilder, StructBuilder};
use crate::error::UnpackError;
use crate::instance::Instance;
use crate::value::Value;
use crate::view::{ByteOrder, View};
use crate::{pack, unpack, unpack_and_getdump};
use std::sync::Arc;

/// A small message: id, packed flags, fixed payload, greedy trailer.
fn message_view() -> Arc<View> {
    let flags = Arc::new(
        BitRecordBuilder::new("flags", 1, ByteOrder::Little)
            .field("version", 0, 4)
            .field("ack", 4, 1)
            .field_default("reserved", 5, 3, 0)
            .build(),
    );
    let payload = Arc::new(View::array("payload", Arc::new(View::u8()), 2));
    let trailer = Arc::new(View::greedy_array(
        "trailer",
        Arc::new(View::u16(ByteOrder::Big)),
    ));
    Arc::new(
        StructBuilder::new("message")
            .member("id", Arc::new(View::u16(ByteOrder::Little)))
            .member("flags", flags)
            .member("payload", payload)
            .member("trailer", trailer)
            .build(),
    )
}

#[test]
fn test_pack_unpack_round_trip() {
    let view = message_view();
    let value = Value::struct_of([
        ("id", Value::from(258u16)),
        (
            "flags",
            Value::struct_of([("version", 2u8), ("ack", 1u8)]),
        ),
        ("payload", Value::from(vec![0xaau8, 0xbb])),
        ("trailer", Value::from(vec![1u16, 2])),
    ]);

    let bytes = pack(&view, value).expect("pack");
    // id le, flags (version=2, ack=1 -> 0x12), payload, trailer be
    assert_eq!(bytes, b"\x02\x01\x12\xaa\xbb\x00\x01\x00\x02");

    let inst = unpack(&view, &bytes).expect("unpack");
    assert_eq!(inst.get::<u16>("id").unwrap(), 258);
    let flags: Instance = Instance::new(
        view_member(&view, "flags"),
        inst.get_field("flags").unwrap(),
    )
    .expect("flags instance");
    assert_eq!(flags.get::<u8>("version").unwrap(), 2);
    assert!(flags.get::<bool>("ack").unwrap());
    assert_eq!(
        inst.get_field("trailer").unwrap(),
        Value::array_of([1u16, 2])
    );
}

fn view_member<'v>(view: &'v Arc<View>, name: &str) -> &'v Arc<View> {
    match view.kind() {
        crate::ViewKind::Struct(sv) => &sv.member(name).expect("member").view,
        _ => panic!("expected struct"),
    }
}

#[test]
fn test_greedy_trailer_consumes_rest() {
    let view = message_view();
    // Empty trailer is a valid exact decode.
    let inst = unpack(&view, b"\x02\x01\x12\xaa\xbb").expect("unpack");
    assert_eq!(inst.get_field("trailer").unwrap(), Value::Array(vec![]));

    // An odd trailing byte cannot form a u16 item.
    let err = unpack(&view, b"\x02\x01\x12\xaa\xbb\x07").unwrap_err();
    assert!(matches!(err, UnpackError::InsufficientMemory { .. }));
}

#[test]
fn test_dump_rows_follow_traversal_order() {
    let view = message_view();
    let (_, table) = unpack_and_getdump(&view, b"\x02\x01\x12\xaa\xbb\x00\x01").expect("unpack");

    let id_line = table.find("| id").expect("id row");
    let flags_line = table.find("| flags").expect("flags row");
    let version_line = table.find("| flags.version").expect("field row");
    let payload0_line = table.find("| payload[0]").expect("element row");
    assert!(id_line < flags_line);
    assert!(flags_line < version_line);
    assert!(version_line < payload0_line);

    // Bit-record field rows render their bit range, not a byte offset.
    assert!(table.contains("[0:4]"));
    assert!(table.contains("[4:5]"));
}

#[test]
fn test_symbol_labels_render_in_dump() {
    let view = Arc::new(
        StructBuilder::new("cmd")
            .member(
                "op",
                Arc::new(View::u8().with_symbols([(0, "NOP"), (1, "READ")])),
            )
            .build(),
    );
    let (inst, table) = unpack_and_getdump(&view, b"\x01").expect("unpack");
    assert_eq!(inst.get::<u8>("op").unwrap(), 1);
    assert!(table.contains("READ"));
}

#[test]
fn test_defaults_round_trip() {
    let view = message_view();
    let inst = Instance::with_defaults(&view).expect("defaults");
    let bytes = inst.pack().expect("pack");
    assert_eq!(bytes, b"\x00\x00\x00\x00\x00");
    let back = unpack(&view, &bytes).expect("unpack");
    assert_eq!(inst, back);
}

#[test]
fn test_mutation_then_repack() {
    let view = message_view();
    let mut inst = Instance::with_defaults(&view).expect("defaults");
    inst.set("id", 7u16).expect("set id");
    inst.set(
        "payload",
        Value::array_of([0x01u8, 0x02]),
    )
    .expect("set payload");
    let bytes = inst.pack().expect("pack");
    assert_eq!(bytes, b"\x07\x00\x00\x01\x02");
}
