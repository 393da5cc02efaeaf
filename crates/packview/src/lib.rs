// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # packview - Declarative binary structure views
//!
//! Typed, named views over raw byte buffers: fixed-width integers,
//! bit-packed records, homogeneous arrays, and ordered structures, with a
//! generic codec and a tabular diagnostic trace for when the bytes do not
//! line up.
//!
//! ## Quick Start
//!
//! ```rust
//! use packview::{ByteOrder, StructBuilder, Value, View};
//! use std::sync::Arc;
//!
//! let header = Arc::new(
//!     StructBuilder::new("header")
//!         .member("m1", Arc::new(View::u8()))
//!         .member("m2", Arc::new(View::u16(ByteOrder::Little)))
//!         .build(),
//! );
//!
//! let value = Value::struct_of([("m1", Value::from(1u8)), ("m2", Value::from(258u16))]);
//! let bytes = packview::pack(&header, value)?;
//! assert_eq!(bytes, b"\x01\x02\x01");
//!
//! let inst = packview::unpack(&header, &bytes)?;
//! assert_eq!(inst.get::<u16>("m2")?, 258);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`View`] | Immutable descriptor mapping a byte range to a typed value |
//! | [`Instance`] | A validated value bound to its view |
//! | [`Value`] | Dynamic value for any view kind |
//! | [`Memory`] | Bounds-checked cursor over a byte buffer |
//! | [`Dump`] | Structural trace table of one codec pass |
//!
//! ## Error Model
//!
//! Validation happens at construction: a value that survives
//! [`View::construct`] always encodes. Decoding runs without tracing; a
//! failed decode is replayed with diagnostics and the error carries the
//! rendered trace table, so the common path pays nothing for it.
//!
//! ## Modules Overview
//!
//! - [`view`] - View descriptors and validation (start here)
//! - [`builder`] - Fluent builders for composite views
//! - [`codec`] - Generic encode/decode walkers
//! - [`instance`] - Validated values with typed access
//! - [`dump`] - Diagnostic trace tables

/// Fluent builders for bit-record and structure views.
pub mod builder;
/// Generic encode/decode walkers and the replay-with-diagnostics strategy.
pub mod codec;
/// Structural trace tables rendered on codec failures.
pub mod dump;
/// Declaration, construction, and codec error types.
pub mod error;
/// Validated values bound to their views, with typed member access.
pub mod instance;
/// Bounds-checked, cursor-advancing byte buffer views.
pub mod memory;
/// Dynamic values and typed extraction.
pub mod value;
/// Immutable view descriptors (integers, bit records, arrays, structures).
pub mod view;

pub use builder::{BitRecordBuilder, StructBuilder};
pub use codec::{calcsize, getdump, pack, pack_and_getdump, unpack, unpack_and_getdump};
pub use dump::{Dump, Row};
pub use error::{ConstructError, PackError, SizeError, UnpackError};
pub use instance::Instance;
pub use memory::Memory;
pub use value::{FromValue, Value};
pub use view::{ByteOrder, View, ViewKind};

#[cfg(test)]
mod tests;
