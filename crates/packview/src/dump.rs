// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural trace of one encode/decode pass.
//!
//! Rows append in depth-first traversal order, mirroring the structural
//! walk: a composite's header row lands before its children's rows.
//!
//! The rendered table has the fixed column order
//! `Offset | Access | Value | Memory | Type`. Row *content* is a contract;
//! the exact padding of the rendered text is diagnostic-only.

use std::fmt::Write;

/// One trace row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Absolute byte offset, `None` for rows without their own bytes
    /// (e.g. bit-record fields, reserved rows that never completed).
    pub offset: Option<usize>,
    /// Bit range `(pos, size)` within the container, for bit-record fields.
    pub bits: Option<(u32, u32)>,
    /// Access path from the root (`m1`, `m1.x`, `m2[3]`). Empty at the root.
    pub access: String,
    /// Rendered semantic value. Empty for composite header rows.
    pub value: String,
    /// Raw bytes backing this row. Empty when the parent row owns them.
    pub memory: Vec<u8>,
    /// View or field type name.
    pub type_name: String,
}

impl Row {
    fn offset_cell(&self) -> String {
        match (self.offset, self.bits) {
            (_, Some((pos, size))) => format!("[{}:{}]", pos, pos + size),
            (Some(off), None) => off.to_string(),
            (None, None) => String::new(),
        }
    }

    fn memory_cell(&self) -> String {
        let mut s = String::with_capacity(self.memory.len() * 3);
        for (i, b) in self.memory.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}

/// Ordered trace of rows built during one pass.
#[derive(Debug, Default)]
pub struct Dump {
    rows: Vec<Row>,
}

impl Dump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row and return its index.
    pub fn add_row(
        &mut self,
        offset: Option<usize>,
        access: impl Into<String>,
        value: impl Into<String>,
        memory: &[u8],
        type_name: impl Into<String>,
    ) -> usize {
        self.rows.push(Row {
            offset,
            bits: None,
            access: access.into(),
            value: value.into(),
            memory: memory.to_vec(),
            type_name: type_name.into(),
        });
        self.rows.len() - 1
    }

    /// Annotate a row with a bit range within its parent container.
    pub fn set_bits(&mut self, index: usize, pos: u32, size: u32) {
        self.rows[index].bits = Some((pos, size));
    }

    /// Rows in traversal order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the fixed-column text table.
    pub fn render(&self) -> String {
        const HEADERS: [&str; 5] = ["Offset", "Access", "Value", "Memory", "Type"];

        let cells: Vec<[String; 5]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.offset_cell(),
                    r.access.clone(),
                    r.value.clone(),
                    r.memory_cell(),
                    r.type_name.clone(),
                ]
            })
            .collect();

        let mut widths = [0usize; 5];
        for (i, h) in HEADERS.iter().enumerate() {
            widths[i] = h.len();
        }
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let mut out = String::new();
        let rule = |out: &mut String| {
            for w in widths {
                out.push('+');
                for _ in 0..w + 2 {
                    out.push('-');
                }
            }
            out.push_str("+\n");
        };
        let line = |out: &mut String, row: &[String; 5]| {
            for (i, cell) in row.iter().enumerate() {
                let _ = write!(out, "| {:<width$} ", cell, width = widths[i]);
            }
            out.push_str("|\n");
        };

        rule(&mut out);
        let header_row = [
            HEADERS[0].to_string(),
            HEADERS[1].to_string(),
            HEADERS[2].to_string(),
            HEADERS[3].to_string(),
            HEADERS[4].to_string(),
        ];
        line(&mut out, &header_row);
        rule(&mut out);
        for row in &cells {
            line(&mut out, row);
        }
        rule(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_append_in_order() {
        let mut dump = Dump::new();
        dump.add_row(Some(0), "m1", "1", &[0x01], "u8");
        dump.add_row(Some(1), "m2", "258", &[0x02, 0x01], "u16");
        let rows = dump.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].access, "m1");
        assert_eq!(rows[1].value, "258");
        assert_eq!(rows[1].memory, vec![0x02, 0x01]);
    }

    #[test]
    fn test_bit_range_offset_cell() {
        let mut dump = Dump::new();
        let idx = dump.add_row(None, "flags.f2", "2", &[], "u4");
        dump.set_bits(idx, 8, 4);
        let table = dump.render();
        assert!(table.contains("[8:12]"));
    }

    #[test]
    fn test_render_contains_headers_and_hex() {
        let mut dump = Dump::new();
        dump.add_row(Some(2), "m2", "258", &[0x02, 0x01], "u16");
        let table = dump.render();
        for header in ["Offset", "Access", "Value", "Memory", "Type"] {
            assert!(table.contains(header), "missing header {header}");
        }
        assert!(table.contains("02 01"));
        assert!(table.contains("u16"));
    }
}
