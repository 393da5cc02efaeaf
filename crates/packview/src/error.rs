// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for view declaration, construction, and the codec passes.
//!
//! Construction-time errors ([`ConstructError`]) are raised the moment an
//! invalid value is built and never carry byte context. Decode-time errors
//! ([`UnpackError`]) gain the rendered dump table exactly once, at the
//! outermost call, via the replay strategy in [`crate::codec`].

use std::fmt;

/// Size query on a view whose byte length is not statically determinate
/// (greedy array, or a composite containing one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeError {
    /// Name of the view whose size was requested.
    pub type_name: String,
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indeterminate size: {}", self.type_name)
    }
}

impl std::error::Error for SizeError {}

/// Construction-time validation failure.
///
/// Raised immediately when an invalid instance is constructed, never
/// deferred to a later encode call.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructError {
    /// Integer value outside the range of its width/signedness.
    OutOfRange {
        type_name: String,
        value: i128,
        min: i128,
        max: i128,
    },
    /// Bit-record field value outside its declared bit range.
    FieldOutOfRange {
        field: String,
        value: i128,
        min: i128,
        max: i128,
    },
    /// Fixed-dimension array constructed from the wrong number of elements.
    LengthMismatch {
        type_name: String,
        expected: usize,
        got: usize,
    },
    /// Element access past the end of an array instance.
    IndexOutOfBounds { index: usize, len: usize },
    /// Input name that is not a declared structure member.
    UnexpectedMember { type_name: String, name: String },
    /// Declared structure member with neither an input value nor a default.
    MissingMember { type_name: String, name: String },
    /// Input name that is not a declared bit-record field.
    UnexpectedField { type_name: String, name: String },
    /// Declared bit-record field with neither an input value nor a default.
    MissingField { type_name: String, name: String },
    /// Value of the wrong kind for the target view.
    TypeMismatch { expected: String, got: String },
    /// Failure located inside a composite, prefixed with the access path of
    /// the failing element (`[2]`, `[1][0]`, `.member`).
    Element {
        path: String,
        source: Box<ConstructError>,
    },
}

impl ConstructError {
    /// Prefix this error with an access-path segment, extending an existing
    /// element path rather than nesting wrappers.
    pub(crate) fn at(self, prefix: &str) -> ConstructError {
        match self {
            Self::Element { path, source } => Self::Element {
                path: format!("{prefix}{path}"),
                source,
            },
            other => Self::Element {
                path: prefix.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                type_name,
                value,
                min,
                max,
            } => write!(
                f,
                "Value out of range for {}: {} not in [{}, {}]",
                type_name, value, min, max
            ),
            Self::FieldOutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "Value out of range for field '{}': {} not in [{}, {}]",
                field, value, min, max
            ),
            Self::LengthMismatch {
                type_name,
                expected,
                got,
            } => write!(
                f,
                "Length mismatch for {}: expected {} elements, got {}",
                type_name, expected, got
            ),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "Index out of bounds: {} >= {}", index, len)
            }
            Self::UnexpectedMember { type_name, name } => {
                write!(f, "Unexpected member for {}: '{}'", type_name, name)
            }
            Self::MissingMember { type_name, name } => {
                write!(f, "Missing member for {}: '{}'", type_name, name)
            }
            Self::UnexpectedField { type_name, name } => {
                write!(f, "Unexpected field for {}: '{}'", type_name, name)
            }
            Self::MissingField { type_name, name } => {
                write!(f, "Missing field for {}: '{}'", type_name, name)
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            Self::Element { path, source } => write!(f, "At {}: {}", path, source),
        }
    }
}

impl std::error::Error for ConstructError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Element { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Encode-side failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PackError {
    /// Transparent coercion of the input value failed.
    Construct(ConstructError),
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct(e) => write!(f, "Pack failed: {}", e),
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construct(e) => Some(e),
        }
    }
}

impl From<ConstructError> for PackError {
    fn from(e: ConstructError) -> Self {
        Self::Construct(e)
    }
}

/// Decode-side failure.
///
/// The `dump` field is `None` when the error is raised inside a pass and is
/// filled exactly once with the rendered diagnostic table at the outermost
/// call.
#[derive(Debug, Clone, PartialEq)]
pub enum UnpackError {
    /// Too few bytes remained to satisfy a fixed-size read.
    InsufficientMemory {
        type_name: String,
        /// Explicit absolute offset for non-consuming reads, `None` for
        /// cursor reads.
        offset: Option<usize>,
        needed: usize,
        available: usize,
        dump: Option<String>,
    },
    /// Unconsumed bytes remained after a completed top-level pass.
    ExcessMemory {
        offset: usize,
        leftover: Vec<u8>,
        dump: Option<String>,
    },
    /// Any other decode failure, wrapped with the failing view's name.
    Invalid {
        type_name: String,
        source: ConstructError,
        dump: Option<String>,
    },
}

impl UnpackError {
    /// Attach the rendered dump table. Called once, at the outermost pass.
    pub(crate) fn with_dump(self, table: String) -> Self {
        match self {
            Self::InsufficientMemory {
                type_name,
                offset,
                needed,
                available,
                ..
            } => Self::InsufficientMemory {
                type_name,
                offset,
                needed,
                available,
                dump: Some(table),
            },
            Self::ExcessMemory {
                offset, leftover, ..
            } => Self::ExcessMemory {
                offset,
                leftover,
                dump: Some(table),
            },
            Self::Invalid {
                type_name, source, ..
            } => Self::Invalid {
                type_name,
                source,
                dump: Some(table),
            },
        }
    }

    /// The rendered diagnostic table, if this error escaped the top-level
    /// call.
    pub fn dump(&self) -> Option<&str> {
        match self {
            Self::InsufficientMemory { dump, .. }
            | Self::ExcessMemory { dump, .. }
            | Self::Invalid { dump, .. } => dump.as_deref(),
        }
    }
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientMemory {
                type_name,
                offset,
                needed,
                available,
                ..
            } => {
                write!(
                    f,
                    "Insufficient memory for {}: needed {} bytes, only {} available ({} short)",
                    type_name,
                    needed,
                    available,
                    needed - available
                )?;
                if let Some(at) = offset {
                    write!(f, " at offset {}", at)?;
                }
            }
            Self::ExcessMemory {
                offset, leftover, ..
            } => {
                write!(
                    f,
                    "Excess memory: {} unconsumed byte(s) at offset {}:",
                    leftover.len(),
                    offset
                )?;
                for b in leftover {
                    write!(f, " {:02x}", b)?;
                }
            }
            Self::Invalid {
                type_name, source, ..
            } => {
                write!(f, "Unpack failed for {}: {}", type_name, source)?;
            }
        }
        if let Some(table) = self.dump() {
            write!(f, "\n\n{}", table)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnpackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_path_extension() {
        let inner = ConstructError::OutOfRange {
            type_name: "u8".to_string(),
            value: 300,
            min: 0,
            max: 255,
        };
        let err = inner.at("[1]").at("[0]");
        match &err {
            ConstructError::Element { path, .. } => assert_eq!(path, "[0][1]"),
            other => panic!("expected element error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("At [0][1]:"));
    }

    #[test]
    fn test_insufficient_display() {
        let err = UnpackError::InsufficientMemory {
            type_name: "u16".to_string(),
            offset: None,
            needed: 2,
            available: 1,
            dump: None,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient memory for u16: needed 2 bytes, only 1 available (1 short)"
        );
    }

    #[test]
    fn test_excess_display_lists_leftover() {
        let err = UnpackError::ExcessMemory {
            offset: 3,
            leftover: vec![0xab, 0xcd],
            dump: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("offset 3"));
        assert!(msg.contains("ab cd"));
    }

    #[test]
    fn test_invalid_wraps_decode_failure() {
        let err = UnpackError::Invalid {
            type_name: "header".to_string(),
            source: ConstructError::TypeMismatch {
                expected: "integer".to_string(),
                got: "array".to_string(),
            },
            dump: None,
        };
        assert!(err.to_string().contains("Unpack failed for header"));
        assert!(std::error::Error::source(&err).is_some());
        let enriched = err.with_dump("| table |".to_string());
        assert!(enriched.to_string().contains("| table |"));
    }

    #[test]
    fn test_dump_attached_once() {
        let err = UnpackError::ExcessMemory {
            offset: 0,
            leftover: vec![0x01],
            dump: None,
        };
        let enriched = err.with_dump("| table |".to_string());
        assert_eq!(enriched.dump(), Some("| table |"));
        assert!(enriched.to_string().contains("| table |"));
    }
}
