//! Protocol header schema.
//!
//! A response whose decoded header passes the schema is a protocol-layer
//! response; anything else is treated as a plain public API answer.

use thiserror::Error;

use crate::protocol::header::ProtocolHeader;

/// One reason a header failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("missing required property '{0}'")]
    Missing(&'static str),

    #[error("property '{field}' is {value}, outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("property '{field}' is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Validates decoded protocol headers.
pub trait HeaderSchema: Send + Sync {
    fn validate(&self, header: &ProtocolHeader) -> Result<(), Vec<SchemaViolation>>;
}

/// Built-in peer header schema.
///
/// `port`, `version`, `nethash` and `height` are required; `os` is optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerHeaderSchema;

const MAX_OS_LEN: usize = 64;
const MAX_VERSION_LEN: usize = 11;
const MAX_NETHASH_LEN: usize = 64;

impl HeaderSchema for PeerHeaderSchema {
    fn validate(&self, header: &ProtocolHeader) -> Result<(), Vec<SchemaViolation>> {
        let mut violations = Vec::new();

        match header.port {
            None => violations.push(SchemaViolation::Missing("port")),
            Some(port) if !(1..=65535).contains(&port) => {
                violations.push(SchemaViolation::OutOfRange {
                    field: "port",
                    value: port,
                    min: 1,
                    max: 65535,
                })
            }
            Some(_) => {}
        }

        match header.height {
            None => violations.push(SchemaViolation::Missing("height")),
            Some(height) if height < 1 => violations.push(SchemaViolation::OutOfRange {
                field: "height",
                value: height,
                min: 1,
                max: i64::MAX,
            }),
            Some(_) => {}
        }

        check_len(&mut violations, "os", header.os.as_deref(), MAX_OS_LEN, false);
        check_len(&mut violations, "version", header.version.as_deref(), MAX_VERSION_LEN, true);
        check_len(&mut violations, "nethash", header.nethash.as_deref(), MAX_NETHASH_LEN, true);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_len(
    violations: &mut Vec<SchemaViolation>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
    required: bool,
) {
    match value {
        None if required => violations.push(SchemaViolation::Missing(field)),
        Some(v) if v.chars().count() > max => {
            violations.push(SchemaViolation::TooLong { field, max })
        }
        _ => {}
    }
}
