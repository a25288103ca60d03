// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// One schema violation: where it happened in the tree and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer of the offending instance, e.g. `/batches/0/plates/3`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Errors raised while classifying listing lines, building the hierarchy,
/// and validating the serialized tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A segment or filename does not have the expected shape
    #[error("{0}")]
    PathFormat(String),

    /// An id found in a path disagrees with the node it addresses
    #[error("{kind} ID mismatch: \"{expected}\" != \"{found}\"")]
    IdentifierMismatch {
        kind: &'static str,
        expected: String,
        found: String,
    },

    /// A single-valued slot is already filled
    #[error("Duplicated {slot}: {existing}, {incoming}")]
    DuplicateAssignment {
        slot: String,
        existing: String,
        incoming: String,
    },

    /// A value outside one of the fixed vocabularies
    #[error("Unknown {category}: {value}")]
    UnknownCategory {
        category: &'static str,
        value: String,
    },

    /// The tree still fails the schema after plate and batch pruning
    #[error("Schema violation after repair: {}", format_violations(.0))]
    SchemaViolation(Vec<Violation>),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn path_format<S: Into<String>>(msg: S) -> Self {
        Error::PathFormat(msg.into())
    }

    pub fn identifier_mismatch<E: Into<String>, F: Into<String>>(
        kind: &'static str,
        expected: E,
        found: F,
    ) -> Self {
        Error::IdentifierMismatch {
            kind,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn duplicate<S: Into<String>>(slot: S, existing: &str, incoming: &str) -> Self {
        Error::DuplicateAssignment {
            slot: slot.into(),
            existing: existing.to_string(),
            incoming: incoming.to_string(),
        }
    }

    pub fn unknown_category<S: Into<String>>(category: &'static str, value: S) -> Self {
        Error::UnknownCategory {
            category,
            value: value.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// True for the errors the ingest loop records and skips past.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            Error::PathFormat(_)
                | Error::IdentifierMismatch { .. }
                | Error::DuplicateAssignment { .. }
                | Error::UnknownCategory { .. }
        )
    }
}
