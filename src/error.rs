/// Unified error type for the routing engine
/// Provides structured error handling with categories for different failure modes
use thiserror::Error;

use crate::catalog::TableKind;

#[derive(Error, Debug, Clone)]
pub enum RouterError {
    /// A table or column has no placement on any adapter; nothing to route to
    #[error("No placement: {message}")]
    NoPlacement {
        message: String,
        table: Option<String>,
    },

    /// DML attempted against a table that cannot be modified
    /// Carries the table kind so callers can produce a precise message
    #[error("Table '{table}' of kind {kind:?} does not support {operation}")]
    UnmodifiableTable {
        table: String,
        kind: TableKind,
        operation: String,
    },

    /// A partition-column value has no valid target partition,
    /// or the partitioning metadata is corrupt/incomplete
    #[error("Partition resolution failed: {message}")]
    PartitionResolution {
        message: String,
        table: Option<String>,
        value: Option<String>,
    },

    /// A scan references something other than a recognized logical table
    /// Internal invariant violation, not user-recoverable
    #[error("Unexpected table: {message}")]
    UnexpectedTable { message: String },

    /// Catalog lookup failed: unknown table, column, or adapter id
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Plan shape the router cannot handle (e.g. conditions on columns
    /// not hosted by the target adapter of a vertically split write)
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// Internal errors: should never happen, indicates a bug
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RouterError {
    pub fn no_placement(message: impl Into<String>) -> Self {
        Self::NoPlacement {
            message: message.into(),
            table: None,
        }
    }

    pub fn no_placement_for(message: impl Into<String>, table: impl Into<String>) -> Self {
        Self::NoPlacement {
            message: message.into(),
            table: Some(table.into()),
        }
    }

    pub fn unmodifiable(
        table: impl Into<String>,
        kind: TableKind,
        operation: impl Into<String>,
    ) -> Self {
        Self::UnmodifiableTable {
            table: table.into(),
            kind,
            operation: operation.into(),
        }
    }

    pub fn partition_resolution(message: impl Into<String>) -> Self {
        Self::PartitionResolution {
            message: message.into(),
            table: None,
            value: None,
        }
    }

    pub fn partition_value(
        message: impl Into<String>,
        table: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::PartitionResolution {
            message: message.into(),
            table: Some(table.into()),
            value: Some(value.into()),
        }
    }

    pub fn unexpected_table(message: impl Into<String>) -> Self {
        Self::UnexpectedTable {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the routing core
pub type RouterResult<T> = Result<T, RouterError>;
