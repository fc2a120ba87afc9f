/// Catalog entities consumed by the router
///
/// These mirror the metadata the placement catalog serves: logical tables and
/// columns, per-adapter column placements, and partitioning descriptors.
/// All ids are stable and never reused.
use serde::{Deserialize, Serialize};

use crate::algebra::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdapterId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u64);

/// What backs a logical table; only base tables accept modifications
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// Regular table owned by the system
    Base,
    /// Table backed by an external source; read-only
    Source,
    /// View; never directly modifiable
    View,
}

/// Logical table metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogTable {
    pub id: TableId,
    pub name: String,
    /// Ordered column ids; defines the logical column order of the row
    pub column_ids: Vec<ColumnId>,
    /// Primary key column; tables without one cannot be write-routed
    pub primary_key: Option<ColumnId>,
    pub modifiable: bool,
    pub kind: TableKind,
    /// Present iff the table is horizontally partitioned
    pub partitioning: Option<PartitioningDescriptor>,
}

impl CatalogTable {
    pub fn is_partitioned(&self) -> bool {
        self.partitioning.is_some()
    }

    /// Zero-based ordinal of the partition column within the logical row
    pub fn partition_column_index(&self) -> Option<usize> {
        let descriptor = self.partitioning.as_ref()?;
        self.column_ids.iter().position(|c| *c == descriptor.column)
    }
}

/// Logical column metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub id: ColumnId,
    pub table: TableId,
    pub name: String,
    /// Position within the logical row, matches the table's column order
    pub position: usize,
}

/// A storage backend instance able to host placements
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub id: AdapterId,
    pub name: String,
    /// True if the adapter provides its own modify operator
    pub supports_native_modify: bool,
}

/// The fact that one column of one table physically resides on one adapter
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPlacement {
    pub adapter: AdapterId,
    pub table: TableId,
    pub column: ColumnId,
    pub physical_schema: String,
    pub physical_table: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionType {
    Range,
    Hash,
    List,
}

/// Horizontal partitioning descriptor
///
/// Invariant: the partition ids of the scheme are a total, non-overlapping
/// cover of the table's key space as defined by the partition type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitioningDescriptor {
    /// Column whose value decides the target partition
    pub column: ColumnId,
    pub scheme: PartitionScheme,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PartitionScheme {
    /// Value hashed onto one of the listed partitions
    Hash { partitions: Vec<PartitionId> },
    /// Value mapped by half-open ranges `[min, max)`; an absent bound is open
    Range { partitions: Vec<RangePartition> },
    /// Value mapped by explicit membership lists
    List { partitions: Vec<ListPartition> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangePartition {
    pub id: PartitionId,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListPartition {
    pub id: PartitionId,
    pub values: Vec<Value>,
}

impl PartitioningDescriptor {
    pub fn partition_type(&self) -> PartitionType {
        match self.scheme {
            PartitionScheme::Hash { .. } => PartitionType::Hash,
            PartitionScheme::Range { .. } => PartitionType::Range,
            PartitionScheme::List { .. } => PartitionType::List,
        }
    }

    /// Ordered partition ids of this table
    pub fn partition_ids(&self) -> Vec<PartitionId> {
        match &self.scheme {
            PartitionScheme::Hash { partitions } => partitions.clone(),
            PartitionScheme::Range { partitions } => partitions.iter().map(|p| p.id).collect(),
            PartitionScheme::List { partitions } => partitions.iter().map(|p| p.id).collect(),
        }
    }
}
