/// Placement catalog: metadata about tables, columns, adapters, and the
/// physical placement of columns on adapters
///
/// The router only consumes this interface; metadata storage and DDL live
/// elsewhere. All lookups are in-memory metadata reads.
pub mod entity;
pub mod in_memory;

pub use entity::{
    AdapterId, AdapterInfo, CatalogColumn, CatalogTable, ColumnId, ColumnPlacement, ListPartition,
    PartitionId, PartitionScheme, PartitionType, PartitioningDescriptor, RangePartition, TableId,
    TableKind,
};
pub use in_memory::InMemoryCatalog;

use crate::error::RouterResult;

/// Read interface to placement metadata
pub trait PlacementCatalog: Send + Sync {
    /// Table metadata by id
    fn table(&self, id: TableId) -> RouterResult<CatalogTable>;

    /// Column metadata by id
    fn column(&self, id: ColumnId) -> RouterResult<CatalogColumn>;

    /// Column metadata by name within a table
    fn column_by_name(&self, table: TableId, name: &str) -> RouterResult<CatalogColumn>;

    /// Adapter metadata by id
    fn adapter(&self, id: AdapterId) -> RouterResult<AdapterInfo>;

    /// Every placement of a column, across all adapters
    fn column_placements(&self, column: ColumnId) -> Vec<ColumnPlacement>;

    /// An adapter's placements of a table, in logical column order
    fn placements_on_adapter(&self, adapter: AdapterId, table: TableId) -> Vec<ColumnPlacement>;

    /// Partition ids the adapter's placement of the table serves
    fn partitions_on_adapter(&self, adapter: AdapterId, table: TableId) -> Vec<PartitionId>;

    /// True if the adapter holds a placement of the column
    fn has_placement(&self, adapter: AdapterId, column: ColumnId) -> bool;
}
