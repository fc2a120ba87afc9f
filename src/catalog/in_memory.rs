/// Hash-map backed placement catalog
///
/// Used by embedders that manage metadata themselves and by every test in
/// this crate. Registration is id-driven; ids are assigned by the caller and
/// never reused.
use std::collections::HashMap;

use crate::catalog::entity::{
    AdapterId, AdapterInfo, CatalogColumn, CatalogTable, ColumnId, ColumnPlacement, PartitionId,
    TableId,
};
use crate::catalog::PlacementCatalog;
use crate::error::{RouterError, RouterResult};

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: HashMap<TableId, CatalogTable>,
    tables_by_name: HashMap<String, TableId>,
    columns: HashMap<ColumnId, CatalogColumn>,
    adapters: HashMap<AdapterId, AdapterInfo>,
    /// Placements per column, in registration order
    placements_by_column: HashMap<ColumnId, Vec<ColumnPlacement>>,
    /// Partition ids served by an adapter's placement of a table
    partition_assignment: HashMap<(AdapterId, TableId), Vec<PartitionId>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a storage adapter
    pub fn add_adapter(&mut self, adapter: AdapterInfo) {
        self.adapters.insert(adapter.id, adapter);
    }

    /// Register a table with its columns
    ///
    /// Column order must match `table.column_ids`; positions are assigned
    /// from that order.
    pub fn add_table(&mut self, table: CatalogTable, column_names: Vec<&str>) {
        assert_eq!(
            table.column_ids.len(),
            column_names.len(),
            "one name per column id"
        );
        for (position, (id, name)) in table
            .column_ids
            .iter()
            .zip(column_names.iter())
            .enumerate()
        {
            self.columns.insert(
                *id,
                CatalogColumn {
                    id: *id,
                    table: table.id,
                    name: name.to_string(),
                    position,
                },
            );
        }
        self.tables_by_name.insert(table.name.clone(), table.id);
        self.tables.insert(table.id, table);
    }

    /// Register a single column placement
    pub fn add_placement(&mut self, placement: ColumnPlacement) {
        self.placements_by_column
            .entry(placement.column)
            .or_default()
            .push(placement);
    }

    /// Place a subset of a table's columns on one adapter
    pub fn place_columns(
        &mut self,
        adapter: AdapterId,
        table: TableId,
        columns: &[ColumnId],
        physical_schema: &str,
        physical_table: &str,
    ) {
        for column in columns {
            self.add_placement(ColumnPlacement {
                adapter,
                table,
                column: *column,
                physical_schema: physical_schema.to_string(),
                physical_table: physical_table.to_string(),
            });
        }
    }

    /// Place every column of a table on one adapter (full replica)
    pub fn place_table(
        &mut self,
        adapter: AdapterId,
        table: TableId,
        physical_schema: &str,
        physical_table: &str,
    ) {
        let column_ids = match self.tables.get(&table) {
            Some(t) => t.column_ids.clone(),
            None => return,
        };
        self.place_columns(adapter, table, &column_ids, physical_schema, physical_table);
    }

    /// Declare which partitions an adapter's placement of a table serves
    pub fn assign_partitions(
        &mut self,
        adapter: AdapterId,
        table: TableId,
        partitions: Vec<PartitionId>,
    ) {
        self.partition_assignment.insert((adapter, table), partitions);
    }

    /// Look up a table id by name
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables_by_name.get(name).copied()
    }
}

impl PlacementCatalog for InMemoryCatalog {
    fn table(&self, id: TableId) -> RouterResult<CatalogTable> {
        self.tables
            .get(&id)
            .cloned()
            .ok_or_else(|| RouterError::catalog(format!("unknown table id {}", id.0)))
    }

    fn column(&self, id: ColumnId) -> RouterResult<CatalogColumn> {
        self.columns
            .get(&id)
            .cloned()
            .ok_or_else(|| RouterError::catalog(format!("unknown column id {}", id.0)))
    }

    fn column_by_name(&self, table: TableId, name: &str) -> RouterResult<CatalogColumn> {
        let t = self.table(table)?;
        for id in &t.column_ids {
            if let Some(column) = self.columns.get(id) {
                if column.name == name {
                    return Ok(column.clone());
                }
            }
        }
        Err(RouterError::catalog(format!(
            "unknown column '{}' on table '{}'",
            name, t.name
        )))
    }

    fn adapter(&self, id: AdapterId) -> RouterResult<AdapterInfo> {
        self.adapters
            .get(&id)
            .cloned()
            .ok_or_else(|| RouterError::catalog(format!("unknown adapter id {}", id.0)))
    }

    fn column_placements(&self, column: ColumnId) -> Vec<ColumnPlacement> {
        self.placements_by_column
            .get(&column)
            .cloned()
            .unwrap_or_default()
    }

    fn placements_on_adapter(&self, adapter: AdapterId, table: TableId) -> Vec<ColumnPlacement> {
        // Returned in the table's logical column order
        let Ok(t) = self.table(table) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for column in &t.column_ids {
            if let Some(placements) = self.placements_by_column.get(column) {
                if let Some(p) = placements.iter().find(|p| p.adapter == adapter) {
                    out.push(p.clone());
                }
            }
        }
        out
    }

    fn partitions_on_adapter(&self, adapter: AdapterId, table: TableId) -> Vec<PartitionId> {
        self.partition_assignment
            .get(&(adapter, table))
            .cloned()
            .unwrap_or_default()
    }

    fn has_placement(&self, adapter: AdapterId, column: ColumnId) -> bool {
        self.placements_by_column
            .get(&column)
            .map(|placements| placements.iter().any(|p| p.adapter == adapter))
            .unwrap_or(false)
    }
}
