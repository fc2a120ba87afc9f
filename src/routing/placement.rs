/// Placement selection for unpartitioned tables
///
/// Reads pick a base adapter covering the most columns and borrow the rest;
/// writes fan out to every adapter holding the primary key.
use std::collections::HashMap;

use tracing::debug;

use crate::catalog::{AdapterId, CatalogTable, ColumnPlacement, PlacementCatalog};
use crate::error::{RouterError, RouterResult};

/// Pick one placement per logical column for a read
///
/// The adapter holding the most columns of the table becomes the base; every
/// column it does not cover is borrowed from the first other adapter that has
/// it. The result is aligned to the table's column order, exactly one
/// placement per logical column, even if that spans adapters.
pub fn select_for_read(
    catalog: &dyn PlacementCatalog,
    table: &CatalogTable,
) -> RouterResult<Vec<ColumnPlacement>> {
    let mut coverage: HashMap<AdapterId, usize> = HashMap::new();
    for column in &table.column_ids {
        for placement in catalog.column_placements(*column) {
            *coverage.entry(placement.adapter).or_insert(0) += 1;
        }
    }
    // Ties break toward the lowest adapter id so selection is deterministic
    let base_adapter = coverage
        .iter()
        .max_by_key(|(adapter, count)| (**count, std::cmp::Reverse(adapter.0)))
        .map(|(adapter, _)| *adapter)
        .ok_or_else(|| {
            RouterError::no_placement_for("table has no placement on any adapter", &table.name)
        })?;

    let mut selected = Vec::with_capacity(table.column_ids.len());
    for column in &table.column_ids {
        let placements = catalog.column_placements(*column);
        let placement = placements
            .iter()
            .find(|p| p.adapter == base_adapter)
            .or_else(|| placements.first())
            .cloned()
            .ok_or_else(|| {
                let name = catalog
                    .column(*column)
                    .map(|c| c.name)
                    .unwrap_or_else(|_| format!("#{}", column.0));
                RouterError::no_placement_for(
                    format!("column '{}' has no placement on any adapter", name),
                    &table.name,
                )
            })?;
        selected.push(placement);
    }
    debug!(
        table = %table.name,
        base_adapter = base_adapter.0,
        columns = selected.len(),
        "selected read placements"
    );
    Ok(selected)
}

/// Every adapter holding the primary key, as DML fanout targets
///
/// The primary-key column's placement set defines the full list of adapters
/// holding any replica of the table. A table with zero primary-key placements
/// is a configuration error, never a silent no-op.
pub fn select_for_write(
    catalog: &dyn PlacementCatalog,
    table: &CatalogTable,
) -> RouterResult<Vec<ColumnPlacement>> {
    let pk_column = table.primary_key.ok_or_else(|| {
        RouterError::no_placement_for("table has no primary key to route writes by", &table.name)
    })?;
    let placements = catalog.column_placements(pk_column);
    if placements.is_empty() {
        return Err(RouterError::no_placement_for(
            "primary key has no placement on any adapter",
            &table.name,
        ));
    }
    Ok(placements)
}

/// Adapters holding a placement of every column of the table, in order of
/// the primary column's placement registration
pub fn full_placement_adapters(
    catalog: &dyn PlacementCatalog,
    table: &CatalogTable,
) -> Vec<AdapterId> {
    let mut adapters: Vec<AdapterId> = Vec::new();
    for column in &table.column_ids {
        for placement in catalog.column_placements(*column) {
            if !adapters.contains(&placement.adapter) {
                adapters.push(placement.adapter);
            }
        }
    }
    adapters
        .into_iter()
        .filter(|adapter| {
            table
                .column_ids
                .iter()
                .all(|column| catalog.has_placement(*adapter, *column))
        })
        .collect()
}

/// Read placements pinned to one adapter; fails unless the adapter covers
/// every column of the table
pub fn select_on_adapter(
    catalog: &dyn PlacementCatalog,
    adapter: AdapterId,
    table: &CatalogTable,
) -> RouterResult<Vec<ColumnPlacement>> {
    let placements = catalog.placements_on_adapter(adapter, table.id);
    if placements.len() != table.column_ids.len() {
        return Err(RouterError::no_placement_for(
            format!(
                "adapter {} holds {} of {} columns, full placement required",
                adapter.0,
                placements.len(),
                table.column_ids.len()
            ),
            &table.name,
        ));
    }
    Ok(placements)
}
