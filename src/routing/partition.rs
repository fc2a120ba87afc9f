/// Partition-target resolution for horizontally partitioned tables
///
/// Maps a concrete partition-column value to its partition id, and maps a
/// set of partition ids to the placements that must be touched. Over-selection
/// (worst case) is the accepted safety fallback; under-selection is forbidden.
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use fxhash::FxHasher;
use tracing::debug;

use crate::algebra::Value;
use crate::catalog::{
    CatalogTable, ColumnPlacement, PartitionId, PartitionScheme, PlacementCatalog,
};
use crate::error::{RouterError, RouterResult};

/// Deterministic partition id for a partition-column value
///
/// Pure and total over valid partition-column domains; out-of-domain values
/// fail with a partition-resolution error.
pub fn target_partition(table: &CatalogTable, value: &Value) -> RouterResult<PartitionId> {
    let descriptor = table.partitioning.as_ref().ok_or_else(|| {
        RouterError::internal(format!(
            "target_partition called for unpartitioned table '{}'",
            table.name
        ))
    })?;
    if value.is_null() {
        return Err(RouterError::partition_value(
            "NULL is not a valid partition-column value",
            &table.name,
            value.to_string(),
        ));
    }
    match &descriptor.scheme {
        PartitionScheme::Hash { partitions } => {
            if partitions.is_empty() {
                return Err(RouterError::partition_resolution(format!(
                    "table '{}' has a hash partitioning scheme with zero partitions",
                    table.name
                )));
            }
            let mut hasher = FxHasher::default();
            value.hash(&mut hasher);
            let index = (hasher.finish() % partitions.len() as u64) as usize;
            Ok(partitions[index])
        }
        PartitionScheme::Range { partitions } => {
            for partition in partitions {
                let above_min = match &partition.min {
                    None => true,
                    Some(min) => match value.partial_cmp(min) {
                        Some(ordering) => ordering != std::cmp::Ordering::Less,
                        None => {
                            return Err(incomparable(table, value));
                        }
                    },
                };
                let below_max = match &partition.max {
                    None => true,
                    Some(max) => match value.partial_cmp(max) {
                        Some(ordering) => ordering == std::cmp::Ordering::Less,
                        None => {
                            return Err(incomparable(table, value));
                        }
                    },
                };
                if above_min && below_max {
                    return Ok(partition.id);
                }
            }
            Err(RouterError::partition_value(
                "value outside every range partition",
                &table.name,
                value.to_string(),
            ))
        }
        PartitionScheme::List { partitions } => partitions
            .iter()
            .find(|p| p.values.contains(value))
            .map(|p| p.id)
            .ok_or_else(|| {
                RouterError::partition_value(
                    "value not contained in any list partition",
                    &table.name,
                    value.to_string(),
                )
            }),
    }
}

fn incomparable(table: &CatalogTable, value: &Value) -> RouterError {
    RouterError::partition_value(
        "value not comparable with range partition bounds",
        &table.name,
        value.to_string(),
    )
}

/// Resolve a list of predicate values to their (deduplicated) partition ids
pub fn target_partitions(table: &CatalogTable, values: &[Value]) -> RouterResult<Vec<PartitionId>> {
    let mut ids = Vec::new();
    for value in values {
        let id = target_partition(table, value)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Placements that must be touched to cover the given partitions
///
/// `partition_ids = None` is the worst case: every placement serving any
/// partition of the table (a safe-but-expensive superset). Placements whose
/// adapter has no recorded partition assignment are treated as serving
/// everything, so incomplete metadata can only over-select, never
/// under-select.
pub fn relevant_placements(
    catalog: &dyn PlacementCatalog,
    table: &CatalogTable,
    partition_ids: Option<&[PartitionId]>,
) -> RouterResult<Vec<ColumnPlacement>> {
    if table.partitioning.is_none() {
        return Err(RouterError::internal(format!(
            "relevant_placements called for unpartitioned table '{}'",
            table.name
        )));
    }
    let requested: Option<HashSet<PartitionId>> =
        partition_ids.map(|ids| ids.iter().copied().collect());

    let mut placements = Vec::new();
    for column in &table.column_ids {
        for placement in catalog.column_placements(*column) {
            let served = catalog.partitions_on_adapter(placement.adapter, table.id);
            let relevant = match &requested {
                None => true,
                Some(ids) => served.is_empty() || served.iter().any(|p| ids.contains(p)),
            };
            if relevant {
                placements.push(placement);
            }
        }
    }
    if placements.is_empty() {
        return Err(RouterError::no_placement_for(
            "partitioned table has no relevant placements",
            &table.name,
        ));
    }
    debug!(
        table = %table.name,
        count = placements.len(),
        worst_case = requested.is_none(),
        "resolved relevant placements"
    );
    Ok(placements)
}

/// Check that the adapter-to-partition assignment covers every partition
///
/// Every partition id of the table must be served by at least one adapter
/// holding the primary key; otherwise a pruned write could silently miss
/// rows. Corrupt/incomplete metadata fails the statement.
pub fn validate_partition_distribution(
    catalog: &dyn PlacementCatalog,
    table: &CatalogTable,
    pk_placements: &[ColumnPlacement],
) -> RouterResult<()> {
    let Some(descriptor) = table.partitioning.as_ref() else {
        return Ok(());
    };
    let mut covered: HashSet<PartitionId> = HashSet::new();
    let mut unassigned_adapter = false;
    for placement in pk_placements {
        let served = catalog.partitions_on_adapter(placement.adapter, table.id);
        if served.is_empty() {
            // Treated as serving everything by the read path
            unassigned_adapter = true;
        }
        covered.extend(served);
    }
    if unassigned_adapter {
        return Ok(());
    }
    for id in descriptor.partition_ids() {
        if !covered.contains(&id) {
            return Err(RouterError::partition_resolution(format!(
                "partition {} of table '{}' is not served by any primary-key-bearing adapter",
                id.0, table.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        AdapterId, CatalogTable, ColumnId, InMemoryCatalog, ListPartition, PartitioningDescriptor,
        RangePartition, TableId, TableKind,
    };

    fn range_table() -> CatalogTable {
        CatalogTable {
            id: TableId(1),
            name: "events".to_string(),
            column_ids: vec![ColumnId(10), ColumnId(11), ColumnId(12)],
            primary_key: Some(ColumnId(10)),
            modifiable: true,
            kind: TableKind::Base,
            partitioning: Some(PartitioningDescriptor {
                column: ColumnId(12),
                scheme: PartitionScheme::Range {
                    partitions: vec![
                        RangePartition {
                            id: PartitionId(1),
                            min: Some(Value::Int64(0)),
                            max: Some(Value::Int64(100)),
                        },
                        RangePartition {
                            id: PartitionId(2),
                            min: Some(Value::Int64(100)),
                            max: Some(Value::Int64(200)),
                        },
                    ],
                },
            }),
        }
    }

    #[test]
    fn test_range_target_partition() {
        let table = range_table();
        assert_eq!(
            target_partition(&table, &Value::Int64(150)).unwrap(),
            PartitionId(2)
        );
        assert_eq!(
            target_partition(&table, &Value::Int64(0)).unwrap(),
            PartitionId(1)
        );
        // Upper bounds are exclusive
        assert_eq!(
            target_partition(&table, &Value::Int64(100)).unwrap(),
            PartitionId(2)
        );
    }

    #[test]
    fn test_range_out_of_domain() {
        let table = range_table();
        assert!(target_partition(&table, &Value::Int64(500)).is_err());
        assert!(target_partition(&table, &Value::Int64(-1)).is_err());
        assert!(target_partition(&table, &Value::Null).is_err());
    }

    #[test]
    fn test_hash_partition_total_and_deterministic() {
        let mut table = range_table();
        table.partitioning = Some(PartitioningDescriptor {
            column: ColumnId(12),
            scheme: PartitionScheme::Hash {
                partitions: vec![PartitionId(1), PartitionId(2), PartitionId(3)],
            },
        });
        let ids = table.partitioning.as_ref().unwrap().partition_ids();
        for i in 0..100 {
            let first = target_partition(&table, &Value::Int64(i)).unwrap();
            let second = target_partition(&table, &Value::Int64(i)).unwrap();
            assert_eq!(first, second, "hash targeting must be deterministic");
            assert!(ids.contains(&first), "target must be a declared partition");
        }
    }

    #[test]
    fn test_hash_partition_consistent_across_integer_widths() {
        let mut table = range_table();
        table.partitioning = Some(PartitioningDescriptor {
            column: ColumnId(12),
            scheme: PartitionScheme::Hash {
                partitions: vec![PartitionId(1), PartitionId(2), PartitionId(3)],
            },
        });
        // An insert with a narrow literal and a delete with the equal wide
        // literal must land on the same partition
        for i in -50..50 {
            assert_eq!(
                target_partition(&table, &Value::Int32(i)).unwrap(),
                target_partition(&table, &Value::Int64(i as i64)).unwrap(),
                "equal partition-column values must share a hash target"
            );
        }
    }

    #[test]
    fn test_list_partition_membership() {
        let mut table = range_table();
        table.partitioning = Some(PartitioningDescriptor {
            column: ColumnId(12),
            scheme: PartitionScheme::List {
                partitions: vec![
                    ListPartition {
                        id: PartitionId(1),
                        values: vec![Value::String("eu".into()), Value::String("uk".into())],
                    },
                    ListPartition {
                        id: PartitionId(2),
                        values: vec![Value::String("us".into())],
                    },
                ],
            },
        });
        assert_eq!(
            target_partition(&table, &Value::String("us".into())).unwrap(),
            PartitionId(2)
        );
        assert!(target_partition(&table, &Value::String("jp".into())).is_err());
    }

    fn partitioned_catalog() -> (InMemoryCatalog, CatalogTable) {
        let table = range_table();
        let mut catalog = InMemoryCatalog::new();
        catalog.add_table(table.clone(), vec!["id", "payload", "ts"]);
        catalog.place_table(AdapterId(1), table.id, "a1", "events");
        catalog.place_table(AdapterId(2), table.id, "a2", "events");
        catalog.assign_partitions(AdapterId(1), table.id, vec![PartitionId(1), PartitionId(2)]);
        catalog.assign_partitions(AdapterId(2), table.id, vec![PartitionId(2)]);
        (catalog, table)
    }

    #[test]
    fn test_relevant_placements_prunes_by_partition() {
        let (catalog, table) = partitioned_catalog();
        let placements =
            relevant_placements(&catalog, &table, Some(&[PartitionId(1)])).unwrap();
        assert!(placements.iter().all(|p| p.adapter == AdapterId(1)));

        let placements =
            relevant_placements(&catalog, &table, Some(&[PartitionId(2)])).unwrap();
        let adapters: HashSet<AdapterId> = placements.iter().map(|p| p.adapter).collect();
        assert_eq!(adapters.len(), 2, "both adapters serve partition 2");
    }

    #[test]
    fn test_worst_case_is_superset_of_identified() {
        let (catalog, table) = partitioned_catalog();
        let worst: HashSet<ColumnPlacement> = relevant_placements(&catalog, &table, None)
            .unwrap()
            .into_iter()
            .collect();
        for ids in [vec![PartitionId(1)], vec![PartitionId(2)]] {
            let identified = relevant_placements(&catalog, &table, Some(&ids)).unwrap();
            for placement in identified {
                assert!(
                    worst.contains(&placement),
                    "worst case must never be a subset of an identified selection"
                );
            }
        }
    }

    #[test]
    fn test_unassigned_adapter_is_never_pruned() {
        let (mut catalog, table) = partitioned_catalog();
        // Adapter 3 holds placements but has no partition assignment recorded
        catalog.place_table(AdapterId(3), table.id, "a3", "events");
        let placements =
            relevant_placements(&catalog, &table, Some(&[PartitionId(1)])).unwrap();
        assert!(
            placements.iter().any(|p| p.adapter == AdapterId(3)),
            "placements without assignment metadata must be over-selected, not dropped"
        );
    }

    #[test]
    fn test_validate_partition_distribution() {
        let (catalog, table) = partitioned_catalog();
        let pk = catalog.column_placements(ColumnId(10));
        assert!(validate_partition_distribution(&catalog, &table, &pk).is_ok());

        // Partition 1 only served by adapter 1; dropping it breaks coverage
        let partial: Vec<ColumnPlacement> = pk
            .iter()
            .filter(|p| p.adapter == AdapterId(2))
            .cloned()
            .collect();
        assert!(validate_partition_distribution(&catalog, &table, &partial).is_err());
    }
}
