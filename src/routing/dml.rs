/// DML fanout: one physical modify per adapter holding the primary key
///
/// Writes must reach every replica, so a modify of a logical table becomes a
/// set of per-adapter physical modifies folded under a collect node. For
/// partitioned tables the fanout is pruned to adapters serving the identified
/// partition; anything ambiguous falls back to touching every target, which
/// over-writes on no rows rather than missing one.
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::algebra::{Expression, ModifyOperation, PlanNode};
use crate::catalog::{CatalogTable, ColumnPlacement, PartitionId, PlacementCatalog, TableKind};
use crate::context::StatementContext;
use crate::error::{RouterError, RouterResult};
use crate::routing::partition::{target_partition, validate_partition_distribution};
use crate::routing::placement::select_for_write;
use crate::routing::predicate::{extract_partition_values, resolve_value};
use crate::routing::rewriter::{PlanRewriter, SelectedAdapterInfo};
use crate::routing::scan_builder::JoinedScanBuilder;

/// Where a single DML statement must land within a partitioned table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PartitionTarget {
    /// Exactly one partition is affected
    Identified(PartitionId),
    /// Could affect any partition; every target adapter is written
    WorstCase,
}

pub struct DmlRouter<'a> {
    catalog: &'a dyn PlacementCatalog,
    scans: &'a JoinedScanBuilder,
    ctx: &'a StatementContext,
    permissive_extraction: bool,
}

impl<'a> DmlRouter<'a> {
    pub fn new(
        catalog: &'a dyn PlacementCatalog,
        scans: &'a JoinedScanBuilder,
        ctx: &'a StatementContext,
        permissive_extraction: bool,
    ) -> Self {
        Self {
            catalog,
            scans,
            ctx,
            permissive_extraction,
        }
    }

    /// Route one logical modify into a per-adapter physical fanout
    pub fn route(
        &self,
        modify: &PlanNode,
    ) -> RouterResult<(PlanNode, HashMap<crate::catalog::TableId, SelectedAdapterInfo>)> {
        let PlanNode::Modify {
            table: table_id,
            input,
            operation,
            update_columns,
            source_expressions,
        } = modify
        else {
            return Err(RouterError::internal(
                "DML routing called on a non-modify plan root",
            ));
        };

        let table = self.catalog.table(*table_id)?;
        self.check_modifiable(&table, *operation)?;

        let pk_targets = select_for_write(self.catalog, &table)?;
        validate_partition_distribution(self.catalog, &table, &pk_targets)?;

        let target = if table.is_partitioned() {
            self.partition_target(&table, input, *operation, update_columns, source_expressions)?
        } else {
            PartitionTarget::WorstCase
        };
        debug!(
            table = %table.name,
            operation = operation.as_str(),
            targets = pk_targets.len(),
            identified = matches!(target, PartitionTarget::Identified(_)),
            "routing dml fanout"
        );

        let mut selected = HashMap::new();
        let mut modifies: Vec<PlanNode> = Vec::new();
        for pk_placement in &pk_targets {
            if let PartitionTarget::Identified(partition) = target {
                let served = self
                    .catalog
                    .partitions_on_adapter(pk_placement.adapter, table.id);
                // Empty assignment metadata means the adapter serves everything
                if !served.is_empty() && !served.contains(&partition) {
                    debug!(
                        adapter = pk_placement.adapter.0,
                        partition = partition.0,
                        "skipping adapter, does not serve target partition"
                    );
                    continue;
                }
            }

            let placements = self
                .catalog
                .placements_on_adapter(pk_placement.adapter, table.id);
            if placements.is_empty() {
                continue;
            }

            // Vertical split: only update columns this adapter hosts, with
            // the source expressions pruned in lock step
            let (adapter_columns, adapter_sources) =
                self.prune_update_list(&table, &placements, update_columns, source_expressions)?;
            if *operation == ModifyOperation::Update
                && !update_columns.is_empty()
                && adapter_columns.is_empty()
            {
                debug!(
                    adapter = pk_placement.adapter.0,
                    table = %table.name,
                    "skipping adapter, hosts none of the updated columns"
                );
                continue;
            }

            let mut rewriter = PlanRewriter::new(
                self.catalog,
                self.scans,
                self.ctx,
                self.permissive_extraction,
            );
            let routed_input = rewriter.rewrite_dml_input(input, &table, &placements)?;
            selected.extend(rewriter.selected);

            let adapter = self.catalog.adapter(pk_placement.adapter)?;
            modifies.push(PlanNode::PhysicalModify {
                adapter: pk_placement.adapter,
                physical_schema: pk_placement.physical_schema.clone(),
                physical_table: pk_placement.physical_table.clone(),
                input: Box::new(routed_input),
                operation: *operation,
                update_columns: adapter_columns,
                source_expressions: adapter_sources,
                native: adapter.supports_native_modify,
            });
            selected.insert(
                table.id,
                SelectedAdapterInfo {
                    adapter: pk_placement.adapter,
                    adapter_name: adapter.name,
                    physical_schema: pk_placement.physical_schema.clone(),
                    physical_table: pk_placement.physical_table.clone(),
                },
            );
        }

        let mut iter = modifies.into_iter();
        let first = iter.next().ok_or_else(|| {
            RouterError::no_placement_for(
                "dml produced no physical modify on any adapter",
                &table.name,
            )
        })?;
        // Left-deep binary fold so executors see at most two inputs per
        // collect node
        let routed = iter.fold(first, |acc, next| PlanNode::ModifyCollect {
            left: Box::new(acc),
            right: Box::new(next),
        });
        Ok((routed, selected))
    }

    fn check_modifiable(&self, table: &CatalogTable, operation: ModifyOperation) -> RouterResult<()> {
        if table.kind != TableKind::Base || !table.modifiable {
            return Err(RouterError::unmodifiable(
                &table.name,
                table.kind,
                operation.as_str(),
            ));
        }
        Ok(())
    }

    /// Decide whether the statement pins down a single partition
    fn partition_target(
        &self,
        table: &CatalogTable,
        input: &PlanNode,
        operation: ModifyOperation,
        update_columns: &[String],
        source_expressions: &[Expression],
    ) -> RouterResult<PartitionTarget> {
        let Some(ordinal) = table.partition_column_index() else {
            return Ok(PartitionTarget::WorstCase);
        };
        let partition_column = self.catalog.column(
            table
                .partitioning
                .as_ref()
                .map(|d| d.column)
                .ok_or_else(|| RouterError::internal("partitioned table without descriptor"))?,
        )?;

        match operation {
            ModifyOperation::Insert => self.insert_target(table, input, ordinal, &partition_column.name),
            ModifyOperation::Delete => Ok(self.where_target(table, input, ordinal)?),
            ModifyOperation::Update => {
                let where_target = self.where_target(table, input, ordinal)?;
                let new_value = update_columns
                    .iter()
                    .position(|c| c == &partition_column.name)
                    .and_then(|i| source_expressions.get(i))
                    .map(|expr| resolve_value(expr, self.ctx));
                match new_value {
                    // Partition column not updated: where clause decides
                    None => Ok(where_target),
                    // Updated to an unresolvable expression
                    Some(None) => Ok(PartitionTarget::WorstCase),
                    Some(Some(value)) => {
                        let new_partition = target_partition(table, &value)?;
                        match where_target {
                            // Narrowing is only sound when the WHERE pins the
                            // same partition the SET value lands in; the rows
                            // being rewritten live in the WHERE's partition,
                            // and an unidentified WHERE can match rows
                            // anywhere
                            PartitionTarget::Identified(old) if old == new_partition => {
                                Ok(PartitionTarget::Identified(new_partition))
                            }
                            PartitionTarget::Identified(old) => {
                                warn!(
                                    table = %table.name,
                                    old = old.0,
                                    new = new_partition.0,
                                    "update moves rows across partitions, routing worst case"
                                );
                                Ok(PartitionTarget::WorstCase)
                            }
                            PartitionTarget::WorstCase => Ok(PartitionTarget::WorstCase),
                        }
                    }
                }
            }
        }
    }

    /// Partition identified by the WHERE clause, if there is exactly one
    fn where_target(
        &self,
        table: &CatalogTable,
        input: &PlanNode,
        ordinal: usize,
    ) -> RouterResult<PartitionTarget> {
        let Some(condition) = find_filter_condition(input) else {
            return Ok(PartitionTarget::WorstCase);
        };
        let extraction =
            extract_partition_values(condition, ordinal, self.ctx, self.permissive_extraction);
        if !extraction.usable() || extraction.values.len() != 1 {
            return Ok(PartitionTarget::WorstCase);
        }
        Ok(PartitionTarget::Identified(target_partition(
            table,
            &extraction.values[0],
        )?))
    }

    /// Partition identified by the inserted row, for single-row inserts
    fn insert_target(
        &self,
        table: &CatalogTable,
        input: &PlanNode,
        ordinal: usize,
        partition_column: &str,
    ) -> RouterResult<PartitionTarget> {
        match input {
            PlanNode::Values { fields, rows } => {
                if rows.len() != 1 {
                    return Ok(PartitionTarget::WorstCase);
                }
                let Some(index) = fields.iter().position(|f| f == partition_column) else {
                    return Ok(PartitionTarget::WorstCase);
                };
                match rows[0].get(index) {
                    Some(value) if !value.is_null() => Ok(PartitionTarget::Identified(
                        target_partition(table, value)?,
                    )),
                    _ => Ok(PartitionTarget::WorstCase),
                }
            }
            PlanNode::Project { input: inner, exprs } => {
                // Prepared inserts arrive as a projection of parameters over
                // a unit values node
                if !matches!(&**inner, PlanNode::Values { .. }) {
                    return Ok(PartitionTarget::WorstCase);
                }
                let Some(expr) = exprs.get(ordinal) else {
                    return Ok(PartitionTarget::WorstCase);
                };
                match resolve_value(expr, self.ctx) {
                    Some(value) if !value.is_null() => Ok(PartitionTarget::Identified(
                        target_partition(table, &value)?,
                    )),
                    _ => Ok(PartitionTarget::WorstCase),
                }
            }
            // INSERT ... SELECT: rows are only known at execution time
            _ => Ok(PartitionTarget::WorstCase),
        }
    }

    /// Restrict an update list to the columns hosted by the target adapter
    fn prune_update_list(
        &self,
        table: &CatalogTable,
        placements: &[ColumnPlacement],
        update_columns: &[String],
        source_expressions: &[Expression],
    ) -> RouterResult<(Vec<String>, Vec<Expression>)> {
        if update_columns.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut hosted_names = Vec::with_capacity(placements.len());
        for placement in placements {
            hosted_names.push(self.catalog.column(placement.column)?.name);
        }
        let mut columns = Vec::new();
        let mut sources = Vec::new();
        for (column, source) in update_columns.iter().zip(source_expressions.iter()) {
            if hosted_names.iter().any(|n| n == column) {
                columns.push(column.clone());
                sources.push(source.clone());
            } else {
                debug!(
                    table = %table.name,
                    column = %column,
                    "update column not hosted on target adapter, pruned"
                );
            }
        }
        Ok((columns, sources))
    }
}

/// First filter condition on the spine of a DML input tree
fn find_filter_condition(node: &PlanNode) -> Option<&Expression> {
    match node {
        PlanNode::Filter { condition, .. } => Some(condition),
        _ => node.children().into_iter().find_map(find_filter_condition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::algebra::{CallOperator, Value};
    use crate::catalog::{
        AdapterId, AdapterInfo, ColumnId, InMemoryCatalog, PartitionScheme, PartitioningDescriptor,
        RangePartition, TableId,
    };
    use crate::config::RouterConfig;

    fn two_adapter_catalog(partitioned: bool) -> (Arc<InMemoryCatalog>, CatalogTable) {
        let mut catalog = InMemoryCatalog::new();
        for (id, name, native) in [(1, "pg", true), (2, "mongo", false)] {
            catalog.add_adapter(AdapterInfo {
                id: AdapterId(id),
                name: name.to_string(),
                supports_native_modify: native,
            });
        }
        let table = CatalogTable {
            id: TableId(1),
            name: "events".to_string(),
            column_ids: vec![ColumnId(10), ColumnId(11), ColumnId(12)],
            primary_key: Some(ColumnId(10)),
            modifiable: true,
            kind: TableKind::Base,
            partitioning: partitioned.then(|| PartitioningDescriptor {
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
        };
        catalog.add_table(table.clone(), vec!["id", "payload", "ts"]);
        catalog.place_table(AdapterId(1), table.id, "pg", "events");
        catalog.place_table(AdapterId(2), table.id, "mongo", "events");
        if partitioned {
            catalog.assign_partitions(AdapterId(1), table.id, vec![PartitionId(1)]);
            catalog.assign_partitions(AdapterId(2), table.id, vec![PartitionId(2)]);
        }
        (Arc::new(catalog), table)
    }

    fn count_modifies(node: &PlanNode) -> usize {
        match node {
            PlanNode::PhysicalModify { .. } => 1,
            PlanNode::ModifyCollect { left, right } => {
                count_modifies(left) + count_modifies(right)
            }
            _ => 0,
        }
    }

    fn delete_with_where(table: TableId, condition: Expression) -> PlanNode {
        PlanNode::Modify {
            table,
            input: Box::new(PlanNode::Filter {
                input: Box::new(PlanNode::Scan { table }),
                condition,
            }),
            operation: ModifyOperation::Delete,
            update_columns: vec![],
            source_expressions: vec![],
        }
    }

    #[test]
    fn test_unpartitioned_write_fans_out_to_all_replicas() {
        let (catalog, table) = two_adapter_catalog(false);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = delete_with_where(
            table.id,
            Expression::eq(Expression::col(0), Expression::literal(Value::Int64(7))),
        );
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 2, "every replica must be written");
        assert!(matches!(routed, PlanNode::ModifyCollect { .. }));
    }

    #[test]
    fn test_identified_partition_prunes_fanout() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = delete_with_where(
            table.id,
            Expression::eq(Expression::col(2), Expression::literal(Value::Int64(150))),
        );
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 1, "only the serving adapter is written");
        match routed {
            PlanNode::PhysicalModify { adapter, native, .. } => {
                assert_eq!(adapter, AdapterId(2));
                assert!(!native, "mongo adapter does not modify natively");
            }
            other => panic!("expected single physical modify, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_where_routes_worst_case() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = delete_with_where(
            table.id,
            Expression::binary(
                CallOperator::GreaterThan,
                Expression::col(2),
                Expression::literal(Value::Int64(50)),
            ),
        );
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 2, "range predicate must write everywhere");
    }

    #[test]
    fn test_single_row_insert_targets_one_partition() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Values {
                fields: vec!["id".into(), "payload".into(), "ts".into()],
                rows: vec![vec![
                    Value::Int64(1),
                    Value::String("x".into()),
                    Value::Int64(42),
                ]],
            }),
            operation: ModifyOperation::Insert,
            update_columns: vec![],
            source_expressions: vec![],
        };
        let (routed, selected) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 1);
        match &routed {
            PlanNode::PhysicalModify { adapter, .. } => assert_eq!(*adapter, AdapterId(1)),
            other => panic!("expected physical modify, got {:?}", other),
        }
        assert_eq!(selected[&table.id].adapter_name, "pg");
    }

    #[test]
    fn test_prepared_insert_with_unbound_parameter_fans_out() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Project {
                input: Box::new(PlanNode::Values {
                    fields: vec!["zero".into()],
                    rows: vec![vec![Value::Int64(0)]],
                }),
                exprs: vec![
                    Expression::parameter(0),
                    Expression::parameter(1),
                    Expression::parameter(2),
                ],
            }),
            operation: ModifyOperation::Insert,
            update_columns: vec![],
            source_expressions: vec![],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 2, "unbound ts parameter is worst case");
    }

    #[test]
    fn test_prepared_insert_with_bound_parameter_is_pruned() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let mut ctx = StatementContext::new();
        ctx.bind_parameter(2, Value::Int64(150));
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Project {
                input: Box::new(PlanNode::Values {
                    fields: vec!["zero".into()],
                    rows: vec![vec![Value::Int64(0)]],
                }),
                exprs: vec![
                    Expression::parameter(0),
                    Expression::parameter(1),
                    Expression::parameter(2),
                ],
            }),
            operation: ModifyOperation::Insert,
            update_columns: vec![],
            source_expressions: vec![],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 1);
        match &routed {
            PlanNode::PhysicalModify { adapter, .. } => assert_eq!(*adapter, AdapterId(2)),
            other => panic!("expected physical modify, got {:?}", other),
        }
    }

    #[test]
    fn test_prepared_insert_prunes_projection_for_partial_placement() {
        let (catalog, table) = {
            let mut catalog = InMemoryCatalog::new();
            for (id, name) in [(1, "pg"), (2, "cass")] {
                catalog.add_adapter(AdapterInfo {
                    id: AdapterId(id),
                    name: name.to_string(),
                    supports_native_modify: true,
                });
            }
            let table = CatalogTable {
                id: TableId(1),
                name: "tickets".to_string(),
                column_ids: vec![ColumnId(10), ColumnId(11), ColumnId(12)],
                primary_key: Some(ColumnId(10)),
                modifiable: true,
                kind: TableKind::Base,
                partitioning: None,
            };
            catalog.add_table(table.clone(), vec!["id", "state", "note"]);
            catalog.place_table(AdapterId(1), table.id, "pg", "tickets");
            catalog.place_columns(
                AdapterId(2),
                table.id,
                &[ColumnId(10), ColumnId(11)],
                "cass",
                "tickets",
            );
            (Arc::new(catalog), table)
        };
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let mut ctx = StatementContext::new();
        ctx.bind_parameter(0, Value::Int64(1));
        ctx.bind_parameter(1, Value::String("open".into()));
        ctx.bind_parameter(2, Value::String("first".into()));
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Project {
                input: Box::new(PlanNode::Values {
                    fields: vec!["zero".into()],
                    rows: vec![vec![Value::Int64(0)]],
                }),
                exprs: vec![
                    Expression::parameter(0),
                    Expression::parameter(1),
                    Expression::parameter(2),
                ],
            }),
            operation: ModifyOperation::Insert,
            update_columns: vec![],
            source_expressions: vec![],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 2);

        // The partial adapter's input keeps only the hosted ordinals, in
        // logical column order
        fn check(node: &PlanNode) {
            match node {
                PlanNode::ModifyCollect { left, right } => {
                    check(left);
                    check(right);
                }
                PlanNode::PhysicalModify { adapter, input, .. } => match &**input {
                    PlanNode::Project { exprs, .. } => match adapter.0 {
                        1 => assert_eq!(exprs.len(), 3),
                        2 => {
                            assert_eq!(exprs.len(), 2);
                            assert_eq!(exprs[0], Expression::parameter(0));
                            assert_eq!(exprs[1], Expression::parameter(1));
                        }
                        other => panic!("unexpected adapter {}", other),
                    },
                    other => panic!("expected projection input, got {:?}", other),
                },
                other => panic!("unexpected node {:?}", other),
            }
        }
        check(&routed);
    }

    #[test]
    fn test_update_moving_row_across_partitions_is_worst_case() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        // WHERE ts = 50 (partition 1) SET ts = 150 (partition 2)
        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Filter {
                input: Box::new(PlanNode::Scan { table: table.id }),
                condition: Expression::eq(
                    Expression::col(2),
                    Expression::literal(Value::Int64(50)),
                ),
            }),
            operation: ModifyOperation::Update,
            update_columns: vec!["ts".into()],
            source_expressions: vec![Expression::literal(Value::Int64(150))],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 2, "both partitions must see the move");
    }

    #[test]
    fn test_update_with_unidentified_where_stays_worst_case() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        // SET ts = 150 (partition 2) but the WHERE only touches payload;
        // matching rows may live in any partition
        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Filter {
                input: Box::new(PlanNode::Scan { table: table.id }),
                condition: Expression::eq(
                    Expression::col(1),
                    Expression::literal(Value::String("x".into())),
                ),
            }),
            operation: ModifyOperation::Update,
            update_columns: vec!["ts".into()],
            source_expressions: vec![Expression::literal(Value::Int64(150))],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(
            count_modifies(&routed),
            2,
            "unidentified WHERE must force worst-case routing"
        );
    }

    #[test]
    fn test_update_narrows_when_where_and_set_agree() {
        let (catalog, table) = two_adapter_catalog(true);
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        // WHERE ts = 120 and SET ts = 150 both land in partition 2
        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Filter {
                input: Box::new(PlanNode::Scan { table: table.id }),
                condition: Expression::eq(
                    Expression::col(2),
                    Expression::literal(Value::Int64(120)),
                ),
            }),
            operation: ModifyOperation::Update,
            update_columns: vec!["ts".into()],
            source_expressions: vec![Expression::literal(Value::Int64(150))],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(count_modifies(&routed), 1);
        match &routed {
            PlanNode::PhysicalModify { adapter, .. } => assert_eq!(*adapter, AdapterId(2)),
            other => panic!("expected physical modify, got {:?}", other),
        }
    }

    #[test]
    fn test_update_prunes_columns_per_adapter() {
        let (catalog, table) = {
            let mut catalog = InMemoryCatalog::new();
            for (id, name) in [(1, "pg"), (2, "cass")] {
                catalog.add_adapter(AdapterInfo {
                    id: AdapterId(id),
                    name: name.to_string(),
                    supports_native_modify: true,
                });
            }
            let table = CatalogTable {
                id: TableId(1),
                name: "orders".to_string(),
                column_ids: vec![ColumnId(10), ColumnId(11), ColumnId(12)],
                primary_key: Some(ColumnId(10)),
                modifiable: true,
                kind: TableKind::Base,
                partitioning: None,
            };
            catalog.add_table(table.clone(), vec!["id", "cust", "amt"]);
            catalog.place_table(AdapterId(1), table.id, "pg", "orders");
            // cass only holds pk + cust; an update of amt must skip it
            catalog.place_columns(
                AdapterId(2),
                table.id,
                &[ColumnId(10), ColumnId(11)],
                "cass",
                "orders",
            );
            (Arc::new(catalog), table)
        };
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: table.id,
            input: Box::new(PlanNode::Filter {
                input: Box::new(PlanNode::Scan { table: table.id }),
                condition: Expression::eq(
                    Expression::col(0),
                    Expression::literal(Value::Int64(7)),
                ),
            }),
            operation: ModifyOperation::Update,
            update_columns: vec!["amt".into()],
            source_expressions: vec![Expression::literal(Value::Int64(99))],
        };
        let (routed, _) = router.route(&plan).unwrap();
        assert_eq!(
            count_modifies(&routed),
            1,
            "adapter hosting none of the updated columns is skipped"
        );
        match &routed {
            PlanNode::PhysicalModify {
                adapter,
                update_columns,
                ..
            } => {
                assert_eq!(*adapter, AdapterId(1));
                assert_eq!(update_columns, &vec!["amt".to_string()]);
            }
            other => panic!("expected physical modify, got {:?}", other),
        }
    }

    #[test]
    fn test_view_is_unmodifiable() {
        let (catalog, _) = {
            let mut catalog = InMemoryCatalog::new();
            catalog.add_adapter(AdapterInfo {
                id: AdapterId(1),
                name: "pg".to_string(),
                supports_native_modify: true,
            });
            let view = CatalogTable {
                id: TableId(9),
                name: "v_orders".to_string(),
                column_ids: vec![ColumnId(90)],
                primary_key: Some(ColumnId(90)),
                modifiable: false,
                kind: TableKind::View,
                partitioning: None,
            };
            catalog.add_table(view.clone(), vec!["id"]);
            catalog.place_table(AdapterId(1), view.id, "pg", "v_orders");
            (Arc::new(catalog), view)
        };
        let scans = JoinedScanBuilder::new(catalog.clone(), &RouterConfig::default());
        let ctx = StatementContext::new();
        let router = DmlRouter::new(catalog.as_ref(), &scans, &ctx, false);

        let plan = PlanNode::Modify {
            table: TableId(9),
            input: Box::new(PlanNode::Scan { table: TableId(9) }),
            operation: ModifyOperation::Delete,
            update_columns: vec![],
            source_expressions: vec![],
        };
        assert!(matches!(
            router.route(&plan).unwrap_err(),
            RouterError::UnmodifiableTable { .. }
        ));
    }
}
