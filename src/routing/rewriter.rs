/// Bottom-up plan rewriting: logical operators over logical tables become
/// the same operators over placement-resolved physical scans
///
/// One rewriter instance serves one routing call. Partition-predicate
/// bindings are threaded down through the recursion (extracted at a
/// filter-over-scan pattern, consumed by the immediate scan child) instead of
/// living in shared mutable state, so bindings cannot leak across sibling
/// subtrees.
use std::collections::HashMap;

use tracing::debug;

use crate::algebra::{Expression, PlanNode};
use crate::catalog::{AdapterId, CatalogTable, ColumnPlacement, PlacementCatalog, TableId};
use crate::context::StatementContext;
use crate::error::{RouterError, RouterResult};
use crate::routing::partition::{relevant_placements, target_partitions};
use crate::routing::placement::{select_for_read, select_on_adapter};
use crate::routing::predicate::{extract_partition_values, ExtractedValues};
use crate::routing::scan_builder::JoinedScanBuilder;

/// Which adapter and physical name routing chose for one logical table
/// Recorded per routing call for observability
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedAdapterInfo {
    pub adapter: AdapterId,
    pub adapter_name: String,
    pub physical_schema: String,
    pub physical_table: String,
}

pub struct PlanRewriter<'a> {
    catalog: &'a dyn PlacementCatalog,
    scans: &'a JoinedScanBuilder,
    ctx: &'a StatementContext,
    permissive_extraction: bool,
    /// When set, reads of unpartitioned tables are pinned to this adapter
    pinned_adapter: Option<AdapterId>,
    /// Per-table adapter choice, collected while rewriting
    pub selected: HashMap<TableId, SelectedAdapterInfo>,
}

impl<'a> PlanRewriter<'a> {
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
            pinned_adapter: None,
            selected: HashMap::new(),
        }
    }

    /// Pin unpartitioned reads to one (fully covering) adapter
    pub fn pinned_to(mut self, adapter: AdapterId) -> Self {
        self.pinned_adapter = Some(adapter);
        self
    }

    /// Rewrite a read plan into its physical form
    pub fn rewrite(&mut self, node: &PlanNode) -> RouterResult<PlanNode> {
        self.rewrite_node(node, None)
    }

    fn rewrite_node(
        &mut self,
        node: &PlanNode,
        binding: Option<ExtractedValues>,
    ) -> RouterResult<PlanNode> {
        match node {
            PlanNode::Filter { input, condition } => {
                // Pre-pass: a filter directly above a scan of a partitioned
                // table narrows that scan; extract before descending and hand
                // the binding to exactly that child
                let child_binding = self.partition_binding(input, condition)?;
                let child = self.rewrite_node(input, child_binding)?;
                Ok(PlanNode::Filter {
                    input: Box::new(child),
                    condition: condition.clone(),
                })
            }
            PlanNode::Scan { table } => self.resolve_scan(*table, binding),
            // Pure in-memory row source; nothing to resolve
            PlanNode::Values { .. } => Ok(node.clone()),
            PlanNode::Modify { .. } | PlanNode::PhysicalModify { .. } => Err(
                RouterError::internal("modify operators must be routed through the DML fanout"),
            ),
            _ => {
                // Structure-preserving rebuild: the operator itself is never
                // adapter-specific
                let mut children = Vec::new();
                for child in node.children() {
                    children.push(self.rewrite_node(child, None)?);
                }
                node.with_children(children)
            }
        }
    }

    /// Extract partition-column values if `input` is a scan of a partitioned
    /// table underneath this filter condition
    fn partition_binding(
        &self,
        input: &PlanNode,
        condition: &Expression,
    ) -> RouterResult<Option<ExtractedValues>> {
        let Some(table_id) = input.scanned_table() else {
            return Ok(None);
        };
        let table = self.lookup_table(table_id)?;
        let Some(partition_index) = table.partition_column_index() else {
            return Ok(None);
        };
        let extraction = extract_partition_values(
            condition,
            partition_index,
            self.ctx,
            self.permissive_extraction,
        );
        debug!(
            table = %table.name,
            identified = extraction.identified,
            values = extraction.values.len(),
            "partition predicate extraction"
        );
        Ok(Some(extraction))
    }

    /// Resolve one logical table scan to a physical scan subtree
    fn resolve_scan(
        &mut self,
        table_id: TableId,
        binding: Option<ExtractedValues>,
    ) -> RouterResult<PlanNode> {
        let table = self.lookup_table(table_id)?;

        let placements = if table.is_partitioned() {
            let partition_ids = match binding {
                Some(extraction) if extraction.usable() => {
                    Some(target_partitions(&table, &extraction.values)?)
                }
                // No binding or ambiguous predicate: worst-case fallback,
                // every placement serving any partition
                _ => None,
            };
            relevant_placements(self.catalog, &table, partition_ids.as_deref())?
        } else if let Some(adapter) = self.pinned_adapter {
            select_on_adapter(self.catalog, adapter, &table)?
        } else {
            select_for_read(self.catalog, &table)?
        };

        self.record_selection(&table, &placements)?;
        let scan = self.scans.build(&placements)?;
        Ok((*scan).clone())
    }

    /// Scoped rewrite for the input of a per-adapter physical modify:
    /// scans of the modified table stay on the target adapter, and partial
    /// placements restrict projections to hosted columns
    pub fn rewrite_dml_input(
        &mut self,
        node: &PlanNode,
        table: &CatalogTable,
        placements: &[ColumnPlacement],
    ) -> RouterResult<PlanNode> {
        let full_placement = placements.len() == table.column_ids.len();
        match node {
            PlanNode::Scan { table: scanned } => {
                if *scanned != table.id {
                    // INSERT INTO t SELECT ... FROM other: the source side is
                    // routed like any read
                    return self.rewrite(node);
                }
                let scan = self.single_adapter_scan(placements)?;
                self.record_selection(table, placements)?;
                Ok(scan)
            }
            PlanNode::Values { fields, .. } => {
                // Only a direct insert carries the full logical row here; a
                // unit values row under a parameter projection passes through
                if full_placement || fields.len() != table.column_ids.len() {
                    Ok(node.clone())
                } else {
                    // Vertical split: feed only the columns this adapter hosts
                    let exprs = self.placement_columns(placements)?;
                    Ok(PlanNode::Project {
                        input: Box::new(node.clone()),
                        exprs,
                    })
                }
            }
            PlanNode::Project { input, exprs } => {
                let child = self.rewrite_dml_input(input, table, placements)?;
                if full_placement {
                    return node.with_children(vec![child]);
                }
                // Projection expressions line up with the logical row, one
                // per column; keep only the ordinals the adapter hosts, in
                // lock step with the placement list
                let mut pruned = Vec::with_capacity(placements.len());
                for placement in placements {
                    let column = self.catalog.column(placement.column)?;
                    let expr = exprs.get(column.position).ok_or_else(|| {
                        RouterError::internal(format!(
                            "modify input projects {} expressions but column '{}' of table '{}' sits at ordinal {}",
                            exprs.len(),
                            column.name,
                            table.name,
                            column.position
                        ))
                    })?;
                    pruned.push(expr.clone());
                }
                Ok(PlanNode::Project {
                    input: Box::new(child),
                    exprs: pruned,
                })
            }
            PlanNode::Filter { input, condition } => {
                if !full_placement {
                    self.check_condition_is_hosted(condition, table, placements)?;
                }
                let child = self.rewrite_dml_input(input, table, placements)?;
                node.with_children(vec![child])
            }
            _ => {
                let mut children = Vec::new();
                for child in node.children() {
                    children.push(self.rewrite_dml_input(child, table, placements)?);
                }
                node.with_children(children)
            }
        }
    }

    /// A plain scan over one adapter's placements (no canonicalizing
    /// projection; the enclosing modify addresses the same adapter)
    fn single_adapter_scan(&self, placements: &[ColumnPlacement]) -> RouterResult<PlanNode> {
        let first = placements.first().ok_or_else(|| {
            RouterError::no_placement("cannot scan an adapter without placements")
        })?;
        let mut columns = Vec::with_capacity(placements.len());
        for placement in placements {
            columns.push(self.catalog.column(placement.column)?.name);
        }
        Ok(PlanNode::PhysicalScan {
            adapter: first.adapter,
            physical_schema: first.physical_schema.clone(),
            physical_table: first.physical_table.clone(),
            columns,
        })
    }

    fn placement_columns(&self, placements: &[ColumnPlacement]) -> RouterResult<Vec<Expression>> {
        let mut exprs = Vec::with_capacity(placements.len());
        for placement in placements {
            exprs.push(Expression::named(self.catalog.column(placement.column)?.name));
        }
        Ok(exprs)
    }

    /// Vertically split writes cannot filter on columns the target adapter
    /// does not host
    fn check_condition_is_hosted(
        &self,
        condition: &Expression,
        table: &CatalogTable,
        placements: &[ColumnPlacement],
    ) -> RouterResult<()> {
        let adapter = match placements.first() {
            Some(p) => p.adapter,
            None => return Ok(()),
        };
        let mut stack = vec![condition];
        while let Some(expr) = stack.pop() {
            match expr {
                Expression::ColumnRef(index) => {
                    let column = table.column_ids.get(*index).ok_or_else(|| {
                        RouterError::internal(format!(
                            "filter references ordinal {} outside table '{}'",
                            index, table.name
                        ))
                    })?;
                    if !self.catalog.has_placement(adapter, *column) {
                        let name = self.catalog.column(*column)?.name;
                        return Err(RouterError::unsupported(format!(
                            "modify of vertically split table '{}' filters on column '{}' which adapter {} does not host",
                            table.name, name, adapter.0
                        )));
                    }
                }
                Expression::Call { operands, .. } => stack.extend(operands.iter()),
                Expression::Alias { expr, .. } => stack.push(expr),
                _ => {}
            }
        }
        Ok(())
    }

    fn record_selection(
        &mut self,
        table: &CatalogTable,
        placements: &[ColumnPlacement],
    ) -> RouterResult<()> {
        if let Some(first) = placements.first() {
            let adapter = self.catalog.adapter(first.adapter)?;
            self.selected.insert(
                table.id,
                SelectedAdapterInfo {
                    adapter: first.adapter,
                    adapter_name: adapter.name,
                    physical_schema: first.physical_schema.clone(),
                    physical_table: first.physical_table.clone(),
                },
            );
        }
        Ok(())
    }

    fn lookup_table(&self, id: TableId) -> RouterResult<CatalogTable> {
        self.catalog.table(id).map_err(|_| {
            RouterError::unexpected_table(format!(
                "scan references unknown table id {}; only logical tables can be routed",
                id.0
            ))
        })
    }
}
