/// Joined-table-scan synthesis
///
/// Builds the physical scan subtree for a set of column placements. A table
/// living on one adapter becomes a single scan plus a canonicalizing
/// projection; a table split across adapters becomes per-adapter scans
/// inner-joined on the primary key. Built subtrees are cached by the
/// placement set's content hash and shared across concurrent routing calls.
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use fxhash::FxHasher;
use tracing::debug;

use crate::algebra::{Expression, JoinType, PlanNode};
use crate::catalog::{AdapterId, ColumnPlacement, PlacementCatalog};
use crate::config::RouterConfig;
use crate::error::{RouterError, RouterResult};

pub struct JoinedScanBuilder {
    catalog: Arc<dyn PlacementCatalog>,
    cache_enabled: bool,
    cache_capacity: usize,
    cache: DashMap<u64, Arc<PlanNode>>,
    /// Insertion order for bounded FIFO eviction
    insertion_order: Mutex<VecDeque<u64>>,
}

impl JoinedScanBuilder {
    pub fn new(catalog: Arc<dyn PlacementCatalog>, config: &RouterConfig) -> Self {
        Self {
            catalog,
            cache_enabled: config.joined_scan_cache_enabled,
            cache_capacity: config.joined_scan_cache_size.max(1),
            cache: DashMap::new(),
            insertion_order: Mutex::new(VecDeque::new()),
        }
    }

    /// Order-independent content hash of a placement set
    ///
    /// Permutations of the same placements must hit the same cache entry, so
    /// per-placement hashes are combined with a commutative operation.
    pub fn placement_set_hash(placements: &[ColumnPlacement]) -> u64 {
        let mut combined = placements.len() as u64;
        for placement in placements {
            let mut hasher = FxHasher::default();
            placement.hash(&mut hasher);
            combined = combined.wrapping_add(hasher.finish());
        }
        combined
    }

    /// Build (or fetch from cache) the physical scan subtree for a placement
    /// set
    ///
    /// The returned subtree is shared; callers must treat it as immutable.
    pub fn build(&self, placements: &[ColumnPlacement]) -> RouterResult<Arc<PlanNode>> {
        if placements.is_empty() {
            return Err(RouterError::no_placement(
                "cannot scan a table with an empty placement list",
            ));
        }

        let key = Self::placement_set_hash(placements);
        if self.cache_enabled {
            if let Some(cached) = self.cache.get(&key) {
                debug!(key, "joined-scan cache hit");
                return Ok(cached.clone());
            }
        }

        let node = Arc::new(self.build_uncached(placements)?);

        if self.cache_enabled {
            let mut order = self
                .insertion_order
                .lock()
                .map_err(|_| RouterError::internal("joined-scan cache lock poisoned"))?;
            if !self.cache.contains_key(&key) {
                while order.len() >= self.cache_capacity {
                    if let Some(evicted) = order.pop_front() {
                        self.cache.remove(&evicted);
                    } else {
                        break;
                    }
                }
                self.cache.insert(key, node.clone());
                order.push_back(key);
            }
        }
        Ok(node)
    }

    fn build_uncached(&self, placements: &[ColumnPlacement]) -> RouterResult<PlanNode> {
        let groups = group_by_adapter(placements);

        if groups.len() == 1 {
            let (_, group) = &groups[0];
            let scan = self.scan_for_group(group)?;
            return Ok(self.final_projection(scan, placements)?);
        }

        // Vertical split: join every adapter group to the first on the
        // primary key, aliasing each borrowed group's key to avoid collision
        let table = self.catalog.table(placements[0].table)?;
        let pk_column = table.primary_key.ok_or_else(|| {
            RouterError::internal(format!(
                "table '{}' is split across adapters but has no primary key to join on",
                table.name
            ))
        })?;
        let pk_name = self.catalog.column(pk_column)?.name;
        let pk_placements = self.catalog.column_placements(pk_column);

        let mut tree: Option<PlanNode> = None;
        for (adapter, group) in &groups {
            // Every replica must be able to reconstruct the primary key
            let mut group = group.clone();
            if !group.iter().any(|p| p.column == pk_column) {
                let borrowed = pk_placements
                    .iter()
                    .find(|p| p.adapter == *adapter)
                    .cloned()
                    .ok_or_else(|| {
                        RouterError::internal(format!(
                            "adapter {} holds columns of table '{}' but no primary key placement",
                            adapter.0, table.name
                        ))
                    })?;
                group.push(borrowed);
            }

            let scan = self.scan_for_group(&group)?;
            match tree {
                None => tree = Some(scan),
                Some(left) => {
                    let adapter_name = self.catalog.adapter(*adapter)?.name;
                    let alias = format!("{}_{}", adapter_name, pk_name);
                    let mut exprs = Vec::with_capacity(group.len());
                    for placement in &group {
                        let name = self.catalog.column(placement.column)?.name;
                        if placement.column == pk_column {
                            exprs.push(Expression::named(&name).aliased(&alias));
                        } else {
                            exprs.push(Expression::named(&name));
                        }
                    }
                    let right = PlanNode::Project {
                        input: Box::new(scan),
                        exprs,
                    };
                    tree = Some(PlanNode::Join {
                        left: Box::new(left),
                        right: Box::new(right),
                        join_type: JoinType::Inner,
                        condition: Expression::eq(
                            Expression::named(&pk_name),
                            Expression::named(&alias),
                        ),
                    });
                }
            }
        }

        let joined = tree.ok_or_else(|| RouterError::internal("empty adapter grouping"))?;
        self.final_projection(joined, placements)
    }

    /// Scan of one adapter's physical table, exposing the group's columns
    fn scan_for_group(&self, group: &[ColumnPlacement]) -> RouterResult<PlanNode> {
        let first = &group[0];
        let mut columns = Vec::with_capacity(group.len());
        for placement in group {
            columns.push(self.catalog.column(placement.column)?.name);
        }
        Ok(PlanNode::PhysicalScan {
            adapter: first.adapter,
            physical_schema: first.physical_schema.clone(),
            physical_table: first.physical_table.clone(),
            columns,
        })
    }

    /// Reorder output columns into the canonical logical column order
    ///
    /// Ordering follows the catalog column position, by name rather than by
    /// ordinal: placements across adapters may expose columns in different
    /// physical order. Duplicate columns (replicated placements) collapse to
    /// one projection each.
    fn final_projection(
        &self,
        input: PlanNode,
        placements: &[ColumnPlacement],
    ) -> RouterResult<PlanNode> {
        let mut ordered: Vec<(usize, String)> = Vec::with_capacity(placements.len());
        for placement in placements {
            let column = self.catalog.column(placement.column)?;
            if !ordered.iter().any(|(_, name)| *name == column.name) {
                ordered.push((column.position, column.name));
            }
        }
        ordered.sort_by_key(|(position, _)| *position);
        let exprs = ordered
            .into_iter()
            .map(|(_, name)| Expression::named(name))
            .collect();
        Ok(PlanNode::Project {
            input: Box::new(input),
            exprs,
        })
    }

    /// Drop every cached subtree; called on DDL affecting placements
    pub fn reset(&self) {
        self.cache.clear();
        if let Ok(mut order) = self.insertion_order.lock() {
            order.clear();
        }
        debug!("joined-scan cache cleared");
    }

    /// (entries, capacity)
    pub fn cache_stats(&self) -> (usize, usize) {
        (self.cache.len(), self.cache_capacity)
    }
}

/// Group placements by adapter, preserving first-seen order so repeated
/// builds over the same set are deterministic
fn group_by_adapter(placements: &[ColumnPlacement]) -> Vec<(AdapterId, Vec<ColumnPlacement>)> {
    let mut groups: Vec<(AdapterId, Vec<ColumnPlacement>)> = Vec::new();
    for placement in placements {
        match groups.iter_mut().find(|(adapter, _)| *adapter == placement.adapter) {
            Some((_, group)) => group.push(placement.clone()),
            None => groups.push((placement.adapter, vec![placement.clone()])),
        }
    }
    groups
}
