/// Routing strategies: logical plans in, executable physical plans out
///
/// A router returns one or more candidate physical plans for the same logical
/// statement; callers pick one (typically by cost or randomly) and execute it.
/// The default router produces exactly one plan. The full-replication router
/// produces one plan per adapter that holds a complete copy of every touched
/// table, which is what plan-selection layers feed on.
pub mod dml;
pub mod partition;
pub mod placement;
pub mod predicate;
pub mod rewriter;
pub mod scan_builder;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::algebra::PlanRoot;
use crate::catalog::{PlacementCatalog, TableId};
use crate::config::RouterConfig;
use crate::context::StatementContext;
use crate::error::{RouterError, RouterResult};

pub use dml::DmlRouter;
pub use rewriter::{PlanRewriter, SelectedAdapterInfo};
pub use scan_builder::JoinedScanBuilder;

/// One candidate physical plan plus the adapter choices behind it
#[derive(Clone, Debug)]
pub struct RoutingPlan {
    pub root: PlanRoot,
    pub selected: HashMap<TableId, SelectedAdapterInfo>,
}

/// A routing strategy
///
/// Implementations must be safe to share across concurrent statements; all
/// per-statement state lives in the `StatementContext`.
pub trait Router: Send + Sync {
    /// Produce candidate physical plans for a logical statement
    fn route(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<Vec<RoutingPlan>>;

    /// Drop cached physical subtrees, e.g. after a placement change
    fn reset_caches(&self);
}

/// Default single-plan router
///
/// Reads go to the placements covering the most columns per table, writes fan
/// out to every primary-key-bearing adapter.
pub struct QueryRouter {
    catalog: Arc<dyn PlacementCatalog>,
    scans: JoinedScanBuilder,
    permissive_extraction: bool,
}

impl QueryRouter {
    pub fn new(catalog: Arc<dyn PlacementCatalog>, config: &RouterConfig) -> Self {
        let scans = JoinedScanBuilder::new(catalog.clone(), config);
        Self {
            catalog,
            scans,
            permissive_extraction: config.permissive_value_extraction,
        }
    }

    fn route_one(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<RoutingPlan> {
        if plan.is_dml() {
            let dml = DmlRouter::new(
                self.catalog.as_ref(),
                &self.scans,
                ctx,
                self.permissive_extraction,
            );
            let (root, selected) = dml.route(&plan.root)?;
            return Ok(RoutingPlan {
                root: PlanRoot::new(root, plan.kind, plan.fields.clone()),
                selected,
            });
        }
        let mut rewriter = PlanRewriter::new(
            self.catalog.as_ref(),
            &self.scans,
            ctx,
            self.permissive_extraction,
        );
        let root = rewriter.rewrite(&plan.root)?;
        Ok(RoutingPlan {
            root: PlanRoot::new(root, plan.kind, plan.fields.clone()),
            selected: rewriter.selected,
        })
    }
}

impl Router for QueryRouter {
    fn route(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<Vec<RoutingPlan>> {
        Ok(vec![self.route_one(plan, ctx)?])
    }

    fn reset_caches(&self) {
        self.scans.reset();
    }
}

/// One plan per adapter holding a full copy of every referenced table
///
/// Only applies to reads over unpartitioned, fully replicated tables; DML and
/// partitioned reads degrade to the default single plan, since pinning those
/// to one adapter would silently drop replicas or partitions.
pub struct FullReplicationRouter {
    catalog: Arc<dyn PlacementCatalog>,
    scans: JoinedScanBuilder,
    permissive_extraction: bool,
}

impl FullReplicationRouter {
    pub fn new(catalog: Arc<dyn PlacementCatalog>, config: &RouterConfig) -> Self {
        let scans = JoinedScanBuilder::new(catalog.clone(), config);
        Self {
            catalog,
            scans,
            permissive_extraction: config.permissive_value_extraction,
        }
    }

    fn default_plan(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<RoutingPlan> {
        let mut rewriter = PlanRewriter::new(
            self.catalog.as_ref(),
            &self.scans,
            ctx,
            self.permissive_extraction,
        );
        let root = rewriter.rewrite(&plan.root)?;
        Ok(RoutingPlan {
            root: PlanRoot::new(root, plan.kind, plan.fields.clone()),
            selected: rewriter.selected,
        })
    }

    /// Adapters fully covering every referenced table, or None if the plan is
    /// not eligible for pinned routing
    fn candidate_adapters(
        &self,
        plan: &PlanRoot,
    ) -> RouterResult<Option<Vec<crate::catalog::AdapterId>>> {
        let tables = plan.root.referenced_tables();
        if tables.is_empty() {
            return Ok(None);
        }
        let mut candidates: Option<Vec<crate::catalog::AdapterId>> = None;
        for table_id in tables {
            let table = self.catalog.table(table_id)?;
            if table.is_partitioned() {
                return Ok(None);
            }
            let covering = placement::full_placement_adapters(self.catalog.as_ref(), &table);
            candidates = Some(match candidates {
                None => covering,
                Some(existing) => existing
                    .into_iter()
                    .filter(|a| covering.contains(a))
                    .collect(),
            });
        }
        Ok(candidates)
    }
}

impl Router for FullReplicationRouter {
    fn route(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<Vec<RoutingPlan>> {
        if plan.is_dml() {
            let dml = DmlRouter::new(
                self.catalog.as_ref(),
                &self.scans,
                ctx,
                self.permissive_extraction,
            );
            let (root, selected) = dml.route(&plan.root)?;
            return Ok(vec![RoutingPlan {
                root: PlanRoot::new(root, plan.kind, plan.fields.clone()),
                selected,
            }]);
        }
        let candidates = match self.candidate_adapters(plan)? {
            Some(adapters) if !adapters.is_empty() => adapters,
            _ => {
                debug!("no adapter fully covers the statement, using default routing");
                return Ok(vec![self.default_plan(plan, ctx)?]);
            }
        };

        let mut plans = Vec::with_capacity(candidates.len());
        for adapter in candidates {
            let mut rewriter = PlanRewriter::new(
                self.catalog.as_ref(),
                &self.scans,
                ctx,
                self.permissive_extraction,
            )
            .pinned_to(adapter);
            let root = rewriter.rewrite(&plan.root)?;
            plans.push(RoutingPlan {
                root: PlanRoot::new(root, plan.kind, plan.fields.clone()),
                selected: rewriter.selected,
            });
        }
        Ok(plans)
    }

    fn reset_caches(&self) {
        self.scans.reset();
    }
}

/// Union of several strategies
///
/// A failing member is skipped with a warning; the statement fails only when
/// no member produced a plan.
pub struct MultiRouter {
    routers: Vec<Box<dyn Router>>,
}

impl MultiRouter {
    pub fn new(routers: Vec<Box<dyn Router>>) -> Self {
        Self { routers }
    }
}

impl Router for MultiRouter {
    fn route(&self, plan: &PlanRoot, ctx: &StatementContext) -> RouterResult<Vec<RoutingPlan>> {
        let mut plans = Vec::new();
        for router in &self.routers {
            match router.route(plan, ctx) {
                Ok(mut routed) => plans.append(&mut routed),
                Err(error) => warn!(%error, "routing strategy failed, skipping"),
            }
        }
        if plans.is_empty() {
            return Err(RouterError::no_placement(
                "no routing strategy produced an executable plan",
            ));
        }
        Ok(plans)
    }

    fn reset_caches(&self) {
        for router in &self.routers {
            router.reset_caches();
        }
    }
}
