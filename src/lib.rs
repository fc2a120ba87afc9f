//! # Multi-Store Query Router
//!
//! Routes logical relational plans onto the physical placements of a
//! multi-store database: picks adapters for each table, narrows partitioned
//! scans to the partitions a predicate actually touches, synthesizes joins
//! across vertically split tables, and fans writes out to every replica.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use multistore_router::{
//!     AdapterId, AdapterInfo, CatalogTable, ColumnId, InMemoryCatalog, PlanNode, PlanRoot,
//!     QueryRouter, Router, RouterConfig, StatementContext, TableId, TableKind,
//! };
//!
//! let mut catalog = InMemoryCatalog::new();
//! catalog.add_adapter(AdapterInfo {
//!     id: AdapterId(1),
//!     name: "pg".to_string(),
//!     supports_native_modify: true,
//! });
//! let orders = CatalogTable {
//!     id: TableId(1),
//!     name: "orders".to_string(),
//!     column_ids: vec![ColumnId(10), ColumnId(11)],
//!     primary_key: Some(ColumnId(10)),
//!     modifiable: true,
//!     kind: TableKind::Base,
//!     partitioning: None,
//! };
//! catalog.add_table(orders.clone(), vec!["id", "amt"]);
//! catalog.place_table(AdapterId(1), orders.id, "public", "orders");
//!
//! let router = QueryRouter::new(Arc::new(catalog), &RouterConfig::default());
//! let plan = PlanRoot::select(
//!     PlanNode::Scan { table: orders.id },
//!     vec!["id".to_string(), "amt".to_string()],
//! );
//! let routed = router.route(&plan, &StatementContext::new()).unwrap();
//! println!("{}", routed[0].root.root.explain());
//! ```

pub mod algebra;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod routing;

pub use algebra::{
    CallOperator, Expression, JoinType, ModifyOperation, PlanNode, PlanRoot, StatementKind, Value,
};
pub use catalog::{
    AdapterId, AdapterInfo, CatalogColumn, CatalogTable, ColumnId, ColumnPlacement,
    InMemoryCatalog, ListPartition, PartitionId, PartitionScheme, PartitioningDescriptor,
    PlacementCatalog, RangePartition, TableId, TableKind,
};
pub use config::RouterConfig;
pub use context::StatementContext;
pub use error::{RouterError, RouterResult};
pub use routing::{
    DmlRouter, FullReplicationRouter, JoinedScanBuilder, MultiRouter, PlanRewriter, QueryRouter,
    Router, RoutingPlan, SelectedAdapterInfo,
};
