/// Relational algebra representation consumed and produced by the router
pub mod expr;
pub mod plan;
pub mod value;

pub use expr::{CallOperator, Expression};
pub use plan::{
    AggregateCall, JoinType, ModifyOperation, PlanNode, PlanRoot, SetOpKind, SortKey,
    StatementKind,
};
pub use value::Value;
