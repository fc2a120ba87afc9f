/// Relational plan tree - the algebra the router rewrites
///
/// Logical plans reference tables by catalog id; routing replaces every
/// `Scan` with a `PhysicalScan` (or a join of them) and every `Modify`
/// with one `PhysicalModify` per target adapter.
use crate::algebra::expr::Expression;
use crate::algebra::value::Value;
use crate::catalog::{AdapterId, TableId};
use crate::error::{RouterError, RouterResult};

/// Plan operator - a single node in the (logical or physical) plan tree
#[derive(Clone, Debug, PartialEq)]
pub enum PlanNode {
    /// Scan of a logical table (routing input only)
    Scan { table: TableId },

    /// Scan of a concrete physical table on one adapter (routing output)
    /// `columns` are the logical column names in the order the adapter
    /// exposes them
    PhysicalScan {
        adapter: AdapterId,
        physical_schema: String,
        physical_table: String,
        columns: Vec<String>,
    },

    /// Literal row source; passes through routing untouched
    Values {
        fields: Vec<String>,
        rows: Vec<Vec<Value>>,
    },

    /// Filter rows by a predicate
    Filter {
        input: Box<PlanNode>,
        condition: Expression,
    },

    /// Project columns / evaluate expressions
    Project {
        input: Box<PlanNode>,
        exprs: Vec<Expression>,
    },

    /// Join two relations
    Join {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        join_type: JoinType,
        condition: Expression,
    },

    /// Aggregate rows
    Aggregate {
        input: Box<PlanNode>,
        group_by: Vec<usize>,
        aggregates: Vec<AggregateCall>,
    },

    /// Sort rows
    Sort {
        input: Box<PlanNode>,
        keys: Vec<SortKey>,
    },

    /// Limit/offset rows
    Limit {
        input: Box<PlanNode>,
        limit: Option<usize>,
        offset: usize,
    },

    /// Set operation (UNION, INTERSECT, EXCEPT)
    SetOp {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        kind: SetOpKind,
        all: bool,
    },

    /// Modification of a logical table (routing input only)
    Modify {
        table: TableId,
        input: Box<PlanNode>,
        operation: ModifyOperation,
        update_columns: Vec<String>,
        source_expressions: Vec<Expression>,
    },

    /// Modification of a concrete physical table on one adapter
    /// `native` marks adapters that provide their own modify operator
    PhysicalModify {
        adapter: AdapterId,
        physical_schema: String,
        physical_table: String,
        input: Box<PlanNode>,
        operation: ModifyOperation,
        update_columns: Vec<String>,
        source_expressions: Vec<Expression>,
        native: bool,
    },

    /// Unions the row-effects of two physical modifies into one result
    ModifyCollect {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModifyOperation {
    Insert,
    Update,
    Delete,
}

impl ModifyOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifyOperation::Insert => "INSERT",
            ModifyOperation::Update => "UPDATE",
            ModifyOperation::Delete => "DELETE",
        }
    }
}

/// Aggregate function call
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateCall {
    pub function: String,
    pub argument: Option<Expression>,
    pub alias: String,
}

/// Sort key: column ordinal plus direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub index: usize,
    pub descending: bool,
}

impl PlanNode {
    /// Child nodes in fixed order (empty for leaves)
    pub fn children(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Scan { .. } | PlanNode::PhysicalScan { .. } | PlanNode::Values { .. } => {
                Vec::new()
            }
            PlanNode::Filter { input, .. }
            | PlanNode::Project { input, .. }
            | PlanNode::Aggregate { input, .. }
            | PlanNode::Sort { input, .. }
            | PlanNode::Limit { input, .. }
            | PlanNode::Modify { input, .. }
            | PlanNode::PhysicalModify { input, .. } => vec![input],
            PlanNode::Join { left, right, .. }
            | PlanNode::SetOp { left, right, .. }
            | PlanNode::ModifyCollect { left, right } => vec![left, right],
        }
    }

    /// Structure-preserving copy over new children
    ///
    /// The operator itself is never adapter-specific, so the generic rebuild
    /// used by the rewriter only needs this one operation. Fails on arity
    /// mismatch, which indicates a rewriter bug.
    pub fn with_children(&self, mut children: Vec<PlanNode>) -> RouterResult<PlanNode> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(RouterError::internal(format!(
                "rebuild arity mismatch: operator expects {} inputs, got {}",
                expected,
                children.len()
            )));
        }
        let mut take = || children.remove(0);
        Ok(match self {
            PlanNode::Scan { .. } | PlanNode::PhysicalScan { .. } | PlanNode::Values { .. } => {
                self.clone()
            }
            PlanNode::Filter { condition, .. } => PlanNode::Filter {
                input: Box::new(take()),
                condition: condition.clone(),
            },
            PlanNode::Project { exprs, .. } => PlanNode::Project {
                input: Box::new(take()),
                exprs: exprs.clone(),
            },
            PlanNode::Aggregate {
                group_by,
                aggregates,
                ..
            } => PlanNode::Aggregate {
                input: Box::new(take()),
                group_by: group_by.clone(),
                aggregates: aggregates.clone(),
            },
            PlanNode::Sort { keys, .. } => PlanNode::Sort {
                input: Box::new(take()),
                keys: keys.clone(),
            },
            PlanNode::Limit { limit, offset, .. } => PlanNode::Limit {
                input: Box::new(take()),
                limit: *limit,
                offset: *offset,
            },
            PlanNode::Modify {
                table,
                operation,
                update_columns,
                source_expressions,
                ..
            } => PlanNode::Modify {
                table: *table,
                input: Box::new(take()),
                operation: *operation,
                update_columns: update_columns.clone(),
                source_expressions: source_expressions.clone(),
            },
            PlanNode::PhysicalModify {
                adapter,
                physical_schema,
                physical_table,
                operation,
                update_columns,
                source_expressions,
                native,
                ..
            } => PlanNode::PhysicalModify {
                adapter: *adapter,
                physical_schema: physical_schema.clone(),
                physical_table: physical_table.clone(),
                input: Box::new(take()),
                operation: *operation,
                update_columns: update_columns.clone(),
                source_expressions: source_expressions.clone(),
                native: *native,
            },
            PlanNode::Join {
                join_type,
                condition,
                ..
            } => {
                let left = take();
                let right = take();
                PlanNode::Join {
                    left: Box::new(left),
                    right: Box::new(right),
                    join_type: *join_type,
                    condition: condition.clone(),
                }
            }
            PlanNode::SetOp { kind, all, .. } => {
                let left = take();
                let right = take();
                PlanNode::SetOp {
                    left: Box::new(left),
                    right: Box::new(right),
                    kind: *kind,
                    all: *all,
                }
            }
            PlanNode::ModifyCollect { .. } => {
                let left = take();
                let right = take();
                PlanNode::ModifyCollect {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        })
    }

    /// The logical table a scan node references, if this is a logical scan
    pub fn scanned_table(&self) -> Option<TableId> {
        match self {
            PlanNode::Scan { table } => Some(*table),
            _ => None,
        }
    }

    /// Collect the ids of all logical tables scanned anywhere in the tree
    pub fn referenced_tables(&self) -> Vec<TableId> {
        let mut out = Vec::new();
        self.collect_tables(&mut out);
        out
    }

    fn collect_tables(&self, out: &mut Vec<TableId>) {
        if let PlanNode::Scan { table } = self {
            if !out.contains(table) {
                out.push(*table);
            }
        }
        for child in self.children() {
            child.collect_tables(out);
        }
    }

    /// Indented single-string rendering, for logs and test assertions
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(0, &mut out);
        out
    }

    fn explain_into(&self, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let line = match self {
            PlanNode::Scan { table } => format!("Scan(table={})", table.0),
            PlanNode::PhysicalScan {
                adapter,
                physical_schema,
                physical_table,
                columns,
            } => format!(
                "PhysicalScan(adapter={}, table={}.{}, columns=[{}])",
                adapter.0,
                physical_schema,
                physical_table,
                columns.join(", ")
            ),
            PlanNode::Values { rows, .. } => format!("Values(rows={})", rows.len()),
            PlanNode::Filter { .. } => "Filter".to_string(),
            PlanNode::Project { exprs, .. } => format!("Project(exprs={})", exprs.len()),
            PlanNode::Join { join_type, .. } => format!("Join({:?})", join_type),
            PlanNode::Aggregate { .. } => "Aggregate".to_string(),
            PlanNode::Sort { .. } => "Sort".to_string(),
            PlanNode::Limit { .. } => "Limit".to_string(),
            PlanNode::SetOp { kind, .. } => format!("SetOp({:?})", kind),
            PlanNode::Modify { table, operation, .. } => {
                format!("Modify({}, table={})", operation.as_str(), table.0)
            }
            PlanNode::PhysicalModify {
                adapter,
                physical_table,
                operation,
                native,
                ..
            } => format!(
                "PhysicalModify({}, adapter={}, table={}, native={})",
                operation.as_str(),
                adapter.0,
                physical_table,
                native
            ),
            PlanNode::ModifyCollect { .. } => "ModifyCollect".to_string(),
        };
        out.push_str(&line);
        out.push('\n');
        for child in self.children() {
            child.explain_into(depth + 1, out);
        }
    }
}

/// Statement kind, preserved through routing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Root of a plan plus the declared output metadata
///
/// Routing never changes query semantics or shape, so the field names and
/// statement kind carry over from logical to physical root unchanged.
#[derive(Clone, Debug)]
pub struct PlanRoot {
    pub root: PlanNode,
    pub kind: StatementKind,
    pub fields: Vec<String>,
}

impl PlanRoot {
    pub fn new(root: PlanNode, kind: StatementKind, fields: Vec<String>) -> Self {
        Self { root, kind, fields }
    }

    /// Select root with output field names
    pub fn select(root: PlanNode, fields: Vec<String>) -> Self {
        Self::new(root, StatementKind::Select, fields)
    }

    /// DML root; kind derived from the modify operation
    pub fn dml(root: PlanNode) -> RouterResult<Self> {
        let kind = match &root {
            PlanNode::Modify { operation, .. } => match operation {
                ModifyOperation::Insert => StatementKind::Insert,
                ModifyOperation::Update => StatementKind::Update,
                ModifyOperation::Delete => StatementKind::Delete,
            },
            _ => {
                return Err(RouterError::internal(
                    "dml plan root must be a modify operator",
                ))
            }
        };
        Ok(Self::new(root, kind, vec!["ROWCOUNT".to_string()]))
    }

    /// True if this plan is a data modification
    pub fn is_dml(&self) -> bool {
        !matches!(self.kind, StatementKind::Select)
    }
}
