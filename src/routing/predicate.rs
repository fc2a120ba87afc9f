/// Partition-value extraction from filter predicates
///
/// Walks a predicate tree looking for comparisons that pin the partition
/// column to concrete values. The result decides between identified-partition
/// routing and the worst-case fallback; failing to identify a value is never
/// an error, only a (safe) pessimization.
use tracing::debug;

use crate::algebra::{Expression, Value};
use crate::context::StatementContext;

/// Outcome of scanning a predicate for partition-column values
///
/// More than one value signals an OR/IN-like condition; all named partitions
/// must then be routed to.
#[derive(Clone, Debug, Default)]
pub struct ExtractedValues {
    /// Values the partition column is compared against, in encounter order
    pub values: Vec<Value>,
    /// True if at least one usable value was found and nothing forced the
    /// worst case
    pub identified: bool,
}

impl ExtractedValues {
    /// True if routing can narrow to the extracted values
    pub fn usable(&self) -> bool {
        self.identified && !self.values.is_empty()
    }
}

/// Resolve a scalar expression to a concrete value, if it is a literal or a
/// parameter bound in the statement context
pub fn resolve_value(expr: &Expression, ctx: &StatementContext) -> Option<Value> {
    match expr {
        Expression::Literal(value) => Some(value.clone()),
        Expression::Parameter(index) => ctx.parameter_value(*index).cloned(),
        Expression::Alias { expr, .. } => resolve_value(expr, ctx),
        _ => None,
    }
}

/// Scan a filter condition for values compared against the partition column
///
/// `partition_column_index` is the zero-based ordinal of the partition column
/// within the scanned row. In the default (strict) mode only equality
/// comparisons count, and any other comparison touching the partition column
/// forces "not identified". In permissive mode every two-operand call that
/// references the column records its opposite operand, matching the
/// historical behavior.
pub fn extract_partition_values(
    condition: &Expression,
    partition_column_index: usize,
    ctx: &StatementContext,
    permissive: bool,
) -> ExtractedValues {
    let mut extraction = ExtractedValues::default();
    let mut forced_worst_case = false;
    visit(
        condition,
        partition_column_index,
        ctx,
        permissive,
        &mut extraction,
        &mut forced_worst_case,
    );
    if forced_worst_case && !permissive {
        debug!(
            partition_column_index,
            "non-equality comparison on partition column, falling back to worst case"
        );
        extraction.identified = false;
    }
    extraction
}

fn visit(
    expr: &Expression,
    partition_column_index: usize,
    ctx: &StatementContext,
    permissive: bool,
    extraction: &mut ExtractedValues,
    forced_worst_case: &mut bool,
) {
    let Expression::Call { op, operands } = expr else {
        return;
    };
    for operand in operands {
        visit(
            operand,
            partition_column_index,
            ctx,
            permissive,
            extraction,
            forced_worst_case,
        );
    }
    if operands.len() != 2 {
        return;
    }

    let references_column =
        |e: &Expression| matches!(e, Expression::ColumnRef(i) if *i == partition_column_index);

    let other = if references_column(&operands[0]) {
        &operands[1]
    } else if references_column(&operands[1]) {
        &operands[0]
    } else {
        return;
    };

    if !permissive && !op.is_equality() {
        // A range/inequality comparison cannot pin the column to one value
        *forced_worst_case = true;
        return;
    }

    match resolve_value(other, ctx) {
        Some(value) => {
            debug!(%value, "identified partition-column value");
            extraction.values.push(value);
            extraction.identified = true;
        }
        None => {
            // Compared against something we cannot resolve at routing time
            if !permissive {
                *forced_worst_case = true;
            }
        }
    }
}
