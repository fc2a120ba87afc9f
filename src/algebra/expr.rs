/// Scalar expression trees attached to filter, project, and join nodes
/// The router only inspects these; it never evaluates them.
use serde::{Deserialize, Serialize};

use crate::algebra::value::Value;

/// Scalar expression representation
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Reference to a column by its zero-based ordinal in the input row
    ColumnRef(usize),
    /// Reference to a column by name (used for synthesized join conditions
    /// and projections, where ordinals across adapters are not stable)
    Column(String),
    /// Literal value
    Literal(Value),
    /// Bound runtime parameter, resolved against the statement context
    Parameter(usize),
    /// Operator call with its operand list
    Call {
        op: CallOperator,
        operands: Vec<Expression>,
    },
    /// Expression with an output alias
    Alias {
        expr: Box<Expression>,
        alias: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    Like,
    Plus,
    Minus,
    Multiply,
    Divide,
    IsNull,
    IsNotNull,
}

impl CallOperator {
    /// True for comparators that pin a column to exactly one value
    pub fn is_equality(&self) -> bool {
        matches!(self, CallOperator::Equals)
    }

    /// True for any binary comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            CallOperator::Equals
                | CallOperator::NotEquals
                | CallOperator::LessThan
                | CallOperator::LessThanOrEqual
                | CallOperator::GreaterThan
                | CallOperator::GreaterThanOrEqual
                | CallOperator::Like
        )
    }
}

impl Expression {
    /// Column reference by ordinal
    pub fn col(index: usize) -> Self {
        Expression::ColumnRef(index)
    }

    /// Column reference by name
    pub fn named(name: impl Into<String>) -> Self {
        Expression::Column(name.into())
    }

    /// Literal value expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    /// Bound parameter expression
    pub fn parameter(index: usize) -> Self {
        Expression::Parameter(index)
    }

    /// Binary call: `left op right`
    pub fn binary(op: CallOperator, left: Expression, right: Expression) -> Self {
        Expression::Call {
            op,
            operands: vec![left, right],
        }
    }

    /// Equality comparison
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary(CallOperator::Equals, left, right)
    }

    /// Conjunction of two expressions
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary(CallOperator::And, left, right)
    }

    /// Disjunction of two expressions
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary(CallOperator::Or, left, right)
    }

    /// Wrap with an output alias
    pub fn aliased(self, alias: impl Into<String>) -> Self {
        Expression::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// True if this expression is a bare column reference (by ordinal or name)
    pub fn is_column_ref(&self) -> bool {
        matches!(self, Expression::ColumnRef(_) | Expression::Column(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_builder_shape() {
        let e = Expression::eq(Expression::col(2), Expression::literal(Value::Int64(150)));
        match e {
            Expression::Call { op, operands } => {
                assert_eq!(op, CallOperator::Equals);
                assert_eq!(operands.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_equality_classification() {
        assert!(CallOperator::Equals.is_equality());
        assert!(!CallOperator::NotEquals.is_equality());
        assert!(CallOperator::NotEquals.is_comparison());
        assert!(!CallOperator::And.is_comparison());
    }
}
