//! Predicate expression tree
//!
//! Expressions reference attributes by storage name and hold operands as
//! storage values, so the tree is independent of the typed layer that built
//! it.

use crate::store::StorageValue;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    /// Membership in a list of values
    In,
    /// Closed range, both bounds included
    Between,
    /// `lower <= value < upper`
    WithinHalfOpen,
    /// `value < lower || value >= upper`
    OutsideHalfOpen,
    BeginsWith,
    EndsWith,
    Contains,
    /// Whole-string regular expression match
    Matches,
}

impl Operator {
    /// Native operator token, for operators with a single token
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::WithinHalfOpen => "<=",
            Operator::OutsideHalfOpen => ">",
            Operator::BeginsWith => "BEGINSWITH",
            Operator::EndsWith => "ENDSWITH",
            Operator::Contains => "CONTAINS",
            Operator::Matches => "MATCHES",
        }
    }

    /// Half-open range operators compile to a compound of two comparisons
    pub fn is_half_open(&self) -> bool {
        matches!(self, Operator::WithinHalfOpen | Operator::OutsideHalfOpen)
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(StorageValue),
    List(Vec<StorageValue>),
    Bounds(StorageValue, StorageValue),
}

/// One attribute compared against an operand
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Storage attribute name
    pub attribute: String,
    pub operator: Operator,
    pub operand: Operand,
}

/// Predicate expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison(Comparison),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    /// Always true or always false
    Constant(bool),
}

impl Expression {
    pub fn comparison(attribute: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Expression::Comparison(Comparison {
            attribute: attribute.into(),
            operator,
            operand,
        })
    }

    /// Conjunction. Chains of `and` stay flat.
    pub fn and(self, other: Expression) -> Expression {
        match (self, other) {
            (Expression::And(mut lhs), Expression::And(rhs)) => {
                lhs.extend(rhs);
                Expression::And(lhs)
            }
            (Expression::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Expression::And(lhs)
            }
            (lhs, Expression::And(mut rhs)) => {
                rhs.insert(0, lhs);
                Expression::And(rhs)
            }
            (lhs, rhs) => Expression::And(vec![lhs, rhs]),
        }
    }

    /// Disjunction. Chains of `or` stay flat.
    pub fn or(self, other: Expression) -> Expression {
        match (self, other) {
            (Expression::Or(mut lhs), Expression::Or(rhs)) => {
                lhs.extend(rhs);
                Expression::Or(lhs)
            }
            (Expression::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Expression::Or(lhs)
            }
            (lhs, Expression::Or(mut rhs)) => {
                rhs.insert(0, lhs);
                Expression::Or(rhs)
            }
            (lhs, rhs) => Expression::Or(vec![lhs, rhs]),
        }
    }

    pub fn negate(self) -> Expression {
        Expression::Not(Box::new(self))
    }
}
