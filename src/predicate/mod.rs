//! Predicate expressions
//!
//! Typed predicates are built from attribute selectors, combined with
//! `and` / `or` / `not`, and compiled to the store's native filter syntax.

mod ast;
mod compile;
mod typed;

pub use ast::{Comparison, Expression, Operand, Operator};
pub use compile::{compile, Argument, NativeFilter};
pub use typed::{Membership, MembershipOperand, Pattern, Predicate};
