//! Compilation of expressions into the store's native filter syntax
//!
//! The output is a format string plus positional arguments:
//! - `%K` takes a key argument (attribute name)
//! - `%@` takes a value argument (one value or a value list)
//!
//! Compound children are parenthesized whenever their operator differs from
//! the parent's. Half-open range comparisons are parenthesized whenever they
//! are nested.

use std::fmt;

use crate::store::StorageValue;

use super::ast::{Comparison, Expression, Operand, Operator};

/// Positional argument of a native filter
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Key(String),
    Value(StorageValue),
    Values(Vec<StorageValue>),
}

impl Argument {
    fn render(&self) -> String {
        match self {
            Argument::Key(name) => name.clone(),
            Argument::Value(value) => value.literal(),
            Argument::Values(values) => {
                let items: Vec<String> = values.iter().map(StorageValue::literal).collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}

/// Compiled filter: format string and its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFilter {
    pub format: String,
    pub arguments: Vec<Argument>,
}

impl NativeFilter {
    /// Substitute the arguments into the format string
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(self.format.len() + 16);
        let mut arguments = self.arguments.iter();
        let mut chars = self.format.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '%' && matches!(chars.peek(), Some('K') | Some('@')) {
                chars.next();
                if let Some(argument) = arguments.next() {
                    output.push_str(&argument.render());
                }
            } else {
                output.push(c);
            }
        }

        output
    }
}

impl fmt::Display for NativeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    InAnd,
    InOr,
    InNot,
}

/// Compile an expression tree
pub fn compile(expression: &Expression) -> NativeFilter {
    let mut filter = NativeFilter {
        format: String::new(),
        arguments: Vec::new(),
    };
    write_expression(expression, Position::Top, &mut filter);
    filter
}

fn write_expression(expression: &Expression, position: Position, out: &mut NativeFilter) {
    match expression {
        Expression::Constant(true) => out.format.push_str("TRUEPREDICATE"),
        Expression::Constant(false) => out.format.push_str("FALSEPREDICATE"),
        Expression::Comparison(comparison) => write_comparison(comparison, position, out),
        Expression::And(children) => {
            write_group(children, Position::InAnd, " AND ", true, position, out)
        }
        Expression::Or(children) => {
            write_group(children, Position::InOr, " OR ", false, position, out)
        }
        Expression::Not(inner) => {
            out.format.push_str("NOT ");
            write_expression(inner, Position::InNot, out);
        }
    }
}

fn write_group(
    children: &[Expression],
    kind: Position,
    separator: &str,
    empty: bool,
    position: Position,
    out: &mut NativeFilter,
) {
    match children {
        [] => write_expression(&Expression::Constant(empty), position, out),
        [only] => write_expression(only, position, out),
        _ => {
            let parenthesize = position != Position::Top && position != kind;
            if parenthesize {
                out.format.push('(');
            }
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.format.push_str(separator);
                }
                write_expression(child, kind, out);
            }
            if parenthesize {
                out.format.push(')');
            }
        }
    }
}

fn write_comparison(comparison: &Comparison, position: Position, out: &mut NativeFilter) {
    let key = || Argument::Key(comparison.attribute.clone());

    match (comparison.operator, &comparison.operand) {
        (Operator::WithinHalfOpen, Operand::Bounds(lower, upper))
        | (Operator::OutsideHalfOpen, Operand::Bounds(lower, upper)) => {
            let within = comparison.operator == Operator::WithinHalfOpen;
            let format = if within {
                "%@ <= %K AND %K < %@"
            } else {
                "%@ > %K OR %K >= %@"
            };
            let parenthesize = position != Position::Top;
            if parenthesize {
                out.format.push('(');
            }
            out.format.push_str(format);
            if parenthesize {
                out.format.push(')');
            }
            out.arguments.push(Argument::Value(lower.clone()));
            out.arguments.push(key());
            out.arguments.push(key());
            out.arguments.push(Argument::Value(upper.clone()));
        }
        (operator, operand) => {
            out.format.push_str("%K ");
            out.format.push_str(operator.token());
            out.format.push_str(" %@");
            out.arguments.push(key());
            out.arguments.push(match operand {
                Operand::Value(value) => Argument::Value(value.clone()),
                Operand::List(values) => Argument::Values(values.clone()),
                Operand::Bounds(lower, upper) => {
                    Argument::Values(vec![lower.clone(), upper.clone()])
                }
            });
        }
    }
}
