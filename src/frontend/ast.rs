//! Abstract syntax tree for the LP language.
//!
//! A program is a list of variable declarations, one objective, and a
//! list of constraints. Declaration order defines the zero-based variable
//! index that every later stage relies on: matrix column order, the
//! free-variable substitution order, and result mapping all follow it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Declared variables, in declaration order
    pub decls: Vec<Decl>,
    /// The objective function
    pub objective: Objective,
    /// Constraints, in source order
    pub constraints: Vec<Constraint>,
}

/// A variable declaration: `let x1;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    /// Declared name
    pub name: String,
    /// Source line
    pub line: usize,
}

/// The objective function: `max expr;` or `min expr;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    /// True for `max`, false for `min`
    pub maximize: bool,
    /// The objective expression
    pub expr: Expr,
}

/// A constraint relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Le => write!(f, "<="),
            Relation::Eq => write!(f, "="),
            Relation::Ge => write!(f, ">="),
        }
    }
}

/// A constraint: `expr <= expr;` (or `=`, `>=`).
///
/// After normalization the right side is always a number literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    /// Left-hand expression
    pub left: Expr,
    /// The relation between the sides
    pub relation: Relation,
    /// Right-hand expression
    pub right: Expr,
    /// Source line of the relation
    pub line: usize,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// The kind of expression
    pub kind: ExprKind,
    /// Source line
    pub line: usize,
}

/// The kind of an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Numeric literal
    Number(f64),
    /// Variable reference
    Variable(String),
    /// Unary `+`/`-`
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// Binary arithmetic
    Binary {
        /// The operator
        op: BinOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
        }
    }
}

impl Expr {
    /// Create a number literal.
    pub fn number(value: f64, line: usize) -> Self {
        Self {
            kind: ExprKind::Number(value),
            line,
        }
    }

    /// Create a variable reference.
    pub fn variable(name: impl Into<String>, line: usize) -> Self {
        Self {
            kind: ExprKind::Variable(name.into()),
            line,
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, operand: Expr, line: usize) -> Self {
        Self {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        }
    }

    /// Create a binary expression.
    pub fn binary(op: BinOp, left: Expr, right: Expr, line: usize) -> Self {
        Self {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        }
    }

    /// Create a `coefficient * variable` product, the canonical term shape.
    pub fn term(coefficient: f64, name: impl Into<String>, line: usize) -> Self {
        Self::binary(
            BinOp::Mul,
            Self::number(coefficient, line),
            Self::variable(name, line),
            line,
        )
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(value) => write!(f, "{}", value),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::Unary { op, operand } => {
                let sign = match op {
                    UnaryOp::Plus => "+",
                    UnaryOp::Minus => "-",
                };
                write!(f, "({}{})", sign, operand)
            }
            ExprKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in &self.decls {
            writeln!(f, "let {};", decl.name)?;
        }
        let verb = if self.objective.maximize { "max" } else { "min" };
        writeln!(f, "{} {};", verb, self.objective.expr)?;
        writeln!(f, "s.t.")?;
        for constraint in &self.constraints {
            writeln!(f, "{} {} {};", constraint.left, constraint.relation, constraint.right)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parenthesizes() {
        let expr = Expr::binary(
            BinOp::Add,
            Expr::term(5.0, "x1", 1),
            Expr::term(5.0, "x2", 1),
            1,
        );
        assert_eq!(expr.to_string(), "((5 * x1) + (5 * x2))");
    }

    #[test]
    fn test_display_unary() {
        let expr = Expr::unary(UnaryOp::Minus, Expr::variable("x1", 1), 1);
        assert_eq!(expr.to_string(), "(-x1)");
    }
}
