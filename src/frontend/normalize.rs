//! Algebraic normalization of LP expressions.
//!
//! Every expression is reduced to canonical linear form in two phases:
//!
//! 1. **Distribute-fold**: a recursive walk carrying a running
//!    multiplicative accumulator. Constant subtrees fold to literals,
//!    constants met on one side of `*`/`/` scale the accumulator, and a
//!    product or quotient of two non-constant subtrees is rejected as
//!    nonlinear. Variables come out as `coefficient * variable` products;
//!    `+`/`-` nodes are rebuilt as `+` chains with the sign folded into
//!    the right side's coefficients.
//! 2. **Collect-like-terms**: both sides of a statement are walked as
//!    `+`-chains, coefficients accumulate per variable, and the canonical
//!    chain is rebuilt ordered by declared variable index — never by map
//!    iteration order, so output is deterministic. Constraint constants
//!    migrate to the right side; the objective keeps its constant as the
//!    final chain term.
//!
//! Normalization is idempotent: a canonical expression normalizes to an
//! equal canonical expression.

use crate::frontend::ast::*;
use crate::utils::errors::{NormalizeError, NormalizeErrorKind};
use std::collections::HashMap;

/// Normalize every expression of a program in place.
///
/// The objective expression becomes `c0*x0 + ... + constant`; each
/// constraint becomes `c0*x0 + ...  relation  constant`, with terms
/// ordered by declaration index. Variables that were never declared keep
/// deterministic first-appearance order after the declared ones, so the
/// semantic pass can report them.
pub fn normalize_program(program: &mut Program) -> Result<(), NormalizeError> {
    let order: HashMap<&str, usize> = program
        .decls
        .iter()
        .enumerate()
        .map(|(i, d)| (d.name.as_str(), i))
        .collect();

    let folded = distribute_fold(&program.objective.expr, 1.0)?;
    let zero = Expr::number(0.0, folded.line);
    let (expr, _) = collect_like_terms(&folded, &zero, &order, true)?;
    program.objective.expr = expr;

    for constraint in &mut program.constraints {
        let left = distribute_fold(&constraint.left, 1.0)?;
        let right = distribute_fold(&constraint.right, 1.0)?;
        let (new_left, new_right) = collect_like_terms(&left, &right, &order, false)?;
        constraint.left = new_left;
        constraint.right = new_right;
    }

    Ok(())
}

/// Evaluate an expression if it is a compile-time constant.
///
/// Literals are constant, unary `+`/`-` of a constant is constant, and a
/// binary operation on two constants is constant.
pub fn constant_value(expr: &Expr) -> Option<f64> {
    match &expr.kind {
        ExprKind::Number(value) => Some(*value),
        ExprKind::Variable(_) => None,
        ExprKind::Unary { op, operand } => {
            let value = constant_value(operand)?;
            Some(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        ExprKind::Binary { op, left, right } => {
            let left = constant_value(left)?;
            let right = constant_value(right)?;
            Some(apply(*op, left, right))
        }
    }
}

fn apply(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
    }
}

/// Distribute multiplication over sums and fold constant subtrees,
/// carrying the running multiplier (initially `1.0`).
///
/// The result is a `+`-chain whose elements are `coefficient * variable`
/// products and literals; input term order is preserved. A product or
/// quotient of two non-constant sides, and a constant dividend over a
/// non-constant divisor, fail as nonlinear.
pub fn distribute_fold(expr: &Expr, multiplier: f64) -> Result<Expr, NormalizeError> {
    match &expr.kind {
        ExprKind::Binary {
            op: op @ (BinOp::Add | BinOp::Sub),
            left,
            right,
        } => {
            let new_left = distribute_fold(left, multiplier)?;
            let right_sign = if *op == BinOp::Sub { -1.0 } else { 1.0 };
            let new_right = distribute_fold(right, right_sign * multiplier)?;
            Ok(Expr::binary(BinOp::Add, new_left, new_right, expr.line))
        }
        ExprKind::Binary {
            op: op @ (BinOp::Mul | BinOp::Div),
            left,
            right,
        } => match (constant_value(left), constant_value(right)) {
            (Some(lhs), Some(rhs)) => Ok(Expr::number(apply(*op, lhs, rhs) * multiplier, expr.line)),
            (None, Some(rhs)) => distribute_fold(left, apply(*op, multiplier, rhs)),
            (Some(lhs), None) => {
                if *op == BinOp::Mul {
                    distribute_fold(right, lhs * multiplier)
                } else {
                    Err(nonlinear(expr, "quotient with non-constant divisor"))
                }
            }
            (None, None) => Err(nonlinear(expr, "both sides non-constant")),
        },
        ExprKind::Unary { op, operand } => {
            let multiplier = match op {
                UnaryOp::Plus => multiplier,
                UnaryOp::Minus => -multiplier,
            };
            distribute_fold(operand, multiplier)
        }
        ExprKind::Variable(name) => Ok(Expr::term(multiplier, name.clone(), expr.line)),
        ExprKind::Number(value) => Ok(Expr::number(value * multiplier, expr.line)),
    }
}

/// Coefficient table accumulated by [`collect_like_terms`].
#[derive(Default)]
struct TermTable {
    coefficients: HashMap<String, f64>,
    first_seen: Vec<String>,
    constant: f64,
}

impl TermTable {
    fn add_variable(&mut self, name: &str, coefficient: f64) {
        if !self.coefficients.contains_key(name) {
            self.first_seen.push(name.to_string());
        }
        *self.coefficients.entry(name.to_string()).or_insert(0.0) += coefficient;
    }
}

/// Collect like terms across the two sides of a statement.
///
/// Left-side contributions count positive, right-side negative; the
/// returned pair is the canonical left chain and the right-side constant
/// literal. For the objective the right side is a dummy zero and the net
/// constant is kept as the final chain term instead.
fn collect_like_terms(
    left: &Expr,
    right: &Expr,
    order: &HashMap<&str, usize>,
    is_objective: bool,
) -> Result<(Expr, Expr), NormalizeError> {
    let mut table = TermTable::default();
    collect_into(left, 1.0, &mut table)?;
    collect_into(right, -1.0, &mut table)?;

    // Declared variables first, by index; undeclared ones keep
    // first-appearance order so later stages see a stable shape.
    let mut names: Vec<&String> = table.first_seen.iter().collect();
    names.sort_by_key(|name| {
        order
            .get(name.as_str())
            .copied()
            .map(|index| (0, index))
            .unwrap_or_else(|| {
                let seen = table.first_seen.iter().position(|n| n == *name).unwrap_or(0);
                (1, seen)
            })
    });

    let line = left.line;
    let mut chain: Option<Expr> = None;
    for name in names {
        let term = Expr::term(table.coefficients[name], name.clone(), line);
        chain = Some(match chain {
            Some(acc) => Expr::binary(BinOp::Add, acc, term, line),
            None => term,
        });
    }

    if is_objective {
        let constant = Expr::number(table.constant, line);
        let expr = match chain {
            Some(acc) => Expr::binary(BinOp::Add, acc, constant, line),
            None => constant,
        };
        Ok((expr, Expr::number(0.0, line)))
    } else {
        let new_left = chain.unwrap_or_else(|| Expr::number(0.0, line));
        let new_right = Expr::number(-table.constant, right.line);
        Ok((new_left, new_right))
    }
}

/// Walk a distribute-fold output chain, accumulating terms.
fn collect_into(expr: &Expr, sign: f64, table: &mut TermTable) -> Result<(), NormalizeError> {
    match &expr.kind {
        ExprKind::Number(value) => {
            table.constant += sign * value;
            Ok(())
        }
        ExprKind::Variable(name) => {
            table.add_variable(name, sign);
            Ok(())
        }
        ExprKind::Unary { op, operand } => {
            let sign = match op {
                UnaryOp::Plus => sign,
                UnaryOp::Minus => -sign,
            };
            collect_into(operand, sign, table)
        }
        ExprKind::Binary { op: BinOp::Add, left, right } => {
            collect_into(left, sign, table)?;
            collect_into(right, sign, table)
        }
        ExprKind::Binary { op: BinOp::Sub, left, right } => {
            collect_into(left, sign, table)?;
            collect_into(right, -sign, table)
        }
        ExprKind::Binary { op: BinOp::Mul, left, right } => {
            match (&left.kind, &right.kind) {
                (ExprKind::Number(coefficient), ExprKind::Variable(name)) => {
                    table.add_variable(name, sign * coefficient);
                    Ok(())
                }
                _ => match constant_value(expr) {
                    Some(value) => {
                        table.constant += sign * value;
                        Ok(())
                    }
                    None => Err(nonlinear(expr, "term is not coefficient * variable")),
                },
            }
        }
        ExprKind::Binary { op: BinOp::Div, .. } => match constant_value(expr) {
            Some(value) => {
                table.constant += sign * value;
                Ok(())
            }
            None => Err(nonlinear(expr, "term is not coefficient * variable")),
        },
    }
}

fn nonlinear(expr: &Expr, detail: &str) -> NormalizeError {
    NormalizeError {
        message: format!("nonlinear expression ({}): {}", detail, expr),
        line: expr.line,
        kind: NormalizeErrorKind::Nonlinear,
    }
}
