//! Standard-form conversion.
//!
//! Turns a checked canonical program into the flat numeric arrays a
//! simplex solver consumes: a maximization objective row, the constraint
//! coefficient matrix with free-variable splitting and slack columns, and
//! the right-hand-side vector, plus the wire serialization of all of it.
//!
//! Every declared variable `x` is represented as a nonnegative pair
//! `x⁺ - x⁻`, so each variable column doubles into a coefficient followed
//! by its negation. Each `<=` constraint gets a `+1` slack column and each
//! `>=` a `-1` surplus column; `=` rows keep a zero run across the whole
//! slack block. Slack columns sit after all variable columns, one per
//! slacked constraint, in constraint order.

pub mod result;

use crate::frontend::ast::*;
use crate::frontend::semantic::SymbolTable;
use crate::utils::errors::{ConversionError, ConversionErrorKind};
use log::debug;
use std::fmt::Write as _;

/// Sign of a constraint's slack column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackSign {
    /// `+1`: slack variable added for `<=`
    Plus,
    /// `-1`: surplus variable subtracted for `>=`
    Minus,
    /// No slack column for `=`
    None,
}

impl SlackSign {
    fn coefficient(self) -> f64 {
        match self {
            SlackSign::Plus => 1.0,
            SlackSign::Minus => -1.0,
            SlackSign::None => 0.0,
        }
    }
}

/// A program converted to solver-ready arrays.
///
/// `objective`, `constraints` and `rhs` are in original variable space
/// (one column per declared variable, in declaration index order); the
/// split and slack columns only materialize during serialization.
#[derive(Debug, Clone)]
pub struct StandardForm {
    /// Objective coefficients, by variable index
    pub objective: Vec<f64>,
    /// Objective constant
    pub objective_const: f64,
    /// Constraint rows, by variable index
    pub constraints: Vec<Vec<f64>>,
    /// Right-hand sides, in constraint order
    pub rhs: Vec<f64>,
    /// Per-constraint slack sign
    pub slack: Vec<SlackSign>,
    /// Number of slack columns reserved
    pub num_slack: usize,
    /// Which variables were split into nonnegative pairs
    pub split: Vec<bool>,
}

impl StandardForm {
    /// Convert a normalized, checked program.
    ///
    /// A `min` objective is negated so the solver always sees a
    /// maximization problem; the caller reports results unchanged.
    pub fn build(program: &Program, table: &SymbolTable) -> Result<Self, ConversionError> {
        let (mut objective_const, mut objective) =
            expr_to_row(&program.objective.expr, table, true)?;
        if !program.objective.maximize {
            for coefficient in &mut objective {
                *coefficient *= -1.0;
            }
            objective_const *= -1.0;
        }

        let mut constraints = Vec::with_capacity(program.constraints.len());
        let mut rhs = Vec::with_capacity(program.constraints.len());
        let mut slack = Vec::with_capacity(program.constraints.len());
        let mut num_slack = 0;
        for constraint in &program.constraints {
            let (_, row) = expr_to_row(&constraint.left, table, false)?;
            constraints.push(row);

            match constraint.right.kind {
                ExprKind::Number(value) => rhs.push(value),
                _ => {
                    return Err(ConversionError {
                        message: format!(
                            "constraint right-hand side is not a literal: {}",
                            constraint.right
                        ),
                        kind: ConversionErrorKind::MalformedTerm,
                    })
                }
            }

            let sign = match constraint.relation {
                Relation::Le => SlackSign::Plus,
                Relation::Ge => SlackSign::Minus,
                Relation::Eq => SlackSign::None,
            };
            if sign != SlackSign::None {
                num_slack += 1;
            }
            slack.push(sign);
        }

        // Every variable is free until proven otherwise, and nothing
        // proves otherwise here: sign inference is out of scope, so all
        // variables are split unconditionally.
        let split = vec![true; table.len()];

        Ok(Self {
            objective,
            objective_const,
            constraints,
            rhs,
            slack,
            num_slack,
            split,
        })
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.constraints.len()
    }

    /// Number of solver columns: split variables plus the slack block.
    pub fn num_cols(&self) -> usize {
        self.split_width() + self.num_slack
    }

    /// Width of the variable block after splitting.
    pub fn split_width(&self) -> usize {
        self.split.iter().map(|&s| if s { 2 } else { 1 }).sum()
    }

    /// Serialize to the solver wire format.
    ///
    /// ```text
    /// rows cols   A (rows × cols)
    /// rows 1      B
    /// 1 cols      C
    /// z
    /// ```
    pub fn to_solver_input(&self) -> Result<String, ConversionError> {
        let rows = self.num_rows();
        let cols = self.num_cols();

        let mut input = String::new();
        let _ = writeln!(input, "{}\n{}", rows, cols);

        let mut slack_added = 0;
        for (row, &sign) in self.constraints.iter().zip(&self.slack) {
            let mut line = self.split_row(row);
            line.extend(self.slack_columns(&mut slack_added, sign)?);
            let _ = writeln!(input, "{}", join_floats(&line));
        }

        let _ = writeln!(input, "{}\n1", rows);
        let _ = writeln!(input, "{}", join_floats(&self.rhs));

        let _ = writeln!(input, "1\n{}", cols);
        let mut objective = self.split_row(&self.objective);
        objective.extend(std::iter::repeat(0.0).take(self.num_slack));
        let _ = writeln!(input, "{}", join_floats(&objective));

        let _ = writeln!(input, "{}", format_float(self.objective_const));

        debug!("solver input:\n{}", input);
        Ok(input)
    }

    /// Expand a row in original variable space into split columns: each
    /// split variable contributes its coefficient followed by the negation.
    fn split_row(&self, row: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.split_width());
        for (i, &coefficient) in row.iter().enumerate() {
            out.push(coefficient);
            if self.split.get(i).copied().unwrap_or(false) {
                out.push(-coefficient);
            }
        }
        out
    }

    /// The slack block for one constraint: a zero run up to the row's own
    /// slack position, the sign, and zeros to the end of the block.
    fn slack_columns(
        &self,
        slack_added: &mut usize,
        sign: SlackSign,
    ) -> Result<Vec<f64>, ConversionError> {
        let mut columns = vec![0.0; self.num_slack];
        if sign == SlackSign::None {
            return Ok(columns);
        }
        if *slack_added >= self.num_slack {
            return Err(ConversionError {
                message: format!(
                    "extra unexpected slack variable: {:.2}",
                    sign.coefficient()
                ),
                kind: ConversionErrorKind::SlackOverflow,
            });
        }
        columns[*slack_added] = sign.coefficient();
        *slack_added += 1;
        Ok(columns)
    }
}

/// Walk a canonical chain into a coefficient row plus constant.
///
/// Requires a normalized, semantically checked expression; this is not a
/// semantics check.
fn expr_to_row(
    expr: &Expr,
    table: &SymbolTable,
    is_objective: bool,
) -> Result<(f64, Vec<f64>), ConversionError> {
    let mut row = vec![0.0; table.len()];
    let mut constant = 0.0;

    let mut current = expr;
    loop {
        match &current.kind {
            ExprKind::Binary { op: BinOp::Add, left, right } => {
                insert_term(&mut row, &mut constant, right, table, is_objective)?;
                current = left.as_ref();
            }
            _ => {
                insert_term(&mut row, &mut constant, current, table, is_objective)?;
                return Ok((constant, row));
            }
        }
    }
}

fn insert_term(
    row: &mut [f64],
    constant: &mut f64,
    expr: &Expr,
    table: &SymbolTable,
    is_objective: bool,
) -> Result<(), ConversionError> {
    match &expr.kind {
        ExprKind::Number(value) => {
            if !is_objective {
                return Err(ConversionError {
                    message: format!("unexpected constant in constraint row: {}", expr),
                    kind: ConversionErrorKind::MalformedTerm,
                });
            }
            *constant = *value;
            Ok(())
        }
        ExprKind::Variable(name) => {
            let index = variable_index(table, name)?;
            row[index] = 1.0;
            Ok(())
        }
        ExprKind::Binary { op: BinOp::Mul, left, right } => {
            let coefficient = match left.kind {
                ExprKind::Number(value) => value,
                _ => {
                    return Err(ConversionError {
                        message: format!("expected literal coefficient, found {}", left),
                        kind: ConversionErrorKind::MalformedTerm,
                    })
                }
            };
            let name = match &right.kind {
                ExprKind::Variable(name) => name,
                _ => {
                    return Err(ConversionError {
                        message: format!("expected variable, found {}", right),
                        kind: ConversionErrorKind::MalformedTerm,
                    })
                }
            };
            let index = variable_index(table, name)?;
            row[index] = coefficient;
            Ok(())
        }
        _ => Err(ConversionError {
            message: format!("unexpected term: {}", expr),
            kind: ConversionErrorKind::MalformedTerm,
        }),
    }
}

fn variable_index(table: &SymbolTable, name: &str) -> Result<usize, ConversionError> {
    table.index_of(name).ok_or_else(|| ConversionError {
        message: format!("undeclared variable: {}", name),
        kind: ConversionErrorKind::UnknownVariable,
    })
}

fn format_float(value: f64) -> String {
    if value == 0.0 {
        // collapses -0.0 so negated zero columns stay "0" on the wire
        return "0".to_string();
    }
    format!("{}", value)
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_float(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_and_check;

    fn build(source: &str) -> (StandardForm, crate::frontend::SymbolTable) {
        let (program, table) = parse_and_check(source).unwrap();
        let form = StandardForm::build(&program, &table).unwrap();
        (form, table)
    }

    #[test]
    fn test_objective_row() {
        let (form, _) = build(
            "let x1; let x2; let x3; max x1 + x2 + 3; \
             s.t. x1 + x2 <= 3; x1 + x2 + 3 * x3 >= 5;",
        );
        assert_eq!(form.objective, vec![1.0, 1.0, 0.0]);
        assert_eq!(form.objective_const, 3.0);
    }

    #[test]
    fn test_objective_rows_various() {
        let (form, _) = build(
            "let x1; let x2; let x3; let x4; max 4 * x1 + x2 + 0 * x3 + 5 * x4 + 100; \
             s.t. 5 * x1 + 3 * x2 <= 3; x1 + x2 + 3 * x3 >= 5;",
        );
        assert_eq!(form.objective, vec![4.0, 1.0, 0.0, 5.0]);
        assert_eq!(form.objective_const, 100.0);
    }

    #[test]
    fn test_minimize_negates() {
        let (form, _) = build("let x1; min 3 * x1 + 6; s.t. x1 >= 1;");
        assert_eq!(form.objective, vec![-3.0]);
        assert_eq!(form.objective_const, -6.0);
    }

    #[test]
    fn test_slack_signs_and_count() {
        let (form, _) = build(
            "let x1; max x1; s.t. x1 <= 4; x1 >= 1; x1 = 2;",
        );
        assert_eq!(
            form.slack,
            vec![SlackSign::Plus, SlackSign::Minus, SlackSign::None]
        );
        assert_eq!(form.num_slack, 2);
        assert_eq!(form.rhs, vec![4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_every_variable_split() {
        let (form, _) = build("let x1; let x2; max x1; s.t. x1 + x2 <= 1;");
        assert_eq!(form.split, vec![true, true]);
        assert_eq!(form.split_width(), 4);
        assert_eq!(form.num_cols(), 5);
    }

    #[test]
    fn test_wire_format() {
        let (form, _) = build("let x1; max 4 * x1; s.t. 4 * x1 <= 5; x1 >= 0;");
        assert_eq!(form.num_rows(), 2);
        assert_eq!(form.num_cols(), 4);
        let input = form.to_solver_input().unwrap();
        assert_eq!(
            input,
            "2\n4\n\
             4 -4 1 0\n\
             1 -1 0 -1\n\
             2\n1\n\
             5 0\n\
             1\n4\n\
             4 -4 0 0\n\
             0\n"
        );
    }

    #[test]
    fn test_equality_rows_keep_zero_slack_block() {
        let (form, _) = build("let x1; max x1; s.t. x1 = 2; x1 <= 4;");
        let input = form.to_solver_input().unwrap();
        // `=` row spans the whole slack block with zeros; the `<=` row's
        // slack lands in the first (and only) slack column.
        assert!(input.starts_with("2\n3\n1 -1 0\n1 -1 1\n"));
    }
}
