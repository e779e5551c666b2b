//! Semantic analysis for LP programs.
//!
//! Runs after normalization (both passes are kept: the normalizer rejects
//! nonlinearity while folding, this pass catches undeclared variables and
//! any chain shape that normalization should have eliminated). Builds the
//! symbol table from declarations and validates that every statement is a
//! canonical chain of linear terms with a constant right-hand side.

use crate::frontend::ast::*;
use crate::utils::errors::{SemanticError, SemanticErrorKind};
use std::collections::HashMap;

/// Immutable mapping between variable names and their declaration indices.
///
/// Declaration order defines the index; every later stage (matrix columns,
/// variable splitting, result mapping) relies on it.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    indices: HashMap<String, usize>,
    names: Vec<String>,
}

impl SymbolTable {
    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no variables are declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a declared variable.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Get the name at a declaration index.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    /// Declared names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The inverse table (`index → name`), as reported to callers.
    pub fn mapping(&self) -> HashMap<usize, String> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i, name.clone()))
            .collect()
    }
}

/// Check a normalized program and build its symbol table.
pub fn check(program: &Program) -> Result<SymbolTable, SemanticError> {
    let mut indices = HashMap::new();
    let mut names = Vec::new();
    for (index, decl) in program.decls.iter().enumerate() {
        if indices.insert(decl.name.clone(), index).is_some() {
            return Err(SemanticError {
                message: format!("duplicate variable: {}", decl.name),
                line: decl.line,
                kind: SemanticErrorKind::DuplicateVariable,
            });
        }
        names.push(decl.name.clone());
    }
    let table = SymbolTable { indices, names };

    check_expr(true, &program.objective.expr, &table)?;

    for constraint in &program.constraints {
        check_expr(false, &constraint.left, &table)?;
        if !matches!(constraint.right.kind, ExprKind::Number(_)) {
            return Err(SemanticError {
                message: format!(
                    "constant expected on constraint right-hand side, found {}",
                    constraint.right
                ),
                line: constraint.line,
                kind: SemanticErrorKind::ConstantExpected,
            });
        }
    }

    Ok(table)
}

/// Validate a canonical `+`-chain.
///
/// `is_objective_and_first` is true only for the rightmost slot of the
/// objective chain, the one place a bare constant is allowed.
fn check_expr(
    is_objective_and_first: bool,
    expr: &Expr,
    table: &SymbolTable,
) -> Result<(), SemanticError> {
    match &expr.kind {
        ExprKind::Variable(_) | ExprKind::Number(_) | ExprKind::Unary { .. } => {
            check_term(is_objective_and_first, expr, table)
        }
        ExprKind::Binary { op, left, right } => match op {
            BinOp::Add => {
                check_term(is_objective_and_first, right, table)?;
                check_expr(false, left, table)
            }
            BinOp::Mul => check_term(is_objective_and_first, expr, table),
            BinOp::Sub | BinOp::Div => Err(SemanticError {
                message: format!("invalid operator in canonical chain: {}", expr),
                line: expr.line,
                kind: SemanticErrorKind::InvalidTerm,
            }),
        },
    }
}

/// Validate one chain term: a declared variable, a constant (objective
/// rightmost slot only), or a `literal * variable` product.
fn check_term(
    is_objective_and_first: bool,
    expr: &Expr,
    table: &SymbolTable,
) -> Result<(), SemanticError> {
    match &expr.kind {
        ExprKind::Variable(name) => {
            if table.index_of(name).is_none() {
                return Err(undeclared(name, expr.line));
            }
            Ok(())
        }
        ExprKind::Number(_) => {
            if is_objective_and_first {
                Ok(())
            } else {
                Err(SemanticError {
                    message: format!("unexpected constant term: {}", expr),
                    line: expr.line,
                    kind: SemanticErrorKind::InvalidTerm,
                })
            }
        }
        ExprKind::Unary { .. } => Err(SemanticError {
            message: format!("unary expression survived normalization: {}", expr),
            line: expr.line,
            kind: SemanticErrorKind::InvalidTerm,
        }),
        ExprKind::Binary { left, right, .. } => {
            if !matches!(left.kind, ExprKind::Number(_)) {
                return Err(SemanticError {
                    message: format!("expected literal coefficient, found {}", left),
                    line: left.line,
                    kind: SemanticErrorKind::InvalidTerm,
                });
            }
            let name = match &right.kind {
                ExprKind::Variable(name) => name,
                _ => {
                    return Err(SemanticError {
                        message: format!("expected variable, found {}", right),
                        line: right.line,
                        kind: SemanticErrorKind::InvalidTerm,
                    })
                }
            };
            if table.index_of(name).is_none() {
                return Err(undeclared(name, right.line));
            }
            Ok(())
        }
    }
}

fn undeclared(name: &str, line: usize) -> SemanticError {
    SemanticError {
        message: format!("undeclared variable: {}", name),
        line,
        kind: SemanticErrorKind::UndeclaredVariable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::normalize::normalize_program;
    use crate::frontend::parser::Parser;

    fn checked(source: &str) -> Result<SymbolTable, SemanticError> {
        let mut prog = Parser::new(tokenize(source).unwrap()).parse_program().unwrap();
        normalize_program(&mut prog).unwrap();
        check(&prog)
    }

    #[test]
    fn test_valid_program() {
        let table = checked(
            "let x1; let x2; max 3 * x1 + x2 + 7; s.t. x1 + 2 * x2 <= 4; x1 >= 0;",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.index_of("x1"), Some(0));
        assert_eq!(table.index_of("x2"), Some(1));
        assert_eq!(table.name_of(1), Some("x2"));
    }

    #[test]
    fn test_duplicate_variable() {
        let err = checked("let x1; let x1; max x1; s.t. x1 <= 1;").unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::DuplicateVariable);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_undeclared_variable_in_objective() {
        let err = checked("let x1; max x2; s.t. x1 <= 1;").unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::UndeclaredVariable);
        assert!(err.message.contains("x2"));
    }

    #[test]
    fn test_undeclared_variable_in_constraint() {
        let err = checked("let x1; max x1; s.t. x1 + y <= 1;").unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::UndeclaredVariable);
    }

    #[test]
    fn test_constraint_rhs_must_be_constant() {
        // The right side collapses to a literal during normalization, so
        // only an undeclared right-side variable can survive to this check.
        let mut prog = Parser::new(tokenize("let x1; max x1; s.t. x1 <= 1;").unwrap())
            .parse_program()
            .unwrap();
        normalize_program(&mut prog).unwrap();
        prog.constraints[0].right = Expr::variable("x1", 1);
        let err = check(&prog).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::ConstantExpected);
    }

    #[test]
    fn test_unary_rejected_in_canonical_chain() {
        let mut prog = Parser::new(tokenize("let x1; max x1; s.t. x1 <= 1;").unwrap())
            .parse_program()
            .unwrap();
        normalize_program(&mut prog).unwrap();
        prog.objective.expr = Expr::unary(UnaryOp::Minus, Expr::variable("x1", 1), 1);
        let err = check(&prog).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::InvalidTerm);
    }

    #[test]
    fn test_constant_allowed_only_in_objective() {
        assert!(checked("let x1; max x1 + 5; s.t. x1 <= 1;").is_ok());

        // A constraint whose left side folds to a bare constant is invalid.
        let err = checked("let x1; max x1; s.t. 2 + 3 <= 10;").unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::InvalidTerm);
    }
}
