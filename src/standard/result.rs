//! Solver output interpretation.
//!
//! The solver replies with a whitespace-separated float sequence (the
//! solution in split/slack space), a single non-numeric result-type word
//! (`optimal`, `infeasible`, `unbounded`), and a trailing float sequence
//! (the certificate, passed through opaquely). This module parses that
//! text and reverses the free-variable substitution so the solution is
//! reported against the original variables.

use crate::frontend::semantic::SymbolTable;
use crate::standard::StandardForm;
use crate::utils::errors::{
    ConversionError, ConversionErrorKind, SolverError, SolverErrorKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw parsed solver reply, still in split/slack space.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// Solution vector over split variables and slacks
    pub solution: Vec<f64>,
    /// Result-type tag
    pub result_type: String,
    /// Certificate vector (dual solution or infeasibility witness)
    pub certificate: Vec<f64>,
}

/// The structured result handed back to the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    /// Solution in original variable space
    pub solution: Vec<f64>,
    /// Result-type tag from the solver
    pub result_type: String,
    /// Certificate vector, passed through unchanged
    pub certificate: Vec<f64>,
    /// Variable index → name
    pub mapping: HashMap<usize, String>,
}

/// Parse the solver's textual output.
///
/// Floats before the first non-numeric word form the solution; the word
/// itself is the result type; floats after it form the certificate.
/// Fails if no result-type word is found.
pub fn parse_solver_output(output: &str) -> Result<SolverOutput, SolverError> {
    let mut words = output.split_whitespace().peekable();

    let mut solution = Vec::new();
    while let Some(word) = words.peek() {
        match word.parse::<f64>() {
            Ok(value) => {
                solution.push(value);
                words.next();
            }
            Err(_) => break,
        }
    }

    let result_type = words
        .next()
        .ok_or_else(|| SolverError {
            message: "no result type found in solver output".to_string(),
            kind: SolverErrorKind::MissingResultType,
        })?
        .to_string();

    let mut certificate = Vec::new();
    for word in words {
        match word.parse::<f64>() {
            Ok(value) => certificate.push(value),
            Err(_) => break,
        }
    }

    Ok(SolverOutput {
        solution,
        result_type,
        certificate,
    })
}

/// Reverse the free-variable substitution on a solver solution.
///
/// Walks the split-variable block (the trailing `num_slack` entries are
/// skipped): each split pair collapses in place, the `x⁺` slot receiving
/// `x⁺ - x⁻` with the companion `x⁻` slot retained (it is zero at any
/// basic optimum); unsplit variables pass through. Output follows
/// declaration order.
pub fn recover_solution(
    form: &StandardForm,
    solution: &[f64],
) -> Result<Vec<f64>, ConversionError> {
    let expected = form.split_width() + form.num_slack;
    if solution.len() < expected {
        return Err(ConversionError {
            message: format!(
                "solution vector has {} entries, bookkeeping expects {}",
                solution.len(),
                expected
            ),
            kind: ConversionErrorKind::SolutionTooShort,
        });
    }

    let mut recovered = Vec::with_capacity(form.split_width());
    let mut pos = 0;
    for &split in &form.split {
        if split {
            recovered.push(solution[pos] - solution[pos + 1]);
            recovered.push(solution[pos + 1]);
            pos += 2;
        } else {
            recovered.push(solution[pos]);
            pos += 1;
        }
    }

    Ok(recovered)
}

/// Assemble the final response from a parsed solver reply.
pub fn interpret(
    form: &StandardForm,
    table: &SymbolTable,
    output: &SolverOutput,
) -> Result<SolveResponse, ConversionError> {
    let solution = recover_solution(form, &output.solution)?;
    Ok(SolveResponse {
        solution,
        result_type: output.result_type.clone(),
        certificate: output.certificate.clone(),
        mapping: table.mapping(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_and_check;

    fn form(source: &str) -> (StandardForm, SymbolTable) {
        let (program, table) = parse_and_check(source).unwrap();
        let form = StandardForm::build(&program, &table).unwrap();
        (form, table)
    }

    #[test]
    fn test_parse_solver_output() {
        let out = parse_solver_output("1.25 0 0 1.25\noptimal\n1\n").unwrap();
        assert_eq!(out.solution, vec![1.25, 0.0, 0.0, 1.25]);
        assert_eq!(out.result_type, "optimal");
        assert_eq!(out.certificate, vec![1.0]);
    }

    #[test]
    fn test_parse_solver_output_infeasible() {
        let out = parse_solver_output("infeasible\n0.5 0.5\n").unwrap();
        assert!(out.solution.is_empty());
        assert_eq!(out.result_type, "infeasible");
        assert_eq!(out.certificate, vec![0.5, 0.5]);
    }

    #[test]
    fn test_parse_solver_output_missing_tag() {
        let err = parse_solver_output("1 2 3").unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::MissingResultType);

        let err = parse_solver_output("").unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::MissingResultType);
    }

    #[test]
    fn test_recover_solution() {
        let (form, _) = form("let x1; max 4 * x1; s.t. 4 * x1 <= 5; x1 >= 0;");
        // Split space: [x1+, x1-, s1, s2]
        let recovered = recover_solution(&form, &[1.25, 0.0, 0.0, 1.25]).unwrap();
        assert_eq!(recovered, vec![1.25, 0.0]);
    }

    #[test]
    fn test_recover_solution_negative_variable() {
        let (f, _) = form("let x1; max x1; s.t. x1 <= -2;");
        // x1 = 0 - 2 = -2 via its negative half.
        let recovered = recover_solution(&f, &[0.0, 2.0, 0.0]).unwrap();
        assert_eq!(recovered, vec![-2.0, 2.0]);
    }

    #[test]
    fn test_recover_solution_too_short() {
        let (f, _) = form("let x1; let x2; max x1; s.t. x1 + x2 <= 1;");
        let err = recover_solution(&f, &[1.0, 0.0]).unwrap_err();
        assert_eq!(err.kind, ConversionErrorKind::SolutionTooShort);
    }

    #[test]
    fn test_round_trip_identity() {
        // Forward-splitting a vector and reversing it is the identity on
        // the original variables.
        let (f, table) = form("let a; let b; max a + b; s.t. a + b <= 10; a - b >= -3;");
        let original: [f64; 2] = [4.5, -2.25];
        let mut split_space = Vec::new();
        for &value in &original {
            // x = x+ - x- with both halves nonnegative
            split_space.push(value.max(0.0));
            split_space.push((-value).max(0.0));
        }
        split_space.extend([0.0, 0.0]); // slack block
        let recovered = recover_solution(&f, &split_space).unwrap();
        // With every variable split, the primary slot of variable i is 2i.
        for (index, &value) in original.iter().enumerate() {
            let name = table.name_of(index).unwrap();
            assert_eq!(recovered[2 * index], value, "variable {}", name);
        }
    }

    #[test]
    fn test_interpret_builds_mapping() {
        let (f, table) = form("let x1; max 4 * x1; s.t. 4 * x1 <= 5; x1 >= 0;");
        let output = parse_solver_output("1.25 0 0 1.25 optimal 1").unwrap();
        let response = interpret(&f, &table, &output).unwrap();
        assert_eq!(response.solution, vec![1.25, 0.0]);
        assert_eq!(response.result_type, "optimal");
        assert_eq!(response.certificate, vec![1.0]);
        assert_eq!(response.mapping.get(&0).map(String::as_str), Some("x1"));
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = SolveResponse {
            solution: vec![1.25, 0.0],
            result_type: "optimal".to_string(),
            certificate: vec![1.0],
            mapping: HashMap::from([(0, "x1".to_string())]),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("resultType").is_some());
        assert!(json.get("solution").is_some());
    }
}
