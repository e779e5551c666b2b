//! # lpfront - LP front-end compiler
//!
//! Compiles a small textual linear-programming language into the exact
//! numeric matrices a simplex solver needs, and converts the solver's raw
//! numeric output back into the original variable space:
//!
//! ```text
//! Input → Lexer (DFA) → Parser → Normalizer → Semantic Check
//!       → Standard Form → Solver (subprocess) → Result Interpreter
//! ```
//!
//! ## Example
//!
//! ```rust
//! let source = "let x1; let x2; max x1 + x2; s.t. x1 + x2 <= 10;";
//! let compiled = lpfront::compile(source).unwrap();
//! assert_eq!(compiled.standard_form.objective, vec![1.0, 1.0]);
//! ```
//!
//! The simplex pivoting itself is not part of this crate: a solve is a
//! single blocking exchange with an external solver binary over a
//! line-oriented text protocol (see [`solver`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frontend;
pub mod standard;
pub mod solver;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::frontend::{parse, parse_and_check, tokenize, Program, SymbolTable};
    pub use crate::solver::{SimplexSolver, SubprocessSolver};
    pub use crate::standard::result::{SolveResponse, SolverOutput};
    pub use crate::standard::StandardForm;
    pub use crate::utils::errors::*;
}

use crate::frontend::semantic::SymbolTable;
use crate::standard::result::SolveResponse;
use crate::standard::StandardForm;
use crate::utils::errors::LpResult;
use log::{debug, info};

/// A program carried through the whole front-end.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    /// The normalized, checked program
    pub program: frontend::Program,
    /// Name/index mapping, in declaration order
    pub table: SymbolTable,
    /// Solver-ready arrays
    pub standard_form: StandardForm,
}

/// Run the front-end pipeline: tokenize, parse, normalize, check, convert.
pub fn compile(source: &str) -> LpResult<CompiledProgram> {
    let (program, table) = frontend::parse_and_check(source)?;
    debug!(
        "compiled program: {} variables, {} constraints",
        table.len(),
        program.constraints.len()
    );
    let standard_form = StandardForm::build(&program, &table)?;
    Ok(CompiledProgram {
        program,
        table,
        standard_form,
    })
}

/// Compile a program and run it through a solver.
///
/// The solution in the response is mapped back to original variable
/// space; the certificate passes through unchanged.
pub fn solve(source: &str, solver: &dyn solver::SimplexSolver) -> LpResult<SolveResponse> {
    let compiled = compile(source)?;
    let input = compiled.standard_form.to_solver_input()?;

    info!(
        "solving: {} rows, {} cols",
        compiled.standard_form.num_rows(),
        compiled.standard_form.num_cols()
    );
    let raw = solver.solve(&input)?;

    let output = standard::result::parse_solver_output(&raw)?;
    let response = standard::result::interpret(&compiled.standard_form, &compiled.table, &output)?;
    Ok(response)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
