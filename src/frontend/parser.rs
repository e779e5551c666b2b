//! Parser for the LP language.
//!
//! A recursive descent parser with one-token lookahead over the grammar:
//!
//! ```text
//! Program    := Decl* Objective "s.t." Constraint* EOF
//! Decl       := "let" ID ";"
//! Objective  := ("max"|"min") Expr ";"
//! Constraint := Expr ("<="|"="|">=") Expr ";"
//! Expr       := Term (("+"|"-") Term)*
//! Term       := Factor (("*"|"/") Factor)*
//! Factor     := ("-"|"+") Factor | NUMBER | ID | "(" Expr ")"
//! ```
//!
//! `+`/`-` and `*`/`/` chains build left-associative trees.

use crate::frontend::ast::*;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::ParseError;

/// A parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl Parser {
    /// Create a parser from a token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof_line = tokens.last().map(|t| t.line).unwrap_or(1);
        Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, "", eof_line),
        }
    }

    /// Parse a complete program.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut decls = Vec::new();
        while self.check(TokenKind::Let) {
            decls.push(self.parse_decl()?);
        }

        let objective = self.parse_objective()?;
        self.expect(TokenKind::SubjectTo)?;

        let mut constraints = Vec::new();
        while !self.check(TokenKind::Eof) {
            constraints.push(self.parse_constraint()?);
        }

        Ok(Program {
            decls,
            objective,
            constraints,
        })
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        self.expect(TokenKind::Let)?;
        let id = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Decl {
            name: id.lexeme,
            line: id.line,
        })
    }

    fn parse_objective(&mut self) -> Result<Objective, ParseError> {
        let token = self.advance();
        let maximize = match token.kind {
            TokenKind::Max => true,
            TokenKind::Min => false,
            _ => {
                return Err(self.error_at(
                    &token,
                    "objective must start with min or max",
                    &[TokenKind::Min, TokenKind::Max],
                ))
            }
        };

        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Objective { maximize, expr })
    }

    fn parse_constraint(&mut self) -> Result<Constraint, ParseError> {
        let left = self.parse_expr()?;

        let op = self.advance();
        let relation = match op.kind {
            TokenKind::LessEqual => Relation::Le,
            TokenKind::Equal => Relation::Eq,
            TokenKind::GreaterEqual => Relation::Ge,
            _ => {
                return Err(self.error_at(
                    &op,
                    "constraint relation not found",
                    &[TokenKind::LessEqual, TokenKind::Equal, TokenKind::GreaterEqual],
                ))
            }
        };

        let right = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Constraint {
            left,
            relation,
            right,
            line: op.line,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right, token.line);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let token = self.advance();
            let right = self.parse_factor()?;
            left = Expr::binary(op, left, right, token.line);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance();
            let operand = self.parse_factor()?;
            return Ok(Expr::unary(op, operand, token.line));
        }

        let token = self.advance();
        match token.kind {
            TokenKind::Number | TokenKind::Decimal => {
                let value: f64 = token.lexeme.parse().map_err(|_| ParseError {
                    message: format!("invalid number token {:?}", token.lexeme),
                    line: token.line,
                    expected: Vec::new(),
                    found: Some(token.lexeme.clone()),
                })?;
                Ok(Expr::number(value, token.line))
            }
            TokenKind::Identifier => Ok(Expr::variable(token.lexeme, token.line)),
            TokenKind::LeftParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            _ => Err(self.error_at(
                &token,
                "unexpected token in expression",
                &[TokenKind::Number, TokenKind::Identifier, TokenKind::LeftParen],
            )),
        }
    }

    // Helper methods

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.kind != kind {
            return Err(self.error_at(&token, "token kind does not match", &[kind]));
        }
        Ok(token)
    }

    fn error_at(&self, token: &Token, message: &str, expected: &[TokenKind]) -> ParseError {
        ParseError {
            message: message.to_string(),
            line: token.line,
            expected: expected.iter().map(|k| k.name().to_string()).collect(),
            found: Some(token.kind.name().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = tokenize(source).unwrap();
        Parser::new(tokens).parse_program()
    }

    #[test]
    fn test_single_decl_and_objective() {
        let prog = parse("let x1; max 1 + x1; s.t. x1 <= 10;").unwrap();
        assert_eq!(prog.decls.len(), 1);
        assert_eq!(prog.decls[0].name, "x1");
        assert!(prog.objective.maximize);
        assert_eq!(prog.constraints.len(), 1);
    }

    #[test]
    fn test_multiple_decls_and_constraints() {
        let prog = parse(
            "let x1; let x2; min x1 + 2 * x2; s.t. x1 + x2 <= 5; x1 - x2 >= 1; x1 = 3;",
        )
        .unwrap();
        assert_eq!(prog.decls.len(), 2);
        assert!(!prog.objective.maximize);
        assert_eq!(prog.constraints.len(), 3);
        assert_eq!(prog.constraints[0].relation, Relation::Le);
        assert_eq!(prog.constraints[1].relation, Relation::Ge);
        assert_eq!(prog.constraints[2].relation, Relation::Eq);
    }

    #[test]
    fn test_precedence() {
        let prog = parse("let x1; max 1 + 2 * x1; s.t. x1 <= 1;").unwrap();
        // `*` binds tighter: (1 + (2 * x1))
        assert_eq!(prog.objective.expr.to_string(), "(1 + (2 * x1))");
    }

    #[test]
    fn test_left_associativity() {
        let prog = parse("let x1; max 1 - 2 - 3; s.t. x1 <= 1;").unwrap();
        assert_eq!(prog.objective.expr.to_string(), "((1 - 2) - 3)");
    }

    #[test]
    fn test_unary_and_parens() {
        let prog = parse("let x1; max -(x1 + 2) * 3; s.t. x1 <= 1;").unwrap();
        assert_eq!(prog.objective.expr.to_string(), "((-(x1 + 2)) * 3)");
    }

    #[test]
    fn test_missing_subject_to() {
        let err = parse("let x1; max x1; x1 <= 10;").unwrap_err();
        assert!(err.expected.contains(&"s.t.".to_string()));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse("let x1 max x1; s.t. x1 <= 10;").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.expected.contains(&";".to_string()));
    }

    #[test]
    fn test_objective_required() {
        let err = parse("let x1; s.t. x1 <= 10;").unwrap_err();
        assert!(err.message.contains("min or max"));
    }

    #[test]
    fn test_unexpected_token_in_expression() {
        let err = parse("let x1; max x1 + ; s.t. x1 <= 10;").unwrap_err();
        assert_eq!(err.found.as_deref(), Some(";"));
    }

    #[test]
    fn test_constraints_stop_at_eof() {
        let prog = parse("max 1; s.t.").unwrap();
        assert!(prog.decls.is_empty());
        assert!(prog.constraints.is_empty());
    }
}
