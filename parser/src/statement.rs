//! FILENAME: parser/src/statement.rs
//! PURPOSE: Recursive descent parser for the script language.
//! CONTEXT: Library functions are written in a small imperative language
//! whose expressions are the formula grammar from expression.rs. Blocks
//! are keyword-delimited (`end function`, `end if`, `end while`,
//! `end for`); no statement separators are needed.
//!
//! GRAMMAR:
//!   program    --> statement*
//!   statement  --> "function" NAME "(" params? ")" program "end" "function"
//!              |   "if" expr program
//!                    ("elseif" expr program)* ("else" program)? "end" "if"
//!              |   "while" expr program "end" "while"
//!              |   "for" NAME "in" expr program "end" "for"
//!              |   "return" expr
//!              |   "break" | "continue"
//!              |   NAME "=" expr
//!              |   expr

use crate::ast::{Expression, ParseResult, Statement};
use crate::expression::Parser;
use crate::token::TokenKind;
use std::rc::Rc;

/// Parses a script source (a library file or the embedded standard
/// library) into a statement sequence. Scripts parse references as if at
/// cell A1; only absolute references are meaningful in library code.
pub fn parse_functions(input: &str) -> ParseResult<Statement> {
    let mut parser = Parser::new(input, 0, 0);
    let body = parser.parse_statement_block(&[TokenKind::Eof])?;
    parser.expect_eof()?;
    Ok(body)
}

impl<'a> Parser<'a> {
    /// Parses statements until one of the given terminator tokens is the
    /// current token (which is left unconsumed).
    fn parse_statement_block(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        let mut statements = Vec::new();
        loop {
            if terminators.contains(&self.current.kind) {
                break;
            }
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_here("Unexpected end of input inside block"));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Seq(statements))
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current.kind.clone() {
            TokenKind::Function => self.parse_function_def(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                let token = self.current.clone();
                self.advance();
                let expr = self.parse_expression()?;
                Ok(Statement::Return(token, expr))
            }
            TokenKind::Break => {
                let token = self.current.clone();
                self.advance();
                Ok(Statement::Break(token))
            }
            TokenKind::Continue => {
                let token = self.current.clone();
                self.advance();
                Ok(Statement::Continue(token))
            }
            TokenKind::Identifier(name) if self.peek.kind == TokenKind::Equals => {
                let token = self.current.clone();
                self.advance(); // past the name
                self.advance(); // past the =
                let expr = self.parse_expression()?;
                Ok(Statement::Assignment(token, name, expr))
            }
            _ => {
                let token = self.current.clone();
                let expr = self.parse_expression()?;
                Ok(Statement::ExprStatement(token, expr))
            }
        }
    }

    fn parse_function_def(&mut self) -> ParseResult<Statement> {
        let token = self.current.clone();
        self.advance(); // past `function`

        let name = match &self.current.kind {
            TokenKind::Identifier(s) => s.clone(),
            _ => return Err(self.error_here("Expected function name")),
        };
        self.advance();

        self.expect(TokenKind::LParen, "Expected ( after function name")?;
        let mut params = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                match &self.current.kind {
                    TokenKind::Identifier(p) => {
                        params.push(p.clone());
                        self.advance();
                    }
                    _ => return Err(self.error_here("Expected parameter name")),
                }
                match self.current.kind {
                    TokenKind::Comma => self.advance(),
                    TokenKind::RParen => break,
                    _ => return Err(self.error_here("Expected , or ) in parameter list")),
                }
            }
        }
        self.advance(); // past the )

        let body = self.parse_statement_block(&[TokenKind::End])?;
        self.advance(); // past `end`
        self.expect(TokenKind::Function, "Expected `end function`")?;

        Ok(Statement::FunctionDef(token, name, params, Rc::new(body)))
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        let token = self.current.clone();
        self.advance(); // past `if` or `elseif`

        let condition = self.parse_expression()?;
        let then_branch = self.parse_statement_block(&[
            TokenKind::Elseif,
            TokenKind::Else,
            TokenKind::End,
        ])?;

        let else_branch = match self.current.kind {
            TokenKind::Elseif => {
                // The chain shares a single `end if`, consumed by the
                // recursive call.
                self.parse_if()?
            }
            TokenKind::Else => {
                self.advance();
                let block = self.parse_statement_block(&[TokenKind::End])?;
                self.advance(); // past `end`
                self.expect(TokenKind::If, "Expected `end if`")?;
                block
            }
            TokenKind::End => {
                self.advance();
                self.expect(TokenKind::If, "Expected `end if`")?;
                Statement::Nop
            }
            _ => return Err(self.error_here("Expected elseif, else, or `end if`")),
        };

        Ok(Statement::If(
            token,
            condition,
            Box::new(then_branch),
            Box::new(else_branch),
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        let token = self.current.clone();
        self.advance(); // past `while`

        let condition = self.parse_expression()?;
        let body = self.parse_statement_block(&[TokenKind::End])?;
        self.advance(); // past `end`
        self.expect(TokenKind::While, "Expected `end while`")?;

        Ok(Statement::While(token, condition, Box::new(body)))
    }

    fn parse_for(&mut self) -> ParseResult<Statement> {
        let token = self.current.clone();
        self.advance(); // past `for`

        let var = match &self.current.kind {
            TokenKind::Identifier(s) => s.clone(),
            _ => return Err(self.error_here("Expected loop variable name")),
        };
        self.advance();

        self.expect(TokenKind::In, "Expected `in` in for statement")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_statement_block(&[TokenKind::End])?;
        self.advance(); // past `end`
        self.expect(TokenKind::For, "Expected `end for`")?;

        Ok(Statement::For(token, var, iterable, Box::new(body)))
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<()> {
        if self.current.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!("{} (found {})", message, self.current)))
        }
    }
}

/// Convenience used by tests and callers that need a standalone expression
/// in script position (parsed at A1).
pub fn parse_script_expression(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input, 0, 0);
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}
