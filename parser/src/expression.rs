//! FILENAME: parser/src/expression.rs
//! PURPOSE: Recursive descent parser for the expression language.
//! CONTEXT: Cell formulas are parsed relative to the cell that holds them:
//! A1-style references become offset-based `CellRef`s and ranges resolve
//! their endpoints to absolute coordinates. The same expression grammar is
//! reused by the script parser in statement.rs.
//!
//! GRAMMAR (precedence low to high):
//!   expression     --> comparison
//!   comparison     --> logical_or ( ("=" | "<>" | "<" | ">" | "<=" | ">=") logical_or )*
//!   logical_or     --> logical_and ( "|" logical_and )*
//!   logical_and    --> additive ( "&" additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("-" | "!") unary | primary
//!   primary        --> NUMBER | STRING | reference | call | IDENT | "(" expression ")"
//!   call           --> IDENT "(" arguments? ")"
//!   reference      --> cell_ref (":" cell_ref)?
//!   cell_ref       --> "$"? COLUMN "$"? ROW

use crate::ast::{
    BinaryOperator, CellRange, CellRef, Expression, Literal, ParseError, ParseResult,
    UnaryOperator,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Highest addressable column, "ZZZ".
pub const MAX_COLUMN: i64 = 18277;
/// Highest addressable 1-based row.
pub const MAX_ROW: i64 = 999_999_998;

/// Parses one cell's input text at the cell's (col, row). A leading `=` is
/// tolerated (the sheet strips it before storing, but user input and saved
/// files may carry it).
pub fn parse_cell_input(input: &str, col: usize, row: usize) -> ParseResult<Expression> {
    let mut parser = Parser::new(input, col, row);
    if parser.current.kind == TokenKind::Equals {
        parser.advance();
    }
    if parser.current.kind == TokenKind::Eof {
        return Err(ParseError::new("Empty expression", parser.current.pos));
    }
    let expr = parser.parse_expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// The parser holds the lexer plus one token of lookahead beyond the
/// current token (the script grammar needs it to tell `x = ...` from a
/// bare expression statement).
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(crate) current: Token,
    pub(crate) peek: Token,
    /// Coordinates of the cell being parsed; references resolve against
    /// these. Script sources parse at (0, 0).
    col: usize,
    row: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, col: usize, row: usize) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            current,
            peek,
            col,
            row,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.current = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current.pos)
    }

    pub(crate) fn expect_eof(&self) -> ParseResult<()> {
        if self.current.kind != TokenKind::Eof {
            return Err(self.error_here(format!(
                "Unexpected token after expression: {}",
                self.current
            )));
        }
        Ok(())
    }

    /// Entry point for expression parsing.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_logical_or()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Equals => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            let token = self.current.clone();
            self.advance();
            let right = self.parse_logical_or()?;
            left = Expression::BinaryOp(token, op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.current.kind == TokenKind::Pipe {
            let token = self.current.clone();
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::BinaryOp(token, BinaryOperator::Or, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;

        while self.current.kind == TokenKind::Ampersand {
            let token = self.current.clone();
            self.advance();
            let right = self.parse_additive()?;
            left =
                Expression::BinaryOp(token, BinaryOperator::And, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            let token = self.current.clone();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::BinaryOp(token, op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current.kind {
                TokenKind::Asterisk => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };
            let token = self.current.clone();
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::BinaryOp(token, op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match &self.current.kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Bang => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };
        let token = self.current.clone();
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp(token, op, Box::new(operand)))
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current.kind.clone() {
            TokenKind::Number(n) => {
                let token = self.current.clone();
                self.advance();
                Ok(Expression::Constant(token, Literal::Number(n)))
            }
            TokenKind::Str(s) => {
                let token = self.current.clone();
                self.advance();
                Ok(Expression::Constant(token, Literal::Str(s)))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                if self.current.kind != TokenKind::RParen {
                    return Err(self.error_here("Expected )"));
                }
                self.advance();
                Ok(expr)
            }
            TokenKind::Dollar => self.parse_reference(),
            TokenKind::Identifier(name) => {
                if self.peek.kind == TokenKind::LParen {
                    return self.parse_call(name);
                }
                // An identifier shaped like a cell reference (or followed
                // by "$row") is one; anything else is a variable.
                if split_reference(&name).is_some() || self.peek.kind == TokenKind::Dollar {
                    return self.parse_reference();
                }
                let token = self.current.clone();
                self.advance();
                Ok(Expression::Variable(token, name))
            }
            _ => Err(self.error_here(format!("Unexpected token: {}", self.current))),
        }
    }

    fn parse_call(&mut self, name: String) -> ParseResult<Expression> {
        let callee_token = self.current.clone();
        let callee = Expression::Variable(callee_token.clone(), name);
        self.advance(); // past the identifier
        self.advance(); // past the (

        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expression()?);
                match self.current.kind {
                    TokenKind::Comma => self.advance(),
                    TokenKind::RParen => break,
                    _ => return Err(self.error_here("Expected , or ) in argument list")),
                }
            }
        }
        self.advance(); // past the )
        Ok(Expression::FunctionCall(
            callee_token,
            Box::new(callee),
            args,
        ))
    }

    /// Parses a reference where the current token is known to begin one.
    fn parse_reference(&mut self) -> ParseResult<Expression> {
        let token = self.current.clone();
        let first = self.parse_cell_ref()?;
        if self.current.kind == TokenKind::Colon {
            self.advance();
            let second = self.parse_cell_ref()?;
            let (c1, r1) = first.resolve(self.col, self.row);
            let (c2, r2) = second.resolve(self.col, self.row);
            return Ok(Expression::CellRangeNode(
                token,
                CellRange::new(c1, r1, c2, r2),
            ));
        }
        Ok(Expression::CellRefNode(token, first))
    }

    /// Parses one `$`?COLUMN`$`?ROW reference at the current token.
    fn parse_cell_ref(&mut self) -> ParseResult<CellRef> {
        let mut col_absolute = false;
        if self.current.kind == TokenKind::Dollar {
            col_absolute = true;
            self.advance();
        }

        let ident = match &self.current.kind {
            TokenKind::Identifier(s) => s.clone(),
            _ => return Err(self.error_here("Expected cell reference")),
        };

        let (letters, digits) = match split_reference_parts(&ident) {
            Some(parts) => parts,
            None => return Err(self.error_here(format!("Malformed cell reference: {}", ident))),
        };
        let col_index = column_letters_to_index(&letters)
            .ok_or_else(|| self.error_here(format!("Malformed cell reference: {}", ident)))?;
        self.advance();

        let (row_absolute, row_number) = match digits {
            Some(d) => (false, d),
            None => {
                // The row part must follow as `$` NUMBER.
                if self.current.kind != TokenKind::Dollar {
                    return Err(self.error_here("Expected $ and row in cell reference"));
                }
                self.advance();
                let n = match &self.current.kind {
                    TokenKind::Number(n) if n.fract() == 0.0 && *n >= 1.0 => *n as i64,
                    _ => return Err(self.error_here("Expected row number in cell reference")),
                };
                self.advance();
                (true, n)
            }
        };

        if row_number < 1 || row_number > MAX_ROW {
            return Err(self.error_here(format!("Row out of range: {}", row_number)));
        }

        let col_ref = if col_absolute {
            col_index
        } else {
            col_index - self.col as i64
        };
        let row_ref = if row_absolute {
            row_number - 1
        } else {
            (row_number - 1) - self.row as i64
        };

        Ok(CellRef::new(col_absolute, col_ref, row_absolute, row_ref))
    }
}

/// Splits an identifier into (column letters, row number) when it has the
/// exact shape of a complete A1-style reference.
fn split_reference(ident: &str) -> Option<(String, i64)> {
    match split_reference_parts(ident) {
        Some((letters, Some(digits))) => Some((letters, digits)),
        _ => None,
    }
}

/// Splits an identifier into column letters plus an optional row number.
/// Letters-only identifiers of reference length are returned with `None`
/// digits (the `A$1` form); anything else is rejected.
fn split_reference_parts(ident: &str) -> Option<(String, Option<i64>)> {
    let letters: String = ident.chars().take_while(|c| c.is_ascii_uppercase()).collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let rest = &ident[letters.len()..];
    if rest.is_empty() {
        return Some((letters, None));
    }
    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: i64 = rest.parse().ok()?;
    Some((letters, Some(digits)))
}

/// Converts column letters to a 0-based index: A..Z are 0..25, AA..ZZ are
/// 26..701, AAA..ZZZ are 702..18277. The inverse lives in the engine's
/// coordinate module.
pub fn column_letters_to_index(letters: &str) -> Option<i64> {
    let vals: Vec<i64> = letters
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                Some(c as i64 - 'A' as i64)
            } else {
                None
            }
        })
        .collect::<Option<Vec<i64>>>()?;
    let index = match vals.len() {
        1 => vals[0],
        2 => 26 + vals[0] * 26 + vals[1],
        3 => 702 + vals[0] * 676 + vals[1] * 26 + vals[2],
        _ => return None,
    };
    if index > MAX_COLUMN {
        return None;
    }
    Some(index)
}
