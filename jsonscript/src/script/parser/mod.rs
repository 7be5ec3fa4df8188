///
/// Parser Module - nom-based Token Parsing
///
/// Parses the token stream of one method body into a `Body`.
///
/// The parser is structured as follows:
/// - input: TokenStream type for nom integration
/// - combinators: Reusable token-matching combinators
/// - expressions: Expression parsing with Pratt precedence
/// - statements: Statement parsing
///
/// Errors do not stop parsing. After a failed statement the parser skips
/// to the end of that statement (the next `;` or the `}` closing a block it
/// entered) and continues, so one body can report several syntax errors.
///

mod combinators;
mod expressions;
mod input;
mod statements;

pub use combinators::{PError, PErrorKind};
pub use input::TokenStream;

use nom::Slice;

use crate::script::ast::{Body, Expression};
use crate::script::lexer::{Token, TokenKind};
use crate::source::Span;

use combinators::is_eof;
use expressions::parse_expression;
use statements::parse_statement;

pub struct ParseResult {
    pub body: Body,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    fn from_nom(e: &nom::Err<PError>, input: TokenStream) -> Self {
        match e {
            nom::Err::Error(pe) | nom::Err::Failure(pe) => ParseError::new(pe.message(), pe.input.current_span()),
            nom::Err::Incomplete(_) => ParseError::new("Incomplete input", input.current_span()),
        }
    }
}

pub fn parse(tokens: &[Token], source: &str) -> ParseResult {
    let mut statements = Vec::with_capacity(8);
    let mut errors = Vec::new();
    let mut input = TokenStream::new(tokens, source);

    while !is_eof(input) {
        match parse_statement(input) {
            Ok((rest, stmt)) => {
                statements.push(stmt);
                input = rest;
            }
            Err(e) => {
                errors.push(ParseError::from_nom(&e, input));
                input = synchronize(input);
            }
        }
    }

    ParseResult {
        body: Body { statements },
        errors,
    }
}

/// Parses a standalone expression such as a parameter default. The whole
/// token stream must be consumed.
pub fn parse_standalone_expression(tokens: &[Token], source: &str) -> Result<Expression, ParseError> {
    let input = TokenStream::new(tokens, source);
    match parse_expression(input) {
        Ok((rest, expr)) if is_eof(rest) => Ok(expr),
        Ok((rest, _)) => Err(ParseError::new(
            format!("Unexpected {} after expression", first_kind(rest).describe()),
            rest.current_span(),
        )),
        Err(e) => Err(ParseError::from_nom(&e, input)),
    }
}

fn first_kind(input: TokenStream) -> TokenKind {
    input.first().map(|t| t.kind).unwrap_or(TokenKind::Eof)
}

fn synchronize(input: TokenStream) -> TokenStream {
    let mut depth = 0usize;
    for (i, tok) in input.tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace if depth > 1 => depth -= 1,
            TokenKind::RBrace => return input.slice(i + 1..),
            TokenKind::Semicolon if depth == 0 => return input.slice(i + 1..),
            TokenKind::Eof => return input.slice(i..),
            _ => {}
        }
    }
    input.slice(input.tokens.len()..)
}
