//!
//! Base Combinators for Token Parsing
//!
//! Reusable nom combinators for matching tokens, keywords, identifiers
//! and literals.
//!

use lasso::Spur;
use nom::error::{ErrorKind, ParseError};
use nom::{IResult, InputTake};

use crate::script::ast::Ident;
use crate::script::lexer::{Keyword, Token, TokenKind};
use crate::source::Span;

use super::input::TokenStream;

pub type PResult<'a, O> = IResult<TokenStream<'a>, O, PError<'a>>;

/// Deepest nesting of groups, unary operators, operator chains and blocks
/// that a body may contain. Bound and interpreted trees recurse once per
/// level, so this also bounds their stack use.
pub const MAX_NESTING: u32 = 256;

#[derive(Debug, Clone)]
pub struct PError<'a> {
    pub input: TokenStream<'a>,
    pub kind: PErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PErrorKind {
    Expected(TokenKind),
    ExpectedKeyword(Keyword),
    ExpectedIdent,
    ExpectedExpr,
    ExpectedStatement,
    NumberTooLarge,
    TooComplex,
    Nom(ErrorKind),
}

impl<'a> PError<'a> {
    fn new(input: TokenStream<'a>, kind: PErrorKind) -> Self {
        Self { input, kind }
    }

    /// Human-readable message naming what was found at the error position.
    pub fn message(&self) -> String {
        let found = self.input.first().map(|t| t.kind).unwrap_or(TokenKind::Eof);
        if found == TokenKind::Error {
            return format!(
                "Unexpected character or unterminated literal '{}'",
                self.input.span_text(self.input.current_span())
            );
        }
        match &self.kind {
            PErrorKind::Expected(kind) => format!("{} expected, found {}", kind.describe(), found.describe()),
            PErrorKind::ExpectedKeyword(kw) => format!("{} expected, found {}", kw.as_str(), found.describe()),
            PErrorKind::ExpectedIdent => format!("Identifier expected, found {}", found.describe()),
            PErrorKind::ExpectedExpr => format!("Invalid expression term {}", found.describe()),
            PErrorKind::ExpectedStatement => format!("Invalid statement starting with {}", found.describe()),
            PErrorKind::NumberTooLarge => "Integral constant is too large".to_string(),
            PErrorKind::TooComplex => "An expression is too long or complex to compile".to_string(),
            PErrorKind::Nom(kind) => format!("Syntax error ({:?}) at {}", kind, found.describe()),
        }
    }
}

impl<'a> ParseError<TokenStream<'a>> for PError<'a> {
    fn from_error_kind(input: TokenStream<'a>, kind: ErrorKind) -> Self {
        PError::new(input, PErrorKind::Nom(kind))
    }

    fn append(_input: TokenStream<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub fn fail<'a, O>(input: TokenStream<'a>, kind: PErrorKind) -> PResult<'a, O> {
    Err(nom::Err::Error(PError::new(input, kind)))
}

/// Unrecoverable: the statement is abandoned and parsing resumes after it.
pub fn too_complex<'a, O>(input: TokenStream<'a>) -> PResult<'a, O> {
    Err(nom::Err::Failure(PError::new(input, PErrorKind::TooComplex)))
}

/// Runs `parser` one nesting level deeper. The returned input is back at
/// the caller's depth.
pub fn nested<'a, O, F>(input: TokenStream<'a>, parser: F) -> PResult<'a, O>
where
    F: FnOnce(TokenStream<'a>) -> PResult<'a, O>,
{
    if input.depth >= MAX_NESTING {
        return too_complex(input);
    }
    let (mut rest, output) = parser(TokenStream {
        depth: input.depth + 1,
        ..input
    })?;
    rest.depth = input.depth;
    Ok((rest, output))
}

pub fn token(kind: TokenKind) -> impl Fn(TokenStream) -> PResult<Token> {
    move |input: TokenStream| match input.first() {
        Some(tok) if tok.kind == kind => {
            let (rest, _) = input.take_split(1);
            Ok((rest, *tok))
        }
        _ => fail(input, PErrorKind::Expected(kind)),
    }
}

pub fn keyword(kw: Keyword) -> impl Fn(TokenStream) -> PResult<Token> {
    move |input: TokenStream| match input.first() {
        Some(tok) if tok.kind == TokenKind::Keyword(kw) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, *tok))
        }
        _ => fail(input, PErrorKind::ExpectedKeyword(kw)),
    }
}

pub fn ident(input: TokenStream) -> PResult<Ident> {
    match input.first() {
        Some(Token {
            kind: TokenKind::Ident,
            span,
            symbol: Some(symbol),
        }) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, Ident::new(*symbol, *span)))
        }
        _ => fail(input, PErrorKind::ExpectedIdent),
    }
}

pub fn int_lit(input: TokenStream) -> PResult<(i64, Span)> {
    match input.first() {
        Some(tok) if tok.kind == TokenKind::IntLit => {
            let (rest, _) = input.take_split(1);
            match input.span_text(tok.span).parse::<i64>() {
                Ok(value) => Ok((rest, (value, tok.span))),
                Err(_) => Err(nom::Err::Failure(PError::new(input, PErrorKind::NumberTooLarge))),
            }
        }
        _ => fail(input, PErrorKind::Expected(TokenKind::IntLit)),
    }
}

pub fn float_lit(input: TokenStream) -> PResult<(f64, Span)> {
    match input.first() {
        Some(tok) if tok.kind == TokenKind::FloatLit => {
            let (rest, _) = input.take_split(1);
            let value: f64 = input.span_text(tok.span).parse().unwrap_or(f64::NAN);
            Ok((rest, (value, tok.span)))
        }
        _ => fail(input, PErrorKind::Expected(TokenKind::FloatLit)),
    }
}

pub fn string_lit(input: TokenStream) -> PResult<(Spur, Span)> {
    match input.first() {
        Some(Token {
            kind: TokenKind::StringLit,
            span,
            symbol: Some(symbol),
        }) => {
            let (rest, _) = input.take_split(1);
            Ok((rest, (*symbol, *span)))
        }
        _ => fail(input, PErrorKind::Expected(TokenKind::StringLit)),
    }
}

/// A statement terminator. The last statement of a body may omit it.
pub fn statement_end(input: TokenStream) -> PResult<()> {
    if check(TokenKind::Semicolon)(input) {
        let (rest, _) = input.take_split(1);
        return Ok((rest, ()));
    }
    if is_eof(input) {
        return Ok((input, ()));
    }
    fail(input, PErrorKind::Expected(TokenKind::Semicolon))
}

pub fn peek_token(input: TokenStream) -> Option<TokenKind> {
    input.first().map(|t| t.kind)
}

pub fn peek_nth(input: TokenStream, n: usize) -> Option<TokenKind> {
    input.tokens.get(n).map(|t| t.kind)
}

pub fn check(kind: TokenKind) -> impl Fn(TokenStream) -> bool {
    move |input: TokenStream| input.first().map(|t| t.kind == kind).unwrap_or(false)
}

pub fn check_keyword(kw: Keyword) -> impl Fn(TokenStream) -> bool {
    move |input: TokenStream| {
        input
            .first()
            .map(|t| t.kind == TokenKind::Keyword(kw))
            .unwrap_or(false)
    }
}

pub fn is_eof(input: TokenStream) -> bool {
    input.is_empty() || input.first().map(|t| t.kind == TokenKind::Eof).unwrap_or(true)
}
