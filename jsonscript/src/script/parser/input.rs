///
/// TokenStream Input Type for nom
///
/// Wraps a slice of body tokens together with the body text, which the
/// literal combinators need to read number spellings, and the current
/// syntactic nesting depth.
///

use nom::{InputLength, InputTake, Slice};

use crate::script::lexer::Token;
use crate::source::Span;

#[derive(Debug, Clone, Copy)]
pub struct TokenStream<'a> {
    pub tokens: &'a [Token],
    pub source: &'a str,
    pub depth: u32,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str) -> Self {
        Self { tokens, source, depth: 0 }
    }

    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn first(&self) -> Option<&'a Token> {
        self.tokens.first()
    }

    pub fn current_span(&self) -> Span {
        self.tokens.first().map(|t| t.span).unwrap_or(Span::dummy())
    }
}

impl<'a> InputLength for TokenStream<'a> {
    fn input_len(&self) -> usize {
        self.tokens.len()
    }
}

impl<'a> InputTake for TokenStream<'a> {
    fn take(&self, count: usize) -> Self {
        TokenStream {
            tokens: &self.tokens[..count],
            ..*self
        }
    }

    fn take_split(&self, count: usize) -> (Self, Self) {
        let (prefix, suffix) = self.tokens.split_at(count);
        (
            TokenStream {
                tokens: suffix,
                ..*self
            },
            TokenStream {
                tokens: prefix,
                ..*self
            },
        )
    }
}

impl<'a> Slice<std::ops::RangeFrom<usize>> for TokenStream<'a> {
    fn slice(&self, range: std::ops::RangeFrom<usize>) -> Self {
        TokenStream {
            tokens: &self.tokens[range.start..],
            ..*self
        }
    }
}
