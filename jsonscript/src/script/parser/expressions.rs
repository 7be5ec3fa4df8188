///
/// Expression Parser
///
/// Parses expressions using nom combinators with Pratt-style precedence.
/// Postfix member access and calls bind tighter than any operator.
///

use nom::branch::alt;
use nom::combinator::map;
use nom::multi::separated_list0;
use nom::{InputTake, Slice};

use crate::script::ast::*;
use crate::script::lexer::{Keyword, TokenKind};
use crate::source::Spanned;

use super::combinators::*;
use super::input::TokenStream;

pub fn parse_expression(input: TokenStream) -> PResult<Expression> {
    nested(input, |input| pratt_expr(input, 0))
}

fn pratt_expr(input: TokenStream, min_prec: u8) -> PResult<Expression> {
    let base = input.depth;
    let (mut input, mut left) = parse_unary(input)?;

    loop {
        let Some(op) = peek_binary_op(input) else {
            break;
        };

        let prec = op.precedence();
        if prec < min_prec {
            break;
        }

        // Each fold nests everything parsed so far one level deeper.
        if input.depth >= MAX_NESTING {
            return too_complex(input);
        }

        input = input.slice(1..);
        input.depth += 1;
        let (new_input, right) = pratt_expr(input, prec + 1)?;
        input = new_input;

        let span = left.span().merge(right.span());
        left = Expression::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        });
    }

    input.depth = base;
    Ok((input, left))
}

fn parse_unary(input: TokenStream) -> PResult<Expression> {
    let start_span = input.current_span();

    let op = match peek_token(input) {
        Some(TokenKind::Minus) => Some(UnaryOp::Neg),
        Some(TokenKind::Bang) => Some(UnaryOp::Not),
        _ => None,
    };

    if let Some(op) = op {
        let (input, _) = input.take_split(1);
        let (input, operand) = nested(input, parse_unary)?;
        let span = start_span.merge(operand.span());
        return Ok((
            input,
            Expression::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                span,
            }),
        ));
    }

    parse_postfix(input)
}

fn parse_postfix(input: TokenStream) -> PResult<Expression> {
    let base = input.depth;
    let (mut input, mut expr) = parse_atom(input)?;

    loop {
        if !matches!(peek_token(input), Some(TokenKind::LParen | TokenKind::Dot)) {
            break;
        }
        if input.depth >= MAX_NESTING {
            return too_complex(input);
        }
        input.depth += 1;

        match peek_token(input) {
            Some(TokenKind::LParen) => {
                let (new_input, new_expr) = parse_call(input, expr)?;
                input = new_input;
                expr = new_expr;
            }
            Some(TokenKind::Dot) => {
                let (new_input, new_expr) = parse_member(input, expr)?;
                input = new_input;
                expr = new_expr;
            }
            _ => break,
        }
    }

    input.depth = base;
    Ok((input, expr))
}

fn parse_atom(input: TokenStream) -> PResult<Expression> {
    let result = alt((
        parse_int_literal,
        parse_float_literal,
        parse_string_literal,
        parse_keyword_literal,
        parse_this,
        map(ident, Expression::Identifier),
        parse_grouped,
    ))(input);

    match result {
        Err(nom::Err::Error(_)) => fail(input, PErrorKind::ExpectedExpr),
        other => other,
    }
}

fn parse_int_literal(input: TokenStream) -> PResult<Expression> {
    let (input, (value, span)) = int_lit(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::Int(value),
            span,
        }),
    ))
}

fn parse_float_literal(input: TokenStream) -> PResult<Expression> {
    let (input, (value, span)) = float_lit(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::Float(value),
            span,
        }),
    ))
}

fn parse_string_literal(input: TokenStream) -> PResult<Expression> {
    let (input, (symbol, span)) = string_lit(input)?;
    Ok((
        input,
        Expression::Literal(LiteralExpr {
            value: Literal::Str(symbol),
            span,
        }),
    ))
}

fn parse_keyword_literal(input: TokenStream) -> PResult<Expression> {
    let value = match peek_token(input) {
        Some(TokenKind::Keyword(Keyword::True)) => Literal::Bool(true),
        Some(TokenKind::Keyword(Keyword::False)) => Literal::Bool(false),
        Some(TokenKind::Keyword(Keyword::Null)) => Literal::Null,
        _ => return fail(input, PErrorKind::ExpectedExpr),
    };
    let span = input.current_span();
    Ok((input.slice(1..), Expression::Literal(LiteralExpr { value, span })))
}

fn parse_this(input: TokenStream) -> PResult<Expression> {
    let (input, tok) = keyword(Keyword::This)(input)?;
    Ok((input, Expression::This(tok.span)))
}

fn parse_grouped(input: TokenStream) -> PResult<Expression> {
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, inner) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    Ok((input, inner))
}

fn parse_call(input: TokenStream, callee: Expression) -> PResult<Expression> {
    let start_span = callee.span();
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, args) = separated_list0(token(TokenKind::Comma), parse_expression)(input)?;
    let (input, end) = token(TokenKind::RParen)(input)?;

    Ok((
        input,
        Expression::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span: start_span.merge(end.span),
        }),
    ))
}

fn parse_member(input: TokenStream, base: Expression) -> PResult<Expression> {
    let start_span = base.span();
    let (input, _) = token(TokenKind::Dot)(input)?;
    let (input, member) = ident(input)?;

    Ok((
        input,
        Expression::Member(MemberExpr {
            base: Box::new(base),
            member,
            span: start_span.merge(member.span),
        }),
    ))
}

fn peek_binary_op(input: TokenStream) -> Option<BinaryOp> {
    match peek_token(input) {
        Some(TokenKind::Plus) => Some(BinaryOp::Add),
        Some(TokenKind::Minus) => Some(BinaryOp::Sub),
        Some(TokenKind::Star) => Some(BinaryOp::Mul),
        Some(TokenKind::Slash) => Some(BinaryOp::Div),
        Some(TokenKind::Percent) => Some(BinaryOp::Mod),
        Some(TokenKind::EqEq) => Some(BinaryOp::Eq),
        Some(TokenKind::NotEq) => Some(BinaryOp::NotEq),
        Some(TokenKind::Lt) => Some(BinaryOp::Lt),
        Some(TokenKind::LtEq) => Some(BinaryOp::LtEq),
        Some(TokenKind::Gt) => Some(BinaryOp::Gt),
        Some(TokenKind::GtEq) => Some(BinaryOp::GtEq),
        Some(TokenKind::AndAnd) => Some(BinaryOp::And),
        Some(TokenKind::PipePipe) => Some(BinaryOp::Or),
        _ => None,
    }
}
