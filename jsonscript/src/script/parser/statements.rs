///
/// Statement Parser
///
/// Parses statements using nom combinators. Every simple statement ends
/// with `;`, except that the last one in a body may stop at end of input.
///

use nom::InputTake;

use crate::script::ast::*;
use crate::script::lexer::{Keyword, TokenKind};
use crate::source::Spanned;

use super::combinators::*;
use super::expressions::parse_expression;
use super::input::TokenStream;

pub fn parse_statement(input: TokenStream) -> PResult<Statement> {
    match peek_token(input) {
        Some(TokenKind::Keyword(Keyword::Var)) => parse_var_stmt(input),
        Some(TokenKind::Keyword(Keyword::Return)) => parse_return_stmt(input),
        Some(TokenKind::Keyword(Keyword::Throw)) => parse_throw_stmt(input),
        Some(TokenKind::Keyword(Keyword::If)) => parse_if_stmt(input),
        Some(TokenKind::Keyword(Keyword::While)) => parse_while_stmt(input),
        Some(TokenKind::LBrace) => parse_block_stmt(input),
        Some(TokenKind::Ident) if is_typed_declaration(input) => parse_typed_var_stmt(input),
        Some(TokenKind::RBrace) | Some(TokenKind::Keyword(Keyword::Else)) => {
            fail(input, PErrorKind::ExpectedStatement)
        }
        _ => parse_expr_or_assign_stmt(input),
    }
}

/// `Type name =`, `Type name;` or `A.B.Type name ...`: a dotted name
/// followed directly by another name.
fn is_typed_declaration(input: TokenStream) -> bool {
    let mut i = 0;
    loop {
        if peek_nth(input, i) != Some(TokenKind::Ident) {
            return false;
        }
        match peek_nth(input, i + 1) {
            Some(TokenKind::Dot) => i += 2,
            Some(TokenKind::Ident) => {
                return matches!(
                    peek_nth(input, i + 2),
                    Some(TokenKind::Eq | TokenKind::Semicolon | TokenKind::Eof)
                );
            }
            _ => return false,
        }
    }
}

fn parse_var_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Var)(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(TokenKind::Eq)(input)?;
    let (input, init) = parse_expression(input)?;
    let span = start.span.merge(init.span());
    let (input, _) = statement_end(input)?;

    Ok((
        input,
        Statement::Var(VarStmt {
            name,
            ty: None,
            init: Some(init),
            span,
        }),
    ))
}

fn parse_typed_var_stmt(input: TokenStream) -> PResult<Statement> {
    let (mut input, first) = ident(input)?;
    let mut segments = vec![first];
    while check(TokenKind::Dot)(input) {
        let (rest, _) = token(TokenKind::Dot)(input)?;
        let (rest, segment) = ident(rest)?;
        segments.push(segment);
        input = rest;
    }
    let ty_span = segments
        .iter()
        .fold(first.span, |span, segment| span.merge(segment.span));

    let (input, name) = ident(input)?;
    let (input, init) = if check(TokenKind::Eq)(input) {
        let (input, _) = token(TokenKind::Eq)(input)?;
        let (input, expr) = parse_expression(input)?;
        (input, Some(expr))
    } else {
        (input, None)
    };
    let span = ty_span.merge(init.as_ref().map(|e| e.span()).unwrap_or(name.span));
    let (input, _) = statement_end(input)?;

    Ok((
        input,
        Statement::Var(VarStmt {
            name,
            ty: Some(TypeName {
                segments,
                span: ty_span,
            }),
            init,
            span,
        }),
    ))
}

fn parse_return_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Return)(input)?;

    let (input, value) = if check(TokenKind::Semicolon)(input) || is_eof(input) {
        (input, None)
    } else {
        let (input, expr) = parse_expression(input)?;
        (input, Some(expr))
    };

    let span = value
        .as_ref()
        .map(|v| start.span.merge(v.span()))
        .unwrap_or(start.span);
    let (input, _) = statement_end(input)?;

    Ok((input, Statement::Return(ReturnStmt { value, span })))
}

fn parse_throw_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::Throw)(input)?;
    let (input, value) = parse_expression(input)?;
    let span = start.span.merge(value.span());
    let (input, _) = statement_end(input)?;

    Ok((input, Statement::Throw(ThrowStmt { value, span })))
}

fn parse_if_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, if_stmt) = parse_if(input)?;
    Ok((input, Statement::If(if_stmt)))
}

fn parse_if(input: TokenStream) -> PResult<IfStmt> {
    let (input, start) = keyword(Keyword::If)(input)?;
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, condition) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;

    let (input, then_branch) = parse_block(input)?;

    let (input, else_branch) = if check_keyword(Keyword::Else)(input) {
        let (input, _) = keyword(Keyword::Else)(input)?;
        if check_keyword(Keyword::If)(input) {
            let (input, else_if) = nested(input, parse_if)?;
            (input, Some(ElseBranch::ElseIf(Box::new(else_if))))
        } else {
            let (input, else_block) = parse_block(input)?;
            (input, Some(ElseBranch::Else(else_block)))
        }
    } else {
        (input, None)
    };

    let end_span = else_branch
        .as_ref()
        .map(|e| match e {
            ElseBranch::ElseIf(i) => i.span,
            ElseBranch::Else(b) => b.span,
        })
        .unwrap_or(then_branch.span);

    Ok((
        input,
        IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.span.merge(end_span),
        },
    ))
}

fn parse_while_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, start) = keyword(Keyword::While)(input)?;
    let (input, _) = token(TokenKind::LParen)(input)?;
    let (input, condition) = parse_expression(input)?;
    let (input, _) = token(TokenKind::RParen)(input)?;
    let (input, body) = parse_block(input)?;
    let body_span = body.span;

    Ok((
        input,
        Statement::While(WhileStmt {
            condition,
            body,
            span: start.span.merge(body_span),
        }),
    ))
}

fn parse_block_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, block) = parse_block(input)?;
    Ok((input, Statement::Block(block)))
}

pub fn parse_block(input: TokenStream) -> PResult<BlockStmt> {
    nested(input, parse_block_inner)
}

fn parse_block_inner(input: TokenStream) -> PResult<BlockStmt> {
    let (input, start) = token(TokenKind::LBrace)(input)?;
    let mut statements = Vec::new();
    let mut input = input;

    while !check(TokenKind::RBrace)(input) && !is_eof(input) {
        let (new_input, stmt) = parse_statement(input)?;
        statements.push(stmt);
        input = new_input;
    }

    let (input, end) = token(TokenKind::RBrace)(input)?;

    Ok((
        input,
        BlockStmt {
            statements,
            span: start.span.merge(end.span),
        },
    ))
}

fn parse_expr_or_assign_stmt(input: TokenStream) -> PResult<Statement> {
    let (input, expr) = parse_expression(input)?;

    let assign_op = match peek_token(input) {
        Some(TokenKind::Eq) => Some(AssignOp::Assign),
        Some(TokenKind::PlusEq) => Some(AssignOp::AddAssign),
        Some(TokenKind::MinusEq) => Some(AssignOp::SubAssign),
        Some(TokenKind::StarEq) => Some(AssignOp::MulAssign),
        Some(TokenKind::SlashEq) => Some(AssignOp::DivAssign),
        _ => None,
    };

    if let Some(op) = assign_op {
        let (input, _) = input.take_split(1);
        let (input, value) = parse_expression(input)?;
        let (input, _) = statement_end(input)?;
        let span = expr.span().merge(value.span());

        Ok((
            input,
            Statement::Assign(AssignStmt {
                target: expr,
                op,
                value,
                span,
            }),
        ))
    } else {
        let (input, _) = statement_end(input)?;
        let span = expr.span();

        Ok((input, Statement::Expression(ExprStmt { expr, span })))
    }
}
