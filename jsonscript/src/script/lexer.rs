//!
//! Lexer - Method Body Tokenization
//!
//! Tokenizes the body of one method. The parser consumes the resulting
//! token stream to build the body AST.
//!
//! Key design decisions:
//! - Identifiers and string literals are interned via lasso::Spur; one
//!   interner is shared by every body of an assembly
//! - Whitespace and comments are filtered out (no trivia in output)
//! - Unrecognized characters and unterminated strings become Error tokens,
//!   which the parser reports as syntax errors
//!
//! Token categories:
//! - Keywords: var, return, if, else, while, throw, true, false, null, this
//! - Identifiers: locals, parameters, method and type names
//! - Literals: integers, floats, strings
//! - Operators and delimiters
//!

use lasso::{Rodeo, Spur};
use memchr::{memchr, memchr2};

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub symbol: Option<Spur>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            symbol: None,
        }
    }

    pub fn with_symbol(kind: TokenKind, span: Span, symbol: Spur) -> Self {
        Self {
            kind,
            span,
            symbol: Some(symbol),
        }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    IntLit,
    FloatLit,
    StringLit,

    Keyword(Keyword),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,

    AndAnd,
    PipePipe,

    Dot,
    Comma,
    Semicolon,

    LParen,
    RParen,
    LBrace,
    RBrace,

    Whitespace,
    Newline,
    Comment,

    Error,
    Eof,
}

impl TokenKind {
    /// How the token reads in an error message.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "floating-point literal",
            TokenKind::StringLit => "string literal",
            TokenKind::Keyword(kw) => kw.as_str(),
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Whitespace | TokenKind::Newline => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Var,
    Return,
    If,
    Else,
    While,
    Throw,
    True,
    False,
    Null,
    This,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Var => "'var'",
            Keyword::Return => "'return'",
            Keyword::If => "'if'",
            Keyword::Else => "'else'",
            Keyword::While => "'while'",
            Keyword::Throw => "'throw'",
            Keyword::True => "'true'",
            Keyword::False => "'false'",
            Keyword::Null => "'null'",
            Keyword::This => "'this'",
        }
    }
}

pub fn tokenize(source: &str, interner: &mut Rodeo) -> Vec<Token> {
    let mut lexer = Lexer::new(source, interner);
    lexer.tokenize_all()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: &'a mut Rodeo,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, interner: &'a mut Rodeo) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_eof() {
            let token = self.next_token();
            if !token.is_trivia() {
                tokens.push(token);
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos as u32, self.pos as u32),
        ));

        tokens
    }

    #[inline(always)]
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline(always)]
    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline(always)]
    fn peek_byte2(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    #[inline(always)]
    fn advance_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Some(b)
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos as u32;

        let Some(b) = self.advance_byte() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match b {
            b' ' | b'\t' | b'\r' => {
                while matches!(self.peek_byte(), Some(b' ' | b'\t' | b'\r')) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }

            b'\n' => TokenKind::Newline,

            b'/' if self.peek_byte() == Some(b'/') => {
                match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos += offset,
                    None => self.pos = self.bytes.len(),
                }
                TokenKind::Comment
            }

            b'/' if self.peek_byte() == Some(b'*') => {
                self.pos += 1;
                loop {
                    match (self.peek_byte(), self.peek_byte2()) {
                        (Some(b'*'), Some(b'/')) => {
                            self.pos += 2;
                            break TokenKind::Comment;
                        }
                        (Some(_), _) => self.pos += 1,
                        (None, _) => break TokenKind::Error,
                    }
                }
            }

            b'+' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::PlusEq
            }
            b'+' => TokenKind::Plus,

            b'-' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::MinusEq
            }
            b'-' => TokenKind::Minus,

            b'*' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::StarEq
            }
            b'*' => TokenKind::Star,

            b'/' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::SlashEq
            }
            b'/' => TokenKind::Slash,

            b'%' => TokenKind::Percent,

            b'&' if self.peek_byte() == Some(b'&') => {
                self.pos += 1;
                TokenKind::AndAnd
            }

            b'|' if self.peek_byte() == Some(b'|') => {
                self.pos += 1;
                TokenKind::PipePipe
            }

            b'!' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::NotEq
            }
            b'!' => TokenKind::Bang,

            b'=' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::EqEq
            }
            b'=' => TokenKind::Eq,

            b'<' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::LtEq
            }
            b'<' => TokenKind::Lt,

            b'>' if self.peek_byte() == Some(b'=') => {
                self.pos += 1;
                TokenKind::GtEq
            }
            b'>' => TokenKind::Gt,

            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,

            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,

            b'"' => self.scan_string(),

            b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident_or_keyword(start),

            _ if b > 127 => {
                // Step back and consume the whole UTF-8 sequence
                self.pos -= 1;
                match self.source[self.pos..].chars().next() {
                    Some(c) if c.is_alphabetic() => self.scan_ident_or_keyword(start),
                    Some(c) => {
                        self.pos += c.len_utf8();
                        TokenKind::Error
                    }
                    None => TokenKind::Error,
                }
            }

            _ => TokenKind::Error,
        };

        let end = self.pos as u32;
        let span = Span::new(start, end);

        match kind {
            TokenKind::Ident => {
                let text = &self.source[start as usize..end as usize];
                let symbol = self.interner.get_or_intern(text);
                Token::with_symbol(kind, span, symbol)
            }
            TokenKind::StringLit => {
                let raw = &self.source[(start as usize + 1)..(end as usize - 1)];
                let symbol = if raw.contains('\\') {
                    self.interner.get_or_intern(unescape(raw))
                } else {
                    self.interner.get_or_intern(raw)
                };
                Token::with_symbol(kind, span, symbol)
            }
            _ => Token::new(kind, span),
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        loop {
            match memchr2(b'"', b'\\', &self.bytes[self.pos..]) {
                Some(offset) => {
                    // Strings may not span lines
                    if let Some(nl_offset) = memchr(b'\n', &self.bytes[self.pos..self.pos + offset]) {
                        self.pos += nl_offset;
                        return TokenKind::Error;
                    }
                    self.pos += offset;
                    if self.bytes[self.pos] == b'"' {
                        self.pos += 1;
                        return TokenKind::StringLit;
                    }
                    self.pos += 1;
                    if self.pos < self.bytes.len() {
                        self.pos += 1;
                    }
                }
                None => {
                    match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(nl_offset) => self.pos += nl_offset,
                        None => self.pos = self.bytes.len(),
                    }
                    return TokenKind::Error;
                }
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }

        if self.peek_byte() == Some(b'.') && matches!(self.peek_byte2(), Some(b'0'..=b'9')) {
            self.pos += 1;
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            return TokenKind::FloatLit;
        }

        TokenKind::IntLit
    }

    fn scan_ident_or_keyword(&mut self, start: u32) -> TokenKind {
        while let Some(c) = self.source[self.pos..].chars().next() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        match &self.source[start as usize..self.pos] {
            "var" => TokenKind::Keyword(Keyword::Var),
            "return" => TokenKind::Keyword(Keyword::Return),
            "if" => TokenKind::Keyword(Keyword::If),
            "else" => TokenKind::Keyword(Keyword::Else),
            "while" => TokenKind::Keyword(Keyword::While),
            "throw" => TokenKind::Keyword(Keyword::Throw),
            "true" => TokenKind::Keyword(Keyword::True),
            "false" => TokenKind::Keyword(Keyword::False),
            "null" => TokenKind::Keyword(Keyword::Null),
            "this" => TokenKind::Keyword(Keyword::This),
            _ => TokenKind::Ident,
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut interner = Rodeo::default();
        tokenize(source, &mut interner).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("+ - * / % == != < <= > >= && || ! += -= *= /="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::AndAnd,
                TokenKind::PipePipe,
                TokenKind::Bang,
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::StarEq,
                TokenKind::SlashEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_and_idents() {
        assert_eq!(
            kinds("var x return this Thread"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::Return),
                TokenKind::Keyword(Keyword::This),
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42 3.14 7.x"),
            vec![
                TokenKind::IntLit,
                TokenKind::FloatLit,
                TokenKind::IntLit,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let mut interner = Rodeo::default();
        let tokens = tokenize(r#""a\"b\n\\""#, &mut interner);
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        assert_eq!(interner.resolve(&tokens[0].symbol.unwrap()), "a\"b\n\\");
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert_eq!(kinds("\"abc\nx"), vec![TokenKind::Error, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_comments_are_filtered() {
        assert_eq!(
            kinds("x // note\n/* block */ y"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans_point_into_source() {
        let mut interner = Rodeo::default();
        let tokens = tokenize("Console.WriteLine(1);", &mut interner);
        assert_eq!(tokens[2].span, Span::new(8, 17));
        assert_eq!(interner.resolve(&tokens[2].symbol.unwrap()), "WriteLine");
    }
}
