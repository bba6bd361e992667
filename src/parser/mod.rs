pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::is_keyword;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
    file_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self { tokens, source, pos: 0, file_id: 0 }
    }

    pub fn with_file_id(mut self, file_id: u32) -> Self {
        self.file_id = file_id;
        self
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::with_file(start, end, self.file_id)
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos + offset)
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(&t.node) == std::mem::discriminant(expected))
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    /// Consume the next token if it matches `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected) => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                let name = self.source[tok.span.start..tok.span.end].to_string();
                self.pos += 1;
                Ok(Spanned::new(name, tok.span))
            }
            Some(tok) if is_keyword(&self.source[tok.span.start..tok.span.end]) => Err(CompileError::syntax(
                format!("'{}' is a reserved word and cannot be used as a name", &self.source[tok.span.start..tok.span.end]),
                tok.span,
            )),
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            self.span(last.span.end, last.span.end)
        } else {
            self.span(0, 0)
        }
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            items.push(self.parse_stmt()?);
        }
        Ok(Program { items })
    }

    fn parse_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => return Err(CompileError::syntax("expected statement, found end of file", self.eof_span())),
        };
        let start = tok.span.start;

        let stmt = match &tok.node {
            Token::Structure | Token::Type => {
                let decl = self.parse_type_decl()?;
                Stmt::TypeDecl(decl)
            }
            Token::Function => Stmt::Function(self.parse_function()?),
            Token::Let | Token::Const => {
                let is_const = matches!(tok.node, Token::Const);
                self.advance();
                let name = self.expect_ident()?;
                let ty = if self.eat(&Token::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                self.expect(&Token::Eq)?;
                let value = self.parse_expr()?;
                Stmt::Let { name, ty, value, is_const }
            }
            Token::Return => {
                self.advance();
                let value = if self.starts_expr() { Some(self.parse_expr()?) } else { None };
                Stmt::Return(value)
            }
            Token::While => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                Stmt::While { condition, body }
            }
            Token::If => self.parse_if()?,
            Token::Break => {
                self.advance();
                Stmt::Break
            }
            Token::Continue => {
                self.advance();
                Stmt::Continue
            }
            Token::Ident if self.peek_at(1).is_some_and(|t| matches!(t.node, Token::Eq)) => {
                let target = self.expect_ident()?;
                self.advance(); // consume '='
                let value = self.parse_expr()?;
                Stmt::Assign { target, value }
            }
            _ => Stmt::Expr(self.parse_expr()?),
        };

        let end = self.prev_end();
        self.eat(&Token::Semicolon);
        Ok(Spanned::new(stmt, self.span(start, end)))
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.expect(&Token::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                // `else if` desugars into an else block holding a single if statement
                let start = self.peek().map_or(0, |t| t.span.start);
                let nested = self.parse_if()?;
                let span = self.span(start, self.prev_end());
                Some(Spanned::new(Block { stmts: vec![Spanned::new(nested, span)] }, span))
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, then_block, else_block })
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, CompileError> {
        let kind = if self.eat(&Token::Structure) {
            DeclKind::Structure
        } else {
            self.expect(&Token::Type)?;
            DeclKind::Type
        };
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        let mut traits = Vec::new();
        if self.eat(&Token::Is) {
            traits.push(self.parse_type()?);
            while self.eat(&Token::Comma) {
                traits.push(self.parse_type()?);
            }
        }

        self.expect(&Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) {
            let fname = self.expect_ident()?;
            let ty = if self.eat(&Token::Colon) { Some(self.parse_type()?) } else { None };
            let default = if self.eat(&Token::Eq) { Some(self.parse_expr()?) } else { None };
            if ty.is_none() && default.is_none() && !self.check(&Token::RBrace) && !self.check(&Token::Comma) && !self.check(&Token::Semicolon) {
                let tok = self.peek().map_or_else(|| self.eof_span(), |t| t.span);
                return Err(CompileError::syntax(
                    format!("expected ':' or '=' after field '{}'", fname.node),
                    tok,
                ));
            }
            fields.push(FieldDecl { name: fname, ty, default });
            if !self.eat(&Token::Comma) {
                self.eat(&Token::Semicolon);
            }
        }
        self.expect(&Token::RBrace)?;

        Ok(TypeDecl { kind, name, type_params, traits, fields })
    }

    fn parse_function(&mut self) -> Result<Function, CompileError> {
        self.expect(&Token::Function)?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            if !params.is_empty() {
                self.expect(&Token::Comma)?;
            }
            let pname = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            let pty = self.parse_type()?;
            params.push(Param { name: pname, ty: pty });
        }
        self.expect(&Token::RParen)?;
        let return_type = if self.eat(&Token::Arrow) { Some(self.parse_type()?) } else { None };
        let body = self.parse_block()?;
        Ok(Function { name, type_params, params, return_type, body })
    }

    fn parse_block(&mut self) -> Result<Spanned<Block>, CompileError> {
        let start = self.expect(&Token::LBrace)?.start;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("expected '}', found end of file", self.eof_span()));
            }
            stmts.push(self.parse_stmt()?);
        }
        let end = self.expect(&Token::RBrace)?.end;
        Ok(Spanned::new(Block { stmts }, self.span(start, end)))
    }

    /// Parse optional type parameters: `<T>`, `<A, B>`, or empty.
    fn parse_type_params(&mut self) -> Result<Vec<Spanned<String>>, CompileError> {
        let mut params = Vec::new();
        if self.eat(&Token::Lt) {
            while !self.check(&Token::Gt) {
                if !params.is_empty() {
                    self.expect(&Token::Comma)?;
                }
                params.push(self.expect_ident()?);
            }
            self.expect(&Token::Gt)?;
            if params.is_empty() {
                return Err(CompileError::syntax("expected at least one type parameter", self.span(self.prev_end(), self.prev_end())));
            }
        }
        Ok(params)
    }

    pub fn parse_type(&mut self) -> Result<Spanned<TypeExpr>, CompileError> {
        let name = self.expect_ident()?;
        let start = name.span.start;

        if name.node == "Function" && (self.check(&Token::LParen) || self.check(&Token::Lt)) {
            let type_params = self.parse_type_params()?;
            self.expect(&Token::LParen)?;
            let mut params = Vec::new();
            while !self.check(&Token::RParen) {
                if !params.is_empty() {
                    self.expect(&Token::Comma)?;
                }
                params.push(self.parse_type()?);
            }
            self.expect(&Token::RParen)?;
            let return_type = if self.eat(&Token::Arrow) {
                Some(Box::new(self.parse_type()?))
            } else {
                None
            };
            let end = self.prev_end();
            return Ok(Spanned::new(TypeExpr::Fn { type_params, params, return_type }, self.span(start, end)));
        }

        let mut type_args = Vec::new();
        if self.eat(&Token::Lt) {
            while !self.check(&Token::Gt) {
                if !type_args.is_empty() {
                    self.expect(&Token::Comma)?;
                }
                type_args.push(self.parse_type()?);
            }
            self.expect(&Token::Gt)?;
        }
        let end = self.prev_end();
        Ok(Spanned::new(TypeExpr::Named { name, type_args }, self.span(start, end)))
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.node),
            Some(Token::NumberLit(_) | Token::StringLit(_) | Token::True | Token::False | Token::Ident | Token::LParen)
        )
    }

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                while !self.check(&Token::RParen) {
                    if !args.is_empty() {
                        self.expect(&Token::Comma)?;
                    }
                    args.push(self.parse_expr()?);
                }
                let end = self.expect(&Token::RParen)?.end;
                let span = self.span(expr.span.start, end);
                expr = Spanned::new(Expr::Call { callee: Box::new(expr), args }, span);
            } else if self.eat(&Token::Dot) {
                let field = self.expect_ident()?;
                let span = self.span(expr.span.start, field.span.end);
                expr = Spanned::new(Expr::FieldAccess { object: Box::new(expr), field }, span);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let tok = match self.advance() {
            Some(tok) => tok.clone(),
            None => return Err(CompileError::syntax("expected expression, found end of file", self.eof_span())),
        };
        let expr = match tok.node {
            Token::NumberLit(n) => Expr::NumberLit(n),
            Token::StringLit(s) => Expr::StringLit(s),
            Token::True => Expr::BoolLit(true),
            Token::False => Expr::BoolLit(false),
            Token::Ident => Expr::Ident(self.source[tok.span.start..tok.span.end].to_string()),
            Token::LParen => {
                let inner = self.parse_expr()?;
                let end = self.expect(&Token::RParen)?.end;
                return Ok(Spanned::new(inner.node, self.span(tok.span.start, end)));
            }
            other => {
                return Err(CompileError::syntax(format!("expected expression, found {other}"), tok.span));
            }
        };
        Ok(Spanned::new(expr, tok.span))
    }
}

/// Lex and parse a complete source unit.
pub fn parse_source(source: &str) -> Result<Program, CompileError> {
    parse_file(source, 0)
}

/// Like [`parse_source`], tagging every span with `file_id`.
pub fn parse_file(source: &str, file_id: u32) -> Result<Program, CompileError> {
    let tokens = crate::lexer::lex_file(source, file_id)?;
    let mut parser = Parser::new(&tokens, source).with_file_id(file_id);
    parser.parse_program()
}
