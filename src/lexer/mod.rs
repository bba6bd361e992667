pub mod token;
pub use token::is_keyword;

use logos::Logos;
use crate::span::{Span, Spanned};
use crate::diagnostics::CompileError;
use token::Token;

pub fn lex(source: &str) -> Result<Vec<Spanned<Token>>, CompileError> {
    lex_file(source, 0)
}

pub fn lex_file(source: &str, file_id: u32) -> Result<Vec<Spanned<Token>>, CompileError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(Token::Comment) => continue,
            Ok(tok) => tokens.push(Spanned::new(tok, Span::with_file(span.start, span.end, file_id))),
            Err(()) => {
                return Err(CompileError::syntax(
                    format!("unexpected character '{}'", &source[span.start..span.end]),
                    Span::with_file(span.start, span.end, file_id),
                ));
            }
        }
    }

    Ok(tokens)
}
