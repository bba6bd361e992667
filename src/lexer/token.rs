use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Keywords
    #[token("structure")]
    Structure,
    #[token("type")]
    Type,
    #[token("is")]
    Is,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("while")]
    While,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?", |lex| lex.slice().replace('_', "").parse::<f64>().ok())]
    NumberLit(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        let raw = &s[1..s.len()-1];
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some(other) => { result.push('\\'); result.push(other); }
                    None => result.push('\\'),
                }
            } else {
                result.push(c);
            }
        }
        Some(result)
    })]
    StringLit(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // Punctuation
    #[token("->")]
    Arrow,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    #[regex(r"//[^\n]*")]
    Comment,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Structure => write!(f, "'structure'"),
            Token::Type => write!(f, "'type'"),
            Token::Is => write!(f, "'is'"),
            Token::Let => write!(f, "'let'"),
            Token::Const => write!(f, "'const'"),
            Token::Function => write!(f, "'function'"),
            Token::Return => write!(f, "'return'"),
            Token::While => write!(f, "'while'"),
            Token::If => write!(f, "'if'"),
            Token::Else => write!(f, "'else'"),
            Token::Break => write!(f, "'break'"),
            Token::Continue => write!(f, "'continue'"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::NumberLit(n) => write!(f, "number {n}"),
            Token::StringLit(_) => write!(f, "string literal"),
            Token::Ident => write!(f, "identifier"),
            Token::Arrow => write!(f, "'->'"),
            Token::Eq => write!(f, "'='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
            Token::Dot => write!(f, "'.'"),
            Token::Comment => write!(f, "comment"),
        }
    }
}

/// Returns true if `name` is a reserved word and cannot be used as an identifier.
pub fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "structure" | "type" | "is" | "let" | "const" | "function" | "return"
            | "while" | "if" | "else" | "break" | "continue" | "true" | "false"
    )
}
