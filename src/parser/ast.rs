use crate::span::Spanned;

#[derive(Debug, Clone)]
pub struct Program {
    pub items: Vec<Spanned<Stmt>>,
}

/// Whether a composite declaration produces a constructor binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `structure`: instantiable, publishes a constructor.
    Structure,
    /// `type`: a named structural interface, usable as a trait.
    Type,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Structure => "structure",
            DeclKind::Type => "type",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<String>>,
    pub traits: Vec<Spanned<TypeExpr>>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub default: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<String>>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeExpr>,
}

#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `Number`, `Box<Number>`, or a generic parameter `T`.
    Named {
        name: Spanned<String>,
        type_args: Vec<Spanned<TypeExpr>>,
    },
    /// `Function<T>(T, Number) -> T`
    Fn {
        type_params: Vec<Spanned<String>>,
        params: Vec<Spanned<TypeExpr>>,
        return_type: Option<Box<Spanned<TypeExpr>>>,
    },
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    TypeDecl(TypeDecl),
    Function(Function),
    Let {
        name: Spanned<String>,
        ty: Option<Spanned<TypeExpr>>,
        value: Spanned<Expr>,
        is_const: bool,
    },
    Assign {
        target: Spanned<String>,
        value: Spanned<Expr>,
    },
    Return(Option<Spanned<Expr>>),
    While {
        condition: Spanned<Expr>,
        body: Spanned<Block>,
    },
    If {
        condition: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Option<Spanned<Block>>,
    },
    Break,
    Continue,
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    Ident(String),
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    FieldAccess {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
}
