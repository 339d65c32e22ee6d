mod visit;

use crate::position::{HasSpan, Span, Spanned};
use crate::symbol::Symbol;

pub use visit::{AstRecurse, DefaultVisitor, Visitor};

macro_rules! impl_has_span {
    (|&$s:ident: $type:ty| $body:expr) => {
        impl HasSpan for $type {
            fn span(&$s) -> &Span {
                $body
            }
        }
    };

    ($type:ty) => {
        impl HasSpan for $type {
            fn span(&self) -> &Span {
                &self.span
            }
        }
    };
}

/// Implemented by the nodes that receive an inferred type during semantic analysis.
pub trait HasTy {
    /// The inferred type, or `None` if the node has not been checked yet.
    fn ty(&self) -> Option<Symbol>;
}

macro_rules! impl_has_ty {
    ($( $type:ty ),+ $(,)?) => {
        $(
            impl HasTy for $type {
                fn ty(&self) -> Option<Symbol> {
                    self.ty
                }
            }
        )+
    };
}

macro_rules! define_op_kind {
    ($name:ident { $( $op:ident => $text:literal, )+ }) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
        pub enum $name {
            $( $op, )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$op => $text, )+
                }
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Program {
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Class {
    pub name: TyName,
    /// `None` if the class has no `inherits` clause, in which case it inherits from `Object`.
    pub inherits: Option<TyName>,
    pub features: Vec<Feature>,
    /// The interned path of the file the class is declared in.
    pub file: Symbol,
    pub span: Span,
}

impl_has_span!(Class);

impl Class {
    pub fn parent(&self) -> Symbol {
        self.inherits
            .as_ref()
            .map(TyName::sym)
            .unwrap_or(Symbol::OBJECT)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.features.iter().filter_map(|feature| match feature {
            Feature::Method(method) => Some(method),
            Feature::Attribute(_) => None,
        })
    }
}

/// An identifier occurrence.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Name(pub Spanned<Symbol>);

impl_has_span!(|&self: Name| &self.0.span);

impl Name {
    pub fn new(sym: Symbol, span: Span) -> Self {
        Self(Spanned { value: sym, span })
    }

    pub fn sym(&self) -> Symbol {
        self.0.value
    }
}

/// A type name occurrence.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TyName(pub Name);

impl_has_span!(|&self: TyName| self.0.span());

impl TyName {
    pub fn new(sym: Symbol, span: Span) -> Self {
        Self(Name::new(sym, span))
    }

    pub fn sym(&self) -> Symbol {
        self.0.sym()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Feature {
    Method(Method),
    Attribute(Attribute),
}

impl HasSpan for Feature {
    fn span(&self) -> &Span {
        match self {
            Self::Method(method) => method.span(),
            Self::Attribute(attr) => attr.span(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Method {
    pub name: Name,
    pub params: Vec<Formal>,
    pub return_ty: TyName,
    pub body: Box<Expr>,
    pub span: Span,
}

impl_has_span!(Method);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Formal {
    pub name: Name,
    pub ty_name: TyName,
    pub span: Span,
}

impl_has_span!(Formal);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Attribute(pub Binding);

impl_has_span!(|&self: Attribute| &self.0.span);

/// A name bound to a declared type with an optional initializer.
///
/// Used by attributes and `let` expressions.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Binding {
    pub name: Name,
    pub ty_name: TyName,
    pub init: Option<Box<Expr>>,
    pub span: Span,
}

impl_has_span!(Binding);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Expr {
    Assignment(Assignment),
    Call(Call),
    If(If),
    While(While),
    Block(Block),
    Let(Let),
    Case(Case),
    New(New),
    BinOp(BinOpExpr),
    UnOp(UnOpExpr),
    Name(NameExpr),
    Int(IntLit),
    String(StringLit),
    Bool(BoolLit),
}

macro_rules! for_each_expr {
    ($self:expr, $expr:ident => $body:expr) => {
        match $self {
            Expr::Assignment($expr) => $body,
            Expr::Call($expr) => $body,
            Expr::If($expr) => $body,
            Expr::While($expr) => $body,
            Expr::Block($expr) => $body,
            Expr::Let($expr) => $body,
            Expr::Case($expr) => $body,
            Expr::New($expr) => $body,
            Expr::BinOp($expr) => $body,
            Expr::UnOp($expr) => $body,
            Expr::Name($expr) => $body,
            Expr::Int($expr) => $body,
            Expr::String($expr) => $body,
            Expr::Bool($expr) => $body,
        }
    };
}

impl HasSpan for Expr {
    fn span(&self) -> &Span {
        for_each_expr!(self, expr => expr.span())
    }
}

impl HasTy for Expr {
    fn ty(&self) -> Option<Symbol> {
        for_each_expr!(self, expr => expr.ty)
    }
}

impl Expr {
    /// Records the inferred type of the expression.
    ///
    /// Each node is annotated exactly once.
    pub fn set_ty(&mut self, ty: Symbol) {
        let slot = for_each_expr!(self, expr => &mut expr.ty);
        debug_assert!(slot.is_none(), "the expression has already been annotated");
        *slot = Some(ty);
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Assignment {
    pub name: Name,
    pub expr: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(Assignment);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Call {
    pub receiver: Receiver,
    pub method: Name,
    pub args: Vec<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(Call);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Receiver {
    /// The implicit `self` receiver: `m(...)`.
    SelfType,
    /// `e.m(...)`
    Dynamic(Box<Expr>),
    /// `e@T.m(...)`
    Static { object: Box<Expr>, ty_name: TyName },
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct If {
    pub antecedent: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternative: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(If);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct While {
    pub condition: Box<Expr>,
    pub body: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(While);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Block {
    pub body: Vec<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(Block);

/// A single-binding `let`. The parser desugars `let a, b in e` into nested lets.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Let {
    pub binding: Binding,
    pub expr: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(Let);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Case {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<CaseArm>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(Case);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CaseArm {
    pub name: Name,
    pub ty_name: TyName,
    pub expr: Box<Expr>,
    pub span: Span,
}

impl_has_span!(CaseArm);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct New {
    pub ty_name: TyName,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(New);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BinOpExpr {
    pub op: BinOpKind,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(BinOpExpr);

define_op_kind!(BinOpKind {
    Add => "+",
    Subtract => "-",
    Multiply => "*",
    Divide => "/",
    LessThan => "<",
    LessEquals => "<=",
    Equals => "=",
});

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UnOpExpr {
    pub op: UnOpKind,
    pub expr: Box<Expr>,
    pub span: Span,
    pub ty: Option<Symbol>,
}

impl_has_span!(UnOpExpr);

define_op_kind!(UnOpKind {
    IsVoid => "isvoid",
    Complement => "~",
    Not => "not",
});

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NameExpr {
    pub name: Name,
    pub ty: Option<Symbol>,
}

impl_has_span!(|&self: NameExpr| self.name.span());

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct IntLit {
    pub value: Spanned<i32>,
    pub ty: Option<Symbol>,
}

impl_has_span!(|&self: IntLit| &self.value.span);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct StringLit {
    pub value: Spanned<String>,
    pub ty: Option<Symbol>,
}

impl_has_span!(|&self: StringLit| &self.value.span);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BoolLit {
    pub value: Spanned<bool>,
    pub ty: Option<Symbol>,
}

impl_has_span!(|&self: BoolLit| &self.value.span);

impl_has_ty!(
    Assignment, Call, If, While, Block, Let, Case, New, BinOpExpr, UnOpExpr, NameExpr, IntLit,
    StringLit, BoolLit,
);
