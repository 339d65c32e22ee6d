#![allow(dead_code)]

use std::cell::{Cell, Ref, RefCell};

use tracing_subscriber::EnvFilter;

use semant::analysis::{self, ErrorKind, SemantError, SemantOutcome};
use semant::ast::{
    Assignment, Attribute, BinOpExpr, BinOpKind, Binding, Block, BoolLit, Call, Case, CaseArm,
    Class, Expr, Feature, Formal, HasTy, If, IntLit, Let, Method, Name, NameExpr, New, Program,
    Receiver, StringLit, TyName, UnOpExpr, UnOpKind, While,
};
use semant::config::AnalysisConfig;
use semant::errors::{Diagnostic, Diagnostics, Level};
use semant::position::{Span, Spanned};
use semant::symbol::{Interner, Symbol};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SEMANT_LOG"))
        .with_test_writer()
        .try_init();
}

/// Builds syntax trees by hand, the way the parser would.
///
/// Every node gets a span on the current line (see [`AstBuilder::at`]).
pub struct AstBuilder {
    interner: RefCell<Interner>,
    file: Symbol,
    line: Cell<usize>,
}

impl AstBuilder {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let file = interner.intern("test.cl");

        Self {
            interner: RefCell::new(interner),
            file,
            line: Cell::new(1),
        }
    }

    /// Sets the line of the nodes built afterwards.
    pub fn at(&self, line: usize) -> &Self {
        self.line.set(line);

        self
    }

    pub fn sym(&self, name: &str) -> Symbol {
        self.interner.borrow_mut().intern(name)
    }

    pub fn interner(&self) -> Ref<'_, Interner> {
        self.interner.borrow()
    }

    pub fn text(&self, sym: Symbol) -> String {
        self.interner().resolve(sym).to_owned()
    }

    fn span(&self) -> Span {
        Span::at_line(self.line.get())
    }

    fn name_node(&self, name: &str) -> Name {
        Name::new(self.sym(name), self.span())
    }

    fn ty_name(&self, name: &str) -> TyName {
        TyName::new(self.sym(name), self.span())
    }

    pub fn program(&self, classes: Vec<Class>) -> Program {
        Program { classes }
    }

    pub fn class(&self, name: &str, parent: Option<&str>, features: Vec<Feature>) -> Class {
        Class {
            name: self.ty_name(name),
            inherits: parent.map(|parent| self.ty_name(parent)),
            features,
            file: self.file,
            span: self.span(),
        }
    }

    /// `class Main { main(): Object { body }; };`
    pub fn main_with(&self, body: Expr) -> Class {
        self.class(
            "Main",
            None,
            vec![self.method("main", &[], "Object", body)],
        )
    }

    /// `class Main { main(): Object { 0 }; };`
    pub fn main_class(&self) -> Class {
        self.main_with(self.int(0))
    }

    pub fn method(&self, name: &str, params: &[(&str, &str)], ret: &str, body: Expr) -> Feature {
        Feature::Method(Method {
            name: self.name_node(name),
            params: params
                .iter()
                .map(|&(name, ty)| Formal {
                    name: self.name_node(name),
                    ty_name: self.ty_name(ty),
                    span: self.span(),
                })
                .collect(),
            return_ty: self.ty_name(ret),
            body: Box::new(body),
            span: self.span(),
        })
    }

    pub fn attr(&self, name: &str, ty: &str, init: Option<Expr>) -> Feature {
        Feature::Attribute(Attribute(self.binding(name, ty, init)))
    }

    fn binding(&self, name: &str, ty: &str, init: Option<Expr>) -> Binding {
        Binding {
            name: self.name_node(name),
            ty_name: self.ty_name(ty),
            init: init.map(Box::new),
            span: self.span(),
        }
    }

    pub fn int(&self, value: i32) -> Expr {
        Expr::Int(IntLit {
            value: Spanned {
                value,
                span: self.span(),
            },
            ty: None,
        })
    }

    pub fn string(&self, value: &str) -> Expr {
        Expr::String(StringLit {
            value: Spanned {
                value: value.to_owned(),
                span: self.span(),
            },
            ty: None,
        })
    }

    pub fn bool(&self, value: bool) -> Expr {
        Expr::Bool(BoolLit {
            value: Spanned {
                value,
                span: self.span(),
            },
            ty: None,
        })
    }

    pub fn name(&self, name: &str) -> Expr {
        Expr::Name(NameExpr {
            name: self.name_node(name),
            ty: None,
        })
    }

    pub fn assign(&self, name: &str, expr: Expr) -> Expr {
        Expr::Assignment(Assignment {
            name: self.name_node(name),
            expr: Box::new(expr),
            span: self.span(),
            ty: None,
        })
    }

    pub fn bin_op(&self, op: BinOpKind, lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinOp(BinOpExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: self.span(),
            ty: None,
        })
    }

    pub fn un_op(&self, op: UnOpKind, expr: Expr) -> Expr {
        Expr::UnOp(UnOpExpr {
            op,
            expr: Box::new(expr),
            span: self.span(),
            ty: None,
        })
    }

    pub fn if_(&self, antecedent: Expr, consequent: Expr, alternative: Expr) -> Expr {
        Expr::If(If {
            antecedent: Box::new(antecedent),
            consequent: Box::new(consequent),
            alternative: Box::new(alternative),
            span: self.span(),
            ty: None,
        })
    }

    pub fn while_(&self, condition: Expr, body: Expr) -> Expr {
        Expr::While(While {
            condition: Box::new(condition),
            body: Box::new(body),
            span: self.span(),
            ty: None,
        })
    }

    pub fn block(&self, body: Vec<Expr>) -> Expr {
        Expr::Block(Block {
            body,
            span: self.span(),
            ty: None,
        })
    }

    pub fn let_(&self, name: &str, ty: &str, init: Option<Expr>, expr: Expr) -> Expr {
        Expr::Let(Let {
            binding: self.binding(name, ty, init),
            expr: Box::new(expr),
            span: self.span(),
            ty: None,
        })
    }

    pub fn case(&self, scrutinee: Expr, arms: Vec<(&str, &str, Expr)>) -> Expr {
        Expr::Case(Case {
            scrutinee: Box::new(scrutinee),
            arms: arms
                .into_iter()
                .map(|(name, ty, expr)| CaseArm {
                    name: self.name_node(name),
                    ty_name: self.ty_name(ty),
                    expr: Box::new(expr),
                    span: self.span(),
                })
                .collect(),
            span: self.span(),
            ty: None,
        })
    }

    pub fn new_(&self, ty: &str) -> Expr {
        Expr::New(New {
            ty_name: self.ty_name(ty),
            span: self.span(),
            ty: None,
        })
    }

    fn call(&self, receiver: Receiver, method: &str, args: Vec<Expr>) -> Expr {
        Expr::Call(Call {
            receiver,
            method: self.name_node(method),
            args,
            span: self.span(),
            ty: None,
        })
    }

    /// `m(args)`
    pub fn self_call(&self, method: &str, args: Vec<Expr>) -> Expr {
        self.call(Receiver::SelfType, method, args)
    }

    /// `object.m(args)`
    pub fn dispatch(&self, object: Expr, method: &str, args: Vec<Expr>) -> Expr {
        self.call(Receiver::Dynamic(Box::new(object)), method, args)
    }

    /// `object@ty.m(args)`
    pub fn static_dispatch(&self, object: Expr, ty: &str, method: &str, args: Vec<Expr>) -> Expr {
        self.call(
            Receiver::Static {
                object: Box::new(object),
                ty_name: self.ty_name(ty),
            },
            method,
            args,
        )
    }

    pub fn find_class<'p>(&self, program: &'p Program, name: &str) -> &'p Class {
        let sym = self.sym(name);

        program
            .classes
            .iter()
            .find(|class| class.name.sym() == sym)
            .unwrap_or_else(|| panic!("no class named {}", name))
    }

    pub fn method_body<'p>(&self, program: &'p Program, class: &str, method: &str) -> &'p Expr {
        let sym = self.sym(method);

        self.find_class(program, class)
            .methods()
            .find(|m| m.name.sym() == sym)
            .map(|m| &*m.body)
            .unwrap_or_else(|| panic!("no method named {}.{}", class, method))
    }

    /// The inferred type of `expr` as text.
    pub fn ty_of(&self, expr: &Expr) -> Option<String> {
        expr.ty().map(|ty| self.text(ty))
    }

    pub fn analyze(&self, program: &mut Program) -> Analysis {
        self.analyze_with(&AnalysisConfig::default(), program)
    }

    pub fn analyze_with(&self, config: &AnalysisConfig, program: &mut Program) -> Analysis {
        init_tracing();

        let interner = self.interner();
        let mut diagnostics = Diagnostics::new();
        let outcome = analysis::check_program(&mut diagnostics, &interner, config, program);

        Analysis {
            outcome,
            diagnostics: diagnostics.into_vec(),
        }
    }
}

pub struct Analysis {
    pub outcome: SemantOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn errors(&self) -> Vec<&SemantError> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == Level::Error)
            .map(|diagnostic| {
                diagnostic
                    .source_as::<SemantError>()
                    .expect("every error is built from a SemantError")
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&SemantError> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == Level::Warn)
            .filter_map(|diagnostic| diagnostic.source_as::<SemantError>())
            .collect()
    }

    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.errors().into_iter().map(SemantError::kind).collect()
    }

    /// The errors rendered the way they are reported.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == Level::Error)
            .map(ToString::to_string)
            .collect()
    }

    pub fn is_passed(&self) -> bool {
        self.outcome.is_passed()
    }
}
