use super::*;

pub trait AstRecurse {
    fn recurse<V: DefaultVisitor>(&self, visitor: &mut V);
}

macro_rules! define_visitor {
    ($( $type:ident { $( $name:ident ( $arg:ident : $ty:ty ) );+ $(;)? } )+) => {
        pub trait Visitor
        where
            Self: Sized,
        {
            type Output;

            $(
                $(
                    fn $name(&mut self, $arg: &$ty) -> Self::Output;
                )+
            )+
        }

        /// A visitor that walks the whole tree unless a method is overridden.
        pub trait DefaultVisitor
        where
            Self: Sized,
        {
            $( define_visitor!(@ $type { $( $name ( $arg : &$ty ) ); + } ); )+
        }

        impl<T> Visitor for T
        where
            T: DefaultVisitor,
        {
            type Output = ();

            $(
                $(
                    fn $name(&mut self, $arg: &$ty) {
                        <Self as DefaultVisitor>::$name(self, $arg);
                    }
                )+
            )+
        }
    };

    (@ NonTerminal { $( $name:ident ( $arg:ident : $ty:ty ) );+ }) => {
        $(
            fn $name(&mut self, $arg: $ty) {
                $arg.recurse(self);
            }
        )+
    };

    (@ Terminal { $( $name:ident ( $arg:ident : $ty:ty ) );+ }) => {
        $(
            #[allow(unused_variables)]
            fn $name(&mut self, $arg: $ty) {}
        )+
    };
}

macro_rules! impl_recurse {
    (|$s:ident: $type:ty, $visitor:ident| $body:expr) => {
        impl AstRecurse for $type {
            fn recurse<V: DefaultVisitor>(&$s, $visitor: &mut V) {
                $body;
            }
        }
    };
}

define_visitor! {
    NonTerminal {
        // statements
        visit_program(program: Program);
        visit_class(class: Class);
        visit_feature(feature: Feature);
        visit_method(method: Method);
        visit_attribute(attr: Attribute);

        // expr
        visit_expr(expr: Expr);
        visit_assignment(expr: Assignment);
        visit_call(expr: Call);
        visit_if(expr: If);
        visit_while(expr: While);
        visit_block(expr: Block);
        visit_let(expr: Let);
        visit_case(expr: Case);
        visit_new(expr: New);
        visit_bin_op(expr: BinOpExpr);
        visit_un_op(expr: UnOpExpr);
        visit_name_expr(expr: NameExpr);

        // neither stmt nor expr
        visit_formal(formal: Formal);
        visit_receiver(recv: Receiver);
        visit_case_arm(arm: CaseArm);
        visit_binding(binding: Binding);
    }

    Terminal {
        visit_name(name: Name);
        visit_ty_name(ty_name: TyName);
        visit_int_lit(expr: IntLit);
        visit_string_lit(expr: StringLit);
        visit_bool_lit(expr: BoolLit);
    }
}

impl_recurse!(|self: Program, visitor| for class in &self.classes {
    visitor.visit_class(class);
});

impl_recurse!(|self: Class, visitor| {
    visitor.visit_ty_name(&self.name);

    if let Some(inherits) = &self.inherits {
        visitor.visit_ty_name(inherits);
    }

    for feature in &self.features {
        visitor.visit_feature(feature);
    }
});

impl_recurse!(|self: Feature, visitor| match self {
    Feature::Method(method) => visitor.visit_method(method),
    Feature::Attribute(attr) => visitor.visit_attribute(attr),
});

impl_recurse!(|self: Method, visitor| {
    visitor.visit_name(&self.name);

    for param in &self.params {
        visitor.visit_formal(param);
    }

    visitor.visit_ty_name(&self.return_ty);
    visitor.visit_expr(&self.body);
});

impl_recurse!(|self: Formal, visitor| {
    visitor.visit_name(&self.name);
    visitor.visit_ty_name(&self.ty_name);
});

impl_recurse!(|self: Attribute, visitor| visitor.visit_binding(&self.0));

impl_recurse!(|self: Binding, visitor| {
    visitor.visit_name(&self.name);
    visitor.visit_ty_name(&self.ty_name);

    if let Some(expr) = &self.init {
        visitor.visit_expr(expr);
    }
});

impl_recurse!(|self: Expr, visitor| match self {
    Expr::Assignment(expr) => visitor.visit_assignment(expr),
    Expr::Call(expr) => visitor.visit_call(expr),
    Expr::If(expr) => visitor.visit_if(expr),
    Expr::While(expr) => visitor.visit_while(expr),
    Expr::Block(expr) => visitor.visit_block(expr),
    Expr::Let(expr) => visitor.visit_let(expr),
    Expr::Case(expr) => visitor.visit_case(expr),
    Expr::New(expr) => visitor.visit_new(expr),
    Expr::BinOp(expr) => visitor.visit_bin_op(expr),
    Expr::UnOp(expr) => visitor.visit_un_op(expr),
    Expr::Name(expr) => visitor.visit_name_expr(expr),
    Expr::Int(expr) => visitor.visit_int_lit(expr),
    Expr::String(expr) => visitor.visit_string_lit(expr),
    Expr::Bool(expr) => visitor.visit_bool_lit(expr),
});

impl_recurse!(|self: Assignment, visitor| {
    visitor.visit_name(&self.name);
    visitor.visit_expr(&self.expr);
});

impl_recurse!(|self: Call, visitor| {
    visitor.visit_receiver(&self.receiver);
    visitor.visit_name(&self.method);

    for arg in &self.args {
        visitor.visit_expr(arg);
    }
});

impl_recurse!(|self: Receiver, visitor| match self {
    Receiver::SelfType => {}
    Receiver::Dynamic(expr) => visitor.visit_expr(expr),

    Receiver::Static { object, ty_name } => {
        visitor.visit_expr(object);
        visitor.visit_ty_name(ty_name);
    }
});

impl_recurse!(|self: If, visitor| {
    visitor.visit_expr(&self.antecedent);
    visitor.visit_expr(&self.consequent);
    visitor.visit_expr(&self.alternative);
});

impl_recurse!(|self: While, visitor| {
    visitor.visit_expr(&self.condition);
    visitor.visit_expr(&self.body);
});

impl_recurse!(|self: Block, visitor| for expr in &self.body {
    visitor.visit_expr(expr);
});

impl_recurse!(|self: Let, visitor| {
    visitor.visit_binding(&self.binding);
    visitor.visit_expr(&self.expr);
});

impl_recurse!(|self: Case, visitor| {
    visitor.visit_expr(&self.scrutinee);

    for arm in &self.arms {
        visitor.visit_case_arm(arm);
    }
});

impl_recurse!(|self: CaseArm, visitor| {
    visitor.visit_name(&self.name);
    visitor.visit_ty_name(&self.ty_name);
    visitor.visit_expr(&self.expr);
});

impl_recurse!(|self: New, visitor| visitor.visit_ty_name(&self.ty_name));

impl_recurse!(|self: BinOpExpr, visitor| {
    visitor.visit_expr(&self.lhs);
    visitor.visit_expr(&self.rhs);
});

impl_recurse!(|self: UnOpExpr, visitor| visitor.visit_expr(&self.expr));

impl_recurse!(|self: NameExpr, visitor| visitor.visit_name(&self.name));
