use tracing::{debug, trace, trace_span};

use crate::analysis::class_table::{ClassTable, SelfTypeAllowed};
use crate::analysis::error::{
    IllegalSelfTypePosition, MismatchContext, MismatchedTypes, SemantError,
};
use crate::analysis::location_of;
use crate::analysis::typectx::BindingMap;
use crate::ast::{
    Assignment, Attribute, BinOpExpr, BinOpKind, Block, Call, Case, Class, Expr, Feature, If,
    Let, Method, Name, NameExpr, New, Program, Receiver, TyName, UnOpExpr, UnOpKind, While,
};
use crate::config::{AnalysisConfig, StaticDispatchLookup};
use crate::errors::Diagnostics;
use crate::position::{HasSpan, Span};
use crate::symbol::{Interner, Symbol};

/// Type-checks the valid classes of a program against a frozen class table,
/// annotating every expression with its static type.
pub struct TypeChecker<'a, 'dia, 'emt> {
    diagnostics: &'dia mut Diagnostics<'emt>,
    interner: &'a Interner,
    config: &'a AnalysisConfig,
    table: &'a ClassTable,
}

impl<'a, 'dia, 'emt> TypeChecker<'a, 'dia, 'emt> {
    pub fn new(
        diagnostics: &'dia mut Diagnostics<'emt>,
        interner: &'a Interner,
        config: &'a AnalysisConfig,
        table: &'a ClassTable,
    ) -> Self {
        Self {
            diagnostics,
            interner,
            config,
            table,
        }
    }

    /// Checks every class declaration that made it into the class table.
    ///
    /// Duplicate declarations and excluded classes are skipped.
    pub fn check_program(&mut self, program: &mut Program) {
        for (idx, class) in program.classes.iter_mut().enumerate() {
            if self.table.declaration(class.name.sym()) == Some(idx) {
                self.check_class(class);
            } else {
                trace!(class = %self.interner.display(class.name.sym()), "skipping an excluded class");
            }
        }
    }

    pub fn check_class(&mut self, class: &mut Class) {
        let class_name = class.name.sym();
        let _span = trace_span!("check_class", class = %self.interner.display(class_name)).entered();

        let mut visitor = TypeVisitor {
            diagnostics: &mut *self.diagnostics,
            interner: self.interner,
            config: self.config,
            table: self.table,
            bindings: BindingMap::new(),
            class_name,
            file: class.file,
            depth: 0,
            depth_exceeded: false,
        };

        visitor.check_class(class);
    }
}

struct TypeVisitor<'a, 'd, 'emt> {
    diagnostics: &'d mut Diagnostics<'emt>,
    interner: &'a Interner,
    config: &'a AnalysisConfig,
    table: &'a ClassTable,
    bindings: BindingMap,
    class_name: Symbol,
    file: Symbol,
    depth: usize,
    depth_exceeded: bool,
}

impl TypeVisitor<'_, '_, '_> {
    fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.bindings.enter_scope();
        let result = f(self);
        self.bindings.leave_scope();

        result
    }

    fn emit(&mut self, span: &Span, error: SemantError) {
        self.diagnostics
            .error()
            .with_location(location_of(self.interner, self.file, span))
            .with_error(error)
            .emit();
    }

    fn warn(&mut self, span: &Span, error: SemantError) {
        self.diagnostics
            .warn()
            .with_location(location_of(self.interner, self.file, span))
            .with_error(error)
            .emit();
    }

    fn name(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_owned()
    }

    fn emit_mismatch(
        &mut self,
        span: &Span,
        context: MismatchContext,
        expected: Symbol,
        actual: Symbol,
    ) {
        let error = SemantError::MismatchedTypes(Box::new(MismatchedTypes {
            context,
            expected_ty: self.name(expected),
            actual_ty: self.name(actual),
        }));

        self.emit(span, error);
    }

    /// Substitutes the enclosing class for `SELF_TYPE`.
    fn reify_self_ty(&self, ty: Symbol) -> Symbol {
        if ty == Symbol::SELF_TYPE {
            self.class_name
        } else {
            ty
        }
    }

    /// `SELF_TYPE` on the expected side is only satisfied by `SELF_TYPE` itself.
    fn conforms(&self, actual: Symbol, expected: Symbol) -> bool {
        if actual == expected {
            return true;
        }

        if expected == Symbol::SELF_TYPE {
            return false;
        }

        self.table.is_subtype(self.reify_self_ty(actual), expected)
    }

    /// Resolves a type name occurring inside an expression, reporting unknown names.
    fn resolve_ty_name(&mut self, ty_name: &TyName, allow_self_ty: SelfTypeAllowed) -> Symbol {
        let sym = ty_name.sym();

        let error = match (sym, allow_self_ty) {
            (Symbol::SELF_TYPE, SelfTypeAllowed::Yes) => return sym,

            (Symbol::SELF_TYPE, SelfTypeAllowed::No(position)) => {
                SemantError::IllegalSelfType { position }
            }

            _ if self.table.is_valid(sym) => return sym,

            _ => SemantError::UnrecognizedTy {
                ty_name: self.name(sym),
            },
        };

        self.emit(ty_name.span(), error);

        Symbol::OBJECT
    }

    /// Resolves a type name of a declaration the class table has already reported on.
    fn declared_ty(&self, ty_name: &TyName, allow_self_ty: bool) -> Symbol {
        match ty_name.sym() {
            Symbol::SELF_TYPE if allow_self_ty => Symbol::SELF_TYPE,
            sym if sym != Symbol::SELF_TYPE && self.table.is_valid(sym) => sym,
            _ => Symbol::OBJECT,
        }
    }

    fn check_class(&mut self, class: &mut Class) {
        self.bindings.bind(Symbol::SELF, Symbol::SELF_TYPE);

        for (name, ty) in self.table.fields(self.class_name) {
            self.bindings.bind(name, ty);
        }

        for feature in &mut class.features {
            match feature {
                Feature::Method(method) => self.check_method(method),
                Feature::Attribute(attr) => self.check_attribute(attr),
            }
        }
    }

    fn check_method(&mut self, method: &mut Method) {
        let _span =
            trace_span!("check_method", method = %self.interner.display(method.name.sym())).entered();

        let return_ty = self.declared_ty(&method.return_ty, true);

        let body_ty = self.with_scope(|this| {
            for formal in &method.params {
                let name = formal.name.sym();

                if name != Symbol::SELF {
                    let ty = this.declared_ty(&formal.ty_name, false);
                    this.bindings.bind(name, ty);
                }
            }

            this.check_expr(&mut method.body)
        });

        if body_ty == Symbol::SELF_TYPE && return_ty == Symbol::SELF_TYPE {
            return;
        }

        if !self
            .table
            .is_subtype(self.reify_self_ty(body_ty), self.reify_self_ty(return_ty))
        {
            let span = method.body.span().clone();
            self.emit_mismatch(&span, MismatchContext::MethodReturn, return_ty, body_ty);
        }
    }

    fn check_attribute(&mut self, attr: &mut Attribute) {
        let binding = &mut attr.0;

        let Some(init) = &mut binding.init else {
            return;
        };

        let declared_ty = self.declared_ty(&binding.ty_name, true);
        let init_ty = self.check_expr(init);

        if !self.conforms(init_ty, declared_ty) {
            let span = init.span().clone();
            self.emit_mismatch(&span, MismatchContext::FieldInit, declared_ty, init_ty);
        }
    }

    fn check_expr(&mut self, expr: &mut Expr) -> Symbol {
        if self.depth >= self.config.max_expr_depth {
            if !self.depth_exceeded {
                self.depth_exceeded = true;
                let span = expr.span().clone();
                self.emit(
                    &span,
                    SemantError::NestingTooDeep {
                        limit: self.config.max_expr_depth,
                    },
                );
            }

            expr.set_ty(Symbol::OBJECT);

            return Symbol::OBJECT;
        }

        self.depth += 1;

        let ty = match expr {
            Expr::Assignment(expr) => self.check_assignment(expr),
            Expr::Call(expr) => self.check_call(expr),
            Expr::If(expr) => self.check_if(expr),
            Expr::While(expr) => self.check_while(expr),
            Expr::Block(expr) => self.check_block(expr),
            Expr::Let(expr) => self.check_let(expr),
            Expr::Case(expr) => self.check_case(expr),
            Expr::New(expr) => self.check_new(expr),
            Expr::BinOp(expr) => self.check_bin_op(expr),
            Expr::UnOp(expr) => self.check_un_op(expr),
            Expr::Name(expr) => self.check_name_expr(expr),
            Expr::Int(_) => Symbol::INT,
            Expr::String(_) => Symbol::STRING,
            Expr::Bool(_) => Symbol::BOOL,
        };

        self.depth -= 1;
        expr.set_ty(ty);

        ty
    }

    fn check_assignment(&mut self, expr: &mut Assignment) -> Symbol {
        let rhs_ty = self.check_expr(&mut expr.expr);
        let name = expr.name.sym();

        if name == Symbol::SELF {
            self.emit(expr.name.span(), SemantError::IllegalSelf);

            return rhs_ty;
        }

        match self.bindings.resolve(name) {
            None => {
                let error = SemantError::UnrecognizedAssignee {
                    name: self.name(name),
                };
                self.emit(expr.name.span(), error);
            }

            Some(declared_ty) if !self.conforms(rhs_ty, declared_ty) => {
                let span = expr.expr.span().clone();
                self.emit_mismatch(&span, MismatchContext::Assignment, declared_ty, rhs_ty);
            }

            Some(_) => {}
        }

        rhs_ty
    }

    fn check_call(&mut self, call: &mut Call) -> Symbol {
        let table = self.table;

        let (receiver_ty, dispatch_class, is_static) = match &mut call.receiver {
            Receiver::SelfType => (Symbol::SELF_TYPE, self.class_name, false),

            Receiver::Dynamic(object) => {
                let ty = self.check_expr(object);

                (ty, self.reify_self_ty(ty), false)
            }

            Receiver::Static { object, ty_name } => {
                let ty = self.check_expr(object);
                let target =
                    self.resolve_ty_name(ty_name, IllegalSelfTypePosition::StaticDispatch.into());

                if !table.is_subtype(self.reify_self_ty(ty), target) {
                    let span = object.span().clone();
                    self.emit_mismatch(&span, MismatchContext::StaticDispatchTarget, target, ty);
                }

                (ty, target, true)
            }
        };

        let arg_tys = call
            .args
            .iter_mut()
            .map(|arg| self.check_expr(arg))
            .collect::<Vec<_>>();

        let method_name = call.method.sym();
        let found = match (is_static, self.config.static_dispatch) {
            (true, StaticDispatchLookup::TargetOnly) => table
                .own_method(dispatch_class, method_name)
                .map(|method_ty| (dispatch_class, method_ty)),

            _ => table.find_method(dispatch_class, method_name),
        };

        let Some((def_class, method_ty)) = found else {
            let error = SemantError::UnknownMethod {
                class: self.name(dispatch_class),
                method: self.name(method_name),
            };
            self.emit(call.method.span(), error);

            return Symbol::OBJECT;
        };

        trace!(
            method = %self.interner.display(method_name),
            class = %self.interner.display(def_class),
            "resolved a dispatch"
        );

        if arg_tys.len() != method_ty.params.len() {
            let error = SemantError::InvalidNumberOfArguments {
                expected_count: method_ty.params.len(),
                supplied_count: arg_tys.len(),
            };
            self.emit(&call.span, error);

            return Symbol::OBJECT;
        }

        for (position, (&arg_ty, &param_ty)) in arg_tys.iter().zip(&method_ty.params).enumerate() {
            if !table.is_subtype(self.reify_self_ty(arg_ty), param_ty) {
                let span = call.args[position].span().clone();
                self.emit_mismatch(
                    &span,
                    MismatchContext::DispatchArgument { position },
                    param_ty,
                    arg_ty,
                );
            }
        }

        match method_ty.ret {
            Symbol::SELF_TYPE if receiver_ty == Symbol::SELF_TYPE => Symbol::SELF_TYPE,
            Symbol::SELF_TYPE => dispatch_class,
            ret => ret,
        }
    }

    fn check_if(&mut self, expr: &mut If) -> Symbol {
        let antecedent_ty = self.check_expr(&mut expr.antecedent);

        if antecedent_ty != Symbol::BOOL {
            let span = expr.antecedent.span().clone();
            self.emit_mismatch(&span, MismatchContext::IfPredicate, Symbol::BOOL, antecedent_ty);
        }

        let consequent_ty = self.check_expr(&mut expr.consequent);
        let alternative_ty = self.check_expr(&mut expr.alternative);

        self.table
            .least_upper_bound(consequent_ty, alternative_ty, self.class_name)
    }

    fn check_while(&mut self, expr: &mut While) -> Symbol {
        let condition_ty = self.check_expr(&mut expr.condition);

        if condition_ty != Symbol::BOOL {
            let span = expr.condition.span().clone();
            self.emit_mismatch(&span, MismatchContext::LoopPredicate, Symbol::BOOL, condition_ty);
        }

        self.check_expr(&mut expr.body);

        Symbol::OBJECT
    }

    fn check_block(&mut self, expr: &mut Block) -> Symbol {
        expr.body
            .iter_mut()
            .map(|expr| self.check_expr(expr))
            .last()
            .unwrap_or(Symbol::OBJECT)
    }

    fn check_let(&mut self, expr: &mut Let) -> Symbol {
        let binding = &mut expr.binding;
        let name = binding.name.sym();
        let declared_ty = self.resolve_ty_name(&binding.ty_name, SelfTypeAllowed::Yes);

        if name == Symbol::SELF {
            self.emit(binding.name.span(), SemantError::IllegalSelf);
        }

        if let Some(init) = &mut binding.init {
            let init_ty = self.check_expr(init);

            if init_ty != Symbol::SELF_TYPE && !self.table.is_subtype(init_ty, declared_ty) {
                let span = init.span().clone();
                self.emit_mismatch(&span, MismatchContext::LetInit, declared_ty, init_ty);
            }
        }

        self.with_scope(|this| {
            if name != Symbol::SELF {
                this.bindings.bind(name, declared_ty);
            }

            this.check_expr(&mut expr.expr)
        })
    }

    fn check_case(&mut self, expr: &mut Case) -> Symbol {
        self.check_expr(&mut expr.scrutinee);

        let mut arm_ty_names: Vec<Symbol> = Vec::with_capacity(expr.arms.len());
        let mut result_ty = None;

        for arm in &mut expr.arms {
            let name = arm.name.sym();
            let arm_ty = self.resolve_ty_name(&arm.ty_name, IllegalSelfTypePosition::CaseArm.into());

            if arm_ty_names.contains(&arm.ty_name.sym()) {
                let error = SemantError::DuplicateCaseArm {
                    ty_name: self.name(arm.ty_name.sym()),
                };
                self.emit(arm.ty_name.span(), error);
            } else if let Some(&subsuming_ty) = arm_ty_names
                .iter()
                .find(|&&ty| self.table.is_valid(ty) && self.table.is_subtype(arm_ty, ty))
            {
                let error = SemantError::CaseArmSubsumed {
                    subsuming_arm_ty: self.name(subsuming_ty),
                    subsumed_arm_ty: self.name(arm_ty),
                };
                self.warn(arm.ty_name.span(), error);
            }

            arm_ty_names.push(arm.ty_name.sym());

            if name == Symbol::SELF {
                self.emit(arm.name.span(), SemantError::IllegalSelf);
            }

            let body_ty = self.with_scope(|this| {
                if name != Symbol::SELF {
                    this.bindings.bind(name, arm_ty);
                }

                this.check_expr(&mut arm.expr)
            });

            result_ty = Some(match result_ty {
                None => body_ty,
                Some(acc) => self.table.least_upper_bound(acc, body_ty, self.class_name),
            });
        }

        result_ty.unwrap_or(Symbol::OBJECT)
    }

    fn check_new(&mut self, expr: &mut New) -> Symbol {
        self.resolve_ty_name(&expr.ty_name, SelfTypeAllowed::Yes)
    }

    fn check_bin_op(&mut self, expr: &mut BinOpExpr) -> Symbol {
        let lhs_ty = self.check_expr(&mut expr.lhs);
        let rhs_ty = self.check_expr(&mut expr.rhs);

        match expr.op {
            BinOpKind::Add | BinOpKind::Subtract | BinOpKind::Multiply | BinOpKind::Divide => {
                self.check_int_operands(expr, lhs_ty, rhs_ty);

                Symbol::INT
            }

            BinOpKind::LessThan | BinOpKind::LessEquals => {
                self.check_int_operands(expr, lhs_ty, rhs_ty);

                Symbol::BOOL
            }

            BinOpKind::Equals => {
                let restricted = lhs_ty.is_primitive() || rhs_ty.is_primitive();

                if restricted && lhs_ty != rhs_ty {
                    let error = SemantError::IncomparableTypes {
                        lhs_ty: self.name(lhs_ty),
                        rhs_ty: self.name(rhs_ty),
                    };
                    self.emit(&expr.span, error);
                }

                Symbol::BOOL
            }
        }
    }

    /// Reports the first operand that is not an `Int`, if any.
    fn check_int_operands(&mut self, expr: &BinOpExpr, lhs_ty: Symbol, rhs_ty: Symbol) {
        let offending = [(&expr.lhs, lhs_ty), (&expr.rhs, rhs_ty)]
            .into_iter()
            .find(|&(_, ty)| ty != Symbol::INT);

        if let Some((operand, ty)) = offending {
            let span = operand.span().clone();
            self.emit_mismatch(
                &span,
                MismatchContext::IntOperand(expr.op.as_str()),
                Symbol::INT,
                ty,
            );
        }
    }

    fn check_un_op(&mut self, expr: &mut UnOpExpr) -> Symbol {
        let operand_ty = self.check_expr(&mut expr.expr);

        let (expected_ty, context) = match expr.op {
            UnOpKind::IsVoid => return Symbol::BOOL,
            UnOpKind::Complement => (Symbol::INT, MismatchContext::IntOperand(expr.op.as_str())),
            UnOpKind::Not => (Symbol::BOOL, MismatchContext::BoolOperand),
        };

        if operand_ty != expected_ty {
            let span = expr.expr.span().clone();
            self.emit_mismatch(&span, context, expected_ty, operand_ty);
        }

        expected_ty
    }

    fn check_name_expr(&mut self, expr: &mut NameExpr) -> Symbol {
        self.resolve_name(&expr.name)
    }

    fn resolve_name(&mut self, name: &Name) -> Symbol {
        match self.bindings.resolve(name.sym()) {
            Some(ty) => ty,

            None => {
                debug!(name = %self.interner.display(name.sym()), "unbound name");
                let error = SemantError::UnrecognizedName {
                    name: self.name(name.sym()),
                };
                self.emit(name.span(), error);

                Symbol::OBJECT
            }
        }
    }
}
