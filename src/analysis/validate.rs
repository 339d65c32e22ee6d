use tracing::trace;

use crate::analysis::class_table::ClassTable;
use crate::analysis::error::SemantError;
use crate::analysis::location_of;
use crate::ast::{AstRecurse, DefaultVisitor, Expr, HasTy, Program};
use crate::config::AnalysisConfig;
use crate::errors::Diagnostics;
use crate::position::HasSpan;
use crate::symbol::{Interner, Symbol};

/// Reports a missing `Main` class or a missing `Main.main` method.
///
/// Only a method declared in `Main` itself counts.
pub fn check_has_main_class(
    diagnostics: &mut Diagnostics<'_>,
    interner: &Interner,
    config: &AnalysisConfig,
    table: &ClassTable,
    program: &Program,
) {
    if !table.is_valid(Symbol::MAIN_CLASS) {
        diagnostics
            .error()
            .with_error(SemantError::MissingMainClass)
            .emit();

        return;
    }

    let Some(method_ty) = table.own_method(Symbol::MAIN_CLASS, Symbol::MAIN_METHOD) else {
        diagnostics
            .error()
            .with_error(SemantError::MissingMainMethod)
            .emit();

        return;
    };

    if config.require_parameterless_main && !method_ty.params.is_empty() {
        let location = table
            .declaration(Symbol::MAIN_CLASS)
            .map(|idx| &program.classes[idx])
            .and_then(|class| {
                class
                    .methods()
                    .find(|method| method.name.sym() == Symbol::MAIN_METHOD)
                    .map(|method| location_of(interner, class.file, method.name.span()))
            });

        diagnostics
            .error()
            .with_location(location)
            .with_error(SemantError::MainTakesArguments {
                param_count: method_ty.params.len(),
            })
            .emit();
    }
}

/// Asserts that every expression of every checked class has been annotated
/// with a type known to the class table.
///
/// Panics otherwise: a failure here is a bug in the checker.
pub fn validate_classes(table: &ClassTable, program: &Program) {
    let mut validator = Validator { table, annotated: 0 };

    for (idx, class) in program.classes.iter().enumerate() {
        if table.declaration(class.name.sym()) == Some(idx) {
            DefaultVisitor::visit_class(&mut validator, class);
        }
    }

    trace!(annotated = validator.annotated, "all expressions are annotated");
}

struct Validator<'a> {
    table: &'a ClassTable,
    annotated: usize,
}

impl DefaultVisitor for Validator<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        let Some(ty) = expr.ty() else {
            panic!("the expression at {:?} has not been annotated", expr.span());
        };

        assert!(
            ty == Symbol::SELF_TYPE || self.table.is_valid(ty),
            "the expression at {:?} is annotated with an unknown type {:?}",
            expr.span(),
            ty,
        );

        self.annotated += 1;
        expr.recurse(self);
    }
}
