mod class_table;
pub mod error;
mod inheritance;
mod typeck;
mod typectx;
mod validate;

use std::fmt::{self, Display};

use tracing::{debug, debug_span};

use crate::ast::Program;
use crate::config::AnalysisConfig;
use crate::errors::{Diagnostics, Location};
use crate::position::Span;
use crate::symbol::{Interner, Symbol};

pub use class_table::ClassTable;
pub use error::{ErrorKind, SemantError};
pub use inheritance::{ClassId, InheritanceMap};
pub use typeck::TypeChecker;
pub use typectx::{BindingMap, ClassIndex, MethodTy};
pub use validate::{check_has_main_class, validate_classes};

pub const HALT_MESSAGE: &str = "Compilation halted due to static semantic errors.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Halted,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "semantic analysis passed"),
            Self::Halted => write!(f, "{}", HALT_MESSAGE),
        }
    }
}

#[derive(Debug)]
pub struct SemantOutcome {
    pub table: ClassTable,
    pub status: Status,
}

impl SemantOutcome {
    pub fn is_passed(&self) -> bool {
        self.status == Status::Passed
    }
}

/// Runs the semantic analysis over `program`, annotating its expressions in place.
///
/// The program passes iff no errors were reported. Warnings do not affect the outcome.
pub fn check_program(
    diagnostics: &mut Diagnostics<'_>,
    interner: &Interner,
    config: &AnalysisConfig,
    program: &mut Program,
) -> SemantOutcome {
    let _span = debug_span!("semant", classes = program.classes.len()).entered();

    let table = ClassTable::build(diagnostics, interner, config, &program.classes);
    check_has_main_class(diagnostics, interner, config, &table, program);
    TypeChecker::new(diagnostics, interner, config, &table).check_program(program);

    let status = if diagnostics.has_errors() {
        Status::Halted
    } else {
        validate_classes(&table, program);

        Status::Passed
    };

    debug!(errors = diagnostics.error_count(), ?status, "semantic analysis finished");

    SemantOutcome { table, status }
}

pub(crate) fn location_of(interner: &Interner, file: Symbol, span: &Span) -> Location {
    Location {
        file: interner.resolve(file).to_owned(),
        line: span.line(),
    }
}
