use std::error::Error;
use std::fmt::{self, Display};

/// The coarse category of a semantic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Class-level problems: the class table, inheritance, declarations.
    Structural,
    /// Name resolution failures inside expressions.
    Scope,
    /// Typing rule violations inside expressions.
    Type,
    /// Method call resolution failures.
    Dispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalSelfTypePosition {
    ClassName,
    Inherits,
    Parameter,
    StaticDispatch,
    CaseArm,
}

impl Display for IllegalSelfTypePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NOTE: should make sense in the following context: `occur in {}`
        f.write_str(match self {
            Self::ClassName => "a class name position",
            Self::Inherits => "an inherits clause",
            Self::Parameter => "a method parameter",
            Self::StaticDispatch => "a static dispatch type specifier",
            Self::CaseArm => "a case arm",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleDefinitionKind {
    Field { inherited: bool },
    Method,
    Parameter,
}

impl Display for MultipleDefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Field { .. } => "field",
            Self::Method => "method",
            Self::Parameter => "parameter",
        })
    }
}

/// Where a pair of types failed to conform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchContext {
    /// An operand of `+`, `-`, `*`, `/`, `<`, `<=`, `~`.
    IntOperand(&'static str),
    /// The operand of `not`.
    BoolOperand,
    /// The predicate of an `if`.
    IfPredicate,
    /// The predicate of a `while`.
    LoopPredicate,
    MethodReturn,
    LetInit,
    FieldInit,
    Assignment,
    DispatchArgument { position: usize },
    StaticDispatchTarget,
}

impl Display for MismatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntOperand(op) => write!(f, "an operand of `{}`", op),
            Self::BoolOperand => write!(f, "the operand of `not`"),
            Self::IfPredicate => write!(f, "the predicate of a conditional"),
            Self::LoopPredicate => write!(f, "the predicate of a loop"),
            Self::MethodReturn => write!(f, "the body of a method"),
            Self::LetInit => write!(f, "a let initializer"),
            Self::FieldInit => write!(f, "a field initializer"),
            Self::Assignment => write!(f, "an assignment"),
            Self::DispatchArgument { position } => write!(f, "argument #{} of a call", position + 1),
            Self::StaticDispatchTarget => write!(f, "the receiver of a static dispatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedTypes {
    pub context: MismatchContext,
    pub expected_ty: String,
    pub actual_ty: String,
}

/// A semantic error with every name already resolved to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemantError {
    MultipleClassDefinition {
        class: String,
    },

    BuiltinRedefined {
        class: String,
    },

    UndefinedParent {
        class: String,
        parent: String,
    },

    ForbiddenInheritance {
        class: String,
        builtin: String,
    },

    InheritanceCycle,

    MissingMainClass,

    MissingMainMethod,

    MainTakesArguments {
        param_count: usize,
    },

    IllegalSelfType {
        position: IllegalSelfTypePosition,
    },

    UnrecognizedTy {
        ty_name: String,
    },

    MultipleDefinition {
        kind: MultipleDefinitionKind,
        name: String,
    },

    IncompatibleOverride {
        method: String,
        ancestor: String,
    },

    UnrecognizedName {
        name: String,
    },

    UnrecognizedAssignee {
        name: String,
    },

    IllegalSelf,

    MismatchedTypes(Box<MismatchedTypes>),

    IncomparableTypes {
        lhs_ty: String,
        rhs_ty: String,
    },

    DuplicateCaseArm {
        ty_name: String,
    },

    CaseArmSubsumed {
        subsuming_arm_ty: String,
        subsumed_arm_ty: String,
    },

    NestingTooDeep {
        limit: usize,
    },

    UnknownMethod {
        class: String,
        method: String,
    },

    InvalidNumberOfArguments {
        expected_count: usize,
        supplied_count: usize,
    },
}

impl SemantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MultipleClassDefinition { .. }
            | Self::BuiltinRedefined { .. }
            | Self::UndefinedParent { .. }
            | Self::ForbiddenInheritance { .. }
            | Self::InheritanceCycle
            | Self::MissingMainClass
            | Self::MissingMainMethod
            | Self::MainTakesArguments { .. }
            | Self::IllegalSelfType { .. }
            | Self::UnrecognizedTy { .. }
            | Self::MultipleDefinition { .. }
            | Self::IncompatibleOverride { .. } => ErrorKind::Structural,

            Self::UnrecognizedName { .. } | Self::UnrecognizedAssignee { .. } | Self::IllegalSelf => {
                ErrorKind::Scope
            }

            Self::MismatchedTypes(err) => match err.context {
                MismatchContext::DispatchArgument { .. } | MismatchContext::StaticDispatchTarget => {
                    ErrorKind::Dispatch
                }

                _ => ErrorKind::Type,
            },

            Self::IncomparableTypes { .. }
            | Self::DuplicateCaseArm { .. }
            | Self::CaseArmSubsumed { .. }
            | Self::NestingTooDeep { .. } => ErrorKind::Type,

            Self::UnknownMethod { .. } | Self::InvalidNumberOfArguments { .. } => {
                ErrorKind::Dispatch
            }
        }
    }
}

impl Display for SemantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleClassDefinition { class } => {
                write!(
                    f,
                    "detected multiple definition: class `{}` is already defined",
                    class
                )
            }

            Self::BuiltinRedefined { class } => {
                write!(f, "redefinition of the built-in class `{}`", class)
            }

            Self::UndefinedParent { class, parent } => {
                write!(
                    f,
                    "class `{}` inherits from an undefined class `{}`",
                    class, parent
                )
            }

            Self::ForbiddenInheritance { class, builtin } => {
                write!(
                    f,
                    "class `{}` inherits from the built-in class `{}`, which is forbidden",
                    class, builtin
                )
            }

            Self::InheritanceCycle => write!(f, "the inheritance graph contains a cycle"),
            Self::MissingMainClass => write!(f, "class `Main` is missing"),
            Self::MissingMainMethod => write!(f, "method `main` is missing in class `Main`"),

            Self::MainTakesArguments { param_count } => {
                write!(
                    f,
                    "method `main` of class `Main` must take no arguments, but it takes {}",
                    param_count
                )
            }

            Self::IllegalSelfType { position } => {
                write!(f, "`SELF_TYPE` cannot occur in {}", position)
            }

            Self::UnrecognizedTy { ty_name } => {
                write!(f, "the type name `{}` is not recognized", ty_name)
            }

            Self::MultipleDefinition { kind, name } => {
                write!(
                    f,
                    "detected multiple definition: {} `{}` is already defined{}",
                    kind,
                    name,
                    match *kind {
                        MultipleDefinitionKind::Field { inherited: true } => " in a superclass",
                        _ => "",
                    },
                )
            }

            Self::IncompatibleOverride { method, ancestor } => {
                write!(
                    f,
                    "method `{}` overrides the one defined in `{}` with a different signature",
                    method, ancestor
                )
            }

            Self::UnrecognizedName { name } => write!(f, "unrecognized name `{}`", name),

            Self::UnrecognizedAssignee { name } => {
                write!(f, "cannot assign to an undeclared name `{}`", name)
            }

            Self::IllegalSelf => write!(f, "`self` cannot be used here"),

            Self::MismatchedTypes(err) => {
                let MismatchedTypes {
                    context,
                    expected_ty,
                    actual_ty,
                } = &**err;

                write!(
                    f,
                    "mismatched types in {}: expected `{}`, found `{}`",
                    context, expected_ty, actual_ty,
                )
            }

            Self::IncomparableTypes { lhs_ty, rhs_ty } => {
                write!(
                    f,
                    "values of types `{}` and `{}` cannot be compared for equality",
                    lhs_ty, rhs_ty
                )
            }

            Self::DuplicateCaseArm { ty_name } => {
                write!(
                    f,
                    "the type `{}` is matched by more than one case arm",
                    ty_name
                )
            }

            Self::CaseArmSubsumed {
                subsuming_arm_ty,
                subsumed_arm_ty,
            } => {
                write!(
                    f,
                    "the case arm (matching type `{}`) is subsumed by a more general arm above matching `{}`",
                    subsumed_arm_ty,
                    subsuming_arm_ty,
                )
            }

            Self::NestingTooDeep { limit } => {
                write!(f, "the expression is nested deeper than {} levels", limit)
            }

            Self::UnknownMethod { class, method } => {
                write!(
                    f,
                    "class `{}` does not have a method named `{}`",
                    class, method,
                )
            }

            Self::InvalidNumberOfArguments {
                expected_count,
                supplied_count,
            } => {
                write!(
                    f,
                    "this function takes {} argument{} but {} argument{} {} supplied",
                    expected_count,
                    if *expected_count != 1usize { "s" } else { "" },
                    supplied_count,
                    if *supplied_count != 1usize { "s" } else { "" },
                    if *supplied_count != 1usize {
                        "were"
                    } else {
                        "was"
                    },
                )
            }
        }
    }
}

impl Error for SemantError {}
