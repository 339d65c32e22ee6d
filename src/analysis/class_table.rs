use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::{debug, trace, trace_span};

use crate::analysis::error::{IllegalSelfTypePosition, MultipleDefinitionKind, SemantError};
use crate::analysis::inheritance::InheritanceMap;
use crate::analysis::location_of;
use crate::analysis::typectx::{ClassIndex, MethodTy, TypeCtx};
use crate::ast::{Class, Feature, Method, TyName};
use crate::config::{AnalysisConfig, ParentCheck};
use crate::errors::Diagnostics;
use crate::position::{HasSpan, Span};
use crate::symbol::{Interner, Symbol};

fn builtin_ctx() -> TypeCtx {
    let mut ctx = TypeCtx::empty();

    ctx.add_class(
        Symbol::OBJECT,
        ClassIndex::new().with_methods([
            (Symbol::ABORT, MethodTy::new([], Symbol::OBJECT)),
            (Symbol::TYPE_NAME, MethodTy::new([], Symbol::STRING)),
            (Symbol::COPY, MethodTy::new([], Symbol::SELF_TYPE)),
        ]),
    );

    ctx.add_class(
        Symbol::IO,
        ClassIndex::new().with_methods([
            (
                Symbol::OUT_STRING,
                MethodTy::new([Symbol::STRING], Symbol::SELF_TYPE),
            ),
            (Symbol::OUT_INT, MethodTy::new([Symbol::INT], Symbol::SELF_TYPE)),
            (Symbol::IN_STRING, MethodTy::new([], Symbol::STRING)),
            (Symbol::IN_INT, MethodTy::new([], Symbol::INT)),
        ]),
    );

    ctx.add_class(Symbol::INT, ClassIndex::new());

    ctx.add_class(
        Symbol::STRING,
        ClassIndex::new().with_methods([
            (Symbol::LENGTH, MethodTy::new([], Symbol::INT)),
            (Symbol::CONCAT, MethodTy::new([Symbol::STRING], Symbol::STRING)),
            (
                Symbol::SUBSTR,
                MethodTy::new([Symbol::INT, Symbol::INT], Symbol::STRING),
            ),
        ]),
    );

    ctx.add_class(Symbol::BOOL, ClassIndex::new());

    ctx
}

const BUILTIN_EDGES: [(Symbol, Option<Symbol>); 5] = [
    (Symbol::OBJECT, None),
    (Symbol::IO, Some(Symbol::OBJECT)),
    (Symbol::INT, Some(Symbol::OBJECT)),
    (Symbol::BOOL, Some(Symbol::OBJECT)),
    (Symbol::STRING, Some(Symbol::OBJECT)),
];

/// Whether `SELF_TYPE` may occur in a type position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SelfTypeAllowed {
    Yes,
    No(IllegalSelfTypePosition),
}

impl From<IllegalSelfTypePosition> for SelfTypeAllowed {
    fn from(position: IllegalSelfTypePosition) -> Self {
        Self::No(position)
    }
}

/// The validated class hierarchy with the signatures of every valid class.
///
/// Once built, the table is only read from.
#[derive(Debug, Clone)]
pub struct ClassTable {
    ctx: TypeCtx,
    inheritance: InheritanceMap,
    declarations: HashMap<Symbol, usize>,
}

impl ClassTable {
    /// Validates `classes` and builds the table for those that survive.
    ///
    /// Never fails: every problem is reported to `diagnostics` and the offending class is
    /// left out.
    pub fn build(
        diagnostics: &mut Diagnostics<'_>,
        interner: &Interner,
        config: &AnalysisConfig,
        classes: &[Class],
    ) -> Self {
        ClassTableBuilder {
            diagnostics,
            interner,
            config,
            classes,
            declarations: HashMap::new(),
        }
        .build()
    }

    pub fn is_valid(&self, class: Symbol) -> bool {
        self.ctx.contains(class)
    }

    pub fn valid_classes(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.ctx.iter().map(|(name, _)| name)
    }

    pub fn class(&self, name: Symbol) -> Option<&ClassIndex> {
        self.ctx.get_class(name)
    }

    /// The position in the input of the declaration that defines a valid user class.
    pub fn declaration(&self, name: Symbol) -> Option<usize> {
        self.declarations.get(&name).copied()
    }

    pub fn inheritance(&self) -> &InheritanceMap {
        &self.inheritance
    }

    pub fn parent(&self, class: Symbol) -> Option<Symbol> {
        self.inheritance.parent(class)
    }

    /// Iterates over `class` and its ancestors, nearest first.
    pub fn ancestors(&self, class: Symbol) -> impl Iterator<Item = Symbol> + '_ {
        self.inheritance.ancestors(class)
    }

    pub fn is_subtype(&self, child: Symbol, parent: Symbol) -> bool {
        self.inheritance.is_subtype(child, parent)
    }

    pub fn least_upper_bound(&self, lhs: Symbol, rhs: Symbol, enclosing: Symbol) -> Symbol {
        self.inheritance.least_upper_bound(lhs, rhs, enclosing)
    }

    /// Looks up the signature of a method declared in `class` itself.
    pub fn own_method(&self, class: Symbol, method: Symbol) -> Option<&MethodTy> {
        self.ctx.get_class(class)?.method_ty(method)
    }

    /// Looks up a method in `class` and then in its ancestors.
    ///
    /// Returns the class the method was found in along with its signature.
    pub fn find_method(&self, class: Symbol, method: Symbol) -> Option<(Symbol, &MethodTy)> {
        self.ancestors(class).find_map(|ancestor| {
            self.own_method(ancestor, method)
                .map(|method_ty| (ancestor, method_ty))
        })
    }

    /// The fields of `class`, including the inherited ones, from the root down.
    pub fn fields(&self, class: Symbol) -> Vec<(Symbol, Symbol)> {
        let chain = self.ancestors(class).collect::<Vec<_>>();

        chain
            .into_iter()
            .rev()
            .filter_map(|ancestor| self.ctx.get_class(ancestor))
            .flat_map(ClassIndex::fields)
            .collect()
    }
}

struct ClassTableBuilder<'a, 'dia, 'emt> {
    diagnostics: &'dia mut Diagnostics<'emt>,
    interner: &'a Interner,
    config: &'a AnalysisConfig,
    classes: &'a [Class],
    declarations: HashMap<Symbol, usize>,
}

impl<'a> ClassTableBuilder<'a, '_, '_> {
    fn build(mut self) -> ClassTable {
        let _span = trace_span!("build_class_table", classes = self.classes.len()).entered();

        self.register_declarations();
        self.remove_orphans();

        let mut inheritance = InheritanceMap::new();

        for (class, parent) in BUILTIN_EDGES {
            inheritance.insert(class, parent);
        }

        for class in self.surviving_classes() {
            let id = inheritance.insert(class.name.sym(), Some(class.parent()));
            trace!(class = %self.interner.display(class.name.sym()), ?id, "registered a class");
        }

        if inheritance.has_cycle() {
            self.diagnostics
                .error()
                .with_error(SemantError::InheritanceCycle)
                .emit();

            for class in inheritance.cyclic() {
                debug!(class = %self.interner.display(class), "excluding a class on a cycle");
                inheritance.remove(class);
                self.declarations.remove(&class);
            }
        }

        let mut ctx = builtin_ctx();

        for class in self.surviving_classes().collect::<Vec<_>>() {
            let index = self.index_class(class);
            ctx.add_class(class.name.sym(), index);
        }

        let table = ClassTable {
            ctx,
            inheritance,
            declarations: self.declarations.clone(),
        };

        for class in self.surviving_classes().collect::<Vec<_>>() {
            self.check_inherited_members(&table, class);
        }

        table
    }

    /// The classes still present in the declaration table, in the input order.
    fn surviving_classes(&self) -> impl Iterator<Item = &'a Class> + '_ {
        let classes = self.classes;

        self.declarations
            .values()
            .copied()
            .sorted()
            .map(move |idx| &classes[idx])
    }

    fn name(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_owned()
    }

    fn emit_at(&mut self, class: &Class, span: &Span, error: SemantError) {
        self.diagnostics
            .error()
            .with_location(location_of(self.interner, class.file, span))
            .with_error(error)
            .emit();
    }

    fn register_declarations(&mut self) {
        for (idx, class) in self.classes.iter().enumerate() {
            let name = class.name.sym();

            if name == Symbol::SELF_TYPE {
                self.emit_at(
                    class,
                    class.name.span(),
                    SemantError::IllegalSelfType {
                        position: IllegalSelfTypePosition::ClassName,
                    },
                );

                continue;
            }

            if name.is_builtin_class() {
                let class_name = self.name(name);
                self.emit_at(
                    class,
                    class.name.span(),
                    SemantError::BuiltinRedefined { class: class_name },
                );

                continue;
            }

            if self.declarations.contains_key(&name) {
                let class_name = self.name(name);
                self.diagnostics
                    .error()
                    .with_error(SemantError::MultipleClassDefinition { class: class_name })
                    .emit();

                continue;
            }

            self.declarations.insert(name, idx);
        }
    }

    /// Removes the classes whose parent is not a valid class.
    fn remove_orphans(&mut self) {
        loop {
            let mut removed = vec![];

            for class in self.surviving_classes() {
                let parent = class.parent();

                let error = if parent == Symbol::SELF_TYPE {
                    SemantError::IllegalSelfType {
                        position: IllegalSelfTypePosition::Inherits,
                    }
                } else if parent.is_primitive() {
                    SemantError::ForbiddenInheritance {
                        class: self.name(class.name.sym()),
                        builtin: self.name(parent),
                    }
                } else if !self.is_known_class(parent) {
                    SemantError::UndefinedParent {
                        class: self.name(class.name.sym()),
                        parent: self.name(parent),
                    }
                } else {
                    continue;
                };

                removed.push((class, error));
            }

            if removed.is_empty() {
                break;
            }

            for (class, error) in removed {
                debug!(class = %self.interner.display(class.name.sym()), %error, "removing a class");
                self.declarations.remove(&class.name.sym());

                let inherits = match &error {
                    SemantError::UndefinedParent { .. } => None,
                    _ => class.inherits.as_ref(),
                };

                match inherits {
                    Some(inherits) => self.emit_at(class, inherits.span(), error),
                    None => self.diagnostics.error().with_error(error).emit(),
                }
            }

            if self.config.parent_check == ParentCheck::DirectOnly {
                break;
            }
        }
    }

    fn is_known_class(&self, name: Symbol) -> bool {
        name.is_builtin_class() || self.declarations.contains_key(&name)
    }

    fn resolve_ty_name(
        &mut self,
        class: &Class,
        ty_name: &TyName,
        allow_self_ty: SelfTypeAllowed,
    ) -> Symbol {
        let sym = ty_name.sym();

        let error = match (sym, allow_self_ty) {
            (Symbol::SELF_TYPE, SelfTypeAllowed::Yes) => return sym,

            (Symbol::SELF_TYPE, SelfTypeAllowed::No(position)) => {
                SemantError::IllegalSelfType { position }
            }

            _ if self.is_known_class(sym) => return sym,

            _ => SemantError::UnrecognizedTy {
                ty_name: self.name(sym),
            },
        };

        self.emit_at(class, ty_name.span(), error);

        Symbol::OBJECT
    }

    fn index_class(&mut self, class: &Class) -> ClassIndex {
        let mut index = ClassIndex::new();

        for feature in &class.features {
            match feature {
                Feature::Method(method) => {
                    let name = method.name.sym();

                    if index.has_method(name) {
                        self.emit_at(
                            class,
                            method.name.span(),
                            SemantError::MultipleDefinition {
                                kind: MultipleDefinitionKind::Method,
                                name: self.name(name),
                            },
                        );

                        continue;
                    }

                    let ty = self.resolve_method(class, method);
                    index.add_method(name, ty);
                }

                Feature::Attribute(attr) => {
                    let name = attr.0.name.sym();

                    if name == Symbol::SELF {
                        self.emit_at(class, attr.0.name.span(), SemantError::IllegalSelf);

                        continue;
                    }

                    if index.has_field(name) {
                        self.emit_at(
                            class,
                            attr.0.name.span(),
                            SemantError::MultipleDefinition {
                                kind: MultipleDefinitionKind::Field { inherited: false },
                                name: self.name(name),
                            },
                        );

                        continue;
                    }

                    let ty = self.resolve_ty_name(class, &attr.0.ty_name, SelfTypeAllowed::Yes);
                    index.add_field(name, ty);
                }
            }
        }

        index
    }

    fn resolve_method(&mut self, class: &Class, method: &Method) -> MethodTy {
        let mut param_names = HashSet::new();
        let mut params = Vec::with_capacity(method.params.len());

        for formal in &method.params {
            let name = formal.name.sym();

            if name == Symbol::SELF {
                self.emit_at(class, formal.name.span(), SemantError::IllegalSelf);
            } else if !param_names.insert(name) {
                self.emit_at(
                    class,
                    formal.name.span(),
                    SemantError::MultipleDefinition {
                        kind: MultipleDefinitionKind::Parameter,
                        name: self.name(name),
                    },
                );
            }

            params.push(self.resolve_ty_name(
                class,
                &formal.ty_name,
                IllegalSelfTypePosition::Parameter.into(),
            ));
        }

        let ret = self.resolve_ty_name(class, &method.return_ty, SelfTypeAllowed::Yes);

        MethodTy { params, ret }
    }

    /// Checks overrides and field redefinitions against the ancestors of `class`.
    fn check_inherited_members(&mut self, table: &ClassTable, class: &Class) {
        let name = class.name.sym();
        let index = table
            .class(name)
            .expect("surviving classes are present in the table");
        let parent = class.parent();
        let mut seen_methods = HashSet::new();
        let mut seen_fields = HashSet::new();

        for feature in &class.features {
            match feature {
                Feature::Method(method) => {
                    let method_name = method.name.sym();

                    if !seen_methods.insert(method_name) {
                        continue;
                    }

                    let own_ty = index
                        .method_ty(method_name)
                        .expect("the first definition of a method is indexed");

                    if let Some((ancestor, inherited_ty)) =
                        table.find_method(parent, method_name)
                    {
                        if own_ty != inherited_ty {
                            self.emit_at(
                                class,
                                method.name.span(),
                                SemantError::IncompatibleOverride {
                                    method: self.name(method_name),
                                    ancestor: self.name(ancestor),
                                },
                            );
                        }
                    }
                }

                Feature::Attribute(attr) => {
                    let field_name = attr.0.name.sym();

                    if field_name == Symbol::SELF || !seen_fields.insert(field_name) {
                        continue;
                    }

                    let redefined = table
                        .ancestors(parent)
                        .filter_map(|ancestor| table.class(ancestor))
                        .any(|ancestor| ancestor.has_field(field_name));

                    if redefined {
                        self.emit_at(
                            class,
                            attr.0.name.span(),
                            SemantError::MultipleDefinition {
                                kind: MultipleDefinitionKind::Field { inherited: true },
                                name: self.name(field_name),
                            },
                        );
                    }
                }
            }
        }
    }
}
