use std::collections::{hash_map, HashMap};

use indexmap::IndexMap;

use crate::symbol::Symbol;

/// The signature of a method: formal parameter types followed by the return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodTy {
    pub params: Vec<Symbol>,
    pub ret: Symbol,
}

impl MethodTy {
    pub fn new(params: impl IntoIterator<Item = Symbol>, ret: Symbol) -> Self {
        Self {
            params: params.into_iter().collect(),
            ret,
        }
    }
}

/// The members a class declares itself.
///
/// Inherited members are not copied here: lookups walk the inheritance chain instead.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    methods: IndexMap<Symbol, MethodTy>,
    fields: IndexMap<Symbol, Symbol>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_methods(mut self, iter: impl IntoIterator<Item = (Symbol, MethodTy)>) -> Self {
        for (name, ty) in iter {
            self.add_method(name, ty);
        }

        self
    }

    pub fn add_method(&mut self, name: Symbol, ty: MethodTy) {
        match self.methods.entry(name) {
            indexmap::map::Entry::Occupied(_) => {
                panic!("the method {:?} has already been added", name);
            }

            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(ty);
            }
        }
    }

    pub fn add_field(&mut self, name: Symbol, ty: Symbol) {
        let prev = self.fields.insert(name, ty);
        assert!(prev.is_none(), "the field {:?} has already been added", name);
    }

    pub fn has_method(&self, name: Symbol) -> bool {
        self.methods.contains_key(&name)
    }

    pub fn has_field(&self, name: Symbol) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn method_ty(&self, name: Symbol) -> Option<&MethodTy> {
        self.methods.get(&name)
    }

    pub fn field_ty(&self, name: Symbol) -> Option<Symbol> {
        self.fields.get(&name).copied()
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (Symbol, Symbol)> + '_ {
        self.fields.iter().map(|(&name, &ty)| (name, ty))
    }
}

/// Maps class names to their indexes.
#[derive(Debug, Clone, Default)]
pub struct TypeCtx {
    types: HashMap<Symbol, ClassIndex>,
}

impl TypeCtx {
    pub fn empty() -> Self {
        Default::default()
    }

    pub fn add_class(&mut self, name: Symbol, index: ClassIndex) {
        match self.types.entry(name) {
            hash_map::Entry::Occupied(entry) => {
                panic!("the class {:?} has already been added", entry.key());
            }

            hash_map::Entry::Vacant(entry) => {
                entry.insert(index);
            }
        }
    }

    pub fn get_class(&self, name: Symbol) -> Option<&ClassIndex> {
        self.types.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.types.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &ClassIndex)> {
        self.types.iter().map(|(&name, index)| (name, index))
    }
}

/// A stack of lexical scopes mapping identifiers to their declared types.
#[derive(Debug, Clone)]
pub struct BindingMap {
    scopes: Vec<BindingScope>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self {
            scopes: vec![BindingScope::new()],
        }
    }

    pub(super) fn enter_scope(&mut self) {
        self.scopes.push(BindingScope::new());
    }

    pub(super) fn leave_scope(&mut self) {
        assert!(self.scopes.len() > 1, "the outermost scope cannot be left");
        self.scopes.pop();
    }

    /// Looks up `name`, starting from the innermost scope.
    pub fn resolve(&self, name: Symbol) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    /// Binds `name` in the innermost scope, returning the type it shadowed in that scope.
    pub fn bind(&mut self, name: Symbol, ty: Symbol) -> Option<Symbol> {
        self.innermost_mut().bind(name, ty)
    }

    fn innermost_mut(&mut self) -> &mut BindingScope {
        self.scopes
            .last_mut()
            .expect("the binding map always has a scope")
    }
}

impl Default for BindingMap {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BindingScope {
    local_bindings: HashMap<Symbol, Symbol>,
}

impl BindingScope {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, name: Symbol) -> Option<Symbol> {
        self.local_bindings.get(&name).copied()
    }

    pub fn bind(&mut self, name: Symbol, ty: Symbol) -> Option<Symbol> {
        self.local_bindings.insert(name, ty)
    }
}
