use std::collections::{HashMap, HashSet};
use std::iter::successors;

use tracing::trace;

use crate::symbol::Symbol;

/// A dense class id, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(usize);

/// The child -> parent edges of the class hierarchy.
///
/// `Object` is the root and has no parent.
#[derive(Debug, Clone, Default)]
pub struct InheritanceMap {
    parents: HashMap<Symbol, Symbol>,
    ids: HashMap<Symbol, ClassId>,
    names: Vec<Symbol>,
}

impl InheritanceMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `class` and assigns it a fresh id.
    ///
    /// A `parent` of `None` is only allowed for the root.
    pub fn insert(&mut self, class: Symbol, parent: Option<Symbol>) -> ClassId {
        let id = *self.ids.entry(class).or_insert_with(|| {
            self.names.push(class);

            ClassId(self.names.len() - 1)
        });

        match parent {
            Some(parent) => {
                self.parents.insert(class, parent);
            }

            None => {
                self.parents.remove(&class);
            }
        }

        id
    }

    pub fn remove(&mut self, class: Symbol) {
        self.parents.remove(&class);
    }

    pub fn parent(&self, class: Symbol) -> Option<Symbol> {
        self.parents.get(&class).copied()
    }

    pub fn id(&self, class: Symbol) -> Option<ClassId> {
        self.ids.get(&class).copied()
    }

    /// Iterates over `class` and its ancestors, nearest first.
    ///
    /// Must only be called once the map is known to be acyclic.
    pub fn ancestors(&self, class: Symbol) -> impl Iterator<Item = Symbol> + '_ {
        successors(Some(class), |&class| self.parent(class))
    }

    /// Returns `true` if `child` conforms to `parent`.
    pub fn is_subtype(&self, child: Symbol, parent: Symbol) -> bool {
        if child == parent || parent == Symbol::OBJECT {
            return true;
        }

        if child == Symbol::OBJECT {
            return false;
        }

        self.ancestors(child).any(|ancestor| ancestor == parent)
    }

    /// Computes the nearest common ancestor of `lhs` and `rhs`.
    ///
    /// Equal arguments are returned as is, even if they are `SELF_TYPE`.
    /// Otherwise a `SELF_TYPE` argument stands for `enclosing`.
    pub fn least_upper_bound(&self, lhs: Symbol, rhs: Symbol, enclosing: Symbol) -> Symbol {
        if lhs == rhs {
            return lhs;
        }

        let resolve = |ty: Symbol| {
            if ty == Symbol::SELF_TYPE {
                enclosing
            } else {
                ty
            }
        };

        let lhs_chain = self.ancestors(resolve(lhs)).collect::<HashSet<_>>();

        self.ancestors(resolve(rhs))
            .find(|ancestor| lhs_chain.contains(ancestor))
            .unwrap_or(Symbol::OBJECT)
    }

    /// Returns `true` if there is a cycle among the registered classes.
    ///
    /// Runs a depth-first search over the parent -> child edges, excluding those leaving
    /// `Object`. An edge into a node on the recursion stack closes a cycle.
    pub fn has_cycle(&self) -> bool {
        let mut children = vec![vec![]; self.names.len()];

        for (&child, &parent) in &self.parents {
            if parent == Symbol::OBJECT {
                continue;
            }

            if let (Some(parent), Some(child)) = (self.id(parent), self.id(child)) {
                children[parent.0].push(child);
            }
        }

        let mut visited = vec![false; self.names.len()];
        let mut on_stack = vec![false; self.names.len()];

        fn visit(
            node: ClassId,
            children: &[Vec<ClassId>],
            visited: &mut [bool],
            on_stack: &mut [bool],
        ) -> bool {
            visited[node.0] = true;
            on_stack[node.0] = true;

            for &child in &children[node.0] {
                if on_stack[child.0] {
                    return true;
                }

                if !visited[child.0] && visit(child, children, visited, on_stack) {
                    return true;
                }
            }

            on_stack[node.0] = false;

            false
        }

        (0..self.names.len()).map(ClassId).any(|node| {
            !visited[node.0] && visit(node, &children, &mut visited, &mut on_stack)
        })
    }

    /// Returns the classes whose ancestor chain loops: those on a cycle and their descendants.
    pub fn cyclic(&self) -> Vec<Symbol> {
        let mut terminated = HashSet::from([Symbol::OBJECT]);
        let mut cyclic = vec![];

        for &class in &self.names {
            let mut chain = vec![];
            let mut current = Some(class);

            let terminates = loop {
                match current {
                    None => break true,
                    Some(sym) if terminated.contains(&sym) => break true,
                    Some(sym) if chain.contains(&sym) => break false,

                    Some(sym) => {
                        chain.push(sym);
                        current = self.parent(sym);
                    }
                }
            };

            if terminates {
                terminated.extend(chain);
            } else {
                trace!(?class, "the ancestor chain of the class loops");
                cyclic.push(class);
            }
        }

        cyclic
    }
}
