use std::fmt;

use indexmap::IndexSet;

/// An interned identifier.
///
/// Two symbols are equal iff they were produced by the same [`Interner`] for the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

macro_rules! define_predefined_symbols {
    ($( $name:ident = $idx:literal => $text:literal, )+) => {
        impl Symbol {
            $( pub const $name: Symbol = Symbol($idx); )+
        }

        const PREDEFINED: &[(Symbol, &str)] = &[
            $( (Symbol::$name, $text), )+
        ];
    };
}

define_predefined_symbols! {
    OBJECT = 0 => "Object",
    IO = 1 => "IO",
    INT = 2 => "Int",
    BOOL = 3 => "Bool",
    STRING = 4 => "String",
    SELF_TYPE = 5 => "SELF_TYPE",
    SELF = 6 => "self",
    MAIN_CLASS = 7 => "Main",
    MAIN_METHOD = 8 => "main",
    ABORT = 9 => "abort",
    TYPE_NAME = 10 => "type_name",
    COPY = 11 => "copy",
    OUT_STRING = 12 => "out_string",
    OUT_INT = 13 => "out_int",
    IN_STRING = 14 => "in_string",
    IN_INT = 15 => "in_int",
    LENGTH = 16 => "length",
    CONCAT = 17 => "concat",
    SUBSTR = 18 => "substr",
}

impl Symbol {
    /// The primitive classes whose values can only be compared with values of the same class.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::INT | Self::BOOL | Self::STRING)
    }

    pub fn is_builtin_class(self) -> bool {
        matches!(
            self,
            Self::OBJECT | Self::IO | Self::INT | Self::BOOL | Self::STRING
        )
    }
}

/// The identifier table shared by the parser and the semantic analyzer.
///
/// The predefined symbols are always present at their fixed indices.
#[derive(Debug, Clone)]
pub struct Interner {
    names: IndexSet<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        let mut names = IndexSet::with_capacity(PREDEFINED.len());

        for &(sym, text) in PREDEFINED {
            let (idx, _) = names.insert_full(Box::from(text));
            assert_eq!(idx, sym.index(), "predefined symbols must be densely numbered");
        }

        Self { names }
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(idx) = self.names.get_index_of(name) {
            return Symbol(idx as u32);
        }

        let (idx, _) = self.names.insert_full(Box::from(name));

        Symbol(u32::try_from(idx).expect("the symbol table has overflown"))
    }

    /// Returns the text of `sym`.
    ///
    /// Panics if the symbol was produced by a different interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.names
            .get_index(sym.index())
            .expect("the symbol belongs to this interner")
    }

    pub fn display(&self, sym: Symbol) -> SymbolDisplay<'_> {
        SymbolDisplay {
            interner: self,
            sym,
        }
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SymbolDisplay<'a> {
    interner: &'a Interner,
    sym: Symbol,
}

impl fmt::Display for SymbolDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interner.resolve(self.sym))
    }
}
