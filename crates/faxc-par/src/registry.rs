//! The function registry, enum registry and constants table: the three
//! "external collaborator" tables the checker reads and writes while
//! running, bundled for convenient caller construction.

use faxc_util::{FxHashMap, Symbol};

use crate::ast::FuncId;

/// Maps a function/operator name to the set of registered overloads.
///
/// Registration itself never rejects a signature — two declarations with
/// the same name and argument shape are only genuinely "indistinguishable"
/// once their parameter types are known, which is not until phase-1 typing
/// (P4) has run. The `overload-conflict` check (P7) therefore happens after
/// typing, by comparing the now-concrete parameter types of every pair of
/// same-named overloads; see `faxc_sem::driver`.
#[derive(Default, Debug)]
pub struct FunctionRegistry {
    by_name: FxHashMap<Symbol, Vec<FuncId>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: Symbol, id: FuncId) {
        self.by_name.entry(name).or_default().push(id);
    }

    pub fn candidates(&self, name: Symbol) -> &[FuncId] {
        self.by_name.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.by_name.keys().copied()
    }
}

/// Interns enum-bearing declarations and assigns each a positive id; keeps a
/// separate table of array-enum tuples (per-axis plus element enum
/// identities) each compressed to one id.
#[derive(Default, Debug)]
pub struct EnumRegistry {
    next_enum_id: u32,
    /// name -> assigned enum id, so re-declaration/lookup by name is stable.
    enum_ids: FxHashMap<Symbol, u32>,
    array_enum_tuples: FxHashMap<Vec<u32>, u32>,
    /// Reverse of `array_enum_tuples`, indexed by `id - 1`, so the typer can
    /// decompose a composite array-enum id back into its per-axis plus
    /// element components (needed by array access and the implicit
    /// enum-index coercion rule).
    tuples_by_id: Vec<Vec<u32>>,
    next_tuple_id: u32,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self {
            next_enum_id: 1,
            ..Default::default()
        }
    }

    /// Returns the enum id for `name`, assigning a fresh one on first sight.
    pub fn intern_enum(&mut self, name: Symbol) -> u32 {
        if let Some(&id) = self.enum_ids.get(&name) {
            return id;
        }
        let id = self.next_enum_id;
        self.next_enum_id += 1;
        self.enum_ids.insert(name, id);
        id
    }

    pub fn enum_id_of(&self, name: Symbol) -> Option<u32> {
        self.enum_ids.get(&name).copied()
    }

    /// Compresses an array-enum tuple (per-axis ids followed by the element
    /// id) to a single stable id, reusing the id for an identical tuple.
    pub fn intern_array_enum(&mut self, tuple: Vec<u32>) -> u32 {
        if let Some(&id) = self.array_enum_tuples.get(&tuple) {
            return id;
        }
        self.next_tuple_id += 1;
        let id = self.next_tuple_id;
        self.array_enum_tuples.insert(tuple.clone(), id);
        self.tuples_by_id.push(tuple);
        id
    }

    /// Decomposes a composite array-enum id back into its per-axis plus
    /// element tuple, or `None` for `id == 0` (no enum involvement).
    pub fn tuple_of(&self, id: u32) -> Option<&[u32]> {
        if id == 0 {
            return None;
        }
        self.tuples_by_id.get((id - 1) as usize).map(Vec::as_slice)
    }
}

/// The fixed set of built-in identifiers the checker must recognise without
/// the caller registering them.
#[derive(Debug)]
pub struct ConstantsTable {
    pub show: Symbol,
    pub bool2int: Symbol,
    pub bool2float: Symbol,
    pub int2float: Symbol,
    pub set2array: Symbol,
    pub absent: Symbol,
    pub true_: Symbol,
    pub false_: Symbol,
    pub array1d: Symbol,
    pub to_enum: Symbol,
    pub add_to_output: Symbol,
    pub anon_enum: Symbol,
    pub join: Symbol,
}

impl Default for ConstantsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantsTable {
    pub fn new() -> Self {
        ConstantsTable {
            show: Symbol::intern("show"),
            bool2int: Symbol::intern("bool2int"),
            bool2float: Symbol::intern("bool2float"),
            int2float: Symbol::intern("int2float"),
            set2array: Symbol::intern("set2array"),
            absent: Symbol::intern("absent"),
            true_: Symbol::intern("true"),
            false_: Symbol::intern("false"),
            array1d: Symbol::intern("array1d"),
            to_enum: Symbol::intern("to_enum"),
            add_to_output: Symbol::intern("add_to_output"),
            anon_enum: Symbol::intern("anon_enum"),
            join: Symbol::intern("join"),
        }
    }
}
