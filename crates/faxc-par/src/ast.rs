//! The AST node shapes the checker touches, and the arena ([`Model`]) that
//! owns them.
//!
//! Every node lives in one of the model's [`faxc_util::IndexVec`] arenas and
//! is referred to by a typed index ([`ExprId`], [`DeclId`], [`FuncId`])
//! rather than a pointer; back-links the checker installs (a resolved
//! declaration, a resolved function, a computed [`Type`]) live in
//! side-tables keyed by that index, so that resolving them is just a vector
//! write instead of a mutation through shared ownership.

use faxc_util::{define_idx, Span, Symbol};

use crate::types::Type;

define_idx!(ExprId);
define_idx!(DeclId);
define_idx!(FuncId);

/// A binary operator, including the array-concatenation operator `++`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Implies,
    In,
    Subset,
    Union,
    Intersect,
    Diff,
    /// `++`, array/string concatenation.
    PlusPlus,
    Range,
}

impl BinOp {
    /// The surface-syntax spelling used to look the operator up in the
    /// function registry (operators are just functions with symbolic names).
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "mod",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "/\\",
            BinOp::Or => "\\/",
            BinOp::Xor => "xor",
            BinOp::Implies => "->",
            BinOp::In => "in",
            BinOp::Subset => "subset",
            BinOp::Union => "union",
            BinOp::Intersect => "intersect",
            BinOp::Diff => "diff",
            BinOp::PlusPlus => "++",
            BinOp::Range => "..",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
        }
    }
}

/// One generator of a comprehension: `d in src`, where `d` is the bound
/// declaration and `src` the source expression.
#[derive(Clone, Debug)]
pub struct Generator {
    pub decl: DeclId,
    pub source: ExprId,
}

/// `if c1 then t1 elseif c2 then t2 ... else e endif`, generalised to `n`
/// then-branches and exactly one else.
#[derive(Clone, Debug)]
pub struct IfThenElse {
    pub branches: Vec<(ExprId, ExprId)>,
    pub else_branch: ExprId,
}

/// The domain and index-range shape of a declaration, prior to being typed.
///
/// `ranges` holds one entry per array axis; an empty `ranges` means the
/// declared thing is a scalar or set, not an array. An entry is either a
/// concrete set-of-int domain expression or `None` to mean a polymorphic
/// `$T`-style type-inst identifier axis (which forces the computed type's
/// `dim` to `-1`).
#[derive(Clone, Debug)]
pub struct TypeInst {
    /// The element domain expression (e.g. `1..10`, `bool`, an enum name),
    /// or `None` for a bare TIId (`$T`) domain.
    pub domain: Option<ExprId>,
    /// Whether the domain is introduced with `var`.
    pub is_var: bool,
    /// Whether the domain is `set of ...`.
    pub is_set: bool,
    /// Whether the domain is `opt ...`.
    pub is_opt: bool,
    /// One entry per array axis, or empty for a non-array declaration.
    pub ranges: Vec<Option<ExprId>>,
    /// Whether the domain names a declared enum type. Known syntactically
    /// (from the domain identifier) rather than computed, since enum-ness
    /// gates the scope stack's `add` before typing has run.
    pub is_enum: bool,
    /// Filled in by the typer; `Type::UNKNOWN` until then.
    pub ty: Type,
}

impl TypeInst {
    pub fn scalar(domain: ExprId) -> Self {
        TypeInst {
            domain: Some(domain),
            is_var: false,
            is_set: false,
            is_opt: false,
            ranges: Vec::new(),
            is_enum: false,
            ty: Type::UNKNOWN,
        }
    }
}

/// A top-level or locally-bound variable/parameter declaration.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: Symbol,
    pub ti: TypeInst,
    pub init: Option<ExprId>,
    pub annotations: Vec<ExprId>,
    /// Whether this declaration lives in the model's top-level frame.
    pub toplevel: bool,
    /// Topological-sort payload: `None` = unvisited, `Some(-1)` = currently
    /// being resolved (cycle sentinel), `Some(n >= 0)` = final rank.
    pub position: Option<i64>,
    pub span: Span,
}

/// A `let { bindings } in body` expression.
///
/// `bindings` is reordered in place by the topological sorter to be
/// self-consistent; `original_inits` retains each binding's initialiser as
/// first written, in binding order, for diagnostics and for the enum
/// expander's re-invocation path.
#[derive(Clone, Debug)]
pub struct Let {
    pub bindings: Vec<DeclId>,
    pub original_inits: Vec<Option<ExprId>>,
    pub body: ExprId,
}

/// A function or predicate call (also used to represent a resolved
/// operator application once the typer has looked it up).
#[derive(Clone, Debug)]
pub struct Call {
    pub name: Symbol,
    pub args: Vec<ExprId>,
    pub resolved: Option<FuncId>,
}

#[derive(Clone, Debug)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// The `absent` keyword literal: the sole value of an optional type
    /// carrying no present value. Synthesised by the model driver's
    /// undefined-parameter pass for an unbound optional par decl;
    /// never produced by name resolution, so it never carries a `DeclId`.
    Absent,
}

/// The expression node kinds the checker touches.
#[derive(Clone, Debug)]
pub enum ExprKind {
    Lit(Lit),
    /// Anonymous var/value placeholder `_`.
    Anon,
    /// A type-inst identifier leaf, e.g. `$T` appearing as a domain.
    TiId(Symbol),
    /// An identifier reference; resolved to a declaration by the sorter.
    Id { name: Symbol, decl: Option<DeclId> },
    SetLit(Vec<ExprId>),
    ArrayLit(Vec<ExprId>),
    ArrayAccess { base: ExprId, indices: Vec<ExprId> },
    Comprehension {
        generators: Vec<Generator>,
        where_clause: Option<ExprId>,
        result: ExprId,
        is_set: bool,
    },
    Ite(IfThenElse),
    BinOp { op: BinOp, lhs: ExprId, rhs: ExprId, resolved: Option<FuncId> },
    UnOp { op: UnOp, operand: ExprId, resolved: Option<FuncId> },
    Call(Call),
    VarDeclExpr(DeclId),
    Let(Let),
}

/// One expression node: its kind, source location, and the checker-computed
/// side-table slots (`ty`) that every node accumulates regardless of kind.
#[derive(Clone, Debug)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
    /// Filled in by the bottom-up typer; `Type::UNKNOWN` until typed.
    pub ty: Type,
}

/// A function/predicate signature, as stored by the function registry and
/// as synthesised by the enum expander.
///
/// Parameters are full `VarDecl`s (sharing the arena with top-level and
/// `let`-bound declarations) rather than bare `TypeInst`s, so that the
/// topological sorter and the typer can bind each parameter's name into a
/// scope frame for the duration of the body, per the same
/// push-before-body/pop-after-body discipline used for `let` bindings.
#[derive(Clone, Debug)]
pub struct FnSig {
    pub name: Symbol,
    pub params: Vec<DeclId>,
    pub ret: TypeInst,
    pub body: Option<ExprId>,
    /// True for the handful of built-in coercion functions
    /// (`bool2int`, `bool2float`, `int2float`, `set2array`).
    pub is_builtin_coercion: bool,
}

/// Method of a solve item.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolveMethod {
    Satisfy,
    Minimize,
    Maximize,
}

/// A top-level item. Items reference declarations/expressions by id so the
/// model driver can reorder the item list without touching the
/// arenas those ids point into.
#[derive(Clone, Debug)]
pub enum Item {
    VarDecl(DeclId),
    Assign { decl: DeclId, rhs: ExprId, span: Span },
    Constraint(ExprId),
    Solve { method: SolveMethod, objective: Option<ExprId>, annotations: Vec<ExprId> },
    Output(ExprId),
    Function(FuncId),
}

/// The model container: an arena of declarations and expressions plus an
/// ordered item list. This is the "model" the checker's entry points
/// operate on; it is built by the caller (a parser, or a test fixture), not
/// by this crate.
#[derive(Default, Debug)]
pub struct Model {
    pub exprs: faxc_util::IndexVec<ExprId, ExprNode>,
    pub decls: faxc_util::IndexVec<DeclId, VarDecl>,
    pub funcs: faxc_util::IndexVec<FuncId, FnSig>,
    pub items: Vec<Item>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.exprs.push(ExprNode {
            kind,
            span,
            ty: Type::UNKNOWN,
        })
    }

    pub fn push_decl(&mut self, decl: VarDecl) -> DeclId {
        self.decls.push(decl)
    }

    pub fn push_func(&mut self, sig: FnSig) -> FuncId {
        self.funcs.push(sig)
    }

    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.exprs[id]
    }

    pub fn decl(&self, id: DeclId) -> &VarDecl {
        &self.decls[id]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut VarDecl {
        &mut self.decls[id]
    }

    pub fn func(&self, id: FuncId) -> &FnSig {
        &self.funcs[id]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut FnSig {
        &mut self.funcs[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_model() -> Model {
        Model::new()
    }

    #[test]
    fn test_push_expr_returns_distinct_ids() {
        let mut m = dummy_model();
        let a = m.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let b = m.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        assert_ne!(a, b);
        assert_eq!(m.exprs.len(), 2);
    }

    #[test]
    fn test_expr_mut_updates_ty() {
        let mut m = dummy_model();
        let id = m.push_expr(ExprKind::Lit(Lit::Bool(true)), Span::DUMMY);
        m.expr_mut(id).ty = Type::par_bool();
        assert_eq!(m.expr(id).ty, Type::par_bool());
    }

    #[test]
    fn test_decl_default_position_unvisited() {
        let mut m = dummy_model();
        let dom = m.push_expr(ExprKind::TiId(Symbol::intern("int")), Span::DUMMY);
        let decl = m.push_decl(VarDecl {
            name: Symbol::intern("x"),
            ti: TypeInst::scalar(dom),
            init: None,
            annotations: Vec::new(),
            toplevel: true,
            position: None,
            span: Span::DUMMY,
        });
        assert!(m.decl(decl).position.is_none());
    }

    #[test]
    fn test_binop_as_str_plusplus() {
        assert_eq!(BinOp::PlusPlus.as_str(), "++");
    }
}
