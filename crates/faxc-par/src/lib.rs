//! faxc-par - AST and model container for the constraint-modelling checker
//!
//! This crate holds the node shapes a type checker touches — the [`ast`]
//! module's `Model` arena, the [`types`] module's type lattice, and the
//! [`registry`] module's function/enum/constants tables — without owning
//! any lexer or parser. A `Model` is built programmatically by a caller
//! (their own parser, or a test fixture) and handed to `faxc-sem`.
//!
//! Splitting the AST out from the checker itself mirrors how a front end
//! and a type-checking middle end are usually kept as separate crates: the
//! checker crate depends on this one for node shapes, not the reverse.

pub mod ast;
pub mod registry;
pub mod types;

pub use ast::{
    BinOp, Call, DeclId, ExprId, ExprKind, ExprNode, FnSig, FuncId, Generator, IfThenElse, Item,
    Let, Lit, Model, SolveMethod, TypeInst, UnOp, VarDecl,
};
pub use registry::{ConstantsTable, EnumRegistry, FunctionRegistry};
pub use types::{BaseKind, Inst, Optionality, Structure, Type};
