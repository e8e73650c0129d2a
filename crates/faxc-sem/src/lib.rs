//! faxc-sem - the type-checking and name-resolution core for a
//! MiniZinc-like constraint-modelling language.
//!
//! A caller (a parser crate, or a test fixture) builds a [`faxc_par::Model`]
//! and a [`SemaEnv`], then hands both to [`driver::typecheck`]. Everything
//! else in this crate is a pass that function calls internally:
//!
//! - [`scope`] — the declaration scope stack, with a permanently
//!   visible outermost "toplevel" frame.
//! - [`toposort`] — topological sort of declarations and forward-reference
//!   resolution.
//! - [`enum_expand`] — synthesises an enum's element declarations and
//!   `_toString_` overloads.
//! - [`coerce`] — the five-rule coercion ladder inserted wherever an
//!   expression's computed type doesn't already match its target.
//! - [`builtins`] — registers the coercion functions and the fixed
//!   operator/library-function table every model gets for free.
//! - [`typer`] — the bottom-up, two-phase expression typer.
//! - [`driver`] — orchestrates every pass above in sequence, P0 through P8,
//!   and is this crate's main entry point.
//! - [`fzn`] — a standalone fallback typer for already-flattened FlatZinc
//!   models, which infer a declaration's type from its domain rather than
//!   from a surface-syntax type-inst.
//! - [`model_interface`] — emits the input/output/method JSON object a
//!   solver front end reads to know what to prompt for and what to report
//!   after typing completes.
//! - [`env`] — the environment object threaded through every pass.
//! - [`errors`] — the diagnostic vocabulary every pass raises from.

pub mod builtins;
pub mod coerce;
pub mod driver;
pub mod env;
pub mod enum_expand;
pub mod errors;
pub mod fzn;
pub mod model_interface;
pub mod scope;
pub mod toposort;
pub mod typer;

pub use driver::{typecheck, typecheck_assign_item, typecheck_assign_items, typecheck_strict};
pub use env::SemaEnv;
pub use errors::{SemaError, SemaErrorKind, SemaResult};
