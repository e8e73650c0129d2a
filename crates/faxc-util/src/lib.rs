//! faxc-util - Core Utilities and Foundation Types
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! This module provides fundamental utilities and types that form the foundation
//! of the entire faxc compiler infrastructure. These utilities are designed to be
//! zero-cost abstractions that improve code clarity, type safety, and performance
//! without runtime overhead.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. ZERO-COST ABSTRACTIONS
//!    All utilities compile down to efficient code with no runtime penalty
//!    compared to hand-written implementations.
//!
//! 2. TYPE SAFETY
//!    Leverage Rust's type system to prevent bugs at compile time.
//!    Examples: Typed indices prevent mixing different ID spaces.
//!
//! 3. PERFORMANCE
//!    Optimize for the common case while maintaining correctness.
//!    Examples: Efficient string interning, lock-free data structures.
//!
//! 4. ERGONOMICS
//!    APIs should be intuitive and easy to use correctly.
//!    Examples: Builder patterns, type inference-friendly interfaces.
//!
//! ============================================================================
//! STRING INTERNING (SYMBOL)
//! ============================================================================
//!
//! String interning is a technique for storing only one copy of each distinct
//! string value, which must be immutable. All occurrences of the same string
//! point to the same memory location, enabling fast equality comparisons and
//! reducing memory usage. See [`symbol`] for the concrete implementation.
//!
//! ============================================================================
//! TYPED INDICES
//! ============================================================================
//!
//! Using raw `usize`/`u32` for every index space in a compiler is error-prone:
//! a [`def_id::DefId`] and a rib index are both integers, but mixing them up
//! should be a type error, not a runtime bug. [`index_vec::Idx`] and
//! [`index_vec::IndexVec`] give every index space its own newtype at zero
//! runtime cost.

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

// Re-export commonly used hash collection types; these are used throughout
// the downstream crates for fast, non-cryptographic hashing of interned
// symbols and typed indices.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
