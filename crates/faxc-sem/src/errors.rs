//! Semantic-analysis error kinds.
//!
//! One variant per row of the diagnostics table: each carries the data a
//! human-readable message needs (involved identifiers, kinds involved) and
//! nothing else. `SemaError` pairs a kind with the span it was raised at,
//! mirroring the `{Symbol,SourceMap,IndexVec,Diagnostic}Error` shape in
//! `faxc_util::error`.

use faxc_util::diagnostic::{Diagnostic, DiagnosticCode};
use faxc_util::{Span, Symbol};
use thiserror::Error;

use faxc_par::Type;

#[derive(Debug, Error, Clone)]
pub enum SemaErrorKind {
    #[error("undefined identifier `{0}`")]
    UndefinedIdentifier(Symbol),

    #[error("circular definition involving `{0}`")]
    CircularDefinition(Symbol),

    #[error("redefinition of `{0}`")]
    Redefinition(Symbol),

    #[error("enum declaration `{0}` with initialiser outside the top-level frame")]
    EnumNotTopLevel(Symbol),

    #[error("invalid enum initialiser for `{0}`")]
    InvalidEnumInit(Symbol),

    #[error("multiple assignment to `{0}`")]
    MultipleAssignment(Symbol),

    #[error("non-uniform set literal")]
    NonUniformSet,

    #[error("non-uniform array literal")]
    NonUniformArray,

    #[error("nested array literal")]
    ArrayNested,

    #[error("array access rank mismatch: expected {expected}, found {found}")]
    ArrayAccessRank { expected: usize, found: usize },

    #[error("invalid index set")]
    BadIndexSet,

    #[error("index type must be int (or the array axis's enum)")]
    IndexType,

    #[error("cannot coerce a var set to an array")]
    VarSetToArray,

    #[error("no coercion from {from} to {to}")]
    NoCoercion { from: Type, to: Type },

    #[error("if-then-else condition must be bool, found {found}")]
    BadCondType { found: Type },

    #[error("if-then-else with a var condition cannot produce an array result")]
    CondVarArray,

    #[error("no function or operator named `{0}` matches the given argument types")]
    OverloadNone(Symbol),

    #[error("two overloads of `{0}` are indistinguishable")]
    OverloadConflict(Symbol),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("var set-of-X binding `{0}` has no initialiser and no domain")]
    InfiniteSetVar(Symbol),

    #[error("par binding `{0}` has no initialiser")]
    ParamNeedsInit(Symbol),

    #[error("let binding `{0}` has a type-inst-identifier type, which is only valid in a function signature")]
    TiidInLet(Symbol),

    #[error("top-level declaration `{0}` uses a type-inst identifier, which is only valid in a function signature")]
    TiidInTopDecl(Symbol),

    #[error("invalid type-inst domain")]
    BadTiDomain,

    #[error("var set must be a set of int")]
    BadVarSet,

    #[error("a second solve item was encountered")]
    OneSolveItem,

    #[error("top-level parameter `{0}` was never given a value")]
    MissingParameter(Symbol),

    #[error("FlatZinc declaration `{0}` has an unresolvable base type")]
    FznUnknownType(Symbol),

    #[error("set element in a var context must be int, found {found}")]
    SetElemNotInt { found: Type },
}

impl SemaErrorKind {
    /// The stable diagnostic code for this error kind, in table order
    /// (`E5001..E5029`), distinct from the `faxc_util` parse/lex ranges.
    pub fn code(&self) -> DiagnosticCode {
        let n = match self {
            SemaErrorKind::UndefinedIdentifier(_) => 1,
            SemaErrorKind::CircularDefinition(_) => 2,
            SemaErrorKind::Redefinition(_) => 3,
            SemaErrorKind::EnumNotTopLevel(_) => 4,
            SemaErrorKind::InvalidEnumInit(_) => 5,
            SemaErrorKind::MultipleAssignment(_) => 6,
            SemaErrorKind::NonUniformSet => 7,
            SemaErrorKind::NonUniformArray => 8,
            SemaErrorKind::ArrayNested => 9,
            SemaErrorKind::ArrayAccessRank { .. } => 10,
            SemaErrorKind::BadIndexSet => 11,
            SemaErrorKind::IndexType => 12,
            SemaErrorKind::VarSetToArray => 13,
            SemaErrorKind::NoCoercion { .. } => 14,
            SemaErrorKind::BadCondType { .. } => 15,
            SemaErrorKind::CondVarArray => 16,
            SemaErrorKind::OverloadNone(_) => 17,
            SemaErrorKind::OverloadConflict(_) => 18,
            SemaErrorKind::TypeMismatch { .. } => 19,
            SemaErrorKind::InfiniteSetVar(_) => 20,
            SemaErrorKind::ParamNeedsInit(_) => 21,
            SemaErrorKind::TiidInLet(_) => 22,
            SemaErrorKind::TiidInTopDecl(_) => 23,
            SemaErrorKind::BadTiDomain => 24,
            SemaErrorKind::BadVarSet => 25,
            SemaErrorKind::OneSolveItem => 26,
            SemaErrorKind::MissingParameter(_) => 27,
            SemaErrorKind::FznUnknownType(_) => 28,
            SemaErrorKind::SetElemNotInt { .. } => 29,
        };
        DiagnosticCode::new("E", 5000 + n)
    }
}

/// A semantic error at a source location.
#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct SemaError {
    pub kind: SemaErrorKind,
    pub span: Span,
}

impl SemaError {
    pub fn new(kind: SemaErrorKind, span: Span) -> Self {
        SemaError { kind, span }
    }

    /// Renders this error as a [`Diagnostic`] carrying its stable
    /// [`DiagnosticCode`], for handing to [`faxc_util::diagnostic::Handler`].
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.kind.to_string(), self.span).with_code(self.kind.code())
    }
}

pub type SemaResult<T> = std::result::Result<T, SemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ranges_distinct_per_variant() {
        let a = SemaErrorKind::UndefinedIdentifier(Symbol::intern("x")).code();
        let b = SemaErrorKind::CircularDefinition(Symbol::intern("y")).code();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_code_prefix_is_e() {
        let code = SemaErrorKind::MissingParameter(Symbol::intern("n")).code();
        assert_eq!(code.prefix(), "E");
    }

    #[test]
    fn test_error_display_includes_identifier() {
        let err = SemaError::new(
            SemaErrorKind::Redefinition(Symbol::intern("x")),
            Span::DUMMY,
        );
        assert!(format!("{}", err).contains("redefinition"));
    }

    #[test]
    fn test_to_diagnostic_carries_the_same_code() {
        let err = SemaError::new(SemaErrorKind::OneSolveItem, Span::DUMMY);
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, Some(err.kind.code()));
    }
}
