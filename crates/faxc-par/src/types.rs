//! The type lattice used throughout the checker.
//!
//! A [`Type`] is a small value type combining base kind, inst (par/var),
//! structure (scalar/set), dimensionality, optionality, enum identity and a
//! taint flag. Subtyping is pointwise across these axes; see [`Type::is_subtype_of`].

use std::fmt;

/// The base kind of a value, independent of inst/structure/dim.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum BaseKind {
    /// Not yet computed.
    Unknown,
    /// Bottom of the lattice: subtype of everything, e.g. the type of `[]`.
    Bot,
    /// Top of the lattice: supertype of everything, used for polymorphic
    /// coercion targets such as `set2array`'s element type.
    Top,
    Bool,
    Int,
    Float,
    String,
    /// Annotation value.
    Ann,
}

/// Parameter (compile-time known) vs. decision variable (left to the solver).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Inst {
    Par,
    Var,
}

/// Scalar vs. set-of-scalar.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Structure {
    Plain,
    Set,
}

/// Present (always has a value) vs. optional (may be `absent`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Optionality {
    Present,
    Optional,
}

/// A [`Type`] value as described in the data model: base kind x inst x
/// structure x dimensionality x optionality x enum identity, plus a cv
/// (contains-variable) taint flag.
///
/// `dim` is the array rank: `0` for a scalar or set, `>0` for an array of
/// that rank, and `-1` for "polymorphic rank bound by a type-inst variable".
///
/// `enum_id` is `0` when the type carries no enum identity. For array types
/// the id refers to a row in the array-enum composite table (see
/// [`crate::registry::EnumRegistry`]) rather than a single enum directly.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Type {
    pub base: BaseKind,
    pub inst: Inst,
    pub structure: Structure,
    pub dim: i32,
    pub optionality: Optionality,
    pub cv: bool,
    pub enum_id: u32,
}

impl Type {
    pub const UNKNOWN: Type = Type {
        base: BaseKind::Unknown,
        inst: Inst::Par,
        structure: Structure::Plain,
        dim: 0,
        optionality: Optionality::Present,
        cv: false,
        enum_id: 0,
    };

    pub const fn new(base: BaseKind, inst: Inst) -> Self {
        Type {
            base,
            inst,
            structure: Structure::Plain,
            dim: 0,
            optionality: Optionality::Present,
            cv: false,
            enum_id: 0,
        }
    }

    pub const fn par_bool() -> Self {
        Self::new(BaseKind::Bool, Inst::Par)
    }
    pub const fn var_bool() -> Self {
        Self::new(BaseKind::Bool, Inst::Var)
    }
    pub const fn par_int() -> Self {
        Self::new(BaseKind::Int, Inst::Par)
    }
    pub const fn var_int() -> Self {
        Self::new(BaseKind::Int, Inst::Var)
    }
    pub const fn par_float() -> Self {
        Self::new(BaseKind::Float, Inst::Par)
    }
    pub const fn par_string() -> Self {
        Self::new(BaseKind::String, Inst::Par)
    }
    pub const fn bot() -> Self {
        Self::new(BaseKind::Bot, Inst::Par)
    }
    pub const fn top() -> Self {
        Self::new(BaseKind::Top, Inst::Par)
    }

    /// `self` with structure set to SET.
    pub fn into_set(mut self) -> Self {
        self.structure = Structure::Set;
        self
    }

    /// `self` with the given array dimensionality.
    pub fn with_dim(mut self, dim: i32) -> Self {
        self.dim = dim;
        self
    }

    /// `self` with inst forced to VAR (used when a var subterm is found).
    pub fn into_var(mut self) -> Self {
        self.inst = Inst::Var;
        self
    }

    pub fn into_optional(mut self) -> Self {
        self.optionality = Optionality::Optional;
        self
    }

    pub fn is_var(&self) -> bool {
        self.inst == Inst::Var
    }

    pub fn is_set(&self) -> bool {
        self.structure == Structure::Set
    }

    pub fn is_array(&self) -> bool {
        self.dim != 0
    }

    pub fn is_scalar(&self) -> bool {
        self.dim == 0 && self.structure == Structure::Plain
    }

    pub fn is_unknown(&self) -> bool {
        self.base == BaseKind::Unknown
    }

    /// Pointwise subtype relation: BOT below every base kind, TOP above,
    /// PAR <= VAR, PRESENT <= OPTIONAL; dim and structure must match exactly
    /// except for the BOT/TOP escape hatches; enum identities must match
    /// unless one of them is 0.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if self.dim != other.dim && other.base != BaseKind::Top && self.base != BaseKind::Bot {
            return false;
        }
        if self.structure != other.structure
            && other.base != BaseKind::Top
            && self.base != BaseKind::Bot
        {
            return false;
        }
        let base_ok = self.base == other.base
            || self.base == BaseKind::Bot
            || other.base == BaseKind::Top
            || other.base == BaseKind::Unknown;
        if !base_ok {
            return false;
        }
        let inst_ok = match (self.inst, other.inst) {
            (Inst::Par, _) => true,
            (Inst::Var, Inst::Var) => true,
            (Inst::Var, Inst::Par) => false,
        };
        if !inst_ok {
            return false;
        }
        let opt_ok = match (self.optionality, other.optionality) {
            (Optionality::Present, _) => true,
            (Optionality::Optional, Optionality::Optional) => true,
            (Optionality::Optional, Optionality::Present) => false,
        };
        if !opt_ok {
            return false;
        }
        self.enum_id == other.enum_id || self.enum_id == 0 || other.enum_id == 0
    }

    /// Join two comparable types: widens inst/optionality, keeps the
    /// non-bottom base kind, collapses enum identity on disagreement.
    pub fn join(&self, other: &Type) -> Type {
        let base = if self.base == BaseKind::Bot {
            other.base
        } else if other.base == BaseKind::Bot {
            self.base
        } else {
            self.base
        };
        let inst = if self.is_var() || other.is_var() {
            Inst::Var
        } else {
            Inst::Par
        };
        let optionality = if self.optionality == Optionality::Optional
            || other.optionality == Optionality::Optional
        {
            Optionality::Optional
        } else {
            Optionality::Present
        };
        let enum_id = if self.enum_id == other.enum_id {
            self.enum_id
        } else {
            0
        };
        Type {
            base,
            inst,
            structure: self.structure,
            dim: self.dim,
            optionality,
            cv: self.cv || other.cv,
            enum_id,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_var() {
            write!(f, "var ")?;
        }
        if self.optionality == Optionality::Optional {
            write!(f, "opt ")?;
        }
        for _ in 0..self.dim.max(0) {
            write!(f, "array of ")?;
        }
        if self.is_set() {
            write!(f, "set of ")?;
        }
        match self.base {
            BaseKind::Unknown => write!(f, "<unknown>"),
            BaseKind::Bot => write!(f, "<bottom>"),
            BaseKind::Top => write!(f, "<top>"),
            BaseKind::Bool => write!(f, "bool"),
            BaseKind::Int => write!(f, "int"),
            BaseKind::Float => write!(f, "float"),
            BaseKind::String => write!(f, "string"),
            BaseKind::Ann => write!(f, "ann"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_par_below_var() {
        assert!(Type::par_int().is_subtype_of(&Type::var_int()));
        assert!(!Type::var_int().is_subtype_of(&Type::par_int()));
    }

    #[test]
    fn test_subtype_bot_below_all() {
        assert!(Type::bot().is_subtype_of(&Type::par_int()));
        assert!(Type::bot().is_subtype_of(&Type::par_bool()));
    }

    #[test]
    fn test_subtype_top_above_all() {
        assert!(Type::par_int().is_subtype_of(&Type::top()));
    }

    #[test]
    fn test_subtype_present_below_optional() {
        let opt = Type::par_int().into_optional();
        assert!(Type::par_int().is_subtype_of(&opt));
        assert!(!opt.is_subtype_of(&Type::par_int()));
    }

    #[test]
    fn test_subtype_dim_mismatch_rejected() {
        let scalar = Type::par_int();
        let array = Type::par_int().with_dim(1);
        assert!(!scalar.is_subtype_of(&array));
    }

    #[test]
    fn test_subtype_enum_zero_matches_any() {
        let mut tagged = Type::par_int();
        tagged.enum_id = 3;
        let untagged = Type::par_int();
        assert!(untagged.is_subtype_of(&tagged));
        assert!(tagged.is_subtype_of(&untagged));
    }

    #[test]
    fn test_subtype_enum_mismatch_rejected() {
        let mut a = Type::par_int();
        a.enum_id = 1;
        let mut b = Type::par_int();
        b.enum_id = 2;
        assert!(!a.is_subtype_of(&b));
    }

    #[test]
    fn test_join_var_dominates() {
        let joined = Type::par_int().join(&Type::var_int());
        assert!(joined.is_var());
    }

    #[test]
    fn test_join_bottom_absorbed() {
        let joined = Type::bot().join(&Type::par_bool());
        assert_eq!(joined.base, BaseKind::Bool);
    }

    #[test]
    fn test_display_var_opt_array() {
        let ty = Type::par_int().into_var().into_optional().with_dim(1);
        assert_eq!(format!("{}", ty), "var opt array of int");
    }
}
