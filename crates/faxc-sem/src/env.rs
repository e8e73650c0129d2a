//! The caller-assembled, call-spanning context object: function registry,
//! enum registry, constants table, and diagnostic handler in one place.
//!
//! A `SemaEnv` is built once (`SemaEnv::new`) and threaded through every
//! entry point in [`crate`]; none of the checker's passes mutate the
//! registries after the scan-and-seed pass, so a single `SemaEnv` can safely back
//! repeated `typecheck` calls against independent models.

use faxc_par::{ConstantsTable, EnumRegistry, FunctionRegistry};
use faxc_util::diagnostic::Handler;

pub struct SemaEnv {
    pub functions: FunctionRegistry,
    pub enums: EnumRegistry,
    pub constants: ConstantsTable,
    pub handler: Handler,
    /// Toplevel par decls with no initialiser are tolerated
    /// instead of producing `missing-parameter` when this is set.
    pub ignore_undefined_params: bool,
}

impl Default for SemaEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SemaEnv {
    pub fn new() -> Self {
        SemaEnv {
            functions: FunctionRegistry::new(),
            enums: EnumRegistry::new(),
            constants: ConstantsTable::new(),
            handler: Handler::new(),
            ignore_undefined_params: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_env_has_no_errors() {
        let env = SemaEnv::new();
        assert!(!env.handler.has_errors());
    }

    #[test]
    fn test_ignore_undefined_params_defaults_false() {
        let env = SemaEnv::new();
        assert!(!env.ignore_undefined_params);
    }
}
