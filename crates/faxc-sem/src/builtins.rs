//! Registers the fixed table of builtin functions and operator overloads
//! every model implicitly has available: the four coercion functions the
//! coercion inserter wraps calls in, and a pragmatic set of
//! arithmetic/comparison/logical/set operator overloads plus a handful of
//! permissive, `Type::top()`-parametrised library functions (`show`,
//! `array1d`, `join`, `to_enum`, `add_to_output`) that real models call but
//! whose exact signatures aren't load-bearing for type-checking.
//!
//! Called once per [`Model`] by the driver's first pass, before any
//! declaration or function from the model proper is registered, so that
//! user overloads and builtin overloads share one name -> overload-set
//! table in [`crate::env::SemaEnv`]'s function registry.
//!
//! Builtins are never added to `model.items`: they have no body to run
//! through the topological sorter or the typer's phase-1/phase-2 passes,
//! only a signature the typer's overload resolution reads.

use faxc_par::{BaseKind, FnSig, Inst, Model, Optionality, Type, TypeInst, VarDecl};
use faxc_util::{Span, Symbol};

use crate::env::SemaEnv;

fn ti_for(ty: Type) -> TypeInst {
    TypeInst {
        domain: None,
        is_var: ty.is_var(),
        is_set: ty.is_set(),
        is_opt: ty.optionality == Optionality::Optional,
        ranges: vec![None; ty.dim.max(0) as usize],
        is_enum: false,
        ty,
    }
}

fn push_param(model: &mut Model, name: &str, ty: Type) -> faxc_par::DeclId {
    model.push_decl(VarDecl {
        name: Symbol::intern(name),
        ti: ti_for(ty),
        init: None,
        annotations: Vec::new(),
        toplevel: false,
        position: None,
        span: Span::DUMMY,
    })
}

fn register(
    env: &mut SemaEnv,
    model: &mut Model,
    name: Symbol,
    param_tys: &[Type],
    ret_ty: Type,
    is_builtin_coercion: bool,
) {
    let params = param_tys
        .iter()
        .enumerate()
        .map(|(i, &ty)| push_param(model, &format!("_p{i}"), ty))
        .collect();
    let sig = FnSig {
        name,
        params,
        ret: ti_for(ret_ty),
        body: None,
        is_builtin_coercion,
    };
    let id = model.push_func(sig);
    env.functions.register(name, id);
}

/// Registers the four builtin coercion functions: `bool2int`,
/// `bool2float`, `int2float`, `set2array`.
fn register_coercions(env: &mut SemaEnv, model: &mut Model) {
    register(env, model, env.constants.bool2int, &[Type::par_bool()], Type::par_int(), true);
    register(env, model, env.constants.bool2int, &[Type::var_bool()], Type::var_int(), true);
    let var_float = Type::new(BaseKind::Float, Inst::Var);
    register(env, model, env.constants.bool2float, &[Type::par_bool()], Type::par_float(), true);
    register(env, model, env.constants.bool2float, &[Type::var_bool()], var_float, true);
    register(env, model, env.constants.int2float, &[Type::par_int()], Type::par_float(), true);
    register(env, model, env.constants.int2float, &[Type::var_int()], var_float, true);

    let par_set_top = Type::top().into_set();
    let var_set_top = Type::top().into_set().into_var();
    register(env, model, env.constants.set2array, &[par_set_top], Type::top().with_dim(1), true);
    register(env, model, env.constants.set2array, &[var_set_top], Type::top().with_dim(1).into_var(), true);
}

/// Registers a par/var overload pair `(base, base) -> base` for an
/// arithmetic or comparison operator whose result shares the operand base
/// (arithmetic), or `None` to force a bool result (comparisons).
fn register_binary_family(
    env: &mut SemaEnv,
    model: &mut Model,
    name: Symbol,
    bases: &[BaseKind],
    result_base_override: Option<BaseKind>,
) {
    for &base in bases {
        let par = Type::new(base, Inst::Par);
        let var = Type::new(base, Inst::Var);
        let par_ret = Type::new(result_base_override.unwrap_or(base), Inst::Par);
        let var_ret = Type::new(result_base_override.unwrap_or(base), Inst::Var);
        register(env, model, name, &[par, par], par_ret, false);
        register(env, model, name, &[var, var], var_ret, false);
    }
}

fn register_unary_family(env: &mut SemaEnv, model: &mut Model, name: Symbol, bases: &[BaseKind]) {
    for &base in bases {
        register(env, model, name, &[Type::new(base, Inst::Par)], Type::new(base, Inst::Par), false);
        register(env, model, name, &[Type::new(base, Inst::Var)], Type::new(base, Inst::Var), false);
    }
}

/// Registers the operator table: arithmetic and comparison overloads per
/// numeric base, logical operators over bool, and permissive set/array
/// operators parametrised with `Type::top()` (their element identity isn't
/// tracked precisely, matching the `Type::top()`-wildcard simplification
/// already used for `set2array`'s element type).
fn register_operators(env: &mut SemaEnv, model: &mut Model) {
    let numeric = [BaseKind::Int, BaseKind::Float];
    register_binary_family(env, model, Symbol::intern("+"), &numeric, None);
    register_binary_family(env, model, Symbol::intern("-"), &numeric, None);
    register_binary_family(env, model, Symbol::intern("*"), &numeric, None);
    register_binary_family(env, model, Symbol::intern("/"), &numeric, None);
    register_binary_family(env, model, Symbol::intern("mod"), &[BaseKind::Int], None);
    register_unary_family(env, model, Symbol::intern("-"), &numeric);

    let comparable = [BaseKind::Bool, BaseKind::Int, BaseKind::Float, BaseKind::String];
    for op in ["==", "!=", "<", "<=", ">", ">="] {
        register_binary_family(env, model, Symbol::intern(op), &comparable, Some(BaseKind::Bool));
    }

    register_binary_family(env, model, Symbol::intern("/\\"), &[BaseKind::Bool], None);
    register_binary_family(env, model, Symbol::intern("\\/"), &[BaseKind::Bool], None);
    register_binary_family(env, model, Symbol::intern("xor"), &[BaseKind::Bool], None);
    register_binary_family(env, model, Symbol::intern("->"), &[BaseKind::Bool], None);
    register_unary_family(env, model, Symbol::intern("not"), &[BaseKind::Bool]);

    let top = Type::top();
    let top_set = top.into_set();
    let top_arr = top.with_dim(1);
    register(env, model, Symbol::intern("in"), &[top, top_set], Type::var_bool(), false);
    register(env, model, Symbol::intern("subset"), &[top_set, top_set], Type::var_bool(), false);
    register(env, model, Symbol::intern("union"), &[top_set, top_set], top_set, false);
    register(env, model, Symbol::intern("intersect"), &[top_set, top_set], top_set, false);
    register(env, model, Symbol::intern("diff"), &[top_set, top_set], top_set, false);
    register(env, model, Symbol::intern(".."), &[Type::par_int(), Type::par_int()], Type::par_int().into_set(), false);
    register(env, model, Symbol::intern("++"), &[top_arr, top_arr], top_arr, false);
    register(env, model, Symbol::intern("++"), &[Type::par_string(), Type::par_string()], Type::par_string(), false);
}

/// Registers the handful of library functions the typer must be able to
/// resolve calls to even though no user model declares them: `show` (any
/// value to string), `array1d` (reshape a set/array into a 1-d array),
/// `join` (separator + array of strings), `to_enum` (raw int to a tagged
/// enum value) and `add_to_output` (mark a declaration for the model
/// interface). All use `Type::top()` parameters, mirroring the same
/// deliberate "matches anything" wildcard `set2array`'s element type uses.
fn register_library_functions(env: &mut SemaEnv, model: &mut Model) {
    let top = Type::top();
    register(env, model, env.constants.show, &[top], Type::par_string(), false);
    register(
        env,
        model,
        env.constants.array1d,
        &[top.into_set(), top.with_dim(1)],
        top.with_dim(1),
        false,
    );
    register(
        env,
        model,
        env.constants.join,
        &[Type::par_string(), Type::par_string().with_dim(1)],
        Type::par_string(),
        false,
    );
    register(
        env,
        model,
        env.constants.to_enum,
        &[Type::par_int(), Type::par_int()],
        Type::par_int(),
        false,
    );
    register(env, model, env.constants.add_to_output, &[top], Type::par_bool(), false);
}

/// Registers every builtin signature into `env`'s function registry,
/// pushing their synthetic `FnSig`s (and parameter `VarDecl`s) into
/// `model`'s arenas. Run once per model, before any user item is
/// processed.
pub fn register_builtins(env: &mut SemaEnv, model: &mut Model) {
    register_coercions(env, model);
    register_operators(env, model);
    register_library_functions(env, model);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtins_populates_bool2int() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        register_builtins(&mut env, &mut model);
        assert!(!env.functions.candidates(env.constants.bool2int).is_empty());
    }

    #[test]
    fn test_register_builtins_plus_has_par_and_var_overloads() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        register_builtins(&mut env, &mut model);
        let plus = env.functions.candidates(Symbol::intern("+"));
        assert!(plus.len() >= 4);
    }

    #[test]
    fn test_register_builtins_does_not_touch_items() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        register_builtins(&mut env, &mut model);
        assert!(model.items.is_empty());
    }

    #[test]
    fn test_show_accepts_a_top_parameter() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        register_builtins(&mut env, &mut model);
        let shows = env.functions.candidates(env.constants.show);
        assert_eq!(shows.len(), 1);
        let param = model.func(shows[0]).params[0];
        assert_eq!(model.decl(param).ti.ty.base, BaseKind::Top);
    }
}
