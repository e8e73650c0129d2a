//! The coercion inserter: given an expression already typed by the
//! bottom-up typer and a target type, either hands it back unchanged or
//! wraps it in the appropriate built-in coercion call (`bool2int`,
//! `bool2float`, `int2float`, `set2array`).
//!
//! Every rule below is checked in order; the first one that applies wins.
//! Wrapping a call also resolves it against the function registry so the
//! wrapper carries the same `resolved: Some(FuncId)` back-link an ordinary
//! call would.

use faxc_par::{BaseKind, Call, ExprId, ExprKind, Model, Type};
use faxc_util::Span;

use crate::env::SemaEnv;
use crate::errors::{SemaError, SemaErrorKind, SemaResult};

/// `coerce(expr, target) -> expr'`: the five-rule coercion ladder.
///
/// `expr`'s current type is read off `model.expr(expr).ty`, which the
/// caller must already have set via the bottom-up typer.
pub fn coerce(
    env: &mut SemaEnv,
    model: &mut Model,
    expr: ExprId,
    target: Type,
) -> SemaResult<ExprId> {
    let span = model.expr(expr).span;
    let source = model.expr(expr).ty;

    // Rule 1: identical dim and (target is BOT/TOP, bases equal, or source is BOT).
    if source.dim == target.dim
        && (target.base == BaseKind::Bot
            || target.base == BaseKind::Top
            || source.base == target.base
            || source.base == BaseKind::Bot)
    {
        return Ok(expr);
    }

    let mut current = expr;
    let mut current_ty = source;

    // Rule 2: scalar source, array target -> set2array.
    if source.dim == 0 && target.dim != 0 {
        if source.is_var() && source.is_set() {
            return Err(SemaError::new(
                SemaErrorKind::VarSetToArray,
                span,
            ));
        }
        let wrapped_ty = Type {
            dim: target.dim,
            structure: faxc_par::Structure::Plain,
            ..current_ty
        };
        current = wrap_call(env, model, env.constants.set2array, current, wrapped_ty, span);
        current_ty = wrapped_ty;
    }

    // Rule 3: after step 2, target TOP / bases equal / source BOT -> done.
    if target.base == BaseKind::Top || current_ty.base == target.base || current_ty.base == BaseKind::Bot {
        return Ok(current);
    }

    // Rule 4: element coercions.
    let (fn_sym, result_base) = match (current_ty.base, target.base) {
        (BaseKind::Bool, BaseKind::Int) => (env.constants.bool2int, BaseKind::Int),
        (BaseKind::Bool, BaseKind::Float) => (env.constants.bool2float, BaseKind::Float),
        (BaseKind::Int, BaseKind::Float) => (env.constants.int2float, BaseKind::Float),
        _ => {
            return Err(SemaError::new(
                SemaErrorKind::NoCoercion {
                    from: current_ty,
                    to: target,
                },
                span,
            ));
        }
    };

    let wrapped_ty = Type {
        base: result_base,
        ..current_ty
    };
    let result = wrap_call(env, model, fn_sym, current, wrapped_ty, span);
    Ok(result)
}

/// A pure, non-mutating mirror of [`coerce`]'s ladder, for overload-resolution
/// ranking: `None` if no coercion rule would apply, `Some(cost)` otherwise,
/// where `cost` counts how many wrapping steps the real call would insert
/// (0 for rule 1's passthrough, up so the typer can prefer the cheapest
/// overload among several that all technically accept the argument).
pub fn coercion_cost(source: Type, target: Type) -> Option<u32> {
    if source.dim == target.dim
        && (target.base == BaseKind::Top
            || target.base == BaseKind::Bot
            || source.base == target.base
            || source.base == BaseKind::Bot)
    {
        return Some(0);
    }

    let mut cost = 0u32;
    let mut current_base = source.base;

    if source.dim == 0 && target.dim != 0 {
        if source.is_var() && source.is_set() {
            return None;
        }
        cost += 1;
    }

    if target.base == BaseKind::Top || current_base == target.base || current_base == BaseKind::Bot {
        return Some(cost);
    }

    match (current_base, target.base) {
        (BaseKind::Bool, BaseKind::Int) | (BaseKind::Bool, BaseKind::Float) | (BaseKind::Int, BaseKind::Float) => {
            current_base = target.base;
            cost += 1;
        }
        _ => return None,
    }

    if current_base == target.base {
        Some(cost)
    } else {
        None
    }
}

fn wrap_call(
    env: &SemaEnv,
    model: &mut Model,
    name: faxc_util::Symbol,
    arg: ExprId,
    ty: Type,
    span: Span,
) -> ExprId {
    let resolved = env
        .functions
        .candidates(name)
        .first()
        .copied();
    let id = model.push_expr(
        ExprKind::Call(Call {
            name,
            args: vec![arg],
            resolved,
        }),
        span,
    );
    model.expr_mut(id).ty = ty;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_par::{ExprKind, Lit};

    fn setup() -> (SemaEnv, Model) {
        (SemaEnv::new(), Model::new())
    }

    #[test]
    fn test_identical_type_unchanged() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        model.expr_mut(e).ty = Type::par_int();
        let out = coerce(&mut env, &mut model, e, Type::par_int()).unwrap();
        assert_eq!(out, e);
    }

    #[test]
    fn test_bool_to_int_wraps_call() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::Lit(Lit::Bool(true)), Span::DUMMY);
        model.expr_mut(e).ty = Type::par_bool();
        let out = coerce(&mut env, &mut model, e, Type::par_int()).unwrap();
        assert_ne!(out, e);
        match &model.expr(out).kind {
            ExprKind::Call(c) => assert_eq!(c.name, env.constants.bool2int),
            _ => panic!("expected wrapped call"),
        }
        assert_eq!(model.expr(out).ty.base, BaseKind::Int);
    }

    #[test]
    fn test_scalar_to_array_wraps_set2array() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::SetLit(Vec::new()), Span::DUMMY);
        model.expr_mut(e).ty = Type::par_int().into_set();
        let target = Type::par_int().with_dim(1);
        let out = coerce(&mut env, &mut model, e, target).unwrap();
        match &model.expr(out).kind {
            ExprKind::Call(c) => assert_eq!(c.name, env.constants.set2array),
            _ => panic!("expected set2array wrapper"),
        }
    }

    #[test]
    fn test_var_set_to_array_rejected() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::SetLit(Vec::new()), Span::DUMMY);
        model.expr_mut(e).ty = Type::var_int().into_set();
        let target = Type::var_int().with_dim(1);
        let err = coerce(&mut env, &mut model, e, target).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::VarSetToArray));
    }

    #[test]
    fn test_no_coercion_rule_applies() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::Lit(Lit::String("x".into())), Span::DUMMY);
        model.expr_mut(e).ty = Type::par_string();
        let err = coerce(&mut env, &mut model, e, Type::par_int()).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::NoCoercion { .. }));
    }

    #[test]
    fn test_coercion_cost_identical_is_zero() {
        assert_eq!(coercion_cost(Type::par_int(), Type::par_int()), Some(0));
    }

    #[test]
    fn test_coercion_cost_bool_to_int_is_positive() {
        let cost = coercion_cost(Type::par_bool(), Type::par_int()).unwrap();
        assert!(cost > 0);
    }

    #[test]
    fn test_coercion_cost_no_rule_is_none() {
        assert_eq!(coercion_cost(Type::par_string(), Type::par_int()), None);
    }

    #[test]
    fn test_int_to_float_wraps_call() {
        let (mut env, mut model) = setup();
        let e = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        model.expr_mut(e).ty = Type::par_int();
        let out = coerce(&mut env, &mut model, e, Type::par_float()).unwrap();
        match &model.expr(out).kind {
            ExprKind::Call(c) => assert_eq!(c.name, env.constants.int2float),
            _ => panic!("expected int2float wrapper"),
        }
    }
}
