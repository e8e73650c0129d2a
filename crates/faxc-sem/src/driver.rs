//! The model driver: orchestrates every other pass over one
//! [`Model`] in a fixed sequence, P0 through P8.
//!
//! ```text
//! P0  register builtins, scan items, seed enum skeletons
//! P1  merge top-level assignments into their declaration's initialiser
//! P2  topological sort and name resolution (crate::toposort)
//! P3  stable item reordering by each declaration's rank
//! P4  phase-1 typing: every decl's type-inst, every function's signature
//! P5  phase-2 typing: every item's body/init, with coercion insertion
//! P6  finalize output items (merge multiple `output` items into one)
//! P7  overload-conflict check
//! P8  undefined-parameter diagnostic
//! ```

use faxc_par::{BaseKind, BinOp, DeclId, ExprId, ExprKind, FuncId, Inst, Item, Lit, Model, Optionality};
use faxc_util::Symbol;

use crate::builtins::register_builtins;
use crate::enum_expand::{expand_enum, expand_enum_skeleton};
use crate::env::SemaEnv;
use crate::errors::{SemaError, SemaErrorKind, SemaResult};
use crate::toposort::Sorter;
use crate::typer::BottomUpTyper;

/// The primary entry point: `typecheck(env, model, errors_out,
/// ignore_undefined_params)`.
///
/// Runs every pass over `model`, mutating it (and `env`'s registries) in
/// place, and appends every diagnostic raised along the way to
/// `errors_out` instead of stopping at the first one. This follows the
/// propagation policy: a structural failure in P0-P4 (a cycle, a bad
/// enum initialiser, a malformed type-inst — anything that would corrupt
/// later inference if ignored) aborts the run after recording one
/// diagnostic, while P5's per-item body typing and P8's per-declaration
/// undefined-parameter check keep going after a failing item so that
/// multiple independent diagnostics can surface from one run.
#[tracing::instrument(level = "debug", skip_all)]
pub fn typecheck(
    env: &mut SemaEnv,
    model: &mut Model,
    errors_out: &mut Vec<SemaError>,
    ignore_undefined_params: bool,
) {
    env.ignore_undefined_params = ignore_undefined_params;

    tracing::debug!("P0/P1: registering builtins, merging assignments, seeding enums");
    register_builtins(env, model);
    if let Err(e) = p1_merge_assignments(model) {
        record(env, errors_out, e);
        return;
    }
    let toplevel_decls = match p0_scan_and_seed(env, model) {
        Ok(decls) => decls,
        Err(e) => {
            record(env, errors_out, e);
            return;
        }
    };

    tracing::debug!("P2: topological sort");
    if let Err(e) = p2_sort(env, model, &toplevel_decls) {
        record(env, errors_out, e);
        return;
    }

    tracing::debug!("P3: stable item reorder");
    p3_reorder_items(model);

    tracing::debug!("P4: phase-1 typing");
    if let Err(e) = p4_phase1_typing(env, model) {
        record(env, errors_out, e);
        return;
    }

    tracing::debug!("P5: phase-2 typing");
    let mut phase2_errors = Vec::new();
    p5_phase2_typing_collecting(env, model, &mut phase2_errors);
    for e in phase2_errors {
        record(env, errors_out, e);
    }

    tracing::debug!("P6: finalize output items");
    p6_finalize_output(model);

    tracing::debug!("P7: overload-conflict check");
    if let Err(e) = p7_overload_conflicts(env, model) {
        record(env, errors_out, e);
    }

    tracing::debug!("P8: undefined-parameter diagnostic");
    let mut phase8_errors = Vec::new();
    p8_undefined_parameters_collecting(env, model, &mut phase8_errors);
    for e in phase8_errors {
        record(env, errors_out, e);
    }
}

/// Pushes `e` onto `errors_out` and mirrors it into `env.handler`, so a
/// caller that only watches the handler (rather than this run's collected
/// `Vec<SemaError>`) still observes every diagnostic a caller expects to surface.
fn record(env: &SemaEnv, errors_out: &mut Vec<SemaError>, e: SemaError) {
    env.handler.emit_diagnostic(e.to_diagnostic());
    errors_out.push(e);
}

/// An all-or-nothing variant of [`typecheck`] for callers (and tests) that
/// want the first diagnostic as a `Result` instead of a collected list.
pub fn typecheck_strict(env: &mut SemaEnv, model: &mut Model) -> SemaResult<()> {
    let mut errors = Vec::new();
    let ignore_undefined_params = env.ignore_undefined_params;
    typecheck(env, model, &mut errors, ignore_undefined_params);
    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// The single-assignment entry point: `typecheck(env, model,
/// assign_item)`. Types one data-file assignment's right-hand side and
/// requires it be a subtype of the already-typed left-hand declaration,
/// without re-running the full P0-P8 pipeline.
///
/// Intended for a caller that has already run [`typecheck`] once against
/// the bare model (so every declaration's type-inst is assembled) and now
/// wants to check a data file's assignments against it, one at a time,
/// without re-sorting or re-expanding anything.
pub fn typecheck_assign_item(
    env: &mut SemaEnv,
    model: &mut Model,
    decl: DeclId,
    rhs: ExprId,
) -> SemaResult<()> {
    let mut typer = BottomUpTyper::new(env, model, false);
    let target_ty = typer.model.decl(decl).ti.ty;
    let found_ty = typer.type_expr(rhs)?;
    let span = typer.model.expr(rhs).span;
    let coerced = crate::coerce::coerce(typer.env, typer.model, rhs, target_ty)
        .map_err(|_| SemaError::new(SemaErrorKind::TypeMismatch { expected: target_ty, found: found_ty }, span))?;
    typer.model.decl_mut(decl).init = Some(coerced);
    Ok(())
}

/// Convenience wrapper over [`typecheck_assign_item`] for every `Assign`
/// item already present in `model`, continuing past a failing assignment
/// so the caller sees every mismatch in one pass.
pub fn typecheck_assign_items(env: &mut SemaEnv, model: &mut Model, errors_out: &mut Vec<SemaError>) {
    let assigns: Vec<(DeclId, ExprId)> = model
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Assign { decl, rhs, .. } => Some((*decl, *rhs)),
            _ => None,
        })
        .collect();
    for (decl, rhs) in assigns {
        if let Err(e) = typecheck_assign_item(env, model, decl, rhs) {
            errors_out.push(e);
        }
    }
}

/// P1: merges every `Assign { decl, rhs }` item into the matching
/// declaration's `init` slot (rejecting a second assignment to the same
/// declaration) and drops the now-redundant `Assign` item. Enum expansion
/// itself is deferred to [`p0_scan_and_seed`], which sees every
/// declaration — assigned here, assigned inline, or left bare — exactly
/// once.
fn p1_merge_assignments(model: &mut Model) -> SemaResult<()> {
    let items = model.items.clone();
    let mut new_items = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Item::Assign { decl, rhs, span } => {
                if model.decl(decl).init.is_some() {
                    return Err(SemaError::new(
                        SemaErrorKind::MultipleAssignment(model.decl(decl).name),
                        span,
                    ));
                }
                model.decl_mut(decl).init = Some(rhs);
            }
            other => new_items.push(other),
        }
    }
    model.items = new_items;
    Ok(())
}

/// P0: walks the (already assignment-merged) item list once, registering
/// every function by name and expanding every enum declaration exactly
/// once — into a skeleton `_enum_to_string_` array when it still has no
/// initialiser, or into its full element/support-function family via
/// [`expand_enum`] otherwise. Both helpers splice their synthesised
/// declarations and functions directly into `model.items`, so this pass
/// only needs to record every toplevel declaration id (original and
/// synthesised) for the sorter's initial scope population.
fn p0_scan_and_seed(env: &mut SemaEnv, model: &mut Model) -> SemaResult<Vec<DeclId>> {
    let items = model.items.clone();
    let mut toplevel_decls = Vec::new();
    for item in &items {
        match item {
            Item::VarDecl(decl) => {
                toplevel_decls.push(*decl);
                if model.decl(*decl).ti.is_enum {
                    if model.decl(*decl).init.is_none() {
                        let array_decl = expand_enum_skeleton(model, *decl);
                        toplevel_decls.push(array_decl);
                    } else {
                        let extra = expand_enum(env, model, *decl)?;
                        toplevel_decls.extend(extra);
                    }
                }
            }
            Item::Function(func) => {
                let name = model.func(*func).name;
                env.functions.register(name, *func);
            }
            _ => {}
        }
    }
    Ok(toplevel_decls)
}

/// P2: installs every toplevel declaration into the sorter's outermost
/// frame, then resolves and ranks every item.
///
/// Every piece of model data the sorter needs about a toplevel declaration
/// (its name, whether it is an enum, its span) is read off `model` *before*
/// `Sorter::new` takes the model's only mutable borrow for the rest of the
/// pass; the item list is cloned for the same reason.
fn p2_sort(env: &mut SemaEnv, model: &mut Model, toplevel_decls: &[DeclId]) -> SemaResult<()> {
    let seed: Vec<(Symbol, DeclId, bool, faxc_util::Span)> = toplevel_decls
        .iter()
        .map(|&decl| {
            let d = model.decl(decl);
            (d.name, decl, d.ti.is_enum, d.span)
        })
        .collect();
    let items = model.items.clone();

    let mut sorter = Sorter::new(model);
    for (name, decl, is_enum, span) in seed {
        sorter
            .scope
            .add(name, decl, is_enum)
            .map_err(|k| SemaError::new(k, span))?;
    }

    for item in items {
        match item {
            Item::VarDecl(decl) | Item::Assign { decl, .. } => sorter.sort_decl(decl)?,
            Item::Constraint(expr) | Item::Output(expr) => sorter.sort_expr(expr)?,
            Item::Solve { objective, annotations, .. } => {
                if let Some(obj) = objective {
                    sorter.sort_expr(obj)?;
                }
                for ann in annotations {
                    sorter.sort_expr(ann)?;
                }
            }
            Item::Function(func) => sorter.sort_function(func)?,
        }
    }
    let _ = env;
    Ok(())
}

/// P3: a stable sort that places every `VarDecl` item in topological order
/// (by its declaration's rank) ahead of every other item kind, which keep
/// their original relative order. This is a deliberate simplification of
/// "reorder the full item list topologically": full
/// interleaving of constraints/solve/output among declarations by rank adds
/// no checking power, since those items were already ordered after every
/// declaration they reference by P2's forward-reference resolution.
fn p3_reorder_items(model: &mut Model) {
    let mut indexed: Vec<(usize, Item)> = model.items.drain(..).enumerate().collect();
    indexed.sort_by_key(|(idx, item)| match item {
        Item::VarDecl(d) => (0i64, model.decl(*d).position.unwrap_or(i64::MAX), *idx as i64),
        _ => (1i64, 0i64, *idx as i64),
    });
    model.items = indexed.into_iter().map(|(_, item)| item).collect();
}

/// P4: assembles every declaration's type-inst (top-level and nested: a
/// nested declaration bound by `let` or a comprehension is typed lazily the
/// first time phase 2 reaches it, since its type-inst is often derived from
/// context rather than a standalone domain expression) and every function's
/// signature.
fn p4_phase1_typing(env: &mut SemaEnv, model: &mut Model) -> SemaResult<()> {
    let decls: Vec<DeclId> = model
        .items
        .iter()
        .filter_map(|item| match item {
            Item::VarDecl(d) => Some(*d),
            _ => None,
        })
        .collect();
    let funcs: Vec<FuncId> = model
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Function(f) => Some(*f),
            _ => None,
        })
        .collect();

    let mut typer = BottomUpTyper::new(env, model, true);
    for decl in decls {
        let is_top = typer.model.decl(decl).toplevel;
        typer.type_ti(decl, is_top)?;
    }
    for func in funcs {
        typer.type_function_sig(func)?;
    }
    Ok(())
}

/// P5: types every item's body/init: declaration initialisers, constraint
/// expressions, the solve item's objective, output expressions and every
/// (non-builtin) function's body.
///
/// Each item is its own try-boundary ("driver wraps each top-level
/// item ... and continues to the next item on fatal failure"): a type
/// error in one constraint does not prevent the rest of the model from
/// being typed and reported on.
fn p5_phase2_typing_collecting(env: &mut SemaEnv, model: &mut Model, errors_out: &mut Vec<SemaError>) {
    let items = model.items.clone();
    let mut typer = BottomUpTyper::new(env, model, false);
    let mut solve_seen = false;
    for item in items {
        let result = p5_type_item(&mut typer, &item, &mut solve_seen);
        if let Err(e) = result {
            errors_out.push(e);
        }
    }
}

fn p5_type_item(typer: &mut BottomUpTyper<'_>, item: &Item, solve_seen: &mut bool) -> SemaResult<()> {
    match *item {
        Item::VarDecl(decl) => typer.check_decl_init(decl),
        Item::Constraint(expr) => {
            let ty = typer.type_expr(expr)?;
            if ty.base != BaseKind::Bool {
                return Err(SemaError::new(
                    SemaErrorKind::BadCondType { found: ty },
                    typer.model.expr(expr).span,
                ));
            }
            Ok(())
        }
        Item::Output(expr) => {
            typer.type_expr(expr)?;
            Ok(())
        }
        Item::Solve { objective, ref annotations, .. } => {
            if *solve_seen {
                return Err(SemaError::new(SemaErrorKind::OneSolveItem, faxc_util::Span::DUMMY));
            }
            *solve_seen = true;
            if let Some(obj) = objective {
                let ty = typer.type_expr(obj)?;
                if !matches!(ty.base, BaseKind::Int | BaseKind::Float) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch {
                            expected: faxc_par::Type::par_int(),
                            found: ty,
                        },
                        typer.model.expr(obj).span,
                    ));
                }
            }
            for &ann in annotations {
                typer.type_expr(ann)?;
            }
            Ok(())
        }
        Item::Function(func) => {
            if let Some(body) = typer.model.func(func).body {
                let ret_ty = typer.model.func(func).ret.ty;
                let span = typer.model.expr(body).span;
                let body_ty = typer.type_expr(body)?;
                let coerced = crate::coerce::coerce(typer.env, typer.model, body, ret_ty)
                    .map_err(|_| SemaError::new(SemaErrorKind::TypeMismatch { expected: ret_ty, found: body_ty }, span))?;
                if let Some(f) = typer.model.funcs.get_mut(func) {
                    f.body = Some(coerced);
                }
            }
            Ok(())
        }
        Item::Assign { .. } => Ok(()),
    }
}

/// P6: collapses every `output` item down to at most one, concatenating
/// (`++`) a second and later occurrence onto the first in item order.
fn p6_finalize_output(model: &mut Model) {
    let mut outputs = Vec::new();
    let mut rest = Vec::new();
    for item in model.items.drain(..) {
        match item {
            Item::Output(e) => outputs.push(e),
            other => rest.push(other),
        }
    }
    if let Some(&first) = outputs.first() {
        let merged = outputs[1..].iter().fold(first, |acc, &next| {
            let span = model.expr(next).span;
            model.push_expr(
                ExprKind::BinOp {
                    op: BinOp::PlusPlus,
                    lhs: acc,
                    rhs: next,
                    resolved: None,
                },
                span,
            )
        });
        rest.push(Item::Output(merged));
    }
    model.items = rest;
}

/// P7: two overloads of the same name are only a genuine conflict once
/// their parameter types are fully known and identical across every
/// parameter; this runs after P4/P5 so every signature is concrete.
fn p7_overload_conflicts(env: &SemaEnv, model: &Model) -> SemaResult<()> {
    for name in env.functions.names() {
        let candidates = env.functions.candidates(name);
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let a = &model.func(candidates[i]).params;
                let b = &model.func(candidates[j]).params;
                if a.len() != b.len() {
                    continue;
                }
                let identical = a.iter().zip(b).all(|(&pa, &pb)| {
                    model.decl(pa).ti.ty == model.decl(pb).ti.ty
                });
                if identical {
                    return Err(SemaError::new(
                        SemaErrorKind::OverloadConflict(name),
                        faxc_util::Span::DUMMY,
                    ));
                }
            }
        }
    }
    Ok(())
}

/// P8: every toplevel `par` declaration with no initialiser is either
/// given `absent` (if its type-inst is `opt`) or is a missing model
/// parameter, unless [`SemaEnv::ignore_undefined_params`] is set. A
/// declaration typed `ann` is annotation-typed and exempt either way.
///
/// Every unbound declaration is its own try-boundary, so one missing
/// parameter doesn't hide the rest: `errors_out` collects a
/// `MissingParameter` diagnostic per offending declaration.
fn p8_undefined_parameters_collecting(env: &SemaEnv, model: &mut Model, errors_out: &mut Vec<SemaError>) {
    if env.ignore_undefined_params {
        return;
    }
    let candidates: Vec<DeclId> = model
        .items
        .iter()
        .filter_map(|item| match item {
            Item::VarDecl(d) => Some(*d),
            _ => None,
        })
        .collect();
    for decl in candidates {
        let d = model.decl(decl);
        let unbound = d.toplevel
            && d.init.is_none()
            && !d.ti.is_var
            && d.ti.ty.inst == Inst::Par
            && d.ti.ty.base != BaseKind::Top
            && d.ti.ty.base != BaseKind::Ann;
        if !unbound {
            continue;
        }
        if d.ti.ty.optionality == Optionality::Optional {
            let span = d.span;
            let absent_ty = faxc_par::Type::bot().into_optional();
            let absent = model.push_expr(ExprKind::Lit(Lit::Absent), span);
            model.expr_mut(absent).ty = absent_ty;
            model.decl_mut(decl).init = Some(absent);
        } else {
            errors_out.push(SemaError::new(SemaErrorKind::MissingParameter(d.name), d.span));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_par::{Lit, Optionality, TypeInst, VarDecl};
    use faxc_util::Span;

    fn int_ti(m: &mut Model) -> TypeInst {
        let dom = m.push_expr(ExprKind::TiId(Symbol::intern("int")), Span::DUMMY);
        TypeInst::scalar(dom)
    }

    fn opt_int_ti(m: &mut Model) -> TypeInst {
        let mut ti = int_ti(m);
        ti.is_opt = true;
        ti
    }

    fn toplevel_decl(m: &mut Model, name: &str, ti: TypeInst, init: Option<ExprId>) -> DeclId {
        m.push_decl(VarDecl {
            name: Symbol::intern(name),
            ti,
            init,
            annotations: Vec::new(),
            toplevel: true,
            position: None,
            span: Span::DUMMY,
        })
    }

    #[test]
    fn test_typecheck_empty_model_has_no_errors() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, false);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_typecheck_forward_referenced_constraint() {
        // int: x; constraint x > y; int: y = 3;
        let mut env = SemaEnv::new();
        let mut model = Model::new();

        let x_ti = int_ti(&mut model);
        let x = toplevel_decl(&mut model, "x", x_ti, None);
        model.items.push(Item::VarDecl(x));

        let x_ref = model.push_expr(ExprKind::Id { name: Symbol::intern("x"), decl: None }, Span::DUMMY);
        let y_ref = model.push_expr(ExprKind::Id { name: Symbol::intern("y"), decl: None }, Span::DUMMY);
        let cond = model.push_expr(
            ExprKind::BinOp { op: BinOp::Gt, lhs: x_ref, rhs: y_ref, resolved: None },
            Span::DUMMY,
        );
        model.items.push(Item::Constraint(cond));

        let three = model.push_expr(ExprKind::Lit(Lit::Int(3)), Span::DUMMY);
        let y_ti = int_ti(&mut model);
        let y = toplevel_decl(&mut model, "y", y_ti, Some(three));
        model.items.push(Item::VarDecl(y));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, true);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(model.expr(cond).ty.base, BaseKind::Bool);
    }

    #[test]
    fn test_typecheck_undefined_identifier_is_collected() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let bogus = model.push_expr(ExprKind::Id { name: Symbol::intern("nope"), decl: None }, Span::DUMMY);
        model.items.push(Item::Constraint(bogus));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, true);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, SemaErrorKind::UndefinedIdentifier(_)));
        assert!(env.handler.has_errors());
    }

    #[test]
    fn test_typecheck_unbound_par_is_missing_parameter() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = int_ti(&mut model);
        let n = toplevel_decl(&mut model, "n", ti, None);
        model.items.push(Item::VarDecl(n));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, false);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, SemaErrorKind::MissingParameter(_)));
    }

    #[test]
    fn test_typecheck_ignore_undefined_params_suppresses_missing_parameter() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = int_ti(&mut model);
        let n = toplevel_decl(&mut model, "n", ti, None);
        model.items.push(Item::VarDecl(n));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, true);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_typecheck_unbound_enum_is_missing_parameter() {
        // `enum Color;` with no data-file assignment is still a missing
        // toplevel par declaration, same as any other unbound `par`.
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let dom = model.push_expr(ExprKind::TiId(Symbol::intern("ann")), Span::DUMMY);
        let mut ti = TypeInst::scalar(dom);
        ti.is_enum = true;
        let color = toplevel_decl(&mut model, "Color", ti, None);
        model.items.push(Item::VarDecl(color));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, false);
        assert_eq!(errors.len(), 1, "unexpected errors: {errors:?}");
        match &errors[0].kind {
            SemaErrorKind::MissingParameter(name) => assert_eq!(name.as_str(), "Color"),
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_typecheck_unbound_optional_par_gets_absent() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = opt_int_ti(&mut model);
        let n = toplevel_decl(&mut model, "n", ti, None);
        model.items.push(Item::VarDecl(n));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, false);
        assert!(errors.is_empty());
        let init = model.decl(n).init.expect("absent literal installed");
        assert!(matches!(model.expr(init).kind, ExprKind::Lit(Lit::Absent)));
        assert_eq!(model.expr(init).ty.optionality, Optionality::Optional);
    }

    #[test]
    fn test_typecheck_collects_multiple_independent_errors() {
        // Two unrelated undefined identifiers, each its own constraint item.
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let a = model.push_expr(ExprKind::Id { name: Symbol::intern("a"), decl: None }, Span::DUMMY);
        let b = model.push_expr(ExprKind::Id { name: Symbol::intern("b"), decl: None }, Span::DUMMY);
        model.items.push(Item::Constraint(a));
        model.items.push(Item::Constraint(b));

        let mut errors = Vec::new();
        typecheck(&mut env, &mut model, &mut errors, true);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_typecheck_strict_returns_first_error() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let bogus = model.push_expr(ExprKind::Id { name: Symbol::intern("nope"), decl: None }, Span::DUMMY);
        model.items.push(Item::Constraint(bogus));
        env.ignore_undefined_params = true;

        let err = typecheck_strict(&mut env, &mut model).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::UndefinedIdentifier(_)));
    }

    #[test]
    fn test_typecheck_assign_item_coerces_int_to_float() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        register_builtins(&mut env, &mut model);

        let decl = model.push_decl(VarDecl {
            name: Symbol::intern("f"),
            ti: TypeInst {
                domain: None,
                is_var: false,
                is_set: false,
                is_opt: false,
                ranges: Vec::new(),
                is_enum: false,
                ty: faxc_par::Type::par_float(),
            },
            init: None,
            annotations: Vec::new(),
            toplevel: true,
            position: None,
            span: Span::DUMMY,
        });
        let one = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        model.expr_mut(one).ty = faxc_par::Type::par_int();

        typecheck_assign_item(&mut env, &mut model, decl, one).unwrap();
        let init = model.decl(decl).init.unwrap();
        assert_eq!(model.expr(init).ty.base, BaseKind::Float);
    }

    #[test]
    fn test_p3_reorder_places_var_decls_before_other_items_by_rank() {
        let mut model = Model::new();
        let ti_a = int_ti(&mut model);
        let a = toplevel_decl(&mut model, "a", ti_a, None);
        model.decl_mut(a).position = Some(1);
        let ti_b = int_ti(&mut model);
        let b = toplevel_decl(&mut model, "b", ti_b, None);
        model.decl_mut(b).position = Some(0);

        let out_expr = model.push_expr(ExprKind::Lit(Lit::Int(0)), Span::DUMMY);
        model.items.push(Item::Output(out_expr));
        model.items.push(Item::VarDecl(a));
        model.items.push(Item::VarDecl(b));

        p3_reorder_items(&mut model);
        match (&model.items[0], &model.items[1], &model.items[2]) {
            (Item::VarDecl(first), Item::VarDecl(second), Item::Output(_)) => {
                assert_eq!(*first, b);
                assert_eq!(*second, a);
            }
            other => panic!("unexpected item order: {other:?}"),
        }
    }

    #[test]
    fn test_p6_finalize_output_merges_multiple_outputs() {
        let mut model = Model::new();
        let s1 = model.push_expr(ExprKind::Lit(Lit::String("a".into())), Span::DUMMY);
        let s2 = model.push_expr(ExprKind::Lit(Lit::String("b".into())), Span::DUMMY);
        model.items.push(Item::Output(s1));
        model.items.push(Item::Output(s2));

        p6_finalize_output(&mut model);
        assert_eq!(model.items.len(), 1);
        match &model.items[0] {
            Item::Output(merged) => {
                assert!(matches!(model.expr(*merged).kind, ExprKind::BinOp { op: BinOp::PlusPlus, .. }));
            }
            other => panic!("expected a single merged output item, found {other:?}"),
        }
    }

    #[test]
    fn test_p1_merge_assignments_rejects_duplicate_assignment() {
        let mut model = Model::new();
        let ti = int_ti(&mut model);
        let decl = toplevel_decl(&mut model, "x", ti, None);
        let one = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let two = model.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        model.items.push(Item::Assign { decl, rhs: one, span: Span::DUMMY });
        model.items.push(Item::Assign { decl, rhs: two, span: Span::DUMMY });

        let err = p1_merge_assignments(&mut model).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::MultipleAssignment(_)));
    }
}
