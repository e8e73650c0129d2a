//! The FlatZinc fallback typer: a deliberately narrow sibling of
//! [`crate::typer`] for models that arrive already flattened, where every
//! declaration's domain is either a concrete `lo..hi` range or a reference
//! to another declaration rather than surface-syntax the bottom-up typer
//! was built to read.
//!
//! This pass never runs the full two-phase typer, never expands enums,
//! never inserts coercions: it exists solely to assign a base kind to a
//! declaration still carrying [`Type::UNKNOWN`], so that
//! [`crate::model_interface::write_model_interface`] has something to
//! classify.

use faxc_par::{BaseKind, ExprKind, Item, Lit, Model};

use crate::env::SemaEnv;
use crate::errors::{SemaError, SemaErrorKind, SemaResult};

/// Runs over every toplevel `VarDecl` in `model` whose type is still
/// [`Type::UNKNOWN`][faxc_par::Type::UNKNOWN].
///
/// Tries the range (`lo..hi`) reading of the domain first, then the
/// identifier reading, then fails with `fzn-unknown-type` — an explicit
/// `if let`/`else if let`/`else` chain, not C-style fall-through.
#[tracing::instrument(level = "debug", skip_all)]
pub fn typecheck_fzn(env: &SemaEnv, model: &mut Model) -> SemaResult<()> {
    let _ = env;
    let decls: Vec<faxc_par::DeclId> = model
        .items
        .iter()
        .filter_map(|item| match item {
            Item::VarDecl(d) => Some(*d),
            _ => None,
        })
        .collect();

    for decl in decls {
        if !model.decl(decl).ti.ty.is_unknown() {
            continue;
        }
        let base = infer_domain_base(model, decl)?;
        model.decl_mut(decl).ti.ty.base = base;
    }
    Ok(())
}

/// Infers the base kind of `decl`'s domain, trying the range reading, then
/// the identifier reading, in that order.
fn infer_domain_base(model: &Model, decl: faxc_par::DeclId) -> SemaResult<BaseKind> {
    let span = model.decl(decl).span;
    let domain = model
        .decl(decl)
        .ti
        .domain
        .ok_or_else(|| SemaError::new(SemaErrorKind::FznUnknownType(model.decl(decl).name), span))?;

    if let Some(base) = range_lo_base(model, domain) {
        Ok(base)
    } else if let Some(base) = identifier_ref_base(model, domain) {
        Ok(base)
    } else {
        Err(SemaError::new(
            SemaErrorKind::FznUnknownType(model.decl(decl).name),
            model.expr(domain).span,
        ))
    }
}

/// `lo..hi` domain: take `lo`'s literal base kind.
fn range_lo_base(model: &Model, domain: faxc_par::ExprId) -> Option<BaseKind> {
    match &model.expr(domain).kind {
        ExprKind::BinOp { op: faxc_par::BinOp::Range, lhs, .. } => literal_base(model, *lhs),
        _ => None,
    }
}

/// Identifier domain: resolve to the referenced declaration's base kind.
fn identifier_ref_base(model: &Model, domain: faxc_par::ExprId) -> Option<BaseKind> {
    match &model.expr(domain).kind {
        ExprKind::Id { decl: Some(d), .. } => {
            let base = model.decl(*d).ti.ty.base;
            if base == BaseKind::Unknown {
                None
            } else {
                Some(base)
            }
        }
        _ => None,
    }
}

fn literal_base(model: &Model, expr: faxc_par::ExprId) -> Option<BaseKind> {
    match &model.expr(expr).kind {
        ExprKind::Lit(Lit::Int(_)) => Some(BaseKind::Int),
        ExprKind::Lit(Lit::Float(_)) => Some(BaseKind::Float),
        ExprKind::Lit(Lit::Bool(_)) => Some(BaseKind::Bool),
        ExprKind::Lit(Lit::String(_)) => Some(BaseKind::String),
        ExprKind::Id { decl: Some(d), .. } => {
            let base = model.decl(*d).ti.ty.base;
            (base != BaseKind::Unknown).then_some(base)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_par::{BinOp, DeclId, TypeInst, VarDecl};
    use faxc_util::{Span, Symbol};

    fn unknown_decl(m: &mut Model, name: &str, domain: Option<faxc_par::ExprId>) -> DeclId {
        m.push_decl(VarDecl {
            name: Symbol::intern(name),
            ti: TypeInst {
                domain,
                is_var: false,
                is_set: false,
                is_opt: false,
                ranges: Vec::new(),
                is_enum: false,
                ty: faxc_par::Type::UNKNOWN,
            },
            init: None,
            annotations: Vec::new(),
            toplevel: true,
            position: None,
            span: Span::DUMMY,
        })
    }

    #[test]
    fn test_range_domain_infers_int() {
        let mut model = Model::new();
        let lo = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let hi = model.push_expr(ExprKind::Lit(Lit::Int(10)), Span::DUMMY);
        let range = model.push_expr(ExprKind::BinOp { op: BinOp::Range, lhs: lo, rhs: hi, resolved: None }, Span::DUMMY);
        let decl = unknown_decl(&mut model, "x", Some(range));
        model.items.push(Item::VarDecl(decl));

        let env = SemaEnv::new();
        typecheck_fzn(&env, &mut model).unwrap();
        assert_eq!(model.decl(decl).ti.ty.base, BaseKind::Int);
    }

    #[test]
    fn test_identifier_domain_resolves_referenced_base() {
        let mut model = Model::new();
        let bounds = unknown_decl(&mut model, "bounds", None);
        model.decl_mut(bounds).ti.ty.base = BaseKind::Float;

        let ref_expr = model.push_expr(ExprKind::Id { name: Symbol::intern("bounds"), decl: Some(bounds) }, Span::DUMMY);
        let decl = unknown_decl(&mut model, "y", Some(ref_expr));
        model.items.push(Item::VarDecl(decl));

        let env = SemaEnv::new();
        typecheck_fzn(&env, &mut model).unwrap();
        assert_eq!(model.decl(decl).ti.ty.base, BaseKind::Float);
    }

    #[test]
    fn test_unresolvable_domain_is_fzn_unknown_type() {
        let mut model = Model::new();
        let str_lit = model.push_expr(ExprKind::Lit(Lit::String("oops".into())), Span::DUMMY);
        let decl = unknown_decl(&mut model, "z", Some(str_lit));
        model.items.push(Item::VarDecl(decl));

        let env = SemaEnv::new();
        let err = typecheck_fzn(&env, &mut model).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::FznUnknownType(_)));
    }

    #[test]
    fn test_already_known_decl_is_left_untouched() {
        let mut model = Model::new();
        let decl = unknown_decl(&mut model, "w", None);
        model.decl_mut(decl).ti.ty = faxc_par::Type::par_bool();
        model.items.push(Item::VarDecl(decl));

        let env = SemaEnv::new();
        typecheck_fzn(&env, &mut model).unwrap();
        assert_eq!(model.decl(decl).ti.ty, faxc_par::Type::par_bool());
    }
}
