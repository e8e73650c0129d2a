//! Enum support-declaration synthesis.
//!
//! A declaration whose type-inst names an enum domain needs machinery no
//! parser could have written out: a stable per-element integer encoding,
//! an array mapping that encoding back to display strings, and a family of
//! `_toString_` overloads (scalar, array, set) used wherever the value is
//! shown. This module builds all of it and splices it into the model as
//! ordinary declarations and functions.

use faxc_par::{
    BinOp, Call, DeclId, ExprId, ExprKind, FnSig, Generator, IfThenElse, Item, Lit, Model,
    TypeInst, Type, VarDecl,
};
use faxc_util::{Span, Symbol};

use crate::env::SemaEnv;
use crate::errors::{SemaError, SemaErrorKind, SemaResult};

/// Builds the `_toString_`/`_enum_to_string_` prefix, inserting it after a
/// leading quote if the enum identifier is itself quoted (e.g. an
/// identifier spelled `'Color'`).
fn prefixed_name(prefix: &str, enum_name: &str) -> String {
    match enum_name.strip_prefix('\'') {
        Some(rest) => format!("'{prefix}{rest}"),
        None => format!("{prefix}{enum_name}"),
    }
}

fn push_str_lit(model: &mut Model, s: impl Into<String>, span: Span) -> ExprId {
    model.push_expr(ExprKind::Lit(Lit::String(s.into())), span)
}

fn push_int_lit(model: &mut Model, n: i64, span: Span) -> ExprId {
    model.push_expr(ExprKind::Lit(Lit::Int(n)), span)
}

fn push_concat(model: &mut Model, lhs: ExprId, rhs: ExprId, span: Span) -> ExprId {
    model.push_expr(
        ExprKind::BinOp {
            op: BinOp::PlusPlus,
            lhs,
            rhs,
            resolved: None,
        },
        span,
    )
}

fn push_id(model: &mut Model, name: Symbol, decl: DeclId, span: Span) -> ExprId {
    model.push_expr(
        ExprKind::Id {
            name,
            decl: Some(decl),
        },
        span,
    )
}

fn push_call(model: &mut Model, name: Symbol, args: Vec<ExprId>, span: Span) -> ExprId {
    model.push_expr(
        ExprKind::Call(Call {
            name,
            args,
            resolved: None,
        }),
        span,
    )
}

fn builtin_ti(model: &mut Model, name: &str, span: Span) -> TypeInst {
    TypeInst::scalar(model.push_expr(ExprKind::TiId(Symbol::intern(name)), span))
}

fn push_param(model: &mut Model, pname: &str, ti: TypeInst, span: Span) -> DeclId {
    model.push_decl(VarDecl {
        name: Symbol::intern(pname),
        ti,
        init: None,
        annotations: Vec::new(),
        toplevel: false,
        position: None,
        span,
    })
}

/// Expand `decl` (already known to be an enum declaration) according to the
/// form of its current initialiser, synthesising support declarations and
/// functions into `model` and registering the functions in `env`.
///
/// Returns the newly created declarations (element constants and the
/// `_enum_to_string_` array), which the caller must still run through the
/// topological sorter.
pub fn expand_enum(env: &mut SemaEnv, model: &mut Model, decl: DeclId) -> SemaResult<Vec<DeclId>> {
    let name = model.decl(decl).name;
    let span = model.decl(decl).span;
    env.enums.intern_enum(name);

    if model.decl(decl).init.is_none() {
        let array_decl = expand_enum_skeleton(model, decl);
        return Ok(vec![array_decl]);
    }

    let element_names = read_element_names(env, model, decl, name, span)?;

    let mut new_decls = Vec::new();

    if let Some(names) = &element_names {
        let enum_id = env.enums.enum_id_of(name).expect("just interned") as i64;
        for (i, &elem_name) in names.iter().enumerate() {
            let idx_lit = push_int_lit(model, (i + 1) as i64, span);
            let enum_id_lit = push_int_lit(model, enum_id, span);
            let call = push_call(model, env.constants.to_enum, vec![enum_id_lit, idx_lit], span);
            let elem_ti = TypeInst::scalar(push_id(model, name, decl, span));
            let elem_decl = model.push_decl(VarDecl {
                name: elem_name,
                ti: elem_ti,
                init: Some(call),
                annotations: Vec::new(),
                toplevel: true,
                position: None,
                span,
            });
            model.items.push(Item::VarDecl(elem_decl));
            new_decls.push(elem_decl);
        }

        let one = push_int_lit(model, 1, span);
        let n = push_int_lit(model, names.len() as i64, span);
        let range = model.push_expr(
            ExprKind::BinOp {
                op: BinOp::Range,
                lhs: one,
                rhs: n,
                resolved: None,
            },
            span,
        );
        model.decl_mut(decl).init = Some(range);
    }

    let array_decl = push_enum_to_string_array(model, name, &element_names, span);
    model.items.push(Item::VarDecl(array_decl));
    new_decls.push(array_decl);

    push_to_string_functions(env, model, decl, name, array_decl, element_names.is_some(), span);

    Ok(new_decls)
}

/// The "no initialiser" case: only the skeleton array is created, to
/// be filled in later if an assignment to this enum arrives.
pub fn expand_enum_skeleton(model: &mut Model, decl: DeclId) -> DeclId {
    let name = model.decl(decl).name;
    let span = model.decl(decl).span;
    let array_decl = push_enum_to_string_array(model, name, &None, span);
    model.items.push(Item::VarDecl(array_decl));
    array_decl
}

fn read_element_names(
    env: &SemaEnv,
    model: &Model,
    decl: DeclId,
    name: Symbol,
    span: Span,
) -> SemaResult<Option<Vec<Symbol>>> {
    let init = match model.decl(decl).init {
        Some(init) => init,
        None => return Ok(None),
    };
    match &model.expr(init).kind {
        ExprKind::Call(call) if call.name == env.constants.anon_enum => Ok(None),
        ExprKind::SetLit(elems) => {
            let mut names = Vec::with_capacity(elems.len());
            for &e in elems {
                match &model.expr(e).kind {
                    ExprKind::Id { name: elem, .. } => names.push(*elem),
                    _ => return Err(SemaError::new(SemaErrorKind::InvalidEnumInit(name), span)),
                }
            }
            Ok(Some(names))
        }
        _ => Err(SemaError::new(SemaErrorKind::InvalidEnumInit(name), span)),
    }
}

fn push_enum_to_string_array(
    model: &mut Model,
    enum_name: Symbol,
    element_names: &Option<Vec<Symbol>>,
    span: Span,
) -> DeclId {
    let array_name = Symbol::intern(&prefixed_name("_enum_to_string_", enum_name.as_str()));
    let elems: Vec<ExprId> = element_names
        .as_ref()
        .map(|names| {
            names
                .iter()
                .map(|n| push_str_lit(model, n.as_str().to_string(), span))
                .collect()
        })
        .unwrap_or_default();
    let init = model.push_expr(ExprKind::ArrayLit(elems), span);
    let string_ti = builtin_ti(model, "string", span);
    let index_dom = builtin_ti(model, "int", span).domain;
    let array_ti = TypeInst {
        domain: string_ti.domain,
        is_var: false,
        is_set: false,
        is_opt: false,
        ranges: vec![index_dom],
        is_enum: false,
        ty: Type::UNKNOWN,
    };
    model.push_decl(VarDecl {
        name: array_name,
        ti: array_ti,
        init: Some(init),
        annotations: Vec::new(),
        toplevel: true,
        position: None,
        span,
    })
}

/// Synthesises the scalar, array and set `_toString_` overloads for the
/// enum `enum_decl` / `enum_name`, registering each in `env.functions`.
fn push_to_string_functions(
    env: &mut SemaEnv,
    model: &mut Model,
    enum_decl: DeclId,
    enum_name: Symbol,
    array_decl: DeclId,
    has_names: bool,
    span: Span,
) {
    let fn_name = Symbol::intern(&prefixed_name("_toString_", enum_name.as_str()));

    // 1. scalar form.
    let x_ti = TypeInst::scalar(push_id(model, enum_name, enum_decl, span));
    let x_param = push_param(model, "x", x_ti, span);
    let b_param = push_param(model, "b", builtin_ti(model, "bool", span), span);

    let scalar_body = if has_names {
        let x_ref = push_id(model, Symbol::intern("x"), x_param, span);
        let array_name = model.decl(array_decl).name;
        let array_ref = push_id(model, array_name, array_decl, span);
        model.push_expr(
            ExprKind::ArrayAccess {
                base: array_ref,
                indices: vec![x_ref],
            },
            span,
        )
    } else {
        let x_for_false = push_id(model, Symbol::intern("x"), x_param, span);
        let show_false = push_call(model, env.constants.show, vec![x_for_false], span);
        let prefix_false = push_str_lit(model, format!("{}_", enum_name.as_str()), span);
        let false_form = push_concat(model, prefix_false, show_false, span);

        let x_for_true = push_id(model, Symbol::intern("x"), x_param, span);
        let show_true = push_call(model, env.constants.show, vec![x_for_true], span);
        let prefix_true = push_str_lit(model, format!("to_enum({},", enum_name.as_str()), span);
        let mid = push_concat(model, prefix_true, show_true, span);
        let suffix = push_str_lit(model, ")", span);
        let true_form = push_concat(model, mid, suffix, span);

        let b_ref = push_id(model, Symbol::intern("b"), b_param, span);
        model.push_expr(
            ExprKind::Ite(IfThenElse {
                branches: vec![(b_ref, true_form)],
                else_branch: false_form,
            }),
            span,
        )
    };

    let scalar_sig = FnSig {
        name: fn_name,
        params: vec![x_param, b_param],
        ret: builtin_ti(model, "string", span),
        body: Some(scalar_body),
        is_builtin_coercion: false,
    };
    let scalar_func = model.push_func(scalar_sig);
    env.functions.register(fn_name, scalar_func);
    model.items.push(Item::Function(scalar_func));

    // 2. array form: array[$U] of E.
    let array_elem_ti = TypeInst {
        domain: Some(push_id(model, enum_name, enum_decl, span)),
        is_var: false,
        is_set: false,
        is_opt: false,
        ranges: vec![None],
        is_enum: false,
        ty: Type::UNKNOWN,
    };
    let arr_x_param = push_param(model, "x", array_elem_ti, span);
    let arr_b_param = push_param(model, "b", builtin_ti(model, "bool", span), span);

    let x_ref = push_id(model, Symbol::intern("x"), arr_x_param, span);
    let array1d_id = push_call(model, env.constants.array1d, vec![x_ref], span);
    let e_decl = push_param(
        model,
        "e",
        TypeInst::scalar(push_id(model, enum_name, enum_decl, span)),
        span,
    );
    let e_ref = push_id(model, Symbol::intern("e"), e_decl, span);
    let b_ref = push_id(model, Symbol::intern("b"), arr_b_param, span);
    let scalar_call = push_call(model, fn_name, vec![e_ref, b_ref], span);
    let comp = model.push_expr(
        ExprKind::Comprehension {
            generators: vec![Generator {
                decl: e_decl,
                source: array1d_id,
            }],
            where_clause: None,
            result: scalar_call,
            is_set: false,
        },
        span,
    );
    let sep = push_str_lit(model, ", ", span);
    let joined = push_call(model, env.constants.join, vec![sep, comp], span);
    let open = push_str_lit(model, "[", span);
    let close = push_str_lit(model, "]", span);
    let with_open = push_concat(model, open, joined, span);
    let array_body = push_concat(model, with_open, close, span);

    let array_sig = FnSig {
        name: fn_name,
        params: vec![arr_x_param, arr_b_param],
        ret: builtin_ti(model, "string", span),
        body: Some(array_body),
        is_builtin_coercion: false,
    };
    let array_func = model.push_func(array_sig);
    env.functions.register(fn_name, array_func);
    model.items.push(Item::Function(array_func));

    // 3. set form: set of E.
    let set_elem_ti = TypeInst {
        domain: Some(push_id(model, enum_name, enum_decl, span)),
        is_var: false,
        is_set: true,
        is_opt: false,
        ranges: Vec::new(),
        is_enum: false,
        ty: Type::UNKNOWN,
    };
    let set_x_param = push_param(model, "x", set_elem_ti, span);
    let set_b_param = push_param(model, "b", builtin_ti(model, "bool", span), span);

    let x_ref = push_id(model, Symbol::intern("x"), set_x_param, span);
    let e_decl2 = push_param(
        model,
        "e",
        TypeInst::scalar(push_id(model, enum_name, enum_decl, span)),
        span,
    );
    let e_ref2 = push_id(model, Symbol::intern("e"), e_decl2, span);
    let b_ref2 = push_id(model, Symbol::intern("b"), set_b_param, span);
    let scalar_call2 = push_call(model, fn_name, vec![e_ref2, b_ref2], span);
    let comp2 = model.push_expr(
        ExprKind::Comprehension {
            generators: vec![Generator {
                decl: e_decl2,
                source: x_ref,
            }],
            where_clause: None,
            result: scalar_call2,
            is_set: true,
        },
        span,
    );
    let sep2 = push_str_lit(model, ", ", span);
    let joined2 = push_call(model, env.constants.join, vec![sep2, comp2], span);
    let open2 = push_str_lit(model, "{", span);
    let close2 = push_str_lit(model, "}", span);
    let with_open2 = push_concat(model, open2, joined2, span);
    let set_body = push_concat(model, with_open2, close2, span);

    let set_sig = FnSig {
        name: fn_name,
        params: vec![set_x_param, set_b_param],
        ret: builtin_ti(model, "string", span),
        body: Some(set_body),
        is_builtin_coercion: false,
    };
    let set_func = model.push_func(set_sig);
    env.functions.register(fn_name, set_func);
    model.items.push(Item::Function(set_func));
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_util::Idx;

    fn enum_decl_with_init(model: &mut Model, name: &str, init: Option<ExprId>) -> DeclId {
        let ti = TypeInst {
            domain: None,
            is_var: false,
            is_set: false,
            is_opt: false,
            ranges: Vec::new(),
            is_enum: true,
            ty: Type::UNKNOWN,
        };
        model.push_decl(VarDecl {
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
    fn test_named_set_expands_elements_and_rewrites_init() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let red = model.push_expr(
            ExprKind::Id {
                name: Symbol::intern("red"),
                decl: None,
            },
            Span::DUMMY,
        );
        let green = model.push_expr(
            ExprKind::Id {
                name: Symbol::intern("green"),
                decl: None,
            },
            Span::DUMMY,
        );
        let set_lit = model.push_expr(ExprKind::SetLit(vec![red, green]), Span::DUMMY);
        let decl = enum_decl_with_init(&mut model, "Color", Some(set_lit));

        let new_decls = expand_enum(&mut env, &mut model, decl).unwrap();
        // 2 element decls + 1 enum_to_string array decl.
        assert_eq!(new_decls.len(), 3);

        match &model.expr(model.decl(decl).init.unwrap()).kind {
            ExprKind::BinOp { op, .. } => assert_eq!(*op, BinOp::Range),
            other => panic!("expected rewritten range, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_enum_init_rejected() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let bad = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let decl = enum_decl_with_init(&mut model, "Bad", Some(bad));
        let err = expand_enum(&mut env, &mut model, decl).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::InvalidEnumInit(_)));
    }

    #[test]
    fn test_anon_enum_registers_three_overloads() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let n = model.push_expr(ExprKind::Lit(Lit::Int(3)), Span::DUMMY);
        let call = model.push_expr(
            ExprKind::Call(Call {
                name: env.constants.anon_enum,
                args: vec![n],
                resolved: None,
            }),
            Span::DUMMY,
        );
        let decl = enum_decl_with_init(&mut model, "Color", Some(call));
        expand_enum(&mut env, &mut model, decl).unwrap();

        let fn_name = Symbol::intern("_toString_Color");
        assert_eq!(env.functions.candidates(fn_name).len(), 3);
    }

    #[test]
    fn test_skeleton_only_for_no_initialiser() {
        let mut model = Model::new();
        let decl = enum_decl_with_init(&mut model, "Color", None);
        let array_decl = expand_enum_skeleton(&mut model, decl);
        assert_eq!(
            model.decl(array_decl).name.as_str(),
            "_enum_to_string_Color"
        );
        assert!(model.decl(array_decl).init.is_some());
    }

    #[test]
    fn test_quoted_enum_name_prefix_after_quote() {
        assert_eq!(prefixed_name("_toString_", "'+'"), "'_toString_+'");
    }

    #[test]
    fn test_element_decl_ids_distinct() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let a = model.push_expr(
            ExprKind::Id {
                name: Symbol::intern("a"),
                decl: None,
            },
            Span::DUMMY,
        );
        let set_lit = model.push_expr(ExprKind::SetLit(vec![a]), Span::DUMMY);
        let decl = enum_decl_with_init(&mut model, "Single", Some(set_lit));
        let new_decls = expand_enum(&mut env, &mut model, decl).unwrap();
        let mut seen = std::collections::HashSet::new();
        for d in &new_decls {
            assert!(seen.insert(d.to_usize()));
        }
    }
}
