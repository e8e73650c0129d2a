//! The model-interface JSON emitter: classifies every top-level
//! declaration as an input or an output and serialises the result as the
//! small JSON descriptor a solver front end reads to know what to prompt
//! the user for and what to report back.

use std::collections::BTreeMap;
use std::io::Write;

use faxc_par::{BaseKind, ExprKind, Item, Lit, Model, Optionality, SolveMethod, Structure};
use serde::Serialize;

use crate::env::SemaEnv;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct VarInterface {
    #[serde(rename = "type")]
    ty: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    set: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dim: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
struct ModelInterface {
    input: BTreeMap<String, VarInterface>,
    output: BTreeMap<String, VarInterface>,
    method: &'static str,
}

fn base_label(base: BaseKind) -> &'static str {
    match base {
        BaseKind::Bool => "bool",
        BaseKind::Int => "int",
        BaseKind::Float => "float",
        BaseKind::String => "string",
        BaseKind::Ann => "ann",
        BaseKind::Unknown | BaseKind::Bot | BaseKind::Top => "?",
    }
}

fn var_interface(decl: &faxc_par::VarDecl) -> VarInterface {
    let ty = decl.ti.ty;
    VarInterface {
        ty: base_label(ty.base),
        optional: (ty.optionality == Optionality::Optional).then_some(true),
        set: (ty.structure == Structure::Set).then_some(true),
        dim: (ty.dim > 0).then_some(ty.dim),
    }
}

fn is_absent_literal(model: &Model, expr: faxc_par::ExprId) -> bool {
    matches!(model.expr(expr).kind, ExprKind::Lit(Lit::Absent))
}

/// Whether `decl` carries an `add_to_output` annotation call.
fn has_add_to_output(env: &SemaEnv, model: &Model, decl: &faxc_par::VarDecl) -> bool {
    decl.annotations.iter().any(|&ann| match &model.expr(ann).kind {
        ExprKind::Call(call) => call.name == env.constants.add_to_output,
        ExprKind::Id { name, .. } => *name == env.constants.add_to_output,
        _ => false,
    })
}

fn solve_method_label(model: &Model) -> &'static str {
    model
        .items
        .iter()
        .find_map(|item| match item {
            Item::Solve { method, .. } => Some(match method {
                SolveMethod::Satisfy => "sat",
                SolveMethod::Minimize => "min",
                SolveMethod::Maximize => "max",
            }),
            _ => None,
        })
        .unwrap_or("sat")
}

/// Builds the `{ "input": {...}, "output": {...}, "method": ... }` object
/// a solver front end reads.
fn build_model_interface(env: &SemaEnv, model: &Model) -> ModelInterface {
    let mut input = BTreeMap::new();
    let mut output = BTreeMap::new();

    for item in &model.items {
        let Item::VarDecl(id) = item else { continue };
        let decl = model.decl(*id);
        if !decl.toplevel {
            continue;
        }
        let name = decl.name.as_str().to_string();

        let is_input = decl.ti.ty.inst == faxc_par::Inst::Par
            && (decl.init.is_none() || decl.init.is_some_and(|e| is_absent_literal(model, e)));
        let is_output = decl.ti.ty.inst == faxc_par::Inst::Var
            && (decl.init.is_none() || has_add_to_output(env, model, decl));

        if is_input {
            input.insert(name.clone(), var_interface(decl));
        }
        if is_output {
            output.insert(name, var_interface(decl));
        }
    }

    ModelInterface {
        input,
        output,
        method: solve_method_label(model),
    }
}

/// Writes the model-interface JSON object for `model` to `sink`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn write_model_interface(env: &SemaEnv, model: &Model, sink: &mut impl Write) -> serde_json::Result<()> {
    let interface = build_model_interface(env, model);
    serde_json::to_writer(sink, &interface)
}
