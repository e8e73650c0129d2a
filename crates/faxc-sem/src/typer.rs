//! The bottom-up typer: a per-node visitor computing the type of
//! every expression, driven twice from the same code with a single
//! `ignore_var_decl` flag distinguishing phase 1 (decl type-insts and
//! function signatures only) from phase 2 (full bodies, including the
//! initialiser-vs-declared-type check on `VarDecl`).
//!
//! Name resolution has already happened by the time this runs (the
//! topological sorter installed every `Id`'s `decl` back-link), so unlike
//! [`crate::toposort`] this module never touches a [`ScopeStack`] — it only
//! ever reads `DeclId`s already present on the AST.
//!
//! [`ScopeStack`]: crate::scope::ScopeStack

use faxc_par::{
    BaseKind, BinOp, Call, DeclId, ExprId, ExprKind, FuncId, Generator, IfThenElse, Inst, Let,
    Model, Optionality, Structure, Type, TypeInst, UnOp,
};
use faxc_util::{Span, Symbol};

use crate::coerce::{coerce, coercion_cost};
use crate::env::SemaEnv;
use crate::errors::{SemaError, SemaErrorKind, SemaResult};

/// One of the few base kinds that coerces along the bool -> int -> float
/// numeric ladder; used to merge set/array literal element types.
fn numeric_rank(base: BaseKind) -> Option<u8> {
    match base {
        BaseKind::Bool => Some(0),
        BaseKind::Int => Some(1),
        BaseKind::Float => Some(2),
        _ => None,
    }
}

fn numeric_base_of_rank(rank: u8) -> BaseKind {
    match rank {
        0 => BaseKind::Bool,
        1 => BaseKind::Int,
        _ => BaseKind::Float,
    }
}

pub struct BottomUpTyper<'a> {
    pub model: &'a mut Model,
    pub env: &'a mut SemaEnv,
    /// Phase 1 (`true`): visit decl type-insts and function signatures
    /// only, skipping the initialiser-vs-declared-type check. Phase 2
    /// (`false`): full bodies, `VarDecl` nodes get the init check too.
    pub ignore_var_decl: bool,
}

impl<'a> BottomUpTyper<'a> {
    pub fn new(env: &'a mut SemaEnv, model: &'a mut Model, ignore_var_decl: bool) -> Self {
        BottomUpTyper {
            model,
            env,
            ignore_var_decl,
        }
    }

    fn decompose(&self, enum_id: u32, axes: usize) -> (Vec<u32>, u32) {
        match self.env.enums.tuple_of(enum_id) {
            Some(tuple) if tuple.len() == axes + 1 => {
                (tuple[..axes].to_vec(), tuple[axes])
            }
            _ => (vec![0; axes], 0),
        }
    }

    // ------------------------------------------------------------------
    // TypeInst assembly
    // ------------------------------------------------------------------

    /// Assembles and stores the [`Type`] for `decl`'s type-inst (the
    /// `TypeInst` contract). Run over every declaration in topological
    /// order during phase 1, and over every function's params/return during
    /// the function-signature half of phase 1.
    pub fn type_ti(&mut self, decl: DeclId, is_top_decl: bool) -> SemaResult<()> {
        let ti = self.model.decl(decl).ti.clone();
        let span = self.model.decl(decl).span;
        let ty = if ti.is_enum {
            // An enum's own declaration (`enum Color = {...}`) stands for
            // the set of all its values, regardless of how its initialiser
            // happens to be written; `expand_enum` already interned
            // its enum id before this pass runs.
            let name = self.model.decl(decl).name;
            let enum_id = self.env.enums.intern_enum(name);
            Type {
                base: BaseKind::Int,
                inst: Inst::Par,
                structure: Structure::Set,
                dim: 0,
                optionality: Optionality::Present,
                cv: false,
                enum_id,
            }
        } else {
            let name = self.model.decl(decl).name;
            self.assemble_ti(&ti, span, is_top_decl, name)?
        };
        self.model.decl_mut(decl).ti.ty = ty;
        Ok(())
    }

    fn assemble_ti(&mut self, ti: &TypeInst, span: Span, is_top_decl: bool, name: Symbol) -> SemaResult<Type> {
        let mut dim = ti.ranges.len() as i32;
        let mut poly_range = false;
        let mut axis_ids = Vec::with_capacity(ti.ranges.len());
        for range in &ti.ranges {
            match range {
                None => {
                    poly_range = true;
                    axis_ids.push(0);
                }
                Some(expr) => {
                    if let ExprKind::TiId(_) = &self.model.expr(*expr).kind {
                        poly_range = true;
                        axis_ids.push(0);
                        continue;
                    }
                    let axis_id = self.domain_component(*expr)?.1;
                    let t = self.type_expr(*expr)?;
                    if !(t.base == BaseKind::Int && t.is_set() && !t.is_array()) {
                        return Err(SemaError::new(SemaErrorKind::BadIndexSet, span));
                    }
                    axis_ids.push(axis_id);
                }
            }
        }
        if poly_range {
            dim = -1;
        }

        let (base, mut enum_id) = match ti.domain {
            None => {
                if is_top_decl {
                    return Err(SemaError::new(SemaErrorKind::TiidInTopDecl(name), span));
                }
                (BaseKind::Top, 0)
            }
            Some(expr) => self.domain_component(expr)?,
        };

        if ti.is_var && ti.is_set && base != BaseKind::Int {
            return Err(SemaError::new(SemaErrorKind::BadVarSet, span));
        }

        if dim > 0 && (enum_id != 0 || axis_ids.iter().any(|&a| a != 0)) {
            let mut tuple = axis_ids;
            tuple.push(enum_id);
            enum_id = self.env.enums.intern_array_enum(tuple);
        }

        Ok(Type {
            base,
            inst: if ti.is_var { Inst::Var } else { Inst::Par },
            structure: if ti.is_set { Structure::Set } else { Structure::Plain },
            dim,
            optionality: if ti.is_opt {
                Optionality::Optional
            } else {
                Optionality::Present
            },
            cv: false,
            enum_id,
        })
    }

    /// Resolves a type-inst domain expression to `(base kind, enum id)`,
    /// special-casing the builtin-keyword and enum-reference forms that a
    /// generic `type_expr` call cannot distinguish on its own.
    fn domain_component(&mut self, expr: ExprId) -> SemaResult<(BaseKind, u32)> {
        let kind = self.model.expr(expr).kind.clone();
        match kind {
            ExprKind::TiId(name) => {
                let base = match name.as_str() {
                    "int" => BaseKind::Int,
                    "bool" => BaseKind::Bool,
                    "float" => BaseKind::Float,
                    "string" => BaseKind::String,
                    "ann" => BaseKind::Ann,
                    _ => BaseKind::Top,
                };
                self.model.expr_mut(expr).ty = Type::new(base, Inst::Par);
                Ok((base, 0))
            }
            ExprKind::Id { name, decl: Some(d) } if self.model.decl(d).ti.is_enum => {
                let eid = self.env.enums.intern_enum(name);
                let ty = Type {
                    enum_id: eid,
                    ..Type::par_int()
                };
                self.model.expr_mut(expr).ty = ty;
                Ok((BaseKind::Int, eid))
            }
            _ => {
                let span = self.model.expr(expr).span;
                let t = self.type_expr(expr)?;
                if t.base == BaseKind::Int || t.base == BaseKind::Float {
                    Ok((t.base, t.enum_id))
                } else {
                    Err(SemaError::new(SemaErrorKind::BadTiDomain, span))
                }
            }
        }
    }

    /// Types a function's parameter type-insts and return type-inst (the
    /// "function signatures" half of phase 1).
    pub fn type_function_sig(&mut self, func: FuncId) -> SemaResult<()> {
        let params = self.model.func(func).params.clone();
        for param in params {
            self.type_ti(param, false)?;
        }
        let ret = self.model.func(func).ret.clone();
        let name = self.model.func(func).name;
        let span = self.model.func(func).body.map(|b| self.model.expr(b).span).unwrap_or(Span::DUMMY);
        let ret_ty = self.assemble_ti(&ret, span, false, name)?;
        self.model.func_mut(func).ret.ty = ret_ty;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expression typing
    // ------------------------------------------------------------------

    pub fn type_expr(&mut self, id: ExprId) -> SemaResult<Type> {
        let span = self.model.expr(id).span;
        let kind = self.model.expr(id).kind.clone();
        let ty = match kind {
            ExprKind::Lit(lit) => self.type_lit(&lit),
            ExprKind::Anon => Ok(Type::bot()),
            ExprKind::TiId(_) => Ok(Type::top()),
            ExprKind::Id { decl, .. } => {
                let d = decl.expect("Id not yet resolved by the topological sorter");
                Ok(self.model.decl(d).ti.ty)
            }
            ExprKind::SetLit(elems) => self.type_set_lit(id, &elems, span),
            ExprKind::ArrayLit(elems) => self.type_array_lit(id, &elems, span),
            ExprKind::ArrayAccess { base, indices } => self.type_array_access(id, base, &indices, span),
            ExprKind::Comprehension {
                generators,
                where_clause,
                result,
                is_set,
            } => self.type_comprehension(&generators, where_clause, result, is_set, span),
            ExprKind::Ite(ite) => self.type_ite(id, &ite, span),
            ExprKind::BinOp { op, lhs, rhs, .. } => self.type_binop(id, op, lhs, rhs, span),
            ExprKind::UnOp { op, operand, .. } => self.type_unop(id, op, operand, span),
            ExprKind::Call(call) => self.type_call(id, &call, span),
            ExprKind::VarDeclExpr(decl) => self.type_var_decl_expr(decl, span),
            ExprKind::Let(let_expr) => self.type_let(&let_expr, span),
        }?;
        self.model.expr_mut(id).ty = ty;
        Ok(ty)
    }

    fn type_lit(&self, lit: &faxc_par::Lit) -> SemaResult<Type> {
        Ok(match lit {
            faxc_par::Lit::Int(_) => Type::par_int(),
            faxc_par::Lit::Float(_) => Type::par_float(),
            faxc_par::Lit::Bool(_) => Type::par_bool(),
            faxc_par::Lit::String(_) => Type::par_string(),
            faxc_par::Lit::Absent => Type::bot().into_optional(),
        })
    }

    fn type_set_lit(&mut self, id: ExprId, elems: &[ExprId], span: Span) -> SemaResult<Type> {
        if elems.is_empty() {
            return Ok(Type::bot().into_set());
        }
        let mut tys = Vec::with_capacity(elems.len());
        for &e in elems {
            tys.push(self.type_expr(e)?);
        }
        let any_var = tys.iter().any(|t| t.is_var());
        let any_opt = tys.iter().any(|t| t.optionality == Optionality::Optional);
        let any_cv = tys.iter().any(|t| t.cv);

        let mut rank: Option<u8> = None;
        let mut shared_base: Option<BaseKind> = None;
        let mut enum_id = 0u32;
        let mut enum_seen = false;
        for t in &tys {
            if t.base == BaseKind::Bot {
                continue;
            }
            if let Some(r) = numeric_rank(t.base) {
                rank = Some(rank.map_or(r, |cur| cur.max(r)));
            } else {
                match shared_base {
                    None => shared_base = Some(t.base),
                    Some(b) if b == t.base => {}
                    Some(_) => return Err(SemaError::new(SemaErrorKind::NonUniformSet, span)),
                }
            }
            if !enum_seen {
                enum_id = t.enum_id;
                enum_seen = true;
            } else if enum_id != t.enum_id {
                enum_id = 0;
            }
        }
        if rank.is_some() && shared_base.is_some() {
            return Err(SemaError::new(SemaErrorKind::NonUniformSet, span));
        }

        let mut target_base = match (rank, shared_base) {
            (Some(r), None) => numeric_base_of_rank(r),
            (None, Some(b)) => b,
            (None, None) => BaseKind::Bot,
            (Some(_), Some(_)) => unreachable!(),
        };
        if any_var {
            if target_base == BaseKind::Bool || target_base == BaseKind::Bot {
                target_base = BaseKind::Int;
            } else if numeric_rank(target_base).is_none() {
                return Err(SemaError::new(
                    SemaErrorKind::SetElemNotInt { found: Type::new(target_base, Inst::Par) },
                    span,
                ));
            }
        }

        let elem_ty = Type {
            base: target_base,
            inst: if any_var { Inst::Var } else { Inst::Par },
            structure: Structure::Plain,
            dim: 0,
            optionality: Optionality::Present,
            cv: false,
            enum_id,
        };
        let mut new_elems = Vec::with_capacity(elems.len());
        for &e in elems {
            new_elems.push(coerce(self.env, self.model, e, elem_ty)?);
        }
        if let ExprKind::SetLit(slot) = &mut self.model.expr_mut(id).kind {
            *slot = new_elems;
        }

        Ok(Type {
            base: target_base,
            inst: if any_var { Inst::Var } else { Inst::Par },
            structure: Structure::Set,
            dim: 0,
            optionality: if any_opt { Optionality::Optional } else { Optionality::Present },
            cv: any_cv || any_var,
            enum_id,
        })
    }

    fn type_array_lit(&mut self, id: ExprId, elems: &[ExprId], span: Span) -> SemaResult<Type> {
        for &e in elems {
            if let ExprKind::ArrayLit(_) = &self.model.expr(e).kind {
                return Err(SemaError::new(SemaErrorKind::ArrayNested, span));
            }
        }
        if elems.is_empty() {
            return Ok(Type::bot().with_dim(1));
        }
        let anon_mask: Vec<bool> = elems
            .iter()
            .map(|&e| matches!(self.model.expr(e).kind, ExprKind::Anon))
            .collect();
        if anon_mask.iter().all(|&a| a) {
            return Err(SemaError::new(SemaErrorKind::NonUniformArray, span));
        }

        let mut concrete_tys = Vec::new();
        for (&e, &is_anon) in elems.iter().zip(&anon_mask) {
            if !is_anon {
                concrete_tys.push(self.type_expr(e)?);
            }
        }

        let first = concrete_tys[0];
        let mut rank = numeric_rank(first.base);
        let mut shared = if rank.is_none() { Some(first.base) } else { None };
        let structure = first.structure;
        let elem_dim = first.dim;
        let any_var = concrete_tys.iter().any(|t| t.is_var());
        let any_opt = concrete_tys.iter().any(|t| t.optionality == Optionality::Optional);
        let any_cv = concrete_tys.iter().any(|t| t.cv);
        let mut enum_id = first.enum_id;

        for t in &concrete_tys[1..] {
            if t.structure != structure || t.dim != elem_dim {
                return Err(SemaError::new(SemaErrorKind::NonUniformArray, span));
            }
            if structure == Structure::Plain && elem_dim == 0 {
                match numeric_rank(t.base) {
                    Some(r) => rank = Some(rank.map_or(r, |cur| cur.max(r))),
                    None => match shared {
                        None => shared = Some(t.base),
                        Some(b) if b == t.base => {}
                        Some(_) => return Err(SemaError::new(SemaErrorKind::NonUniformArray, span)),
                    },
                }
                if rank.is_some() && shared.is_some() {
                    return Err(SemaError::new(SemaErrorKind::NonUniformArray, span));
                }
            } else if t.base != first.base {
                return Err(SemaError::new(SemaErrorKind::NonUniformArray, span));
            }
            if t.enum_id != enum_id {
                enum_id = 0;
            }
        }

        let target_base = match rank {
            Some(r) => numeric_base_of_rank(r),
            None => shared.unwrap_or(first.base),
        };
        let elem_ty = Type {
            base: target_base,
            inst: if any_var { Inst::Var } else { Inst::Par },
            structure,
            dim: elem_dim,
            optionality: Optionality::Present,
            cv: false,
            enum_id,
        };

        let mut new_elems = Vec::with_capacity(elems.len());
        for (&e, &is_anon) in elems.iter().zip(&anon_mask) {
            if is_anon {
                self.model.expr_mut(e).ty = elem_ty;
                new_elems.push(e);
            } else {
                new_elems.push(coerce(self.env, self.model, e, elem_ty)?);
            }
        }
        if let ExprKind::ArrayLit(slot) = &mut self.model.expr_mut(id).kind {
            *slot = new_elems;
        }

        let composite_enum = if enum_id != 0 {
            self.env.enums.intern_array_enum(vec![0, enum_id])
        } else {
            0
        };

        Ok(Type {
            base: target_base,
            inst: if any_var { Inst::Var } else { Inst::Par },
            structure: Structure::Plain,
            dim: 1,
            optionality: if any_opt { Optionality::Optional } else { Optionality::Present },
            cv: any_cv || any_var,
            enum_id: composite_enum,
        })
    }

    fn type_array_access(
        &mut self,
        id: ExprId,
        base: ExprId,
        indices: &[ExprId],
        span: Span,
    ) -> SemaResult<Type> {
        let base_ty = self.type_expr(base)?;
        let (mut base_id, mut base_ty) = (base, base_ty);
        if base_ty.is_set() {
            let target = Type {
                dim: indices.len() as i32,
                structure: Structure::Plain,
                ..base_ty
            };
            base_id = coerce(self.env, self.model, base, target)?;
            base_ty = self.model.expr(base_id).ty;
            if let ExprKind::ArrayAccess { base: slot, .. } = &mut self.model.expr_mut(id).kind {
                *slot = base_id;
            }
        }
        if base_ty.dim != indices.len() as i32 {
            return Err(SemaError::new(
                SemaErrorKind::ArrayAccessRank {
                    expected: base_ty.dim.max(0) as usize,
                    found: indices.len(),
                },
                span,
            ));
        }
        let (axis_ids, elem_enum_id) = self.decompose(base_ty.enum_id, indices.len());

        let mut any_var = false;
        let mut any_opt = false;
        let mut any_cv = base_ty.cv;
        for (i, &idx) in indices.iter().enumerate() {
            let idx_ty = self.type_expr(idx)?;
            let expected_axis = axis_ids.get(i).copied().unwrap_or(0);
            if expected_axis != 0 {
                if idx_ty.enum_id != expected_axis {
                    return Err(SemaError::new(SemaErrorKind::IndexType, span));
                }
            } else if idx_ty.base != BaseKind::Int && idx_ty.base != BaseKind::Bool {
                return Err(SemaError::new(SemaErrorKind::IndexType, span));
            }
            any_var |= idx_ty.is_var();
            any_opt |= idx_ty.optionality == Optionality::Optional;
            any_cv |= idx_ty.cv;
        }
        if any_var && matches!(base_ty.base, BaseKind::Ann | BaseKind::String) {
            return Err(SemaError::new(SemaErrorKind::IndexType, span));
        }

        Ok(Type {
            base: base_ty.base,
            inst: if any_var { Inst::Var } else { base_ty.inst },
            structure: base_ty.structure,
            dim: 0,
            optionality: if any_opt {
                Optionality::Optional
            } else {
                base_ty.optionality
            },
            cv: any_cv,
            enum_id: elem_enum_id,
        })
    }

    fn type_comprehension(
        &mut self,
        generators: &[Generator],
        where_clause: Option<ExprId>,
        result: ExprId,
        is_set: bool,
        span: Span,
    ) -> SemaResult<Type> {
        let mut any_var = false;
        let mut any_opt = false;
        for gen in generators {
            let src_ty = self.type_expr(gen.source)?;
            let elem_ty = if src_ty.is_set() {
                Type {
                    structure: Structure::Plain,
                    dim: 0,
                    ..src_ty
                }
            } else if src_ty.dim == 1 {
                let (_, elem_enum) = self.decompose(src_ty.enum_id, 1);
                Type {
                    dim: 0,
                    enum_id: elem_enum,
                    ..src_ty
                }
            } else {
                return Err(SemaError::new(SemaErrorKind::BadIndexSet, span));
            };
            self.model.decl_mut(gen.decl).ti.ty = elem_ty;
            any_var |= src_ty.is_var();
            any_opt |= src_ty.optionality == Optionality::Optional;
        }
        if let Some(w) = where_clause {
            let w_ty = self.type_expr(w)?;
            any_var |= w_ty.is_var();
            any_opt |= w_ty.optionality == Optionality::Optional;
        }
        let result_ty = self.type_expr(result)?;

        if is_set {
            if result_ty.is_array() || result_ty.is_set() {
                return Err(SemaError::new(SemaErrorKind::NonUniformSet, span));
            }
            Ok(Type {
                base: result_ty.base,
                inst: if any_var { Inst::Var } else { result_ty.inst },
                structure: Structure::Set,
                dim: 0,
                optionality: if any_opt { Optionality::Optional } else { result_ty.optionality },
                cv: result_ty.cv || any_var,
                enum_id: result_ty.enum_id,
            })
        } else {
            if result_ty.is_array() {
                return Err(SemaError::new(SemaErrorKind::ArrayNested, span));
            }
            let composite = if result_ty.enum_id != 0 {
                self.env.enums.intern_array_enum(vec![0, result_ty.enum_id])
            } else {
                0
            };
            Ok(Type {
                base: result_ty.base,
                inst: if any_var { Inst::Var } else { result_ty.inst },
                structure: Structure::Plain,
                dim: 1,
                optionality: if any_opt { Optionality::Optional } else { result_ty.optionality },
                cv: result_ty.cv || any_var,
                enum_id: composite,
            })
        }
    }

    fn type_ite(&mut self, id: ExprId, ite: &IfThenElse, span: Span) -> SemaResult<Type> {
        let mut any_var_cond = false;
        for &(cond, _) in &ite.branches {
            let cond_ty = self.type_expr(cond)?;
            if cond_ty.base != BaseKind::Bool {
                return Err(SemaError::new(SemaErrorKind::BadCondType { found: cond_ty }, span));
            }
            any_var_cond |= cond_ty.is_var();
        }

        let is_anon = |this: &Self, e: ExprId| matches!(this.model.expr(e).kind, ExprKind::Anon);

        let mut branch_tys: Vec<Option<Type>> = Vec::with_capacity(ite.branches.len() + 1);
        for &(_, then) in &ite.branches {
            branch_tys.push(if is_anon(self, then) {
                None
            } else {
                Some(self.type_expr(then)?)
            });
        }
        let else_ty = if is_anon(self, ite.else_branch) {
            None
        } else {
            Some(self.type_expr(ite.else_branch)?)
        };
        branch_tys.push(else_ty);

        let mut join = branch_tys
            .iter()
            .flatten()
            .copied()
            .reduce(|a, b| a.join(&b))
            .unwrap_or(Type::bot());
        let any_branch_var = branch_tys.iter().flatten().any(|t| t.is_var());
        let any_branch_opt = branch_tys
            .iter()
            .flatten()
            .any(|t| t.optionality == Optionality::Optional);
        if any_var_cond {
            join.inst = Inst::Var;
            if join.is_array() {
                return Err(SemaError::new(SemaErrorKind::CondVarArray, span));
            }
        }
        if any_branch_var {
            join.inst = Inst::Var;
        }
        if any_branch_opt {
            join.optionality = Optionality::Optional;
        }
        join.cv = any_var_cond || branch_tys.iter().flatten().any(|t| t.cv);

        let mut new_branches = Vec::with_capacity(ite.branches.len());
        for (&(cond, then), ty) in ite.branches.iter().zip(branch_tys.iter().take(ite.branches.len())) {
            let then = match ty {
                Some(_) => coerce(self.env, self.model, then, join)?,
                None => {
                    self.model.expr_mut(then).ty = join.into_var();
                    then
                }
            };
            new_branches.push((cond, then));
        }
        let new_else = match &branch_tys[ite.branches.len()] {
            Some(_) => coerce(self.env, self.model, ite.else_branch, join)?,
            None => {
                self.model.expr_mut(ite.else_branch).ty = join.into_var();
                ite.else_branch
            }
        };

        if let ExprKind::Ite(stored) = &mut self.model.expr_mut(id).kind {
            stored.branches = new_branches;
            stored.else_branch = new_else;
        }

        Ok(join)
    }

    fn type_binop(&mut self, id: ExprId, op: BinOp, lhs: ExprId, rhs: ExprId, span: Span) -> SemaResult<Type> {
        self.type_expr(lhs)?;
        self.type_expr(rhs)?;
        let mut args = vec![lhs, rhs];
        let name = Symbol::intern(op.as_str());
        let (func, ty) = self.resolve_call(name, &mut args, span)?;
        if let ExprKind::BinOp { lhs: l, rhs: r, resolved, .. } = &mut self.model.expr_mut(id).kind {
            *l = args[0];
            *r = args[1];
            *resolved = Some(func);
        }
        Ok(ty)
    }

    fn type_unop(&mut self, id: ExprId, op: UnOp, operand: ExprId, span: Span) -> SemaResult<Type> {
        self.type_expr(operand)?;
        let mut args = vec![operand];
        let name = Symbol::intern(op.as_str());
        let (func, ty) = self.resolve_call(name, &mut args, span)?;
        if let ExprKind::UnOp { operand: o, resolved, .. } = &mut self.model.expr_mut(id).kind {
            *o = args[0];
            *resolved = Some(func);
        }
        Ok(ty)
    }

    fn type_call(&mut self, id: ExprId, call: &Call, span: Span) -> SemaResult<Type> {
        for &arg in &call.args {
            self.type_expr(arg)?;
        }
        let mut args = call.args.clone();
        let (func, ty) = self.resolve_call(call.name, &mut args, span)?;
        if let ExprKind::Call(c) = &mut self.model.expr_mut(id).kind {
            c.args = args;
            c.resolved = Some(func);
        }
        Ok(ty)
    }

    /// Overload resolution shared by binary/unary operators and ordinary
    /// calls: pick the registered signature whose parameters the
    /// (already-typed) arguments coerce into at lowest cost, coerce each
    /// argument to it, and return `(resolved function, signature's return
    /// type with cv = OR of the argument cv flags)`.
    fn resolve_call(
        &mut self,
        name: Symbol,
        args: &mut Vec<ExprId>,
        span: Span,
    ) -> SemaResult<(FuncId, Type)> {
        let candidates = self.env.functions.candidates(name).to_vec();
        let arg_tys: Vec<Type> = args.iter().map(|&a| self.model.expr(a).ty).collect();
        let cv = arg_tys.iter().any(|t| t.cv);

        let mut best: Option<(FuncId, Vec<Type>, (u32, u32, u32))> = None;
        for (idx, &func) in candidates.iter().enumerate() {
            let params = self.model.func(func).params.clone();
            if params.len() != arg_tys.len() {
                continue;
            }
            let param_tys: Vec<Type> = params.iter().map(|&p| self.model.decl(p).ti.ty).collect();
            let mut coercion_cost_total = 0u32;
            let mut inst_widen = 0u32;
            let mut ok = true;
            for (arg_ty, param_ty) in arg_tys.iter().zip(&param_tys) {
                if arg_ty.is_subtype_of(param_ty) {
                    if arg_ty.inst == Inst::Par && param_ty.inst == Inst::Var {
                        inst_widen += 1;
                    }
                } else if let Some(cost) = coercion_cost(*arg_ty, *param_ty) {
                    coercion_cost_total += cost;
                } else {
                    ok = false;
                    break;
                }
            }
            if !ok {
                continue;
            }
            let score = (coercion_cost_total, inst_widen, idx as u32);
            if best.as_ref().map(|(_, _, s)| score < *s).unwrap_or(true) {
                best = Some((func, param_tys, score));
            }
        }

        let (func, param_tys, _) = best.ok_or_else(|| SemaError::new(SemaErrorKind::OverloadNone(name), span))?;
        for (arg, &param_ty) in args.iter_mut().zip(&param_tys) {
            *arg = coerce(self.env, self.model, *arg, param_ty)?;
        }
        let ret_ty = self.model.func(func).ret.ty;
        Ok((func, Type { cv, ..ret_ty }))
    }

    fn type_var_decl_expr(&mut self, decl: DeclId, _span: Span) -> SemaResult<Type> {
        if !self.ignore_var_decl {
            self.check_decl_init(decl)?;
        }
        Ok(self.model.decl(decl).ti.ty)
    }

    /// Phase-2 `VarDecl` contract: compare the initialiser's type to the
    /// declared type under subtyping, applying the implicit enum-index
    /// coercion rule for array-of-enum declarations first.
    pub fn check_decl_init(&mut self, decl: DeclId) -> SemaResult<()> {
        let ti_ty = self.model.decl(decl).ti.ty;
        let init = match self.model.decl(decl).init {
            Some(i) => i,
            None => return Ok(()),
        };
        let span = self.model.expr(init).span;
        let init_ty = self.type_expr(init)?;

        let effective_ty = if ti_ty.dim > 0 && ti_ty.enum_id != 0 && self.is_enum_index_erasure_site(init) {
            let (ti_axes, _) = self.decompose(ti_ty.enum_id, ti_ty.dim as usize);
            let (_, init_elem) = self.decompose(init_ty.enum_id, ti_ty.dim as usize);
            let mut tuple = ti_axes;
            tuple.push(init_elem);
            let composite = if tuple.iter().all(|&x| x == 0) {
                0
            } else {
                self.env.enums.intern_array_enum(tuple)
            };
            Type { enum_id: composite, ..init_ty }
        } else {
            init_ty
        };

        let coerced = coerce(self.env, self.model, init, ti_ty)?;
        let final_ty = if coerced == init {
            effective_ty
        } else {
            self.model.expr(coerced).ty
        };
        if !final_ty.is_subtype_of(&ti_ty) {
            return Err(SemaError::new(
                SemaErrorKind::TypeMismatch { expected: ti_ty, found: final_ty },
                span,
            ));
        }
        self.model.decl_mut(decl).init = Some(coerced);
        Ok(())
    }

    fn is_enum_index_erasure_site(&self, expr: ExprId) -> bool {
        matches!(
            self.model.expr(expr).kind,
            ExprKind::ArrayLit(_) | ExprKind::Comprehension { .. } | ExprKind::BinOp { op: BinOp::PlusPlus, .. }
        )
    }

    fn type_let(&mut self, let_expr: &Let, _span: Span) -> SemaResult<Type> {
        for &decl in &let_expr.bindings {
            self.type_let_binding(decl)?;
        }
        self.type_expr(let_expr.body)
    }

    fn type_let_binding(&mut self, decl: DeclId) -> SemaResult<()> {
        let ti_ty = self.model.decl(decl).ti.ty;
        let ti_domain = self.model.decl(decl).ti.domain;
        let is_var = self.model.decl(decl).ti.is_var;
        let is_set = self.model.decl(decl).ti.is_set;
        let has_init = self.model.decl(decl).init.is_some();
        let name = self.model.decl(decl).name;
        let span = self.model.decl(decl).span;

        if ti_ty.base == BaseKind::Top {
            return Err(SemaError::new(SemaErrorKind::TiidInLet(name), span));
        }
        let unbounded_domain = match ti_domain {
            None => true,
            Some(d) => matches!(&self.model.expr(d).kind, ExprKind::TiId(n) if n.as_str() == "int" || n.as_str() == "float"),
        };
        if is_var && is_set && !has_init && unbounded_domain {
            return Err(SemaError::new(SemaErrorKind::InfiniteSetVar(name), span));
        }
        if !is_var && !has_init {
            return Err(SemaError::new(SemaErrorKind::ParamNeedsInit(name), span));
        }

        self.check_decl_init(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faxc_par::{ExprKind, Lit, TypeInst, VarDecl};
    use faxc_util::Idx;

    fn builtin_ti_expr(model: &mut Model, name: &str) -> TypeInst {
        let dom = model.push_expr(ExprKind::TiId(Symbol::intern(name)), Span::DUMMY);
        TypeInst::scalar(dom)
    }

    fn decl(model: &mut Model, name: &str, ti: TypeInst, init: Option<ExprId>) -> DeclId {
        model.push_decl(VarDecl {
            name: Symbol::intern(name),
            ti,
            init,
            annotations: Vec::new(),
            toplevel: true,
            position: Some(0),
            span: Span::DUMMY,
        })
    }

    #[test]
    fn test_ti_assembles_par_int() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = builtin_ti_expr(&mut model, "int");
        let d = decl(&mut model, "x", ti, None);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, true);
        typer.type_ti(d, true).unwrap();
        assert_eq!(model.decl(d).ti.ty, Type::par_int());
    }

    #[test]
    fn test_ti_of_enum_decl_is_a_par_int_set() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let mut ti = builtin_ti_expr(&mut model, "ann");
        ti.is_enum = true;
        let d = decl(&mut model, "Color", ti, None);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, true);
        typer.type_ti(d, true).unwrap();
        let ty = model.decl(d).ti.ty;
        assert_eq!(ty.base, BaseKind::Int);
        assert!(ty.is_set());
        assert_ne!(ty.enum_id, 0);
    }

    #[test]
    fn test_int_literal_types_as_par_int() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let lit = model.push_expr(ExprKind::Lit(Lit::Int(3)), Span::DUMMY);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let ty = typer.type_expr(lit).unwrap();
        assert_eq!(ty, Type::par_int());
    }

    #[test]
    fn test_set_lit_bool_int_merges_to_int() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let t = model.push_expr(ExprKind::Lit(Lit::Bool(true)), Span::DUMMY);
        let two = model.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        let set = model.push_expr(ExprKind::SetLit(vec![t, two]), Span::DUMMY);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let ty = typer.type_expr(set).unwrap();
        assert_eq!(ty.base, BaseKind::Int);
        assert!(ty.is_set());
        if let ExprKind::SetLit(elems) = &model.expr(set).kind {
            match &model.expr(elems[0]).kind {
                ExprKind::Call(c) => assert_eq!(c.name, env.constants.bool2int),
                other => panic!("expected bool2int wrapper, got {other:?}"),
            }
        } else {
            unreachable!()
        }
    }

    #[test]
    fn test_empty_set_is_bot() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let set = model.push_expr(ExprKind::SetLit(Vec::new()), Span::DUMMY);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let ty = typer.type_expr(set).unwrap();
        assert_eq!(ty.base, BaseKind::Bot);
    }

    #[test]
    fn test_non_uniform_set_rejected() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let s = model.push_expr(ExprKind::Lit(Lit::String("a".into())), Span::DUMMY);
        let i = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let set = model.push_expr(ExprKind::SetLit(vec![s, i]), Span::DUMMY);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let err = typer.type_expr(set).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::NonUniformSet));
    }

    #[test]
    fn test_array_access_rank_mismatch() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let one = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let two = model.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        let arr = model.push_expr(ExprKind::ArrayLit(vec![one, two]), Span::DUMMY);
        let idx1 = model.push_expr(ExprKind::Lit(Lit::Int(0)), Span::DUMMY);
        let idx2 = model.push_expr(ExprKind::Lit(Lit::Int(0)), Span::DUMMY);
        let access = model.push_expr(
            ExprKind::ArrayAccess {
                base: arr,
                indices: vec![idx1, idx2],
            },
            Span::DUMMY,
        );
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let err = typer.type_expr(access).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::ArrayAccessRank { .. }));
    }

    #[test]
    fn test_ite_var_condition_forbids_array_result() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let b = decl(&mut model, "b", builtin_ti_expr(&mut model, "bool"), None);
        model.decl_mut(b).ti.is_var = true;
        model.decl_mut(b).ti.ty = Type::var_bool();
        let cond = model.push_expr(ExprKind::Id { name: Symbol::intern("b"), decl: Some(b) }, Span::DUMMY);

        let one = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let two = model.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        let then_arr = model.push_expr(ExprKind::ArrayLit(vec![one]), Span::DUMMY);
        let else_arr = model.push_expr(ExprKind::ArrayLit(vec![two]), Span::DUMMY);
        let ite = model.push_expr(
            ExprKind::Ite(IfThenElse {
                branches: vec![(cond, then_arr)],
                else_branch: else_arr,
            }),
            Span::DUMMY,
        );
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let err = typer.type_expr(ite).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::CondVarArray));
    }

    #[test]
    fn test_bad_cond_type_rejected() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let cond = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let t = model.push_expr(ExprKind::Lit(Lit::Int(1)), Span::DUMMY);
        let e = model.push_expr(ExprKind::Lit(Lit::Int(2)), Span::DUMMY);
        let ite = model.push_expr(
            ExprKind::Ite(IfThenElse {
                branches: vec![(cond, t)],
                else_branch: e,
            }),
            Span::DUMMY,
        );
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let err = typer.type_expr(ite).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::BadCondType { .. }));
    }

    #[test]
    fn test_param_needs_init_in_let() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = builtin_ti_expr(&mut model, "int");
        let a = decl(&mut model, "a", ti, None);
        model.decl_mut(a).ti.ty = Type::par_int();
        let body = model.push_expr(ExprKind::Id { name: Symbol::intern("a"), decl: Some(a) }, Span::DUMMY);
        let let_expr = Let {
            bindings: vec![a],
            original_inits: vec![None],
            body,
        };
        let mut typer = BottomUpTyper::new(&mut env, &mut model, false);
        let err = typer.type_let(&let_expr, Span::DUMMY).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::ParamNeedsInit(_)));
    }

    #[test]
    fn test_tiid_in_top_decl_names_the_declaration() {
        let mut env = SemaEnv::new();
        let mut model = Model::new();
        let ti = TypeInst {
            domain: None,
            is_var: false,
            is_set: false,
            is_opt: false,
            ranges: Vec::new(),
            is_enum: false,
            ty: Type::UNKNOWN,
        };
        let d = decl(&mut model, "poly", ti, None);
        let mut typer = BottomUpTyper::new(&mut env, &mut model, true);
        let err = typer.type_ti(d, true).unwrap_err();
        match err.kind {
            SemaErrorKind::TiidInTopDecl(name) => assert_eq!(name.as_str(), "poly"),
            other => panic!("expected TiidInTopDecl, got {other:?}"),
        }
    }

    #[test]
    fn test_function_id_helper_unused_import_guard() {
        let _ = FuncId::from_usize(0);
    }
}
