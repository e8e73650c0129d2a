//! Topological ordering of declarations and name resolution.
//!
//! Walks every expression reachable from the model, resolving each `Id`
//! node to the declaration it names and assigning every declaration a
//! dependency-respecting rank. A declaration's `position` field doubles as
//! the cycle sentinel: `None` = not yet visited, `Some(-1)` = currently
//! being resolved, `Some(n >= 0)` = final rank.

use faxc_par::{DeclId, ExprId, ExprKind, FuncId, Generator, IfThenElse, Let, Model};
use faxc_util::Symbol;

use crate::errors::{SemaError, SemaErrorKind, SemaResult};
use crate::scope::ScopeStack;

const BEING_RESOLVED: i64 = -1;

/// Owns the scope stack for one sorting pass and the order declarations are
/// finalised in. A single `Sorter` is reused across every top-level item so
/// that forward references between items resolve correctly.
pub struct Sorter<'m> {
    model: &'m mut Model,
    pub scope: ScopeStack,
    order: Vec<DeclId>,
}

impl<'m> Sorter<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Sorter {
            model,
            scope: ScopeStack::new(),
            order: Vec::new(),
        }
    }

    /// Declarations in the order their processing finished. Includes
    /// declarations bound inside `let`s and comprehensions as well as
    /// top-level ones; callers that need only the top-level ordering read
    /// `position` off the top-level `DeclId`s directly instead of walking
    /// this list.
    pub fn order(&self) -> &[DeclId] {
        &self.order
    }

    /// Resolve and rank one declaration (its type-inst, initialiser and
    /// annotations). Idempotent: a second call on an already-finished
    /// declaration is a no-op; a call that re-enters a declaration still
    /// being resolved reports a cycle.
    pub fn sort_decl(&mut self, decl: DeclId) -> SemaResult<()> {
        let (name, span, position) = {
            let d = self.model.decl(decl);
            (d.name, d.span, d.position)
        };
        match position {
            Some(BEING_RESOLVED) => {
                return Err(SemaError::new(SemaErrorKind::CircularDefinition(name), span));
            }
            Some(_) => return Ok(()),
            None => {}
        }
        self.model.decl_mut(decl).position = Some(BEING_RESOLVED);
        self.sort_type_inst(decl)?;
        if let Some(init) = self.model.decl(decl).init {
            self.sort_expr(init)?;
        }
        let annotations = self.model.decl(decl).annotations.clone();
        for ann in annotations {
            self.sort_expr(ann)?;
        }
        self.order.push(decl);
        let pos = (self.order.len() - 1) as i64;
        self.model.decl_mut(decl).position = Some(pos);
        Ok(())
    }

    fn sort_type_inst(&mut self, decl: DeclId) -> SemaResult<()> {
        let ti = self.model.decl(decl).ti.clone();
        if let Some(dom) = ti.domain {
            self.sort_expr(dom)?;
        }
        for range in ti.ranges.into_iter().flatten() {
            self.sort_expr(range)?;
        }
        Ok(())
    }

    pub fn sort_expr(&mut self, id: ExprId) -> SemaResult<()> {
        let kind = self.model.expr(id).kind.clone();
        match kind {
            ExprKind::Lit(_) | ExprKind::Anon | ExprKind::TiId(_) => Ok(()),
            ExprKind::Id { name, .. } => self.sort_id(id, name),
            ExprKind::SetLit(elems) | ExprKind::ArrayLit(elems) => {
                for e in elems {
                    self.sort_expr(e)?;
                }
                Ok(())
            }
            ExprKind::ArrayAccess { base, indices } => {
                self.sort_expr(base)?;
                for idx in indices {
                    self.sort_expr(idx)?;
                }
                Ok(())
            }
            ExprKind::Comprehension {
                generators,
                where_clause,
                result,
                ..
            } => self.sort_comprehension(&generators, where_clause, result),
            ExprKind::Ite(ite) => self.sort_ite(&ite),
            ExprKind::BinOp { .. } => self.sort_binop_chain(id),
            ExprKind::UnOp { operand, .. } => self.sort_expr(operand),
            ExprKind::Call(call) => {
                for arg in call.args {
                    self.sort_expr(arg)?;
                }
                Ok(())
            }
            ExprKind::VarDeclExpr(decl) => self.sort_decl(decl),
            ExprKind::Let(let_expr) => self.sort_let(id, let_expr),
        }
    }

    fn sort_id(&mut self, id: ExprId, name: Symbol) -> SemaResult<()> {
        let span = self.model.expr(id).span;
        let resolved = self
            .scope
            .find(name)
            .ok_or_else(|| SemaError::new(SemaErrorKind::UndefinedIdentifier(name), span))?;
        if let ExprKind::Id { decl, .. } = &mut self.model.expr_mut(id).kind {
            *decl = Some(resolved);
        }
        match self.model.decl(resolved).position {
            None => {
                // A forward reference starts resolving its target from the
                // outermost scope, not from whatever nested construct the
                // reference itself appears in.
                self.scope.push(true);
                let result = self.sort_decl(resolved);
                self.scope.pop();
                result
            }
            Some(BEING_RESOLVED) => {
                Err(SemaError::new(SemaErrorKind::CircularDefinition(name), span))
            }
            Some(_) => Ok(()),
        }
    }

    /// Binary-operator chains are walked with an explicit stack instead of
    /// recursion, so a long run of left- or right-associative `+`/`++`/...
    /// doesn't consume a native stack frame per operand.
    fn sort_binop_chain(&mut self, root: ExprId) -> SemaResult<()> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let (lhs, rhs) = match &self.model.expr(id).kind {
                ExprKind::BinOp { lhs, rhs, .. } => (*lhs, *rhs),
                _ => {
                    self.sort_expr(id)?;
                    continue;
                }
            };
            for operand in [lhs, rhs] {
                match &self.model.expr(operand).kind {
                    ExprKind::BinOp { .. } => stack.push(operand),
                    _ => self.sort_expr(operand)?,
                }
            }
        }
        Ok(())
    }

    fn sort_ite(&mut self, ite: &IfThenElse) -> SemaResult<()> {
        for &(cond, then) in &ite.branches {
            self.sort_expr(cond)?;
            self.sort_expr(then)?;
        }
        self.sort_expr(ite.else_branch)
    }

    fn sort_comprehension(
        &mut self,
        generators: &[Generator],
        where_clause: Option<ExprId>,
        result: ExprId,
    ) -> SemaResult<()> {
        self.scope.push(false);
        let outcome = (|| {
            for gen in generators {
                self.sort_expr(gen.source)?;
                let name = self.model.decl(gen.decl).name;
                let span = self.model.decl(gen.decl).span;
                self.sort_decl(gen.decl)?;
                self.scope
                    .add(name, gen.decl, false)
                    .map_err(|k| SemaError::new(k, span))?;
            }
            if let Some(w) = where_clause {
                self.sort_expr(w)?;
            }
            self.sort_expr(result)
        })();
        self.scope.pop();
        outcome
    }

    /// `let` bindings are pre-registered in the let's own frame before any
    /// of them are resolved, so a binding may refer to a sibling declared
    /// either earlier or later in the same `let`; the final bindings vector
    /// is then reordered by the rank each binding actually received.
    fn sort_let(&mut self, let_id: ExprId, let_expr: Let) -> SemaResult<()> {
        self.scope.push(false);
        let outcome = (|| {
            for &decl in &let_expr.bindings {
                let name = self.model.decl(decl).name;
                let is_enum = self.model.decl(decl).ti.is_enum;
                let span = self.model.decl(decl).span;
                self.scope
                    .add(name, decl, is_enum)
                    .map_err(|k| SemaError::new(k, span))?;
            }
            for &decl in &let_expr.bindings {
                self.sort_decl(decl)?;
            }
            self.sort_expr(let_expr.body)
        })();
        self.scope.pop();
        outcome?;

        let mut ordered = let_expr.bindings.clone();
        ordered.sort_by_key(|d| self.model.decl(*d).position.unwrap_or(i64::MAX));
        let original_inits: Vec<Option<ExprId>> =
            ordered.iter().map(|d| self.model.decl(*d).init).collect();
        if let ExprKind::Let(stored) = &mut self.model.expr_mut(let_id).kind {
            stored.bindings = ordered;
            stored.original_inits = original_inits;
        }
        Ok(())
    }

    /// A function's parameters follow the same push-before-body,
    /// pop-after-body discipline as `let` bindings: they are visible only
    /// for the duration of the body and never installed into the
    /// persistent top-level frame.
    pub fn sort_function(&mut self, func: FuncId) -> SemaResult<()> {
        let (params, body) = {
            let f = self.model.func(func);
            (f.params.clone(), f.body)
        };
        self.scope.push(false);
        let outcome = (|| {
            for &param in &params {
                let name = self.model.decl(param).name;
                let is_enum = self.model.decl(param).ti.is_enum;
                let span = self.model.decl(param).span;
                self.scope
                    .add(name, param, is_enum)
                    .map_err(|k| SemaError::new(k, span))?;
                self.sort_type_inst(param)?;
            }
            if let Some(body) = body {
                self.sort_expr(body)?;
            }
            Ok(())
        })();
        self.scope.pop();
        outcome
    }
}
