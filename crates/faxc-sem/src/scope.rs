//! The scope stack: push/pop of named-declaration frames with a
//! distinguished top-level frame that is always visible from any
//! descendant.
//!
//! Lookup climbs from the top frame downward; the moment it reaches a
//! toplevel frame it jumps directly to the outermost frame (index 0) and
//! stops there. Parallel non-toplevel frames (e.g. two sibling `let`s)
//! never see each other; only the bottom-most frame is shared.

use faxc_util::{FxHashMap, Symbol};

use faxc_par::DeclId;

use crate::errors::SemaErrorKind;

struct Frame {
    bindings: FxHashMap<Symbol, DeclId>,
    toplevel: bool,
}

/// The scope stack. Constructed with its outermost toplevel frame already
/// open; that frame lives for the entire checker run and
/// is never popped.
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame {
                bindings: FxHashMap::default(),
                toplevel: true,
            }],
        }
    }

    /// Open a new frame.
    pub fn push(&mut self, toplevel: bool) {
        self.frames.push(Frame {
            bindings: FxHashMap::default(),
            toplevel,
        });
    }

    /// Close the top frame.
    ///
    /// # Panics
    ///
    /// Panics if called with only the permanent outermost frame left; that
    /// would indicate a push/pop mismatch in the caller.
    pub fn pop(&mut self) {
        assert!(
            self.frames.len() > 1,
            "ScopeStack::pop called with no frame to close"
        );
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` to `decl` in the current frame.
    ///
    /// Fails with `redefinition` if `name` is already bound in the current
    /// frame, or with `enum-not-top-level` if `is_enum` is set and the
    /// current frame is not the toplevel frame.
    pub fn add(&mut self, name: Symbol, decl: DeclId, is_enum: bool) -> Result<(), SemaErrorKind> {
        let top = self.frames.last_mut().expect("ScopeStack is never empty");
        if is_enum && !top.toplevel {
            return Err(SemaErrorKind::EnumNotTopLevel(name));
        }
        if top.bindings.contains_key(&name) {
            return Err(SemaErrorKind::Redefinition(name));
        }
        top.bindings.insert(name, decl);
        Ok(())
    }

    /// Search from the top frame downward; upon reaching a toplevel frame,
    /// jump to the outermost frame and search there, then stop.
    pub fn find(&self, name: Symbol) -> Option<DeclId> {
        for frame in self.frames.iter().rev() {
            if let Some(&decl) = frame.bindings.get(&name) {
                return Some(decl);
            }
            if frame.toplevel {
                return self.frames[0].bindings.get(&name).copied();
            }
        }
        None
    }
}
