//! Global String Interner
//!
//! Interns type and property names so that schema lookups compare and hash
//! integer symbols instead of strings. Registration interns once; every
//! decode and dispatch afterwards works on [`Symbol`]s.

use std::sync::OnceLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

/// Compact integer identifier for an interned string.
pub type Symbol = Spur;

#[inline]
fn interner() -> &'static ThreadedRodeo {
    INTERNER.get_or_init(ThreadedRodeo::new)
}

/// Interns a string, returning its [`Symbol`].
///
/// Returns the existing symbol when the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    interner().get_or_intern(s)
}

/// Looks up the [`Symbol`] of an already-interned string.
///
/// Returns `None` without allocating when the string was never interned.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    interner().get(s)
}

/// Resolves a [`Symbol`] back to its string.
///
/// # Panics
/// Panics when the symbol did not come from this interner (does not
/// happen for symbols produced by [`intern`]).
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    interner().resolve(&sym)
}
