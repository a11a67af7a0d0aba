//! Handle Lifecycle
//!
//! State machine shared by every script-visible wrapper. A wrapper is
//! `Live` from creation until the native module destroys its object. While
//! the destroy callback runs the wrapper is `PendingDestroy`: reads still
//! work so the callback can clean up, but the owning graph refuses
//! teardown until the callback returns. After that the wrapper is `Dead`
//! forever; its id reads as the sentinel and operations fail.
//!
//! Wrappers never resurrect. Recreating a native object with a recycled id
//! produces a fresh wrapper; old references stay dead.

use crate::errors::{Result, TetherError};
use crate::graph::GraphIndex;

/// Sentinel read back from the id fields of a dead wrapper.
pub const DEAD_ID: i32 = -1;

/// Lifecycle state of a script-visible wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Backed by a live native object.
    Live,
    /// The destroy callback for this wrapper is currently executing.
    /// Fields remain readable; the owning graph cannot be torn down.
    PendingDestroy,
    /// The native object is gone. Terminal.
    Dead,
}

impl HandleState {
    /// `true` only for [`Live`](Self::Live).
    #[inline]
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// `true` for [`Live`](Self::Live) and [`PendingDestroy`](Self::PendingDestroy).
    ///
    /// Field reads are allowed in both: destroy callbacks inspect the
    /// component they are tearing down.
    #[inline]
    #[must_use]
    pub fn is_accessible(self) -> bool {
        !matches!(self, Self::Dead)
    }

    /// Guards an operation that needs a fully live wrapper.
    #[inline]
    pub fn ensure_live(self, context: &'static str) -> Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(TetherError::DestroyedHandle { context })
        }
    }

    /// Guards a field read. Permits [`PendingDestroy`](Self::PendingDestroy).
    #[inline]
    pub fn ensure_accessible(self, context: &'static str) -> Result<()> {
        if self.is_accessible() {
            Ok(())
        } else {
            Err(TetherError::DestroyedHandle { context })
        }
    }
}

/// Anything bound to a graph for as long as it is alive.
///
/// Implemented by object and component wrappers so that operations that
/// relate two handles can verify they share a graph without caring which
/// wrapper flavors they got.
pub trait GraphBound {
    /// The graph this handle belongs to, or [`TetherError::DestroyedHandle`]
    /// once the wrapper is dead.
    fn bound_graph(&self) -> Result<GraphIndex>;
}

/// Verifies that two handles belong to the same graph.
///
/// Dead handles fail with [`TetherError::DestroyedHandle`] before any
/// graph comparison happens.
pub fn assert_same_graph<A, B>(a: &A, b: &B) -> Result<()>
where
    A: GraphBound + ?Sized,
    B: GraphBound + ?Sized,
{
    let left = a.bound_graph()?;
    let right = b.bound_graph()?;
    if left == right {
        Ok(())
    } else {
        Err(TetherError::CrossGraph { left, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<GraphIndex>);

    impl GraphBound for Fixed {
        fn bound_graph(&self) -> Result<GraphIndex> {
            self.0.ok_or(TetherError::DestroyedHandle { context: "test" })
        }
    }

    #[test]
    fn live_allows_everything() {
        assert!(HandleState::Live.ensure_live("op").is_ok());
        assert!(HandleState::Live.ensure_accessible("read").is_ok());
    }

    #[test]
    fn pending_destroy_allows_reads_only() {
        assert!(HandleState::PendingDestroy.ensure_accessible("read").is_ok());
        assert!(HandleState::PendingDestroy.ensure_live("op").is_err());
    }

    #[test]
    fn dead_rejects_everything() {
        assert!(HandleState::Dead.ensure_live("op").is_err());
        assert!(HandleState::Dead.ensure_accessible("read").is_err());
    }

    #[test]
    fn same_graph_guard() {
        let a = Fixed(Some(GraphIndex::new(1)));
        let b = Fixed(Some(GraphIndex::new(1)));
        let c = Fixed(Some(GraphIndex::new(2)));
        let dead = Fixed(None);

        assert!(assert_same_graph(&a, &b).is_ok());
        assert!(matches!(
            assert_same_graph(&a, &c),
            Err(TetherError::CrossGraph { .. })
        ));
        assert!(matches!(
            assert_same_graph(&a, &dead),
            Err(TetherError::DestroyedHandle { .. })
        ));
    }
}
