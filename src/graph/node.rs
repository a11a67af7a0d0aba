//! Graph object wrapper.
//!
//! [`NodeRef`] is the script-visible identity of one native graph object.
//! Clones share one interior allocation, so `==` is identity: two
//! `NodeRef`s compare equal exactly when they wrap the same cached entry.
//! The handle cache guarantees at most one interior per `(graph, id)`
//! pair, which makes wrapper equality equivalent to native identity.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::Result;
use crate::graph::GraphIndex;
use crate::lifecycle::{DEAD_ID, GraphBound, HandleState};

#[derive(Debug)]
struct NodeState {
    graph: GraphIndex,
    id: i32,
    parent_id: i32,
    state: HandleState,
}

/// Referentially stable wrapper around one native graph object.
///
/// Cheap to clone; all clones observe destruction together.
#[derive(Clone)]
pub struct NodeRef {
    inner: Arc<RwLock<NodeState>>,
}

impl NodeRef {
    pub(crate) fn new(graph: GraphIndex, id: i32, parent_id: i32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NodeState {
                graph,
                id,
                parent_id,
                state: HandleState::Live,
            })),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.inner.read().state
    }

    /// `true` while the native object exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// Native local id without a liveness check.
    ///
    /// Reads [`DEAD_ID`] once the wrapper is dead; use this for
    /// diagnostics and [`id`](Self::id) for logic.
    #[must_use]
    pub fn raw_id(&self) -> i32 {
        self.inner.read().id
    }

    /// Native local id of a live (or pending-destroy) object.
    pub fn id(&self) -> Result<i32> {
        let state = self.inner.read();
        state.state.ensure_accessible("object id")?;
        Ok(state.id)
    }

    /// Native local id of the parent object, [`DEAD_ID`] for roots.
    pub fn parent_id(&self) -> Result<i32> {
        let state = self.inner.read();
        state.state.ensure_accessible("object parent")?;
        Ok(state.parent_id)
    }

    /// Identity comparison without going through `==`.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Severs the wrapper from its native object. Terminal.
    pub(crate) fn kill(&self) {
        let mut state = self.inner.write();
        state.state = HandleState::Dead;
        state.id = DEAD_ID;
        state.parent_id = DEAD_ID;
    }
}

impl GraphBound for NodeRef {
    fn bound_graph(&self) -> Result<GraphIndex> {
        let state = self.inner.read();
        state.state.ensure_accessible("object graph")?;
        Ok(state.graph)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for NodeRef {}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("NodeRef")
            .field("graph", &state.graph)
            .field("id", &state.id)
            .field("state", &state.state)
            .finish()
    }
}
