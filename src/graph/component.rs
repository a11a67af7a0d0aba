//! Component wrapper.
//!
//! [`ComponentRef`] is the script-visible identity of one native
//! component instance. Like object wrappers, clones share one interior
//! and `==` is identity. On top of the lifecycle machinery a component
//! carries its typed property slots, an activation flag, the memoized
//! owner object and the per-instance hook object.
//!
//! Hooks are dispatched through take/put: the runtime removes the hook
//! box from the wrapper, drops the lock, calls the hook with a plain
//! `&ComponentRef`, then restores the box. Hooks can therefore read and
//! write their own component without re-entering a held lock, and a
//! nested dispatch to the same component finds no hook box and skips.

use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::errors::{Result, TetherError};
use crate::graph::GraphIndex;
use crate::graph::node::NodeRef;
use crate::hooks::ComponentHooks;
use crate::lifecycle::{DEAD_ID, GraphBound, HandleState};
use crate::registry::TypeIndex;
use crate::registry::schema::PropertyKind;
use crate::value::PropValue;

/// Inline slot capacity; component types rarely exceed this.
pub(crate) type ValueVec = SmallVec<[PropValue; 8]>;
pub(crate) type KindVec = SmallVec<[PropertyKind; 8]>;

struct ComponentState {
    graph: GraphIndex,
    manager: u32,
    id: i32,
    owner_id: i32,
    owner: Option<NodeRef>,
    type_index: TypeIndex,
    active: bool,
    initialized: bool,
    kinds: KindVec,
    values: ValueVec,
    state: HandleState,
    hooks: Option<Box<dyn ComponentHooks>>,
}

/// Referentially stable wrapper around one native component instance.
#[derive(Clone)]
pub struct ComponentRef {
    inner: Arc<RwLock<ComponentState>>,
}

impl ComponentRef {
    pub(crate) fn new(
        graph: GraphIndex,
        manager: u32,
        id: i32,
        owner_id: i32,
        type_index: TypeIndex,
        kinds: KindVec,
        values: ValueVec,
        hooks: Option<Box<dyn ComponentHooks>>,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ComponentState {
                graph,
                manager,
                id,
                owner_id,
                owner: None,
                type_index,
                active: true,
                initialized: false,
                kinds,
                values,
                state: HandleState::Live,
                hooks,
            })),
        }
    }

    // === Identity ===

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.inner.read().state
    }

    /// `true` while the native component exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// Native instance id without a liveness check; [`DEAD_ID`] once dead.
    #[must_use]
    pub fn raw_id(&self) -> i32 {
        self.inner.read().id
    }

    /// Native instance id of a live (or pending-destroy) component.
    pub fn id(&self) -> Result<i32> {
        let state = self.inner.read();
        state.state.ensure_accessible("component id")?;
        Ok(state.id)
    }

    /// Index of the native component manager this instance lives in.
    #[must_use]
    pub fn manager(&self) -> u32 {
        self.inner.read().manager
    }

    /// Registered type of this component. Survives destruction for
    /// diagnostics.
    #[must_use]
    pub fn type_index(&self) -> TypeIndex {
        self.inner.read().type_index
    }

    /// Native id of the owning graph object.
    pub fn owner_id(&self) -> Result<i32> {
        let state = self.inner.read();
        state.state.ensure_accessible("component owner")?;
        Ok(state.owner_id)
    }

    /// Identity comparison without going through `==`.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // === Activation ===

    /// `true` while the component receives update dispatches.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.read().active
    }

    pub(crate) fn set_active_flag(&self, active: bool) {
        self.inner.write().active = active;
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.inner.read().initialized
    }

    pub(crate) fn mark_initialized(&self) {
        self.inner.write().initialized = true;
    }

    // === Property slots ===

    /// Number of property slots.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.inner.read().values.len()
    }

    /// Reads one property slot by position.
    ///
    /// Allowed while pending destroy so that destroy hooks can inspect
    /// the component they are tearing down.
    pub fn value(&self, position: usize) -> Result<PropValue> {
        let state = self.inner.read();
        state.state.ensure_accessible("component value")?;
        state
            .values
            .get(position)
            .cloned()
            .ok_or(TetherError::PropertySlotOutOfRange {
                position,
                count: state.values.len(),
            })
    }

    /// Declared kind of one property slot.
    pub fn kind_at(&self, position: usize) -> Result<PropertyKind> {
        let state = self.inner.read();
        state
            .kinds
            .get(position)
            .copied()
            .ok_or(TetherError::PropertySlotOutOfRange {
                position,
                count: state.kinds.len(),
            })
    }

    /// Writes one property slot by position.
    ///
    /// The value must match the slot's declared kind, and an object
    /// reference must come from this component's own graph.
    pub fn set_value(&self, position: usize, value: PropValue) -> Result<()> {
        let mut state = self.inner.write();
        state.state.ensure_live("component assignment")?;

        let count = state.values.len();
        let Some(kind) = state.kinds.get(position).copied() else {
            return Err(TetherError::PropertySlotOutOfRange { position, count });
        };
        if !value.matches_kind(kind) {
            return Err(TetherError::PropertyKindMismatch {
                property: position.to_string(),
                expected: kind,
                found: value.type_label(),
            });
        }
        // Graph isolation: a node handle may only be assigned within its
        // own graph. Resources are engine-global and exempt.
        if let PropValue::Node(Some(node)) = &value {
            let node_graph = node.bound_graph()?;
            if node_graph != state.graph {
                return Err(TetherError::CrossGraph {
                    left: state.graph,
                    right: node_graph,
                });
            }
        }
        state.values[position] = value;
        Ok(())
    }

    /// Replaces every slot at once. Decoder commit path; values are
    /// already validated against the type.
    pub(crate) fn install_values(&self, values: ValueVec) {
        self.inner.write().values = values;
    }

    // === Owner memoization ===

    pub(crate) fn cached_owner(&self) -> Option<NodeRef> {
        self.inner.read().owner.clone()
    }

    pub(crate) fn memoize_owner(&self, owner: NodeRef) {
        self.inner.write().owner = Some(owner);
    }

    // === Hook plumbing ===

    /// Removes the hook box for a dispatch. `None` when the type has no
    /// hooks or a dispatch on this component is already in progress.
    pub(crate) fn take_hooks(&self) -> Option<Box<dyn ComponentHooks>> {
        self.inner.write().hooks.take()
    }

    /// Restores the hook box after a dispatch, unless the component died
    /// while the hook ran.
    pub(crate) fn put_hooks(&self, hooks: Box<dyn ComponentHooks>) {
        let mut state = self.inner.write();
        if state.state != HandleState::Dead {
            state.hooks = Some(hooks);
        }
    }

    // === Lifecycle transitions ===

    /// Live -> PendingDestroy. Returns `false` when the component is not
    /// live (double destroy).
    pub(crate) fn begin_destroy(&self) -> bool {
        let mut state = self.inner.write();
        if state.state != HandleState::Live {
            return false;
        }
        state.state = HandleState::PendingDestroy;
        true
    }

    /// Severs the wrapper from its native component. Terminal: clears
    /// values, owner and hooks so no graph or resource handles are kept
    /// alive through a dead wrapper.
    pub(crate) fn kill(&self) {
        let mut state = self.inner.write();
        state.state = HandleState::Dead;
        state.id = DEAD_ID;
        state.owner_id = DEAD_ID;
        state.owner = None;
        state.active = false;
        state.values.clear();
        state.hooks = None;
    }
}

impl GraphBound for ComponentRef {
    fn bound_graph(&self) -> Result<GraphIndex> {
        let state = self.inner.read();
        state.state.ensure_accessible("component graph")?;
        Ok(state.graph)
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ComponentRef {}

impl std::fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("ComponentRef")
            .field("graph", &state.graph)
            .field("manager", &state.manager)
            .field("id", &state.id)
            .field("type", &state.type_index)
            .field("state", &state.state)
            .finish()
    }
}
