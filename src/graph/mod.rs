//! Graphs and Handle Caches
//!
//! A graph mirrors one native object graph (a loaded scene). It owns the
//! handle caches that make wrappers referentially stable: one cache for
//! objects, one per native component manager. Everything script code
//! holds on to points into these caches.
//!
//! Graph indices are monotonic and never recycled. Destroying a graph
//! retires its index for good, so a stale index can never alias a newer
//! graph.

pub mod cache;
pub mod component;
pub mod node;

use cache::IdCache;
use component::ComponentRef;
use node::NodeRef;

use crate::lifecycle::DEAD_ID;

// ---------------------------------------------------------------------------
// GraphIndex
// ---------------------------------------------------------------------------

/// Monotonic identity of a graph. Never reused after teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphIndex(u32);

impl GraphIndex {
    /// Wraps a raw index as exchanged with the native module.
    #[inline]
    #[must_use]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index value.
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GraphIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// One native object graph and its handle caches.
pub struct Graph {
    index: GraphIndex,
    objects: IdCache<NodeRef>,
    // One cache per native component manager, indexed by manager index.
    components: Vec<IdCache<ComponentRef>>,
    pending_destroys: u32,
}

impl Graph {
    pub(crate) fn new(index: GraphIndex, expected_objects: usize) -> Self {
        Self {
            index,
            objects: IdCache::with_capacity(expected_objects),
            components: Vec::new(),
            pending_destroys: 0,
        }
    }

    /// This graph's identity.
    #[inline]
    #[must_use]
    pub fn index(&self) -> GraphIndex {
        self.index
    }

    // === Objects ===

    /// Cached wrapper for a native object id, if one exists.
    #[must_use]
    pub fn object(&self, id: i32) -> Option<NodeRef> {
        self.objects.get(id).cloned()
    }

    /// Number of live object wrappers.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Pre-sizes the object cache for ids `0..total`.
    pub(crate) fn reserve_objects(&mut self, total: usize) {
        self.objects.reserve(total);
    }

    /// Registers a freshly created native object.
    ///
    /// When the slot is already occupied the existing wrapper wins: the
    /// native side recreated an id without destroying it first, which is
    /// logged but must not spawn a second identity.
    pub(crate) fn register_object(&mut self, id: i32, parent_id: i32) -> NodeRef {
        if let Some(existing) = self.objects.get(id) {
            log::warn!(
                "graph {}: object {id} created twice without destroy, keeping existing wrapper",
                self.index
            );
            return existing.clone();
        }
        let node = NodeRef::new(self.index, id, parent_id);
        // Insert cannot fail here: negative ids are rejected upstream.
        let _ = self.objects.insert(id, node.clone());
        node
    }

    /// Returns the cached wrapper for `id`, creating one when absent.
    ///
    /// The wrap-on-demand path is for objects that existed before script
    /// code first looked at them; their parent linkage is unknown.
    pub(crate) fn wrap_object(&mut self, id: i32) -> NodeRef {
        if let Some(existing) = self.objects.get(id) {
            return existing.clone();
        }
        let node = NodeRef::new(self.index, id, DEAD_ID);
        let _ = self.objects.insert(id, node.clone());
        node
    }

    /// Kills and evicts the wrapper for one destroyed object.
    ///
    /// Absent ids are a silent no-op: destruction notices can arrive for
    /// objects script code never wrapped.
    pub(crate) fn invalidate_object(&mut self, id: i32) -> bool {
        match self.objects.take(id) {
            Some(node) => {
                node.kill();
                true
            }
            None => false,
        }
    }

    /// Kills and evicts wrappers for a batch of destroyed objects.
    /// Returns how many wrappers were actually present.
    pub(crate) fn invalidate_objects(&mut self, ids: &[i32]) -> usize {
        ids.iter()
            .filter(|&&id| self.invalidate_object(id))
            .count()
    }

    // === Components ===

    /// Cached wrapper for a component instance, if one exists.
    #[must_use]
    pub fn component(&self, manager: u32, id: i32) -> Option<ComponentRef> {
        self.components
            .get(manager as usize)?
            .get(id)
            .cloned()
    }

    /// Total live component wrappers across all managers.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.iter().map(IdCache::len).sum()
    }

    pub(crate) fn manager_cache(&mut self, manager: u32) -> &mut IdCache<ComponentRef> {
        let index = manager as usize;
        if index >= self.components.len() {
            self.components.resize_with(index + 1, IdCache::new);
        }
        &mut self.components[index]
    }

    pub(crate) fn take_component(&mut self, manager: u32, id: i32) -> Option<ComponentRef> {
        self.components.get_mut(manager as usize)?.take(id)
    }

    /// Snapshot of every live component wrapper, for dispatch. Cloned out
    /// so hooks can freely create and destroy components while running.
    pub(crate) fn components_snapshot(&self) -> Vec<ComponentRef> {
        self.components
            .iter()
            .flat_map(|cache| cache.iter().map(|(_, component)| component.clone()))
            .collect()
    }

    // === Destroy bookkeeping ===

    /// Number of destroy callbacks currently executing in this graph.
    #[inline]
    #[must_use]
    pub fn pending_destroys(&self) -> u32 {
        self.pending_destroys
    }

    pub(crate) fn enter_destroy(&mut self) {
        self.pending_destroys += 1;
    }

    pub(crate) fn leave_destroy(&mut self) {
        debug_assert!(self.pending_destroys > 0);
        self.pending_destroys = self.pending_destroys.saturating_sub(1);
    }

    /// Kills every wrapper in the graph. Runs as the final step of graph
    /// teardown, after the in-flight destroy check passed.
    pub(crate) fn teardown(&mut self) -> (usize, usize) {
        let objects = self.objects.len();
        let mut components = 0;
        for cache in &mut self.components {
            for wrapper in cache.drain() {
                wrapper.kill();
                components += 1;
            }
        }
        for node in self.objects.drain() {
            node.kill();
        }
        (objects, components)
    }
}
