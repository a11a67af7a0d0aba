//! Runtime Core
//!
//! This module contains [`Runtime`], the central coordinator of the
//! marshalling layer. It owns every subsystem and is the single entry
//! point for both sides of the boundary: the native module drives it
//! through the inbound notification methods, script code through the
//! handle-returning accessors.
//!
//! # Architecture
//!
//! - **`TypeRegistry`**: Component schemas, property order, defaults
//! - **Graphs**: One [`Graph`] of handle caches per native object graph
//! - **`ResourcePools`**: Engine-global resource wrapper caches
//! - **`ScratchArena`**: Shared staging buffer for bulk parameters
//!
//! # Error discipline
//!
//! Inbound notification methods absorb their failures: the native caller
//! cannot catch anything, so structural problems are logged and the call
//! returns. Script-facing methods return [`Result`] and surface lifetime
//! violations as typed errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use tether::{Runtime, RuntimeSettings, TypeDescriptor};
//!
//! let mut rt = Runtime::new(RuntimeSettings::default());
//! rt.registry.register(TypeDescriptor::from_json(schema_json)?)?;
//!
//! let graph = rt.create_graph();
//! rt.create_object(graph, 0, -1);
//! let root = rt.wrap(graph, 0)?;
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::arena::ScratchArena;
use crate::decode::{self, RefOffsets};
use crate::errors::{Result, TetherError};
use crate::graph::component::{ComponentRef, KindVec};
use crate::graph::node::NodeRef;
use crate::graph::{Graph, GraphIndex};
use crate::hooks::{HookContext, HookFlags};
use crate::lifecycle::GraphBound;
use crate::registry::TypeRegistry;
use crate::resources::ResourcePools;
use crate::settings::RuntimeSettings;
use crate::value::PropValue;

// ---------------------------------------------------------------------------
// HookPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookPhase {
    Init,
    Update,
    Activate,
    Deactivate,
    Destroy,
}

impl HookPhase {
    fn flag(self) -> HookFlags {
        match self {
            Self::Init => HookFlags::INIT,
            Self::Update => HookFlags::UPDATE,
            Self::Activate => HookFlags::ACTIVATE,
            Self::Deactivate => HookFlags::DEACTIVATE,
            Self::Destroy => HookFlags::DESTROY,
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Update => "update",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Destroy => "destroy",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// The marshalling runtime: handle caches, type registry, resource
/// pools and the scratch arena, behind one coordinator.
///
/// # Lifecycle
///
/// 1. Register component types through [`registry`](Self::registry)
/// 2. Mirror native graph and object creation via the inbound methods
/// 3. Hand wrappers to script code via [`wrap`](Self::wrap) and friends
/// 4. Drive per-frame behavior with [`dispatch_update`](Self::dispatch_update)
pub struct Runtime {
    /// Component type schemas and hook factories.
    pub registry: TypeRegistry,
    /// Engine-global resource wrapper caches.
    pub pools: ResourcePools,

    settings: RuntimeSettings,
    graphs: FxHashMap<GraphIndex, Graph>,
    next_graph: u32,
    scratch: ScratchArena,

    time: f32,
    dispatch_count: u64,
}

impl Runtime {
    /// Creates a runtime with the given settings.
    #[must_use]
    pub fn new(settings: RuntimeSettings) -> Self {
        let scratch = ScratchArena::with_capacity(settings.scratch_capacity);
        Self {
            registry: TypeRegistry::new(),
            pools: ResourcePools::new(),
            settings,
            graphs: FxHashMap::default(),
            next_graph: 0,
            scratch,
            time: 0.0,
            dispatch_count: 0,
        }
    }

    /// Active settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Seconds accumulated across update dispatches.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of update dispatches so far.
    #[inline]
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// The shared staging buffer. The native module writes bulk
    /// parameters here; staged entry points read them back.
    #[inline]
    pub fn scratch(&mut self) -> &mut ScratchArena {
        &mut self.scratch
    }

    fn hook_ctx(&self, delta: f32) -> HookContext {
        HookContext {
            time: self.time,
            delta,
            frame: self.dispatch_count,
        }
    }

    // ========================================================================
    // Graph lifecycle
    // ========================================================================

    /// Creates an empty graph and returns its index.
    ///
    /// Indices are monotonic and never reused, so an index uniquely
    /// names one graph for the lifetime of the runtime.
    pub fn create_graph(&mut self) -> GraphIndex {
        let index = GraphIndex::new(self.next_graph);
        self.next_graph += 1;
        self.graphs
            .insert(index, Graph::new(index, self.settings.expected_objects));
        log::debug!("created graph {index}");
        index
    }

    /// Tears down a graph: every cached wrapper dies and the index is
    /// retired.
    ///
    /// Rejected with [`TetherError::DestroyInFlight`] while any component
    /// destroy callback is still executing inside the graph.
    pub fn destroy_graph(&mut self, graph: GraphIndex) -> Result<()> {
        let graph_ref = self
            .graphs
            .get_mut(&graph)
            .ok_or(TetherError::UnknownGraph(graph))?;
        let pending = graph_ref.pending_destroys();
        if pending > 0 {
            return Err(TetherError::DestroyInFlight { graph, pending });
        }
        let (objects, components) = graph_ref.teardown();
        self.graphs.remove(&graph);
        log::debug!("destroyed graph {graph} ({objects} objects, {components} components)");
        Ok(())
    }

    /// Looks up a graph by index.
    #[must_use]
    pub fn graph(&self, index: GraphIndex) -> Option<&Graph> {
        self.graphs.get(&index)
    }

    /// Number of live graphs.
    #[must_use]
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    // ========================================================================
    // Inbound: object notifications
    // ========================================================================

    /// Pre-sizes a graph's object cache for ids `0..total`.
    ///
    /// Covers both the initial allocation announcement and later
    /// regrowth; the cache never shrinks.
    pub fn reserve_object_handles(&mut self, graph: GraphIndex, total: usize) {
        match self.graphs.get_mut(&graph) {
            Some(graph_ref) => graph_ref.reserve_objects(total),
            None => log::error!("reserve_object_handles: unknown graph {graph}"),
        }
    }

    /// Mirrors a native object creation.
    pub fn create_object(&mut self, graph: GraphIndex, id: i32, parent_id: i32) {
        if id < 0 {
            log::error!("create_object: negative id {id} for graph {graph}");
            return;
        }
        match self.graphs.get_mut(&graph) {
            Some(graph_ref) => {
                graph_ref.register_object(id, parent_id);
            }
            None => log::error!("create_object: unknown graph {graph}"),
        }
    }

    /// Mirrors a batch of native object destructions.
    ///
    /// Only object wrappers are invalidated here; components are torn
    /// down by their own destroy notifications. Ids without a cached
    /// wrapper are skipped silently.
    pub fn destroy_objects(&mut self, graph: GraphIndex, ids: &[i32]) {
        match self.graphs.get_mut(&graph) {
            Some(graph_ref) => {
                let invalidated = graph_ref.invalidate_objects(ids);
                log::trace!(
                    "graph {graph}: invalidated {invalidated} of {} object wrappers",
                    ids.len()
                );
            }
            None => log::error!("destroy_objects: unknown graph {graph}"),
        }
    }

    /// Staged form of [`destroy_objects`](Self::destroy_objects): the id
    /// batch is read from the front of the scratch arena's int view.
    pub fn destroy_objects_staged(&mut self, graph: GraphIndex, count: usize) {
        // Copied out first; invalidation must not alias the arena.
        let ids: SmallVec<[i32; 32]> = self.scratch.ints(count).iter().copied().collect();
        self.destroy_objects(graph, &ids);
    }

    // ========================================================================
    // Inbound: component notifications
    // ========================================================================

    /// Mirrors a native component creation.
    ///
    /// The wrapper starts with a fresh clone of its type's defaults and
    /// becomes script-visible immediately; an init payload usually
    /// follows in the same frame.
    pub fn create_component(
        &mut self,
        graph: GraphIndex,
        manager: u32,
        id: i32,
        type_index: u32,
        owner_id: i32,
    ) {
        if id < 0 || owner_id < 0 {
            log::error!(
                "create_component: negative id {id} or owner {owner_id} for graph {graph}"
            );
            return;
        }
        let (kinds, values, hooks, type_idx) = match self.registry.get_raw(type_index) {
            Ok(ty) => (
                ty.slots().iter().map(|slot| slot.kind).collect::<KindVec>(),
                ty.default_values(),
                ty.make_hooks(),
                ty.index(),
            ),
            Err(error) => {
                log::error!("create_component: {error}");
                return;
            }
        };
        let Some(graph_ref) = self.graphs.get_mut(&graph) else {
            log::error!("create_component: unknown graph {graph}");
            return;
        };
        let cache = graph_ref.manager_cache(manager);
        if cache.contains(id) {
            log::warn!(
                "create_component: graph {graph} manager {manager} id {id} created twice, keeping existing wrapper"
            );
            return;
        }
        let component =
            ComponentRef::new(graph, manager, id, owner_id, type_idx, kinds, values, hooks);
        let _ = cache.insert(id, component);
    }

    /// Decodes an init payload onto a batch of freshly created
    /// components, then runs their init hooks.
    ///
    /// Returns how many components were initialized from the payload.
    /// Failures are absorbed per the decoder's isolation rules.
    pub fn init_components(
        &mut self,
        graph: GraphIndex,
        manager: u32,
        ids: &[i32],
        payload: &[u8],
        offsets: RefOffsets,
    ) -> usize {
        let applied = {
            let Some(graph_ref) = self.graphs.get_mut(&graph) else {
                log::error!("init_components: unknown graph {graph}");
                return 0;
            };
            decode::apply_init(
                graph_ref,
                &self.pools,
                &self.registry,
                manager,
                ids,
                payload,
                offsets,
            )
        };
        self.run_init_hooks(graph, manager, ids);
        applied
    }

    /// Staged form of [`init_components`](Self::init_components): ids
    /// occupy the front of the scratch arena's int view and the payload
    /// bytes follow immediately after them.
    pub fn init_components_staged(
        &mut self,
        graph: GraphIndex,
        manager: u32,
        id_count: usize,
        payload_len: usize,
        offsets: RefOffsets,
    ) -> usize {
        let id_bytes = id_count * 4;
        let ids: SmallVec<[i32; 32]> = self.scratch.ints(id_count).iter().copied().collect();
        let applied = {
            let staged = self.scratch.bytes(id_bytes + payload_len);
            let payload = &staged[id_bytes..];
            let Some(graph_ref) = self.graphs.get_mut(&graph) else {
                log::error!("init_components: unknown graph {graph}");
                return 0;
            };
            decode::apply_init(
                graph_ref,
                &self.pools,
                &self.registry,
                manager,
                &ids,
                payload,
                offsets,
            )
        };
        self.run_init_hooks(graph, manager, &ids);
        applied
    }

    fn run_init_hooks(&mut self, graph: GraphIndex, manager: u32, ids: &[i32]) {
        let ctx = self.hook_ctx(0.0);
        let mut fresh: SmallVec<[ComponentRef; 16]> = SmallVec::new();
        if let Some(graph_ref) = self.graphs.get(&graph) {
            for &id in ids {
                if let Some(component) = graph_ref.component(manager, id)
                    && !component.is_initialized()
                {
                    fresh.push(component);
                }
            }
        }
        for component in fresh {
            component.mark_initialized();
            self.fire_hook(&component, HookPhase::Init, ctx);
        }
    }

    /// Mirrors one native component destruction.
    ///
    /// The wrapper passes through pending-destroy while its destroy hook
    /// runs, then dies and leaves the cache. Ids without a cached
    /// wrapper and repeated destructions are absorbed.
    pub fn destroy_component(&mut self, graph: GraphIndex, manager: u32, id: i32) {
        let component = {
            let Some(graph_ref) = self.graphs.get_mut(&graph) else {
                log::warn!("destroy_component: unknown graph {graph}");
                return;
            };
            let Some(component) = graph_ref.component(manager, id) else {
                log::trace!(
                    "destroy_component: graph {graph} manager {manager} id {id} has no wrapper"
                );
                return;
            };
            if !component.begin_destroy() {
                log::warn!(
                    "destroy_component: graph {graph} manager {manager} id {id} destroyed twice"
                );
                return;
            }
            graph_ref.enter_destroy();
            component
        };

        let ctx = self.hook_ctx(0.0);
        self.fire_hook(&component, HookPhase::Destroy, ctx);

        // The graph is still present: teardown is rejected while the
        // destroy counter is nonzero.
        if let Some(graph_ref) = self.graphs.get_mut(&graph) {
            graph_ref.leave_destroy();
            graph_ref.take_component(manager, id);
        }
        component.kill();
        log::trace!("destroyed component {id} (manager {manager}, graph {graph})");
    }

    // ========================================================================
    // Script-facing: handles
    // ========================================================================

    /// Returns the stable wrapper for a native object, creating and
    /// caching one when the object has not been wrapped yet.
    pub fn wrap(&mut self, graph: GraphIndex, id: i32) -> Result<NodeRef> {
        if id < 0 {
            return Err(TetherError::InvalidId(id));
        }
        let graph_ref = self
            .graphs
            .get_mut(&graph)
            .ok_or(TetherError::UnknownGraph(graph))?;
        Ok(graph_ref.wrap_object(id))
    }

    /// Cached object wrapper, without creating one.
    #[must_use]
    pub fn object(&self, graph: GraphIndex, id: i32) -> Option<NodeRef> {
        self.graphs.get(&graph)?.object(id)
    }

    /// Cached component wrapper, without creating one. Component
    /// wrappers only come into existence through creation notifications.
    #[must_use]
    pub fn component(&self, graph: GraphIndex, manager: u32, id: i32) -> Option<ComponentRef> {
        self.graphs.get(&graph)?.component(manager, id)
    }

    /// The object a component is attached to, memoized on first call.
    pub fn component_owner(&mut self, component: &ComponentRef) -> Result<NodeRef> {
        if let Some(owner) = component.cached_owner() {
            return Ok(owner);
        }
        let graph = component.bound_graph()?;
        let owner_id = component.owner_id()?;
        if owner_id < 0 {
            return Err(TetherError::InvalidId(owner_id));
        }
        let graph_ref = self
            .graphs
            .get_mut(&graph)
            .ok_or(TetherError::UnknownGraph(graph))?;
        let owner = graph_ref.wrap_object(owner_id);
        component.memoize_owner(owner.clone());
        Ok(owner)
    }

    /// Reads a component property by name.
    pub fn component_value(&self, component: &ComponentRef, property: &str) -> Result<PropValue> {
        let position = self.property_position(component, property)?;
        component.value(position)
    }

    /// Writes a component property by name.
    ///
    /// The value must match the declared kind; object references must
    /// come from the component's own graph.
    pub fn set_component_value(
        &self,
        component: &ComponentRef,
        property: &str,
        value: PropValue,
    ) -> Result<()> {
        let position = self.property_position(component, property)?;
        component.set_value(position, value)
    }

    fn property_position(&self, component: &ComponentRef, property: &str) -> Result<usize> {
        let ty = self.registry.get(component.type_index())?;
        ty.position_of(property)
            .ok_or_else(|| TetherError::UnknownProperty {
                type_name: ty.name().to_owned(),
                property: property.to_owned(),
            })
    }

    /// Activates or deactivates a component, firing the matching hook
    /// on an actual transition.
    pub fn set_component_active(&mut self, component: &ComponentRef, active: bool) -> Result<()> {
        component.state().ensure_live("component activation")?;
        if component.is_active() == active {
            return Ok(());
        }
        component.set_active_flag(active);
        let ctx = self.hook_ctx(0.0);
        let phase = if active {
            HookPhase::Activate
        } else {
            HookPhase::Deactivate
        };
        self.fire_hook(component, phase, ctx);
        Ok(())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Runs the update hook of every live, active component.
    ///
    /// Components are snapshotted up front, so hooks may freely create
    /// and destroy components and graphs while the dispatch runs;
    /// wrappers that die mid-dispatch are skipped.
    pub fn dispatch_update(&mut self, dt: f32) {
        self.time += dt;
        self.dispatch_count += 1;
        let ctx = self.hook_ctx(dt);

        let components: Vec<ComponentRef> = self
            .graphs
            .values()
            .flat_map(Graph::components_snapshot)
            .collect();

        for component in components {
            if !component.is_live() || !component.is_active() {
                continue;
            }
            self.fire_hook(&component, HookPhase::Update, ctx);
        }
    }

    /// Runs one hook through the failure boundary: the error is logged,
    /// never propagated, and the component is optionally deactivated.
    fn fire_hook(&mut self, component: &ComponentRef, phase: HookPhase, ctx: HookContext) {
        let flags = self
            .registry
            .get(component.type_index())
            .map(|ty| ty.hook_flags())
            .unwrap_or_default();
        if !flags.contains(phase.flag()) {
            return;
        }
        let Some(mut hooks) = component.take_hooks() else {
            return;
        };
        let result = match phase {
            HookPhase::Init => hooks.init(self, component, &ctx),
            HookPhase::Update => hooks.update(self, component, &ctx),
            HookPhase::Activate => hooks.on_activate(self, component, &ctx),
            HookPhase::Deactivate => hooks.on_deactivate(self, component, &ctx),
            HookPhase::Destroy => hooks.on_destroy(self, component, &ctx),
        };
        component.put_hooks(hooks);

        if let Err(error) = result {
            log::error!("{phase} hook failed on {component:?}: {error}");
            if self.settings.deactivate_on_hook_error
                && phase != HookPhase::Destroy
                && component.is_live()
            {
                log::warn!("deactivating component {} after failed {phase} hook", component.raw_id());
                component.set_active_flag(false);
            }
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeSettings::default())
    }
}
