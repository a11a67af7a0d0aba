//! Engine Resource Pools
//!
//! Script-visible wrappers for native engine resources (meshes, textures,
//! materials, animation clips, skins). Resources are engine-global rather
//! than graph-bound: the same material wrapper may be referenced from
//! components in any graph.
//!
//! Each pool deduplicates by raw native id, so wrapping the same id twice
//! yields the same [`ResourceRef`] and wrapper equality means native
//! identity, exactly like object handles.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slotmap::{Key, SlotMap, new_key_type};

use crate::errors::Result;
use crate::lifecycle::{DEAD_ID, HandleState};
use crate::registry::schema::ResourceKind;

// Strongly-typed pool keys
new_key_type! {
    pub struct MeshKey;
    pub struct TextureKey;
    pub struct MaterialKey;
    pub struct AnimationKey;
    pub struct SkinKey;
}

// ---------------------------------------------------------------------------
// ResourceRef
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ResourceState {
    kind: ResourceKind,
    id: i32,
    state: HandleState,
}

/// Referentially stable wrapper around one native engine resource.
#[derive(Clone)]
pub struct ResourceRef {
    inner: Arc<RwLock<ResourceState>>,
}

impl ResourceRef {
    fn new(kind: ResourceKind, id: i32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ResourceState {
                kind,
                id,
                state: HandleState::Live,
            })),
        }
    }

    /// Which resource family this wrapper belongs to.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.inner.read().kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.inner.read().state
    }

    /// `true` while the native resource exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// Native resource id without a liveness check. Reads
    /// [`DEAD_ID`] once the wrapper is dead.
    #[must_use]
    pub fn raw_id(&self) -> i32 {
        self.inner.read().id
    }

    /// Native resource id of a live resource.
    pub fn id(&self) -> Result<i32> {
        let state = self.inner.read();
        state.state.ensure_accessible("resource id")?;
        Ok(state.id)
    }

    /// Identity comparison without going through `==`.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn kill(&self) {
        let mut state = self.inner.write();
        state.state = HandleState::Dead;
        state.id = DEAD_ID;
    }
}

impl PartialEq for ResourceRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ResourceRef {}

impl std::fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("ResourceRef")
            .field("kind", &state.kind)
            .field("id", &state.id)
            .field("state", &state.state)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

struct PoolInner<K: Key> {
    map: SlotMap<K, ResourceRef>,
    lookup: FxHashMap<i32, K>,
}

impl<K: Key> Default for PoolInner<K> {
    fn default() -> Self {
        Self {
            map: SlotMap::default(),
            lookup: FxHashMap::default(),
        }
    }
}

/// One resource family's wrapper cache, deduplicated by raw native id.
pub struct ResourcePool<K: Key> {
    kind: ResourceKind,
    inner: RwLock<PoolInner<K>>,
}

impl<K: Key> ResourcePool<K> {
    #[must_use]
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            inner: RwLock::default(),
        }
    }

    /// Wraps a raw native id, returning the cached wrapper when one exists.
    pub fn wrap(&self, raw_id: i32) -> ResourceRef {
        let mut guard = self.inner.write();
        if let Some(&key) = guard.lookup.get(&raw_id)
            && let Some(existing) = guard.map.get(key)
        {
            return existing.clone();
        }
        let wrapper = ResourceRef::new(self.kind, raw_id);
        let key = guard.map.insert(wrapper.clone());
        guard.lookup.insert(raw_id, key);
        wrapper
    }

    /// Gets a wrapper by pool key.
    #[must_use]
    pub fn get(&self, key: K) -> Option<ResourceRef> {
        self.inner.read().map.get(key).cloned()
    }

    /// Gets a pool key by raw native id, without creating a wrapper.
    #[must_use]
    pub fn key_of(&self, raw_id: i32) -> Option<K> {
        self.inner.read().lookup.get(&raw_id).copied()
    }

    /// Kills and evicts the wrapper for a freed native resource.
    ///
    /// Returns `false` when the id was never wrapped; repeated
    /// invalidation is a silent no-op.
    pub fn invalidate(&self, raw_id: i32) -> bool {
        let mut guard = self.inner.write();
        let Some(key) = guard.lookup.remove(&raw_id) else {
            return false;
        };
        if let Some(wrapper) = guard.map.remove(key) {
            wrapper.kill();
            true
        } else {
            false
        }
    }

    /// Number of live wrappers in this pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// `true` when no wrapper is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// ResourcePools
// ---------------------------------------------------------------------------

macro_rules! impl_pool_api {
    ($(($single:ident, $field:ident, $key:ty, $kind:expr)),+ $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Wraps a native ", stringify!($single), " id, reusing the cached wrapper when present.")]
                pub fn [<wrap_ $single>](&self, raw_id: i32) -> ResourceRef {
                    self.$field.wrap(raw_id)
                }

                #[doc = concat!("Kills and evicts the wrapper for a freed native ", stringify!($single), ".")]
                pub fn [<invalidate_ $single>](&self, raw_id: i32) -> bool {
                    self.$field.invalidate(raw_id)
                }
            )+
        }
    };
}

/// All five resource wrapper caches.
pub struct ResourcePools {
    pub meshes: ResourcePool<MeshKey>,
    pub textures: ResourcePool<TextureKey>,
    pub materials: ResourcePool<MaterialKey>,
    pub animations: ResourcePool<AnimationKey>,
    pub skins: ResourcePool<SkinKey>,
}

impl Default for ResourcePools {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcePools {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meshes: ResourcePool::new(ResourceKind::Mesh),
            textures: ResourcePool::new(ResourceKind::Texture),
            materials: ResourcePool::new(ResourceKind::Material),
            animations: ResourcePool::new(ResourceKind::Animation),
            skins: ResourcePool::new(ResourceKind::Skin),
        }
    }

    impl_pool_api!(
        (mesh, meshes, MeshKey, ResourceKind::Mesh),
        (texture, textures, TextureKey, ResourceKind::Texture),
        (material, materials, MaterialKey, ResourceKind::Material),
        (animation, animations, AnimationKey, ResourceKind::Animation),
        (skin, skins, SkinKey, ResourceKind::Skin),
    );

    /// Wraps a raw id through the pool for `kind`.
    pub fn wrap_kind(&self, kind: ResourceKind, raw_id: i32) -> ResourceRef {
        match kind {
            ResourceKind::Mesh => self.wrap_mesh(raw_id),
            ResourceKind::Texture => self.wrap_texture(raw_id),
            ResourceKind::Material => self.wrap_material(raw_id),
            ResourceKind::Animation => self.wrap_animation(raw_id),
            ResourceKind::Skin => self.wrap_skin(raw_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_is_idempotent() {
        let pools = ResourcePools::new();
        let a = pools.wrap_mesh(7);
        let b = pools.wrap_mesh(7);
        let c = pools.wrap_mesh(8);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pools.meshes.len(), 2);
        assert_eq!(a.kind(), ResourceKind::Mesh);
        assert_eq!(a.id().unwrap(), 7);
    }

    #[test]
    fn pools_do_not_alias_across_kinds() {
        let pools = ResourcePools::new();
        let mesh = pools.wrap_mesh(3);
        let texture = pools.wrap_texture(3);

        assert_ne!(mesh, texture);
        assert_eq!(texture.kind(), ResourceKind::Texture);
    }

    #[test]
    fn invalidate_kills_and_evicts() {
        let pools = ResourcePools::new();
        let clip = pools.wrap_animation(2);

        assert!(pools.invalidate_animation(2));
        assert!(!clip.is_live());
        assert_eq!(clip.raw_id(), DEAD_ID);
        assert!(clip.id().is_err());

        // Absent ids no-op, and rewrapping yields a fresh wrapper.
        assert!(!pools.invalidate_animation(2));
        let reborn = pools.wrap_animation(2);
        assert_ne!(clip, reborn);
        assert!(reborn.is_live());
    }
}
