//! Component Hooks
//!
//! Script-side behavior attached to a component type. A type registers a
//! hook factory once; every component instance of that type then gets its
//! own hook object, driven by the runtime's dispatch entry points.
//!
//! Hooks receive the runtime itself and may reenter it: reading and
//! writing properties, wrapping objects, creating or destroying other
//! components. The dispatch machinery removes the hook box from its
//! component before calling it, so a nested dispatch to the same
//! component finds nothing to run and the reentrancy resolves to a
//! no-op instead of a deadlock.
//!
//! Hook failures never unwind into the native module. The dispatch
//! boundary catches the error, logs it with component context and,
//! depending on
//! [`RuntimeSettings::deactivate_on_hook_error`](crate::settings::RuntimeSettings),
//! deactivates the offending component.

use bitflags::bitflags;

use crate::errors::Result;
use crate::graph::component::ComponentRef;
use crate::runtime::Runtime;

bitflags! {
    /// Which hook entry points a component type implements.
    ///
    /// Dispatch consults these flags before touching any component, so
    /// types without an `update` hook cost nothing per dispatch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct HookFlags: u32 {
        const INIT       = 1 << 0;
        const UPDATE     = 1 << 1;
        const ACTIVATE   = 1 << 2;
        const DEACTIVATE = 1 << 3;
        const DESTROY    = 1 << 4;
    }
}

/// Per-dispatch timing context handed to every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookContext {
    /// Seconds since the runtime started dispatching.
    pub time: f32,
    /// Seconds covered by the current dispatch.
    pub delta: f32,
    /// Monotonic dispatch counter.
    pub frame: u64,
}

/// Behavior attached to one component instance.
///
/// All entry points default to no-ops so implementors only write the
/// hooks they declared in their [`HookFlags`].
#[allow(unused_variables)]
pub trait ComponentHooks {
    /// Runs once after the component's properties are decoded.
    fn init(&mut self, rt: &mut Runtime, component: &ComponentRef, ctx: &HookContext) -> Result<()> {
        Ok(())
    }

    /// Runs every update dispatch while the component is live and active.
    fn update(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        ctx: &HookContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs when the component transitions from inactive to active.
    fn on_activate(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        ctx: &HookContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs when the component transitions from active to inactive.
    fn on_deactivate(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        ctx: &HookContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs while the component is pending destroy. The component's
    /// fields are still readable here; afterwards the wrapper is dead.
    /// Destroying the owning graph from inside this hook is rejected
    /// with [`DestroyInFlight`](crate::errors::TetherError::DestroyInFlight).
    fn on_destroy(
        &mut self,
        rt: &mut Runtime,
        component: &ComponentRef,
        ctx: &HookContext,
    ) -> Result<()> {
        Ok(())
    }
}

/// Produces one hook object per component instance.
pub type HookFactory = Box<dyn Fn() -> Box<dyn ComponentHooks>>;
