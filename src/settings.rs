//! Runtime Settings
//!
//! Configuration consumed once when constructing a [`Runtime`](crate::Runtime).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tether::{Runtime, RuntimeSettings};
//!
//! // Defaults are suitable for most hosts
//! let runtime = Runtime::new(RuntimeSettings::default());
//!
//! // A host that front-loads large scenes
//! let runtime = Runtime::new(RuntimeSettings {
//!     expected_objects: 4096,
//!     scratch_capacity: 64 * 1024,
//!     ..Default::default()
//! });
//! ```

use crate::arena::SCRATCH_QUANTUM;

/// Global configuration for the marshalling runtime.
///
/// # Fields
///
/// | Field                      | Description                                   | Default |
/// |----------------------------|-----------------------------------------------|---------|
/// | `expected_objects`         | Pre-sized handle slots per new graph          | `256`   |
/// | `scratch_capacity`         | Initial scratch arena capacity in bytes       | `4096`  |
/// | `deactivate_on_hook_error` | Deactivate a component when its hook fails    | `true`  |
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    // === Capacity Hints ===
    /// Number of object handle slots reserved when a graph is created.
    ///
    /// Purely a pre-allocation hint; graphs grow past it on demand. The
    /// native module typically refines this with explicit handle
    /// reservations once the scene description is known.
    pub expected_objects: usize,

    /// Initial capacity of the shared scratch arena, in bytes.
    ///
    /// Rounded up to the arena growth quantum. The arena still grows on
    /// demand, so this only avoids early reallocations.
    pub scratch_capacity: usize,

    // === Hook Failure Policy ===
    /// When a component hook returns an error, deactivate that component
    /// so it stops receiving update dispatches.
    ///
    /// The error is logged either way; this flag only controls whether a
    /// misbehaving component keeps getting called every frame.
    pub deactivate_on_hook_error: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            expected_objects: 256,
            scratch_capacity: SCRATCH_QUANTUM,
            deactivate_on_hook_error: true,
        }
    }
}
