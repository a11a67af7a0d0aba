#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod arena;
pub mod decode;
pub mod errors;
pub mod graph;
pub mod hooks;
pub mod interner;
pub mod lifecycle;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod settings;
pub mod value;

pub use arena::{ScratchArena, SCRATCH_QUANTUM};
pub use decode::payload::{PayloadError, PayloadWriter, WireValue};
pub use decode::RefOffsets;
pub use errors::{Result, TetherError};
pub use graph::component::ComponentRef;
pub use graph::node::NodeRef;
pub use graph::{Graph, GraphIndex};
pub use hooks::{ComponentHooks, HookContext, HookFactory, HookFlags};
pub use interner::Symbol;
pub use lifecycle::{assert_same_graph, GraphBound, HandleState, DEAD_ID};
pub use registry::schema::{PropertyDefault, PropertyKind, PropertySchema, ResourceKind, TypeDescriptor};
pub use registry::{PropertySlot, RegisteredType, TypeIndex, TypeRegistry};
pub use resources::{AnimationKey, MaterialKey, MeshKey, ResourcePool, ResourcePools, ResourceRef, SkinKey, TextureKey};
pub use runtime::Runtime;
pub use settings::RuntimeSettings;
pub use value::PropValue;
