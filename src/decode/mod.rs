//! Parameter Decoder
//!
//! Resolves init payloads into typed component values. The native module
//! creates a batch of components, stages one payload describing their
//! initial properties, and hands both to [`apply_init`] together with the
//! id list for the batch.
//!
//! Failure isolation is two-level. A structural defect (bad framing,
//! unknown tag, count mismatch) aborts the whole batch before any
//! component is touched. A per-component defect (arity or kind
//! disagreement with the registered type, unknown component) skips just
//! that component; the rest of the batch still initializes. Either way
//! nothing propagates to the native caller; problems are logged.
//!
//! Reference values arrive as raw ids biased per reference family by
//! [`RefOffsets`]. Zero is the unset sentinel and is never biased.

pub mod payload;

use glam::{Vec2, Vec3, Vec4};

use crate::errors::{Result, TetherError};
use crate::graph::Graph;
use crate::graph::component::ValueVec;
use crate::graph::node::NodeRef;
use crate::interner;
use crate::registry::{PropertySlot, RegisteredType, TypeRegistry};
use crate::registry::schema::PropertyKind;
use crate::resources::ResourcePools;
use crate::value::PropValue;

use payload::{PayloadError, WireEntry, WireValue, decode_entries};

// ---------------------------------------------------------------------------
// RefOffsets
// ---------------------------------------------------------------------------

/// Signed bias applied to raw reference ids, per reference family.
///
/// The native module hands out ids relative to its own tables; the bias
/// re-bases them into the id space the caches index by. Zero stays zero:
/// the unset sentinel is never biased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefOffsets {
    /// Bias for object references.
    pub node: i32,
    /// Bias for mesh references.
    pub mesh: i32,
    /// Bias for texture references.
    pub texture: i32,
    /// Bias for material references.
    pub material: i32,
    /// Bias for animation clip references.
    pub animation: i32,
    /// Bias for skin references.
    pub skin: i32,
}

impl RefOffsets {
    fn for_kind(self, kind: PropertyKind) -> i32 {
        match kind {
            PropertyKind::Node => self.node,
            PropertyKind::Mesh => self.mesh,
            PropertyKind::Texture => self.texture,
            PropertyKind::Material => self.material,
            PropertyKind::Animation => self.animation,
            PropertyKind::Skin => self.skin,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch application
// ---------------------------------------------------------------------------

/// Decodes `payload` and installs the values onto the components named
/// by `ids` (all under one manager of one graph).
///
/// Returns how many components were initialized. Never fails outward;
/// see the module docs for the isolation rules.
pub(crate) fn apply_init(
    graph: &mut Graph,
    pools: &ResourcePools,
    registry: &TypeRegistry,
    manager: u32,
    ids: &[i32],
    payload_bytes: &[u8],
    offsets: RefOffsets,
) -> usize {
    let entries = match decode_batch(payload_bytes, ids.len()) {
        Ok(entries) => entries,
        Err(error) => {
            log::error!(
                "graph {} manager {manager}: init batch aborted: {error}",
                graph.index()
            );
            return 0;
        }
    };

    let mut applied = 0;
    for (id, entry) in ids.iter().copied().zip(entries) {
        match apply_entry(graph, pools, registry, manager, id, entry, offsets) {
            Ok(()) => applied += 1,
            Err(error) => {
                log::warn!(
                    "graph {} manager {manager}: component {id} skipped: {error}",
                    graph.index()
                );
            }
        }
    }
    applied
}

fn decode_batch(payload_bytes: &[u8], id_count: usize) -> Result<Vec<WireEntry>> {
    let entries = decode_entries(payload_bytes)?;
    if entries.len() != id_count {
        return Err(PayloadError::EntryCountMismatch {
            entries: entries.len(),
            ids: id_count,
        }
        .into());
    }
    Ok(entries)
}

/// Resolves and installs one component's values. All-or-nothing: the
/// component keeps its defaults when any slot fails to resolve.
fn apply_entry(
    graph: &mut Graph,
    pools: &ResourcePools,
    registry: &TypeRegistry,
    manager: u32,
    id: i32,
    entry: WireEntry,
    offsets: RefOffsets,
) -> Result<()> {
    let Some(component) = graph.component(manager, id) else {
        return Err(TetherError::InvalidId(id));
    };
    let ty = registry.get(component.type_index())?;
    if entry.len() != ty.property_count() {
        return Err(TetherError::SchemaError(format!(
            "type `{}` has {} properties, payload entry has {}",
            ty.name(),
            ty.property_count(),
            entry.len()
        )));
    }

    let values = resolve_entry(graph, pools, ty, entry, offsets)?;
    component.install_values(values);
    Ok(())
}

fn resolve_entry(
    graph: &mut Graph,
    pools: &ResourcePools,
    ty: &RegisteredType,
    entry: WireEntry,
    offsets: RefOffsets,
) -> Result<ValueVec> {
    let mut values = ValueVec::with_capacity(ty.property_count());
    for (position, wire) in entry.into_iter().enumerate() {
        let slot = ty
            .slot(position)
            .ok_or(TetherError::PropertySlotOutOfRange {
                position,
                count: ty.property_count(),
            })?;
        values.push(resolve_value(graph, pools, slot, wire, offsets)?);
    }
    Ok(values)
}

/// Resolves one wire value against its declared slot.
fn resolve_value(
    graph: &mut Graph,
    pools: &ResourcePools,
    slot: &PropertySlot,
    wire: WireValue,
    offsets: RefOffsets,
) -> Result<PropValue> {
    let mismatch = |found: &'static str| TetherError::PropertyKindMismatch {
        property: interner::resolve(slot.name).to_owned(),
        expected: slot.kind,
        found,
    };

    let value = match (wire, slot.kind) {
        (WireValue::Omitted, _) => slot.default.clone(),
        (WireValue::Bool(flag), PropertyKind::Bool) => PropValue::Bool(flag),
        (WireValue::Int(body), PropertyKind::Int) => PropValue::Int(body),
        (WireValue::Float(body), PropertyKind::Float) => PropValue::Float(body),
        (WireValue::Str(body), PropertyKind::Str) => PropValue::Str(body),
        (WireValue::Enum(index), PropertyKind::Enum) => PropValue::Enum(Some(index)),
        (WireValue::Vec2(body), PropertyKind::Vec2) => PropValue::Vec2(Vec2::from(body)),
        (WireValue::Vec3(body), PropertyKind::Vec3) => PropValue::Vec3(Vec3::from(body)),
        (WireValue::Vec4(body), PropertyKind::Vec4) => PropValue::Vec4(Vec4::from(body)),
        // A color sent as a float quad is already normalized.
        (WireValue::Vec4(body), PropertyKind::Color) => PropValue::Color(Vec4::from(body)),
        (
            WireValue::Color {
                channels,
                bytes_per_channel,
            },
            PropertyKind::Color,
        ) => PropValue::Color(normalize_color(channels, bytes_per_channel)),
        (WireValue::Ref(raw), PropertyKind::Node) => {
            PropValue::Node(resolve_node_ref(graph, slot, raw, offsets.node))
        }
        (WireValue::Ref(raw), kind) if kind.is_reference() => {
            // Checked by the arm guard.
            let Some(resource_kind) = kind.resource_kind() else {
                return Err(mismatch("ref"));
            };
            if raw == 0 {
                PropValue::Resource(None)
            } else {
                let biased = raw + offsets.for_kind(kind);
                if biased < 0 {
                    log::warn!(
                        "property `{}`: biased {resource_kind} id {biased} is negative, leaving unset",
                        interner::resolve(slot.name)
                    );
                    PropValue::Resource(None)
                } else {
                    PropValue::Resource(Some(pools.wrap_kind(resource_kind, biased)))
                }
            }
        }
        (wire, _) => return Err(mismatch(wire.label())),
    };
    Ok(value)
}

fn resolve_node_ref(graph: &mut Graph, slot: &PropertySlot, raw: i32, bias: i32) -> Option<NodeRef> {
    if raw == 0 {
        return None;
    }
    let biased = raw + bias;
    if biased < 0 {
        log::warn!(
            "property `{}`: biased object id {biased} is negative, leaving unset",
            interner::resolve(slot.name)
        );
        return None;
    }
    Some(graph.wrap_object(biased))
}

/// Expands packed integer channels into normalized floats.
///
/// The divisor is the channel's maximum representable value, so 255 maps
/// to 1.0 at one byte per channel and 65535 does at two.
fn normalize_color(channels: [u32; 4], bytes_per_channel: u8) -> Vec4 {
    let divisor = ((1u32 << (8 * u32::from(bytes_per_channel))) - 1) as f32;
    Vec4::new(
        channels[0] as f32 / divisor,
        channels[1] as f32 / divisor,
        channels[2] as f32 / divisor,
        channels[3] as f32 / divisor,
    )
}
