//! Type Registry
//!
//! Authoritative store of every component type the script host has
//! registered. At registration the descriptor's properties are sorted by
//! name and their defaults are computed into typed values, both frozen
//! under the assigned index. Re-registering a name is idempotent: the
//! descriptor is replaced in place and the index stays, so a script
//! domain reload keeps every index the native module already holds.
//!
//! The sorted property order is the contract that makes init payloads
//! positional. Encoder and decoder never exchange property names at
//! runtime; they both derive the same order from the same descriptor.
//! Lexicographic comparison is by Unicode scalar values, which for the
//! UTF-8 names used here is plain byte order.

pub mod schema;

use glam::{Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{Result, TetherError};
use crate::hooks::{ComponentHooks, HookFactory, HookFlags};
use crate::interner::{self, Symbol};
use crate::value::PropValue;

use schema::{PropertyDefault, PropertyKind, PropertySchema, TypeDescriptor};

// ---------------------------------------------------------------------------
// TypeIndex
// ---------------------------------------------------------------------------

/// Dense index of a registered type.
///
/// Assigned in registration order and shared with the native module,
/// which tags every component creation with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(u32);

impl TypeIndex {
    #[inline]
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index value.
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RegisteredType
// ---------------------------------------------------------------------------

/// One property of a registered type, frozen at registration.
pub struct PropertySlot {
    /// Interned property name.
    pub name: Symbol,
    /// Declared kind.
    pub kind: PropertyKind,
    /// Computed default value. Cloned into every new component.
    pub default: PropValue,
    /// Enum labels in declaration order, for enum slots.
    pub enum_values: Option<Vec<String>>,
}

/// A component type after registration: ordered slots, computed
/// defaults and optional hook wiring.
pub struct RegisteredType {
    name: Symbol,
    index: TypeIndex,
    slots: Vec<PropertySlot>,
    positions: FxHashMap<Symbol, usize>,
    hook_flags: HookFlags,
    hook_factory: Option<HookFactory>,
}

impl RegisteredType {
    /// Registered type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        interner::resolve(self.name)
    }

    /// Interned type name.
    #[inline]
    #[must_use]
    pub fn name_symbol(&self) -> Symbol {
        self.name
    }

    /// Dense index of this type.
    #[inline]
    #[must_use]
    pub fn index(&self) -> TypeIndex {
        self.index
    }

    /// Properties in their frozen lexicographic order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[PropertySlot] {
        &self.slots
    }

    /// One property slot by position.
    #[must_use]
    pub fn slot(&self, position: usize) -> Option<&PropertySlot> {
        self.slots.get(position)
    }

    /// Number of properties.
    #[inline]
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.slots.len()
    }

    /// Position of a property by name, if the type declares it.
    #[must_use]
    pub fn position_of(&self, property: &str) -> Option<usize> {
        let symbol = interner::get(property)?;
        self.positions.get(&symbol).copied()
    }

    /// Fresh per-instance copies of every default, in slot order.
    ///
    /// Values are cloned so that instances never alias one another's
    /// strings or handles through the registry.
    #[must_use]
    pub fn default_values(&self) -> SmallVec<[PropValue; 8]> {
        self.slots.iter().map(|slot| slot.default.clone()).collect()
    }

    /// Declared hook entry points.
    #[inline]
    #[must_use]
    pub fn hook_flags(&self) -> HookFlags {
        self.hook_flags
    }

    /// Instantiates a hook object for a new component of this type.
    pub(crate) fn make_hooks(&self) -> Option<Box<dyn ComponentHooks>> {
        self.hook_factory.as_ref().map(|factory| factory())
    }
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Registry of all component types, indexed densely by [`TypeIndex`].
#[derive(Default)]
pub struct TypeRegistry {
    types: Vec<RegisteredType>,
    by_name: FxHashMap<Symbol, TypeIndex>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type without hooks.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<TypeIndex> {
        self.register_inner(descriptor, HookFlags::empty(), None)
    }

    /// Registers a type together with its hook factory.
    ///
    /// The factory runs once per component instance of this type.
    pub fn register_with_hooks(
        &mut self,
        descriptor: TypeDescriptor,
        flags: HookFlags,
        factory: HookFactory,
    ) -> Result<TypeIndex> {
        self.register_inner(descriptor, flags, Some(factory))
    }

    fn register_inner(
        &mut self,
        descriptor: TypeDescriptor,
        hook_flags: HookFlags,
        hook_factory: Option<HookFactory>,
    ) -> Result<TypeIndex> {
        if descriptor.name.is_empty() {
            return Err(TetherError::SchemaError("type name is empty".into()));
        }
        let name = interner::intern(&descriptor.name);

        // Freeze the property order: lexicographic by name.
        let mut entries: Vec<(String, PropertySchema)> = descriptor.properties.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut slots = Vec::with_capacity(entries.len());
        let mut positions = FxHashMap::default();
        for (position, (prop_name, prop)) in entries.into_iter().enumerate() {
            let default = compute_default(&descriptor.name, &prop_name, &prop);
            let symbol = interner::intern(&prop_name);
            positions.insert(symbol, position);
            slots.push(PropertySlot {
                name: symbol,
                kind: prop.kind,
                default,
                enum_values: prop.values,
            });
        }

        // Re-registration keeps the index the native module already
        // holds; components created earlier keep their cloned layout.
        if let Some(&existing) = self.by_name.get(&name) {
            log::debug!(
                "re-registered type `{}` at index {existing} ({} properties)",
                interner::resolve(name),
                slots.len()
            );
            self.types[existing.get() as usize] = RegisteredType {
                name,
                index: existing,
                slots,
                positions,
                hook_flags,
                hook_factory,
            };
            return Ok(existing);
        }

        let index = TypeIndex::new(self.types.len() as u32);
        log::debug!(
            "registered type `{}` as index {index} ({} properties)",
            interner::resolve(name),
            slots.len()
        );
        self.types.push(RegisteredType {
            name,
            index,
            slots,
            positions,
            hook_flags,
            hook_factory,
        });
        self.by_name.insert(name, index);
        Ok(index)
    }

    /// Resolves a type by index.
    pub fn get(&self, index: TypeIndex) -> Result<&RegisteredType> {
        self.types
            .get(index.get() as usize)
            .ok_or(TetherError::UnknownType(index.get()))
    }

    /// Resolves a type by raw index as received from the native module.
    pub fn get_raw(&self, raw_index: u32) -> Result<&RegisteredType> {
        self.types
            .get(raw_index as usize)
            .ok_or(TetherError::UnknownType(raw_index))
    }

    /// Resolves a type by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&RegisteredType> {
        let symbol = interner::get(name)?;
        let index = self.by_name.get(&symbol)?;
        self.types.get(index.get() as usize)
    }

    /// Index of a type by name.
    pub fn index_of(&self, name: &str) -> Result<TypeIndex> {
        self.lookup(name)
            .map(RegisteredType::index)
            .ok_or_else(|| TetherError::UnknownTypeName(name.to_owned()))
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` when nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates registered types in index order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType> {
        self.types.iter()
    }
}

// ---------------------------------------------------------------------------
// Default computation
// ---------------------------------------------------------------------------

/// Turns a schema default into a typed value, falling back to the kind's
/// zero default when the declared shape does not fit.
fn compute_default(type_name: &str, prop_name: &str, prop: &PropertySchema) -> PropValue {
    let declared = prop.default.as_ref();
    let fallback = |value: PropValue| {
        if declared.is_some() {
            log::warn!(
                "type `{type_name}`: default for `{prop_name}` does not fit kind {}, using {value:?}",
                prop.kind
            );
        }
        value
    };

    match prop.kind {
        PropertyKind::Bool => match declared {
            Some(PropertyDefault::Bool(value)) => PropValue::Bool(*value),
            _ => fallback(PropValue::Bool(false)),
        },
        PropertyKind::Int => match declared {
            Some(PropertyDefault::Number(value)) => PropValue::Int(*value as i32),
            _ => fallback(PropValue::Int(0)),
        },
        PropertyKind::Float => match declared {
            Some(PropertyDefault::Number(value)) => PropValue::Float(*value as f32),
            _ => fallback(PropValue::Float(0.0)),
        },
        PropertyKind::Str => match declared {
            Some(PropertyDefault::Str(value)) => PropValue::Str(value.clone()),
            _ => fallback(PropValue::Str(String::new())),
        },
        PropertyKind::Enum => compute_enum_default(type_name, prop_name, prop),
        PropertyKind::Vec2 => match declared {
            Some(PropertyDefault::Array(values)) if values.len() == 2 => {
                PropValue::Vec2(Vec2::new(values[0] as f32, values[1] as f32))
            }
            _ => fallback(PropValue::Vec2(Vec2::ZERO)),
        },
        PropertyKind::Vec3 => match declared {
            Some(PropertyDefault::Array(values)) if values.len() == 3 => PropValue::Vec3(Vec3::new(
                values[0] as f32,
                values[1] as f32,
                values[2] as f32,
            )),
            _ => fallback(PropValue::Vec3(Vec3::ZERO)),
        },
        PropertyKind::Vec4 => match declared {
            Some(PropertyDefault::Array(values)) if values.len() == 4 => PropValue::Vec4(Vec4::new(
                values[0] as f32,
                values[1] as f32,
                values[2] as f32,
                values[3] as f32,
            )),
            _ => fallback(PropValue::Vec4(Vec4::ZERO)),
        },
        PropertyKind::Color => match declared {
            // RGB defaults imply an opaque alpha.
            Some(PropertyDefault::Array(values)) if values.len() == 3 => PropValue::Color(
                Vec4::new(values[0] as f32, values[1] as f32, values[2] as f32, 1.0),
            ),
            Some(PropertyDefault::Array(values)) if values.len() == 4 => PropValue::Color(
                Vec4::new(
                    values[0] as f32,
                    values[1] as f32,
                    values[2] as f32,
                    values[3] as f32,
                ),
            ),
            _ => fallback(PropValue::Color(Vec4::new(0.0, 0.0, 0.0, 1.0))),
        },
        PropertyKind::Node => {
            if declared.is_some() {
                log::warn!(
                    "type `{type_name}`: reference property `{prop_name}` cannot declare a default"
                );
            }
            PropValue::Node(None)
        }
        PropertyKind::Mesh
        | PropertyKind::Texture
        | PropertyKind::Material
        | PropertyKind::Animation
        | PropertyKind::Skin => {
            if declared.is_some() {
                log::warn!(
                    "type `{type_name}`: reference property `{prop_name}` cannot declare a default"
                );
            }
            PropValue::Resource(None)
        }
    }
}

/// Enum defaults resolve against the `values` list: labels and in-range
/// indices are honored, everything else lands on index zero. Without a
/// list there is nothing to select, so the slot stays unset.
fn compute_enum_default(type_name: &str, prop_name: &str, prop: &PropertySchema) -> PropValue {
    let Some(values) = prop.values.as_ref().filter(|list| !list.is_empty()) else {
        if prop.default.is_some() {
            log::warn!(
                "type `{type_name}`: enum `{prop_name}` declares a default but no values list"
            );
        }
        return PropValue::Enum(None);
    };

    let index = match prop.default.as_ref() {
        None => 0,
        Some(PropertyDefault::Str(label)) => match values.iter().position(|v| v == label) {
            Some(position) => position as u32,
            None => {
                log::warn!(
                    "type `{type_name}`: enum `{prop_name}` default `{label}` is not in its values list"
                );
                0
            }
        },
        Some(PropertyDefault::Number(number)) => {
            let candidate = *number;
            if candidate >= 0.0 && (candidate as usize) < values.len() {
                candidate as u32
            } else {
                log::warn!(
                    "type `{type_name}`: enum `{prop_name}` default index {candidate} is out of range"
                );
                0
            }
        }
        Some(_) => {
            log::warn!("type `{type_name}`: enum `{prop_name}` default has an unusable shape");
            0
        }
    };
    PropValue::Enum(Some(index))
}
