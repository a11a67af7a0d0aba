//! Type Schemas
//!
//! Serde-facing data model for component type descriptions. The script
//! host registers each component type once by sending a JSON descriptor;
//! this module defines the shapes that descriptor deserializes into.
//!
//! A descriptor is pure data. Interning, property ordering and default
//! computation happen at registration time in [`TypeRegistry`](super::TypeRegistry).

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::errors::Result;

// ---------------------------------------------------------------------------
// PropertyKind
// ---------------------------------------------------------------------------

/// Declared kind of a component property.
///
/// The kind drives three things: which default applies when a schema gives
/// none, how an init payload entry resolves into a typed value, and which
/// cache a reference kind is wrapped through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Boolean flag.
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 32-bit float.
    Float,
    /// UTF-8 string.
    #[serde(rename = "string")]
    Str,
    /// Index into the schema's `values` list.
    Enum,
    /// Two-component float vector.
    Vec2,
    /// Three-component float vector.
    Vec3,
    /// Four-component float vector.
    Vec4,
    /// RGBA color, stored normalized.
    Color,
    /// Reference to a graph object.
    Node,
    /// Reference to a mesh resource.
    Mesh,
    /// Reference to a texture resource.
    Texture,
    /// Reference to a material resource.
    Material,
    /// Reference to an animation clip resource.
    Animation,
    /// Reference to a skin resource.
    Skin,
}

impl PropertyKind {
    /// Stable lowercase label, matching the JSON schema spelling.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Enum => "enum",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Color => "color",
            Self::Node => "node",
            Self::Mesh => "mesh",
            Self::Texture => "texture",
            Self::Material => "material",
            Self::Animation => "animation",
            Self::Skin => "skin",
        }
    }

    /// Whether this kind holds a handle into a graph or resource cache.
    #[inline]
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::Node | Self::Mesh | Self::Texture | Self::Material | Self::Animation | Self::Skin
        )
    }

    /// The resource pool this kind wraps through, if any.
    ///
    /// `Node` references resolve through the owning graph's handle cache
    /// instead and return `None` here.
    #[must_use]
    pub fn resource_kind(self) -> Option<ResourceKind> {
        match self {
            Self::Mesh => Some(ResourceKind::Mesh),
            Self::Texture => Some(ResourceKind::Texture),
            Self::Material => Some(ResourceKind::Material),
            Self::Animation => Some(ResourceKind::Animation),
            Self::Skin => Some(ResourceKind::Skin),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The five engine resource families a property can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Mesh geometry.
    Mesh,
    /// Texture image.
    Texture,
    /// Surface material.
    Material,
    /// Animation clip.
    Animation,
    /// Skinning data.
    Skin,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Mesh => "mesh",
            Self::Texture => "texture",
            Self::Material => "material",
            Self::Animation => "animation",
            Self::Skin => "skin",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Property & type descriptors
// ---------------------------------------------------------------------------

/// Declared default value as it appears in a JSON descriptor.
///
/// Untagged: `true`, `3`, `0.5`, `"walk"` and `[1.0, 0.5, 0.0, 1.0]` are
/// all accepted and interpreted against the property's declared kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyDefault {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal (integers and floats both land here).
    Number(f64),
    /// String literal. For enums this names one of the `values` labels.
    Str(String),
    /// Numeric array, used by vector and color kinds.
    Array(Vec<f64>),
}

/// One property declaration inside a type descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    /// Declared kind.
    pub kind: PropertyKind,
    /// Optional schema-supplied default. When absent, the kind's zero
    /// default applies.
    #[serde(default)]
    pub default: Option<PropertyDefault>,
    /// Enum labels, in declaration order. Only meaningful for
    /// [`PropertyKind::Enum`].
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

impl PropertySchema {
    /// Bare schema of the given kind with no default and no enum values.
    #[must_use]
    pub fn of(kind: PropertyKind) -> Self {
        Self {
            kind,
            default: None,
            values: None,
        }
    }
}

/// A component type description as sent by the script host.
///
/// Property iteration order of the map is irrelevant; the registry
/// orders properties by name at registration time.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDescriptor {
    /// Unique type name.
    pub name: String,
    /// Property declarations keyed by property name.
    #[serde(default)]
    pub properties: FxHashMap<String, PropertySchema>,
}

impl TypeDescriptor {
    /// Parses a descriptor from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)?;
        Ok(descriptor)
    }
}
