//! Property Values
//!
//! The typed slot value stored per component property. Components keep
//! their properties as a positional array of [`PropValue`]s whose layout
//! follows the registered type's property order, so the decoder and all
//! accessors address slots by position instead of by name.

use glam::{Vec2, Vec3, Vec4};

use crate::graph::node::NodeRef;
use crate::registry::schema::PropertyKind;
use crate::resources::ResourceRef;

/// One typed property slot.
///
/// Equality is value equality for plain data and identity for handles.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Boolean flag.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// UTF-8 string.
    Str(String),
    /// Enum selection as an index into the schema's `values` list.
    /// `None` when the schema declared no labels.
    Enum(Option<u32>),
    /// Two-component vector.
    Vec2(Vec2),
    /// Three-component vector.
    Vec3(Vec3),
    /// Four-component vector.
    Vec4(Vec4),
    /// Normalized RGBA color.
    Color(Vec4),
    /// Graph object reference, `None` when unset.
    Node(Option<NodeRef>),
    /// Engine resource reference, `None` when unset.
    Resource(Option<ResourceRef>),
}

impl PropValue {
    /// Short label for diagnostics.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Enum(_) => "enum",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Color(_) => "color",
            Self::Node(_) => "node",
            Self::Resource(_) => "resource",
        }
    }

    /// Whether this value can occupy a slot declared as `kind`.
    ///
    /// Resource values additionally have to come from the pool matching
    /// the declared kind; an unset resource fits any resource kind.
    #[must_use]
    pub fn matches_kind(&self, kind: PropertyKind) -> bool {
        match (self, kind) {
            (Self::Bool(_), PropertyKind::Bool)
            | (Self::Int(_), PropertyKind::Int)
            | (Self::Float(_), PropertyKind::Float)
            | (Self::Str(_), PropertyKind::Str)
            | (Self::Enum(_), PropertyKind::Enum)
            | (Self::Vec2(_), PropertyKind::Vec2)
            | (Self::Vec3(_), PropertyKind::Vec3)
            | (Self::Vec4(_), PropertyKind::Vec4)
            | (Self::Color(_), PropertyKind::Color)
            | (Self::Node(_), PropertyKind::Node) => true,
            (Self::Resource(None), other) => other.resource_kind().is_some(),
            (Self::Resource(Some(resource)), other) => {
                other.resource_kind() == Some(resource.kind())
            }
            _ => false,
        }
    }

    // === Convenience accessors ===

    /// Boolean payload, if this is a bool slot.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer payload, if this is an int slot.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float payload, if this is a float slot.
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// String payload, if this is a string slot.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Selected enum index, if this is an enum slot with a selection.
    #[inline]
    #[must_use]
    pub fn as_enum_index(&self) -> Option<u32> {
        match self {
            Self::Enum(index) => *index,
            _ => None,
        }
    }

    /// Vector payload, if this is a vec2 slot.
    #[inline]
    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(value) => Some(*value),
            _ => None,
        }
    }

    /// Vector payload, if this is a vec3 slot.
    #[inline]
    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(value) => Some(*value),
            _ => None,
        }
    }

    /// Vector payload, if this is a vec4 slot.
    #[inline]
    #[must_use]
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(value) => Some(*value),
            _ => None,
        }
    }

    /// Normalized color payload, if this is a color slot.
    #[inline]
    #[must_use]
    pub fn as_color(&self) -> Option<Vec4> {
        match self {
            Self::Color(value) => Some(*value),
            _ => None,
        }
    }

    /// Object reference, if this is a node slot with a referent.
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Self::Node(node) => node.as_ref(),
            _ => None,
        }
    }

    /// Resource reference, if this is a resource slot with a referent.
    #[inline]
    #[must_use]
    pub fn as_resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Resource(resource) => resource.as_ref(),
            _ => None,
        }
    }
}
