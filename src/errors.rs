//! Error Types
//!
//! This module defines the error types used throughout the runtime.
//!
//! # Overview
//!
//! The main error type [`TetherError`] covers all failure modes including:
//! - Handle lifetime violations (dead or cross-graph handles)
//! - Type registry and schema ingestion errors
//! - Init payload decoding errors
//! - Component hook failures
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, TetherError>`.
//!
//! ```rust,ignore
//! use tether::errors::{TetherError, Result};
//!
//! fn resolve_owner() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::decode::payload::PayloadError;
use crate::graph::GraphIndex;
use crate::registry::schema::PropertyKind;

/// The main error type for the Tether runtime.
///
/// This enum covers all possible error conditions that can occur
/// while marshalling between script code and the native module. Each
/// variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum TetherError {
    // ========================================================================
    // Handle & Graph Errors
    // ========================================================================
    /// An operation was attempted through a handle whose native object
    /// has already been destroyed.
    #[error("Handle is destroyed: {context}")]
    DestroyedHandle {
        /// Description of the attempted operation
        context: &'static str,
    },

    /// Two handles from different graphs were combined in one operation.
    #[error("Handles belong to different graphs: {left} vs {right}")]
    CrossGraph {
        /// Graph of the first handle
        left: GraphIndex,
        /// Graph of the second handle
        right: GraphIndex,
    },

    /// A graph teardown was requested while component destroy callbacks
    /// are still running inside it.
    #[error("Graph {graph} cannot be destroyed: {pending} destroy callback(s) in flight")]
    DestroyInFlight {
        /// The graph being torn down
        graph: GraphIndex,
        /// Number of nested destroy callbacks currently executing
        pending: u32,
    },

    /// The referenced graph does not exist (never created, or already destroyed).
    #[error("Unknown graph: {0}")]
    UnknownGraph(GraphIndex),

    /// A native-side local id was negative or otherwise outside the valid range.
    #[error("Invalid native id: {0}")]
    InvalidId(i32),

    // ========================================================================
    // Type Registry Errors
    // ========================================================================
    /// The referenced type index was never registered.
    #[error("Unknown type index: {0}")]
    UnknownType(u32),

    /// No registered type carries this name.
    #[error("Unknown type name: {0}")]
    UnknownTypeName(String),

    /// The named property does not exist on the type.
    #[error("Unknown property `{property}` on type `{type_name}`")]
    UnknownProperty {
        /// The owning type
        type_name: String,
        /// The missing property name
        property: String,
    },

    /// A value of the wrong kind was assigned to a property slot.
    #[error("Property `{property}` expects {expected}, got {found}")]
    PropertyKindMismatch {
        /// The property being assigned
        property: String,
        /// The declared kind from the schema
        expected: PropertyKind,
        /// Short description of the offered value
        found: &'static str,
    },

    /// A positional slot index exceeded the type's property count.
    #[error("Property slot {position} out of range (type has {count})")]
    PropertySlotOutOfRange {
        /// The requested slot position
        position: usize,
        /// Number of slots the type declares
        count: usize,
    },

    /// Schema validation error.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ========================================================================
    // Payload Errors
    // ========================================================================
    /// Structural error while reading an init payload.
    #[error("Payload error: {0}")]
    PayloadError(#[from] PayloadError),

    // ========================================================================
    // Hook Errors
    // ========================================================================
    /// A user-supplied component hook reported a failure.
    #[error("Component hook error: {0}")]
    HookError(String),
}

/// Alias for `Result<T, TetherError>`.
pub type Result<T> = std::result::Result<T, TetherError>;
