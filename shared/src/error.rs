//! Typed faults raised by world mutation and by the wire codecs.
//!
//! A missing target on removal or rotation is deliberately absent from
//! [`WorldError`]: those operations are silent no-ops so that duplicate or
//! out-of-order broadcasts replay cleanly.

use thiserror::Error;

use crate::ids::UnitId;
use crate::position::Position;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// An entity that had to exist was not there
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Two units may never share a cell
    #[error("Position ({}, {}) is already occupied by unit {occupant}", .position.x, .position.z)]
    OccupiedPosition { position: Position, occupant: UnitId },

    /// Insert of an identity that is already present
    #[error("{entity} already exists: {id}")]
    DuplicateEntity { entity: &'static str, id: String },
}

impl WorldError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, id: impl ToString) -> Self {
        Self::DuplicateEntity {
            entity,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Unknown direction number: {0}")]
    UnknownDirection(u8),
}
