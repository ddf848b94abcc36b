//! Violation records with typed entity references.

use std::fmt;

use serde::{Deserialize, Serialize};

use jikanwari_core::{BlockId, ClassId, ConstraintFamily, RoomId, Slot, SubjectId, TeacherId};

/// Reference to an entity involved in a violation.
///
/// The entity universe of this engine is closed, so a typed enum replaces
/// the type-erased reference a generic solver would need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Teacher(TeacherId),
    Room(RoomId),
    Class(ClassId),
    Subject(SubjectId),
    Block(BlockId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Teacher(id) => write!(f, "{id}"),
            EntityRef::Room(id) => write!(f, "{id}"),
            EntityRef::Class(id) => write!(f, "{id}"),
            EntityRef::Subject(id) => write!(f, "{id}"),
            EntityRef::Block(id) => write!(f, "{id}"),
        }
    }
}

/// One hard-constraint violation: which family, which entities, where,
/// and a reason string fit for the suggestion panels.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    pub family: ConstraintFamily,
    pub entities: Vec<EntityRef>,
    pub slot: Option<Slot>,
    pub reason: String,
}

impl Violation {
    pub fn new(family: ConstraintFamily, reason: impl Into<String>) -> Self {
        Violation {
            family,
            entities: Vec::new(),
            slot: None,
            reason: reason.into(),
        }
    }

    pub fn at(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn involving(mut self, entity: EntityRef) -> Self {
        self.entities.push(entity);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.family.name(), self.reason)
    }
}
