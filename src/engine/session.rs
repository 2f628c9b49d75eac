use crate::domain::card::CardId;
use crate::domain::column::ColumnId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the drag session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Active,
    AwaitingGate,
    Committing,
    Cancelled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::AwaitingGate => write!(f, "Awaiting Gate"),
            Self::Committing => write!(f, "Committing"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// An in-progress drag gesture.
///
/// Created on drag start, mutated on hover, consumed on drag end — by
/// commit or rollback. Never outlives a single user gesture and is never
/// persisted.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub card_id: CardId,
    pub source_column: ColumnId,
    pub source_index: usize,
    pub target_column: ColumnId,
    pub target_index: usize,
    pub phase: Phase,
}

impl DragSession {
    /// Starts a session with the target pinned to the source position
    pub fn begin(card_id: CardId, column: ColumnId, index: usize) -> Self {
        Self {
            card_id,
            source_column: column.clone(),
            source_index: index,
            target_column: column,
            target_index: index,
            phase: Phase::Active,
        }
    }

    /// True when the provisional move stays within the source column
    pub fn is_reorder(&self) -> bool {
        self.target_column == self.source_column
    }
}
