use crate::domain::card::{Card, CardId};
use crate::domain::column::{BoardConfig, ColumnId};
use crate::error::{FlowboardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pipeline board: the single source of truth for card position.
///
/// Each column owns an ordered lane of card IDs; insertion order is the
/// authoritative visual order within the column. Every card belongs to
/// exactly one lane at all times, and all mutations are all-or-nothing:
/// a reader never observes a card missing from all lanes or present in
/// two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub config: BoardConfig,
    cards: HashMap<CardId, Card>,
    lanes: HashMap<ColumnId, Vec<CardId>>,
}

/// Ordered view of the board: column ID to ordered card IDs, in registry
/// order. Comparable so callers can assert order identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub columns: Vec<(ColumnId, Vec<CardId>)>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        let lanes = config
            .columns
            .iter()
            .map(|col| (col.id.clone(), Vec::new()))
            .collect();
        Self {
            config,
            cards: HashMap::new(),
            lanes,
        }
    }

    /// Adds a card to the end of its column's lane
    pub fn insert_card(&mut self, card: Card) -> Result<()> {
        if self.cards.contains_key(&card.id) {
            return Err(FlowboardError::DuplicateCard(card.id.to_string()));
        }
        let lane = self
            .lanes
            .get_mut(&card.column)
            .ok_or_else(|| FlowboardError::ColumnNotFound(card.column.to_string()))?;
        lane.push(card.id.clone());
        self.cards.insert(card.id.clone(), card);
        Ok(())
    }

    /// Removes a card from the board entirely. The only way a card leaves
    /// the closed world.
    pub fn remove_card(&mut self, id: &CardId) -> Result<Card> {
        let card = self
            .cards
            .remove(id)
            .ok_or_else(|| FlowboardError::CardNotFound(id.to_string()))?;
        if let Some(lane) = self.lanes.get_mut(&card.column) {
            lane.retain(|c| c != id);
        }
        Ok(card)
    }

    /// Reorders a card within a single column's lane.
    ///
    /// No-op when `from == to`. Fails with `IndexOutOfRange` if either
    /// index is invalid for the lane's current length.
    pub fn move_within_column(&mut self, column: &ColumnId, from: usize, to: usize) -> Result<()> {
        let lane = self
            .lanes
            .get_mut(column)
            .ok_or_else(|| FlowboardError::ColumnNotFound(column.to_string()))?;
        if from == to {
            return Ok(());
        }
        let len = lane.len();
        if from >= len || to >= len {
            return Err(FlowboardError::IndexOutOfRange {
                column: column.to_string(),
                index: from.max(to),
                len,
            });
        }
        let id = lane.remove(from);
        lane.insert(to, id);
        Ok(())
    }

    /// Moves a card between columns and stamps `entered_column_at`.
    ///
    /// `to_index` is clamped to `[0, len]` of the destination lane. Fails
    /// with `CardNotFound` if the card is absent from `from`'s lane.
    pub fn transfer(
        &mut self,
        id: &CardId,
        from: &ColumnId,
        to: &ColumnId,
        to_index: usize,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.relocate(id, from, to, to_index)?;
        self.stamp_entered(id, now);
        Ok(())
    }

    /// Same movement as [`Board::transfer`] but leaves `entered_column_at`
    /// untouched. Drag previews and rollback go through here so that only
    /// committed transfers advance the urgency clock.
    pub(crate) fn relocate(
        &mut self,
        id: &CardId,
        from: &ColumnId,
        to: &ColumnId,
        to_index: usize,
    ) -> Result<()> {
        // Validate everything before mutating anything.
        if !self.lanes.contains_key(to) {
            return Err(FlowboardError::ColumnNotFound(to.to_string()));
        }
        let from_lane = self
            .lanes
            .get(from)
            .ok_or_else(|| FlowboardError::ColumnNotFound(from.to_string()))?;
        let from_pos = from_lane
            .iter()
            .position(|c| c == id)
            .ok_or_else(|| FlowboardError::CardNotFound(id.to_string()))?;

        let moved = match self.lanes.get_mut(from) {
            Some(lane) => lane.remove(from_pos),
            None => return Err(FlowboardError::ColumnNotFound(from.to_string())),
        };
        match self.lanes.get_mut(to) {
            Some(lane) => {
                let index = to_index.min(lane.len());
                lane.insert(index, moved);
            }
            // Checked above; restore before failing so a card is never dropped.
            None => {
                if let Some(lane) = self.lanes.get_mut(from) {
                    lane.insert(from_pos, moved);
                }
                return Err(FlowboardError::ColumnNotFound(to.to_string()));
            }
        }

        if let Some(card) = self.cards.get_mut(id) {
            card.column = to.clone();
        }
        Ok(())
    }

    pub(crate) fn stamp_entered(&mut self, id: &CardId, now: DateTime<Utc>) {
        if let Some(card) = self.cards.get_mut(id) {
            card.entered_column_at = now;
        }
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Finds a card's current column and position within its lane
    pub fn locate(&self, id: &CardId) -> Option<(ColumnId, usize)> {
        let card = self.cards.get(id)?;
        let lane = self.lanes.get(&card.column)?;
        let index = lane.iter().position(|c| c == id)?;
        Some((card.column.clone(), index))
    }

    /// Ordered card IDs for a column
    pub fn lane(&self, column: &ColumnId) -> Result<&[CardId]> {
        self.lanes
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| FlowboardError::ColumnNotFound(column.to_string()))
    }

    /// Cards in a column, in lane order
    pub fn cards_in(&self, column: &ColumnId) -> Vec<&Card> {
        self.lanes
            .get(column)
            .map(|lane| lane.iter().filter_map(|id| self.cards.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Ordered view of every lane, in registry column order
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self
                .config
                .columns
                .iter()
                .map(|col| {
                    (
                        col.id.clone(),
                        self.lanes.get(&col.id).cloned().unwrap_or_default(),
                    )
                })
                .collect(),
        }
    }

    /// Verifies the closed-world invariant: every card ID appears in
    /// exactly one lane exactly once, and each card's recorded column
    /// matches the lane holding it.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen: HashMap<&CardId, &ColumnId> = HashMap::new();
        for (column, lane) in &self.lanes {
            for id in lane {
                if seen.insert(id, column).is_some() {
                    return Err(FlowboardError::Other(format!(
                        "card {} appears in more than one lane",
                        id
                    )));
                }
                match self.cards.get(id) {
                    Some(card) if &card.column == column => {}
                    Some(card) => {
                        return Err(FlowboardError::Other(format!(
                            "card {} is in lane {} but records column {}",
                            id, column, card.column
                        )));
                    }
                    None => {
                        return Err(FlowboardError::Other(format!(
                            "lane {} holds unknown card {}",
                            column, id
                        )));
                    }
                }
            }
        }
        if seen.len() != self.cards.len() {
            return Err(FlowboardError::Other(
                "card set and lane contents disagree".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}
