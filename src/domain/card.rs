use crate::domain::column::ColumnId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unique identifier for a card (e.g., L-7 for leads, T-3 for tasks)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(String);

impl CardId {
    const LEAD_PREFIX: &'static str = "L";
    const TASK_PREFIX: &'static str = "T";

    /// Creates a lead card ID from a counter
    pub fn lead(counter: u32) -> Self {
        Self(format!("{}-{}", Self::LEAD_PREFIX, counter))
    }

    /// Creates a task card ID from a counter
    pub fn task(counter: u32) -> Self {
        Self(format!("{}-{}", Self::TASK_PREFIX, counter))
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CardId {
    type Err = crate::error::FlowboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Normalize to uppercase for case-insensitive comparison
        let normalized = s.to_uppercase();

        match normalized.split_once('-') {
            Some((prefix, counter))
                if !prefix.is_empty()
                    && prefix.chars().all(|c| c.is_ascii_alphabetic())
                    && counter.parse::<u32>().is_ok() =>
            {
                Ok(Self(normalized))
            }
            _ => Err(crate::error::FlowboardError::InvalidCardId(s.to_string())),
        }
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority levels for cards.
///
/// Informational only: priority never affects ordering or gating by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Normal, Self::High, Self::Critical];

    /// Sort key: lower = higher priority (sorts first).
    pub fn sort_key(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!(
                "Invalid priority '{}'. Valid priorities: normal, high, critical",
                s
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pipeline card: the slice of a lead or task the engine tracks.
///
/// `column` and `entered_column_at` are mutated only by committed transfers
/// through the board; `payload` is opaque domain data the engine never
/// inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub column: ColumnId,
    pub entered_column_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Card {
    /// Creates a new card in the given column
    pub fn new(id: CardId, column: ColumnId, entered_column_at: DateTime<Utc>) -> Self {
        Self {
            id,
            column,
            entered_column_at,
            priority: Priority::default(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
