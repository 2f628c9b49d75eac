use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a pipeline column (e.g., "new", "contacted", "won")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Gating semantics for a terminal column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePolicy {
    /// Won/complete: confirmation plus optional follow-on data, always
    /// approvable once confirmed.
    Confirm,
    /// Lost/cancelled: a non-empty categorical reason is mandatory before
    /// the gate can be approved.
    RequireReason,
}

/// Configuration for a pipeline column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub label: String,
    pub gate: Option<GatePolicy>,
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: ColumnId::new(id),
            label: label.into(),
            gate: None,
        }
    }

    pub fn with_gate(mut self, policy: GatePolicy) -> Self {
        self.gate = Some(policy);
        self
    }

    /// True for columns representing an end-of-life state (won, lost,
    /// complete, cancelled). Entry into a terminal column is gated.
    pub fn is_terminal(&self) -> bool {
        self.gate.is_some()
    }
}

/// Ordered registry of pipeline columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    pub columns: Vec<Column>,
}

impl BoardConfig {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Stock pipeline for the Leads board
    pub fn leads() -> Self {
        Self::new(
            "Leads",
            vec![
                Column::new("new", "New"),
                Column::new("contacted", "Contacted"),
                Column::new("qualified", "Qualified"),
                Column::new("proposal", "Proposal"),
                Column::new("won", "Won").with_gate(GatePolicy::Confirm),
                Column::new("lost", "Lost").with_gate(GatePolicy::RequireReason),
            ],
        )
    }

    /// Stock pipeline for the Tasks board
    pub fn tasks() -> Self {
        Self::new(
            "Tasks",
            vec![
                Column::new("todo", "To Do"),
                Column::new("in_progress", "In Progress"),
                Column::new("review", "Review"),
                Column::new("complete", "Complete").with_gate(GatePolicy::Confirm),
                Column::new("cancelled", "Cancelled").with_gate(GatePolicy::RequireReason),
            ],
        )
    }

    /// Gets the column configuration for an ID
    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| &col.id == id)
    }

    pub fn contains(&self, id: &ColumnId) -> bool {
        self.column(id).is_some()
    }

    /// Checks whether a column is terminal; unknown columns are not
    pub fn is_terminal(&self, id: &ColumnId) -> bool {
        self.column(id).map(|col| col.is_terminal()).unwrap_or(false)
    }

    /// Gets the gate policy for a column, if it is terminal
    pub fn gate_policy(&self, id: &ColumnId) -> Option<GatePolicy> {
        self.column(id).and_then(|col| col.gate)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::leads()
    }
}
