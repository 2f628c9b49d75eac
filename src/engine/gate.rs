use crate::domain::card::CardId;
use crate::domain::column::{ColumnId, GatePolicy};
use crate::error::{FlowboardError, Result};
use serde::{Deserialize, Serialize};

/// A suspended terminal transfer awaiting an external decision.
///
/// Raised when a drop lands on a terminal column; the ordering store keeps
/// the card's pre-drag position until the gate resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRequest {
    pub card_id: CardId,
    pub from: ColumnId,
    pub to: ColumnId,
    pub policy: GatePolicy,
}

/// Structured data collected by the gate dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateData {
    /// Categorical loss reason; mandatory for `RequireReason` gates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Name for a derived record, e.g. the project created from a won lead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_name: Option<String>,
}

impl GateData {
    /// Plain confirmation with no follow-on data
    pub fn confirmed() -> Self {
        Self::default()
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_derived_name(mut self, name: impl Into<String>) -> Self {
        self.derived_name = Some(name.into());
        self
    }
}

/// Resolution of a gate request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    Approved(GateData),
    Rejected,
}

/// Checks an approval against the gate's policy.
///
/// `RequireReason` gates cannot be approved without a non-empty reason;
/// explicit cancellation maps to `Rejected` and needs none.
pub fn validate(policy: GatePolicy, data: &GateData) -> Result<()> {
    match policy {
        GatePolicy::Confirm => Ok(()),
        GatePolicy::RequireReason => {
            let has_reason = data
                .reason
                .as_deref()
                .map(|r| !r.trim().is_empty())
                .unwrap_or(false);
            if has_reason {
                Ok(())
            } else {
                Err(FlowboardError::InvalidGateDecision(
                    "a reason is required before this transition can be approved".to_string(),
                ))
            }
        }
    }
}
