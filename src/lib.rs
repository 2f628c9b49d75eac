//! # Flowboard Core
//!
//! Core pipeline board engine for Flowboard business management.
//!
//! This crate provides the ordered, multi-column card engine behind the
//! Leads and Tasks boards: drag reordering within a column, transfers
//! across columns, gated terminal transitions (won/lost, complete/
//! cancelled) and derived time-in-column urgency, without any dependency
//! on specific UI implementations.

pub mod domain;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use domain::{
    board::{Board, BoardSnapshot},
    card::{Card, CardId, Priority},
    column::{BoardConfig, Column, ColumnId, GatePolicy},
    urgency::{urgency, Urgency},
};
pub use engine::{
    CommitEvent, CommitHook, GateData, GateDecision, GateRequest, Phase, PipelineEngine,
};
pub use error::{FlowboardError, Result};
