pub mod board;
pub mod card;
pub mod column;
pub mod urgency;

pub use board::{Board, BoardSnapshot};
pub use card::{Card, CardId, Priority};
pub use column::{BoardConfig, Column, ColumnId, GatePolicy};
pub use urgency::{format_days_in_column, urgency, Urgency};
