use chrono::{DateTime, Utc};

/// Days in column after which a card shows a warning.
pub const WARNING_AFTER_DAYS: i64 = 7;
/// Days in column after which a card is overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 14;

/// Derived, time-based severity of a card.
///
/// Never stored on the card: recomputed on every read so urgency advances
/// purely with wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Healthy,
    Warning,
    Overdue,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Overdue => "overdue",
        }
    }
}

/// Evaluates urgency from time spent in the current column.
///
/// Terminal columns are exempt: a finished card needs no follow-up
/// pressure, so it is always `Healthy`.
pub fn urgency(terminal: bool, entered_at: DateTime<Utc>, now: DateTime<Utc>) -> Urgency {
    if terminal {
        return Urgency::Healthy;
    }
    let days = (now - entered_at).num_days().max(0);
    if days > OVERDUE_AFTER_DAYS {
        Urgency::Overdue
    } else if days > WARNING_AFTER_DAYS {
        Urgency::Warning
    } else {
        Urgency::Healthy
    }
}

/// Format time-in-column as a short human-readable label.
pub fn format_days_in_column(entered_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - entered_at).num_days().max(0) as u64;
    if days == 0 {
        "new".to_string()
    } else if days < 14 {
        format!("{days}d")
    } else if days < 60 {
        format!("{}w", days / 7)
    } else {
        format!("{}mo", days / 30)
    }
}
