pub mod gate;
pub mod session;

pub use gate::{GateData, GateDecision, GateRequest};
pub use session::{DragSession, Phase};

use crate::domain::board::{Board, BoardSnapshot};
use crate::domain::card::{Card, CardId};
use crate::domain::column::{ColumnId, GatePolicy};
use crate::domain::urgency::{urgency, Urgency};
use crate::error::{FlowboardError, Result};
use chrono::{DateTime, Utc};

/// A committed transfer, as seen by registered hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    pub card_id: CardId,
    pub from: ColumnId,
    pub to: ColumnId,
    /// Present only for gated terminal transfers
    pub gate_data: Option<GateData>,
}

/// Collaborator seam for post-commit side effects: create a derived
/// record, notify, navigate. Called exactly once per committed transfer,
/// after the store mutation, never on reject.
pub trait CommitHook {
    fn on_transfer_committed(&mut self, event: &CommitEvent);
}

/// The pipeline engine: ordering store plus the drag/gate state machine.
///
/// Drives one drag session at a time through `start`, `hover`, `end` and
/// `resolve_gate`. Hovers over non-terminal columns apply live previews to
/// the board; terminal drops suspend as a [`GateRequest`] with the board
/// restored to its pre-drag state until the gate resolves.
pub struct PipelineEngine {
    board: Board,
    session: Option<DragSession>,
    pending_gate: Option<GateRequest>,
    hooks: Vec<Box<dyn CommitHook>>,
}

impl PipelineEngine {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            session: None,
            pending_gate: None,
            hooks: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.session
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(Phase::Idle)
    }

    pub fn pending_gate(&self) -> Option<&GateRequest> {
        self.pending_gate.as_ref()
    }

    pub fn add_hook(&mut self, hook: Box<dyn CommitHook>) {
        self.hooks.push(hook);
    }

    /// Adds a card to the board
    pub fn insert_card(&mut self, card: Card) -> Result<()> {
        self.board.insert_card(card)
    }

    /// Removes a card from the board; aborts any session dragging it
    pub fn remove_card(&mut self, id: &CardId) -> Result<Card> {
        if self.session.as_ref().map(|s| &s.card_id) == Some(id) {
            self.session = None;
            self.pending_gate = None;
        }
        self.board.remove_card(id)
    }

    /// Urgency for a card, derived per call from time in its current
    /// column. Terminal columns always read `Healthy`.
    pub fn card_urgency(&self, id: &CardId, now: DateTime<Utc>) -> Result<Urgency> {
        let card = self
            .board
            .card(id)
            .ok_or_else(|| FlowboardError::CardNotFound(id.to_string()))?;
        let terminal = self.board.config.is_terminal(&card.column);
        Ok(urgency(terminal, card.entered_column_at, now))
    }

    /// Begins a drag gesture on a card.
    ///
    /// Ignored when a session is already live (including one awaiting a
    /// gate) or when the card cannot be located; returns the resulting
    /// phase either way.
    pub fn start(&mut self, id: &CardId) -> Phase {
        if self.session.is_some() {
            return self.phase();
        }
        match self.board.locate(id) {
            Some((column, index)) => {
                self.session = Some(DragSession::begin(id.clone(), column, index));
                Phase::Active
            }
            None => Phase::Idle,
        }
    }

    /// Updates the provisional target while dragging.
    ///
    /// Same column: live reorder preview, index clamped. Different
    /// non-terminal column: live transfer preview, timestamp untouched.
    /// Terminal column: target recorded only, the store is not mutated
    /// until the gate approves. Unknown columns and out-of-session hovers
    /// are ignored.
    pub fn hover(&mut self, column: &ColumnId, index: usize) {
        let card_id = match &self.session {
            Some(s) if s.phase == Phase::Active => s.card_id.clone(),
            _ => return,
        };
        if !self.board.config.contains(column) {
            return;
        }

        let (current_column, current_index) = match self.board.locate(&card_id) {
            Some(pos) => pos,
            None => return,
        };

        let mut landed_index = index;
        if &current_column == column {
            let len = match self.board.lane(column) {
                Ok(lane) => lane.len(),
                Err(_) => return,
            };
            let to = index.min(len.saturating_sub(1));
            // Best-effort preview: clamp instead of failing
            let _ = self.board.move_within_column(column, current_index, to);
            landed_index = to;
        } else if !self.board.config.is_terminal(column) {
            let _ = self
                .board
                .relocate(&card_id, &current_column, column, index);
            if let Some((_, idx)) = self.board.locate(&card_id) {
                landed_index = idx;
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.target_column = column.clone();
            session.target_index = landed_index;
        }
    }

    /// Ends the drag gesture.
    ///
    /// A drop on a terminal column (other than the source) restores the
    /// pre-drag position and suspends as `AwaitingGate`; a non-terminal
    /// drop commits the preview, stamping `entered_column_at` when the
    /// card changed columns. Calls while a gate is pending are ignored.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<Phase> {
        let mut session = match self.session.take() {
            Some(s) if s.phase == Phase::Active => s,
            Some(s) => {
                let phase = s.phase;
                self.session = Some(s);
                return Ok(phase);
            }
            None => return Ok(Phase::Idle),
        };

        let gated = self.board.config.is_terminal(&session.target_column)
            && session.target_column != session.source_column;

        if gated {
            let policy = match self.board.config.gate_policy(&session.target_column) {
                Some(policy) => policy,
                None => GatePolicy::Confirm,
            };
            // Undo any live previews: while the gate is open the store
            // must show exactly the pre-drag state.
            self.restore_origin(&session)?;
            self.pending_gate = Some(GateRequest {
                card_id: session.card_id.clone(),
                from: session.source_column.clone(),
                to: session.target_column.clone(),
                policy,
            });
            session.phase = Phase::AwaitingGate;
            self.session = Some(session);
            return Ok(Phase::AwaitingGate);
        }

        // Non-terminal drop: the live preview already holds the final
        // order. Stamp the timestamp only if the card changed columns.
        match self.board.locate(&session.card_id) {
            Some((current_column, _)) if current_column != session.source_column => {
                self.board.stamp_entered(&session.card_id, now);
                let event = CommitEvent {
                    card_id: session.card_id,
                    from: session.source_column,
                    to: current_column,
                    gate_data: None,
                };
                self.fire(&event);
            }
            // Same column (possibly reordered), or card deleted mid-drag
            _ => {}
        }
        Ok(Phase::Idle)
    }

    /// Cancels the gesture outright, e.g. a release outside any column.
    /// Restores the pre-drag position.
    pub fn cancel(&mut self) -> Result<Phase> {
        let mut session = match self.session.take() {
            Some(s) if s.phase == Phase::Active => s,
            Some(s) => {
                let phase = s.phase;
                self.session = Some(s);
                return Ok(phase);
            }
            None => return Ok(Phase::Idle),
        };
        session.phase = Phase::Cancelled;
        self.restore_origin(&session)?;
        Ok(Phase::Cancelled)
    }

    /// Resolves a pending gate.
    ///
    /// `Approved` data is validated against the gate's policy first; an
    /// invalid decision leaves the gate open with no partial commit. A
    /// valid approval applies the transfer and fires the commit hooks
    /// exactly once. `Rejected` discards the move; the pre-drag position
    /// (already restored at `end`) stays authoritative.
    pub fn resolve_gate(&mut self, decision: GateDecision, now: DateTime<Utc>) -> Result<Phase> {
        let (card_id, from, to, policy) = match &self.pending_gate {
            Some(g) => (g.card_id.clone(), g.from.clone(), g.to.clone(), g.policy),
            None => return Err(FlowboardError::NoPendingGate),
        };

        match decision {
            GateDecision::Approved(data) => {
                gate::validate(policy, &data)?;
                if let Some(session) = self.session.as_mut() {
                    session.phase = Phase::Committing;
                }
                let to_index = self
                    .session
                    .as_ref()
                    .map(|s| s.target_index)
                    .unwrap_or(usize::MAX);
                if let Err(err) = self.board.transfer(&card_id, &from, &to, to_index, now) {
                    self.session = None;
                    self.pending_gate = None;
                    return Err(err);
                }
                self.session = None;
                self.pending_gate = None;
                let event = CommitEvent {
                    card_id,
                    from,
                    to,
                    gate_data: Some(data),
                };
                self.fire(&event);
                Ok(Phase::Idle)
            }
            GateDecision::Rejected => {
                self.session = None;
                self.pending_gate = None;
                Ok(Phase::Idle)
            }
        }
    }

    /// Puts the dragged card back where the gesture started
    fn restore_origin(&mut self, session: &DragSession) -> Result<()> {
        let (current_column, current_index) = match self.board.locate(&session.card_id) {
            Some(pos) => pos,
            // Card deleted mid-drag: nothing to restore
            None => return Ok(()),
        };
        if current_column == session.source_column {
            if current_index != session.source_index {
                let len = self.board.lane(&current_column)?.len();
                let to = session.source_index.min(len.saturating_sub(1));
                self.board
                    .move_within_column(&current_column, current_index, to)?;
            }
        } else {
            self.board.relocate(
                &session.card_id,
                &current_column,
                &session.source_column,
                session.source_index,
            )?;
        }
        Ok(())
    }

    fn fire(&mut self, event: &CommitEvent) {
        for hook in &mut self.hooks {
            hook.on_transfer_committed(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column::BoardConfig;
    use chrono::Duration;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn leads_engine() -> PipelineEngine {
        let mut board = Board::new(BoardConfig::leads());
        let entered = Utc::now() - Duration::days(1);
        for (n, column) in [
            (1, "new"),
            (2, "new"),
            (3, "new"),
            (7, "contacted"),
            (8, "contacted"),
            (9, "qualified"),
        ] {
            board
                .insert_card(Card::new(CardId::lead(n), ColumnId::new(column), entered))
                .unwrap();
        }
        PipelineEngine::new(board)
    }

    #[derive(Default)]
    struct RecordingHook {
        events: Rc<RefCell<Vec<CommitEvent>>>,
    }

    impl CommitHook for RecordingHook {
        fn on_transfer_committed(&mut self, event: &CommitEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    fn recording_hook(engine: &mut PipelineEngine) -> Rc<RefCell<Vec<CommitEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        engine.add_hook(Box::new(RecordingHook {
            events: Rc::clone(&events),
        }));
        events
    }

    #[test]
    fn test_noop_drag_is_idempotent() {
        let mut engine = leads_engine();
        let before = engine.snapshot();

        assert_eq!(engine.start(&CardId::lead(2)), Phase::Active);
        engine.hover(&ColumnId::new("new"), 1);
        assert_eq!(engine.end(Utc::now()).unwrap(), Phase::Idle);

        assert_eq!(engine.snapshot(), before);
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_live_reorder_within_column() {
        let mut engine = leads_engine();
        let new = ColumnId::new("new");

        engine.start(&CardId::lead(1));
        engine.hover(&new, 2);
        // Preview is already applied before release
        assert_eq!(
            engine.board().lane(&new).unwrap(),
            &[CardId::lead(2), CardId::lead(3), CardId::lead(1)]
        );
        engine.end(Utc::now()).unwrap();

        assert_eq!(
            engine.board().lane(&new).unwrap(),
            &[CardId::lead(2), CardId::lead(3), CardId::lead(1)]
        );
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_reorder_does_not_touch_timestamp() {
        let mut engine = leads_engine();
        let entered = engine.board().card(&CardId::lead(1)).unwrap().entered_column_at;

        engine.start(&CardId::lead(1));
        engine.hover(&ColumnId::new("new"), 2);
        engine.end(Utc::now()).unwrap();

        assert_eq!(
            engine.board().card(&CardId::lead(1)).unwrap().entered_column_at,
            entered
        );
    }

    #[test]
    fn test_cross_column_transfer_commits_at_end() {
        let mut engine = leads_engine();
        let events = recording_hook(&mut engine);
        let now = Utc::now();

        engine.start(&CardId::lead(1));
        engine.hover(&ColumnId::new("contacted"), 0);
        // Live transfer preview: the card already sits in the target lane
        assert_eq!(
            engine.board().lane(&ColumnId::new("contacted")).unwrap()[0],
            CardId::lead(1)
        );
        // Preview has not stamped the timestamp yet
        assert!(engine.board().card(&CardId::lead(1)).unwrap().entered_column_at < now);

        engine.end(now).unwrap();

        let card = engine.board().card(&CardId::lead(1)).unwrap();
        assert_eq!(card.column, ColumnId::new("contacted"));
        assert_eq!(card.entered_column_at, now);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].from, ColumnId::new("new"));
        assert_eq!(events[0].to, ColumnId::new("contacted"));
        assert_eq!(events[0].gate_data, None);
    }

    #[test]
    fn test_hover_clamps_out_of_range_index() {
        let mut engine = leads_engine();
        engine.start(&CardId::lead(1));
        engine.hover(&ColumnId::new("new"), 99);
        assert_eq!(
            engine.board().lane(&ColumnId::new("new")).unwrap().last(),
            Some(&CardId::lead(1))
        );
        engine.end(Utc::now()).unwrap();
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_terminal_hover_does_not_move_card() {
        let mut engine = leads_engine();
        let before = engine.snapshot();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);

        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.phase(), Phase::Active);
    }

    #[test]
    fn test_terminal_drop_awaits_gate() {
        let mut engine = leads_engine();
        let before = engine.snapshot();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);
        assert_eq!(engine.end(Utc::now()).unwrap(), Phase::AwaitingGate);

        // No store mutation until the gate resolves
        assert_eq!(engine.snapshot(), before);
        let gate = engine.pending_gate().unwrap();
        assert_eq!(gate.card_id, CardId::lead(7));
        assert_eq!(gate.from, ColumnId::new("contacted"));
        assert_eq!(gate.to, ColumnId::new("won"));
        assert_eq!(gate.policy, GatePolicy::Confirm);
    }

    #[test]
    fn test_gate_reject_restores_exact_position() {
        let mut engine = leads_engine();
        let events = recording_hook(&mut engine);
        let before = engine.snapshot();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);
        engine.end(Utc::now()).unwrap();
        assert_eq!(
            engine.resolve_gate(GateDecision::Rejected, Utc::now()).unwrap(),
            Phase::Idle
        );

        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_gate_approve_commits_transfer() {
        let mut engine = leads_engine();
        let events = recording_hook(&mut engine);
        let now = Utc::now();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);
        engine.end(now).unwrap();
        engine
            .resolve_gate(GateDecision::Approved(GateData::confirmed()), now)
            .unwrap();

        let card = engine.board().card(&CardId::lead(7)).unwrap();
        assert_eq!(card.column, ColumnId::new("won"));
        assert_eq!(card.entered_column_at, now);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.pending_gate().is_none());

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].gate_data, Some(GateData::confirmed()));
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_lost_gate_requires_reason() {
        let mut engine = leads_engine();
        let before = engine.snapshot();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("lost"), 0);
        engine.end(Utc::now()).unwrap();

        // Approval without a reason fails and leaves the gate open
        let err = engine
            .resolve_gate(GateDecision::Approved(GateData::confirmed()), Utc::now())
            .unwrap_err();
        assert!(matches!(err, FlowboardError::InvalidGateDecision(_)));
        assert_eq!(engine.phase(), Phase::AwaitingGate);
        assert!(engine.pending_gate().is_some());
        assert_eq!(engine.snapshot(), before);

        // A reason unblocks the same gate
        engine
            .resolve_gate(
                GateDecision::Approved(GateData::confirmed().with_reason("went with competitor")),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(
            engine.board().card(&CardId::lead(7)).unwrap().column,
            ColumnId::new("lost")
        );
    }

    #[test]
    fn test_start_blocked_while_gate_pending() {
        let mut engine = leads_engine();

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);
        engine.end(Utc::now()).unwrap();

        // Neither the gated card nor any other card can start a new drag
        assert_eq!(engine.start(&CardId::lead(7)), Phase::AwaitingGate);
        assert_eq!(engine.start(&CardId::lead(1)), Phase::AwaitingGate);
        engine.hover(&ColumnId::new("new"), 0);
        assert_eq!(engine.end(Utc::now()).unwrap(), Phase::AwaitingGate);
        assert!(engine.pending_gate().is_some());
    }

    #[test]
    fn test_cancel_restores_preview_moves() {
        let mut engine = leads_engine();
        let before = engine.snapshot();

        engine.start(&CardId::lead(1));
        engine.hover(&ColumnId::new("contacted"), 0);
        engine.hover(&ColumnId::new("qualified"), 1);
        assert_eq!(engine.cancel().unwrap(), Phase::Cancelled);

        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.phase(), Phase::Idle);
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_terminal_drop_after_intermediate_hovers_rolls_back_clean() {
        let mut engine = leads_engine();
        let before = engine.snapshot();
        let entered = engine.board().card(&CardId::lead(1)).unwrap().entered_column_at;

        // Pass through two non-terminal columns before the terminal drop
        engine.start(&CardId::lead(1));
        engine.hover(&ColumnId::new("contacted"), 0);
        engine.hover(&ColumnId::new("qualified"), 0);
        engine.hover(&ColumnId::new("lost"), 0);
        engine.end(Utc::now()).unwrap();

        // Awaiting the gate, the store shows the pre-drag state
        assert_eq!(engine.snapshot(), before);

        engine.resolve_gate(GateDecision::Rejected, Utc::now()).unwrap();
        assert_eq!(engine.snapshot(), before);
        assert_eq!(
            engine.board().card(&CardId::lead(1)).unwrap().entered_column_at,
            entered
        );
    }

    #[test]
    fn test_start_unknown_card_ignored() {
        let mut engine = leads_engine();
        assert_eq!(engine.start(&CardId::lead(999)), Phase::Idle);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_remove_card_mid_drag_aborts_session() {
        let mut engine = leads_engine();
        engine.start(&CardId::lead(1));
        engine.remove_card(&CardId::lead(1)).unwrap();

        assert_eq!(engine.phase(), Phase::Idle);
        // A new gesture can begin immediately
        assert_eq!(engine.start(&CardId::lead(2)), Phase::Active);
        engine.board().check_invariants().unwrap();
    }

    #[test]
    fn test_resolve_without_gate_fails() {
        let mut engine = leads_engine();
        let err = engine
            .resolve_gate(GateDecision::Rejected, Utc::now())
            .unwrap_err();
        assert!(matches!(err, FlowboardError::NoPendingGate));
    }

    #[test]
    fn test_urgency_resets_after_committed_transfer() {
        let mut engine = leads_engine();
        let now = Utc::now();

        // Ten days in "contacted" reads as a warning
        let stale = now - Duration::days(10);
        engine.board.stamp_entered(&CardId::lead(7), stale);
        assert_eq!(
            engine.card_urgency(&CardId::lead(7), now).unwrap(),
            Urgency::Warning
        );

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("qualified"), 0);
        engine.end(now).unwrap();

        assert_eq!(
            engine.card_urgency(&CardId::lead(7), now).unwrap(),
            Urgency::Healthy
        );
    }

    // The L-7 walk: warning-aged card in "contacted" dragged to "won",
    // gated, then approved with a project name.
    #[test]
    fn test_won_lead_scenario() {
        let mut engine = leads_engine();
        let events = recording_hook(&mut engine);
        let now = Utc::now();
        engine.board.stamp_entered(&CardId::lead(7), now - Duration::days(10));

        assert_eq!(
            engine.card_urgency(&CardId::lead(7), now).unwrap(),
            Urgency::Warning
        );

        engine.start(&CardId::lead(7));
        engine.hover(&ColumnId::new("won"), 0);
        assert_eq!(engine.end(now).unwrap(), Phase::AwaitingGate);
        assert_eq!(
            engine.board().card(&CardId::lead(7)).unwrap().column,
            ColumnId::new("contacted")
        );

        let data = GateData::confirmed().with_derived_name("X");
        engine
            .resolve_gate(GateDecision::Approved(data.clone()), now)
            .unwrap();

        let card = engine.board().card(&CardId::lead(7)).unwrap();
        assert_eq!(card.column, ColumnId::new("won"));
        assert_eq!(card.entered_column_at, now);
        assert_eq!(
            engine.card_urgency(&CardId::lead(7), now).unwrap(),
            Urgency::Healthy
        );
        assert_eq!(events.borrow()[0].gate_data, Some(data));
    }

    // The T-3 walk: task dragged to "cancelled", approved without a
    // reason, stays in its source column.
    #[test]
    fn test_cancelled_task_scenario() {
        let mut board = Board::new(BoardConfig::tasks());
        board
            .insert_card(Card::new(
                CardId::task(3),
                ColumnId::new("in_progress"),
                Utc::now(),
            ))
            .unwrap();
        let mut engine = PipelineEngine::new(board);

        engine.start(&CardId::task(3));
        engine.hover(&ColumnId::new("cancelled"), 0);
        engine.end(Utc::now()).unwrap();

        let err = engine
            .resolve_gate(GateDecision::Approved(GateData::confirmed()), Utc::now())
            .unwrap_err();
        assert!(matches!(err, FlowboardError::InvalidGateDecision(_)));
        assert_eq!(
            engine.board().card(&CardId::task(3)).unwrap().column,
            ColumnId::new("in_progress")
        );
    }
}
