//! Join/leave sagas: the two-step wallet + seat transactions as explicit
//! state machines.
//!
//! ```text
//! join:  STARTED -> FUNDS_RESERVED -> SEAT_CLAIMED -> COMMITTED
//!                         |
//!                         +-> COMPENSATING -> FAILED
//! leave: STARTED -> SEAT_RELEASED -> COMMITTED
//!                         |
//!                         +-> FAILED
//! ```
//!
//! Any state before money moves may go straight to FAILED.

use super::models::TableId;
use crate::auth::PlayerId;
use uuid::Uuid;

/// Saga state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Started,
    FundsReserved,
    SeatClaimed,
    SeatReleased,
    Committed,
    Compensating,
    Failed,
}

impl SagaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SagaState::Committed | SagaState::Failed)
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SagaState::Started => write!(f, "STARTED"),
            SagaState::FundsReserved => write!(f, "FUNDS_RESERVED"),
            SagaState::SeatClaimed => write!(f, "SEAT_CLAIMED"),
            SagaState::SeatReleased => write!(f, "SEAT_RELEASED"),
            SagaState::Committed => write!(f, "COMMITTED"),
            SagaState::Compensating => write!(f, "COMPENSATING"),
            SagaState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Which two-step operation a saga drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaKind {
    Join,
    Leave,
}

impl SagaKind {
    fn allows(self, from: SagaState, to: SagaState) -> bool {
        use SagaState::*;

        match self {
            SagaKind::Join => matches!(
                (from, to),
                (Started, FundsReserved)
                    | (Started, Failed)
                    | (FundsReserved, SeatClaimed)
                    | (FundsReserved, Compensating)
                    | (SeatClaimed, Committed)
                    | (Compensating, Failed)
            ),
            SagaKind::Leave => matches!(
                (from, to),
                (Started, SeatReleased)
                    | (Started, Failed)
                    | (SeatReleased, Committed)
                    | (SeatReleased, Failed)
            ),
        }
    }
}

/// One run of a join or leave
#[derive(Debug)]
pub struct Saga {
    id: Uuid,
    kind: SagaKind,
    player_id: PlayerId,
    table_id: TableId,
    state: SagaState,
}

impl Saga {
    pub fn begin(kind: SagaKind, player_id: PlayerId, table_id: TableId) -> Self {
        let saga = Self {
            id: Uuid::new_v4(),
            kind,
            player_id,
            table_id,
            state: SagaState::Started,
        };
        log::debug!(
            "saga {} ({:?}) player {} table {}: {}",
            saga.id,
            kind,
            player_id,
            table_id,
            saga.state
        );
        saga
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Idempotency key for a wallet step of this saga, e.g. `refund:<id>`
    pub fn key(&self, step: &str) -> String {
        format!("{}:{}", step, self.id)
    }

    /// Move to `next`, logging the transition.
    ///
    /// Returns false (and stays put) if the transition is not part of this
    /// saga's state machine.
    pub fn advance(&mut self, next: SagaState) -> bool {
        if !self.kind.allows(self.state, next) {
            log::error!(
                "saga {} ({:?}): illegal transition {} -> {}",
                self.id,
                self.kind,
                self.state,
                next
            );
            return false;
        }

        log::debug!(
            "saga {} ({:?}) player {} table {}: {} -> {}",
            self.id,
            self.kind,
            self.player_id,
            self.table_id,
            self.state,
            next
        );
        self.state = next;
        true
    }

    /// Mark the saga failed unless it already finished
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.advance(SagaState::Failed);
        }
    }
}
