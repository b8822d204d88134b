//! Wallet data models.

use crate::{auth::PlayerId, table::TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub player_id: PlayerId,
    pub balance: i64,
    pub total_deposited: i64,
    pub total_withdrawn: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    BuyIn,
    CashOut,
    Refund,
    /// External funding, e.g. an operator balance adjustment. The lobby
    /// never issues it; it only feeds `total_deposited`.
    Deposit,
    /// External payout; feeds `total_withdrawn`. Not issued by the lobby.
    Withdrawal,
}

impl TransactionKind {
    /// Whether this kind removes chips from the wallet
    pub fn is_debit(self) -> bool {
        matches!(self, TransactionKind::BuyIn | TransactionKind::Withdrawal)
    }

    /// Parse the stored representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BUY_IN" => Some(TransactionKind::BuyIn),
            "CASH_OUT" => Some(TransactionKind::CashOut),
            "REFUND" => Some(TransactionKind::Refund),
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAWAL" => Some(TransactionKind::Withdrawal),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::BuyIn => write!(f, "BUY_IN"),
            TransactionKind::CashOut => write!(f, "CASH_OUT"),
            TransactionKind::Refund => write!(f, "REFUND"),
            TransactionKind::Deposit => write!(f, "DEPOSIT"),
            TransactionKind::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

/// Durable audit record written with every balance change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub player_id: PlayerId,
    pub table_id: Option<TableId>,
    pub kind: TransactionKind,
    /// Signed delta applied to the balance
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// A single signed balance change together with its audit data.
///
/// Stores apply it as one atomic conditional update plus one audit insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub player_id: PlayerId,
    pub delta: i64,
    pub kind: TransactionKind,
    pub table_id: Option<TableId>,
    pub description: Option<String>,
    pub idempotency_key: String,
}

impl Adjustment {
    /// Amount to add to `total_deposited`
    pub fn deposited(&self) -> i64 {
        match self.kind {
            TransactionKind::Deposit => self.delta,
            _ => 0,
        }
    }

    /// Amount to add to `total_withdrawn`
    pub fn withdrawn(&self) -> i64 {
        match self.kind {
            TransactionKind::Withdrawal => -self.delta,
            _ => 0,
        }
    }
}
