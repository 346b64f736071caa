//! Pool deposit and withdraw requests.
//!
//! Requests are queued by the message handlers with status
//! [`RequestStatus::NotExecuted`] and resolved at the end of the block.

use serde::{Deserialize, Serialize};

use crate::{Address, Coin, PoolId, RequestId};

/// Lifecycle status of a deposit or withdraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RequestStatus {
    NotExecuted,
    Succeeded,
    Failed,
}

impl RequestStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether the cleanup pass may delete a request in this status.
    #[must_use]
    pub fn should_be_deleted(self) -> bool {
        self.is_terminal()
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExecuted => write!(f, "NOT_EXECUTED"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A pending or resolved deposit into a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub id: RequestId,
    pub pool_id: PoolId,
    pub msg_height: u64,
    pub depositor: Address,
    /// Deposited X and Y coins, in that order.
    pub deposit_coins: [Coin; 2],
    /// Part of `deposit_coins` moved into the reserve.
    pub accepted_coins: [Coin; 2],
    pub minted_pool_coin: Coin,
    pub status: RequestStatus,
}

impl DepositRequest {
    /// Mark the request as succeeded with its outcome.
    pub fn succeed(&mut self, accepted_coins: [Coin; 2], minted_pool_coin: Coin) {
        self.accepted_coins = accepted_coins;
        self.minted_pool_coin = minted_pool_coin;
        self.status = RequestStatus::Succeeded;
    }

    pub fn fail(&mut self) {
        self.status = RequestStatus::Failed;
    }
}

/// A pending or resolved withdrawal from a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub id: RequestId,
    pub pool_id: PoolId,
    pub msg_height: u64,
    pub withdrawer: Address,
    /// Pool coins escrowed for burning.
    pub pool_coin: Coin,
    /// X and Y coins paid out, in that order.
    pub withdrawn_coins: [Coin; 2],
    pub status: RequestStatus,
}

impl WithdrawRequest {
    pub fn succeed(&mut self, withdrawn_coins: [Coin; 2]) {
        self.withdrawn_coins = withdrawn_coins;
        self.status = RequestStatus::Succeeded;
    }

    pub fn fail(&mut self) {
        self.status = RequestStatus::Failed;
    }
}
