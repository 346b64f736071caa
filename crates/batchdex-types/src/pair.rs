//! Trading pairs and liquidity pools.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, BatchId, OrderId, PairId, PoolId, RequestId, pool_coin_denom};

/// A trading pair of two denominations.
///
/// `x_coin_denom` is the quote coin and `y_coin_denom` the base coin; order
/// prices are X per one unit of Y.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: PairId,
    pub x_coin_denom: String,
    pub y_coin_denom: String,
    /// Account holding the offer coins of open orders.
    pub escrow_address: Address,
    pub last_order_id: OrderId,
    /// Clearing price of the most recent batch that produced trades.
    pub last_price: Option<Decimal>,
    pub current_batch_id: BatchId,
}

impl Pair {
    #[must_use]
    pub fn new(id: PairId, x_coin_denom: impl Into<String>, y_coin_denom: impl Into<String>) -> Self {
        Self {
            id,
            x_coin_denom: x_coin_denom.into(),
            y_coin_denom: y_coin_denom.into(),
            escrow_address: Address::pair_escrow(id),
            last_order_id: OrderId(0),
            last_price: None,
            current_batch_id: BatchId(1),
        }
    }

    /// Reserve the next order id.
    pub fn next_order_id(&mut self) -> OrderId {
        self.last_order_id = OrderId(self.last_order_id.0 + 1);
        self.last_order_id
    }

    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.y_coin_denom, self.x_coin_denom)
    }
}

/// A constant-product liquidity pool of a pair.
///
/// Reserves are not stored here; they are the ledger balances of
/// `reserve_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub pair_id: PairId,
    pub reserve_address: Address,
    pub pool_coin_denom: String,
    pub last_deposit_request_id: RequestId,
    pub last_withdraw_request_id: RequestId,
    /// Set once every reserve coin has been withdrawn.
    pub disabled: bool,
}

impl Pool {
    #[must_use]
    pub fn new(id: PoolId, pair_id: PairId) -> Self {
        Self {
            id,
            pair_id,
            reserve_address: Address::pool_reserve(id),
            pool_coin_denom: pool_coin_denom(id),
            last_deposit_request_id: RequestId(0),
            last_withdraw_request_id: RequestId(0),
            disabled: false,
        }
    }

    pub fn next_deposit_request_id(&mut self) -> RequestId {
        self.last_deposit_request_id = RequestId(self.last_deposit_request_id.0 + 1);
        self.last_deposit_request_id
    }

    pub fn next_withdraw_request_id(&mut self) -> RequestId {
        self.last_withdraw_request_id = RequestId(self.last_withdraw_request_id.0 + 1);
        self.last_withdraw_request_id
    }
}
