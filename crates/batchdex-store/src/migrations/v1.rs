//! Store layout of schema version 1.
//!
//! Version 1 orders carried no expiration time, and the orderer index had
//! no timestamp segment: `0xb3‖len orderer‖orderer‖pair‖order`.

use batchdex_types::{
    Address, Amount, BatchId, Coin, Order, OrderId, OrderStatus, PairId, Result, SwapDirection,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::keys::{KeyReader, ORDER_INDEX_KEY_PREFIX, order_index_key_prefix};

/// Bytes following the orderer segment of a v1 index key.
pub const ORDER_INDEX_TAIL_LEN: usize = 16;

/// Order record without `expire_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderV1 {
    pub id: OrderId,
    pub pair_id: PairId,
    pub msg_height: u64,
    pub orderer: Address,
    pub direction: SwapDirection,
    pub offer_coin: Coin,
    pub remaining_offer_coin: Coin,
    pub received_coin: Coin,
    pub price: Decimal,
    pub amount: Amount,
    pub open_amount: Amount,
    pub batch_id: BatchId,
    pub status: OrderStatus,
}

impl OrderV1 {
    #[must_use]
    pub fn into_v2(self, expire_at: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            pair_id: self.pair_id,
            msg_height: self.msg_height,
            orderer: self.orderer,
            direction: self.direction,
            offer_coin: self.offer_coin,
            remaining_offer_coin: self.remaining_offer_coin,
            received_coin: self.received_coin,
            price: self.price,
            amount: self.amount,
            open_amount: self.open_amount,
            batch_id: self.batch_id,
            expire_at,
            status: self.status,
        }
    }
}

pub fn order_index_key(orderer: &Address, pair_id: PairId, order_id: OrderId) -> Result<Vec<u8>> {
    let mut key = order_index_key_prefix(orderer)?;
    key.extend_from_slice(&pair_id.0.to_be_bytes());
    key.extend_from_slice(&order_id.0.to_be_bytes());
    Ok(key)
}

/// Decode a v1 orderer index key.
///
/// Returns `Ok(None)` when the key has the v2 layout instead.
pub fn parse_order_index_key(key: &[u8]) -> Result<Option<(Address, PairId, OrderId)>> {
    let mut reader = KeyReader::new(key, ORDER_INDEX_KEY_PREFIX)?;
    let orderer = Address::new(reader.read_string()?);
    if reader.remaining() != ORDER_INDEX_TAIL_LEN {
        return Ok(None);
    }
    let pair_id = PairId(reader.read_u64()?);
    let order_id = OrderId(reader.read_u64()?);
    reader.finish()?;
    Ok(Some((orderer, pair_id, order_id)))
}
