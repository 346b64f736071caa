//! Read-only lookups over the liquidity store.
//!
//! Lookups by id return an error when the record is missing; lookups by
//! secondary index return `Option` or a list.

use batchdex_store::{KvStore, keys};
use batchdex_types::{
    Address, DepositRequest, DexError, Order, OrderId, Pair, PairId, Pool, PoolId, RequestId,
    Result, WithdrawRequest,
};

use crate::keeper::Keeper;
use crate::ledger::Ledger;

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    pub fn pair(&self, pair_id: PairId) -> Result<Pair> {
        self.get_pair(pair_id)?
            .ok_or(DexError::PairNotFound(pair_id))
    }

    pub fn pair_by_denoms(&self, x_coin_denom: &str, y_coin_denom: &str) -> Result<Option<Pair>> {
        match self.get_pair_id_by_denoms(x_coin_denom, y_coin_denom)? {
            Some(id) => self.get_pair(id),
            None => Ok(None),
        }
    }

    /// Ids of every pair that trades `denom`, on either side.
    pub fn pair_ids_by_denom(&self, denom: &str) -> Result<Vec<PairId>> {
        let prefix = keys::pair_lookup_index_key_prefix_by_denom(denom)?;
        self.store()
            .iter_prefix(&prefix)?
            .iter()
            .map(|(key, _)| keys::parse_pair_lookup_index_key(key).map(|(_, _, id)| id))
            .collect()
    }

    /// Ids of the pairs between `denom_a` and `denom_b`, in either orientation.
    pub fn pair_ids_by_denoms(&self, denom_a: &str, denom_b: &str) -> Result<Vec<PairId>> {
        let prefix = keys::pair_lookup_index_key_prefix(denom_a, denom_b)?;
        self.store()
            .iter_prefix(&prefix)?
            .iter()
            .map(|(key, _)| keys::parse_pair_lookup_index_key(key).map(|(_, _, id)| id))
            .collect()
    }

    pub fn pool(&self, pool_id: PoolId) -> Result<Pool> {
        self.get_pool(pool_id)?
            .ok_or(DexError::PoolNotFound(pool_id))
    }

    pub fn pool_by_reserve_address(&self, reserve_address: &Address) -> Result<Option<Pool>> {
        match self.get_pool_id_by_reserve_address(reserve_address)? {
            Some(id) => self.get_pool(id),
            None => Ok(None),
        }
    }

    pub fn pools_by_pair(&self, pair_id: PairId) -> Result<Vec<Pool>> {
        self.get_pools_by_pair(pair_id)
    }

    pub fn order(&self, pair_id: PairId, order_id: OrderId) -> Result<Order> {
        self.get_order(pair_id, order_id)?
            .ok_or(DexError::OrderNotFound { pair_id, order_id })
    }

    /// Orders of `orderer`, soonest expiration first.
    pub fn orders_by_orderer(&self, orderer: &Address) -> Result<Vec<Order>> {
        let prefix = keys::order_index_key_prefix(orderer)?;
        let mut orders = Vec::new();
        for (key, _) in self.store().iter_prefix(&prefix)? {
            let entry = keys::parse_order_index_key(&key)?;
            if let Some(order) = self.get_order(entry.pair_id, entry.order_id)? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    pub fn deposit_request(&self, pool_id: PoolId, request_id: RequestId) -> Result<DepositRequest> {
        self.get_deposit_request(pool_id, request_id)?
            .ok_or(DexError::DepositRequestNotFound {
                pool_id,
                request_id,
            })
    }

    pub fn withdraw_request(&self, pool_id: PoolId, request_id: RequestId) -> Result<WithdrawRequest> {
        self.get_withdraw_request(pool_id, request_id)?
            .ok_or(DexError::WithdrawRequestNotFound {
                pool_id,
                request_id,
            })
    }
}
