//! State access for the liquidity module.
//!
//! [`Keeper`] owns the store, the ledger and the module parameters. All
//! record reads and writes go through it so that secondary indexes stay in
//! step with the records they point at.

use batchdex_store::keys;
use batchdex_store::{KvStore, codec};
use batchdex_types::{
    Address, Amount, DepositRequest, Order, OrderId, Pair, PairId, Params, Pool, PoolId,
    RequestId, Result, WithdrawRequest,
};

use crate::ledger::Ledger;

/// Store, ledger and parameters of the liquidity module.
#[derive(Debug, Clone)]
pub struct Keeper<S, L> {
    store: S,
    ledger: L,
    params: Params,
}

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    #[must_use]
    pub fn new(store: S, ledger: L, params: Params) -> Self {
        Self {
            store,
            ledger,
            params,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replace the module parameters after validating them.
    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn into_parts(self) -> (S, L, Params) {
        (self.store, self.ledger, self.params)
    }

    fn get_record<T: serde::de::DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.store
            .get(key)?
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    fn get_counter(&self, key: &[u8]) -> Result<u64> {
        self.store
            .get(key)?
            .map_or(Ok(0), |bytes| codec::decode_u64(&bytes))
    }

    // -----------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------

    pub fn get_last_pair_id(&self) -> Result<PairId> {
        self.get_counter(keys::LAST_PAIR_ID_KEY).map(PairId)
    }

    pub fn set_last_pair_id(&mut self, id: PairId) -> Result<()> {
        self.store
            .set(keys::LAST_PAIR_ID_KEY.to_vec(), codec::encode_u64(id.0))
    }

    pub fn get_last_pool_id(&self) -> Result<PoolId> {
        self.get_counter(keys::LAST_POOL_ID_KEY).map(PoolId)
    }

    pub fn set_last_pool_id(&mut self, id: PoolId) -> Result<()> {
        self.store
            .set(keys::LAST_POOL_ID_KEY.to_vec(), codec::encode_u64(id.0))
    }

    // -----------------------------------------------------------------
    // Pairs
    // -----------------------------------------------------------------

    pub fn get_pair(&self, id: PairId) -> Result<Option<Pair>> {
        self.get_record(&keys::pair_key(id))
    }

    pub fn set_pair(&mut self, pair: &Pair) -> Result<()> {
        self.store.set(keys::pair_key(pair.id), codec::encode(pair)?)
    }

    pub fn get_pair_id_by_denoms(&self, x_coin_denom: &str, y_coin_denom: &str) -> Result<Option<PairId>> {
        let key = keys::pair_index_key(x_coin_denom, y_coin_denom)?;
        self.store
            .get(&key)?
            .map(|bytes| codec::decode_u64(&bytes).map(PairId))
            .transpose()
    }

    /// Write the denomination index and both lookup orientations of a pair.
    pub fn set_pair_indexes(&mut self, pair: &Pair) -> Result<()> {
        let x = pair.x_coin_denom.as_str();
        let y = pair.y_coin_denom.as_str();
        let index_key = keys::pair_index_key(x, y)?;
        let lookup = keys::pair_lookup_index_key(x, y, pair.id)?;
        let reverse = keys::pair_lookup_index_key(y, x, pair.id)?;
        self.store.set(index_key, codec::encode_u64(pair.id.0))?;
        self.store.set(lookup, vec![])?;
        self.store.set(reverse, vec![])
    }

    // -----------------------------------------------------------------
    // Pools
    // -----------------------------------------------------------------

    pub fn get_pool(&self, id: PoolId) -> Result<Option<Pool>> {
        self.get_record(&keys::pool_key(id))
    }

    pub fn set_pool(&mut self, pool: &Pool) -> Result<()> {
        self.store.set(keys::pool_key(pool.id), codec::encode(pool)?)
    }

    pub fn get_pool_id_by_reserve_address(&self, reserve_address: &Address) -> Result<Option<PoolId>> {
        let key = keys::pool_by_reserve_address_index_key(reserve_address)?;
        self.store
            .get(&key)?
            .map(|bytes| codec::decode_u64(&bytes).map(PoolId))
            .transpose()
    }

    /// Write the reserve address and pair indexes of a pool.
    pub fn set_pool_indexes(&mut self, pool: &Pool) -> Result<()> {
        let reserve_key = keys::pool_by_reserve_address_index_key(&pool.reserve_address)?;
        self.store.set(reserve_key, codec::encode_u64(pool.id.0))?;
        self.store
            .set(keys::pools_by_pair_index_key(pool.pair_id, pool.id), vec![])
    }

    /// Pools of a pair in ascending id order.
    pub fn get_pools_by_pair(&self, pair_id: PairId) -> Result<Vec<Pool>> {
        let mut pools = Vec::new();
        for (key, _) in self
            .store
            .iter_prefix(&keys::pools_by_pair_index_key_prefix(pair_id))?
        {
            let pool_id = keys::parse_pools_by_pair_index_key(&key)?;
            if let Some(pool) = self.get_pool(pool_id)? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }

    /// Current X and Y reserves of a pool.
    pub fn get_pool_reserves(&self, pool: &Pool, pair: &Pair) -> (Amount, Amount) {
        (
            self.ledger.balance(&pool.reserve_address, &pair.x_coin_denom),
            self.ledger.balance(&pool.reserve_address, &pair.y_coin_denom),
        )
    }

    pub fn get_pool_coin_supply(&self, pool: &Pool) -> Amount {
        self.ledger.supply(&pool.pool_coin_denom)
    }

    // -----------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------

    pub fn get_deposit_request(&self, pool_id: PoolId, id: RequestId) -> Result<Option<DepositRequest>> {
        self.get_record(&keys::deposit_request_key(pool_id, id))
    }

    pub fn set_deposit_request(&mut self, req: &DepositRequest) -> Result<()> {
        self.store.set(
            keys::deposit_request_key(req.pool_id, req.id),
            codec::encode(req)?,
        )
    }

    pub fn delete_deposit_request(&mut self, req: &DepositRequest) -> Result<()> {
        self.store
            .delete(&keys::deposit_request_key(req.pool_id, req.id))
    }

    pub fn get_withdraw_request(&self, pool_id: PoolId, id: RequestId) -> Result<Option<WithdrawRequest>> {
        self.get_record(&keys::withdraw_request_key(pool_id, id))
    }

    pub fn set_withdraw_request(&mut self, req: &WithdrawRequest) -> Result<()> {
        self.store.set(
            keys::withdraw_request_key(req.pool_id, req.id),
            codec::encode(req)?,
        )
    }

    pub fn delete_withdraw_request(&mut self, req: &WithdrawRequest) -> Result<()> {
        self.store
            .delete(&keys::withdraw_request_key(req.pool_id, req.id))
    }

    // -----------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------

    pub fn get_order(&self, pair_id: PairId, id: OrderId) -> Result<Option<Order>> {
        self.get_record(&keys::order_key(pair_id, id))
    }

    /// Write an order and its orderer index entry.
    pub fn set_order(&mut self, order: &Order) -> Result<()> {
        let index_key =
            keys::order_index_key(&order.orderer, order.expire_at, order.pair_id, order.id)?;
        let value = codec::encode(order)?;
        self.store.set(keys::order_key(order.pair_id, order.id), value)?;
        self.store.set(index_key, vec![])
    }

    /// Delete an order and its orderer index entry.
    pub fn delete_order(&mut self, order: &Order) -> Result<()> {
        let index_key =
            keys::order_index_key(&order.orderer, order.expire_at, order.pair_id, order.id)?;
        self.store.delete(&keys::order_key(order.pair_id, order.id))?;
        self.store.delete(&index_key)
    }

    /// Orders of one pair in ascending id order.
    pub fn get_orders_by_pair(&self, pair_id: PairId) -> Result<Vec<Order>> {
        self.decode_prefix(&keys::order_key_prefix(pair_id))
    }

    // -----------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------

    fn decode_prefix<T: serde::de::DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>> {
        self.store
            .iter_prefix(prefix)?
            .iter()
            .map(|(_, value)| codec::decode(value))
            .collect()
    }

    /// Visit records under `prefix` in key order over a snapshot taken up
    /// front. The callback may write to the keeper; returning `Ok(true)`
    /// stops the walk.
    fn iterate_prefix<T, F>(&mut self, prefix: &[u8], mut cb: F) -> Result<()>
    where
        T: serde::de::DeserializeOwned,
        F: FnMut(&mut Self, T) -> Result<bool>,
    {
        for (_, value) in self.store.iter_prefix(prefix)? {
            let record: T = codec::decode(&value)?;
            if cb(self, record)? {
                break;
            }
        }
        Ok(())
    }

    pub fn iterate_all_pairs<F>(&mut self, cb: F) -> Result<()>
    where
        F: FnMut(&mut Self, Pair) -> Result<bool>,
    {
        self.iterate_prefix(&[keys::PAIR_KEY_PREFIX], cb)
    }

    pub fn iterate_all_pools<F>(&mut self, cb: F) -> Result<()>
    where
        F: FnMut(&mut Self, Pool) -> Result<bool>,
    {
        self.iterate_prefix(&[keys::POOL_KEY_PREFIX], cb)
    }

    pub fn iterate_all_orders<F>(&mut self, cb: F) -> Result<()>
    where
        F: FnMut(&mut Self, Order) -> Result<bool>,
    {
        self.iterate_prefix(&[keys::ORDER_KEY_PREFIX], cb)
    }

    pub fn iterate_all_deposit_requests<F>(&mut self, cb: F) -> Result<()>
    where
        F: FnMut(&mut Self, DepositRequest) -> Result<bool>,
    {
        self.iterate_prefix(&[keys::DEPOSIT_REQUEST_KEY_PREFIX], cb)
    }

    pub fn iterate_all_withdraw_requests<F>(&mut self, cb: F) -> Result<()>
    where
        F: FnMut(&mut Self, WithdrawRequest) -> Result<bool>,
    {
        self.iterate_prefix(&[keys::WITHDRAW_REQUEST_KEY_PREFIX], cb)
    }

    pub fn get_all_pairs(&self) -> Result<Vec<Pair>> {
        self.decode_prefix(&[keys::PAIR_KEY_PREFIX])
    }

    pub fn get_all_pools(&self) -> Result<Vec<Pool>> {
        self.decode_prefix(&[keys::POOL_KEY_PREFIX])
    }

    pub fn get_all_orders(&self) -> Result<Vec<Order>> {
        self.decode_prefix(&[keys::ORDER_KEY_PREFIX])
    }

    pub fn get_all_deposit_requests(&self) -> Result<Vec<DepositRequest>> {
        self.decode_prefix(&[keys::DEPOSIT_REQUEST_KEY_PREFIX])
    }

    pub fn get_all_withdraw_requests(&self) -> Result<Vec<WithdrawRequest>> {
        self.decode_prefix(&[keys::WITHDRAW_REQUEST_KEY_PREFIX])
    }
}

#[cfg(test)]
mod tests {
    use batchdex_store::MemStore;
    use batchdex_types::{Coin, RequestStatus, SwapDirection};
    use rust_decimal::Decimal;

    use super::*;
    use crate::ledger::BankLedger;

    fn keeper() -> Keeper<MemStore, BankLedger> {
        Keeper::new(MemStore::new(), BankLedger::new(), Params::default())
    }

    fn deposit_request(pool: u64, id: u64, status: RequestStatus) -> DepositRequest {
        DepositRequest {
            id: RequestId(id),
            pool_id: PoolId(pool),
            msg_height: 1,
            depositor: Address::new("dex1alice"),
            deposit_coins: [Coin::new("denom1", 10), Coin::new("denom2", 10)],
            accepted_coins: [Coin::zero("denom1"), Coin::zero("denom2")],
            minted_pool_coin: Coin::zero(format!("pool{pool}")),
            status,
        }
    }

    #[test]
    fn counters_start_at_zero() {
        let mut k = keeper();
        assert_eq!(k.get_last_pair_id().unwrap(), PairId(0));
        k.set_last_pair_id(PairId(3)).unwrap();
        assert_eq!(k.get_last_pair_id().unwrap(), PairId(3));
        assert_eq!(k.get_last_pool_id().unwrap(), PoolId(0));
    }

    #[test]
    fn pair_roundtrip_and_indexes() {
        let mut k = keeper();
        let pair = Pair::new(PairId(1), "denom1", "denom2");
        k.set_pair(&pair).unwrap();
        k.set_pair_indexes(&pair).unwrap();
        assert_eq!(k.get_pair(PairId(1)).unwrap(), Some(pair));
        assert_eq!(
            k.get_pair_id_by_denoms("denom1", "denom2").unwrap(),
            Some(PairId(1))
        );
        assert_eq!(k.get_pair_id_by_denoms("denom2", "denom1").unwrap(), None);
    }

    #[test]
    fn set_and_delete_order_maintains_index() {
        let mut k = keeper();
        let order = Order::dummy(5, SwapDirection::XToY, Decimal::ONE, 10);
        k.set_order(&order).unwrap();
        let index_key =
            keys::order_index_key(&order.orderer, order.expire_at, order.pair_id, order.id)
                .unwrap();
        assert!(k.store().has(&index_key).unwrap());
        assert_eq!(k.get_order(PairId(1), OrderId(5)).unwrap(), Some(order.clone()));

        k.delete_order(&order).unwrap();
        assert!(!k.store().has(&index_key).unwrap());
        assert!(k.store().is_empty());
    }

    #[test]
    fn iteration_visits_key_order_and_stops_early() {
        let mut k = keeper();
        for (pool, id) in [(2, 1), (1, 2), (1, 1)] {
            k.set_deposit_request(&deposit_request(pool, id, RequestStatus::NotExecuted))
                .unwrap();
        }
        let mut seen = vec![];
        k.iterate_all_deposit_requests(|_, req| {
            seen.push((req.pool_id.0, req.id.0));
            Ok(seen.len() == 2)
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 1), (1, 2)]);
    }

    #[test]
    fn callback_errors_abort_iteration() {
        let mut k = keeper();
        k.set_deposit_request(&deposit_request(1, 1, RequestStatus::NotExecuted))
            .unwrap();
        k.set_deposit_request(&deposit_request(1, 2, RequestStatus::NotExecuted))
            .unwrap();
        let mut calls = 0;
        let result = k.iterate_all_deposit_requests(|_, _| {
            calls += 1;
            Err(batchdex_types::DexError::Internal("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn callbacks_may_write() {
        let mut k = keeper();
        k.set_deposit_request(&deposit_request(1, 1, RequestStatus::NotExecuted))
            .unwrap();
        k.iterate_all_deposit_requests(|k, mut req| {
            req.fail();
            k.set_deposit_request(&req)?;
            Ok(false)
        })
        .unwrap();
        let req = k.get_deposit_request(PoolId(1), RequestId(1)).unwrap().unwrap();
        assert_eq!(req.status, RequestStatus::Failed);
    }

    #[test]
    fn set_params_validates() {
        let mut k = keeper();
        let params = Params {
            initial_pool_coin_supply: 0,
            ..Params::default()
        };
        assert!(k.set_params(params).is_err());
        assert_eq!(k.params(), &Params::default());
    }
}
