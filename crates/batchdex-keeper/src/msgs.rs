//! Message handlers.
//!
//! Each handler validates its whole input before touching state, so a
//! rejected message leaves the store and the ledger unchanged. Coins move
//! before records are written; a ledger call is atomic, so a failed
//! transfer also leaves nothing behind.

use std::time::Duration;

use batchdex_store::{KvStore, keys};
use batchdex_types::{
    Address, Amount, BlockContext, Coin, DepositRequest, DexError, Order, OrderId,
    OrderStatus, Pair, PairId, Pool, PoolId, RequestStatus, Result, SwapDirection,
    WithdrawRequest, math,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::keeper::Keeper;
use crate::ledger::Ledger;

const MAX_DENOM_LEN: usize = u8::MAX as usize;

fn validate_denom(denom: &str) -> Result<()> {
    if denom.is_empty() {
        return Err(DexError::InvalidDenoms {
            reason: "denomination is empty".into(),
        });
    }
    if denom.len() > MAX_DENOM_LEN {
        return Err(DexError::InvalidDenoms {
            reason: format!("denomination longer than {MAX_DENOM_LEN} bytes"),
        });
    }
    Ok(())
}

/// Split `coins` into the pair's X and Y amounts.
fn pair_amounts(pair: &Pair, coins: &[Coin]) -> Result<(Amount, Amount)> {
    let [a, b] = coins else {
        return Err(DexError::InvalidRequestCoins {
            reason: format!("expected 2 coins, got {}", coins.len()),
        });
    };
    let x = pair.x_coin_denom.as_str();
    let y = pair.y_coin_denom.as_str();
    match (a.denom.as_str(), b.denom.as_str()) {
        (da, db) if da == x && db == y => Ok((a.amount, b.amount)),
        (da, db) if da == y && db == x => Ok((b.amount, a.amount)),
        (da, db) => Err(DexError::InvalidRequestCoins {
            reason: format!("coins {da}, {db} do not match pair {}", pair.symbol()),
        }),
    }
}

impl<S: KvStore, L: Ledger> Keeper<S, L> {
    fn require_pair(&self, pair_id: PairId) -> Result<Pair> {
        self.get_pair(pair_id)?
            .ok_or(DexError::PairNotFound(pair_id))
    }

    fn require_enabled_pool(&self, pool_id: PoolId) -> Result<(Pool, Pair)> {
        let pool = self.get_pool(pool_id)?.ok_or(DexError::PoolNotFound(pool_id))?;
        if pool.disabled {
            return Err(DexError::PoolDisabled(pool_id));
        }
        let pair = self.require_pair(pool.pair_id)?;
        Ok((pool, pair))
    }

    fn require_funds(&self, owner: &Address, coins: &[Coin]) -> Result<()> {
        for coin in coins {
            let available = self.ledger().balance(owner, &coin.denom);
            if available < coin.amount {
                return Err(DexError::InsufficientFunds {
                    address: owner.clone(),
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Register a new pair for `(x_coin_denom, y_coin_denom)`.
    pub fn create_pair(
        &mut self,
        creator: &Address,
        x_coin_denom: &str,
        y_coin_denom: &str,
    ) -> Result<Pair> {
        validate_denom(x_coin_denom)?;
        validate_denom(y_coin_denom)?;
        if x_coin_denom == y_coin_denom {
            return Err(DexError::InvalidDenoms {
                reason: format!("both denominations are {x_coin_denom}"),
            });
        }
        if self
            .get_pair_id_by_denoms(x_coin_denom, y_coin_denom)?
            .is_some()
        {
            return Err(DexError::PairAlreadyExists {
                x_denom: x_coin_denom.to_string(),
                y_denom: y_coin_denom.to_string(),
            });
        }

        let id = self.get_last_pair_id()?.next();
        let pair = Pair::new(id, x_coin_denom, y_coin_denom);
        self.set_pair(&pair)?;
        self.set_pair_indexes(&pair)?;
        self.set_last_pair_id(id)?;

        info!(%creator, pair_id = %id, symbol = %pair.symbol(), "pair created");
        Ok(pair)
    }

    /// Create a pool for a pair, funded by the creator.
    ///
    /// The creator receives the initial pool coin supply.
    pub fn create_pool(
        &mut self,
        creator: &Address,
        pair_id: PairId,
        deposit_coins: &[Coin],
    ) -> Result<Pool> {
        let pair = self.require_pair(pair_id)?;
        let (x, y) = pair_amounts(&pair, deposit_coins)?;
        math::ensure_max_amount(x)?;
        math::ensure_max_amount(y)?;
        let minimum = self.params().min_initial_deposit_amount;
        if x < minimum || y < minimum {
            return Err(DexError::InsufficientInitialDeposit { minimum });
        }
        for pool in self.get_pools_by_pair(pair_id)? {
            if !pool.disabled {
                return Err(DexError::PoolAlreadyExists(pair_id));
            }
        }

        let id = self.get_last_pool_id()?.next();
        let pool = Pool::new(id, pair_id);
        let reserve_coins = [
            Coin::new(pair.x_coin_denom.clone(), x),
            Coin::new(pair.y_coin_denom.clone(), y),
        ];
        let pool_coin = Coin::new(
            pool.pool_coin_denom.clone(),
            self.params().initial_pool_coin_supply,
        );
        self.require_funds(creator, &reserve_coins)?;
        if self
            .get_pool_coin_supply(&pool)
            .checked_add(pool_coin.amount)
            .is_none()
        {
            return Err(DexError::LedgerOverflow {
                denom: pool_coin.denom,
            });
        }

        self.ledger_mut()
            .send_coins(creator, &pool.reserve_address, &reserve_coins)?;
        if let Err(err) = self
            .ledger_mut()
            .mint_coins(creator, std::slice::from_ref(&pool_coin))
        {
            self.ledger_mut()
                .send_coins(&pool.reserve_address, creator, &reserve_coins)?;
            return Err(err);
        }

        self.set_pool(&pool)?;
        self.set_pool_indexes(&pool)?;
        self.set_last_pool_id(id)?;

        info!(%creator, pool_id = %id, %pair_id, reserve_x = x, reserve_y = y, "pool created");
        Ok(pool)
    }

    /// Escrow a deposit into a pool until the next batch executes it.
    pub fn deposit(
        &mut self,
        ctx: &BlockContext,
        depositor: &Address,
        pool_id: PoolId,
        deposit_coins: &[Coin],
    ) -> Result<DepositRequest> {
        let (mut pool, pair) = self.require_enabled_pool(pool_id)?;
        let (x, y) = pair_amounts(&pair, deposit_coins)?;
        if x == 0 || y == 0 {
            return Err(DexError::InvalidRequestCoins {
                reason: "deposit amounts must be positive".into(),
            });
        }
        let (reserve_x, reserve_y) = self.get_pool_reserves(&pool, &pair);
        math::ensure_max_amount(reserve_x.saturating_add(x))?;
        math::ensure_max_amount(reserve_y.saturating_add(y))?;

        let coins = [
            Coin::new(pair.x_coin_denom.clone(), x),
            Coin::new(pair.y_coin_denom.clone(), y),
        ];
        self.ledger_mut()
            .send_coins(depositor, &Address::global_escrow(), &coins)?;

        let id = pool.next_deposit_request_id();
        let req = DepositRequest {
            id,
            pool_id,
            msg_height: ctx.height,
            depositor: depositor.clone(),
            deposit_coins: coins,
            accepted_coins: [
                Coin::zero(pair.x_coin_denom.clone()),
                Coin::zero(pair.y_coin_denom.clone()),
            ],
            minted_pool_coin: Coin::zero(pool.pool_coin_denom.clone()),
            status: RequestStatus::NotExecuted,
        };
        self.set_pool(&pool)?;
        self.set_deposit_request(&req)?;
        Ok(req)
    }

    /// Escrow pool coins until the next batch redeems them.
    pub fn withdraw(
        &mut self,
        ctx: &BlockContext,
        withdrawer: &Address,
        pool_id: PoolId,
        pool_coin: Coin,
    ) -> Result<WithdrawRequest> {
        let (mut pool, pair) = self.require_enabled_pool(pool_id)?;
        if pool_coin.denom != pool.pool_coin_denom {
            return Err(DexError::InvalidRequestCoins {
                reason: format!(
                    "expected {} pool coin, got {}",
                    pool.pool_coin_denom, pool_coin.denom
                ),
            });
        }
        if pool_coin.is_zero() {
            return Err(DexError::InvalidRequestCoins {
                reason: "pool coin amount must be positive".into(),
            });
        }

        self.ledger_mut().send_coins(
            withdrawer,
            &Address::global_escrow(),
            std::slice::from_ref(&pool_coin),
        )?;

        let id = pool.next_withdraw_request_id();
        let req = WithdrawRequest {
            id,
            pool_id,
            msg_height: ctx.height,
            withdrawer: withdrawer.clone(),
            pool_coin,
            withdrawn_coins: [
                Coin::zero(pair.x_coin_denom.clone()),
                Coin::zero(pair.y_coin_denom.clone()),
            ],
            status: RequestStatus::NotExecuted,
        };
        self.set_pool(&pool)?;
        self.set_withdraw_request(&req)?;
        Ok(req)
    }

    /// Place a limit order that rests until filled, cancelled or expired.
    ///
    /// `XToY` orders buy `amount` Y paying at most `price` X per Y and
    /// escrow `ceil(amount × price)` X. `YToX` orders sell `amount` Y and
    /// escrow it.
    #[allow(clippy::too_many_arguments)]
    pub fn limit_order(
        &mut self,
        ctx: &BlockContext,
        orderer: &Address,
        pair_id: PairId,
        direction: SwapDirection,
        price: Decimal,
        amount: Amount,
        lifespan: Duration,
    ) -> Result<Order> {
        let mut pair = self.require_pair(pair_id)?;
        if price <= Decimal::ZERO || !math::has_valid_precision(price) {
            return Err(DexError::InvalidOrder {
                reason: format!("invalid price {price}"),
            });
        }
        if amount == 0 {
            return Err(DexError::InvalidOrder {
                reason: "amount must be positive".into(),
            });
        }
        math::ensure_max_amount(amount)?;
        let max = self.params().max_order_lifespan;
        if lifespan > max {
            return Err(DexError::LifespanTooLong {
                requested_secs: lifespan.as_secs(),
                max_secs: max.as_secs(),
            });
        }
        let expire_at = chrono::Duration::from_std(lifespan)
            .ok()
            .and_then(|d| ctx.time.checked_add_signed(d))
            .ok_or_else(|| DexError::arithmetic("order expiration overflows"))?;
        // rejects orderer addresses that cannot be indexed
        keys::order_index_key_prefix(orderer)?;

        let (offer_denom, receive_denom) = match direction {
            SwapDirection::XToY => (&pair.x_coin_denom, &pair.y_coin_denom),
            SwapDirection::YToX => (&pair.y_coin_denom, &pair.x_coin_denom),
        };
        let offer_coin = Coin::new(
            offer_denom.clone(),
            math::ensure_max_amount(Order::offer_amount(direction, price, amount)?)?,
        );
        let received_coin = Coin::zero(receive_denom.clone());

        self.ledger_mut().send_coins(
            orderer,
            &pair.escrow_address,
            std::slice::from_ref(&offer_coin),
        )?;

        let id = pair.next_order_id();
        let order = Order {
            id,
            pair_id,
            msg_height: ctx.height,
            orderer: orderer.clone(),
            direction,
            offer_coin: offer_coin.clone(),
            remaining_offer_coin: offer_coin,
            received_coin,
            price,
            amount,
            open_amount: amount,
            batch_id: pair.current_batch_id,
            expire_at,
            status: OrderStatus::NotExecuted,
        };
        self.set_pair(&pair)?;
        self.set_order(&order)?;
        Ok(order)
    }

    /// Cancel an open order and refund its remaining offer coin.
    ///
    /// An order cannot be cancelled in the batch it was placed in.
    pub fn cancel_order(&mut self, orderer: &Address, pair_id: PairId, order_id: OrderId) -> Result<()> {
        let pair = self.require_pair(pair_id)?;
        let order = self
            .get_order(pair_id, order_id)?
            .ok_or(DexError::OrderNotFound { pair_id, order_id })?;
        if order.orderer != *orderer {
            return Err(DexError::WrongOrderer(orderer.clone()));
        }
        if order.status.is_terminal() {
            return Err(DexError::OrderAlreadyFinished(order_id));
        }
        if order.batch_id == pair.current_batch_id {
            return Err(DexError::SameBatch {
                order_id,
                batch_id: pair.current_batch_id,
            });
        }
        self.finish_order(order, OrderStatus::Canceled)
    }
}
