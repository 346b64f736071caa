//! Constant-product pool math.
//!
//! A pool with reserves `(rx, ry)` quotes `p0 = rx / ry`. During matching it
//! offers liquidity at the price levels already present in the book:
//!
//! - above `p0` it sells Y; the cumulative amount sold up to level `p` is
//!   `floor(ry × (1 − sqrt(p0 / p)))`, which equals `ry − sqrt(k / p)`;
//! - below `p0` it buys Y; the cumulative X spent down to level `p` is
//!   `floor(rx × (1 − sqrt(p / p0)))`, which equals `rx − sqrt(k × p)`.
//!
//! Each level receives the increment over the previous one. Deposits and
//! withdrawals are priced pro rata against the pool coin supply.

use batchdex_types::{Address, Amount, DexError, PoolId, Result, SwapDirection, math};
use rust_decimal::Decimal;

use crate::BookOrder;

/// Reserves of a pool at the start of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub pool_id: PoolId,
    pub reserve_address: Address,
    pub reserve_x: Amount,
    pub reserve_y: Amount,
}

impl PoolState {
    /// `rx / ry`, or `None` while either reserve is empty.
    pub fn price(&self) -> Result<Option<Decimal>> {
        if self.reserve_x == 0 || self.reserve_y == 0 {
            return Ok(None);
        }
        math::ratio(self.reserve_x, self.reserve_y).map(Some)
    }
}

fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b)
        .ok_or_else(|| DexError::arithmetic(format!("{a} / {b} is undefined")))
}

/// Orders the pool places at the given book price levels.
///
/// Sell orders come first in ascending price, then buy orders in
/// descending price. Levels that would receive nothing are skipped.
pub fn pool_orders(pool: &PoolState, prices: &[Decimal]) -> Result<Vec<BookOrder>> {
    let Some(pool_price) = pool.price()? else {
        return Ok(vec![]);
    };

    let mut above: Vec<Decimal> = prices.iter().copied().filter(|p| *p > pool_price).collect();
    above.sort();
    above.dedup();
    let mut below: Vec<Decimal> = prices
        .iter()
        .copied()
        .filter(|p| *p < pool_price && p.is_sign_positive() && !p.is_zero())
        .collect();
    below.sort_by(|a, b| b.cmp(a));
    below.dedup();

    let mut orders = Vec::new();

    let mut sold: Amount = 0;
    for price in above {
        let remaining_share = math::sqrt(checked_div(pool_price, price)?)?;
        let cumulative = math::mul_floor(pool.reserve_y, Decimal::ONE - remaining_share)?;
        if cumulative > sold {
            orders.push(BookOrder::from_pool(
                pool.pool_id,
                pool.reserve_address.clone(),
                SwapDirection::YToX,
                price,
                cumulative - sold,
            ));
            sold = cumulative;
        }
    }

    let mut spent: Amount = 0;
    for price in below {
        let remaining_share = math::sqrt(checked_div(price, pool_price)?)?;
        let cumulative = math::mul_floor(pool.reserve_x, Decimal::ONE - remaining_share)?;
        if cumulative > spent {
            let amount = math::div_floor(cumulative - spent, price)?;
            if amount > 0 {
                orders.push(BookOrder::from_pool(
                    pool.pool_id,
                    pool.reserve_address.clone(),
                    SwapDirection::XToY,
                    price,
                    amount,
                ));
            }
            spent = cumulative;
        }
    }

    Ok(orders)
}

/// Result of a successful deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    pub accepted_x: Amount,
    pub accepted_y: Amount,
    pub minted: Amount,
}

/// Price a deposit of `(deposit_x, deposit_y)` against the pool.
///
/// `None` means the deposit cannot be accepted and must be refunded.
pub fn deposit_outcome(
    reserve_x: Amount,
    reserve_y: Amount,
    pool_coin_supply: Amount,
    deposit_x: Amount,
    deposit_y: Amount,
) -> Result<Option<DepositOutcome>> {
    if reserve_x == 0 || reserve_y == 0 || pool_coin_supply == 0 {
        return Ok(None);
    }
    let ratio = math::ratio(deposit_x, reserve_x)?.min(math::ratio(deposit_y, reserve_y)?);
    let minted = math::mul_floor(pool_coin_supply, ratio)?;
    if minted == 0 {
        return Ok(None);
    }
    Ok(Some(DepositOutcome {
        accepted_x: math::mul_ceil(reserve_x, ratio)?.min(deposit_x),
        accepted_y: math::mul_ceil(reserve_y, ratio)?.min(deposit_y),
        minted,
    }))
}

/// Result of a successful withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub withdrawn_x: Amount,
    pub withdrawn_y: Amount,
    /// The whole supply was redeemed; the pool must be disabled.
    pub drains_pool: bool,
}

/// Price a withdrawal of `pool_coin` pool coins.
///
/// `None` means the withdrawal cannot be paid and must be refunded.
pub fn withdraw_outcome(
    reserve_x: Amount,
    reserve_y: Amount,
    pool_coin_supply: Amount,
    pool_coin: Amount,
) -> Result<Option<WithdrawOutcome>> {
    if pool_coin_supply == 0 || pool_coin == 0 || pool_coin > pool_coin_supply {
        return Ok(None);
    }
    if pool_coin == pool_coin_supply {
        return Ok(Some(WithdrawOutcome {
            withdrawn_x: reserve_x,
            withdrawn_y: reserve_y,
            drains_pool: true,
        }));
    }
    let withdrawn_x = math::mul_div_floor(reserve_x, pool_coin, pool_coin_supply)?;
    let withdrawn_y = math::mul_div_floor(reserve_y, pool_coin, pool_coin_supply)?;
    if withdrawn_x == 0 && withdrawn_y == 0 {
        return Ok(None);
    }
    Ok(Some(WithdrawOutcome {
        withdrawn_x,
        withdrawn_y,
        drains_pool: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pool(rx: Amount, ry: Amount) -> PoolState {
        PoolState {
            pool_id: PoolId(1),
            reserve_address: Address::pool_reserve(PoolId(1)),
            reserve_x: rx,
            reserve_y: ry,
        }
    }

    #[test]
    fn empty_pool_places_no_orders() {
        assert!(pool_orders(&pool(0, 100), &[dec("1")]).unwrap().is_empty());
        assert!(pool(100, 0).price().unwrap().is_none());
    }

    #[test]
    fn pool_sells_above_and_buys_below_its_price() {
        // p0 = 1, k = 1e12
        let state = pool(1_000_000, 1_000_000);
        let orders = pool_orders(&state, &[dec("4"), dec("1"), dec("0.25")]).unwrap();
        assert_eq!(orders.len(), 2);

        let sell = &orders[0];
        assert_eq!(sell.direction, SwapDirection::YToX);
        assert_eq!(sell.price, dec("4"));
        // ry - sqrt(k / 4) = 1e6 - 5e5
        assert!((499_999..=500_000).contains(&sell.amount));

        let buy = &orders[1];
        assert_eq!(buy.direction, SwapDirection::XToY);
        assert_eq!(buy.price, dec("0.25"));
        // rx - sqrt(k × 0.25) = 5e5 X, which buys 2e6 Y at 0.25
        assert!((1_999_996..=2_000_000).contains(&buy.amount));
    }

    #[test]
    fn sell_levels_take_increments() {
        let state = pool(1_000_000, 1_000_000);
        let orders = pool_orders(&state, &[dec("4"), dec("16")]).unwrap();
        // cumulative 500_000 at 4, 750_000 at 16
        assert_eq!(orders.len(), 2);
        let total: Amount = orders.iter().map(|o| o.amount).sum();
        assert!((749_999..=750_000).contains(&total));
        assert!(orders[0].price < orders[1].price);
        assert!(orders.iter().all(|o| o.open_amount == o.amount));
    }

    #[test]
    fn pool_orders_stay_within_reserves() {
        let state = pool(1_000, 3_000);
        let prices: Vec<Decimal> = (1..200).map(|i| Decimal::new(i, 2)).collect();
        let orders = pool_orders(&state, &prices).unwrap();
        let sold: Amount = orders
            .iter()
            .filter(|o| o.direction == SwapDirection::YToX)
            .map(|o| o.amount)
            .sum();
        assert!(sold < 3_000);
        let spent: Decimal = orders
            .iter()
            .filter(|o| o.direction == SwapDirection::XToY)
            .map(|o| Decimal::from(o.amount) * o.price)
            .sum();
        assert!(spent < Decimal::from(1_000));
    }

    #[test]
    fn deposit_at_pool_ratio() {
        let outcome = deposit_outcome(1_000, 2_000, 100, 100, 200).unwrap().unwrap();
        assert_eq!(
            outcome,
            DepositOutcome {
                accepted_x: 100,
                accepted_y: 200,
                minted: 10,
            }
        );
    }

    #[test]
    fn deposit_excess_is_not_accepted() {
        let outcome = deposit_outcome(1_000, 2_000, 100, 100, 500).unwrap().unwrap();
        assert_eq!(outcome.accepted_x, 100);
        assert_eq!(outcome.accepted_y, 200);
        assert_eq!(outcome.minted, 10);
    }

    #[test]
    fn deposit_too_small_to_mint_fails() {
        assert!(deposit_outcome(1_000_000, 1_000_000, 100, 1, 1).unwrap().is_none());
        assert!(deposit_outcome(0, 1_000, 100, 1, 1).unwrap().is_none());
        assert!(deposit_outcome(1_000, 1_000, 0, 1, 1).unwrap().is_none());
    }

    #[test]
    fn partial_withdraw_is_pro_rata() {
        let outcome = withdraw_outcome(1_000, 2_000, 100, 10).unwrap().unwrap();
        assert_eq!(outcome.withdrawn_x, 100);
        assert_eq!(outcome.withdrawn_y, 200);
        assert!(!outcome.drains_pool);
    }

    #[test]
    fn full_withdraw_drains_pool() {
        let outcome = withdraw_outcome(1_001, 2_003, 100, 100).unwrap().unwrap();
        assert_eq!(outcome.withdrawn_x, 1_001);
        assert_eq!(outcome.withdrawn_y, 2_003);
        assert!(outcome.drains_pool);
    }

    #[test]
    fn invalid_withdrawals_fail() {
        assert!(withdraw_outcome(1_000, 1_000, 100, 101).unwrap().is_none());
        assert!(withdraw_outcome(1_000, 1_000, 0, 1).unwrap().is_none());
        assert!(withdraw_outcome(10, 10, 1_000, 1).unwrap().is_none());
    }
}
