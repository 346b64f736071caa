//! Checked arithmetic between integer amounts and decimal prices.
//!
//! Every conversion is explicit about its rounding direction. None of these
//! helpers saturate: overflow is an error the caller has to handle.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::{Amount, DexError, Result, constants};

/// Convert an integer amount into a `Decimal`.
pub fn to_decimal(amount: Amount) -> Result<Decimal> {
    Decimal::from_u128(amount)
        .ok_or_else(|| DexError::arithmetic(format!("amount {amount} does not fit a decimal")))
}

/// Reject an amount above [`constants::MAX_AMOUNT`].
pub fn ensure_max_amount(amount: Amount) -> Result<Amount> {
    if amount > constants::MAX_AMOUNT {
        return Err(DexError::AmountTooLarge {
            amount,
            max: constants::MAX_AMOUNT,
        });
    }
    Ok(amount)
}

/// Truncate a non-negative decimal into an integer amount.
pub fn floor_amount(value: Decimal) -> Result<Amount> {
    value
        .floor()
        .to_u128()
        .ok_or_else(|| DexError::arithmetic(format!("{value} is not a valid amount")))
}

/// Round a non-negative decimal up into an integer amount.
pub fn ceil_amount(value: Decimal) -> Result<Amount> {
    value
        .ceil()
        .to_u128()
        .ok_or_else(|| DexError::arithmetic(format!("{value} is not a valid amount")))
}

/// `floor(amount × price)`.
pub fn mul_floor(amount: Amount, price: Decimal) -> Result<Amount> {
    let product = to_decimal(amount)?
        .checked_mul(price)
        .ok_or_else(|| DexError::arithmetic(format!("{amount} × {price} overflows")))?;
    floor_amount(product)
}

/// `ceil(amount × price)`.
pub fn mul_ceil(amount: Amount, price: Decimal) -> Result<Amount> {
    let product = to_decimal(amount)?
        .checked_mul(price)
        .ok_or_else(|| DexError::arithmetic(format!("{amount} × {price} overflows")))?;
    ceil_amount(product)
}

/// `floor(amount / price)`.
pub fn div_floor(amount: Amount, price: Decimal) -> Result<Amount> {
    let quotient = to_decimal(amount)?
        .checked_div(price)
        .ok_or_else(|| DexError::arithmetic(format!("{amount} / {price} is undefined")))?;
    floor_amount(quotient)
}

/// `floor(a × b / c)`, exact in integers when `a × b` fits a `u128`.
pub fn mul_div_floor(a: Amount, b: Amount, c: Amount) -> Result<Amount> {
    if c == 0 {
        return Err(DexError::arithmetic(format!("{a} × {b} / 0 is undefined")));
    }
    match a.checked_mul(b) {
        Some(product) => Ok(product / c),
        None => mul_floor(a, ratio(b, c)?),
    }
}

/// `numerator / denominator` as a decimal.
pub fn ratio(numerator: Amount, denominator: Amount) -> Result<Decimal> {
    to_decimal(numerator)?
        .checked_div(to_decimal(denominator)?)
        .ok_or_else(|| DexError::arithmetic(format!("{numerator} / {denominator} is undefined")))
}

/// Square root of a non-negative decimal.
pub fn sqrt(value: Decimal) -> Result<Decimal> {
    value
        .sqrt()
        .ok_or_else(|| DexError::arithmetic(format!("sqrt({value}) is undefined")))
}

/// Round a price to the engine's price precision (half-even).
#[must_use]
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(constants::PRICE_PRECISION, RoundingStrategy::MidpointNearestEven)
}

/// Whether the price carries no more than [`constants::PRICE_PRECISION`]
/// fractional digits once trailing zeros are dropped.
#[must_use]
pub fn has_valid_precision(price: Decimal) -> bool {
    price.normalize().scale() <= constants::PRICE_PRECISION
}
