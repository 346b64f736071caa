//! Coin balances held outside the store.
//!
//! The engine moves coins only through the [`Ledger`] trait. Every call is
//! atomic: it either applies all of its coins or none of them.
//!
//! [`BankLedger`] is the in-memory implementation. It tracks balances per
//! `(address, denom)` and the total supply per denom, and can check the
//! conservation invariant:
//! ```text
//! ∀ denom: Σ balances(denom) == supply(denom)
//! ```

use std::collections::BTreeMap;

use batchdex_types::{Address, Amount, Coin, DexError, Result};

/// Balance keeping for module and user accounts.
pub trait Ledger {
    fn balance(&self, address: &Address, denom: &str) -> Amount;

    /// Total amount of `denom` in existence.
    fn supply(&self, denom: &str) -> Amount;

    fn send_coins(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<()>;

    fn mint_coins(&mut self, to: &Address, coins: &[Coin]) -> Result<()>;

    fn burn_coins(&mut self, from: &Address, coins: &[Coin]) -> Result<()>;
}

/// Sum coins by denomination, skipping zero amounts.
fn totals(coins: &[Coin]) -> Result<BTreeMap<&str, Amount>> {
    let mut totals: BTreeMap<&str, Amount> = BTreeMap::new();
    for coin in coins.iter().filter(|c| c.is_positive()) {
        let total = totals.entry(coin.denom.as_str()).or_default();
        *total = total
            .checked_add(coin.amount)
            .ok_or_else(|| DexError::LedgerOverflow {
                denom: coin.denom.clone(),
            })?;
    }
    Ok(totals)
}

/// In-memory [`Ledger`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankLedger {
    /// `(address, denom) → amount`; zero balances are not stored.
    balances: BTreeMap<(Address, String), Amount>,
    supply: BTreeMap<String, Amount>,
}

impl BankLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All non-zero balances of `address`, ordered by denom.
    #[must_use]
    pub fn balances_of(&self, address: &Address) -> Vec<Coin> {
        self.balances
            .iter()
            .filter(|((owner, _), _)| owner == address)
            .map(|((_, denom), amount)| Coin::new(denom.clone(), *amount))
            .collect()
    }

    /// Every denom with a non-zero supply.
    #[must_use]
    pub fn denoms(&self) -> Vec<String> {
        self.supply.keys().cloned().collect()
    }

    /// Sum of every account's balance of `denom`.
    pub fn total_balances(&self, denom: &str) -> Result<Amount> {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .try_fold(0u128, |acc, (_, amount)| {
                acc.checked_add(*amount).ok_or_else(|| DexError::LedgerOverflow {
                    denom: denom.to_string(),
                })
            })
    }

    /// Check that balances add up to the recorded supply for every denom.
    pub fn verify_supply(&self) -> Result<()> {
        let mut denoms: Vec<&str> = self.supply.keys().map(String::as_str).collect();
        denoms.extend(self.balances.keys().map(|(_, d)| d.as_str()));
        denoms.sort_unstable();
        denoms.dedup();

        for denom in denoms {
            let expected = self.supply(denom);
            let actual = self.total_balances(denom)?;
            if actual != expected {
                return Err(DexError::SupplyInvariantViolation {
                    reason: format!("{denom}: balances sum to {actual}, supply is {expected}"),
                });
            }
        }
        Ok(())
    }

    fn check_available(&self, address: &Address, totals: &BTreeMap<&str, Amount>) -> Result<()> {
        for (denom, needed) in totals {
            let available = self.balance(address, denom);
            if available < *needed {
                return Err(DexError::InsufficientFunds {
                    address: address.clone(),
                    denom: (*denom).to_string(),
                    needed: *needed,
                    available,
                });
            }
        }
        Ok(())
    }

    fn credit(&mut self, address: &Address, denom: &str, amount: Amount) -> Result<()> {
        let entry = self
            .balances
            .entry((address.clone(), denom.to_string()))
            .or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| DexError::LedgerOverflow {
                denom: denom.to_string(),
            })?;
        Ok(())
    }

    /// Callers must have checked availability first.
    fn debit(&mut self, address: &Address, denom: &str, amount: Amount) {
        let key = (address.clone(), denom.to_string());
        if let Some(balance) = self.balances.get_mut(&key) {
            *balance = balance.saturating_sub(amount);
            if *balance == 0 {
                self.balances.remove(&key);
            }
        }
    }
}

impl Ledger for BankLedger {
    fn balance(&self, address: &Address, denom: &str) -> Amount {
        self.balances
            .get(&(address.clone(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, denom: &str) -> Amount {
        self.supply.get(denom).copied().unwrap_or(0)
    }

    fn send_coins(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> Result<()> {
        let totals = totals(coins)?;
        self.check_available(from, &totals)?;
        if from == to {
            return Ok(());
        }
        for (denom, amount) in &totals {
            let headroom = Amount::MAX - self.balance(to, denom);
            if *amount > headroom {
                return Err(DexError::LedgerOverflow {
                    denom: (*denom).to_string(),
                });
            }
        }
        for (denom, amount) in totals {
            self.debit(from, denom, amount);
            self.credit(to, denom, amount)?;
        }
        Ok(())
    }

    fn mint_coins(&mut self, to: &Address, coins: &[Coin]) -> Result<()> {
        let totals = totals(coins)?;
        for (denom, amount) in &totals {
            if self.supply(denom).checked_add(*amount).is_none() {
                return Err(DexError::LedgerOverflow {
                    denom: (*denom).to_string(),
                });
            }
        }
        for (denom, amount) in totals {
            let supply = self.supply.entry(denom.to_string()).or_default();
            *supply += amount;
            self.credit(to, denom, amount)?;
        }
        Ok(())
    }

    fn burn_coins(&mut self, from: &Address, coins: &[Coin]) -> Result<()> {
        let totals = totals(coins)?;
        self.check_available(from, &totals)?;
        for (denom, amount) in totals {
            self.debit(from, denom, amount);
            if let Some(supply) = self.supply.get_mut(denom) {
                *supply = supply.saturating_sub(amount);
                if *supply == 0 {
                    self.supply.remove(denom);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("dex1alice")
    }

    fn bob() -> Address {
        Address::new("dex1bob")
    }

    #[test]
    fn mint_increases_balance_and_supply() {
        let mut ledger = BankLedger::new();
        ledger.mint_coins(&alice(), &[Coin::new("denom1", 1_000)]).unwrap();
        assert_eq!(ledger.balance(&alice(), "denom1"), 1_000);
        assert_eq!(ledger.supply("denom1"), 1_000);
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn send_moves_funds() {
        let mut ledger = BankLedger::new();
        ledger.mint_coins(&alice(), &[Coin::new("denom1", 1_000)]).unwrap();
        ledger
            .send_coins(&alice(), &bob(), &[Coin::new("denom1", 400)])
            .unwrap();
        assert_eq!(ledger.balance(&alice(), "denom1"), 600);
        assert_eq!(ledger.balance(&bob(), "denom1"), 400);
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn send_is_all_or_nothing() {
        let mut ledger = BankLedger::new();
        ledger
            .mint_coins(&alice(), &[Coin::new("denom1", 100), Coin::new("denom2", 5)])
            .unwrap();
        let before = ledger.clone();
        let err = ledger
            .send_coins(
                &alice(),
                &bob(),
                &[Coin::new("denom1", 50), Coin::new("denom2", 10)],
            )
            .unwrap_err();
        assert!(matches!(err, DexError::InsufficientFunds { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn duplicate_denoms_are_summed() {
        let mut ledger = BankLedger::new();
        ledger.mint_coins(&alice(), &[Coin::new("denom1", 100)]).unwrap();
        assert!(
            ledger
                .send_coins(
                    &alice(),
                    &bob(),
                    &[Coin::new("denom1", 60), Coin::new("denom1", 60)],
                )
                .is_err()
        );
    }

    #[test]
    fn burn_reduces_supply() {
        let mut ledger = BankLedger::new();
        ledger.mint_coins(&alice(), &[Coin::new("pool1", 10)]).unwrap();
        ledger.burn_coins(&alice(), &[Coin::new("pool1", 4)]).unwrap();
        assert_eq!(ledger.supply("pool1"), 6);
        ledger.burn_coins(&alice(), &[Coin::new("pool1", 6)]).unwrap();
        assert_eq!(ledger.supply("pool1"), 0);
        assert!(ledger.denoms().is_empty());
        assert!(ledger.burn_coins(&alice(), &[Coin::new("pool1", 1)]).is_err());
    }

    #[test]
    fn zero_coins_are_ignored() {
        let mut ledger = BankLedger::new();
        ledger
            .send_coins(&alice(), &bob(), &[Coin::zero("denom1")])
            .unwrap();
        assert!(ledger.balances_of(&bob()).is_empty());
    }

    #[test]
    fn mint_overflow_is_rejected() {
        let mut ledger = BankLedger::new();
        ledger
            .mint_coins(&alice(), &[Coin::new("denom1", Amount::MAX)])
            .unwrap();
        let err = ledger
            .mint_coins(&bob(), &[Coin::new("denom1", 1)])
            .unwrap_err();
        assert!(matches!(err, DexError::LedgerOverflow { .. }));
        assert_eq!(ledger.balance(&bob(), "denom1"), 0);
    }

    #[test]
    fn balances_of_lists_denoms_in_order() {
        let mut ledger = BankLedger::new();
        ledger
            .mint_coins(&alice(), &[Coin::new("denom2", 2), Coin::new("denom1", 1)])
            .unwrap();
        assert_eq!(
            ledger.balances_of(&alice()),
            vec![Coin::new("denom1", 1), Coin::new("denom2", 2)]
        );
    }
}
