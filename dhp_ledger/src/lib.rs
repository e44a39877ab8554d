// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Points ledger
//!
//! Running reward balances for donors. Each donor holds one balance per
//! receiver they have ever transacted with; balances are credited when an
//! offer is accepted and when a pickup completes, and debited only by reward
//! redemption.
//!
//! Every mutation also appends to an audit history. The stored balances are
//! never a cached total that can drift: folding the history always reproduces
//! them, and [`PointsLedger::audit`] checks exactly that.
//!
//! The ledger is generic over the party key so this crate stays a leaf with no
//! knowledge of how the rest of the system identifies donors and receivers.

use std::{collections::HashMap, hash::Hash};

use serde::{Deserialize, Serialize};

/// Errors returned by ledger mutations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Credits and debits must move a positive amount.
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: u64 },

    /// Redemption would push a balance below zero.
    #[error("insufficient points: balance is {balance}, tried to redeem {requested}")]
    InsufficientPoints { balance: u64, requested: u64 },
}

/// Why points were earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarnReason {
    /// Base credit at offer acceptance: quantity times the receiver-kind
    /// multiplier.
    OfferAccepted,
    /// Bonus credit granted by the receiver at pickup completion.
    PickupCompleted,
}

/// One entry of the append-only audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent<K> {
    Earned {
        donor: K,
        counterparty: K,
        amount: u64,
        reason: EarnReason,
        at_ms: u64,
    },
    Redeemed {
        donor: K,
        counterparty: K,
        amount: u64,
        at_ms: u64,
    },
}

/// Mutable balances plus their audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsLedger<K: Eq + Hash> {
    balances: HashMap<K, HashMap<K, u64>>,
    history: Vec<LedgerEvent<K>>,
}

impl<K: Eq + Hash> Default for PointsLedger<K> {
    fn default() -> Self {
        Self {
            balances: HashMap::new(),
            history: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> PointsLedger<K> {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// Adds `amount` to the `(donor, counterparty)` balance, creating the pair
    /// if absent. Returns the new pair balance.
    pub fn credit(
        &mut self,
        donor: K,
        counterparty: K,
        amount: u64,
        reason: EarnReason,
        at_ms: u64,
    ) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        let balance = self
            .balances
            .entry(donor.clone())
            .or_default()
            .entry(counterparty.clone())
            .or_insert(0);
        *balance = balance.saturating_add(amount);
        let new_balance = *balance;

        self.history.push(LedgerEvent::Earned {
            donor,
            counterparty,
            amount,
            reason,
            at_ms,
        });
        Ok(new_balance)
    }

    /// Removes `amount` from the `(donor, counterparty)` balance. Fails with
    /// [`LedgerError::InsufficientPoints`] if the balance cannot cover it; the
    /// result is never negative. Returns the new pair balance.
    pub fn debit(
        &mut self,
        donor: K,
        counterparty: K,
        amount: u64,
        at_ms: u64,
    ) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        let balance = self
            .balances
            .get_mut(&donor)
            .and_then(|pairs| pairs.get_mut(&counterparty));
        let Some(balance) = balance else {
            return Err(LedgerError::InsufficientPoints {
                balance: 0,
                requested: amount,
            });
        };

        match balance.checked_sub(amount) {
            Some(remaining) => {
                *balance = remaining;
                self.history.push(LedgerEvent::Redeemed {
                    donor,
                    counterparty,
                    amount,
                    at_ms,
                });
                Ok(remaining)
            }
            None => Err(LedgerError::InsufficientPoints {
                balance: *balance,
                requested: amount,
            }),
        }
    }

    /// Balance for one `(donor, counterparty)` pair. Missing pairs read as 0.
    pub fn pair_balance(&self, donor: &K, counterparty: &K) -> u64 {
        self.balances
            .get(donor)
            .and_then(|pairs| pairs.get(counterparty))
            .copied()
            .unwrap_or(0)
    }

    /// Aggregate balance for a donor across every counterparty. Read-only.
    pub fn balance(&self, donor: &K) -> u64 {
        self.balances
            .get(donor)
            .map(|pairs| pairs.values().sum())
            .unwrap_or(0)
    }

    /// Per-counterparty balances for a donor.
    pub fn pair_balances(&self, donor: &K) -> impl Iterator<Item = (&K, u64)> {
        self.balances
            .get(donor)
            .into_iter()
            .flat_map(|pairs| pairs.iter().map(|(k, v)| (k, *v)))
    }

    pub fn history(&self) -> &[LedgerEvent<K>] {
        &self.history
    }

    /// Re-derives every balance from the history and compares against the
    /// stored balances. True when nothing has drifted.
    pub fn audit(&self) -> bool {
        let mut rebuilt: HashMap<K, HashMap<K, u64>> = HashMap::new();
        for event in &self.history {
            match event {
                LedgerEvent::Earned {
                    donor,
                    counterparty,
                    amount,
                    ..
                } => {
                    let balance = rebuilt
                        .entry(donor.clone())
                        .or_default()
                        .entry(counterparty.clone())
                        .or_insert(0);
                    *balance = balance.saturating_add(*amount);
                }
                LedgerEvent::Redeemed {
                    donor,
                    counterparty,
                    amount,
                    ..
                } => {
                    let Some(balance) = rebuilt
                        .get_mut(donor)
                        .and_then(|pairs| pairs.get_mut(counterparty))
                    else {
                        return false;
                    };
                    let Some(remaining) = balance.checked_sub(*amount) else {
                        return false;
                    };
                    *balance = remaining;
                }
            }
        }

        for (donor, pairs) in &self.balances {
            for (counterparty, balance) in pairs {
                let derived = rebuilt
                    .get(donor)
                    .and_then(|p| p.get(counterparty))
                    .copied()
                    .unwrap_or(0);
                if derived != *balance {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[fixture]
    fn ledger() -> PointsLedger<&'static str> {
        PointsLedger::new()
    }

    #[rstest]
    fn credit_creates_the_pair(mut ledger: PointsLedger<&'static str>) {
        let balance = ledger
            .credit("donor", "ngo", 50, EarnReason::OfferAccepted, 0)
            .unwrap();
        assert_eq!(balance, 50);
        assert_eq!(ledger.pair_balance(&"donor", &"ngo"), 50);
    }

    #[rstest]
    fn credit_then_debit_restores_the_previous_balance(mut ledger: PointsLedger<&'static str>) {
        ledger
            .credit("donor", "ngo", 30, EarnReason::OfferAccepted, 0)
            .unwrap();
        let before = ledger.balance(&"donor");

        ledger
            .credit("donor", "ngo", 20, EarnReason::PickupCompleted, 1)
            .unwrap();
        ledger.debit("donor", "ngo", 20, 2).unwrap();

        assert_eq!(ledger.balance(&"donor"), before);
        assert!(ledger.audit());
    }

    #[rstest]
    fn zero_amounts_are_rejected(mut ledger: PointsLedger<&'static str>) {
        assert_eq!(
            ledger.credit("donor", "ngo", 0, EarnReason::OfferAccepted, 0),
            Err(LedgerError::InvalidAmount { amount: 0 })
        );
        assert_eq!(
            ledger.debit("donor", "ngo", 0, 0),
            Err(LedgerError::InvalidAmount { amount: 0 })
        );
    }

    #[rstest]
    fn over_debit_fails_and_leaves_the_balance_alone(mut ledger: PointsLedger<&'static str>) {
        ledger
            .credit("donor", "ngo", 10, EarnReason::OfferAccepted, 0)
            .unwrap();

        assert_eq!(
            ledger.debit("donor", "ngo", 11, 1),
            Err(LedgerError::InsufficientPoints {
                balance: 10,
                requested: 11,
            })
        );
        assert_eq!(ledger.pair_balance(&"donor", &"ngo"), 10);
        // pair that never existed
        assert_eq!(
            ledger.debit("donor", "compost", 1, 2),
            Err(LedgerError::InsufficientPoints {
                balance: 0,
                requested: 1,
            })
        );
        assert!(ledger.audit());
    }

    #[rstest]
    fn balance_aggregates_across_counterparties(mut ledger: PointsLedger<&'static str>) {
        ledger
            .credit("donor", "ngo", 25, EarnReason::OfferAccepted, 0)
            .unwrap();
        ledger
            .credit("donor", "compost", 15, EarnReason::OfferAccepted, 1)
            .unwrap();

        assert_eq!(ledger.balance(&"donor"), 40);
        let pairs: HashMap<_, _> = ledger.pair_balances(&"donor").collect();
        assert_eq!(pairs[&"ngo"], 25);
        assert_eq!(pairs[&"compost"], 15);
        // other donors are unaffected
        assert_eq!(ledger.balance(&"other"), 0);
    }

    #[rstest]
    fn history_is_append_only_and_folds_to_the_balances(mut ledger: PointsLedger<&'static str>) {
        ledger
            .credit("donor", "ngo", 25, EarnReason::OfferAccepted, 0)
            .unwrap();
        ledger
            .credit("donor", "ngo", 20, EarnReason::PickupCompleted, 1)
            .unwrap();
        ledger.debit("donor", "ngo", 5, 2).unwrap();
        // failed mutations leave no trace
        ledger.debit("donor", "ngo", 1_000, 3).unwrap_err();

        assert_eq!(ledger.history().len(), 3);
        assert!(ledger.audit());
    }
}
