//! Validated edits to a ledger snapshot.
//!
//! The engine tolerates any snapshot; these operations are where model
//! invariants are enforced. Each operation validates first and only then
//! mutates, so a refused edit leaves the snapshot untouched.

use crate::currency::{Currency, CurrencySet};
use crate::error::LedgerError;
use crate::model::{ExistingDebt, ExpenseGroup, LedgerSnapshot, Participant, color_for_index};
use crate::settlement::SETTLEMENT_EPSILON;
use crate::types::{DebtId, GroupId, ParticipantId, normalize_currency_code};

/// A trip never drops below this many participants.
pub const MIN_PARTICIPANTS: usize = 2;

impl LedgerSnapshot {
    /// Renames the trip.
    pub fn rename_trip(&mut self, name: &str) -> Result<(), LedgerError> {
        self.name = non_empty(name, "trip name")?;
        Ok(())
    }

    /// Adds a participant, assigning the next palette color.
    pub fn add_participant(
        &mut self,
        id: ParticipantId,
        name: &str,
    ) -> Result<&Participant, LedgerError> {
        let name = non_empty(name, "participant name")?;
        if self.participant(&id).is_some() {
            return Err(LedgerError::DuplicateParticipant(id));
        }
        let color = color_for_index(self.participants.len());
        self.participants.push(Participant::new(id, name, color));
        Ok(&self.participants[self.participants.len() - 1])
    }

    pub fn rename_participant(&mut self, id: &ParticipantId, name: &str) -> Result<(), LedgerError> {
        let name = non_empty(name, "participant name")?;
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;
        participant.name = name;
        Ok(())
    }

    /// Removes a participant and any existing debts naming them.
    ///
    /// Groups that reference the participant are kept; the engine ignores
    /// the dangling id.
    pub fn remove_participant(&mut self, id: &ParticipantId) -> Result<Participant, LedgerError> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;
        if self.participants.len() <= MIN_PARTICIPANTS {
            return Err(LedgerError::TooFewParticipants {
                min: MIN_PARTICIPANTS,
            });
        }
        let removed = self.participants.remove(index);
        self.existing_debts.retain(|d| !d.involves(id));
        Ok(removed)
    }

    pub fn add_currency(&mut self, currency: Currency) -> Result<(), LedgerError> {
        self.currencies.add(currency)
    }

    /// Removes a currency that no group is denominated in.
    pub fn remove_currency(&mut self, code: &str) -> Result<Currency, LedgerError> {
        let code = normalize_currency_code(code);
        let groups = self.groups.iter().filter(|g| g.uses_currency(&code)).count();
        if groups > 0 {
            return Err(LedgerError::CurrencyInUse { code, groups });
        }
        self.currencies.remove(&code)
    }

    pub fn set_base_currency(&mut self, code: &str) -> Result<(), LedgerError> {
        self.currencies.set_base(&normalize_currency_code(code))
    }

    /// Updates a rate, refusing one that would push an existing group's
    /// base-currency amounts out of range.
    pub fn set_currency_rate(&mut self, code: &str, rate: f64) -> Result<(), LedgerError> {
        let code = normalize_currency_code(code);
        let mut currencies = self.currencies.clone();
        currencies.set_rate(&code, rate)?;
        for group in self.groups.iter().filter(|g| g.uses_currency(&code)) {
            check_base_amounts(group, &currencies)?;
        }
        self.currencies = currencies;
        Ok(())
    }

    pub fn add_group(&mut self, group: ExpenseGroup) -> Result<(), LedgerError> {
        if self.group(&group.id).is_some() {
            return Err(LedgerError::DuplicateGroup(group.id));
        }
        let group = self.validate_group(group)?;
        self.groups.push(group);
        Ok(())
    }

    /// Replaces the stored group with the same id.
    pub fn replace_group(&mut self, group: ExpenseGroup) -> Result<(), LedgerError> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == group.id)
            .ok_or_else(|| LedgerError::UnknownGroup(group.id.clone()))?;
        let group = self.validate_group(group)?;
        self.groups[index] = group;
        Ok(())
    }

    pub fn remove_group(&mut self, id: &GroupId) -> Result<ExpenseGroup, LedgerError> {
        let index = self
            .groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| LedgerError::UnknownGroup(id.clone()))?;
        Ok(self.groups.remove(index))
    }

    pub fn add_debt(&mut self, debt: ExistingDebt) -> Result<(), LedgerError> {
        if self.existing_debts.iter().any(|d| d.id == debt.id) {
            return Err(LedgerError::DuplicateDebt(debt.id));
        }
        if debt.from == debt.to {
            return Err(LedgerError::SelfDebt(debt.from));
        }
        self.require_participant(&debt.from)?;
        self.require_participant(&debt.to)?;
        if !debt.amount.is_finite() || debt.amount <= SETTLEMENT_EPSILON {
            return Err(LedgerError::InvalidAmount {
                field: "debt amount",
                value: debt.amount,
            });
        }
        self.existing_debts.push(debt);
        Ok(())
    }

    pub fn remove_debt(&mut self, id: &DebtId) -> Result<ExistingDebt, LedgerError> {
        let index = self
            .existing_debts
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| LedgerError::UnknownDebt(id.clone()))?;
        Ok(self.existing_debts.remove(index))
    }

    /// Clears all groups and existing debts, keeping people and currencies.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.existing_debts.clear();
    }

    fn require_participant(&self, id: &ParticipantId) -> Result<(), LedgerError> {
        if self.participant(id).is_none() {
            return Err(LedgerError::UnknownParticipant(id.clone()));
        }
        Ok(())
    }

    fn validate_group(&self, mut group: ExpenseGroup) -> Result<ExpenseGroup, LedgerError> {
        self.require_participant(&group.paid_by)?;
        if !group.total.is_finite() || group.total < 0.0 {
            return Err(LedgerError::InvalidAmount {
                field: "group total",
                value: group.total,
            });
        }
        for (participant, share) in &group.shares {
            self.require_participant(participant)?;
            if !share.is_finite() || *share < 0.0 {
                return Err(LedgerError::InvalidAmount {
                    field: "share",
                    value: *share,
                });
            }
        }
        if let Some(code) = group.currency.take() {
            let code = normalize_currency_code(&code);
            if !self.currencies.contains(&code) {
                return Err(LedgerError::UnknownCurrency(code));
            }
            group.currency = Some(code);
        }
        check_base_amounts(&group, &self.currencies)?;
        group.label = group.label.trim().to_string();
        Ok(group)
    }
}

/// Base-currency amounts must stay finite, or balances stop summing.
fn check_base_amounts(group: &ExpenseGroup, currencies: &CurrencySet) -> Result<(), LedgerError> {
    let code = group.currency.as_deref();
    let total = currencies.to_base(group.total, code);
    if !total.is_finite() {
        return Err(LedgerError::InvalidAmount {
            field: "group total in base currency",
            value: total,
        });
    }
    for share in group.shares.values() {
        let share = currencies.to_base(*share, code);
        if !share.is_finite() {
            return Err(LedgerError::InvalidAmount {
                field: "share in base currency",
                value: share,
            });
        }
    }
    Ok(())
}

fn non_empty(value: &str, field: &'static str) -> Result<String, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::EmptyField { field });
    }
    Ok(value.to_string())
}
