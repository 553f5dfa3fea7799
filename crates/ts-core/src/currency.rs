//! Currency set and base-currency normalization.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::normalize_currency_code;

/// Default base currency code for new trips.
pub const DEFAULT_BASE_CODE: &str = "INR";

/// Default base currency symbol for new trips.
pub const DEFAULT_BASE_SYMBOL: &str = "₹";

/// A currency with its conversion rate into the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    #[serde(default)]
    pub symbol: String,
    /// Base-currency units per one unit of this currency.
    pub rate: f64,
    #[serde(default)]
    pub is_base: bool,
}

impl Currency {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>, rate: f64) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            rate,
            is_base: false,
        }
    }

    /// A base currency (rate fixed at 1).
    pub fn base(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            rate: 1.0,
            is_base: true,
        }
    }
}

/// Converts `amount` in `code` into the base currency.
///
/// Lenient: an absent or empty code, an empty set, an unknown code and the
/// base currency itself all return `amount` unchanged.
pub fn to_base(amount: f64, code: Option<&str>, currencies: &CurrencySet) -> f64 {
    let Some(code) = code.filter(|c| !c.is_empty()) else {
        return amount;
    };
    match currencies.find(code) {
        Some(currency) if !currency.is_base => amount * currency.rate,
        _ => amount,
    }
}

/// The trip's currencies.
///
/// Mutations keep exactly one base currency whenever the set is non-empty.
/// Deserialized sets are taken as-is, since the engine tolerates any shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencySet(Vec<Currency>);

impl CurrencySet {
    /// A set holding a single base currency.
    pub fn with_base(code: &str, symbol: impl Into<String>) -> Self {
        Self(vec![Currency::base(normalize_currency_code(code), symbol)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&Currency> {
        self.0.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    /// The base currency, if the set has one.
    pub fn base(&self) -> Option<&Currency> {
        self.0.iter().find(|c| c.is_base)
    }

    /// Symbol of the base currency, or an empty string.
    pub fn base_symbol(&self) -> &str {
        self.base().map_or("", |c| c.symbol.as_str())
    }

    /// Symbol for `code`, falling back to the base symbol.
    pub fn symbol_for(&self, code: Option<&str>) -> &str {
        code.and_then(|c| self.find(c))
            .map_or_else(|| self.base_symbol(), |c| c.symbol.as_str())
    }

    /// Converts `amount` in `code` into the base currency. See [`to_base`].
    pub fn to_base(&self, amount: f64, code: Option<&str>) -> f64 {
        to_base(amount, code, self)
    }

    /// Adds a non-base currency. The first currency of an empty set becomes
    /// the base.
    pub fn add(&mut self, mut currency: Currency) -> Result<(), LedgerError> {
        currency.code = normalize_currency_code(&currency.code);
        if currency.code.is_empty() {
            return Err(LedgerError::EmptyField { field: "currency code" });
        }
        if self.contains(&currency.code) {
            return Err(LedgerError::DuplicateCurrency(currency.code));
        }
        if self.0.is_empty() {
            currency.is_base = true;
            currency.rate = 1.0;
        } else {
            validate_rate(&currency.code, currency.rate)?;
            currency.is_base = false;
        }
        self.0.push(currency);
        Ok(())
    }

    /// Makes `code` the single base currency with rate 1.
    ///
    /// Other currencies keep their stored rates.
    pub fn set_base(&mut self, code: &str) -> Result<(), LedgerError> {
        if !self.contains(code) {
            return Err(LedgerError::UnknownCurrency(code.to_string()));
        }
        for currency in &mut self.0 {
            currency.is_base = currency.code == code;
            if currency.is_base {
                currency.rate = 1.0;
            }
        }
        Ok(())
    }

    /// Updates the rate of a non-base currency.
    pub fn set_rate(&mut self, code: &str, rate: f64) -> Result<(), LedgerError> {
        let currency = self
            .0
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_string()))?;
        if currency.is_base {
            return Err(LedgerError::BaseRateFixed(code.to_string()));
        }
        validate_rate(code, rate)?;
        currency.rate = rate;
        Ok(())
    }

    /// Removes a non-base currency. Usage by groups is checked by the caller.
    pub fn remove(&mut self, code: &str) -> Result<Currency, LedgerError> {
        let index = self
            .0
            .iter()
            .position(|c| c.code == code)
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_string()))?;
        if self.0[index].is_base {
            return Err(LedgerError::CannotRemoveBase(code.to_string()));
        }
        Ok(self.0.remove(index))
    }
}

fn validate_rate(code: &str, rate: f64) -> Result<(), LedgerError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidRate {
            code: code.to_string(),
            rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inr_usd() -> CurrencySet {
        let mut set = CurrencySet::with_base("INR", "₹");
        set.add(Currency::new("USD", "$", 80.0)).unwrap();
        set
    }

    #[test]
    fn to_base_converts_foreign_amounts() {
        let set = inr_usd();
        assert!((set.to_base(10.0, Some("USD")) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn to_base_is_lenient() {
        let set = inr_usd();
        assert!((set.to_base(10.0, None) - 10.0).abs() < 1e-9);
        assert!((set.to_base(10.0, Some("")) - 10.0).abs() < 1e-9);
        assert!((set.to_base(10.0, Some("EUR")) - 10.0).abs() < 1e-9);
        assert!((set.to_base(10.0, Some("INR")) - 10.0).abs() < 1e-9);
        assert!((to_base(10.0, Some("USD"), &CurrencySet::default()) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn to_base_ignores_rate_on_base_entry() {
        let set: CurrencySet =
            serde_json::from_str(r#"[{"code": "INR", "rate": 3, "isBase": true}]"#).unwrap();
        assert!((set.to_base(10.0, Some("INR")) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn first_currency_becomes_base() {
        let mut set = CurrencySet::default();
        set.add(Currency::new("eur", "€", 90.0)).unwrap();
        let base = set.base().unwrap();
        assert_eq!(base.code, "EUR");
        assert!((base.rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn add_rejects_duplicates_and_bad_rates() {
        let mut set = inr_usd();
        assert_eq!(
            set.add(Currency::new("usd", "$", 81.0)),
            Err(LedgerError::DuplicateCurrency("USD".to_string()))
        );
        assert!(matches!(
            set.add(Currency::new("EUR", "€", 0.0)),
            Err(LedgerError::InvalidRate { .. })
        ));
        assert!(matches!(
            set.add(Currency::new("EUR", "€", f64::INFINITY)),
            Err(LedgerError::InvalidRate { .. })
        ));
    }

    #[test]
    fn set_base_keeps_exactly_one_base() {
        let mut set = inr_usd();
        set.set_base("USD").unwrap();

        let bases: Vec<_> = set.iter().filter(|c| c.is_base).collect();
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].code, "USD");
        assert!((bases[0].rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(set.base_symbol(), "$");
    }

    #[test]
    fn set_base_rejects_unknown_code() {
        let mut set = inr_usd();
        assert_eq!(
            set.set_base("GBP"),
            Err(LedgerError::UnknownCurrency("GBP".to_string()))
        );
        assert_eq!(set.base().unwrap().code, "INR");
    }

    #[test]
    fn base_rate_cannot_change() {
        let mut set = inr_usd();
        assert_eq!(
            set.set_rate("INR", 2.0),
            Err(LedgerError::BaseRateFixed("INR".to_string()))
        );
        set.set_rate("USD", 83.5).unwrap();
        assert!((set.find("USD").unwrap().rate - 83.5).abs() < f64::EPSILON);
    }

    #[test]
    fn base_cannot_be_removed() {
        let mut set = inr_usd();
        assert_eq!(
            set.remove("INR"),
            Err(LedgerError::CannotRemoveBase("INR".to_string()))
        );
        assert_eq!(set.remove("USD").unwrap().code, "USD");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn symbol_lookup_falls_back_to_base() {
        let set = inr_usd();
        assert_eq!(set.symbol_for(Some("USD")), "$");
        assert_eq!(set.symbol_for(Some("EUR")), "₹");
        assert_eq!(set.symbol_for(None), "₹");
    }
}
