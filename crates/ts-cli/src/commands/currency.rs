//! Currency and exchange rate commands.

use std::io::Write;

use anyhow::Result;
use ts_core::Currency;
use ts_core::types::normalize_currency_code;
use ts_db::Database;

use super::util::{TripContext, load_snapshot, mutate};

pub fn add<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    code: &str,
    symbol: &str,
    rate: f64,
) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        snapshot.add_currency(Currency::new(code, symbol, rate))?;
        let code = normalize_currency_code(code);
        let base = snapshot.currencies.base().map_or("", |c| c.code.as_str());
        if base == code {
            Ok(format!("Added {code} as base currency"))
        } else {
            Ok(format!("Added {code} at {rate} {base}"))
        }
    })
}

pub fn remove<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext, code: &str) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let removed = snapshot.remove_currency(code)?;
        Ok(format!("Removed currency {}", removed.code))
    })
}

/// Switches the base currency. Other rates are left as entered.
pub fn set_base<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    code: &str,
) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        snapshot.set_base_currency(code)?;
        Ok(format!(
            "Base currency is now {}",
            normalize_currency_code(code)
        ))
    })
}

pub fn set_rate<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    code: &str,
    rate: f64,
) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        snapshot.set_currency_rate(code, rate)?;
        Ok(format!(
            "Set {} rate to {rate}",
            normalize_currency_code(code)
        ))
    })
}

pub fn list<W: Write>(out: &mut W, db: &Database, ctx: &TripContext) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    if snapshot.currencies.is_empty() {
        writeln!(out, "No currencies.")?;
        return Ok(());
    }
    writeln!(out, "{:<6} {:<6} {:>12}", "CODE", "SYMBOL", "RATE")?;
    for currency in snapshot.currencies.iter() {
        let marker = if currency.is_base { "  (base)" } else { "" };
        writeln!(
            out,
            "{:<6} {:<6} {:>12}{marker}",
            currency.code, currency.symbol, currency.rate
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::{CurrencySet, History, LedgerSnapshot};

    fn setup() -> (Database, TripContext) {
        let mut db = Database::open_in_memory().unwrap();
        let snapshot = LedgerSnapshot::new("Trip", CurrencySet::with_base("INR", "Rs"));
        db.save_trip("t", &snapshot, &History::default(), None)
            .unwrap();
        (db, TripContext::new("t"))
    }

    #[test]
    fn add_and_list() {
        let (mut db, ctx) = setup();
        let mut out = Vec::new();
        add(&mut out, &mut db, &ctx, "usd", "$", 83.5).unwrap();
        list(&mut out, &db, &ctx).unwrap();

        let output = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(output, @r"
        Added USD at 83.5 INR (revision 2, 0 transfers to settle)
        CODE   SYMBOL         RATE
        INR    Rs                1  (base)
        USD    $              83.5
        ");
    }

    #[test]
    fn base_rate_cannot_change() {
        let (mut db, ctx) = setup();
        let err = set_rate(&mut Vec::new(), &mut db, &ctx, "INR", 2.0).unwrap_err();
        assert!(err.to_string().contains("fixed at 1"));
    }

    #[test]
    fn set_base_moves_flag() {
        let (mut db, ctx) = setup();
        add(&mut Vec::new(), &mut db, &ctx, "USD", "$", 80.0).unwrap();
        set_base(&mut Vec::new(), &mut db, &ctx, "usd").unwrap();

        let snapshot = db.require_trip("t").unwrap().snapshot;
        let base = snapshot.currencies.base().unwrap();
        assert_eq!(base.code, "USD");
        assert!((base.rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.currencies.iter().filter(|c| c.is_base).count(), 1);
    }
}
