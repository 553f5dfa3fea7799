//! Expense group commands.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Result, bail};
use ts_core::split::{SplitMode, compute_shares};
use ts_core::{ExpenseGroup, LedgerSnapshot, Participant, ParticipantId};
use ts_db::Database;

use super::util::{
    TripContext, format_money, load_snapshot, mutate, new_group_id, resolve_group,
    resolve_participant,
};
use crate::cli::{SplitArgs, SplitKind};

/// Fields for a new group.
#[derive(Debug, Clone)]
pub struct NewGroup<'a> {
    pub label: &'a str,
    pub paid_by: &'a str,
    pub total: f64,
    pub currency: Option<&'a str>,
    pub emoji: Option<&'a str>,
    pub note: Option<&'a str>,
}

/// Fields to change on an existing group; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges<'a> {
    pub label: Option<&'a str>,
    pub paid_by: Option<&'a str>,
    pub total: Option<f64>,
    pub currency: Option<&'a str>,
    pub emoji: Option<&'a str>,
    pub note: Option<&'a str>,
}

impl SplitArgs {
    /// The requested mode, inferred from the flags given when not explicit.
    fn kind(&self) -> Option<SplitKind> {
        self.split.or_else(|| {
            if !self.share.is_empty() {
                Some(SplitKind::Custom)
            } else if self.shared.is_some() || !self.personal.is_empty() {
                Some(SplitKind::Mixed)
            } else if !self.among.is_empty() {
                Some(SplitKind::Equal)
            } else {
                None
            }
        })
    }
}

/// Turns split flags into a share map for a group of `total`.
fn build_shares(
    snapshot: &LedgerSnapshot,
    kind: SplitKind,
    split: &SplitArgs,
    total: f64,
) -> Result<BTreeMap<ParticipantId, f64>> {
    let mode = match kind {
        SplitKind::Equal => SplitMode::Equal,
        SplitKind::Mixed => {
            let personal = resolve_amounts(snapshot, &split.personal)?;
            let shared = split
                .shared
                .unwrap_or_else(|| total - personal.values().sum::<f64>());
            SplitMode::Mixed { shared, personal }
        }
        SplitKind::Custom => {
            if split.share.is_empty() {
                bail!("a custom split needs at least one --share NAME=AMOUNT");
            }
            SplitMode::Custom(resolve_amounts(snapshot, &split.share)?)
        }
    };
    let among = split_members(snapshot, &split.among)?;
    Ok(compute_shares(&mode, total, &among))
}

fn resolve_amounts(
    snapshot: &LedgerSnapshot,
    entries: &[(String, f64)],
) -> Result<BTreeMap<ParticipantId, f64>> {
    let mut amounts = BTreeMap::new();
    for (who, amount) in entries {
        let id = resolve_participant(snapshot, who)?;
        if amounts.insert(id, *amount).is_some() {
            bail!("'{who}' is listed more than once");
        }
    }
    Ok(amounts)
}

/// Participants an equal portion is divided among; everyone by default.
fn split_members(snapshot: &LedgerSnapshot, among: &[String]) -> Result<Vec<Participant>> {
    if among.is_empty() {
        return Ok(snapshot.participants.clone());
    }
    let mut members: Vec<Participant> = Vec::with_capacity(among.len());
    for who in among {
        let id = resolve_participant(snapshot, who)?;
        if members.iter().any(|p| p.id == id) {
            continue;
        }
        if let Some(p) = snapshot.participant(&id) {
            members.push(p.clone());
        }
    }
    Ok(members)
}

pub fn add<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    group: &NewGroup<'_>,
    split: &SplitArgs,
) -> Result<()> {
    let id = new_group_id()?;
    mutate(out, db, ctx, |snapshot| {
        let paid_by = resolve_participant(snapshot, group.paid_by)?;
        let kind = split.kind().unwrap_or(SplitKind::Equal);
        let shares = build_shares(snapshot, kind, split, group.total)?;

        let mut new = ExpenseGroup::new(id, paid_by, group.total)
            .with_label(group.label)
            .with_shares(shares);
        if let Some(code) = group.currency {
            new = new.with_currency(code);
        }
        if let Some(emoji) = group.emoji {
            new.emoji = emoji.to_string();
        }
        if let Some(note) = group.note {
            new.note = note.to_string();
        }

        let message = format!(
            "Added {} ({}) paid by {}",
            new.label.trim(),
            new.id,
            snapshot.display_name(&new.paid_by)
        );
        snapshot.add_group(new)?;
        Ok(message)
    })
}

/// Edits a group. Shares are only recomputed when split flags are given.
pub fn edit<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    key: &str,
    changes: &GroupChanges<'_>,
    split: &SplitArgs,
) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let id = resolve_group(snapshot, key)?;
        let Some(mut group) = snapshot.group(&id).cloned() else {
            bail!("unknown group '{key}'");
        };

        if let Some(label) = changes.label {
            group.label = label.to_string();
        }
        if let Some(who) = changes.paid_by {
            group.paid_by = resolve_participant(snapshot, who)?;
        }
        if let Some(total) = changes.total {
            group.total = total;
        }
        if let Some(code) = changes.currency {
            group.currency = Some(code.to_string());
        }
        if let Some(emoji) = changes.emoji {
            group.emoji = emoji.to_string();
        }
        if let Some(note) = changes.note {
            group.note = note.to_string();
        }
        if let Some(kind) = split.kind() {
            group.shares = build_shares(snapshot, kind, split, group.total)?;
        }

        let message = format!("Updated {} ({})", group.label.trim(), group.id);
        snapshot.replace_group(group)?;
        Ok(message)
    })
}

pub fn remove<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext, key: &str) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let id = resolve_group(snapshot, key)?;
        let removed = snapshot.remove_group(&id)?;
        Ok(format!("Removed {} ({})", removed.label, removed.id))
    })
}

pub fn list<W: Write>(out: &mut W, db: &Database, ctx: &TripContext) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    if snapshot.groups.is_empty() {
        writeln!(out, "No expense groups.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<10} {:<24} {:<12} {:>16}",
        "ID", "GROUP", "PAID BY", "TOTAL"
    )?;
    for group in &snapshot.groups {
        let symbol = snapshot.currencies.symbol_for(group.currency.as_deref());
        writeln!(
            out,
            "{:<10} {:<24} {:<12} {:>16}",
            group.id,
            format!("{} {}", group.emoji, group.label),
            snapshot.display_name(&group.paid_by),
            format_money(group.total, symbol)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::{Currency, CurrencySet, History};

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id).unwrap()
    }

    fn setup() -> (Database, TripContext) {
        let mut snapshot = LedgerSnapshot::new("Trip", CurrencySet::with_base("INR", "₹"));
        for (id, name) in [("a", "Avery"), ("b", "Blake"), ("c", "Casey")] {
            snapshot.add_participant(pid(id), name).unwrap();
        }
        snapshot
            .add_currency(Currency::new("USD", "$", 80.0))
            .unwrap();
        let mut db = Database::open_in_memory().unwrap();
        db.save_trip("t", &snapshot, &History::default(), None)
            .unwrap();
        (db, TripContext::new("t"))
    }

    fn new_group(total: f64) -> NewGroup<'static> {
        NewGroup {
            label: "Dinner",
            paid_by: "avery",
            total,
            currency: None,
            emoji: None,
            note: None,
        }
    }

    fn split() -> SplitArgs {
        SplitArgs {
            split: None,
            among: Vec::new(),
            shared: None,
            personal: Vec::new(),
            share: Vec::new(),
        }
    }

    fn stored_group(db: &Database) -> ExpenseGroup {
        db.require_trip("t").unwrap().snapshot.groups[0].clone()
    }

    #[test]
    fn add_defaults_to_equal_split() {
        let (mut db, ctx) = setup();
        add(&mut Vec::new(), &mut db, &ctx, &new_group(90.0), &split()).unwrap();

        let group = stored_group(&db);
        assert_eq!(group.paid_by, pid("a"));
        assert_eq!(group.shares.len(), 3);
        assert!((group.share_of(&pid("c")) - 30.0).abs() < 1e-9);
        assert_eq!(group.emoji, "💳");
    }

    #[test]
    fn equal_split_among_subset() {
        let (mut db, ctx) = setup();
        let mut args = split();
        args.among = vec!["Avery".to_string(), "blake".to_string()];
        add(&mut Vec::new(), &mut db, &ctx, &new_group(50.0), &args).unwrap();

        let group = stored_group(&db);
        assert!((group.share_of(&pid("a")) - 25.0).abs() < 1e-9);
        assert!(!group.shares.contains_key(&pid("c")));
    }

    #[test]
    fn mixed_split_defaults_shared_to_remainder() {
        let (mut db, ctx) = setup();
        let mut args = split();
        args.personal = vec![("Casey".to_string(), 15.0)];
        add(&mut Vec::new(), &mut db, &ctx, &new_group(75.0), &args).unwrap();

        let group = stored_group(&db);
        assert!((group.share_of(&pid("a")) - 20.0).abs() < 1e-9);
        assert!((group.share_of(&pid("c")) - 35.0).abs() < 1e-9);
        assert!((group.shares_total() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn custom_split_warns_on_mismatch() {
        let (mut db, ctx) = setup();
        let mut args = split();
        args.share = vec![("Avery".to_string(), 10.0), ("Blake".to_string(), 20.0)];
        let mut out = Vec::new();
        add(&mut out, &mut db, &ctx, &new_group(100.0), &args).unwrap();

        let output = String::from_utf8(out).unwrap();
        let group = stored_group(&db);
        assert!(output.contains(&format!(
            "warning: group {} shares add up to 30.00, total is 100.00",
            group.id
        )));
    }

    #[test]
    fn add_in_foreign_currency() {
        let (mut db, ctx) = setup();
        let mut group = new_group(30.0);
        group.currency = Some("usd");
        add(&mut Vec::new(), &mut db, &ctx, &group, &split()).unwrap();

        let snapshot = db.require_trip("t").unwrap().snapshot;
        let balances = snapshot.balances();
        assert!((balances.paid[&pid("a")] - 2_400.0).abs() < 1e-9);
        assert!((balances.owed[&pid("b")] - 800.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_currency_is_refused() {
        let (mut db, ctx) = setup();
        let mut group = new_group(30.0);
        group.currency = Some("EUR");
        assert!(add(&mut Vec::new(), &mut db, &ctx, &group, &split()).is_err());
        assert_eq!(db.trip_revision("t").unwrap(), Some(1));
    }

    #[test]
    fn edit_keeps_shares_unless_split_given() {
        let (mut db, ctx) = setup();
        add(&mut Vec::new(), &mut db, &ctx, &new_group(90.0), &split()).unwrap();

        let changes = GroupChanges {
            total: Some(120.0),
            label: Some("Late dinner"),
            ..GroupChanges::default()
        };
        edit(&mut Vec::new(), &mut db, &ctx, "dinner", &changes, &split()).unwrap();
        let group = stored_group(&db);
        assert_eq!(group.label, "Late dinner");
        assert!((group.shares_total() - 90.0).abs() < 1e-9);

        let mut args = split();
        args.split = Some(SplitKind::Equal);
        edit(
            &mut Vec::new(),
            &mut db,
            &ctx,
            "late dinner",
            &GroupChanges::default(),
            &args,
        )
        .unwrap();
        assert!((stored_group(&db).share_of(&pid("b")) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn remove_by_label() {
        let (mut db, ctx) = setup();
        add(&mut Vec::new(), &mut db, &ctx, &new_group(90.0), &split()).unwrap();
        remove(&mut Vec::new(), &mut db, &ctx, "Dinner").unwrap();
        assert!(db.require_trip("t").unwrap().snapshot.groups.is_empty());
    }
}
