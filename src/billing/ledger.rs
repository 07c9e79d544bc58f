//! Customer ledger projection.
//!
//! A chronological debit/credit statement derived from a customer's bills
//! and payments: every bill debits its total at creation time, every
//! payment credits its amount. Recomputed on each request, never cached.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::billing::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Bill,
    Payment,
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub date: DateTime<Utc>,
    pub kind: EntryKind,
    pub reference: String,
    pub debit: f64,
    pub credit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub reference: String,
    pub debit: f64,
    pub credit: f64,
    pub balance: f64,
}

/// Sort entries by date (stable, so same-timestamp entries keep their
/// insertion order: callers push bills before payments) and compute the
/// running balance. Returns the rows and the closing balance.
pub fn build_ledger(mut entries: Vec<LedgerEntry>) -> (Vec<LedgerRow>, f64) {
    entries.sort_by_key(|e| e.date);

    let mut balance = 0.0;
    let rows = entries
        .into_iter()
        .map(|e| {
            balance = round2(balance + e.debit - e.credit);
            LedgerRow {
                date: e.date,
                kind: e.kind,
                reference: e.reference,
                debit: e.debit,
                credit: e.credit,
                balance,
            }
        })
        .collect();

    (rows, balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn bill(secs: i64, amount: f64) -> LedgerEntry {
        LedgerEntry {
            date: at(secs),
            kind: EntryKind::Bill,
            reference: "Bill #1".into(),
            debit: amount,
            credit: 0.0,
        }
    }

    fn payment(secs: i64, amount: f64) -> LedgerEntry {
        LedgerEntry {
            date: at(secs),
            kind: EntryKind::Payment,
            reference: "Payment (Bill #1)".into(),
            debit: 0.0,
            credit: amount,
        }
    }

    #[test]
    fn empty_ledger_closes_at_zero() {
        let (rows, closing) = build_ledger(Vec::new());
        assert!(rows.is_empty());
        assert_eq!(closing, 0.0);
    }

    #[test]
    fn running_balance_accumulates_debits_minus_credits() {
        let (rows, closing) =
            build_ledger(vec![bill(0, 236.0), payment(10, 100.0), payment(20, 136.0)]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].balance, 236.0);
        assert_eq!(rows[1].balance, 136.0);
        assert_eq!(rows[2].balance, 0.0);
        assert_eq!(closing, 0.0);
    }

    #[test]
    fn entries_are_ordered_by_date() {
        let (rows, closing) = build_ledger(vec![payment(50, 40.0), bill(0, 100.0)]);

        assert_eq!(rows[0].kind, EntryKind::Bill);
        assert_eq!(rows[1].kind, EntryKind::Payment);
        assert_eq!(closing, 60.0);
    }

    #[test]
    fn same_timestamp_keeps_bills_before_payments() {
        // Callers push all bills first; the stable sort must not reorder
        // entries that share a timestamp.
        let (rows, _) = build_ledger(vec![bill(0, 100.0), payment(0, 100.0)]);
        assert_eq!(rows[0].kind, EntryKind::Bill);
        assert_eq!(rows[0].balance, 100.0);
        assert_eq!(rows[1].kind, EntryKind::Payment);
        assert_eq!(rows[1].balance, 0.0);
    }

    #[test]
    fn projection_is_deterministic() {
        let entries = vec![bill(0, 500.0), payment(5, 200.0), bill(9, 120.0)];
        let (first, closing_a) = build_ledger(entries.clone());
        let (second, closing_b) = build_ledger(entries);

        assert_eq!(closing_a, closing_b);
        let balances_a: Vec<f64> = first.iter().map(|r| r.balance).collect();
        let balances_b: Vec<f64> = second.iter().map(|r| r.balance).collect();
        assert_eq!(balances_a, balances_b);
    }

    #[test]
    fn outstanding_credit_stays_on_the_balance() {
        let (_, closing) = build_ledger(vec![bill(0, 300.0), payment(10, 120.5)]);
        assert_eq!(closing, 179.5);
    }
}
