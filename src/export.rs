//! Correlation engine: joins the asset-keyed audit log, the year-keyed tax
//! events, and the transaction records into one output row per audit entry.

use crate::audit::{AuditLogEntry, AuditRecords, EntryRole};
use crate::format;
use crate::record::{Tid, TransactionRecord, TxRef};
use crate::tax::TaxReport;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io;

/// Output column headers, in order.
pub const HEADERS: [&str; 20] = [
    "asset",
    "timestamp",
    "record_type",
    "part",
    "wallet",
    "change_qty",
    "fee_qty",
    "balance_wallet_after",
    "total_balance_after",
    "sell_proceeds_value_ccy",
    "sell_cost_value_ccy",
    "sell_fees_value_ccy",
    "sell_gain_value_ccy",
    "income_amount_value_ccy",
    "income_fees_value_ccy",
    "counter_asset",
    "counter_change_qty",
    "counter_balance_wallet_after",
    "counter_total_balance_after",
    "tx",
];

/// Column positions rendered right-aligned in table output. Structural, not
/// inferred from content.
pub const NUMERIC_COLUMNS: [usize; 13] = [5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 18];

/// Disposal profit/loss summed across all tax events of one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisposalTotals {
    pub proceeds: Decimal,
    pub cost: Decimal,
    pub fees: Decimal,
    pub gain: Decimal,
}

/// Sum disposal P/L per transaction key over the tax years the report's
/// rule set recognises. Events without a transaction key are skipped; a
/// transaction with several events (split lots) sums them.
pub fn aggregate_disposals(report: &TaxReport) -> HashMap<u64, DisposalTotals> {
    let mut totals: HashMap<u64, DisposalTotals> = HashMap::new();
    for (year, events) in &report.tax_events {
        if !report.rules.recognises(*year) {
            log::debug!(
                "dropping {} events in unrecognised tax year {}",
                events.len(),
                year.display()
            );
            continue;
        }
        for event in events {
            let Some(key) = event.key else {
                continue;
            };
            let agg = totals.entry(key).or_default();
            agg.proceeds += event.proceeds;
            agg.cost += event.cost;
            agg.fees += event.fees;
            agg.gain += event.gain;
        }
    }
    totals
}

/// The audit entries of one transaction, by role.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionLegs<'a> {
    pub acquire: Option<&'a AuditLogEntry>,
    pub dispose: Option<&'a AuditLogEntry>,
    pub fee: Option<&'a AuditLogEntry>,
}

impl<'a> TransactionLegs<'a> {
    fn register(&mut self, tid: Tid, entry: &'a AuditLogEntry) {
        let slot = match entry.role {
            EntryRole::Acquire => &mut self.acquire,
            EntryRole::Dispose => &mut self.dispose,
            EntryRole::Fee => &mut self.fee,
        };
        // Last-wins, as upstream data should never produce two legs with the
        // same role for one transaction; a duplicate points at an upstream
        // inconsistency, so surface it.
        if slot.is_some() {
            log::warn!(
                "transaction {}.{}: duplicate {} entry replaces an earlier one",
                tid.key,
                tid.part,
                entry.role
            );
        }
        *slot = Some(entry);
    }
}

/// Index every audit entry under its transaction key and role, enabling
/// lookup of the opposite leg of a trade. Entries without a transaction key
/// are skipped.
pub fn index_legs<'a>(
    records: &[TransactionRecord],
    audit: &'a AuditRecords,
) -> HashMap<u64, TransactionLegs<'a>> {
    let mut index: HashMap<u64, TransactionLegs<'a>> = HashMap::new();
    for entries in audit.audit_log.values() {
        for entry in entries {
            let Some(tid) = records[entry.record.0].tid else {
                continue;
            };
            index.entry(tid.key).or_default().register(tid, entry);
        }
    }
    index
}

/// One exported row: 20 string fields, empty string meaning not applicable.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub asset: String,
    pub timestamp: String,
    pub record_type: String,
    pub part: String,
    pub wallet: String,
    pub change_qty: String,
    pub fee_qty: String,
    pub balance_wallet_after: String,
    pub total_balance_after: String,
    pub sell_proceeds_value_ccy: String,
    pub sell_cost_value_ccy: String,
    pub sell_fees_value_ccy: String,
    pub sell_gain_value_ccy: String,
    pub income_amount_value_ccy: String,
    pub income_fees_value_ccy: String,
    pub counter_asset: String,
    pub counter_change_qty: String,
    pub counter_balance_wallet_after: String,
    pub counter_total_balance_after: String,
    pub tx: String,
}

impl ExportRow {
    pub fn columns(&self) -> [&str; 20] {
        [
            &self.asset,
            &self.timestamp,
            &self.record_type,
            &self.part,
            &self.wallet,
            &self.change_qty,
            &self.fee_qty,
            &self.balance_wallet_after,
            &self.total_balance_after,
            &self.sell_proceeds_value_ccy,
            &self.sell_cost_value_ccy,
            &self.sell_fees_value_ccy,
            &self.sell_gain_value_ccy,
            &self.income_amount_value_ccy,
            &self.income_fees_value_ccy,
            &self.counter_asset,
            &self.counter_change_qty,
            &self.counter_balance_wallet_after,
            &self.counter_total_balance_after,
            &self.tx,
        ]
    }
}

/// Produce one row per audit entry: assets in lexical order, entries per
/// asset in chronological order.
pub fn build_rows(
    records: &[TransactionRecord],
    audit: &AuditRecords,
    disposals: &HashMap<u64, DisposalTotals>,
    legs: &HashMap<u64, TransactionLegs<'_>>,
) -> Vec<ExportRow> {
    let mut rows = Vec::with_capacity(audit.entry_count());
    for entries in audit.audit_log.values() {
        for entry in entries {
            let record = &records[entry.record.0];
            rows.push(build_row(entry, record, disposals, legs));
        }
    }
    rows
}

fn build_row(
    entry: &AuditLogEntry,
    record: &TransactionRecord,
    disposals: &HashMap<u64, DisposalTotals>,
    legs: &HashMap<u64, TransactionLegs<'_>>,
) -> ExportRow {
    let key = record.key();

    // Disposal P/L, only for the disposal leg of an aggregated transaction.
    let mut sell_proceeds = String::new();
    let mut sell_cost = String::new();
    let mut sell_fees = String::new();
    let mut sell_gain = String::new();
    if entry.role == EntryRole::Dispose {
        if let Some(totals) = key.and_then(|key| disposals.get(&key)) {
            sell_proceeds = format::val(Some(totals.proceeds));
            sell_cost = format::val(Some(totals.cost));
            sell_fees = format::val(Some(totals.fees));
            sell_gain = format::val(Some(totals.gain));
        }
    }

    // Income value, only for income-type acquisitions with cost data.
    let mut income_amount = String::new();
    let mut income_fees = String::new();
    if entry.role == EntryRole::Acquire && record.record_type.is_income() {
        if let Some(buy) = &record.buy {
            if let Some(cost) = buy.cost {
                income_amount = format::val(Some(cost));
                income_fees = format::val(buy.fee_value);
            }
        }
    }

    // Counter asset: the opposite side of a two-asset transaction. Only
    // keyed records join against the index; a record without a transaction
    // key leaves all four counter fields empty.
    let mut counter_asset = String::new();
    let mut counter_change_qty = String::new();
    let mut counter_balance = String::new();
    let mut counter_total = String::new();
    if let Some(key) = key {
        let parts = legs.get(&key);
        match entry.role {
            EntryRole::Acquire => {
                if let Some(sell) = &record.sell {
                    counter_asset = sell.asset.clone();
                    counter_change_qty = format::qty(Some(-sell.quantity));
                }
                if let Some(other) = parts.and_then(|parts| parts.dispose) {
                    counter_balance = format::qty(Some(other.balance));
                    counter_total = format::qty(Some(other.total));
                }
            }
            EntryRole::Dispose => {
                if let Some(buy) = &record.buy {
                    counter_asset = buy.asset.clone();
                    counter_change_qty = format::qty(Some(buy.quantity));
                }
                if let Some(other) = parts.and_then(|parts| parts.acquire) {
                    counter_balance = format::qty(Some(other.balance));
                    counter_total = format::qty(Some(other.total));
                }
            }
            EntryRole::Fee => {}
        }
    }

    ExportRow {
        asset: entry.asset.clone(),
        timestamp: record.format_timestamp(),
        record_type: record.record_type.label().to_string(),
        part: entry.role.label().to_string(),
        wallet: entry.wallet.clone(),
        change_qty: format::qty(Some(entry.change)),
        fee_qty: format::qty(entry.fee),
        balance_wallet_after: format::qty(Some(entry.balance)),
        total_balance_after: format::qty(Some(entry.total)),
        sell_proceeds_value_ccy: sell_proceeds,
        sell_cost_value_ccy: sell_cost,
        sell_fees_value_ccy: sell_fees,
        sell_gain_value_ccy: sell_gain,
        income_amount_value_ccy: income_amount,
        income_fees_value_ccy: income_fees,
        counter_asset,
        counter_change_qty,
        counter_balance_wallet_after: counter_balance,
        counter_total_balance_after: counter_total,
        tx: record.tx_ref.as_ref().map(TxRef::display).unwrap_or_default(),
    }
}

/// Serialize rows as CSV; the header row comes from the field names.
pub fn write_csv<W: io::Write>(rows: &[ExportRow], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
