//! Per-asset audit log: one balance-affecting entry per transaction leg,
//! with running balances after each event.

use crate::record::{RecordId, TransactionRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Which leg of its transaction an audit entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    Acquire,
    Dispose,
    Fee,
}

impl EntryRole {
    pub fn label(&self) -> &'static str {
        match self {
            EntryRole::Acquire => "Acquire",
            EntryRole::Dispose => "Dispose",
            EntryRole::Fee => "Fee",
        }
    }
}

impl fmt::Display for EntryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One balance-affecting event for one asset. Immutable once posted.
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub asset: String,
    pub record: RecordId,
    pub role: EntryRole,
    pub wallet: String,
    /// Signed quantity change (positive for acquisitions).
    pub change: Decimal,
    /// Fee paid in this entry's own asset, if any.
    pub fee: Option<Decimal>,
    /// Wallet balance after this event.
    pub balance: Decimal,
    /// Balance across all wallets after this event.
    pub total: Decimal,
}

/// Asset-keyed audit log. Entries per asset are in chronological order;
/// assets iterate in lexical order.
#[derive(Debug, Default)]
pub struct AuditRecords {
    pub audit_log: BTreeMap<String, Vec<AuditLogEntry>>,
}

impl AuditRecords {
    /// Build the audit log from chronologically-sorted records. Each record
    /// posts up to three entries: its buy, sell, and fee legs.
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let mut builder = Builder::default();
        for (i, record) in records.iter().enumerate() {
            let id = RecordId(i);
            if let Some(buy) = &record.buy {
                let fee = own_asset_fee(record, &buy.asset);
                builder.post(record, id, &buy.asset, EntryRole::Acquire, buy.quantity, fee);
            }
            if let Some(sell) = &record.sell {
                let fee = own_asset_fee(record, &sell.asset);
                builder.post(record, id, &sell.asset, EntryRole::Dispose, -sell.quantity, fee);
            }
            if let Some(fee_leg) = &record.fee {
                builder.post(
                    record,
                    id,
                    &fee_leg.asset,
                    EntryRole::Fee,
                    -fee_leg.quantity,
                    None,
                );
            }
        }
        AuditRecords {
            audit_log: builder.audit_log,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.audit_log.values().map(Vec::len).sum()
    }
}

/// Fee quantity for an acquire/dispose entry when the fee is paid in the
/// entry's own asset.
fn own_asset_fee(record: &TransactionRecord, asset: &str) -> Option<Decimal> {
    record
        .fee
        .as_ref()
        .filter(|fee| fee.asset == asset)
        .map(|fee| fee.quantity)
}

#[derive(Default)]
struct Builder {
    audit_log: BTreeMap<String, Vec<AuditLogEntry>>,
    wallet_balances: HashMap<(String, String), Decimal>,
    totals: HashMap<String, Decimal>,
}

impl Builder {
    fn post(
        &mut self,
        record: &TransactionRecord,
        id: RecordId,
        asset: &str,
        role: EntryRole,
        change: Decimal,
        fee: Option<Decimal>,
    ) {
        let balance = self
            .wallet_balances
            .entry((record.wallet.clone(), asset.to_string()))
            .or_default();
        *balance += change;
        let balance = *balance;

        let total = self.totals.entry(asset.to_string()).or_default();
        *total += change;
        let total = *total;

        log::debug!(
            "audit {role} {asset} @ {}: change={change} balance={balance} total={total}",
            record.wallet
        );

        self.audit_log
            .entry(asset.to_string())
            .or_default()
            .push(AuditLogEntry {
                asset: asset.to_string(),
                record: id,
                role,
                wallet: record.wallet.clone(),
                change,
                fee,
                balance,
                total,
            });
    }
}
