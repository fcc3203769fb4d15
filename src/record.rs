use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Position of a record within the imported ledger. Audit entries and tax
/// events refer back to their originating record through this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub usize);

/// Composite transaction identifier assigned at import time.
///
/// `key` is the stable component shared by everything belonging to the same
/// economic transaction; it is the join key for all correlation. `part`
/// distinguishes records split from a single source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tid {
    pub key: u64,
    pub part: u32,
}

/// Classification of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Deposit,
    Withdrawal,
    Trade,
    Spend,
    Mining,
    Staking,
    Dividend,
    Interest,
    Income,
    GiftReceived,
    GiftSent,
    Airdrop,
}

impl RecordType {
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::Deposit => "Deposit",
            RecordType::Withdrawal => "Withdrawal",
            RecordType::Trade => "Trade",
            RecordType::Spend => "Spend",
            RecordType::Mining => "Mining",
            RecordType::Staking => "Staking",
            RecordType::Dividend => "Dividend",
            RecordType::Interest => "Interest",
            RecordType::Income => "Income",
            RecordType::GiftReceived => "Gift Received",
            RecordType::GiftSent => "Gift Sent",
            RecordType::Airdrop => "Airdrop",
        }
    }

    pub fn from_label(s: &str) -> Option<RecordType> {
        match s {
            "Deposit" => Some(RecordType::Deposit),
            "Withdrawal" => Some(RecordType::Withdrawal),
            "Trade" => Some(RecordType::Trade),
            "Spend" => Some(RecordType::Spend),
            "Mining" => Some(RecordType::Mining),
            "Staking" => Some(RecordType::Staking),
            "Dividend" => Some(RecordType::Dividend),
            "Interest" => Some(RecordType::Interest),
            "Income" => Some(RecordType::Income),
            "Gift Received" => Some(RecordType::GiftReceived),
            "Gift Sent" => Some(RecordType::GiftSent),
            "Airdrop" => Some(RecordType::Airdrop),
            _ => None,
        }
    }

    /// Records whose acquisition side is taxable income.
    pub fn is_income(&self) -> bool {
        matches!(
            self,
            RecordType::Mining
                | RecordType::Staking
                | RecordType::Dividend
                | RecordType::Interest
                | RecordType::Income
        )
    }

    /// Transfers move assets between wallets without a taxable effect.
    pub fn is_transfer(&self) -> bool {
        matches!(self, RecordType::Deposit | RecordType::Withdrawal)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One side of a transaction: the asset moved and its valuation.
#[derive(Debug, Clone)]
pub struct Leg {
    pub asset: String,
    /// Unsigned magnitude; the sign lives on the audit entry's change.
    pub quantity: Decimal,
    /// Value in the reporting currency (acquisition cost or disposal
    /// proceeds), when known.
    pub cost: Option<Decimal>,
    /// Portion of the record's fee attributed to this leg, in the reporting
    /// currency.
    pub fee_value: Option<Decimal>,
}

/// On-chain reference for a record, when the source ledger carries one.
#[derive(Debug, Clone, Default)]
pub struct TxRef {
    pub hash: Option<String>,
    pub src: Option<String>,
    pub dest: Option<String>,
}

impl TxRef {
    /// Hash wins; otherwise `src->dest`, or whichever side is known.
    pub fn display(&self) -> String {
        if let Some(hash) = &self.hash {
            return hash.clone();
        }
        match (&self.src, &self.dest) {
            (Some(src), Some(dest)) => format!("{src}->{dest}"),
            (Some(src), None) => src.clone(),
            (None, Some(dest)) => dest.clone(),
            (None, None) => String::new(),
        }
    }
}

/// A single imported ledger record.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub tid: Option<Tid>,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub wallet: String,
    pub buy: Option<Leg>,
    pub sell: Option<Leg>,
    pub fee: Option<Leg>,
    pub tx_ref: Option<TxRef>,
}

impl TransactionRecord {
    /// Stable transaction key, when this record carries an id.
    pub fn key(&self) -> Option<u64> {
        self.tid.map(|tid| tid.key)
    }

    pub fn format_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_types_identified() {
        assert!(RecordType::Mining.is_income());
        assert!(RecordType::Staking.is_income());
        assert!(RecordType::Dividend.is_income());
        assert!(RecordType::Interest.is_income());
        assert!(RecordType::Income.is_income());
        assert!(!RecordType::Trade.is_income());
        assert!(!RecordType::Airdrop.is_income());
        assert!(!RecordType::Deposit.is_income());
    }

    #[test]
    fn label_round_trip() {
        let all = [
            RecordType::Deposit,
            RecordType::Withdrawal,
            RecordType::Trade,
            RecordType::Spend,
            RecordType::Mining,
            RecordType::Staking,
            RecordType::Dividend,
            RecordType::Interest,
            RecordType::Income,
            RecordType::GiftReceived,
            RecordType::GiftSent,
            RecordType::Airdrop,
        ];
        for record_type in all {
            assert_eq!(
                RecordType::from_label(record_type.label()),
                Some(record_type)
            );
        }
        assert_eq!(RecordType::from_label("Lending"), None);
    }

    #[test]
    fn tx_ref_display_prefers_hash() {
        let tx = TxRef {
            hash: Some("0xabc".into()),
            src: Some("wallet-a".into()),
            dest: Some("wallet-b".into()),
        };
        assert_eq!(tx.display(), "0xabc");
    }

    #[test]
    fn tx_ref_display_source_and_destination() {
        let tx = TxRef {
            hash: None,
            src: Some("wallet-a".into()),
            dest: Some("wallet-b".into()),
        };
        assert_eq!(tx.display(), "wallet-a->wallet-b");

        let src_only = TxRef {
            hash: None,
            src: Some("wallet-a".into()),
            dest: None,
        };
        assert_eq!(src_only.display(), "wallet-a");

        let dest_only = TxRef {
            hash: None,
            src: None,
            dest: Some("wallet-b".into()),
        };
        assert_eq!(dest_only.display(), "wallet-b");

        assert_eq!(TxRef::default().display(), "");
    }
}
