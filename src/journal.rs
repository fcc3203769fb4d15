//! Import of the source ledger workbook (CSV).

use crate::record::{Leg, RecordType, Tid, TransactionRecord, TxRef};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown record type '{value}'")]
    UnknownRecordType { row: usize, value: String },
    #[error("row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
    #[error("row {row}: negative {field} quantity {value}")]
    NegativeQuantity {
        row: usize,
        field: &'static str,
        value: Decimal,
    },
    #[error("row {row}: {record_type} requires a {side} side")]
    MissingLeg {
        row: usize,
        record_type: &'static str,
        side: &'static str,
    },
}

/// Raw workbook row. Empty cells deserialize as `None`; the workbook's
/// free-text note column is not carried into the export.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "type")]
    record_type: String,
    buy_asset: Option<String>,
    buy_quantity: Option<Decimal>,
    buy_value: Option<Decimal>,
    sell_asset: Option<String>,
    sell_quantity: Option<Decimal>,
    sell_value: Option<Decimal>,
    fee_asset: Option<String>,
    fee_quantity: Option<Decimal>,
    fee_value: Option<Decimal>,
    wallet: String,
    timestamp: String,
    tx_hash: Option<String>,
    tx_src: Option<String>,
    tx_dest: Option<String>,
}

/// Read the ledger workbook, sort records chronologically, and assign each a
/// composite id. The first id component is the stable transaction key used
/// for all downstream correlation.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, JournalError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
        // +2: one for the header row, one for 1-based numbering
        let row = i + 2;
        records.push(convert(row, result?)?);
    }
    records.sort_by_key(|record| record.timestamp);
    for (i, record) in records.iter_mut().enumerate() {
        record.tid = Some(Tid {
            key: i as u64 + 1,
            part: 0,
        });
    }
    log::info!("imported {} ledger records", records.len());
    Ok(records)
}

fn convert(row: usize, raw: CsvRow) -> Result<TransactionRecord, JournalError> {
    let record_type = RecordType::from_label(&raw.record_type).ok_or_else(|| {
        JournalError::UnknownRecordType {
            row,
            value: raw.record_type.clone(),
        }
    })?;

    let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
        .map_err(|_| JournalError::InvalidTimestamp {
            row,
            value: raw.timestamp.clone(),
        })?
        .with_timezone(&Utc);

    let mut buy = leg(row, "buy", raw.buy_asset, raw.buy_quantity, raw.buy_value)?;
    let mut sell = leg(row, "sell", raw.sell_asset, raw.sell_quantity, raw.sell_value)?;
    let fee = leg(row, "fee", raw.fee_asset, raw.fee_quantity, raw.fee_value)?;

    if record_type == RecordType::Trade {
        if buy.is_none() {
            return Err(JournalError::MissingLeg {
                row,
                record_type: record_type.label(),
                side: "buy",
            });
        }
        if sell.is_none() {
            return Err(JournalError::MissingLeg {
                row,
                record_type: record_type.label(),
                side: "sell",
            });
        }
    }

    // Fees reduce the disposal side when there is one, otherwise they add to
    // the acquisition.
    if let Some(fee_leg) = &fee {
        let fee_value = fee_leg.cost;
        if let Some(sell_leg) = &mut sell {
            sell_leg.fee_value = fee_value;
        } else if let Some(buy_leg) = &mut buy {
            buy_leg.fee_value = fee_value;
        }
    }

    let tx_ref = if raw.tx_hash.is_some() || raw.tx_src.is_some() || raw.tx_dest.is_some() {
        Some(TxRef {
            hash: raw.tx_hash,
            src: raw.tx_src,
            dest: raw.tx_dest,
        })
    } else {
        None
    };

    Ok(TransactionRecord {
        tid: None,
        record_type,
        timestamp,
        wallet: raw.wallet,
        buy,
        sell,
        fee,
        tx_ref,
    })
}

fn leg(
    row: usize,
    field: &'static str,
    asset: Option<String>,
    quantity: Option<Decimal>,
    value: Option<Decimal>,
) -> Result<Option<Leg>, JournalError> {
    let (Some(asset), Some(quantity)) = (asset, quantity) else {
        return Ok(None);
    };
    if quantity < Decimal::ZERO {
        return Err(JournalError::NegativeQuantity {
            row,
            field,
            value: quantity,
        });
    }
    Ok(Some(Leg {
        asset,
        quantity,
        cost: value,
        fee_value: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "type,buy_asset,buy_quantity,buy_value,sell_asset,sell_quantity,sell_value,fee_asset,fee_quantity,fee_value,wallet,timestamp,note,tx_hash,tx_src,tx_dest";

    fn parse(rows: &str) -> Result<Vec<TransactionRecord>, JournalError> {
        read_csv(format!("{HEADER}\n{rows}").as_bytes())
    }

    #[test]
    fn parses_trade_with_fee() {
        let records = parse(
            "Trade,BTC,0.5,800.00,GBP,800,800.00,GBP,5,5.00,Exchange,2024-05-01T10:00:00Z,,,,",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.record_type, RecordType::Trade);
        assert_eq!(record.wallet, "Exchange");

        let buy = record.buy.as_ref().unwrap();
        assert_eq!(buy.asset, "BTC");
        assert_eq!(buy.quantity, dec!(0.5));
        assert_eq!(buy.cost, Some(dec!(800.00)));
        assert_eq!(buy.fee_value, None);

        let sell = record.sell.as_ref().unwrap();
        assert_eq!(sell.asset, "GBP");
        // Fee value attaches to the disposal side.
        assert_eq!(sell.fee_value, Some(dec!(5.00)));

        let fee = record.fee.as_ref().unwrap();
        assert_eq!(fee.asset, "GBP");
        assert_eq!(fee.quantity, dec!(5));
    }

    #[test]
    fn fee_attaches_to_buy_side_without_disposal() {
        let records =
            parse("Staking,ETH,0.1,150.00,,,,ETH,0.001,1.50,Ledger,2024-05-02T00:00:00Z,,,,")
                .unwrap();
        let buy = records[0].buy.as_ref().unwrap();
        assert_eq!(buy.fee_value, Some(dec!(1.50)));
        assert!(records[0].sell.is_none());
    }

    #[test]
    fn records_sorted_and_keyed_chronologically() {
        let records = parse(concat!(
            "Deposit,GBP,2000,,,,,,,,Bank,2024-06-01T00:00:00Z,,,,\n",
            "Deposit,GBP,1000,,,,,,,,Bank,2024-01-01T00:00:00Z,,,,",
        ))
        .unwrap();
        assert!(records[0].timestamp < records[1].timestamp);
        assert_eq!(records[0].key(), Some(1));
        assert_eq!(records[1].key(), Some(2));
    }

    #[test]
    fn unknown_record_type_is_an_error() {
        let err = parse("Lending,BTC,1,,,,,,,,Bank,2024-01-01T00:00:00Z,,,,").unwrap_err();
        assert!(matches!(err, JournalError::UnknownRecordType { row: 2, .. }));
    }

    #[test]
    fn negative_quantity_is_an_error() {
        let err = parse("Spend,,,,BTC,-0.1,50.00,,,,Wallet,2024-01-01T00:00:00Z,,,,").unwrap_err();
        assert!(matches!(
            err,
            JournalError::NegativeQuantity { field: "sell", .. }
        ));
    }

    #[test]
    fn trade_requires_both_sides() {
        let err = parse("Trade,BTC,1,,,,,,,,Bank,2024-01-01T00:00:00Z,,,,").unwrap_err();
        assert!(matches!(err, JournalError::MissingLeg { side: "sell", .. }));
    }

    #[test]
    fn tx_reference_parsed() {
        let records = parse(
            "Withdrawal,,,,BTC,0.2,,,,,Wallet,2024-01-01T00:00:00Z,,0xdeadbeef,addr1,addr2",
        )
        .unwrap();
        let tx = records[0].tx_ref.as_ref().unwrap();
        assert_eq!(tx.hash.as_deref(), Some("0xdeadbeef"));
        assert_eq!(tx.display(), "0xdeadbeef");
    }
}
