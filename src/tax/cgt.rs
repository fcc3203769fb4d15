//! Capital gains over the ledger: average-cost pool per asset, one tax
//! event per disposal, grouped by tax year.

use crate::record::{RecordId, TransactionRecord};
use crate::tax::uk::{TaxRules, TaxYear};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// One disposal's tax computation. The originating record and transaction
/// key are constructor fields, so every event is traceable from creation.
#[derive(Debug, Clone)]
pub struct CapitalGainsEvent {
    pub record: Option<RecordId>,
    /// Stable transaction key of the originating record.
    pub key: Option<u64>,
    pub asset: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub cost: Decimal,
    pub fees: Decimal,
    pub gain: Decimal,
}

impl CapitalGainsEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        record: Option<RecordId>,
        key: Option<u64>,
        asset: String,
        date: NaiveDate,
        quantity: Decimal,
        proceeds: Decimal,
        cost: Decimal,
        fees: Decimal,
    ) -> Self {
        CapitalGainsEvent {
            record,
            key,
            asset,
            date,
            quantity,
            proceeds,
            cost,
            fees,
            gain: proceeds - cost - fees,
        }
    }
}

/// Tax computation result: events grouped by tax year, under a rule set.
#[derive(Debug)]
pub struct TaxReport {
    pub rules: TaxRules,
    pub tax_events: BTreeMap<TaxYear, Vec<CapitalGainsEvent>>,
}

/// Average-cost pool for one asset.
#[derive(Debug)]
struct Pool {
    asset: String,
    quantity: Decimal,
    cost: Decimal,
}

impl Pool {
    fn new(asset: String) -> Self {
        Pool {
            asset,
            quantity: Decimal::ZERO,
            cost: Decimal::ZERO,
        }
    }

    fn add(&mut self, quantity: Decimal, cost: Decimal) {
        self.quantity += quantity;
        self.cost += cost;
        log::debug!(
            "pool {} add: qty={quantity} cost={cost} -> qty={} cost={}",
            self.asset,
            self.quantity,
            self.cost
        );
    }

    /// Remove from the pool, returning the allowable cost of the removed
    /// quantity. Disposing more than the pool holds drains it entirely.
    fn remove(&mut self, quantity: Decimal) -> Decimal {
        let cost = if quantity >= self.quantity {
            let cost = self.cost;
            self.quantity = Decimal::ZERO;
            self.cost = Decimal::ZERO;
            cost
        } else {
            let proportion = quantity / self.quantity;
            let cost = (self.cost * proportion).round_dp(2);
            self.quantity -= quantity;
            self.cost -= cost;
            cost
        };
        log::debug!(
            "pool {} remove: qty={quantity} cost={cost} -> qty={} cost={}",
            self.asset,
            self.quantity,
            self.cost
        );
        cost
    }
}

/// The reporting currency itself is never a taxable asset.
fn is_gbp(asset: &str) -> bool {
    asset == "GBP"
}

/// Run the capital gains computation over chronologically-sorted records.
/// Transfers and reporting-currency legs never produce tax events;
/// disposals without a known value are skipped.
pub fn calculate(records: &[TransactionRecord], rules: TaxRules) -> TaxReport {
    let mut pools: HashMap<String, Pool> = HashMap::new();
    let mut tax_events: BTreeMap<TaxYear, Vec<CapitalGainsEvent>> = BTreeMap::new();

    for (i, record) in records.iter().enumerate() {
        if record.record_type.is_transfer() {
            continue;
        }

        if let Some(buy) = record.buy.as_ref().filter(|buy| !is_gbp(&buy.asset)) {
            if let Some(cost) = buy.cost {
                let total_cost = cost + buy.fee_value.unwrap_or(Decimal::ZERO);
                pools
                    .entry(buy.asset.clone())
                    .or_insert_with(|| Pool::new(buy.asset.clone()))
                    .add(buy.quantity, total_cost);
            }
        }

        if let Some(sell) = record.sell.as_ref().filter(|sell| !is_gbp(&sell.asset)) {
            let Some(proceeds) = sell.cost else {
                log::debug!(
                    "skipping disposal of {} without a value (key {:?})",
                    sell.asset,
                    record.key()
                );
                continue;
            };
            let allowable_cost = pools
                .entry(sell.asset.clone())
                .or_insert_with(|| Pool::new(sell.asset.clone()))
                .remove(sell.quantity);
            let fees = sell.fee_value.unwrap_or(Decimal::ZERO);
            let date = record.timestamp.date_naive();
            let event = CapitalGainsEvent::new(
                Some(RecordId(i)),
                record.key(),
                sell.asset.clone(),
                date,
                sell.quantity,
                proceeds,
                allowable_cost,
                fees,
            );
            tax_events
                .entry(TaxYear::from_date(date))
                .or_default()
                .push(event);
        }
    }

    TaxReport { rules, tax_events }
}
