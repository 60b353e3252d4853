use crate::{
    data::{
        Error, MerchantFailureRate, MerchantVolume, TransactionRow, UserAverage,
        SIGNIFICANT_DIGITS,
    },
    read::TransactionUser,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The loaded input table. Rows are only ever appended while reading; after that
/// the analyzer borrows it immutably for every view.
#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<TransactionRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<TransactionRow>> for Dataset {
    fn from(rows: Vec<TransactionRow>) -> Self {
        Self { rows }
    }
}

impl TransactionUser for Dataset {
    fn use_tx(&mut self, tx: TransactionRow) -> Result<(), Error> {
        self.rows.push(tx);
        Ok(())
    }
}

/// Group accumulator that remembers the order in which keys first showed up.
/// `HashMap` alone would hand groups back in a different order on every run, and
/// we want identical input to give byte-identical output files.
struct Groups<V> {
    index: HashMap<String, usize>,
    groups: Vec<(String, V)>,
}

impl<V: Default> Groups<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.groups.push((key.to_string(), V::default()));
                self.index.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.groups[idx].1)
    }

    fn into_vec(self) -> Vec<(String, V)> {
        self.groups
    }
}

/// Count rows per non-null merchant, optionally keeping only some of them.
fn count_per_merchant<F: Fn(&TransactionRow) -> bool>(dataset: &Dataset, keep: F) -> Groups<u64> {
    let mut counts = Groups::new();
    for row in dataset.rows() {
        match &row.merchant_id {
            Some(merchant) if keep(row) => *counts.entry(merchant) += 1,
            _ => {}
        }
    }
    counts
}

/// Mean transaction amount per user, one row per user in first-seen order. Rows
/// without a user or an amount don't take part. Fails if a user's amounts sum past
/// what a `Decimal` can hold.
pub fn avg_transaction_per_user(dataset: &Dataset) -> Result<Vec<UserAverage>, Error> {
    let mut sums: Groups<(Decimal, u64)> = Groups::new();
    for row in dataset.rows() {
        if let (Some(user), Some(amount)) = (&row.user_id, row.amount) {
            let (sum, count) = sums.entry(user);
            *sum = sum
                .checked_add(amount)
                .ok_or_else(|| Error::AmountOverflow(user.clone()))?;
            *count += 1;
        }
    }
    Ok(sums
        .into_vec()
        .into_iter()
        .map(|(user_id, (sum, count))| UserAverage {
            user_id,
            avg_transaction: (sum / Decimal::from(count))
                .round_dp(SIGNIFICANT_DIGITS)
                .normalize(),
        })
        .collect())
}

/// Failed/total ratio per merchant, highest rate first. Totals and failures are
/// counted separately and then left-joined on the merchant, merchants without any
/// failure getting a zero count.
pub fn failure_rate_per_merchant(dataset: &Dataset) -> Vec<MerchantFailureRate> {
    let total = count_per_merchant(dataset, |_| true);
    let failed = count_per_merchant(dataset, TransactionRow::is_failed);

    let mut rates: Vec<MerchantFailureRate> = total
        .into_vec()
        .into_iter()
        .map(|(merchant_id, total_txns)| {
            let failed_txns = failed.get(&merchant_id).copied().unwrap_or(0);
            let failure_rate = if total_txns > 0 {
                failed_txns as f64 / total_txns as f64
            } else {
                0.0
            };
            MerchantFailureRate {
                merchant_id,
                total_txns,
                failed_txns,
                failure_rate,
            }
        })
        .collect();
    // stable: equal rates keep first-seen order
    rates.sort_by(|a, b| b.failure_rate.total_cmp(&a.failure_rate));
    rates
}

/// The `k` merchants with the most transactions, busiest first.
pub fn top_merchants(dataset: &Dataset, k: usize) -> Vec<MerchantVolume> {
    let mut volumes: Vec<MerchantVolume> = count_per_merchant(dataset, |_| true)
        .into_vec()
        .into_iter()
        .map(|(merchant_id, txn_count)| MerchantVolume {
            merchant_id,
            txn_count,
        })
        .collect();
    volumes.sort_by(|a, b| b.txn_count.cmp(&a.txn_count));
    volumes.truncate(k);
    volumes
}

/// The `k` users with the highest average, ties in input order.
pub fn top_users_by_average(averages: &[UserAverage], k: usize) -> Vec<UserAverage> {
    let mut top = averages.to_vec();
    top.sort_by(|a, b| b.avg_transaction.cmp(&a.avg_transaction));
    top.truncate(k);
    top
}

/// How many rows each report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK {
    pub users: usize,
    pub failure_rates: usize,
    pub merchants: usize,
}

impl Default for TopK {
    fn default() -> Self {
        Self {
            users: 10,
            failure_rates: 10,
            merchants: 5,
        }
    }
}

/// The three views, all computed from the same borrowed dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Every user, first-seen order
    pub avg_per_user: Vec<UserAverage>,
    /// Every merchant, highest failure rate first
    pub failure_rates: Vec<MerchantFailureRate>,
    /// Only the top `TopK::merchants`
    pub top_merchants: Vec<MerchantVolume>,
    pub top: TopK,
}

impl Analysis {
    pub fn run(dataset: &Dataset, top: TopK) -> Result<Self, Error> {
        log::info!("Calculating average transaction per user...");
        let avg_per_user = avg_transaction_per_user(dataset)?;
        log::info!("Calculating failure rate per merchant...");
        let failure_rates = failure_rate_per_merchant(dataset);
        log::info!("Finding top {} merchants by transaction count...", top.merchants);
        let top_merchants = top_merchants(dataset, top.merchants);
        Ok(Self {
            avg_per_user,
            failure_rates,
            top_merchants,
            top,
        })
    }

    pub fn top_users(&self) -> Vec<UserAverage> {
        top_users_by_average(&self.avg_per_user, self.top.users)
    }

    pub fn top_failure_rates(&self) -> &[MerchantFailureRate] {
        let k = self.top.failure_rates.min(self.failure_rates.len());
        &self.failure_rates[..k]
    }

    pub fn summary(&self) -> Summary {
        let rates = self.failure_rates.iter().map(|m| m.failure_rate);
        let merchants = self.failure_rates.len();
        Summary {
            users: self.avg_per_user.len(),
            merchants,
            max_failure_rate: rates.clone().reduce(f64::max),
            avg_failure_rate: (merchants > 0).then(|| rates.sum::<f64>() / merchants as f64),
        }
    }
}

/// Figures printed once the results are saved. Failure-rate stats cover every
/// merchant, not only the displayed ones, and are `None` without merchants.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub users: usize,
    pub merchants: usize,
    pub max_failure_rate: Option<f64>,
    pub avg_failure_rate: Option<f64>,
}
