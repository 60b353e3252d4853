use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type UserId = String;
pub type MerchantId = String;

/// Fractional digits kept for computed averages.
pub const SIGNIFICANT_DIGITS: u32 = 4;

/// A synthetic transaction as produced by the generator. Field order here is the
/// column order of the CSV output, and the field names are shared with the JSON
/// output, so don't shuffle them around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub user_id: UserId,
    pub user_name: String,
    pub merchant_id: MerchantId,
    pub merchant_name: String,
    pub transaction_type: TxType,
    pub transaction_amount: Decimal,
    pub currency: String,
    pub status: Status,
    pub transaction_date: DateTime<Utc>,
    pub location: String,
    pub account_number: String,
    pub description: String,
}

/// Settlement status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
    Pending,
    Declined,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::Pending => "PENDING",
            Status::Declined => "DECLINED",
        }
    }
}

/// Payment channel; purely descriptive, the analyzer never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxType {
    Pos,
    Atm,
    Online,
    Upi,
    Neft,
    Rtgs,
}

impl TxType {
    pub const ALL: [TxType; 6] = [
        TxType::Pos,
        TxType::Atm,
        TxType::Online,
        TxType::Upi,
        TxType::Neft,
        TxType::Rtgs,
    ];
}

/// One row of the analyzer input. Every field is optional because the input CSV
/// may carry empty cells, and each view decides on its own which nulls it can live
/// with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRow {
    pub user_id: Option<UserId>,
    pub merchant_id: Option<MerchantId>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
    pub date: Option<String>,
}

impl TransactionRow {
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some(Status::Failed.as_str())
    }
}

/// `(user_id, avg_transaction)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAverage {
    pub user_id: UserId,
    pub avg_transaction: Decimal,
}

/// `(merchant_id, total_txns, failed_txns, failure_rate)`; the rate is a fraction
/// in `[0, 1]`, it only becomes a percentage when printed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantFailureRate {
    pub merchant_id: MerchantId,
    pub total_txns: u64,
    pub failed_txns: u64,
    pub failure_rate: f64,
}

/// `(merchant_id, txn_count)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchantVolume {
    pub merchant_id: MerchantId,
    pub txn_count: u64,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Input file {} not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("No data found in the input file")]
    EmptyDataset,
    #[error("Input is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Line {line}: invalid value {value:?} in column {column}")]
    InvalidField {
        line: u64,
        column: String,
        value: String,
    },
    #[error("Amounts of user {0} add up beyond the representable range")]
    AmountOverflow(UserId),
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
