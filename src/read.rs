use crate::{
    compute::Dataset,
    data::{Error, TransactionRow},
};
use rust_decimal::Decimal;
use std::{fs::File, path::Path, str::FromStr};

/// Trait for doing something with a `TransactionRow` read from a CSV file
/// (or received from elsewhere). `Dataset` collects them for the analyzer; tests
/// use their own sinks to check what the reader produced.
pub trait TransactionUser {
    fn use_tx(&mut self, tx: TransactionRow) -> Result<(), Error>;
}

/// Accepted header names for each column the analyzer needs, first match wins.
/// The generator writes the first spelling; the others cover hand-made exports.
const USER_COLUMNS: &[&str] = &["user_id", "customer_id"];
const MERCHANT_COLUMNS: &[&str] = &["merchant_id", "merchant_name"];
const AMOUNT_COLUMNS: &[&str] = &["transaction_amount", "amount"];
const STATUS_COLUMNS: &[&str] = &["status"];
const DATE_COLUMNS: &[&str] = &["transaction_date", "timestamp", "date"];

/// Position of every required column in the input, resolved once from the header
/// so that a bad file is rejected before we look at a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    user: usize,
    merchant: usize,
    amount: usize,
    status: usize,
    date: usize,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, Error> {
        let mut missing = Vec::new();
        let mut find = |names: &[&str]| {
            let found = names
                .iter()
                .find_map(|name| headers.iter().position(|h| h == *name));
            if found.is_none() {
                missing.push(names.join("/"));
            }
            found.unwrap_or_default()
        };
        let columns = Columns {
            user: find(USER_COLUMNS),
            merchant: find(MERCHANT_COLUMNS),
            amount: find(AMOUNT_COLUMNS),
            status: find(STATUS_COLUMNS),
            date: find(DATE_COLUMNS),
        };
        if missing.is_empty() {
            Ok(columns)
        } else {
            Err(Error::MissingColumns(missing))
        }
    }

    fn row(&self, record: &csv::StringRecord) -> Result<TransactionRow, Error> {
        let cell = |idx: usize| record.get(idx).filter(|v| !v.is_empty());
        let amount = match cell(self.amount) {
            Some(value) => Some(Decimal::from_str(value).map_err(|_| Error::InvalidField {
                line: record.position().map_or(0, |p| p.line()),
                column: AMOUNT_COLUMNS.join("/"),
                value: value.to_string(),
            })?),
            None => None,
        };
        Ok(TransactionRow {
            user_id: cell(self.user).map(str::to_string),
            merchant_id: cell(self.merchant).map(str::to_string),
            amount,
            status: cell(self.status).map(str::to_string),
            date: cell(self.date).map(str::to_string),
        })
    }
}

/// CSV importer for `TransactionRow`s. Returns the number of data rows read.
/// Short rows are fine, their missing trailing cells simply read as nulls.
pub fn read_transactions<R: std::io::Read, U: TransactionUser>(
    reader: R,
    user: &mut U,
) -> Result<u64, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;
    let mut count = 0;
    for result in rdr.records() {
        let record = result?;
        user.use_tx(columns.row(&record)?)?;
        count += 1;
    }
    Ok(count)
}

/// Open `path` and load it whole. A missing file and a file without data rows are
/// both reported before any analysis starts.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, Error> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let mut dataset = Dataset::new();
    let count = read_transactions(File::open(path)?, &mut dataset)?;
    if count == 0 {
        return Err(Error::EmptyDataset);
    }
    log::info!("Total records loaded: {count}");
    Ok(dataset)
}
