use crate::{
    compute::Analysis,
    data::{Error, MerchantFailureRate, MerchantVolume, TransactionRecord, UserAverage},
};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// A derived table that gets persisted to its own CSV file. The header is written
/// by hand so that an empty view still produces a file with the right columns.
pub trait ResultView: Serialize {
    const FILE_NAME: &'static str;
    const HEADER: &'static [&'static str];
}

impl ResultView for UserAverage {
    const FILE_NAME: &'static str = "avg_transaction_per_user.csv";
    const HEADER: &'static [&'static str] = &["user_id", "avg_transaction"];
}

impl ResultView for MerchantFailureRate {
    const FILE_NAME: &'static str = "failure_rate_per_merchant.csv";
    const HEADER: &'static [&'static str] =
        &["merchant_id", "total_txns", "failed_txns", "failure_rate"];
}

impl ResultView for MerchantVolume {
    const FILE_NAME: &'static str = "top_5_merchants.csv";
    const HEADER: &'static [&'static str] = &["merchant_id", "txn_count"];
}

/// CSV exporter for any `ResultView`
pub fn write_view<W: Write, V: ResultView>(writer: W, rows: &[V]) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(V::HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn save_view<V: ResultView>(dir: &Path, rows: &[V]) -> Result<PathBuf, Error> {
    let path = dir.join(V::FILE_NAME);
    write_view(BufWriter::new(File::create(&path)?), rows)?;
    Ok(path)
}

/// Outcome of persisting the analysis: each file succeeds or fails on its own.
#[derive(Debug)]
pub struct SaveReport {
    pub dir: PathBuf,
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(&'static str, Error)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, name: &'static str, result: Result<PathBuf, Error>) {
        match result {
            Ok(path) => {
                log::info!("Saved {}", path.display());
                self.saved.push(path);
            }
            Err(e) => {
                log::error!("Could not save {name}: {e}");
                self.failed.push((name, e));
            }
        }
    }
}

/// Write the three views under `dir`, creating it if needed. Nothing here can fail
/// the analysis: a directory that can't be created just makes every file fail, and
/// one file failing doesn't stop the others from being attempted.
pub fn save_analysis<P: AsRef<Path>>(dir: P, analysis: &Analysis) -> SaveReport {
    let dir = dir.as_ref();
    if let Err(e) = fs::create_dir_all(dir) {
        log::error!("Could not create results directory {}: {e}", dir.display());
    }
    let mut report = SaveReport {
        dir: dir.to_path_buf(),
        saved: Vec::new(),
        failed: Vec::new(),
    };
    report.record(
        UserAverage::FILE_NAME,
        save_view(dir, &analysis.avg_per_user),
    );
    report.record(
        MerchantFailureRate::FILE_NAME,
        save_view(dir, &analysis.failure_rates),
    );
    report.record(
        MerchantVolume::FILE_NAME,
        save_view(dir, &analysis.top_merchants),
    );
    report
}

/// Basic CSV exporter for generated `TransactionRecord`s
pub fn write_records_csv<W: Write>(writer: W, records: &[TransactionRecord]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// JSON exporter: one pretty-printed array of objects.
pub fn write_records_json<W: Write>(
    mut writer: W,
    records: &[TransactionRecord],
) -> Result<(), Error> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Create `path` (and its missing parent directories) for writing.
fn create_with_parents(path: &Path) -> Result<BufWriter<File>, Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            log::info!("Created directory {}", parent.display());
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

pub fn save_records_csv<P: AsRef<Path>>(
    path: P,
    records: &[TransactionRecord],
) -> Result<(), Error> {
    write_records_csv(create_with_parents(path.as_ref())?, records)?;
    log::info!("Saved CSV to {}", path.as_ref().display());
    Ok(())
}

pub fn save_records_json<P: AsRef<Path>>(
    path: P,
    records: &[TransactionRecord],
) -> Result<(), Error> {
    write_records_json(create_with_parents(path.as_ref())?, records)?;
    log::info!("Saved JSON to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{save_analysis, save_records_csv, save_records_json, write_view, ResultView};
    use crate::{
        compute::{Analysis, Dataset, TopK},
        data::{MerchantFailureRate, MerchantVolume, Status, TransactionRecord, TxType, UserAverage},
        read::load_dataset,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::fs;

    const SCENARIO: &str = "\
user_id,merchant_id,transaction_amount,status,transaction_date
U1,M1,100,SUCCESS,2024-05-01
U1,M1,50,FAILED,2024-05-02
U2,M1,200,SUCCESS,2024-05-03
U2,M2,300,SUCCESS,2024-05-04
";

    fn analyze(input: &std::path::Path) -> Analysis {
        Analysis::run(&load_dataset(input).unwrap(), TopK::default()).unwrap()
    }

    #[test]
    fn empty_view_keeps_header() {
        let mut out = Vec::new();
        write_view::<_, MerchantVolume>(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "merchant_id,txn_count\n");
    }

    #[test]
    fn saved_views() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("transactions.csv");
        fs::write(&input, SCENARIO).unwrap();
        let results = dir.path().join("analysis_results");

        let report = save_analysis(&results, &analyze(&input));
        assert!(report.is_complete());
        assert_eq!(report.saved.len(), 3);

        let read = |name: &str| fs::read_to_string(results.join(name)).unwrap();
        assert_eq!(
            read(UserAverage::FILE_NAME),
            "user_id,avg_transaction\nU1,75\nU2,250\n"
        );
        assert_eq!(
            read(MerchantFailureRate::FILE_NAME),
            "merchant_id,total_txns,failed_txns,failure_rate\n\
             M1,3,1,0.3333333333333333\n\
             M2,1,0,0.0\n"
        );
        assert_eq!(
            read(MerchantVolume::FILE_NAME),
            "merchant_id,txn_count\nM1,3\nM2,1\n"
        );
    }

    #[test]
    fn reruns_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("transactions.csv");
        let mut csv =
            String::from("user_id,merchant_id,transaction_amount,status,transaction_date\n");
        for i in 0..500 {
            let status = if i % 7 == 0 { "FAILED" } else { "SUCCESS" };
            csv.push_str(&format!(
                "USER_{:04},MERCHANT_{:03},{}.{:02},{status},2024-05-01\n",
                i % 37,
                i % 11,
                i % 90 + 10,
                i % 100
            ));
        }
        fs::write(&input, csv).unwrap();

        let first = dir.path().join("first");
        let second = dir.path().join("second");
        save_analysis(&first, &analyze(&input));
        save_analysis(&second, &analyze(&input));
        for name in [
            UserAverage::FILE_NAME,
            MerchantFailureRate::FILE_NAME,
            MerchantVolume::FILE_NAME,
        ] {
            assert_eq!(
                fs::read(first.join(name)).unwrap(),
                fs::read(second.join(name)).unwrap(),
                "{name} differs"
            );
        }
    }

    #[test]
    fn one_failing_file_does_not_stop_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        // a directory squatting on the file name makes that one write fail
        fs::create_dir_all(results.join(MerchantFailureRate::FILE_NAME)).unwrap();

        let dataset = Dataset::from(Vec::new());
        let analysis = Analysis::run(&dataset, TopK::default()).unwrap();
        let report = save_analysis(&results, &analysis);

        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, MerchantFailureRate::FILE_NAME);
        assert!(results.join(UserAverage::FILE_NAME).is_file());
        assert!(results.join(MerchantVolume::FILE_NAME).is_file());
        // the computed views are untouched
        assert!(analysis.failure_rates.is_empty());
    }

    #[test]
    fn unusable_directory_fails_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let analysis = Analysis::run(&Dataset::from(Vec::new()), TopK::default()).unwrap();
        let report = save_analysis(blocker.join("results"), &analysis);
        assert!(report.saved.is_empty());
        assert_eq!(report.failed.len(), 3);
    }

    #[test]
    fn generated_records_round_trip_through_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![TransactionRecord {
            transaction_id: "00000000-0000-4000-8000-000000000001".into(),
            user_id: "USER_0001".into(),
            user_name: "Priya Sharma".into(),
            merchant_id: "MERCHANT_001".into(),
            merchant_name: "Metro Mart".into(),
            transaction_type: TxType::Upi,
            transaction_amount: dec!(123.45),
            currency: "INR".into(),
            status: Status::Failed,
            transaction_date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            location: "Chennai".into(),
            account_number: "ACC123456789".into(),
            description: "Fuel refill, full tank".into(),
        }];
        let csv_path = dir.path().join("out/nested/transactions.csv");
        let json_path = dir.path().join("out/nested/transactions.json");
        save_records_csv(&csv_path, &records).unwrap();
        save_records_json(&json_path, &records).unwrap();

        let csv = fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with(
            "transaction_id,user_id,user_name,merchant_id,merchant_name,transaction_type,\
             transaction_amount,currency,status,transaction_date,location,account_number,\
             description\n"
        ));
        assert!(csv.contains(",UPI,123.45,INR,FAILED,2024-05-01T10:30:00Z,"));

        let back: Vec<TransactionRecord> =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, records);

        let dataset = load_dataset(&csv_path).unwrap();
        assert_eq!(dataset.len(), 1);
        let row = &dataset.rows()[0];
        assert_eq!(row.user_id.as_deref(), Some("USER_0001"));
        assert_eq!(row.merchant_id.as_deref(), Some("MERCHANT_001"));
        assert_eq!(row.amount, Some(dec!(123.45)));
        assert!(row.is_failed());
    }
}
