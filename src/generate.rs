//! Synthetic transaction generator.
//!
//! Users and merchants come from fixed pools so that the analyzer gets groups of a
//! meaningful size. All randomness flows through one seeded `StdRng`, and the time
//! window is anchored on an explicit instant, so a fixed seed and anchor always
//! reproduce the same dataset.

use crate::{
    data::{Error, Status, TransactionRecord, TxType},
    sample::WeightedChoice,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;
use std::{collections::HashSet, time::Instant};
use uuid::{Builder, Uuid};

/// Above this many records we only warn; there is nobody to ask for confirmation.
pub const LARGE_BATCH: i64 = 1_000_000;

/// Widest timestamp window accepted, a hundred years.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Priya", "Rohan", "Ananya", "Vikram", "Meera", "Arjun", "Kavya", "Ishaan", "Neha",
    "Kabir", "Diya", "Aditya", "Sara", "Rahul", "Pooja",
];
const LAST_NAMES: &[&str] = &[
    "Sharma", "Patel", "Iyer", "Reddy", "Gupta", "Nair", "Singh", "Das", "Mehta", "Rao", "Joshi",
    "Kapoor",
];
const MERCHANT_PREFIXES: &[&str] = &[
    "Sunrise", "Metro", "Blue Lotus", "Golden", "Urban", "Coastal", "Royal", "Green Leaf", "Star",
    "Silver Oak",
];
const MERCHANT_KINDS: &[&str] = &[
    "Traders", "Mart", "Electronics", "Pharmacy", "Foods", "Travels", "Fashion", "Fuels",
];
const CITIES: &[&str] = &[
    "Mumbai",
    "Delhi",
    "Kolkata",
    "Bangalore",
    "Hyderabad",
    "Chennai",
];
const DESCRIPTIONS: &[&str] = &[
    "Monthly utility payment",
    "Grocery purchase",
    "Online order checkout",
    "Fuel refill",
    "Restaurant bill",
    "Subscription renewal",
    "Electronics purchase",
    "Travel booking",
];

/// Configuration for the transaction generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of distinct users (`USER_0001` ..)
    pub user_pool: u32,
    /// Number of distinct merchants (`MERCHANT_001` ..)
    pub merchant_pool: u32,
    /// Smallest amount, inclusive, at least one cent
    pub min_amount: Decimal,
    /// Largest amount, inclusive
    pub max_amount: Decimal,
    /// Weight of each status; need not sum to anything in particular
    pub status_weights: Vec<(Status, u32)>,
    /// Timestamps fall within this many days before `anchor`
    pub window_days: u32,
    /// End of the timestamp window (None = now)
    pub anchor: Option<DateTime<Utc>>,
    pub currency: String,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            user_pool: 1000,
            merchant_pool: 50,
            min_amount: dec!(10.00),
            max_amount: dec!(1000.00),
            status_weights: vec![
                (Status::Success, 80),
                (Status::Failed, 15),
                (Status::Pending, 5),
            ],
            window_days: 30,
            anchor: None,
            currency: "INR".to_string(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.user_pool == 0 || self.merchant_pool == 0 {
            return Err(Error::InvalidArgument(
                "user and merchant pools must not be empty".into(),
            ));
        }
        if self.min_amount < dec!(0.01) {
            return Err(Error::InvalidArgument(format!(
                "minimum amount must be positive, got {}",
                self.min_amount
            )));
        }
        if self.max_amount < self.min_amount {
            return Err(Error::InvalidArgument(format!(
                "amount range {}..{} is empty",
                self.min_amount, self.max_amount
            )));
        }
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(Error::InvalidArgument(format!(
                "time window must be between 1 and {MAX_WINDOW_DAYS} days, got {}",
                self.window_days
            )));
        }
        Ok(())
    }

    fn cents(amount: Decimal) -> Result<i64, Error> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .ok_or_else(|| Error::InvalidArgument(format!("amount {amount} out of range")))
    }
}

/// Generates `TransactionRecord`s; keeps track of every id it handed out so that
/// ids stay unique for the lifetime of the generator, not just within one batch.
pub struct TransactionGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    statuses: WeightedChoice<Status>,
    cents: (i64, i64),
    anchor: DateTime<Utc>,
    issued: HashSet<Uuid>,
}

impl TransactionGenerator {
    /// Create a generator seeded from `config.seed`, or from the thread rng when
    /// there is none.
    pub fn new(config: GeneratorConfig) -> Result<Self, Error> {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: GeneratorConfig, rng: StdRng) -> Result<Self, Error> {
        config.validate()?;
        let statuses = WeightedChoice::new(config.status_weights.iter().copied())?;
        let cents = (
            GeneratorConfig::cents(config.min_amount)?,
            GeneratorConfig::cents(config.max_amount)?,
        );
        let anchor = config.anchor.unwrap_or_else(|| Utc::now().trunc_subsecs(0));
        // every timestamp lies between the window start and the anchor
        if anchor
            .checked_sub_signed(Duration::days(i64::from(config.window_days)))
            .is_none()
        {
            return Err(Error::InvalidArgument(format!(
                "a {} day window before {anchor} starts out of range",
                config.window_days
            )));
        }
        Ok(Self {
            config,
            rng,
            statuses,
            cents,
            anchor,
            issued: HashSet::new(),
        })
    }

    /// Generate `count` transactions. `count` is signed so that callers can hand us
    /// whatever the user typed; anything below one is rejected before doing any work.
    pub fn generate(&mut self, count: i64) -> Result<Vec<TransactionRecord>, Error> {
        if count <= 0 {
            return Err(Error::InvalidArgument(format!(
                "number of transactions must be positive, got {count}"
            )));
        }
        if count > LARGE_BATCH {
            log::warn!("Generating {count} transactions may take a while");
        }
        let n = usize::try_from(count)
            .map_err(|_| Error::InvalidArgument(format!("{count} transactions is too many")))?;

        log::info!("Generating {n} transactions...");
        let start = Instant::now();
        let step = n / 10;
        let mut transactions = Vec::with_capacity(n);
        for i in 1..=n {
            transactions.push(self.generate_one());
            if n > 1000 && i % step == 0 {
                let percent = i as f64 * 100.0 / n as f64;
                log::info!("Progress: {percent:.0}% ({i}/{n} transactions)");
            }
        }
        log::info!(
            "Generation completed in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        Ok(transactions)
    }

    /// Draw random v4 ids until one we haven't issued yet comes up.
    fn next_id(&mut self) -> Uuid {
        loop {
            let id = Builder::from_random_bytes(self.rng.gen()).into_uuid();
            if self.issued.insert(id) {
                return id;
            }
            log::debug!("Transaction id {id} collided, drawing again");
        }
    }

    fn generate_one(&mut self) -> TransactionRecord {
        let transaction_id = self.next_id().to_string();
        let user = self.rng.gen_range(1..=self.config.user_pool);
        let merchant = self.rng.gen_range(1..=self.config.merchant_pool);
        let transaction_type = *TxType::ALL.choose(&mut self.rng).unwrap_or(&TxType::Pos);
        let transaction_amount = Decimal::new(self.rng.gen_range(self.cents.0..=self.cents.1), 2);
        let status = *self.statuses.sample(&mut self.rng);
        let minutes = self.rng.gen_range(0..i64::from(self.config.window_days) * 24 * 60);
        let location = pick(&mut self.rng, CITIES);
        let account_number = format!("ACC{}", self.rng.gen_range(100_000_000..1_000_000_000u32));
        let description = pick(&mut self.rng, DESCRIPTIONS);

        TransactionRecord {
            transaction_id,
            user_id: user_id(user),
            user_name: user_name(user),
            merchant_id: merchant_id(merchant),
            merchant_name: merchant_name(merchant),
            transaction_type,
            transaction_amount,
            currency: self.config.currency.clone(),
            status,
            transaction_date: self.anchor - Duration::minutes(minutes),
            location,
            account_number,
            description,
        }
    }
}

fn pick(rng: &mut StdRng, words: &[&str]) -> String {
    words.choose(rng).copied().unwrap_or_default().to_string()
}

pub fn user_id(n: u32) -> String {
    format!("USER_{n:04}")
}

pub fn merchant_id(n: u32) -> String {
    format!("MERCHANT_{n:03}")
}

/// Names are a pure function of the pool index, so a given id always carries the
/// same name across the dataset.
fn user_name(n: u32) -> String {
    let n = n as usize;
    format!(
        "{} {}",
        FIRST_NAMES[n % FIRST_NAMES.len()],
        LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()]
    )
}

fn merchant_name(n: u32) -> String {
    let n = n as usize;
    format!(
        "{} {}",
        MERCHANT_PREFIXES[n % MERCHANT_PREFIXES.len()],
        MERCHANT_KINDS[(n / MERCHANT_PREFIXES.len()) % MERCHANT_KINDS.len()]
    )
}
