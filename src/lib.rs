//! Synthetic banking transactions and the aggregate views computed over them.
//!
//! Two independent flows share this crate:
//! * the generator ([`generate::TransactionGenerator`]) produces seeded, reproducible
//!   datasets that [`write`] persists as CSV and JSON;
//! * the analyzer loads a CSV with [`read::load_dataset`], derives the views in
//!   [`compute::Analysis`], prints them through [`report`] and saves them with
//!   [`write::save_analysis`].

pub mod compute;
pub mod data;
pub mod generate;
pub mod read;
pub mod report;
pub mod sample;
pub mod write;

pub use data::Error;
