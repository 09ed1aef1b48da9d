//! Load policy listings from CSV exports
//!
//! Columns use the listing form's names (`policyType`, `company`,
//! `annualPremium`, ...); see [`PolicyForm`].

use csv::{Reader, ReaderBuilder, Trim};
use std::path::Path;

use super::{PolicyForm, PolicyRecord};
use crate::error::LoadError;

/// A listing row: the policy plus the seller's asking price, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub policy: PolicyRecord,
    pub asking_price: Option<f64>,
}

/// Load all listings from a CSV file
pub fn load_listings<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, LoadError> {
    let reader = reader_builder().from_path(path)?;
    read_listings(reader)
}

/// Load listings from any reader (e.g., string buffer, request body)
pub fn load_listings_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Listing>, LoadError> {
    read_listings(reader_builder().from_reader(reader))
}

/// Fields and headers are trimmed so hand-edited files load
fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.trim(Trim::All);
    builder
}

fn read_listings<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<Listing>, LoadError> {
    let mut listings = Vec::new();

    for (idx, result) in reader.deserialize::<PolicyForm>().enumerate() {
        // Header is line 1
        let row = idx + 2;
        let form = result?;
        let asking_price = form
            .asking_price()
            .map_err(|source| LoadError::Row { row, source })?;
        let policy = form
            .into_record()
            .map_err(|source| LoadError::Row { row, source })?;
        listings.push(Listing { policy, asking_price });
    }

    log::debug!("loaded {} listings", listings.len());
    Ok(listings)
}
