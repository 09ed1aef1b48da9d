//! JSON-based assumption loader

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::MarketAssumptions;
use crate::error::LoadError;

/// Default location of the assumptions override file
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/market_assumptions.json";

/// Load assumptions from a JSON file and validate them
///
/// Fields missing from the file keep their defaults.
pub fn load_assumptions<P: AsRef<Path>>(path: P) -> Result<MarketAssumptions, LoadError> {
    let file = File::open(path.as_ref())?;
    load_assumptions_from_reader(BufReader::new(file))
}

/// Load assumptions from any reader
pub fn load_assumptions_from_reader<R: std::io::Read>(reader: R) -> Result<MarketAssumptions, LoadError> {
    let assumptions: MarketAssumptions = serde_json::from_reader(reader)?;
    assumptions.validate()?;
    Ok(assumptions)
}

/// Load the default override file, falling back to built-in defaults when it
/// does not exist
pub fn load_default_assumptions() -> Result<MarketAssumptions, LoadError> {
    let path = Path::new(DEFAULT_ASSUMPTIONS_PATH);
    if path.exists() {
        log::info!("loading market assumptions from {}", path.display());
        load_assumptions(path)
    } else {
        Ok(MarketAssumptions::default())
    }
}
