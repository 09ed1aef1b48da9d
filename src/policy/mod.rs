//! Policy records and intake parsing

mod data;
mod form;
pub mod loader;

pub use data::{Insurer, PolicyRecord, PolicyTerm, PolicyType, MAX_PROJECTION_YEARS};
pub use form::PolicyForm;
pub use loader::{load_listings, load_listings_from_reader, Listing};
