//! Static configuration for the calculation engines: country tax profiles
//! and bracket tables.

pub mod builtin;
pub mod loader;
pub mod profile;

pub use loader::{TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord, TaxTables};
pub use profile::{CountryProfile, ProfileLoader, ProfileLoaderError, TaxProfile};
