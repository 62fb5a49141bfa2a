//! Address Fixtures

use serde::Deserialize;

use crate::addresses::Address;

/// Wrapper for addresses in YAML
#[derive(Debug, Deserialize)]
pub struct AddressesFixture {
    /// Addresses on file, in display order
    pub addresses: Vec<Address>,
}
