//! Addresses

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Address identifier.
pub type AddressUuid = TypedUuid<Address>;

/// Errors raised while building an address book.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    /// Two addresses share an identifier.
    #[error("address {0} appears more than once")]
    DuplicateAddress(AddressUuid),

    /// More than one address is flagged as the default.
    #[error("more than one default address")]
    MultipleDefaults,
}

/// A delivery address on file for the patient.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Address {
    /// Address identifier
    pub uuid: AddressUuid,

    /// Street name
    pub street: String,

    /// Building number
    pub number: String,

    /// Apartment, block, etc.
    #[serde(default)]
    pub complement: Option<String>,

    /// Neighborhood
    pub neighborhood: String,

    /// City
    pub city: String,

    /// State abbreviation
    pub state: String,

    /// Postal code (CEP)
    pub postal_code: String,

    /// Whether this is the patient's default address
    #[serde(default)]
    pub is_default: bool,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.street, self.number)?;

        if let Some(complement) = self.complement.as_deref().filter(|c| !c.is_empty()) {
            write!(f, " - {complement}")?;
        }

        write!(
            f,
            ", {}, {}/{}, {}",
            self.neighborhood, self.city, self.state, self.postal_code
        )
    }
}

/// The read-only list of addresses checkout may select from.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    addresses: Vec<Address>,
}

impl AddressBook {
    /// Build an address book.
    ///
    /// # Errors
    ///
    /// - [`AddressError::DuplicateAddress`]: an identifier appears more than once.
    /// - [`AddressError::MultipleDefaults`]: more than one address is flagged as default.
    pub fn with_addresses(addresses: impl Into<Vec<Address>>) -> Result<Self, AddressError> {
        let addresses = addresses.into();
        let mut seen = FxHashSet::default();

        for address in &addresses {
            if !seen.insert(address.uuid) {
                return Err(AddressError::DuplicateAddress(address.uuid));
            }
        }

        if addresses.iter().filter(|a| a.is_default).count() > 1 {
            return Err(AddressError::MultipleDefaults);
        }

        Ok(Self { addresses })
    }

    /// Look up an address by identifier.
    pub fn get(&self, uuid: AddressUuid) -> Option<&Address> {
        self.addresses.iter().find(|address| address.uuid == uuid)
    }

    /// Whether the book holds the given address.
    pub fn contains(&self, uuid: AddressUuid) -> bool {
        self.get(uuid).is_some()
    }

    /// The address flagged as default, if any.
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|address| address.is_default)
    }

    /// Iterate over the addresses in order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
