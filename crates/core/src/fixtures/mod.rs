//! Fixtures
//!
//! YAML-backed carts and address books, laid out as
//! `<base>/carts/<name>.yml` and `<base>/addresses/<name>.yml`.

use std::{fs, path::PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    addresses::{AddressBook, AddressError},
    cart::{Cart, CartError},
    fixtures::{addresses::AddressesFixture, cart::CartFixture},
};

pub mod addresses;
pub mod cart;

pub use cart::{parse_currency, parse_percentage, parse_price};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),

    /// Address book creation error
    #[error("Failed to create address book: {0}")]
    Address(#[from] AddressError),
}

/// Loads carts and address books from a fixture directory.
#[derive(Debug, Clone)]
pub struct Fixture {
    base_path: PathBuf,
}

impl Fixture {
    /// Fixture set rooted at `./fixtures`
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Fixture set rooted at `base_path`
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load the cart named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is malformed,
    /// or the cart itself is invalid (zero quantity, mixed currencies).
    pub fn load_cart(&self, name: &str) -> Result<Cart<'static>, FixtureError> {
        let fixture: CartFixture = self.read("carts", name)?;

        fixture.try_into()
    }

    /// Load the address book named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the book has
    /// duplicate identifiers or more than one default.
    pub fn load_addresses(&self, name: &str) -> Result<AddressBook, FixtureError> {
        let fixture: AddressesFixture = self.read("addresses", name)?;

        Ok(AddressBook::with_addresses(fixture.addresses)?)
    }

    fn read<T: DeserializeOwned>(&self, category: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        debug!(path = %file_path.display(), "loading fixture");

        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
