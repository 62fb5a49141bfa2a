//! Cart

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Cart item identifier.
pub type CartItemUuid = TypedUuid<CartItem<'static>>;

/// Errors related to cart construction.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// An item was added with a quantity of zero.
    #[error("Item {0} has a quantity of zero")]
    ZeroQuantity(usize),

    /// An item was not found in the cart.
    #[error("Item {0} not found")]
    ItemNotFound(usize),
}

/// A product line the patient is about to purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct CartItem<'a> {
    uuid: CartItemUuid,
    name: String,
    price: Money<'a, Currency>,
    discount_price: Option<Money<'a, Currency>>,
    quantity: u32,
    image: Option<String>,
}

impl<'a> CartItem<'a> {
    /// Create a new item at full price.
    pub fn new(
        uuid: CartItemUuid,
        name: impl Into<String>,
        price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            price,
            discount_price: None,
            quantity,
            image: None,
        }
    }

    /// Set a discounted unit price that replaces the base price.
    #[must_use]
    pub fn with_discount_price(mut self, discount_price: Money<'a, Currency>) -> Self {
        self.discount_price = Some(discount_price);
        self
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Item identifier
    pub fn uuid(&self) -> CartItemUuid {
        self.uuid
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base unit price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Discounted unit price, if any
    pub fn discount_price(&self) -> Option<&Money<'a, Currency>> {
        self.discount_price.as_ref()
    }

    /// The unit price actually charged: the discounted price when present.
    pub fn unit_price_applied(&self) -> &Money<'a, Currency> {
        self.discount_price.as_ref().unwrap_or(&self.price)
    }

    /// Quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Image reference
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

/// The read-only cart handed to checkout.
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    items: Vec<CartItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given items.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`]: an item's price or discounted price is in another currency.
    /// - [`CartError::ZeroQuantity`]: an item has a quantity of zero.
    pub fn with_items(
        items: impl Into<Vec<CartItem<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            if item.quantity == 0 {
                return Err(CartError::ZeroQuantity(i));
            }

            let prices = std::iter::once(&item.price).chain(item.discount_price.as_ref());

            for price in prices {
                let item_currency = price.currency();

                if item_currency != currency {
                    return Err(CartError::CurrencyMismatch(
                        i,
                        item_currency.iso_alpha_code,
                        currency.iso_alpha_code,
                    ));
                }
            }

            Ok(())
        })?;

        Ok(Cart { items, currency })
    }

    /// Get an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns a `CartError::ItemNotFound` if the item is not found.
    pub fn get_item(&self, item: usize) -> Result<&CartItem<'a>, CartError> {
        self.items.get(item).ok_or(CartError::ItemNotFound(item))
    }

    /// Iterate over the items in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem<'a>> {
        self.items.iter()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
