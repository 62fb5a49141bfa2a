//! Cart Fixtures

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{BRL, Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    cart::{Cart, CartItem, CartItemUuid},
    fixtures::FixtureError,
};

/// Cart in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// ISO code of the cart currency (e.g., "BRL")
    pub currency: String,

    /// Cart lines
    #[serde(default)]
    pub items: Vec<CartItemFixture>,
}

/// Cart Item Fixture
#[derive(Debug, Deserialize)]
pub struct CartItemFixture {
    /// Item identifier; generated when omitted
    pub id: Option<CartItemUuid>,

    /// Product name
    pub name: String,

    /// Unit price (e.g., "250.00 BRL")
    pub price: String,

    /// Discounted unit price, if any
    pub discount_price: Option<String>,

    /// Quantity
    pub quantity: u32,

    /// Image reference
    pub image: Option<String>,
}

impl TryFrom<CartItemFixture> for CartItem<'static> {
    type Error = FixtureError;

    fn try_from(fixture: CartItemFixture) -> Result<Self, Self::Error> {
        let uuid = fixture.id.unwrap_or_else(CartItemUuid::now_v7);
        let mut item = CartItem::new(uuid, fixture.name, parse_price(&fixture.price)?, fixture.quantity);

        if let Some(discount_price) = fixture.discount_price {
            item = item.with_discount_price(parse_price(&discount_price)?);
        }

        if let Some(image) = fixture.image {
            item = item.with_image(image);
        }

        Ok(item)
    }
}

impl TryFrom<CartFixture> for Cart<'static> {
    type Error = FixtureError;

    fn try_from(fixture: CartFixture) -> Result<Self, Self::Error> {
        let currency = parse_currency(&fixture.currency)?;
        let items = fixture
            .items
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items, currency)?)
    }
}

/// Look up a supported ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for any code other than BRL, USD, EUR or GBP.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "BRL" => Ok(BRL),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "GBP" => Ok(GBP),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "250.00 BRL") into an exact amount.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal number, or if the currency code is not
/// recognized.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    Ok(Money::from_decimal(amount, parse_currency(currency_code)?))
}

/// Parse percentage string (e.g., "10%" or "0.10") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string is not a decimal number, or if the rate is
/// negative or above 100%.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let invalid = || FixtureError::InvalidPercentage(s.to_string());
    let trimmed = s.trim();

    let rate = match trimmed.strip_suffix('%') {
        Some(percent_str) => percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| invalid())?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(invalid)?,
        None => trimmed.parse::<Decimal>().map_err(|_err| invalid())?,
    };

    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(invalid());
    }

    Ok(Percentage::from(rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_keeps_exact_amount() -> Result<(), FixtureError> {
        let price = parse_price("342.00 BRL")?;

        assert_eq!(price, Money::from_minor(34_200, BRL));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("250.00BRL");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price("-1.00 BRL");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_percentage_accepts_both_formats() -> Result<(), FixtureError> {
        assert_eq!(parse_percentage("10%")?, Percentage::from(Decimal::new(1, 1)));
        assert_eq!(parse_percentage(" 0.1 ")?, Percentage::from(Decimal::new(1, 1)));
        assert_eq!(parse_percentage("100%")?, Percentage::from(Decimal::ONE));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_non_finite_and_out_of_range_rates() {
        for input in ["NaN", "inf", "-inf", "-5%", "-0.1", "150%", "1.5"] {
            assert!(
                matches!(
                    parse_percentage(input),
                    Err(FixtureError::InvalidPercentage(value)) if value == input
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        let result = parse_percentage("ten");

        assert!(matches!(result, Err(FixtureError::InvalidPercentage(_))));
    }
}
