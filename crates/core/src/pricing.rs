//! Pricing
//!
//! Derives the order totals shown throughout checkout. Nothing here is stored:
//! totals are recomputed from the cart and the current form state every time
//! they are needed, so they cannot drift from what the patient selected.
//!
//! Amounts are kept exact. Rounding to the currency's minor unit only happens
//! for presentation, via [`round_for_display`].

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartItem},
    coupons::CouponOutcome,
    state::DeliveryMethod,
};

/// Decimal places kept for percentage-derived amounts.
///
/// Percentages are built from `f64`, so their products can carry binary noise far
/// below a cent. Clamping to a fixed working scale keeps totals exact and stable.
pub const WORKING_SCALE: u32 = 8;

/// Errors that can occur while deriving totals.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// No delivery method has been selected, so shipping is undefined.
    #[error("no delivery method selected; cannot price shipping")]
    NoDeliveryMethod,

    /// A line or discount amount overflowed the decimal range.
    #[error("amount overflowed while pricing line {0}")]
    Overflow(usize),

    /// The discount rate could not be applied to the subtotal.
    #[error("coupon discount overflowed")]
    DiscountOverflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Shipping cost per delivery method.
#[derive(Debug, Clone, Copy)]
pub struct ShippingRates<'a> {
    standard: Money<'a, Currency>,
    express: Money<'a, Currency>,
    pickup: Money<'a, Currency>,
}

impl<'a> ShippingRates<'a> {
    /// Create a rate table.
    pub fn new(
        standard: Money<'a, Currency>,
        express: Money<'a, Currency>,
        pickup: Money<'a, Currency>,
    ) -> Self {
        Self {
            standard,
            express,
            pickup,
        }
    }

    /// The storefront's flat rates: 15.00 standard, 30.00 express, free pickup.
    pub fn defaults(currency: &'a Currency) -> Self {
        Self::new(
            Money::from_minor(1_500, currency),
            Money::from_minor(3_000, currency),
            Money::from_minor(0, currency),
        )
    }

    /// Cost of shipping with `method`.
    pub fn cost(&self, method: DeliveryMethod) -> Money<'a, Currency> {
        match method {
            DeliveryMethod::Standard => self.standard,
            DeliveryMethod::Express => self.express,
            DeliveryMethod::Pickup => self.pickup,
        }
    }
}

/// Totals derived from the cart and the current selections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedTotals<'a> {
    subtotal: Money<'a, Currency>,
    shipping_cost: Money<'a, Currency>,
    coupon_discount: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> DerivedTotals<'a> {
    /// Sum of every line at its applied unit price
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Shipping for the selected delivery method
    pub fn shipping_cost(&self) -> Money<'a, Currency> {
        self.shipping_cost
    }

    /// Amount taken off by the coupon
    pub fn coupon_discount(&self) -> Money<'a, Currency> {
        self.coupon_discount
    }

    /// Amount the patient pays
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Currency of every amount
    pub fn currency(&self) -> &'a Currency {
        self.total.currency()
    }
}

/// Shipping cost of `method` under `rates`.
pub fn shipping_cost<'a>(method: DeliveryMethod, rates: &ShippingRates<'a>) -> Money<'a, Currency> {
    rates.cost(method)
}

/// Cost of a single cart line: applied unit price times quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the multiplication leaves the decimal range.
pub fn line_total<'a>(
    index: usize,
    item: &CartItem<'a>,
) -> Result<Money<'a, Currency>, PricingError> {
    let unit = item.unit_price_applied();

    let amount = unit
        .amount()
        .checked_mul(Decimal::from(item.quantity()))
        .ok_or(PricingError::Overflow(index))?;

    Ok(Money::from_decimal(amount, unit.currency()))
}

/// Sum of every line in the cart. An empty cart has a zero subtotal.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total overflowed.
/// - [`PricingError::Money`]: wrapped money arithmetic error.
pub fn subtotal<'a>(cart: &Cart<'a>) -> Result<Money<'a, Currency>, PricingError> {
    cart.iter()
        .enumerate()
        .try_fold(Money::from_minor(0, cart.currency()), |acc, (index, item)| {
            Ok(acc.add(line_total(index, item)?)?)
        })
}

/// Discount granted by the coupon outcome on `subtotal`.
///
/// Anything other than an accepted coupon yields a zero discount. The discount
/// never exceeds the subtotal and is never negative.
///
/// # Errors
///
/// Returns [`PricingError::DiscountOverflow`] if applying the rate overflows.
pub fn coupon_discount<'a>(
    subtotal: &Money<'a, Currency>,
    coupon: &CouponOutcome,
) -> Result<Money<'a, Currency>, PricingError> {
    let Some(rate) = coupon.rate() else {
        return Ok(Money::from_minor(0, subtotal.currency()));
    };

    let amount = percent_of(rate, *subtotal.amount())?
        .min(*subtotal.amount())
        .max(Decimal::ZERO);

    Ok(Money::from_decimal(amount, subtotal.currency()))
}

fn percent_of(rate: Percentage, amount: Decimal) -> Result<Decimal, PricingError> {
    (rate * Decimal::ONE)
        .checked_mul(amount)
        .map(|value| {
            value.round_dp_with_strategy(WORKING_SCALE, RoundingStrategy::MidpointAwayFromZero)
        })
        .ok_or(PricingError::DiscountOverflow)
}

/// Derive subtotal, shipping, coupon discount and grand total.
///
/// `total = subtotal + shipping_cost - coupon_discount`.
///
/// # Errors
///
/// - [`PricingError::NoDeliveryMethod`]: no delivery method is selected.
/// - [`PricingError::Overflow`] / [`PricingError::DiscountOverflow`]: arithmetic overflow.
/// - [`PricingError::Money`]: the shipping rates are in a different currency from the cart.
pub fn calculate_totals<'a>(
    cart: &Cart<'a>,
    delivery_method: Option<DeliveryMethod>,
    coupon: &CouponOutcome,
    rates: &ShippingRates<'a>,
) -> Result<DerivedTotals<'a>, PricingError> {
    let method = delivery_method.ok_or(PricingError::NoDeliveryMethod)?;

    let subtotal = subtotal(cart)?;
    let shipping_cost = shipping_cost(method, rates);
    let coupon_discount = coupon_discount(&subtotal, coupon)?;
    let total = subtotal.add(shipping_cost)?.sub(coupon_discount)?;

    debug!(
        subtotal = %subtotal.amount(),
        shipping = %shipping_cost.amount(),
        discount = %coupon_discount.amount(),
        total = %total.amount(),
        delivery_method = %method,
        "derived checkout totals"
    );

    Ok(DerivedTotals {
        subtotal,
        shipping_cost,
        coupon_discount,
        total,
    })
}

/// Round an amount to its currency's minor unit, half away from zero.
///
/// Only use this for presentation; derived totals stay exact.
pub fn round_for_display<'a>(money: &Money<'a, Currency>) -> Money<'a, Currency> {
    let currency = money.currency();
    let rounded = money
        .amount()
        .round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero);

    Money::from_decimal(rounded, currency)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{BRL, USD};
    use testresult::TestResult;

    use crate::{
        cart::CartItemUuid,
        coupons::{CouponValidator, LiteralCoupon},
    };

    use super::*;

    fn brl(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, BRL)
    }

    fn scenario_cart() -> Result<Cart<'static>, crate::cart::CartError> {
        Cart::with_items(
            [
                CartItem::new(CartItemUuid::now_v7(), "CBD Oil 10ml", brl(25_000), 1),
                CartItem::new(CartItemUuid::now_v7(), "CBD Oil 30ml", brl(38_000), 1)
                    .with_discount_price(brl(34_200)),
            ],
            BRL,
        )
    }

    #[test]
    fn subtotal_uses_discount_price_and_quantity() -> TestResult {
        let cart = Cart::with_items(
            [
                CartItem::new(CartItemUuid::now_v7(), "A", brl(1_000), 3),
                CartItem::new(CartItemUuid::now_v7(), "B", brl(2_000), 2)
                    .with_discount_price(brl(1_500)),
            ],
            BRL,
        )?;

        assert_eq!(subtotal(&cart)?, brl(6_000));

        Ok(())
    }

    #[test]
    fn empty_cart_totals_equal_shipping() -> TestResult {
        let cart = Cart::new(BRL);
        let coupon = LiteralCoupon::default().validate("WELCOME10");

        let totals = calculate_totals(
            &cart,
            Some(DeliveryMethod::Express),
            &coupon,
            &ShippingRates::defaults(BRL),
        )?;

        assert_eq!(totals.subtotal(), brl(0));
        assert_eq!(totals.coupon_discount(), brl(0));
        assert_eq!(totals.total(), brl(3_000));

        Ok(())
    }

    #[test]
    fn default_shipping_rates() {
        let rates = ShippingRates::defaults(BRL);

        assert_eq!(rates.cost(DeliveryMethod::Standard), brl(1_500));
        assert_eq!(rates.cost(DeliveryMethod::Express), brl(3_000));
        assert_eq!(rates.cost(DeliveryMethod::Pickup), brl(0));
    }

    #[test]
    fn standard_delivery_with_welcome_coupon() -> TestResult {
        let cart = scenario_cart()?;
        let coupon = LiteralCoupon::default().validate("WELCOME10");

        let totals = calculate_totals(
            &cart,
            Some(DeliveryMethod::Standard),
            &coupon,
            &ShippingRates::defaults(BRL),
        )?;

        assert_eq!(totals.subtotal(), brl(59_200));
        assert_eq!(totals.shipping_cost(), brl(1_500));
        assert_eq!(totals.coupon_discount(), brl(5_920));
        assert_eq!(totals.total(), brl(54_780));

        Ok(())
    }

    #[test]
    fn unknown_coupon_is_silently_ignored() -> TestResult {
        let cart = scenario_cart()?;
        let coupon = LiteralCoupon::default().validate("FREESTUFF");

        let totals = calculate_totals(
            &cart,
            Some(DeliveryMethod::Pickup),
            &coupon,
            &ShippingRates::defaults(BRL),
        )?;

        assert_eq!(totals.coupon_discount(), brl(0));
        assert_eq!(totals.total(), brl(59_200));

        Ok(())
    }

    #[test]
    fn missing_delivery_method_is_rejected() -> TestResult {
        let cart = scenario_cart()?;

        let result = calculate_totals(
            &cart,
            None,
            &CouponOutcome::Empty,
            &ShippingRates::defaults(BRL),
        );

        assert_eq!(result, Err(PricingError::NoDeliveryMethod));

        Ok(())
    }

    #[test]
    fn shipping_in_other_currency_errors() -> TestResult {
        let cart = scenario_cart()?;

        let result = calculate_totals(
            &cart,
            Some(DeliveryMethod::Standard),
            &CouponOutcome::Empty,
            &ShippingRates::defaults(USD),
        );

        assert!(matches!(result, Err(PricingError::Money(_))));

        Ok(())
    }

    #[test]
    fn discount_is_capped_at_subtotal() -> TestResult {
        let outcome = CouponOutcome::Accepted {
            rate: Percentage::from(2.0),
        };

        assert_eq!(coupon_discount(&brl(1_000), &outcome)?, brl(1_000));

        Ok(())
    }

    #[test]
    fn discount_keeps_fractions_of_a_cent() -> TestResult {
        let outcome = LiteralCoupon::default().validate("WELCOME10");
        let discount = coupon_discount(&brl(1_005), &outcome)?;

        assert_eq!(*discount.amount(), Decimal::new(1_005, 3));

        Ok(())
    }

    #[test]
    fn round_for_display_rounds_half_away_from_zero() {
        let money = Money::from_decimal(Decimal::new(1_005, 3), BRL);

        assert_eq!(round_for_display(&money), brl(101));
    }

    #[test]
    fn line_total_overflow_reports_line() {
        let item = CartItem::new(
            CartItemUuid::now_v7(),
            "A",
            Money::from_decimal(Decimal::MAX, BRL),
            2,
        );

        assert_eq!(line_total(3, &item), Err(PricingError::Overflow(3)));
    }
}
