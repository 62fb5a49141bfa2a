//! Order confirmation
//!
//! The immutable summary shown once the gateway has accepted an order. It is a
//! snapshot: later changes to the cart or the form cannot alter it.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    addresses::{Address, AddressBook},
    cart::Cart,
    order::OrderId,
    pricing::{DerivedTotals, PricingError, line_total, round_for_display},
    state::{CheckoutState, DeliveryMethod, PaymentMethod},
};

/// One purchased line.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationLine<'a> {
    name: String,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> ConfirmationLine<'a> {
    /// Product name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quantity purchased
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price charged
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.unit_price
    }

    /// Line total
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }
}

/// Post-submission summary of a placed order.
#[derive(Debug, Clone)]
pub struct Confirmation<'a> {
    order_id: OrderId,
    submitted_at: Timestamp,
    delivery_method: Option<DeliveryMethod>,
    address: Option<Address>,
    payment_method: PaymentMethod,
    installments: Option<u8>,
    card_last4: Option<String>,
    lines: SmallVec<[ConfirmationLine<'a>; 8]>,
    totals: DerivedTotals<'a>,
    notes: Option<String>,
}

impl<'a> Confirmation<'a> {
    /// Snapshot the order that was just accepted as `order_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if a line total cannot be computed.
    pub fn new(
        order_id: OrderId,
        submitted_at: Timestamp,
        state: &CheckoutState,
        cart: &Cart<'a>,
        addresses: &AddressBook,
        totals: DerivedTotals<'a>,
    ) -> Result<Self, PricingError> {
        let lines = cart
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Ok(ConfirmationLine {
                    name: item.name().to_string(),
                    quantity: item.quantity(),
                    unit_price: *item.unit_price_applied(),
                    total: line_total(index, item)?,
                })
            })
            .collect::<Result<_, PricingError>>()?;

        let delivery_method = state.delivery_method();
        let address = delivery_method
            .filter(|method| method.requires_address())
            .and(state.selected_address())
            .and_then(|uuid| addresses.get(uuid))
            .cloned();

        let is_credit = state.payment_method() == PaymentMethod::Credit;
        let notes = state.order_notes().trim();

        Ok(Self {
            order_id,
            submitted_at,
            delivery_method,
            address,
            payment_method: state.payment_method(),
            installments: is_credit.then_some(state.card().installments),
            card_last4: is_credit.then(|| state.card().last4()).flatten(),
            lines,
            totals,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }

    /// Identifier issued by the gateway
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// When the gateway accepted the order
    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    /// Delivery method
    pub fn delivery_method(&self) -> Option<DeliveryMethod> {
        self.delivery_method
    }

    /// Delivery address; `None` for pickup
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Payment method
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Installments, for credit payments
    pub fn installments(&self) -> Option<u8> {
        self.installments
    }

    /// Purchased lines
    pub fn items(&self) -> &[ConfirmationLine<'a>] {
        &self.lines
    }

    /// Totals at submission time
    pub fn totals(&self) -> &DerivedTotals<'a> {
        &self.totals
    }

    /// Order notes
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Render the summary, one line of text per entry.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 8);

        out.push(format!("Order {} placed at {}", self.order_id, self.submitted_at));

        for line in &self.lines {
            out.push(format!(
                "  {} x {} @ {} = {}",
                line.quantity,
                line.name,
                display_amount(&line.unit_price),
                display_amount(&line.total),
            ));
        }

        match (self.delivery_method, &self.address) {
            (Some(method), Some(address)) => out.push(format!("Delivery: {method} to {address}")),
            (Some(method), None) => out.push(format!("Delivery: {method}")),
            (None, _) => {}
        }

        let mut payment = format!("Payment: {}", self.payment_method);

        if let Some(installments) = self.installments {
            payment.push_str(&format!(", {installments}x"));
        }

        if let Some(last4) = &self.card_last4 {
            payment.push_str(&format!(", card ending {last4}"));
        }

        out.push(payment);
        out.extend(totals_lines(&self.totals));

        if let Some(notes) = &self.notes {
            out.push(format!("Notes: {notes}"));
        }

        out
    }
}

/// Render derived totals as summary lines. The discount line is omitted when zero.
pub fn totals_lines(totals: &DerivedTotals<'_>) -> Vec<String> {
    let mut out = vec![
        format!("Subtotal: {}", display_amount(&totals.subtotal())),
        format!("Shipping: {}", display_amount(&totals.shipping_cost())),
    ];

    if !totals.coupon_discount().amount().is_zero() {
        out.push(format!(
            "Coupon discount: -{}",
            display_amount(&totals.coupon_discount())
        ));
    }

    out.push(format!("Total: {}", display_amount(&totals.total())));

    out
}

/// Format an amount for the patient: currency symbol, then the value rounded half
/// away from zero to the currency's minor unit.
pub fn display_amount(money: &Money<'_, Currency>) -> String {
    let rounded = round_for_display(money);
    let currency = rounded.currency();

    format!(
        "{} {:.*}",
        currency.symbol,
        currency.exponent as usize,
        rounded.amount()
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::BRL;
    use testresult::TestResult;

    use crate::{
        addresses::AddressUuid,
        cart::{CartItem, CartItemUuid},
        coupons::{CouponValidator, LiteralCoupon},
        pricing::{ShippingRates, calculate_totals},
        state::CheckoutField,
    };

    use super::*;

    fn brl(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, BRL)
    }

    fn fixture() -> TestResult<(Cart<'static>, AddressBook, AddressUuid)> {
        let cart = Cart::with_items(
            [
                CartItem::new(CartItemUuid::now_v7(), "CBD Oil 10ml", brl(25_000), 1),
                CartItem::new(CartItemUuid::now_v7(), "CBD Oil 30ml", brl(38_000), 1)
                    .with_discount_price(brl(34_200)),
            ],
            BRL,
        )?;

        let uuid = AddressUuid::now_v7();
        let book = AddressBook::with_addresses([Address {
            uuid,
            street: "Rua das Flores".to_string(),
            number: "123".to_string(),
            complement: Some("Apto 45".to_string()),
            neighborhood: "Jardim Paulista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            postal_code: "01415-000".to_string(),
            is_default: true,
        }])?;

        Ok((cart, book, uuid))
    }

    #[test]
    fn display_amount_rounds_and_pads() {
        assert_eq!(
            display_amount(&brl(54_780)),
            format!("{} 547.80", BRL.symbol)
        );
        assert_eq!(
            display_amount(&Money::from_decimal(Decimal::new(59_205, 3), BRL)),
            format!("{} 59.21", BRL.symbol)
        );
    }

    #[test]
    fn snapshot_carries_selection_and_totals() -> TestResult {
        let (cart, book, address) = fixture()?;
        let state = CheckoutState::default()
            .apply(CheckoutField::SelectedAddress(Some(address)))
            .apply(CheckoutField::CardNumber("4111 1111 1111 4242".to_string()))
            .apply(CheckoutField::Installments(2))
            .apply(CheckoutField::CouponCode("WELCOME10".to_string()))
            .apply(CheckoutField::OrderNotes("  leave with doorman ".to_string()));
        let totals = calculate_totals(
            &cart,
            state.delivery_method(),
            &LiteralCoupon::default().validate(state.coupon_code()),
            &ShippingRates::defaults(BRL),
        )?;

        let confirmation = Confirmation::new(
            OrderId::new("ORD-42"),
            Timestamp::UNIX_EPOCH,
            &state,
            &cart,
            &book,
            totals,
        )?;

        assert_eq!(confirmation.order_id().as_str(), "ORD-42");
        assert_eq!(confirmation.address().map(|a| a.uuid), Some(address));
        assert_eq!(confirmation.installments(), Some(2));
        assert_eq!(confirmation.notes(), Some("leave with doorman"));
        assert_eq!(confirmation.items().len(), 2);
        assert_eq!(confirmation.totals().total(), brl(54_780));

        let lines = confirmation.lines();

        assert!(lines.iter().any(|l| l.contains("Rua das Flores, 123 - Apto 45")));
        assert!(lines.iter().any(|l| l == "Payment: credit, 2x, card ending 4242"));
        assert!(lines.contains(&format!("Coupon discount: -{} 59.20", BRL.symbol)));
        assert_eq!(
            lines.iter().find(|l| l.starts_with("Total:")),
            Some(&format!("Total: {} 547.80", BRL.symbol))
        );

        Ok(())
    }

    #[test]
    fn pickup_pix_has_no_address_or_card() -> TestResult {
        let (cart, book, address) = fixture()?;
        let state = CheckoutState::default()
            .apply(CheckoutField::DeliveryMethod(Some(DeliveryMethod::Pickup)))
            .apply(CheckoutField::SelectedAddress(Some(address)))
            .apply(CheckoutField::PaymentMethod(PaymentMethod::Pix));
        let totals = calculate_totals(
            &cart,
            state.delivery_method(),
            &LiteralCoupon::default().validate(""),
            &ShippingRates::defaults(BRL),
        )?;

        let confirmation = Confirmation::new(
            OrderId::new("ORD-7"),
            Timestamp::UNIX_EPOCH,
            &state,
            &cart,
            &book,
            totals,
        )?;

        assert!(confirmation.address().is_none());
        assert_eq!(confirmation.installments(), None);
        assert!(confirmation.lines().contains(&"Payment: pix".to_string()));
        assert!(!confirmation.lines().iter().any(|l| l.starts_with("Coupon")));

        Ok(())
    }
}
