//! Orders
//!
//! The payload handed to the order submission gateway, and the identifier it
//! hands back.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::{
    addresses::AddressUuid,
    cart::{Cart, CartItemUuid},
    pricing::{DerivedTotals, round_for_display},
    state::{CheckoutState, DeliveryMethod, PaymentMethod},
};

/// Identifier assigned to an order by the submission gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap a gateway-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cart line as submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Cart item identifier
    pub id: CartItemUuid,

    /// Quantity ordered
    pub quantity: u32,

    /// Unit price charged (discounted price when present)
    pub unit_price_applied: Decimal,
}

/// Delivery selection as submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    /// Delivery method
    pub method: Option<DeliveryMethod>,

    /// Selected address; `None` for pickup
    pub address_id: Option<AddressUuid>,
}

/// Payment selection as submitted. Card secrets are never included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Payment method
    pub method: PaymentMethod,

    /// Last four digits of the card, for credit payments
    pub card_last4: Option<String>,

    /// Installment count, for credit payments
    pub installments: Option<u8>,
}

/// Totals the patient saw when confirming, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsRequest {
    /// Subtotal
    pub subtotal: Decimal,

    /// Shipping
    pub shipping_cost: Decimal,

    /// Coupon discount
    pub coupon_discount: Decimal,

    /// Grand total
    pub total: Decimal,

    /// ISO currency code
    pub currency: &'static str,
}

/// A finalized checkout, ready for the submission gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Ordered lines
    pub items: SmallVec<[OrderLine; 8]>,

    /// Delivery selection
    pub delivery: DeliveryRequest,

    /// Payment selection
    pub payment: PaymentRequest,

    /// Coupon code, if one was entered
    pub coupon_code: Option<String>,

    /// Order notes, if any
    pub notes: Option<String>,

    /// Displayed totals
    pub totals: TotalsRequest,

    /// Key identifying this submission attempt; sent out of band.
    #[serde(skip)]
    pub idempotency_key: Uuid,
}

impl OrderRequest {
    /// Build the payload from the current form state, the cart and its totals.
    pub fn build(
        state: &CheckoutState,
        cart: &Cart<'_>,
        totals: &DerivedTotals<'_>,
        idempotency_key: Uuid,
    ) -> Self {
        let items = cart
            .iter()
            .map(|item| OrderLine {
                id: item.uuid(),
                quantity: item.quantity(),
                unit_price_applied: *item.unit_price_applied().amount(),
            })
            .collect();

        let delivery_method = state.delivery_method();
        let address_id = delivery_method
            .filter(|method| method.requires_address())
            .and(state.selected_address());

        let is_credit = state.payment_method() == PaymentMethod::Credit;

        Self {
            items,
            delivery: DeliveryRequest {
                method: delivery_method,
                address_id,
            },
            payment: PaymentRequest {
                method: state.payment_method(),
                card_last4: is_credit.then(|| state.card().last4()).flatten(),
                installments: is_credit.then_some(state.card().installments),
            },
            coupon_code: Some(state.coupon_code())
                .filter(|code| !code.is_empty())
                .map(str::to_string),
            notes: non_blank(state.order_notes()),
            totals: TotalsRequest {
                subtotal: *round_for_display(&totals.subtotal()).amount(),
                shipping_cost: *round_for_display(&totals.shipping_cost()).amount(),
                coupon_discount: *round_for_display(&totals.coupon_discount()).amount(),
                total: *round_for_display(&totals.total()).amount(),
                currency: totals.currency().iso_alpha_code,
            },
            idempotency_key,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        cart::CartItem,
        coupons::{CouponValidator, LiteralCoupon},
        pricing::{ShippingRates, calculate_totals},
        state::CheckoutField,
    };

    use super::*;

    fn cart() -> Result<Cart<'static>, crate::cart::CartError> {
        Cart::with_items(
            [CartItem::new(
                CartItemUuid::now_v7(),
                "CBD Oil 30ml",
                Money::from_minor(38_000, BRL),
                2,
            )
            .with_discount_price(Money::from_minor(34_200, BRL))],
            BRL,
        )
    }

    #[test]
    fn credit_payload_carries_last4_and_installments_only() -> TestResult {
        let cart = cart()?;
        let state = CheckoutState::default()
            .apply(CheckoutField::CardNumber("4111 1111 1111 4242".to_string()))
            .apply(CheckoutField::CardCvv("321".to_string()))
            .apply(CheckoutField::Installments(3));
        let totals = calculate_totals(
            &cart,
            state.delivery_method(),
            &LiteralCoupon::default().validate(state.coupon_code()),
            &ShippingRates::defaults(BRL),
        )?;

        let request = OrderRequest::build(&state, &cart, &totals, Uuid::now_v7());
        let body = serde_json::to_value(&request)?;

        assert_eq!(body["payment"]["cardLast4"], json!("4242"));
        assert_eq!(body["payment"]["installments"], json!(3));
        assert!(!body.to_string().contains("321"));
        assert!(body.get("idempotencyKey").is_none());

        Ok(())
    }

    #[test]
    fn pickup_pix_payload_nulls_optional_fields() -> TestResult {
        let cart = cart()?;
        let state = CheckoutState::default()
            .apply(CheckoutField::DeliveryMethod(Some(DeliveryMethod::Pickup)))
            .apply(CheckoutField::SelectedAddress(Some(AddressUuid::now_v7())))
            .apply(CheckoutField::PaymentMethod(PaymentMethod::Pix))
            .apply(CheckoutField::CardNumber("4111111111111111".to_string()));
        let totals = calculate_totals(
            &cart,
            state.delivery_method(),
            &LiteralCoupon::default().validate(state.coupon_code()),
            &ShippingRates::defaults(BRL),
        )?;

        let request = OrderRequest::build(&state, &cart, &totals, Uuid::now_v7());
        let body = serde_json::to_value(&request)?;

        assert_eq!(body["delivery"]["method"], json!("pickup"));
        assert_eq!(body["delivery"]["addressId"], json!(null));
        assert_eq!(body["payment"]["method"], json!("pix"));
        assert_eq!(body["payment"]["cardLast4"], json!(null));
        assert_eq!(body["payment"]["installments"], json!(null));
        assert_eq!(body["couponCode"], json!(null));
        assert_eq!(body["notes"], json!(null));

        Ok(())
    }

    #[test]
    fn lines_use_applied_unit_price() -> TestResult {
        let cart = cart()?;
        let state = CheckoutState::default();
        let totals = calculate_totals(
            &cart,
            state.delivery_method(),
            &LiteralCoupon::default().validate(""),
            &ShippingRates::defaults(BRL),
        )?;

        let request = OrderRequest::build(&state, &cart, &totals, Uuid::now_v7());

        assert_eq!(request.items.len(), 1);
        assert_eq!(
            request.items.first().map(|line| line.unit_price_applied),
            Some(Decimal::new(342, 0))
        );
        assert_eq!(request.items.first().map(|line| line.quantity), Some(2));
        assert_eq!(request.totals.total, Decimal::new(699, 0));
        assert_eq!(request.totals.currency, "BRL");

        Ok(())
    }
}
