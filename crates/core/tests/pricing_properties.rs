//! Property tests for derived totals and step gating.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{BRL, Currency},
};

use verdant::{
    addresses::{Address, AddressBook, AddressUuid},
    cart::{Cart, CartItem, CartItemUuid},
    coupons::{CouponValidator, LiteralCoupon},
    pricing::{ShippingRates, calculate_totals, subtotal},
    sequencer::{Sequencer, Step},
    state::{CheckoutField, CheckoutState, CheckoutStore, DeliveryMethod, PaymentMethod},
};

fn brl(minor: i64) -> Money<'static, Currency> {
    Money::from_minor(minor, BRL)
}

/// (price, discounted price, quantity), amounts in centavos.
type Line = (i64, Option<i64>, u32);

fn lines() -> impl Strategy<Value = Vec<Line>> {
    prop::collection::vec(
        (0_i64..200_000, prop::option::of(0_i64..200_000), 1_u32..20),
        0..12,
    )
}

fn build_cart(lines: &[Line]) -> Result<Cart<'static>, TestCaseError> {
    let items: Vec<_> = lines
        .iter()
        .map(|&(price, discount, quantity)| {
            let item = CartItem::new(CartItemUuid::now_v7(), "item", brl(price), quantity);

            match discount {
                Some(discount) => item.with_discount_price(brl(discount)),
                None => item,
            }
        })
        .collect();

    Cart::with_items(items, BRL).map_err(|err| TestCaseError::fail(err.to_string()))
}

fn delivery_method() -> impl Strategy<Value = DeliveryMethod> {
    prop_oneof![
        Just(DeliveryMethod::Standard),
        Just(DeliveryMethod::Express),
        Just(DeliveryMethod::Pickup),
    ]
}

/// Codes that are either some casing of the welcome code or arbitrary text.
fn coupon_code() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(any::<bool>(), 9).prop_map(|upper| {
            "welcome10"
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                .collect()
        }),
        "[A-Za-z0-9 ]{0,12}",
    ]
}

fn book() -> (AddressBook, AddressUuid) {
    let uuid = AddressUuid::now_v7();
    let address = Address {
        uuid,
        street: "Rua Oscar Freire".to_string(),
        number: "900".to_string(),
        complement: None,
        neighborhood: "Pinheiros".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        postal_code: "05409-010".to_string(),
        is_default: false,
    };

    // A single address with a fresh identifier cannot collide or double up defaults.
    let book = AddressBook::with_addresses([address]).unwrap_or_default();

    (book, uuid)
}

#[derive(Debug, Clone)]
enum Action {
    Field(CheckoutField),
    Next,
    Back,
    Submit,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        delivery_method().prop_map(|m| Action::Field(CheckoutField::DeliveryMethod(Some(m)))),
        prop_oneof![
            Just(PaymentMethod::Credit),
            Just(PaymentMethod::Pix),
            Just(PaymentMethod::BankSlip),
        ]
        .prop_map(|m| Action::Field(CheckoutField::PaymentMethod(m))),
        "[0-9]{0,4}".prop_map(|v| Action::Field(CheckoutField::CardCvv(v))),
        "[A-Za-z ]{0,8}".prop_map(|v| Action::Field(CheckoutField::CardHolderName(v))),
        Just(Action::Field(CheckoutField::CardNumber("4111111111111111".to_string()))),
        Just(Action::Field(CheckoutField::CardExpiry("01/30".to_string()))),
        Just(Action::Field(CheckoutField::TermsAccepted(false))),
        Just(Action::Next),
        Just(Action::Back),
        Just(Action::Submit),
    ]
}

proptest! {
    /// Subtotal is the sum of applied unit price times quantity, and never negative.
    #[test]
    fn subtotal_sums_applied_prices(lines in lines()) {
        let cart = build_cart(&lines)?;
        let expected: i64 = lines
            .iter()
            .map(|&(price, discount, quantity)| discount.unwrap_or(price) * i64::from(quantity))
            .sum();

        let subtotal = subtotal(&cart).map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert_eq!(subtotal, brl(expected));
        prop_assert!(!subtotal.amount().is_sign_negative());
    }

    /// Shipping depends only on the delivery method.
    #[test]
    fn shipping_is_fixed_per_method(lines in lines(), method in delivery_method()) {
        let cart = build_cart(&lines)?;
        let totals = calculate_totals(
            &cart,
            Some(method),
            &LiteralCoupon::default().validate(""),
            &ShippingRates::defaults(BRL),
        )
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let expected = match method {
            DeliveryMethod::Standard => brl(1_500),
            DeliveryMethod::Express => brl(3_000),
            DeliveryMethod::Pickup => brl(0),
        };

        prop_assert_eq!(totals.shipping_cost(), expected);
    }

    /// The coupon takes off exactly ten percent iff the code matches, ignoring case.
    #[test]
    fn coupon_discount_is_ten_percent_iff_code_matches(
        lines in lines(),
        code in coupon_code(),
    ) {
        let cart = build_cart(&lines)?;
        let totals = calculate_totals(
            &cart,
            Some(DeliveryMethod::Standard),
            &LiteralCoupon::default().validate(&code),
            &ShippingRates::defaults(BRL),
        )
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let matches = code.eq_ignore_ascii_case("WELCOME10");
        let expected = if matches {
            *totals.subtotal().amount() * Decimal::new(1, 1)
        } else {
            Decimal::ZERO
        };

        prop_assert_eq!(*totals.coupon_discount().amount(), expected);
    }

    /// Total is subtotal plus shipping minus discount, and never negative.
    #[test]
    fn total_balances_and_is_never_negative(
        lines in lines(),
        method in delivery_method(),
        code in coupon_code(),
    ) {
        let cart = build_cart(&lines)?;
        let totals = calculate_totals(
            &cart,
            Some(method),
            &LiteralCoupon::default().validate(&code),
            &ShippingRates::defaults(BRL),
        )
        .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let expected = *totals.subtotal().amount() + *totals.shipping_cost().amount()
            - *totals.coupon_discount().amount();

        prop_assert_eq!(*totals.total().amount(), expected);
        prop_assert!(!totals.total().amount().is_sign_negative());
    }

    /// Leaving Delivery needs an address unless the order is picked up.
    #[test]
    fn delivery_needs_address_unless_pickup(method in delivery_method(), with_address: bool) {
        let (book, uuid) = book();
        let state = CheckoutState::default()
            .apply(CheckoutField::DeliveryMethod(Some(method)))
            .apply(CheckoutField::SelectedAddress(with_address.then_some(uuid)));
        let mut sequencer = Sequencer::new();

        let advanced = sequencer.next(&state, &book).is_ok();

        prop_assert_eq!(advanced, with_address || method == DeliveryMethod::Pickup);
    }

    /// No sequence of actions reaches submission while the terms are unaccepted.
    #[test]
    fn submission_never_starts_without_terms(actions in prop::collection::vec(action(), 0..40)) {
        let (book, uuid) = book();
        let mut store = CheckoutStore::new();
        let mut sequencer = Sequencer::new();

        store.update_field(CheckoutField::SelectedAddress(Some(uuid)));

        for action in actions {
            match action {
                Action::Field(field) => store.update_field(field),
                Action::Next => {
                    _ = sequencer.next(store.state(), &book);
                }
                Action::Back => {
                    _ = sequencer.back();
                }
                Action::Submit => {
                    prop_assert!(sequencer.begin_submission(store.state()).is_err());
                }
            }

            prop_assert!(!matches!(sequencer.step(), Step::Complete(_)));
            prop_assert!(!sequencer.is_submitting());
        }
    }
}
