//! Verdant prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    addresses::{Address, AddressBook, AddressError, AddressUuid},
    cart::{Cart, CartError, CartItem, CartItemUuid},
    confirmation::{Confirmation, ConfirmationLine, display_amount, totals_lines},
    coupons::{CouponOutcome, CouponValidator, DEFAULT_COUPON_CODE, LiteralCoupon},
    fixtures::{Fixture, FixtureError},
    order::{OrderId, OrderRequest},
    pricing::{
        DerivedTotals, PricingError, ShippingRates, calculate_totals, round_for_display,
        shipping_cost, subtotal,
    },
    sequencer::{Sequencer, SequencerError, Step, SubmissionTicket},
    state::{CardDetails, CheckoutField, CheckoutState, CheckoutStore, DeliveryMethod, PaymentMethod},
    uuids::TypedUuid,
    validation::{
        CardField, ValidationError, validate_delivery, validate_payment, validate_review,
    },
};
